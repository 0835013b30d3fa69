use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecipientError {
    #[error("recipient id collision: {id} already maps to a different route")]
    IdCollision { id: String },
    #[error("route already registered under a different recipient id")]
    RouteCollision,
    #[error("unknown recipient id: {0}")]
    NotFound(String),
    #[error("malformed recipient id: {0}")]
    MalformedId(String),
    #[error("duplicate recipient id in import: {0}")]
    DuplicateId(String),
    #[error("duplicate route in import: channel={channel} destination={destination}")]
    DuplicateRoute { channel: String, destination: String },
    #[error("persistence error: {0}")]
    Persistence(String),
}

pub type Result<T> = std::result::Result<T, RecipientError>;
