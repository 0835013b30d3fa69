//! Recipient Registry (C2): stable bidirectional mapping between an
//! opaque recipient id and `(channel, destination)`, with an optional
//! debounced-persistence layer.

mod error;
mod persistent;
mod record;
mod registry;

pub use error::{RecipientError, Result};
pub use persistent::PersistentRecipientRegistry;
pub use record::{derive_recipient_id, has_valid_prefix, RecipientRecord, RECIPIENT_ID_PREFIX};
pub use registry::RecipientRegistry;
