//! The stable error-kind taxonomy shared across every component.
//!
//! One enum, one variant per failure kind raised across the core, plugin,
//! and cognition layers. Component crates construct these through the
//! helper functions below rather than the bare variants so call sites read
//! like `CoreError::rate_limited(...)`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    #[error("dependency missing: plugin {plugin} requires {dependency}")]
    DependencyMissing { plugin: String, dependency: String },

    #[error("dependency version: plugin {plugin} requires {dependency} in [{min}, {max}), found {found}")]
    DependencyVersion {
        plugin: String,
        dependency: String,
        min: String,
        max: String,
        found: String,
    },

    #[error("activation failed for {plugin}: {reason}")]
    ActivationFailed { plugin: String, reason: String },

    #[error("plugin already loaded: {0}")]
    AlreadyLoaded(String),

    #[error("plugin not loaded: {0}")]
    NotLoaded(String),

    #[error("plugin {0} is required and cannot be modified")]
    RequiredPlugin(String),

    #[error("rate limited: plugin {plugin} exceeded {limit} signals/minute")]
    RateLimited { plugin: String, limit: u32 },

    #[error("storage limit exceeded for plugin {plugin}: {used_mb:.2}MB/{limit_mb:.2}MB")]
    StorageLimitExceeded {
        plugin: String,
        used_mb: f64,
        limit_mb: f64,
    },

    #[error("schedule limit exceeded for plugin {plugin}: {limit} active schedules")]
    ScheduleLimitExceeded { plugin: String, limit: u32 },

    #[error("recipient collision for id {id}: existing route does not match new route")]
    RecipientCollision { id: String },

    #[error("tool invocation error: {tool} - {message}")]
    ToolInvocationError { tool: String, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("hot-swap of {plugin} rolled back: {reason}")]
    RolledBack { plugin: String, reason: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    pub fn validation_failed(msg: impl Into<String>) -> Self {
        Self::ValidationFailed(msg.into())
    }

    pub fn dependency_missing(plugin: impl Into<String>, dependency: impl Into<String>) -> Self {
        Self::DependencyMissing { plugin: plugin.into(), dependency: dependency.into() }
    }

    pub fn activation_failed(plugin: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ActivationFailed { plugin: plugin.into(), reason: reason.into() }
    }

    pub fn rate_limited(plugin: impl Into<String>, limit: u32) -> Self {
        Self::RateLimited { plugin: plugin.into(), limit }
    }

    pub fn storage_limit_exceeded(plugin: impl Into<String>, used_mb: f64, limit_mb: f64) -> Self {
        Self::StorageLimitExceeded { plugin: plugin.into(), used_mb, limit_mb }
    }

    pub fn schedule_limit_exceeded(plugin: impl Into<String>, limit: u32) -> Self {
        Self::ScheduleLimitExceeded { plugin: plugin.into(), limit }
    }

    pub fn recipient_collision(id: impl Into<String>) -> Self {
        Self::RecipientCollision { id: id.into() }
    }

    pub fn tool_invocation_error(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolInvocationError { tool: tool.into(), message: message.into() }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// The stable string kind, for tests that assert on error classification
    /// rather than message text.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ValidationFailed(_) => "validation_failed",
            Self::DependencyMissing { .. } => "dependency_missing",
            Self::DependencyVersion { .. } => "dependency_version",
            Self::ActivationFailed { .. } => "activation_failed",
            Self::AlreadyLoaded(_) => "already_loaded",
            Self::NotLoaded(_) => "not_loaded",
            Self::RequiredPlugin(_) => "required_plugin",
            Self::RateLimited { .. } => "rate_limited",
            Self::StorageLimitExceeded { .. } => "storage_limit_exceeded",
            Self::ScheduleLimitExceeded { .. } => "schedule_limit_exceeded",
            Self::RecipientCollision { .. } => "recipient_collision",
            Self::ToolInvocationError { .. } => "tool_invocation_error",
            Self::MalformedResponse(_) => "malformed_response",
            Self::RolledBack { .. } => "rolled_back",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_stable_for_testing() {
        assert_eq!(CoreError::validation_failed("x").kind(), "validation_failed");
        assert_eq!(CoreError::rate_limited("p", 10).kind(), "rate_limited");
        assert_eq!(
            CoreError::RolledBack { plugin: "p".into(), reason: "r".into() }.kind(),
            "rolled_back"
        );
    }
}
