use crate::{id::IdError, validation::ValidationError};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum CoreError {
    #[error("Local storage {operation} failed for key '{key}'")]
    #[diagnostic(
        code(cozeats_core::storage_failed),
        help("Check that the storage file is readable and writable")
    )]
    StorageFailed {
        operation: &'static str,
        key: String,
        #[source]
        cause: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Serialization error")]
    #[diagnostic(
        code(cozeats_core::serialization_error),
        help("Failed to serialize/deserialize {data_type}")
    )]
    SerializationError {
        data_type: String,
        #[source]
        cause: serde_json::Error,
    },

    #[error("Configuration error")]
    #[diagnostic(
        code(cozeats_core::configuration_error),
        help("Check configuration file at {config_path}")
    )]
    ConfigurationError {
        config_path: String,
        field: String,
        expected: String,
        #[source]
        cause: ConfigError,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    InvalidId(#[from] IdError),

    #[error("User not found. Please log in again.")]
    #[diagnostic(
        code(cozeats_core::not_signed_in),
        help("Sign in with `cozeats login` first")
    )]
    NotSignedIn,

    #[error("You are not a member of any group yet")]
    #[diagnostic(
        code(cozeats_core::no_group_memberships),
        help("Create a group or join one with an invite code")
    )]
    NoGroupMemberships { user_id: String },

    #[error("No group selected")]
    #[diagnostic(
        code(cozeats_core::no_group_selected),
        help("Focus a screen or pick a group from the menu first")
    )]
    NoGroupSelected,

    /// Any non-2xx response or transport failure, carrying the message to show
    #[error("{detail}")]
    #[diagnostic(code(cozeats_core::remote_error))]
    Remote { status: Option<u16>, detail: String },
}

/// Causes for configuration failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    pub fn storage(
        operation: &'static str,
        key: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::StorageFailed {
            operation,
            key: key.into(),
            cause: Box::new(cause),
        }
    }

    pub fn serialization(data_type: impl Into<String>, cause: serde_json::Error) -> Self {
        Self::SerializationError {
            data_type: data_type.into(),
            cause,
        }
    }

    pub fn remote(status: Option<u16>, detail: impl Into<String>) -> Self {
        Self::Remote {
            status,
            detail: detail.into(),
        }
    }

    /// The message a screen shows in its error state
    ///
    /// Remote and validation errors are shown verbatim; storage and
    /// serialization failures collapse into a generic message.
    pub fn user_message(&self) -> String {
        match self {
            CoreError::Remote { detail, .. } => detail.clone(),
            CoreError::Validation(e) => e.to_string(),
            CoreError::NotSignedIn | CoreError::NoGroupMemberships { .. } => self.to_string(),
            CoreError::NoGroupSelected => self.to_string(),
            CoreError::StorageFailed { .. } | CoreError::SerializationError { .. } => {
                "Something went wrong reading local data".to_string()
            }
            CoreError::ConfigurationError { .. } | CoreError::InvalidId(_) => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_message_is_verbatim() {
        let err = CoreError::remote(Some(400), "Invalid or expired invite code");
        assert_eq!(err.to_string(), "Invalid or expired invite code");
        assert_eq!(err.user_message(), "Invalid or expired invite code");
    }

    #[test]
    fn test_storage_error_is_generic_for_users() {
        let err = CoreError::storage(
            "read",
            "@cozeats_user",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("@cozeats_user"));
        assert_eq!(err.user_message(), "Something went wrong reading local data");
    }
}
