//! Client-side validation
//!
//! Everything here runs before a request is built, so a rejected form never
//! reaches the network.

use miette::Diagnostic;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Minimum accepted password length, for signup and password changes
pub const MIN_PASSWORD_LEN: usize = 6;

/// Invite codes are minted by the server with exactly this many characters
pub const INVITE_CODE_LEN: usize = 6;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("All fields are required")]
    #[diagnostic(code(cozeats_core::validation::missing_fields))]
    MissingFields,

    #[error("Please enter a valid email address")]
    #[diagnostic(code(cozeats_core::validation::invalid_email))]
    InvalidEmail,

    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    #[diagnostic(code(cozeats_core::validation::password_too_short))]
    PasswordTooShort,

    #[error("New password must be at least {MIN_PASSWORD_LEN} characters")]
    #[diagnostic(code(cozeats_core::validation::new_password_too_short))]
    NewPasswordTooShort,

    #[error("New passwords do not match")]
    #[diagnostic(code(cozeats_core::validation::password_mismatch))]
    PasswordMismatch,

    #[error("New password must be different from current password")]
    #[diagnostic(code(cozeats_core::validation::password_unchanged))]
    PasswordUnchanged,

    #[error("Name cannot be empty")]
    #[diagnostic(code(cozeats_core::validation::empty_name))]
    EmptyName,

    #[error("No changes made")]
    #[diagnostic(code(cozeats_core::validation::no_changes))]
    NoChanges,

    #[error("{field} cannot be empty")]
    #[diagnostic(code(cozeats_core::validation::empty_field))]
    EmptyField { field: &'static str },

    #[error("Invite code must be {INVITE_CODE_LEN} letters or digits")]
    #[diagnostic(
        code(cozeats_core::validation::invalid_invite_code),
        help("Enter the 6-character invite code shared by a group member")
    )]
    InvalidInviteCode { code: String },
}

pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    if !EMAIL_RE.is_match(email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(email.to_string())
}

/// Validate a signup form, returning the trimmed name and email
pub fn validate_signup(
    name: &str,
    email: &str,
    password: &str,
) -> Result<(String, String), ValidationError> {
    if name.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    let email = validate_email(email)?;
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok((name.trim().to_string(), email))
}

pub fn validate_login(email: &str, password: &str) -> Result<String, ValidationError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    validate_email(email)
}

/// Validate a rename against the name currently on record
pub fn validate_rename(new_name: &str, current: Option<&str>) -> Result<String, ValidationError> {
    let trimmed = new_name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if current == Some(trimmed) {
        return Err(ValidationError::NoChanges);
    }
    Ok(trimmed.to_string())
}

/// Validate a password change form. Checks run in the order the form reports them.
pub fn validate_password_change(
    current: &str,
    new: &str,
    confirm: &str,
) -> Result<(), ValidationError> {
    if current.is_empty() || new.is_empty() || confirm.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    if new.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::NewPasswordTooShort);
    }
    if new != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    if current == new {
        return Err(ValidationError::PasswordUnchanged);
    }
    Ok(())
}

/// Trim a free-text field, rejecting it if nothing remains
pub fn require_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    Ok(trimmed.to_string())
}

/// Normalize an invite code to the form the server expects
///
/// The input is trimmed and uppercased; anything that is not exactly
/// `INVITE_CODE_LEN` ASCII letters or digits is rejected.
pub fn normalize_invite_code(code: &str) -> Result<String, ValidationError> {
    let normalized = code.trim().to_ascii_uppercase();
    let valid = normalized.chars().count() == INVITE_CODE_LEN
        && normalized.chars().all(|c| c.is_ascii_alphanumeric());
    if !valid {
        return Err(ValidationError::InvalidInviteCode {
            code: code.to_string(),
        });
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_invite_code_is_uppercased() {
        assert_eq!(normalize_invite_code(" ab12cd ").unwrap(), "AB12CD");
        assert_eq!(normalize_invite_code("XK9F2Q").unwrap(), "XK9F2Q");
    }

    #[test]
    fn test_invite_code_rejects_other_lengths() {
        for code in ["", "ABC12", "ABC1234", "COZE-XK9F-2024", "ab-12c"] {
            assert!(
                matches!(
                    normalize_invite_code(code),
                    Err(ValidationError::InvalidInviteCode { .. })
                ),
                "{code:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_signup_validation() {
        assert_eq!(
            validate_signup("  Jane ", " jane@example.com", "secret1").unwrap(),
            ("Jane".to_string(), "jane@example.com".to_string())
        );
        assert_eq!(
            validate_signup("", "jane@example.com", "secret1"),
            Err(ValidationError::MissingFields)
        );
        assert_eq!(
            validate_signup("Jane", "jane.example.com", "secret1"),
            Err(ValidationError::InvalidEmail)
        );
        assert_eq!(
            validate_signup("Jane", "jane@example.com", "abc"),
            Err(ValidationError::PasswordTooShort)
        );
    }

    #[test]
    fn test_password_change_order() {
        assert_eq!(
            validate_password_change("", "newpass", "newpass"),
            Err(ValidationError::MissingFields)
        );
        assert_eq!(
            validate_password_change("oldpass", "short", "short"),
            Err(ValidationError::NewPasswordTooShort)
        );
        assert_eq!(
            validate_password_change("oldpass", "newpass1", "newpass2"),
            Err(ValidationError::PasswordMismatch)
        );
        assert_eq!(
            validate_password_change("samepass", "samepass", "samepass"),
            Err(ValidationError::PasswordUnchanged)
        );
        assert!(validate_password_change("oldpass", "newpass", "newpass").is_ok());
    }

    #[test]
    fn test_rename_requires_a_change() {
        assert_eq!(
            validate_rename("   ", Some("Jane")),
            Err(ValidationError::EmptyName)
        );
        assert_eq!(
            validate_rename(" Jane ", Some("Jane")),
            Err(ValidationError::NoChanges)
        );
        assert_eq!(validate_rename("Janet", Some("Jane")).unwrap(), "Janet");
        assert_eq!(validate_rename("Janet", None).unwrap(), "Janet");
    }
}
