//! Sign-up form checks that run before the identity provider is called.

use serde::Deserialize;
use validator::Validate;

use super::not_blank;
use crate::error::{AuthError, FILL_ALL_FIELDS};

pub const DEFAULT_MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct SignUpForm {
    #[validate(custom(function = "not_blank", message = "Full name is required"))]
    pub full_name: String,
    #[validate(custom(function = "not_blank", message = "Email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
    #[validate(length(min = 1, message = "Please confirm your password"))]
    pub confirm: String,
}

impl SignUpForm {
    /// Field presence, then password length, then confirmation.
    pub fn check(&self, min_password_length: usize) -> Result<(), AuthError> {
        if self.validate().is_err() {
            return Err(AuthError::Validation(FILL_ALL_FIELDS.to_string()));
        }
        if self.password.chars().count() < min_password_length {
            return Err(AuthError::Validation(format!(
                "Password must be at least {min_password_length} characters."
            )));
        }
        if self.password != self.confirm {
            return Err(AuthError::Validation("Passwords do not match.".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, password: &str, confirm: &str) -> SignUpForm {
        SignUpForm {
            full_name: name.to_string(),
            email: "new@fleet.test".to_string(),
            password: password.to_string(),
            confirm: confirm.to_string(),
        }
    }

    #[test]
    fn blank_name_is_rejected_first() {
        let err = form("   ", "abc", "xyz").check(6).unwrap_err();
        assert_eq!(err, AuthError::Validation("Please fill in all fields.".into()));
    }

    #[test]
    fn short_password_is_rejected_before_mismatch() {
        let err = form("Ada", "abc", "xyz").check(6).unwrap_err();
        assert_eq!(
            err,
            AuthError::Validation("Password must be at least 6 characters.".into())
        );
    }

    #[test]
    fn mismatched_confirmation_is_rejected() {
        let err = form("Ada", "secret1", "secret2").check(6).unwrap_err();
        assert_eq!(err, AuthError::Validation("Passwords do not match.".into()));
        assert!(form("Ada", "secret1", "secret1").check(6).is_ok());
    }
}
