//! Password strength policy checked before sign-up.

use core::fmt;

/// Special characters accepted by the strength policy.
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// A single password requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PasswordRequirement {
    MinLength(usize),
    Lowercase,
    Uppercase,
    Digit,
    Special,
}

impl fmt::Display for PasswordRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MinLength(n) => write!(f, "At least {n} characters"),
            Self::Lowercase => f.write_str("One lowercase letter"),
            Self::Uppercase => f.write_str("One uppercase letter"),
            Self::Digit => f.write_str("One number"),
            Self::Special => f.write_str("One special character"),
        }
    }
}

/// Errors returned by [`PasswordPolicy::check`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Password is required")]
    Empty,
    #[error("Password must contain: {}", join_requirements(.0))]
    Weak(Vec<PasswordRequirement>),
}

fn join_requirements(unmet: &[PasswordRequirement]) -> String {
    unmet
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Password strength rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self { min_length: 8 }
    }
}

impl PasswordPolicy {
    /// Requirements the password does not meet, in display order.
    #[must_use]
    pub fn unmet(&self, password: &str) -> Vec<PasswordRequirement> {
        let mut unmet = Vec::new();
        if password.chars().count() < self.min_length {
            unmet.push(PasswordRequirement::MinLength(self.min_length));
        }
        if !password.chars().any(|c| c.is_ascii_lowercase()) {
            unmet.push(PasswordRequirement::Lowercase);
        }
        if !password.chars().any(|c| c.is_ascii_uppercase()) {
            unmet.push(PasswordRequirement::Uppercase);
        }
        if !password.chars().any(|c| c.is_ascii_digit()) {
            unmet.push(PasswordRequirement::Digit);
        }
        if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
            unmet.push(PasswordRequirement::Special);
        }
        unmet
    }

    /// Check a password against the policy.
    ///
    /// # Errors
    ///
    /// Returns [`PasswordError::Empty`] for an empty password and
    /// [`PasswordError::Weak`] listing every unmet requirement otherwise.
    pub fn check(&self, password: &str) -> Result<(), PasswordError> {
        if password.is_empty() {
            return Err(PasswordError::Empty);
        }
        let unmet = self.unmet(password);
        if unmet.is_empty() {
            Ok(())
        } else {
            Err(PasswordError::Weak(unmet))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_strong_password_passes() {
        assert_eq!(PasswordPolicy::default().check("Sunflower#42"), Ok(()));
    }

    #[test]
    fn test_empty_password() {
        assert_eq!(PasswordPolicy::default().check(""), Err(PasswordError::Empty));
    }

    #[test]
    fn test_lists_every_unmet_requirement() {
        let err = PasswordPolicy::default().check("abc").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Password must contain: At least 8 characters, One uppercase letter, One number, One special character"
        );
    }

    #[test]
    fn test_special_character_set() {
        let policy = PasswordPolicy::default();
        assert!(policy.unmet("Abcdefg1_").contains(&PasswordRequirement::Special));
        assert!(policy.unmet("Abcdefg1?").is_empty());
    }
}
