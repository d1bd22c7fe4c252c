use serde::{Deserialize, Serialize};

/// Account information returned by `GET /profile`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Profile {
    pub name: Option<String>,
    pub email: Option<String>,
    pub created_at: Option<String>,
}

/// Minimum accepted length for a new password
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Passwords this long or longer rate as strong
const STRONG_PASSWORD_LENGTH: usize = 10;

/// Rough strength rating shown next to the new-password field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordStrength {
    Weak,
    Medium,
    Strong,
}

impl PasswordStrength {
    pub fn label(&self) -> &'static str {
        match self {
            PasswordStrength::Weak => "weak",
            PasswordStrength::Medium => "medium",
            PasswordStrength::Strong => "strong",
        }
    }
}

/// Rate a password by length. Empty input has no rating.
pub fn password_strength(password: &str) -> Option<PasswordStrength> {
    let len = password.chars().count();
    if len == 0 {
        None
    } else if len < MIN_PASSWORD_LENGTH {
        Some(PasswordStrength::Weak)
    } else if len < STRONG_PASSWORD_LENGTH {
        Some(PasswordStrength::Medium)
    } else {
        Some(PasswordStrength::Strong)
    }
}
