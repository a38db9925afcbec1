use crate::error::{Error, Result};

const MIN_USERNAME_LEN: usize = 3;
const MAX_USERNAME_LEN: usize = 20;
const MIN_PASSWORD_LEN: usize = 6;
const MAX_EMAIL_LEN: usize = 120;
const MAX_TEAM_NAME_LEN: usize = 100;
const MAX_ACTIVITY_NAME_LEN: usize = 100;

pub const MIN_MAX_SCORE: i64 = 1;
pub const MAX_MAX_SCORE: i64 = 1000;
/// Largest single score accepted. Keeps team totals far from `i64` overflow.
pub const MAX_SCORE_VALUE: i64 = i32::MAX as i64;

fn invalid(message: impl Into<String>) -> Error {
    Error::Validation(message.into())
}

/// Trims a required text field and checks its length.
fn required(value: &str, field: &str, max_len: usize) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(invalid(format!("{field} is required")));
    }
    if value.chars().count() > max_len {
        return Err(invalid(format!(
            "{field} cannot exceed {max_len} characters"
        )));
    }
    Ok(value.to_string())
}

/// Empty optional text collapses to None.
#[must_use]
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn validate_username(username: &str) -> Result<String> {
    let username = username.trim();
    let len = username.chars().count();
    if !(MIN_USERNAME_LEN..=MAX_USERNAME_LEN).contains(&len) {
        return Err(invalid(format!(
            "Username must be between {MIN_USERNAME_LEN} and {MAX_USERNAME_LEN} characters"
        )));
    }
    Ok(username.to_string())
}

pub fn validate_email(email: &str) -> Result<String> {
    let email = email.trim();
    let bad = || invalid("Invalid email address");

    if email.is_empty() || email.len() > MAX_EMAIL_LEN || email.contains(char::is_whitespace) {
        return Err(bad());
    }

    let (local, domain) = email.split_once('@').ok_or_else(bad)?;
    if local.is_empty() || domain.contains('@') {
        return Err(bad());
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|l| l.is_empty()) {
        return Err(bad());
    }

    Ok(email.to_string())
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(invalid(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_team_name(name: &str) -> Result<String> {
    required(name, "Team name", MAX_TEAM_NAME_LEN)
}

pub fn validate_activity_name(name: &str) -> Result<String> {
    required(name, "Activity name", MAX_ACTIVITY_NAME_LEN)
}

pub fn validate_max_score(max_score: i64) -> Result<i64> {
    if !(MIN_MAX_SCORE..=MAX_MAX_SCORE).contains(&max_score) {
        return Err(invalid(format!(
            "Maximum score must be between {MIN_MAX_SCORE} and {MAX_MAX_SCORE}"
        )));
    }
    Ok(max_score)
}

pub fn validate_score_value(score: i64) -> Result<i64> {
    if score < 0 {
        return Err(invalid("Score cannot be negative"));
    }
    if score > MAX_SCORE_VALUE {
        return Err(invalid(format!("Score cannot exceed {MAX_SCORE_VALUE}")));
    }
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_length_bounds() {
        assert!(validate_username("ab").is_err());
        assert_eq!(validate_username("  abc ").unwrap(), "abc");
        assert!(validate_username(&"a".repeat(20)).is_ok());
        assert!(validate_username(&"a".repeat(21)).is_err());
    }

    #[test]
    fn test_email_shapes() {
        assert!(validate_email("judge@example.com").is_ok());
        assert!(validate_email("first.last@sub.example.org").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("judge@localhost").is_err());
        assert!(validate_email("judge@example..com").is_err());
        assert!(validate_email("ju dge@example.com").is_err());
        assert!(validate_email("a@b@example.com").is_err());
    }

    #[test]
    fn test_password_minimum() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn test_required_names_are_trimmed() {
        assert_eq!(validate_team_name("  Alpha  ").unwrap(), "Alpha");
        assert!(validate_team_name("   ").is_err());
        assert!(validate_team_name(&"x".repeat(101)).is_err());
        assert!(validate_activity_name("").is_err());
    }

    #[test]
    fn test_max_score_range() {
        assert!(validate_max_score(0).is_err());
        assert!(validate_max_score(1).is_ok());
        assert!(validate_max_score(1000).is_ok());
        assert!(validate_max_score(1001).is_err());
    }

    #[test]
    fn test_score_value_non_negative() {
        assert!(validate_score_value(-1).is_err());
        assert_eq!(validate_score_value(0).unwrap(), 0);
    }

    #[test]
    fn test_score_value_upper_bound() {
        assert!(validate_score_value(MAX_SCORE_VALUE).is_ok());
        assert!(validate_score_value(MAX_SCORE_VALUE + 1).is_err());
        assert!(validate_score_value(i64::MAX).is_err());
    }

    #[test]
    fn test_optional_text() {
        assert_eq!(optional_text(None), None);
        assert_eq!(optional_text(Some("   ")), None);
        assert_eq!(optional_text(Some(" ok ")), Some("ok".to_string()));
    }
}
