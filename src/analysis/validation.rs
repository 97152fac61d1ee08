use crate::errors::ValidationError;

pub const MIN_PROGRESS: i64 = 0;
pub const MAX_PROGRESS: i64 = 100;

pub fn validate_progress(progress: i64) -> Result<i64, ValidationError> {
    if (MIN_PROGRESS..=MAX_PROGRESS).contains(&progress) {
        Ok(progress)
    } else {
        Err(ValidationError::ProgressOutOfRange(progress))
    }
}

/// Trims `value`; empty after trimming is rejected.
pub fn require_text(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}

/// Blank optional text collapses to `None`.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_bounds_are_inclusive() {
        assert_eq!(validate_progress(0), Ok(0));
        assert_eq!(validate_progress(100), Ok(100));
        assert_eq!(validate_progress(101), Err(ValidationError::ProgressOutOfRange(101)));
        assert_eq!(validate_progress(-1), Err(ValidationError::ProgressOutOfRange(-1)));
    }

    #[test]
    fn required_text_is_trimmed_and_non_empty() {
        assert_eq!(require_text("title", "  React Docs "), Ok("React Docs".to_string()));
        assert_eq!(require_text("link", "   "), Err(ValidationError::EmptyField("link")));
    }

    #[test]
    fn blank_optional_text_becomes_none() {
        assert_eq!(optional_text(Some("  ")), None);
        assert_eq!(optional_text(None), None);
        assert_eq!(optional_text(Some(" x.png ")), Some("x.png".to_string()));
    }

    #[test]
    fn errors_render_with_tag() {
        let message = validate_progress(140).unwrap_err().to_string();
        assert!(message.starts_with("VALIDATION_FAILED"));
        assert!(message.contains("140"));
    }
}
