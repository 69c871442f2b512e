pub mod blog;
pub mod certifications;
pub mod feed;
pub mod jobs;
pub mod pages;
pub mod profile;

use chrono::{DateTime, Utc};

use crate::error::{AppError, AppResult};

/// Blank optional text is stored as NULL.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: String, field: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_optionals_collapse_to_none() {
        assert_eq!(non_blank(Some("   ".into())), None);
        assert_eq!(non_blank(Some(" x ".into())).as_deref(), Some("x"));
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn required_fields_are_trimmed() {
        assert_eq!(required("  Acme ".into(), "company").unwrap(), "Acme");
        assert!(matches!(
            required(" ".into(), "company"),
            Err(AppError::BadRequest(msg)) if msg == "company is required"
        ));
    }
}
