//! Error types for GitLab operations

use thiserror::Error;

/// Result type for GitLab operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during GitLab operations
#[derive(Error, Debug)]
pub enum Error {
    /// Transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Authentication or authorization error (401/403)
    #[error("GitLab authentication error: {0}")]
    Auth(String),

    /// Resource not found (404)
    #[error("Not found: {resource} ({message})")]
    NotFound { resource: String, message: String },

    /// Any other unsuccessful status
    #[error("GitLab API returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Base URL could not be used
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// 404 caused by the project itself being missing or invisible
    pub fn is_project_not_found(&self) -> bool {
        matches!(self, Error::NotFound { message, .. }
            if message.to_ascii_lowercase().contains("project not found"))
    }

    /// Map an unsuccessful HTTP status and its body to an error
    pub(crate) fn from_status(status: reqwest::StatusCode, resource: &str, body: String) -> Self {
        let message = extract_message(&body).unwrap_or(body);
        match status.as_u16() {
            401 | 403 => Error::Auth(format!("{} ({})", message, resource)),
            404 => Error::NotFound {
                resource: resource.to_string(),
                message,
            },
            code => Error::Status {
                status: code,
                message,
            },
        }
    }
}

/// GitLab error bodies look like `{"message": ...}` or `{"error": ...}`
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let field = value.get("message").or_else(|| value.get("error"))?;
    Some(match field {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            Error::from_status(StatusCode::UNAUTHORIZED, "group 1", String::new()),
            Error::Auth(_)
        ));
        assert!(matches!(
            Error::from_status(StatusCode::FORBIDDEN, "group 1", String::new()),
            Error::Auth(_)
        ));
        assert!(matches!(
            Error::from_status(StatusCode::NOT_FOUND, "group 1", String::new()),
            Error::NotFound { .. }
        ));
        assert!(matches!(
            Error::from_status(StatusCode::CONFLICT, "branch main", String::new()),
            Error::Status { status: 409, .. }
        ));
    }

    #[test]
    fn test_project_not_found() {
        let missing_project = Error::from_status(
            StatusCode::NOT_FOUND,
            "protected branch main of project 9",
            r#"{"message":"404 Project Not Found"}"#.to_string(),
        );
        assert!(missing_project.is_project_not_found());

        let missing_branch = Error::from_status(
            StatusCode::NOT_FOUND,
            "protected branch main of project 9",
            r#"{"message":"404 Not found"}"#.to_string(),
        );
        assert!(!missing_branch.is_project_not_found());
        assert!(missing_branch.to_string().contains("404 Not found"));
    }

    #[test]
    fn test_extract_message() {
        assert_eq!(
            extract_message(r#"{"message":"Branch already exists"}"#),
            Some("Branch already exists".to_string())
        );
        assert_eq!(
            extract_message(r#"{"error":"invalid_token"}"#),
            Some("invalid_token".to_string())
        );
        assert_eq!(
            extract_message(r#"{"message":{"name":["is invalid"]}}"#),
            Some(r#"{"name":["is invalid"]}"#.to_string())
        );
        assert_eq!(extract_message("not json"), None);
    }
}
