//! Error types for grd

use thiserror::Error;

/// Result type alias for grd operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed cause carried by remote API failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for grd operations
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be read or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Resolved configuration is not usable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Home directory lookup failed while searching for the default config file
    #[error("Could not determine home directory")]
    HomeDirNotFound,

    /// Project has no default branch to create the target from
    #[error("Project {project} has no default branch to create '{target}' from")]
    MissingDefaultBranch { project: String, target: String },

    /// Remote hosting API call failed
    #[error("{operation} failed: {source}")]
    Api {
        operation: &'static str,
        #[source]
        source: BoxError,
    },
}

impl Error {
    /// Wrap a client error as a failed remote operation
    pub fn api(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Error::Api {
            operation,
            source: source.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = Error::api("delete branch", "404 Not Found");
        assert_eq!(err.to_string(), "delete branch failed: 404 Not Found");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_missing_default_branch_display() {
        let err = Error::MissingDefaultBranch {
            project: "group/app".to_string(),
            target: "main".to_string(),
        };
        assert!(err.to_string().contains("group/app"));
        assert!(err.to_string().contains("'main'"));
    }
}
