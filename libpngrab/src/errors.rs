use std::fmt::Formatter;

#[derive(Debug, PartialEq, Clone)]
pub enum PngError {
    /// Parameter is the underlying io error message
    ErrorCreatingDestinationDirectory(String),
    /// Parameters are the raw link, additional error message
    InvalidUrl {
        url: String,
        message: String,
    },
    NetworkError(String),
    /// parameters are file path, additional error message
    FileOperationError {
        file_name: String,
        message: String,
    },
    /// The initial page could not be fetched. Nothing else is attempted.
    PageFetchFailed {
        url: String,
        message: String,
    },
    ClientBuild(String),
}

impl PngError {
    /// Errors that should terminate the process with a non-zero exit code.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PngError::ErrorCreatingDestinationDirectory(_))
    }
}

impl std::fmt::Display for PngError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            PngError::ErrorCreatingDestinationDirectory(err) => {
                format!("Failed to create output directory!\n{err}")
            }
            PngError::InvalidUrl { url, message } => {
                format!("invalid url received : {url} ({message})")
            }
            PngError::NetworkError(err) => format!("error connecting to server. {err}"),
            PngError::FileOperationError { file_name, message } => {
                format!("{message} : {file_name}")
            }
            PngError::PageFetchFailed { url, message } => {
                format!("Response to URL: {url} failed! Error: {message}")
            }
            PngError::ClientBuild(err) => format!("error building http client. {err}"),
        };
        write!(f, "{str}")
    }
}

impl std::error::Error for PngError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_directory_creation_is_fatal() {
        assert!(PngError::ErrorCreatingDestinationDirectory("denied".into()).is_fatal());
        assert!(!PngError::NetworkError("refused".into()).is_fatal());
        assert!(!PngError::PageFetchFailed {
            url: "http://x/".into(),
            message: "refused".into(),
        }
        .is_fatal());
    }

    #[test]
    fn page_fetch_failure_message() {
        let err = PngError::PageFetchFailed {
            url: "http://x/".into(),
            message: "connection refused".into(),
        };
        assert_eq!(
            err.to_string(),
            "Response to URL: http://x/ failed! Error: connection refused"
        );
    }

    #[test]
    fn directory_failure_message_puts_cause_on_next_line() {
        let err = PngError::ErrorCreatingDestinationDirectory("Permission denied".into());
        assert_eq!(
            err.to_string(),
            "Failed to create output directory!\nPermission denied"
        );
    }
}
