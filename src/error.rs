//! Error types

/// Result alias used throughout the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors reported while extracting front matter
#[derive(Debug)]
pub enum Error {
    /// No front matter was found in the input
    ///
    /// Only reported by the `must_parse*` entry points; the other entry
    /// points return the whole document as body instead.
    NotFound,

    /// The decode callback of the detected format failed
    Decode(anyhow::Error),

    /// Reading the input stream failed
    Io(std::io::Error),
}

impl Error {
    /// Whether this error reports a missing front matter
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NotFound => {
                write!(f, "front matter not found")
            }
            Error::Decode(err) => {
                write!(f, "failed to decode front matter: {}", err)
            }
            Error::Io(err) => {
                write!(f, "I/O error: {}", err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NotFound => None,
            Error::Decode(err) => Some(&**err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_not_found_display() {
        let err = Error::NotFound;
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "front matter not found");
        assert!(err.source().is_none());
    }

    #[test]
    fn test_decode_keeps_cause() {
        let err = Error::Decode(anyhow::anyhow!("bad key"));
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "failed to decode front matter: bad key");
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("bad key"));
    }

    #[test]
    fn test_from_io_error() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::Other, "disk gone").into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "I/O error: disk gone");
    }
}
