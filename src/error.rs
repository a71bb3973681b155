//! The error type shared by every part of the plugins
//!
//! Nothing in here decides how a check exits. Errors carry enough information
//! for the binaries to map them to a `Status`, see `Error::status` and
//! `Error::liveness_status`.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::result::Result as StdResult;
use std::time::Duration;

use derive_more::From;
use http::StatusCode;

use crate::Status;

/// Everything that can go wrong talking to the daemon or reading our inputs
#[derive(Debug, From)]
pub enum Error {
    /// Could not open a connection to the daemon
    #[from(ignore)]
    Connect { target: String, source: io::Error },
    /// The request, including reading the body, took too long
    #[from(ignore)]
    Timeout(Duration),
    /// The connection broke after it was established
    Http(hyper::Error),
    /// The daemon answered, but not with a 2xx
    #[from(ignore)]
    Status { status: StatusCode, message: String },
    /// The daemon answered with something that isn't the JSON we need
    Decode(serde_json::Error),
    /// A container that was asked for explicitly does not exist
    #[from(ignore)]
    NotFound(String),
    /// Bad flags or an unreadable file, found before any request is made
    #[from(ignore)]
    Config(String),
    /// Local IO, e.g. setting up the runtime
    Io(io::Error),
}

pub type Result<T> = StdResult<T, Error>;

impl Error {
    /// How bad this error is when it stops a check from running
    ///
    /// Being unable to reach or understand the daemon is a WARNING: it says
    /// nothing about whether the containers themselves are healthy.
    pub fn status(&self) -> Status {
        match *self {
            Error::NotFound(_) => Status::Critical,
            _ => Status::Warning,
        }
    }

    /// How bad this error is while deciding if a resource is alive
    ///
    /// A missing resource or a state document we can't read means we can't
    /// confirm it is healthy.
    pub fn liveness_status(&self) -> Status {
        match *self {
            Error::Decode(_) | Error::NotFound(_) => Status::Critical,
            Error::Status { status, .. } if status == StatusCode::NOT_FOUND => Status::Critical,
            _ => Status::Warning,
        }
    }

    /// Turn a 404 for `reference` into `NotFound`, pass everything else through
    pub fn for_resource(self, reference: &str) -> Error {
        match self {
            Error::Status { status, .. } if status == StatusCode::NOT_FOUND => {
                Error::NotFound(reference.to_owned())
            }
            other => other,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Connect {
                ref target,
                ref source,
            } => write!(f, "Can't connect to docker at {}: {}", target, source),
            Error::Timeout(limit) => write!(
                f,
                "Docker did not answer within {}s",
                limit.as_secs_f64()
            ),
            Error::Http(ref e) => write!(f, "Error talking to docker: {}", e),
            Error::Status {
                status,
                ref message,
            } => {
                if message.is_empty() {
                    write!(f, "Docker returned {}", status)
                } else {
                    write!(f, "Docker returned {}: {}", status, message)
                }
            }
            Error::Decode(ref e) => write!(f, "JSON Error: {}", e),
            Error::NotFound(ref name) => write!(f, "Not found: {}", name),
            Error::Config(ref msg) => write!(f, "{}", msg),
            Error::Io(ref e) => write!(f, "{}", e),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match *self {
            Error::Connect { ref source, .. } => Some(source),
            Error::Http(ref e) => Some(e),
            Error::Decode(ref e) => Some(e),
            Error::Io(ref e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod unit {
    use super::*;

    fn refused() -> Error {
        Error::Connect {
            target: "unix:///var/run/docker.sock".into(),
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        }
    }

    fn bad_json() -> Error {
        serde_json::from_str::<serde_json::Value>("{not json").unwrap_err().into()
    }

    #[test]
    fn connectivity_problems_only_warn() {
        assert_eq!(refused().status(), Status::Warning);
        assert_eq!(refused().liveness_status(), Status::Warning);
        assert_eq!(Error::Timeout(Duration::from_secs(1)).status(), Status::Warning);
        let unavailable = Error::Status {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: String::new(),
        };
        assert_eq!(unavailable.liveness_status(), Status::Warning);
    }

    #[test]
    fn decode_errors_are_critical_only_for_liveness() {
        assert_eq!(bad_json().status(), Status::Warning);
        assert_eq!(bad_json().liveness_status(), Status::Critical);
    }

    #[test]
    fn not_found_is_critical() {
        let missing = Error::Status {
            status: StatusCode::NOT_FOUND,
            message: "No such container: web".into(),
        }
        .for_resource("web");
        match missing {
            Error::NotFound(ref name) => assert_eq!(name, "web"),
            ref other => panic!("expected NotFound, got {:?}", other),
        }
        assert_eq!(missing.status(), Status::Critical);
        assert_eq!(missing.to_string(), "Not found: web");
    }

    #[test]
    fn for_resource_keeps_other_errors() {
        match refused().for_resource("web") {
            Error::Connect { .. } => {}
            other => panic!("expected Connect, got {:?}", other),
        }
    }
}
