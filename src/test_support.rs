//! A canned daemon for unit tests

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::ops::ControlFlow;

use http::StatusCode;
use serde_json::Value;

use crate::client::DockerApi;
use crate::error::{Error, Result};

/// Answers requests from a fixed table of `path -> (status, body)`
///
/// Unknown paths get the daemon's own 404. Bodies are handed out in
/// `chunk_size` pieces so that streaming code sees split reads.
pub(crate) struct FakeDaemon {
    responses: HashMap<String, (u16, Vec<u8>)>,
    chunk_size: usize,
    down: bool,
    requests: RefCell<Vec<String>>,
}

impl FakeDaemon {
    pub fn new() -> FakeDaemon {
        FakeDaemon {
            responses: HashMap::new(),
            chunk_size: usize::MAX,
            down: false,
            requests: RefCell::new(Vec::new()),
        }
    }

    /// A daemon that refuses every connection
    pub fn unreachable() -> FakeDaemon {
        FakeDaemon {
            down: true,
            ..FakeDaemon::new()
        }
    }

    pub fn json(self, path: &str, body: Value) -> FakeDaemon {
        let body = body.to_string().into_bytes();
        self.raw(path, 200, &body)
    }

    pub fn raw(mut self, path: &str, status: u16, body: &[u8]) -> FakeDaemon {
        self.responses
            .insert(path.to_owned(), (status, body.to_vec()));
        self
    }

    pub fn chunked(mut self, chunk_size: usize) -> FakeDaemon {
        self.chunk_size = chunk_size;
        self
    }

    /// Every path requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl DockerApi for FakeDaemon {
    fn stream(
        &self,
        path: &str,
        on_chunk: &mut dyn FnMut(&[u8]) -> ControlFlow<()>,
    ) -> Result<()> {
        self.requests.borrow_mut().push(path.to_owned());
        if self.down {
            return Err(Error::Connect {
                target: "unix:///var/run/docker.sock".to_owned(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
            });
        }
        let (status, body) = match self.responses.get(path) {
            Some(&(status, ref body)) => (status, body.as_slice()),
            None => (404, &b"page not found"[..]),
        };
        if !(200..300).contains(&status) {
            return Err(Error::Status {
                status: StatusCode::from_u16(status).unwrap(),
                message: crate::client::error_message(body),
            });
        }
        for chunk in body.chunks(self.chunk_size.max(1)) {
            if on_chunk(chunk).is_break() {
                break;
            }
        }
        Ok(())
    }
}
