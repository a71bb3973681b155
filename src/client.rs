//! Talk to the Docker daemon's REST API
//!
//! Every request is one `GET` on a fresh connection, either to the daemon's
//! Unix socket or to a TCP port. There are no retries, the first failure is
//! handed back to the caller.
//!
//! The checks only depend on the [`DockerApi`](trait.DockerApi.html) trait,
//! [`DockerClient`](struct.DockerClient.html) is the implementation that
//! actually goes over the wire.

use std::fmt;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use bytes::Bytes;
use http::{header, Method, Request, Response};
use http_body_util::{BodyExt, Empty};
use hyper::body::Incoming;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
#[cfg(unix)]
use tokio::net::UnixStream;
use tokio::runtime::{self, Runtime};
use tokio::time::timeout;
use tracing::debug;

use crate::error::{Error, Result};

pub const DEFAULT_SOCKET: &str = "/var/run/docker.sock";
pub const DEFAULT_TCP_PORT: u16 = 2375;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("docker-plugins/", env!("CARGO_PKG_VERSION"));

/// How to reach the daemon when the host doesn't say
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Unix,
    Http,
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Protocol, String> {
        match s {
            "unix" => Ok(Protocol::Unix),
            "http" | "tcp" => Ok(Protocol::Http),
            _ => Err(format!(
                "Unknown protocol '{}', expected one of: unix, http",
                s
            )),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Protocol::Unix => write!(f, "unix"),
            Protocol::Http => write!(f, "http"),
        }
    }
}

/// Where the daemon is listening
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    Unix(PathBuf),
    Tcp { host: String, port: u16 },
}

impl Transport {
    /// Work out where the daemon lives from a `--docker-host` value
    ///
    /// Accepts everything `DOCKER_HOST` usually contains: a bare socket path,
    /// `unix:///path`, `host:port`, `tcp://host:port` or `http://host:port`.
    /// A scheme prefix wins over `protocol`, which itself defaults to unix.
    pub fn parse(host: &str, protocol: Option<Protocol>) -> Result<Transport> {
        let (protocol, rest) = if let Some(rest) = host.strip_prefix("unix://") {
            (Protocol::Unix, rest)
        } else if let Some(rest) = host
            .strip_prefix("tcp://")
            .or_else(|| host.strip_prefix("http://"))
        {
            (Protocol::Http, rest)
        } else {
            (protocol.unwrap_or(Protocol::Unix), host)
        };
        if rest.is_empty() {
            return Err(Error::Config(format!("No docker host in '{}'", host)));
        }

        match protocol {
            Protocol::Unix => Ok(Transport::Unix(PathBuf::from(rest))),
            Protocol::Http => {
                let rest = rest.trim_end_matches('/');
                // a bracketed ipv6 address without a port ends in ']'
                let split = if rest.ends_with(']') {
                    None
                } else {
                    rest.rsplit_once(':')
                };
                match split {
                    Some((host, port)) if !host.is_empty() => {
                        let port = port.parse().map_err(|_| {
                            Error::Config(format!("Invalid port '{}' in '{}'", port, rest))
                        })?;
                        Ok(Transport::Tcp {
                            host: host.to_owned(),
                            port,
                        })
                    }
                    Some(_) => Err(Error::Config(format!("No docker host in '{}'", rest))),
                    None => Ok(Transport::Tcp {
                        host: rest.to_owned(),
                        port: DEFAULT_TCP_PORT,
                    }),
                }
            }
        }
    }

    /// The value to send as the `Host` header
    fn host_header(&self) -> String {
        match *self {
            Transport::Unix(_) => "localhost".to_owned(),
            Transport::Tcp { ref host, port } => format!("{}:{}", host, port),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Transport::Unix(ref path) => write!(f, "unix://{}", path.display()),
            Transport::Tcp { ref host, port } => write!(f, "tcp://{}:{}", host, port),
        }
    }
}

/// Everything needed to build a `DockerClient`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    pub transport: Transport,
    /// Upper bound on connecting, sending the request and reading the body
    pub timeout: Duration,
}

impl Default for DaemonConfig {
    fn default() -> DaemonConfig {
        DaemonConfig {
            transport: Transport::Unix(PathBuf::from(DEFAULT_SOCKET)),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Read-only access to the daemon's API
///
/// Paths are relative to the API root, e.g. `containers/json`.
pub trait DockerApi {
    /// Feed the body of `GET path` to `on_chunk` as it arrives
    ///
    /// Reading stops early, and the rest of the body is never fetched, as soon
    /// as `on_chunk` returns `Break`. A non-2xx response is an
    /// `Error::Status` and `on_chunk` is never called.
    fn stream(&self, path: &str, on_chunk: &mut dyn FnMut(&[u8]) -> ControlFlow<()>)
        -> Result<()>;

    /// The whole body of `GET path`
    fn get_bytes(&self, path: &str) -> Result<Vec<u8>> {
        let mut body = Vec::new();
        self.stream(path, &mut |chunk| {
            body.extend_from_slice(chunk);
            ControlFlow::Continue(())
        })?;
        Ok(body)
    }

    /// `GET path`, decoded into a typed document
    ///
    /// Missing required fields are a `Decode` error.
    fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<T>
    where
        Self: Sized,
    {
        let body = self.get_bytes(path)?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// `GET path` as untyped JSON
    fn get(&self, path: &str) -> Result<Value>
    where
        Self: Sized,
    {
        self.get_as(path)
    }
}

/// The error body the daemon sends with non-2xx responses
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

pub(crate) fn error_message(body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(err) => err.message,
        Err(_) => String::from_utf8_lossy(body).trim().to_owned(),
    }
}

fn api_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_owned()
    } else {
        format!("/{}", path)
    }
}

/// A blocking client for the daemon
///
/// Requests are made with hyper on a private single-threaded runtime, so
/// callers never see anything async.
pub struct DockerClient {
    config: DaemonConfig,
    runtime: Runtime,
}

impl DockerClient {
    pub fn new(config: DaemonConfig) -> Result<DockerClient> {
        let runtime = runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(DockerClient { config, runtime })
    }

    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    /// Connect, send the request and check the status line
    async fn open(&self, path: &str) -> Result<Incoming> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(api_path(path))
            .header(header::HOST, self.config.transport.host_header())
            .header(header::USER_AGENT, USER_AGENT)
            .body(Empty::<Bytes>::new())
            .map_err(|e| Error::Config(format!("Invalid request path '{}': {}", path, e)))?;
        debug!(daemon = %self.config.transport, uri = %request.uri(), "GET");

        let response = match self.config.transport {
            #[cfg(unix)]
            Transport::Unix(ref socket) => {
                let stream = UnixStream::connect(socket)
                    .await
                    .map_err(|source| self.connect_error(source))?;
                send(stream, request).await?
            }
            #[cfg(not(unix))]
            Transport::Unix(_) => {
                return Err(Error::Config(
                    "Unix sockets are not supported on this platform, use --protocol http"
                        .to_owned(),
                ))
            }
            Transport::Tcp { ref host, port } => {
                let host = host.trim_start_matches('[').trim_end_matches(']');
                let stream = TcpStream::connect((host, port))
                    .await
                    .map_err(|source| self.connect_error(source))?;
                send(stream, request).await?
            }
        };

        let status = response.status();
        debug!(uri = %api_path(path), %status, "response");
        if status.is_success() {
            return Ok(response.into_body());
        }
        let body = response.into_body().collect().await?.to_bytes();
        Err(Error::Status {
            status,
            message: error_message(&body),
        })
    }

    fn connect_error(&self, source: std::io::Error) -> Error {
        Error::Connect {
            target: self.config.transport.to_string(),
            source,
        }
    }
}

impl DockerApi for DockerClient {
    fn stream(
        &self,
        path: &str,
        on_chunk: &mut dyn FnMut(&[u8]) -> ControlFlow<()>,
    ) -> Result<()> {
        let limit = self.config.timeout;
        self.runtime.block_on(async {
            let read = async {
                let mut body = self.open(path).await?;
                while let Some(frame) = body.frame().await {
                    let frame = frame?;
                    if let Some(chunk) = frame.data_ref() {
                        if on_chunk(&chunk[..]).is_break() {
                            debug!(uri = %api_path(path), "stopped reading early");
                            break;
                        }
                    }
                }
                Ok::<(), Error>(())
            };
            timeout(limit, read).await.map_err(|_| Error::Timeout(limit))?
        })
    }
}

/// Run one HTTP/1 exchange over an already connected stream
async fn send<S>(io: S, request: Request<Empty<Bytes>>) -> Result<Response<Incoming>>
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    let (mut sender, connection) = http1::handshake(TokioIo::new(io)).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            debug!(%err, "daemon connection closed with an error");
        }
    });
    Ok(sender.send_request(request).await?)
}

#[cfg(test)]
mod unit {
    use super::*;

    use crate::test_support::FakeDaemon;

    #[test]
    fn parse_socket_paths() {
        assert_eq!(
            Transport::parse("/var/run/docker.sock", None).unwrap(),
            Transport::Unix(PathBuf::from("/var/run/docker.sock"))
        );
        assert_eq!(
            Transport::parse("unix:///tmp/docker.sock", Some(Protocol::Http)).unwrap(),
            Transport::Unix(PathBuf::from("/tmp/docker.sock"))
        );
    }

    #[test]
    fn parse_tcp_hosts() {
        assert_eq!(
            Transport::parse("127.0.0.1:2376", Some(Protocol::Http)).unwrap(),
            Transport::Tcp {
                host: "127.0.0.1".into(),
                port: 2376
            }
        );
        assert_eq!(
            Transport::parse("tcp://docker.internal:4243/", None).unwrap(),
            Transport::Tcp {
                host: "docker.internal".into(),
                port: 4243
            }
        );
        assert_eq!(
            Transport::parse("http://docker.internal", None).unwrap(),
            Transport::Tcp {
                host: "docker.internal".into(),
                port: DEFAULT_TCP_PORT
            }
        );
        assert_eq!(
            Transport::parse("[::1]", Some(Protocol::Http)).unwrap(),
            Transport::Tcp {
                host: "[::1]".into(),
                port: DEFAULT_TCP_PORT
            }
        );
    }

    #[test]
    fn reject_bad_hosts() {
        assert!(Transport::parse("tcp://", None).is_err());
        assert!(Transport::parse("localhost:docker", Some(Protocol::Http)).is_err());
        assert!(Transport::parse(":2375", Some(Protocol::Http)).is_err());
    }

    #[test]
    fn transports_display_as_urls() {
        let tcp = Transport::parse("127.0.0.1:2375", Some(Protocol::Http)).unwrap();
        assert_eq!(tcp.to_string(), "tcp://127.0.0.1:2375");
        assert_eq!(tcp.host_header(), "127.0.0.1:2375");
        let unix = DaemonConfig::default().transport;
        assert_eq!(unix.to_string(), "unix:///var/run/docker.sock");
        assert_eq!(unix.host_header(), "localhost");
    }

    #[test]
    fn parse_protocol() {
        assert_eq!("unix".parse::<Protocol>(), Ok(Protocol::Unix));
        assert_eq!("http".parse::<Protocol>(), Ok(Protocol::Http));
        assert!("https".parse::<Protocol>().is_err());
    }

    #[test]
    fn error_bodies() {
        assert_eq!(
            error_message(br#"{"message": "No such container: web"}"#),
            "No such container: web"
        );
        assert_eq!(error_message(b"page not found\n"), "page not found");
    }

    #[test]
    fn paths_are_rooted() {
        assert_eq!(api_path("containers/json"), "/containers/json");
        assert_eq!(api_path("/containers/json"), "/containers/json");
    }

    #[test]
    fn get_as_reports_missing_fields() {
        #[derive(Deserialize, Debug)]
        struct NeedsName {
            #[serde(rename = "Name")]
            _name: String,
        }
        let api = FakeDaemon::new().json("thing", serde_json::json!({"Id": "abc"}));
        match api.get_as::<NeedsName>("thing") {
            Err(Error::Decode(_)) => {}
            other => panic!("expected a decode error, got {:?}", other),
        }
    }

    #[test]
    fn get_bytes_joins_chunks() {
        let api = FakeDaemon::new()
            .raw("logs", 200, b"one\ntwo\nthree\n")
            .chunked(3);
        assert_eq!(api.get_bytes("logs").unwrap(), b"one\ntwo\nthree\n".to_vec());
    }
}
