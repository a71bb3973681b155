//! Flags every check takes to find the daemon

use std::time::Duration;

use clap::Args;

use crate::client::{DaemonConfig, Protocol, Transport, DEFAULT_SOCKET};
use crate::error::{Error, Result};

#[derive(Args, Debug, Clone)]
pub struct DaemonArgs {
    #[arg(
        short = 'H',
        long = "docker-host",
        env = "DOCKER_HOST",
        default_value = DEFAULT_SOCKET,
        help = "Docker daemon to connect to. TCP: \"host:port\" or Unix: \"/path/to/docker.sock\""
    )]
    pub docker_host: String,

    #[arg(
        short = 'p',
        long = "protocol",
        help = "unix or http. Default: unix, unless the docker host starts with unix:// or tcp://"
    )]
    pub protocol: Option<Protocol>,

    #[arg(
        long = "timeout",
        value_name = "SECONDS",
        default_value = "10",
        help = "Give up on a request to the daemon after this long"
    )]
    pub timeout: u64,

    #[arg(short = 'v', long = "verbose", help = "Log every request to stderr")]
    pub verbose: bool,
}

impl DaemonArgs {
    pub fn config(&self) -> Result<DaemonConfig> {
        if self.timeout == 0 {
            return Err(Error::Config("--timeout must be at least 1 second".to_owned()));
        }
        Ok(DaemonConfig {
            transport: Transport::parse(&self.docker_host, self.protocol)?,
            timeout: Duration::from_secs(self.timeout),
        })
    }
}

#[cfg(test)]
mod unit {
    use clap::Parser;

    use super::*;

    #[derive(Parser, Debug)]
    struct Wrapper {
        #[command(flatten)]
        daemon: DaemonArgs,
    }

    fn parse(argv: &[&str]) -> DaemonArgs {
        Wrapper::try_parse_from(argv).unwrap().daemon
    }

    #[test]
    fn builds_a_tcp_config() {
        let args = parse(&["check", "-H", "10.0.0.2:2376", "-p", "http", "--timeout", "3"]);
        assert_eq!(
            args.config().unwrap(),
            DaemonConfig {
                transport: Transport::Tcp {
                    host: "10.0.0.2".into(),
                    port: 2376
                },
                timeout: Duration::from_secs(3),
            }
        );
    }

    #[test]
    fn scheme_in_host_picks_protocol() {
        let args = parse(&["check", "--docker-host", "unix:///run/docker.sock"]);
        assert_eq!(
            args.config().unwrap().transport,
            Transport::Unix("/run/docker.sock".into())
        );
    }

    #[test]
    fn rejects_bad_flags() {
        assert!(Wrapper::try_parse_from(["check", "-p", "ftp"]).is_err());
        let args = parse(&["check", "-H", "/run/docker.sock", "--timeout", "0"]);
        match args.config() {
            Err(Error::Config(_)) => {}
            other => panic!("expected a config error, got {:?}", other),
        }
    }
}
