//! Check that every swarm service has at least one running task
//!
//! A service with no running tasks is CRITICAL. Tasks that are down while
//! others still run are listed, but the service is still OK. Run this on a
//! swarm manager, workers can't see the state of the swarm.

use clap::Parser;

use docker_plugins::classify::{check_services, ServiceQuery};
use docker_plugins::cli::DaemonArgs;
use docker_plugins::client::DockerClient;
use docker_plugins::compose::Manifest;
use docker_plugins::{logging, Report, Result, Status};

/// Check that every swarm service has at least one running task
///
/// A service with no running tasks is CRITICAL. Tasks that are down while
/// others still run are listed, but the service is still OK. Run this on a
/// swarm manager, workers can't see the state of the swarm.
#[derive(Parser, Debug)]
#[command(name = "check-container-services (part of docker-plugins)")]
struct Args {
    #[command(flatten)]
    daemon: DaemonArgs,

    #[arg(
        short = 'e',
        long = "expression",
        default_value = "",
        help = "Only check services whose name contains this"
    )]
    expression: String,

    #[arg(
        short = 'f',
        long = "compose",
        value_name = "COMPOSE_YAML_FILE",
        help = "docker-compose file to read the desired number of replicas from"
    )]
    compose: Option<String>,

    #[arg(
        long = "missing",
        value_name = "STATUS",
        default_value = "ok",
        help = "Status to exit with when no service matches --expression"
    )]
    missing: Status,
}

fn run(args: &Args) -> Result<Report> {
    let manifest = match args.compose {
        Some(ref path) => Some(Manifest::load(path)?),
        None => None,
    };
    let query = ServiceQuery {
        filter: args.expression.clone(),
        manifest,
        missing: args.missing,
    };
    let client = DockerClient::new(args.daemon.config()?)?;
    check_services(&client, &query)
}

#[cfg_attr(test, allow(dead_code))]
fn main() {
    let args = Args::parse();
    logging::init(args.daemon.verbose);
    run(&args)
        .unwrap_or_else(|e| Report::from_error(&e))
        .exit();
}

#[cfg(test)]
mod unit {
    use clap::Parser;

    use docker_plugins::{Error, Status};

    use super::{run, Args};

    fn build_args(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults() {
        let args = build_args(&["check-container-services"]);
        assert_eq!(args.expression, "");
        assert_eq!(args.compose, None);
        assert_eq!(args.missing, Status::Ok);
    }

    #[test]
    fn flags() {
        let args = build_args(&[
            "check-container-services",
            "-e",
            "shop",
            "-f",
            "/srv/docker-compose.yml",
        ]);
        assert_eq!(args.expression, "shop");
        assert_eq!(args.compose.as_deref(), Some("/srv/docker-compose.yml"));
    }

    #[test]
    fn missing_manifest_warns_before_connecting() {
        let args = build_args(&[
            "check-container-services",
            "-H",
            "/nonexistent/docker.sock",
            "-f",
            "/nonexistent/docker-compose.yml",
        ]);
        match run(&args) {
            Err(ref e @ Error::Config(_)) => assert_eq!(e.status(), Status::Warning),
            other => panic!("expected a config error, got {:?}", other),
        }
    }
}
