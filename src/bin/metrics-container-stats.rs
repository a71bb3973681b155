//! Print the resource usage of swarm service containers as Graphite metrics
//!
//! Every number in `docker stats` for each container whose name contains a
//! service's name becomes one `<scheme>.<container>.<path> <value> <time>`
//! line. Exits WARNING if some containers' stats could not be read.

use chrono::Utc;
use clap::Parser;
use nix::unistd::gethostname;
use tracing::warn;

use docker_plugins::cli::DaemonArgs;
use docker_plugins::client::DockerClient;
use docker_plugins::metrics::{collect, Collection, Flattener};
use docker_plugins::{logging, Report, Result, Status};

/// Print the resource usage of swarm service containers as Graphite metrics
///
/// Every number in `docker stats` for each container whose name contains a
/// service's name becomes one `<scheme>.<container>.<path> <value> <time>`
/// line. Exits WARNING if some containers' stats could not be read.
#[derive(Parser, Debug)]
#[command(name = "metrics-container-stats (part of docker-plugins)")]
struct Args {
    #[command(flatten)]
    daemon: DaemonArgs,

    #[arg(
        short = 's',
        long = "scheme",
        help = "Metric naming scheme, text to prepend to metric [default: <hostname>.docker]"
    )]
    scheme: Option<String>,

    #[arg(
        long = "skip-key",
        value_name = "KEY",
        help = "Leave out this key and everything under it, wherever it appears; can be given \
                multiple times. `read` is always left out"
    )]
    skip_keys: Vec<String>,
}

impl Args {
    fn scheme(&self) -> String {
        match self.scheme {
            Some(ref scheme) => scheme.clone(),
            None => default_scheme(),
        }
    }
}

fn default_scheme() -> String {
    let host = match gethostname() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(e) => {
            warn!(error = %e, "could not read the hostname");
            "localhost".to_owned()
        }
    };
    format!("{}.docker", host)
}

fn run(args: &Args) -> Result<Collection> {
    let client = DockerClient::new(args.daemon.config()?)?;
    let flattener = Flattener::new(args.skip_keys.clone());
    collect(&client, &args.scheme(), &flattener, Utc::now().timestamp())
}

#[cfg_attr(test, allow(dead_code))]
fn main() {
    let args = Args::parse();
    logging::init(args.daemon.verbose);
    match run(&args) {
        Ok(collection) => {
            for point in &collection.points {
                println!("{}", point);
            }
            if collection.failures > 0 {
                println!(
                    "{}: could not read the stats of {} containers",
                    Status::Warning,
                    collection.failures
                );
                Status::Warning.exit();
            }
            Status::Ok.exit();
        }
        Err(e) => Report::from_error(&e).exit(),
    }
}

#[cfg(test)]
mod unit {
    use clap::Parser;

    use super::Args;

    fn build_args(argv: &[&str]) -> Args {
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn explicit_scheme() {
        let args = build_args(&["metrics-container-stats", "-s", "prod.swarm"]);
        assert_eq!(args.scheme(), "prod.swarm");
    }

    #[test]
    fn default_scheme_ends_in_docker() {
        let args = build_args(&["metrics-container-stats"]);
        let scheme = args.scheme();
        assert!(scheme.ends_with(".docker"), "{}", scheme);
        assert!(scheme.len() > ".docker".len());
    }

    #[test]
    fn skip_keys_repeat() {
        let args = build_args(&[
            "metrics-container-stats",
            "--skip-key",
            "blkio_stats",
            "--skip-key",
            "networks",
        ]);
        assert_eq!(args.skip_keys, ["blkio_stats", "networks"]);
    }
}
