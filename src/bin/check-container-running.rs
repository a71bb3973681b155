//! Check that docker containers are running
//!
//! Either one container, given by id or name, or every running container
//! whose name contains an expression. Any container that is not running is
//! CRITICAL, as is an explicit container docker doesn't know about.

use clap::Parser;

use docker_plugins::classify::{check_containers, ContainerQuery};
use docker_plugins::cli::DaemonArgs;
use docker_plugins::client::DockerClient;
use docker_plugins::{logging, Report, Result, Status};

/// Check that docker containers are running
///
/// Either one container, given by id or name, or every running container
/// whose name contains an expression. Any container that is not running is
/// CRITICAL, as is an explicit container docker doesn't know about.
#[derive(Parser, Debug)]
#[command(name = "check-container-running (part of docker-plugins)")]
struct Args {
    #[command(flatten)]
    daemon: DaemonArgs,

    #[arg(
        short = 'c',
        long = "container",
        conflicts_with = "expression",
        help = "Id or name of the one container to check"
    )]
    container: Option<String>,

    #[arg(
        short = 'e',
        long = "expression",
        default_value = "",
        help = "Check every container whose name contains this"
    )]
    expression: String,

    #[arg(
        short = 'n',
        long = "names",
        help = "Refer to containers by name instead of id"
    )]
    names: bool,

    #[arg(
        short = 'a',
        long = "all",
        help = "Also look at stopped containers when matching --expression"
    )]
    all: bool,

    #[arg(
        long = "missing",
        value_name = "STATUS",
        default_value = "warning",
        help = "Status to exit with when nothing matches --expression"
    )]
    missing: Status,
}

impl Args {
    fn query(&self) -> ContainerQuery {
        ContainerQuery {
            container: self.container.clone(),
            filter: self.expression.clone(),
            by_name: self.names,
            all: self.all,
            missing: self.missing,
        }
    }
}

fn run(args: &Args) -> Result<Report> {
    let client = DockerClient::new(args.daemon.config()?)?;
    let host = client.config().transport.to_string();
    check_containers(&client, &args.query(), &host)
}

#[cfg_attr(test, allow(dead_code))]
fn main() {
    let args = Args::parse();
    logging::init(args.daemon.verbose);
    run(&args)
        .unwrap_or_else(|e| Report::from_error(&e))
        .exit();
}
