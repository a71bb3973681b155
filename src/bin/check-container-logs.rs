//! Check docker logs for lines that indicate a problem
//!
//! A line is a problem if it contains any of the red flags and none of the
//! ignore patterns. Matching ignores case unless `--case-sensitive` is given.
//! The first problem in a container's logs makes the check CRITICAL.

use chrono::Utc;
use clap::Parser;

use docker_plugins::cli::DaemonArgs;
use docker_plugins::client::DockerClient;
use docker_plugins::logs::{check_logs, LogFilter, LogQuery, Lookback};
use docker_plugins::{logging, Report, Result, Status};

/// Check docker logs for lines that indicate a problem
///
/// A line is a problem if it contains any of the red flags and none of the
/// ignore patterns. Matching ignores case unless `--case-sensitive` is given.
/// The first problem in a container's logs makes the check CRITICAL.
#[derive(Parser, Debug)]
#[command(name = "check-container-logs (part of docker-plugins)")]
struct Args {
    #[command(flatten)]
    daemon: DaemonArgs,

    #[arg(
        short = 'n',
        long = "container-name",
        conflicts_with = "expression",
        help = "Id or name of the one container to scan"
    )]
    container: Option<String>,

    #[arg(
        short = 'e',
        long = "expression",
        default_value = "",
        help = "Scan every running container whose name contains this"
    )]
    expression: String,

    #[arg(
        short = 'N',
        long = "names",
        help = "Refer to containers by name instead of id"
    )]
    names: bool,

    #[arg(
        short = 'r',
        long = "red-flag",
        value_name = "SUBSTRING",
        help = "A log line containing this indicates an error; can be given multiple times"
    )]
    red_flags: Vec<String>,

    #[arg(
        short = 'i',
        long = "ignore-lines-with",
        value_name = "SUBSTRING",
        help = "A log line containing this is never an error; can be given multiple times"
    )]
    ignore: Vec<String>,

    #[arg(
        short = 'c',
        long = "case-sensitive",
        help = "Match red flags and ignored lines case-sensitively"
    )]
    case_sensitive: bool,

    #[arg(
        short = 't',
        long = "hours-ago",
        value_name = "HOURS",
        help = "Only read the logs of the last HOURS hours"
    )]
    hours_ago: Option<u64>,

    #[arg(
        short = 's',
        long = "seconds-ago",
        value_name = "SECONDS",
        help = "Only read the logs of the last SECONDS seconds, ignored with --hours-ago"
    )]
    seconds_ago: Option<u64>,

    #[arg(
        long = "missing",
        value_name = "STATUS",
        default_value = "warning",
        help = "Status to exit with when nothing matches --expression"
    )]
    missing: Status,
}

impl Args {
    fn filter(&self) -> Result<LogFilter> {
        LogFilter::new(
            self.red_flags.clone(),
            self.ignore.clone(),
            self.case_sensitive,
        )
    }

    fn query(&self) -> LogQuery {
        LogQuery {
            container: self.container.clone(),
            filter: self.expression.clone(),
            by_name: self.names,
            lookback: Lookback::from_flags(self.hours_ago, self.seconds_ago),
            missing: self.missing,
        }
    }
}

fn run(args: &Args) -> Result<Report> {
    let filter = args.filter()?;
    let client = DockerClient::new(args.daemon.config()?)?;
    check_logs(&client, &args.query(), &filter, Utc::now())
}

#[cfg_attr(test, allow(dead_code))]
fn main() {
    let args = Args::parse();
    logging::init(args.daemon.verbose);
    run(&args)
        .unwrap_or_else(|e| Report::from_error(&e))
        .exit();
}
