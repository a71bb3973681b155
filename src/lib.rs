//! Docker plugins: strongly typed Sensu checks for the Docker daemon
//!
//! The checks in `src/bin` talk to the Docker daemon's REST API, over its
//! Unix socket or over TCP, and report in the usual Sensu/Nagios style: a
//! line of text on stdout and an exit code of 0 (OK), 1 (WARNING) or 2
//! (CRITICAL). See the [`scripts`](scripts/index.html) module for the
//! `--help` of each one.
//!
//! The library is the part the checks share:
//!
//! * [`client`](client/index.html) makes `GET` requests against the daemon
//! * [`resources`](resources/index.html) finds containers, services and tasks
//!   by name
//! * [`classify`](classify/index.html) decides whether they are alive
//! * [`logs`](logs/index.html) scans container logs for red flags
//! * [`metrics`](metrics/index.html) flattens container stats into Graphite
//!   metrics
//!
//! Every check is a single, sequential pass: poll, compute, report, exit.

use std::cmp::max;
use std::fmt;
use std::process;
use std::str::FromStr;

pub mod classify;
pub mod cli;
pub mod client;
pub mod compose;
pub mod error;
pub mod logging;
pub mod logs;
pub mod metrics;
pub mod resources;
pub mod scripts;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};

/// How healthy a check thinks the world is
///
/// Statuses are ordered, `Ok < Warning < Critical`, so the status of many
/// resources is just the `max` of them.
#[must_use]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Status {
    #[default]
    Ok,
    Warning,
    Critical,
}

impl Status {
    /// Exit the process with the exit code Sensu expects for this status
    pub fn exit(self) -> ! {
        process::exit(self.code())
    }

    pub fn code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Warning => 1,
            Status::Critical => 2,
        }
    }

    /// The worst of a set of statuses, `Ok` if there are none
    pub fn worst<I: IntoIterator<Item = Status>>(statuses: I) -> Status {
        statuses.into_iter().fold(Status::Ok, max)
    }

    pub fn str_values() -> [&'static str; 3] {
        ["ok", "warning", "critical"]
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Status, String> {
        match s.to_ascii_lowercase().as_ref() {
            "ok" => Ok(Status::Ok),
            "warning" | "warn" => Ok(Status::Warning),
            "critical" | "crit" => Ok(Status::Critical),
            _ => Err(format!(
                "Unexpected status '{}', expected one of: {}",
                s,
                Status::str_values().join(", ")
            )),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match *self {
            Status::Ok => "OK",
            Status::Warning => "WARNING",
            Status::Critical => "CRITICAL",
        };
        write!(f, "{}", name)
    }
}

/// What one resource looked like to a check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub status: Status,
    pub message: String,
}

impl Finding {
    pub fn new<S: Into<String>>(status: Status, message: S) -> Finding {
        Finding {
            status,
            message: message.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

/// Everything a check prints before it exits
///
/// The summary goes on the first line, prefixed by the status. Details, if
/// there are any, go on the following lines.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub status: Status,
    pub summary: String,
    pub details: Vec<String>,
}

impl Report {
    pub fn new<S: Into<String>>(status: Status, summary: S) -> Report {
        Report {
            status,
            summary: summary.into(),
            details: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Report {
        self.details = details;
        self
    }

    /// The report for a check that could not finish
    pub fn from_error(err: &Error) -> Report {
        Report::new(err.status(), err.to_string())
    }

    /// Summarize one finding per resource
    ///
    /// A single finding is its own summary. With more than one, the summary
    /// counts how many are not OK and every finding is listed underneath.
    pub fn from_findings(noun: &str, findings: Vec<Finding>) -> Report {
        if findings.len() == 1 {
            let finding = &findings[0];
            return Report::new(finding.status, finding.message.clone());
        }
        let status = Status::worst(findings.iter().map(|f| f.status));
        let bad = findings.iter().filter(|f| f.status != Status::Ok).count();
        let summary = if bad == 0 {
            format!("All {} {} are OK", findings.len(), noun)
        } else {
            format!("{} of {} {} are not OK", bad, findings.len(), noun)
        };
        Report::new(status, summary)
            .with_details(findings.iter().map(|f| f.to_string()).collect())
    }

    /// Print the report and exit with its status
    pub fn exit(self) -> ! {
        println!("{}", self);
        self.status.exit()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.summary)?;
        for line in &self.details {
            write!(f, "\n{}", line)?;
        }
        Ok(())
    }
}
