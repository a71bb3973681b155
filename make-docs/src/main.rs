//! Regenerate `src/scripts.rs` from the `--help` of every check
//!
//! Build the checks first, then run from the repository root:
//! `cargo run -p make-docs > src/scripts.rs`

use std::io;
use std::process::Command;

struct Check {
    name: &'static str,
    about: &'static str,
}

const CHECKS: &[Check] = &[
    Check {
        name: "check-container-running",
        about: "Needs access to the docker daemon's API.",
    },
    Check {
        name: "check-container-services",
        about: "Needs access to the API of a swarm manager.",
    },
    Check {
        name: "check-container-logs",
        about: "Needs access to the docker daemon's API. `--hours-ago` and \
                `--seconds-ago` need API version 1.19 or later.",
    },
    Check {
        name: "metrics-container-stats",
        about: "Needs access to the API of a swarm manager. Prints Graphite plaintext.",
    },
];

fn main() -> io::Result<()> {
    let preamble = "Documentation about the various scripts contained herein\n";

    let mut out: String = cp(preamble.split('\n'));
    out.push('\n');
    out.push_str(&cp(CHECKS.iter().map(|c| format!("- [{0}](#{0})", c.name))));
    out.push('\n');
    for check in CHECKS {
        out.push_str(&format!(
            "\
//!
//! # {0}
//!
//! {1}
//!
//! ```plain
//! $ {0} --help
",
            check.name, check.about
        ));
        let output = Command::new(format!("target/debug/{}", check.name))
            .arg("--help")
            .output()
            .map_err(|e| {
                io::Error::new(e.kind(), format!("Couldn't execute {}: {}", check.name, e))
            })?;
        let help = String::from_utf8(output.stdout).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("{} --help is not utf8: {}", check.name, e),
            )
        })?;
        out.push_str(&cp(help.trim_end().split('\n')));
        out.push_str("\n//! ```\n");
    }
    print!("{}", out);
    Ok(())
}

/// Comment each line in the iterator
fn cp<S: AsRef<str>, I: Iterator<Item = S>>(s: I) -> String {
    s.map(|s| format!("//! {}", s.as_ref()))
        .map(|s| s.trim().into())
        .collect::<Vec<String>>()
        .join("\n")
}
