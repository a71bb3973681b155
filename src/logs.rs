//! Scan container logs for lines that indicate a problem
//!
//! The daemon sends the logs of a container without a TTY multiplexed: every
//! frame starts with an 8-byte header, the stream (0 stdin, 1 stdout,
//! 2 stderr, 3 for errors of the daemon itself), three zero bytes and the
//! big-endian length of the payload. TTY containers send plain text.
//! `LogDecoder` handles both and turns either into lines, no matter how the
//! frames and lines are split across reads.

use std::borrow::Cow;
use std::cmp::min;
use std::mem;
use std::ops::ControlFlow;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::client::DockerApi;
use crate::error::{Error, Result};
use crate::resources;
use crate::{Finding, Report, Status};

const HEADER_LEN: usize = 8;

/// What makes a log line a problem
///
/// A line is a problem if it contains any red flag and none of the ignore
/// patterns. Matching is by substring and ignores case unless asked not to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    red_flags: Vec<String>,
    ignore: Vec<String>,
    case_sensitive: bool,
}

impl LogFilter {
    pub fn new(
        red_flags: Vec<String>,
        ignore: Vec<String>,
        case_sensitive: bool,
    ) -> Result<LogFilter> {
        if red_flags.is_empty() {
            return Err(Error::Config(
                "No red flags to look for, pass at least one --red-flag".to_owned(),
            ));
        }
        let fold = |patterns: Vec<String>| -> Vec<String> {
            if case_sensitive {
                patterns
            } else {
                patterns.iter().map(|p| p.to_lowercase()).collect()
            }
        };
        Ok(LogFilter {
            red_flags: fold(red_flags),
            ignore: fold(ignore),
            case_sensitive,
        })
    }

    pub fn is_problem(&self, line: &str) -> bool {
        let line = if self.case_sensitive {
            Cow::Borrowed(line)
        } else {
            Cow::Owned(line.to_lowercase())
        };
        let contains = |pattern: &String| line.contains(pattern.as_str());
        !self.ignore.iter().any(contains) && self.red_flags.iter().any(contains)
    }

    /// The first problem line in a block of already decoded text
    pub fn first_problem<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.lines().find(|line| self.is_problem(line))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    Multiplexed,
    Raw,
}

fn detect_framing(start: &[u8]) -> Framing {
    if start[0] <= 3 && start[1..4] == [0, 0, 0] {
        Framing::Multiplexed
    } else {
        Framing::Raw
    }
}

/// Turns the chunks of a log stream into lines
#[derive(Debug, Default)]
pub struct LogDecoder {
    framing: Option<Framing>,
    /// Bytes not yet decoded: a partial header, or everything before the
    /// framing is known
    pending: Vec<u8>,
    /// Payload bytes left in the current frame
    frame_left: usize,
    line: Vec<u8>,
}

impl LogDecoder {
    pub fn new() -> LogDecoder {
        LogDecoder::default()
    }

    /// Decode another chunk, returning every line it completed
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        self.pending.extend_from_slice(chunk);
        let framing = match self.framing {
            Some(framing) => framing,
            // the header's zero bytes are needed to tell the formats apart
            None if self.pending.len() < 4 => return lines,
            None => {
                let framing = detect_framing(&self.pending);
                debug!(?framing, "detected log framing");
                self.framing = Some(framing);
                framing
            }
        };

        match framing {
            Framing::Raw => {
                let text = mem::take(&mut self.pending);
                self.text(&text, &mut lines);
            }
            Framing::Multiplexed => loop {
                if self.frame_left == 0 {
                    if self.pending.len() < HEADER_LEN {
                        break;
                    }
                    let mut len = [0; 4];
                    len.copy_from_slice(&self.pending[4..HEADER_LEN]);
                    self.frame_left = u32::from_be_bytes(len) as usize;
                    self.pending.drain(..HEADER_LEN);
                    continue;
                }
                if self.pending.is_empty() {
                    break;
                }
                let take = min(self.frame_left, self.pending.len());
                let payload: Vec<u8> = self.pending.drain(..take).collect();
                self.frame_left -= take;
                self.text(&payload, &mut lines);
            },
        }
        lines
    }

    /// The stream ended: hand back whatever is left as lines
    pub fn finish(mut self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.framing.is_none() {
            let text = mem::take(&mut self.pending);
            self.text(&text, &mut lines);
        }
        if !self.line.is_empty() {
            lines.push(decode_line(&self.line));
        }
        lines
    }

    fn text(&mut self, bytes: &[u8], lines: &mut Vec<String>) {
        let mut rest = bytes;
        while let Some(end) = rest.iter().position(|&b| b == b'\n') {
            self.line.extend_from_slice(&rest[..end]);
            lines.push(decode_line(&self.line));
            self.line.clear();
            rest = &rest[end + 1..];
        }
        self.line.extend_from_slice(rest);
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let mut line = String::from_utf8_lossy(bytes).into_owned();
    if line.ends_with('\r') {
        line.pop();
    }
    line
}

/// How far back to read the logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookback {
    Hours(u64),
    Seconds(u64),
}

impl Lookback {
    /// Hours win if both are given
    pub fn from_flags(hours: Option<u64>, seconds: Option<u64>) -> Option<Lookback> {
        match (hours, seconds) {
            (Some(hours), _) => Some(Lookback::Hours(hours)),
            (None, Some(seconds)) => Some(Lookback::Seconds(seconds)),
            (None, None) => None,
        }
    }

    pub fn seconds(self) -> u64 {
        match self {
            Lookback::Hours(hours) => hours.saturating_mul(3600),
            Lookback::Seconds(seconds) => seconds,
        }
    }

    /// The unix timestamp to pass as `since`
    pub fn since(self, now: DateTime<Utc>) -> i64 {
        let ago = i64::try_from(self.seconds()).unwrap_or(i64::MAX);
        now.timestamp().saturating_sub(ago).max(0)
    }
}

pub fn logs_path(reference: &str, since: Option<i64>) -> String {
    let mut path = format!("containers/{}/logs?stdout=true&stderr=true", reference);
    if let Some(since) = since {
        path.push_str(&format!("&since={}", since));
    }
    path
}

/// The first problem line in a container's logs, if there is one
///
/// Nothing after the first problem is read.
pub fn scan<A: DockerApi>(
    api: &A,
    reference: &str,
    since: Option<i64>,
    filter: &LogFilter,
) -> Result<Option<String>> {
    let mut decoder = LogDecoder::new();
    let mut found = None;
    api.stream(&logs_path(reference, since), &mut |chunk| {
        match decoder.push(chunk).into_iter().find(|line| filter.is_problem(line)) {
            Some(line) => {
                found = Some(line);
                ControlFlow::Break(())
            }
            None => ControlFlow::Continue(()),
        }
    })
    .map_err(|e| e.for_resource(reference))?;

    if found.is_none() {
        found = decoder
            .finish()
            .into_iter()
            .find(|line| filter.is_problem(line));
    }
    Ok(found)
}

/// Whose logs `check_logs` reads
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    /// Scan exactly this container, ignoring `filter`
    pub container: Option<String>,
    pub filter: String,
    /// Refer to containers by their display name instead of their id
    pub by_name: bool,
    pub lookback: Option<Lookback>,
    /// The status when nothing matches `filter`
    pub missing: Status,
}

pub fn check_logs<A: DockerApi>(
    api: &A,
    query: &LogQuery,
    filter: &LogFilter,
    now: DateTime<Utc>,
) -> Result<Report> {
    let targets = match query.container {
        Some(ref container) => vec![container.clone()],
        None => resources::containers(api, &query.filter, false)?
            .iter()
            .map(|c| c.reference(query.by_name).to_owned())
            .collect(),
    };
    if targets.is_empty() {
        return Ok(Report::new(
            query.missing,
            format!("Not found: {}", query.filter),
        ));
    }

    let since = query.lookback.map(|lookback| lookback.since(now));
    let findings = targets
        .iter()
        .map(|container| match scan(api, container, since, filter) {
            Ok(Some(line)) => Finding::new(
                Status::Critical,
                format!("{} container logs indicate problem: '{}'.", container, line),
            ),
            Ok(None) => Finding::new(
                Status::Ok,
                format!("No errors detected from {} container logs.", container),
            ),
            Err(e) => Finding::new(e.status(), format!("{}: {}", container, e)),
        })
        .collect();
    Ok(Report::from_findings("containers", findings))
}
