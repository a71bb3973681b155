//! Decide whether containers and services are alive
//!
//! A container is alive when the daemon says it is running. A service is
//! alive as long as at least one of its tasks is running: losing some
//! replicas is reported, but it doesn't change the status.

use std::fmt;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::client::DockerApi;
use crate::compose::Manifest;
use crate::error::Result;
use crate::resources::{self, Resource, Task};
use crate::{Finding, Report, Status};

/// The state every healthy container and task is in
pub const RUNNING: &str = "running";

pub fn is_alive(state: &str) -> bool {
    state == RUNNING
}

#[derive(Debug, Deserialize)]
struct ContainerDoc {
    #[serde(rename = "State")]
    state: ContainerState,
}

/// The part of `containers/{id}/json` that says whether a container is up
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ContainerState {
    #[serde(rename = "Running")]
    pub running: bool,
    #[serde(rename = "Status", default)]
    pub status: String,
}

impl ContainerState {
    /// What to call the state in a message, e.g. `exited`
    pub fn describe(&self) -> &str {
        if self.running {
            RUNNING
        } else if self.status.is_empty() {
            "not running"
        } else {
            &self.status
        }
    }
}

/// Inspect one container by id or name
///
/// A container the daemon doesn't know about is `Error::NotFound`.
pub fn container_state<A: DockerApi>(api: &A, reference: &str) -> Result<ContainerState> {
    let doc: ContainerDoc = api
        .get_as(&format!("containers/{}/json", reference))
        .map_err(|e| e.for_resource(reference))?;
    Ok(doc.state)
}

/// The status of one container, with a message naming it
pub fn container_finding<A: DockerApi>(api: &A, reference: &str, host: &str) -> Finding {
    match container_state(api, reference) {
        Ok(ref state) if state.running => {
            Finding::new(Status::Ok, format!("{} is running on {}.", reference, host))
        }
        Ok(state) => Finding::new(
            Status::Critical,
            format!("{} is {} on {}.", reference, state.describe(), host),
        ),
        Err(e) => {
            debug!(container = reference, error = %e, "inspect failed");
            Finding::new(e.liveness_status(), format!("{}: {}", reference, e))
        }
    }
}

/// Which containers `check_containers` looks at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerQuery {
    /// Check exactly this container, ignoring `filter`
    pub container: Option<String>,
    pub filter: String,
    /// Refer to containers by their display name instead of their id
    pub by_name: bool,
    /// Include stopped containers when enumerating
    pub all: bool,
    /// The status when nothing matches `filter`
    pub missing: Status,
}

/// Check that every matching container is running
///
/// `host` only appears in messages. The only errors returned are the ones
/// that stop the containers from being listed at all.
pub fn check_containers<A: DockerApi>(
    api: &A,
    query: &ContainerQuery,
    host: &str,
) -> Result<Report> {
    if let Some(ref container) = query.container {
        return Ok(Report::from_findings(
            "containers",
            vec![container_finding(api, container, host)],
        ));
    }

    let found = resources::containers(api, &query.filter, query.all)?;
    if found.is_empty() {
        return Ok(Report::new(
            query.missing,
            format!("Not found: {}", query.filter),
        ));
    }
    let findings = found
        .iter()
        .map(|container| container_finding(api, container.reference(query.by_name), host))
        .collect();
    Ok(Report::from_findings("containers", findings))
}

/// How many of a service's tasks are up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHealth {
    pub service: Resource,
    /// Replicas the deployment manifest asks for, if there is one
    pub desired: Option<u64>,
    pub running: usize,
    pub tasks: usize,
    /// One line per task that isn't running
    pub problems: Vec<String>,
}

impl ServiceHealth {
    pub fn status(&self) -> Status {
        if self.running == 0 {
            Status::Critical
        } else {
            Status::Ok
        }
    }

    pub fn finding(&self) -> Finding {
        Finding::new(self.status(), self.to_string())
    }
}

impl fmt::Display for ServiceHealth {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}: {} of {} tasks running",
            self.service.name, self.running, self.tasks
        )?;
        if let Some(desired) = self.desired {
            write!(f, " ({} desired)", desired)?;
        }
        Ok(())
    }
}

/// Look at every task of `service`
///
/// Each task is re-read on its own so its state is current. If that read
/// fails the state from the task list is used instead.
pub fn service_health<A: DockerApi>(
    api: &A,
    service: &Resource,
    desired: Option<u64>,
) -> Result<ServiceHealth> {
    let listed = resources::tasks(api, &service.id)?;
    let mut health = ServiceHealth {
        service: service.clone(),
        desired,
        running: 0,
        tasks: listed.len(),
        problems: Vec::new(),
    };
    for summary in listed {
        let task = resources::task(api, &summary.id).unwrap_or_else(|e| {
            warn!(task = %summary.id, error = %e, "could not refresh task, using listed state");
            summary
        });
        if task.is_running() {
            health.running += 1;
        } else {
            health.problems.push(task_problem(api, service, &task));
        }
    }
    Ok(health)
}

fn task_problem<A: DockerApi>(api: &A, service: &Resource, task: &Task) -> String {
    let node = match task.node_id {
        Some(ref id) => resources::node_hostname(api, id).unwrap_or_else(|e| {
            warn!(node = %id, error = %e, "could not look up node hostname");
            id.clone()
        }),
        None => "no node".to_owned(),
    };
    format!(
        "WARNING Stack: {}, Service: {}, Task: {} => task is {} on {}",
        service.group.as_deref().unwrap_or("-"),
        service.name,
        task.id,
        task.status.state,
        node
    )
}

/// Which services `check_services` looks at
#[derive(Debug, Clone, Default)]
pub struct ServiceQuery {
    pub filter: String,
    pub manifest: Option<Manifest>,
    /// The status when nothing matches `filter`
    pub missing: Status,
}

/// Check that every matching swarm service has at least one running task
pub fn check_services<A: DockerApi>(api: &A, query: &ServiceQuery) -> Result<Report> {
    if !resources::is_swarm_manager(api)? {
        return Ok(Report::new(
            Status::Ok,
            "This node is not a swarm manager, run this check on a manager node",
        ));
    }

    let found = resources::services(api, &query.filter)?;
    if found.is_empty() {
        return Ok(Report::new(
            query.missing,
            format!("Not found: {}", query.filter),
        ));
    }

    let mut findings = Vec::with_capacity(found.len());
    let mut problems = Vec::new();
    for service in &found {
        let desired = query
            .manifest
            .as_ref()
            .and_then(|manifest| manifest.desired_replicas(&service.name));
        match service_health(api, service, desired) {
            Ok(health) => {
                findings.push(health.finding());
                problems.extend(health.problems);
            }
            Err(e) => findings.push(Finding::new(
                e.liveness_status(),
                format!("{}: {}", service.name, e),
            )),
        }
    }

    let mut report = Report::from_findings("services", findings);
    report.details.extend(problems);
    Ok(report)
}
