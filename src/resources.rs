//! Find the containers, services and tasks a check should look at
//!
//! Names are matched by plain, case-sensitive substring containment: the
//! filter `service` matches `myapp_service.2`, and the empty filter matches
//! everything. Finding nothing is not an error, callers decide what an
//! empty list means.

use std::collections::HashMap;

use serde::Deserialize;

use crate::classify::is_alive;
use crate::client::DockerApi;
use crate::error::{Error, Result};

/// Label swarm puts on services deployed with `docker stack deploy`
pub const STACK_LABEL: &str = "com.docker.stack.namespace";

/// What the daemon says on `GET /nodes` when it can't answer for the swarm
pub const NOT_A_MANAGER: &str = "This node is not a swarm manager";

/// A container or service, as far as matching and reporting are concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub id: String,
    pub name: String,
    /// The stack a service belongs to
    pub group: Option<String>,
}

impl Resource {
    pub fn matches(&self, filter: &str) -> bool {
        self.name.contains(filter)
    }

    /// How to refer to this resource in API paths and messages
    pub fn reference(&self, by_name: bool) -> &str {
        if by_name {
            &self.name
        } else {
            &self.id
        }
    }
}

/// Keep the resources whose name contains `filter`, in the order given
pub fn by_name(resources: Vec<Resource>, filter: &str) -> Vec<Resource> {
    resources.into_iter().filter(|r| r.matches(filter)).collect()
}

#[derive(Debug, Deserialize)]
struct ContainerSummary {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Names", default)]
    names: Vec<String>,
}

impl From<ContainerSummary> for Resource {
    fn from(summary: ContainerSummary) -> Resource {
        // names come back as "/name"
        let name = summary
            .names
            .first()
            .map(|name| name.trim_start_matches('/').to_owned())
            .unwrap_or_default();
        Resource {
            id: summary.id,
            name,
            group: None,
        }
    }
}

/// Containers whose name contains `filter`
///
/// Only running containers are listed unless `all` is set.
pub fn containers<A: DockerApi>(api: &A, filter: &str, all: bool) -> Result<Vec<Resource>> {
    let path = if all {
        "containers/json?all=1"
    } else {
        "containers/json"
    };
    let summaries: Vec<ContainerSummary> = api.get_as(path)?;
    Ok(by_name(
        summaries.into_iter().map(Resource::from).collect(),
        filter,
    ))
}

#[derive(Debug, Deserialize)]
struct ServiceDoc {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Spec")]
    spec: ServiceSpec,
}

#[derive(Debug, Deserialize)]
struct ServiceSpec {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Labels", default)]
    labels: Option<HashMap<String, String>>,
}

/// Swarm services whose name contains `filter`
pub fn services<A: DockerApi>(api: &A, filter: &str) -> Result<Vec<Resource>> {
    let docs: Vec<ServiceDoc> = api.get_as("services")?;
    let services = docs
        .into_iter()
        .map(|doc| Resource {
            id: doc.id,
            group: doc
                .spec
                .labels
                .and_then(|mut labels| labels.remove(STACK_LABEL)),
            name: doc.spec.name,
        })
        .collect();
    Ok(by_name(services, filter))
}

/// One replica of a swarm service
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Task {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "ServiceID")]
    pub service_id: String,
    #[serde(rename = "NodeID", default)]
    pub node_id: Option<String>,
    #[serde(rename = "Status")]
    pub status: TaskStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskStatus {
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Message", default)]
    pub message: Option<String>,
}

impl Task {
    pub fn is_running(&self) -> bool {
        is_alive(&self.status.state)
    }
}

/// The tasks belonging to a service, in the order the daemon lists them
pub fn tasks<A: DockerApi>(api: &A, service_id: &str) -> Result<Vec<Task>> {
    let tasks: Vec<Task> = api.get_as("tasks")?;
    Ok(tasks
        .into_iter()
        .filter(|task| task.service_id.contains(service_id))
        .collect())
}

/// The current state of one task
pub fn task<A: DockerApi>(api: &A, id: &str) -> Result<Task> {
    api.get_as(&format!("tasks/{}", id))
        .map_err(|e| e.for_resource(id))
}

#[derive(Debug, Deserialize)]
struct NodeDoc {
    #[serde(rename = "Description")]
    description: NodeDescription,
}

#[derive(Debug, Deserialize)]
struct NodeDescription {
    #[serde(rename = "Hostname")]
    hostname: String,
}

pub fn node_hostname<A: DockerApi>(api: &A, id: &str) -> Result<String> {
    let node: NodeDoc = api
        .get_as(&format!("nodes/{}", id))
        .map_err(|e| e.for_resource(id))?;
    Ok(node.description.hostname)
}

/// Whether the daemon can answer questions about the whole swarm
///
/// Workers, and daemons that aren't part of a swarm, refuse to list nodes.
pub fn is_swarm_manager<A: DockerApi>(api: &A) -> Result<bool> {
    match api.get_bytes("nodes") {
        Ok(_) => Ok(true),
        Err(Error::Status { ref message, .. }) if message.contains(NOT_A_MANAGER) => Ok(false),
        Err(e) => Err(e),
    }
}
