//! Turn container stats into Graphite metrics
//!
//! `GET containers/{id}/stats` answers with a nested JSON document. Every
//! number in it becomes one metric named after the keys leading to it, e.g.
//! `memory_stats.usage`. Arrays, strings, booleans and nulls have no place in
//! a flat list of numbers and are dropped.

use std::fmt;

use itertools::Itertools;
use serde_json::{Map, Number, Value};
use tracing::{debug, warn};

use crate::client::DockerApi;
use crate::error::Result;
use crate::resources;

/// Keys that are never turned into metrics. `read` is the time the stats
/// were taken, not a measurement.
pub const DEFAULT_SKIP: &[&str] = &["read"];

/// One line of Graphite's plaintext protocol
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    pub path: String,
    pub value: f64,
    pub timestamp: i64,
}

impl fmt::Display for MetricPoint {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.path, self.value, self.timestamp)
    }
}

/// Flattens nested documents into `(dotted.path, number)` pairs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flattener {
    skip: Vec<String>,
}

impl Default for Flattener {
    fn default() -> Flattener {
        Flattener::new(Vec::new())
    }
}

impl Flattener {
    /// Skip `read`, and any of `extra`, wherever they appear
    pub fn new(extra: Vec<String>) -> Flattener {
        let mut skip: Vec<String> = DEFAULT_SKIP.iter().map(|k| k.to_string()).collect();
        skip.extend(extra);
        Flattener { skip }
    }

    /// Every number in `doc`, ordered by path
    ///
    /// Keys may contain dots themselves (`eth0.100`), so two different keys
    /// can end up with the same path. Only the first one walked is kept.
    pub fn flatten(&self, doc: &Value) -> Vec<(String, f64)> {
        let mut out = Vec::new();
        self.walk(String::new(), doc, &mut out);
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out.dedup_by(|later, earlier| later.0 == earlier.0);
        out
    }

    fn walk(&self, path: String, value: &Value, out: &mut Vec<(String, f64)>) {
        match *value {
            Value::Object(ref map) => {
                for (key, child) in map {
                    if self.skip.iter().any(|skip| skip == key) {
                        continue;
                    }
                    let child_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", path, key)
                    };
                    self.walk(child_path, child, out);
                }
            }
            Value::Number(ref n) if !path.is_empty() => {
                if let Some(n) = n.as_f64() {
                    out.push((path, n));
                }
            }
            _ => {}
        }
    }
}

/// Flatten with the default skip list
pub fn flatten(doc: &Value) -> Vec<(String, f64)> {
    Flattener::default().flatten(doc)
}

/// Turn points back into a document that flattens to the same points
///
/// The document is one level deep, keyed by the full path. Splitting paths
/// back into nested objects would lose points whose path is a prefix of
/// another (`a` and `a.b`) and mangle keys that contain dots. Values that
/// JSON can't represent (NaN, infinities) are left out.
pub fn unflatten(points: &[(String, f64)]) -> Value {
    let root: Map<String, Value> = points
        .iter()
        .filter_map(|(path, value)| {
            Number::from_f64(*value).map(|n| (path.clone(), Value::Number(n)))
        })
        .collect();
    Value::Object(root)
}

/// One snapshot of a container's resource usage
pub fn container_stats<A: DockerApi>(api: &A, container: &str) -> Result<Value> {
    api.get(&format!("containers/{}/stats?stream=false", container))
        .map_err(|e| e.for_resource(container))
}

/// The metrics of every container that belongs to a swarm service
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    pub points: Vec<MetricPoint>,
    /// Containers whose stats could not be read
    pub failures: usize,
}

/// Read the stats of every container whose name contains a service's name
///
/// A container that matches several services is only read once. Failing to
/// read one container's stats is logged and counted, the others are still
/// collected.
pub fn collect<A: DockerApi>(
    api: &A,
    scheme: &str,
    flattener: &Flattener,
    timestamp: i64,
) -> Result<Collection> {
    let services = resources::services(api, "")?;
    let containers = resources::containers(api, "", false)?;
    let names: Vec<&str> = services
        .iter()
        .flat_map(|service| {
            containers
                .iter()
                .filter(move |container| container.matches(&service.name))
        })
        .map(|container| container.name.as_str())
        .unique()
        .collect();
    debug!(services = services.len(), containers = names.len(), "collecting stats");

    let mut collection = Collection::default();
    for name in names {
        match container_stats(api, name) {
            Ok(stats) => collection
                .points
                .extend(flattener.flatten(&stats).into_iter().map(|(path, value)| {
                    MetricPoint {
                        path: format!("{}.{}.{}", scheme, name, path),
                        value,
                        timestamp,
                    }
                })),
            Err(e) => {
                warn!(container = name, error = %e, "could not read stats");
                collection.failures += 1;
            }
        }
    }
    Ok(collection)
}


#[cfg(test)]
mod round_trip {
    use proptest::prelude::*;
    use serde_json::{Map, Value};

    use super::{flatten, unflatten};

    fn documents() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            any::<i32>().prop_map(Value::from),
            (-1.0e9f64..1.0e9).prop_map(Value::from),
            any::<bool>().prop_map(Value::from),
            Just(Value::Null),
            "[a-z]{0,4}".prop_map(Value::from),
        ];
        leaf.prop_recursive(4, 64, 5, |inner| {
            prop::collection::btree_map("read|[ab]{0,2}(\\.[ab0-9]{1,3})?", inner, 0..5)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>()))
        })
    }

    proptest! {
        #[test]
        fn flatten_unflatten_flatten(doc in documents()) {
            let flat = flatten(&doc);
            let rebuilt = unflatten(&flat);
            prop_assert_eq!(rebuilt.as_object().map(|o| o.len()), Some(flat.len()));
            prop_assert_eq!(flatten(&rebuilt), flat);
        }

        #[test]
        fn paths_are_sorted_and_unique(doc in documents()) {
            let flat = flatten(&doc);
            for pair in flat.windows(2) {
                prop_assert!(pair[0].0 < pair[1].0, "{:?}", pair);
            }
            for (path, _) in &flat {
                prop_assert!(!path.is_empty());
                prop_assert!(path.split('.').all(|key| key != "read"), "{}", path);
            }
        }
    }
}
