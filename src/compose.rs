//! The replica counts a docker-compose file asks for
//!
//! Only `services.<name>.deploy` is read, everything else in the file is
//! ignored.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    services: HashMap<String, ServiceEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
struct ServiceEntry {
    #[serde(default)]
    deploy: Option<Deploy>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
struct Deploy {
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    replicas: Option<u64>,
}

impl Manifest {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Manifest> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("File {} could not be read: {}", path.display(), e))
        })?;
        text.parse().map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// How many replicas of a swarm service the file asks for
    ///
    /// Swarm names services `<stack>_<name>`, the file only knows `<name>`,
    /// so everything up to the first `_` is dropped before the lookup. A
    /// global service counts as one replica, as does one without a `deploy`
    /// section. `None` if the file doesn't mention the service.
    pub fn desired_replicas(&self, service: &str) -> Option<u64> {
        let entry = service
            .split_once('_')
            .and_then(|(_, name)| self.services.get(name))
            .or_else(|| self.services.get(service))?;
        let deploy = match entry.deploy {
            Some(ref deploy) => deploy,
            None => return Some(1),
        };
        if deploy.mode.as_deref() == Some("global") {
            Some(1)
        } else {
            Some(deploy.replicas.unwrap_or(1))
        }
    }
}

impl FromStr for Manifest {
    type Err = Error;

    /// Parse a compose file, resolving `<<: *anchor` merge keys first
    fn from_str(s: &str) -> Result<Manifest> {
        let invalid = |e: serde_yaml::Error| Error::Config(format!("Invalid compose file: {}", e));
        let mut doc: serde_yaml::Value = serde_yaml::from_str(s).map_err(invalid)?;
        doc.apply_merge().map_err(invalid)?;
        serde_yaml::from_value(doc).map_err(invalid)
    }
}

#[cfg(test)]
mod unit {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    const COMPOSE: &str = "
version: '3.7'
services:
  web:
    image: nginx
    deploy:
      replicas: 3
  agent:
    image: datadog/agent
    deploy:
      mode: global
  worker:
    image: busybox
  cache:
    deploy:
      mode: replicated
";

    #[test]
    fn replicas_by_service() {
        let manifest: Manifest = COMPOSE.parse().unwrap();
        assert_eq!(manifest.desired_replicas("shop_web"), Some(3));
        assert_eq!(manifest.desired_replicas("shop_agent"), Some(1));
        assert_eq!(manifest.desired_replicas("shop_worker"), Some(1));
        assert_eq!(manifest.desired_replicas("shop_cache"), Some(1));
        assert_eq!(manifest.desired_replicas("shop_db"), None);
    }

    #[test]
    fn unprefixed_names_still_match() {
        let manifest: Manifest = COMPOSE.parse().unwrap();
        assert_eq!(manifest.desired_replicas("web"), Some(3));
    }

    #[test]
    fn only_the_stack_prefix_is_dropped() {
        let manifest: Manifest = "services:\n  api_v2:\n    deploy:\n      replicas: 4\n"
            .parse()
            .unwrap();
        assert_eq!(manifest.desired_replicas("shop_api_v2"), Some(4));
    }

    #[test]
    fn merge_keys_are_resolved() {
        let manifest: Manifest = "
x-defaults: &defaults
  image: shop/api
  deploy:
    replicas: 4
services:
  api:
    <<: *defaults
  admin:
    <<: *defaults
    deploy:
      replicas: 1
"
        .parse()
        .unwrap();
        assert_eq!(manifest.desired_replicas("shop_api"), Some(4));
        assert_eq!(manifest.desired_replicas("shop_admin"), Some(1));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(COMPOSE.as_bytes()).unwrap();
        let manifest = Manifest::load(file.path()).unwrap();
        assert_eq!(manifest.desired_replicas("x_web"), Some(3));
    }

    #[test]
    fn bad_files_are_config_errors() {
        match Manifest::load("/nonexistent/docker-compose.yml") {
            Err(Error::Config(ref msg)) => assert!(msg.contains("/nonexistent/docker-compose.yml")),
            other => panic!("expected a config error, got {:?}", other),
        }
        match "services: [".parse::<Manifest>() {
            Err(Error::Config(_)) => {}
            other => panic!("expected a config error, got {:?}", other),
        }
    }
}
