//! Compose manifest model

use super::field::{lenient, Build, Command, External};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Decoded compose file
///
/// Entity maps are keyed by name and iterate in sorted order, so everything
/// derived from a manifest is reproducible regardless of the order the
/// source document used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Compose file version (informational)
    #[serde(default, deserialize_with = "lenient::text")]
    pub version: Option<String>,
    /// Networks
    #[serde(default, deserialize_with = "lenient::entity_map")]
    pub networks: BTreeMap<String, NetworkConfig>,
    /// Volumes
    #[serde(default, deserialize_with = "lenient::entity_map")]
    pub volumes: BTreeMap<String, VolumeConfig>,
    /// Services
    #[serde(default, deserialize_with = "lenient::entity_map")]
    pub services: BTreeMap<String, ServiceConfig>,
}

/// Top-level network declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Driver
    #[serde(default, deserialize_with = "lenient::text")]
    pub driver: Option<String>,
    /// Driver options
    #[serde(default, deserialize_with = "lenient::string_map")]
    pub driver_opts: BTreeMap<String, String>,
    /// External network
    #[serde(default)]
    pub external: External,
    /// Name the network is created under
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
}

impl NetworkConfig {
    /// Name shown for the network: the external name, then the declared
    /// `name`, then the manifest key.
    pub fn display_name<'a>(&'a self, key: &'a str) -> &'a str {
        self.external
            .name()
            .or(self.name.as_deref())
            .unwrap_or(key)
    }
}

/// Top-level volume declaration. Decoded but not drawn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VolumeConfig {
    /// Driver
    #[serde(default, deserialize_with = "lenient::text")]
    pub driver: Option<String>,
    /// External volume
    #[serde(default)]
    pub external: External,
    /// Driver options
    #[serde(default, deserialize_with = "lenient::string_map")]
    pub driver_opts: BTreeMap<String, String>,
}

/// Service definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Container name
    #[serde(default, deserialize_with = "lenient::text")]
    pub container_name: Option<String>,
    /// Image name
    #[serde(default, deserialize_with = "lenient::text")]
    pub image: Option<String>,
    /// Networks to attach to, possibly suffixed with `:alias`
    #[serde(default, deserialize_with = "lenient::name_list")]
    pub networks: Vec<String>,
    /// Port mappings, kept as written
    #[serde(default, deserialize_with = "lenient::port_list")]
    pub ports: Vec<String>,
    /// Volume mounts, kept as written
    #[serde(default, deserialize_with = "lenient::mount_list")]
    pub volumes: Vec<String>,
    /// Command to run
    #[serde(default)]
    pub command: Command,
    /// Services whose volumes are mounted
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub volumes_from: Vec<String>,
    /// Service dependencies
    #[serde(default, deserialize_with = "lenient::name_list")]
    pub depends_on: Vec<String>,
    /// Capabilities to add
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub cap_add: Vec<String>,
    /// Build configuration
    #[serde(default)]
    pub build: Build,
    /// Environment variables. Not rendered in the graph.
    #[serde(default, deserialize_with = "lenient::string_map")]
    pub environment: BTreeMap<String, String>,
}

/// Strip a `:alias` suffix from a network attachment
pub fn attachment_network(attachment: &str) -> &str {
    attachment
        .split_once(':')
        .map_or(attachment, |(network, _)| network)
}
