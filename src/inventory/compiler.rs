//! Inventory compilation: a hosts YAML document in, validated replicas out.
//!
//! The pipeline runs in a fixed order for every record: merge with global
//! defaults, extract reserved keys, convert against the schema, validate
//! structure, check identity uniqueness, expand instances, render variables.
//! Records are processed one at a time; a replica is only appended to the
//! result once its rendering pass has completed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{HostfleetError, InventoryError, Result};
use crate::variables::Variable;

use super::hosts::{merge, HostConfig, RawHostRecord};
use super::validator::{FsProbe, HostValidator};

/// The two top-level sections of a hosts document.
#[derive(Debug, Default, Deserialize)]
struct Inventory {
    /// Global default key/value pairs applied to every host.
    #[serde(default)]
    global: RawHostRecord,
    /// Per-host records, in declaration order.
    #[serde(default)]
    hosts: Vec<Option<RawHostRecord>>,
}

/// Compiles a hosts YAML document into per-replica host configurations.
#[derive(Debug)]
pub struct HostsCompiler {
    validator: HostValidator,
    inventory_vars: Vec<Variable>,
}

impl HostsCompiler {
    /// Creates a compiler probing the local filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self {
            validator: HostValidator::new(),
            inventory_vars: Vec::new(),
        }
    }

    /// Replaces the filesystem probe used for private-key checks.
    #[must_use]
    pub fn with_probe(mut self, probe: Box<dyn FsProbe>) -> Self {
        self.validator = HostValidator::with_probe(probe);
        self
    }

    /// Registers an inventory-scoped variable, available for rendering in
    /// every instance scope alongside `instances_sequence`.
    #[must_use]
    pub fn with_variable(
        mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.inventory_vars
            .push(Variable::new(name, description, value));
        self
    }

    /// Compiles a hosts document.
    ///
    /// # Errors
    ///
    /// Returns the first unrecoverable condition: parse failures, empty
    /// documents, extraction/conversion/validation errors, duplicate
    /// identities, and variable resolution or rendering failures. Partial
    /// results are never returned.
    pub fn compile(&self, data: &str) -> Result<Vec<HostConfig>> {
        if data.trim().is_empty() {
            return Err(InventoryError::EmptyHosts.into());
        }

        let inventory: Inventory = serde_yaml::from_str(data)
            .map_err(|e| InventoryError::parse(e.to_string()))?;
        if inventory.hosts.is_empty() {
            return Err(InventoryError::EmptyHosts.into());
        }

        let mut compiled = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for (sequence, record) in inventory.hosts.into_iter().enumerate() {
            let mut record = record.unwrap_or_default();
            merge(&inventory.global, &mut record);

            let mut hc = HostConfig::new(sequence, record);
            hc.build()?;
            self.validator.validate(&hc)?;

            if !seen.insert(hc.host()) {
                return Err(InventoryError::DuplicateHost { host: hc.host() }.into());
            }

            for instance_sequence in 1..=hc.instance_count() {
                let mut replica = hc.replicate(instance_sequence);
                replica.render(&self.inventory_vars)?;
                compiled.push(replica);
            }
        }

        debug!(replicas = compiled.len(), "compiled host inventory");
        Ok(compiled)
    }

    /// Compiles a hosts document loaded from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, plus everything
    /// [`HostsCompiler::compile`] can return.
    pub fn compile_file(&self, path: impl AsRef<Path>) -> Result<Vec<HostConfig>> {
        let path = path.as_ref();
        info!("Loading hosts from: {}", path.display());

        if !path.exists() {
            return Err(InventoryError::FileNotFound {
                path: path.to_path_buf(),
            }
            .into());
        }

        let data = std::fs::read_to_string(path).map_err(|e| {
            HostfleetError::from(InventoryError::parse(format!(
                "failed to read {}: {e}",
                path.display()
            )))
        })?;

        self.compile(&data)
    }
}

impl Default for HostsCompiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Default hosts file names to search for.
pub const DEFAULT_HOSTS_FILES: &[&str] = &["hosts.yaml", "hosts.yml"];

/// Finds the hosts file in the given directory or any parent directory.
///
/// # Errors
///
/// Returns an error if no hosts file is found.
pub fn find_hosts_file(start_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start_dir.as_ref();
    let mut current = start.to_path_buf();

    loop {
        for filename in DEFAULT_HOSTS_FILES {
            let hosts_path = current.join(filename);
            if hosts_path.exists() {
                info!("Found hosts file: {}", hosts_path.display());
                return Ok(hosts_path);
            }
        }

        if !current.pop() {
            break;
        }
    }

    Err(InventoryError::FileNotFound {
        path: start.join(DEFAULT_HOSTS_FILES[0]),
    }
    .into())
}
