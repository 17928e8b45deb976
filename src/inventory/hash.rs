//! Inventory fingerprinting for change detection.
//!
//! Provides deterministic hashing of compiled inventories so callers can
//! detect whether the effective host set changed between runs.

use sha2::{Digest, Sha256};

use super::hosts::HostConfig;

/// Hasher producing stable fingerprints of compiled inventories.
#[derive(Debug, Default)]
pub struct InventoryHasher;

impl InventoryHasher {
    /// Creates a new inventory hasher.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Computes a fingerprint of the whole compiled inventory.
    ///
    /// The fingerprint changes when any replica's effective configuration
    /// changes.
    #[must_use]
    pub fn hash_inventory(&self, hosts: &[HostConfig]) -> String {
        let mut hasher = Sha256::new();
        for hc in hosts {
            hasher.update(self.hash_host(hc).as_bytes());
        }
        hex::encode(hasher.finalize())
    }

    /// Computes a fingerprint for a single replica.
    #[must_use]
    pub fn hash_host(&self, hc: &HostConfig) -> String {
        let mut hasher = Sha256::new();

        hasher.update(hc.host().as_bytes());
        hasher.update(hc.hostname().as_bytes());
        hasher.update(hc.ssh_port().to_be_bytes());
        hasher.update(hc.instance_sequence().to_be_bytes());

        for label in hc.labels() {
            hasher.update(label.as_bytes());
        }
        for env in hc.envs() {
            hasher.update(env.as_bytes());
        }

        // config entries sorted by key for determinism
        let mut entries: Vec<_> = hc.config().iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        for (key, value) in entries {
            hasher.update(key.as_bytes());
            hasher.update(value.to_string().as_bytes());
        }

        hex::encode(hasher.finalize())
    }
}
