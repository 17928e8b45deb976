//! Structural validation of compiled host records.
//!
//! Runs after per-key conversion, once the record is typed. Checks are
//! ordered and short-circuit on the first failure. Filesystem access goes
//! through the [`FsProbe`] capability so tests can substitute a double.

use std::net::IpAddr;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::InventoryError;

use super::hosts::HostConfig;

/// Highest valid TCP port number.
pub const MAX_PORT_NUMBER: i64 = 65535;

/// Permission bits required on a private key file (owner read/write only).
pub const PERMISSIONS_600: u32 = 0o600;

/// Capability interface for local filesystem checks.
#[cfg_attr(test, mockall::automock)]
pub trait FsProbe {
    /// Returns true if `path` exists.
    fn exists(&self, path: &Path) -> bool;

    /// Permission bits of `path`, or `None` if it cannot be read.
    fn permission_bits(&self, path: &Path) -> Option<u32>;
}

/// Probe backed by the local filesystem.
#[derive(Debug, Default)]
pub struct LocalFs;

impl FsProbe for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn permission_bits(&self, path: &Path) -> Option<u32> {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(path)
            .ok()
            .map(|meta| meta.permissions().mode() & 0o7777)
    }
}

/// Validator enforcing cross-field invariants on typed host records.
pub struct HostValidator {
    probe: Box<dyn FsProbe>,
}

impl std::fmt::Debug for HostValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostValidator").finish_non_exhaustive()
    }
}

impl HostValidator {
    /// Creates a validator probing the local filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self {
            probe: Box::new(LocalFs),
        }
    }

    /// Creates a validator with a custom filesystem probe.
    #[must_use]
    pub fn with_probe(probe: Box<dyn FsProbe>) -> Self {
        Self { probe }
    }

    /// Checks cross-field invariants; the first failed check wins.
    ///
    /// Private-key existence and permission checks are skipped entirely when
    /// agent forwarding is enabled.
    ///
    /// # Errors
    ///
    /// Returns the error for the first check that fails, in declaration
    /// order: identity, hostname presence, hostname syntax, port range, key
    /// path shape, key existence, key permissions.
    pub fn validate(&self, hc: &HostConfig) -> Result<(), InventoryError> {
        let sequence = hc.sequence();

        if hc.host().is_empty() {
            return Err(InventoryError::HostFieldMissing { sequence });
        }

        let hostname = hc.hostname();
        if hostname.is_empty() {
            return Err(InventoryError::HostnameFieldMissing { sequence });
        }
        if !is_valid_address(&hostname) {
            return Err(InventoryError::HostnameRequiresValidAddress { sequence, hostname });
        }

        let port = hc.ssh_port();
        if port > MAX_PORT_NUMBER {
            return Err(InventoryError::SshPortExceedsMaxPort { sequence, port });
        }

        let private_key_file = hc.private_key_file();
        if !private_key_file.starts_with('/') {
            return Err(InventoryError::PrivateKeyRequiresAbsolutePath {
                sequence,
                path: private_key_file,
            });
        }

        if !hc.forward_agent() {
            let path = Path::new(&private_key_file);
            if !self.probe.exists(path) {
                return Err(InventoryError::PrivateKeyNotExist {
                    path: private_key_file,
                });
            }
            let mode = self.probe.permission_bits(path).unwrap_or(0);
            if mode != PERMISSIONS_600 {
                return Err(InventoryError::PrivateKeyRequires600Permissions {
                    path: private_key_file,
                    mode,
                });
            }
        }

        Ok(())
    }
}

impl Default for HostValidator {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns true if `address` is an IP address or a syntactically valid
/// hostname (letters, digits, hyphens, dot-separated, RFC 1123 lengths).
fn is_valid_address(address: &str) -> bool {
    if address.parse::<IpAddr>().is_ok() {
        return true;
    }

    static HOSTNAME: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
        )
        .expect("hostname pattern is valid")
    });

    address.len() <= 253 && HOSTNAME.is_match(address)
}
