//! Host inventory compilation.
//!
//! This module turns a loosely-typed hosts YAML document into a list of
//! fully validated, typed, per-replica connection descriptors:
//!
//! 1. Merge each host record with the global defaults (host values win)
//! 2. Extract the reserved keys (`labels`, `envs`, `instances`)
//! 3. Convert every remaining key against the schema registry
//! 4. Validate cross-field invariants (identity, address, port, key file)
//! 5. Reject duplicate identity names
//! 6. Expand each logical host into `instances` independent replicas
//! 7. Render `${name}` variable references inside every string field and
//!    re-run the schema conversion on the rendered values

mod compiler;
mod hash;
mod hosts;
mod schema;
mod validator;
mod value;

pub use compiler::{find_hosts_file, HostsCompiler, DEFAULT_HOSTS_FILES};
pub use hash::InventoryHasher;
pub use hosts::{
    merge, HostConfig, RawHostRecord, KEY_ENVS, KEY_INSTANCES, KEY_LABELS, VAR_INSTANCES_SEQUENCE,
};
pub use schema::{
    hosts_schema, Requirement, SchemaItem, SchemaRegistry, KEY_BECOME_USER, KEY_FORWARD_AGENT,
    KEY_HOST, KEY_HOSTNAME, KEY_PRIVATE_KEY_FILE, KEY_SSH_PORT, KEY_USER,
};
pub use validator::{FsProbe, HostValidator, LocalFs, MAX_PORT_NUMBER, PERMISSIONS_600};
pub use value::Value;
