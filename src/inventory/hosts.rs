//! Compiled host configuration and the per-record build pipeline.
//!
//! A [`HostConfig`] starts as a raw YAML record, is merged with global
//! defaults, has its reserved multi-value keys extracted, is type-checked
//! against the schema registry, and is finally replicated into per-instance
//! copies whose string fields are rendered against a private variable scope.

use indexmap::IndexMap;
use tracing::debug;

use crate::error::InventoryError;
use crate::variables::{Variable, Variables};

use super::schema::{
    hosts_schema, KEY_BECOME_USER, KEY_FORWARD_AGENT, KEY_HOST, KEY_HOSTNAME,
    KEY_PRIVATE_KEY_FILE, KEY_SSH_PORT, KEY_USER,
};
use super::value::Value;

/// Reserved key holding the label list.
pub const KEY_LABELS: &str = "labels";
/// Reserved key holding the environment entries.
pub const KEY_ENVS: &str = "envs";
/// Reserved key holding the instance count.
pub const KEY_INSTANCES: &str = "instances";

/// Variable exposing a replica's 1-based position among its siblings.
pub const VAR_INSTANCES_SEQUENCE: &str = "instances_sequence";

/// A raw host record: an ordered mapping from key to dynamically-typed value.
pub type RawHostRecord = IndexMap<String, Value>;

/// Fills every key absent (or null) on `host` from `global`.
///
/// Host-supplied keys are never overwritten; `global` is never mutated.
pub fn merge(global: &RawHostRecord, host: &mut RawHostRecord) {
    for (key, value) in global {
        if host.get(key).is_none_or(Value::is_null) {
            host.insert(key.clone(), value.clone());
        }
    }
}

/// The compiled unit of output: one deployable host replica.
#[derive(Debug)]
pub struct HostConfig {
    /// Zero-based position in the original inventory (the logical host).
    sequence: usize,
    /// Validated key/value configuration, reserved keys removed.
    config: RawHostRecord,
    /// Ordered label list.
    labels: Vec<String>,
    /// Ordered `NAME=VALUE` environment entries.
    envs: Vec<String>,
    /// Number of replicas this logical host expands into.
    instance_count: usize,
    /// 1-based position of this replica among its siblings.
    instance_sequence: usize,
    /// Private per-instance variable scope used during rendering.
    variables: Variables,
}

impl HostConfig {
    /// Creates a pre-expansion host configuration from a merged raw record.
    #[must_use]
    pub fn new(sequence: usize, config: RawHostRecord) -> Self {
        Self {
            sequence,
            config,
            labels: Vec::new(),
            envs: Vec::new(),
            instance_count: 1,
            instance_sequence: 1,
            variables: Variables::new(),
        }
    }

    /// Extracts the reserved keys and type-checks every remaining entry
    /// against the schema registry.
    ///
    /// # Errors
    ///
    /// Returns the extraction error for a malformed reserved key, an
    /// unsupported-item error for unknown keys, and the per-kind conversion
    /// error for values failing their requirement.
    pub fn build(&mut self) -> Result<(), InventoryError> {
        if self.config.contains_key(KEY_LABELS) {
            self.labels = self.convert_string_list(KEY_LABELS)?;
            self.config.shift_remove(KEY_LABELS);
        }
        if self.config.contains_key(KEY_ENVS) {
            self.envs = self.convert_string_list(KEY_ENVS)?;
            self.config.shift_remove(KEY_ENVS);
        }
        if self.config.contains_key(KEY_INSTANCES) {
            self.convert_instances()?;
            self.config.shift_remove(KEY_INSTANCES);
        }

        let keys: Vec<String> = self.config.keys().cloned().collect();
        for key in keys {
            let value = self.config.get(&key).cloned().unwrap_or(Value::Null);
            if hosts_schema().get(&key).is_none() {
                return Err(InventoryError::UnsupportedConfigItem {
                    context: format!("hosts[{}].{key} = {value}", self.sequence),
                });
            }
            if value.is_null() {
                continue;
            }
            let typed = hosts_schema().build(&key, &value)?;
            self.config.insert(key, typed);
        }
        Ok(())
    }

    /// Reads a reserved key as a list of strings.
    ///
    /// Elements must be strings proper; numeric or boolean elements are
    /// rejected even though they are string-convertible elsewhere.
    fn convert_string_list(&self, key: &str) -> Result<Vec<String>, InventoryError> {
        let value = self.config.get(key).unwrap_or(&Value::Null);
        let Value::List(items) = value else {
            return Err(self.string_slice_error(key, value));
        };
        items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(self.string_slice_error(key, other)),
            })
            .collect()
    }

    fn string_slice_error(&self, key: &str, value: &Value) -> InventoryError {
        InventoryError::ValueRequiresStringSlice {
            sequence: self.sequence,
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    /// Reads the reserved instance-count key.
    fn convert_instances(&mut self) -> Result<(), InventoryError> {
        let key = format!("hosts[{}].{KEY_INSTANCES}", self.sequence);
        let value = self.config.get(KEY_INSTANCES).unwrap_or(&Value::Null);
        let Some(s) = value.as_config_string() else {
            return Err(InventoryError::UnsupportedValueType {
                key,
                value: value.to_string(),
            });
        };
        let parsed: i64 = s
            .parse()
            .map_err(|_| InventoryError::ValueRequiresInteger {
                key: key.clone(),
                value: value.to_string(),
            })?;
        match usize::try_from(parsed) {
            Ok(count) if count > 0 => {
                self.instance_count = count;
                Ok(())
            }
            _ => Err(InventoryError::ValueRequiresPositiveInteger {
                key,
                value: value.to_string(),
            }),
        }
    }

    /// Deep copy of this configuration carrying `instance_sequence`.
    ///
    /// The copy owns its own config map, label list, environment list, and a
    /// fresh variable scope, so rendering it cannot affect the source or any
    /// sibling replica.
    #[must_use]
    pub fn replicate(&self, instance_sequence: usize) -> Self {
        Self {
            sequence: self.sequence,
            config: self.config.clone(),
            labels: self.labels.clone(),
            envs: self.envs.clone(),
            instance_count: self.instance_count,
            instance_sequence,
            variables: Variables::new(),
        }
    }

    /// Renders variable references inside every string field of this replica.
    ///
    /// Registers `instances_sequence` and the caller-supplied inventory-wide
    /// variables into the replica's private scope, resolves the scope,
    /// substitutes placeholders in labels, environment entries, and config
    /// values, then re-runs the schema conversion pass so typed fields are
    /// reconstituted from their rendered string form.
    ///
    /// # Errors
    ///
    /// Returns resolve/rendering failures attributed to the field being
    /// rendered, and conversion errors from the post-render pass.
    pub fn render(&mut self, inventory_vars: &[Variable]) -> Result<(), InventoryError> {
        for var in inventory_vars {
            self.variables
                .register(var.clone())
                .map_err(|source| InventoryError::ResolveVariableFailed { source })?;
        }
        self.variables
            .register(Variable::new(
                VAR_INSTANCES_SEQUENCE,
                "1-based position of this replica among its siblings",
                self.instance_sequence.to_string(),
            ))
            .map_err(|source| InventoryError::ResolveVariableFailed { source })?;

        // every config value must be string-renderable before substitution
        for (key, value) in &mut self.config {
            if value.is_null() {
                continue;
            }
            match value.as_config_string() {
                Some(s) => *value = Value::String(s),
                None => {
                    return Err(InventoryError::UnsupportedValueType {
                        key: key.clone(),
                        value: value.to_string(),
                    });
                }
            }
        }

        self.variables
            .build()
            .map_err(|source| InventoryError::ResolveVariableFailed { source })?;

        for i in 0..self.labels.len() {
            let rendered = self.variables.render(&self.labels[i]).map_err(|source| {
                InventoryError::RenderingVariableFailed {
                    field: format!("{KEY_LABELS}[{i}]"),
                    source,
                }
            })?;
            self.labels[i] = rendered;
        }
        for i in 0..self.envs.len() {
            let rendered = self.variables.render(&self.envs[i]).map_err(|source| {
                InventoryError::RenderingVariableFailed {
                    field: format!("{KEY_ENVS}[{i}]"),
                    source,
                }
            })?;
            self.envs[i] = rendered;
        }
        for (key, value) in &mut self.config {
            let Value::String(raw) = value else { continue };
            let rendered =
                self.variables
                    .render(raw)
                    .map_err(|source| InventoryError::RenderingVariableFailed {
                        field: key.clone(),
                        source,
                    })?;
            debug!(key = %key, raw = %raw, rendered = %rendered, "rendered config value");
            *value = Value::String(rendered);
        }

        self.convert()
    }

    /// Re-types config entries after rendering widened every value to a
    /// string. Defaults are validated but not materialized into the map.
    fn convert(&mut self) -> Result<(), InventoryError> {
        for item in hosts_schema().get_all() {
            let present = self
                .config
                .get(item.key())
                .is_some_and(|value| !value.is_null());
            let value = if present {
                self.config.get(item.key()).cloned()
            } else {
                item.default().cloned()
            };
            let Some(value) = value else { continue };
            let typed = item.requirement().coerce(item.key(), &value)?;
            if present {
                self.config.insert(item.key().to_string(), typed);
            }
        }
        Ok(())
    }

    /// Config value for `key`, falling back to the schema default.
    fn value_or_default(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.config.get(key)
            && !value.is_null()
        {
            return Some(value.clone());
        }
        hosts_schema().get(key).and_then(|item| item.default().cloned())
    }

    fn config_string(&self, key: &str) -> String {
        self.value_or_default(key)
            .and_then(|value| value.as_config_string())
            .unwrap_or_default()
    }

    /// Identity name of the logical host.
    #[must_use]
    pub fn host(&self) -> String {
        self.config_string(KEY_HOST)
    }

    /// Network address the host is reached at.
    #[must_use]
    pub fn hostname(&self) -> String {
        self.config_string(KEY_HOSTNAME)
    }

    /// SSH login user.
    #[must_use]
    pub fn user(&self) -> String {
        self.config_string(KEY_USER)
    }

    /// SSH port.
    #[must_use]
    pub fn ssh_port(&self) -> i64 {
        self.value_or_default(KEY_SSH_PORT)
            .and_then(|value| match value {
                Value::Integer(port) => Some(port),
                other => other.as_config_string()?.parse().ok(),
            })
            .unwrap_or(22)
    }

    /// Path to the SSH private key file.
    #[must_use]
    pub fn private_key_file(&self) -> String {
        self.config_string(KEY_PRIVATE_KEY_FILE)
    }

    /// Whether SSH agent forwarding is enabled.
    #[must_use]
    pub fn forward_agent(&self) -> bool {
        matches!(
            self.value_or_default(KEY_FORWARD_AGENT),
            Some(Value::Bool(true))
        )
    }

    /// Privilege-escalation user, if configured.
    #[must_use]
    pub fn become_user(&self) -> Option<String> {
        self.value_or_default(KEY_BECOME_USER)
            .and_then(|value| value.as_config_string())
    }

    /// Arbitrary config value access.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.config.get(key)
    }

    /// Zero-based position of the logical host in the inventory.
    #[must_use]
    pub const fn sequence(&self) -> usize {
        self.sequence
    }

    /// The validated config map, reserved keys removed.
    #[must_use]
    pub const fn config(&self) -> &RawHostRecord {
        &self.config
    }

    /// Ordered label list.
    #[must_use]
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Ordered `NAME=VALUE` environment entries.
    #[must_use]
    pub fn envs(&self) -> &[String] {
        &self.envs
    }

    /// Number of replicas this logical host expands into.
    #[must_use]
    pub const fn instance_count(&self) -> usize {
        self.instance_count
    }

    /// 1-based position of this replica among its siblings.
    #[must_use]
    pub const fn instance_sequence(&self) -> usize {
        self.instance_sequence
    }

    /// The replica's private variable scope.
    #[must_use]
    pub const fn variables(&self) -> &Variables {
        &self.variables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(yaml: &str) -> RawHostRecord {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_merge_host_precedence() {
        let global = record("ssh_port: 22\nuser: root");
        let mut host = record("ssh_port: 2222\nhost: m1");
        merge(&global, &mut host);

        assert_eq!(host["ssh_port"], Value::Integer(2222));
        assert_eq!(host["user"], Value::String(String::from("root")));
        assert_eq!(host["host"], Value::String(String::from("m1")));
    }

    #[test]
    fn test_merge_fills_null_keys() {
        let global = record("user: admin");
        let mut host = record("user: ~\nhost: m1");
        merge(&global, &mut host);
        assert_eq!(host["user"], Value::String(String::from("admin")));
    }

    #[test]
    fn test_build_extracts_reserved_keys() {
        let mut hc = HostConfig::new(
            0,
            record("host: m1\nhostname: 10.0.0.1\nlabels: [prod]\nenvs: [A=1]\ninstances: 2"),
        );
        hc.build().unwrap();

        assert_eq!(hc.labels(), ["prod"]);
        assert_eq!(hc.envs(), ["A=1"]);
        assert_eq!(hc.instance_count(), 2);
        assert!(hc.get(KEY_LABELS).is_none());
        assert!(hc.get(KEY_ENVS).is_none());
        assert!(hc.get(KEY_INSTANCES).is_none());
    }

    #[test]
    fn test_build_coerces_known_keys() {
        let mut hc = HostConfig::new(
            0,
            record("host: m1\nhostname: 10.0.0.1\nssh_port: \"2222\"\nforward_agent: \"true\""),
        );
        hc.build().unwrap();

        assert_eq!(hc.get(KEY_SSH_PORT), Some(&Value::Integer(2222)));
        assert_eq!(hc.get(KEY_FORWARD_AGENT), Some(&Value::Bool(true)));
        assert_eq!(hc.ssh_port(), 2222);
        assert!(hc.forward_agent());
    }

    #[test]
    fn test_build_rejects_unknown_key() {
        let mut hc = HostConfig::new(3, record("host: m1\ngpu_count: 2"));
        let err = hc.build().unwrap_err();
        assert!(
            matches!(err, InventoryError::UnsupportedConfigItem { ref context } if context.contains("hosts[3].gpu_count"))
        );
    }

    #[test]
    fn test_labels_reject_non_string_element() {
        let mut hc = HostConfig::new(0, record("host: m1\nlabels: [env=prod, 123]"));
        let err = hc.build().unwrap_err();
        assert!(
            matches!(err, InventoryError::ValueRequiresStringSlice { sequence: 0, ref key, ref value } if key == KEY_LABELS && value == "123")
        );
    }

    #[test]
    fn test_envs_reject_non_list_value() {
        let mut hc = HostConfig::new(1, record("host: m1\nenvs: A=1"));
        let err = hc.build().unwrap_err();
        assert!(
            matches!(err, InventoryError::ValueRequiresStringSlice { sequence: 1, ref key, .. } if key == KEY_ENVS)
        );
    }

    #[test]
    fn test_instances_conversions() {
        let mut hc = HostConfig::new(0, record("host: m1\ninstances: \"3\""));
        hc.build().unwrap();
        assert_eq!(hc.instance_count(), 3);

        let mut hc = HostConfig::new(0, record("host: m1\ninstances: x"));
        assert!(matches!(
            hc.build().unwrap_err(),
            InventoryError::ValueRequiresInteger { .. }
        ));

        let mut hc = HostConfig::new(0, record("host: m1\ninstances: 0"));
        assert!(matches!(
            hc.build().unwrap_err(),
            InventoryError::ValueRequiresPositiveInteger { .. }
        ));

        let mut hc = HostConfig::new(0, record("host: m1\ninstances: [1]"));
        assert!(matches!(
            hc.build().unwrap_err(),
            InventoryError::UnsupportedValueType { .. }
        ));
    }

    #[test]
    fn test_accessor_defaults() {
        let mut hc = HostConfig::new(0, record("host: m1\nhostname: 10.0.0.1"));
        hc.build().unwrap();

        assert_eq!(hc.ssh_port(), 22);
        assert_eq!(hc.user(), "root");
        assert!(!hc.forward_agent());
        assert!(hc.become_user().is_none());
        assert!(hc.private_key_file().ends_with("/.ssh/id_rsa"));
    }

    #[test]
    fn test_replicate_is_deep_copy() {
        let mut hc = HostConfig::new(0, record("host: m1\nhostname: 10.0.0.1\nlabels: [a]"));
        hc.build().unwrap();

        let mut first = hc.replicate(1);
        let second = hc.replicate(2);
        first.labels.push(String::from("extra"));
        first.config.insert(String::from("user"), Value::from("ops"));

        assert_eq!(second.labels(), ["a"]);
        assert_eq!(hc.labels(), ["a"]);
        assert!(second.get("user").is_none());
        assert_eq!(first.instance_sequence(), 1);
        assert_eq!(second.instance_sequence(), 2);
    }

    #[test]
    fn test_render_substitutes_instance_sequence() {
        let mut hc = HostConfig::new(
            0,
            record(
                "host: m1\nhostname: 10.0.0.1\nbecome_user: \"port_${instances_sequence}\"\nlabels: [\"l${instances_sequence}\"]\nenvs: [\"PORT=1121${instances_sequence}\"]\ninstances: 2",
            ),
        );
        hc.build().unwrap();

        let mut replica = hc.replicate(2);
        replica.render(&[]).unwrap();

        assert_eq!(replica.become_user().as_deref(), Some("port_2"));
        assert_eq!(replica.labels(), ["l2"]);
        assert_eq!(replica.envs(), ["PORT=11212"]);
    }

    #[test]
    fn test_render_retypes_config_values() {
        let mut hc = HostConfig::new(0, record("host: m1\nhostname: 10.0.0.1\nssh_port: 2222"));
        hc.build().unwrap();

        let mut replica = hc.replicate(1);
        replica.render(&[]).unwrap();
        assert_eq!(replica.get(KEY_SSH_PORT), Some(&Value::Integer(2222)));
    }

    #[test]
    fn test_render_unknown_variable() {
        let mut hc = HostConfig::new(0, record("host: m1\nlabels: [\"${no_such}\"]"));
        hc.build().unwrap();

        let mut replica = hc.replicate(1);
        let err = replica.render(&[]).unwrap_err();
        assert!(
            matches!(err, InventoryError::RenderingVariableFailed { ref field, .. } if field == "labels[0]")
        );
    }

    #[test]
    fn test_render_inventory_scoped_variables() {
        let mut hc = HostConfig::new(0, record("host: m1\nlabels: [\"cluster=${cluster}\"]"));
        hc.build().unwrap();

        let mut replica = hc.replicate(1);
        replica
            .render(&[Variable::new("cluster", "cluster name", "prod")])
            .unwrap();
        assert_eq!(replica.labels(), ["cluster=prod"]);
    }
}
