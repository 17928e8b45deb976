//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying compiled
//! inventories to the user in text or JSON form.

use colored::Colorize;
use serde::Serialize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::inventory::{HostConfig, RawHostRecord};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Compiled replica row for table display.
#[derive(Tabled)]
struct HostRow {
    #[tabled(rename = "Host")]
    host: String,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "User")]
    user: String,
    #[tabled(rename = "Port")]
    port: i64,
    #[tabled(rename = "Instance")]
    instance: String,
    #[tabled(rename = "Labels")]
    labels: String,
}

/// Compiled replica as emitted by `--output json`.
#[derive(Serialize)]
struct HostJson<'a> {
    host: String,
    hostname: String,
    user: String,
    ssh_port: i64,
    private_key_file: String,
    forward_agent: bool,
    instance_sequence: usize,
    labels: &'a [String],
    envs: &'a [String],
    config: &'a RawHostRecord,
}

/// Validate summary as emitted by `--output json`.
#[derive(Serialize)]
struct SummaryJson<'a> {
    hosts: usize,
    replicas: usize,
    fingerprint: &'a str,
}

impl<'a> From<&'a HostConfig> for HostJson<'a> {
    fn from(hc: &'a HostConfig) -> Self {
        Self {
            host: hc.host(),
            hostname: hc.hostname(),
            user: hc.user(),
            ssh_port: hc.ssh_port(),
            private_key_file: hc.private_key_file(),
            forward_agent: hc.forward_agent(),
            instance_sequence: hc.instance_sequence(),
            labels: hc.labels(),
            envs: hc.envs(),
            config: hc.config(),
        }
    }
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats compiled replicas for display.
    #[must_use]
    pub fn format_hosts(&self, hosts: &[HostConfig]) -> String {
        match self.format {
            OutputFormat::Json => {
                let rows: Vec<HostJson<'_>> = hosts.iter().map(HostJson::from).collect();
                serde_json::to_string_pretty(&rows).unwrap_or_default()
            }
            OutputFormat::Text => Self::format_hosts_text(hosts),
        }
    }

    /// Formats replicas as a table.
    fn format_hosts_text(hosts: &[HostConfig]) -> String {
        if hosts.is_empty() {
            return String::from("No hosts to show.\n");
        }

        let rows: Vec<HostRow> = hosts
            .iter()
            .map(|hc| HostRow {
                host: hc.host(),
                hostname: hc.hostname(),
                user: hc.user(),
                port: hc.ssh_port(),
                instance: format!("{}/{}", hc.instance_sequence(), hc.instance_count()),
                labels: hc.labels().join(","),
            })
            .collect();

        let mut output = Table::new(rows).to_string();
        output.push('\n');
        output
    }

    /// Formats the validate summary.
    #[must_use]
    pub fn format_summary(&self, hosts: usize, replicas: usize, fingerprint: &str) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&SummaryJson {
                hosts,
                replicas,
                fingerprint,
            })
            .unwrap_or_default(),
            OutputFormat::Text => {
                let mut output = String::new();
                let _ = writeln!(output, "{} Inventory is valid!", "✓".green());
                let _ = writeln!(output, "  Hosts: {hosts}");
                let _ = writeln!(output, "  Replicas: {replicas}");
                let _ = writeln!(output, "  Fingerprint: {}", &fingerprint[..12.min(fingerprint.len())]);
                output
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::HostsCompiler;
    use crate::inventory::InventoryHasher;

    fn compiled() -> Vec<HostConfig> {
        let yaml = r"
global:
  forward_agent: true
hosts:
  - host: m1
    hostname: 10.0.0.1
    labels: [prod]
    instances: 2
";
        HostsCompiler::new().compile(yaml).unwrap()
    }

    #[test]
    fn test_text_table_contains_hosts() {
        let formatter = OutputFormatter::new(OutputFormat::Text);
        let output = formatter.format_hosts(&compiled());
        assert!(output.contains("m1"));
        assert!(output.contains("10.0.0.1"));
        assert!(output.contains("1/2"));
        assert!(output.contains("2/2"));
    }

    #[test]
    fn test_json_output_is_parseable() {
        let formatter = OutputFormatter::new(OutputFormat::Json);
        let output = formatter.format_hosts(&compiled());

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        let rows = parsed.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["host"], "m1");
        assert_eq!(rows[1]["instance_sequence"], 2);
    }

    #[test]
    fn test_summary_formats() {
        let hosts = compiled();
        let fingerprint = InventoryHasher::new().hash_inventory(&hosts);

        let text = OutputFormatter::new(OutputFormat::Text).format_summary(1, 2, &fingerprint);
        assert!(text.contains("Hosts: 1"));
        assert!(text.contains("Replicas: 2"));

        let json = OutputFormatter::new(OutputFormat::Json).format_summary(1, 2, &fingerprint);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["replicas"], 2);
    }
}
