//! Structured output module for JSON and YAML serialization.
//!
//! This module defines the data structures that represent everything a
//! mailmender run produces: the scan sections, the applied (or planned)
//! modifications, warnings, and a result summary. The structures are
//! designed to be both human-readable and machine-parsable, and carry a
//! JSON schema for downstream consumers.

#![allow(dead_code)]

use anyhow::Result;
use chrono::{DateTime, Utc};
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};

use crate::output::RunResults;
use crate::remediate::RemediationReport;
use crate::scan::ScanReport;

/// Schema version for the structured output format.
pub const SCHEMA_VERSION: &str = "1.0";

/// Root structure for all mailmender output in structured formats
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct MailMenderOutput {
    /// Tool version and metadata
    pub metadata: OutputMetadata,

    /// Run parameters that were in effect
    pub input: RunInput,

    /// Scan classification results
    pub scan: ScanSection,

    /// Applied modifications (absent on dry runs)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remediation: Option<RemediationSection>,

    /// Changes a dry run would have applied (absent when applying)
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub planned_changes: Vec<AppliedChange>,

    /// Warnings encountered during processing
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<String>,

    /// Success status and result summary
    pub result: ResultSummary,
}

/// Tool metadata and versioning information
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct OutputMetadata {
    /// Tool name
    pub tool_name: String,

    /// Tool version
    pub version: String,

    /// Timestamp when the run finished
    pub generated_at: DateTime<Utc>,

    /// Schema version for this output format
    pub schema_version: String,
}

/// Run parameters echoed back for reproducibility
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct RunInput {
    /// Directory server URL
    pub url: String,

    /// Base DN that was scanned
    pub base_dn: String,

    /// Search filter
    pub filter: String,

    /// Mail attribute name
    pub mail_attribute: String,

    /// Canonical domain suffix enforced
    pub domain: String,

    /// Whether modifications were written
    pub apply: bool,

    /// Whether non-matching domains were in scope for rewriting
    pub rewrite_mismatched: bool,
}

/// Scan classification results
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct ScanSection {
    /// User entries seen
    pub total_entries: u64,

    /// Entries already carrying the canonical suffix
    pub canonical: u64,

    /// Entries skipped by the identifier gate
    pub skipped_non_user: u64,

    /// DNs of entries without any attributes
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub without_attributes: Vec<String>,

    /// DNs of entries without a mail attribute
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub without_mail: Vec<String>,

    /// Entries whose mail value has no domain
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub bare: Vec<MailFinding>,

    /// Entries whose mail domain does not match the canonical suffix
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub foreign: Vec<MailFinding>,

    /// Entries that could not be processed
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<EntryError>,
}

/// One classified mail value
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct MailFinding {
    pub dn: String,
    pub mail: String,
}

/// One per-entry failure
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct EntryError {
    pub dn: String,
    pub message: String,
}

/// Applied modification results
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct RemediationSection {
    /// Modifications attempted
    pub attempted: u64,

    /// Bare values that got the suffix appended
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub added: Vec<AppliedChange>,

    /// Non-matching domains that were rewritten
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub rewritten: Vec<AppliedChange>,

    /// Modifications the server rejected
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub failed: Vec<EntryError>,
}

/// One attribute replacement, old and new value
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct AppliedChange {
    pub dn: String,
    pub old: String,
    pub new: String,
}

/// Coarse quality classification of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResultQuality {
    /// Nothing needed changing
    Clean,
    /// Every needed change was applied
    Remediated,
    /// Some changes failed or were out of scope
    Partial,
    /// Dry run; changes reported but not applied
    ReviewNeeded,
}

/// Success status and result summary
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub struct ResultSummary {
    /// Whether the run completed without fatal errors
    pub success: bool,

    /// Whether this was a dry run
    pub dry_run: bool,

    /// Entries whose mail value needs changing
    pub entries_needing_change: u64,

    /// Changes successfully applied
    pub changes_applied: u64,

    /// Changes the server rejected
    pub changes_failed: u64,

    /// Coarse quality classification
    pub result_quality: ResultQuality,
}

impl MailMenderOutput {
    /// Build the structured output from finished run results.
    pub fn from_results(results: &RunResults) -> Self {
        let scan = ScanSection::from_report(&results.scan);
        let remediation = results
            .remediation
            .as_ref()
            .map(RemediationSection::from_report);

        let planned_changes = if results.remediation.is_none() {
            results
                .planned
                .iter()
                .map(|c| AppliedChange {
                    dn: c.dn.clone(),
                    old: c.old.clone(),
                    new: c.new.clone(),
                })
                .collect()
        } else {
            Vec::new()
        };

        let needing_change = results.scan.needs_change() as u64;
        let (applied, failed) = results
            .remediation
            .as_ref()
            .map(|r| (r.applied(), r.failed.len() as u64))
            .unwrap_or((0, 0));

        let result_quality = if needing_change == 0 {
            ResultQuality::Clean
        } else if results.remediation.is_none() {
            ResultQuality::ReviewNeeded
        } else if failed == 0 && applied == needing_change {
            ResultQuality::Remediated
        } else {
            ResultQuality::Partial
        };

        Self {
            metadata: OutputMetadata {
                tool_name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                generated_at: Utc::now(),
                schema_version: SCHEMA_VERSION.to_string(),
            },
            input: RunInput {
                url: results.metadata.url.clone(),
                base_dn: results.metadata.base_dn.clone(),
                filter: results.metadata.filter.clone(),
                mail_attribute: results.metadata.mail_attribute.clone(),
                domain: results.metadata.domain.clone(),
                apply: results.metadata.apply,
                rewrite_mismatched: results.metadata.rewrite_mismatched,
            },
            scan,
            remediation,
            planned_changes,
            warnings: results.metadata.warnings.clone(),
            result: ResultSummary {
                success: true,
                dry_run: results.remediation.is_none(),
                entries_needing_change: needing_change,
                changes_applied: applied,
                changes_failed: failed,
                result_quality,
            },
        }
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Generate the JSON schema describing this output format.
    pub fn generate_json_schema() -> Result<String> {
        let schema = schema_for!(MailMenderOutput);
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}

impl ScanSection {
    fn from_report(report: &ScanReport) -> Self {
        Self {
            total_entries: report.total_entries,
            canonical: report.canonical,
            skipped_non_user: report.skipped_non_user,
            without_attributes: report.without_attributes.clone(),
            without_mail: report.without_mail.clone(),
            bare: report
                .bare
                .iter()
                .map(|(dn, mail)| MailFinding {
                    dn: dn.clone(),
                    mail: mail.clone(),
                })
                .collect(),
            foreign: report
                .foreign
                .iter()
                .map(|(dn, mail)| MailFinding {
                    dn: dn.clone(),
                    mail: mail.clone(),
                })
                .collect(),
            errors: report
                .errors
                .iter()
                .map(|(dn, message)| EntryError {
                    dn: dn.clone(),
                    message: message.clone(),
                })
                .collect(),
        }
    }
}

impl RemediationSection {
    fn from_report(report: &RemediationReport) -> Self {
        let to_changes = |map: &std::collections::BTreeMap<String, (String, String)>| {
            map.iter()
                .map(|(dn, (old, new))| AppliedChange {
                    dn: dn.clone(),
                    old: old.clone(),
                    new: new.clone(),
                })
                .collect()
        };
        Self {
            attempted: report.attempted,
            added: to_changes(&report.added),
            rewritten: to_changes(&report.rewritten),
            failed: report
                .failed
                .iter()
                .map(|(dn, message)| EntryError {
                    dn: dn.clone(),
                    message: message.clone(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mail::DomainSuffix;
    use crate::output::RunMetadata;
    use crate::remediate::plan;

    fn dry_run_results() -> RunResults {
        let mut scan = ScanReport::new();
        scan.total_entries = 2;
        scan.bare
            .insert("uid=bare,dc=x,dc=y".to_string(), "bare".to_string());
        let suffix = DomainSuffix::parse("@mygreatexample.edu").unwrap();
        let planned = plan(&scan, &suffix, true);
        RunResults {
            scan,
            planned,
            remediation: None,
            metadata: RunMetadata {
                url: "ldaps://directory.example.edu".to_string(),
                base_dn: "dc=x,dc=y".to_string(),
                filter: "(objectClass=*)".to_string(),
                mail_attribute: "mail".to_string(),
                domain: "@mygreatexample.edu".to_string(),
                apply: false,
                rewrite_mismatched: true,
                ..Default::default()
            },
        }
    }

    #[test]
    fn dry_run_output_shape() {
        let output = MailMenderOutput::from_results(&dry_run_results());
        assert!(output.result.dry_run);
        assert_eq!(output.result.entries_needing_change, 1);
        assert_eq!(output.result.changes_applied, 0);
        assert_eq!(output.result.result_quality, ResultQuality::ReviewNeeded);
        assert_eq!(output.planned_changes.len(), 1);
        assert!(output.remediation.is_none());
    }

    #[test]
    fn json_round_trip() {
        let output = MailMenderOutput::from_results(&dry_run_results());
        let json = output.to_json().unwrap();
        assert!(json.contains("\"base_dn\": \"dc=x,dc=y\""));
        let parsed: MailMenderOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.scan.bare.len(), 1);
        assert_eq!(parsed.scan.bare[0].mail, "bare");
    }

    #[test]
    fn yaml_serialization() {
        let output = MailMenderOutput::from_results(&dry_run_results());
        let yaml = output.to_yaml().unwrap();
        assert!(yaml.contains("base_dn: dc=x,dc=y"));
    }

    #[test]
    fn schema_generation() {
        let schema = MailMenderOutput::generate_json_schema().unwrap();
        assert!(schema.contains("MailMenderOutput"));
        assert!(schema.contains("entries_needing_change"));
    }

    #[test]
    fn clean_run_quality() {
        let mut results = dry_run_results();
        results.scan.bare.clear();
        results.planned.clear();
        let output = MailMenderOutput::from_results(&results);
        assert_eq!(output.result.result_quality, ResultQuality::Clean);
    }
}
