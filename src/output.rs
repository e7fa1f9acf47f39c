//! Report rendering for mailmender runs.
//!
//! This module provides the human-readable text report (section per
//! classification, DN lists, old -> new modification lists) and the batch
//! format (one tab-separated line per change). Structured JSON/YAML output
//! lives in `structured_output`.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;
use std::io;

use crate::remediate::{PlannedChange, RemediationReport};
use crate::scan::ScanReport;

/// Metadata about the run itself.
#[derive(Debug, Clone, Default)]
pub struct RunMetadata {
    /// How long the run took
    pub duration_ms: Option<u64>,

    /// Server URL
    pub url: String,

    /// Base DN that was scanned
    pub base_dn: String,

    /// Search filter used
    pub filter: String,

    /// Mail attribute name
    pub mail_attribute: String,

    /// Canonical domain suffix enforced
    pub domain: String,

    /// Whether modifications were written
    pub apply: bool,

    /// Whether mismatched domains were in scope
    pub rewrite_mismatched: bool,

    /// Non-fatal problems encountered
    pub warnings: Vec<String>,
}

/// Everything a formatter needs to render one run.
#[derive(Debug, Clone)]
pub struct RunResults {
    /// Classification results
    pub scan: ScanReport,

    /// Changes derived from the scan (applied or merely planned)
    pub planned: Vec<PlannedChange>,

    /// Write-pass results; None for dry runs
    pub remediation: Option<RemediationReport>,

    /// Run metadata
    pub metadata: RunMetadata,
}

/// Output format options for the plain report.
#[derive(Debug, Clone)]
pub enum ReportFormat {
    /// Human-readable text format
    Text {
        /// Show run metadata (server, base DN, duration)
        show_metadata: bool,
    },

    /// Batch format: dn<TAB>old<TAB>new per change
    Batch,
}

impl Default for ReportFormat {
    fn default() -> Self {
        ReportFormat::Text {
            show_metadata: false,
        }
    }
}

/// Report formatter trait.
pub trait ReportFormatter {
    /// Render the results into a string destined for stdout.
    fn format_results(&self, results: &RunResults) -> io::Result<String>;

    /// Get the MIME type for this format
    fn mime_type(&self) -> &'static str;

    /// Get the file extension for this format
    fn file_extension(&self) -> &'static str;
}

/// Text report formatter.
pub struct TextFormatter {
    show_metadata: bool,
    /// Maximum DNs listed per section (0 = unlimited).
    max_listed: usize,
}

impl TextFormatter {
    pub fn new(show_metadata: bool, max_listed: usize) -> Self {
        Self {
            show_metadata,
            max_listed,
        }
    }

    fn push_list(&self, out: &mut String, items: &[String]) {
        let shown = if self.max_listed > 0 && items.len() > self.max_listed {
            &items[..self.max_listed]
        } else {
            items
        };
        for dn in shown {
            let _ = writeln!(out, "{dn}");
        }
        if shown.len() < items.len() {
            let _ = writeln!(out, "... and {} more", items.len() - shown.len());
        }
    }

    fn push_map(&self, out: &mut String, items: &BTreeMap<String, String>) {
        let mut shown = 0usize;
        for (dn, detail) in items {
            if self.max_listed > 0 && shown >= self.max_listed {
                let _ = writeln!(out, "... and {} more", items.len() - shown);
                return;
            }
            let _ = writeln!(out, "{dn} ({detail})");
            shown += 1;
        }
    }

    fn push_changes(&self, out: &mut String, items: &BTreeMap<String, (String, String)>) {
        let mut shown = 0usize;
        for (dn, (old, new)) in items {
            if self.max_listed > 0 && shown >= self.max_listed {
                let _ = writeln!(out, "... and {} more", items.len() - shown);
                return;
            }
            let _ = writeln!(out, "{dn} ({old} -> {new})");
            shown += 1;
        }
    }
}

impl ReportFormatter for TextFormatter {
    fn format_results(&self, results: &RunResults) -> io::Result<String> {
        let mut out = String::new();
        let scan = &results.scan;
        let meta = &results.metadata;

        if self.show_metadata {
            let _ = writeln!(out, "Server: {}", meta.url);
            let _ = writeln!(out, "Base DN: {}", meta.base_dn);
            let _ = writeln!(out, "Filter: {}", meta.filter);
            if let Some(ms) = meta.duration_ms {
                let _ = writeln!(out, "Duration: {ms} ms");
            }
            out.push('\n');
        }

        let _ = writeln!(
            out,
            "Found {} total directory entries.",
            scan.total_entries
        );
        let _ = writeln!(
            out,
            "Found {} entries already carrying the canonical mail domain.",
            scan.canonical
        );
        if scan.skipped_non_user > 0 {
            let _ = writeln!(out, "Skipped {} non-user entries.", scan.skipped_non_user);
        }

        let _ = writeln!(
            out,
            "\nFound {} entries without attributes!",
            scan.without_attributes.len()
        );
        if !scan.without_attributes.is_empty() {
            let _ = writeln!(out, "DNs without attributes are:");
            self.push_list(&mut out, &scan.without_attributes);
        }

        let _ = writeln!(
            out,
            "\nFound {} entries without a mail attribute.",
            scan.without_mail.len()
        );
        if !scan.without_mail.is_empty() {
            let _ = writeln!(out, "DNs without or with an empty mail attribute are:");
            self.push_list(&mut out, &scan.without_mail);
        }

        let _ = writeln!(
            out,
            "\nFound {} entries that were processed with error.",
            scan.errors.len()
        );
        if !scan.errors.is_empty() {
            let _ = writeln!(out, "DNs processed with error are:");
            self.push_map(&mut out, &scan.errors);
        }

        let _ = writeln!(
            out,
            "\nFound {} entries whose mail domain does not match {}.",
            scan.foreign.len(),
            meta.domain
        );
        if !scan.foreign.is_empty() {
            let _ = writeln!(out, "DNs with a non-matching mail domain are:");
            self.push_map(&mut out, &scan.foreign);
        }

        let _ = writeln!(
            out,
            "\nFound {} entries without any domain in the mail attribute.",
            scan.bare.len()
        );
        if !scan.bare.is_empty() {
            let _ = writeln!(out, "DNs without a mail domain are:");
            self.push_map(&mut out, &scan.bare);
        }

        match &results.remediation {
            Some(remediation) => {
                let _ = writeln!(
                    out,
                    "\nModified {} total directory entries.",
                    remediation.attempted
                );

                let _ = writeln!(
                    out,
                    "\nModified {} entries with error.",
                    remediation.failed.len()
                );
                if !remediation.failed.is_empty() {
                    let _ = writeln!(out, "DNs modified with error were:");
                    self.push_map(&mut out, &remediation.failed);
                }

                let _ = writeln!(
                    out,
                    "\nModified {} entries to replace a non-matching mail domain.",
                    remediation.rewritten.len()
                );
                if !remediation.rewritten.is_empty() {
                    let _ = writeln!(out, "DNs modified were: (format is dn (old -> new))");
                    self.push_changes(&mut out, &remediation.rewritten);
                }

                let _ = writeln!(
                    out,
                    "\nModified {} entries to append the missing mail domain.",
                    remediation.added.len()
                );
                if !remediation.added.is_empty() {
                    let _ = writeln!(out, "DNs modified were: (format is dn (old -> new))");
                    self.push_changes(&mut out, &remediation.added);
                }
            }
            None => {
                let _ = writeln!(
                    out,
                    "\nDry run: {} entries would be modified. Re-run with --apply to write.",
                    results.planned.len()
                );
                for change in &results.planned {
                    let _ = writeln!(out, "{} ({} -> {})", change.dn, change.old, change.new);
                }
            }
        }

        if self.show_metadata && !meta.warnings.is_empty() {
            out.push('\n');
            let _ = writeln!(out, "Warnings:");
            for warning in &meta.warnings {
                let _ = writeln!(out, "  {warning}");
            }
        }

        Ok(out)
    }

    fn mime_type(&self) -> &'static str {
        "text/plain"
    }

    fn file_extension(&self) -> &'static str {
        "txt"
    }
}

/// Batch formatter: one tab-separated line per change, nothing else.
/// For applied runs only successful changes are listed; for dry runs,
/// the planned ones.
pub struct BatchFormatter;

impl ReportFormatter for BatchFormatter {
    fn format_results(&self, results: &RunResults) -> io::Result<String> {
        let mut out = String::new();
        match &results.remediation {
            Some(remediation) => {
                for (dn, (old, new)) in remediation.added.iter().chain(&remediation.rewritten) {
                    let _ = writeln!(out, "{dn}\t{old}\t{new}");
                }
            }
            None => {
                for change in &results.planned {
                    let _ = writeln!(out, "{}\t{}\t{}", change.dn, change.old, change.new);
                }
            }
        }
        Ok(out)
    }

    fn mime_type(&self) -> &'static str {
        "text/tab-separated-values"
    }

    fn file_extension(&self) -> &'static str {
        "tsv"
    }
}

/// Factory for the plain formatters.
pub fn create_formatter(format: &ReportFormat, max_listed: usize) -> Box<dyn ReportFormatter> {
    match format {
        ReportFormat::Text { show_metadata } => {
            Box::new(TextFormatter::new(*show_metadata, max_listed))
        }
        ReportFormat::Batch => Box::new(BatchFormatter),
    }
}
