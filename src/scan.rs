//! The classification pass over the directory.
//!
//! One subtree search, one linear walk: every entry is classified by the
//! shape of its mail attribute and recorded in a `ScanReport`. Per-entry
//! problems land in the report's error section; they never abort the pass.

use std::collections::BTreeMap;

use crate::config::SearchConfig;
use crate::directory::{DirectoryClient, DirectoryEntry, DirectoryEnv};
use crate::dnutil::dn_names_attribute;
use crate::errors::{MailMenderError, Result};
use crate::mail::{self, DomainSuffix, MailShape};

/// Accumulated results of the classification pass.
///
/// DN-keyed sections use `BTreeMap` so reports come out in a
/// deterministic order.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// User entries seen (entries skipped by the identifier gate excluded).
    pub total_entries: u64,

    /// Entries whose mail already carries the canonical suffix.
    pub canonical: u64,

    /// Entries skipped because their DN lacks the identifier attribute
    /// (OUs, groups, other non-user records).
    pub skipped_non_user: u64,

    /// DNs of entries that carried no attributes at all.
    pub without_attributes: Vec<String>,

    /// DNs of entries with no (or an empty) mail attribute.
    pub without_mail: Vec<String>,

    /// Entries whose mail value has no '@' at all: DN -> current value.
    pub bare: BTreeMap<String, String>,

    /// Entries whose mail domain does not match the canonical suffix:
    /// DN -> current value.
    pub foreign: BTreeMap<String, String>,

    /// Entries that could not be processed: DN -> message.
    pub errors: BTreeMap<String, String>,
}

impl ScanReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries the remediation pass would touch.
    pub fn needs_change(&self) -> usize {
        self.bare.len() + self.foreign.len()
    }

    /// Classify one entry into the report.
    pub fn record_entry(
        &mut self,
        entry: &DirectoryEntry,
        search: &SearchConfig,
        suffix: &DomainSuffix,
    ) {
        // An entry with no attributes at all cannot be processed; it still
        // counts toward the total, mirroring the report's other sections.
        if !entry.has_any_attributes() {
            self.total_entries += 1;
            self.without_attributes.push(entry.dn.clone());
            return;
        }

        if !dn_names_attribute(&entry.dn, &search.identifier_attribute) {
            self.skipped_non_user += 1;
            return;
        }

        self.total_entries += 1;

        let Some(values) = entry.values(&search.mail_attribute) else {
            if entry.has_binary(&search.mail_attribute) {
                let err = MailMenderError::attribute_decode(
                    &entry.dn,
                    &search.mail_attribute,
                    "values are not valid UTF-8",
                );
                self.errors.insert(entry.dn.clone(), err.to_string());
            } else {
                self.without_mail.push(entry.dn.clone());
            }
            return;
        };

        let flattened = mail::flatten_values(values);
        match mail::classify(&flattened, suffix) {
            MailShape::Missing => self.without_mail.push(entry.dn.clone()),
            MailShape::Bare => {
                self.bare.insert(entry.dn.clone(), flattened);
            }
            MailShape::Foreign => {
                self.foreign.insert(entry.dn.clone(), flattened);
            }
            MailShape::Canonical => self.canonical += 1,
        }
    }
}

/// Run the search and classify everything it returns.
pub async fn scan<C, E>(
    client: &mut C,
    search: &SearchConfig,
    suffix: &DomainSuffix,
    env: &E,
) -> Result<ScanReport>
where
    C: DirectoryClient + ?Sized,
    E: DirectoryEnv + ?Sized,
{
    if env.is_trace() {
        eprintln!(
            "Scanning '{}' with filter '{}'...",
            search.base_dn, search.filter
        );
    }

    let entries = client
        .search_subtree(
            &search.base_dn,
            &search.filter,
            &search.effective_attributes(),
            search.page_size,
        )
        .await?;

    let mut report = ScanReport::new();
    for entry in &entries {
        report.record_entry(entry, search, suffix);
    }

    if env.is_trace() {
        eprintln!(
            "Scan classified {} entries ({} needing change, {} skipped)",
            report.total_entries,
            report.needs_change(),
            report.skipped_non_user
        );
    }

    Ok(report)
}
