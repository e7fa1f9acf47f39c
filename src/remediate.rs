//! The write pass: derive the change list from a scan report and apply it.
//!
//! Two change classes exist:
//!   * `AddDomain` — the value had no '@'; the canonical suffix is appended.
//!   * `RewriteDomain` — the value had a non-matching domain; everything
//!     from the first '@' is replaced, the local part is preserved.
//!
//! A failed modify is recorded per DN and the pass continues; nothing is
//! retried here beyond what the directory client does for transient
//! failures, and nothing is rolled back.

use std::collections::BTreeMap;

use crate::directory::{DirectoryClient, DirectoryEnv};
use crate::mail::DomainSuffix;
use crate::scan::ScanReport;

/// Why an entry is being modified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// No domain existed; the suffix is appended.
    AddDomain,
    /// A non-matching domain is replaced by the suffix.
    RewriteDomain,
}

/// A single planned attribute replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedChange {
    pub dn: String,
    pub old: String,
    pub new: String,
    pub kind: ChangeKind,
}

/// Results of the write pass.
#[derive(Debug, Clone, Default)]
pub struct RemediationReport {
    /// Modifications attempted.
    pub attempted: u64,

    /// Bare values that got the suffix appended: DN -> (old, new).
    pub added: BTreeMap<String, (String, String)>,

    /// Mismatched domains that were rewritten: DN -> (old, new).
    pub rewritten: BTreeMap<String, (String, String)>,

    /// Modifications the server rejected: DN -> message.
    pub failed: BTreeMap<String, String>,
}

impl RemediationReport {
    /// Number of successfully applied changes.
    pub fn applied(&self) -> u64 {
        (self.added.len() + self.rewritten.len()) as u64
    }
}

/// Derive the ordered change list from a scan report.
///
/// Bare entries are always included; foreign entries only when
/// `rewrite_mismatched` is set.
pub fn plan(
    report: &ScanReport,
    suffix: &DomainSuffix,
    rewrite_mismatched: bool,
) -> Vec<PlannedChange> {
    let mut changes = Vec::with_capacity(report.needs_change());

    for (dn, old) in &report.bare {
        changes.push(PlannedChange {
            dn: dn.clone(),
            old: old.clone(),
            new: suffix.append(old),
            kind: ChangeKind::AddDomain,
        });
    }

    if rewrite_mismatched {
        for (dn, old) in &report.foreign {
            changes.push(PlannedChange {
                dn: dn.clone(),
                old: old.clone(),
                new: suffix.rewrite(old),
                kind: ChangeKind::RewriteDomain,
            });
        }
    }

    changes
}

/// Execute a change list against the directory.
pub async fn remediate<C, E>(
    client: &mut C,
    changes: &[PlannedChange],
    mail_attribute: &str,
    env: &E,
) -> RemediationReport
where
    C: DirectoryClient + ?Sized,
    E: DirectoryEnv + ?Sized,
{
    let mut report = RemediationReport::default();

    for change in changes {
        report.attempted += 1;
        if env.is_trace() {
            eprintln!("  modify {}: '{}' -> '{}'", change.dn, change.old, change.new);
        }

        match client
            .replace_attribute(&change.dn, mail_attribute, &change.new)
            .await
        {
            Ok(()) => {
                let record = (change.old.clone(), change.new.clone());
                match change.kind {
                    ChangeKind::AddDomain => {
                        report.added.insert(change.dn.clone(), record);
                    }
                    ChangeKind::RewriteDomain => {
                        report.rewritten.insert(change.dn.clone(), record);
                    }
                }
            }
            Err(e) => {
                if env.warn_enabled() {
                    eprintln!("Warning: modify failed for {}: {e}", change.dn);
                }
                report.failed.insert(change.dn.clone(), e.to_string());
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::DirectoryEntry;
    use crate::errors::{MailMenderError, Result};
    use async_trait::async_trait;
    use std::collections::HashSet;

    struct RecordingClient {
        fail_dns: HashSet<String>,
        modified: Vec<(String, String, String)>,
    }

    #[async_trait]
    impl DirectoryClient for RecordingClient {
        async fn search_subtree(
            &mut self,
            _base: &str,
            _filter: &str,
            _attrs: &[String],
            _page_size: i32,
        ) -> Result<Vec<DirectoryEntry>> {
            Ok(vec![])
        }

        async fn replace_attribute(
            &mut self,
            dn: &str,
            attribute: &str,
            value: &str,
        ) -> Result<()> {
            if self.fail_dns.contains(dn) {
                return Err(MailMenderError::modify(dn, "rc=50 (insufficientAccessRights)"));
            }
            self.modified
                .push((dn.to_string(), attribute.to_string(), value.to_string()));
            Ok(())
        }

        async fn unbind(&mut self) -> Result<()> {
            Ok(())
        }
    }

    struct QuietEnv;

    impl DirectoryEnv for QuietEnv {
        fn show_commands(&self) -> bool {
            false
        }
        fn is_trace(&self) -> bool {
            false
        }
        fn warn_enabled(&self) -> bool {
            false
        }
    }

    fn report_with_changes() -> ScanReport {
        let mut report = ScanReport::new();
        report
            .bare
            .insert("uid=bare,dc=x,dc=y".to_string(), "bare".to_string());
        report.foreign.insert(
            "uid=foreign,dc=x,dc=y".to_string(),
            "f@other.org".to_string(),
        );
        report
    }

    fn suffix() -> DomainSuffix {
        DomainSuffix::parse("@mygreatexample.edu").unwrap()
    }

    #[test]
    fn plan_includes_both_classes_by_default() {
        let changes = plan(&report_with_changes(), &suffix(), true);
        assert_eq!(changes.len(), 2);
        let bare = changes
            .iter()
            .find(|c| c.kind == ChangeKind::AddDomain)
            .unwrap();
        assert_eq!(bare.new, "bare@mygreatexample.edu");
        let foreign = changes
            .iter()
            .find(|c| c.kind == ChangeKind::RewriteDomain)
            .unwrap();
        assert_eq!(foreign.old, "f@other.org");
        assert_eq!(foreign.new, "f@mygreatexample.edu");
    }

    #[test]
    fn plan_can_skip_mismatched_domains() {
        let changes = plan(&report_with_changes(), &suffix(), false);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::AddDomain);
    }

    #[tokio::test]
    async fn remediate_records_successes_by_class() {
        let changes = plan(&report_with_changes(), &suffix(), true);
        let mut client = RecordingClient {
            fail_dns: HashSet::new(),
            modified: vec![],
        };

        let result = remediate(&mut client, &changes, "mail", &QuietEnv).await;

        assert_eq!(result.attempted, 2);
        assert_eq!(result.applied(), 2);
        assert!(result.failed.is_empty());
        assert_eq!(
            result.added.get("uid=bare,dc=x,dc=y").unwrap().1,
            "bare@mygreatexample.edu"
        );
        assert_eq!(
            result.rewritten.get("uid=foreign,dc=x,dc=y").unwrap(),
            &("f@other.org".to_string(), "f@mygreatexample.edu".to_string())
        );
        assert_eq!(client.modified.len(), 2);
        assert!(client.modified.iter().all(|(_, attr, _)| attr == "mail"));
    }

    #[tokio::test]
    async fn remediate_continues_past_failures() {
        let changes = plan(&report_with_changes(), &suffix(), true);
        let mut client = RecordingClient {
            fail_dns: HashSet::from(["uid=bare,dc=x,dc=y".to_string()]),
            modified: vec![],
        };

        let result = remediate(&mut client, &changes, "mail", &QuietEnv).await;

        assert_eq!(result.attempted, 2);
        assert_eq!(result.applied(), 1);
        assert!(
            result
                .failed
                .get("uid=bare,dc=x,dc=y")
                .unwrap()
                .contains("insufficientAccessRights")
        );
        assert_eq!(result.rewritten.len(), 1);
    }
}
