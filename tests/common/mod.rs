//! Shared helpers for integration tests: an in-memory directory fake
//! and entry builders.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

use mailmender::directory::{DirectoryClient, DirectoryEntry};
use mailmender::errors::{MailMenderError, Result};

/// In-memory stand-in for the LDAP server. Entries are returned verbatim
/// by `search_subtree`; successful modifications are recorded and applied
/// to the entry map so follow-up searches observe them.
pub struct FakeDirectory {
    pub entries: Vec<DirectoryEntry>,
    /// DNs whose modification the "server" rejects.
    pub fail_dns: HashSet<String>,
    /// Every successful modification: (dn, attribute, new value).
    pub modified: Vec<(String, String, String)>,
    pub unbound: bool,
}

impl FakeDirectory {
    pub fn new(entries: Vec<DirectoryEntry>) -> Self {
        Self {
            entries,
            fail_dns: HashSet::new(),
            modified: Vec::new(),
            unbound: false,
        }
    }

    pub fn failing_on(mut self, dn: &str) -> Self {
        self.fail_dns.insert(dn.to_string());
        self
    }
}

#[async_trait]
impl DirectoryClient for FakeDirectory {
    async fn search_subtree(
        &mut self,
        _base: &str,
        _filter: &str,
        _attrs: &[String],
        _page_size: i32,
    ) -> Result<Vec<DirectoryEntry>> {
        Ok(self.entries.clone())
    }

    async fn replace_attribute(&mut self, dn: &str, attribute: &str, value: &str) -> Result<()> {
        if self.fail_dns.contains(dn) {
            return Err(MailMenderError::modify(
                dn,
                "rc=50 (insufficientAccessRights)",
            ));
        }
        if let Some(entry) = self.entries.iter_mut().find(|e| e.dn == dn) {
            entry
                .attrs
                .insert(attribute.to_string(), vec![value.to_string()]);
        }
        self.modified
            .push((dn.to_string(), attribute.to_string(), value.to_string()));
        Ok(())
    }

    async fn unbind(&mut self) -> Result<()> {
        self.unbound = true;
        Ok(())
    }
}

/// A user entry (has a uid RDN) with the given mail values.
pub fn user_entry(uid: &str, mail: &[&str]) -> DirectoryEntry {
    let mut attrs = HashMap::from([("cn".to_string(), vec![format!("User {uid}")])]);
    if !mail.is_empty() {
        attrs.insert(
            "mail".to_string(),
            mail.iter().map(|m| m.to_string()).collect(),
        );
    }
    DirectoryEntry {
        dn: format!("uid={uid},ou=people,dc=example,dc=edu"),
        attrs,
        binary_attrs: vec![],
    }
}

/// A non-user entry (no uid RDN).
pub fn org_unit(name: &str) -> DirectoryEntry {
    DirectoryEntry {
        dn: format!("ou={name},dc=example,dc=edu"),
        attrs: HashMap::from([("ou".to_string(), vec![name.to_string()])]),
        binary_attrs: vec![],
    }
}

/// Quiet environment for driving the passes from tests.
pub struct QuietEnv;

impl mailmender::directory::DirectoryEnv for QuietEnv {
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
