use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use ldap3::adapters::{Adapter, EntriesOnly, PagedResults};
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Mod, Scope, SearchEntry};

use crate::cli::Cli;
use crate::config::ConnectionConfig;
use crate::errors::{MailMenderError, Result};
use crate::retry::{DirectoryRetryPolicy, RetryConfig, RetryPolicy};

/// Abstraction over environment / verbosity for directory operations.
/// This removes the direct dependency of the directory client on the
/// concrete CLI type and enables reuse from tests and orchestration code.
pub trait DirectoryEnv {
    fn show_commands(&self) -> bool;
    fn is_trace(&self) -> bool;
    fn warn_enabled(&self) -> bool;
}

impl DirectoryEnv for Cli {
    fn show_commands(&self) -> bool {
        self.show_commands
    }
    fn is_trace(&self) -> bool {
        self.is_trace()
    }
    fn warn_enabled(&self) -> bool {
        self.warn_enabled()
    }
}

impl DirectoryEnv for std::sync::Arc<Cli> {
    fn show_commands(&self) -> bool {
        self.as_ref().show_commands()
    }
    fn is_trace(&self) -> bool {
        self.as_ref().is_trace()
    }
    fn warn_enabled(&self) -> bool {
        self.as_ref().warn_enabled()
    }
}

/// One entry as returned by the search pass, decoupled from the wire types.
#[derive(Debug, Clone, Default)]
pub struct DirectoryEntry {
    /// Distinguished name.
    pub dn: String,
    /// Textual attributes (attribute name -> values).
    pub attrs: HashMap<String, Vec<String>>,
    /// Names of attributes the server returned as raw bytes only
    /// (values that are not valid UTF-8).
    pub binary_attrs: Vec<String>,
}

impl DirectoryEntry {
    /// Values of an attribute, looked up case-insensitively
    /// (directory attribute names are not case-sensitive).
    pub fn values(&self, attribute: &str) -> Option<&[String]> {
        self.attrs
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(attribute))
            .map(|(_, values)| values.as_slice())
    }

    /// True if the attribute came back as undecodable raw bytes.
    pub fn has_binary(&self, attribute: &str) -> bool {
        self.binary_attrs
            .iter()
            .any(|name| name.eq_ignore_ascii_case(attribute))
    }

    /// True if the entry carries any attributes at all.
    pub fn has_any_attributes(&self) -> bool {
        !self.attrs.is_empty() || !self.binary_attrs.is_empty()
    }

    pub fn from_search_entry(entry: SearchEntry) -> Self {
        let binary_attrs = entry.bin_attrs.keys().cloned().collect();
        Self {
            dn: entry.dn,
            attrs: entry.attrs,
            binary_attrs,
        }
    }
}

/// The directory-protocol seam: everything the remediation pass needs
/// from the server. The production implementation wraps `ldap3`; tests
/// substitute an in-memory fake.
#[async_trait]
pub trait DirectoryClient: Send {
    /// Paged subtree search; pages are drained into one entry list.
    async fn search_subtree(
        &mut self,
        base: &str,
        filter: &str,
        attrs: &[String],
        page_size: i32,
    ) -> Result<Vec<DirectoryEntry>>;

    /// Replace the whole attribute of an entry with a single value.
    async fn replace_attribute(&mut self, dn: &str, attribute: &str, value: &str) -> Result<()>;

    /// Close the connection.
    async fn unbind(&mut self) -> Result<()>;
}

/// Production client backed by `ldap3`.
pub struct LdapDirectory {
    ldap: Ldap,
    url: String,
    retry: RetryConfig,
    show_commands: bool,
    trace: bool,
}

impl LdapDirectory {
    /// Connect and bind. A bind failure here is fatal for the run.
    pub async fn connect<E: DirectoryEnv + ?Sized>(
        config: &ConnectionConfig,
        env: &E,
    ) -> Result<Self> {
        let mut settings = LdapConnSettings::new()
            .set_conn_timeout(config.connect_timeout)
            .set_starttls(config.starttls);
        if config.no_tls_verify {
            settings = settings.set_no_tls_verify(true);
        }

        if env.is_trace() {
            eprintln!("Connecting to {}...", config.url);
        }

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &config.url)
            .await
            .map_err(|e| MailMenderError::bind(&config.url, e.to_string()))?;
        ldap3::drive!(conn);

        let bind_dn = config.bind_dn.as_deref().unwrap_or("");
        let password = config.password.as_deref().unwrap_or("");

        if env.show_commands() {
            eprintln!(
                "(cmd) ldapwhoami -H {} -D '{}' -w ...",
                config.url, bind_dn
            );
        }
        if env.is_trace() {
            let who = if bind_dn.is_empty() {
                "<anonymous>"
            } else {
                bind_dn
            };
            eprintln!("Binding as {who}");
        }

        ldap.simple_bind(bind_dn, password)
            .await
            .and_then(|res| res.success())
            .map_err(|e| MailMenderError::bind(&config.url, e.to_string()))?;

        Ok(Self {
            ldap,
            url: config.url.clone(),
            retry: config.retry.clone(),
            show_commands: env.show_commands(),
            trace: env.is_trace(),
        })
    }
}

#[async_trait]
impl DirectoryClient for LdapDirectory {
    async fn search_subtree(
        &mut self,
        base: &str,
        filter: &str,
        attrs: &[String],
        page_size: i32,
    ) -> Result<Vec<DirectoryEntry>> {
        if self.show_commands {
            eprintln!(
                "(cmd) ldapsearch -H {} -b '{}' -s sub '{}' {} -E pr={}/noprompt",
                self.url,
                base,
                filter,
                attrs.join(" "),
                page_size
            );
        }

        let adapters: Vec<Box<dyn Adapter<_, _>>> = vec![
            Box::new(EntriesOnly::new()),
            Box::new(PagedResults::new(page_size)),
        ];

        let mut search = self
            .ldap
            .streaming_search_with(adapters, base, Scope::Subtree, filter, attrs.to_vec())
            .await
            .map_err(|e| MailMenderError::search(base, e.to_string()))?;

        let mut entries = Vec::new();
        while let Some(result_entry) = search
            .next()
            .await
            .map_err(|e| MailMenderError::search(base, e.to_string()))?
        {
            entries.push(DirectoryEntry::from_search_entry(SearchEntry::construct(
                result_entry,
            )));
            if self.trace && entries.len() % 1000 == 0 {
                eprintln!("  fetched {} entries...", entries.len());
            }
        }

        search
            .finish()
            .await
            .success()
            .map_err(|e| MailMenderError::search(base, e.to_string()))?;

        if self.trace {
            eprintln!("Search returned {} entries", entries.len());
        }

        Ok(entries)
    }

    async fn replace_attribute(&mut self, dn: &str, attribute: &str, value: &str) -> Result<()> {
        if self.show_commands {
            eprintln!(
                "(cmd) ldapmodify -H {} # dn: {dn} / replace {attribute}: {value}",
                self.url
            );
        }

        let mut attempt: u32 = 0;
        loop {
            let outcome = self
                .ldap
                .modify(dn, vec![Mod::Replace(attribute, HashSet::from([value]))])
                .await
                .and_then(|res| res.success());

            match outcome {
                Ok(_) => return Ok(()),
                Err(e)
                    if attempt < self.retry.max_attempts
                        && DirectoryRetryPolicy.should_retry(&e, attempt) =>
                {
                    let delay = self.retry.delay_for(attempt);
                    if self.trace {
                        eprintln!(
                            "  transient modify failure on {dn} (attempt {}): {e}; retrying in {:?}",
                            attempt + 1,
                            delay
                        );
                    }
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(MailMenderError::modify(dn, e.to_string())),
            }
        }
    }

    async fn unbind(&mut self) -> Result<()> {
        self.ldap
            .unbind()
            .await
            .map_err(|e| MailMenderError::Directory {
                operation: "unbind".into(),
                source: e.to_string().into(),
            })
    }
}
