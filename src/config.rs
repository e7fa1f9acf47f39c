//! Configuration management for mailmender.
//!
//! This module provides structured configuration options that can be loaded
//! from environment variables and command-line arguments. It centralizes
//! connection settings, search parameters, and remediation toggles.

#![allow(dead_code)]

use std::time::Duration;

use crate::retry::RetryConfig;

/// Main configuration structure for mailmender.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Directory connection settings
    pub connection: ConnectionConfig,

    /// Search parameters
    pub search: SearchConfig,

    /// Remediation toggles
    pub remediation: RemediationConfig,

    /// Report rendering preferences
    pub output: OutputConfig,
}

/// Directory connection configuration
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Server URL (ldap:// or ldaps://)
    pub url: String,

    /// DN to bind as (anonymous bind when None)
    pub bind_dn: Option<String>,

    /// Bind password
    pub password: Option<String>,

    /// Negotiate StartTLS on a plain connection
    pub starttls: bool,

    /// Skip TLS certificate verification
    pub no_tls_verify: bool,

    /// Connection timeout
    pub connect_timeout: Duration,

    /// Retry schedule for transient modify failures
    pub retry: RetryConfig,
}

/// Search configuration
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Base DN of the subtree to scan
    pub base_dn: String,

    /// LDAP search filter
    pub filter: String,

    /// Attribute holding the email address
    pub mail_attribute: String,

    /// RDN attribute that marks user entries
    pub identifier_attribute: String,

    /// Attributes to request
    pub attributes: Vec<String>,

    /// Page size for the paged-results control
    pub page_size: i32,
}

/// Remediation configuration
#[derive(Debug, Clone)]
pub struct RemediationConfig {
    /// Actually write modifications (false = dry run)
    pub apply: bool,

    /// Rewrite entries whose mail carries a non-matching domain
    pub rewrite_mismatched: bool,

    /// Canonical domain suffix to enforce ("@example.edu")
    pub domain: String,
}

/// Report rendering configuration
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Maximum DNs listed per report section (0 = unlimited)
    pub max_listed: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            bind_dn: None,
            password: None,
            starttls: false,
            no_tls_verify: false,
            connect_timeout: Duration::from_secs(10),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_dn: String::new(),
            filter: "(objectClass=*)".to_string(),
            mail_attribute: "mail".to_string(),
            identifier_attribute: "uid".to_string(),
            attributes: vec!["cn".to_string(), "mail".to_string()],
            page_size: 500,
        }
    }
}

impl Default for RemediationConfig {
    fn default() -> Self {
        Self {
            apply: false,
            rewrite_mismatched: true,
            domain: String::new(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { max_listed: 0 }
    }
}

impl SearchConfig {
    /// Attribute list to request, guaranteed to include the mail attribute.
    pub fn effective_attributes(&self) -> Vec<String> {
        let mut attrs = self.attributes.clone();
        if !attrs
            .iter()
            .any(|a| a.eq_ignore_ascii_case(&self.mail_attribute))
        {
            attrs.push(self.mail_attribute.clone());
        }
        attrs
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("MAILMENDER_URL") {
            config.connection.url = url;
        }
        if let Ok(bind_dn) = std::env::var("MAILMENDER_BIND_DN") {
            config.connection.bind_dn = Some(bind_dn);
        }
        if let Ok(password) = std::env::var("MAILMENDER_PASSWORD") {
            config.connection.password = Some(password);
        }
        if let Ok(timeout) = std::env::var("MAILMENDER_CONNECT_TIMEOUT_SECS")
            && let Ok(secs) = timeout.parse::<u64>()
        {
            config.connection.connect_timeout = Duration::from_secs(secs);
        }

        if let Ok(base_dn) = std::env::var("MAILMENDER_BASE_DN") {
            config.search.base_dn = base_dn;
        }
        if let Ok(filter) = std::env::var("MAILMENDER_FILTER") {
            config.search.filter = filter;
        }
        if let Ok(attr) = std::env::var("MAILMENDER_MAIL_ATTRIBUTE") {
            config.search.mail_attribute = attr;
        }
        if let Ok(attr) = std::env::var("MAILMENDER_IDENTIFIER") {
            config.search.identifier_attribute = attr;
        }
        if let Ok(page_size) = std::env::var("MAILMENDER_PAGE_SIZE")
            && let Ok(n) = page_size.parse::<i32>()
        {
            config.search.page_size = n;
        }

        if let Ok(domain) = std::env::var("MAILMENDER_DOMAIN") {
            config.remediation.domain = domain;
        }

        if let Ok(max_listed) = std::env::var("MAILMENDER_MAX_LISTED")
            && let Ok(n) = max_listed.parse::<usize>()
        {
            config.output.max_listed = n;
        }

        config
    }

    /// Merge with CLI arguments, giving CLI precedence
    pub fn merge_with_cli(&mut self, cli: &crate::cli::Cli) {
        if let Some(ref url) = cli.url {
            self.connection.url = url.clone();
        }
        if let Some(ref bind_dn) = cli.bind_dn {
            self.connection.bind_dn = Some(bind_dn.clone());
        }
        if let Some(ref password) = cli.password {
            self.connection.password = Some(password.clone());
        }
        if cli.starttls {
            self.connection.starttls = true;
        }
        if cli.no_tls_verify {
            self.connection.no_tls_verify = true;
        }
        if let Some(secs) = cli.connect_timeout_secs {
            self.connection.connect_timeout = Duration::from_secs(secs);
        }

        if let Some(ref base_dn) = cli.base_dn {
            self.search.base_dn = base_dn.clone();
        }
        if let Some(ref filter) = cli.filter {
            self.search.filter = filter.clone();
        }
        if let Some(ref attr) = cli.mail_attribute {
            self.search.mail_attribute = attr.clone();
        }
        if let Some(ref attr) = cli.identifier {
            self.search.identifier_attribute = attr.clone();
        }
        if let Some(page_size) = cli.page_size {
            self.search.page_size = page_size;
        }

        if let Some(ref domain) = cli.domain {
            self.remediation.domain = domain.clone();
        }
        if cli.apply {
            self.remediation.apply = true;
        }
        if cli.skip_mismatched {
            self.remediation.rewrite_mismatched = false;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection.url.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "connection.url".to_string(),
            });
        }
        if !self.connection.url.starts_with("ldap://") && !self.connection.url.starts_with("ldaps://")
        {
            return Err(ConfigError::InvalidValue {
                field: "connection.url".to_string(),
                value: self.connection.url.clone(),
                reason: "URL scheme must be ldap:// or ldaps://".to_string(),
            });
        }
        if self.connection.connect_timeout.as_secs() == 0 {
            return Err(ConfigError::InvalidValue {
                field: "connection.connect_timeout".to_string(),
                value: "0".to_string(),
                reason: "Timeout must be greater than 0".to_string(),
            });
        }

        if self.search.base_dn.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "search.base_dn".to_string(),
            });
        }
        if self.search.mail_attribute.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "search.mail_attribute".to_string(),
            });
        }
        if self.search.identifier_attribute.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "search.identifier_attribute".to_string(),
            });
        }
        if self.search.page_size < 1 {
            return Err(ConfigError::InvalidValue {
                field: "search.page_size".to_string(),
                value: self.search.page_size.to_string(),
                reason: "Page size must be at least 1".to_string(),
            });
        }

        if self.remediation.domain.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "remediation.domain".to_string(),
            });
        }
        let domain = self.remediation.domain.trim();
        if !domain.starts_with('@')
            || !domain[1..].contains('.')
            || domain.chars().any(char::is_whitespace)
        {
            return Err(ConfigError::InvalidValue {
                field: "remediation.domain".to_string(),
                value: self.remediation.domain.clone(),
                reason: "Domain suffix must look like '@example.edu'".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
    /// Invalid configuration value
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// Missing required configuration
    MissingRequired { field: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue {
                field,
                value,
                reason,
            } => {
                write!(f, "Invalid value '{}' for '{}': {}", value, field, reason)
            }
            ConfigError::MissingRequired { field } => {
                write!(f, "Missing required configuration field: {}", field)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use std::env;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.connection.url = "ldaps://directory.example.edu:10636".to_string();
        config.search.base_dn = "dc=example,dc=edu".to_string();
        config.remediation.domain = "@mygreatexample.edu".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.search.filter, "(objectClass=*)");
        assert_eq!(config.search.mail_attribute, "mail");
        assert_eq!(config.search.identifier_attribute, "uid");
        assert_eq!(config.search.page_size, 500);
        assert!(!config.remediation.apply);
        assert!(config.remediation.rewrite_mismatched);
    }

    #[test]
    fn test_config_validation() {
        let mut config = valid_config();
        assert!(config.validate().is_ok());

        config.connection.url = "http://directory.example.edu".to_string();
        assert!(config.validate().is_err());

        config = valid_config();
        config.remediation.domain = "mygreatexample.edu".to_string();
        assert!(config.validate().is_err());

        config = valid_config();
        config.search.page_size = 0;
        assert!(config.validate().is_err());

        config = valid_config();
        config.search.base_dn = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_loading() {
        unsafe {
            env::set_var("MAILMENDER_FILTER", "(objectClass=person)");
            env::set_var("MAILMENDER_PAGE_SIZE", "25");
        }

        let config = Config::from_env();
        assert_eq!(config.search.filter, "(objectClass=person)");
        assert_eq!(config.search.page_size, 25);

        // Clean up
        unsafe {
            env::remove_var("MAILMENDER_FILTER");
            env::remove_var("MAILMENDER_PAGE_SIZE");
        }
    }

    #[test]
    fn test_cli_merge_precedence() {
        let mut config = valid_config();
        let cli = Cli::parse_from([
            "mailmender",
            "--url",
            "ldap://other.example.edu",
            "--domain",
            "@other.edu",
            "--apply",
            "--skip-mismatched",
            "--page-size",
            "50",
        ]);
        config.merge_with_cli(&cli);

        assert_eq!(config.connection.url, "ldap://other.example.edu");
        assert_eq!(config.remediation.domain, "@other.edu");
        assert!(config.remediation.apply);
        assert!(!config.remediation.rewrite_mismatched);
        assert_eq!(config.search.page_size, 50);
    }

    #[test]
    fn test_effective_attributes_include_mail() {
        let mut search = SearchConfig::default();
        search.mail_attribute = "proxyAddresses".to_string();
        let attrs = search.effective_attributes();
        assert!(attrs.iter().any(|a| a == "proxyAddresses"));
    }
}
