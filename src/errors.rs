//! Unified error handling for mailmender.
//!
//! A `thiserror`-based model with:
//!   * Typed variants for the common failure domains
//!   * A categorization layer (`ErrorCategory`) for structured reporting
//!   * Helper constructors
//!   * `From` conversions for common lower-level errors
//!
//! Design goals:
//!   * Keep end-user messages clear & actionable
//!   * Avoid leaking internal implementation details
//!   * Enable structured output to classify errors deterministically
//!
//! Categories are intentionally coarse:
//!   - Input: configuration / data validation issues
//!   - Directory: bind, search or modify problems against the server
//!   - Parse: attribute / DN decoding issues
//!   - Internal: logic bugs or unexpected states

use std::io;

use thiserror::Error;

/// High-level classification for structured reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Directory,
    Parse,
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCategory::Input => "input",
            ErrorCategory::Directory => "directory",
            ErrorCategory::Parse => "parse",
            ErrorCategory::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Primary application error type.
#[derive(Error, Debug)]
pub enum MailMenderError {
    // ------------------------ Input / Validation ----------------------------
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid domain suffix '{suffix}': {reason}")]
    InvalidDomainSuffix { suffix: String, reason: String },

    // ---------------------------- Directory ---------------------------------
    #[error("Bind to '{url}' failed: {reason}")]
    Bind { url: String, reason: String },

    #[error("Search under '{base}' failed: {reason}")]
    Search { base: String, reason: String },

    #[error("Modify of '{dn}' failed: {reason}")]
    Modify { dn: String, reason: String },

    #[error("Directory error during {operation}: {source}")]
    Directory {
        operation: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    // ---------------------------- Parsing -----------------------------------
    #[error("Attribute '{attribute}' of entry '{dn}' could not be decoded: {reason}")]
    AttributeDecode {
        dn: String,
        attribute: String,
        reason: String,
    },

    // ----------------------------- I/O / FS ---------------------------------
    #[error("I/O error during {operation} on {path}: {source}")]
    Io {
        path: String,
        operation: String,
        #[source]
        source: io::Error,
    },

    // ---------------------------- Internal ----------------------------------
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl MailMenderError {
    /// Categorize the error for structured output.
    pub fn category(&self) -> ErrorCategory {
        use MailMenderError::*;
        match self {
            Configuration { .. } | InvalidDomainSuffix { .. } => ErrorCategory::Input,

            Bind { .. } | Search { .. } | Modify { .. } | Directory { .. } => {
                ErrorCategory::Directory
            }

            AttributeDecode { .. } => ErrorCategory::Parse,

            Io { .. } | Internal { .. } => ErrorCategory::Internal,
        }
    }

    // ---------------------------- Constructors -----------------------------

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn invalid_domain_suffix(suffix: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDomainSuffix {
            suffix: suffix.into(),
            reason: reason.into(),
        }
    }

    pub fn bind(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Bind {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub fn search(base: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Search {
            base: base.into(),
            reason: reason.into(),
        }
    }

    pub fn modify(dn: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Modify {
            dn: dn.into(),
            reason: reason.into(),
        }
    }

    pub fn attribute_decode(
        dn: impl Into<String>,
        attribute: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::AttributeDecode {
            dn: dn.into(),
            attribute: attribute.into(),
            reason: reason.into(),
        }
    }

    pub fn io(path: impl Into<String>, operation: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    pub fn internal_with(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// Public result alias.
pub type Result<T> = std::result::Result<T, MailMenderError>;

/// Map standard IO errors into the `Io` variant (generic context).
impl From<io::Error> for MailMenderError {
    fn from(e: io::Error) -> Self {
        MailMenderError::Io {
            path: "<unknown>".into(),
            operation: "unspecified".into(),
            source: e,
        }
    }
}

/// Map raw LDAP client errors without call-site context; callers with
/// context should prefer the `bind` / `search` / `modify` constructors.
impl From<ldap3::LdapError> for MailMenderError {
    fn from(e: ldap3::LdapError) -> Self {
        MailMenderError::Directory {
            operation: "directory operation".into(),
            source: e.to_string().into(),
        }
    }
}
