use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{MailMenderError, Result};

/// Canonical "@domain" suffix the remediation enforces.
///
/// The suffix is kept exactly as configured; matching against existing
/// mail values is case-insensitive, produced values carry the configured
/// spelling verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainSuffix {
    suffix: String,
    lowered: String,
}

impl DomainSuffix {
    /// Parse and validate a canonical suffix ("@example.edu").
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if !trimmed.starts_with('@') {
            return Err(MailMenderError::invalid_domain_suffix(
                s,
                "must start with '@'",
            ));
        }
        let domain = &trimmed[1..];
        if domain.is_empty() || !domain.contains('.') {
            return Err(MailMenderError::invalid_domain_suffix(
                s,
                "must name a dotted domain after the '@'",
            ));
        }
        if domain.contains('@') || trimmed.chars().any(char::is_whitespace) {
            return Err(MailMenderError::invalid_domain_suffix(
                s,
                "must not contain whitespace or a second '@'",
            ));
        }
        Ok(Self {
            suffix: trimmed.to_string(),
            lowered: trimmed.to_ascii_lowercase(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.suffix
    }

    /// True if the mail value already ends with this suffix.
    pub fn matches(&self, mail: &str) -> bool {
        mail.trim().to_ascii_lowercase().ends_with(&self.lowered)
    }

    /// Append the suffix to a bare local part ("jdoe" -> "jdoe@example.edu").
    pub fn append(&self, local: &str) -> String {
        format!("{}{}", local.trim(), self.suffix)
    }

    /// Replace everything from the first '@' with this suffix, preserving
    /// the local part ("jdoe@old.org" -> "jdoe@example.edu").
    pub fn rewrite(&self, mail: &str) -> String {
        let local = mail.trim().split('@').next().unwrap_or("");
        format!("{local}{}", self.suffix)
    }
}

/// Shape of an entry's (flattened) mail value relative to the canonical suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailShape {
    /// Attribute absent or empty after trimming.
    Missing,
    /// No '@' anywhere in the value.
    Bare,
    /// Has an '@domain' part, but not the canonical one.
    Foreign,
    /// Already carries the canonical suffix.
    Canonical,
}

/// Classify a flattened mail value.
pub fn classify(mail: &str, suffix: &DomainSuffix) -> MailShape {
    let trimmed = mail.trim();
    if trimmed.is_empty() {
        MailShape::Missing
    } else if !trimmed.contains('@') {
        MailShape::Bare
    } else if suffix.matches(trimmed) {
        MailShape::Canonical
    } else {
        MailShape::Foreign
    }
}

/// Flatten a multi-valued attribute into the single string that gets
/// classified and rewritten (values joined with one space).
pub fn flatten_values(values: &[String]) -> String {
    values.join(" ")
}

/// Lightweight plausibility check (syntax only).
pub fn is_plausible_email(e: &str) -> bool {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)^[A-Z0-9._%+\-]+@[A-Z0-9.\-]+\.[A-Z]{2,}$").unwrap());
    e.len() <= 254 && RE.is_match(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suffix() -> DomainSuffix {
        DomainSuffix::parse("@mygreatexample.edu").unwrap()
    }

    #[test]
    fn parse_rejects_malformed_suffixes() {
        assert!(DomainSuffix::parse("example.edu").is_err());
        assert!(DomainSuffix::parse("@").is_err());
        assert!(DomainSuffix::parse("@edu").is_err());
        assert!(DomainSuffix::parse("@ex ample.edu").is_err());
        assert!(DomainSuffix::parse("@a@b.edu").is_err());
        assert!(DomainSuffix::parse("@example.edu").is_ok());
    }

    #[test]
    fn classify_bare_value() {
        assert_eq!(classify("jdoe", &suffix()), MailShape::Bare);
    }

    #[test]
    fn classify_foreign_domain() {
        assert_eq!(
            classify("jdoe@otherschool.org", &suffix()),
            MailShape::Foreign
        );
    }

    #[test]
    fn classify_canonical_is_case_insensitive() {
        assert_eq!(
            classify("jdoe@MyGreatExample.EDU", &suffix()),
            MailShape::Canonical
        );
    }

    #[test]
    fn classify_empty_is_missing() {
        assert_eq!(classify("", &suffix()), MailShape::Missing);
        assert_eq!(classify("   ", &suffix()), MailShape::Missing);
    }

    #[test]
    fn lookalike_domain_is_foreign() {
        // A suffix embedded mid-string must not count as canonical.
        assert_eq!(
            classify("jdoe@mygreatexample.edu.evil.com", &suffix()),
            MailShape::Foreign
        );
    }

    #[test]
    fn append_builds_canonical_address() {
        assert_eq!(suffix().append("jdoe"), "jdoe@mygreatexample.edu");
    }

    #[test]
    fn rewrite_preserves_local_part() {
        assert_eq!(
            suffix().rewrite("jdoe@otherschool.org"),
            "jdoe@mygreatexample.edu"
        );
        // Everything from the first '@' is replaced.
        assert_eq!(
            suffix().rewrite("weird@name@otherschool.org"),
            "weird@mygreatexample.edu"
        );
    }

    #[test]
    fn flatten_joins_with_spaces() {
        let values = vec!["a@x.edu".to_string(), "b@x.edu".to_string()];
        assert_eq!(flatten_values(&values), "a@x.edu b@x.edu");
    }

    #[test]
    fn plausibility_basics() {
        assert!(is_plausible_email("jdoe@example.edu"));
        assert!(!is_plausible_email("jdoe"));
        assert!(!is_plausible_email("jdoe@nodot"));
    }
}
