use clap::Parser;

/// Command-line interface definition.
/// Provides command-line options for the directory mail remediation pass.
///
/// Verbosity levels:
/// 0 - silent (only final report)
/// 1 - errors (default)
/// 2 - warnings + errors
/// 5 - trace/debug
#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Scan a directory service and enforce a canonical domain suffix on the mail attribute"
)]
pub struct Cli {
    /// Directory server URL (ldap:// or ldaps://). Falls back to MAILMENDER_URL.
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// DN to bind as; anonymous bind when omitted.
    #[arg(long = "bind-dn", value_name = "DN")]
    pub bind_dn: Option<String>,

    /// Bind password. Falls back to MAILMENDER_PASSWORD.
    #[arg(long, value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Base DN of the subtree to scan. Falls back to MAILMENDER_BASE_DN.
    #[arg(long = "base-dn", value_name = "DN")]
    pub base_dn: Option<String>,

    /// LDAP search filter.
    #[arg(long, value_name = "FILTER")]
    pub filter: Option<String>,

    /// Attribute holding the email address.
    #[arg(long = "mail-attribute", value_name = "ATTR")]
    pub mail_attribute: Option<String>,

    /// RDN attribute that marks user entries; entries whose DN lacks it are skipped.
    #[arg(long, value_name = "ATTR")]
    pub identifier: Option<String>,

    /// Canonical domain suffix to enforce, e.g. "@mygreatexample.edu".
    #[arg(long, value_name = "@SUFFIX")]
    pub domain: Option<String>,

    /// Page size for the paged search control.
    #[arg(long = "page-size", value_name = "N")]
    pub page_size: Option<i32>,

    /// Negotiate StartTLS on a plain ldap:// connection.
    #[arg(long)]
    pub starttls: bool,

    /// Skip TLS certificate verification (testing only).
    #[arg(long = "no-tls-verify")]
    pub no_tls_verify: bool,

    /// Connection timeout in seconds.
    #[arg(long = "connect-timeout-secs", value_name = "SECS")]
    pub connect_timeout_secs: Option<u64>,

    /// Actually write modifications; without this flag the run is a dry run.
    #[arg(long)]
    pub apply: bool,

    /// When applying, leave entries whose mail has a non-matching domain alone
    /// (only append the suffix where no domain exists at all).
    #[arg(long = "skip-mismatched")]
    pub skip_mismatched: bool,

    /// Verbosity level (0,1,2,5)
    #[arg(long, default_value_t = 1)]
    pub verbose: u8,

    /// Show approximate shell-equivalent commands
    #[arg(long)]
    pub show_commands: bool,

    /// Batch output: one "dn<TAB>old<TAB>new" line per change
    #[arg(long)]
    pub batch: bool,

    /// Output results as JSON
    #[arg(long, conflicts_with = "yaml")]
    pub json: bool,

    /// Output results as YAML
    #[arg(long, conflicts_with = "json")]
    pub yaml: bool,

    /// Force plain text output (no styling)
    #[arg(long)]
    pub plain: bool,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Print the JSON schema of the structured output and exit
    #[arg(long = "generate-schema")]
    pub generate_schema: bool,
}

/// Requested rendering of the final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

impl Cli {
    /// Parse CLI arguments from process args.
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Convenience: are we in very verbose/debug mode?
    pub fn is_trace(&self) -> bool {
        self.verbose >= 5
    }

    /// Should we show per-entry detail beyond the summary sections?
    pub fn show_internal(&self) -> bool {
        self.is_trace()
    }

    /// Are warning-level messages enabled?
    pub fn warn_enabled(&self) -> bool {
        self.verbose >= 2
    }

    /// Are error-level messages enabled?
    pub fn error_enabled(&self) -> bool {
        self.verbose >= 1
    }

    /// Resolved output format for the final report.
    pub fn output_format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else if self.yaml {
            OutputFormat::Yaml
        } else {
            OutputFormat::Text
        }
    }

    /// Is a machine-readable structured format requested?
    pub fn is_structured_output(&self) -> bool {
        self.json || self.yaml
    }

    /// Should the styled terminal formatter be used?
    pub fn should_use_styling(&self) -> bool {
        !self.plain && !self.batch && !self.is_structured_output()
    }
}
