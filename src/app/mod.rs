//! High-level application orchestration layer.
//!
//! This module provides the CLI-facing `App` façade. It validates
//! configuration, connects and binds, runs the scan and (when applying)
//! the write pass, and renders either structured (JSON/YAML) or
//! human-oriented output (styled / plain / batch).
//!
//! Major steps in `App::run`:
//!   1. Schema generation early-exit
//!   2. Config load / merge / validation
//!   3. Connect + bind (fatal on failure)
//!   4. Scan + classification
//!   5. Change planning; write pass when --apply is set
//!   6. Structured output (JSON/YAML) or styled/plain/batch fallback
//!
//! Exit codes: 0 once a report was produced (per-entry and per-modify
//! failures are part of the report), 1 for configuration, bind, or
//! search failures.

use std::time::Instant;

use crate::cli::{Cli, OutputFormat};
use crate::config::Config;
use crate::directory::{DirectoryClient, LdapDirectory};
use crate::errors::Result;
use crate::mail::DomainSuffix;
use crate::output::{self, ReportFormat, RunMetadata, RunResults};
use crate::remediate::{plan, remediate};
use crate::scan::scan;
use crate::structured_output::MailMenderOutput;
use crate::styled_output::StyledFormatter;

/// Application façade.
pub struct App;

impl App {
    /// Execute the end-to-end remediation workflow.
    ///
    /// Returns: intended process exit code.
    pub async fn run(cli: &Cli) -> Result<i32> {
        if Self::maybe_print_schema(cli)? {
            return Ok(0);
        }

        let mut config = Config::from_env();
        config.merge_with_cli(cli);

        if let Err(e) = config.validate() {
            if cli.error_enabled() {
                eprintln!("Configuration error: {e}");
            }
            return Ok(1);
        }

        // validate() vets the shape, so this only fails on internal drift.
        let suffix = DomainSuffix::parse(&config.remediation.domain)?;

        let start_time = Instant::now();
        let mut warnings: Vec<String> = Vec::new();

        let mut client = match LdapDirectory::connect(&config.connection, cli).await {
            Ok(client) => client,
            Err(e) => {
                if cli.error_enabled() {
                    eprintln!("Error connecting to directory: {e}");
                }
                return Ok(1);
            }
        };

        let scan_report = match scan(&mut client, &config.search, &suffix, cli).await {
            Ok(report) => report,
            Err(e) => {
                if cli.error_enabled() {
                    eprintln!("Directory search failed: {e}");
                }
                let _ = client.unbind().await;
                return Ok(1);
            }
        };

        let planned = plan(&scan_report, &suffix, config.remediation.rewrite_mismatched);

        if !config.remediation.rewrite_mismatched && !scan_report.foreign.is_empty() {
            warnings.push(format!(
                "{} entries with a non-matching domain left unchanged (--skip-mismatched)",
                scan_report.foreign.len()
            ));
        }

        let remediation = if config.remediation.apply {
            if cli.is_trace() {
                eprintln!("Applying {} modifications...", planned.len());
            }
            Some(remediate(&mut client, &planned, &config.search.mail_attribute, cli).await)
        } else {
            None
        };

        if let Err(e) = client.unbind().await
            && cli.warn_enabled()
        {
            eprintln!("Warning: unbind failed: {e}");
        }

        let results = RunResults {
            scan: scan_report,
            planned,
            remediation,
            metadata: RunMetadata {
                duration_ms: Some(start_time.elapsed().as_millis() as u64),
                url: config.connection.url.clone(),
                base_dn: config.search.base_dn.clone(),
                filter: config.search.filter.clone(),
                mail_attribute: config.search.mail_attribute.clone(),
                domain: config.remediation.domain.clone(),
                apply: config.remediation.apply,
                rewrite_mismatched: config.remediation.rewrite_mismatched,
                warnings,
            },
        };

        Self::render(cli, &config, &results)?;
        Ok(0)
    }

    /// Print the JSON schema and return true if that was requested.
    fn maybe_print_schema(cli: &Cli) -> Result<bool> {
        if !cli.generate_schema {
            return Ok(false);
        }
        match MailMenderOutput::generate_json_schema() {
            Ok(schema) => println!("{schema}"),
            Err(e) => eprintln!("Error generating JSON schema: {e}"),
        }
        Ok(true)
    }

    /// Render the finished results in the requested format.
    fn render(cli: &Cli, config: &Config, results: &RunResults) -> Result<()> {
        match cli.output_format() {
            OutputFormat::Json | OutputFormat::Yaml => {
                let structured = MailMenderOutput::from_results(results);
                let rendered = match cli.output_format() {
                    OutputFormat::Json => structured.to_json(),
                    OutputFormat::Yaml => structured.to_yaml(),
                    OutputFormat::Text => unreachable!(),
                };
                match rendered {
                    Ok(text) => println!("{text}"),
                    Err(e) => {
                        if cli.error_enabled() {
                            eprintln!("Error formatting structured output: {e}");
                        }
                    }
                }
                return Ok(());
            }
            OutputFormat::Text => {}
        }

        if cli.batch {
            let formatter = output::create_formatter(&ReportFormat::Batch, 0);
            print!("{}", formatter.format_results(results)?);
            return Ok(());
        }

        if cli.should_use_styling() {
            let formatter = if cli.no_color {
                StyledFormatter::without_colors()
            } else {
                StyledFormatter::new()
            };
            if let Err(e) = formatter.print_results(results) {
                if cli.warn_enabled() {
                    eprintln!("Styled output failed ({e}); falling back to plain text");
                }
                let formatter = output::create_formatter(
                    &ReportFormat::Text {
                        show_metadata: cli.show_internal(),
                    },
                    config.output.max_listed,
                );
                print!("{}", formatter.format_results(results)?);
            }
            return Ok(());
        }

        let formatter = output::create_formatter(
            &ReportFormat::Text {
                show_metadata: cli.show_internal(),
            },
            config.output.max_listed,
        );
        print!("{}", formatter.format_results(results)?);
        Ok(())
    }
}
