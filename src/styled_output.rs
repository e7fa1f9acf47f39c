//! Styled output formatting for mailmender using anstyle.
//!
//! Colored terminal rendering of the run report. Uses the anstyle crate
//! for cross-platform color support; color use is gated on stdout being
//! a terminal and on the NO_COLOR convention.

#![allow(dead_code)]

use anstyle::{AnsiColor, Color, Style};
use std::collections::BTreeMap;
use std::io;

use crate::output::RunResults;

/// Style definitions for the different report elements
pub struct Styles {
    pub header: Style,
    pub subheader: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,
    pub muted: Style,
    pub bold: Style,
    pub dn: Style,
    pub mail: Style,
}

impl Default for Styles {
    fn default() -> Self {
        Self {
            header: Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Blue))),
            subheader: Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Cyan))),
            success: Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
            warning: Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
            error: Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
            muted: Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))),
            bold: Style::new().bold(),
            dn: Style::new().fg_color(Some(Color::Ansi(AnsiColor::Magenta))),
            mail: Style::new()
                .fg_color(Some(Color::Ansi(AnsiColor::Green)))
                .underline(),
        }
    }
}

/// Styled formatter for run reports
pub struct StyledFormatter {
    styles: Styles,
    use_colors: bool,
}

impl StyledFormatter {
    /// Create a new styled formatter
    pub fn new() -> Self {
        Self {
            styles: Styles::default(),
            use_colors: Self::should_use_colors(),
        }
    }

    /// Create a formatter without colors (for non-interactive use)
    pub fn without_colors() -> Self {
        Self {
            styles: Styles::default(),
            use_colors: false,
        }
    }

    /// Determine if colors should be used based on environment
    fn should_use_colors() -> bool {
        atty::is(atty::Stream::Stdout) && std::env::var("NO_COLOR").is_err()
    }

    fn paint(&self, style: &Style, text: &str) -> String {
        if self.use_colors {
            format!("{}{}{}", style.render(), text, style.render_reset())
        } else {
            text.to_string()
        }
    }

    fn section(&self, out: &mut String, title: &str) {
        out.push('\n');
        out.push_str(&self.paint(&self.styles.subheader, title));
        out.push('\n');
    }

    fn count_line(&self, out: &mut String, count: usize, label: &str, style: &Style) {
        out.push_str(&format!(
            "  {} {}\n",
            self.paint(style, &count.to_string()),
            label
        ));
    }

    fn dn_list(&self, out: &mut String, dns: &[String]) {
        for dn in dns {
            out.push_str(&format!("    {}\n", self.paint(&self.styles.dn, dn)));
        }
    }

    fn finding_list(&self, out: &mut String, items: &BTreeMap<String, String>) {
        for (dn, detail) in items {
            out.push_str(&format!(
                "    {} {}\n",
                self.paint(&self.styles.dn, dn),
                self.paint(&self.styles.muted, &format!("({detail})"))
            ));
        }
    }

    fn change_list(&self, out: &mut String, items: &BTreeMap<String, (String, String)>) {
        for (dn, (old, new)) in items {
            out.push_str(&format!(
                "    {}  {} -> {}\n",
                self.paint(&self.styles.dn, dn),
                self.paint(&self.styles.muted, old),
                self.paint(&self.styles.mail, new)
            ));
        }
    }

    /// Render the full report to stdout.
    pub fn print_results(&self, results: &RunResults) -> io::Result<()> {
        let mut out = String::new();
        let scan = &results.scan;
        let meta = &results.metadata;

        out.push_str(&self.paint(&self.styles.header, "Directory mail remediation report"));
        out.push('\n');
        out.push_str(&self.paint(
            &self.styles.muted,
            &format!("{} | base {} | enforcing {}", meta.url, meta.base_dn, meta.domain),
        ));
        out.push('\n');

        self.section(&mut out, "Scan");
        self.count_line(
            &mut out,
            scan.total_entries as usize,
            "directory entries",
            &self.styles.bold,
        );
        self.count_line(
            &mut out,
            scan.canonical as usize,
            "already canonical",
            &self.styles.success,
        );
        if scan.skipped_non_user > 0 {
            self.count_line(
                &mut out,
                scan.skipped_non_user as usize,
                "non-user entries skipped",
                &self.styles.muted,
            );
        }
        if !scan.without_attributes.is_empty() {
            self.count_line(
                &mut out,
                scan.without_attributes.len(),
                "entries without attributes",
                &self.styles.warning,
            );
            self.dn_list(&mut out, &scan.without_attributes);
        }
        if !scan.without_mail.is_empty() {
            self.count_line(
                &mut out,
                scan.without_mail.len(),
                "entries without a mail attribute",
                &self.styles.warning,
            );
            self.dn_list(&mut out, &scan.without_mail);
        }
        if !scan.errors.is_empty() {
            self.count_line(
                &mut out,
                scan.errors.len(),
                "entries processed with error",
                &self.styles.error,
            );
            self.finding_list(&mut out, &scan.errors);
        }
        if !scan.foreign.is_empty() {
            self.count_line(
                &mut out,
                scan.foreign.len(),
                &format!("entries with a domain other than {}", meta.domain),
                &self.styles.warning,
            );
            self.finding_list(&mut out, &scan.foreign);
        }
        if !scan.bare.is_empty() {
            self.count_line(
                &mut out,
                scan.bare.len(),
                "entries without any mail domain",
                &self.styles.warning,
            );
            self.finding_list(&mut out, &scan.bare);
        }

        match &results.remediation {
            Some(remediation) => {
                self.section(&mut out, "Modifications");
                self.count_line(
                    &mut out,
                    remediation.attempted as usize,
                    "attempted",
                    &self.styles.bold,
                );
                if !remediation.added.is_empty() {
                    self.count_line(
                        &mut out,
                        remediation.added.len(),
                        "missing domains appended",
                        &self.styles.success,
                    );
                    self.change_list(&mut out, &remediation.added);
                }
                if !remediation.rewritten.is_empty() {
                    self.count_line(
                        &mut out,
                        remediation.rewritten.len(),
                        "mismatched domains rewritten",
                        &self.styles.success,
                    );
                    self.change_list(&mut out, &remediation.rewritten);
                }
                if !remediation.failed.is_empty() {
                    self.count_line(
                        &mut out,
                        remediation.failed.len(),
                        "modifications failed",
                        &self.styles.error,
                    );
                    self.finding_list(&mut out, &remediation.failed);
                }
            }
            None => {
                self.section(&mut out, "Dry run");
                self.count_line(
                    &mut out,
                    results.planned.len(),
                    "entries would be modified (re-run with --apply to write)",
                    &self.styles.warning,
                );
                for change in &results.planned {
                    out.push_str(&format!(
                        "    {}  {} -> {}\n",
                        self.paint(&self.styles.dn, &change.dn),
                        self.paint(&self.styles.muted, &change.old),
                        self.paint(&self.styles.mail, &change.new)
                    ));
                }
            }
        }

        if !meta.warnings.is_empty() {
            self.section(&mut out, "Warnings");
            for warning in &meta.warnings {
                out.push_str(&format!(
                    "    {}\n",
                    self.paint(&self.styles.warning, warning)
                ));
            }
        }

        print!("{out}");
        Ok(())
    }
}

impl Default for StyledFormatter {
    fn default() -> Self {
        Self::new()
    }
}
