//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use riskmine_coordinator::{CoordinatorReport, IngestReport};
use riskmine_domain::StatusSummary;
use riskmine_store::MigrationReport;
use riskmine_worker::{CycleReport, PoolMetrics};
use serde_json::json;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format the store status.
    pub fn status(&self, summary: &StatusSummary) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "documents": {
                    "total": summary.documents(),
                    "pending": summary.pending,
                    "done": summary.done,
                    "error": summary.error,
                    "ineligible": summary.ineligible,
                },
                "statements": {
                    "total": summary.statements,
                    "mitigated": summary.mitigated,
                    "unmitigated": summary.unmitigated(),
                },
            }))?),
            OutputFormat::Table => {
                let rows = [
                    ("Documents", summary.documents().to_string(), ""),
                    ("  pending", summary.pending.to_string(), "yellow"),
                    ("  done", summary.done.to_string(), "green"),
                    ("  error", summary.error.to_string(), "red"),
                    ("  ineligible", summary.ineligible.to_string(), ""),
                    ("Statements", summary.statements.to_string(), ""),
                    ("  mitigated", summary.mitigated.to_string(), "green"),
                    ("  unmitigated", summary.unmitigated().to_string(), "yellow"),
                ];
                Ok(self.table(["Collection", "Count"], rows.iter().map(|(label, count, color)| {
                    let count = if count != "0" {
                        self.colorize(count, color)
                    } else {
                        count.clone()
                    };
                    [label.to_string(), count]
                })))
            }
        }
    }

    /// Format one pool cycle.
    pub fn cycle(&self, pool: &str, report: &CycleReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "pool": pool,
                "leased": report.leased,
                "enriched": report.enriched,
                "fallbacks": report.fallbacks,
                "requeued": report.requeued,
                "failed": report.failed,
                "elapsed_ms": report.elapsed.as_millis() as u64,
            }))?),
            OutputFormat::Table => {
                if report.is_idle() {
                    return Ok(self.info(&format!("No {} waiting", pool)));
                }
                let table = self.table(
                    ["Leased", "Enriched", "Fallbacks", "Requeued", "Failed", "Elapsed"],
                    [[
                        report.leased.to_string(),
                        report.enriched.to_string(),
                        report.fallbacks.to_string(),
                        report.requeued.to_string(),
                        self.count(report.failed, "red"),
                        format!("{:.1}s", report.elapsed.as_secs_f64()),
                    ]],
                );
                Ok(table)
            }
        }
    }

    /// Format totals from a looping pool.
    pub fn pool_metrics(&self, pool: &str, metrics: &PoolMetrics) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&metrics_json(pool, metrics))?),
            OutputFormat::Table => Ok(format!("{}\n{}", self.colorize(pool, "cyan"), metrics.summary())),
        }
    }

    /// Format an ingestion report.
    pub fn ingest(&self, report: &IngestReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&ingest_json(report))?),
            OutputFormat::Table => Ok(self.table(
                ["Listed", "Selected", "Pending", "Ineligible", "Existing", "Unreadable"],
                [[
                    report.listed.to_string(),
                    report.selected.to_string(),
                    self.count(report.created, "green"),
                    report.ineligible.to_string(),
                    report.existing.to_string(),
                    self.count(report.unreadable, "yellow"),
                ]],
            )),
        }
    }

    /// Format the result of a full run.
    pub fn run(&self, report: &CoordinatorReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "shutdown": report.shutdown.to_string(),
                "elapsed_secs": report.elapsed.as_secs_f64(),
                "polls": report.polls,
                "ingest": ingest_json(&report.ingest),
                "remaining": {
                    "documents": report.remaining.documents,
                    "statements": report.remaining.statements,
                },
                "documents": metrics_json("documents", &report.documents),
                "mitigations": report.mitigations.as_ref().map(|m| metrics_json("mitigations", m)),
            }))?),
            OutputFormat::Table => {
                let headline = format!(
                    "Run {} after {:.1}s",
                    report.shutdown,
                    report.elapsed.as_secs_f64()
                );
                let headline = if report.remaining.is_converged() {
                    self.success(&headline)
                } else {
                    self.warning(&headline)
                };
                Ok(format!("{}\n{}", headline, report.summary()))
            }
        }
    }

    /// Format a migration report.
    pub fn migration(&self, report: &MigrationReport) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "added": report.added,
                "demoted": report.demoted,
            }))?),
            OutputFormat::Table => {
                if report.is_noop() {
                    return Ok(self.success("Schema is up to date"));
                }
                let mut lines = Vec::new();
                for column in &report.added {
                    lines.push(self.success(&format!("Added {}", column)));
                }
                if report.demoted > 0 {
                    lines.push(self.info(&format!(
                        "{} document(s) without a risk section marked ineligible",
                        report.demoted
                    )));
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format the result of name assignment.
    pub fn names(&self, updated: usize, unnamed: &[String]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
                "updated": updated,
                "unnamed": unnamed,
            }))?),
            OutputFormat::Table => {
                let mut lines = vec![self.success(&format!("Named {} document(s)", updated))];
                if !unnamed.is_empty() {
                    lines.push(self.warning(&format!(
                        "{} entit{} still unnamed: {}",
                        unnamed.len(),
                        if unnamed.len() == 1 { "y" } else { "ies" },
                        unnamed.join(", ")
                    )));
                }
                Ok(lines.join("\n"))
            }
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn table<const N: usize, I>(&self, header: [&str; N], rows: I) -> String
    where
        I: IntoIterator<Item = [String; N]>,
    {
        let mut builder = Builder::default();
        builder.push_record(header.map(String::from));
        for row in rows {
            builder.push_record(row);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Highlight a non-zero count.
    fn count(&self, value: usize, color: &str) -> String {
        if value == 0 {
            value.to_string()
        } else {
            self.colorize(&value.to_string(), color)
        }
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn ingest_json(report: &IngestReport) -> serde_json::Value {
    json!({
        "listed": report.listed,
        "selected": report.selected,
        "created": report.created,
        "ineligible": report.ineligible,
        "existing": report.existing,
        "unreadable": report.unreadable,
    })
}

fn metrics_json(pool: &str, metrics: &PoolMetrics) -> serde_json::Value {
    json!({
        "pool": pool,
        "cycles": metrics.cycles,
        "idle_cycles": metrics.idle_cycles,
        "leased": metrics.leased,
        "enriched": metrics.enriched,
        "fallbacks": metrics.fallbacks,
        "requeued": metrics.requeued,
        "failed": metrics.failed,
    })
}
