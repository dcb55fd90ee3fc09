//! Terminal rendering of summaries and alerts

use clap::ValueEnum;
use colored::Colorize;
use monitor_lib::{Alert, NotificationSink, Summary};
use tabled::{settings::Style, Table, Tabled};

/// Output format for notifications
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Renders notifications to stdout.
pub struct ConsoleSink {
    format: OutputFormat,
}

impl ConsoleSink {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Hits")]
    hits: usize,
    #[tabled(rename = "Bytes")]
    bytes: u64,
    #[tabled(rename = "Start")]
    start: String,
    #[tabled(rename = "End")]
    end: String,
    #[tabled(rename = "Errors")]
    errors: usize,
    #[tabled(rename = "Error %")]
    error_percentage: String,
}

#[derive(Tabled)]
struct SectionRow {
    #[tabled(rename = "Section")]
    name: String,
    #[tabled(rename = "Hits")]
    hits: usize,
}

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl NotificationSink for ConsoleSink {
    fn render_summary(&mut self, summary: &Summary) {
        match self.format {
            OutputFormat::Json => {
                if let Ok(json) = serde_json::to_string(summary) {
                    println!("{json}");
                }
            }
            OutputFormat::Table => {
                println!("{}", "Traffic summary".bold());
                let row = SummaryRow {
                    hits: summary.hits,
                    bytes: summary.total_bytes,
                    start: summary.start_time.format(TIME_FORMAT).to_string(),
                    end: summary.end_time.format(TIME_FORMAT).to_string(),
                    errors: summary.errors,
                    error_percentage: format!("{:.2}", summary.error_percentage),
                };
                println!("{}", Table::new([row]).with(Style::rounded()));

                if !summary.top_sections.is_empty() {
                    println!("{}", "Top sections by hits".bold());
                    let sections: Vec<SectionRow> = summary
                        .top_sections
                        .iter()
                        .map(|stat| SectionRow {
                            name: stat.name.clone(),
                            hits: stat.hits,
                        })
                        .collect();
                    println!("{}", Table::new(sections).with(Style::rounded()));
                }
            }
        }
    }

    fn render_alert(&mut self, alert: &Alert) {
        // Recovery always renders; creation renders once; anything else is
        // an already-announced alert still waiting to recover.
        if let Some(duration) = alert.recovery_duration() {
            match self.format {
                OutputFormat::Json => {
                    if let Ok(json) = serde_json::to_string(alert) {
                        println!("{json}");
                    }
                }
                OutputFormat::Table => println!(
                    "{} traffic recovered after {}s",
                    "✓".green().bold(),
                    duration.num_seconds()
                ),
            }
        } else if !alert.shown() {
            match self.format {
                OutputFormat::Json => {
                    if let Ok(json) = serde_json::to_string(alert) {
                        println!("{json}");
                    }
                }
                OutputFormat::Table => println!(
                    "{} high traffic generated an alert - rate = {:.2} req/s, triggered at {}",
                    "⚠".red().bold(),
                    alert.rate(),
                    alert.created_at().format(TIME_FORMAT)
                ),
            }
        }
    }
}
