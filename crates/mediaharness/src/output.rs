use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use mediaharness_suite::{ImageSet, Outcome, Scenario, Step, SuiteReport};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn write_raw(data: &[u8]) -> std::io::Result<()> {
    let mut out = std::io::stdout().lock();
    out.write_all(data)?;
    out.flush()
}

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn outcome_text(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Passed => "PASS",
        Outcome::Failed => "FAIL",
        Outcome::Skipped => "SKIP",
    }
}

pub fn print_report(report: &SuiteReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(report),
        OutputFormat::Table => {
            let mut t = table(vec!["SCENARIO", "RESULT", "TIME", "DETAIL"]);
            for s in &report.scenarios {
                t.add_row(vec![
                    s.name.clone(),
                    outcome_text(s.outcome).to_string(),
                    format!("{:.1}s", s.duration_ms as f64 / 1000.0),
                    s.message.clone().unwrap_or_default(),
                ]);
            }
            println!("{t}");
            println!("{}", summary_line(report));
        }
        OutputFormat::Pretty => {
            for s in &report.scenarios {
                println!("  [{}] {}", outcome_text(s.outcome), s.name);
                if let Some(message) = &s.message {
                    for line in message.lines() {
                        println!("         {line}");
                    }
                }
                if let Some(dir) = &s.workspace {
                    println!("         kept: {}", dir.display());
                }
            }
            println!("\n  {}", summary_line(report));
        }
        OutputFormat::Raw => {
            for s in &report.scenarios {
                println!("{} {}", outcome_text(s.outcome), s.name);
            }
        }
    }
}

fn summary_line(report: &SuiteReport) -> String {
    format!(
        "{} passed, {} failed, {} skipped",
        report.passed, report.failed, report.skipped
    )
}

#[derive(Serialize)]
struct CatalogEntry<'a> {
    name: &'a str,
    tool: String,
    image: &'a str,
    description: &'a str,
    runs: usize,
    checks: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    skip: Option<&'a str>,
}

fn catalog_entries<'a>(scenarios: &'a [Scenario], images: &'a ImageSet) -> Vec<CatalogEntry<'a>> {
    scenarios
        .iter()
        .map(|s| CatalogEntry {
            name: &s.name,
            tool: s.tool.to_string(),
            image: images.image(s.tool),
            description: &s.description,
            runs: s.runs().count(),
            checks: s
                .steps
                .iter()
                .filter(|step| matches!(step, Step::Check(_)))
                .count(),
            skip: s.skip.as_deref(),
        })
        .collect()
}

pub fn print_catalog(scenarios: &[Scenario], images: &ImageSet, format: OutputFormat) {
    let entries = catalog_entries(scenarios, images);
    match format {
        OutputFormat::Json => print_json(&entries),
        OutputFormat::Table => {
            let mut t = table(vec!["SCENARIO", "IMAGE", "RUNS", "CHECKS", "DESCRIPTION"]);
            for e in &entries {
                let description = match e.skip {
                    Some(reason) => format!("{} (skipped: {reason})", e.description),
                    None => e.description.to_string(),
                };
                t.add_row(vec![
                    e.name.to_string(),
                    e.image.to_string(),
                    e.runs.to_string(),
                    e.checks.to_string(),
                    description,
                ]);
            }
            println!("{t}");
        }
        OutputFormat::Pretty => {
            for e in &entries {
                println!("{:<48} {}", e.name, e.description);
            }
        }
        OutputFormat::Raw => {
            for e in &entries {
                println!("{}", e.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use mediaharness_suite::catalog;

    use super::*;

    #[test]
    fn catalog_entries_count_steps() {
        let scenarios = catalog::select("ffmpeg-concat/mp4-files").unwrap();
        let images = ImageSet::default();
        let entries = catalog_entries(&scenarios, &images);

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].runs, 2);
        assert_eq!(entries[0].checks, 3);
        assert_eq!(entries[0].image, "ghcr.io/veloxpack/ffmpeg:8.0-concat");
        assert!(entries[0].skip.is_none());
    }

    #[test]
    fn skipped_entries_serialize_reason() {
        let scenarios = catalog::select("ffmpeg-concat/webm-files").unwrap();
        let images = ImageSet::default();
        let json = serde_json::to_value(catalog_entries(&scenarios, &images)).unwrap();
        assert_eq!(json[0]["skip"], "requires pre-existing WebM inputs");
        assert_eq!(json[0]["tool"], "ffmpeg-concat");
    }

    #[test]
    fn summary_counts() {
        let report = SuiteReport {
            scenarios: Vec::new(),
            passed: 3,
            failed: 1,
            skipped: 2,
        };
        assert_eq!(summary_line(&report), "3 passed, 1 failed, 2 skipped");
    }
}
