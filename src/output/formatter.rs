//! Console and JSON rendering of analysis results

use crate::error::Result;
use crate::ner::sanitize::Entity;
use crate::output::report::AnalysisReport;
use clap::ValueEnum;
use colored::{Color, Colorize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Console,
    Json,
}

/// Trait for formatting analysis reports
pub trait OutputFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String>;
}

pub struct ConsoleFormatter {
    use_colors: bool,
}

pub struct JsonFormatter {
    pretty: bool,
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let prefix = match level {
            1 => "█",
            2 => "▓",
            _ => "▒",
        };

        let color = match level {
            1 => Color::Blue,
            2 => Color::Green,
            _ => Color::Yellow,
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_similarity_badge(&self, similarity: f64) -> String {
        let (badge, color) = match similarity {
            s if s >= 0.8 => ("STRONG MATCH", Color::Green),
            s if s >= 0.6 => ("GOOD MATCH", Color::BrightGreen),
            s if s >= 0.4 => ("PARTIAL MATCH", Color::Yellow),
            _ => ("WEAK MATCH", Color::Red),
        };

        if self.use_colors {
            format!("[{}]", badge.color(color).bold())
        } else {
            format!("[{}]", badge)
        }
    }

    /// One line per skill: text, category and confidence
    pub fn format_skills(&self, skills: &[Entity]) -> String {
        if skills.is_empty() {
            return format!("  {}\n", self.colorize("(no skills found)", Color::BrightBlack));
        }

        skills
            .iter()
            .map(|skill| {
                format!(
                    "  • {} {} {:.2}\n",
                    self.colorize(&skill.text, Color::Cyan),
                    self.colorize(&format!("[{}]", skill.label), Color::BrightBlack),
                    skill.score
                )
            })
            .collect()
    }

    pub fn format_similarity(&self, similarity: f64) -> String {
        format!(
            "Similarity: {:.3} {}\n",
            similarity,
            self.format_similarity_badge(similarity)
        )
    }

    pub fn format_recommendations(&self, items: &[String]) -> String {
        if items.is_empty() {
            return format!("  {}\n", self.colorize("(no recommendations parsed)", Color::BrightBlack));
        }

        items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("  {}. {}\n", i + 1, item))
            .collect()
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("RESUME ANALYSIS", 1));
        output.push_str(&format!(
            "Generated: {}\n",
            report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));

        output.push_str(&self.format_header("Match", 2));
        output.push_str(&self.format_similarity(report.similarity));

        output.push_str(&self.format_header("Resume Skills", 2));
        output.push_str(&self.format_skills(&report.skills));

        output.push_str(&self.format_header("Job Skills", 2));
        output.push_str(&self.format_skills(&report.job_skills));

        let shared = report.shared_skills();
        if !shared.is_empty() {
            output.push_str(&format!(
                "\n{} {}\n",
                self.colorize("Shared:", Color::Green),
                shared.join(", ")
            ));
        }
        let missing = report.missing_skills();
        if !missing.is_empty() {
            output.push_str(&format!(
                "{} {}\n",
                self.colorize("Missing:", Color::Red),
                missing.join(", ")
            ));
        }

        if let Some(summary) = &report.summary {
            output.push_str(&self.format_header("Summary", 2));
            output.push_str(summary);
            output.push('\n');
        }

        if let Some(items) = &report.recommendations {
            output.push_str(&self.format_header("Recommendations", 2));
            output.push_str(&self.format_recommendations(items));
        }

        if let Some(gaps) = &report.discrepancies {
            output.push_str(&self.format_header("Gap Analysis", 2));
            output.push_str(gaps);
            output.push('\n');
        }

        if let Some(backend) = &report.backend {
            output.push_str(&format!(
                "\n{}\n",
                self.colorize(&format!("Generated by the {} backend", backend), Color::BrightBlack)
            ));
        }

        Ok(output)
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, report: &AnalysisReport) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(report)?)
        } else {
            Ok(serde_json::to_string(report)?)
        }
    }
}

pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
}

impl ReportGenerator {
    pub fn new(use_colors: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors),
            json_formatter: JsonFormatter::new(true),
        }
    }

    pub fn generate_report(&self, report: &AnalysisReport, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Console => self.console_formatter.format_report(report),
            OutputFormat::Json => self.json_formatter.format_report(report),
        }
    }

    pub fn console(&self) -> &ConsoleFormatter {
        &self.console_formatter
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new(true)
    }
}

pub fn save_report_to_file(content: &str, file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::Map;

    fn report() -> AnalysisReport {
        let skill = |text: &str| Entity {
            label: "MISC".to_string(),
            text: text.to_string(),
            score: 0.91,
            start: 0,
            end: 0,
            extra: Map::new(),
        };

        AnalysisReport {
            skills: vec![skill("Rust"), skill("gRPC")],
            job_skills: vec![skill("Rust"), skill("Terraform")],
            similarity: 0.83,
            summary: Some("Systems engineer with networking depth.".to_string()),
            recommendations: Some(vec!["Quantify latency improvements".to_string()]),
            discrepancies: None,
            backend: Some("local".to_string()),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_console_report_sections() {
        let out = ConsoleFormatter::new(false).format_report(&report()).unwrap();

        assert!(out.contains("Similarity: 0.830 [STRONG MATCH]"));
        assert!(out.contains("  • Rust [MISC] 0.91"));
        assert!(out.contains("Shared: Rust"));
        assert!(out.contains("Missing: Terraform"));
        assert!(out.contains("  1. Quantify latency improvements"));
        assert!(out.contains("Generated by the local backend"));
        assert!(!out.contains("Gap Analysis"));
    }

    #[test]
    fn test_json_report_is_parseable() {
        let out = JsonFormatter::new(false).format_report(&report()).unwrap();
        let parsed: AnalysisReport = serde_json::from_str(&out).unwrap();

        assert_eq!(parsed.skills.len(), 2);
        assert_eq!(parsed.backend.as_deref(), Some("local"));
        assert!(parsed.discrepancies.is_none());
    }

    #[test]
    fn test_save_creates_parent_dirs() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("reports").join("out.json");

        save_report_to_file("{}", &path).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "{}");
    }
}
