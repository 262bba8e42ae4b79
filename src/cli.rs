//! CLI interface for resume insight

use crate::output::OutputFormat;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Input files the CLI accepts; text is read as UTF-8
pub const TEXT_EXTENSIONS: &[&str] = &["txt", "md"];

#[derive(Parser)]
#[command(name = "resume-insight")]
#[command(about = "Resume skill extraction, similarity scoring and LLM feedback")]
#[command(long_about = "Extract skills from a resume with a NER model, score its semantic similarity to a job description, and optionally generate a summary, recommendations and a gap analysis with a local or hosted language model")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Full analysis of a resume against a job description
    Analyze {
        /// Path to resume file (TXT, MD)
        #[arg(short, long)]
        resume: PathBuf,

        /// Path to job description file (TXT, MD)
        #[arg(short, long)]
        job: PathBuf,

        /// Also generate summary, recommendations and gap analysis
        #[arg(short, long)]
        generate: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Console)]
        output: OutputFormat,

        /// Save output to file
        #[arg(short, long)]
        save: Option<PathBuf>,
    },

    /// List the skill entities found in a file
    Skills {
        /// Path to a resume or job description
        file: PathBuf,
    },

    /// Semantic similarity between a resume and a job description
    Similarity {
        #[arg(short, long)]
        resume: PathBuf,

        #[arg(short, long)]
        job: PathBuf,
    },

    /// Generate a short summary of a resume
    Summarize {
        file: PathBuf,
    },

    /// Generate improvement recommendations for a resume
    Recommend {
        file: PathBuf,
    },

    /// Generate a gap analysis of a resume against a job description
    Compare {
        #[arg(short, long)]
        resume: PathBuf,

        #[arg(short, long)]
        job: PathBuf,
    },

    /// Show configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Reset configuration to defaults
    Reset,

    /// Print the configuration file location
    Path,
}

impl Commands {
    /// Whether this command needs a language model loaded
    pub fn needs_generation(&self) -> bool {
        match self {
            Commands::Analyze { generate, .. } => *generate,
            Commands::Summarize { .. } | Commands::Recommend { .. } | Commands::Compare { .. } => true,
            _ => false,
        }
    }
}

/// Validate file extension
pub fn validate_file_extension(path: &Path, allowed_extensions: &[&str]) -> Result<(), String> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) => {
            if allowed_extensions.contains(&ext.to_lowercase().as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "Unsupported file extension: .{}. Allowed: {}",
                    ext,
                    allowed_extensions.join(", ")
                ))
            }
        }
        None => Err("File has no extension".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_file_extension() {
        assert!(validate_file_extension(Path::new("resume.TXT"), TEXT_EXTENSIONS).is_ok());
        assert!(validate_file_extension(Path::new("job.md"), TEXT_EXTENSIONS).is_ok());

        let err = validate_file_extension(Path::new("resume.pdf"), TEXT_EXTENSIONS).unwrap_err();
        assert!(err.contains(".pdf"));
        assert!(validate_file_extension(Path::new("README"), TEXT_EXTENSIONS).is_err());
    }

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from([
            "resume-insight", "analyze", "-r", "cv.txt", "-j", "job.md", "--generate", "-o", "json",
        ])
        .unwrap();

        match &cli.command {
            Commands::Analyze { generate, output, save, .. } => {
                assert!(*generate);
                assert_eq!(*output, OutputFormat::Json);
                assert!(save.is_none());
            }
            _ => panic!("expected analyze"),
        }
        assert!(cli.command.needs_generation());
    }

    #[test]
    fn test_skills_does_not_need_generation() {
        let cli = Cli::try_parse_from(["resume-insight", "-v", "skills", "cv.txt"]).unwrap();
        assert!(cli.verbose);
        assert!(!cli.command.needs_generation());
    }
}
