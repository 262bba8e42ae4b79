//! Resume insight: skill extraction, similarity and LLM feedback for resumes

use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info};
use resume_insight::analyzer::ResumeAnalyzer;
use resume_insight::cli::{self, Cli, Commands, ConfigAction, TEXT_EXTENSIONS};
use resume_insight::config::{Config, RuntimeSettings};
use resume_insight::error::{InsightError, Result};
use resume_insight::output::formatter::save_report_to_file;
use resume_insight::output::ReportGenerator;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

#[tokio::main]
async fn main() {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let config = match cli.config.as_deref() {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run_command(cli.command, config, cli.config).await {
        error!("Command failed ({}): {}", e.kind(), e);
        process::exit(1);
    }
}

async fn run_command(command: Commands, config: Config, config_path: Option<PathBuf>) -> Result<()> {
    if let Commands::Config { action } = &command {
        return run_config_command(action.as_ref(), &config, config_path.as_deref());
    }

    let settings = RuntimeSettings::from_env();
    let analyzer = load_analyzer(&config, &settings, command.needs_generation()).await?;
    let reports = ReportGenerator::default();

    match command {
        Commands::Analyze {
            resume,
            job,
            generate,
            output,
            save,
        } => {
            let resume_text = read_text(&resume).await?;
            let job_text = read_text(&job).await?;

            let report = analyzer.analyze(&resume_text, &job_text, generate).await?;
            let rendered = reports.generate_report(&report, output)?;

            match save {
                Some(path) => {
                    save_report_to_file(&rendered, &path)?;
                    info!("Report saved to {}", path.display());
                }
                None => println!("{}", rendered),
            }
        }

        Commands::Skills { file } => {
            let text = read_text(&file).await?;
            let skills = analyzer.extract_skills(&text)?;
            println!("{}", format!("Skills in {}", file.display()).bold());
            print!("{}", reports.console().format_skills(&skills));
        }

        Commands::Similarity { resume, job } => {
            let resume_text = read_text(&resume).await?;
            let job_text = read_text(&job).await?;
            let score = analyzer.similarity(&resume_text, &job_text)?;
            print!("{}", reports.console().format_similarity(score));
        }

        Commands::Summarize { file } => {
            let text = read_text(&file).await?;
            println!("{}", analyzer.summarize(&text).await?);
        }

        Commands::Recommend { file } => {
            let text = read_text(&file).await?;
            let items = analyzer.recommend(&text).await?;
            print!("{}", reports.console().format_recommendations(&items));
        }

        Commands::Compare { resume, job } => {
            let resume_text = read_text(&resume).await?;
            let job_text = read_text(&job).await?;
            println!("{}", analyzer.discrepancies(&resume_text, &job_text).await?);
        }

        Commands::Config { .. } => unreachable!("handled before models are loaded"),
    }

    Ok(())
}

async fn load_analyzer(config: &Config, settings: &RuntimeSettings, with_generation: bool) -> Result<ResumeAnalyzer> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("Loading models...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = ResumeAnalyzer::load(config, settings, with_generation).await;
    spinner.finish_and_clear();

    let analyzer = result?;
    if with_generation && !analyzer.backend().is_available() {
        eprintln!(
            "{}",
            "Generation is unavailable; generated sections will contain a placeholder.".yellow()
        );
    }
    Ok(analyzer)
}

async fn read_text(path: &Path) -> Result<String> {
    cli::validate_file_extension(path, TEXT_EXTENSIONS)
        .map_err(|e| InsightError::InputValidation(format!("{}: {}", path.display(), e)))?;

    let text = tokio::fs::read_to_string(path).await?;
    info!("Read {} ({} characters)", path.display(), text.chars().count());
    Ok(text)
}

fn run_config_command(action: Option<&ConfigAction>, config: &Config, config_path: Option<&Path>) -> Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::config_path);

    match action {
        Some(ConfigAction::Show) | None => {
            println!("{}\n", "Current Configuration".bold());
            println!("Models Directory: {}", config.models.models_dir.display());
            println!("NER Model (lightweight): {}", config.models.lightweight_ner_model);
            println!("NER Model (full): {}", config.models.full_ner_model);
            println!("Embedding Model: {}", config.models.embedding_model);
            println!("Local LLM: {}", config.models.local_llm_model);
            println!("Cloud Model: {} ({})", config.generation.cloud_model, config.generation.api_base_url);
            println!("Skill Categories: {}", config.skills.allowed_labels.join(", "));
            println!(
                "Recommendations: at most {}, longer than {} characters",
                config.recommendations.max_items, config.recommendations.min_length
            );

            let settings = RuntimeSettings::from_env();
            println!("\nLightweight models: {}", settings.use_lightweight_models);
            println!("API credential present: {}", settings.api_credential_present());
        }

        Some(ConfigAction::Reset) => {
            Config::default().save_to(&path)?;
            println!("Configuration reset: {}", path.display());
        }

        Some(ConfigAction::Path) => {
            println!("{}", path.display());
        }
    }

    Ok(())
}
