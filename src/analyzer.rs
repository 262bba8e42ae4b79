//! The long-lived analysis service: owns every loaded model and exposes the
//! request-scoped operations.
//!
//! Skill extraction and similarity fail hard on backend errors. Generative
//! operations go through [`GenerationDispatcher`], which degrades to a
//! placeholder when no generation backend could be initialized.

use crate::config::{Config, GenerationConfig, RuntimeSettings};
use crate::device::device_with_override;
use crate::error::{Result, InsightError};
use crate::llm::backend::GenerationBackend;
use crate::llm::dispatcher::GenerationDispatcher;
use crate::llm::prompts::PromptTask;
use crate::llm::recommendations::RecommendationParser;
use crate::models::ModelFetcher;
use crate::ner::filter::SkillFilter;
use crate::ner::recognizer::BertTokenClassifier;
use crate::ner::sanitize::Entity;
use crate::ner::SkillExtractor;
use crate::output::report::AnalysisReport;
use crate::processing::embeddings::Model2VecEmbedder;
use crate::processing::similarity::SimilarityScorer;
use chrono::Utc;
use log::{debug, info};

/// Generative inputs shorter than this are rejected before reaching a backend
pub const MIN_GENERATIVE_INPUT_CHARS: usize = 50;

pub struct ResumeAnalyzer {
    skills: SkillExtractor,
    similarity: SimilarityScorer,
    generator: GenerationDispatcher,
    parser: RecommendationParser,
    generation: GenerationConfig,
}

impl ResumeAnalyzer {
    pub fn new(
        skills: SkillExtractor,
        similarity: SimilarityScorer,
        generator: GenerationDispatcher,
        config: &Config,
    ) -> Self {
        Self {
            skills,
            similarity,
            generator,
            parser: RecommendationParser::new(
                config.recommendations.max_items,
                config.recommendations.min_length,
            ),
            generation: config.generation.clone(),
        }
    }

    /// Download (if needed) and load every model. When `with_generation` is
    /// false no language model is loaded and generation reports as unavailable.
    pub async fn load(config: &Config, settings: &RuntimeSettings, with_generation: bool) -> Result<Self> {
        let fetcher = ModelFetcher::new(&config.models.models_dir)?;
        let device = device_with_override()?;

        let ner_model = config.ner_model(settings.use_lightweight_models);
        let ner_files = fetcher.fetch(ner_model).await?;
        let recognizer = BertTokenClassifier::load(&ner_files, &device)?;
        let skills = SkillExtractor::new(
            Box::new(recognizer),
            SkillFilter::new(config.skills.allowed_labels.iter().cloned()),
        );

        let embedding_files = fetcher.fetch(&config.models.embedding_model).await?;
        let embedder = Model2VecEmbedder::load(&embedding_files)?;
        let similarity = SimilarityScorer::new(Box::new(embedder));

        let backend = if with_generation {
            GenerationBackend::initialize(config, settings, &fetcher).await
        } else {
            GenerationBackend::Unavailable {
                reason: "generation was not requested".to_string(),
            }
        };

        info!("All models loaded (NER: {}, embeddings: {})", ner_model, config.models.embedding_model);
        Ok(Self::new(skills, similarity, GenerationDispatcher::new(backend), config))
    }

    pub fn backend(&self) -> &GenerationBackend {
        self.generator.backend()
    }

    pub fn extract_skills(&self, text: &str) -> Result<Vec<Entity>> {
        require_text("text", text)?;
        self.skills.extract(text)
    }

    pub fn similarity(&self, resume_text: &str, job_text: &str) -> Result<f64> {
        self.similarity.score(resume_text, job_text)
    }

    pub async fn summarize(&self, resume_text: &str) -> Result<String> {
        validate_generative_input("resume", resume_text)?;
        let prompt = PromptTask::Summarize { resume: resume_text }.render();
        self.generator
            .generate(&prompt, self.generation.summary_max_tokens)
            .await
    }

    pub async fn recommend(&self, resume_text: &str) -> Result<Vec<String>> {
        validate_generative_input("resume", resume_text)?;
        let prompt = PromptTask::Recommend { resume: resume_text }.render();
        let raw = self
            .generator
            .generate(&prompt, self.generation.recommendations_max_tokens)
            .await?;

        let items = self.parser.parse(&raw);
        debug!("Parsed {} recommendations from {} chars of output", items.len(), raw.len());
        Ok(items)
    }

    /// Gaps between the resume and the job description, as free text
    pub async fn discrepancies(&self, resume_text: &str, job_text: &str) -> Result<String> {
        validate_generative_input("resume", resume_text)?;
        validate_generative_input("job description", job_text)?;
        let prompt = PromptTask::Compare {
            resume: resume_text,
            job: job_text,
        }
        .render();
        self.generator
            .generate(&prompt, self.generation.discrepancies_max_tokens)
            .await
    }

    /// Full analysis: skills for both texts, similarity, and optionally the generative sections
    pub async fn analyze(&self, resume_text: &str, job_text: &str, with_generation: bool) -> Result<AnalysisReport> {
        info!(
            "Analyzing resume ({} chars) against job description ({} chars)",
            resume_text.len(),
            job_text.len()
        );
        require_text("resume", resume_text)?;
        require_text("job description", job_text)?;

        let skills = self.extract_skills(resume_text)?;
        let job_skills = self.extract_skills(job_text)?;
        let similarity = self.similarity(resume_text, job_text)?;

        let mut report = AnalysisReport {
            skills,
            job_skills,
            similarity,
            summary: None,
            recommendations: None,
            discrepancies: None,
            backend: None,
            generated_at: Utc::now(),
        };

        if with_generation {
            report.summary = Some(self.summarize(resume_text).await?);
            report.recommendations = Some(self.recommend(resume_text).await?);
            report.discrepancies = Some(self.discrepancies(resume_text, job_text).await?);
            report.backend = Some(self.backend().name().to_string());
        }

        Ok(report)
    }
}

fn require_text(what: &str, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(InsightError::InputValidation(format!("{} is empty", what)));
    }
    Ok(())
}

fn validate_generative_input(what: &str, text: &str) -> Result<()> {
    let len = text.trim().chars().count();
    if len < MIN_GENERATIVE_INPUT_CHARS {
        return Err(InsightError::InputValidation(format!(
            "{} must be at least {} characters for generation (got {})",
            what, MIN_GENERATIVE_INPUT_CHARS, len
        )));
    }
    Ok(())
}
