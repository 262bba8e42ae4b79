use resume_insight::analyzer::ResumeAnalyzer;
use resume_insight::config::Config;
use resume_insight::error::{InsightError, Result};
use resume_insight::llm::local::LocalGenerator;
use resume_insight::llm::{
    select_backend, BackendKind, GenerationBackend, GenerationDispatcher,
    GENERATION_UNAVAILABLE_PLACEHOLDER, NO_USABLE_RESPONSE,
};
use resume_insight::ner::filter::SkillFilter;
use resume_insight::ner::recognizer::EntityRecognizer;
use resume_insight::ner::sanitize::{RawEntity, RawValue};
use resume_insight::ner::SkillExtractor;
use resume_insight::processing::embeddings::Embedder;
use resume_insight::processing::similarity::SimilarityScorer;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const RESUME: &str = "Senior engineer building distributed systems in Python and Kubernetes. \
Worked with Grace Hopper on the platform team.";
const JOB: &str = "We need an engineer for distributed systems work in Python, \
reporting to Alan Turing.";
const WEATHER: &str = "Sunny weather forecast with light rain later in the afternoon.";

/// Tags known technology words as MISC and capitalized name pairs as PER
struct KeywordRecognizer;

const TECH_WORDS: &[&str] = &["Python", "Kubernetes", "Terraform"];
const PEOPLE: &[&str] = &["Grace Hopper", "Alan Turing"];

impl EntityRecognizer for KeywordRecognizer {
    fn recognize(&self, text: &str) -> Result<Vec<RawEntity>> {
        let mut found: Vec<(usize, RawEntity)> = Vec::new();

        for (label, words) in [("MISC", TECH_WORDS), ("PER", PEOPLE)] {
            for word in words {
                if let Some(start) = text.find(word) {
                    let entity = RawEntity::new()
                        .with("entity_group", RawValue::Str(label.to_string()))
                        .with("score", RawValue::F32(0.75))
                        .with("word", RawValue::Str(word.to_string()))
                        .with("start", RawValue::U32(start as u32))
                        .with("end", RawValue::U32((start + word.len()) as u32));
                    found.push((start, entity));
                }
            }
        }

        found.sort_by_key(|(start, _)| *start);
        Ok(found.into_iter().map(|(_, e)| e).collect())
    }
}

/// Keyword recognizer that counts how often it is invoked
struct CountingRecognizer {
    calls: Arc<AtomicUsize>,
}

impl EntityRecognizer for CountingRecognizer {
    fn recognize(&self, text: &str) -> Result<Vec<RawEntity>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        KeywordRecognizer.recognize(text)
    }
}

struct FailingRecognizer;

impl EntityRecognizer for FailingRecognizer {
    fn recognize(&self, _text: &str) -> Result<Vec<RawEntity>> {
        Err(InsightError::ModelLoading("tensor shape mismatch".into()))
    }
}

/// Word counts over a small fixed vocabulary
struct BagOfWords;

const VOCABULARY: &[&str] = &[
    "python", "distributed", "systems", "kubernetes", "engineer", "weather", "forecast", "rain",
    "sunny",
];

impl Embedder for BagOfWords {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0; VOCABULARY.len()];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .map(str::to_lowercase)
        {
            if let Some(i) = VOCABULARY.iter().position(|w| *w == token) {
                vector[i] += 1.0;
            }
        }
        Ok(vector)
    }
}

/// Answers by the primer the prompt ends with, counting calls
struct PrimedGenerator {
    calls: Arc<AtomicUsize>,
}

impl LocalGenerator for PrimedGenerator {
    fn generate(&mut self, prompt: &str, _max_new_tokens: usize) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let reply = if prompt.ends_with("Summary:") {
            " Backend engineer focused on distributed Python services. "
        } else if prompt.ends_with("1.") {
            " Lead with measurable outcomes\n\
             2. Add a dedicated skills section\n\
             Here are a few more ideas\n\
             - Trim older roles\n\
             - Mention on-call experience with Kubernetes"
        } else if prompt.ends_with("Gap analysis:") {
            "No Terraform experience is shown."
        } else {
            ""
        };
        Ok(reply.to_string())
    }
}

fn analyzer_with(recognizer: Box<dyn EntityRecognizer>, backend: GenerationBackend) -> ResumeAnalyzer {
    ResumeAnalyzer::new(
        SkillExtractor::new(recognizer, SkillFilter::default()),
        SimilarityScorer::new(Box::new(BagOfWords)),
        GenerationDispatcher::new(backend),
        &Config::default(),
    )
}

fn local_analyzer() -> (ResumeAnalyzer, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let generator = PrimedGenerator {
        calls: Arc::clone(&calls),
    };
    let analyzer = analyzer_with(
        Box::new(KeywordRecognizer),
        GenerationBackend::local(Box::new(generator)),
    );
    (analyzer, calls)
}

#[test]
fn test_skills_exclude_people() {
    let (analyzer, _) = local_analyzer();
    let skills = analyzer.extract_skills(RESUME).unwrap();

    let texts: Vec<&str> = skills.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["Python", "Kubernetes"]);
    assert!(skills.iter().all(|s| s.label == "MISC"));
    assert_eq!(skills[0].score, 0.75);
    assert_eq!(skills[0].start as usize, RESUME.find("Python").unwrap());
}

#[test]
fn test_related_job_scores_higher_than_unrelated_text() {
    let (analyzer, _) = local_analyzer();

    let related = analyzer.similarity(RESUME, JOB).unwrap();
    let unrelated = analyzer.similarity(RESUME, WEATHER).unwrap();

    assert!(related > unrelated, "{} <= {}", related, unrelated);
    assert!((analyzer.similarity(JOB, JOB).unwrap() - 1.0).abs() < 1e-9);
}

#[test]
fn test_text_without_known_words_is_degenerate() {
    let (analyzer, _) = local_analyzer();

    let err = analyzer.similarity(RESUME, "Lorem ipsum dolor sit amet").unwrap_err();
    assert!(matches!(err, InsightError::DegenerateVector(_)));
    assert_eq!(err.kind(), "degenerate_vector_failure");
}

#[test]
fn test_recognizer_failure_is_entity_inference_failure() {
    let analyzer = analyzer_with(
        Box::new(FailingRecognizer),
        GenerationBackend::Unavailable {
            reason: "not needed".into(),
        },
    );

    match analyzer.extract_skills(RESUME) {
        Err(InsightError::EntityInference(msg)) => assert!(msg.contains("tensor shape mismatch")),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_blank_input_is_rejected_before_recognition() {
    let recognized = Arc::new(AtomicUsize::new(0));
    let analyzer = analyzer_with(
        Box::new(CountingRecognizer {
            calls: Arc::clone(&recognized),
        }),
        GenerationBackend::Unavailable {
            reason: "not needed".into(),
        },
    );

    let err = analyzer.extract_skills("").unwrap_err();
    assert!(matches!(err, InsightError::InputValidation(_)));
    assert_eq!(err.kind(), "input_validation_failure");

    assert!(matches!(
        analyzer.analyze("", JOB, false).await,
        Err(InsightError::InputValidation(_))
    ));
    assert!(matches!(
        analyzer.analyze(RESUME, "   \n", true).await,
        Err(InsightError::InputValidation(_))
    ));
    assert_eq!(recognized.load(Ordering::SeqCst), 0);

    analyzer.extract_skills(RESUME).unwrap();
    assert_eq!(recognized.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_analyze_without_generation() {
    let (analyzer, calls) = local_analyzer();
    let report = analyzer.analyze(RESUME, JOB, false).await.unwrap();

    assert_eq!(report.skills.len(), 2);
    assert_eq!(report.job_skills.len(), 1);
    assert_eq!(report.shared_skills(), vec!["Python"]);
    assert!(report.similarity > 0.5);
    assert!(report.summary.is_none());
    assert!(report.recommendations.is_none());
    assert!(report.backend.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_analyze_with_local_generation() {
    let (analyzer, calls) = local_analyzer();
    let report = analyzer.analyze(RESUME, JOB, true).await.unwrap();

    assert_eq!(
        report.summary.as_deref(),
        Some("Backend engineer focused on distributed Python services.")
    );
    assert_eq!(
        report.recommendations.unwrap(),
        vec![
            "Lead with measurable outcomes",
            "Add a dedicated skills section",
            "Trim older roles",
            "Mention on-call experience with Kubernetes",
        ]
    );
    assert_eq!(report.discrepancies.as_deref(), Some("No Terraform experience is shown."));
    assert_eq!(report.backend.as_deref(), Some("local"));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_short_generative_input_never_reaches_backend() {
    let (analyzer, calls) = local_analyzer();

    let err = analyzer.summarize("Python developer").await.unwrap_err();
    assert!(matches!(err, InsightError::InputValidation(_)));

    let err = analyzer.discrepancies(RESUME, "Rust role").await.unwrap_err();
    assert!(matches!(err, InsightError::InputValidation(_)));

    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_unavailable_backend_degrades_to_placeholder() {
    let analyzer = analyzer_with(
        Box::new(KeywordRecognizer),
        GenerationBackend::from_local_result(Err(InsightError::ModelLoading(
            "config.json not found".into(),
        ))),
    );

    assert!(!analyzer.backend().is_available());
    assert_eq!(analyzer.summarize(RESUME).await.unwrap(), GENERATION_UNAVAILABLE_PLACEHOLDER);

    let report = analyzer.analyze(RESUME, JOB, true).await.unwrap();
    assert_eq!(report.skills.len(), 2);
    assert_eq!(report.discrepancies.as_deref(), Some(GENERATION_UNAVAILABLE_PLACEHOLDER));
    assert_eq!(report.backend.as_deref(), Some("unavailable"));
}

#[tokio::test]
async fn test_unrecognized_prompt_gets_sentinel() {
    let calls = Arc::new(AtomicUsize::new(0));
    let dispatcher = GenerationDispatcher::new(GenerationBackend::local(Box::new(PrimedGenerator {
        calls: Arc::clone(&calls),
    })));

    assert_eq!(dispatcher.generate("no primer here", 16).await.unwrap(), NO_USABLE_RESPONSE);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_analyzer_is_shared_across_tasks() {
    let (analyzer, calls) = local_analyzer();
    let analyzer = Arc::new(analyzer);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let analyzer = Arc::clone(&analyzer);
            tokio::spawn(async move { analyzer.summarize(RESUME).await })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().unwrap().starts_with("Backend engineer"));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[test]
fn test_backend_selection_table() {
    assert_eq!(select_backend(true, true), BackendKind::Local);
    assert_eq!(select_backend(false, false), BackendKind::Local);
    assert_eq!(select_backend(false, true), BackendKind::Cloud);
}
