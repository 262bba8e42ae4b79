//! Task prompts for resume summaries, recommendations and gap analysis

/// Input budget per text, in characters
pub const SUMMARY_INPUT_CHARS: usize = 3000;
pub const RECOMMEND_INPUT_CHARS: usize = 3000;
pub const COMPARE_INPUT_CHARS: usize = 5000;

/// A generation task together with its input text(s)
#[derive(Debug, Clone, Copy)]
pub enum PromptTask<'a> {
    Summarize { resume: &'a str },
    Recommend { resume: &'a str },
    Compare { resume: &'a str, job: &'a str },
}

impl PromptTask<'_> {
    /// Render the prompt, cutting each input to its character budget
    pub fn render(&self) -> String {
        match self {
            PromptTask::Summarize { resume } => fill(
                SUMMARIZE_TEMPLATE,
                &[("{resume}", truncate_chars(resume, SUMMARY_INPUT_CHARS))],
            ),
            PromptTask::Recommend { resume } => fill(
                RECOMMEND_TEMPLATE,
                &[("{resume}", truncate_chars(resume, RECOMMEND_INPUT_CHARS))],
            ),
            PromptTask::Compare { resume, job } => fill(
                COMPARE_TEMPLATE,
                &[
                    ("{resume}", truncate_chars(resume, COMPARE_INPUT_CHARS)),
                    ("{job}", truncate_chars(job, COMPARE_INPUT_CHARS)),
                ],
            ),
        }
    }
}

/// Single left-to-right pass over the template; substituted values are never rescanned
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let extra: usize = values.iter().map(|(_, v)| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some((pos, key, value)) = values
        .iter()
        .filter_map(|(key, value)| rest.find(key).map(|pos| (pos, *key, *value)))
        .min_by_key(|(pos, _, _)| *pos)
    {
        out.push_str(&rest[..pos]);
        out.push_str(value);
        rest = &rest[pos + key.len()..];
    }

    out.push_str(rest);
    out
}

/// Hard prefix cut at `max_chars` characters, always on a char boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

const SUMMARIZE_TEMPLATE: &str = r#"You are an experienced technical recruiter.
Read the resume below and write a concise summary (3-4 sentences) of the
candidate's key qualifications, experience and skills.

<RESUME>
{resume}
</RESUME>

Summary:"#;

const RECOMMEND_TEMPLATE: &str = r#"You are an experienced career coach reviewing a resume.
Give specific, actionable improvements for the resume below. Write each
improvement as one numbered line, with no introduction and no closing remarks.

<RESUME>
{resume}
</RESUME>

Recommendations:
1."#;

const COMPARE_TEMPLATE: &str = r#"You are an experienced hiring manager.
Compare the resume against the job description. Identify the required
qualifications, skills and experience the candidate is missing or only
partially demonstrates, and note any mismatch in seniority or focus.

<RESUME>
{resume}
</RESUME>

<JOB DESCRIPTION>
{job}
</JOB DESCRIPTION>

Gap analysis:"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_end_with_response_primer() {
        let resume = "Software Engineer with Python experience at Tech Corp.";
        let job = "Senior Software Engineer role requiring React and Python.";

        assert!(PromptTask::Summarize { resume }.render().ends_with("Summary:"));
        assert!(PromptTask::Recommend { resume }.render().ends_with("Recommendations:\n1."));
        assert!(PromptTask::Compare { resume, job }.render().ends_with("Gap analysis:"));
    }

    #[test]
    fn test_inputs_are_embedded() {
        let prompt = PromptTask::Compare {
            resume: "Test Resume Content",
            job: "Test Job Content",
        }
        .render();

        assert!(prompt.contains("<RESUME>\nTest Resume Content\n</RESUME>"));
        assert!(prompt.contains("<JOB DESCRIPTION>\nTest Job Content\n</JOB DESCRIPTION>"));
    }

    #[test]
    fn test_summarize_input_is_cut_at_budget() {
        let resume = "a".repeat(SUMMARY_INPUT_CHARS + 500);
        let prompt = PromptTask::Summarize { resume: &resume }.render();

        assert!(prompt.contains(&"a".repeat(SUMMARY_INPUT_CHARS)));
        assert!(!prompt.contains(&"a".repeat(SUMMARY_INPUT_CHARS + 1)));
    }

    #[test]
    fn test_compare_cuts_each_input_separately() {
        let resume = "r".repeat(COMPARE_INPUT_CHARS * 2);
        let job = "j".repeat(COMPARE_INPUT_CHARS + 1);
        let prompt = PromptTask::Compare { resume: &resume, job: &job }.render();

        assert!(prompt.contains(&"r".repeat(COMPARE_INPUT_CHARS)));
        assert!(!prompt.contains(&"r".repeat(COMPARE_INPUT_CHARS + 1)));
        assert!(prompt.contains(&"j".repeat(COMPARE_INPUT_CHARS)));
        assert!(!prompt.contains(&"j".repeat(COMPARE_INPUT_CHARS + 1)));
    }

    #[test]
    fn test_placeholders_inside_inputs_are_left_alone() {
        let prompt = PromptTask::Compare {
            resume: "literal {job} marker",
            job: "QA lead role",
        }
        .render();

        assert!(prompt.contains("literal {job} marker"));
        assert_eq!(prompt.matches("QA lead role").count(), 1);
    }

    #[test]
    fn test_truncate_respects_multibyte_chars() {
        let text = "résumé";
        assert_eq!(truncate_chars(text, 2), "ré");
        assert_eq!(truncate_chars(text, 6), "résumé");
        assert_eq!(truncate_chars(text, 100), "résumé");
        assert_eq!(truncate_chars(text, 0), "");
    }
}
