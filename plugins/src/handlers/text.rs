use super::prompts::{essay_structure_task, is_essay_title, ESSAY_WORKSPACE_PROMPT, TOPIC_PROMPT};
use super::streaming::{PromptPair, PromptPlan};

/// Markdown prose. Essay titles get an empty workspace skeleton instead of
/// generated prose.
pub struct TextPlan;

impl PromptPlan for TextPlan {
    fn create(&self, title: &str) -> PromptPair {
        if is_essay_title(title) {
            PromptPair {
                system: ESSAY_WORKSPACE_PROMPT.to_string(),
                task: essay_structure_task(title),
                prediction: None,
            }
        } else {
            PromptPair {
                system: TOPIC_PROMPT.to_string(),
                task: title.to_string(),
                prediction: None,
            }
        }
    }
}
