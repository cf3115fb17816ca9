use super::prompts::CODE_PROMPT;
use super::streaming::{PromptPair, PromptPlan};

/// Self-contained Python snippets.
pub struct CodePlan;

impl PromptPlan for CodePlan {
    fn create(&self, title: &str) -> PromptPair {
        PromptPair {
            system: CODE_PROMPT.to_string(),
            task: title.to_string(),
            prediction: None,
        }
    }
}
