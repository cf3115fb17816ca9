use super::prompts::SHEET_PROMPT;
use super::streaming::{PromptPair, PromptPlan};

/// CSV spreadsheets.
pub struct SheetPlan;

impl PromptPlan for SheetPlan {
    fn create(&self, title: &str) -> PromptPair {
        PromptPair {
            system: SHEET_PROMPT.to_string(),
            task: title.to_string(),
            prediction: None,
        }
    }
}
