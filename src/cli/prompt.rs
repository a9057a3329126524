//! Line editor prompt.

use reedline::{Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus};
use std::borrow::Cow;

/// Scout prompt showing the active model.
pub struct ScoutPrompt {
    pub model_name: String,
    /// Whether an agent is built. Pending settings show in yellow otherwise.
    pub configured: bool,
}

impl ScoutPrompt {
    pub fn new(model: &str, configured: bool) -> Self {
        Self {
            model_name: model.to_string(),
            configured,
        }
    }
}

impl Prompt for ScoutPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        if self.configured {
            Cow::Owned(format!(
                "\x1b[1;35mscout\x1b[0m \x1b[2m[{}]\x1b[0m",
                self.model_name
            ))
        } else {
            Cow::Owned(format!(
                "\x1b[1;35mscout\x1b[0m \x1b[33m[{} · not applied]\x1b[0m",
                self.model_name
            ))
        }
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Borrowed(" › ")
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed("... ")
    }

    fn render_prompt_history_search_indicator(&self, hs: PromptHistorySearch) -> Cow<'_, str> {
        let prefix = match hs.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!("({}search: {}) ", prefix, hs.term))
    }
}
