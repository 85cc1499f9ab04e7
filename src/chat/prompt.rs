//! Prompt templates for grounded and general answers.

use serde::{Deserialize, Serialize};

/// One prior exchange supplied by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    fn speaker(&self) -> &'static str {
        match self.role.to_ascii_lowercase().as_str() {
            "assistant" | "model" | "bot" => "Assistant",
            _ => "User",
        }
    }
}

pub struct PromptBuilder<'a> {
    assistant_name: &'a str,
    history: &'a [ChatTurn],
}

impl<'a> PromptBuilder<'a> {
    pub fn new(assistant_name: &'a str, history: &'a [ChatTurn]) -> Self {
        Self {
            assistant_name,
            history,
        }
    }

    /// Answer restricted to the rendered evidence.
    pub fn grounded(&self, context: &str, question: &str) -> String {
        let mut prompt = format!(
            "You are the {}.\nAnswer the user's question using ONLY the Source Data provided below.\n\nSOURCE DATA:\n{}\n",
            self.assistant_name, context
        );
        self.push_history(&mut prompt);
        prompt.push_str(&format!("USER QUESTION: {}\n", question));
        prompt
    }

    /// Answer from general instructions, with file guidance when an
    /// attachment accompanies the question.
    pub fn general(&self, question: &str, has_attachment: bool) -> String {
        let mut prompt = format!("You are the {}.\n\n", self.assistant_name);
        if has_attachment {
            prompt.push_str(
                "A file is attached; analyze it carefully.\n\
                 If it's an image of a document, transcribe key details.\n\
                 If it's a campus photo, describe it.\n\n",
            );
        }
        self.push_history(&mut prompt);
        prompt.push_str(&format!("USER QUESTION: {}\n", question));
        prompt
    }

    fn push_history(&self, prompt: &mut String) {
        if self.history.is_empty() {
            return;
        }
        prompt.push_str("CONVERSATION SO FAR:\n");
        for turn in self.history {
            prompt.push_str(&format!("{}: {}\n", turn.speaker(), turn.content.trim()));
        }
        prompt.push('\n');
    }
}
