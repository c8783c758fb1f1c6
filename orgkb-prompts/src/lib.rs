// Copyright 2025 OrgKB Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Prompt templates for the generation service.
//!
//! Pure string formatting, no I/O. Templates are fixed at compile time so
//! every answer request hits the generation model with the same shape.

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PromptError {
    #[error("question must not be empty")]
    EmptyQuestion,
}

/// Builds the answer prompt from retrieved context and the user question.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptAssembler;

impl PromptAssembler {
    pub fn new() -> Self {
        Self
    }

    /// Merge context and question into the answer prompt.
    ///
    /// The context may be empty (degraded retrieval); the template is kept
    /// as-is so the model still sees the question in its expected position.
    pub fn assemble(&self, context: &str, question: &str) -> Result<String, PromptError> {
        if question.trim().is_empty() {
            return Err(PromptError::EmptyQuestion);
        }
        Ok(format!(
            "Refer to this knowledge: {}\n\nUser Question: {}\nAnswer:",
            context, question
        ))
    }
}

/// Prompt asking the model to pull an organization name out of a question,
/// answering the literal string "None" when there is none.
pub fn name_extraction_prompt(question: &str) -> String {
    format!(
        "Trích xuất tên công ty (nếu có) từ câu hỏi sau: '{}'. \
         Nếu không có thì trả về 'None'.",
        question
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_fixed_template() {
        let prompt = PromptAssembler::new()
            .assemble("Warranty is 12 months.", "Bảo hành bao lâu?")
            .unwrap();
        assert_eq!(
            prompt,
            "Refer to this knowledge: Warranty is 12 months.\n\n\
             User Question: Bảo hành bao lâu?\nAnswer:"
        );
    }

    #[test]
    fn empty_context_still_yields_valid_prompt() {
        let prompt = PromptAssembler::new()
            .assemble("", "Bảo hành bao lâu?")
            .unwrap();
        assert!(prompt.starts_with("Refer to this knowledge: \n\n"));
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn empty_question_is_rejected() {
        let err = PromptAssembler::new().assemble("context", "  \t").unwrap_err();
        assert_eq!(err, PromptError::EmptyQuestion);
    }

    #[test]
    fn name_extraction_prompt_embeds_question() {
        let prompt = name_extraction_prompt("FPT ở đâu?");
        assert!(prompt.contains("'FPT ở đâu?'"));
        assert!(prompt.contains("'None'"));
    }
}
