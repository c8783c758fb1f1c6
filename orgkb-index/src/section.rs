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

//! Document sectioning for chunk extraction.
//!
//! Splits raw document text on heading-like lines: Vietnamese structural
//! markers (Mục, Điều, Chương, Phần), the English "Section", numbered
//! headings, or runs of uppercase letters. Content before the first heading
//! lands in an "Untitled" section.

use orgkb_core::ChunkMetadata;
use regex::Regex;
use std::sync::OnceLock;

const PREVIEW_CHARS: usize = 200;

fn title_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(Mục|Điều|Chương|Phần|Section|\d+[\.\)]|[A-Z\s]{4,})")
            .expect("section title pattern is valid")
    })
}

/// One titled unit of a source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub content: String,
}

impl Section {
    /// Text submitted to the embedding model: title and body together.
    pub fn combined_text(&self) -> String {
        format!("{}\n{}", self.title, self.content)
    }

    /// Chunk metadata for this section within `source`.
    pub fn metadata(&self, source: &str, section_id: usize) -> ChunkMetadata {
        ChunkMetadata {
            source: source.to_string(),
            section_id,
            section_title: self.title.clone(),
            preview: self.content.chars().take(PREVIEW_CHARS).collect(),
        }
    }
}

/// Split document text into sections at heading-like lines.
///
/// Blank lines are skipped; body lines are joined with single spaces.
/// Returns an empty list for text with no non-blank lines.
pub fn split_into_sections(text: &str) -> Vec<Section> {
    let pattern = title_pattern();
    let mut sections = Vec::new();
    let mut current_title = "Untitled".to_string();
    let mut current_content = String::new();

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() {
            continue;
        }

        if pattern.is_match(stripped) {
            if !current_content.is_empty() {
                sections.push(Section {
                    title: std::mem::replace(&mut current_title, stripped.to_string()),
                    content: std::mem::take(&mut current_content).trim_end().to_string(),
                });
            } else {
                current_title = stripped.to_string();
            }
        } else {
            current_content.push_str(stripped);
            current_content.push(' ');
        }
    }

    if !current_content.is_empty() {
        sections.push(Section {
            title: current_title,
            content: current_content.trim_end().to_string(),
        });
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_vietnamese_headings() {
        let text = "Điều 1. Phạm vi\nNội dung điều một.\nĐiều 2. Đối tượng\nNội dung điều hai.";
        let sections = split_into_sections(text);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "Điều 1. Phạm vi");
        assert_eq!(sections[0].content, "Nội dung điều một.");
        assert_eq!(sections[1].title, "Điều 2. Đối tượng");
    }

    #[test]
    fn leading_body_text_gets_untitled_section() {
        let text = "dòng mở đầu không có tiêu đề\nĐiều 1\nnội dung";
        let sections = split_into_sections(text);

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].title, "Untitled");
        assert_eq!(sections[0].content, "dòng mở đầu không có tiêu đề");
    }

    #[test]
    fn numbered_and_uppercase_headings_split() {
        let text = "1. Giới thiệu\nphần thân\nWARRANTY POLICY\nphần thân hai";
        let sections = split_into_sections(text);
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].title, "WARRANTY POLICY");
    }

    #[test]
    fn blank_text_yields_no_sections() {
        assert!(split_into_sections("").is_empty());
        assert!(split_into_sections("\n  \n\t\n").is_empty());
    }

    #[test]
    fn preview_truncates_by_characters_not_bytes() {
        let body = "bảo hành ".repeat(60); // multi-byte characters past the cutoff
        let section = Section {
            title: "Điều 1".to_string(),
            content: body,
        };
        let meta = section.metadata("handbook.txt", 3);

        assert_eq!(meta.preview.chars().count(), 200);
        assert_eq!(meta.section_id, 3);
        assert_eq!(meta.source, "handbook.txt");
    }

    #[test]
    fn combined_text_joins_title_and_body() {
        let section = Section {
            title: "Điều 5".to_string(),
            content: "nội dung".to_string(),
        };
        assert_eq!(section.combined_text(), "Điều 5\nnội dung");
    }
}
