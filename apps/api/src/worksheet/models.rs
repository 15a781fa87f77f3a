use serde::{Deserialize, Deserializer, Serialize};

use crate::worksheet::questions::QuestionSelector;

pub const DEFAULT_TITLE: &str = "Worksheet";
pub const DEFAULT_NUM_QUESTIONS: usize = 10;

/// `includeAnswerKey` arrives either as a boolean or as a form value such as `"yes"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerKeyFlag {
    Bool(bool),
    Text(String),
}

impl Default for AnswerKeyFlag {
    fn default() -> Self {
        AnswerKeyFlag::Text("yes".to_string())
    }
}

impl AnswerKeyFlag {
    pub fn is_enabled(&self) -> bool {
        match self {
            AnswerKeyFlag::Bool(b) => *b,
            AnswerKeyFlag::Text(s) => s.trim().eq_ignore_ascii_case("yes"),
        }
    }
}

/// Payload of a PDF generation request. Every field is optional on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorksheetRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub directions: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub question_type: QuestionSelector,
    #[serde(default)]
    pub num_questions: Option<usize>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub include_answer_key: AnswerKeyFlag,
    #[serde(default, deserialize_with = "null_as_default")]
    pub standards: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub topic: String,
}

/// An explicit `null` reads the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Default for WorksheetRequest {
    fn default() -> Self {
        Self {
            title: None,
            directions: String::new(),
            question_type: QuestionSelector::default(),
            num_questions: None,
            include_answer_key: AnswerKeyFlag::default(),
            standards: Vec::new(),
            topic: String::new(),
        }
    }
}

impl WorksheetRequest {
    /// Title with the default applied for a missing or blank value.
    pub fn title(&self) -> &str {
        match self.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => DEFAULT_TITLE,
        }
    }

    pub fn num_questions(&self) -> usize {
        self.num_questions.unwrap_or(DEFAULT_NUM_QUESTIONS)
    }

    pub fn directions(&self) -> Option<&str> {
        Some(self.directions.trim()).filter(|d| !d.is_empty())
    }

    /// Suggested download name for the rendered PDF. Blankness is judged on the
    /// trimmed title, but the untrimmed title is what gets sanitized.
    pub fn file_name(&self) -> String {
        match self.title.as_deref() {
            Some(raw) if !raw.trim().is_empty() => safe_file_name(raw),
            _ => safe_file_name(DEFAULT_TITLE),
        }
    }
}

/// Replaces every character outside `[A-Za-z0-9-_]` with `_` and appends `.pdf`.
pub fn safe_file_name(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}.pdf")
}
