//! Question Generator — builds the ordered question set for one worksheet.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Answer key entry for open-ended questions.
pub const VARIES: &str = "(varies)";
pub const CHOICE_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];
const DEFAULT_STEM: &str = "Practice Item";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    ShortAnswer,
    FillBlank,
    GraphicOrganizer,
}

/// Cycle used for mixed worksheets: item `i` gets `MIXED_CYCLE[i % 4]`.
pub const MIXED_CYCLE: [QuestionKind; 4] = [
    QuestionKind::MultipleChoice,
    QuestionKind::ShortAnswer,
    QuestionKind::FillBlank,
    QuestionKind::GraphicOrganizer,
];

/// The `questionType` field of a worksheet request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionSelector {
    MultipleChoice,
    ShortAnswer,
    FillBlank,
    GraphicOrganizer,
    #[default]
    Mixed,
    /// Any value this service does not know; rendered as short answer.
    #[serde(other)]
    Unknown,
}

impl QuestionSelector {
    /// Kind of the `index`-th question, or `None` for an unknown selector.
    fn kind_at(&self, index: usize) -> Option<QuestionKind> {
        match self {
            QuestionSelector::MultipleChoice => Some(QuestionKind::MultipleChoice),
            QuestionSelector::ShortAnswer => Some(QuestionKind::ShortAnswer),
            QuestionSelector::FillBlank => Some(QuestionKind::FillBlank),
            QuestionSelector::GraphicOrganizer => Some(QuestionKind::GraphicOrganizer),
            QuestionSelector::Mixed => Some(MIXED_CYCLE[index % MIXED_CYCLE.len()]),
            QuestionSelector::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionBody {
    MultipleChoice { choices: Vec<String>, correct: char },
    ShortAnswer,
    FillBlank,
    GraphicOrganizer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Question {
    pub prompt: String,
    pub stem: Option<String>,
    #[serde(flatten)]
    pub body: QuestionBody,
}

impl Question {
    pub fn kind(&self) -> QuestionKind {
        match self.body {
            QuestionBody::MultipleChoice { .. } => QuestionKind::MultipleChoice,
            QuestionBody::ShortAnswer => QuestionKind::ShortAnswer,
            QuestionBody::FillBlank => QuestionKind::FillBlank,
            QuestionBody::GraphicOrganizer => QuestionKind::GraphicOrganizer,
        }
    }

    /// What the answer key shows for this question.
    pub fn answer(&self) -> String {
        match &self.body {
            QuestionBody::MultipleChoice { correct, .. } => correct.to_string(),
            _ => VARIES.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerRecord {
    pub number: usize,
    pub answer: String,
}

impl AnswerRecord {
    pub fn for_question(number: usize, question: &Question) -> Self {
        Self {
            number,
            answer: question.answer(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Correct-answer selection
// ────────────────────────────────────────────────────────────────────────────

/// Picks which of the four choices is correct.
pub trait ChoicePolicy {
    /// Returns an index into `CHOICE_LABELS`.
    fn pick(&mut self, question_number: usize) -> usize;
}

/// Uniformly random correct answer (production default).
#[derive(Debug, Default)]
pub struct RandomChoice;

impl ChoicePolicy for RandomChoice {
    fn pick(&mut self, _question_number: usize) -> usize {
        rand::thread_rng().gen_range(0..CHOICE_LABELS.len())
    }
}

/// Always the same choice index, wrapped into range.
#[derive(Debug, Clone, Copy)]
pub struct FixedChoice(pub usize);

impl ChoicePolicy for FixedChoice {
    fn pick(&mut self, _question_number: usize) -> usize {
        self.0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Generation
// ────────────────────────────────────────────────────────────────────────────

/// Generates exactly `count` questions. Never fails; `count == 0` yields nothing.
pub fn generate_questions(
    count: usize,
    selector: &QuestionSelector,
    topic: &str,
    policy: &mut dyn ChoicePolicy,
) -> Vec<Question> {
    let stem = match topic.trim() {
        "" => DEFAULT_STEM,
        t => t,
    };
    let mut questions = Vec::with_capacity(count);
    for i in 0..count {
        questions.push(make_question(selector.kind_at(i), stem, i + 1, &mut *policy));
    }
    questions
}

fn make_question(
    kind: Option<QuestionKind>,
    stem: &str,
    number: usize,
    policy: &mut dyn ChoicePolicy,
) -> Question {
    let (prompt, body) = match kind {
        Some(QuestionKind::MultipleChoice) => {
            let correct = CHOICE_LABELS[policy.pick(number) % CHOICE_LABELS.len()];
            let choices = CHOICE_LABELS
                .iter()
                .enumerate()
                .map(|(i, label)| format!("{label}. {stem} — option {}", i + 1))
                .collect();
            (
                format!("Q{number}. Choose the best answer:"),
                QuestionBody::MultipleChoice { choices, correct },
            )
        }
        Some(QuestionKind::ShortAnswer) => (
            format!("Q{number}. Respond briefly:"),
            QuestionBody::ShortAnswer,
        ),
        Some(QuestionKind::FillBlank) => (
            format!("Q{number}. Complete the sentence:"),
            QuestionBody::FillBlank,
        ),
        Some(QuestionKind::GraphicOrganizer) => (
            format!("Q{number}. Complete the organizer:"),
            QuestionBody::GraphicOrganizer,
        ),
        None => (format!("Q{number}. Respond:"), QuestionBody::ShortAnswer),
    };
    Question {
        prompt,
        stem: Some(stem.to_string()),
        body,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
