use std::collections::BTreeMap;
use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{self, TutorError};

const QUESTION_MARKER: &str = "Question:";
const CORRECT_MARKER: &str = "Correct:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    A,
    B,
    C,
    D,
}

impl Label {
    pub const ALL: [Label; 4] = [Label::A, Label::B, Label::C, Label::D];

    fn parse(s: &str) -> Option<Self> {
        match s {
            "A" => Some(Label::A),
            "B" => Some(Label::B),
            "C" => Some(Label::C),
            "D" => Some(Label::D),
            _ => None,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Label::A => "A",
            Label::B => "B",
            Label::C => "C",
            Label::D => "D",
        };
        f.write_str(s)
    }
}

/// A generated multiple-choice question, as read from the model's reply.
///
/// All four labels are always present and `correct` is one of them;
/// [`QuizItem::parse`] refuses to build anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizItem {
    pub question: String,
    pub choices: BTreeMap<Label, String>,
    pub correct: Label,
}

impl QuizItem {
    /// Parses a reply shaped like
    ///
    /// ```text
    /// Question: What is 3 + 4?
    /// A: 5
    /// B: 7
    /// C: 8
    /// D: 6
    /// Correct: B
    /// ```
    ///
    /// Anything else in the reply is ignored. A choice label that shows up
    /// twice keeps its last text.
    pub fn parse(raw: &str) -> error::Result<Self> {
        let lines = raw.lines().map(str::trim_start);

        let mut question = None;
        let mut correct = None;
        let mut choices = BTreeMap::new();

        for line in lines {
            if let Some(rest) = line.strip_prefix(QUESTION_MARKER) {
                question.get_or_insert_with(|| rest.trim().to_string());
            } else if let Some(rest) = line.strip_prefix(CORRECT_MARKER) {
                if correct.is_none() {
                    // "Correct: B" and "Correct: B: 7" both name B.
                    let value = rest.split(':').next().unwrap_or_default().trim();
                    correct = Some(value.to_string());
                }
            } else if let Some((label, text)) = line.split_once(':') {
                if let Some(label) = Label::parse(label.trim_end()) {
                    choices.insert(label, text.trim().to_string());
                }
            }
        }

        let question = question
            .ok_or_else(|| TutorError::MalformedResponse("no question line".to_string()))?;

        if let Some(missing) = Label::ALL.iter().find(|l| !choices.contains_key(*l)) {
            return Err(TutorError::MalformedResponse(format!(
                "missing choice {missing}"
            )));
        }

        // An empty choice would show as "A: " and Telegram trims the tapped
        // button text, so it could never match.
        if let Some((label, _)) = choices.iter().find(|(_, text)| text.is_empty()) {
            return Err(TutorError::MalformedResponse(format!(
                "choice {label} has no text"
            )));
        }

        let correct = correct
            .ok_or_else(|| TutorError::MalformedResponse("no correct line".to_string()))?;
        let correct = Label::parse(&correct).ok_or_else(|| {
            TutorError::MalformedResponse(format!("correct label {correct:?} is not a choice"))
        })?;

        Ok(Self {
            question,
            choices,
            correct,
        })
    }

    /// The correct choice as the student sees it, e.g. `"B: 7"`.
    pub fn correct_answer(&self) -> String {
        format!("{}: {}", self.correct, self.choices[&self.correct])
    }

    /// All choices as `"label: text"` in a uniformly random order.
    pub fn shuffled_choices<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<String> {
        let mut shuffled = self
            .choices
            .iter()
            .map(|(label, text)| format!("{label}: {text}"))
            .collect::<Vec<_>>();
        shuffled.shuffle(rng);
        shuffled
    }

    pub fn into_round<R: Rng + ?Sized>(self, rng: &mut R) -> GameRound {
        GameRound {
            choices: self.shuffled_choices(rng),
            correct: self.correct_answer(),
            question: self.question,
        }
    }
}

/// One live quiz round in the game panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GameRound {
    pub question: String,
    pub choices: Vec<String>,
    pub correct: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    NoSelection,
    Correct,
    Incorrect,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::NoSelection => "❓ Choose an answer.",
            Verdict::Correct => "✅ Correct!",
            Verdict::Incorrect => "❌ Try again.",
        })
    }
}

pub fn check_answer(selected: &str, correct: &str) -> Verdict {
    if selected.is_empty() {
        return Verdict::NoSelection;
    }
    if selected == correct {
        Verdict::Correct
    } else {
        Verdict::Incorrect
    }
}
