use std::str::FromStr;

use crate::error::TutorError;

pub const GRADES: [&str; 5] = [
    "3rd Grade",
    "4th Grade",
    "5th Grade",
    "6th Grade",
    "7th Grade",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SolverMode {
    Hint,
    Steps,
    Final,
}

impl SolverMode {
    pub const ALL: [SolverMode; 3] = [SolverMode::Hint, SolverMode::Steps, SolverMode::Final];

    pub fn label(&self) -> &'static str {
        match self {
            SolverMode::Hint => "💡 Hint",
            SolverMode::Steps => "🔄 Steps",
            SolverMode::Final => "✅ Final",
        }
    }

    /// Unknown labels are not an error here: the solver falls back to
    /// sending the bare question.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.label() == label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TutorMode {
    JustAHint,
    CheckMyWork,
    WalkMeThrough,
    SimilarProblem,
    ExplainConcept,
}

impl TutorMode {
    pub const ALL: [TutorMode; 5] = [
        TutorMode::JustAHint,
        TutorMode::CheckMyWork,
        TutorMode::WalkMeThrough,
        TutorMode::SimilarProblem,
        TutorMode::ExplainConcept,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TutorMode::JustAHint => "💡 Just a Hint",
            TutorMode::CheckMyWork => "✅ Check My Work",
            TutorMode::WalkMeThrough => "🧭 Walk Me Through It",
            TutorMode::SimilarProblem => "🔁 Try a Similar Problem",
            TutorMode::ExplainConcept => "📘 Explain the Concept",
        }
    }
}

impl FromStr for TutorMode {
    type Err = TutorError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.label() == label)
            .ok_or_else(|| TutorError::UnknownMode(label.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum LabTool {
    PredictDifficulty,
    ClassifyTopic,
    PracticeSet,
    ConfusionPoint,
    SimilarQuestions,
    GradeLevel,
    StepCount,
    Keywords,
    CommonMistakes,
}

impl LabTool {
    pub const ALL: [LabTool; 9] = [
        LabTool::PredictDifficulty,
        LabTool::ClassifyTopic,
        LabTool::PracticeSet,
        LabTool::ConfusionPoint,
        LabTool::SimilarQuestions,
        LabTool::GradeLevel,
        LabTool::StepCount,
        LabTool::Keywords,
        LabTool::CommonMistakes,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            LabTool::PredictDifficulty => "🔍 Predict Difficulty",
            LabTool::ClassifyTopic => "🧠 Classify Topic",
            LabTool::PracticeSet => "🧪 Create Practice Set",
            LabTool::ConfusionPoint => "🧠 Explain Confusion Point",
            LabTool::SimilarQuestions => "🎯 Make Similar Questions",
            LabTool::GradeLevel => "🎓 Estimate Grade Level",
            LabTool::StepCount => "🔢 Predict Step Count",
            LabTool::Keywords => "🧩 Extract Keywords",
            LabTool::CommonMistakes => "🚫 Common Mistakes",
        }
    }
}

impl FromStr for LabTool {
    type Err = TutorError;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.label() == label)
            .ok_or_else(|| TutorError::UnknownMode(label.to_string()))
    }
}

/// Free-text fields of the smart tutor panel. Not every mode reads every
/// field.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TutorRequest {
    pub question: String,
    pub attempt: String,
    pub concept: String,
    pub grade: String,
}

/// One prompt to be sent to the completion service.
#[derive(Debug, Clone, Copy)]
pub enum Prompt<'a> {
    Solver {
        mode: Option<SolverMode>,
        question: &'a str,
    },
    GameQuestion {
        grade: &'a str,
    },
    Tutor {
        mode: TutorMode,
        request: &'a TutorRequest,
    },
    Lab {
        tool: LabTool,
        text: &'a str,
    },
}

impl Prompt<'_> {
    pub fn render(&self) -> String {
        match *self {
            Prompt::Solver { mode, question } => match mode {
                Some(SolverMode::Hint) => format!("Give a helpful hint. Question: {question}"),
                Some(SolverMode::Steps) => format!("Explain step-by-step. Question: {question}"),
                Some(SolverMode::Final) => {
                    format!("Explain and give the final answer. Question: {question}")
                }
                None => question.to_string(),
            },
            Prompt::GameQuestion { grade } => format!(
                "Create a {grade} math question with 1 correct and 3 incorrect answers. \
                 Format: Question: ... A: ... B: ... C: ... D: ... Correct: ..."
            ),
            Prompt::Tutor { mode, request } => {
                let TutorRequest {
                    question,
                    attempt,
                    concept,
                    grade,
                } = request;
                match mode {
                    TutorMode::JustAHint => {
                        format!("Give a hint for this {grade} level question: {question}")
                    }
                    TutorMode::CheckMyWork => {
                        format!("My attempt: {attempt}. Question: {question}. Feedback?")
                    }
                    TutorMode::WalkMeThrough => {
                        format!("Guide me through this {grade} level question: {question}")
                    }
                    TutorMode::SimilarProblem => format!("Create a similar problem to: {question}"),
                    TutorMode::ExplainConcept => {
                        format!("Explain the concept of '{concept}' for {grade} level.")
                    }
                }
            }
            Prompt::Lab { tool, text } => match tool {
                LabTool::PredictDifficulty => format!("How hard is this? {text}"),
                LabTool::ClassifyTopic => format!("What topic is this? {text}"),
                LabTool::PracticeSet => format!("Make 3 problems for: {text}"),
                LabTool::ConfusionPoint => format!("Why is this confusing: {text}"),
                LabTool::SimilarQuestions => format!("Make 2 similar questions: {text}"),
                LabTool::GradeLevel => format!("What grade is this? {text}"),
                LabTool::StepCount => format!("How many steps to solve this? {text}"),
                LabTool::Keywords => format!("List math keywords in: {text}"),
                LabTool::CommonMistakes => format!("What mistakes are made with: {text}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solver_falls_back_to_raw_question() {
        let prompt = Prompt::Solver {
            mode: SolverMode::from_label("🤷 Whatever"),
            question: "2 + 2?",
        };
        assert_eq!(prompt.render(), "2 + 2?");
    }

    #[test]
    fn solver_hint_template() {
        let prompt = Prompt::Solver {
            mode: SolverMode::from_label("💡 Hint"),
            question: "What is 3 * 4?",
        };
        assert_eq!(
            prompt.render(),
            "Give a helpful hint. Question: What is 3 * 4?"
        );
    }

    #[test]
    fn game_prompt_mentions_grade_and_format() {
        let prompt = Prompt::GameQuestion { grade: "5th Grade" }.render();
        assert!(prompt.starts_with("Create a 5th Grade math question"));
        assert!(prompt.ends_with("Correct: ..."));
    }

    #[test]
    fn tutor_templates_pick_their_fields() {
        let request = TutorRequest {
            question: "x + 1 = 3".into(),
            attempt: "x = 4".into(),
            concept: "equations".into(),
            grade: "6th Grade".into(),
        };
        let check = Prompt::Tutor {
            mode: TutorMode::CheckMyWork,
            request: &request,
        };
        assert_eq!(
            check.render(),
            "My attempt: x = 4. Question: x + 1 = 3. Feedback?"
        );
        let concept = Prompt::Tutor {
            mode: TutorMode::ExplainConcept,
            request: &request,
        };
        assert_eq!(
            concept.render(),
            "Explain the concept of 'equations' for 6th Grade level."
        );
    }

    #[test]
    fn unknown_tutor_mode_is_a_lookup_failure() {
        let err = "🎻 Play Me a Song".parse::<TutorMode>().unwrap_err();
        assert!(matches!(err, TutorError::UnknownMode(ref m) if m == "🎻 Play Me a Song"));
    }

    #[test]
    fn unknown_lab_tool_is_a_lookup_failure() {
        assert!(matches!(
            "".parse::<LabTool>(),
            Err(TutorError::UnknownMode(_))
        ));
    }

    #[test]
    fn labels_round_trip() {
        for mode in TutorMode::ALL {
            assert_eq!(mode.label().parse::<TutorMode>().unwrap(), mode);
        }
        for tool in LabTool::ALL {
            assert_eq!(tool.label().parse::<LabTool>().unwrap(), tool);
        }
    }

    #[test]
    fn every_tutor_template_renders_exactly() {
        let request = TutorRequest {
            question: "Q".into(),
            attempt: "T".into(),
            concept: "K".into(),
            grade: "G".into(),
        };
        let expected = [
            (TutorMode::JustAHint, "Give a hint for this G level question: Q"),
            (TutorMode::CheckMyWork, "My attempt: T. Question: Q. Feedback?"),
            (TutorMode::WalkMeThrough, "Guide me through this G level question: Q"),
            (TutorMode::SimilarProblem, "Create a similar problem to: Q"),
            (TutorMode::ExplainConcept, "Explain the concept of 'K' for G level."),
        ];
        assert_eq!(expected.len(), TutorMode::ALL.len());
        for (mode, text) in expected {
            let prompt = Prompt::Tutor {
                mode,
                request: &request,
            };
            assert_eq!(prompt.render(), text, "{mode:?}");
        }
    }

    #[test]
    fn every_lab_template_renders_exactly() {
        let expected = [
            (LabTool::PredictDifficulty, "How hard is this? X"),
            (LabTool::ClassifyTopic, "What topic is this? X"),
            (LabTool::PracticeSet, "Make 3 problems for: X"),
            (LabTool::ConfusionPoint, "Why is this confusing: X"),
            (LabTool::SimilarQuestions, "Make 2 similar questions: X"),
            (LabTool::GradeLevel, "What grade is this? X"),
            (LabTool::StepCount, "How many steps to solve this? X"),
            (LabTool::Keywords, "List math keywords in: X"),
            (LabTool::CommonMistakes, "What mistakes are made with: X"),
        ];
        assert_eq!(expected.len(), LabTool::ALL.len());
        for (tool, text) in expected {
            assert_eq!(Prompt::Lab { tool, text: "X" }.render(), text, "{tool:?}");
        }
    }

    #[test]
    fn every_solver_and_game_template_renders_exactly() {
        let expected = [
            (Some(SolverMode::Hint), "Give a helpful hint. Question: Q"),
            (Some(SolverMode::Steps), "Explain step-by-step. Question: Q"),
            (
                Some(SolverMode::Final),
                "Explain and give the final answer. Question: Q",
            ),
            (None, "Q"),
        ];
        for (mode, text) in expected {
            assert_eq!(Prompt::Solver { mode, question: "Q" }.render(), text);
        }
        assert_eq!(
            Prompt::GameQuestion { grade: "G" }.render(),
            "Create a G math question with 1 correct and 3 incorrect answers. \
             Format: Question: ... A: ... B: ... C: ... D: ... Correct: ..."
        );
    }

    #[test]
    fn lab_keywords_template() {
        let prompt = Prompt::Lab {
            tool: LabTool::Keywords,
            text: "area of a circle",
        };
        assert_eq!(prompt.render(), "List math keywords in: area of a circle");
    }
}
