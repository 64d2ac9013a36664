pub mod completion;
pub mod ocr;
pub mod prompts;
pub mod quiz;

use std::sync::Arc;

use crate::error::{self, Field, TutorError};
use completion::CompletionService;
use ocr::OcrEngine;
use prompts::{LabTool, Prompt, SolverMode, TutorMode, TutorRequest};
use quiz::{GameRound, QuizItem};

const FINAL_ANSWER_MARKER: &str = "Final Answer:";

/// What the solver panel shows: the whole reply plus the final answer, if
/// the model marked one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolverReply {
    pub full: String,
    pub final_answer: String,
}

impl SolverReply {
    fn from_completion(full: String) -> Self {
        let final_answer = full
            .rsplit(FINAL_ANSWER_MARKER)
            .next()
            .filter(|_| full.contains(FINAL_ANSWER_MARKER))
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        Self { full, final_answer }
    }
}

/// The panel actions, each one prompt and one completion call.
pub struct Tutor {
    completion: Arc<dyn CompletionService>,
    ocr: Arc<dyn OcrEngine>,
}

impl Tutor {
    pub fn new(completion: Arc<dyn CompletionService>, ocr: Arc<dyn OcrEngine>) -> Self {
        Self { completion, ocr }
    }

    pub async fn read_image(&self, image: &[u8]) -> error::Result<String> {
        let text = self.ocr.extract_text(image).await?;
        log::debug!("OCR extracted {} chars", text.len());
        Ok(text)
    }

    pub async fn solve(
        &self,
        question: &str,
        mode: Option<SolverMode>,
    ) -> error::Result<SolverReply> {
        if question.is_empty() {
            return Err(TutorError::EmptyInput(Field::Question));
        }
        let prompt = Prompt::Solver { mode, question }.render();
        let full = self.completion.complete(&prompt).await?;
        Ok(SolverReply::from_completion(full))
    }

    /// Asks for a fresh quiz question. Every failure, including a failed
    /// completion call, is reported as a malformed question.
    pub async fn new_round(&self, grade: &str) -> error::Result<GameRound> {
        let prompt = Prompt::GameQuestion { grade }.render();
        let raw = self.completion.complete(&prompt).await.map_err(|e| {
            log::warn!("Quiz generation failed: {}", e);
            TutorError::MalformedResponse(e.to_string())
        })?;
        let item = QuizItem::parse(&raw).map_err(|e| {
            log::warn!("Could not parse quiz reply {:?}: {:?}", raw, e);
            e
        })?;
        let round = item.into_round(&mut rand::thread_rng());
        Ok(round)
    }

    /// Mode and tool labels are parsed at the chat boundary, so these only
    /// see the closed enums.
    pub async fn smart_tutor(
        &self,
        mode: TutorMode,
        request: &TutorRequest,
    ) -> error::Result<String> {
        if request.question.is_empty() {
            return Err(TutorError::EmptyInput(Field::Question));
        }
        let prompt = Prompt::Tutor { mode, request }.render();
        self.completion.complete(&prompt).await
    }

    pub async fn ai_lab(&self, tool: LabTool, text: &str) -> error::Result<String> {
        if text.is_empty() {
            return Err(TutorError::EmptyInput(Field::Content));
        }
        let prompt = Prompt::Lab { tool, text }.render();
        self.completion.complete(&prompt).await
    }
}
