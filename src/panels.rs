//! Telegram side of the tutor: one dialogue branch per panel.

use std::fmt;
use std::sync::Arc;

use teloxide::{
    dispatching::dialogue::ErasedStorage,
    net::Download,
    prelude::*,
    types::{ChatAction, KeyboardButton, KeyboardMarkup, PhotoSize},
};

use crate::error::TutorError;
use crate::settings::{SettingsStore, THEMES};
use crate::tutor::{
    prompts::{LabTool, SolverMode, TutorMode, TutorRequest, GRADES},
    quiz::{check_answer, GameRound},
    Tutor,
};

pub type TutorDialogue = Dialogue<State, ErasedStorage<State>>;
pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(Clone, Default, serde::Serialize, serde::Deserialize)]
pub enum State {
    #[default]
    Start,
    ReceivePanelChoice,
    SolverReceiveMode,
    SolverReceiveQuestion {
        mode: Option<SolverMode>,
    },
    GameReceiveGrade,
    GamePlaying {
        grade: String,
        round: GameRound,
    },
    TutorReceiveMode,
    TutorReceiveGrade {
        mode: TutorMode,
    },
    TutorReceiveQuestion {
        mode: TutorMode,
        request: TutorRequest,
    },
    TutorReceiveAttempt {
        mode: TutorMode,
        request: TutorRequest,
    },
    TutorReceiveConcept {
        mode: TutorMode,
        request: TutorRequest,
    },
    LabReceiveTool,
    LabReceiveInput {
        tool: LabTool,
    },
    SettingsReceiveTheme,
    SettingsReceiveGrade {
        theme: String,
    },
    SettingsReceiveSkills {
        theme: String,
        grade: String,
    },
}

const SOLVER_PANEL: &str = "💭 Solver";
const GAME_PANEL: &str = "🎮 Game";
const TUTOR_PANEL: &str = "📘 Smart Tutor";
const LAB_PANEL: &str = "🧪 AI Lab";
const SETTINGS_PANEL: &str = "⚙️ Settings";
const PANELS: [&str; 5] = [SOLVER_PANEL, GAME_PANEL, TUTOR_PANEL, LAB_PANEL, SETTINGS_PANEL];

pub const CLEAR: &str = "🧹 Clear";
const NEW_QUESTION: &str = "🎲 New Question";

fn menu_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(
        PANELS
            .iter()
            .map(|panel| vec![KeyboardButton::new(*panel)])
            .collect::<Vec<_>>(),
    )
}

/// One button per row, with the clear button last.
fn panel_keyboard<'a>(labels: impl IntoIterator<Item = &'a str>) -> KeyboardMarkup {
    let mut rows = labels
        .into_iter()
        .map(|label| vec![KeyboardButton::new(label)])
        .collect::<Vec<_>>();
    rows.push(vec![KeyboardButton::new(CLEAR)]);
    KeyboardMarkup::new(rows)
}

fn clear_keyboard() -> KeyboardMarkup {
    let none: [&str; 0] = [];
    panel_keyboard(none)
}

async fn typing(bot: &Bot, msg: &Message) {
    // Only cosmetic, a failure here shouldn't stop the answer.
    let _ = bot.send_chat_action(msg.chat.id, ChatAction::Typing).await;
}

/// Telegram's limit on message length, counted in UTF-16 code units.
const MESSAGE_LIMIT: usize = 4096;

/// Cuts `text` into pieces Telegram accepts, only ever on char boundaries.
fn split_message(text: &str, limit: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut units = 0;
    for (i, c) in text.char_indices() {
        let width = c.len_utf16();
        if units + width > limit {
            chunks.push(&text[start..i]);
            start = i;
            units = 0;
        }
        units += width;
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }
    chunks
}

/// Telegram refuses empty and overlong messages, so model replies are
/// checked and split first.
async fn send_text(bot: &Bot, msg: &Message, text: &str) -> HandlerResult {
    if text.is_empty() {
        log::warn!("Not sending an empty reply to chat {}", msg.chat.id.0);
        return Ok(());
    }
    for chunk in split_message(text, MESSAGE_LIMIT) {
        bot.send_message(msg.chat.id, chunk).await?;
    }
    Ok(())
}

fn photo_error(e: impl fmt::Display) -> TutorError {
    TutorError::Ocr(format!("could not download the photo: {}", e))
}

async fn download_photo(bot: &Bot, photo: &PhotoSize) -> Result<Vec<u8>, TutorError> {
    let file = bot.get_file(photo.file.id.clone()).await.map_err(photo_error)?;
    let mut image: Vec<u8> = Vec::new();
    bot.download_file(&file.path, &mut image)
        .await
        .map_err(photo_error)?;
    Ok(image)
}

const GREETING_TEXT: &str = "Hi! I'm your math tutor. Pick a panel to get started.";
pub async fn start(bot: Bot, dialogue: TutorDialogue, msg: Message) -> HandlerResult {
    bot.send_message(msg.chat.id, GREETING_TEXT)
        .reply_markup(menu_keyboard())
        .await?;

    dialogue.update(State::ReceivePanelChoice).await?;
    Ok(())
}

/// Resets whatever panel the chat is in. Saved settings are left alone.
pub async fn clear(bot: Bot, dialogue: TutorDialogue, msg: Message) -> HandlerResult {
    log::debug!("Clearing panel for chat {}", msg.chat.id.0);
    bot.send_message(msg.chat.id, "🧹 Cleared. Pick a panel.")
        .reply_markup(menu_keyboard())
        .await?;

    dialogue.update(State::ReceivePanelChoice).await?;
    Ok(())
}

pub async fn receive_panel_choice(
    bot: Bot,
    dialogue: TutorDialogue,
    msg: Message,
    settings: Arc<SettingsStore>,
) -> HandlerResult {
    log::info!("Chat {} picked {:?}", msg.chat.id.0, msg.text());
    match msg.text() {
        Some(SOLVER_PANEL) => {
            bot.send_message(msg.chat.id, "Pick a mode")
                .reply_markup(panel_keyboard(SolverMode::ALL.iter().map(|m| m.label())))
                .await?;
            dialogue.update(State::SolverReceiveMode).await?;
        }
        Some(GAME_PANEL) => {
            bot.send_message(msg.chat.id, "Pick a grade")
                .reply_markup(panel_keyboard(GRADES))
                .await?;
            dialogue.update(State::GameReceiveGrade).await?;
        }
        Some(TUTOR_PANEL) => {
            bot.send_message(msg.chat.id, "How should I help?")
                .reply_markup(panel_keyboard(TutorMode::ALL.iter().map(|m| m.label())))
                .await?;
            dialogue.update(State::TutorReceiveMode).await?;
        }
        Some(LAB_PANEL) => {
            bot.send_message(msg.chat.id, "Pick a tool")
                .reply_markup(panel_keyboard(LabTool::ALL.iter().map(|t| t.label())))
                .await?;
            dialogue.update(State::LabReceiveTool).await?;
        }
        Some(SETTINGS_PANEL) => {
            let current = settings.read(msg.chat.id.0);
            bot.send_message(
                msg.chat.id,
                format!("Current settings: {}\n\nPick a theme", current),
            )
            .reply_markup(panel_keyboard(THEMES))
            .await?;
            dialogue.update(State::SettingsReceiveTheme).await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Please pick one of the panels")
                .reply_markup(menu_keyboard())
                .await?;
        }
    }
    Ok(())
}

pub async fn solver_receive_mode(bot: Bot, dialogue: TutorDialogue, msg: Message) -> HandlerResult {
    // Anything that isn't a known mode sends the question as is.
    let mode = msg.text().and_then(SolverMode::from_label);

    bot.send_message(
        msg.chat.id,
        "✍️ Type your question or send a photo of it 📸",
    )
    .reply_markup(clear_keyboard())
    .await?;
    dialogue
        .update(State::SolverReceiveQuestion { mode })
        .await?;
    Ok(())
}

pub async fn solver_receive_question(
    bot: Bot,
    mode: Option<SolverMode>,
    msg: Message,
    tutor: Arc<Tutor>,
) -> HandlerResult {
    let question = match msg.photo() {
        Some(photos) => {
            let Some(photo) = photos.last() else {
                return Ok(());
            };
            let image = match download_photo(&bot, photo).await {
                Ok(image) => image,
                Err(e) => {
                    log::warn!("Photo download failed for chat {}: {:?}", msg.chat.id.0, e);
                    bot.send_message(msg.chat.id, e.to_string()).await?;
                    return Ok(());
                }
            };

            match tutor.read_image(&image).await {
                Ok(text) => {
                    bot.send_message(msg.chat.id, format!("🔍 OCR Extracted:\n{}", text))
                        .await?;
                    text
                }
                Err(e) => {
                    log::warn!("OCR failed for chat {}: {:?}", msg.chat.id.0, e);
                    bot.send_message(msg.chat.id, e.to_string()).await?;
                    return Ok(());
                }
            }
        }
        None => msg.text().unwrap_or_default().to_string(),
    };

    typing(&bot, &msg).await;
    match tutor.solve(&question, mode).await {
        Ok(reply) => {
            send_text(&bot, &msg, &reply.full).await?;
            if !reply.final_answer.is_empty() {
                bot.send_message(
                    msg.chat.id,
                    format!("✅ Final Answer: {}", reply.final_answer),
                )
                .await?;
            }
        }
        Err(e) => {
            bot.send_message(msg.chat.id, e.to_string()).await?;
        }
    }
    Ok(())
}

async fn send_round(bot: &Bot, msg: &Message, round: &GameRound) -> HandlerResult {
    let buttons = round
        .choices
        .iter()
        .map(String::as_str)
        .chain([NEW_QUESTION]);
    bot.send_message(msg.chat.id, round.question.as_str())
        .reply_markup(panel_keyboard(buttons))
        .await?;
    Ok(())
}

async fn start_round(
    bot: &Bot,
    dialogue: &TutorDialogue,
    msg: &Message,
    tutor: &Tutor,
    grade: String,
) -> HandlerResult {
    typing(bot, msg).await;
    match tutor.new_round(&grade).await {
        Ok(round) => {
            send_round(bot, msg, &round).await?;
            dialogue.update(State::GamePlaying { grade, round }).await?;
        }
        Err(e) => {
            bot.send_message(msg.chat.id, e.to_string())
                .reply_markup(panel_keyboard(GRADES))
                .await?;
            dialogue.update(State::GameReceiveGrade).await?;
        }
    }
    Ok(())
}

pub async fn game_receive_grade(
    bot: Bot,
    dialogue: TutorDialogue,
    msg: Message,
    tutor: Arc<Tutor>,
) -> HandlerResult {
    let Some(grade) = msg.text() else {
        bot.send_message(msg.chat.id, "Please pick a grade").await?;
        return Ok(());
    };
    start_round(&bot, &dialogue, &msg, &tutor, grade.to_string()).await
}

pub async fn game_round(
    bot: Bot,
    dialogue: TutorDialogue,
    (grade, round): (String, GameRound),
    msg: Message,
    tutor: Arc<Tutor>,
) -> HandlerResult {
    if msg.text() == Some(NEW_QUESTION) {
        return start_round(&bot, &dialogue, &msg, &tutor, grade).await;
    }

    let selected = msg.text().unwrap_or_default();
    let verdict = check_answer(selected, &round.correct);
    log::debug!("Chat {} answered {:?}: {:?}", msg.chat.id.0, selected, verdict);
    bot.send_message(msg.chat.id, verdict.to_string()).await?;
    Ok(())
}

pub async fn tutor_receive_mode(bot: Bot, dialogue: TutorDialogue, msg: Message) -> HandlerResult {
    match msg.text().unwrap_or_default().parse::<TutorMode>() {
        Ok(mode) => {
            bot.send_message(msg.chat.id, "Which grade?")
                .reply_markup(panel_keyboard(GRADES))
                .await?;
            dialogue.update(State::TutorReceiveGrade { mode }).await?;
        }
        Err(e) => {
            bot.send_message(msg.chat.id, e.to_string()).await?;
        }
    }
    Ok(())
}

pub async fn tutor_receive_grade(
    bot: Bot,
    dialogue: TutorDialogue,
    mode: TutorMode,
    msg: Message,
) -> HandlerResult {
    let request = TutorRequest {
        grade: msg.text().unwrap_or_default().to_string(),
        ..Default::default()
    };
    bot.send_message(msg.chat.id, "What's the question?")
        .reply_markup(clear_keyboard())
        .await?;
    dialogue
        .update(State::TutorReceiveQuestion { mode, request })
        .await?;
    Ok(())
}

pub async fn tutor_receive_question(
    bot: Bot,
    dialogue: TutorDialogue,
    (mode, mut request): (TutorMode, TutorRequest),
    msg: Message,
    tutor: Arc<Tutor>,
) -> HandlerResult {
    request.question = msg.text().unwrap_or_default().to_string();
    match next_tutor_step(mode, &request) {
        TutorStep::AskAttempt => {
            bot.send_message(msg.chat.id, "What did you try?").await?;
            dialogue
                .update(State::TutorReceiveAttempt { mode, request })
                .await?;
            Ok(())
        }
        TutorStep::AskConcept => {
            bot.send_message(msg.chat.id, "Which concept?").await?;
            dialogue
                .update(State::TutorReceiveConcept { mode, request })
                .await?;
            Ok(())
        }
        TutorStep::Run => run_tutor(&bot, &dialogue, &msg, &tutor, mode, &request).await,
    }
}

#[derive(Debug, PartialEq, Eq)]
enum TutorStep {
    AskAttempt,
    AskConcept,
    Run,
}

/// An empty question goes straight to the tutor, which warns about it,
/// instead of asking for the attempt or concept first.
fn next_tutor_step(mode: TutorMode, request: &TutorRequest) -> TutorStep {
    if request.question.is_empty() {
        return TutorStep::Run;
    }
    match mode {
        TutorMode::CheckMyWork => TutorStep::AskAttempt,
        TutorMode::ExplainConcept => TutorStep::AskConcept,
        _ => TutorStep::Run,
    }
}

pub async fn tutor_receive_attempt(
    bot: Bot,
    dialogue: TutorDialogue,
    (mode, mut request): (TutorMode, TutorRequest),
    msg: Message,
    tutor: Arc<Tutor>,
) -> HandlerResult {
    request.attempt = msg.text().unwrap_or_default().to_string();
    run_tutor(&bot, &dialogue, &msg, &tutor, mode, &request).await
}

pub async fn tutor_receive_concept(
    bot: Bot,
    dialogue: TutorDialogue,
    (mode, mut request): (TutorMode, TutorRequest),
    msg: Message,
    tutor: Arc<Tutor>,
) -> HandlerResult {
    request.concept = msg.text().unwrap_or_default().to_string();
    run_tutor(&bot, &dialogue, &msg, &tutor, mode, &request).await
}

async fn run_tutor(
    bot: &Bot,
    dialogue: &TutorDialogue,
    msg: &Message,
    tutor: &Tutor,
    mode: TutorMode,
    request: &TutorRequest,
) -> HandlerResult {
    typing(bot, msg).await;
    match tutor.smart_tutor(mode, request).await {
        Ok(text) => send_text(bot, msg, &text).await?,
        Err(e) => {
            bot.send_message(msg.chat.id, e.to_string()).await?;
        }
    }

    bot.send_message(msg.chat.id, "Anything else?")
        .reply_markup(panel_keyboard(TutorMode::ALL.iter().map(|m| m.label())))
        .await?;
    dialogue.update(State::TutorReceiveMode).await?;
    Ok(())
}

pub async fn lab_receive_tool(bot: Bot, dialogue: TutorDialogue, msg: Message) -> HandlerResult {
    match msg.text().unwrap_or_default().parse::<LabTool>() {
        Ok(tool) => {
            bot.send_message(msg.chat.id, "Send the content to analyse")
                .reply_markup(clear_keyboard())
                .await?;
            dialogue.update(State::LabReceiveInput { tool }).await?;
        }
        Err(e) => {
            bot.send_message(msg.chat.id, e.to_string()).await?;
        }
    }
    Ok(())
}

pub async fn lab_receive_input(
    bot: Bot,
    tool: LabTool,
    msg: Message,
    tutor: Arc<Tutor>,
) -> HandlerResult {
    let text = msg.text().unwrap_or_default();
    typing(&bot, &msg).await;
    match tutor.ai_lab(tool, text).await {
        Ok(output) => send_text(&bot, &msg, &output).await?,
        Err(e) => {
            bot.send_message(msg.chat.id, e.to_string()).await?;
        }
    }
    Ok(())
}

pub async fn settings_receive_theme(
    bot: Bot,
    dialogue: TutorDialogue,
    msg: Message,
) -> HandlerResult {
    let theme = msg.text().unwrap_or_default().to_string();
    bot.send_message(msg.chat.id, "Default grade?")
        .reply_markup(panel_keyboard(GRADES))
        .await?;
    dialogue.update(State::SettingsReceiveGrade { theme }).await?;
    Ok(())
}

pub async fn settings_receive_grade(
    bot: Bot,
    dialogue: TutorDialogue,
    theme: String,
    msg: Message,
) -> HandlerResult {
    let grade = msg.text().unwrap_or_default().to_string();
    bot.send_message(msg.chat.id, "Math skills (comma separated)")
        .reply_markup(clear_keyboard())
        .await?;
    dialogue
        .update(State::SettingsReceiveSkills { theme, grade })
        .await?;
    Ok(())
}

pub async fn settings_receive_skills(
    bot: Bot,
    dialogue: TutorDialogue,
    (theme, grade): (String, String),
    msg: Message,
    settings: Arc<SettingsStore>,
) -> HandlerResult {
    let skills = msg.text().unwrap_or_default();
    let saved = settings.save(msg.chat.id.0, &theme, &grade, skills);

    bot.send_message(msg.chat.id, format!("✅ Settings saved: {}", saved))
        .reply_markup(menu_keyboard())
        .await?;
    dialogue.update(State::ReceivePanelChoice).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button_texts(markup: &KeyboardMarkup) -> Vec<String> {
        markup
            .keyboard
            .iter()
            .flatten()
            .map(|button| button.text.clone())
            .collect()
    }

    #[test]
    fn panel_keyboard_ends_with_clear() {
        let markup = panel_keyboard(GRADES);
        let texts = button_texts(&markup);
        assert_eq!(texts.len(), GRADES.len() + 1);
        assert_eq!(texts.last().map(String::as_str), Some(CLEAR));
    }

    #[test]
    fn menu_lists_every_panel() {
        assert_eq!(button_texts(&menu_keyboard()), PANELS);
    }

    #[test]
    fn short_text_is_one_message() {
        assert_eq!(split_message("Final Answer: 4", MESSAGE_LIMIT), vec!["Final Answer: 4"]);
        assert!(split_message("", MESSAGE_LIMIT).is_empty());
    }

    #[test]
    fn long_text_is_split_under_the_limit() {
        let text = "x".repeat(MESSAGE_LIMIT * 2 + 10);
        let chunks = split_message(&text, MESSAGE_LIMIT);
        assert_eq!(
            chunks.iter().map(|c| c.len()).collect::<Vec<_>>(),
            vec![MESSAGE_LIMIT, MESSAGE_LIMIT, 10]
        );
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn split_respects_char_boundaries_and_utf16_width() {
        // "é" is one UTF-16 unit, "🧮" is two.
        let text = "é🧮é🧮";
        let chunks = split_message(text, 3);
        assert_eq!(chunks, vec!["é🧮", "é🧮"]);

        let chunks = split_message(text, 2);
        assert_eq!(chunks, vec!["é", "🧮", "é", "🧮"]);
        for chunk in &chunks {
            assert!(chunk.encode_utf16().count() <= 2);
        }
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn photo_download_failure_reads_as_an_error() {
        let err = photo_error("file is too big");
        assert!(matches!(err, TutorError::Ocr(_)));
        assert_eq!(
            err.to_string(),
            "❌ Error: could not download the photo: file is too big"
        );
    }

    #[test]
    fn tutor_asks_follow_ups_only_for_a_real_question() {
        let asked = TutorRequest {
            question: "1/2 + 1/3".into(),
            ..Default::default()
        };
        assert_eq!(next_tutor_step(TutorMode::CheckMyWork, &asked), TutorStep::AskAttempt);
        assert_eq!(next_tutor_step(TutorMode::ExplainConcept, &asked), TutorStep::AskConcept);
        assert_eq!(next_tutor_step(TutorMode::JustAHint, &asked), TutorStep::Run);

        let empty = TutorRequest::default();
        assert_eq!(next_tutor_step(TutorMode::CheckMyWork, &empty), TutorStep::Run);
        assert_eq!(next_tutor_step(TutorMode::ExplainConcept, &empty), TutorStep::Run);
    }
}
