mod config;
mod error;
mod panels;
mod settings;
mod tutor;

use std::sync::Arc;

use dotenv::dotenv;
use teloxide::{
    dispatching::dialogue::{ErasedStorage, InMemStorage, Storage},
    prelude::*,
};

use config::Config;
use panels::*;
use settings::SettingsStore;
use tutor::{completion::ChatGptCompletion, ocr::TesseractCli, Tutor};

type DialogueStorage = Arc<ErasedStorage<State>>;

#[tokio::main]
async fn main() {
    // A missing .env is fine, the variables may come from the environment.
    dotenv().ok();
    pretty_env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    log::info!("Starting tutor bot...");

    let bot = Bot::from_env();

    let completion = match ChatGptCompletion::new(&config.openai_api_key) {
        Ok(completion) => completion,
        Err(e) => {
            log::error!("Unable to set up the completion client: {}", e);
            std::process::exit(1);
        }
    };
    let ocr = TesseractCli::new(config.tesseract.clone(), config.ocr_lang.clone());
    let tutor = Arc::new(Tutor::new(Arc::new(completion), Arc::new(ocr)));

    // Dialogue state only lives as long as the process.
    let storage: DialogueStorage = InMemStorage::<State>::new().erase();
    let settings = Arc::new(SettingsStore::new());

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![storage, tutor, settings])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

fn schema() -> teloxide::dispatching::UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>>
{
    Update::filter_message()
        .enter_dialogue::<Message, ErasedStorage<State>, State>()
        .branch(dptree::filter(|msg: Message| msg.text() == Some(CLEAR)).endpoint(clear))
        .branch(dptree::case![State::Start].endpoint(start))
        .branch(dptree::case![State::ReceivePanelChoice].endpoint(receive_panel_choice))
        .branch(dptree::case![State::SolverReceiveMode].endpoint(solver_receive_mode))
        .branch(
            dptree::case![State::SolverReceiveQuestion { mode }]
                .endpoint(solver_receive_question),
        )
        .branch(dptree::case![State::GameReceiveGrade].endpoint(game_receive_grade))
        .branch(dptree::case![State::GamePlaying { grade, round }].endpoint(game_round))
        .branch(dptree::case![State::TutorReceiveMode].endpoint(tutor_receive_mode))
        .branch(dptree::case![State::TutorReceiveGrade { mode }].endpoint(tutor_receive_grade))
        .branch(
            dptree::case![State::TutorReceiveQuestion { mode, request }]
                .endpoint(tutor_receive_question),
        )
        .branch(
            dptree::case![State::TutorReceiveAttempt { mode, request }]
                .endpoint(tutor_receive_attempt),
        )
        .branch(
            dptree::case![State::TutorReceiveConcept { mode, request }]
                .endpoint(tutor_receive_concept),
        )
        .branch(dptree::case![State::LabReceiveTool].endpoint(lab_receive_tool))
        .branch(dptree::case![State::LabReceiveInput { tool }].endpoint(lab_receive_input))
        .branch(dptree::case![State::SettingsReceiveTheme].endpoint(settings_receive_theme))
        .branch(
            dptree::case![State::SettingsReceiveGrade { theme }].endpoint(settings_receive_grade),
        )
        .branch(
            dptree::case![State::SettingsReceiveSkills { theme, grade }]
                .endpoint(settings_receive_skills),
        )
}
