use async_trait::async_trait;
use chatgpt::types::CompletionResponse;
use chatgpt::{client::ChatGPT, config::ChatGPTEngine};

use crate::error::{self, TutorError};

/// Something that turns a prompt into generated text.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str) -> error::Result<String>;
}

/// Completion service backed by the OpenAI chat API, always on
/// `gpt-3.5-turbo` and always with a single user message.
pub struct ChatGptCompletion {
    chat_gpt: ChatGPT,
}

impl ChatGptCompletion {
    pub fn new(api_key: &str) -> error::Result<Self> {
        let mut chat_gpt =
            ChatGPT::new(api_key).map_err(|e| TutorError::Config(e.to_string()))?;
        chat_gpt.config.engine = ChatGPTEngine::Gpt35Turbo;

        Ok(Self { chat_gpt })
    }
}

#[async_trait]
impl CompletionService for ChatGptCompletion {
    async fn complete(&self, prompt: &str) -> error::Result<String> {
        log::debug!("Sending prompt: {:?}", prompt);

        let response: CompletionResponse = self
            .chat_gpt
            .send_message(prompt)
            .await
            .map_err(|e| TutorError::Completion(e.to_string()))?;

        // `CompletionResponse::message` indexes without checking, so look
        // the choice up ourselves.
        let content = response
            .message_choices
            .first()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| TutorError::Completion("response had no choices".to_string()))?;

        log::debug!("Completion: {:?}", content);

        Ok(content)
    }
}
