use thiserror::Error;

/// Which input field was left empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Question,
    Content,
}

/// Everything that can go wrong while serving one panel action.
///
/// The `Display` output is what the student sees in the chat, so every
/// variant starts with a warning or error marker.
#[derive(Debug, Error)]
pub enum TutorError {
    #[error("❌ Error: {0}")]
    Ocr(String),

    #[error("❌ Error: {0}")]
    Completion(String),

    #[error("❌ Error generating question.")]
    MalformedResponse(String),

    #[error("{}", empty_input_message(.0))]
    EmptyInput(Field),

    #[error("❌ Error: no such template: {0}")]
    UnknownMode(String),

    #[error("configuration error: {0}")]
    Config(String),
}

fn empty_input_message(field: &Field) -> &'static str {
    match field {
        Field::Question => "⚠️ Please enter a question.",
        Field::Content => "⚠️ Enter content",
    }
}

pub type Result<T> = std::result::Result<T, TutorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_markers() {
        assert_eq!(
            TutorError::EmptyInput(Field::Question).to_string(),
            "⚠️ Please enter a question."
        );
        assert_eq!(
            TutorError::EmptyInput(Field::Content).to_string(),
            "⚠️ Enter content"
        );
        assert_eq!(
            TutorError::MalformedResponse("missing choice C".into()).to_string(),
            "❌ Error generating question."
        );
        assert_eq!(
            TutorError::Completion("401 Unauthorized".into()).to_string(),
            "❌ Error: 401 Unauthorized"
        );
    }
}
