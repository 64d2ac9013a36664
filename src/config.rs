use crate::error::{self, TutorError};

const DEFAULT_TESSERACT: &str = "tesseract";
const DEFAULT_OCR_LANG: &str = "eng";

/// Start-up configuration, read once from the environment (and `.env`).
///
/// The Telegram token is picked up separately by `Bot::from_env` from
/// `TELOXIDE_TOKEN`.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub tesseract: String,
    pub ocr_lang: String,
}

impl Config {
    pub fn from_env() -> error::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> error::Result<Self> {
        let openai_api_key = lookup("OPENAI_API_KEY")
            .filter(|key| !key.is_empty())
            .ok_or_else(|| TutorError::Config("OPENAI_API_KEY is not set".to_string()))?;

        Ok(Self {
            openai_api_key,
            tesseract: lookup("TUTOR_TESSERACT").unwrap_or_else(|| DEFAULT_TESSERACT.to_string()),
            ocr_lang: lookup("TUTOR_OCR_LANG").unwrap_or_else(|| DEFAULT_OCR_LANG.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn api_key_is_required() {
        let err = Config::from_lookup(lookup_in(&[])).unwrap_err();
        assert!(matches!(err, TutorError::Config(_)));

        let err = Config::from_lookup(lookup_in(&[("OPENAI_API_KEY", "")])).unwrap_err();
        assert!(matches!(err, TutorError::Config(_)));
    }

    #[test]
    fn optional_values_fall_back_to_defaults() {
        let config = Config::from_lookup(lookup_in(&[("OPENAI_API_KEY", "sk-test")])).unwrap();
        assert_eq!(config.openai_api_key, "sk-test");
        assert_eq!(config.tesseract, "tesseract");
        assert_eq!(config.ocr_lang, "eng");
    }

    #[test]
    fn optional_values_can_be_overridden() {
        let config = Config::from_lookup(lookup_in(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("TUTOR_TESSERACT", "/opt/tesseract/bin/tesseract"),
            ("TUTOR_OCR_LANG", "eng+fra"),
        ]))
        .unwrap();
        assert_eq!(config.tesseract, "/opt/tesseract/bin/tesseract");
        assert_eq!(config.ocr_lang, "eng+fra");
    }
}
