use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{self, TutorError};

/// Reads text out of an in-memory image.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn extract_text(&self, image: &[u8]) -> error::Result<String>;
}

/// Runs the `tesseract` executable, feeding the image on stdin and reading
/// the recognised text from stdout.
pub struct TesseractCli {
    program: String,
    language: String,
}

impl TesseractCli {
    pub fn new(program: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            language: language.into(),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractCli {
    async fn extract_text(&self, image: &[u8]) -> error::Result<String> {
        log::debug!("Running {} on {} bytes", self.program, image.len());

        let mut child = Command::new(&self.program)
            .args(["stdin", "stdout", "-l", self.language.as_str()])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TutorError::Ocr(format!("cannot start {}: {}", self.program, e)))?;

        // tesseract reads the whole image before it writes anything, so the
        // pipe can be filled and closed before collecting output.
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(image)
                .await
                .map_err(|e| TutorError::Ocr(e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| TutorError::Ocr(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TutorError::Ocr(stderr.trim().to_string()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;

    pub struct FakeOcr(pub std::result::Result<String, String>);

    #[async_trait]
    impl OcrEngine for FakeOcr {
        async fn extract_text(&self, _image: &[u8]) -> error::Result<String> {
            self.0.clone().map_err(TutorError::Ocr)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_program_is_an_ocr_error() {
        let engine = TesseractCli::new("definitely-not-tesseract-here", "eng");
        let err = engine.extract_text(b"not an image").await.unwrap_err();
        assert!(matches!(err, TutorError::Ocr(_)));
        assert!(err.to_string().starts_with("❌ Error: cannot start"));
    }
}
