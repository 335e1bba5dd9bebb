//! Voice note transcription.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::config::{GroqConfig, TranscriptionConfig};
use crate::llm::{LlmClient, TranscriptionRequest};

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> Result<String>;
}

/// A staged audio file that is removed when dropped.
struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    async fn create(dir: &Path, contents: &[u8]) -> Result<Self> {
        let path = dir.join(format!("voice-{}.ogg", uuid::Uuid::new_v4()));
        // Own the path before writing so a partial write is cleaned up too.
        let file = Self { path };
        tokio::fs::write(&file.path, contents)
            .await
            .with_context(|| format!("Failed to write scratch file: {}", file.path.display()))?;
        Ok(file)
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Scratch file removed: {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => error!(
                "Failed to remove scratch file {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Whisper transcription through the Groq API.
pub struct GroqTranscriber {
    llm: Arc<LlmClient>,
    request: TranscriptionRequest,
    scratch_dir: PathBuf,
}

impl GroqTranscriber {
    pub fn new(llm: Arc<LlmClient>, groq: &GroqConfig, config: &TranscriptionConfig) -> Self {
        Self {
            llm,
            request: TranscriptionRequest {
                model: groq.transcription_model.clone(),
                language: config.language.clone(),
                prompt: config.prompt.clone(),
                temperature: config.temperature,
            },
            scratch_dir: config.scratch_dir.clone(),
        }
    }
}

#[async_trait]
impl Transcriber for GroqTranscriber {
    async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        let scratch = ScratchFile::create(&self.scratch_dir, audio).await?;
        debug!(
            "Staged {} bytes of audio at {}",
            audio.len(),
            scratch.path().display()
        );

        let text = self.llm.transcribe(scratch.path(), &self.request).await?;
        let text = text.trim();
        if text.is_empty() {
            anyhow::bail!("Transcription came back empty");
        }

        info!("Transcribed {} chars", text.len());
        Ok(text.to_string())
    }
}
