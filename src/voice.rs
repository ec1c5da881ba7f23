//! Voice synthesis stage
//!
//! Turns a text `CapabilityResult` into a spoken `VoiceArtifact`. Audio is
//! written under the output directory with a content-hash file name, so the
//! same text in the same voice always lands on the same file.

use crate::error::OrchestrationError;
use crate::models::{CapabilityResult, Language, VoiceArtifact};
use crate::providers::{SpeechProvider, VoiceProfile};
use crate::Result;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
pub const MULTILINGUAL_MODEL: &str = "eleven_multilingual_v2";

/// Average speaking rate used for duration estimates
const WORDS_PER_SECOND: f32 = 2.5;
/// Rate for scripts written without spaces (Chinese, Japanese)
const CHARS_PER_SECOND: f32 = 5.0;

pub struct VoiceAdapter {
    speech: Arc<dyn SpeechProvider>,
    output_dir: PathBuf,
    default_voice_id: String,
    voices: HashMap<Language, String>,
}

impl VoiceAdapter {
    pub fn new(speech: Arc<dyn SpeechProvider>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            speech,
            output_dir: output_dir.into(),
            default_voice_id: DEFAULT_VOICE_ID.to_string(),
            voices: HashMap::new(),
        }
    }

    pub fn with_default_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.default_voice_id = voice_id.into();
        self
    }

    /// Use a dedicated voice for one language
    pub fn with_voice(mut self, language: Language, voice_id: impl Into<String>) -> Self {
        self.voices.insert(language, voice_id.into());
        self
    }

    pub fn profile_for(&self, language: Language) -> VoiceProfile {
        let voice_id = self
            .voices
            .get(&language)
            .cloned()
            .unwrap_or_else(|| self.default_voice_id.clone());

        VoiceProfile {
            voice_id,
            model_id: MULTILINGUAL_MODEL.to_string(),
        }
    }

    /// Speak `result.text_output` in `language`.
    ///
    /// An unconfigured speech provider yields a marker artifact with no
    /// audio instead of an error.
    pub async fn synthesize(
        &self,
        result: &CapabilityResult,
        language: Language,
    ) -> Result<VoiceArtifact> {
        let text = result.text_output.trim();
        if text.is_empty() {
            return Err(OrchestrationError::InvalidRequest(
                "There is no text to speak.".to_string(),
            ));
        }

        let profile = self.profile_for(language);
        let duration = estimate_duration(text);

        if !self.speech.is_configured() {
            info!(%language, "Speech provider not configured, returning text-only marker");
            return Ok(disabled_marker(language, profile.voice_id));
        }

        let audio = match self.speech.synthesize(text, language, &profile).await {
            Ok(audio) => audio,
            Err(OrchestrationError::Configuration(detail)) => {
                warn!(%detail, "Speech provider rejected credentials as missing");
                return Ok(disabled_marker(language, profile.voice_id));
            }
            Err(e) => return Err(e),
        };

        let path = self
            .output_dir
            .join(artifact_file_name(text, language, &profile));
        tokio::fs::create_dir_all(&self.output_dir).await?;
        tokio::fs::write(&path, &audio).await?;

        info!(
            provider = self.speech.name(),
            %language,
            bytes = audio.len(),
            path = %path.display(),
            "Voice artifact written"
        );

        Ok(VoiceArtifact {
            audio_ref: Some(path.to_string_lossy().into_owned()),
            source_language: language,
            voice_id: profile.voice_id,
            duration_estimate_secs: Some(duration),
        })
    }
}

fn disabled_marker(language: Language, voice_id: String) -> VoiceArtifact {
    VoiceArtifact {
        audio_ref: None,
        source_language: language,
        voice_id,
        duration_estimate_secs: None,
    }
}

/// `voice_<first 16 hex chars of sha256(voice|model|lang|text)>.mp3`
fn artifact_file_name(text: &str, language: Language, profile: &VoiceProfile) -> String {
    let mut hasher = Sha256::new();
    hasher.update(profile.voice_id.as_bytes());
    hasher.update(b"|");
    hasher.update(profile.model_id.as_bytes());
    hasher.update(b"|");
    hasher.update(language.code().as_bytes());
    hasher.update(b"|");
    hasher.update(text.as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("voice_{}.mp3", &digest[..16])
}

fn estimate_duration(text: &str) -> f32 {
    let words = text.split_whitespace().count();
    if words > 1 {
        words as f32 / WORDS_PER_SECOND
    } else {
        text.chars().count() as f32 / CHARS_PER_SECOND
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Capability, ParsedOutput};
    use crate::providers::mock::MockSpeech;
    use serde_json::Map;

    fn result(text: &str) -> CapabilityResult {
        CapabilityResult {
            capability: Capability::VoiceSynthesize,
            text_output: text.to_string(),
            output: ParsedOutput::Reply {
                text: text.to_string(),
            },
            metadata: Map::new(),
        }
    }

    fn temp_output_dir() -> PathBuf {
        std::env::temp_dir().join(format!("moneylingo-voice-{}", uuid::Uuid::new_v4()))
    }

    #[tokio::test]
    async fn test_writes_audio_under_content_hash() {
        let dir = temp_output_dir();
        let speech = Arc::new(MockSpeech::working());
        let adapter = VoiceAdapter::new(speech.clone(), &dir);

        let artifact = adapter
            .synthesize(&result("Ahorra el veinte por ciento"), Language::Spanish)
            .await
            .unwrap();

        let audio_ref = artifact.audio_ref.clone().unwrap();
        assert!(audio_ref.ends_with(".mp3"));
        let bytes = tokio::fs::read(&audio_ref).await.unwrap();
        assert!(bytes.starts_with(b"ID3-mock:es:"));
        assert_eq!(artifact.source_language, Language::Spanish);
        assert_eq!(artifact.voice_id, DEFAULT_VOICE_ID);
        assert_eq!(artifact.duration_estimate_secs, Some(2.0));
        assert_eq!(speech.calls(), 1);

        let again = adapter
            .synthesize(&result("Ahorra el veinte por ciento"), Language::Spanish)
            .await
            .unwrap();
        assert_eq!(again.audio_ref, artifact.audio_ref);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_unconfigured_speech_returns_marker() {
        let speech = Arc::new(MockSpeech::unconfigured());
        let adapter = VoiceAdapter::new(speech.clone(), temp_output_dir());

        let artifact = adapter
            .synthesize(&result("hello"), Language::English)
            .await
            .unwrap();
        assert!(artifact.audio_ref.is_none());
        assert_eq!(speech.calls(), 0);
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let adapter = VoiceAdapter::new(Arc::new(MockSpeech::failing()), temp_output_dir());
        let err = adapter
            .synthesize(&result("hello there"), Language::English)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "external_service");
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let adapter = VoiceAdapter::new(Arc::new(MockSpeech::working()), temp_output_dir());
        assert!(adapter
            .synthesize(&result("   "), Language::English)
            .await
            .is_err());
    }

    #[test]
    fn test_language_override() {
        let adapter = VoiceAdapter::new(Arc::new(MockSpeech::working()), temp_output_dir())
            .with_voice(Language::Japanese, "jp-voice");
        assert_eq!(adapter.profile_for(Language::Japanese).voice_id, "jp-voice");
        assert_eq!(adapter.profile_for(Language::Korean).voice_id, DEFAULT_VOICE_ID);
        assert_eq!(
            adapter.profile_for(Language::Korean).model_id,
            MULTILINGUAL_MODEL
        );
    }

    #[test]
    fn test_duration_for_unspaced_script() {
        assert_eq!(estimate_duration("复利是利息的利息"), 8.0 / 5.0);
    }
}
