//! Core data models for the orchestration pipeline

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//
// ================= Enums =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[serde(alias = "en")]
    English,
    #[serde(alias = "es")]
    Spanish,
    #[serde(alias = "fr")]
    French,
    #[serde(alias = "de")]
    German,
    #[serde(alias = "it")]
    Italian,
    #[serde(alias = "pt")]
    Portuguese,
    #[serde(alias = "zh")]
    Chinese,
    #[serde(alias = "ja")]
    Japanese,
    #[serde(alias = "ko")]
    Korean,
    #[serde(alias = "ar")]
    Arabic,
    #[serde(alias = "hi")]
    Hindi,
    #[serde(alias = "ru")]
    Russian,
}

impl Language {
    pub const ALL: [Language; 12] = [
        Language::English,
        Language::Spanish,
        Language::French,
        Language::German,
        Language::Italian,
        Language::Portuguese,
        Language::Chinese,
        Language::Japanese,
        Language::Korean,
        Language::Arabic,
        Language::Hindi,
        Language::Russian,
    ];

    /// ISO 639-1 code
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::German => "de",
            Language::Italian => "it",
            Language::Portuguese => "pt",
            Language::Chinese => "zh",
            Language::Japanese => "ja",
            Language::Korean => "ko",
            Language::Arabic => "ar",
            Language::Hindi => "hi",
            Language::Russian => "ru",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Spanish => "Spanish",
            Language::French => "French",
            Language::German => "German",
            Language::Italian => "Italian",
            Language::Portuguese => "Portuguese",
            Language::Chinese => "Chinese",
            Language::Japanese => "Japanese",
            Language::Korean => "Korean",
            Language::Arabic => "Arabic",
            Language::Hindi => "Hindi",
            Language::Russian => "Russian",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::English
    }
}

impl FromStr for Language {
    type Err = String;

    /// Accepts either the ISO code or the English name, case-insensitively
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Language::ALL
            .into_iter()
            .find(|l| l.code() == wanted || l.name().to_lowercase() == wanted)
            .ok_or_else(|| format!("unsupported language: {}", s))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    #[serde(alias = "translation")]
    Translate,
    #[serde(alias = "financial-plan", alias = "plan", alias = "financial_planning")]
    FinancialPlan,
    #[serde(alias = "remittance-analyze", alias = "remittance", alias = "remittance_analysis")]
    RemittanceAnalyze,
    #[serde(alias = "voice-synthesize", alias = "voice")]
    VoiceSynthesize,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::Translate,
        Capability::FinancialPlan,
        Capability::RemittanceAnalyze,
        Capability::VoiceSynthesize,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Translate => "translate",
            Capability::FinancialPlan => "financial_plan",
            Capability::RemittanceAnalyze => "remittance_analyze",
            Capability::VoiceSynthesize => "voice_synthesize",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Basic,
    Premium,
    Enterprise,
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free" => Ok(Tier::Free),
            "basic" => Ok(Tier::Basic),
            "premium" => Ok(Tier::Premium),
            "enterprise" => Ok(Tier::Enterprise),
            other => Err(format!("unknown tier: {}", other)),
        }
    }
}

//
// ================= Request =================
//

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanningDetails {
    #[serde(default)]
    pub goals: Vec<String>,
    pub monthly_income: Option<f64>,
    pub monthly_expenses: Option<f64>,
    pub timeline: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemittanceDetails {
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub source_country: Option<String>,
    pub destination_country: Option<String>,
}

/// One inbound user request, immutable for the duration of a call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub user_id: String,
    pub raw_text: String,
    pub explicit_language: Option<Language>,
    #[serde(default)]
    pub user_level: UserLevel,
    pub requested_capability: Option<Capability>,
    #[serde(default)]
    pub voice_output: bool,
    pub planning: Option<PlanningDetails>,
    pub remittance: Option<RemittanceDetails>,
}

impl Request {
    pub fn new(user_id: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            raw_text: raw_text.into(),
            explicit_language: None,
            user_level: UserLevel::default(),
            requested_capability: None,
            voice_output: false,
            planning: None,
            remittance: None,
        }
    }

    pub fn with_capability(mut self, capability: Capability) -> Self {
        self.requested_capability = Some(capability);
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.explicit_language = Some(language);
        self
    }

    pub fn with_voice(mut self) -> Self {
        self.voice_output = true;
        self
    }

    /// Language adapters and voice should produce: explicit wins over detected
    pub fn target_language(&self, detected: &DetectedLanguage) -> Language {
        self.explicit_language.unwrap_or(detected.language)
    }
}

//
// ================= Pipeline Values =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetectedLanguage {
    pub language: Language,
    /// false when the detector fell back to the default language
    pub detected: bool,
}

impl DetectedLanguage {
    pub fn matched(language: Language) -> Self {
        Self {
            language,
            detected: true,
        }
    }

    pub fn fallback() -> Self {
        Self {
            language: Language::default(),
            detected: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialPlan {
    pub summary: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub milestones: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemittanceAnalysis {
    pub summary: String,
    pub estimated_fee: Option<String>,
    pub estimated_delivery: Option<String>,
    #[serde(default)]
    pub risks: Vec<String>,
}

/// Typed view over what a provider returned
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParsedOutput {
    Translation {
        translation: String,
        explanation: Option<String>,
    },
    FinancialPlan(FinancialPlan),
    RemittanceAnalysis(RemittanceAnalysis),
    Reply {
        text: String,
    },
    /// Provider answered but not in the requested shape
    Unparsed {
        raw: String,
    },
    /// Provider could not be called because it is not configured
    Degraded {
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityResult {
    pub capability: Capability,
    pub text_output: String,
    pub output: ParsedOutput,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl CapabilityResult {
    pub fn is_degraded(&self) -> bool {
        matches!(self.output, ParsedOutput::Degraded { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceArtifact {
    /// Path of the written audio file; None when voice is disabled
    pub audio_ref: Option<String>,
    pub source_language: Language,
    pub voice_id: String,
    pub duration_estimate_secs: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub user_id: String,
    pub capability: Capability,
    pub tier: Tier,
    pub count_this_period: u32,
}

//
// ================= Response =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Ok,
    Denied,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMarker {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub request_id: Uuid,
    pub detected_language: DetectedLanguage,
    pub capability: Capability,
    pub status: ResponseStatus,
    pub capability_result: Option<CapabilityResult>,
    pub voice_artifact: Option<VoiceArtifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorMarker>,
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl fmt::Display for UserLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UserLevel::Beginner => "beginner",
            UserLevel::Intermediate => "intermediate",
            UserLevel::Advanced => "advanced",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tier::Free => "free",
            Tier::Basic => "basic",
            Tier::Premium => "premium",
            Tier::Enterprise => "enterprise",
        };
        write!(f, "{}", s)
    }
}
