//! Environment configuration
//!
//! Missing keys never abort startup: the features that need them run in
//! degraded mode instead.

use std::env;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 8001;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_XRPL_RPC_URL: &str = "https://s.altnet.rippletest.net:51234";

#[derive(Debug, Clone)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub elevenlabs_api_key: Option<String>,
    pub default_voice_id: String,
    pub voice_output_dir: PathBuf,
    pub xrpl_rpc_url: String,
    /// `alice=premium,bob=basic`
    pub user_tiers: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            elevenlabs_api_key: None,
            default_voice_id: crate::voice::DEFAULT_VOICE_ID.to_string(),
            voice_output_dir: PathBuf::from("voice_outputs"),
            xrpl_rpc_url: DEFAULT_XRPL_RPC_URL.to_string(),
            user_tiers: String::new(),
        }
    }
}

impl Settings {
    /// Read settings from the process environment. Call `dotenv::dotenv()`
    /// first to pick up a local `.env` file.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let port = get("PORT")
            .or_else(|| get("API_PORT"))
            .and_then(|p| match p.parse::<u16>() {
                Ok(port) => Some(port),
                Err(_) => {
                    tracing::warn!(value = %p, "Invalid port, using default");
                    None
                }
            })
            .unwrap_or(defaults.port);

        Self {
            host: get("HOST").unwrap_or(defaults.host),
            port,
            gemini_api_key: get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY")),
            gemini_model: get("GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            elevenlabs_api_key: get("ELEVENLABS_API_KEY"),
            default_voice_id: get("DEFAULT_VOICE_ID").unwrap_or(defaults.default_voice_id),
            voice_output_dir: get("VOICE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.voice_output_dir),
            xrpl_rpc_url: get("XRPL_RPC_URL").unwrap_or(defaults.xrpl_rpc_url),
            user_tiers: get("MONEYLINGO_USER_TIERS").unwrap_or_default(),
        }
    }
}
