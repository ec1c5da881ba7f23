//! MoneyLingo Orchestrator
//!
//! Multilingual financial assistant backend:
//! - Detects the language of a free-text request
//! - Routes it to one capability (translate, financial plan, remittance
//!   analysis, voice reply)
//! - Enforces per-tier monthly quotas before any provider is called
//! - Optionally speaks the answer back in the user's language
//! - Records every decision with a hash of the request it answered
//!
//! PIPELINE:
//! DETECT → ROUTE → GATE → AGENT → VOICE? → RESPOND

pub mod agents;
pub mod api;
pub mod audit;
pub mod config;
pub mod detector;
pub mod error;
pub mod models;
pub mod monetization;
pub mod orchestrator;
pub mod parsing;
pub mod providers;
pub mod router;
pub mod voice;

pub use error::{OrchestrationError, Result};

// Re-export common types
pub use detector::LanguageDetector;
pub use models::*;
pub use orchestrator::Orchestrator;
pub use router::CapabilityRouter;
