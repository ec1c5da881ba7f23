//! Language Detector
//!
//! Classifies free text into one of the supported languages.
//! Non-Latin scripts are recognised by character range first; Latin-script
//! languages are then matched against greeting/finance keyword lists in a
//! fixed priority order. Anything else falls back to English.

use crate::models::{DetectedLanguage, Language};

fn is_kana(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{30FF}' | '\u{31F0}'..='\u{31FF}')
}

fn is_hangul(c: char) -> bool {
    matches!(c, '\u{AC00}'..='\u{D7AF}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}')
}

fn is_han(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}')
}

fn is_arabic(c: char) -> bool {
    matches!(c, '\u{0600}'..='\u{06FF}' | '\u{0750}'..='\u{077F}')
}

fn is_devanagari(c: char) -> bool {
    matches!(c, '\u{0900}'..='\u{097F}')
}

fn is_cyrillic(c: char) -> bool {
    matches!(c, '\u{0400}'..='\u{04FF}')
}

/// Script checks, in priority order. Kana precedes Han because Japanese
/// text mixes kanji with kana.
const SCRIPT_RULES: &[(Language, fn(char) -> bool)] = &[
    (Language::Japanese, is_kana),
    (Language::Korean, is_hangul),
    (Language::Chinese, is_han),
    (Language::Arabic, is_arabic),
    (Language::Hindi, is_devanagari),
    (Language::Russian, is_cyrillic),
];

/// Latin-script keyword sets, in priority order. First hit wins, so a word
/// shared by two languages resolves to the earlier one. Single words match
/// whole words only; phrases and punctuation match anywhere.
const KEYWORD_RULES: &[(Language, &[&str])] = &[
    (
        Language::Spanish,
        &[
            "hola", "gracias", "por favor", "dinero", "ahorro", "ahorrar", "inversión",
            "cómo", "¿", "necesito", "ayuda", "jubilación", "préstamo", "quiero",
        ],
    ),
    (
        Language::French,
        &[
            "bonjour", "merci", "s'il vous plaît", "argent", "épargne", "investissement",
            "retraite", "j'ai besoin", "je voudrais", "économiser",
        ],
    ),
    (
        Language::German,
        &[
            "hallo", "danke", "bitte", "geld", "sparen", "investition", "ruhestand",
            "altersvorsorge", "ich möchte", "wie kann ich",
        ],
    ),
    (
        Language::Italian,
        &[
            "ciao", "grazie", "denaro", "soldi", "risparmio", "risparmiare", "investimento",
            "pensione", "vorrei",
        ],
    ),
    (
        Language::Portuguese,
        &[
            "olá", "obrigado", "obrigada", "dinheiro", "poupança", "aposentadoria", "você",
            "preciso",
        ],
    ),
    (
        Language::English,
        &[
            "hello", "hi", "thank", "thanks", "please", "money", "save", "saving", "savings",
            "retire", "retirement", "invest", "budget", "how", "what", "help",
        ],
    ),
];

/// Language detector
pub struct LanguageDetector;

impl LanguageDetector {
    /// Detect the language of `text`. Never fails.
    pub fn detect(text: &str) -> DetectedLanguage {
        if text.trim().is_empty() {
            return DetectedLanguage::fallback();
        }

        for (language, in_script) in SCRIPT_RULES {
            if text.chars().any(in_script) {
                return DetectedLanguage::matched(*language);
            }
        }

        let lowered = text.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        KEYWORD_RULES
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|kw| keyword_hit(kw, &lowered, &words)))
            .map(|(language, _)| DetectedLanguage::matched(*language))
            .unwrap_or_else(DetectedLanguage::fallback)
    }
}

/// "merci" must not fire inside "commercial"
fn keyword_hit(keyword: &str, lowered: &str, words: &[&str]) -> bool {
    if keyword.chars().all(char::is_alphanumeric) {
        words.contains(&keyword)
    } else {
        lowered.contains(keyword)
    }
}
