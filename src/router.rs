//! Capability Router
//!
//! Decides which capability serves a request:
//! - Explicit capability on the request always wins
//! - Currency symbols, amounts or transfer wording: remittance analysis
//! - Planning/goal vocabulary: financial planning
//! - Anything else: translation (the safe default)

use crate::models::{Capability, Request};
use serde::{Deserialize, Serialize};

/// Static keyword lists, zero allocation
const CURRENCY_SYMBOLS: &[(char, &str)] = &[
    ('$', "USD"),
    ('€', "EUR"),
    ('£', "GBP"),
    ('¥', "JPY"),
    ('₹', "INR"),
    ('₱', "PHP"),
    ('₩', "KRW"),
    ('₦', "NGN"),
    ('₽', "RUB"),
];

const CURRENCY_WORDS: &[(&str, &str)] = &[
    ("usd", "USD"), ("dollar", "USD"), ("dollars", "USD"), ("dólares", "USD"),
    ("eur", "EUR"), ("euro", "EUR"), ("euros", "EUR"),
    ("gbp", "GBP"), ("pounds", "GBP"),
    ("mxn", "MXN"), ("peso", "MXN"), ("pesos", "MXN"),
    ("inr", "INR"), ("rupees", "INR"),
    ("php", "PHP"),
    ("ngn", "NGN"), ("naira", "NGN"),
    ("jpy", "JPY"), ("yen", "JPY"),
    ("cny", "CNY"), ("yuan", "CNY"),
    ("brl", "BRL"), ("reais", "BRL"),
    ("cad", "CAD"),
    ("xrp", "XRP"),
];

const REMITTANCE_PHRASES: &[&str] = &[
    "send money", "transfer", "remit", "wire money", "money home",
    "enviar dinero", "remesa", "envoyer de l'argent", "überweisung", "rimessa", "remessa",
];

const PLANNING_WORDS: &[&str] = &[
    // English
    "save", "saving", "savings", "retire", "retirement", "budget", "budgeting", "plan",
    "planning", "goal", "goals", "invest", "investing", "investment", "debt", "mortgage",
    "emergency", "college", "pension",
    // Spanish / Portuguese
    "ahorrar", "ahorro", "jubilación", "presupuesto", "meta", "metas", "inversión",
    "poupança", "aposentadoria", "orçamento",
    // French / German / Italian
    "épargne", "retraite", "sparen", "rente", "ruhestand", "risparmio", "pensione",
];

const CORRIDOR_MARKERS_FROM: &[&str] = &["from", "desde"];
const CORRIDOR_MARKERS_TO: &[&str] = &["to", "hacia"];

/// Capitalised words after a marker that start a verb phrase or a
/// possessive, never a place ("want to Send", "to My mother")
const NOT_PLACES: &[&str] = &[
    "send", "transfer", "move", "pay", "wire", "remit", "save", "buy", "get", "make", "know",
    "my", "your", "his", "her", "our", "their", "enviar", "mi",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amount {
    pub value: f64,
    pub currency: Option<String>,
}

/// Capability router
pub struct CapabilityRouter;

impl CapabilityRouter {
    /// Route a request to exactly one capability
    pub fn route(request: &Request) -> Capability {
        if let Some(capability) = request.requested_capability {
            return capability;
        }

        let text = request.raw_text.as_str();

        if has_currency_signal(text) || contains_remittance_phrase(text) {
            Capability::RemittanceAnalyze
        } else if contains_planning_word(text) {
            Capability::FinancialPlan
        } else {
            Capability::Translate
        }
    }
}

fn has_currency_signal(text: &str) -> bool {
    text.chars().any(|c| CURRENCY_SYMBOLS.iter().any(|(s, _)| *s == c))
        || extract_amount(text).is_some()
}

fn contains_remittance_phrase(text: &str) -> bool {
    let lowered = text.to_lowercase();
    REMITTANCE_PHRASES.iter().any(|p| lowered.contains(p))
}

/// Whole-word match so "explanation" does not count as "plan"
fn contains_planning_word(text: &str) -> bool {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .any(|word| PLANNING_WORDS.contains(&word))
}

fn currency_for_word(word: &str) -> Option<&'static str> {
    let cleaned = word
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    CURRENCY_WORDS
        .iter()
        .find(|(w, _)| *w == cleaned)
        .map(|(_, code)| *code)
}

fn parse_number(token: &str) -> Option<f64> {
    let trimmed = token
        .trim_matches(|c: char| !c.is_ascii_digit() && c != '.' && c != ',')
        .trim_end_matches(['.', ','])
        .replace(',', "");
    if !trimmed.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<f64>().ok()
}

/// Find the first amount that carries a currency, e.g. "$200",
/// "500€", "1,200 pesos" or "USD 300". Bare numbers are ignored.
pub fn extract_amount(text: &str) -> Option<Amount> {
    let tokens: Vec<&str> = text.split_whitespace().collect();

    for (i, token) in tokens.iter().enumerate() {
        let Some(value) = parse_number(token) else {
            continue;
        };

        let symbol = token
            .chars()
            .find_map(|c| CURRENCY_SYMBOLS.iter().find(|(s, _)| *s == c))
            .map(|(_, code)| *code);

        let neighbour = tokens
            .get(i + 1)
            .and_then(|next| currency_for_word(next))
            .or_else(|| {
                i.checked_sub(1)
                    .and_then(|prev| tokens.get(prev))
                    .and_then(|prev| currency_for_word(prev))
            });

        if let Some(code) = symbol.or(neighbour) {
            return Some(Amount {
                value,
                currency: Some(code.to_string()),
            });
        }
    }

    None
}

/// Best-effort "from X to Y" extraction of a transfer corridor.
/// Place names are the capitalised words following the marker.
pub fn extract_corridor(text: &str) -> (Option<String>, Option<String>) {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    (
        place_after(&tokens, CORRIDOR_MARKERS_FROM),
        place_after(&tokens, CORRIDOR_MARKERS_TO),
    )
}

fn place_after(tokens: &[&str], markers: &[&str]) -> Option<String> {
    for (i, token) in tokens.iter().enumerate() {
        if !markers.contains(&token.to_lowercase().as_str()) {
            continue;
        }

        let mut words = Vec::new();
        for next in tokens.iter().skip(i + 1) {
            if words.is_empty() && next.eq_ignore_ascii_case("the") {
                continue;
            }
            let word = next.trim_matches(|c: char| !c.is_alphanumeric());
            if !word.chars().next().is_some_and(char::is_uppercase) {
                break;
            }
            if words.is_empty() && NOT_PLACES.contains(&word.to_lowercase().as_str()) {
                break;
            }
            words.push(word);
            // Punctuation closes the place name
            if next.ends_with(|c: char| !c.is_alphanumeric()) {
                break;
            }
        }

        if !words.is_empty() {
            return Some(words.join(" "));
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Language, UserLevel};

    fn request(text: &str) -> Request {
        Request::new("tester", text)
    }

    #[test]
    fn test_explicit_capability_wins() {
        let req = request("Send $500 to Mexico").with_capability(Capability::Translate);
        assert_eq!(CapabilityRouter::route(&req), Capability::Translate);
    }

    #[test]
    fn test_planning_questions() {
        let cases = vec![
            "Hello, how can I save money for retirement?",
            "help me build a budget",
            "Necesito ayuda con mi plan de jubilación",
        ];

        for c in cases {
            assert_eq!(
                CapabilityRouter::route(&request(c)),
                Capability::FinancialPlan,
                "input: {}",
                c
            );
        }
    }

    #[test]
    fn test_remittance_signals() {
        let cases = vec![
            "I want to send $200 to my mother",
            "what does it cost to move 1,500 pesos",
            "Quiero enviar dinero a Guatemala",
            "cheapest transfer to India?",
        ];

        for c in cases {
            assert_eq!(
                CapabilityRouter::route(&request(c)),
                Capability::RemittanceAnalyze,
                "input: {}",
                c
            );
        }
    }

    #[test]
    fn test_default_is_translate() {
        for c in ["what is an index fund?", "explanation of compound interest", "xyz123", ""] {
            assert_eq!(CapabilityRouter::route(&request(c)), Capability::Translate, "input: {}", c);
        }
    }

    #[test]
    fn test_bare_numbers_are_not_amounts() {
        assert_eq!(extract_amount("I have 3 kids and 2 jobs"), None);
        assert_eq!(
            extract_amount("Send 250 USD home"),
            Some(Amount {
                value: 250.0,
                currency: Some("USD".to_string())
            })
        );
        assert_eq!(
            extract_amount("about €1,200.50 monthly"),
            Some(Amount {
                value: 1200.5,
                currency: Some("EUR".to_string())
            })
        );
    }

    #[test]
    fn test_corridor_extraction() {
        let (from, to) = extract_corridor("Send $300 from the United States to Mexico.");
        assert_eq!(from.as_deref(), Some("United States"));
        assert_eq!(to.as_deref(), Some("Mexico"));

        let (from, to) = extract_corridor("I want to send money");
        assert_eq!(from, None);
        assert_eq!(to, None);
    }

    #[test]
    fn test_corridor_skips_capitalised_verbs() {
        let (_, to) = extract_corridor("I want to Send money");
        assert_eq!(to, None);

        let (_, to) = extract_corridor("I need to Transfer $100 to Kenya");
        assert_eq!(to.as_deref(), Some("Kenya"));

        let (_, to) = extract_corridor("Sending pesos to My mother in Peru");
        assert_eq!(to, None);
    }

    #[test]
    fn test_route_is_total() {
        const WORDS: &[&str] = &[
            "hola", "$", "save", "transfer", "bonjour", "42", "pesos", "plan", "xyz", "你好",
            "retirement", "explain", "€10", "money", "the",
        ];

        // Deterministic LCG so the generated set is reproducible
        let mut seed: u64 = 0x5eed;
        let mut next = move || {
            seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (seed >> 33) as usize
        };

        for _ in 0..100 {
            let len = next() % 6;
            let text: Vec<&str> = (0..len).map(|_| WORDS[next() % WORDS.len()]).collect();
            let mut req = request(&text.join(" "));
            req.user_level = UserLevel::Advanced;
            if next() % 3 == 0 {
                req.requested_capability = Some(Capability::ALL[next() % Capability::ALL.len()]);
            }
            if next() % 4 == 0 {
                req.explicit_language = Some(Language::ALL[next() % Language::ALL.len()]);
            }

            let routed = CapabilityRouter::route(&req);
            assert!(Capability::ALL.contains(&routed));
            if let Some(explicit) = req.requested_capability {
                assert_eq!(routed, explicit);
            }
        }
    }
}
