//! Provider output parsing
//!
//! Adapters ask the LLM for a fenced JSON block. Whatever comes back is
//! parsed into a typed [`ParsedOutput`]; anything that does not fit the
//! expected shape becomes `Unparsed` with the raw text kept intact.

use crate::models::{FinancialPlan, ParsedOutput, RemittanceAnalysis};
use serde::Deserialize;
use serde_json::Value;

/// Pull the first JSON object out of model output.
/// Tries a ```json fence, then any ``` fence, then the outermost braces.
pub fn extract_json_block(text: &str) -> Option<Value> {
    let fenced = |marker: &str| -> Option<Value> {
        let start = text.find(marker)?;
        let after = &text[start + marker.len()..];
        let end = after.find("```")?;
        serde_json::from_str::<Value>(after[..end].trim())
            .ok()
            .filter(Value::is_object)
    };

    if let Some(v) = fenced("```json") {
        return Some(v);
    }
    if let Some(v) = fenced("```") {
        return Some(v);
    }

    let brace_start = text.find('{')?;
    let brace_end = text.rfind('}')?;
    if brace_end <= brace_start {
        return None;
    }
    serde_json::from_str::<Value>(&text[brace_start..=brace_end])
        .ok()
        .filter(Value::is_object)
}

fn unparsed(raw: &str) -> ParsedOutput {
    ParsedOutput::Unparsed {
        raw: raw.trim().to_string(),
    }
}

#[derive(Deserialize)]
struct TranslationShape {
    translation: String,
    explanation: Option<String>,
}

pub fn parse_translation(raw: &str) -> ParsedOutput {
    extract_json_block(raw)
        .and_then(|v| serde_json::from_value::<TranslationShape>(v).ok())
        .filter(|t| !t.translation.trim().is_empty())
        .map(|t| ParsedOutput::Translation {
            translation: t.translation,
            explanation: t.explanation.filter(|e| !e.trim().is_empty()),
        })
        .unwrap_or_else(|| unparsed(raw))
}

pub fn parse_financial_plan(raw: &str) -> ParsedOutput {
    extract_json_block(raw)
        .and_then(|v| serde_json::from_value::<FinancialPlan>(v).ok())
        .filter(|p| !p.summary.trim().is_empty())
        .map(ParsedOutput::FinancialPlan)
        .unwrap_or_else(|| unparsed(raw))
}

pub fn parse_remittance(raw: &str) -> ParsedOutput {
    extract_json_block(raw)
        .and_then(|v| serde_json::from_value::<RemittanceAnalysis>(v).ok())
        .filter(|a| !a.summary.trim().is_empty())
        .map(ParsedOutput::RemittanceAnalysis)
        .unwrap_or_else(|| unparsed(raw))
}

/// Free-form replies have no structure to check
pub fn parse_reply(raw: &str) -> ParsedOutput {
    ParsedOutput::Reply {
        text: raw.trim().to_string(),
    }
}

/// Human-readable text for a parsed output; this is what voice reads aloud
pub fn render_text(output: &ParsedOutput) -> String {
    match output {
        ParsedOutput::Translation {
            translation,
            explanation,
        } => match explanation {
            Some(explanation) => format!("{}\n\n{}", translation, explanation),
            None => translation.clone(),
        },
        ParsedOutput::FinancialPlan(plan) => {
            let mut out = plan.summary.clone();
            push_list(&mut out, &plan.recommendations);
            push_list(&mut out, &plan.milestones);
            out
        }
        ParsedOutput::RemittanceAnalysis(analysis) => {
            let mut out = analysis.summary.clone();
            if let Some(fee) = &analysis.estimated_fee {
                out.push_str(&format!("\nFees: {}", fee));
            }
            if let Some(delivery) = &analysis.estimated_delivery {
                out.push_str(&format!("\nDelivery: {}", delivery));
            }
            push_list(&mut out, &analysis.risks);
            out
        }
        ParsedOutput::Reply { text } => text.clone(),
        ParsedOutput::Unparsed { raw } => raw.clone(),
        ParsedOutput::Degraded { reason } => reason.clone(),
    }
}

fn push_list(out: &mut String, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push('\n');
    for item in items {
        out.push_str(&format!("\n- {}", item));
    }
}
