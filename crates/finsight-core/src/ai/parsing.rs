//! JSON parsing helpers for AI backend responses
//!
//! Models often wrap the JSON payload in prose or markdown code fences.
//! These helpers strip that and decode the expected shape.

use std::sync::OnceLock;

use regex::Regex;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

use super::types::{normalize_category, AnomalyReport, InsightReport, SavingsStrategy};

fn fence_regex() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").ok())
        .as_ref()
}

fn truncate(s: &str) -> String {
    if s.chars().count() > 200 {
        format!("{}...", s.chars().take(200).collect::<String>())
    } else {
        s.to_string()
    }
}

/// Find the JSON object or array in a model response
pub fn extract_json(response: &str) -> Result<&str> {
    let mut text = response.trim();
    if let Some(inner) = fence_regex()
        .and_then(|re| re.captures(text))
        .and_then(|c| c.get(1))
    {
        text = inner.as_str().trim();
    }

    let object = text.find('{').zip(text.rfind('}'));
    let array = text.find('[').zip(text.rfind(']'));

    // Whichever structure opens first is the payload
    let span = match (object, array) {
        (Some(o), Some(a)) => Some(if a.0 < o.0 { a } else { o }),
        (o, a) => o.or(a),
    };

    match span {
        Some((s, e)) if s < e => Ok(&text[s..=e]),
        _ => Err(Error::InvalidData(format!(
            "No JSON found in AI response | Raw: {}",
            truncate(response.trim())
        ))),
    }
}

/// Extract and decode a JSON payload
pub fn parse_json<T: DeserializeOwned>(response: &str) -> Result<T> {
    let json_str = extract_json(response)?;
    serde_json::from_str(json_str).map_err(|e| {
        Error::InvalidData(format!(
            "Invalid JSON from AI: {} | Raw: {}",
            e,
            truncate(json_str)
        ))
    })
}

pub fn parse_insights(response: &str) -> Result<InsightReport> {
    let mut report: InsightReport = parse_json(response)?;
    report.health_score = report.health_score.clamp(0.0, 100.0);
    Ok(report)
}

pub fn parse_anomalies(response: &str) -> Result<AnomalyReport> {
    let mut report: AnomalyReport = parse_json(response)?;
    report.trust_score = report.trust_score.clamp(0.0, 100.0);
    Ok(report)
}

/// Accepts `{"strategies": [...]}` or a bare array
pub fn parse_strategies(response: &str) -> Result<Vec<SavingsStrategy>> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Strategies {
        Wrapped {
            #[serde(alias = "savingsStrategies")]
            strategies: Vec<SavingsStrategy>,
        },
        Bare(Vec<SavingsStrategy>),
    }

    Ok(match parse_json::<Strategies>(response)? {
        Strategies::Wrapped { strategies } => strategies,
        Strategies::Bare(strategies) => strategies,
    })
}

/// Category from `{"category": ...}` or a bare label
pub fn parse_category(response: &str) -> &'static str {
    #[derive(serde::Deserialize)]
    struct Category {
        category: String,
    }

    match parse_json::<Category>(response) {
        Ok(c) => normalize_category(&c.category),
        Err(_) => normalize_category(response),
    }
}
