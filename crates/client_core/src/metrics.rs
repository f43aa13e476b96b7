//! Dashboard metrics derived from a raw analysis payload.
//!
//! Recomputed on every render; inputs are one document's risk text and
//! extraction map, so there is nothing worth caching.

use std::fmt;

use serde::{Deserialize, Serialize};
use shared::protocol::AnalysisResult;

/// Risk counts strictly above this are `HighRisk`.
pub const HIGH_RISK_ABOVE: usize = 5;
/// Risk counts strictly above this (and not high risk) are `NeedsReview`.
pub const NEEDS_REVIEW_ABOVE: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Verdict {
    #[default]
    #[serde(rename = "Safe")]
    Safe,
    #[serde(rename = "Needs Review")]
    NeedsReview,
    #[serde(rename = "High Risk")]
    HighRisk,
}

impl Verdict {
    pub fn from_risk_count(risk_count: usize) -> Self {
        if risk_count > HIGH_RISK_ABOVE {
            Self::HighRisk
        } else if risk_count > NEEDS_REVIEW_ABOVE {
            Self::NeedsReview
        } else {
            Self::Safe
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Safe => "Safe",
            Self::NeedsReview => "Needs Review",
            Self::HighRisk => "High Risk",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub confidence: f64,
    pub risk_count: usize,
    pub clause_count: usize,
    pub verdict: Verdict,
}

pub fn count_risks(risks: &str) -> usize {
    risks.lines().filter(|line| !line.trim().is_empty()).count()
}

pub fn derive(analysis: Option<&AnalysisResult>) -> DerivedMetrics {
    let Some(analysis) = analysis else {
        return DerivedMetrics::default();
    };

    let risk_count = count_risks(&analysis.risks);
    DerivedMetrics {
        confidence: analysis.confidence(),
        risk_count,
        clause_count: analysis.extraction.len(),
        verdict: Verdict::from_risk_count(risk_count),
    }
}

#[cfg(test)]
#[path = "tests/metrics_tests.rs"]
mod tests;
