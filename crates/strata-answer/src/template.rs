//! Structural check of reasoner output against the output template.
//!
//! Diagnostics only: a non-compliant answer is still returned to the user,
//! the report just ends up in the logs.

use std::sync::OnceLock;

use regex::Regex;

use crate::prompts::PromptConfig;

pub const MIN_CLAIMS: usize = 3;
pub const MAX_CLAIMS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateReport {
    pub has_title: bool,
    /// Number of `TYPE:` lines, one per claim card.
    pub claim_count: usize,
    pub calibration_score: Option<u8>,
    /// Only meaningful when the score is 1.
    pub has_caution_note: bool,
}

impl TemplateReport {
    pub fn is_compliant(&self) -> bool {
        self.has_title
            && (MIN_CLAIMS..=MAX_CLAIMS).contains(&self.claim_count)
            && self.calibration_score.is_some()
            && (self.calibration_score != Some(1) || self.has_caution_note)
    }
}

fn calibration_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*CALIBRATION SCORE:\s*([123])\b").ok()).as_ref()
}

pub fn inspect_reasoner_output(text: &str, prompts: &PromptConfig) -> TemplateReport {
    let lines = || text.lines().map(str::trim_start);
    let has_title = lines().any(|l| l.starts_with("TITUL:") && !l["TITUL:".len()..].trim().is_empty());
    let claim_count = lines().filter(|l| l.starts_with("TYPE:")).count();
    let calibration_score = calibration_re()
        .and_then(|re| re.captures(text))
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok());
    let has_caution_note = text.contains(&prompts.calibration_caution_note);
    TemplateReport { has_title, claim_count, calibration_score, has_caution_note }
}
