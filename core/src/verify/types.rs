use serde::{Deserialize, Serialize};

use crate::plan::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Verified,
    /// Install succeeded but a smoke check failed.
    Unverified,
    /// Item did not succeed, so there is nothing to check.
    NotApplicable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    /// Command line, or `exists <path>` for artifact checks.
    pub check: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_status: Option<i32>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub output_tail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationEntry {
    pub language: Language,
    pub status: VerificationStatus,
    pub usable: bool,
    pub detail: String,
    #[serde(default)]
    pub checks: Vec<CheckOutcome>,
}

impl VerificationEntry {
    pub fn not_applicable(language: Language, detail: impl Into<String>) -> Self {
        Self {
            language,
            status: VerificationStatus::NotApplicable,
            usable: false,
            detail: detail.into(),
            checks: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// One entry per execution result, in plan order.
    pub entries: Vec<VerificationEntry>,
    pub health_score: f64,
}

impl VerificationReport {
    pub fn from_entries(entries: Vec<VerificationEntry>) -> Self {
        let health_score = health_score(&entries);
        Self {
            entries,
            health_score,
        }
    }

    pub fn get(&self, language: Language) -> Option<&VerificationEntry> {
        self.entries.iter().find(|e| e.language == language)
    }

    pub fn unverified(&self) -> impl Iterator<Item = &VerificationEntry> {
        self.entries
            .iter()
            .filter(|e| e.status == VerificationStatus::Unverified)
    }
}

/// Percent of verified entries among the ones that were checked. Zero when
/// nothing succeeded.
fn health_score(entries: &[VerificationEntry]) -> f64 {
    let checked = entries
        .iter()
        .filter(|e| e.status != VerificationStatus::NotApplicable)
        .count();
    if checked == 0 {
        return 0.0;
    }
    let verified = entries
        .iter()
        .filter(|e| e.status == VerificationStatus::Verified)
        .count();
    (verified as f64 / checked as f64 * 1000.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(language: Language, status: VerificationStatus) -> VerificationEntry {
        VerificationEntry {
            language,
            status,
            usable: status == VerificationStatus::Verified,
            detail: String::new(),
            checks: Vec::new(),
        }
    }

    #[test]
    fn health_counts_only_checked_entries() {
        let report = VerificationReport::from_entries(vec![
            entry(Language::Java, VerificationStatus::NotApplicable),
            entry(Language::Python, VerificationStatus::Verified),
            entry(Language::Node, VerificationStatus::Unverified),
        ]);
        assert_eq!(report.health_score, 50.0);
        assert_eq!(report.unverified().count(), 1);
        assert!(report.get(Language::Python).unwrap().usable);
    }

    #[test]
    fn health_rounds_to_one_decimal() {
        let report = VerificationReport::from_entries(vec![
            entry(Language::Java, VerificationStatus::Verified),
            entry(Language::Python, VerificationStatus::Verified),
            entry(Language::Node, VerificationStatus::Unverified),
        ]);
        assert_eq!(report.health_score, 66.7);
    }

    #[test]
    fn nothing_checked_scores_zero() {
        let report = VerificationReport::from_entries(vec![entry(
            Language::Node,
            VerificationStatus::NotApplicable,
        )]);
        assert_eq!(report.health_score, 0.0);
    }
}
