use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ChecklistError;

// ===== CHECKLIST INPUT MODEL =====
// Mirrors the nested checklist document: principles contain guidelines,
// guidelines contain success criteria, criteria optionally carry detail
// groups whose items are folded into the criterion body text.
// Loaded once per run and treated as read-only from then on.

/// Top-level checklist document.
#[derive(Debug, Clone, Deserialize)]
pub struct Checklist {
    pub principles: Vec<Principle>,
}

impl Checklist {
    /// Read a checklist document from a JSON file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ChecklistError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Principle {
    pub num: String,
    pub handle: String,
    pub title: String,
    pub versions: Vec<String>,
    pub guidelines: Vec<Guideline>,
}

impl Principle {
    pub fn applies_to(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v == version)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Guideline {
    pub num: String,
    pub handle: String,
    pub title: String,
    pub versions: Vec<String>,
    #[serde(rename = "successcriteria")]
    pub success_criteria: Vec<SuccessCriterion>,
}

impl Guideline {
    pub fn applies_to(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v == version)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuccessCriterion {
    pub num: String,
    pub handle: String,
    pub title: String,
    /// Checklist versions this criterion appears in; the first entry is the
    /// version it was introduced in and is what the level cell displays.
    pub versions: Vec<String>,
    /// Conformance level: "A", "AA" or "AAA".
    pub level: String,
    #[serde(default)]
    pub details: Vec<Detail>,
}

impl SuccessCriterion {
    pub fn applies_to(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v == version)
    }
}

/// A group of detail items under a success criterion.
#[derive(Debug, Clone, Deserialize)]
pub struct Detail {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub items: Vec<DetailItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetailItem {
    pub handle: String,
    pub text: String,
}

// ===== PLANNER OUTPUT MODEL =====

/// One audited page; contributes one results column to each sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageColumn {
    pub name: String,
    pub url: String,
}

/// One planned sheet: everything the layout compiler needs to render a
/// single principle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetPlan {
    /// Sheet tab title, `"<num>. <handle>"`.
    pub sheet_title: String,
    pub rows: Vec<PlannedRow>,
}

impl SheetPlan {
    /// 0-based indices of the rows that carry a criterion.
    pub fn criterion_row_indices(&self) -> Vec<i64> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.style.is_criterion())
            .map(|(index, _)| index as i64)
            .collect()
    }
}

/// A planner output unit: literal cell values plus a style tag.
/// Never mutated after planning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedRow {
    pub kind: RowKind,
    pub style: RowStyleId,
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowKind {
    Title,
    ColumnHeader,
    Guideline,
    Criterion,
}

/// Named visual category a row is styled with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStyleId {
    Header,
    Subheader,
    Guideline,
    CriterionOdd,
    CriterionEven,
}

impl RowStyleId {
    /// Criterion rows are the only ones that receive dropdowns and
    /// verdict color rules.
    pub fn is_criterion(self) -> bool {
        matches!(self, RowStyleId::CriterionOdd | RowStyleId::CriterionEven)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checklist_deserializes_nested_document() {
        let json = r#"{
            "principles": [{
                "num": "1",
                "handle": "Perceivable",
                "title": "Information must be presentable",
                "versions": ["2.0", "2.1", "2.2"],
                "guidelines": [{
                    "num": "1.1",
                    "handle": "Text Alternatives",
                    "title": "Provide text alternatives",
                    "versions": ["2.0", "2.1", "2.2"],
                    "successcriteria": [{
                        "num": "1.1.1",
                        "handle": "Non-text Content",
                        "title": "All non-text content has a text alternative",
                        "versions": ["2.0"],
                        "level": "A",
                        "details": [{
                            "type": "ulist",
                            "items": [{"handle": "Controls", "text": "Buttons have names"}]
                        }]
                    }]
                }]
            }]
        }"#;

        let checklist: Checklist = serde_json::from_str(json).unwrap();
        assert_eq!(checklist.principles.len(), 1);
        let criterion = &checklist.principles[0].guidelines[0].success_criteria[0];
        assert_eq!(criterion.level, "A");
        assert_eq!(criterion.details[0].items[0].handle, "Controls");
        assert_eq!(criterion.details[0].kind.as_deref(), Some("ulist"));
    }

    #[test]
    fn details_default_to_empty() {
        let json = r#"{
            "num": "1.4.1",
            "handle": "Use of Color",
            "title": "Color is not the only visual means",
            "versions": ["2.0"],
            "level": "A"
        }"#;
        let criterion: SuccessCriterion = serde_json::from_str(json).unwrap();
        assert!(criterion.details.is_empty());
    }

    #[test]
    fn applies_to_matches_exact_version() {
        let json = r#"{
            "num": "2.4.11",
            "handle": "Focus Not Obscured",
            "title": "Focused components are not hidden",
            "versions": ["2.2"],
            "level": "AA"
        }"#;
        let criterion: SuccessCriterion = serde_json::from_str(json).unwrap();
        assert!(criterion.applies_to("2.2"));
        assert!(!criterion.applies_to("2.0"));
    }
}
