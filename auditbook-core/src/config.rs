use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::{PageColumn, RowStyleId};
use crate::sheets::VerticalAlign;

fn default_reference_base() -> String {
    "https://www.w3.org/TR/WCAG22/".to_string()
}

/// Everything one audit run is parameterized by. Passed explicitly to the
/// planner and layout compiler; nothing reads ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Client display name used in the generated workbook title.
    pub client: String,
    /// Target checklist version, e.g. "2.2".
    pub version: String,
    /// Target conformance level. A criterion is included when its level is
    /// a substring of this value, so "AAA" admits A, AA and AAA criteria.
    pub level: String,
    /// Audited pages, one results column each.
    #[serde(default)]
    pub pages: Vec<PageColumn>,
    /// Optional drive folder the created spreadsheet is moved into.
    #[serde(default)]
    pub folder_id: Option<String>,
    /// Base URL for guideline/criterion reference links.
    #[serde(default = "default_reference_base")]
    pub reference_base_url: String,
    /// Visual attributes per row style.
    #[serde(default)]
    pub styles: StyleTable,
}

impl AuditConfig {
    pub fn spreadsheet_title(&self) -> String {
        format!(
            "{} - WCAG {} {} Audit",
            self.client, self.version, self.level
        )
    }

    /// Load config from a YAML file.
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AuditConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid audit config: {path}"))?;
        Ok(config)
    }
}

/// Visual attributes of one row style. Unset attributes fall back to the
/// layout compiler's defaults (white background, black text, size 10, not
/// bold, bottom-aligned).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowStyle {
    #[serde(default)]
    pub background_color: Option<[u8; 3]>,
    #[serde(default)]
    pub text_color: Option<[u8; 3]>,
    #[serde(default)]
    pub font_size: Option<i64>,
    #[serde(default)]
    pub bold: Option<bool>,
    #[serde(default)]
    pub vertical_alignment: Option<VerticalAlign>,
}

/// Style attributes keyed by row style, with the built-in palette as the
/// default for any style a config file leaves out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleTable {
    #[serde(default = "default_header_style")]
    pub header: RowStyle,
    #[serde(default = "default_subheader_style")]
    pub subheader: RowStyle,
    #[serde(default = "default_guideline_style")]
    pub guideline: RowStyle,
    #[serde(default = "default_criterion_odd_style")]
    pub criterion_odd: RowStyle,
    #[serde(default = "default_criterion_even_style")]
    pub criterion_even: RowStyle,
}

impl StyleTable {
    pub fn get(&self, id: RowStyleId) -> &RowStyle {
        match id {
            RowStyleId::Header => &self.header,
            RowStyleId::Subheader => &self.subheader,
            RowStyleId::Guideline => &self.guideline,
            RowStyleId::CriterionOdd => &self.criterion_odd,
            RowStyleId::CriterionEven => &self.criterion_even,
        }
    }
}

impl Default for StyleTable {
    fn default() -> Self {
        Self {
            header: default_header_style(),
            subheader: default_subheader_style(),
            guideline: default_guideline_style(),
            criterion_odd: default_criterion_odd_style(),
            criterion_even: default_criterion_even_style(),
        }
    }
}

fn default_header_style() -> RowStyle {
    RowStyle {
        background_color: Some([28, 69, 135]),
        text_color: Some([255, 255, 255]),
        font_size: Some(11),
        bold: Some(true),
        vertical_alignment: Some(VerticalAlign::Middle),
    }
}

fn default_subheader_style() -> RowStyle {
    RowStyle {
        background_color: Some([17, 85, 204]),
        text_color: Some([255, 255, 255]),
        font_size: Some(11),
        bold: Some(true),
        vertical_alignment: None,
    }
}

fn default_guideline_style() -> RowStyle {
    RowStyle {
        background_color: Some([60, 120, 216]),
        text_color: Some([255, 255, 255]),
        font_size: Some(11),
        bold: None,
        vertical_alignment: Some(VerticalAlign::Top),
    }
}

fn default_criterion_odd_style() -> RowStyle {
    RowStyle {
        background_color: Some([201, 218, 248]),
        vertical_alignment: Some(VerticalAlign::Top),
        ..RowStyle::default()
    }
}

fn default_criterion_even_style() -> RowStyle {
    RowStyle {
        vertical_alignment: Some(VerticalAlign::Top),
        ..RowStyle::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spreadsheet_title_includes_client_version_level() {
        let config = AuditConfig {
            client: "Acme".to_string(),
            version: "2.2".to_string(),
            level: "AA".to_string(),
            pages: Vec::new(),
            folder_id: None,
            reference_base_url: default_reference_base(),
            styles: StyleTable::default(),
        };
        assert_eq!(config.spreadsheet_title(), "Acme - WCAG 2.2 AA Audit");
    }

    #[test]
    fn minimal_yaml_fills_defaults() {
        let yaml = r#"
client: Acme
version: "2.2"
level: AAA
pages:
  - name: Home
    url: https://example.com
"#;
        let config: AuditConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.pages.len(), 1);
        assert!(config.folder_id.is_none());
        assert_eq!(config.reference_base_url, "https://www.w3.org/TR/WCAG22/");
        assert_eq!(config.styles.header.font_size, Some(11));
        assert_eq!(config.styles.criterion_even.background_color, None);
    }

    #[test]
    fn partial_style_table_keeps_builtin_rest() {
        let yaml = r#"
client: Acme
version: "2.2"
level: A
styles:
  header:
    background_color: [0, 0, 0]
"#;
        let config: AuditConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.styles.header.background_color, Some([0, 0, 0]));
        // Styles not named in the file keep the built-in palette.
        assert_eq!(
            config.styles.guideline.background_color,
            Some([60, 120, 216])
        );
    }
}
