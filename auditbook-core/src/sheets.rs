//! Typed subset of the spreadsheet service's v4 mutation API.
//!
//! Each struct serializes to the exact wire shape the service expects:
//! camelCase keys, externally tagged request objects, half-open 0-based
//! row/column ranges, and colors on a 0.0–1.0 float scale.

use serde::{Deserialize, Serialize};

/// RGB color in the service's 0.0–1.0 float scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl Color {
    /// Convert an 8-bit channel triple to the float scale.
    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        Self {
            red: f64::from(rgb[0]) / 255.0,
            green: f64::from(rgb[1]) / 255.0,
            blue: f64::from(rgb[2]) / 255.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerticalAlign {
    Top,
    Middle,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WrapStrategy {
    OverflowCell,
    LegacyWrap,
    Clip,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConditionType {
    OneOfList,
    TextContains,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Dimension {
    Rows,
    Columns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MergeType {
    MergeAll,
    MergeColumns,
    MergeRows,
}

/// Half-open cell range addressed by 0-based indices. Column bounds are
/// optional: a row-styling range spans the full sheet width by omitting
/// them entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridRange {
    pub sheet_id: i64,
    pub start_row_index: i64,
    pub end_row_index: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_column_index: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_column_index: Option<i64>,
}

impl GridRange {
    /// Full-width range covering rows `start..end`.
    pub fn rows(sheet_id: i64, start: i64, end: i64) -> Self {
        Self {
            sheet_id,
            start_row_index: start,
            end_row_index: end,
            start_column_index: None,
            end_column_index: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TextFormat {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreground_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CellFormat {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_alignment: Option<VerticalAlign>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_format: Option<TextFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrap_strategy: Option<WrapStrategy>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellData {
    pub user_entered_format: CellFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeatCellRequest {
    pub range: GridRange,
    pub cell: CellData,
    /// Field mask naming the format properties this request overwrites.
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionValue {
    pub user_entered_value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanCondition {
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    pub values: Vec<ConditionValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataValidationRule {
    pub condition: BooleanCondition,
    pub show_custom_ui: bool,
    pub strict: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDataValidationRequest {
    pub range: GridRange,
    pub rule: DataValidationRule,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanRule {
    pub condition: BooleanCondition,
    pub format: CellFormat,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalFormatRule {
    pub ranges: Vec<GridRange>,
    pub boolean_rule: BooleanRule,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddConditionalFormatRuleRequest {
    pub rule: ConditionalFormatRule,
    /// Position in the sheet's rule list; rules evaluate in list order,
    /// first match wins.
    pub index: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionRange {
    pub sheet_id: i64,
    pub dimension: Dimension,
    pub start_index: i64,
    pub end_index: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DimensionProperties {
    pub pixel_size: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDimensionPropertiesRequest {
    pub range: DimensionRange,
    pub properties: DimensionProperties,
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GridProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frozen_row_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frozen_column_count: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_properties: Option<GridProperties>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSheetPropertiesRequest {
    pub properties: SheetProperties,
    pub fields: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSheetRequest {
    pub properties: SheetProperties,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSheetRequest {
    pub sheet_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeCellsRequest {
    pub range: GridRange,
    pub merge_type: MergeType,
}

/// One mutation inside a batchUpdate body. Externally tagged so each
/// variant serializes as the service's single-key request object, e.g.
/// `{"repeatCell": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Request {
    RepeatCell(RepeatCellRequest),
    SetDataValidation(SetDataValidationRequest),
    AddConditionalFormatRule(AddConditionalFormatRuleRequest),
    UpdateDimensionProperties(UpdateDimensionPropertiesRequest),
    UpdateSheetProperties(UpdateSheetPropertiesRequest),
    MergeCells(MergeCellsRequest),
    AddSheet(AddSheetRequest),
    DeleteSheet(DeleteSheetRequest),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchUpdateBody {
    pub requests: Vec<Request>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueInputOption {
    Raw,
    /// Values are parsed as if typed by a user, so `=HYPERLINK(...)`
    /// formulas evaluate instead of landing as literal text.
    UserEntered,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    pub range: String,
    pub values: Vec<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchValuesBody {
    pub data: Vec<ValueRange>,
    pub value_input_option: ValueInputOption,
}

/// Identity of a created spreadsheet, as returned by the create call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetHandle {
    pub spreadsheet_id: String,
    #[serde(default)]
    pub spreadsheet_url: Option<String>,
}
