//! Layout compilation: one principle's planned rows into the positioned
//! mutation requests that render its sheet.
//!
//! Pure and deterministic: same plan and config always produce the same
//! requests. The sheet id is the only remote-assigned input, obtained by
//! the workbook orchestration before this stage runs.

use serde::Serialize;

use crate::config::{AuditConfig, RowStyle};
use crate::model::SheetPlan;
use crate::sheets::{
    AddConditionalFormatRuleRequest, BooleanCondition, BooleanRule, CellData, CellFormat, Color,
    ConditionType, ConditionValue, ConditionalFormatRule, DataValidationRule, Dimension,
    DimensionProperties, DimensionRange, GridProperties, GridRange, MergeCellsRequest, MergeType,
    RepeatCellRequest, Request, SetDataValidationRequest, SheetProperties, TextFormat,
    UpdateDimensionPropertiesRequest, UpdateSheetPropertiesRequest, VerticalAlign, WrapStrategy,
};

/// Pixel widths for the three fixed columns (criteria, description, level).
pub const FIXED_COLUMN_WIDTHS: [i64; 3] = [194, 446, 72];

/// Pixel width of every page-result column.
pub const PAGE_COLUMN_WIDTH: i64 = 289;

/// Dropdown options offered in every page-result cell.
pub const VERDICT_OPTIONS: [&str; 5] =
    ["PASSED", "FAILED", "CANNOT TELL", "NOT PRESENT", "NOT CHECKED"];

/// Conditional-format palette for one verdict value.
#[derive(Debug, Clone, Copy)]
pub struct VerdictPalette {
    pub value: &'static str,
    pub text_color: [u8; 3],
    pub background_color: [u8; 3],
}

/// Verdict palettes in rule emission order. NOT PRESENT renders with the
/// PASSED palette.
pub const VERDICT_PALETTES: [VerdictPalette; 4] = [
    VerdictPalette {
        value: "FAILED",
        text_color: [177, 2, 2],
        background_color: [254, 201, 195],
    },
    VerdictPalette {
        value: "PASSED",
        text_color: [17, 115, 75],
        background_color: [206, 234, 183],
    },
    VerdictPalette {
        value: "CANNOT TELL",
        text_color: [71, 56, 33],
        background_color: [255, 255, 155],
    },
    VerdictPalette {
        value: "NOT PRESENT",
        text_color: [17, 115, 75],
        background_color: [206, 234, 183],
    },
];

/// Count of rows and columns frozen at the top-left of every sheet.
const FROZEN_ROWS: i64 = 2;
const FROZEN_COLUMNS: i64 = 2;

/// The full set of mutations for one sheet, grouped the way the executor
/// issues batches. Within each group the emission order is the issue
/// order.
#[derive(Debug, Clone, Serialize)]
pub struct SheetLayout {
    /// One repeatCell per row, top to bottom.
    pub row_formats: Vec<Request>,
    /// One dropdown per criterion row.
    pub validations: Vec<Request>,
    /// One batch per verdict palette, each holding one rule per criterion
    /// row.
    pub verdict_formats: Vec<Vec<Request>>,
    /// One width update per column, left to right.
    pub column_widths: Vec<Request>,
    pub freeze: Request,
    pub merge: Request,
}

/// Compile one planned sheet into its mutation requests.
pub fn compile_sheet(sheet_id: i64, plan: &SheetPlan, config: &AuditConfig) -> SheetLayout {
    let page_count = config.pages.len() as i64;
    let criterion_rows = plan.criterion_row_indices();

    let row_formats = plan
        .rows
        .iter()
        .enumerate()
        .map(|(row, planned)| row_format(sheet_id, row as i64, config.styles.get(planned.style)))
        .collect();

    let validations = criterion_rows
        .iter()
        .map(|&row| validation(sheet_id, row, page_count))
        .collect();

    let verdict_formats = VERDICT_PALETTES
        .iter()
        .map(|palette| {
            criterion_rows
                .iter()
                .map(|&row| verdict_format(sheet_id, row, page_count, palette))
                .collect()
        })
        .collect();

    SheetLayout {
        row_formats,
        validations,
        verdict_formats,
        column_widths: column_widths(sheet_id, config.pages.len()),
        freeze: freeze_panes(sheet_id),
        merge: merge_title(sheet_id),
    }
}

/// Style-fill for one full-width row. Attributes a style leaves unset fall
/// back to white background, black text, size 10, not bold, bottom
/// aligned; every cell wraps.
fn row_format(sheet_id: i64, row: i64, style: &RowStyle) -> Request {
    Request::RepeatCell(RepeatCellRequest {
        range: GridRange::rows(sheet_id, row, row + 1),
        cell: CellData {
            user_entered_format: CellFormat {
                background_color: Some(Color::from_rgb(
                    style.background_color.unwrap_or([255, 255, 255]),
                )),
                vertical_alignment: Some(
                    style.vertical_alignment.unwrap_or(VerticalAlign::Bottom),
                ),
                text_format: Some(TextFormat {
                    foreground_color: Some(Color::from_rgb(style.text_color.unwrap_or([0, 0, 0]))),
                    font_size: Some(style.font_size.unwrap_or(10)),
                    bold: Some(style.bold.unwrap_or(false)),
                }),
                wrap_strategy: Some(WrapStrategy::Wrap),
            },
        },
        fields: "userEnteredFormat(backgroundColor,textFormat,verticalAlignment,wrapStrategy)"
            .to_string(),
    })
}

/// The page-result cells sit immediately after the three fixed columns.
fn result_columns(sheet_id: i64, row: i64, page_count: i64) -> GridRange {
    GridRange {
        sheet_id,
        start_row_index: row,
        end_row_index: row + 1,
        start_column_index: Some(3),
        end_column_index: Some(3 + page_count),
    }
}

/// Strict one-of-list dropdown over a criterion row's result cells.
fn validation(sheet_id: i64, row: i64, page_count: i64) -> Request {
    Request::SetDataValidation(SetDataValidationRequest {
        range: result_columns(sheet_id, row, page_count),
        rule: DataValidationRule {
            condition: BooleanCondition {
                condition_type: ConditionType::OneOfList,
                values: VERDICT_OPTIONS
                    .iter()
                    .map(|value| ConditionValue {
                        user_entered_value: value.to_string(),
                    })
                    .collect(),
            },
            show_custom_ui: true,
            strict: true,
        },
    })
}

/// Text-contains color rule for one verdict over a criterion row's result
/// cells.
fn verdict_format(sheet_id: i64, row: i64, page_count: i64, palette: &VerdictPalette) -> Request {
    Request::AddConditionalFormatRule(AddConditionalFormatRuleRequest {
        rule: ConditionalFormatRule {
            ranges: vec![result_columns(sheet_id, row, page_count)],
            boolean_rule: BooleanRule {
                condition: BooleanCondition {
                    condition_type: ConditionType::TextContains,
                    values: vec![ConditionValue {
                        user_entered_value: palette.value.to_string(),
                    }],
                },
                format: CellFormat {
                    background_color: Some(Color::from_rgb(palette.background_color)),
                    text_format: Some(TextFormat {
                        foreground_color: Some(Color::from_rgb(palette.text_color)),
                        ..TextFormat::default()
                    }),
                    ..CellFormat::default()
                },
            },
        },
        index: 0,
    })
}

/// Fixed widths for the three leading columns, then one width per page
/// column, in column order.
fn column_widths(sheet_id: i64, page_count: usize) -> Vec<Request> {
    FIXED_COLUMN_WIDTHS
        .iter()
        .copied()
        .chain(std::iter::repeat(PAGE_COLUMN_WIDTH).take(page_count))
        .enumerate()
        .map(|(column, width)| {
            Request::UpdateDimensionProperties(UpdateDimensionPropertiesRequest {
                range: DimensionRange {
                    sheet_id,
                    dimension: Dimension::Columns,
                    start_index: column as i64,
                    end_index: column as i64 + 1,
                },
                properties: DimensionProperties { pixel_size: width },
                fields: "pixelSize".to_string(),
            })
        })
        .collect()
}

/// Keep the title/header rows and the criteria/description columns in
/// view while scrolling.
fn freeze_panes(sheet_id: i64) -> Request {
    Request::UpdateSheetProperties(UpdateSheetPropertiesRequest {
        properties: SheetProperties {
            sheet_id: Some(sheet_id),
            grid_properties: Some(GridProperties {
                frozen_row_count: Some(FROZEN_ROWS),
                frozen_column_count: Some(FROZEN_COLUMNS),
            }),
            ..SheetProperties::default()
        },
        fields: "gridProperties.frozenRowCount,gridProperties.frozenColumnCount".to_string(),
    })
}

/// The title row's first two columns become one merged cell.
fn merge_title(sheet_id: i64) -> Request {
    Request::MergeCells(MergeCellsRequest {
        range: GridRange {
            sheet_id,
            start_row_index: 0,
            end_row_index: 1,
            start_column_index: Some(0),
            end_column_index: Some(2),
        },
        merge_type: MergeType::MergeAll,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PageColumn, PlannedRow, RowKind, RowStyleId};
    use serde_json::json;

    fn plan_with(styles: &[RowStyleId]) -> SheetPlan {
        SheetPlan {
            sheet_title: "1. Perceivable".to_string(),
            rows: styles
                .iter()
                .map(|&style| PlannedRow {
                    kind: match style {
                        RowStyleId::Header => RowKind::Title,
                        RowStyleId::Subheader => RowKind::ColumnHeader,
                        RowStyleId::Guideline => RowKind::Guideline,
                        _ => RowKind::Criterion,
                    },
                    style,
                    cells: Vec::new(),
                })
                .collect(),
        }
    }

    fn config(page_count: usize) -> AuditConfig {
        let mut config: AuditConfig =
            serde_yaml::from_str("client: Acme\nversion: \"2.2\"\nlevel: AAA\n").unwrap();
        config.pages = (0..page_count)
            .map(|i| PageColumn {
                name: format!("Page {i}"),
                url: format!("https://example.com/{i}"),
            })
            .collect();
        config
    }

    fn standard_plan() -> SheetPlan {
        plan_with(&[
            RowStyleId::Header,
            RowStyleId::Subheader,
            RowStyleId::Guideline,
            RowStyleId::CriterionOdd,
            RowStyleId::CriterionEven,
        ])
    }

    #[test]
    fn every_row_gets_a_format_request() {
        let layout = compile_sheet(5, &standard_plan(), &config(2));
        assert_eq!(layout.row_formats.len(), 5);
    }

    #[test]
    fn header_row_format_matches_wire_shape() {
        let layout = compile_sheet(5, &standard_plan(), &config(2));
        assert_eq!(
            serde_json::to_value(&layout.row_formats[0]).unwrap(),
            json!({
                "repeatCell": {
                    "range": {"sheetId": 5, "startRowIndex": 0, "endRowIndex": 1},
                    "cell": {
                        "userEnteredFormat": {
                            "backgroundColor": {
                                "red": 28.0 / 255.0,
                                "green": 69.0 / 255.0,
                                "blue": 135.0 / 255.0
                            },
                            "verticalAlignment": "MIDDLE",
                            "textFormat": {
                                "foregroundColor": {"red": 1.0, "green": 1.0, "blue": 1.0},
                                "fontSize": 11,
                                "bold": true
                            },
                            "wrapStrategy": "WRAP"
                        }
                    },
                    "fields": "userEnteredFormat(backgroundColor,textFormat,verticalAlignment,wrapStrategy)"
                }
            })
        );
    }

    #[test]
    fn unset_style_attributes_fall_back_to_defaults() {
        let layout = compile_sheet(5, &standard_plan(), &config(2));
        // criterionEven sets only vertical alignment.
        assert_eq!(
            serde_json::to_value(&layout.row_formats[4]).unwrap(),
            json!({
                "repeatCell": {
                    "range": {"sheetId": 5, "startRowIndex": 4, "endRowIndex": 5},
                    "cell": {
                        "userEnteredFormat": {
                            "backgroundColor": {"red": 1.0, "green": 1.0, "blue": 1.0},
                            "verticalAlignment": "TOP",
                            "textFormat": {
                                "foregroundColor": {"red": 0.0, "green": 0.0, "blue": 0.0},
                                "fontSize": 10,
                                "bold": false
                            },
                            "wrapStrategy": "WRAP"
                        }
                    },
                    "fields": "userEnteredFormat(backgroundColor,textFormat,verticalAlignment,wrapStrategy)"
                }
            })
        );
    }

    #[test]
    fn only_criterion_rows_get_dropdowns() {
        let layout = compile_sheet(5, &standard_plan(), &config(2));
        assert_eq!(layout.validations.len(), 2);

        assert_eq!(
            serde_json::to_value(&layout.validations[0]).unwrap(),
            json!({
                "setDataValidation": {
                    "range": {
                        "sheetId": 5,
                        "startRowIndex": 3,
                        "endRowIndex": 4,
                        "startColumnIndex": 3,
                        "endColumnIndex": 5
                    },
                    "rule": {
                        "condition": {
                            "type": "ONE_OF_LIST",
                            "values": [
                                {"userEnteredValue": "PASSED"},
                                {"userEnteredValue": "FAILED"},
                                {"userEnteredValue": "CANNOT TELL"},
                                {"userEnteredValue": "NOT PRESENT"},
                                {"userEnteredValue": "NOT CHECKED"}
                            ]
                        },
                        "showCustomUi": true,
                        "strict": true
                    }
                }
            })
        );
    }

    #[test]
    fn verdict_batches_follow_palette_order() {
        let layout = compile_sheet(5, &standard_plan(), &config(1));
        assert_eq!(layout.verdict_formats.len(), 4);
        for batch in &layout.verdict_formats {
            assert_eq!(batch.len(), 2); // one rule per criterion row
        }

        let values: Vec<String> = layout
            .verdict_formats
            .iter()
            .map(|batch| {
                let json = serde_json::to_value(&batch[0]).unwrap();
                json["addConditionalFormatRule"]["rule"]["booleanRule"]["condition"]["values"][0]
                    ["userEnteredValue"]
                    .as_str()
                    .unwrap()
                    .to_string()
            })
            .collect();
        assert_eq!(values, vec!["FAILED", "PASSED", "CANNOT TELL", "NOT PRESENT"]);
    }

    #[test]
    fn not_present_reuses_passed_palette() {
        let passed = &VERDICT_PALETTES[1];
        let not_present = &VERDICT_PALETTES[3];
        assert_eq!(passed.value, "PASSED");
        assert_eq!(not_present.value, "NOT PRESENT");
        assert_eq!(not_present.text_color, passed.text_color);
        assert_eq!(not_present.background_color, passed.background_color);
    }

    #[test]
    fn verdict_rule_matches_wire_shape() {
        let layout = compile_sheet(9, &plan_with(&[RowStyleId::CriterionOdd]), &config(1));
        assert_eq!(
            serde_json::to_value(&layout.verdict_formats[0][0]).unwrap(),
            json!({
                "addConditionalFormatRule": {
                    "rule": {
                        "ranges": [{
                            "sheetId": 9,
                            "startRowIndex": 0,
                            "endRowIndex": 1,
                            "startColumnIndex": 3,
                            "endColumnIndex": 4
                        }],
                        "booleanRule": {
                            "condition": {
                                "type": "TEXT_CONTAINS",
                                "values": [{"userEnteredValue": "FAILED"}]
                            },
                            "format": {
                                "backgroundColor": {
                                    "red": 254.0 / 255.0,
                                    "green": 201.0 / 255.0,
                                    "blue": 195.0 / 255.0
                                },
                                "textFormat": {
                                    "foregroundColor": {
                                        "red": 177.0 / 255.0,
                                        "green": 2.0 / 255.0,
                                        "blue": 2.0 / 255.0
                                    }
                                }
                            }
                        }
                    },
                    "index": 0
                }
            })
        );
    }

    #[test]
    fn column_widths_cover_fixed_then_page_columns() {
        let layout = compile_sheet(5, &standard_plan(), &config(3));
        assert_eq!(layout.column_widths.len(), 6);

        let widths: Vec<i64> = layout
            .column_widths
            .iter()
            .map(|request| {
                let json = serde_json::to_value(request).unwrap();
                json["updateDimensionProperties"]["properties"]["pixelSize"]
                    .as_i64()
                    .unwrap()
            })
            .collect();
        assert_eq!(widths, vec![194, 446, 72, 289, 289, 289]);

        // Each request addresses exactly one column, in order.
        let first = serde_json::to_value(&layout.column_widths[0]).unwrap();
        assert_eq!(
            first["updateDimensionProperties"]["range"],
            json!({"sheetId": 5, "dimension": "COLUMNS", "startIndex": 0, "endIndex": 1})
        );
    }

    #[test]
    fn freeze_and_merge_match_wire_shape() {
        let layout = compile_sheet(5, &standard_plan(), &config(2));
        assert_eq!(
            serde_json::to_value(&layout.freeze).unwrap(),
            json!({
                "updateSheetProperties": {
                    "properties": {
                        "sheetId": 5,
                        "gridProperties": {"frozenRowCount": 2, "frozenColumnCount": 2}
                    },
                    "fields": "gridProperties.frozenRowCount,gridProperties.frozenColumnCount"
                }
            })
        );
        assert_eq!(
            serde_json::to_value(&layout.merge).unwrap(),
            json!({
                "mergeCells": {
                    "range": {
                        "sheetId": 5,
                        "startRowIndex": 0,
                        "endRowIndex": 1,
                        "startColumnIndex": 0,
                        "endColumnIndex": 2
                    },
                    "mergeType": "MERGE_ALL"
                }
            })
        );
    }

    #[test]
    fn compile_is_deterministic() {
        let plan = standard_plan();
        let config = config(2);
        let a = serde_json::to_value(compile_sheet(5, &plan, &config)).unwrap();
        let b = serde_json::to_value(compile_sheet(5, &plan, &config)).unwrap();
        assert_eq!(a, b);
    }
}
