//! Workbook orchestration: drives the client through the full build.
//!
//! Strictly sequential. Every id-addressed batch for a sheet depends on
//! the sheet id returned by the addSheet call immediately before it, so
//! sheet construction is an explicit two-phase protocol: create the
//! sheet, then issue everything that references its id. A failed call
//! aborts the run and leaves the spreadsheet partially built; there is
//! no retry and no rollback.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::client::SpreadsheetApi;
use crate::config::AuditConfig;
use crate::layout::compile_sheet;
use crate::model::{Checklist, SheetPlan};
use crate::planner;
use crate::sheets::{DeleteSheetRequest, Request};

/// The service seeds every new spreadsheet with one empty sheet under
/// this id; it is deleted once the real sheets exist.
const DEFAULT_SHEET_ID: i64 = 0;

/// Summary of one published workbook.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub spreadsheet_id: String,
    pub spreadsheet_url: Option<String>,
    pub sheets: Vec<SheetReport>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SheetReport {
    pub title: String,
    pub sheet_id: i64,
    pub rows: usize,
    pub criteria: usize,
}

pub struct WorkbookBuilder<'a, C: SpreadsheetApi> {
    client: &'a mut C,
    config: &'a AuditConfig,
}

impl<'a, C: SpreadsheetApi> WorkbookBuilder<'a, C> {
    pub fn new(client: &'a mut C, config: &'a AuditConfig) -> Self {
        Self { client, config }
    }

    /// Plan, create and render the whole workbook.
    pub fn publish(&mut self, checklist: &Checklist) -> Result<RunReport> {
        // Fails fast on malformed input, before the first remote call.
        let plans = planner::plan_workbook(checklist, self.config)?;

        let title = self.config.spreadsheet_title();
        println!("📄 Creating spreadsheet: {title}");
        let handle = self
            .client
            .create_spreadsheet(&title)
            .context("creating spreadsheet")?;

        if let Some(folder_id) = &self.config.folder_id {
            println!("📁 Moving spreadsheet into folder {folder_id}");
            self.client
                .move_to_folder(&handle.spreadsheet_id, folder_id)
                .context("moving spreadsheet into folder")?;
        }

        let mut sheets = Vec::new();
        for plan in &plans {
            sheets.push(self.publish_sheet(&handle.spreadsheet_id, plan)?);
        }

        println!("🧹 Removing default sheet");
        self.client
            .batch_update(
                &handle.spreadsheet_id,
                vec![Request::DeleteSheet(DeleteSheetRequest {
                    sheet_id: DEFAULT_SHEET_ID,
                })],
            )
            .context("deleting default sheet")?;

        println!("✅ Workbook complete: {} sheets", sheets.len());
        Ok(RunReport {
            spreadsheet_id: handle.spreadsheet_id,
            spreadsheet_url: handle.spreadsheet_url,
            sheets,
            created_at: Utc::now(),
        })
    }

    fn publish_sheet(&mut self, spreadsheet_id: &str, plan: &SheetPlan) -> Result<SheetReport> {
        println!(
            "📋 Building sheet: {} ({} rows)",
            plan.sheet_title,
            plan.rows.len()
        );

        // Phase 1: create the sheet and learn its remote-assigned id.
        let sheet_id = self
            .client
            .add_sheet(spreadsheet_id, &plan.sheet_title)
            .with_context(|| format!("adding sheet '{}'", plan.sheet_title))?;

        // Phase 2: every remaining operation addresses that id.
        let layout = compile_sheet(sheet_id, plan, self.config);

        self.client
            .batch_update(spreadsheet_id, layout.row_formats)
            .context("styling rows")?;

        let values: Vec<Vec<String>> = plan.rows.iter().map(|row| row.cells.clone()).collect();
        let range = format!("'{}'!A1", plan.sheet_title);
        self.client
            .update_values(spreadsheet_id, &range, values)
            .context("inserting sheet values")?;

        // A sheet whose guidelines all came up empty has no criterion
        // rows; the service rejects empty request lists.
        if !layout.validations.is_empty() {
            self.client
                .batch_update(spreadsheet_id, layout.validations)
                .context("adding result dropdowns")?;
        }
        for batch in layout.verdict_formats {
            if batch.is_empty() {
                continue;
            }
            self.client
                .batch_update(spreadsheet_id, batch)
                .context("adding verdict color rules")?;
        }

        self.client
            .batch_update(spreadsheet_id, layout.column_widths)
            .context("sizing columns")?;
        self.client
            .batch_update(spreadsheet_id, vec![layout.freeze])
            .context("freezing header rows and columns")?;
        self.client
            .batch_update(spreadsheet_id, vec![layout.merge])
            .context("merging the title cell")?;

        let criteria = plan
            .rows
            .iter()
            .filter(|row| row.style.is_criterion())
            .count();
        Ok(SheetReport {
            title: plan.sheet_title.clone(),
            sheet_id,
            rows: plan.rows.len(),
            criteria,
        })
    }
}
