//! Row planning: walk the checklist, filter by target version and
//! conformance level, and emit each applicable principle as an ordered
//! list of rows with style tags.
//!
//! Planning is pure: no remote calls, no mutation of the checklist. The
//! layout compiler consumes the output untouched.

use crate::config::AuditConfig;
use crate::error::ChecklistError;
use crate::model::{
    Checklist, Guideline, PageColumn, PlannedRow, Principle, RowKind, RowStyleId, SheetPlan,
    SuccessCriterion,
};

/// Fixed headers preceding the per-page result columns.
pub const FIXED_HEADERS: [&str; 3] = ["Success Criteria", "Description", "WCAG Level"];

/// Plan every applicable principle. Validates the checklist first so
/// malformed input fails before any remote call.
pub fn plan_workbook(
    checklist: &Checklist,
    config: &AuditConfig,
) -> Result<Vec<SheetPlan>, ChecklistError> {
    validate(checklist)?;
    checklist
        .principles
        .iter()
        .filter(|principle| principle.applies_to(&config.version))
        .map(|principle| plan_principle(principle, config))
        .collect()
}

/// Plan one principle's sheet: title row, column headers, then each
/// applicable guideline followed by its applicable criteria.
pub fn plan_principle(
    principle: &Principle,
    config: &AuditConfig,
) -> Result<SheetPlan, ChecklistError> {
    let mut rows = Vec::new();

    rows.push(PlannedRow {
        kind: RowKind::Title,
        style: RowStyleId::Header,
        cells: vec![format!("{} - {}", principle.handle, principle.title)],
    });

    let mut header_cells: Vec<String> = FIXED_HEADERS.iter().map(|h| h.to_string()).collect();
    header_cells.extend(config.pages.iter().map(page_link));
    rows.push(PlannedRow {
        kind: RowKind::ColumnHeader,
        style: RowStyleId::Subheader,
        cells: header_cells,
    });

    for guideline in principle
        .guidelines
        .iter()
        .filter(|g| g.applies_to(&config.version))
    {
        // A guideline with no applicable criteria still gets its row;
        // empty sections are preserved, not collapsed.
        rows.push(PlannedRow {
            kind: RowKind::Guideline,
            style: RowStyleId::Guideline,
            cells: vec![
                reference_link(&config.reference_base_url, &guideline.num, &guideline.handle),
                guideline.title.clone(),
            ],
        });

        for (index, criterion) in applicable_criteria(guideline, config).into_iter().enumerate() {
            rows.push(criterion_row(criterion, index, config)?);
        }
    }

    Ok(SheetPlan {
        sheet_title: format!("{}. {}", principle.num, principle.handle),
        rows,
    })
}

/// Criteria that survive both gates: declared for the target version AND
/// level contained in the target level.
fn applicable_criteria<'a>(
    guideline: &'a Guideline,
    config: &AuditConfig,
) -> Vec<&'a SuccessCriterion> {
    guideline
        .success_criteria
        .iter()
        .filter(|c| c.applies_to(&config.version) && config.level.contains(c.level.as_str()))
        .collect()
}

/// `index` is the criterion's position in its guideline's filtered list;
/// even index → Odd style. The parity resets with every guideline.
fn criterion_row(
    criterion: &SuccessCriterion,
    index: usize,
    config: &AuditConfig,
) -> Result<PlannedRow, ChecklistError> {
    let first_version =
        criterion
            .versions
            .first()
            .ok_or_else(|| ChecklistError::NoDeclaredVersions {
                num: criterion.num.clone(),
            })?;

    let style = if index % 2 == 0 {
        RowStyleId::CriterionOdd
    } else {
        RowStyleId::CriterionEven
    };

    let mut cells = vec![
        reference_link(&config.reference_base_url, &criterion.num, &criterion.handle),
        criterion_body(criterion),
        format!("{first_version}\n{}", criterion.level),
    ];
    // Pad the page-result cells so every criterion row spans the full
    // 3 + pages width.
    cells.resize(3 + config.pages.len(), String::new());

    Ok(PlannedRow {
        kind: RowKind::Criterion,
        style,
        cells,
    })
}

/// Criterion body: the title, then every detail item as
/// `"<handle> - <text>"` separated by blank lines, in item order.
fn criterion_body(criterion: &SuccessCriterion) -> String {
    let mut body = criterion.title.clone();
    for detail in &criterion.details {
        for item in &detail.items {
            body.push_str(&format!("\n\n{} - {}", item.handle, item.text));
        }
    }
    body
}

/// Hyperlink formula for a checklist cross-reference.
pub fn reference_link(base: &str, num: &str, handle: &str) -> String {
    format!(
        r#"=HYPERLINK("{base}#{}", "{num} {handle}")"#,
        anchor(handle)
    )
}

/// Hyperlink formula for an audited page's header cell.
pub fn page_link(page: &PageColumn) -> String {
    format!(r#"=HYPERLINK("{}", "{}")"#, page.url, page.name)
}

/// Anchor derived from a display handle: lowercase, parentheses stripped,
/// spaces to hyphens.
pub fn anchor(handle: &str) -> String {
    handle
        .replace(['(', ')'], "")
        .replace(' ', "-")
        .to_lowercase()
}

/// Fail fast on malformed checklist entries instead of emitting blank
/// cells downstream.
pub fn validate(checklist: &Checklist) -> Result<(), ChecklistError> {
    for principle in &checklist.principles {
        require("principle", &principle.num, "num", &principle.num)?;
        require("principle", &principle.num, "handle", &principle.handle)?;
        require("principle", &principle.num, "title", &principle.title)?;
        for guideline in &principle.guidelines {
            require("guideline", &guideline.num, "num", &guideline.num)?;
            require("guideline", &guideline.num, "handle", &guideline.handle)?;
            require("guideline", &guideline.num, "title", &guideline.title)?;
            for criterion in &guideline.success_criteria {
                require("success criterion", &criterion.num, "num", &criterion.num)?;
                require(
                    "success criterion",
                    &criterion.num,
                    "handle",
                    &criterion.handle,
                )?;
                require(
                    "success criterion",
                    &criterion.num,
                    "title",
                    &criterion.title,
                )?;
                require(
                    "success criterion",
                    &criterion.num,
                    "level",
                    &criterion.level,
                )?;
                if criterion.versions.is_empty() {
                    return Err(ChecklistError::NoDeclaredVersions {
                        num: criterion.num.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

fn require(
    node: &'static str,
    id: &str,
    field: &'static str,
    value: &str,
) -> Result<(), ChecklistError> {
    if value.trim().is_empty() {
        return Err(ChecklistError::MissingField {
            node,
            id: id.to_string(),
            field,
        });
    }
    Ok(())
}
