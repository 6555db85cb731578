//! Spreadsheet service client: the trait seam, a blocking HTTP
//! implementation, and a recording double for tests.

use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;
use crate::sheets::{
    AddSheetRequest, BatchUpdateBody, BatchValuesBody, Request, SheetProperties, SpreadsheetHandle,
    ValueInputOption, ValueRange,
};

pub const SHEETS_ENDPOINT: &str = "https://sheets.googleapis.com/v4/spreadsheets";
pub const DRIVE_ENDPOINT: &str = "https://www.googleapis.com/drive/v3/files";

/// The operations the workbook orchestration needs from the remote
/// service. `add_sheet` is the read-after-write half of the two-phase
/// protocol: it returns the remote-assigned sheet id that every
/// subsequent batch addresses.
pub trait SpreadsheetApi {
    fn create_spreadsheet(&mut self, title: &str) -> Result<SpreadsheetHandle, ApiError>;

    fn add_sheet(&mut self, spreadsheet_id: &str, title: &str) -> Result<i64, ApiError>;

    fn batch_update(
        &mut self,
        spreadsheet_id: &str,
        requests: Vec<Request>,
    ) -> Result<(), ApiError>;

    fn update_values(
        &mut self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
    ) -> Result<(), ApiError>;

    fn move_to_folder(&mut self, spreadsheet_id: &str, folder_id: &str) -> Result<(), ApiError>;
}

/// Blocking HTTP client. Holds an opaque bearer token; acquiring the
/// token is the caller's problem.
pub struct HttpSheetsClient {
    agent: ureq::Agent,
    token: String,
    sheets_url: String,
    drive_url: String,
}

impl HttpSheetsClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_urls(token, SHEETS_ENDPOINT, DRIVE_ENDPOINT)
    }

    /// Point the client at alternate endpoints (local stub servers in
    /// integration setups).
    pub fn with_base_urls(
        token: impl Into<String>,
        sheets_url: impl Into<String>,
        drive_url: impl Into<String>,
    ) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            token: token.into(),
            sheets_url: sheets_url.into(),
            drive_url: drive_url.into(),
        }
    }

    fn send_json(
        &self,
        method: &str,
        endpoint: &str,
        body: &impl Serialize,
    ) -> Result<Value, ApiError> {
        let response = self
            .agent
            .request(method, endpoint)
            .set("Authorization", &format!("Bearer {}", self.token))
            .send_json(body)
            .map_err(|err| map_request_error(endpoint, err))?;
        response
            .into_json::<Value>()
            .map_err(|err| ApiError::MalformedReply {
                endpoint: endpoint.to_string(),
                detail: err.to_string(),
            })
    }

    fn get_json(&self, endpoint: &str) -> Result<Value, ApiError> {
        let response = self
            .agent
            .get(endpoint)
            .set("Authorization", &format!("Bearer {}", self.token))
            .call()
            .map_err(|err| map_request_error(endpoint, err))?;
        response
            .into_json::<Value>()
            .map_err(|err| ApiError::MalformedReply {
                endpoint: endpoint.to_string(),
                detail: err.to_string(),
            })
    }
}

fn map_request_error(endpoint: &str, err: ureq::Error) -> ApiError {
    match err {
        ureq::Error::Status(status, response) => ApiError::Status {
            endpoint: endpoint.to_string(),
            status,
            body: response.into_string().unwrap_or_default(),
        },
        transport => ApiError::Transport {
            endpoint: endpoint.to_string(),
            source: Box::new(transport),
        },
    }
}

impl SpreadsheetApi for HttpSheetsClient {
    fn create_spreadsheet(&mut self, title: &str) -> Result<SpreadsheetHandle, ApiError> {
        let endpoint = self.sheets_url.clone();
        let body = serde_json::json!({ "properties": { "title": title } });
        let reply = self.send_json("POST", &endpoint, &body)?;
        serde_json::from_value(reply).map_err(|err| ApiError::MalformedReply {
            endpoint,
            detail: err.to_string(),
        })
    }

    fn add_sheet(&mut self, spreadsheet_id: &str, title: &str) -> Result<i64, ApiError> {
        let endpoint = format!("{}/{}:batchUpdate", self.sheets_url, spreadsheet_id);
        let body = BatchUpdateBody {
            requests: vec![Request::AddSheet(AddSheetRequest {
                properties: SheetProperties {
                    title: Some(title.to_string()),
                    ..SheetProperties::default()
                },
            })],
        };
        let reply = self.send_json("POST", &endpoint, &body)?;
        reply
            .pointer("/replies/0/addSheet/properties/sheetId")
            .and_then(Value::as_i64)
            .ok_or_else(|| ApiError::MalformedReply {
                endpoint,
                detail: "reply carries no addSheet.properties.sheetId".to_string(),
            })
    }

    fn batch_update(
        &mut self,
        spreadsheet_id: &str,
        requests: Vec<Request>,
    ) -> Result<(), ApiError> {
        let endpoint = format!("{}/{}:batchUpdate", self.sheets_url, spreadsheet_id);
        self.send_json("POST", &endpoint, &BatchUpdateBody { requests })?;
        Ok(())
    }

    fn update_values(
        &mut self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
    ) -> Result<(), ApiError> {
        let endpoint = format!("{}/{}/values:batchUpdate", self.sheets_url, spreadsheet_id);
        let body = BatchValuesBody {
            data: vec![ValueRange {
                range: range.to_string(),
                values,
            }],
            value_input_option: ValueInputOption::UserEntered,
        };
        self.send_json("POST", &endpoint, &body)?;
        Ok(())
    }

    fn move_to_folder(&mut self, spreadsheet_id: &str, folder_id: &str) -> Result<(), ApiError> {
        // Reparenting needs the current parents first; the update call
        // removes them while adding the target folder.
        let get_endpoint = format!(
            "{}/{}?fields=parents&supportsAllDrives=true",
            self.drive_url, spreadsheet_id
        );
        let reply = self.get_json(&get_endpoint)?;
        let previous_parents = reply
            .get("parents")
            .and_then(Value::as_array)
            .map(|parents| {
                parents
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_default();

        let mut endpoint = format!(
            "{}/{}?addParents={}&supportsAllDrives=true",
            self.drive_url, spreadsheet_id, folder_id
        );
        if !previous_parents.is_empty() {
            endpoint.push_str(&format!("&removeParents={previous_parents}"));
        }
        self.send_json("PATCH", &endpoint, &serde_json::json!({}))?;
        Ok(())
    }
}

/// Everything a test needs to assert about one recorded client call.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    CreateSpreadsheet {
        title: String,
    },
    AddSheet {
        spreadsheet_id: String,
        title: String,
        assigned_sheet_id: i64,
    },
    BatchUpdate {
        spreadsheet_id: String,
        requests: Vec<Request>,
    },
    UpdateValues {
        spreadsheet_id: String,
        range: String,
        values: Vec<Vec<String>>,
    },
    MoveToFolder {
        spreadsheet_id: String,
        folder_id: String,
    },
}

/// Test double that records every call and hands out deterministic ids.
/// Assigned sheet ids start well away from 0, the default sheet's id.
#[derive(Debug, Default)]
pub struct RecordingSheets {
    pub calls: Vec<RecordedCall>,
    sheets_created: i64,
}

impl RecordingSheets {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpreadsheetApi for RecordingSheets {
    fn create_spreadsheet(&mut self, title: &str) -> Result<SpreadsheetHandle, ApiError> {
        self.calls.push(RecordedCall::CreateSpreadsheet {
            title: title.to_string(),
        });
        Ok(SpreadsheetHandle {
            spreadsheet_id: "spreadsheet-1".to_string(),
            spreadsheet_url: Some("https://example.com/spreadsheet-1".to_string()),
        })
    }

    fn add_sheet(&mut self, spreadsheet_id: &str, title: &str) -> Result<i64, ApiError> {
        self.sheets_created += 1;
        let assigned = 1000 + self.sheets_created;
        self.calls.push(RecordedCall::AddSheet {
            spreadsheet_id: spreadsheet_id.to_string(),
            title: title.to_string(),
            assigned_sheet_id: assigned,
        });
        Ok(assigned)
    }

    fn batch_update(
        &mut self,
        spreadsheet_id: &str,
        requests: Vec<Request>,
    ) -> Result<(), ApiError> {
        self.calls.push(RecordedCall::BatchUpdate {
            spreadsheet_id: spreadsheet_id.to_string(),
            requests,
        });
        Ok(())
    }

    fn update_values(
        &mut self,
        spreadsheet_id: &str,
        range: &str,
        values: Vec<Vec<String>>,
    ) -> Result<(), ApiError> {
        self.calls.push(RecordedCall::UpdateValues {
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
            values,
        });
        Ok(())
    }

    fn move_to_folder(&mut self, spreadsheet_id: &str, folder_id: &str) -> Result<(), ApiError> {
        self.calls.push(RecordedCall::MoveToFolder {
            spreadsheet_id: spreadsheet_id.to_string(),
            folder_id: folder_id.to_string(),
        });
        Ok(())
    }
}
