//! Error types for auditbook-core.

use thiserror::Error;

/// Checklist input problems. All of these are raised before the first
/// remote call is made.
#[derive(Error, Debug)]
pub enum ChecklistError {
    #[error("failed to read checklist file: {0}")]
    Io(#[from] std::io::Error),

    #[error("checklist is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{node} {id:?} is missing required field `{field}`")]
    MissingField {
        node: &'static str,
        id: String,
        field: &'static str,
    },

    #[error("success criterion {num:?} declares no versions")]
    NoDeclaredVersions { num: String },
}

/// Remote spreadsheet service failures. Never retried: the caller aborts
/// and any partially built spreadsheet is left as-is.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("transport error calling {endpoint}: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("{endpoint} returned HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("malformed reply from {endpoint}: {detail}")]
    MalformedReply { endpoint: String, detail: String },
}
