use crate::{
    data::student::{Field, StudentId},
    store::StoreOp,
};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use maud::html;
use snafu::Snafu;
use std::{num::ParseIntError, path::PathBuf};

pub type RosterResult<T> = Result<T, RosterError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RosterError {
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unable to parse store timeout {:?}", original))]
    ParseTimeout {
        source: ParseIntError,
        original: String,
    },
    #[snafu(display("Store timeout must be at least one second, got {:?}", original))]
    ZeroTimeout { original: String },
    #[snafu(display("Error building the HTTP client"))]
    BuildHttpClient { source: reqwest::Error },
    #[snafu(display("Unable to reach the student store to {}", op))]
    StoreRequest { source: reqwest::Error, op: StoreOp },
    #[snafu(display("The student store refused to {} ({}): {}", op, status, message))]
    StoreRejected {
        op: StoreOp,
        status: StatusCode,
        message: String,
    },
    #[snafu(display("Unable to understand the student store's reply to {}", op))]
    StoreDecode { source: reqwest::Error, op: StoreOp },
    #[snafu(display("Unable to find student with ID: {}", id))]
    MissingStudent { id: StudentId },
    #[snafu(display(
        "Fill in every field first, missing: {}",
        missing.iter().map(|field| field.label()).collect::<Vec<_>>().join(", ")
    ))]
    IncompleteDraft { missing: Vec<Field> },
    #[snafu(display("Tried to update a student without choosing one to edit"))]
    NotEditing,
    #[snafu(display("Tick at least one student to delete"))]
    NothingSelected,
    #[snafu(display("Unable to read preferences from {:?}", path))]
    ReadPreferences {
        source: std::io::Error,
        path: PathBuf,
    },
    #[snafu(display("Unable to write preferences to {:?}", path))]
    WritePreferences {
        source: std::io::Error,
        path: PathBuf,
    },
    #[snafu(display("Error serialising with rmp_serde"))]
    RmpSerdeEncode { source: rmp_serde::encode::Error },
    #[snafu(display("Error deserialising with rmp_serde"))]
    RmpSerdeDecode { source: rmp_serde::decode::Error },
    #[snafu(display("Error with multipart form input"))]
    Multipart {
        source: axum::extract::multipart::MultipartError,
    },
    #[snafu(display("Error with CSVs"))]
    Csv { source: csv::Error },
    #[snafu(display("Error finishing CSV export"))]
    ExportCsv { source: std::io::Error },
}

impl RosterError {
    /// Whether this came from talking to the student store, as opposed to a local precondition.
    pub const fn is_remote_failure(&self) -> bool {
        matches!(
            self,
            Self::StoreRequest { .. } | Self::StoreRejected { .. } | Self::StoreDecode { .. }
        )
    }
}

impl IntoResponse for RosterError {
    #[allow(clippy::match_same_arms)]
    fn into_response(self) -> Response {
        const ISE: StatusCode = StatusCode::INTERNAL_SERVER_ERROR; //internal server error
        const NF: StatusCode = StatusCode::NOT_FOUND; //not found
        const BI: StatusCode = StatusCode::BAD_REQUEST; //bad input
        const BG: StatusCode = StatusCode::BAD_GATEWAY; //store misbehaved

        let basic_error = |desc| {
            html! {
                div class="bg-red-100 border border-red-400 text-red-700 px-4 py-3 rounded relative mb-4" role="alert" {
                    strong class="font-bold" {"Roster Error "}
                    span {(desc)}
                }
            }
        };

        let status_code = match &self {
            Self::BadEnvVar { .. } | Self::ParseTimeout { .. } | Self::ZeroTimeout { .. } => ISE,
            Self::BuildHttpClient { .. } => ISE,
            Self::StoreRequest { .. } | Self::StoreDecode { .. } => BG,
            Self::StoreRejected { status, .. } => {
                if status.is_client_error() {
                    *status
                } else {
                    BG
                }
            }
            Self::MissingStudent { .. } => NF,
            Self::IncompleteDraft { .. } | Self::NotEditing | Self::NothingSelected => BI,
            Self::ReadPreferences { .. } | Self::WritePreferences { .. } => ISE,
            Self::RmpSerdeEncode { .. } => ISE,
            Self::RmpSerdeDecode { .. } => ISE,
            Self::Multipart { source } => source.status(),
            Self::Csv { .. } => BI,
            Self::ExportCsv { .. } => ISE,
        };

        error!(?self, "Error!");
        (status_code, Html(basic_error(self.to_string()).into_string())).into_response()
    }
}
