use axum::extract::{rejection::QueryRejection, Query};
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

use trafo_core::{JobId, RevisionGroupId, State, TransformationRevisionId, Type};
use trafo_infra::revision_store::{RevisionFilter, UpdateOptions};

use crate::app::errors;

// -------------------------
// Query DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ListRevisionsQuery {
    #[serde(rename = "type")]
    pub kind: Option<Type>,
    pub state: Option<State>,
    pub category: Option<String>,
    pub category_prefix: Option<String>,
    pub revision_group_id: Option<RevisionGroupId>,
    /// Comma separated revision ids.
    pub ids: Option<String>,
    /// Comma separated names.
    pub names: Option<String>,
    pub include_deprecated: Option<bool>,
}

impl ListRevisionsQuery {
    pub fn into_filter(self) -> Result<RevisionFilter, axum::response::Response> {
        let ids = match self.ids {
            Some(raw) => Some(
                split_list(&raw)
                    .map(|s| s.parse::<TransformationRevisionId>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", e.to_string()))?,
            ),
            None => None,
        };
        let names = self
            .names
            .map(|raw| split_list(&raw).map(str::to_string).collect::<Vec<_>>());

        Ok(RevisionFilter {
            kind: self.kind,
            state: self.state,
            category: self.category,
            category_prefix: self.category_prefix,
            revision_group_id: self.revision_group_id,
            ids,
            names,
            include_deprecated: self.include_deprecated.unwrap_or(true),
        })
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateRevisionQuery {
    #[serde(default)]
    pub allow_overwrite_released: bool,
    #[serde(default)]
    pub strip_wiring: bool,
}

impl From<UpdateRevisionQuery> for UpdateOptions {
    fn from(q: UpdateRevisionQuery) -> Self {
        UpdateOptions {
            allow_overwrite_released: q.allow_overwrite_released,
            strip_wiring: q.strip_wiring,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteRevisionQuery {
    #[serde(default)]
    pub ignore_state: bool,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub callback_url: Url,
}

/// Extract and check the callback URL of an async execution request.
pub fn callback_url(query: Result<Query<CallbackQuery>, QueryRejection>) -> Result<Url, axum::response::Response> {
    let Query(CallbackQuery { callback_url }) = query.map_err(|e| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_callback_url", e.body_text())
    })?;

    match callback_url.scheme() {
        "http" | "https" => Ok(callback_url),
        other => Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_callback_url",
            format!("unsupported callback url scheme {other:?}"),
        )),
    }
}

// -------------------------
// Response DTOs
// -------------------------

/// Acknowledgment of an async execution request.
#[derive(Debug, Serialize)]
pub struct AcceptedResponse {
    pub message: String,
    pub job_id: JobId,
}

impl AcceptedResponse {
    pub fn by_id(job_id: JobId) -> Self {
        Self {
            message: format!("Execution request with job id {job_id} accepted"),
            job_id,
        }
    }

    pub fn latest(job_id: JobId) -> Self {
        Self {
            message: format!("Execution request for latest revision with job id {job_id} accepted"),
            job_id,
        }
    }
}
