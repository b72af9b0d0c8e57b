use crate::application::dashboard_store::IntentError;
use crate::application::data_entry::EntryError;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("{0}")]
    Upstream(String),

    /// The request could not be extracted; keeps the extractor's status.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Rejected { status, .. } => *status,
        }
    }
}

impl From<EntryError> for ApiError {
    fn from(e: EntryError) -> Self {
        match e {
            EntryError::UnknownProject(_) | EntryError::UnknownAgent(_) => {
                ApiError::NotFound(e.to_string())
            }
            EntryError::Gateway(_) => ApiError::Upstream(e.to_string()),
        }
    }
}

impl From<IntentError> for ApiError {
    fn from(e: IntentError) -> Self {
        ApiError::Unprocessable(e.to_string())
    }
}

macro_rules! from_rejection {
    ($($rejection:ty),*) => {
        $(impl From<$rejection> for ApiError {
            fn from(rejection: $rejection) -> Self {
                ApiError::Rejected {
                    status: rejection.status(),
                    message: rejection.body_text(),
                }
            }
        })*
    };
}

from_rejection!(JsonRejection, PathRejection, QueryRejection);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!("Request failed: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_errors_map_to_status() {
        let missing: ApiError = EntryError::UnknownAgent("ag-9".to_string()).into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.to_string(), "Unknown agent: ag-9");

        let upstream: ApiError = EntryError::Gateway(anyhow::anyhow!("timeout")).into();
        assert_eq!(upstream.status(), StatusCode::BAD_GATEWAY);

        let rejected: ApiError = IntentError::AgentOutOfScope {
            agent: "ag-1".to_string(),
            project: "B".to_string(),
        }
        .into();
        assert_eq!(rejected.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(rejected.to_string(), "Agent ag-1 is not part of B");
    }
}
