use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use drift_graph::GraphError;
use drift_provider::ProviderError;
use serde_json::json;

pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError { status: StatusCode::BAD_REQUEST, message: msg.into() }
    }

    pub fn unprocessable(msg: impl Into<String>) -> Self {
        ApiError { status: StatusCode::UNPROCESSABLE_ENTITY, message: msg.into() }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError { status: StatusCode::NOT_FOUND, message: msg.into() }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError { status: StatusCode::INTERNAL_SERVER_ERROR, message: msg.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<drift_hub::HubError> for ApiError {
    fn from(e: drift_hub::HubError) -> Self {
        use drift_hub::HubError;
        match e {
            HubError::JobNotFound(_) => ApiError::not_found(e.to_string()),
            HubError::AlreadyTerminal(_) => ApiError::bad_request(e.to_string()),
            HubError::Timeout(_) => ApiError::internal(e.to_string()),
            HubError::Cache(_) => ApiError::internal(e.to_string()),
            HubError::Provider(pe) => ApiError::from(pe),
            HubError::Engine(ee) => ApiError::from(ee),
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::CredentialError(_) | ProviderError::NotConfigured(_) => ApiError::unprocessable(e.to_string()),
            ProviderError::NetworkError(_) | ProviderError::Throttled(_) | ProviderError::Timeout(_) | ProviderError::PartialFailure { .. } => {
                ApiError::internal(e.to_string())
            }
        }
    }
}

impl From<drift_engine::EngineError> for ApiError {
    fn from(e: drift_engine::EngineError) -> Self {
        use drift_engine::EngineError;
        match e {
            EngineError::State(_) => ApiError::bad_request(e.to_string()),
            EngineError::Graph(GraphError::DependencyCycleDetected) => ApiError::unprocessable(e.to_string()),
            EngineError::Graph(GraphError::UnknownNode(_)) => ApiError::bad_request(e.to_string()),
            EngineError::Internal(_) => ApiError::internal(e.to_string()),
        }
    }
}
