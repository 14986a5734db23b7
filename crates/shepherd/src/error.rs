use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use shepherd_core::error::{
    DecodeError, FeedbackError, FeedbackStoreError, LateNotificationError, NotificationError,
};
use shepherd_core::ShepherdError;
use tracing::{error, warn};

/// Handler error. Renders as `{"error": "..."}` with a status picked from the
/// underlying failure.
#[derive(Debug)]
pub struct ApiError(pub ShepherdError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ShepherdError::Decode(_) => StatusCode::BAD_REQUEST,
            ShepherdError::Feedback(_) | ShepherdError::LateNotification(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ShepherdError::Notification(_) => StatusCode::BAD_GATEWAY,
            ShepherdError::FeedbackStore(_) | ShepherdError::SessionClosed => {
                StatusCode::SERVICE_UNAVAILABLE
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.0.to_string();
        if status.is_server_error() {
            error!(status = status.as_u16(), "request failed: {message}");
        } else {
            warn!(status = status.as_u16(), "request rejected: {message}");
        }
        (status, Json(json!({ "error": message }))).into_response()
    }
}

macro_rules! api_error_from {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for ApiError {
                fn from(err: $source) -> Self {
                    ApiError(ShepherdError::from(err))
                }
            }
        )*
    };
}

api_error_from!(
    DecodeError,
    FeedbackError,
    FeedbackStoreError,
    LateNotificationError,
    NotificationError,
);

impl From<ShepherdError> for ApiError {
    fn from(err: ShepherdError) -> Self {
        ApiError(err)
    }
}
