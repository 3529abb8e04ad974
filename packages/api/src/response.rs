use axum::Json;
use serde::Serialize;

/// Envelope wrapped around every JSON body the API returns.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Json<Self> {
        Json(ApiResponse {
            success: true,
            message: message.to_string(),
            data: Some(data),
        })
    }
}

impl ApiResponse<()> {
    pub fn message(message: &str) -> Json<Self> {
        Json(ApiResponse {
            success: true,
            message: message.to_string(),
            data: None,
        })
    }

    pub fn error(message: &str) -> Json<Self> {
        Json(ApiResponse {
            success: false,
            message: message.to_string(),
            data: None,
        })
    }
}
