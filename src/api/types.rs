use serde::Serialize;

use crate::models::validation::FieldError;
use crate::services::SubscribeOutcome;

/// Envelope shared by every JSON response.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: Vec::new(),
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success(data)
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message.into()),
            errors: Vec::new(),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            errors: Vec::new(),
        }
    }

    pub fn invalid(message: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self {
            errors,
            ..Self::error(message)
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubscribeResponse {
    pub id: i32,
    pub outcome: SubscribeOutcome,
}

#[derive(Debug, Serialize)]
pub struct LogoResponse {
    pub logo_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_omits_empty_parts() {
        let json = serde_json::to_value(ApiResponse::success(3)).unwrap();
        assert_eq!(json, serde_json::json!({ "success": true, "data": 3 }));

        let json = serde_json::to_value(ApiResponse::invalid(
            "Validation failed",
            vec![FieldError::new("email", "is required")],
        ))
        .unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["errors"][0]["field"], "email");
        assert!(json.get("data").is_none());
    }
}
