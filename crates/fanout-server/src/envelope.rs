use serde::Serialize;

pub const SUCCESS_CODE: u16 = 200;
pub const SUCCESS_MESSAGE: &str = "success";

/// Envelope wrapped around every JSON response body.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
    /// Epoch milliseconds at which the response was built.
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: SUCCESS_CODE,
            message: SUCCESS_MESSAGE.to_string(),
            data: Some(data),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_has_null_data() {
        let json = serde_json::to_value(ApiResponse::error(400, "bad")).unwrap();
        assert_eq!(json["code"], 400);
        assert_eq!(json["message"], "bad");
        assert!(json["data"].is_null());
        assert!(json["timestamp"].as_i64().unwrap() > 0);
    }

    #[test]
    fn success_envelope_wraps_data() {
        let json = serde_json::to_value(ApiResponse::success(vec![1, 2])).unwrap();
        assert_eq!(json["code"], 200);
        assert_eq!(json["message"], "success");
        assert_eq!(json["data"], serde_json::json!([1, 2]));
    }
}
