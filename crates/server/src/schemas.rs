//! Request, response, and callback payload models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trigger request for a recommendation run. `batch_id` doubles as the
/// idempotency key in the result path.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessRequest {
    pub batch_id: String,
    pub users_file_path: String,
    pub courses_file_path: String,
    /// Falls back to `DEFAULT_TOP_K` when omitted.
    #[serde(default)]
    pub top_k: Option<usize>,
    #[serde(default)]
    pub callback_url: Option<String>,
}

/// 202 Accepted body for a trigger request.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessResponse {
    pub batch_id: String,
    pub status: &'static str,
    pub message: &'static str,
}

impl ProcessResponse {
    pub fn accepted(batch_id: String) -> Self {
        Self {
            batch_id,
            status: "ACCEPTED",
            message: "Processing started",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_seconds: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct InfoResponse {
    pub app: AppInfo,
    pub start_time: DateTime<Utc>,
}

/// Callback payload for a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackSuccessPayload {
    pub batch_id: String,
    pub status: &'static str,
    pub result_file_path: String,
    pub user_count: usize,
    pub processed_at: DateTime<Utc>,
}

impl CallbackSuccessPayload {
    pub fn new(batch_id: String, result_file_path: String, user_count: usize) -> Self {
        Self {
            batch_id,
            status: "COMPLETED",
            result_file_path,
            user_count,
            processed_at: Utc::now(),
        }
    }
}

/// Callback payload for a failed run.
#[derive(Debug, Clone, Serialize)]
pub struct CallbackFailurePayload {
    pub batch_id: String,
    pub status: &'static str,
    pub error_code: String,
    pub error_message: String,
    pub failed_at: DateTime<Utc>,
}

impl CallbackFailurePayload {
    pub fn new(batch_id: String, error_code: String, error_message: String) -> Self {
        Self {
            batch_id,
            status: "FAILED",
            error_code,
            error_message,
            failed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_request_defaults_optional_fields() {
        let request: ProcessRequest = serde_json::from_str(
            r#"{
                "batch_id": "batch_001",
                "users_file_path": "exports/users.parquet",
                "courses_file_path": "exports/courses.parquet"
            }"#,
        )
        .unwrap();

        assert_eq!(request.batch_id, "batch_001");
        assert_eq!(request.top_k, None);
        assert_eq!(request.callback_url, None);
    }

    #[test]
    fn success_payload_carries_the_contract_fields() {
        let payload = CallbackSuccessPayload::new(
            "batch_001".to_string(),
            "results/2026/08/01/batch_001/recommendations.parquet".to_string(),
            42,
        );
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["status"], "COMPLETED");
        assert_eq!(json["user_count"], 42);
        assert!(json["result_file_path"].as_str().unwrap().ends_with(".parquet"));
        assert!(json.get("processed_at").is_some());
    }

    #[test]
    fn failure_payload_carries_the_contract_fields() {
        let payload = CallbackFailurePayload::new(
            "batch_001".to_string(),
            "STORAGE_ERROR".to_string(),
            "Download failed after 3 retries".to_string(),
        );
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["status"], "FAILED");
        assert_eq!(json["error_code"], "STORAGE_ERROR");
        assert!(json.get("failed_at").is_some());
    }
}
