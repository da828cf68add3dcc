//! API request and response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

#[cfg(feature = "validation")]
use garde::Validate;

// ============================================================================
// Service API Types
// ============================================================================

/// Response of the health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub transport: String,
    /// RFC 3339 timestamp of the check
    pub timestamp: String,
}

/// Response of the info endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct InfoResponse {
    pub name: String,
    pub version: String,
    pub protocol_version: String,
    pub transport: String,
    /// Number of live MCP sessions
    pub active_sessions: usize,
    /// Whether protected paths require an API key
    pub auth_enabled: bool,
    pub tools: Vec<String>,
    pub resources: Vec<String>,
}

// ============================================================================
// Pod Tool Arguments
// ============================================================================

/// Arguments of `list_pods`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct ListPodsArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "validation", garde(length(min = 1, max = 64)))]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "validation", garde(length(min = 1, max = 32)))]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "validation", garde(range(min = 1, max = 500)))]
    pub limit: Option<u32>,
}

/// Arguments of the single-pod tools (`get_pod`, `delete_pod`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct PodIdArgs {
    #[cfg_attr(feature = "validation", garde(length(min = 1, max = 64)))]
    pub pod_id: String,
}

/// Arguments of `create_pod`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct CreatePodArgs {
    #[cfg_attr(feature = "validation", garde(length(min = 1, max = 128)))]
    pub name: String,
    #[cfg_attr(feature = "validation", garde(length(min = 1, max = 64)))]
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "validation", garde(length(min = 1, max = 64)))]
    pub region: Option<String>,
    /// Free-form pod configuration passed through to the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "validation", garde(skip))]
    pub config: Option<Value>,
}

/// Arguments of `update_pod`. `pod_id` selects the pod, the rest is a patch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct UpdatePodArgs {
    #[serde(skip_serializing)]
    #[cfg_attr(feature = "validation", garde(length(min = 1, max = 64)))]
    pub pod_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "validation", garde(length(min = 1, max = 128)))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "validation", garde(length(min = 1, max = 64)))]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "validation", garde(skip))]
    pub config: Option<Value>,
}

// ============================================================================
// Customer Tool Arguments
// ============================================================================

/// Arguments of `list_customers`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct ListCustomersArgs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "validation", garde(length(min = 1, max = 128)))]
    pub search: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "validation", garde(range(min = 1, max = 500)))]
    pub limit: Option<u32>,
}

/// Arguments of the single-customer tools (`get_customer`, `delete_customer`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct CustomerIdArgs {
    #[cfg_attr(feature = "validation", garde(length(min = 1, max = 64)))]
    pub customer_id: String,
}

/// Arguments of `create_customer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct CreateCustomerArgs {
    #[cfg_attr(feature = "validation", garde(length(min = 1, max = 128)))]
    pub name: String,
    #[cfg_attr(feature = "validation", garde(length(min = 3, max = 254), contains("@")))]
    pub email: String,
}

/// Arguments of `update_customer`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "validation", derive(Validate))]
pub struct UpdateCustomerArgs {
    #[serde(skip_serializing)]
    #[cfg_attr(feature = "validation", garde(length(min = 1, max = 64)))]
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "validation", garde(length(min = 1, max = 128)))]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "validation", garde(length(min = 3, max = 254), contains("@")))]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_pod_body_excludes_id() {
        let args: UpdatePodArgs = serde_json::from_value(json!({
            "pod_id": "pod-1",
            "name": "renamed"
        }))
        .unwrap();

        assert_eq!(args.pod_id, "pod-1");
        let body = serde_json::to_value(&args).unwrap();
        assert_eq!(body, json!({"name": "renamed"}));
    }

    #[cfg(feature = "validation")]
    #[test]
    fn test_customer_email_is_validated() {
        let bad = CreateCustomerArgs {
            name: "Acme".to_string(),
            email: "not-an-address".to_string(),
        };
        assert!(bad.validate().is_err());

        let good = CreateCustomerArgs {
            name: "Acme".to_string(),
            email: "ops@acme.test".to_string(),
        };
        assert!(good.validate().is_ok());
    }

    #[cfg(feature = "validation")]
    #[test]
    fn test_list_limit_bounds() {
        let args = ListPodsArgs {
            limit: Some(0),
            ..Default::default()
        };
        assert!(args.validate().is_err());

        let args = ListPodsArgs {
            limit: Some(50),
            ..Default::default()
        };
        assert!(args.validate().is_ok());
    }
}
