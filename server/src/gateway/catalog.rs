//! Tool and resource declarations of the pod/customer backend.

use podgate_types::{Resource, Tool};
use serde_json::{json, Value};

pub const PODS_RESOURCE_URI: &str = "podgate://pods";
pub const CUSTOMERS_RESOURCE_URI: &str = "podgate://customers";

fn tool(name: &str, description: &str, input_schema: Value) -> Tool {
    Tool {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

fn id_schema(field: &str, description: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            field: { "type": "string", "description": description }
        },
        "required": [field]
    })
}

/// All tools exposed by the backend.
pub fn tools() -> Vec<Tool> {
    vec![
        tool(
            "list_pods",
            "List pods, optionally filtered by customer or status",
            json!({
                "type": "object",
                "properties": {
                    "customer_id": {
                        "type": "string",
                        "description": "Only pods owned by this customer"
                    },
                    "status": {
                        "type": "string",
                        "description": "Only pods in this status (e.g. 'running', 'stopped')"
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 500,
                        "description": "Maximum number of pods to return"
                    }
                },
                "required": []
            }),
        ),
        tool(
            "get_pod",
            "Get details of a specific pod by ID",
            id_schema("pod_id", "The ID of the pod"),
        ),
        tool(
            "create_pod",
            "Create a new pod for a customer",
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Name for the new pod" },
                    "customer_id": {
                        "type": "string",
                        "description": "The ID of the customer owning the pod"
                    },
                    "region": { "type": "string", "description": "Optional deployment region" },
                    "config": { "type": "object", "description": "Optional pod configuration" }
                },
                "required": ["name", "customer_id"]
            }),
        ),
        tool(
            "update_pod",
            "Update a pod's name, region or configuration",
            json!({
                "type": "object",
                "properties": {
                    "pod_id": { "type": "string", "description": "The ID of the pod to update" },
                    "name": { "type": "string", "description": "New pod name" },
                    "region": { "type": "string", "description": "New deployment region" },
                    "config": { "type": "object", "description": "Replacement pod configuration" }
                },
                "required": ["pod_id"]
            }),
        ),
        tool(
            "delete_pod",
            "Delete a pod",
            id_schema("pod_id", "The ID of the pod to delete"),
        ),
        tool(
            "list_customers",
            "List customers, optionally filtered by a search term",
            json!({
                "type": "object",
                "properties": {
                    "search": {
                        "type": "string",
                        "description": "Match against customer name or email"
                    },
                    "limit": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 500,
                        "description": "Maximum number of customers to return"
                    }
                },
                "required": []
            }),
        ),
        tool(
            "get_customer",
            "Get details of a specific customer by ID",
            id_schema("customer_id", "The ID of the customer"),
        ),
        tool(
            "create_customer",
            "Create a new customer",
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Customer name" },
                    "email": { "type": "string", "description": "Contact email address" }
                },
                "required": ["name", "email"]
            }),
        ),
        tool(
            "update_customer",
            "Update a customer's name or email",
            json!({
                "type": "object",
                "properties": {
                    "customer_id": {
                        "type": "string",
                        "description": "The ID of the customer to update"
                    },
                    "name": { "type": "string", "description": "New customer name" },
                    "email": { "type": "string", "description": "New contact email address" }
                },
                "required": ["customer_id"]
            }),
        ),
        tool(
            "delete_customer",
            "Delete a customer",
            id_schema("customer_id", "The ID of the customer to delete"),
        ),
    ]
}

/// All resources exposed by the backend.
pub fn resources() -> Vec<Resource> {
    vec![
        Resource {
            uri: PODS_RESOURCE_URI.to_string(),
            name: "Pods".to_string(),
            description: Some("All pods known to the backend".to_string()),
            mime_type: Some("application/json".to_string()),
        },
        Resource {
            uri: CUSTOMERS_RESOURCE_URI.to_string(),
            name: "Customers".to_string(),
            description: Some("All customers known to the backend".to_string()),
            mime_type: Some("application/json".to_string()),
        },
    ]
}
