use async_trait::async_trait;
use garde::Validate;
use podgate_types::api::{
    CreateCustomerArgs, CreatePodArgs, CustomerIdArgs, ListCustomersArgs, ListPodsArgs, PodIdArgs,
    UpdateCustomerArgs, UpdatePodArgs,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::info;

use super::catalog::{CUSTOMERS_RESOURCE_URI, PODS_RESOURCE_URI};
use super::{BackendClient, Gateway, GatewayError, Result};

const PODS: &str = "pods";
const CUSTOMERS: &str = "customers";

/// Tools the REST backend can execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ToolKind {
    ListPods,
    GetPod,
    CreatePod,
    UpdatePod,
    DeletePod,
    ListCustomers,
    GetCustomer,
    CreateCustomer,
    UpdateCustomer,
    DeleteCustomer,
}

const TOOLS: &[(&str, ToolKind)] = &[
    ("list_pods", ToolKind::ListPods),
    ("get_pod", ToolKind::GetPod),
    ("create_pod", ToolKind::CreatePod),
    ("update_pod", ToolKind::UpdatePod),
    ("delete_pod", ToolKind::DeletePod),
    ("list_customers", ToolKind::ListCustomers),
    ("get_customer", ToolKind::GetCustomer),
    ("create_customer", ToolKind::CreateCustomer),
    ("update_customer", ToolKind::UpdateCustomer),
    ("delete_customer", ToolKind::DeleteCustomer),
];

const RESOURCES: &[(&str, &str)] = &[
    (PODS_RESOURCE_URI, PODS),
    (CUSTOMERS_RESOURCE_URI, CUSTOMERS),
];

impl ToolKind {
    fn lookup(name: &str) -> Option<Self> {
        TOOLS
            .iter()
            .find(|(tool, _)| *tool == name)
            .map(|(_, kind)| *kind)
    }
}

fn resource_collection(uri: &str) -> Option<&'static str> {
    RESOURCES
        .iter()
        .find(|(known, _)| *known == uri)
        .map(|(_, collection)| *collection)
}

/// A parsed and validated tool invocation.
#[derive(Debug)]
enum ToolCall {
    ListPods(ListPodsArgs),
    GetPod(PodIdArgs),
    CreatePod(CreatePodArgs),
    UpdatePod(UpdatePodArgs),
    DeletePod(PodIdArgs),
    ListCustomers(ListCustomersArgs),
    GetCustomer(CustomerIdArgs),
    CreateCustomer(CreateCustomerArgs),
    UpdateCustomer(UpdateCustomerArgs),
    DeleteCustomer(CustomerIdArgs),
}

impl ToolCall {
    fn parse(tool: &str, arguments: Value) -> Result<Self> {
        let kind =
            ToolKind::lookup(tool).ok_or_else(|| GatewayError::UnknownTool(tool.to_string()))?;
        Ok(match kind {
            ToolKind::ListPods => Self::ListPods(args(tool, arguments)?),
            ToolKind::GetPod => Self::GetPod(args(tool, arguments)?),
            ToolKind::CreatePod => Self::CreatePod(args(tool, arguments)?),
            ToolKind::UpdatePod => Self::UpdatePod(args(tool, arguments)?),
            ToolKind::DeletePod => Self::DeletePod(args(tool, arguments)?),
            ToolKind::ListCustomers => Self::ListCustomers(args(tool, arguments)?),
            ToolKind::GetCustomer => Self::GetCustomer(args(tool, arguments)?),
            ToolKind::CreateCustomer => Self::CreateCustomer(args(tool, arguments)?),
            ToolKind::UpdateCustomer => Self::UpdateCustomer(args(tool, arguments)?),
            ToolKind::DeleteCustomer => Self::DeleteCustomer(args(tool, arguments)?),
        })
    }
}

/// Deserialize and validate a tool's argument bag.
fn args<T>(tool: &str, arguments: Value) -> Result<T>
where
    T: DeserializeOwned + Validate<Context = ()>,
{
    // Clients may omit arguments entirely for tools without required fields
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    let parsed: T =
        serde_json::from_value(arguments).map_err(|e| GatewayError::InvalidArguments {
            tool: tool.to_string(),
            reason: e.to_string(),
        })?;
    parsed.validate().map_err(|report| GatewayError::Validation {
        tool: tool.to_string(),
        report,
    })?;
    Ok(parsed)
}

/// Gateway implementation backed by the REST API.
#[derive(Clone, Debug)]
pub struct RestGateway {
    client: BackendClient,
}

impl RestGateway {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Whether `tool` maps to a backend call.
    pub fn supports(tool: &str) -> bool {
        ToolKind::lookup(tool).is_some()
    }

    /// Whether `uri` maps to a backend collection.
    pub fn supports_resource(uri: &str) -> bool {
        resource_collection(uri).is_some()
    }

    async fn execute(&self, call: ToolCall) -> Result<Value> {
        let client = &self.client;
        match call {
            ToolCall::ListPods(query) => {
                info!("Gateway: Listing pods");
                client.get(&client.collection_url(PODS), Some(&query)).await
            }
            ToolCall::GetPod(args) => {
                info!("Gateway: Getting pod {}", args.pod_id);
                client
                    .get::<()>(&client.item_url(PODS, &args.pod_id), None)
                    .await
            }
            ToolCall::CreatePod(body) => {
                info!("Gateway: Creating pod '{}'", body.name);
                client.post(&client.collection_url(PODS), &body).await
            }
            ToolCall::UpdatePod(patch) => {
                info!("Gateway: Updating pod {}", patch.pod_id);
                client
                    .patch(&client.item_url(PODS, &patch.pod_id), &patch)
                    .await
            }
            ToolCall::DeletePod(args) => {
                info!("Gateway: Deleting pod {}", args.pod_id);
                client.delete(&client.item_url(PODS, &args.pod_id)).await
            }
            ToolCall::ListCustomers(query) => {
                info!("Gateway: Listing customers");
                client
                    .get(&client.collection_url(CUSTOMERS), Some(&query))
                    .await
            }
            ToolCall::GetCustomer(args) => {
                info!("Gateway: Getting customer {}", args.customer_id);
                client
                    .get::<()>(&client.item_url(CUSTOMERS, &args.customer_id), None)
                    .await
            }
            ToolCall::CreateCustomer(body) => {
                info!("Gateway: Creating customer '{}'", body.name);
                client.post(&client.collection_url(CUSTOMERS), &body).await
            }
            ToolCall::UpdateCustomer(patch) => {
                info!("Gateway: Updating customer {}", patch.customer_id);
                client
                    .patch(&client.item_url(CUSTOMERS, &patch.customer_id), &patch)
                    .await
            }
            ToolCall::DeleteCustomer(args) => {
                info!("Gateway: Deleting customer {}", args.customer_id);
                client
                    .delete(&client.item_url(CUSTOMERS, &args.customer_id))
                    .await
            }
        }
    }
}

#[async_trait]
impl Gateway for RestGateway {
    async fn invoke(&self, tool: &str, arguments: Value) -> Result<Value> {
        let call = ToolCall::parse(tool, arguments)?;
        self.execute(call).await
    }

    async fn read_resource(&self, uri: &str) -> Result<Value> {
        let collection = resource_collection(uri)
            .ok_or_else(|| GatewayError::UnknownResource(uri.to_string()))?;
        self.client
            .get::<()>(&self.client.collection_url(collection), None)
            .await
    }
}
