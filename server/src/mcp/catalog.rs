//! Declared tools and resources, validated once at startup.

use podgate_types::{Resource, Tool};
use std::collections::HashSet;

use crate::gateway::catalog as backend_catalog;

/// Error type for catalog construction.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Duplicate tool name: {0}")]
    DuplicateTool(String),

    #[error("Duplicate resource URI: {0}")]
    DuplicateResource(String),

    #[error("Tool declared with an empty name")]
    EmptyToolName,

    #[error("Tool {0} has no gateway handler")]
    UnsupportedTool(String),

    #[error("Resource {0} has no gateway handler")]
    UnsupportedResource(String),
}

/// The static tool and resource catalog served by `tools/list` and
/// `resources/list`.
#[derive(Debug, Clone)]
pub struct Catalog {
    tools: Vec<Tool>,
    resources: Vec<Resource>,
}

impl Catalog {
    /// Build a catalog, rejecting empty or duplicate tool names and
    /// duplicate resource URIs.
    pub fn new(tools: Vec<Tool>, resources: Vec<Resource>) -> Result<Self, CatalogError> {
        let mut names = HashSet::new();
        for tool in &tools {
            if tool.name.is_empty() {
                return Err(CatalogError::EmptyToolName);
            }
            if !names.insert(tool.name.as_str()) {
                return Err(CatalogError::DuplicateTool(tool.name.clone()));
            }
        }

        let mut uris = HashSet::new();
        for resource in &resources {
            if !uris.insert(resource.uri.as_str()) {
                return Err(CatalogError::DuplicateResource(resource.uri.clone()));
            }
        }

        Ok(Self { tools, resources })
    }

    /// The pod/customer catalog of the REST backend.
    pub fn standard() -> Result<Self, CatalogError> {
        Self::new(backend_catalog::tools(), backend_catalog::resources())
    }

    /// Check that every declared tool and resource can be served.
    pub fn ensure_supported(
        &self,
        supports_tool: impl Fn(&str) -> bool,
        supports_resource: impl Fn(&str) -> bool,
    ) -> Result<(), CatalogError> {
        if let Some(tool) = self.tools.iter().find(|t| !supports_tool(&t.name)) {
            return Err(CatalogError::UnsupportedTool(tool.name.clone()));
        }
        if let Some(resource) = self.resources.iter().find(|r| !supports_resource(&r.uri)) {
            return Err(CatalogError::UnsupportedResource(resource.uri.clone()));
        }
        Ok(())
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    pub fn tool(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn resource(&self, uri: &str) -> Option<&Resource> {
        self.resources.iter().find(|r| r.uri == uri)
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name.clone()).collect()
    }

    pub fn resource_uris(&self) -> Vec<String> {
        self.resources.iter().map(|r| r.uri.clone()).collect()
    }
}
