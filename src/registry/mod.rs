//! Provider registry
//!
//! Read-only catalog of the providers the relay can talk to. Built once at
//! startup and handed to the client and relay; there is no global instance.

mod catalog;

use std::collections::HashMap;

use serde::Serialize;

use crate::error::LlmError;

/// Model entry shown in the model picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDescriptor {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ModelDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            context_length: None,
            max_tokens: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_limits(mut self, context_length: u32, max_tokens: u32) -> Self {
        self.context_length = Some(context_length);
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Unified provider record maintained by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderDescriptor {
    pub id: String,
    pub name: String,
    pub base_url: String,
    pub requires_api_key: bool,
    pub requires_base_url: bool,
    pub models: Vec<ModelDescriptor>,
}

impl ProviderDescriptor {
    /// Hosted provider that needs a key.
    pub fn hosted(
        id: impl Into<String>,
        name: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            base_url: base_url.into(),
            requires_api_key: true,
            requires_base_url: false,
            models: Vec::new(),
        }
    }

    /// Local server: no key, base URL expected from the user.
    pub fn local(
        id: impl Into<String>,
        name: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            requires_api_key: false,
            requires_base_url: true,
            ..Self::hosted(id, name, base_url)
        }
    }

    pub fn with_model(mut self, model: ModelDescriptor) -> Self {
        self.models.push(model);
        self
    }

    pub fn model(&self, model_id: &str) -> Option<&ModelDescriptor> {
        self.models.iter().find(|m| m.id == model_id)
    }

    /// Override when present and non-blank, otherwise the catalog default.
    /// Trailing slashes are trimmed so paths can be appended directly.
    pub fn resolve_base_url<'a>(&'a self, override_url: Option<&'a str>) -> &'a str {
        override_url
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .unwrap_or(&self.base_url)
            .trim_end_matches('/')
    }
}

/// Provider catalog keyed by id, preserving registration order for listings.
#[derive(Debug, Clone, Default)]
pub struct ProviderRegistry {
    by_id: HashMap<String, usize>,
    providers: Vec<ProviderDescriptor>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated with every built-in provider.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for descriptor in catalog::builtin_providers() {
            registry.register(descriptor);
        }
        registry
    }

    /// Register a descriptor, replacing any previous entry with the same id.
    pub fn register(&mut self, descriptor: ProviderDescriptor) {
        match self.by_id.get(&descriptor.id) {
            Some(&idx) => self.providers[idx] = descriptor,
            None => {
                self.by_id
                    .insert(descriptor.id.clone(), self.providers.len());
                self.providers.push(descriptor);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&ProviderDescriptor> {
        self.by_id.get(id).map(|&idx| &self.providers[idx])
    }

    /// Like [`get`](Self::get) but fails with `ProviderNotFound`.
    pub fn resolve(&self, id: &str) -> Result<&ProviderDescriptor, LlmError> {
        self.get(id)
            .ok_or_else(|| LlmError::ProviderNotFound(format!("unknown provider id '{id}'")))
    }

    pub fn list(&self) -> &[ProviderDescriptor] {
        &self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}
