//! Connected AI provider services

use serde_json::json;

use super::{normalize_provider, require_id, Agent};
use crate::constants::endpoints;
use crate::error::{ApiError, Result};
use crate::models::{ConnectedService, ServiceList, ServiceTestResult};
use crate::transport::RequestSpec;

impl Agent {
    /// List connected services and the providers available to connect
    pub async fn list_services(&self) -> Result<ServiceList> {
        self.call(RequestSpec::get(endpoints::SERVICES)).await
    }

    /// Store an API key for a provider
    ///
    /// The key is sent once and never logged or echoed in errors.
    pub async fn connect_service(&self, provider: &str, api_key: &str) -> Result<ConnectedService> {
        let provider = normalize_provider(provider)?;
        if api_key.trim().is_empty() {
            return Err(ApiError::invalid_input("invalid_api_key", "API key is required"));
        }

        let spec = RequestSpec::post(endpoints::SERVICES)
            .json(&json!({ "provider": provider, "apiKey": api_key }))?;
        let service: ConnectedService = self.call_wrapped(spec, "service").await?;

        tracing::info!(provider = %service.provider, "Connected service");
        Ok(service)
    }

    /// Activate or deactivate a connected service
    pub async fn update_service(&self, provider: &str, is_active: bool) -> Result<ConnectedService> {
        let provider = require_id(provider, "Provider")?.to_uppercase();
        let spec = RequestSpec::patch(endpoints::service(&provider))
            .json(&json!({ "isActive": is_active }))?;
        self.call_wrapped(spec, "service").await
    }

    /// Disconnect a provider and delete its stored key
    pub async fn disconnect_service(&self, provider: &str) -> Result<bool> {
        let provider = require_id(provider, "Provider")?.to_uppercase();
        self.pipeline
            .execute(&RequestSpec::delete(endpoints::service(&provider)))
            .await?;
        tracing::info!(provider = %provider, "Disconnected service");
        Ok(true)
    }

    /// Check that a connected provider's stored key works
    pub async fn test_service(&self, provider: &str) -> Result<ServiceTestResult> {
        let provider = require_id(provider, "Provider")?.to_uppercase();
        self.call(RequestSpec::post(endpoints::service_test(&provider)))
            .await
    }
}
