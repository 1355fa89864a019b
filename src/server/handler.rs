//! Allowlist service handler
//!
//! Looks up the organization, runs the allowlist check and tracks request
//! timing. Transports wrap this handler; it knows nothing about stdio or HTTP.

use crate::allowlist::{AllowlistResolver, GithubOrganization};
use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::metrics::RequestMetrics;
use crate::server::types::{AllowlistRequest, AllowlistResponse};
use crate::store::OrganizationStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Allowlist service handler
#[derive(Clone)]
pub struct AllowlistService {
    /// Service name
    name: String,
    /// Service version
    version: String,
    /// Allowlist resolver
    resolver: Arc<AllowlistResolver>,
    /// Organization records
    store: Arc<dyn OrganizationStore>,
    /// Request timing
    metrics: Arc<RequestMetrics>,
}

impl AllowlistService {
    /// Create a new handler from configuration
    pub fn new(
        config: &AppConfig,
        resolver: AllowlistResolver,
        store: Arc<dyn OrganizationStore>,
    ) -> Self {
        let metrics = Arc::new(RequestMetrics::new(Duration::from_secs(
            config.metrics.ttl_secs,
        )));
        Self::new_with_shared(config, Arc::new(resolver), store, metrics)
    }

    /// Create a new handler with shared (Arc-wrapped) resources
    pub fn new_with_shared(
        config: &AppConfig,
        resolver: Arc<AllowlistResolver>,
        store: Arc<dyn OrganizationStore>,
        metrics: Arc<RequestMetrics>,
    ) -> Self {
        info!(
            grammar = %resolver.grammar(),
            organizations = store.list_organizations().len(),
            "Initialized allowlist service"
        );

        Self {
            name: config.server.name.clone(),
            version: config.server.version.clone(),
            resolver,
            store,
            metrics,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn metrics(&self) -> &Arc<RequestMetrics> {
        &self.metrics
    }

    pub fn resolver(&self) -> &Arc<AllowlistResolver> {
        &self.resolver
    }

    /// Generate a request id for callers that did not send one
    pub fn new_request_id() -> String {
        format!("{:x}", rand::random::<u64>())
    }

    /// Run an allowlist check
    #[instrument(skip(self, request), fields(repository = %request.repository))]
    pub fn check(&self, request_id: &str, request: AllowlistRequest) -> Result<AllowlistResponse> {
        self.metrics.request_start(request_id, "check");
        let result = self.check_inner(request);
        if let Some(timing) = self.metrics.clear(request_id) {
            debug!(
                request_id,
                elapsed_ms = timing.elapsed_ms,
                success = result.is_ok(),
                "allowlist check finished"
            );
        }
        result
    }

    fn check_inner(&self, request: AllowlistRequest) -> Result<AllowlistResponse> {
        let org_name = request.organization_name().ok_or_else(|| {
            AppError::InvalidRequest(format!(
                "cannot determine organization for repository '{}'",
                request.repository
            ))
        })?;
        let org = self.store.get_organization(org_name)?;

        let decision = self.resolver.skip_allowlisted_bots(
            &org,
            &request.repository,
            &request.project_id,
            request.actors,
        );
        Ok(decision.into())
    }

    /// Fetch an organization record
    pub fn organization(&self, name: &str) -> Result<GithubOrganization> {
        Ok(self.store.get_organization(name)?)
    }

    /// Names of all organizations known to the store
    pub fn organizations(&self) -> Vec<String> {
        self.store.list_organizations()
    }
}
