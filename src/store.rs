//! Organization store
//!
//! Supplies the organization record (and its `skip_cla` map) for a GitHub
//! organization. Lookups are case-insensitive, matching GitHub's handling of
//! organization names.

use crate::allowlist::{GithubOrganization, lint_skip_cla};
use crate::error::{ConfigError, StoreError};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

/// Source of organization records
pub trait OrganizationStore: Send + Sync {
    fn get_organization(&self, name: &str) -> Result<GithubOrganization, StoreError>;

    /// Names of all known organizations, sorted
    fn list_organizations(&self) -> Vec<String>;
}

/// Organization records held in memory
#[derive(Debug, Default)]
pub struct InMemoryOrganizationStore {
    orgs: RwLock<HashMap<String, GithubOrganization>>,
}

impl InMemoryOrganizationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_organizations(orgs: impl IntoIterator<Item = GithubOrganization>) -> Self {
        let store = Self::new();
        for org in orgs {
            store.upsert(org);
        }
        store
    }

    /// Parse a JSON array of organization records
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let orgs: Vec<GithubOrganization> = serde_json::from_str(json)
            .map_err(|e| ConfigError::Load(format!("invalid organizations file: {}", e)))?;
        Ok(Self::from_organizations(orgs))
    }

    /// Load a JSON array of organization records from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let store = Self::from_json_str(&json)?;
        info!(
            path = %path.display(),
            organizations = store.len(),
            "Loaded organization records"
        );
        Ok(store)
    }

    fn write_orgs(&self) -> RwLockWriteGuard<'_, HashMap<String, GithubOrganization>> {
        self.orgs.write().unwrap_or_else(|poisoned| {
            warn!("organization store lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn read_orgs(&self) -> RwLockReadGuard<'_, HashMap<String, GithubOrganization>> {
        self.orgs.read().unwrap_or_else(|poisoned| {
            warn!("organization store lock poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Insert or replace an organization record
    ///
    /// Invalid regexes in `skip_cla` are accepted and only warned about; they
    /// never match at check time.
    pub fn upsert(&self, org: GithubOrganization) {
        if let Some(skip_cla) = &org.skip_cla {
            for problem in lint_skip_cla(skip_cla) {
                warn!(
                    organization = %org.organization_name,
                    error = %problem,
                    "skip_cla contains a pattern that will never match"
                );
            }
        }
        self.write_orgs()
            .insert(org.organization_name.to_lowercase(), org);
    }

    pub fn remove(&self, name: &str) -> Option<GithubOrganization> {
        self.write_orgs().remove(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.read_orgs().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_orgs().is_empty()
    }
}

impl OrganizationStore for InMemoryOrganizationStore {
    fn get_organization(&self, name: &str) -> Result<GithubOrganization, StoreError> {
        self.read_orgs()
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| StoreError::OrganizationNotFound {
                organization: name.to_string(),
            })
    }

    fn list_organizations(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .read_orgs()
            .values()
            .map(|o| o.organization_name.clone())
            .collect();
        names.sort_unstable();
        names
    }
}
