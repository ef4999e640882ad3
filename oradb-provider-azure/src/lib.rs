//! Oracle Database@Azure Provider
//!
//! Manages Oracle Autonomous Databases through the Azure management API: plain
//! databases, clones of a live database, clones from a backup point in time, and
//! cross-region disaster recovery standbys.
//!
//! ## Module Structure
//!
//! - `resources` - Resource type definitions and attribute tables
//! - `codec` - Attribute maps to and from the typed model
//! - `provider` - AutonomousDatabaseProvider, the lifecycle orchestrator
//! - `variant` - Per-variant create payloads
//! - `workload` - Clone workload compatibility
//! - `guard` - Existence check before create
//! - `poller` - Submit-then-poll for long-running operations
//! - `projector` - Remote object back onto the model
//! - `updater` - Drift-scoped change sets
//! - `client` - Remote API boundary
//! - `utils` - Helper functions for value normalization

pub mod client;
pub mod codec;
pub mod config;
pub mod guard;
pub mod identity;
pub mod models;
pub mod poller;
pub mod projector;
pub mod provider;
pub mod remote;
pub mod resources;
pub mod updater;
pub mod utils;
pub mod variant;
pub mod workload;

#[cfg(test)]
mod testing;

// Re-export main types
pub use client::{AutonomousDatabaseClient, OperationHandle, OperationStatus, RemoteError};
pub use config::{ConfigError, ProviderConfig, Timeouts};
pub use identity::AutonomousDatabaseId;
pub use provider::AutonomousDatabaseProvider;
pub use utils::{convert_enum_value, normalize_location};

use oradb_core::provider::{
    BoxFuture, Operation, Provider, ProviderError, ProviderResult, ResourceType,
};
use oradb_core::resource::{Resource, ResourceId, State};

use codec::{decode_resource, decode_state, encode_model};
use resources::{get_resource_config, resource_types};

fn variant_of(id: &ResourceId) -> ProviderResult<models::DatabaseVariant> {
    get_resource_config(&id.resource_type)
        .map(|config| config.variant)
        .ok_or_else(|| {
            ProviderError::malformed(format!("unknown resource type `{}`", id.resource_type))
        })
}

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for AutonomousDatabaseProvider {
    fn name(&self) -> &'static str {
        "azure"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        resource_types()
    }

    fn validate(
        &self,
        resource: &Resource,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        let resource = resource.clone();
        let identifier = identifier.map(|s| s.to_string());
        Box::pin(async move {
            let model = decode_resource(&resource)?;
            self.validate_plan(&model, identifier.as_deref(), self.deadline(Operation::Read))
                .await
                .map_err(|e| e.for_resource(resource.id.clone()))
        })
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
        prior: Option<&State>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.map(|s| s.to_string());
        let prior = prior.filter(|s| s.exists).cloned();
        Box::pin(async move {
            let Some(identifier) = identifier else {
                return Ok(State::not_found(id));
            };
            let result = async {
                let db_id = AutonomousDatabaseId::parse(&identifier)?;
                let variant = variant_of(&id)?;
                let prior = prior.as_ref().map(decode_state).transpose()?;
                self.read_database(&db_id, variant, prior.as_ref(), self.deadline(Operation::Read))
                    .await
            }
            .await
            .map_err(|e| e.for_resource(id.clone()))?;

            Ok(match result {
                Some(model) => State::existing(id, encode_model(&model)).with_identifier(identifier),
                None => State::not_found(id),
            })
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            let model = decode_resource(&resource)?;
            let (db_id, created) = self
                .create_database(&model, self.deadline(Operation::Create))
                .await
                .map_err(|e| e.for_resource(resource.id.clone()))?;
            Ok(State::existing(resource.id, encode_model(&created)).with_identifier(db_id.to_string()))
        })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move {
            let updated = async {
                let db_id = AutonomousDatabaseId::parse(&identifier)?;
                let previous = decode_state(&from)?;
                let desired = decode_resource(&to)?;
                self.update_database(&db_id, &previous, &desired, self.deadline(Operation::Update))
                    .await
            }
            .await
            .map_err(|e| e.for_resource(id.clone()))?;
            Ok(State::existing(id, encode_model(&updated)).with_identifier(identifier))
        })
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        Box::pin(async move {
            let db_id =
                AutonomousDatabaseId::parse(&identifier).map_err(|e| e.for_resource(id.clone()))?;
            self.delete_database(&db_id, self.deadline(Operation::Delete))
                .await
                .map_err(|e| e.for_resource(id))
        })
    }
}
