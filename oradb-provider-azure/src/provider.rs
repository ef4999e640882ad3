//! Autonomous Database provider implementation
//!
//! This module contains the lifecycle orchestrator: each transition is an
//! independent async operation bounded by a caller-supplied deadline. Nothing
//! is retried; the first terminal failure is returned.

use std::sync::Arc;

use log::{debug, info, warn};
use oradb_core::provider::{ErrorKind, Operation, ProviderError, ProviderResult};
use tokio::time::Instant;

use crate::client::{AutonomousDatabaseClient, caused_by_not_found};
use crate::config::ProviderConfig;
use crate::guard::{Presence, ensure_absent, requires_import};
use crate::identity::AutonomousDatabaseId;
use crate::models::{AutonomousDatabaseModel, DatabaseVariant, VariantConfig};
use crate::poller::{Poller, within};
use crate::projector::project;
use crate::remote::AutonomousDatabase;
use crate::updater::compute_change_set;
use crate::variant::{build_properties, check_distinct_regions};
use crate::workload;

/// Oracle Database@Azure autonomous database provider
pub struct AutonomousDatabaseProvider {
    client: Arc<dyn AutonomousDatabaseClient>,
    config: ProviderConfig,
}

impl AutonomousDatabaseProvider {
    pub fn new(client: Arc<dyn AutonomousDatabaseClient>, config: ProviderConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Deadline for an operation starting now
    pub fn deadline(&self, operation: Operation) -> Instant {
        Instant::now() + self.config.timeout_for(operation)
    }

    fn poller(&self) -> Poller<'_> {
        Poller::new(self.client.as_ref(), self.config.poll_settings())
    }

    // =========================================================================
    // Remote Methods
    // =========================================================================

    /// Get a database; `None` when the remote system reports it absent
    async fn get_database(
        &self,
        id: &AutonomousDatabaseId,
        deadline: Instant,
    ) -> ProviderResult<Option<AutonomousDatabase>> {
        within(deadline, format!("{} to be read", id), async {
            match self.client.get(id).await {
                Ok(db) => Ok(Some(db)),
                Err(e) if e.is_not_found() => Ok(None),
                Err(e) => Err(e.context(format!("reading {}", id))),
            }
        })
        .await
    }

    /// Get the database a clone or standby is derived from
    async fn fetch_source(
        &self,
        source_id: &str,
        deadline: Instant,
    ) -> ProviderResult<AutonomousDatabase> {
        let source = AutonomousDatabaseId::parse(source_id)?;
        self.get_database(&source, deadline).await?.ok_or_else(|| {
            ProviderError::validation(format!("source database {} does not exist", source))
        })
    }

    // =========================================================================
    // Lifecycle Operations
    // =========================================================================

    /// Create the database described by `model` and return what was stored
    pub async fn create_database(
        &self,
        model: &AutonomousDatabaseModel,
        deadline: Instant,
    ) -> ProviderResult<(AutonomousDatabaseId, AutonomousDatabaseModel)> {
        let id = model.identity(&self.config.subscription_id);
        let created = self
            .create_inner(&id, model, deadline)
            .await
            .map_err(|e| e.with_identifier(&id).during(Operation::Create))?;
        Ok((id, created))
    }

    async fn create_inner(
        &self,
        id: &AutonomousDatabaseId,
        model: &AutonomousDatabaseModel,
        deadline: Instant,
    ) -> ProviderResult<AutonomousDatabaseModel> {
        let variant = model.variant.variant();

        // A standby in its primary's region is rejected before any remote call
        if let VariantConfig::CrossRegionDisasterRecovery(dr) = &model.variant {
            check_distinct_regions(&model.location, &dr.source_location)?;
        }

        let presence = within(
            deadline,
            format!("the presence check of {}", id),
            ensure_absent(self.client.as_ref(), id),
        )
        .await?;
        if let Presence::RequiresImport(_) = presence {
            return Err(requires_import(id));
        }

        let source = match model.variant.source_id() {
            Some(source_id) => Some(self.fetch_source(source_id, deadline).await?),
            None => None,
        };

        if let (VariantConfig::Clone(_) | VariantConfig::CloneFromBackupTimestamp(_), Some(source)) =
            (&model.variant, &source)
            && let Some(base) = &model.base
        {
            let source_workload = source
                .properties
                .as_ref()
                .and_then(|p| p.base().db_workload);
            workload::validate(
                model.variant.source_id().unwrap_or_default(),
                source_workload,
                base.db_workload,
            )?;
        }

        let body = AutonomousDatabase {
            id: None,
            name: None,
            location: model.location.clone(),
            tags: model.tags.clone(),
            properties: Some(build_properties(model, source.as_ref())?),
        };

        info!("creating {} database {}", variant, id);
        self.poller()
            .submit_then_poll(Operation::Create, id, deadline, body, |body| {
                self.client.begin_create_or_update(id, body)
            })
            .await?;

        let stored = self.get_database(id, deadline).await?.ok_or_else(|| {
            ProviderError::new(
                ErrorKind::NotFound,
                format!("{} was not found after its creation completed", id),
            )
        })?;
        info!("created {}", id);

        project(id, &stored, variant, Some(model))
    }

    /// Read the database behind `id`; `None` when it no longer exists
    pub async fn read_database(
        &self,
        id: &AutonomousDatabaseId,
        variant: DatabaseVariant,
        prior: Option<&AutonomousDatabaseModel>,
        deadline: Instant,
    ) -> ProviderResult<Option<AutonomousDatabaseModel>> {
        let tag = |e: ProviderError| e.with_identifier(id).during(Operation::Read);

        let Some(remote) = self.get_database(id, deadline).await.map_err(tag)? else {
            warn!("{} no longer exists, removing it from state", id);
            return Ok(None);
        };

        project(id, &remote, variant, prior).map(Some).map_err(tag)
    }

    /// Apply the difference between `previous` and `desired`
    pub async fn update_database(
        &self,
        id: &AutonomousDatabaseId,
        previous: &AutonomousDatabaseModel,
        desired: &AutonomousDatabaseModel,
        deadline: Instant,
    ) -> ProviderResult<AutonomousDatabaseModel> {
        self.update_inner(id, previous, desired, deadline)
            .await
            .map_err(|e| e.with_identifier(id).during(Operation::Update))
    }

    async fn update_inner(
        &self,
        id: &AutonomousDatabaseId,
        previous: &AutonomousDatabaseModel,
        desired: &AutonomousDatabaseModel,
        deadline: Instant,
    ) -> ProviderResult<AutonomousDatabaseModel> {
        let variant = desired.variant.variant();

        // Carry the last known password when the desired one is unset
        let known = if desired.admin_password().is_some() {
            desired
        } else {
            previous
        };

        let remote = self.get_database(id, deadline).await?.ok_or_else(|| {
            ProviderError::new(ErrorKind::NotFound, format!("{} no longer exists", id))
        })?;
        let current = project(id, &remote, variant, Some(known))?;

        let changes = compute_change_set(previous, desired);
        if !changes.requires_replacement.is_empty() {
            return Err(ProviderError::validation(format!(
                "cannot change {} in place; the database has to be replaced",
                changes.requires_replacement.join(", ")
            )));
        }
        if changes.is_empty() {
            debug!("{} has no changes", id);
            return Ok(current);
        }

        debug!(
            "{} changes: general={} tags={} schedule={}",
            id,
            !changes.general.is_empty(),
            changes.tags.is_some(),
            changes.schedule.is_some()
        );

        let poller = self.poller();
        if let Some(update) = changes.general_update() {
            info!("updating {}", id);
            poller
                .submit_then_poll(Operation::Update, id, deadline, update, |update| {
                    self.client.begin_update(id, update)
                })
                .await?;
        }
        if let Some(update) = changes.schedule_update() {
            info!("updating long-term backup schedule of {}", id);
            poller
                .submit_then_poll(Operation::Update, id, deadline, update, |update| {
                    self.client.begin_update(id, update)
                })
                .await?;
        }

        let updated = self.get_database(id, deadline).await?.ok_or_else(|| {
            ProviderError::new(
                ErrorKind::NotFound,
                format!("{} was not found after its update completed", id),
            )
        })?;
        project(id, &updated, variant, Some(known))
    }

    /// Delete the database behind `id`; an already absent object is not an error
    pub async fn delete_database(
        &self,
        id: &AutonomousDatabaseId,
        deadline: Instant,
    ) -> ProviderResult<()> {
        info!("deleting {}", id);
        match self
            .poller()
            .submit_then_poll(Operation::Delete, id, deadline, (), |_| {
                self.client.begin_delete(id)
            })
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if caused_by_not_found(&e) => {
                info!("{} was already deleted", id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Checks that can run before anything exists
    ///
    /// `existing_identifier` is set once the database has been created; the
    /// workload of an existing clone is fixed, so the check is skipped.
    pub async fn validate_plan(
        &self,
        model: &AutonomousDatabaseModel,
        existing_identifier: Option<&str>,
        deadline: Instant,
    ) -> ProviderResult<()> {
        self.plan_checks(model, existing_identifier, deadline)
            .await
            .map_err(|e| e.with_identifier(model.identity(&self.config.subscription_id)))
    }

    async fn plan_checks(
        &self,
        model: &AutonomousDatabaseModel,
        existing_identifier: Option<&str>,
        deadline: Instant,
    ) -> ProviderResult<()> {
        match &model.variant {
            VariantConfig::Regular => Ok(()),
            VariantConfig::CrossRegionDisasterRecovery(dr) => {
                check_distinct_regions(&model.location, &dr.source_location)
            }
            VariantConfig::Clone(_) | VariantConfig::CloneFromBackupTimestamp(_) => {
                let (Some(source_id), Some(base)) = (model.variant.source_id(), &model.base)
                else {
                    return Ok(());
                };
                let source_workload = match existing_identifier {
                    Some(_) => None,
                    None => self
                        .fetch_source(source_id, deadline)
                        .await?
                        .properties
                        .and_then(|p| p.base().db_workload),
                };
                workload::validate_for_plan(
                    existing_identifier,
                    source_id,
                    source_workload,
                    base.db_workload,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::client::{OperationStatus, RemoteError};
    use crate::models::{LicenseModel, LifecycleState, WorkloadType};
    use crate::testing::{
        Call, FakeClient, SUBSCRIPTION, backup_clone_model, clone_model, db_id, regular_model,
        remote_regular, standby_model,
    };

    fn provider(client: &Arc<FakeClient>) -> AutonomousDatabaseProvider {
        let mut config = ProviderConfig::new(SUBSCRIPTION).unwrap();
        config.poll_interval = Duration::from_millis(1);
        AutonomousDatabaseProvider::new(client.clone(), config)
    }

    fn soon() -> Instant {
        Instant::now() + Duration::from_secs(5)
    }

    #[tokio::test]
    async fn create_regular_round_trips() {
        let client = Arc::new(FakeClient::new());
        let provider = provider(&client);
        let model = regular_model("adb01");

        let (id, created) = provider.create_database(&model, soon()).await.unwrap();

        assert_eq!(id, db_id("adb01"));
        assert_eq!(created.lifecycle_state, Some(LifecycleState::Available));
        assert_eq!(created.base, model.base);
        assert_eq!(created.admin_password(), model.admin_password());
        assert_eq!(client.submissions(), 1);

        let stored = client.stored(&id).unwrap();
        let props = stored.properties.unwrap();
        assert_eq!(props.variant(), DatabaseVariant::Regular);
        assert_eq!(props.base().admin_password, model.admin_password().map(String::from));
    }

    #[tokio::test]
    async fn create_over_existing_object_requires_import() {
        let client = Arc::new(FakeClient::new());
        client.insert(&db_id("adb01"), remote_regular("eastus", Some(WorkloadType::Dw)));
        let provider = provider(&client);

        let err = provider
            .create_database(&regular_model("adb01"), soon())
            .await
            .unwrap_err();

        assert!(err.is_requires_import());
        assert_eq!(err.operation, Some(Operation::Create));
        assert_eq!(client.submissions(), 0);
    }

    #[tokio::test]
    async fn warehouse_clone_of_transaction_processing_is_created() {
        let client = Arc::new(FakeClient::new());
        let source = db_id("src");
        client.insert(&source, remote_regular("eastus", Some(WorkloadType::Oltp)));
        let provider = provider(&client);

        let model = clone_model("c1", &source, WorkloadType::Dw);
        let (_, created) = provider.create_database(&model, soon()).await.unwrap();

        assert_eq!(created.variant, model.variant);
        assert_eq!(created.base.unwrap().db_workload, WorkloadType::Dw);
    }

    #[tokio::test]
    async fn incompatible_clone_workload_is_rejected_before_submission() {
        let client = Arc::new(FakeClient::new());
        let source = db_id("src");
        client.insert(&source, remote_regular("eastus", Some(WorkloadType::Oltp)));
        let provider = provider(&client);

        let err = provider
            .create_database(&clone_model("c1", &source, WorkloadType::Apex), soon())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("APEX"));
        assert!(err.message.contains("OLTP"));
        assert_eq!(client.submissions(), 0);
    }

    #[tokio::test]
    async fn missing_source_is_rejected() {
        let client = Arc::new(FakeClient::new());
        let provider = provider(&client);

        let err = provider
            .create_database(&backup_clone_model("b1", &db_id("nowhere")), soon())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("does not exist"));
        assert_eq!(client.submissions(), 0);
    }

    #[tokio::test]
    async fn standby_in_source_region_is_rejected_without_remote_calls() {
        let client = Arc::new(FakeClient::new());
        let provider = provider(&client);
        let model = standby_model("dr", "eastus", &db_id("primary"), "East US");

        let err = provider.create_database(&model, soon()).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.identifier, Some(db_id("dr").to_string()));
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn standby_copies_source_configuration() {
        let client = Arc::new(FakeClient::new());
        let primary = db_id("primary");
        client.insert(&primary, remote_regular("eastus", Some(WorkloadType::Oltp)));
        let provider = provider(&client);
        let model = standby_model("dr", "westus", &primary, "eastus");

        let (id, created) = provider.create_database(&model, soon()).await.unwrap();

        let Some(Call::CreateOrUpdate(_, body)) = client
            .calls()
            .into_iter()
            .find(|c| matches!(c, Call::CreateOrUpdate(..)))
        else {
            panic!("no create submitted");
        };
        let dr = body.properties.as_ref().unwrap().as_disaster_recovery().unwrap().clone();
        assert_eq!(dr.base.compute_count, Some(4.0));
        assert_eq!(dr.base.license_model, Some(LicenseModel::BringYourOwnLicense));
        assert_eq!(dr.base.subnet_id.as_deref(), Some(model.network.subnet_id.as_str()));
        assert_eq!(dr.source_location, "eastus");

        assert_eq!(id, db_id("dr"));
        assert_eq!(created.base.unwrap().db_workload, WorkloadType::Oltp);
        assert_eq!(created.variant, model.variant);
    }

    #[tokio::test]
    async fn read_of_deleted_object_is_gone() {
        let client = Arc::new(FakeClient::new());
        let provider = provider(&client);

        let read = provider
            .read_database(&db_id("adb01"), DatabaseVariant::Regular, None, soon())
            .await
            .unwrap();
        assert_eq!(read, None);
    }

    #[tokio::test]
    async fn read_keeps_password_from_prior() {
        let client = Arc::new(FakeClient::new());
        let provider = provider(&client);
        let model = regular_model("adb01");
        let (id, _) = provider.create_database(&model, soon()).await.unwrap();

        let read = provider
            .read_database(&id, DatabaseVariant::Regular, Some(&model), soon())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read.admin_password(), model.admin_password());
    }

    #[tokio::test]
    async fn read_of_other_variant_is_a_mismatch() {
        let client = Arc::new(FakeClient::new());
        let id = db_id("adb01");
        client.insert(&id, remote_regular("eastus", Some(WorkloadType::Dw)));
        let provider = provider(&client);

        let err = provider
            .read_database(&id, DatabaseVariant::CrossRegionDisasterRecovery, None, soon())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::VariantMismatch);
        assert_eq!(err.operation, Some(Operation::Read));
        assert_eq!(err.identifier, Some(id.to_string()));
    }

    #[tokio::test]
    async fn read_failure_is_not_gone() {
        let client = Arc::new(FakeClient::new());
        client.fail_gets_with(RemoteError::Transport("connection reset".to_string()));
        let provider = provider(&client);

        let err = provider
            .read_database(&db_id("adb01"), DatabaseVariant::Regular, None, soon())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Remote);
    }

    #[tokio::test]
    async fn update_without_changes_submits_nothing() {
        let client = Arc::new(FakeClient::new());
        let provider = provider(&client);
        let model = regular_model("adb01");
        let (id, created) = provider.create_database(&model, soon()).await.unwrap();
        let before = client.submissions();

        let updated = provider
            .update_database(&id, &created, &model, soon())
            .await
            .unwrap();

        assert_eq!(client.submissions(), before);
        assert_eq!(updated.base, created.base);
    }

    #[tokio::test]
    async fn schedule_change_is_submitted_separately() {
        let client = Arc::new(FakeClient::new());
        let provider = provider(&client);
        let model = regular_model("adb01");
        let (id, created) = provider.create_database(&model, soon()).await.unwrap();

        let mut desired = model.clone();
        let base = desired.base.as_mut().unwrap();
        base.compute_count = 6.0;
        base.long_term_backup_schedule
            .as_mut()
            .unwrap()
            .retention_period_in_days = 120;

        let updated = provider
            .update_database(&id, &created, &desired, soon())
            .await
            .unwrap();

        let updates: Vec<_> = client
            .calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Update(_, body) => Some(body),
                _ => None,
            })
            .collect();
        assert_eq!(updates.len(), 2);
        let general = updates[0].properties.as_ref().unwrap();
        assert_eq!(general.compute_count, Some(6.0));
        assert_eq!(general.long_term_backup_schedule, None);
        let schedule = updates[1].properties.as_ref().unwrap();
        assert_eq!(schedule.compute_count, None);
        assert_eq!(
            schedule
                .long_term_backup_schedule
                .as_ref()
                .unwrap()
                .retention_period_in_days,
            Some(120)
        );

        let base = updated.base.unwrap();
        assert_eq!(base.compute_count, 6.0);
        assert_eq!(base.long_term_backup_schedule.unwrap().retention_period_in_days, 120);
    }

    #[tokio::test]
    async fn immutable_change_is_rejected() {
        let client = Arc::new(FakeClient::new());
        let provider = provider(&client);
        let model = regular_model("adb01");
        let (id, created) = provider.create_database(&model, soon()).await.unwrap();
        let before = client.submissions();

        let mut desired = model.clone();
        desired.base.as_mut().unwrap().db_workload = WorkloadType::Oltp;

        let err = provider
            .update_database(&id, &created, &desired, soon())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(err.message.contains("db_workload"));
        assert_eq!(client.submissions(), before);
    }

    #[tokio::test]
    async fn update_of_missing_object_is_not_found() {
        let client = Arc::new(FakeClient::new());
        let provider = provider(&client);
        let model = regular_model("adb01");

        let err = provider
            .update_database(&db_id("adb01"), &model, &model, soon())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
        assert_eq!(err.operation, Some(Operation::Update));
    }

    #[tokio::test]
    async fn delete_removes_and_tolerates_absence() {
        let client = Arc::new(FakeClient::new());
        let provider = provider(&client);
        let (id, _) = provider
            .create_database(&regular_model("adb01"), soon())
            .await
            .unwrap();

        provider.delete_database(&id, soon()).await.unwrap();
        assert!(client.stored(&id).is_none());

        provider.delete_database(&id, soon()).await.unwrap();
    }

    #[tokio::test]
    async fn delete_rejected_as_not_found_succeeds() {
        let client = Arc::new(FakeClient::new());
        client.fail_deletes_with(RemoteError::not_found("adb01 was not found"));
        let provider = provider(&client);

        provider.delete_database(&db_id("adb01"), soon()).await.unwrap();
        assert_eq!(client.submissions(), 1);
        assert_eq!(client.status_checks(), 0);
    }

    #[tokio::test]
    async fn delete_rejected_otherwise_is_an_error() {
        let client = Arc::new(FakeClient::new());
        client.fail_deletes_with(RemoteError::Status {
            status: 409,
            code: "Conflict".to_string(),
            message: "another operation is in progress".to_string(),
        });
        let provider = provider(&client);

        let err = provider
            .delete_database(&db_id("adb01"), soon())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Remote);
        assert_eq!(err.operation, Some(Operation::Delete));
        assert_eq!(err.identifier, Some(db_id("adb01").to_string()));
    }

    #[tokio::test]
    async fn failed_operation_is_propagated() {
        let client = Arc::new(FakeClient::new());
        client.script_statuses(vec![
            OperationStatus::InProgress,
            OperationStatus::Failed {
                reason: "QuotaExceeded".to_string(),
            },
        ]);
        let provider = provider(&client);

        let err = provider
            .create_database(&regular_model("adb01"), soon())
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::OperationFailed);
        assert_eq!(err.operation, Some(Operation::Create));
        assert!(err.message.contains("QuotaExceeded"));
        assert_eq!(client.submissions(), 1);
    }

    #[tokio::test]
    async fn hanging_operation_times_out_at_the_deadline() {
        let client = Arc::new(FakeClient::new());
        client.hang_operations();
        let provider = provider(&client);

        let err = provider
            .delete_database(&db_id("adb01"), Instant::now() + Duration::from_millis(30))
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert_eq!(err.operation, Some(Operation::Delete));
    }

    #[tokio::test]
    async fn plan_validation_checks_workload_only_before_creation() {
        let client = Arc::new(FakeClient::new());
        let source = db_id("src");
        client.insert(&source, remote_regular("eastus", Some(WorkloadType::Oltp)));
        let provider = provider(&client);
        let model = clone_model("c1", &source, WorkloadType::Apex);

        let err = provider.validate_plan(&model, None, soon()).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.identifier, Some(db_id("c1").to_string()));

        let existing = db_id("c1").to_string();
        provider
            .validate_plan(&model, Some(&existing), soon())
            .await
            .unwrap();
    }
}
