//! Variant property builder
//!
//! Turns a desired model into the property union member submitted on create.
//! Shared fields go into [`BaseProperties`]; each member only carries the fields
//! of its own variant.

use oradb_core::provider::{ErrorKind, ProviderError, ProviderResult};

use crate::identity::AutonomousDatabaseId;
use crate::models::{
    AutonomousDatabaseModel, BaseConfig, LongTermBackupSchedule, NetworkConfig, SourceType,
    VariantConfig,
};
use crate::remote::{
    AutonomousDatabase, BackupCloneProperties, BaseProperties, CloneProperties, CustomerContact,
    DatabaseProperties, DisasterRecoveryProperties, LongTermBackUpScheduleDetails,
};
use crate::utils::same_location;

pub fn schedule_details(schedule: &LongTermBackupSchedule) -> LongTermBackUpScheduleDetails {
    LongTermBackUpScheduleDetails {
        repeat_cadence: Some(schedule.repeat_cadence),
        time_of_backup: Some(schedule.time_of_backup),
        retention_period_in_days: Some(schedule.retention_period_in_days),
        is_disabled: Some(!schedule.enabled),
    }
}

pub fn customer_contacts(emails: &[String]) -> Vec<CustomerContact> {
    emails
        .iter()
        .map(|email| CustomerContact {
            email: email.clone(),
        })
        .collect()
}

/// Shared properties from the caller's base fields and network attachment
pub fn base_properties(base: &BaseConfig, network: &NetworkConfig) -> BaseProperties {
    BaseProperties {
        admin_password: Some(base.admin_password.clone()),
        backup_retention_period_in_days: Some(base.backup_retention_period_in_days),
        character_set: Some(base.character_set.clone()),
        ncharacter_set: Some(base.national_character_set.clone()),
        compute_count: Some(base.compute_count),
        compute_model: Some(base.compute_model),
        customer_contacts: Some(customer_contacts(&base.customer_contacts)),
        data_storage_size_in_tbs: Some(base.data_storage_size_in_tbs),
        db_version: Some(base.db_version.clone()),
        db_workload: Some(base.db_workload),
        display_name: Some(base.display_name.clone()),
        is_auto_scaling_enabled: Some(base.auto_scaling_enabled),
        is_auto_scaling_for_storage_enabled: Some(base.auto_scaling_for_storage_enabled),
        is_mtls_connection_required: Some(base.mtls_connection_required),
        license_model: Some(base.license_model),
        long_term_backup_schedule: base.long_term_backup_schedule.as_ref().map(schedule_details),
        subnet_id: Some(network.subnet_id.clone()),
        vnet_id: Some(network.virtual_network_id.clone()),
        whitelisted_ips: Some(base.allowed_ip_addresses.clone()),
        lifecycle_state: None,
        provisioning_state: None,
        ocid: None,
    }
}

/// A standby must live in a different region than its primary
pub fn check_distinct_regions(target_location: &str, source_location: &str) -> ProviderResult<()> {
    if same_location(target_location, source_location) {
        return Err(ProviderError::validation(format!(
            "a cross-region disaster recovery database must be in a different region than its source: \
             target location {:?} and source location {:?} are the same region",
            target_location, source_location
        )));
    }
    Ok(())
}

fn require_base(model: &AutonomousDatabaseModel) -> ProviderResult<&BaseConfig> {
    let base = model.base.as_ref().ok_or_else(|| {
        ProviderError::malformed(format!(
            "{} databases require the base configuration (admin password, sizing, workload)",
            model.variant.variant()
        ))
    })?;
    if base.admin_password.is_empty() {
        return Err(ProviderError::malformed("`admin_password` must not be empty"));
    }
    Ok(base)
}

/// Parse a source identifier into its canonical form
fn canonical_source(source_id: &str) -> ProviderResult<String> {
    AutonomousDatabaseId::parse(source_id).map(|id| id.to_string())
}

/// Build the property union member for `model`
///
/// `source` is the current remote object behind the model's source identity; it
/// is only consulted for cross-region disaster recovery, whose shared
/// properties are copied from it.
pub fn build_properties(
    model: &AutonomousDatabaseModel,
    source: Option<&AutonomousDatabase>,
) -> ProviderResult<DatabaseProperties> {
    match &model.variant {
        VariantConfig::Regular => {
            let base = require_base(model)?;
            Ok(DatabaseProperties::Regular(base_properties(
                base,
                &model.network,
            )))
        }
        VariantConfig::Clone(clone) => {
            let base = require_base(model)?;
            Ok(DatabaseProperties::Clone(CloneProperties {
                base: base_properties(base, &model.network),
                source: SourceType::Database,
                source_id: canonical_source(&clone.source_id)?,
                clone_type: clone.clone_type,
                refreshable_model: clone.refreshable_model,
                time_until_reconnect_clone_enabled: clone.time_until_reconnect_clone_enabled,
            }))
        }
        VariantConfig::CloneFromBackupTimestamp(clone) => {
            let base = require_base(model)?;
            if clone.backup_timestamp.is_some() && clone.use_latest_available_backup_timestamp {
                return Err(ProviderError::malformed(
                    "only one of `backup_timestamp` and `use_latest_available_backup_timestamp` may be set",
                ));
            }
            let (timestamp, use_latest) = match clone.backup_timestamp {
                Some(ts) => (Some(ts), None),
                None => (None, Some(true)),
            };
            Ok(DatabaseProperties::CloneFromBackupTimestamp(
                BackupCloneProperties {
                    base: base_properties(base, &model.network),
                    source: SourceType::BackupFromTimestamp,
                    source_id: canonical_source(&clone.source_id)?,
                    clone_type: clone.clone_type,
                    timestamp,
                    use_latest_available_backup_time_stamp: use_latest,
                },
            ))
        }
        VariantConfig::CrossRegionDisasterRecovery(dr) => {
            if model.base.is_some() {
                return Err(ProviderError::malformed(
                    "cross-region disaster recovery databases take their configuration from the source database",
                ));
            }
            let source_id = canonical_source(&dr.source_id)?;
            check_distinct_regions(&model.location, &dr.source_location)?;

            let source = source.ok_or_else(|| {
                ProviderError::validation(format!(
                    "source database {} must be read before building a standby",
                    source_id
                ))
            })?;
            check_distinct_regions(&model.location, &source.location)?;

            let source_props = source.properties.as_ref().ok_or_else(|| {
                ProviderError::new(
                    ErrorKind::Remote,
                    format!("source database {} returned no properties", source_id),
                )
            })?;

            let mut base = source_props.base().clone();
            base.subnet_id = Some(model.network.subnet_id.clone());
            base.vnet_id = Some(model.network.virtual_network_id.clone());
            base.lifecycle_state = None;
            base.provisioning_state = None;
            base.ocid = None;

            Ok(DatabaseProperties::CrossRegionDisasterRecovery(
                DisasterRecoveryProperties {
                    base,
                    source: SourceType::CrossRegionDisasterRecovery,
                    source_id,
                    source_location: dr.source_location.clone(),
                    remote_disaster_recovery_type: dr.remote_disaster_recovery_type,
                    is_replicate_automatic_backups: Some(dr.replicate_automatic_backups_enabled),
                },
            ))
        }
    }
}
