//! Projection of a remote object back onto the model
//!
//! The remote object is narrowed to the expected union member first; a
//! different member is an error, never a partial projection.

use oradb_core::provider::{ErrorKind, ProviderError, ProviderResult};

use crate::identity::AutonomousDatabaseId;
use crate::models::{
    AutonomousDatabaseModel, BackupCloneConfig, BaseConfig, CloneConfig, DatabaseVariant,
    DisasterRecoveryConfig, LongTermBackupSchedule, NetworkConfig, VariantConfig,
};
use crate::remote::{AutonomousDatabase, BaseProperties, DatabaseProperties, LongTermBackUpScheduleDetails};
use crate::utils::same_location;

fn missing(id: &AutonomousDatabaseId, field: &str) -> ProviderError {
    ProviderError::new(
        ErrorKind::Remote,
        format!("remote object {} did not report `{}`", id, field),
    )
}

fn schedule_from(details: &LongTermBackUpScheduleDetails) -> Option<LongTermBackupSchedule> {
    Some(LongTermBackupSchedule {
        repeat_cadence: details.repeat_cadence?,
        time_of_backup: details.time_of_backup?,
        retention_period_in_days: details.retention_period_in_days.unwrap_or_default(),
        enabled: !details.is_disabled.unwrap_or(false),
    })
}

fn base_from(
    id: &AutonomousDatabaseId,
    props: &BaseProperties,
    admin_password: Option<&str>,
) -> ProviderResult<BaseConfig> {
    Ok(BaseConfig {
        admin_password: admin_password.unwrap_or_default().to_string(),
        backup_retention_period_in_days: props.backup_retention_period_in_days.unwrap_or_default(),
        character_set: props.character_set.clone().unwrap_or_default(),
        national_character_set: props.ncharacter_set.clone().unwrap_or_default(),
        compute_count: props.compute_count.ok_or_else(|| missing(id, "computeCount"))?,
        compute_model: props.compute_model.ok_or_else(|| missing(id, "computeModel"))?,
        data_storage_size_in_tbs: props
            .data_storage_size_in_tbs
            .ok_or_else(|| missing(id, "dataStorageSizeInTbs"))?,
        db_version: props.db_version.clone().unwrap_or_default(),
        db_workload: props.db_workload.ok_or_else(|| missing(id, "dbWorkload"))?,
        display_name: props.display_name.clone().unwrap_or_default(),
        license_model: props.license_model.ok_or_else(|| missing(id, "licenseModel"))?,
        auto_scaling_enabled: props.is_auto_scaling_enabled.unwrap_or(false),
        auto_scaling_for_storage_enabled: props.is_auto_scaling_for_storage_enabled.unwrap_or(false),
        mtls_connection_required: props.is_mtls_connection_required.unwrap_or(false),
        customer_contacts: props
            .customer_contacts
            .iter()
            .flatten()
            .map(|c| c.email.clone())
            .collect(),
        allowed_ip_addresses: props.whitelisted_ips.clone().unwrap_or_default(),
        long_term_backup_schedule: props.long_term_backup_schedule.as_ref().and_then(schedule_from),
    })
}

fn variant_from(props: &DatabaseProperties, prior: Option<&VariantConfig>) -> VariantConfig {
    match props {
        DatabaseProperties::Regular(_) => VariantConfig::Regular,
        DatabaseProperties::Clone(p) => VariantConfig::Clone(CloneConfig {
            source_id: p.source_id.clone(),
            clone_type: p.clone_type,
            refreshable_model: p.refreshable_model,
            time_until_reconnect_clone_enabled: p.time_until_reconnect_clone_enabled,
        }),
        DatabaseProperties::CloneFromBackupTimestamp(p) => {
            // The point-in-time selector is create-only; keep what the caller declared
            let (backup_timestamp, use_latest) = match prior {
                Some(VariantConfig::CloneFromBackupTimestamp(c)) => {
                    (c.backup_timestamp, c.use_latest_available_backup_timestamp)
                }
                _ => (
                    p.timestamp,
                    p.use_latest_available_backup_time_stamp.unwrap_or(false),
                ),
            };
            VariantConfig::CloneFromBackupTimestamp(BackupCloneConfig {
                source_id: p.source_id.clone(),
                clone_type: p.clone_type,
                backup_timestamp,
                use_latest_available_backup_timestamp: use_latest,
            })
        }
        DatabaseProperties::CrossRegionDisasterRecovery(p) => {
            VariantConfig::CrossRegionDisasterRecovery(DisasterRecoveryConfig {
                source_id: p.source_id.clone(),
                source_location: p.source_location.clone(),
                remote_disaster_recovery_type: p.remote_disaster_recovery_type,
                replicate_automatic_backups_enabled: p.is_replicate_automatic_backups.unwrap_or(false),
            })
        }
    }
}

/// Project `remote` onto a model of the `expected` variant
///
/// The admin password is never echoed by the remote system, so it is carried
/// over from `prior`.
pub fn project(
    id: &AutonomousDatabaseId,
    remote: &AutonomousDatabase,
    expected: DatabaseVariant,
    prior: Option<&AutonomousDatabaseModel>,
) -> ProviderResult<AutonomousDatabaseModel> {
    let props = remote
        .properties
        .as_ref()
        .ok_or_else(|| missing(id, "properties"))?;

    props.expect_variant(expected).map_err(|mismatch| {
        ProviderError::new(ErrorKind::VariantMismatch, mismatch.to_string()).with_identifier(id)
    })?;

    let base_props = props.base();
    let base = base_from(id, base_props, prior.and_then(|p| p.admin_password()))?;

    // Keep the caller's spelling of the region when it names the same one
    let location = match prior {
        Some(p) if same_location(&p.location, &remote.location) => p.location.clone(),
        _ => remote.location.clone(),
    };

    Ok(AutonomousDatabaseModel {
        name: id.autonomous_database_name.clone(),
        resource_group_name: id.resource_group_name.clone(),
        location,
        tags: remote.tags.clone(),
        network: NetworkConfig {
            subnet_id: base_props.subnet_id.clone().unwrap_or_default(),
            virtual_network_id: base_props.vnet_id.clone().unwrap_or_default(),
        },
        base: Some(base),
        variant: variant_from(props, prior.map(|p| &p.variant)),
        lifecycle_state: base_props.lifecycle_state.clone(),
    })
}
