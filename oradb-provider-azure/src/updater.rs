//! Drift-scoped update computation
//!
//! Compares the previously recorded model with the desired one and produces
//! only what changed. The long-term backup schedule is kept apart because the
//! API rejects it alongside other property changes.

use std::collections::BTreeMap;

use crate::models::{AutonomousDatabaseModel, BaseConfig, LongTermBackupSchedule, VariantConfig};
use crate::remote::{
    AutonomousDatabaseUpdate, AutonomousDatabaseUpdateProperties, LongTermBackUpScheduleDetails,
};
use crate::utils::same_location;
use crate::variant::{customer_contacts, schedule_details};

/// Changes between two models of the same database
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    /// Mutable shared properties, sent in the general update
    pub general: AutonomousDatabaseUpdateProperties,
    pub tags: Option<BTreeMap<String, String>>,
    /// Sent in its own update after the general one
    pub schedule: Option<LongTermBackUpScheduleDetails>,
    /// Changed fields the API cannot update in place
    pub requires_replacement: Vec<&'static str>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.general.is_empty()
            && self.tags.is_none()
            && self.schedule.is_none()
            && self.requires_replacement.is_empty()
    }

    /// PATCH body for tags and general properties, if anything changed
    pub fn general_update(&self) -> Option<AutonomousDatabaseUpdate> {
        if self.general.is_empty() && self.tags.is_none() {
            return None;
        }
        Some(AutonomousDatabaseUpdate {
            tags: self.tags.clone(),
            properties: (!self.general.is_empty()).then(|| self.general.clone()),
        })
    }

    /// PATCH body carrying only the backup schedule
    pub fn schedule_update(&self) -> Option<AutonomousDatabaseUpdate> {
        self.schedule.as_ref().map(|schedule| AutonomousDatabaseUpdate {
            tags: None,
            properties: Some(AutonomousDatabaseUpdateProperties {
                long_term_backup_schedule: Some(schedule.clone()),
                ..Default::default()
            }),
        })
    }
}

fn changed<T: PartialEq + Clone>(previous: &T, desired: &T) -> Option<T> {
    (previous != desired).then(|| desired.clone())
}

fn diff_base(previous: &BaseConfig, desired: &BaseConfig, changes: &mut ChangeSet) {
    let general = &mut changes.general;

    if !desired.admin_password.is_empty() && desired.admin_password != previous.admin_password {
        general.admin_password = Some(desired.admin_password.clone());
    }
    general.backup_retention_period_in_days = changed(
        &previous.backup_retention_period_in_days,
        &desired.backup_retention_period_in_days,
    );
    general.compute_count = changed(&previous.compute_count, &desired.compute_count);
    general.data_storage_size_in_tbs = changed(
        &previous.data_storage_size_in_tbs,
        &desired.data_storage_size_in_tbs,
    );
    general.display_name = changed(&previous.display_name, &desired.display_name);
    general.is_auto_scaling_enabled =
        changed(&previous.auto_scaling_enabled, &desired.auto_scaling_enabled);
    general.is_auto_scaling_for_storage_enabled = changed(
        &previous.auto_scaling_for_storage_enabled,
        &desired.auto_scaling_for_storage_enabled,
    );
    general.is_mtls_connection_required = changed(
        &previous.mtls_connection_required,
        &desired.mtls_connection_required,
    );
    general.license_model = changed(&previous.license_model, &desired.license_model);
    general.whitelisted_ips = changed(
        &previous.allowed_ip_addresses,
        &desired.allowed_ip_addresses,
    );
    if previous.customer_contacts != desired.customer_contacts {
        general.customer_contacts = Some(customer_contacts(&desired.customer_contacts));
    }

    changes.schedule = diff_schedule(
        previous.long_term_backup_schedule.as_ref(),
        desired.long_term_backup_schedule.as_ref(),
    );

    let immutable = &mut changes.requires_replacement;
    if previous.db_workload != desired.db_workload {
        immutable.push("db_workload");
    }
    if previous.compute_model != desired.compute_model {
        immutable.push("compute_model");
    }
    if previous.character_set != desired.character_set {
        immutable.push("character_set");
    }
    if previous.national_character_set != desired.national_character_set {
        immutable.push("national_character_set");
    }
    if previous.db_version != desired.db_version {
        immutable.push("db_version");
    }
}

fn diff_schedule(
    previous: Option<&LongTermBackupSchedule>,
    desired: Option<&LongTermBackupSchedule>,
) -> Option<LongTermBackUpScheduleDetails> {
    match (previous, desired) {
        (Some(p), Some(d)) if p == d => None,
        (_, Some(d)) => Some(schedule_details(d)),
        // Removal disables the schedule
        (Some(p), None) if p.enabled => Some(LongTermBackUpScheduleDetails {
            is_disabled: Some(true),
            ..schedule_details(p)
        }),
        _ => None,
    }
}

fn diff_variant(previous: &VariantConfig, desired: &VariantConfig, immutable: &mut Vec<&'static str>) {
    let same_source = |a: &str, b: &str| a.eq_ignore_ascii_case(b);

    match (previous, desired) {
        (VariantConfig::Regular, VariantConfig::Regular) => {}
        (VariantConfig::Clone(p), VariantConfig::Clone(d)) => {
            if !same_source(&p.source_id, &d.source_id) {
                immutable.push("source_id");
            }
            if p.clone_type != d.clone_type {
                immutable.push("clone_type");
            }
            if p.refreshable_model != d.refreshable_model {
                immutable.push("refreshable_model");
            }
            if p.time_until_reconnect_clone_enabled != d.time_until_reconnect_clone_enabled {
                immutable.push("time_until_reconnect_clone_enabled");
            }
        }
        (VariantConfig::CloneFromBackupTimestamp(p), VariantConfig::CloneFromBackupTimestamp(d)) => {
            if !same_source(&p.source_id, &d.source_id) {
                immutable.push("source_id");
            }
            if p.clone_type != d.clone_type {
                immutable.push("clone_type");
            }
            if p.backup_timestamp != d.backup_timestamp {
                immutable.push("backup_timestamp");
            }
            if p.use_latest_available_backup_timestamp != d.use_latest_available_backup_timestamp {
                immutable.push("use_latest_available_backup_timestamp");
            }
        }
        (
            VariantConfig::CrossRegionDisasterRecovery(p),
            VariantConfig::CrossRegionDisasterRecovery(d),
        ) => {
            if !same_source(&p.source_id, &d.source_id) {
                immutable.push("source_id");
            }
            if !same_location(&p.source_location, &d.source_location) {
                immutable.push("source_location");
            }
            if p.remote_disaster_recovery_type != d.remote_disaster_recovery_type {
                immutable.push("remote_disaster_recovery_type");
            }
            if p.replicate_automatic_backups_enabled != d.replicate_automatic_backups_enabled {
                immutable.push("replicate_automatic_backups_enabled");
            }
        }
        _ => immutable.push("database_type"),
    }
}

/// Compute what an update from `previous` to `desired` has to send
pub fn compute_change_set(
    previous: &AutonomousDatabaseModel,
    desired: &AutonomousDatabaseModel,
) -> ChangeSet {
    let mut changes = ChangeSet {
        tags: changed(&previous.tags, &desired.tags),
        ..Default::default()
    };

    // Standbys mirror their primary; only tags and network are declared
    let declares_base = !matches!(desired.variant, VariantConfig::CrossRegionDisasterRecovery(_));
    if declares_base && let (Some(previous_base), Some(desired_base)) = (&previous.base, &desired.base) {
        diff_base(previous_base, desired_base, &mut changes);
    }

    let immutable = &mut changes.requires_replacement;
    if !same_location(&previous.location, &desired.location) {
        immutable.push("location");
    }
    if previous.network.subnet_id != desired.network.subnet_id {
        immutable.push("subnet_id");
    }
    if previous.network.virtual_network_id != desired.network.virtual_network_id {
        immutable.push("virtual_network_id");
    }
    diff_variant(&previous.variant, &desired.variant, immutable);

    changes
}
