//! Remote object model of the Autonomous Database management API
//!
//! The remote property bag is a union tagged by `dataBaseType`. Every member
//! embeds the shared [`BaseProperties`]; narrowing to a member goes through the
//! `as_*` accessors, which fail with [`VariantMismatch`] instead of coercing.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{
    CloneType, ComputeModel, DatabaseVariant, DisasterRecoveryType, LicenseModel, LifecycleState,
    ProvisioningState, RefreshableModel, RepeatCadence, SourceType, WorkloadType,
};

/// The remote object is a different member of the property union
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("expected database type {expected} but the remote object is {actual}")]
pub struct VariantMismatch {
    pub expected: DatabaseVariant,
    pub actual: DatabaseVariant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerContact {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LongTermBackUpScheduleDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repeat_cadence: Option<RepeatCadence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_of_backup: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retention_period_in_days: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_disabled: Option<bool>,
}

/// Properties common to every database type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_retention_period_in_days: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub character_set: Option<String>,
    #[serde(rename = "ncharacterSet", skip_serializing_if = "Option::is_none")]
    pub ncharacter_set: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_count: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_model: Option<ComputeModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_contacts: Option<Vec<CustomerContact>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_storage_size_in_tbs: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_workload: Option<WorkloadType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_auto_scaling_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_auto_scaling_for_storage_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_mtls_connection_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_model: Option<LicenseModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_term_backup_schedule: Option<LongTermBackUpScheduleDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vnet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whitelisted_ips: Option<Vec<String>>,

    // Read-only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lifecycle_state: Option<LifecycleState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provisioning_state: Option<ProvisioningState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocid: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneProperties {
    #[serde(flatten)]
    pub base: BaseProperties,
    pub source: SourceType,
    pub source_id: String,
    pub clone_type: CloneType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refreshable_model: Option<RefreshableModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_until_reconnect_clone_enabled: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupCloneProperties {
    #[serde(flatten)]
    pub base: BaseProperties,
    pub source: SourceType,
    pub source_id: String,
    pub clone_type: CloneType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(
        rename = "useLatestAvailableBackupTimeStamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub use_latest_available_backup_time_stamp: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisasterRecoveryProperties {
    #[serde(flatten)]
    pub base: BaseProperties,
    pub source: SourceType,
    pub source_id: String,
    pub source_location: String,
    pub remote_disaster_recovery_type: DisasterRecoveryType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_replicate_automatic_backups: Option<bool>,
}

/// Property union, tagged by `dataBaseType`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dataBaseType")]
pub enum DatabaseProperties {
    Regular(BaseProperties),
    Clone(CloneProperties),
    CloneFromBackupTimestamp(BackupCloneProperties),
    CrossRegionDisasterRecovery(DisasterRecoveryProperties),
}

impl DatabaseProperties {
    pub fn variant(&self) -> DatabaseVariant {
        match self {
            DatabaseProperties::Regular(_) => DatabaseVariant::Regular,
            DatabaseProperties::Clone(_) => DatabaseVariant::Clone,
            DatabaseProperties::CloneFromBackupTimestamp(_) => {
                DatabaseVariant::CloneFromBackupTimestamp
            }
            DatabaseProperties::CrossRegionDisasterRecovery(_) => {
                DatabaseVariant::CrossRegionDisasterRecovery
            }
        }
    }

    /// Shared properties, whatever the variant
    pub fn base(&self) -> &BaseProperties {
        match self {
            DatabaseProperties::Regular(base) => base,
            DatabaseProperties::Clone(p) => &p.base,
            DatabaseProperties::CloneFromBackupTimestamp(p) => &p.base,
            DatabaseProperties::CrossRegionDisasterRecovery(p) => &p.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut BaseProperties {
        match self {
            DatabaseProperties::Regular(base) => base,
            DatabaseProperties::Clone(p) => &mut p.base,
            DatabaseProperties::CloneFromBackupTimestamp(p) => &mut p.base,
            DatabaseProperties::CrossRegionDisasterRecovery(p) => &mut p.base,
        }
    }

    fn mismatch(&self, expected: DatabaseVariant) -> VariantMismatch {
        VariantMismatch {
            expected,
            actual: self.variant(),
        }
    }

    pub fn as_regular(&self) -> Result<&BaseProperties, VariantMismatch> {
        match self {
            DatabaseProperties::Regular(base) => Ok(base),
            other => Err(other.mismatch(DatabaseVariant::Regular)),
        }
    }

    pub fn as_clone(&self) -> Result<&CloneProperties, VariantMismatch> {
        match self {
            DatabaseProperties::Clone(p) => Ok(p),
            other => Err(other.mismatch(DatabaseVariant::Clone)),
        }
    }

    pub fn as_backup_clone(&self) -> Result<&BackupCloneProperties, VariantMismatch> {
        match self {
            DatabaseProperties::CloneFromBackupTimestamp(p) => Ok(p),
            other => Err(other.mismatch(DatabaseVariant::CloneFromBackupTimestamp)),
        }
    }

    pub fn as_disaster_recovery(&self) -> Result<&DisasterRecoveryProperties, VariantMismatch> {
        match self {
            DatabaseProperties::CrossRegionDisasterRecovery(p) => Ok(p),
            other => Err(other.mismatch(DatabaseVariant::CrossRegionDisasterRecovery)),
        }
    }

    /// Check the union member without borrowing its payload
    pub fn expect_variant(&self, expected: DatabaseVariant) -> Result<(), VariantMismatch> {
        if self.variant() == expected {
            Ok(())
        } else {
            Err(self.mismatch(expected))
        }
    }
}

/// An autonomous database as returned by the remote system
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutonomousDatabase {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub location: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<DatabaseProperties>,
}

/// Mutable fields accepted by the PATCH endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutonomousDatabaseUpdateProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_retention_period_in_days: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compute_count: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_contacts: Option<Vec<CustomerContact>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_storage_size_in_tbs: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_auto_scaling_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_auto_scaling_for_storage_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_mtls_connection_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_model: Option<LicenseModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_term_backup_schedule: Option<LongTermBackUpScheduleDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whitelisted_ips: Option<Vec<String>>,
}

impl AutonomousDatabaseUpdateProperties {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// PATCH body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AutonomousDatabaseUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<AutonomousDatabaseUpdateProperties>,
}
