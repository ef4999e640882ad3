//! Desired configuration model and the API enumerations it uses

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use thiserror::Error;

use crate::identity::AutonomousDatabaseId;
use crate::utils::convert_enum_value;

/// An enumeration value that is not one of the API's accepted values
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported {type_name} value '{value}', expected one of: {expected}")]
pub struct UnknownValue {
    pub type_name: &'static str,
    pub value: String,
    pub expected: String,
}

// =============================================================================
// API Enumerations
// =============================================================================

macro_rules! api_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $(#[serde(rename = $value)] $variant,)+
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(de::Error::custom)
            }
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $value,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = convert_enum_value(s.trim());
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(raw))
                    .ok_or_else(|| UnknownValue {
                        type_name: stringify!($name),
                        value: s.to_string(),
                        expected: $name::ALL
                            .iter()
                            .map(|v| v.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
        }
    };
}

/// Read-only status values. The remote system adds new ones over time, so a
/// value outside the known set is kept verbatim instead of failing the read.
macro_rules! status_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant,)+
            Unknown(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $value,)+
                    $name::Unknown(raw) => raw,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw = convert_enum_value(s.trim());
                $(
                    if $value.eq_ignore_ascii_case(raw) {
                        return Ok($name::$variant);
                    }
                )+
                Ok($name::Unknown(raw.to_string()))
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(de::Error::custom)
            }
        }
    };
}

api_enum!(
    /// Intended query pattern of a database
    WorkloadType {
        Oltp => "OLTP",
        Dw => "DW",
        Ajd => "AJD",
        Apex => "APEX",
    }
);

api_enum!(
    /// The `dataBaseType` discriminator of the property union
    DatabaseVariant {
        Regular => "Regular",
        Clone => "Clone",
        CloneFromBackupTimestamp => "CloneFromBackupTimestamp",
        CrossRegionDisasterRecovery => "CrossRegionDisasterRecovery",
    }
);

api_enum!(
    /// Where a cloned or standby database takes its data from
    SourceType {
        Database => "Database",
        BackupFromTimestamp => "BackupFromTimestamp",
        CrossRegionDisasterRecovery => "CrossRegionDisasterRecovery",
    }
);

api_enum!(CloneType {
    Full => "Full",
    Metadata => "Metadata",
});

api_enum!(ComputeModel {
    Ecpu => "ECPU",
    Ocpu => "OCPU",
});

api_enum!(LicenseModel {
    LicenseIncluded => "LicenseIncluded",
    BringYourOwnLicense => "BringYourOwnLicense",
});

api_enum!(RefreshableModel {
    Automatic => "Automatic",
    Manual => "Manual",
});

api_enum!(DisasterRecoveryType {
    Adg => "Adg",
    BackupBased => "BackupBased",
});

api_enum!(RepeatCadence {
    OneTime => "OneTime",
    Weekly => "Weekly",
    Monthly => "Monthly",
    Yearly => "Yearly",
});

status_enum!(ProvisioningState {
    Succeeded => "Succeeded",
    Failed => "Failed",
    Canceled => "Canceled",
    Provisioning => "Provisioning",
});

status_enum!(LifecycleState {
    Available => "Available",
    AvailableNeedsAttention => "AvailableNeedsAttention",
    BackupInProgress => "BackupInProgress",
    Inaccessible => "Inaccessible",
    MaintenanceInProgress => "MaintenanceInProgress",
    Provisioning => "Provisioning",
    Recreating => "Recreating",
    Restarting => "Restarting",
    RestoreFailed => "RestoreFailed",
    RestoreInProgress => "RestoreInProgress",
    RoleChangeInProgress => "RoleChangeInProgress",
    ScaleInProgress => "ScaleInProgress",
    Standby => "Standby",
    Starting => "Starting",
    Stopped => "Stopped",
    Stopping => "Stopping",
    Terminated => "Terminated",
    Terminating => "Terminating",
    Unavailable => "Unavailable",
    Updating => "Updating",
    Upgrading => "Upgrading",
});

// =============================================================================
// Desired Configuration
// =============================================================================

/// Long-term backup schedule; updated through its own API call
#[derive(Debug, Clone, PartialEq)]
pub struct LongTermBackupSchedule {
    pub repeat_cadence: RepeatCadence,
    pub time_of_backup: DateTime<Utc>,
    pub retention_period_in_days: i32,
    pub enabled: bool,
}

/// Fields shared by every variant
#[derive(Debug, Clone, PartialEq)]
pub struct BaseConfig {
    /// Never returned by the remote system
    pub admin_password: String,
    pub backup_retention_period_in_days: i32,
    pub character_set: String,
    pub national_character_set: String,
    pub compute_count: f64,
    pub compute_model: ComputeModel,
    pub data_storage_size_in_tbs: i32,
    pub db_version: String,
    pub db_workload: WorkloadType,
    pub display_name: String,
    pub license_model: LicenseModel,
    pub auto_scaling_enabled: bool,
    pub auto_scaling_for_storage_enabled: bool,
    pub mtls_connection_required: bool,
    pub customer_contacts: Vec<String>,
    pub allowed_ip_addresses: Vec<String>,
    pub long_term_backup_schedule: Option<LongTermBackupSchedule>,
}

/// Network attachment; regional, so always supplied by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkConfig {
    pub subnet_id: String,
    pub virtual_network_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneConfig {
    pub source_id: String,
    pub clone_type: CloneType,
    pub refreshable_model: Option<RefreshableModel>,
    pub time_until_reconnect_clone_enabled: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupCloneConfig {
    pub source_id: String,
    pub clone_type: CloneType,
    /// Mutually exclusive with `use_latest_available_backup_timestamp`
    pub backup_timestamp: Option<DateTime<Utc>>,
    pub use_latest_available_backup_timestamp: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisasterRecoveryConfig {
    pub source_id: String,
    pub source_location: String,
    pub remote_disaster_recovery_type: DisasterRecoveryType,
    pub replicate_automatic_backups_enabled: bool,
}

/// Variant-specific fields; exactly one shape applies to a database
#[derive(Debug, Clone, PartialEq)]
pub enum VariantConfig {
    Regular,
    Clone(CloneConfig),
    CloneFromBackupTimestamp(BackupCloneConfig),
    CrossRegionDisasterRecovery(DisasterRecoveryConfig),
}

impl VariantConfig {
    pub fn variant(&self) -> DatabaseVariant {
        match self {
            VariantConfig::Regular => DatabaseVariant::Regular,
            VariantConfig::Clone(_) => DatabaseVariant::Clone,
            VariantConfig::CloneFromBackupTimestamp(_) => DatabaseVariant::CloneFromBackupTimestamp,
            VariantConfig::CrossRegionDisasterRecovery(_) => {
                DatabaseVariant::CrossRegionDisasterRecovery
            }
        }
    }

    /// Identifier of the database this one is derived from, if any
    pub fn source_id(&self) -> Option<&str> {
        match self {
            VariantConfig::Regular => None,
            VariantConfig::Clone(c) => Some(&c.source_id),
            VariantConfig::CloneFromBackupTimestamp(c) => Some(&c.source_id),
            VariantConfig::CrossRegionDisasterRecovery(c) => Some(&c.source_id),
        }
    }
}

/// Caller-declared state of one autonomous database
#[derive(Debug, Clone, PartialEq)]
pub struct AutonomousDatabaseModel {
    pub name: String,
    pub resource_group_name: String,
    pub location: String,
    pub tags: BTreeMap<String, String>,
    pub network: NetworkConfig,
    /// `None` for cross-region standbys until read back from the remote system
    pub base: Option<BaseConfig>,
    pub variant: VariantConfig,
    /// Computed
    pub lifecycle_state: Option<LifecycleState>,
}

impl AutonomousDatabaseModel {
    pub fn identity(&self, subscription_id: &str) -> AutonomousDatabaseId {
        AutonomousDatabaseId::new(subscription_id, &self.resource_group_name, &self.name)
    }

    /// Admin password as last declared by the caller
    pub fn admin_password(&self) -> Option<&str> {
        self.base
            .as_ref()
            .map(|b| b.admin_password.as_str())
            .filter(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wire_and_dsl_forms() {
        assert_eq!("OLTP".parse::<WorkloadType>().unwrap(), WorkloadType::Oltp);
        assert_eq!("dw".parse::<WorkloadType>().unwrap(), WorkloadType::Dw);
        assert_eq!(
            "azure.WorkloadType.APEX".parse::<WorkloadType>().unwrap(),
            WorkloadType::Apex
        );
        assert_eq!(
            "LicenseModel.BringYourOwnLicense"
                .parse::<LicenseModel>()
                .unwrap(),
            LicenseModel::BringYourOwnLicense
        );
    }

    #[test]
    fn unknown_value_lists_expected() {
        let err = "OLAP".parse::<WorkloadType>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unsupported WorkloadType value 'OLAP', expected one of: OLTP, DW, AJD, APEX"
        );
    }

    #[test]
    fn serializes_with_wire_names() {
        assert_eq!(serde_json::to_string(&ComputeModel::Ecpu).unwrap(), "\"ECPU\"");
        let variant: DatabaseVariant =
            serde_json::from_str("\"CloneFromBackupTimestamp\"").unwrap();
        assert_eq!(variant, DatabaseVariant::CloneFromBackupTimestamp);
    }

    #[test]
    fn deserializes_any_case() {
        let license: LicenseModel = serde_json::from_str("\"licenseincluded\"").unwrap();
        assert_eq!(license, LicenseModel::LicenseIncluded);
        let workload: WorkloadType = serde_json::from_str("\"oltp\"").unwrap();
        assert_eq!(workload, WorkloadType::Oltp);

        let err = serde_json::from_str::<ComputeModel>("\"GPU\"").unwrap_err();
        assert!(err.to_string().contains("unsupported ComputeModel value 'GPU'"));
    }

    #[test]
    fn status_values_outside_the_known_set_are_kept() {
        let state: LifecycleState = serde_json::from_str("\"standby\"").unwrap();
        assert_eq!(state, LifecycleState::Standby);

        let state: LifecycleState = serde_json::from_str("\"Scaling\"").unwrap();
        assert_eq!(state, LifecycleState::Unknown("Scaling".to_string()));
        assert_eq!(state.as_str(), "Scaling");
        assert_eq!(serde_json::to_string(&state).unwrap(), "\"Scaling\"");

        let provisioning: ProvisioningState = "Accepted".parse().unwrap();
        assert_eq!(provisioning.to_string(), "Accepted");
    }

    #[test]
    fn variant_config_reports_source() {
        let clone = VariantConfig::Clone(CloneConfig {
            source_id: "src".to_string(),
            clone_type: CloneType::Full,
            refreshable_model: None,
            time_until_reconnect_clone_enabled: None,
        });
        assert_eq!(clone.variant(), DatabaseVariant::Clone);
        assert_eq!(clone.source_id(), Some("src"));
        assert_eq!(VariantConfig::Regular.source_id(), None);
    }

    #[test]
    fn identity_uses_model_names() {
        let model = AutonomousDatabaseModel {
            name: "adb01".to_string(),
            resource_group_name: "rg".to_string(),
            location: "eastus".to_string(),
            tags: BTreeMap::new(),
            network: NetworkConfig::default(),
            base: None,
            variant: VariantConfig::Regular,
            lifecycle_state: None,
        };
        let id = model.identity("sub");
        assert_eq!(id.autonomous_database_name, "adb01");
        assert_eq!(model.admin_password(), None);
    }
}
