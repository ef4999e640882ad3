//! Resource type configurations for Oracle Autonomous Databases
//!
//! This module defines:
//! - Resource type definitions (implementing ResourceType trait)
//! - The attribute table of each resource type; every resource type maps to
//!   exactly one database variant

use oradb_core::provider::ResourceType;

use crate::models::DatabaseVariant;

// =============================================================================
// Resource Type Definitions
// =============================================================================

macro_rules! define_resource_type {
    ($name:ident, $type_name:expr) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
        }
    };
}

pub const AUTONOMOUS_DATABASE: &str = "oracle_autonomous_database";
pub const AUTONOMOUS_DATABASE_CLONE: &str = "oracle_autonomous_database_clone_from_database";
pub const AUTONOMOUS_DATABASE_BACKUP_CLONE: &str = "oracle_autonomous_database_clone_from_backup";
pub const AUTONOMOUS_DATABASE_DISASTER_RECOVERY: &str =
    "oracle_autonomous_database_cross_region_disaster_recovery";

define_resource_type!(AutonomousDatabaseType, AUTONOMOUS_DATABASE);
define_resource_type!(AutonomousDatabaseCloneType, AUTONOMOUS_DATABASE_CLONE);
define_resource_type!(AutonomousDatabaseBackupCloneType, AUTONOMOUS_DATABASE_BACKUP_CLONE);
define_resource_type!(
    AutonomousDatabaseDisasterRecoveryType,
    AUTONOMOUS_DATABASE_DISASTER_RECOVERY
);

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(AutonomousDatabaseType),
        Box::new(AutonomousDatabaseCloneType),
        Box::new(AutonomousDatabaseBackupCloneType),
        Box::new(AutonomousDatabaseDisasterRecoveryType),
    ]
}

// =============================================================================
// Resource Configuration
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    /// Must be declared
    Required,
    /// May be declared
    Optional,
    /// Only ever reported back in state
    Computed,
}

/// Attribute entry: (dsl_name, kind)
pub type AttrSpec = (&'static str, AttrKind);

use AttrKind::{Computed, Optional, Required};

/// Attributes every resource type has
pub const COMMON_ATTRIBUTES: &[AttrSpec] = &[
    ("name", Required),
    ("resource_group_name", Required),
    ("location", Required),
    ("tags", Optional),
    ("subnet_id", Required),
    ("virtual_network_id", Required),
    ("lifecycle_state", Computed),
];

/// Shared database fields
pub const BASE_ATTRIBUTES: &[AttrSpec] = &[
    ("admin_password", Required),
    ("backup_retention_period_in_days", Required),
    ("character_set", Required),
    ("national_character_set", Required),
    ("compute_count", Required),
    ("compute_model", Required),
    ("data_storage_size_in_tbs", Required),
    ("db_version", Required),
    ("db_workload", Required),
    ("display_name", Required),
    ("license_model", Required),
    ("auto_scaling_enabled", Required),
    ("auto_scaling_for_storage_enabled", Required),
    ("mtls_connection_required", Required),
    ("customer_contacts", Optional),
    ("allowed_ip_addresses", Optional),
    ("long_term_backup_schedule", Optional),
];

/// Fields of the `long_term_backup_schedule` block
pub const SCHEDULE_ATTRIBUTES: &[AttrSpec] = &[
    ("repeat_cadence", Required),
    ("time_of_backup", Required),
    ("retention_period_in_days", Required),
    ("enabled", Required),
];

/// Resource type configuration
pub struct ResourceConfig {
    pub resource_type: &'static str,
    pub variant: DatabaseVariant,
    /// Variant-specific attributes, on top of the common ones
    pub attributes: &'static [AttrSpec],
    /// Whether the base fields are declared by the caller; otherwise they
    /// are copied from the source and only reported back
    pub declares_base: bool,
}

impl ResourceConfig {
    /// Kind of `name` for this resource type, `None` if it does not belong here
    pub fn attribute_kind(&self, name: &str) -> Option<AttrKind> {
        let lookup = |table: &[AttrSpec]| {
            table
                .iter()
                .find(|(attr, _)| *attr == name)
                .map(|(_, kind)| *kind)
        };

        lookup(COMMON_ATTRIBUTES)
            .or_else(|| lookup(self.attributes))
            .or_else(|| {
                lookup(BASE_ATTRIBUTES).map(|kind| if self.declares_base { kind } else { Computed })
            })
    }

    /// Attributes the caller must declare
    pub fn required_attributes(&self) -> impl Iterator<Item = &'static str> + '_ {
        let base: &'static [AttrSpec] = if self.declares_base { BASE_ATTRIBUTES } else { &[] };
        COMMON_ATTRIBUTES
            .iter()
            .chain(self.attributes)
            .chain(base)
            .filter(|(_, kind)| *kind == Required)
            .map(|(name, _)| *name)
    }
}

pub const AUTONOMOUS_DATABASE_CONFIG: ResourceConfig = ResourceConfig {
    resource_type: AUTONOMOUS_DATABASE,
    variant: DatabaseVariant::Regular,
    attributes: &[],
    declares_base: true,
};

pub const AUTONOMOUS_DATABASE_CLONE_CONFIG: ResourceConfig = ResourceConfig {
    resource_type: AUTONOMOUS_DATABASE_CLONE,
    variant: DatabaseVariant::Clone,
    attributes: &[
        ("source_id", Required),
        ("clone_type", Required),
        ("refreshable_model", Optional),
        ("time_until_reconnect_clone_enabled", Optional),
    ],
    declares_base: true,
};

pub const AUTONOMOUS_DATABASE_BACKUP_CLONE_CONFIG: ResourceConfig = ResourceConfig {
    resource_type: AUTONOMOUS_DATABASE_BACKUP_CLONE,
    variant: DatabaseVariant::CloneFromBackupTimestamp,
    attributes: &[
        ("source_id", Required),
        ("clone_type", Required),
        ("backup_timestamp", Optional),
        ("use_latest_available_backup_timestamp", Optional),
    ],
    declares_base: true,
};

pub const AUTONOMOUS_DATABASE_DISASTER_RECOVERY_CONFIG: ResourceConfig = ResourceConfig {
    resource_type: AUTONOMOUS_DATABASE_DISASTER_RECOVERY,
    variant: DatabaseVariant::CrossRegionDisasterRecovery,
    attributes: &[
        ("source_id", Required),
        ("source_location", Required),
        ("remote_disaster_recovery_type", Required),
        ("replicate_automatic_backups_enabled", Optional),
    ],
    declares_base: false,
};

// =============================================================================
// Config Lookup
// =============================================================================

/// Get resource configuration by DSL type name
pub fn get_resource_config(resource_type: &str) -> Option<&'static ResourceConfig> {
    match resource_type {
        AUTONOMOUS_DATABASE => Some(&AUTONOMOUS_DATABASE_CONFIG),
        AUTONOMOUS_DATABASE_CLONE => Some(&AUTONOMOUS_DATABASE_CLONE_CONFIG),
        AUTONOMOUS_DATABASE_BACKUP_CLONE => Some(&AUTONOMOUS_DATABASE_BACKUP_CLONE_CONFIG),
        AUTONOMOUS_DATABASE_DISASTER_RECOVERY => {
            Some(&AUTONOMOUS_DATABASE_DISASTER_RECOVERY_CONFIG)
        }
        _ => None,
    }
}

/// Get resource configuration for a database variant
pub fn config_for_variant(variant: DatabaseVariant) -> &'static ResourceConfig {
    match variant {
        DatabaseVariant::Regular => &AUTONOMOUS_DATABASE_CONFIG,
        DatabaseVariant::Clone => &AUTONOMOUS_DATABASE_CLONE_CONFIG,
        DatabaseVariant::CloneFromBackupTimestamp => &AUTONOMOUS_DATABASE_BACKUP_CLONE_CONFIG,
        DatabaseVariant::CrossRegionDisasterRecovery => {
            &AUTONOMOUS_DATABASE_DISASTER_RECOVERY_CONFIG
        }
    }
}
