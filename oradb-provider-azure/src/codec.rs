//! Conversion between attribute maps and the typed model
//!
//! Desired resources are checked strictly: an attribute that belongs to another
//! variant, or that is only ever computed, is rejected before anything reaches
//! the remote system. Recorded state is decoded leniently since it was written
//! by [`encode_model`].

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use oradb_core::provider::{ProviderError, ProviderResult};
use oradb_core::resource::{Resource, ResourceId, State, Value};

use crate::models::{
    AutonomousDatabaseModel, BackupCloneConfig, BaseConfig, CloneConfig, DatabaseVariant,
    DisasterRecoveryConfig, LongTermBackupSchedule, NetworkConfig, UnknownValue, VariantConfig,
};
use crate::resources::{
    AttrKind, ResourceConfig, SCHEDULE_ATTRIBUTES, config_for_variant, get_resource_config,
};

/// Typed access to one attribute map
struct Attrs<'a> {
    id: &'a ResourceId,
    map: &'a HashMap<String, Value>,
    /// Prefix for nested blocks, used in messages
    path: &'static str,
}

impl<'a> Attrs<'a> {
    fn new(id: &'a ResourceId, map: &'a HashMap<String, Value>) -> Self {
        Self { id, map, path: "" }
    }

    fn error(&self, message: String) -> ProviderError {
        ProviderError::malformed(message).for_resource(self.id.clone())
    }

    fn get(&self, name: &str) -> ProviderResult<&'a Value> {
        self.map
            .get(name)
            .ok_or_else(|| self.error(format!("missing required attribute `{}{}`", self.path, name)))
    }

    fn type_error(&self, name: &str, expected: &str, actual: &Value) -> ProviderError {
        self.error(format!(
            "attribute `{}{}` must be {}, got {}",
            self.path,
            name,
            expected,
            actual.type_name()
        ))
    }

    fn string(&self, name: &str) -> ProviderResult<String> {
        self.opt_string(name)?
            .ok_or_else(|| self.error(format!("missing required attribute `{}{}`", self.path, name)))
    }

    fn opt_string(&self, name: &str) -> ProviderResult<Option<String>> {
        match self.map.get(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.type_error(name, "a String", other)),
        }
    }

    fn opt_bool(&self, name: &str) -> ProviderResult<Option<bool>> {
        match self.map.get(name) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(self.type_error(name, "a Bool", other)),
        }
    }

    fn bool(&self, name: &str) -> ProviderResult<bool> {
        match self.get(name)? {
            Value::Bool(b) => Ok(*b),
            other => Err(self.type_error(name, "a Bool", other)),
        }
    }

    fn int(&self, name: &str) -> ProviderResult<i32> {
        match self.get(name)? {
            Value::Int(n) => i32::try_from(*n)
                .map_err(|_| self.error(format!("attribute `{}{}` is out of range: {}", self.path, name, n))),
            other => Err(self.type_error(name, "an Int", other)),
        }
    }

    /// Accepts Int as well, `compute_count = 2` is a valid declaration
    fn float(&self, name: &str) -> ProviderResult<f64> {
        match self.get(name)? {
            Value::Float(f) => Ok(*f),
            Value::Int(n) => Ok(*n as f64),
            other => Err(self.type_error(name, "a Float", other)),
        }
    }

    fn parsed<T: FromStr<Err = UnknownValue>>(&self, raw: &str, name: &str) -> ProviderResult<T> {
        raw.parse()
            .map_err(|e: UnknownValue| self.error(format!("attribute `{}{}`: {}", self.path, name, e)))
    }

    fn enum_value<T: FromStr<Err = UnknownValue>>(&self, name: &str) -> ProviderResult<T> {
        let raw = self.string(name)?;
        self.parsed(&raw, name)
    }

    fn opt_enum<T: FromStr<Err = UnknownValue>>(&self, name: &str) -> ProviderResult<Option<T>> {
        self.opt_string(name)?
            .map(|raw| self.parsed(&raw, name))
            .transpose()
    }

    fn opt_timestamp(&self, name: &str) -> ProviderResult<Option<DateTime<Utc>>> {
        self.opt_string(name)?
            .map(|raw| {
                DateTime::parse_from_rfc3339(&raw)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|e| {
                        self.error(format!(
                            "attribute `{}{}` is not an RFC 3339 timestamp: {}",
                            self.path, name, e
                        ))
                    })
            })
            .transpose()
    }

    fn timestamp(&self, name: &str) -> ProviderResult<DateTime<Utc>> {
        self.opt_timestamp(name)?
            .ok_or_else(|| self.error(format!("missing required attribute `{}{}`", self.path, name)))
    }

    fn string_list(&self, name: &str) -> ProviderResult<Vec<String>> {
        match self.map.get(name) {
            None => Ok(Vec::new()),
            Some(Value::List(items)) => items
                .iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s.clone()),
                    other => Err(self.type_error(name, "a list of String", other)),
                })
                .collect(),
            Some(other) => Err(self.type_error(name, "a List", other)),
        }
    }

    fn string_map(&self, name: &str) -> ProviderResult<BTreeMap<String, String>> {
        match self.map.get(name) {
            None => Ok(BTreeMap::new()),
            Some(Value::Map(entries)) => entries
                .iter()
                .map(|(k, v)| match v {
                    Value::String(s) => Ok((k.clone(), s.clone())),
                    other => Err(self.type_error(name, "a map of String", other)),
                })
                .collect(),
            Some(other) => Err(self.type_error(name, "a Map", other)),
        }
    }

    fn schedule_block(&self) -> ProviderResult<Option<Attrs<'a>>> {
        let name = "long_term_backup_schedule";
        match self.map.get(name) {
            None => Ok(None),
            Some(Value::Map(map)) => Ok(Some(Attrs {
                id: self.id,
                map,
                path: "long_term_backup_schedule.",
            })),
            Some(other) => Err(self.type_error(name, "a Map", other)),
        }
    }
}

fn resource_config(id: &ResourceId) -> ProviderResult<&'static ResourceConfig> {
    get_resource_config(&id.resource_type).ok_or_else(|| {
        ProviderError::malformed(format!("unknown resource type `{}`", id.resource_type))
            .for_resource(id.clone())
    })
}

/// Reject attributes that do not belong to the declared resource type
fn check_legality(config: &ResourceConfig, attrs: &Attrs<'_>) -> ProviderResult<()> {
    // Sorted so the first offending attribute is reported deterministically
    let mut names: Vec<&String> = attrs.map.keys().collect();
    names.sort();

    for name in names {
        if name.starts_with('_') {
            continue;
        }
        match config.attribute_kind(name) {
            None => {
                return Err(attrs.error(format!(
                    "attribute `{}` is not valid for {}",
                    name, config.resource_type
                )));
            }
            Some(AttrKind::Computed) => {
                return Err(attrs.error(format!(
                    "attribute `{}` is computed for {} and cannot be set",
                    name, config.resource_type
                )));
            }
            Some(_) => {}
        }
    }

    for name in config.required_attributes() {
        if !attrs.map.contains_key(name) {
            return Err(attrs.error(format!("missing required attribute `{}`", name)));
        }
    }

    if let Some(schedule) = attrs.schedule_block()? {
        for name in schedule.map.keys() {
            if !SCHEDULE_ATTRIBUTES.iter().any(|(attr, _)| *attr == name.as_str()) {
                return Err(schedule.error(format!(
                    "attribute `long_term_backup_schedule.{}` is not valid",
                    name
                )));
            }
        }
    }

    Ok(())
}

fn decode_schedule(attrs: &Attrs<'_>) -> ProviderResult<Option<LongTermBackupSchedule>> {
    let Some(block) = attrs.schedule_block()? else {
        return Ok(None);
    };
    Ok(Some(LongTermBackupSchedule {
        repeat_cadence: block.enum_value("repeat_cadence")?,
        time_of_backup: block.timestamp("time_of_backup")?,
        retention_period_in_days: block.int("retention_period_in_days")?,
        enabled: block.bool("enabled")?,
    }))
}

fn decode_base(attrs: &Attrs<'_>) -> ProviderResult<BaseConfig> {
    Ok(BaseConfig {
        admin_password: attrs.opt_string("admin_password")?.unwrap_or_default(),
        backup_retention_period_in_days: attrs.int("backup_retention_period_in_days")?,
        character_set: attrs.string("character_set")?,
        national_character_set: attrs.string("national_character_set")?,
        compute_count: attrs.float("compute_count")?,
        compute_model: attrs.enum_value("compute_model")?,
        data_storage_size_in_tbs: attrs.int("data_storage_size_in_tbs")?,
        db_version: attrs.string("db_version")?,
        db_workload: attrs.enum_value("db_workload")?,
        display_name: attrs.string("display_name")?,
        license_model: attrs.enum_value("license_model")?,
        auto_scaling_enabled: attrs.bool("auto_scaling_enabled")?,
        auto_scaling_for_storage_enabled: attrs.bool("auto_scaling_for_storage_enabled")?,
        mtls_connection_required: attrs.bool("mtls_connection_required")?,
        customer_contacts: attrs.string_list("customer_contacts")?,
        allowed_ip_addresses: attrs.string_list("allowed_ip_addresses")?,
        long_term_backup_schedule: decode_schedule(attrs)?,
    })
}

fn decode_variant(config: &ResourceConfig, attrs: &Attrs<'_>) -> ProviderResult<VariantConfig> {
    Ok(match config.variant {
        DatabaseVariant::Regular => VariantConfig::Regular,
        DatabaseVariant::Clone => VariantConfig::Clone(CloneConfig {
            source_id: attrs.string("source_id")?,
            clone_type: attrs.enum_value("clone_type")?,
            refreshable_model: attrs.opt_enum("refreshable_model")?,
            time_until_reconnect_clone_enabled: attrs
                .opt_timestamp("time_until_reconnect_clone_enabled")?,
        }),
        DatabaseVariant::CloneFromBackupTimestamp => {
            VariantConfig::CloneFromBackupTimestamp(BackupCloneConfig {
                source_id: attrs.string("source_id")?,
                clone_type: attrs.enum_value("clone_type")?,
                backup_timestamp: attrs.opt_timestamp("backup_timestamp")?,
                use_latest_available_backup_timestamp: attrs
                    .opt_bool("use_latest_available_backup_timestamp")?
                    .unwrap_or(false),
            })
        }
        DatabaseVariant::CrossRegionDisasterRecovery => {
            VariantConfig::CrossRegionDisasterRecovery(DisasterRecoveryConfig {
                source_id: attrs.string("source_id")?,
                source_location: attrs.string("source_location")?,
                remote_disaster_recovery_type: attrs.enum_value("remote_disaster_recovery_type")?,
                replicate_automatic_backups_enabled: attrs
                    .opt_bool("replicate_automatic_backups_enabled")?
                    .unwrap_or(false),
            })
        }
    })
}

fn decode(
    config: &ResourceConfig,
    attrs: &Attrs<'_>,
    recorded: bool,
) -> ProviderResult<AutonomousDatabaseModel> {
    // Standbys only carry base fields once they have been read back
    let base = if config.declares_base || (recorded && attrs.map.contains_key("db_workload")) {
        Some(decode_base(attrs)?)
    } else {
        None
    };

    Ok(AutonomousDatabaseModel {
        name: attrs.string("name")?,
        resource_group_name: attrs.string("resource_group_name")?,
        location: attrs.string("location")?,
        tags: attrs.string_map("tags")?,
        network: NetworkConfig {
            subnet_id: attrs.string("subnet_id")?,
            virtual_network_id: attrs.string("virtual_network_id")?,
        },
        base,
        variant: decode_variant(config, attrs)?,
        lifecycle_state: if recorded {
            attrs.opt_enum("lifecycle_state")?
        } else {
            None
        },
    })
}

/// Decode a desired resource, rejecting attributes its type does not accept
pub fn decode_resource(resource: &Resource) -> ProviderResult<AutonomousDatabaseModel> {
    let config = resource_config(&resource.id)?;
    let attrs = Attrs::new(&resource.id, &resource.attributes);
    check_legality(config, &attrs)?;
    decode(config, &attrs, false)
}

/// Decode state previously produced by [`encode_model`]
pub fn decode_state(state: &State) -> ProviderResult<AutonomousDatabaseModel> {
    let config = resource_config(&state.id)?;
    decode(config, &Attrs::new(&state.id, &state.attributes), true)
}

fn string(s: &str) -> Value {
    Value::String(s.to_string())
}

fn timestamp(t: &DateTime<Utc>) -> Value {
    Value::String(t.to_rfc3339_opts(SecondsFormat::Secs, true))
}

fn string_list(items: &[String]) -> Value {
    Value::List(items.iter().map(|s| string(s)).collect())
}

fn encode_base(base: &BaseConfig, declares_base: bool, attributes: &mut HashMap<String, Value>) {
    // Standbys never hold a credential of their own
    if declares_base && !base.admin_password.is_empty() {
        attributes.insert("admin_password".to_string(), string(&base.admin_password));
    }
    let entries = [
        (
            "backup_retention_period_in_days",
            Value::Int(base.backup_retention_period_in_days.into()),
        ),
        ("character_set", string(&base.character_set)),
        ("national_character_set", string(&base.national_character_set)),
        ("compute_count", Value::Float(base.compute_count)),
        ("compute_model", string(base.compute_model.as_str())),
        (
            "data_storage_size_in_tbs",
            Value::Int(base.data_storage_size_in_tbs.into()),
        ),
        ("db_version", string(&base.db_version)),
        ("db_workload", string(base.db_workload.as_str())),
        ("display_name", string(&base.display_name)),
        ("license_model", string(base.license_model.as_str())),
        ("auto_scaling_enabled", Value::Bool(base.auto_scaling_enabled)),
        (
            "auto_scaling_for_storage_enabled",
            Value::Bool(base.auto_scaling_for_storage_enabled),
        ),
        ("mtls_connection_required", Value::Bool(base.mtls_connection_required)),
        ("customer_contacts", string_list(&base.customer_contacts)),
        ("allowed_ip_addresses", string_list(&base.allowed_ip_addresses)),
    ];
    for (name, value) in entries {
        attributes.insert(name.to_string(), value);
    }

    if let Some(schedule) = &base.long_term_backup_schedule {
        let block = HashMap::from([
            ("repeat_cadence".to_string(), string(schedule.repeat_cadence.as_str())),
            ("time_of_backup".to_string(), timestamp(&schedule.time_of_backup)),
            (
                "retention_period_in_days".to_string(),
                Value::Int(schedule.retention_period_in_days.into()),
            ),
            ("enabled".to_string(), Value::Bool(schedule.enabled)),
        ]);
        attributes.insert("long_term_backup_schedule".to_string(), Value::Map(block));
    }
}

fn encode_variant(variant: &VariantConfig, attributes: &mut HashMap<String, Value>) {
    let mut put = |name: &str, value: Value| {
        attributes.insert(name.to_string(), value);
    };

    match variant {
        VariantConfig::Regular => {}
        VariantConfig::Clone(c) => {
            put("source_id", string(&c.source_id));
            put("clone_type", string(c.clone_type.as_str()));
            if let Some(model) = c.refreshable_model {
                put("refreshable_model", string(model.as_str()));
            }
            if let Some(t) = &c.time_until_reconnect_clone_enabled {
                put("time_until_reconnect_clone_enabled", timestamp(t));
            }
        }
        VariantConfig::CloneFromBackupTimestamp(c) => {
            put("source_id", string(&c.source_id));
            put("clone_type", string(c.clone_type.as_str()));
            if let Some(t) = &c.backup_timestamp {
                put("backup_timestamp", timestamp(t));
            }
            put(
                "use_latest_available_backup_timestamp",
                Value::Bool(c.use_latest_available_backup_timestamp),
            );
        }
        VariantConfig::CrossRegionDisasterRecovery(c) => {
            put("source_id", string(&c.source_id));
            put("source_location", string(&c.source_location));
            put(
                "remote_disaster_recovery_type",
                string(c.remote_disaster_recovery_type.as_str()),
            );
            put(
                "replicate_automatic_backups_enabled",
                Value::Bool(c.replicate_automatic_backups_enabled),
            );
        }
    }
}

/// Encode a model as state attributes
pub fn encode_model(model: &AutonomousDatabaseModel) -> HashMap<String, Value> {
    let mut attributes = HashMap::new();

    attributes.insert("name".to_string(), string(&model.name));
    attributes.insert(
        "resource_group_name".to_string(),
        string(&model.resource_group_name),
    );
    attributes.insert("location".to_string(), string(&model.location));
    if !model.tags.is_empty() {
        attributes.insert(
            "tags".to_string(),
            Value::Map(
                model
                    .tags
                    .iter()
                    .map(|(k, v)| (k.clone(), string(v)))
                    .collect(),
            ),
        );
    }
    attributes.insert("subnet_id".to_string(), string(&model.network.subnet_id));
    attributes.insert(
        "virtual_network_id".to_string(),
        string(&model.network.virtual_network_id),
    );
    if let Some(state) = &model.lifecycle_state {
        attributes.insert("lifecycle_state".to_string(), string(state.as_str()));
    }

    if let Some(base) = &model.base {
        let declares_base = config_for_variant(model.variant.variant()).declares_base;
        encode_base(base, declares_base, &mut attributes);
    }
    encode_variant(&model.variant, &mut attributes);

    attributes
}
