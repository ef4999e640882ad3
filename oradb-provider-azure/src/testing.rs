//! In-memory client and fixtures shared by the unit tests

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::client::{AutonomousDatabaseClient, OperationHandle, OperationStatus, RemoteError};
use crate::identity::AutonomousDatabaseId;
use crate::models::{
    AutonomousDatabaseModel, BackupCloneConfig, BaseConfig, CloneConfig, CloneType, ComputeModel,
    DisasterRecoveryConfig, DisasterRecoveryType, LicenseModel, LifecycleState,
    LongTermBackupSchedule, NetworkConfig, ProvisioningState, RepeatCadence, VariantConfig,
    WorkloadType,
};
use crate::remote::{
    AutonomousDatabase, AutonomousDatabaseUpdate, BaseProperties, DatabaseProperties,
};

pub const SUBSCRIPTION: &str = "11111111-2222-3333-4444-555555555555";

/// A call received by [`FakeClient`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Get(AutonomousDatabaseId),
    CreateOrUpdate(AutonomousDatabaseId, AutonomousDatabase),
    Update(AutonomousDatabaseId, AutonomousDatabaseUpdate),
    Delete(AutonomousDatabaseId),
}

impl Call {
    fn is_submission(&self) -> bool {
        !matches!(self, Call::Get(_))
    }
}

#[derive(Default)]
struct Inner {
    databases: HashMap<AutonomousDatabaseId, AutonomousDatabase>,
    scripted: VecDeque<OperationStatus>,
    hang: bool,
    next_handle: u64,
    get_error: Option<RemoteError>,
    delete_error: Option<RemoteError>,
    calls: Vec<Call>,
    status_checks: usize,
}

/// Remote system double: applies mutations on submission and reports
/// operations as succeeded unless scripted otherwise
#[derive(Default)]
pub struct FakeClient {
    inner: Mutex<Inner>,
}

impl FakeClient {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    /// Seed an object that exists before the test runs
    pub fn insert(&self, id: &AutonomousDatabaseId, mut db: AutonomousDatabase) {
        db.id = Some(id.to_string());
        db.name = Some(id.autonomous_database_name.clone());
        self.lock().databases.insert(id.clone(), db);
    }

    pub fn stored(&self, id: &AutonomousDatabaseId) -> Option<AutonomousDatabase> {
        self.lock().databases.get(id).cloned()
    }

    /// Statuses returned by the next status checks, in order
    pub fn script_statuses(&self, statuses: Vec<OperationStatus>) {
        self.lock().scripted = statuses.into();
    }

    /// Every operation stays in progress forever
    pub fn hang_operations(&self) {
        self.lock().hang = true;
    }

    pub fn fail_gets_with(&self, error: RemoteError) {
        self.lock().get_error = Some(error);
    }

    /// Reject every delete submission with `error`
    pub fn fail_deletes_with(&self, error: RemoteError) {
        self.lock().delete_error = Some(error);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Number of mutating submissions received
    pub fn submissions(&self) -> usize {
        self.lock().calls.iter().filter(|c| c.is_submission()).count()
    }

    pub fn status_checks(&self) -> usize {
        self.lock().status_checks
    }

    fn handle(inner: &mut Inner) -> OperationHandle {
        inner.next_handle += 1;
        OperationHandle(format!("op-{}", inner.next_handle))
    }
}

fn apply_update(db: &mut AutonomousDatabase, update: &AutonomousDatabaseUpdate) {
    if let Some(tags) = &update.tags {
        db.tags = tags.clone();
    }
    let (Some(patch), Some(props)) = (&update.properties, db.properties.as_mut()) else {
        return;
    };
    let base = props.base_mut();
    if patch.admin_password.is_some() {
        base.admin_password = patch.admin_password.clone();
    }
    macro_rules! patch_fields {
        ($($field:ident),+) => {
            $(if let Some(v) = &patch.$field {
                base.$field = Some(v.clone());
            })+
        };
    }
    patch_fields!(
        backup_retention_period_in_days,
        compute_count,
        customer_contacts,
        data_storage_size_in_tbs,
        display_name,
        is_auto_scaling_enabled,
        is_auto_scaling_for_storage_enabled,
        is_mtls_connection_required,
        license_model,
        long_term_backup_schedule,
        whitelisted_ips
    );
}

#[async_trait]
impl AutonomousDatabaseClient for FakeClient {
    async fn get(&self, id: &AutonomousDatabaseId) -> Result<AutonomousDatabase, RemoteError> {
        let mut inner = self.lock();
        inner.calls.push(Call::Get(id.clone()));
        if let Some(err) = inner.get_error.clone() {
            return Err(err);
        }
        let mut db = inner
            .databases
            .get(id)
            .cloned()
            .ok_or_else(|| RemoteError::not_found(format!("{} was not found", id)))?;
        // The API never echoes the admin password
        if let Some(props) = db.properties.as_mut() {
            props.base_mut().admin_password = None;
        }
        Ok(db)
    }

    async fn begin_create_or_update(
        &self,
        id: &AutonomousDatabaseId,
        mut body: AutonomousDatabase,
    ) -> Result<OperationHandle, RemoteError> {
        let mut inner = self.lock();
        inner
            .calls
            .push(Call::CreateOrUpdate(id.clone(), body.clone()));
        body.id = Some(id.to_string());
        body.name = Some(id.autonomous_database_name.clone());
        if let Some(props) = body.properties.as_mut() {
            let base = props.base_mut();
            base.lifecycle_state = Some(LifecycleState::Available);
            base.provisioning_state = Some(ProvisioningState::Succeeded);
            base.ocid = Some(format!("ocid1.autonomousdatabase.{}", id.autonomous_database_name));
        }
        inner.databases.insert(id.clone(), body);
        Ok(Self::handle(&mut inner))
    }

    async fn begin_update(
        &self,
        id: &AutonomousDatabaseId,
        body: AutonomousDatabaseUpdate,
    ) -> Result<OperationHandle, RemoteError> {
        let mut inner = self.lock();
        inner.calls.push(Call::Update(id.clone(), body.clone()));
        let db = inner
            .databases
            .get_mut(id)
            .ok_or_else(|| RemoteError::not_found(format!("{} was not found", id)))?;
        apply_update(db, &body);
        Ok(Self::handle(&mut inner))
    }

    async fn begin_delete(
        &self,
        id: &AutonomousDatabaseId,
    ) -> Result<OperationHandle, RemoteError> {
        let mut inner = self.lock();
        inner.calls.push(Call::Delete(id.clone()));
        if let Some(err) = inner.delete_error.clone() {
            return Err(err);
        }
        inner.databases.remove(id);
        Ok(Self::handle(&mut inner))
    }

    async fn operation_status(
        &self,
        _handle: &OperationHandle,
    ) -> Result<OperationStatus, RemoteError> {
        let mut inner = self.lock();
        inner.status_checks += 1;
        if inner.hang {
            return Ok(OperationStatus::InProgress);
        }
        Ok(inner
            .scripted
            .pop_front()
            .unwrap_or(OperationStatus::Succeeded))
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub fn db_id(name: &str) -> AutonomousDatabaseId {
    AutonomousDatabaseId::new(SUBSCRIPTION, "rg-data", name)
}

pub fn base_config() -> BaseConfig {
    BaseConfig {
        admin_password: "Sup3r-Secret-Pass".to_string(),
        backup_retention_period_in_days: 12,
        character_set: "AL32UTF8".to_string(),
        national_character_set: "AL16UTF16".to_string(),
        compute_count: 2.0,
        compute_model: ComputeModel::Ecpu,
        data_storage_size_in_tbs: 1,
        db_version: "19c".to_string(),
        db_workload: WorkloadType::Dw,
        display_name: "analytics".to_string(),
        license_model: LicenseModel::LicenseIncluded,
        auto_scaling_enabled: false,
        auto_scaling_for_storage_enabled: true,
        mtls_connection_required: true,
        customer_contacts: vec!["dba@example.com".to_string()],
        allowed_ip_addresses: vec!["10.0.0.0/24".to_string()],
        long_term_backup_schedule: Some(LongTermBackupSchedule {
            repeat_cadence: RepeatCadence::Weekly,
            time_of_backup: Utc.with_ymd_and_hms(2025, 1, 1, 3, 0, 0).unwrap(),
            retention_period_in_days: 90,
            enabled: true,
        }),
    }
}

pub fn network() -> NetworkConfig {
    NetworkConfig {
        subnet_id: "/subscriptions/s/resourceGroups/rg-net/providers/Microsoft.Network/virtualNetworks/vnet/subnets/db".to_string(),
        virtual_network_id: "/subscriptions/s/resourceGroups/rg-net/providers/Microsoft.Network/virtualNetworks/vnet".to_string(),
    }
}

fn model(name: &str, location: &str, base: Option<BaseConfig>, variant: VariantConfig) -> AutonomousDatabaseModel {
    AutonomousDatabaseModel {
        name: name.to_string(),
        resource_group_name: "rg-data".to_string(),
        location: location.to_string(),
        tags: BTreeMap::from([("env".to_string(), "test".to_string())]),
        network: network(),
        base,
        variant,
        lifecycle_state: None,
    }
}

pub fn regular_model(name: &str) -> AutonomousDatabaseModel {
    model(name, "eastus", Some(base_config()), VariantConfig::Regular)
}

pub fn clone_model(name: &str, source: &AutonomousDatabaseId, workload: WorkloadType) -> AutonomousDatabaseModel {
    let mut base = base_config();
    base.db_workload = workload;
    model(
        name,
        "eastus",
        Some(base),
        VariantConfig::Clone(CloneConfig {
            source_id: source.to_string(),
            clone_type: CloneType::Full,
            refreshable_model: None,
            time_until_reconnect_clone_enabled: None,
        }),
    )
}

pub fn backup_clone_model(name: &str, source: &AutonomousDatabaseId) -> AutonomousDatabaseModel {
    model(
        name,
        "eastus",
        Some(base_config()),
        VariantConfig::CloneFromBackupTimestamp(BackupCloneConfig {
            source_id: source.to_string(),
            clone_type: CloneType::Metadata,
            backup_timestamp: None,
            use_latest_available_backup_timestamp: false,
        }),
    )
}

pub fn standby_model(
    name: &str,
    location: &str,
    source: &AutonomousDatabaseId,
    source_location: &str,
) -> AutonomousDatabaseModel {
    model(
        name,
        location,
        None,
        VariantConfig::CrossRegionDisasterRecovery(DisasterRecoveryConfig {
            source_id: source.to_string(),
            source_location: source_location.to_string(),
            remote_disaster_recovery_type: DisasterRecoveryType::Adg,
            replicate_automatic_backups_enabled: true,
        }),
    )
}

/// A regular database as the remote system would hold it
pub fn remote_regular(location: &str, workload: Option<WorkloadType>) -> AutonomousDatabase {
    AutonomousDatabase {
        id: None,
        name: None,
        location: location.to_string(),
        tags: BTreeMap::new(),
        properties: Some(DatabaseProperties::Regular(BaseProperties {
            admin_password: Some("Source-Pass-123".to_string()),
            backup_retention_period_in_days: Some(7),
            character_set: Some("AL32UTF8".to_string()),
            ncharacter_set: Some("AL16UTF16".to_string()),
            compute_count: Some(4.0),
            compute_model: Some(ComputeModel::Ecpu),
            customer_contacts: Some(vec![]),
            data_storage_size_in_tbs: Some(2),
            db_version: Some("23ai".to_string()),
            db_workload: workload,
            display_name: Some("source".to_string()),
            is_auto_scaling_enabled: Some(true),
            is_auto_scaling_for_storage_enabled: Some(false),
            is_mtls_connection_required: Some(false),
            license_model: Some(LicenseModel::BringYourOwnLicense),
            long_term_backup_schedule: None,
            subnet_id: Some("source-subnet".to_string()),
            vnet_id: Some("source-vnet".to_string()),
            whitelisted_ips: Some(vec![]),
            lifecycle_state: Some(LifecycleState::Available),
            provisioning_state: Some(ProvisioningState::Succeeded),
            ocid: Some("ocid1.autonomousdatabase.source".to_string()),
        })),
    }
}
