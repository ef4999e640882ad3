//! Existence check run before a create
//!
//! A create never adopts an object that was made out of band: if anything is
//! found at the target identity, the caller has to import it explicitly.

use log::debug;
use oradb_core::provider::{ErrorKind, ProviderError, ProviderResult};

use crate::client::AutonomousDatabaseClient;
use crate::identity::AutonomousDatabaseId;
use crate::remote::AutonomousDatabase;

/// Outcome of probing the target identity
#[derive(Debug, Clone, PartialEq)]
pub enum Presence {
    /// Nothing there; creation may proceed
    Absent,
    /// Something is there, whatever its lifecycle state
    RequiresImport(Box<AutonomousDatabase>),
}

/// Probe `id` and classify the lookup
pub async fn ensure_absent(
    client: &dyn AutonomousDatabaseClient,
    id: &AutonomousDatabaseId,
) -> ProviderResult<Presence> {
    match client.get(id).await {
        Ok(existing) => {
            debug!(
                "{} already exists (lifecycle state {:?})",
                id,
                existing
                    .properties
                    .as_ref()
                    .and_then(|p| p.base().lifecycle_state.as_ref())
            );
            Ok(Presence::RequiresImport(Box::new(existing)))
        }
        Err(e) if e.is_not_found() => Ok(Presence::Absent),
        Err(e) => Err(e.context(format!("checking for presence of existing {}", id))),
    }
}

/// Error returned to the caller when [`Presence::RequiresImport`] is observed
pub fn requires_import(id: &AutonomousDatabaseId) -> ProviderError {
    ProviderError::new(
        ErrorKind::RequiresImport,
        format!(
            "a resource with the ID {:?} already exists - to be managed it needs to be imported into the state",
            id.to_string()
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::RemoteError;
    use crate::models::LifecycleState;
    use crate::remote::DatabaseProperties;
    use crate::testing::{FakeClient, db_id, remote_regular};

    #[tokio::test]
    async fn not_found_means_absent() {
        let client = FakeClient::new();
        let presence = ensure_absent(&client, &db_id("adb01")).await.unwrap();
        assert_eq!(presence, Presence::Absent);
    }

    #[tokio::test]
    async fn existing_object_requires_import() {
        let client = FakeClient::new();
        let id = db_id("adb01");
        client.insert(&id, remote_regular("eastus", None));

        let presence = ensure_absent(&client, &id).await.unwrap();
        assert!(matches!(presence, Presence::RequiresImport(_)));
    }

    #[tokio::test]
    async fn terminating_object_still_requires_import() {
        let client = FakeClient::new();
        let id = db_id("adb01");
        let mut db = remote_regular("eastus", None);
        if let Some(DatabaseProperties::Regular(base)) = db.properties.as_mut() {
            base.lifecycle_state = Some(LifecycleState::Terminating);
        }
        client.insert(&id, db);

        let presence = ensure_absent(&client, &id).await.unwrap();
        assert!(matches!(presence, Presence::RequiresImport(_)));
    }

    #[tokio::test]
    async fn other_lookup_errors_are_hard_errors() {
        let client = FakeClient::new();
        client.fail_gets_with(RemoteError::Status {
            status: 403,
            code: "AuthorizationFailed".to_string(),
            message: "no access".to_string(),
        });

        let err = ensure_absent(&client, &db_id("adb01")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Remote);
        assert!(err.message.contains("checking for presence of existing"));
    }

    #[test]
    fn requires_import_error_names_the_identity() {
        let id = db_id("adb01");
        let err = requires_import(&id);
        assert!(err.is_requires_import());
        assert!(err.message.contains(&id.to_string()));
    }
}
