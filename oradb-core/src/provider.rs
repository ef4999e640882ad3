//! Provider - Trait abstracting resource operations
//!
//! A Provider defines the lifecycle operations for a family of remote resources.
//! It is responsible for converting declared attributes into management API calls
//! and for reading remote state back into attributes.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::resource::{Resource, ResourceId, State};

/// Classification of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input rejected before any remote call (bad identifier, illegal attribute)
    MalformedInput,
    /// An object already exists at the target identity and must be imported
    RequiresImport,
    /// The object was expected to exist but the remote system reports it absent
    NotFound,
    /// Input is well formed but rejected by a pre-submission check
    Validation,
    /// The remote object is of a different variant than the one managed
    VariantMismatch,
    /// A long-running operation reached a terminal failure state
    OperationFailed,
    /// The caller's deadline elapsed before a terminal state was observed
    Timeout,
    /// Transport or protocol failure talking to the remote system
    Remote,
}

/// Lifecycle transition an error occurred in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Operation::Create => "creating",
            Operation::Read => "reading",
            Operation::Update => "updating",
            Operation::Delete => "deleting",
        };
        f.write_str(verb)
    }
}

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub kind: ErrorKind,
    pub message: String,
    pub resource_id: Option<ResourceId>,
    /// Remote identifier of the object the operation targeted
    pub identifier: Option<String>,
    pub operation: Option<Operation>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}] ", id)?;
        }
        match (self.operation, self.identifier.as_deref()) {
            (Some(op), Some(identifier)) => write!(f, "{} {}: ", op, identifier)?,
            (Some(op), None) => write!(f, "{}: ", op)?,
            (None, Some(identifier)) => write!(f, "{}: ", identifier)?,
            (None, None) => {}
        }
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            resource_id: None,
            identifier: None,
            operation: None,
            cause: None,
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedInput, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    /// Attach the remote identifier unless a more specific one is already set
    pub fn with_identifier(mut self, identifier: impl fmt::Display) -> Self {
        if self.identifier.is_none() {
            self.identifier = Some(identifier.to_string());
        }
        self
    }

    /// Record the transition unless an inner layer already did
    pub fn during(mut self, operation: Operation) -> Self {
        if self.operation.is_none() {
            self.operation = Some(operation);
        }
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn is_requires_import(&self) -> bool {
        self.kind == ErrorKind::RequiresImport
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Definition of resource types that a Provider can handle
pub trait ResourceType: Send + Sync {
    /// Resource type name (e.g., "oracle_autonomous_database")
    fn name(&self) -> &'static str;
}

/// Main Provider trait
///
/// Each provider implements this trait. All operations are async and involve
/// side effects against the remote system; each call is independent and holds
/// no state between invocations.
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "azure")
    fn name(&self) -> &'static str;

    /// List of resource types this Provider can handle
    fn resource_types(&self) -> Vec<Box<dyn ResourceType>>;

    /// Plan-time checks for a resource that is about to be created
    ///
    /// `identifier` is set when the resource already exists; providers should
    /// skip checks that only make sense before creation in that case.
    fn validate(
        &self,
        _resource: &Resource,
        _identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        Box::pin(async { Ok(()) })
    }

    /// Get the current state of a resource
    ///
    /// Returns `State::not_found()` if the resource does not exist. `prior` is the
    /// last known state, used to carry values the remote system never returns.
    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
        prior: Option<&State>,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Create a resource
    ///
    /// Returns State with identifier set to the remote identifier
    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Update a resource from its previous state to the desired one
    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Delete a resource
    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>>;
}

/// Provider implementation for Box<dyn Provider>
/// This enables dynamic dispatch for Providers
impl Provider for Box<dyn Provider> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        (**self).resource_types()
    }

    fn validate(
        &self,
        resource: &Resource,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).validate(resource, identifier)
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: Option<&str>,
        prior: Option<&State>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).read(id, identifier, prior)
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).create(resource)
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).update(id, identifier, from, to)
    }

    fn delete(&self, id: &ResourceId, identifier: &str) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).delete(id, identifier)
    }
}
