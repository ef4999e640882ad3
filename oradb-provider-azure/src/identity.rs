//! Autonomous Database resource identifiers
//!
//! `/subscriptions/{sub}/resourceGroups/{rg}/providers/Oracle.Database/autonomousDatabases/{name}`

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use oradb_core::provider::{ProviderError, ProviderResult};
use regex::Regex;

static AUTONOMOUS_DATABASE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^/subscriptions/([^/]+)/resourceGroups/([^/]+)/providers/Oracle\.Database/autonomousDatabases/([^/]+)/?$",
    )
    .expect("autonomous database id pattern is valid")
});

/// Structured identifier of one autonomous database
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AutonomousDatabaseId {
    pub subscription_id: String,
    pub resource_group_name: String,
    pub autonomous_database_name: String,
}

impl AutonomousDatabaseId {
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group_name: impl Into<String>,
        autonomous_database_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group_name: resource_group_name.into(),
            autonomous_database_name: autonomous_database_name.into(),
        }
    }

    /// Parse an identifier string, rejecting anything that is not an
    /// autonomous database id
    pub fn parse(input: &str) -> ProviderResult<Self> {
        let captures = AUTONOMOUS_DATABASE_ID.captures(input.trim()).ok_or_else(|| {
            ProviderError::malformed(format!(
                "parsing {:?} as an Autonomous Database ID: expected \
                 /subscriptions/{{subscriptionId}}/resourceGroups/{{resourceGroupName}}/providers/Oracle.Database/autonomousDatabases/{{autonomousDatabaseName}}",
                input
            ))
        })?;

        Ok(Self::new(&captures[1], &captures[2], &captures[3]))
    }
}

impl fmt::Display for AutonomousDatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "/subscriptions/{}/resourceGroups/{}/providers/Oracle.Database/autonomousDatabases/{}",
            self.subscription_id, self.resource_group_name, self.autonomous_database_name
        )
    }
}

impl FromStr for AutonomousDatabaseId {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
