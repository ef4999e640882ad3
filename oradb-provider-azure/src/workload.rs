//! Workload compatibility between a source database and a clone of it
//!
//! The API only accepts certain (source, target) workload pairs when cloning.
//! The table is fixed; it is checked before anything is submitted.

use std::collections::HashMap;
use std::sync::LazyLock;

use oradb_core::provider::{ProviderError, ProviderResult};

use crate::models::WorkloadType;

/// Source workload -> workloads a clone of it may use
static COMPATIBLE_TARGETS: LazyLock<HashMap<WorkloadType, &'static [WorkloadType]>> =
    LazyLock::new(|| {
        use WorkloadType::*;

        HashMap::from([
            (Dw, &[Oltp, Dw][..]),
            (Oltp, &[Dw, Oltp][..]),
            (Ajd, &[Oltp, Dw, Apex][..]),
            (Apex, &[Ajd, Oltp, Dw][..]),
        ])
    });

/// Workloads a clone of `source` may be created with
pub fn allowed_targets(source: WorkloadType) -> Option<&'static [WorkloadType]> {
    COMPATIBLE_TARGETS.get(&source).copied()
}

/// Check that a database with workload `source` may be cloned into `target`
pub fn validate(
    source_id: &str,
    source: Option<WorkloadType>,
    target: WorkloadType,
) -> ProviderResult<()> {
    let source = source.ok_or_else(|| {
        ProviderError::validation(format!(
            "could not determine the workload of source database {}",
            source_id
        ))
    })?;

    let allowed = allowed_targets(source).ok_or_else(|| {
        ProviderError::validation(format!(
            "source database {} has workload {} which does not support cloning",
            source_id, source
        ))
    })?;

    if allowed.contains(&target) {
        Ok(())
    } else {
        Err(ProviderError::validation(format!(
            "workload {} is not compatible with source workload {} of {}; allowed: {}",
            target,
            source,
            source_id,
            allowed
                .iter()
                .map(|w| w.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }
}

/// Plan-time variant of [`validate`]: once the clone has an identity its
/// workload is fixed, so there is nothing left to check
pub fn validate_for_plan(
    existing_identifier: Option<&str>,
    source_id: &str,
    source: Option<WorkloadType>,
    target: WorkloadType,
) -> ProviderResult<()> {
    if existing_identifier.is_some() {
        return Ok(());
    }
    validate(source_id, source, target)
}
