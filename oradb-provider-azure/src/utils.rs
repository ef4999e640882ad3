//! Utility functions for value normalization and conversion

/// Normalize an Azure location (e.g., "West Europe" -> "westeurope",
/// "azure.Location.west_europe" -> "westeurope")
pub fn normalize_location(s: &str) -> String {
    let location_part = if s.contains('.') {
        s.split('.').next_back().unwrap_or(s)
    } else {
        s
    };
    location_part
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

/// Whether two locations name the same region
pub fn same_location(a: &str, b: &str) -> bool {
    normalize_location(a) == normalize_location(b)
}

/// Convert DSL enum value to API format
/// e.g., "azure.WorkloadType.OLTP" -> "OLTP", "WorkloadType.DW" -> "DW"
pub fn convert_enum_value(value: &str) -> &str {
    let parts: Vec<&str> = value.split('.').collect();
    match parts.len() {
        2 if parts[0].chars().next().is_some_and(|c| c.is_uppercase()) => parts[1],
        3 if parts[0].chars().all(|c| c.is_lowercase())
            && parts[1].chars().next().is_some_and(|c| c.is_uppercase()) =>
        {
            parts[2]
        }
        _ => value,
    }
}
