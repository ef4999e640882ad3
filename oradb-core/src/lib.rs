//! OraDB Core
//!
//! Provider-agnostic resource model shared by the Oracle Autonomous Database adapters

pub mod provider;
pub mod resource;
