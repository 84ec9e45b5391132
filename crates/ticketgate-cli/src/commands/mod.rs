//! CLI command handlers
//!
//! Issuing (`issue`, `render`), door validation (`scan`) and read-only
//! registry reports (`list`, `show`, `log`, `status`).

pub mod issue;
pub mod report;
pub mod scan;
