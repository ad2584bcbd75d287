//! Workspace preferences and their validation.
//!
//! Preferences are the workspace-level configuration layer. They are plain
//! data validated against an embedded JSON Schema on every write.

mod preferences;
mod schema;

pub use preferences::{GuardPreferences, WorkspacePreferences};
pub use schema::{validate_preferences_schema, SchemaError};
