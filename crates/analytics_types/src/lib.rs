//! # Analytics Types
//!
//! Plain data types shared between the analytics core and the plugins that
//! run inside its timeline. Nothing in this crate performs I/O; it only
//! describes the values that flow through the pipeline:
//!
//! - [`Event`]: a named occurrence with optional structured properties
//! - [`EventOptions`]: per-call identity fields merged into built events
//! - [`DispatchResult`]: the settled outcome of dispatching one event
//! - [`Status`]: canonical status strings destinations report
//! - [`PluginType`]: the category a plugin runs in

pub mod event;
pub mod result;

pub use event::{special_event_type, Event, EventOptions, Properties};
pub use result::{DispatchResult, Status, LOCAL_FAILURE_CODE, SUCCESS_CODE};

use serde::{Deserialize, Serialize};

/// Category a plugin is registered under.
///
/// `Before` and `Enrichment` plugins pre-process events and may drop them.
/// `Destination` plugins are terminal and report a [`DispatchResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PluginType {
    Before,
    Enrichment,
    Destination,
}

impl PluginType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginType::Before => "before",
            PluginType::Enrichment => "enrichment",
            PluginType::Destination => "destination",
        }
    }

    /// Whether plugins of this category run before destinations.
    pub fn is_pre_processing(&self) -> bool {
        !matches!(self, PluginType::Destination)
    }
}

impl std::fmt::Display for PluginType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
