//! Messages carried by results the pipeline produces locally.

pub const OPT_OUT_MESSAGE: &str = "Event skipped due to optOut config set to true";

/// Used when a failure carries no message of its own.
pub const UNEXPECTED_ERROR_MESSAGE: &str = "Error";

pub const MISSING_DESTINATION_MESSAGE: &str =
    "Event was not delivered, no destination plugin is registered";

pub fn dropped_by_plugin_message(plugin_name: &str) -> String {
    format!("Event was dropped by plugin {plugin_name}")
}
