//! Event values submitted to the timeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form structured properties attached to an event.
pub type Properties = Map<String, Value>;

/// Event types with a reserved meaning for the ingestion backend.
pub mod special_event_type {
    pub const IDENTIFY: &str = "$identify";
    pub const GROUP_IDENTIFY: &str = "$groupidentify";
    pub const REVENUE: &str = "revenue_amount";
}

/// A named occurrence submitted for analytics tracking.
///
/// Events are plain values: two events are the same event when all of their
/// fields are equal. Fields the core does not know about are preserved in
/// [`Event::extra`] and serialized back at the top level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_properties: Option<Properties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_properties: Option<Properties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_properties: Option<Properties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Properties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    /// Milliseconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<i64>,
    #[serde(flatten)]
    pub extra: Properties,
}

impl Event {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            ..Default::default()
        }
    }

    pub fn with_event_properties(mut self, properties: Properties) -> Self {
        self.event_properties = Some(properties);
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Merges per-call options into the event. Options that are set take
    /// precedence over the fields already present.
    pub fn apply_options(&mut self, options: EventOptions) {
        let EventOptions {
            user_id,
            device_id,
            time,
            insert_id,
            session_id,
            extra,
        } = options;

        if user_id.is_some() {
            self.user_id = user_id;
        }
        if device_id.is_some() {
            self.device_id = device_id;
        }
        if time.is_some() {
            self.time = time;
        }
        if insert_id.is_some() {
            self.insert_id = insert_id;
        }
        if session_id.is_some() {
            self.session_id = session_id;
        }
        self.extra.extend(extra);
    }
}

/// Identity and context fields a caller can attach to any built event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insert_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<i64>,
    #[serde(flatten)]
    pub extra: Properties,
}

impl EventOptions {
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }
}
