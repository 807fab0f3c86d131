//! Factories for the canonical event shapes the client sends.

use crate::identify::Identify;
use crate::revenue::Revenue;
use analytics_types::{special_event_type, Event, EventOptions, Properties};
use serde_json::Value;
use tracing::warn;

fn finish(mut event: Event, options: Option<EventOptions>) -> Event {
    if let Some(options) = options {
        event.apply_options(options);
    }
    event
}

fn single(key: &str, value: Value) -> Properties {
    let mut properties = Properties::new();
    properties.insert(key.to_string(), value);
    properties
}

pub fn create_track_event(
    event_type: impl Into<String>,
    event_properties: Option<Properties>,
    options: Option<EventOptions>,
) -> Event {
    let event = Event {
        event_properties,
        ..Event::new(event_type)
    };
    finish(event, options)
}

pub fn create_identify_event(identify: &Identify, options: Option<EventOptions>) -> Event {
    let event = Event {
        user_properties: Some(identify.user_properties()),
        ..Event::new(special_event_type::IDENTIFY)
    };
    finish(event, options)
}

pub fn create_group_identify_event(
    group_type: &str,
    group_name: impl Into<Value>,
    identify: &Identify,
    options: Option<EventOptions>,
) -> Event {
    let event = Event {
        group_properties: Some(identify.user_properties()),
        groups: Some(single(group_type, group_name.into())),
        ..Event::new(special_event_type::GROUP_IDENTIFY)
    };
    finish(event, options)
}

/// Membership event: sets the group as a user property and tags the event
/// with the group.
pub fn create_group_event(
    group_type: &str,
    group_name: impl Into<Value>,
    options: Option<EventOptions>,
) -> Event {
    let group_name = group_name.into();
    let event = Event {
        user_properties: Some(single(
            "$set",
            Value::Object(single(group_type, group_name.clone())),
        )),
        groups: Some(single(group_type, group_name)),
        ..Event::new(special_event_type::IDENTIFY)
    };
    finish(event, options)
}

pub fn create_revenue_event(revenue: &Revenue, options: Option<EventOptions>) -> Event {
    if !revenue.is_valid() {
        warn!("Revenue event has no price set");
    }
    let event = Event {
        event_properties: Some(revenue.event_properties()),
        ..Event::new(special_event_type::REVENUE)
    };
    finish(event, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_track_event() {
        let mut properties = Properties::new();
        properties.insert("button".to_string(), json!("buy"));

        let event = create_track_event("click", Some(properties.clone()), None);

        assert_eq!(event.event_type, "click");
        assert_eq!(event.event_properties, Some(properties));
    }

    #[test]
    fn test_identify_event() {
        let identify = Identify::new().set("plan", "pro");
        let event = create_identify_event(&identify, Some(EventOptions::user("u-1")));

        assert_eq!(event.event_type, "$identify");
        assert_eq!(event.user_id.as_deref(), Some("u-1"));
        assert_eq!(
            serde_json::to_value(&event.user_properties).unwrap(),
            json!({ "$set": { "plan": "pro" } })
        );
    }

    #[test]
    fn test_group_identify_event() {
        let identify = Identify::new().set("tier", "gold");
        let event = create_group_identify_event("org", "acme", &identify, None);

        assert_eq!(event.event_type, "$groupidentify");
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "event_type": "$groupidentify",
                "group_properties": { "$set": { "tier": "gold" } },
                "groups": { "org": "acme" },
            })
        );
    }

    #[test]
    fn test_group_event_accepts_multiple_names() {
        let event = create_group_event("team", vec!["red", "blue"], None);

        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "event_type": "$identify",
                "user_properties": { "$set": { "team": ["red", "blue"] } },
                "groups": { "team": ["red", "blue"] },
            })
        );
    }

    #[test]
    fn test_revenue_event() {
        let revenue = Revenue::new().set_price(5.0).set_product_id("sku");
        let event = create_revenue_event(&revenue, None);

        assert_eq!(event.event_type, "revenue_amount");
        assert_eq!(event.event_properties, Some(revenue.event_properties()));
    }
}
