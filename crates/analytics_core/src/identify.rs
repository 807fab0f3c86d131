//! User property operations sent with identify and group identify events.

use analytics_types::Properties;
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

/// Value stored for `$unset` and `$clearAll` operations
pub const UNSET_VALUE: &str = "-";

/// A user property operation understood by the ingestion backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifyOperation {
    Set,
    SetOnce,
    Add,
    Append,
    Prepend,
    PreInsert,
    PostInsert,
    Remove,
    Unset,
    ClearAll,
}

impl IdentifyOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifyOperation::Set => "$set",
            IdentifyOperation::SetOnce => "$setOnce",
            IdentifyOperation::Add => "$add",
            IdentifyOperation::Append => "$append",
            IdentifyOperation::Prepend => "$prepend",
            IdentifyOperation::PreInsert => "$preInsert",
            IdentifyOperation::PostInsert => "$postInsert",
            IdentifyOperation::Remove => "$remove",
            IdentifyOperation::Unset => "$unset",
            IdentifyOperation::ClearAll => "$clearAll",
        }
    }
}

/// Builder for the user property payload of an identify event.
///
/// Each property can take part in one operation only; later operations on
/// the same property are ignored. Once [`Identify::clear_all`] is called the
/// payload is fixed to `{"$clearAll": "-"}`.
///
/// ```rust
/// use analytics_core::Identify;
///
/// let identify = Identify::new()
///     .set("plan", "pro")
///     .add("logins", 1)
///     .unset("trial_ends");
///
/// let properties = identify.user_properties();
/// assert_eq!(properties["$set"]["plan"], "pro");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Identify {
    operations: Properties,
    touched: HashSet<String>,
}

impl Identify {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(self, property: &str, value: impl Into<Value>) -> Self {
        self.apply(IdentifyOperation::Set, property, value.into())
    }

    pub fn set_once(self, property: &str, value: impl Into<Value>) -> Self {
        self.apply(IdentifyOperation::SetOnce, property, value.into())
    }

    /// Increments a numeric property. Non-numeric values are ignored.
    pub fn add(self, property: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        if !value.is_number() {
            warn!("Identify add on {} ignored, value {} is not a number", property, value);
            return self;
        }
        self.apply(IdentifyOperation::Add, property, value)
    }

    pub fn append(self, property: &str, value: impl Into<Value>) -> Self {
        self.apply(IdentifyOperation::Append, property, value.into())
    }

    pub fn prepend(self, property: &str, value: impl Into<Value>) -> Self {
        self.apply(IdentifyOperation::Prepend, property, value.into())
    }

    pub fn pre_insert(self, property: &str, value: impl Into<Value>) -> Self {
        self.apply(IdentifyOperation::PreInsert, property, value.into())
    }

    pub fn post_insert(self, property: &str, value: impl Into<Value>) -> Self {
        self.apply(IdentifyOperation::PostInsert, property, value.into())
    }

    pub fn remove(self, property: &str, value: impl Into<Value>) -> Self {
        self.apply(IdentifyOperation::Remove, property, value.into())
    }

    pub fn unset(self, property: &str) -> Self {
        self.apply(IdentifyOperation::Unset, property, Value::from(UNSET_VALUE))
    }

    /// Clears every user property. Discards all other operations.
    pub fn clear_all(mut self) -> Self {
        self.operations = Properties::new();
        self.operations.insert(
            IdentifyOperation::ClearAll.as_str().to_string(),
            Value::from(UNSET_VALUE),
        );
        self.touched.clear();
        self
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// The payload keyed by operation name, e.g. `{"$set": {"plan": "pro"}}`.
    pub fn user_properties(&self) -> Properties {
        self.operations.clone()
    }

    fn apply(mut self, operation: IdentifyOperation, property: &str, value: Value) -> Self {
        if self
            .operations
            .contains_key(IdentifyOperation::ClearAll.as_str())
        {
            warn!(
                "Identify {} on {} ignored, user properties are being cleared",
                operation.as_str(),
                property
            );
            return self;
        }

        if property.is_empty() {
            warn!("Identify {} ignored, property name is empty", operation.as_str());
            return self;
        }

        if !self.touched.insert(property.to_string()) {
            warn!(
                "Identify {} on {} ignored, property already has an operation",
                operation.as_str(),
                property
            );
            return self;
        }

        let entry = self
            .operations
            .entry(operation.as_str())
            .or_insert_with(|| Value::Object(Properties::new()));
        if let Value::Object(properties) = entry {
            properties.insert(property.to_string(), value);
        }

        self
    }
}
