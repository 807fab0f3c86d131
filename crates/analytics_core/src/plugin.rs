//! Plugin traits and the tagged plugin value the timeline stores.
//!
//! Plugins come in two shapes. Pre-processing plugins ([`EnrichmentPlugin`])
//! receive an event and hand back a possibly transformed event, or `None` to
//! drop it. Destination plugins ([`DestinationPlugin`]) receive the final
//! event and report how delivery went.
//!
//! ```rust,no_run
//! use analytics_core::*;
//!
//! struct AddPlatform;
//!
//! #[async_trait::async_trait]
//! impl EnrichmentPlugin for AddPlatform {
//!     fn name(&self) -> &str { "add-platform" }
//!
//!     async fn execute(&self, mut event: Event) -> Result<Option<Event>, PluginError> {
//!         event.extra.insert("platform".into(), "server".into());
//!         Ok(Some(event))
//!     }
//! }
//!
//! # async fn run(client: CoreClient) {
//! client.add(Plugin::enrichment(AddPlatform)).await.ok();
//! # }
//! ```

use crate::config::Config;
use crate::error::PluginError;
use analytics_types::{DispatchResult, Event, PluginType};
use async_trait::async_trait;
use std::sync::Arc;

/// A plugin that runs before destinations and may transform or drop events.
#[async_trait]
pub trait EnrichmentPlugin: Send + Sync {
    /// Unique name among registered plugins
    fn name(&self) -> &str;

    /// Called once when the plugin is registered on a configured timeline.
    async fn setup(&self, _config: &Config) -> Result<(), PluginError> {
        Ok(())
    }

    /// Returns the event to pass on, or `None` to drop it.
    async fn execute(&self, event: Event) -> Result<Option<Event>, PluginError>;
}

/// A terminal plugin that delivers events and reports the outcome.
#[async_trait]
pub trait DestinationPlugin: Send + Sync {
    /// Unique name among registered plugins
    fn name(&self) -> &str;

    /// Called once when the plugin is registered on a configured timeline.
    async fn setup(&self, _config: &Config) -> Result<(), PluginError> {
        Ok(())
    }

    async fn execute(&self, event: Event) -> Result<DispatchResult, PluginError>;

    /// Forces outstanding deliveries to settle.
    async fn flush(&self) -> Result<(), PluginError> {
        Ok(())
    }
}

/// A plugin tagged with the category it runs in.
#[derive(Clone)]
pub enum Plugin {
    Before(Arc<dyn EnrichmentPlugin>),
    Enrichment(Arc<dyn EnrichmentPlugin>),
    Destination(Arc<dyn DestinationPlugin>),
}

impl Plugin {
    pub fn before(plugin: impl EnrichmentPlugin + 'static) -> Self {
        Plugin::Before(Arc::new(plugin))
    }

    pub fn enrichment(plugin: impl EnrichmentPlugin + 'static) -> Self {
        Plugin::Enrichment(Arc::new(plugin))
    }

    pub fn destination(plugin: impl DestinationPlugin + 'static) -> Self {
        Plugin::Destination(Arc::new(plugin))
    }

    pub fn name(&self) -> &str {
        match self {
            Plugin::Before(p) | Plugin::Enrichment(p) => p.name(),
            Plugin::Destination(p) => p.name(),
        }
    }

    pub fn plugin_type(&self) -> PluginType {
        match self {
            Plugin::Before(_) => PluginType::Before,
            Plugin::Enrichment(_) => PluginType::Enrichment,
            Plugin::Destination(_) => PluginType::Destination,
        }
    }

    pub(crate) async fn setup(&self, config: &Config) -> Result<(), PluginError> {
        match self {
            Plugin::Before(p) | Plugin::Enrichment(p) => p.setup(config).await,
            Plugin::Destination(p) => p.setup(config).await,
        }
    }
}

impl std::fmt::Debug for Plugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Plugin")
            .field("name", &self.name())
            .field("type", &self.plugin_type())
            .finish()
    }
}
