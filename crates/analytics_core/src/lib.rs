//! # Analytics Core
//!
//! The client-side core of an analytics instrumentation SDK. Applications
//! emit events through a [`CoreClient`]; the client runs them through an
//! ordered plugin pipeline (the [`Timeline`]) and hands back a
//! [`DispatchResult`] for every event.
//!
//! ## Core Features
//!
//! - **Ordered Pipeline**: pre-processing plugins run in registration order,
//!   each seeing the previous plugin's output, before destinations deliver
//! - **Use Before Init**: plugins and events submitted before
//!   [`CoreClient::init`] are queued and replayed in order
//! - **Always Settles**: plugin errors and panics become zero-code results,
//!   never errors or panics at the caller
//! - **Opt-out**: opted-out clients skip events locally
//!
//! ## Quick Start Example
//!
//! ```rust
//! use analytics_core::*;
//! use async_trait::async_trait;
//!
//! struct Console;
//!
//! #[async_trait]
//! impl DestinationPlugin for Console {
//!     fn name(&self) -> &str { "console" }
//!
//!     async fn execute(&self, event: Event) -> Result<DispatchResult, PluginError> {
//!         println!("{}", event.event_type);
//!         Ok(DispatchResult::success(event))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = CoreClient::new();
//!     let added = client.add(Plugin::destination(Console));
//!     let tracked = client.track("app_opened", None, None);
//!
//!     client.init(Config::new("my-api-key")).await;
//!
//!     added.await.unwrap();
//!     let result = tracked.await;
//!     assert_eq!(result.code, 200);
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod events;
pub mod identify;
pub mod logging;
pub mod messages;
pub mod pending;
pub mod plugin;
pub mod revenue;
pub mod timeline;

// Re-export commonly used types
pub use analytics_types::{
    special_event_type, DispatchResult, Event, EventOptions, PluginType, Properties, Status,
    LOCAL_FAILURE_CODE, SUCCESS_CODE,
};
pub use client::{CoreClient, ResultFuture};
pub use config::Config;
pub use error::{ConfigError, PluginError};
pub use identify::{Identify, IdentifyOperation};
pub use logging::setup_logging;
pub use pending::Pending;
pub use plugin::{DestinationPlugin, EnrichmentPlugin, Plugin};
pub use revenue::Revenue;
pub use timeline::{Timeline, TimelineStats};
