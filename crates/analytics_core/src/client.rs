//! The core client: configuration lifecycle, opt-out and the public
//! event-producing API.
//!
//! Every event method builds an [`Event`] and hands it to
//! [`CoreClient::dispatch`], which is the only place plugin failures are
//! turned into results. Callers always get a [`DispatchResult`] back and
//! inspect its `code` to tell success from failure.

use crate::config::Config;
use crate::error::PluginError;
use crate::events::{
    create_group_event, create_group_identify_event, create_identify_event,
    create_revenue_event, create_track_event,
};
use crate::identify::Identify;
use crate::messages::{OPT_OUT_MESSAGE, UNEXPECTED_ERROR_MESSAGE};
use crate::pending::Pending;
use crate::plugin::Plugin;
use crate::revenue::Revenue;
use crate::timeline::Timeline;
use analytics_types::{DispatchResult, Event, EventOptions, Properties};
use futures::future::{self, BoxFuture, FutureExt};
use serde_json::Value;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Future returned by every event-producing method. Always resolves to a
/// result, never to an error.
pub type ResultFuture = BoxFuture<'static, DispatchResult>;

#[derive(Debug, Default)]
struct ClientState {
    config: Option<Config>,
    /// Opt-out requested before `init`
    pending_opt_out: Option<bool>,
}

/// Entry point for instrumenting an application.
///
/// The client can be used before [`CoreClient::init`]: plugins added and
/// events dispatched in the meantime are held by the timeline and replayed,
/// in order, once configuration arrives.
///
/// Cloning a client yields another handle to the same state.
///
/// Plugin setup and event delivery run on Tokio tasks. `dispatch` and the
/// event methods always settle, but `add` on an initialized client panics
/// when called outside a Tokio runtime, as does `init`.
#[derive(Debug, Clone, Default)]
pub struct CoreClient {
    state: Arc<RwLock<ClientState>>,
    timeline: Timeline,
}

impl CoreClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, ClientState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ClientState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    // ===== Lifecycle =====

    /// Stores the configuration and replays everything submitted so far.
    ///
    /// An opt-out flag set before this call is applied to `config`. Resolves
    /// once the deferred queue has drained; queued events may still be
    /// running through their plugins.
    pub async fn init(&self, mut config: Config) {
        if let Err(e) = config.validate() {
            warn!("Initializing with questionable configuration: {}", e);
        }

        {
            let mut state = self.write();
            if let Some(opt_out) = state.pending_opt_out.take() {
                debug!("Applying opt-out {} requested before init", opt_out);
                config.opt_out = opt_out;
            }
            state.config = Some(config.clone());
        }

        info!("Analytics client initialized");
        self.timeline.attach(Arc::new(config)).await;
    }

    pub fn is_initialized(&self) -> bool {
        self.read().config.is_some()
    }

    /// Snapshot of the current configuration, if initialized
    pub fn config(&self) -> Option<Config> {
        self.read().config.clone()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Enables or disables opt-out. Before `init` the flag is kept and applied
    /// to the configuration passed to `init`. Afterwards the updated
    /// configuration is also what later plugin setups receive.
    pub fn set_opt_out(&self, opt_out: bool) {
        let updated = {
            let mut state = self.write();
            match state.config.as_mut() {
                Some(config) => {
                    config.opt_out = opt_out;
                    Some(config.clone())
                }
                None => {
                    state.pending_opt_out = Some(opt_out);
                    None
                }
            }
        };

        if let Some(config) = updated {
            self.timeline.set_config(Arc::new(config));
        }
    }

    fn opted_out(&self) -> bool {
        self.read().config.as_ref().is_some_and(|c| c.opt_out)
    }

    // ===== Events =====

    pub fn track(
        &self,
        event_type: impl Into<String>,
        event_properties: Option<Properties>,
        options: Option<EventOptions>,
    ) -> ResultFuture {
        self.dispatch(create_track_event(event_type, event_properties, options))
    }

    pub fn identify(&self, identify: &Identify, options: Option<EventOptions>) -> ResultFuture {
        self.dispatch(create_identify_event(identify, options))
    }

    pub fn group_identify(
        &self,
        group_type: &str,
        group_name: impl Into<Value>,
        identify: &Identify,
        options: Option<EventOptions>,
    ) -> ResultFuture {
        self.dispatch(create_group_identify_event(
            group_type, group_name, identify, options,
        ))
    }

    /// Assigns the user to a group. `group_name` may be a string or a list.
    pub fn set_group(
        &self,
        group_type: &str,
        group_name: impl Into<Value>,
        options: Option<EventOptions>,
    ) -> ResultFuture {
        self.dispatch(create_group_event(group_type, group_name, options))
    }

    pub fn revenue(&self, revenue: &Revenue, options: Option<EventOptions>) -> ResultFuture {
        self.dispatch(create_revenue_event(revenue, options))
    }

    /// Sends an event through the timeline.
    ///
    /// Opted-out events settle immediately with code 0 and never reach the
    /// timeline. Plugin errors and panics settle with code 0 and the error
    /// message. Destination results, including non-200 codes, are relayed
    /// unchanged.
    pub fn dispatch(&self, event: Event) -> ResultFuture {
        if self.opted_out() {
            debug!("Opted out, skipping event {}", event.event_type);
            return future::ready(DispatchResult::local_failure(event, OPT_OUT_MESSAGE)).boxed();
        }

        let timeline = &self.timeline;
        let pushed = panic::catch_unwind(AssertUnwindSafe(|| timeline.push(event.clone())));

        match pushed {
            Ok(pending) => async move {
                match pending.await {
                    Ok(result) => result,
                    Err(e) => failure_result(event, &e),
                }
            }
            .boxed(),
            Err(payload) => {
                let e = PluginError::from_panic(payload);
                future::ready(failure_result(event, &e)).boxed()
            }
        }
    }

    // ===== Plugins =====

    /// Registers a plugin. Before `init` the registration is queued and the
    /// handle settles during `init`.
    ///
    /// # Panics
    ///
    /// After `init`, panics if called outside a Tokio runtime.
    pub fn add(&self, plugin: Plugin) -> Pending<()> {
        self.timeline.register(plugin)
    }

    /// Removes the plugin called `name`, queued like [`CoreClient::add`].
    pub fn remove(&self, name: &str) -> Pending<()> {
        self.timeline.deregister(name)
    }

    pub async fn flush(&self) -> Result<(), PluginError> {
        self.timeline.flush().await
    }
}

fn failure_result(event: Event, error: &PluginError) -> DispatchResult {
    let message = error.to_string();
    warn!("Event {} failed: {}", event.event_type, message);
    if message.is_empty() {
        DispatchResult::local_failure(event, UNEXPECTED_ERROR_MESSAGE)
    } else {
        DispatchResult::local_failure(event, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_result_uses_error_message() {
        let result = failure_result(Event::new("x"), &PluginError::execution("boom"));
        assert_eq!(result.code, 0);
        assert_eq!(result.message, "boom");
        assert_eq!(result.event.event_type, "x");
    }

    #[test]
    fn test_failure_result_falls_back_for_empty_message() {
        let result = failure_result(Event::new("x"), &PluginError::execution(""));
        assert_eq!(result.message, UNEXPECTED_ERROR_MESSAGE);
    }

    #[test]
    fn test_opt_out_is_buffered_until_init() {
        let client = CoreClient::new();
        client.set_opt_out(true);
        client.set_opt_out(false);
        client.set_opt_out(true);

        assert!(client.config().is_none());
        assert_eq!(client.read().pending_opt_out, Some(true));
    }

    #[tokio::test]
    async fn test_init_applies_buffered_opt_out() {
        let client = CoreClient::new();
        client.set_opt_out(true);

        client.init(Config::new("key")).await;

        assert!(client.is_initialized());
        assert!(client.config().map(|c| c.opt_out).unwrap_or(false));
        assert!(client.read().pending_opt_out.is_none());
        assert!(client.timeline().is_ready());
    }

    #[tokio::test]
    async fn test_opted_out_dispatch_skips_timeline() {
        let client = CoreClient::new();
        client.init(Config::new("key")).await;
        client.set_opt_out(true);

        let result = client.dispatch(Event::new("x")).await;

        assert_eq!(result.code, 0);
        assert_eq!(result.message, OPT_OUT_MESSAGE);
        assert_eq!(client.timeline().stats().events_pushed, 0);
    }
}
