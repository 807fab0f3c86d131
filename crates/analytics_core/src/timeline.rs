//! The event timeline: an ordered plugin pipeline plus its readiness state.
//!
//! A timeline starts out unconfigured. Until [`Timeline::attach`] hands it a
//! configuration, every `register`, `deregister` and `push` is recorded in a
//! FIFO queue and its [`Pending`] handle stays unsettled. Attaching replays
//! the queue exactly once, in submission order, and from then on operations
//! run as they are submitted.
//!
//! Pre-processing plugins (`Before` and `Enrichment`) run one after another
//! in registration order, each receiving the previous plugin's output. The
//! surviving event is then handed to every destination concurrently, and the
//! push settles to the result reported by the **first** destination in
//! registration order. Failures of later destinations are logged only.
//!
//! The timeline does not turn plugin errors into results; they reach the
//! caller through the pending handle.

use crate::config::Config;
use crate::error::PluginError;
use crate::messages::{dropped_by_plugin_message, MISSING_DESTINATION_MESSAGE};
use crate::pending::{Completion, Pending};
use crate::plugin::{DestinationPlugin, EnrichmentPlugin, Plugin};
use analytics_types::{DispatchResult, Event, PluginType};
use futures::channel::oneshot;
use futures::future::join_all;
use futures::FutureExt;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

// ============================================================================
// Internal State
// ============================================================================

/// Work submitted before the timeline was configured
enum Deferred {
    Register { plugin: Plugin, done: Completion<()> },
    Deregister { name: String, done: Completion<()> },
    Push { event: Event, done: Completion<DispatchResult> },
}

/// A registered plugin's position in its category.
///
/// Slots are reserved when `register` is called and only become active once
/// setup succeeds, so order follows calls rather than setup completion.
struct Slot<P: ?Sized> {
    id: u64,
    name: String,
    kind: PluginType,
    plugin: Arc<P>,
    active: bool,
}

/// Timeline counters
#[derive(Debug, Default, Clone)]
pub struct TimelineStats {
    /// Plugins whose setup completed
    pub plugins_registered: u64,
    /// Plugins removed by name
    pub plugins_deregistered: u64,
    /// Events that entered the pipeline
    pub events_pushed: u64,
    /// Events submitted before the timeline was ready
    pub events_queued: u64,
}

#[derive(Default)]
struct TimelineState {
    config: Option<Arc<Config>>,
    ready: bool,
    draining: bool,
    /// Callers of `attach` waiting for the drain to finish
    drain_waiters: Vec<oneshot::Sender<()>>,
    queue: VecDeque<Deferred>,
    before: Vec<Slot<dyn EnrichmentPlugin>>,
    destinations: Vec<Slot<dyn DestinationPlugin>>,
    next_slot_id: u64,
    stats: TimelineStats,
}

impl TimelineState {
    /// Configuration to run operations with, once the queue has drained.
    fn ready_config(&self) -> Option<Arc<Config>> {
        if self.ready {
            self.config.clone()
        } else {
            None
        }
    }

    /// Appends an inactive slot for `plugin`. A plugin with the same name
    /// stays in place until this slot is activated.
    fn reserve(&mut self, plugin: &Plugin) -> u64 {
        let name = plugin.name().to_string();
        let id = self.next_slot_id;
        self.next_slot_id += 1;
        let kind = plugin.plugin_type();

        match plugin {
            Plugin::Before(p) | Plugin::Enrichment(p) => self.before.push(Slot {
                id,
                name,
                kind,
                plugin: p.clone(),
                active: false,
            }),
            Plugin::Destination(p) => self.destinations.push(Slot {
                id,
                name,
                kind,
                plugin: p.clone(),
                active: false,
            }),
        }

        id
    }

    /// Activates a slot and evicts other plugins with the same name.
    /// Returns false if the slot was removed while its plugin was set up.
    fn activate(&mut self, id: u64, name: &str) -> bool {
        let found = if let Some(slot) = self.before.iter_mut().find(|s| s.id == id) {
            slot.active = true;
            true
        } else if let Some(slot) = self.destinations.iter_mut().find(|s| s.id == id) {
            slot.active = true;
            true
        } else {
            false
        };

        if found {
            let before = self.before.len() + self.destinations.len();
            self.before.retain(|s| s.id == id || s.name != name);
            self.destinations.retain(|s| s.id == id || s.name != name);
            if self.before.len() + self.destinations.len() < before {
                warn!("Plugin {} was already registered, replaced it", name);
            }
        }

        found
    }

    fn remove_slot(&mut self, id: u64) {
        self.before.retain(|s| s.id != id);
        self.destinations.retain(|s| s.id != id);
    }

    /// Removes the first plugin called `name`, checking pre-processing
    /// plugins before destinations.
    fn remove_named(&mut self, name: &str) -> bool {
        if let Some(index) = self.before.iter().position(|s| s.name == name) {
            self.before.remove(index);
            return true;
        }
        if let Some(index) = self.destinations.iter().position(|s| s.name == name) {
            self.destinations.remove(index);
            return true;
        }
        false
    }

    fn deregister_now(&mut self, name: &str) {
        if self.remove_named(name) {
            self.stats.plugins_deregistered += 1;
            info!("Deregistered plugin {}", name);
        } else {
            debug!("No plugin named {} to deregister", name);
        }
    }

    /// Snapshot of the active plugins, in execution order.
    fn pipeline(&self) -> Pipeline {
        Pipeline {
            before: self
                .before
                .iter()
                .filter(|s| s.active)
                .map(|s| (s.name.clone(), s.plugin.clone()))
                .collect(),
            destinations: self
                .destinations
                .iter()
                .filter(|s| s.active)
                .map(|s| (s.name.clone(), s.plugin.clone()))
                .collect(),
        }
    }
}

// ============================================================================
// Pipeline Execution
// ============================================================================

/// The plugins one event runs through, fixed at submission time.
struct Pipeline {
    before: Vec<(String, Arc<dyn EnrichmentPlugin>)>,
    destinations: Vec<(String, Arc<dyn DestinationPlugin>)>,
}

impl Pipeline {
    async fn run(self, mut event: Event) -> Result<DispatchResult, PluginError> {
        for (name, plugin) in &self.before {
            match plugin.execute(event.clone()).await? {
                Some(next) => event = next,
                None => {
                    debug!("Plugin {} dropped event {}", name, event.event_type);
                    return Ok(DispatchResult::local_failure(
                        event,
                        dropped_by_plugin_message(name),
                    ));
                }
            }
        }

        let deliveries = self
            .destinations
            .iter()
            .map(|(_, destination)| destination.execute(event.clone()));
        let mut outcomes = join_all(deliveries)
            .await
            .into_iter()
            .zip(self.destinations.iter().map(|(name, _)| name));

        let Some((first, _)) = outcomes.next() else {
            warn!("No destination registered for event {}", event.event_type);
            return Ok(DispatchResult::local_failure(
                event,
                MISSING_DESTINATION_MESSAGE,
            ));
        };

        for (outcome, name) in outcomes {
            if let Err(e) = outcome {
                warn!("Destination {} failed: {}", name, e);
            }
        }

        first
    }
}

/// Runs `event` on its own task so it settles even if nobody awaits it.
fn spawn_pipeline(pipeline: Pipeline, event: Event, done: Completion<DispatchResult>) {
    tokio::spawn(async move {
        let outcome = AssertUnwindSafe(pipeline.run(event))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(PluginError::from_panic(payload)));
        let _ = done.send(outcome);
    });
}

// ============================================================================
// Timeline
// ============================================================================

/// Ordered plugin pipeline with deferred execution until configured.
///
/// Cloning a timeline yields another handle to the same pipeline.
///
/// Setup, event delivery and the queue drain run on spawned tasks, so
/// `register`, `push` and `attach` need a Tokio runtime. Only `deregister`
/// and submissions made before `attach` work without one.
#[derive(Clone, Default)]
pub struct Timeline {
    state: Arc<Mutex<TimelineState>>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, TimelineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a configuration is attached and the deferred queue drained
    pub fn is_ready(&self) -> bool {
        self.lock().ready
    }

    /// Number of operations waiting for configuration
    pub fn queued_len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn stats(&self) -> TimelineStats {
        self.lock().stats.clone()
    }

    /// Active plugins in execution order: pre-processing first, then
    /// destinations.
    pub fn registered_plugins(&self) -> Vec<(PluginType, String)> {
        let state = self.lock();
        state
            .before
            .iter()
            .filter(|s| s.active)
            .map(|s| (s.kind, s.name.clone()))
            .chain(
                state
                    .destinations
                    .iter()
                    .filter(|s| s.active)
                    .map(|s| (s.kind, s.name.clone())),
            )
            .collect()
    }

    /// Registers a plugin at the end of its category.
    ///
    /// On a ready timeline the plugin's place is taken immediately and its
    /// setup runs in the background; the handle settles once setup finishes.
    /// A failed setup removes the plugin and settles to
    /// [`PluginError::Setup`]. A plugin already registered under the same
    /// name keeps running until the new one's setup succeeds, and stays
    /// registered if it fails.
    ///
    /// # Panics
    ///
    /// On a ready timeline, panics if called outside a Tokio runtime.
    pub fn register(&self, plugin: Plugin) -> Pending<()> {
        let (done, pending) = Pending::channel();
        let mut state = self.lock();

        let Some(config) = state.ready_config() else {
            debug!("Timeline not ready, deferring registration of {}", plugin.name());
            state.queue.push_back(Deferred::Register { plugin, done });
            return pending;
        };

        let slot = state.reserve(&plugin);
        drop(state);

        let timeline = self.clone();
        tokio::spawn(async move {
            let outcome = timeline.complete_registration(plugin, slot, &config).await;
            let _ = done.send(outcome);
        });

        pending
    }

    /// Removes the first plugin called `name`. Unknown names are a no-op.
    pub fn deregister(&self, name: &str) -> Pending<()> {
        let mut state = self.lock();

        if !state.ready {
            debug!("Timeline not ready, deferring deregistration of {}", name);
            let (done, pending) = Pending::channel();
            state.queue.push_back(Deferred::Deregister {
                name: name.to_string(),
                done,
            });
            return pending;
        }

        state.deregister_now(name);
        Pending::settled(Ok(()))
    }

    /// Submits an event to the pipeline.
    ///
    /// The returned handle stays pending until the timeline is configured and
    /// the event has run through every plugin.
    pub fn push(&self, event: Event) -> Pending<DispatchResult> {
        let (done, pending) = Pending::channel();
        let mut state = self.lock();

        if !state.ready {
            debug!("Timeline not ready, queueing event {}", event.event_type);
            state.stats.events_queued += 1;
            state.queue.push_back(Deferred::Push { event, done });
            return pending;
        }

        state.stats.events_pushed += 1;
        let pipeline = state.pipeline();
        drop(state);

        spawn_pipeline(pipeline, event, done);
        pending
    }

    /// Flushes every destination and waits for all of them.
    ///
    /// Returns the first failure in registration order.
    pub async fn flush(&self) -> Result<(), PluginError> {
        let destinations = self.lock().pipeline().destinations;
        debug!("Flushing {} destinations", destinations.len());

        let outcomes = join_all(destinations.iter().map(|(_, d)| d.flush())).await;

        let mut first_error = None;
        for ((name, _), outcome) in destinations.iter().zip(outcomes) {
            if let Err(e) = outcome {
                error!("Destination {} failed to flush: {}", name, e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Replaces the configuration used by later registrations without
    /// touching readiness or the deferred queue.
    pub fn set_config(&self, config: Arc<Config>) {
        self.lock().config = Some(config);
    }

    /// Attaches configuration and replays the deferred queue in order.
    ///
    /// Registrations are awaited before the next record is replayed, so
    /// queued events see every plugin registered ahead of them. Queued events
    /// start on their own tasks and settle independently. Records submitted
    /// while the queue drains are replayed in the same pass.
    ///
    /// The drain runs on its own task. Dropping the returned future stops
    /// the wait, not the drain, and a later `attach` waits for the same
    /// drain to finish. Attaching to a timeline that is already ready only
    /// replaces the configuration used for later registrations.
    pub async fn attach(&self, config: Arc<Config>) {
        let (done, drained) = oneshot::channel();
        {
            let mut state = self.lock();
            state.config = Some(config);
            if state.ready {
                info!("Timeline configuration replaced");
                return;
            }
            state.drain_waiters.push(done);
            if !state.draining {
                state.draining = true;
                let timeline = self.clone();
                tokio::spawn(async move { timeline.drain().await });
            }
        }

        // A dropped sender means the drain task is gone, nothing left to wait for
        let _ = drained.await;
    }

    async fn drain(&self) {
        info!("Timeline configured, replaying deferred operations");
        let mut replayed = 0usize;

        loop {
            let next = {
                let mut state = self.lock();
                match state.queue.pop_front() {
                    Some(op) => op,
                    None => {
                        state.ready = true;
                        state.draining = false;
                        for waiter in state.drain_waiters.drain(..) {
                            let _ = waiter.send(());
                        }
                        break;
                    }
                }
            };
            replayed += 1;

            match next {
                Deferred::Register { plugin, done } => {
                    let (slot, config) = {
                        let mut state = self.lock();
                        (state.reserve(&plugin), state.config.clone().unwrap_or_default())
                    };
                    let outcome = self.complete_registration(plugin, slot, &config).await;
                    let _ = done.send(outcome);
                }
                Deferred::Deregister { name, done } => {
                    self.lock().deregister_now(&name);
                    let _ = done.send(Ok(()));
                }
                Deferred::Push { event, done } => {
                    let pipeline = {
                        let mut state = self.lock();
                        state.stats.events_pushed += 1;
                        state.pipeline()
                    };
                    spawn_pipeline(pipeline, event, done);
                }
            }
        }

        info!("Timeline ready, replayed {} deferred operations", replayed);
    }

    async fn complete_registration(
        &self,
        plugin: Plugin,
        slot: u64,
        config: &Config,
    ) -> Result<(), PluginError> {
        let name = plugin.name().to_string();
        let kind = plugin.plugin_type();

        let setup = AssertUnwindSafe(plugin.setup(config))
            .catch_unwind()
            .await
            .unwrap_or_else(|payload| Err(PluginError::from_panic(payload)));

        let mut state = self.lock();
        match setup {
            Ok(()) => {
                if state.activate(slot, &name) {
                    state.stats.plugins_registered += 1;
                    info!("Registered {} plugin {}", kind, name);
                } else {
                    debug!("Plugin {} was removed before its setup completed", name);
                }
                Ok(())
            }
            Err(e) => {
                state.remove_slot(slot);
                error!("Plugin {} setup failed: {}", name, e);
                Err(PluginError::Setup {
                    name,
                    reason: e.to_string(),
                })
            }
        }
    }
}

impl std::fmt::Debug for Timeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("Timeline")
            .field("ready", &state.ready)
            .field("queued", &state.queue.len())
            .field("before", &state.before.len())
            .field("destinations", &state.destinations.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
