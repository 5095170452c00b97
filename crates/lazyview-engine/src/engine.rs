//! Activation Engine
//!
//! The orchestrator: discovers managed elements, decides when each one
//! activates, and wires the host's signals (visibility, mutation,
//! viewport changes, ticks) into evaluation passes. All work is gated
//! until every capability probe has resolved; probing wrong would select
//! wrong candidates.

use std::collections::HashMap;
use std::time::Instant;

use lazyview_geometry::{visibility_score, Threshold};
use lazyview_select::{select_best, Candidate, ConditionalFormat, FALLBACK_WIDTH};

use crate::config::{Backend, Config};
use crate::element::{attr, Directives, ElementId, LazyRole};
use crate::host::HostPage;
use crate::inject::ScriptQueue;
use crate::probe::Probes;
use crate::scheduler::{LoadError, LoadScheduler};
use crate::state::StateTable;

/// Platform signals consumed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Resize,
    Scroll,
    OrientationChange,
    PageLoaded,
    /// Structural mutation of the page. Suppressed while the engine is
    /// performing its own injection mutations.
    Mutation,
    /// The element began intersecting the viewport.
    Intersection { element: ElementId },
    /// The element left the page; its state is dropped.
    Detached { element: ElementId },
    /// Display-refresh tick (or fallback timer). Drives debouncing and
    /// the load-timeout sweep.
    Tick { now: Instant },
}

type LoadCallback = Box<dyn FnMut(ElementId)>;

/// Visibility-driven lazy-loading engine.
///
/// Single-threaded and signal-driven: the host feeds it signals and
/// completion callbacks, the engine calls back into the host through
/// [`HostPage`]. All element state lives here, never on host elements.
pub struct Engine {
    config: Config,
    probes: Probes,
    states: StateTable,
    scheduler: LoadScheduler,
    scripts: ScriptQueue,
    callbacks: HashMap<String, LoadCallback>,
    /// Reentrancy guard: our own injection mutations must not trigger us.
    injecting: bool,
    /// A change signal arrived since the last tick.
    burst: bool,
    /// Trailing-edge debounce deadline for the next evaluation pass.
    deadline: Option<Instant>,
    /// Latest observed tick time, used for scheduler bookkeeping.
    clock: Instant,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        let scheduler = LoadScheduler::new(config.max_concurrent_loads, config.load_timeout);
        Self {
            config,
            probes: Probes::new(),
            states: StateTable::new(),
            scheduler,
            scripts: ScriptQueue::new(),
            callbacks: HashMap::new(),
            injecting: false,
            burst: false,
            deadline: None,
            clock: Instant::now(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Register a named load callback. The `data-on-lazyview-load`
    /// attribute refers to callbacks by this name; unregistered names are
    /// ignored.
    pub fn register_load_callback(
        &mut self,
        name: impl Into<String>,
        callback: impl FnMut(ElementId) + 'static,
    ) {
        self.callbacks.insert(name.into(), Box::new(callback));
    }

    /// Begin probing and wire up observation. The first evaluation pass
    /// runs once both probes have resolved.
    pub fn start(&mut self, host: &mut dyn HostPage) {
        self.probes.begin(host);
        self.attach_observers(host);
    }

    /// Host callback: a probe payload finished decoding (`None` on decode
    /// failure). When the last probe resolves, the gated first pass runs.
    pub fn probe_decoded(
        &mut self,
        host: &mut dyn HostPage,
        format: ConditionalFormat,
        dims: Option<(u32, u32)>,
    ) {
        if self.probes.resolve(format, dims) && self.probes.all_resolved() {
            tracing::info!(capabilities = ?self.probes.capabilities(), "probes resolved");
            self.run(host);
        }
    }

    /// Host callback: a fetch completed, successfully or not.
    pub fn fetch_finished(&mut self, host: &mut dyn HostPage, fetch_id: u64, success: bool) {
        let Some((element, url)) = self.scheduler.finish(fetch_id) else {
            // Unknown or already swept by the timeout; the slot is gone.
            return;
        };
        if success && self.states.is_current(element, &url) {
            self.apply(host, element, &url);
        } else {
            if !success {
                tracing::warn!(
                    error = %LoadError::Failed { url: url.clone() },
                    element = element.0,
                    "candidate load failed"
                );
            }
            // Failed, or a newer candidate was committed while this one
            // loaded: reset so a future pass may select again.
            self.states.reset(element);
        }
        self.start_admitted(host);
    }

    /// Host callback: an injected blocking script finished loading.
    pub fn script_finished(&mut self, host: &mut dyn HostPage, script_id: u64) {
        self.scripts.script_finished(host, script_id);
    }

    /// Feed a platform signal.
    pub fn handle_signal(&mut self, host: &mut dyn HostPage, signal: Signal) {
        match signal {
            Signal::Resize | Signal::Scroll | Signal::OrientationChange | Signal::PageLoaded => {
                self.burst = true;
            }
            Signal::Mutation => {
                if !self.injecting {
                    self.attach_observers(host);
                    self.burst = true;
                }
            }
            Signal::Intersection { element } => {
                self.update_now(host, element, false);
            }
            Signal::Detached { element } => {
                self.states.detach(element);
            }
            Signal::Tick { now } => {
                self.tick(host, now);
            }
        }
    }

    /// Evaluate every managed element once. Gated until probes resolve.
    pub fn run(&mut self, host: &mut dyn HostPage) {
        if !self.probes.all_resolved() {
            return;
        }
        let start = Instant::now();
        let elements = host.managed_elements();
        for element in &elements {
            self.update_element(host, *element, false);
        }
        self.start_admitted(host);
        tracing::debug!(
            elements = elements.len(),
            elapsed = ?start.elapsed(),
            "evaluation pass"
        );
    }

    /// Evaluate a single element immediately. `ignore_threshold` activates
    /// it even while invisible.
    pub fn update_now(
        &mut self,
        host: &mut dyn HostPage,
        element: ElementId,
        ignore_threshold: bool,
    ) {
        if !self.probes.all_resolved() {
            return;
        }
        self.update_element(host, element, ignore_threshold);
        self.start_admitted(host);
    }

    fn tick(&mut self, host: &mut dyn HostPage, now: Instant) {
        self.clock = now;
        if self.scheduler.sweep_timeouts(now) {
            self.start_admitted(host);
        }
        if self.burst {
            self.burst = false;
            self.deadline = Some(match self.config.backend {
                // Trailing edge: every burst pushes the deadline out.
                Backend::Intersection => now + self.config.debounce,
                Backend::Polling => now,
            });
        } else if self.config.backend == Backend::Polling && self.deadline.is_none() {
            // The polling backend re-evaluates on a cadence even without a
            // signal; geometry can change with nothing reporting it.
            self.deadline = Some(now + self.config.poll_interval);
        }
        if self.deadline.is_some_and(|deadline| now >= deadline) {
            self.deadline = None;
            self.run(host);
        }
    }

    fn update_element(&mut self, host: &mut dyn HostPage, element: ElementId, ignore_threshold: bool) {
        if self.states.is_terminal(element) {
            return;
        }
        let Some(directives) = Directives::read(&*host, element, self.config.threshold) else {
            return;
        };
        self.observe(host, element);

        if !ignore_threshold {
            let score =
                visibility_score(host.bounding_rect(element), host.viewport(), directives.threshold);
            if score == 0.0 {
                return;
            }
        }

        match directives.role {
            LazyRole::Markup => self.inject(host, element, &directives.payload),
            LazyRole::Image => {
                if host.supports_native_srcset() {
                    self.update_image(host, element, &directives);
                }
            }
            LazyRole::Background => self.update_image(host, element, &directives),
        }
    }

    fn update_image(&mut self, host: &mut dyn HostPage, element: ElementId, directives: &Directives) {
        let target_width = host.bounding_rect(element).width * host.device_pixel_ratio();
        let capabilities = self.probes.capabilities();
        let candidate = select_best(&directives.payload, target_width, &capabilities).or_else(|| {
            // Nothing usable in the descriptor: the element's own source,
            // with the maximum sentinel width so it never upgrades again.
            match directives.role {
                LazyRole::Image => directives
                    .fallback
                    .clone()
                    .map(|url| Candidate::new(url, FALLBACK_WIDTH)),
                _ => None,
            }
        });
        let Some(candidate) = candidate else {
            return;
        };
        if self.states.try_commit(element, &candidate) {
            tracing::debug!(
                element = element.0,
                url = %candidate.url,
                width = candidate.width,
                "candidate committed"
            );
            self.scheduler.enqueue(element, candidate.url);
        }
    }

    /// The committed candidate loaded and is still current: write it to
    /// the element and fire the one-time effects.
    fn apply(&mut self, host: &mut dyn HostPage, element: ElementId, url: &str) {
        match LazyRole::from_attr(host.attribute(element, attr::TYPE).as_deref()) {
            LazyRole::Image => {
                if host.attribute(element, attr::SRC).as_deref() == Some(url) {
                    // Same as the intrinsic source: clearing the override
                    // avoids a redundant fetch.
                    host.remove_attribute(element, attr::SRCSET);
                } else {
                    host.set_attribute(element, attr::SRCSET, url);
                }
            }
            LazyRole::Background => host.set_background_image(element, url),
            // Markup elements never go through the fetch path.
            LazyRole::Markup => return,
        }

        if self.states.fire_effects_once(element) {
            if let Some(name) = host.attribute(element, attr::ON_LOAD) {
                match self.callbacks.get_mut(&name) {
                    Some(callback) => callback(element),
                    None => tracing::debug!(callback = %name, "no registered load callback"),
                }
            }
            host.dispatch_lazy_load(element);
        }
    }

    fn inject(&mut self, host: &mut dyn HostPage, element: ElementId, markup: &str) {
        if !self.states.mark_terminal(element) {
            return;
        }
        // Hold the guard across the synchronous injection so the mutation
        // we cause does not re-trigger us.
        self.injecting = true;
        let scripts = host.inject_markup(element, markup);
        self.scripts.begin(host, element, scripts);
        self.injecting = false;
        tracing::debug!(element = element.0, "markup injected");
    }

    /// Run a scheduling pass and start the admitted fetches.
    fn start_admitted(&mut self, host: &mut dyn HostPage) {
        let default_threshold = self.config.threshold;
        let admitted = {
            let page: &dyn HostPage = &*host;
            let viewport = page.viewport();
            self.scheduler.process(self.clock, |element| {
                let threshold = page
                    .attribute(element, attr::THRESHOLD)
                    .map(|value| Threshold::parse(&value))
                    .unwrap_or(default_threshold);
                visibility_score(page.bounding_rect(element), viewport, threshold)
            })
        };
        for admission in admitted {
            tracing::debug!(
                element = admission.element.0,
                url = %admission.url,
                "fetch admitted"
            );
            host.start_fetch(admission.id, &admission.url);
        }
    }

    /// Wire up observation for any not-yet-observed managed element.
    fn attach_observers(&mut self, host: &mut dyn HostPage) {
        for element in host.managed_elements() {
            self.observe(host, element);
        }
    }

    fn observe(&mut self, host: &mut dyn HostPage, element: ElementId) {
        if self.states.observers_attached(element) {
            return;
        }
        self.states.mark_observed(element);
        if self.config.backend == Backend::Intersection {
            host.observe_intersection(element, self.config.root.as_deref());
        }
        host.observe_scroll_ancestors(element);
    }
}
