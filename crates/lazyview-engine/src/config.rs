//! Engine Configuration

use std::time::Duration;

use lazyview_geometry::Threshold;

/// How re-evaluation is triggered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// Native intersection notifications, with debounced burst signals.
    #[default]
    Intersection,
    /// Periodic ticks only, for platforms without intersection
    /// notifications. Burst signals take effect on the next tick.
    Polling,
}

/// Engine configuration options
#[derive(Debug, Clone)]
pub struct Config {
    /// Observation backend.
    pub backend: Backend,

    /// Observation root override passed to the host's intersection
    /// observer (`None` means the viewport).
    pub root: Option<String>,

    /// Default proximity threshold for elements without their own
    /// threshold attribute.
    pub threshold: Threshold,

    /// Cadence of unsignalled evaluation passes under the polling backend.
    /// Ticks themselves are host-driven; passes run once the cadence has
    /// elapsed since the previous one.
    pub poll_interval: Duration,

    /// Trailing-edge delay coalescing scroll/resize bursts.
    pub debounce: Duration,

    /// Maximum simultaneously in-flight candidate fetches.
    pub max_concurrent_loads: usize,

    /// After this long, a hung fetch is treated as complete and its slot
    /// released.
    pub load_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Intersection,
            root: None,
            threshold: Threshold::None,
            poll_interval: Duration::from_millis(20),
            debounce: Duration::from_millis(50),
            max_concurrent_loads: 3,
            load_timeout: Duration::from_secs(60),
        }
    }
}
