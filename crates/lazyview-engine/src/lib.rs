//! lazyview Engine
//!
//! A visibility-driven lazy-loading engine: defers image loading until
//! elements near the viewport, picks the smallest sufficient responsive
//! candidate for the device's pixel density, and performs one-shot
//! deferred markup injection with ordered script execution.
//!
//! The host platform sits behind [`HostPage`]; the engine is
//! single-threaded and driven entirely by signals and completion
//! callbacks.
//!
//! # Example
//! ```rust,ignore
//! use lazyview_engine::{Config, Engine, Signal};
//!
//! let mut engine = Engine::new(Config::default());
//! engine.start(&mut host);
//! // ... host reports probe decodes, then feeds signals:
//! engine.handle_signal(&mut host, Signal::Scroll);
//! engine.handle_signal(&mut host, Signal::Tick { now: Instant::now() });
//! ```

mod config;
mod element;
mod engine;
mod host;
mod inject;
mod probe;
mod scheduler;
mod state;

pub use config::{Backend, Config};
pub use element::{attr, Directives, ElementId, LazyRole};
pub use engine::{Engine, Signal};
pub use host::{HostPage, ScriptRef};
pub use inject::ScriptQueue;
pub use probe::{probe_payload, ProbePayload, Probes, AVIF_PROBE, WEBP_PROBE};
pub use scheduler::{Admission, LoadError, LoadScheduler, LoadStatus};
pub use state::{ElementState, StateTable};

// Re-export sub-crates for advanced usage
pub use lazyview_geometry as geometry;
pub use lazyview_select as select;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
