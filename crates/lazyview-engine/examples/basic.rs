//! Example: Basic usage of the lazyview engine with an in-memory host page.

use std::collections::HashMap;
use std::time::Instant;

use lazyview_engine::geometry::{Rect, ViewportSize};
use lazyview_engine::select::ConditionalFormat;
use lazyview_engine::{attr, Config, ElementId, Engine, HostPage, ScriptRef, Signal};

/// A single-element host page standing in for a real platform binding.
struct DemoHost {
    attrs: HashMap<String, String>,
    rect: Rect,
    pending_fetch: Option<(u64, String)>,
}

impl HostPage for DemoHost {
    fn managed_elements(&self) -> Vec<ElementId> {
        vec![ElementId(1)]
    }
    fn attribute(&self, _element: ElementId, name: &str) -> Option<String> {
        self.attrs.get(name).cloned()
    }
    fn set_attribute(&mut self, _element: ElementId, name: &str, value: &str) {
        println!("set {name}=\"{value}\"");
        self.attrs.insert(name.to_string(), value.to_string());
    }
    fn remove_attribute(&mut self, _element: ElementId, name: &str) {
        self.attrs.remove(name);
    }
    fn bounding_rect(&self, _element: ElementId) -> Rect {
        self.rect
    }
    fn viewport(&self) -> ViewportSize {
        ViewportSize::new(1280.0, 720.0)
    }
    fn start_fetch(&mut self, fetch_id: u64, url: &str) {
        println!("fetching {url}");
        self.pending_fetch = Some((fetch_id, url.to_string()));
    }
    fn set_background_image(&mut self, _element: ElementId, _url: &str) {}
    fn inject_markup(&mut self, _element: ElementId, _markup: &str) -> Vec<ScriptRef> {
        Vec::new()
    }
    fn run_script(&mut self, _element: ElementId, _script: ScriptRef) {}
    fn decode_probe(&mut self, _format: ConditionalFormat, _base64_payload: &str) {
        // A real binding would hand the payload to the platform decoder.
    }
    fn dispatch_lazy_load(&mut self, element: ElementId) {
        println!("lazyview-load dispatched on element {}", element.0);
    }
    fn observe_intersection(&mut self, _element: ElementId, _root: Option<&str>) {}
    fn observe_scroll_ancestors(&mut self, _element: ElementId) {}
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let mut host = DemoHost {
        attrs: HashMap::from([
            (attr::DIRECTIVE.to_string(), "cat-400.jpg 400w, cat-800.jpg 800w".to_string()),
            (attr::SRC.to_string(), "cat-tiny.jpg".to_string()),
        ]),
        rect: Rect::new(0.0, 100.0, 600.0, 400.0),
        pending_fetch: None,
    };

    let mut engine = Engine::new(Config::default());
    println!("lazyview engine v{} initialized", lazyview_engine::VERSION);

    engine.start(&mut host);
    // The demo host has no decoder; report both formats unsupported.
    engine.probe_decoded(&mut host, ConditionalFormat::Webp, None);
    engine.probe_decoded(&mut host, ConditionalFormat::Avif, None);

    // Simulate the network completing the admitted fetch.
    if let Some((fetch_id, _url)) = host.pending_fetch.take() {
        engine.fetch_finished(&mut host, fetch_id, true);
    }

    engine.handle_signal(&mut host, Signal::Tick { now: Instant::now() });
    println!("applied srcset: {:?}", host.attrs.get(attr::SRCSET));
}
