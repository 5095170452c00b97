//! Host Page Interface
//!
//! Everything platform-specific lives behind this trait: attribute access,
//! layout geometry, network fetches, markup materialization, script
//! execution, probe decodes and observation wiring. The engine calls in;
//! asynchronous completions come back through the matching `Engine`
//! methods (`fetch_finished`, `script_finished`, `probe_decoded`).

use lazyview_geometry::{Rect, ViewportSize};
use lazyview_select::ConditionalFormat;

use crate::element::ElementId;

/// Handle to a script element produced by a markup injection, in document
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptRef {
    pub id: u64,
    /// Loads from an external source.
    pub external: bool,
    /// Not marked asynchronous: later sibling scripts must wait for it.
    pub blocking: bool,
}

/// The embedding page, as seen by the engine.
pub trait HostPage {
    /// Enumerate elements carrying the lazy directive attribute.
    fn managed_elements(&self) -> Vec<ElementId>;

    fn attribute(&self, element: ElementId, name: &str) -> Option<String>;
    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str);
    fn remove_attribute(&mut self, element: ElementId, name: &str);

    /// Viewport-relative bounding box, post-layout. All zeros when the
    /// element has not been laid out yet.
    fn bounding_rect(&self, element: ElementId) -> Rect;
    fn viewport(&self) -> ViewportSize;
    fn device_pixel_ratio(&self) -> f32 {
        1.0
    }

    /// Whether the platform honors the native responsive override
    /// attribute. Image-role elements are skipped entirely when it does
    /// not (the intrinsic source stays in place).
    fn supports_native_srcset(&self) -> bool {
        true
    }

    /// Start fetching `url`. The host must report completion through
    /// `Engine::fetch_finished` with the same id, once, on success or
    /// failure. Fetches are never cancelled, only timed out.
    fn start_fetch(&mut self, fetch_id: u64, url: &str);

    fn set_background_image(&mut self, element: ElementId, url: &str);

    /// Replace the element's children with `markup` and return any script
    /// elements it contained, in document order. The scripts must not be
    /// executed yet; the engine sequences them through [`Self::run_script`].
    fn inject_markup(&mut self, element: ElementId, markup: &str) -> Vec<ScriptRef>;

    /// Begin executing an injected script. Blocking external scripts must
    /// report load completion through `Engine::script_finished`.
    fn run_script(&mut self, element: ElementId, script: ScriptRef);

    /// Decode a base64 probe image; report the decoded dimensions (or
    /// `None` on failure) through `Engine::probe_decoded`.
    fn decode_probe(&mut self, format: ConditionalFormat, base64_payload: &str);

    /// Dispatch the `lazyview-load` notification on the element.
    fn dispatch_lazy_load(&mut self, element: ElementId);

    /// Start intersection observation for the element. `root` overrides
    /// the observation root when set.
    fn observe_intersection(&mut self, element: ElementId, root: Option<&str>);

    /// Listen for scroll on the element's scrollable ancestor chain, not
    /// just the window.
    fn observe_scroll_ancestors(&mut self, element: ElementId);
}
