//! Managed Elements
//!
//! The engine never owns host elements; it reads a handful of attributes
//! and keys per-element state off an opaque identity handle.

use lazyview_geometry::Threshold;

use crate::host::HostPage;

/// Opaque handle to a host element. Identity, not value: two handles refer
/// to the same element iff they are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// Attribute names read and written by the engine.
pub mod attr {
    /// Candidate descriptor, or the markup payload for the `html` role.
    pub const DIRECTIVE: &str = "data-lazyview";
    /// Role discriminator: `image` (default), `background` or `html`.
    pub const TYPE: &str = "data-lazyview-type";
    /// Proximity threshold: `<int>px` or `<int>%`.
    pub const THRESHOLD: &str = "data-lazyview-threshold";
    /// Name of a registered load callback.
    pub const ON_LOAD: &str = "data-on-lazyview-load";
    /// The element's intrinsic fallback source.
    pub const SRC: &str = "src";
    /// Override source written by the engine.
    pub const SRCSET: &str = "srcset";
}

/// Semantic role of a managed element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LazyRole {
    /// Responsive image: the override source attribute is set on commit.
    #[default]
    Image,
    /// Background image: applied through the host's style hook.
    Background,
    /// One-shot markup injection (may contain scripts).
    Markup,
}

impl LazyRole {
    pub fn from_attr(value: Option<&str>) -> LazyRole {
        match value {
            Some("background") => LazyRole::Background,
            Some("html") => LazyRole::Markup,
            _ => LazyRole::Image,
        }
    }
}

/// Parsed lazy-loading directives of a single element.
#[derive(Debug, Clone)]
pub struct Directives {
    pub role: LazyRole,
    /// Descriptor string, or raw markup for [`LazyRole::Markup`].
    pub payload: String,
    pub threshold: Threshold,
    /// Intrinsic source to fall back to when no candidate qualifies.
    pub fallback: Option<String>,
}

impl Directives {
    /// Read an element's directives. `None` means the element carries no
    /// directive attribute and is not managed.
    pub fn read(
        host: &dyn HostPage,
        element: ElementId,
        default_threshold: Threshold,
    ) -> Option<Directives> {
        let payload = host.attribute(element, attr::DIRECTIVE)?;
        let role = LazyRole::from_attr(host.attribute(element, attr::TYPE).as_deref());
        let threshold = host
            .attribute(element, attr::THRESHOLD)
            .map(|value| Threshold::parse(&value))
            .unwrap_or(default_threshold);
        Some(Directives {
            role,
            payload,
            threshold,
            fallback: host.attribute(element, attr::SRC),
        })
    }
}
