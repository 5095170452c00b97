//! Capability Probes
//!
//! Format support is detected by asking the host to decode a canned
//! minimal image per format and comparing the decoded dimensions against
//! the payload's known dimensions. Each probe runs exactly once per engine
//! lifetime; decode failure means "unsupported", never an error.

use lazyview_select::{CapabilitySet, ConditionalFormat};

use crate::host::HostPage;

/// A canned probe image with its known decoded dimensions.
#[derive(Debug, Clone, Copy)]
pub struct ProbePayload {
    pub format: ConditionalFormat,
    pub base64: &'static str,
    pub width: u32,
    pub height: u32,
}

/// 1x1 lossy WebP.
pub const WEBP_PROBE: ProbePayload = ProbePayload {
    format: ConditionalFormat::Webp,
    base64: "UklGRiQAAABXRUJQVlA4IBgAAAAwAQCdASoBAAEAD8D+JaQAA3AA/ua1AAA=",
    width: 1,
    height: 1,
};

/// 1x1 AVIF.
pub const AVIF_PROBE: ProbePayload = ProbePayload {
    format: ConditionalFormat::Avif,
    base64: "AAAAIGZ0eXBhdmlmAAAAAGF2aWZtaWYxbWlhZk1BMUEAAADybWV0YQAAAAAAAAAo\
             aGRscgAAAAAAAAAAcGljdAAAAAAAAAAAAAAAAGxpYmF2aWYAAAAADnBpdG0AAAAA\
             AAEAAAAeaWxvYwAAAABEAAABAAEAAAABAAABGgAAACAAAAAoaWluZgAAAAAAAQAA\
             ABppbmZlAgAAAAABAABhdjAxQ29sb3IAAAAAamlwcnAAAABLaXBjbwAAABRpc3Bl\
             AAAAAAAAAAEAAAABAAAAEHBpeGkAAAAAAwgICAAAAAxhdjFDgSAAAAAAABNjb2xy\
             bmNseAABAA0AAIAAAAAXaXBtYQAAAAAAAAABAAEEAQKDBAAAAChtZGF0EgAKBzgA\
             BpAQ0AIyExAAAAAP+j9adAx6kYPdyoRe9BA=",
    width: 1,
    height: 1,
};

/// Look up the probe payload for a format.
pub fn probe_payload(format: ConditionalFormat) -> &'static ProbePayload {
    match format {
        ConditionalFormat::Webp => &WEBP_PROBE,
        ConditionalFormat::Avif => &AVIF_PROBE,
    }
}

/// One-shot capability probing state.
///
/// Every evaluation pass is gated on [`Probes::all_resolved`]: selecting
/// candidates with unresolved flags would pick the wrong format.
#[derive(Debug, Default)]
pub struct Probes {
    capabilities: CapabilitySet,
    started: bool,
}

impl Probes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kick off the decode of every probe payload. Idempotent.
    pub fn begin(&mut self, host: &mut dyn HostPage) {
        if self.started {
            return;
        }
        self.started = true;
        for format in ConditionalFormat::ALL {
            host.decode_probe(format, probe_payload(format).base64);
        }
    }

    /// Record a probe decode result. Returns `true` when the flag was
    /// newly resolved; late or duplicate resolutions are ignored so the
    /// answer is cached for the rest of the session.
    pub fn resolve(&mut self, format: ConditionalFormat, dims: Option<(u32, u32)>) -> bool {
        if self.capabilities.support(format).is_resolved() {
            return false;
        }
        let expected = probe_payload(format);
        let supported = dims == Some((expected.width, expected.height));
        self.capabilities.set(format, supported);
        tracing::debug!(format = format.keyword(), supported, "capability probe resolved");
        true
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    pub fn all_resolved(&self) -> bool {
        self.capabilities.all_resolved()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazyview_select::Support;

    #[test]
    fn test_matching_dims_mean_supported() {
        let mut probes = Probes::new();
        assert!(probes.resolve(ConditionalFormat::Webp, Some((1, 1))));
        assert_eq!(probes.capabilities().webp, Support::Yes);
    }

    #[test]
    fn test_dimension_mismatch_means_unsupported() {
        let mut probes = Probes::new();
        probes.resolve(ConditionalFormat::Webp, Some((2, 2)));
        assert_eq!(probes.capabilities().webp, Support::No);
    }

    #[test]
    fn test_decode_failure_means_unsupported() {
        let mut probes = Probes::new();
        probes.resolve(ConditionalFormat::Avif, None);
        assert_eq!(probes.capabilities().avif, Support::No);
    }

    #[test]
    fn test_resolves_exactly_once() {
        let mut probes = Probes::new();
        assert!(probes.resolve(ConditionalFormat::Webp, Some((1, 1))));
        // A second, contradictory answer is ignored.
        assert!(!probes.resolve(ConditionalFormat::Webp, None));
        assert_eq!(probes.capabilities().webp, Support::Yes);
    }

    #[test]
    fn test_gate_opens_after_both_probes() {
        let mut probes = Probes::new();
        assert!(!probes.all_resolved());
        probes.resolve(ConditionalFormat::Webp, Some((1, 1)));
        assert!(!probes.all_resolved());
        probes.resolve(ConditionalFormat::Avif, None);
        assert!(probes.all_resolved());
    }
}
