//! lazyview Candidate Selection
//!
//! Parses the candidate descriptor attribute (`url [Nw] [format]` entries,
//! comma separated) and picks the smallest candidate wide enough for the
//! element's rendered size at the current pixel density.

use std::cmp::Ordering;

mod descriptor;

pub use descriptor::{parse_descriptor, percent_decode, DescriptorError};

/// Width assigned to the element's own fallback source.
pub const FALLBACK_WIDTH: u32 = 999_999;

/// Width assigned to descriptor entries that carry no `Nw` modifier.
///
/// One below [`FALLBACK_WIDTH`]: such entries sort last among explicit
/// candidates but still beat the intrinsic fallback.
pub const IMPLICIT_WIDTH: u32 = 999_998;

/// Image formats that are only usable when the runtime decodes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionalFormat {
    Webp,
    Avif,
}

impl ConditionalFormat {
    /// All conditional formats, in probe order.
    pub const ALL: [ConditionalFormat; 2] = [ConditionalFormat::Webp, ConditionalFormat::Avif];

    /// The bare descriptor keyword for this format.
    pub fn keyword(&self) -> &'static str {
        match self {
            ConditionalFormat::Webp => "webp",
            ConditionalFormat::Avif => "avif",
        }
    }

    /// Match a descriptor modifier token.
    pub fn from_keyword(token: &str) -> Option<ConditionalFormat> {
        match token {
            "webp" => Some(ConditionalFormat::Webp),
            "avif" => Some(ConditionalFormat::Avif),
            _ => None,
        }
    }

    /// Detect a conditional format from a candidate URL's extension.
    pub fn from_url(url: &str) -> Option<ConditionalFormat> {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        if path.ends_with(".webp") {
            Some(ConditionalFormat::Webp)
        } else if path.ends_with(".avif") {
            Some(ConditionalFormat::Avif)
        } else {
            None
        }
    }
}

/// Tri-state capability flag.
///
/// `Unknown` is distinct from both answers: selection must not run until
/// every probe has resolved, and an unknown format is never used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Support {
    #[default]
    Unknown,
    Yes,
    No,
}

impl Support {
    #[inline]
    pub fn is_yes(&self) -> bool {
        matches!(self, Support::Yes)
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Support::Unknown)
    }
}

/// Resolved (or resolving) capability flags, one per conditional format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    pub webp: Support,
    pub avif: Support,
}

impl CapabilitySet {
    /// A fully resolved set, mostly useful in tests and simple hosts.
    pub fn resolved(webp: bool, avif: bool) -> Self {
        let flag = |b| if b { Support::Yes } else { Support::No };
        Self { webp: flag(webp), avif: flag(avif) }
    }

    pub fn support(&self, format: ConditionalFormat) -> Support {
        match format {
            ConditionalFormat::Webp => self.webp,
            ConditionalFormat::Avif => self.avif,
        }
    }

    pub fn set(&mut self, format: ConditionalFormat, supported: bool) {
        let flag = if supported { Support::Yes } else { Support::No };
        match format {
            ConditionalFormat::Webp => self.webp = flag,
            ConditionalFormat::Avif => self.avif = flag,
        }
    }

    /// True once every format probe has answered.
    pub fn all_resolved(&self) -> bool {
        self.webp.is_resolved() && self.avif.is_resolved()
    }
}

/// One parsed candidate: a URL and its intrinsic pixel width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    pub width: u32,
}

impl Candidate {
    pub fn new(url: impl Into<String>, width: u32) -> Self {
        Self { url: url.into(), width }
    }
}

/// Select the best candidate for `target_width` CSS-pixels × density.
///
/// Scans the parsed candidates ascending by width and returns the first one
/// at least as wide as the target, falling back to the widest available
/// (which may exist only to carry a preferred format). Returns `None` when
/// no entry survives parsing and capability gating; the caller then falls
/// back to the element's own source.
///
/// Pure: same inputs, same answer, no side effects.
pub fn select_best(
    descriptor: &str,
    target_width: f32,
    capabilities: &CapabilitySet,
) -> Option<Candidate> {
    let candidates = parse_descriptor(descriptor, capabilities);
    let last = candidates.last()?;
    let max_width = last.width;
    candidates
        .iter()
        .find(|c| c.width as f32 >= target_width || c.width == max_width)
        .cloned()
}

pub(crate) fn compare_entries(
    a: &descriptor::ParsedEntry,
    b: &descriptor::ParsedEntry,
) -> Ordering {
    // Ascending width; at equal width a format-preferred entry wins the
    // upcoming keep-first dedupe.
    a.width
        .cmp(&b.width)
        .then_with(|| b.preferred.cmp(&a.preferred))
        .then_with(|| a.index.cmp(&b.index))
}
