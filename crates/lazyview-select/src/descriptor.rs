//! Descriptor Grammar
//!
//! `entry (',' entry)*` where `entry := url (' ' modifier)*` and
//! `modifier := digits 'w' | format-keyword`. Malformed entries are
//! skipped individually; parsing never fails as a whole.

use crate::{compare_entries, Candidate, CapabilitySet, ConditionalFormat, IMPLICIT_WIDTH};

/// Error for a single unparseable descriptor entry.
///
/// Consumed inside [`parse_descriptor`]: the offending entry is skipped and
/// logged, the rest of the descriptor still parses.
#[derive(Debug, thiserror::Error)]
pub enum DescriptorError {
    #[error("invalid width token `{0}`")]
    InvalidWidth(String),
}

#[derive(Debug)]
pub(crate) struct ParsedEntry {
    pub url: String,
    pub width: u32,
    /// Carries a conditional format (keyword or extension); wins ties.
    pub preferred: bool,
    pub index: usize,
}

/// Parse one comma-separated entry. `Ok(None)` means the entry is empty or
/// gated out by a missing capability.
fn parse_entry(
    entry: &str,
    index: usize,
    capabilities: &CapabilitySet,
) -> Result<Option<ParsedEntry>, DescriptorError> {
    let mut tokens = entry.split_whitespace();
    let Some(url) = tokens.next() else {
        return Ok(None);
    };

    let mut width = IMPLICIT_WIDTH;
    let mut format = ConditionalFormat::from_url(url);
    for token in tokens {
        if let Some(keyword) = ConditionalFormat::from_keyword(token) {
            format = Some(keyword);
        } else if let Some(digits) = token.strip_suffix('w') {
            width = digits
                .parse::<u32>()
                .map_err(|_| DescriptorError::InvalidWidth(token.to_string()))?;
        }
        // Unrecognized modifiers are ignored, matching srcset leniency.
    }

    if let Some(format) = format {
        if !capabilities.support(format).is_yes() {
            return Ok(None);
        }
    }

    Ok(Some(ParsedEntry {
        url: maybe_percent_decode(url),
        width,
        preferred: format.is_some(),
        index,
    }))
}

/// Parse a full descriptor into candidates, sorted ascending by width with
/// duplicate widths collapsed (first entry after the format tie-break wins).
pub fn parse_descriptor(descriptor: &str, capabilities: &CapabilitySet) -> Vec<Candidate> {
    let mut entries: Vec<ParsedEntry> = Vec::new();
    for (index, raw) in descriptor.split(',').enumerate() {
        match parse_entry(raw, index, capabilities) {
            Ok(Some(entry)) => entries.push(entry),
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(entry = raw.trim(), %err, "skipping descriptor entry");
            }
        }
    }

    entries.sort_by(compare_entries);
    entries.dedup_by(|b, a| a.width == b.width);
    entries
        .into_iter()
        .map(|e| Candidate { url: e.url, width: e.width })
        .collect()
}

/// Percent-decode a URL that appears to be a fully encoded path: it contains
/// an encoded `/` or `?` but no literal one. Escapes decode as UTF-8 bytes,
/// so multibyte sequences reassemble into their original characters.
pub fn percent_decode(url: &str) -> String {
    let mut bytes = Vec::with_capacity(url.len());
    let mut chars = url.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            let mut buf = [0u8; 4];
            bytes.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let rest = chars.as_str();
        match rest.get(..2).and_then(|hex| u8::from_str_radix(hex, 16).ok()) {
            Some(byte) => {
                bytes.push(byte);
                chars.next();
                chars.next();
            }
            // Invalid escape, keep as-is
            None => bytes.push(b'%'),
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

fn maybe_percent_decode(url: &str) -> String {
    let encoded_separator = url.contains("%2F") || url.contains("%3F");
    if encoded_separator && !url.contains('/') && !url.contains('?') {
        percent_decode(url)
    } else {
        url.to_string()
    }
}
