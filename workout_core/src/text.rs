//! UTF-8 aware text splitting.
//!
//! Long text travels to the device as a sequence of bounded chunks, and short
//! display fields hold a truncated preview. Neither may cut through a
//! multi-byte code point.

/// Longest UTF-8 encoding of a single code point
pub const MAX_UTF8_LEN: usize = 4;

/// Marker appended to truncated inline previews
pub const ELLIPSIS: &str = "...";

fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

/// Encoded length announced by a leading byte
///
/// ASCII, stray continuation bytes and invalid leads count as one byte so
/// scanning always makes progress.
fn sequence_len(lead: u8) -> usize {
    if lead & 0x80 == 0 {
        1
    } else if lead & 0xE0 == 0xC0 {
        2
    } else if lead & 0xF0 == 0xE0 {
        3
    } else if lead & 0xF8 == 0xF0 {
        4
    } else {
        1
    }
}

/// Largest cut in `start..=end` that does not split a code point
///
/// Scans backward from `end` over at most [`MAX_UTF8_LEN`] bytes. Returns
/// `start` when not even the first code point fits.
pub fn boundary_at_or_before(bytes: &[u8], start: usize, end: usize) -> usize {
    let end = end.min(bytes.len());
    if end <= start || end == bytes.len() {
        return end.max(start);
    }

    let mut lead = end - 1;
    while lead > start && end - lead < MAX_UTF8_LEN && is_continuation(bytes[lead]) {
        lead -= 1;
    }

    if lead + sequence_len(bytes[lead]) <= end {
        end
    } else {
        lead
    }
}

/// Lazy sequence of bounded chunks over a byte string
///
/// Cloning snapshots the current position; calling [`chunk`] again yields the
/// same decomposition from the beginning.
#[derive(Clone, Debug)]
pub struct Chunks<'a> {
    bytes: &'a [u8],
    capacity: usize,
    pos: usize,
}

/// Split `bytes` into chunks of at most `capacity` bytes
///
/// Concatenating the chunks reproduces the input. For valid UTF-8 no chunk
/// boundary falls inside a code point. A code point wider than `capacity`
/// is emitted whole in its own chunk.
pub fn chunk(bytes: &[u8], capacity: usize) -> Chunks<'_> {
    Chunks {
        bytes,
        capacity,
        pos: 0,
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.bytes.len() {
            return None;
        }

        let start = self.pos;
        let proposed = start + self.capacity.min(self.bytes.len() - start);
        let mut end = boundary_at_or_before(self.bytes, start, proposed);
        if end == start {
            end = (start + sequence_len(self.bytes[start])).min(self.bytes.len());
        }

        self.pos = end;
        Some(&self.bytes[start..end])
    }
}

impl std::iter::FusedIterator for Chunks<'_> {}

/// Inline preview of `text` for a field of `capacity` bytes
///
/// Returns the preview and whether it differs from `text`. Text that fits is
/// returned unchanged; otherwise it is cut to `capacity - 3` bytes at a code
/// point boundary and [`ELLIPSIS`] is appended. Capacities below the marker
/// length get a plain boundary cut.
pub fn truncate_inline(text: &str, capacity: usize) -> (String, bool) {
    if text.len() <= capacity {
        return (text.to_string(), false);
    }

    if capacity < ELLIPSIS.len() {
        return (trim_to_boundary(text, capacity).to_string(), true);
    }

    let mut preview = trim_to_boundary(text, capacity - ELLIPSIS.len()).to_string();
    preview.push_str(ELLIPSIS);
    (preview, true)
}

/// Longest prefix of `text` that fits in `max_bytes` without splitting a
/// code point
pub fn trim_to_boundary(text: &str, max_bytes: usize) -> &str {
    let cut = boundary_at_or_before(text.as_bytes(), 0, max_bytes);
    text.get(..cut).unwrap_or_default()
}

/// Strip everything outside `[A-Za-z0-9 _-]`
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect()
}
