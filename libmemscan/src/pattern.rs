//! Byte-pattern search: given a needle and a haystack, the aligned offsets
//! where the needle occurs. Platform-independent, exercised directly by
//! benchmarks as well as by [`crate::scanner::Scan`].

/// Every offset `o` in `0..=haystack.len() - needle.len()` with
/// `haystack[o..o + needle.len()] == needle` and `o % alignment == 0`,
/// ascending. Naive forward scan with early skipping by alignment; no
/// preprocessing tables, overlapping matches permitted.
pub fn search_offsets(haystack: &[u8], needle: &[u8], alignment: usize) -> Vec<u32> {
    let mut offsets = Vec::new();
    if needle.is_empty() || needle.len() > haystack.len() || alignment == 0 {
        return offsets;
    }
    let last = haystack.len() - needle.len();
    let mut offset = 0usize;
    while offset <= last {
        if &haystack[offset..offset + needle.len()] == needle {
            offsets.push(offset as u32);
        }
        offset += alignment;
    }
    offsets
}
