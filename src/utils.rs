//! Small shared helpers.

/// Truncate a string for logging purposes.
///
/// Model responses and stored records can be long; log lines carry at most
/// `max` bytes of them with a byte-count indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        // Back off to a char boundary so slicing cannot panic.
        let mut cut = max;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
    }
}
