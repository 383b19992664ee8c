/// Truncate a label to `max_chars` characters, appending `...` when the
/// input was longer. Counts characters, not bytes, so multibyte labels
/// do not split mid-glyph.
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    let count = label.chars().count();
    if count <= max_chars {
        return label.to_string();
    }
    let truncated: String = label.chars().take(max_chars).collect();
    format!("{truncated}...")
}
