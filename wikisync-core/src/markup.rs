//! Wiki markup escaping.

/// Escape text for interpolation into template or table markup.
///
/// A literal `|` or `=` would otherwise be read as a table cell or template
/// parameter separator.
pub fn escape(text: &str) -> String {
    text.replace('|', "{{!}}").replace('=', "{{=}}")
}
