// src/sanitize.rs
//
// Escaping for request bodies and cleaning for terminal/CSV output.

use html_escape::{encode_double_quoted_attribute, encode_text};

/// Escapes a value for a double-quoted XML attribute.
///
/// Line breaks are written as character references so the provider's
/// attribute normalization keeps them.
///
/// # Examples
///
/// ```
/// use gam::sanitize::xml_attribute;
///
/// assert_eq!(xml_attribute("Tom & \"Jerry\""), "Tom &amp; &quot;Jerry&quot;");
/// assert_eq!(xml_attribute("line1\nline2"), "line1&#xA;line2");
/// ```
pub fn xml_attribute(value: &str) -> String {
    encode_double_quoted_attribute(value)
        .replace('\r', "&#xD;")
        .replace('\n', "&#xA;")
        .replace('\t', "&#x9;")
}

/// Escapes element text content.
pub fn xml_text(value: &str) -> String {
    encode_text(value).into_owned()
}

/// Turns the two-character sequence `\n` typed on the command line into a
/// real line break, for signatures and vacation messages.
pub fn expand_newlines(value: &str) -> String {
    value.replace("\\n", "\n")
}

/// Strips control characters from a value printed to the terminal or a CSV
/// cell.
pub fn clean_cell(value: &str) -> String {
    value
        .chars()
        .map(|c| if c == '\n' || c == '\r' || c == '\t' { ' ' } else { c })
        .filter(|c| !c.is_control())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_markup_is_escaped_and_newlines_kept() {
        let sig = expand_newlines("<b>Jane</b>\\nSales & Support");
        assert_eq!(
            xml_attribute(&sig),
            "&lt;b&gt;Jane&lt;/b&gt;&#xA;Sales &amp; Support"
        );
    }

    #[test]
    fn text_escape_leaves_quotes() {
        assert_eq!(xml_text("a < \"b\""), "a &lt; \"b\"");
    }

    #[test]
    fn clean_cell_drops_control_characters() {
        assert_eq!(clean_cell("a\u{7}b\nc"), "ab c");
    }
}
