//! Escaping helpers for document synthesis

/// Escape text for HTML content and double- or single-quoted attributes
pub(crate) fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// JSON literal safe to place inside a `<script>` element
///
/// `<` is emitted as `\u003c`, so no `</script` or `<!--` sequence can end
/// the element early.
pub(crate) fn script_json<T: serde::Serialize + ?Sized>(
    value: &T,
) -> Result<String, serde_json::Error> {
    Ok(serde_json::to_string(value)?.replace('<', "\\u003c"))
}
