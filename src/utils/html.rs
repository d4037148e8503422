use std::collections::HashSet;

/// Strips all markup from a display string (username, topic) using ammonia.
///
/// No tags are allowed; `<script>` and `<style>` are removed together with their
/// content. The surviving text is returned unescaped: it travels as JSON and is
/// rendered as text, so `Tom & Jerry` must stay `Tom & Jerry`.
pub fn sanitize_display(input: &str) -> String {
    let cleaned = ammonia::Builder::default()
        .tags(HashSet::new())
        .clean(input.trim())
        .to_string();
    unescape_text(&cleaned).trim().to_string()
}

/// Reverses the entity escaping ammonia applies to text nodes.
/// `&amp;` goes last so an escaped entity like `&amp;lt;` decodes to `&lt;`.
fn unescape_text(escaped: &str) -> String {
    escaped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}
