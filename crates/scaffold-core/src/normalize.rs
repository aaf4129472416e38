/// Ordered substitution table. `&amp;` must stay last so that a
/// double-encoded `&amp;lt;` decodes to `&lt;` and not to `<`.
const SUBSTITUTIONS: [(&str, &str); 8] = [
    ("\\n", "\n"),
    ("\\t", "\t"),
    ("\\r", "\r"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&amp;", "&"),
];

/// Decodes escaped whitespace and the fixed set of markup entities in an
/// action body. Each rule is applied once, in table order. Does not trim.
pub fn normalize(body: &str) -> String {
    if body.is_empty() {
        return String::new();
    }
    SUBSTITUTIONS
        .iter()
        .fold(body.to_string(), |text, (from, to)| {
            if text.contains(from) {
                text.replace(from, to)
            } else {
                text
            }
        })
}
