//! Minimal meta-tag extraction
//!
//! The meta-tag challenge only needs the `content` attribute of one named
//! `<meta>` tag from a homepage, so a small scanner is enough; pulling in a
//! full HTML parser would be the only use for it.

/// Find the `content` attribute of `<meta name="..." content="...">`.
///
/// Attribute order is irrelevant and matching is case-insensitive on the
/// tag and attribute names. Returns the first matching tag's content.
pub fn find_meta_content(html: &str, name: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let mut search_from = 0;

    while let Some(rel) = lower[search_from..].find("<meta") {
        let tag_start = search_from + rel;
        let tag_end = match lower[tag_start..].find('>') {
            Some(rel_end) => tag_start + rel_end,
            None => return None,
        };

        // Attribute values must come from the original, un-lowercased text.
        let tag = &html[tag_start..tag_end];
        if attribute_value(tag, "name").is_some_and(|v| v.eq_ignore_ascii_case(name)) {
            if let Some(content) = attribute_value(tag, "content") {
                return Some(content);
            }
        }

        search_from = tag_end + 1;
    }

    None
}

/// Extract a quoted attribute value from a single tag's text
fn attribute_value(tag: &str, attr: &str) -> Option<String> {
    let lower = tag.to_ascii_lowercase();
    let mut search_from = 0;

    while let Some(rel) = lower[search_from..].find(attr) {
        let attr_start = search_from + rel;
        let after = attr_start + attr.len();

        // Require a word boundary before and an '=' (with optional spaces) after.
        let boundary_ok = attr_start == 0 || {
            let prev = lower.as_bytes()[attr_start - 1];
            !prev.is_ascii_alphanumeric() && prev != b'-'
        };
        let rest = tag[after..].trim_start();
        if boundary_ok && rest.starts_with('=') {
            let value_part = rest[1..].trim_start();
            let quote = value_part.chars().next()?;
            if quote == '"' || quote == '\'' {
                let inner = &value_part[1..];
                if let Some(end) = inner.find(quote) {
                    return Some(inner[..end].to_string());
                }
            }
            return None;
        }

        search_from = after;
    }

    None
}
