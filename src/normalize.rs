/// Fixes the link artifacts the catalog emits: literal spaces become `%20`
/// and the double-encoded parentheses `%28`/`%29` are restored.
pub fn normalize_link(link: &str) -> String {
    link.replace(' ', "%20")
        .replace("%28", "(")
        .replace("%29", ")")
}

/// Strips one leading rank marker (`#12 ` or `12)`) and trims the rest.
pub fn normalize_name(name: &str) -> String {
    let trimmed = name.trim();
    let rest = strip_hash_rank(trimmed)
        .or_else(|| strip_paren_rank(trimmed))
        .unwrap_or(trimmed);
    rest.trim().to_owned()
}

fn strip_hash_rank(input: &str) -> Option<&str> {
    let digits = input.strip_prefix('#')?;
    let len = leading_digits(digits);
    if len == 0 {
        return None;
    }
    let after = &digits[len..];
    let ws = after.chars().next().filter(|ch| ch.is_whitespace())?;
    Some(&after[ws.len_utf8()..])
}

fn strip_paren_rank(input: &str) -> Option<&str> {
    let len = leading_digits(input);
    if len == 0 {
        return None;
    }
    input[len..].strip_prefix(')')
}

fn leading_digits(input: &str) -> usize {
    input.bytes().take_while(|b| b.is_ascii_digit()).count()
}

/// Resolves a cover image reference against the site origin and applies the
/// link fixups.
pub fn resolve_image_url(raw: &str, origin: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let origin = origin.trim_end_matches('/');
    let absolute = if let Some(rest) = raw.strip_prefix("//") {
        let scheme = origin.split("://").next().unwrap_or("https");
        format!("{scheme}://{rest}")
    } else if raw.starts_with('/') {
        format!("{origin}{raw}")
    } else {
        raw.to_owned()
    };

    Some(normalize_link(&absolute))
}
