//! Positional `{N}` message templates.
//!
//! Both message templates of an error code use the same syntax: `{0}`, `{1}`,
//! ... substituted by index. A placeholder whose index has no argument stays
//! literal, so a short argument list is visible in the output instead of being
//! silently padded.

/// Number of arguments a template requires: highest placeholder index plus
/// one, or zero when the template has no placeholders.
pub fn placeholder_count(template: &str) -> usize {
    let mut max_index: Option<usize> = None;
    for (start, _) in template.match_indices('{') {
        let rest = &template[start + 1..];
        if let Some(end) = rest.find('}') {
            if let Ok(index) = rest[..end].parse::<usize>() {
                max_index = Some(max_index.map_or(index, |m| m.max(index)));
            }
        }
    }
    max_index.map_or(0, |m| m + 1)
}

/// Substitute `args` into `template` by position.
pub fn render(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) if after[..end].parse::<usize>().is_ok() => {
                let body = &after[..end];
                match body.parse::<usize>().ok().and_then(|i| args.get(i)) {
                    Some(arg) => out.push_str(arg),
                    // no argument at that index: keep the placeholder literal
                    None => {
                        out.push('{');
                        out.push_str(body);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            // not a positional placeholder; keep the brace and rescan so a
            // placeholder nested further in is still found
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
