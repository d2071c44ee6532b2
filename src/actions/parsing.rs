//! Locate the JSON decision inside a raw model reply.
//!
//! Models asked for a structured decision usually answer with a fenced
//! ```` ```json ```` block, sometimes wrapped in prose.  These helpers
//! pull the block out without interpreting it.

/// Split `reply` into the first fenced JSON block and the text around it.
///
/// Accepts both ```` ```json ```` and bare ```` ``` ```` fences.  Returns
/// `None` when no closed fence is present.
pub fn split_json_block(reply: &str) -> Option<(String, String)> {
    let text = reply.replace("\r\n", "\n");
    let open = text.find("```")?;
    let after_fence = &text[open + 3..];
    let nl = after_fence.find('\n')?;
    let lang = after_fence[..nl].trim();
    if !lang.is_empty() && !lang.eq_ignore_ascii_case("json") {
        return None;
    }

    let body_start = open + 3 + nl + 1;
    let body = &text[body_start..];
    let close = body.find("\n```").or_else(|| body.strip_suffix("```").map(|b| b.len()))?;
    let json = body[..close].trim().to_string();

    let block_end = (body_start + close + 4).min(text.len());
    let before = text[..open].trim();
    let after = text[block_end..].trim_start_matches('`').trim();
    let surrounding = match (before.is_empty(), after.is_empty()) {
        (true, true) => String::new(),
        (false, true) => before.to_string(),
        (true, false) => after.to_string(),
        (false, false) => format!("{before}\n{after}"),
    };

    Some((json, surrounding))
}

/// The JSON text of a reply: the fenced block if there is one, otherwise
/// the whole trimmed reply.
pub fn decision_json(reply: &str) -> String {
    split_json_block(reply)
        .map(|(json, _)| json)
        .unwrap_or_else(|| reply.trim().to_string())
}
