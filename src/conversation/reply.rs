//! Chat reply text handling.

/// Shown as the user's line when the backend reports nothing it heard
pub const HEARD_PLACEHOLDER: &str = "(Audio)";

/// Longest question overlay, in characters, before truncation
pub const OVERLAY_MAX_CHARS: usize = 500;

const HEAR_OPEN: &str = "<hear>";
const HEAR_CLOSE: &str = "</hear>";

/// Split a chat reply into what the recogniser heard and what the AI says
///
/// The first `<hear>...</hear>` segment wins and is removed from the AI text.
/// Without one, the server's `transcript` field (if non-empty) or
/// [`HEARD_PLACEHOLDER`] is the heard text and the reply is used verbatim.
pub fn parse_reply(reply: &str, transcript: Option<&str>) -> (String, String) {
    if let Some(start) = reply.find(HEAR_OPEN) {
        let inner_start = start + HEAR_OPEN.len();
        if let Some(len) = reply[inner_start..].find(HEAR_CLOSE) {
            let heard = reply[inner_start..inner_start + len].trim().to_string();
            let after = inner_start + len + HEAR_CLOSE.len();
            let spoken = format!("{}{}", &reply[..start], &reply[after..]).trim().to_string();
            return (heard, spoken);
        }
    }

    let heard = transcript
        .filter(|t| !t.is_empty())
        .unwrap_or(HEARD_PLACEHOLDER)
        .to_string();
    (heard, reply.to_string())
}

/// Plain-text overlay for the current question: tags stripped, then truncated
pub fn question_overlay(text: &str) -> String {
    let plain = strip_tags(text);
    if plain.chars().count() <= OVERLAY_MAX_CHARS {
        return plain;
    }
    let mut truncated: String = plain.chars().take(OVERLAY_MAX_CHARS).collect();
    truncated.push_str("...");
    truncated
}

/// Remove every `<...>` run; an unclosed `<` is kept as text
fn strip_tags(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('<') {
        match rest[open..].find('>') {
            Some(close) => {
                out.push_str(&rest[..open]);
                rest = &rest[open + close + 1..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}
