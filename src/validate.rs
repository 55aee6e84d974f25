//! Pure input checks run before anything is written.

use crate::{db::MessageKind, ChatError, ChatResult};

/// Drops anything that looks like a markup tag and trims the rest.
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        match rest[open..].find('>') {
            Some(close) => rest = &rest[open + close + 1..],
            None => {
                // unterminated `<` is text, not markup
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);

    out.trim().to_owned()
}

/// Sanitized caller identity, `None` when absent or blank.
pub fn identity(raw: Option<&str>) -> Option<String> {
    raw.map(sanitize).filter(|name| !name.is_empty())
}

pub fn participant_name(raw: Option<&str>) -> ChatResult<String> {
    identity(raw).ok_or_else(|| ChatError::InvalidInput("name is required".to_owned()))
}

/// `limit` query value: absent or empty means "everything".
pub fn limit(raw: Option<&str>) -> ChatResult<Option<usize>> {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };

    let digits = raw.strip_prefix('+').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) || digits.bytes().all(|b| b == b'0') {
        return Err(ChatError::InvalidInput(format!("limit must be a positive integer, got {raw:?}")));
    }

    // more than we could ever hold is the same as no cap
    Ok(Some(digits.parse::<usize>().unwrap_or(usize::MAX)))
}

/// Recipient, body and type of a client-authored message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub to: String,
    pub text: String,
    pub kind: MessageKind,
}

pub fn message_draft(to: Option<&str>, text: Option<&str>, kind: Option<&str>) -> ChatResult<MessageDraft> {
    let to = to.map(sanitize).filter(|to| !to.is_empty())
        .ok_or_else(|| ChatError::InvalidInput("to is required".to_owned()))?;
    let text = text.map(sanitize).filter(|text| !text.is_empty())
        .ok_or_else(|| ChatError::InvalidInput("text is required".to_owned()))?;
    let kind = kind.ok_or_else(|| ChatError::InvalidInput("type is required".to_owned()))?;
    let kind = MessageKind::from_client(kind)
        .ok_or_else(|| ChatError::InvalidInput(format!("type {kind:?} is not allowed")))?;

    Ok(MessageDraft { to, text, kind })
}
