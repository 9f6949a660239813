use nl_core::{Email, EmailContent, Error, MimePart, RawMessage, Result};

/// Normalizes a fetched message into an [`Email`].
///
/// The first `text/plain` and the first `text/html` leaf in depth-first order
/// are kept; later leaves of the same type are ignored. Only the first `From`
/// address is used. A missing `Date` header falls back to the arrival time.
pub fn resolve(raw: &RawMessage) -> Result<Email> {
    let sender = raw.from.first().cloned().ok_or(Error::MissingHeader("From"))?;

    let mut text = None;
    let mut html = None;
    for leaf in raw.root.leaves() {
        if let MimePart::Leaf { body, .. } = leaf {
            match leaf.mime_type().as_str() {
                "text/plain" if text.is_none() => text = Some(body.clone()),
                "text/html" if html.is_none() => html = Some(body.clone()),
                _ => {}
            }
        }
        if text.is_some() && html.is_some() {
            break;
        }
    }

    let content = match (text, html) {
        (Some(text), Some(html)) => EmailContent::TextAndHtml { text, html },
        (None, Some(html)) => EmailContent::HtmlOnly { html },
        (Some(text), None) => EmailContent::TextOnly { text },
        (None, None) => return Err(Error::NoContent),
    };

    Ok(Email {
        sender,
        date: raw.date.unwrap_or(raw.received_at),
        subject: raw.subject.clone(),
        content,
        message_id: raw.message_id.clone(),
    })
}
