use chrono::{DateTime, Utc};
use mailparse::{MailAddr, MailHeaderMap, ParsedMail};
use nl_core::{Error, MessageId, MimePart, RawMessage, Result};

/// Splits RFC 5322 bytes into a [`RawMessage`] with a decoded part tree.
///
/// Transfer encodings and charsets of text leaves are decoded here; non-text
/// leaves keep an empty body since nothing downstream reads them.
pub fn parse_raw_message(
    message_id: MessageId,
    received_at: DateTime<Utc>,
    bytes: &[u8],
) -> Result<RawMessage> {
    let mail = mailparse::parse_mail(bytes)
        .map_err(|e| Error::Transport(format!("Malformed message {}: {}", message_id, e)))?;

    let from = mail
        .headers
        .get_first_value("From")
        .map(|value| addresses(&value))
        .unwrap_or_default();

    let date = mail
        .headers
        .get_first_value("Date")
        .and_then(|value| mailparse::dateparse(&value).ok())
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0));

    let subject = mail.headers.get_first_value("Subject").unwrap_or_default();

    Ok(RawMessage {
        message_id,
        from,
        date,
        received_at,
        subject: subject.trim().to_string(),
        root: part_tree(&mail)?,
    })
}

fn addresses(header: &str) -> Vec<String> {
    match mailparse::addrparse(header) {
        Ok(list) => list
            .iter()
            .flat_map(|addr| match addr {
                MailAddr::Single(info) => vec![info.addr.clone()],
                MailAddr::Group(group) => group.addrs.iter().map(|info| info.addr.clone()).collect(),
            })
            .collect(),
        // Some bulk mailers emit headers addrparse rejects; keep the raw value.
        Err(_) => vec![header.trim().to_string()],
    }
}

fn part_tree(mail: &ParsedMail<'_>) -> Result<MimePart> {
    let content_type = mail.ctype.mimetype.to_lowercase();

    if content_type.starts_with("multipart/") {
        let parts = mail
            .subparts
            .iter()
            .map(part_tree)
            .collect::<Result<Vec<_>>>()?;
        return Ok(MimePart::Multipart { content_type, parts });
    }

    let body = if content_type.starts_with("text/") {
        mail.get_body()
            .map_err(|e| Error::Transport(format!("Undecodable {} part: {}", content_type, e)))?
    } else {
        String::new()
    };

    Ok(MimePart::Leaf { content_type, body })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn id() -> MessageId {
        MessageId {
            folder: "INBOX".to_string(),
            sequence: 1,
            key: "1700000000.1.host".to_string(),
        }
    }

    fn received() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 11, 14, 22, 13, 20).unwrap()
    }

    const ALTERNATIVE: &str = "From: Kotlin Weekly <mailer@kotlinweekly.net>, other@example.com\r\n\
Subject: Kotlin Weekly #380\r\n\
Date: Sun, 12 Nov 2023 09:00:00 +0000\r\n\
MIME-Version: 1.0\r\n\
Content-Type: multipart/alternative; boundary=\"b1\"\r\n\
\r\n\
--b1\r\n\
Content-Type: text/plain; charset=utf-8\r\n\
\r\n\
Plain body\r\n\
--b1\r\n\
Content-Type: text/html; charset=utf-8\r\n\
Content-Transfer-Encoding: quoted-printable\r\n\
\r\n\
<p class=3D\"lead\">Rich body</p>\r\n\
--b1--\r\n";

    #[test]
    fn test_parse_alternative() {
        let raw = parse_raw_message(id(), received(), ALTERNATIVE.as_bytes()).unwrap();

        assert_eq!(raw.from, vec!["mailer@kotlinweekly.net", "other@example.com"]);
        assert_eq!(raw.subject, "Kotlin Weekly #380");
        assert_eq!(raw.date, Some(Utc.with_ymd_and_hms(2023, 11, 12, 9, 0, 0).unwrap()));

        let leaves = raw.root.leaves();
        assert_eq!(leaves.len(), 2);
        match leaves[1] {
            MimePart::Leaf { content_type, body } => {
                assert_eq!(content_type, "text/html");
                assert!(body.contains("<p class=\"lead\">Rich body</p>"));
            }
            MimePart::Multipart { .. } => panic!("expected a leaf"),
        }
    }

    #[test]
    fn test_parse_single_part_without_date() {
        let bytes = b"From: news@tldrnewsletter.com\r\nSubject: Hi\r\nContent-Type: text/plain\r\n\r\nHello\r\n";
        let raw = parse_raw_message(id(), received(), bytes).unwrap();

        assert_eq!(raw.date, None);
        assert_eq!(raw.received_at, received());
        assert!(matches!(raw.root, MimePart::Leaf { ref content_type, .. } if content_type == "text/plain"));
    }
}
