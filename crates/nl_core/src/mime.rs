/// A node of a MIME body tree as handed over by the mail transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MimePart {
    Leaf { content_type: String, body: String },
    Multipart { content_type: String, parts: Vec<MimePart> },
}

impl MimePart {
    pub fn leaf(content_type: &str, body: &str) -> Self {
        MimePart::Leaf {
            content_type: content_type.to_string(),
            body: body.to_string(),
        }
    }

    pub fn multipart(content_type: &str, parts: Vec<MimePart>) -> Self {
        MimePart::Multipart {
            content_type: content_type.to_string(),
            parts,
        }
    }

    pub fn content_type(&self) -> &str {
        match self {
            MimePart::Leaf { content_type, .. } | MimePart::Multipart { content_type, .. } => content_type,
        }
    }

    /// Lowercased media type without parameters, e.g. `text/html`.
    pub fn mime_type(&self) -> String {
        self.content_type()
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase()
    }

    /// Leaves in depth-first document order.
    pub fn leaves(&self) -> Vec<&MimePart> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(part) = stack.pop() {
            match part {
                MimePart::Leaf { .. } => out.push(part),
                MimePart::Multipart { parts, .. } => stack.extend(parts.iter().rev()),
            }
        }
        out
    }
}
