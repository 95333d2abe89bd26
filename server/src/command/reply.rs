//! Reply rendering for the chat gateway

use std::str::FromStr;

/// Content type sent with every command reply
pub const REPLY_CONTENT_TYPE: &str = "text/xml; charset=utf-8";

/// How the reply body is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyFormat {
    /// Bare message text under the XML content type
    #[default]
    Plain,
    /// Message wrapped in a `<Response><Message>` document
    Twiml,
}

impl ReplyFormat {
    pub fn render(self, text: &str) -> String {
        match self {
            ReplyFormat::Plain => text.to_string(),
            ReplyFormat::Twiml => format!(
                "<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response><Message>{}</Message></Response>",
                escape_xml(text)
            ),
        }
    }
}

impl FromStr for ReplyFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "text" => Ok(ReplyFormat::Plain),
            "twiml" | "xml" => Ok(ReplyFormat::Twiml),
            other => Err(format!("unknown reply format: {}", other)),
        }
    }
}

impl std::fmt::Display for ReplyFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplyFormat::Plain => write!(f, "plain"),
            ReplyFormat::Twiml => write!(f, "twiml"),
        }
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
