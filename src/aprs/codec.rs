//! APRS message line codec.
//!
//! Inbound lines look like `SOURCE>PATH::ADDRESSEE:text{NNNNN` where the
//! addressee field is exactly nine characters, space padded. Anything that
//! does not match that shape is reported as [`Parsed::NotAddressed`] and is
//! never an error: most traffic on an APRS-IS feed is position reports,
//! weather and status lines that simply are not messages.
//!
//! Outbound lines are produced by [`format_message`]. The line terminator is
//! left to the transport writer.
use log::trace;

use crate::logutil::escape_log;

/// Width of the addressee field in an APRS message payload.
pub const ADDRESSEE_WIDTH: usize = 9;

/// Longest numeric sequence tag accepted on inbound messages.
pub const MAX_TAG_DIGITS: usize = 5;

/// Path used on every line this station originates.
pub const TX_PATH: &str = "APRS,TCPIP*";

/// A message frame addressed to some station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundFrame {
    /// Originating station, upper-cased.
    pub source: String,
    /// Addressee field, trimmed and upper-cased.
    pub addressee: String,
    /// Message text with any `{tag` suffix removed.
    pub body: String,
    /// Up to five digits following `{`, when the sender asked for an ack.
    pub sequence_tag: Option<String>,
}

impl InboundFrame {
    pub fn is_for(&self, callsign: &str) -> bool {
        self.addressee.eq_ignore_ascii_case(callsign.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    Frame(InboundFrame),
    NotAddressed,
}

/// Parse one raw wire line.
pub fn parse(line: &str) -> Parsed {
    match parse_frame(line) {
        Some(frame) => Parsed::Frame(frame),
        None => {
            trace!("not an addressed message: '{}'", escape_log(line));
            Parsed::NotAddressed
        }
    }
}

fn parse_frame(line: &str) -> Option<InboundFrame> {
    let (header, payload) = line.split_once(':')?;
    let (source, _path) = header.split_once('>')?;
    let source = source.trim();
    if source.is_empty() {
        return None;
    }
    let payload = payload.strip_prefix(':')?;
    // ":" + 9-byte addressee + ":" must all be present.
    if payload.len() < ADDRESSEE_WIDTH + 1 || !payload.is_char_boundary(ADDRESSEE_WIDTH) {
        return None;
    }
    let (addressee, remainder) = payload.split_at(ADDRESSEE_WIDTH);
    let text = remainder.strip_prefix(':')?;
    let (body, sequence_tag) = split_sequence_tag(text);
    Some(InboundFrame {
        source: source.to_ascii_uppercase(),
        addressee: addressee.trim().to_ascii_uppercase(),
        body: body.to_string(),
        sequence_tag,
    })
}

/// Split `text{NNNNN` into the message body and its numeric tag.
///
/// Everything from the first `{` on is stripped from the body even when no
/// digits follow it.
pub fn split_sequence_tag(text: &str) -> (&str, Option<String>) {
    match text.split_once('{') {
        None => (text, None),
        Some((body, suffix)) => {
            let digits: String = suffix
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .take(MAX_TAG_DIGITS)
                .collect();
            let tag = if digits.is_empty() { None } else { Some(digits) };
            (body, tag)
        }
    }
}

/// Pad or truncate a callsign to the fixed addressee width.
pub fn pad_addressee(callsign: &str) -> String {
    let upper = callsign.trim().to_ascii_uppercase();
    let truncated: String = upper.chars().take(ADDRESSEE_WIDTH).collect();
    format!("{:<width$}", truncated, width = ADDRESSEE_WIDTH)
}

/// Build a complete message line from `our_call` to `addressee`.
pub fn format_message(our_call: &str, addressee: &str, body: &str) -> String {
    format_raw(our_call, &format!(":{}:{}", pad_addressee(addressee), body))
}

/// Build a line carrying an arbitrary APRS information field.
pub fn format_raw(our_call: &str, information: &str) -> String {
    format!(
        "{}>{}:{}",
        our_call.trim().to_ascii_uppercase(),
        TX_PATH,
        information
    )
}

/// Append a sequence tag to an outgoing body.
pub fn with_sequence_tag(body: &str, tag: &str) -> String {
    format!("{}{{{}", body, tag)
}

pub fn format_ack(tag: &str) -> String {
    format!("ack{}", tag)
}

/// Kind of delivery report carried in a message body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Ack,
    Rej,
}

/// Recognise an `ackNN` / `rejNN` body. Case-insensitive, surrounding
/// whitespace ignored; at least one digit is required.
pub fn parse_report(body: &str) -> Option<(ReportKind, String)> {
    let lowered = body.trim().to_ascii_lowercase();
    let (kind, rest) = if let Some(rest) = lowered.strip_prefix("ack") {
        (ReportKind::Ack, rest)
    } else if let Some(rest) = lowered.strip_prefix("rej") {
        (ReportKind::Rej, rest)
    } else {
        return None;
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    Some((kind, digits))
}
