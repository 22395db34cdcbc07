use log::{debug, info, trace};
use std::time::{Duration, Instant};

use super::acks::{AckOutcome, AckTracker};
use super::commands::{CommandProcessor, OutboundMessage};
use super::groups::GroupStore;
use super::mailbox::MailboxStore;
use crate::aprs::codec::{self, Parsed, ReportKind};
use crate::config::Config;
use crate::logutil::escape_log;
use crate::metrics::Metrics;

/// # BBS Session
///
/// Owns every piece of BBS state (mailboxes, chat groups, sequence counters
/// and the pending-ack table) and turns one inbound wire line into the wire
/// lines to transmit in reply. This is the only entry point the transport
/// needs.
///
/// ## Usage
///
/// ```rust
/// use aprsbbs::bbs::session::Session;
///
/// let mut session = Session::new("BBSCALL");
/// let out = session.handle_line("N0CALL>APRS,TCPIP*::BBSCALL  :login");
/// assert_eq!(out, vec!["BBSCALL>APRS,TCPIP*::N0CALL   :No new messages.".to_string()]);
/// ```
///
/// ## Processing Order
///
/// 1. Comment and blank lines are ignored; expired pending acks are pruned
/// 2. Lines that are not messages to our callsign are dropped
/// 3. `ackNN` / `rejNN` bodies resolve the pending entry and produce no reply
/// 4. Anything else runs through the [CommandProcessor]
/// 5. Replies that want an ack get the destination's next `{NN` tag
/// 6. If the inbound message carried a tag, `ack<tag>` goes back last
///
/// State is in memory only and lost on restart.
#[derive(Debug)]
pub struct Session {
    callsign: String,
    mailboxes: MailboxStore,
    groups: GroupStore,
    acks: AckTracker,
    processor: CommandProcessor,
    metrics: Metrics,
}

impl Session {
    pub fn new(callsign: &str) -> Self {
        Self::with_ack_tracker(callsign, AckTracker::default())
    }

    pub fn with_ack_tracker(callsign: &str, acks: AckTracker) -> Self {
        Self {
            callsign: callsign.trim().to_ascii_uppercase(),
            mailboxes: MailboxStore::new(),
            groups: GroupStore::new(),
            acks,
            processor: CommandProcessor::new(),
            metrics: Metrics::default(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let acks = AckTracker::new(
            Duration::from_secs(config.acks.pending_ttl_secs),
            config.acks.max_pending,
        );
        Self::with_ack_tracker(&config.bbs.callsign, acks)
    }

    pub fn callsign(&self) -> &str {
        &self.callsign
    }

    pub fn handle_line(&mut self, raw: &str) -> Vec<String> {
        self.handle_line_at(raw, Instant::now())
    }

    /// [Session::handle_line] with an explicit clock for pending-ack bookkeeping.
    pub fn handle_line_at(&mut self, raw: &str, now: Instant) -> Vec<String> {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            return Vec::new();
        }
        self.metrics.inc_lines_seen();
        let expired = self.acks.prune_expired_at(now);
        self.metrics.add_pending_expired(expired);

        let frame = match codec::parse(line) {
            Parsed::Frame(frame) if frame.is_for(&self.callsign) => frame,
            Parsed::Frame(frame) => {
                trace!("Ignoring message for {}", frame.addressee);
                return Vec::new();
            }
            Parsed::NotAddressed => return Vec::new(),
        };
        self.metrics.inc_frames_for_us();
        info!("Message from {}: {}", frame.source, escape_log(&frame.body));

        if let Some((kind, tag)) = codec::parse_report(&frame.body) {
            let outcome = match kind {
                ReportKind::Ack => self.acks.resolve_ack(&frame.source, &tag),
                ReportKind::Rej => self.acks.resolve_rej(&frame.source, &tag),
            };
            match outcome {
                AckOutcome::Acked { .. } => self.metrics.inc_reliable_acked(),
                AckOutcome::Rejected { .. } => self.metrics.inc_reliable_rejected(),
                AckOutcome::Unknown => self.metrics.inc_unknown_reports(),
            }
            return Vec::new();
        }

        self.metrics.inc_commands();
        let replies = self.processor.process(
            &frame.source,
            frame.body.trim(),
            &mut self.mailboxes,
            &mut self.groups,
        );
        let mut out = self.transmit_at(replies, now);

        if let Some(tag) = frame.sequence_tag {
            debug!("Acknowledging {} from {}", tag, frame.source);
            out.push(self.format(&frame.source, &codec::format_ack(&tag)));
            self.metrics.inc_acks_sent();
        }
        out
    }

    /// Tag, record and format outbound messages in order.
    pub fn transmit_at(&mut self, messages: Vec<OutboundMessage>, now: Instant) -> Vec<String> {
        let mut lines = Vec::with_capacity(messages.len());
        for msg in messages {
            let body = if msg.requires_ack {
                let tag = self.acks.next_sequence(&msg.destination);
                let evicted = self
                    .acks
                    .record_pending_at(&msg.destination, &tag, &msg.body, now);
                self.metrics.add_pending_evicted(evicted);
                self.metrics.inc_reliable_sent();
                codec::with_sequence_tag(&msg.body, &tag)
            } else {
                self.metrics.inc_notices_sent();
                msg.body
            };
            lines.push(self.format(&msg.destination, &body));
        }
        lines
    }

    fn format(&self, destination: &str, body: &str) -> String {
        codec::format_message(&self.callsign, destination, body)
    }

    pub fn mailboxes(&self) -> &MailboxStore {
        &self.mailboxes
    }

    pub fn groups(&self) -> &GroupStore {
        &self.groups
    }

    pub fn acks(&self) -> &AckTracker {
        &self.acks
    }

    /// Copy of the current counters.
    pub fn metrics(&self) -> Metrics {
        self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(from: &str, body: &str) -> String {
        format!("{}>APRS,TCPIP*::{:<9}:{}", from, "BBSCALL", body)
    }

    #[test]
    fn login_with_empty_mailbox() {
        let mut s = Session::new("bbscall");
        let out = s.handle_line(&line("N0CALL", "login"));
        assert_eq!(out, vec!["BBSCALL>APRS,TCPIP*::N0CALL   :No new messages.".to_string()]);
        assert!(s.mailboxes().is_known("N0CALL"));
    }

    #[test]
    fn tagged_inbound_is_acked_after_replies() {
        let mut s = Session::new("BBSCALL");
        let out = s.handle_line(&line("N0CALL", "help{42"));
        assert_eq!(out.len(), 9);
        assert_eq!(out[8], "BBSCALL>APRS,TCPIP*::N0CALL   :ack42");
        assert_eq!(s.metrics().acks_sent, 1);
    }

    #[test]
    fn tagged_empty_body_gets_only_the_ack() {
        let mut s = Session::new("BBSCALL");
        let out = s.handle_line(&line("N0CALL", "{7"));
        assert_eq!(out, vec!["BBSCALL>APRS,TCPIP*::N0CALL   :ack7".to_string()]);
    }

    #[test]
    fn comments_and_blank_lines_ignored() {
        let mut s = Session::new("BBSCALL");
        assert!(s.handle_line("# aprsc 2.1.14-g5e22b37").is_empty());
        assert!(s.handle_line("   ").is_empty());
        assert_eq!(s.metrics().lines_seen, 0);
    }

    #[test]
    fn expired_pending_entries_are_pruned_on_next_line() {
        let acks = AckTracker::new(Duration::from_secs(60), 16);
        let mut s = Session::with_ack_tracker("BBSCALL", acks);
        let t0 = Instant::now();
        s.handle_line_at(&line("N0CALL", "msg N1CALL hi"), t0);
        s.handle_line_at(&line("N1CALL", "login"), t0);
        assert_eq!(s.acks().pending_len(), 1);
        s.handle_line_at("W1AW>APRS:>status", t0 + Duration::from_secs(61));
        assert_eq!(s.acks().pending_len(), 0);
        assert_eq!(s.metrics().pending_expired, 1);
    }
}
