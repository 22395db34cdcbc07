//! Traffic and delivery counters for one BBS session.
//!
//! Counters live on the [`crate::bbs::Session`] that owns the stores; read
//! them through [`crate::bbs::Session::metrics`].
use serde::Serialize;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Metrics {
    pub lines_seen: u64,
    pub frames_for_us: u64,
    pub commands_processed: u64,
    pub reliable_sent: u64,
    pub notices_sent: u64,
    pub acks_sent: u64,
    pub reliable_acked: u64,
    pub reliable_rejected: u64,
    pub unknown_reports: u64,
    pub pending_expired: u64,
    pub pending_evicted: u64,
}

impl Metrics {
    pub fn inc_lines_seen(&mut self) {
        self.lines_seen = self.lines_seen.saturating_add(1);
    }
    pub fn inc_frames_for_us(&mut self) {
        self.frames_for_us = self.frames_for_us.saturating_add(1);
    }
    pub fn inc_commands(&mut self) {
        self.commands_processed = self.commands_processed.saturating_add(1);
    }
    pub fn inc_reliable_sent(&mut self) {
        self.reliable_sent = self.reliable_sent.saturating_add(1);
    }
    pub fn inc_notices_sent(&mut self) {
        self.notices_sent = self.notices_sent.saturating_add(1);
    }
    pub fn inc_acks_sent(&mut self) {
        self.acks_sent = self.acks_sent.saturating_add(1);
    }
    pub fn inc_reliable_acked(&mut self) {
        self.reliable_acked = self.reliable_acked.saturating_add(1);
    }
    pub fn inc_reliable_rejected(&mut self) {
        self.reliable_rejected = self.reliable_rejected.saturating_add(1);
    }
    pub fn inc_unknown_reports(&mut self) {
        self.unknown_reports = self.unknown_reports.saturating_add(1);
    }
    pub fn add_pending_expired(&mut self, n: usize) {
        self.pending_expired = self.pending_expired.saturating_add(n as u64);
    }
    pub fn add_pending_evicted(&mut self, n: usize) {
        self.pending_evicted = self.pending_evicted.saturating_add(n as u64);
    }

    /// Sent reliable messages that have neither been acked nor rejected.
    pub fn unresolved(&self) -> u64 {
        self.reliable_sent
            .saturating_sub(self.reliable_acked)
            .saturating_sub(self.reliable_rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unresolved_never_underflows() {
        let mut m = Metrics::default();
        m.inc_reliable_acked();
        assert_eq!(m.unresolved(), 0);
        m.inc_reliable_sent();
        m.inc_reliable_sent();
        m.inc_reliable_acked();
        assert_eq!(m.unresolved(), 0);
        m.inc_reliable_sent();
        assert_eq!(m.unresolved(), 1);
    }

    #[test]
    fn snapshot_serializes_to_json() {
        let mut m = Metrics::default();
        m.inc_lines_seen();
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"lines_seen\":1"));
    }
}
