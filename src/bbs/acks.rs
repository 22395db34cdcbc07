//! Per-destination message sequencing and delivery acknowledgment tracking.
//!
//! APRS gives no delivery guarantee. Each message that wants confirmation is
//! sent with a two-digit `{NN` tag drawn from a counter kept per destination;
//! the destination answers `ackNN` (or `rejNN`) and we correlate the reply
//! with the pending entry for `(destination, NN)`.
//!
//! Nothing is retransmitted. Pending entries leave the table on ack/rej, on
//! TTL expiry, when the table is over its cap, or when the destination's
//! counter wraps and the same tag is issued again.
use log::{debug, warn};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::logutil::escape_log;

/// Highest tag value before the counter wraps back to 1.
pub const MAX_SEQUENCE: u8 = 99;

#[derive(Debug, Clone)]
pub struct PendingAck {
    pub body: String,
    pub sent_at: Instant,
}

/// Result of matching an inbound ack/rej against the pending table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AckOutcome {
    Acked { body: String },
    Rejected { body: String },
    Unknown,
}

#[derive(Debug)]
pub struct AckTracker {
    counters: HashMap<String, u8>,
    pending: HashMap<(String, String), PendingAck>,
    ttl: Duration,
    max_pending: usize,
}

impl Default for AckTracker {
    fn default() -> Self {
        Self::new(Duration::from_secs(30 * 60), 1024)
    }
}

impl AckTracker {
    pub fn new(ttl: Duration, max_pending: usize) -> Self {
        Self {
            counters: HashMap::new(),
            pending: HashMap::new(),
            ttl,
            max_pending: max_pending.max(1),
        }
    }

    /// Reserve the next tag for `destination`: `01`, `02`, ... `99`, `01`, ...
    pub fn next_sequence(&mut self, destination: &str) -> String {
        let counter = self.counters.entry(key(destination)).or_insert(0);
        *counter = if *counter >= MAX_SEQUENCE { 1 } else { *counter + 1 };
        format!("{:02}", counter)
    }

    pub fn record_pending(&mut self, destination: &str, tag: &str, body: &str) {
        self.record_pending_at(destination, tag, body, Instant::now());
    }

    /// Returns the number of older entries evicted to stay under the cap.
    pub fn record_pending_at(
        &mut self,
        destination: &str,
        tag: &str,
        body: &str,
        now: Instant,
    ) -> usize {
        let replaced = self.pending.insert(
            (key(destination), tag.to_string()),
            PendingAck {
                body: body.to_string(),
                sent_at: now,
            },
        );
        if replaced.is_some() {
            debug!(
                "Tag {} reissued to {}; previous message left unacknowledged",
                tag, destination
            );
        }
        let mut evicted = 0;
        while self.pending.len() > self.max_pending {
            let oldest = self
                .pending
                .iter()
                .min_by_key(|(_, p)| p.sent_at)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(k) => {
                    self.pending.remove(&k);
                    debug!("Pending ack table full; evicted {}{{{}", k.0, k.1);
                    evicted += 1;
                }
                None => break,
            }
        }
        evicted
    }

    /// Remove and return the body pending under `(destination, tag)`.
    ///
    /// A tag that zero-pads to one we issued also matches (`1` finds `01`).
    pub fn resolve(&mut self, destination: &str, tag: &str) -> Option<String> {
        let dest = key(destination);
        if let Some(p) = self.pending.remove(&(dest.clone(), tag.to_string())) {
            return Some(p.body);
        }
        let normalized = tag.parse::<u32>().ok().map(|n| format!("{:02}", n))?;
        if normalized == tag {
            return None;
        }
        self.pending.remove(&(dest, normalized)).map(|p| p.body)
    }

    pub fn resolve_ack(&mut self, destination: &str, tag: &str) -> AckOutcome {
        match self.resolve(destination, tag) {
            Some(body) => {
                debug!("{} acknowledged {}: '{}'", destination, tag, escape_log(&body));
                AckOutcome::Acked { body }
            }
            None => {
                debug!("ack{} from {} matches nothing pending", tag, destination);
                AckOutcome::Unknown
            }
        }
    }

    /// Rejections are surfaced as warnings and not retried.
    pub fn resolve_rej(&mut self, destination: &str, tag: &str) -> AckOutcome {
        match self.resolve(destination, tag) {
            Some(body) => {
                warn!(
                    "{} rejected message {}: '{}'",
                    destination,
                    tag,
                    escape_log(&body)
                );
                AckOutcome::Rejected { body }
            }
            None => {
                debug!("rej{} from {} matches nothing pending", tag, destination);
                AckOutcome::Unknown
            }
        }
    }

    pub fn prune_expired(&mut self) -> usize {
        self.prune_expired_at(Instant::now())
    }

    /// Drop entries older than the TTL; returns how many were dropped.
    pub fn prune_expired_at(&mut self, now: Instant) -> usize {
        let before = self.pending.len();
        let ttl = self.ttl;
        self.pending.retain(|(dest, tag), p| {
            let keep = now.saturating_duration_since(p.sent_at) < ttl;
            if !keep {
                debug!("No ack from {} for {} within {:?}; giving up", dest, tag, ttl);
            }
            keep
        });
        before - self.pending.len()
    }

    pub fn is_pending(&self, destination: &str, tag: &str) -> bool {
        self.pending.contains_key(&(key(destination), tag.to_string()))
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Tags still pending for one destination, sorted.
    pub fn pending_for(&self, destination: &str) -> Vec<String> {
        let dest = key(destination);
        let mut tags: Vec<String> = self
            .pending
            .keys()
            .filter(|(d, _)| *d == dest)
            .map(|(_, t)| t.clone())
            .collect();
        tags.sort();
        tags
    }
}

fn key(callsign: &str) -> String {
    callsign.trim().to_ascii_uppercase()
}
