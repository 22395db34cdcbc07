//! In-memory private mail, one FIFO queue per callsign.
use std::collections::{HashMap, VecDeque};

/// One stored private message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailItem {
    pub sender: String,
    pub body: String,
}

#[derive(Debug, Default)]
pub struct MailboxStore {
    boxes: HashMap<String, VecDeque<MailItem>>,
}

impl MailboxStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the recipient's queue, creating it on first use.
    pub fn deposit(&mut self, recipient: &str, sender: &str, body: &str) {
        self.boxes
            .entry(key(recipient))
            .or_default()
            .push_back(MailItem {
                sender: key(sender),
                body: body.to_string(),
            });
    }

    /// Remove and return everything queued for `recipient`, oldest first.
    /// The (now empty) mailbox stays registered.
    pub fn drain_all(&mut self, recipient: &str) -> Vec<MailItem> {
        self.boxes
            .entry(key(recipient))
            .or_default()
            .drain(..)
            .collect()
    }

    pub fn pending_count(&self, recipient: &str) -> usize {
        self.boxes.get(&key(recipient)).map_or(0, VecDeque::len)
    }

    pub fn is_known(&self, callsign: &str) -> bool {
        self.boxes.contains_key(&key(callsign))
    }

    pub fn total_pending(&self) -> usize {
        self.boxes.values().map(VecDeque::len).sum()
    }
}

fn key(callsign: &str) -> String {
    callsign.trim().to_ascii_uppercase()
}
