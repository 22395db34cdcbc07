//! Command parsing and execution for messages addressed to the BBS.
//!
//! Every inbound body is one self-contained command; there is no per-caller
//! menu state. [CommandParser] turns the body into a [Command], and
//! [CommandProcessor::process] applies it to the mailbox and group stores
//! and returns the replies as [OutboundMessage]s. Replies that carry mail or
//! group traffic ask for an acknowledgment; confirmations and help do not.
use log::{debug, info};

use super::groups::{CreateOutcome, GroupStore, JoinOutcome, LeaveOutcome};
use super::mailbox::MailboxStore;
use crate::logutil::escape_log;

pub const USAGE_MSG: &str = "Usage: msg CALLSIGN message";
pub const USAGE_GROUP: &str = "Usage: group [create|join|leave|msg] <name> [message]";
pub const UNKNOWN_COMMAND: &str = "Unknown command. Send 'help' for a list of commands.";
pub const NO_NEW_MESSAGES: &str = "No new messages.";

pub const HELP_LINES: [&str; 8] = [
    "Available commands:",
    "login                        - Register and check for new mail",
    "msg CALLSIGN MESSAGE         - Send a private message",
    "group create NAME            - Create a new chat group and join it",
    "group join NAME              - Join an existing chat group",
    "group leave NAME             - Leave a chat group",
    "group msg NAME MESSAGE       - Message all members of a group",
    "help                         - Show this help",
];

/// A message the BBS wants to transmit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub destination: String,
    pub body: String,
    pub requires_ack: bool,
}

impl OutboundMessage {
    /// Reply that does not ask for an acknowledgment.
    pub fn notice(destination: &str, body: impl Into<String>) -> Self {
        Self {
            destination: destination.to_ascii_uppercase(),
            body: body.into(),
            requires_ack: false,
        }
    }

    /// Message delivered with a sequence tag and tracked until acked.
    pub fn reliable(destination: &str, body: impl Into<String>) -> Self {
        Self {
            destination: destination.to_ascii_uppercase(),
            body: body.into(),
            requires_ack: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login,
    Help,
    Msg { to: String, text: String },
    GroupCreate(String),
    GroupJoin(String),
    GroupLeave(String),
    GroupMsg { name: String, text: String },
    Invalid(&'static str),
    Unknown,
    Empty,
}

/// Body-to-command parser. The first word selects the command, case-insensitively.
#[derive(Debug)]
pub struct CommandParser;

impl CommandParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, body: &str) -> Command {
        let parts: Vec<&str> = body.split_whitespace().collect();
        let Some(first) = parts.first() else {
            return Command::Empty;
        };
        match first.to_ascii_lowercase().as_str() {
            "login" => Command::Login,
            "help" => Command::Help,
            "msg" | "send" => {
                if parts.len() < 3 {
                    return Command::Invalid(USAGE_MSG);
                }
                Command::Msg {
                    to: parts[1].to_ascii_uppercase(),
                    text: parts[2..].join(" "),
                }
            }
            "group" => Self::parse_group(&parts[1..]),
            _ => Command::Unknown,
        }
    }

    fn parse_group(args: &[&str]) -> Command {
        let sub = args.first().map(|s| s.to_ascii_lowercase());
        match (sub.as_deref(), args.len()) {
            (Some("create"), n) if n >= 2 => Command::GroupCreate(args[1].to_lowercase()),
            (Some("join"), n) if n >= 2 => Command::GroupJoin(args[1].to_lowercase()),
            (Some("leave"), n) if n >= 2 => Command::GroupLeave(args[1].to_lowercase()),
            (Some("msg"), n) if n >= 3 => Command::GroupMsg {
                name: args[1].to_lowercase(),
                text: args[2..].join(" "),
            },
            _ => Command::Invalid(USAGE_GROUP),
        }
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies commands to the stores.
#[derive(Debug)]
pub struct CommandProcessor {
    parser: CommandParser,
}

impl CommandProcessor {
    pub fn new() -> Self {
        Self {
            parser: CommandParser::new(),
        }
    }

    /// Run `body` sent by `caller`; returns replies in transmit order.
    pub fn process(
        &self,
        caller: &str,
        body: &str,
        mailboxes: &mut MailboxStore,
        groups: &mut GroupStore,
    ) -> Vec<OutboundMessage> {
        let command = self.parser.parse(body);
        debug!("{} -> {:?}", caller, command);
        self.execute(caller, command, mailboxes, groups)
    }

    pub fn execute(
        &self,
        caller: &str,
        command: Command,
        mailboxes: &mut MailboxStore,
        groups: &mut GroupStore,
    ) -> Vec<OutboundMessage> {
        match command {
            Command::Empty => Vec::new(),
            Command::Login => self.handle_login(caller, mailboxes),
            Command::Help => HELP_LINES
                .iter()
                .map(|line| OutboundMessage::notice(caller, *line))
                .collect(),
            Command::Msg { to, text } => {
                mailboxes.deposit(&to, caller, &text);
                info!(
                    "Stored message from {} for {}: '{}'",
                    caller,
                    to,
                    escape_log(&text)
                );
                vec![OutboundMessage::notice(
                    caller,
                    format!("Stored message for {}.", to),
                )]
            }
            Command::GroupCreate(name) => {
                let reply = match groups.create(&name, caller) {
                    CreateOutcome::Created => {
                        info!("{} created group '{}'", caller, name);
                        format!("Group '{}' created and you have joined.", name)
                    }
                    CreateOutcome::AlreadyExists => format!("Group '{}' already exists.", name),
                };
                vec![OutboundMessage::notice(caller, reply)]
            }
            Command::GroupJoin(name) => {
                let reply = match groups.join(&name, caller) {
                    JoinOutcome::Joined => format!("Joined group '{}'.", name),
                    JoinOutcome::NoSuchGroup => format!("Group '{}' does not exist.", name),
                    JoinOutcome::AlreadyMember => {
                        format!("You are already a member of '{}'.", name)
                    }
                };
                vec![OutboundMessage::notice(caller, reply)]
            }
            Command::GroupLeave(name) => {
                let reply = match groups.leave(&name, caller) {
                    LeaveOutcome::Left { group_removed } => {
                        if group_removed {
                            info!("Group '{}' removed; last member {} left", name, caller);
                        }
                        format!("Left group '{}'.", name)
                    }
                    LeaveOutcome::NoSuchGroupOrNotMember => {
                        format!("You are not a member of '{}'.", name)
                    }
                };
                vec![OutboundMessage::notice(caller, reply)]
            }
            Command::GroupMsg { name, text } => match groups.broadcast(&name, caller) {
                Err(_) => vec![OutboundMessage::notice(
                    caller,
                    format!("You are not a member of '{}'.", name),
                )],
                Ok(recipients) => {
                    let line = format!("[{}] {}: {}", name, caller, text);
                    let mut out: Vec<OutboundMessage> = recipients
                        .iter()
                        .map(|member| OutboundMessage::reliable(member, line.as_str()))
                        .collect();
                    out.push(OutboundMessage::notice(
                        caller,
                        format!("Sent to group '{}'.", name),
                    ));
                    out
                }
            },
            Command::Invalid(usage) => vec![OutboundMessage::notice(caller, usage)],
            Command::Unknown => vec![OutboundMessage::notice(caller, UNKNOWN_COMMAND)],
        }
    }

    fn handle_login(&self, caller: &str, mailboxes: &mut MailboxStore) -> Vec<OutboundMessage> {
        let items = mailboxes.drain_all(caller);
        if items.is_empty() {
            return vec![OutboundMessage::notice(caller, NO_NEW_MESSAGES)];
        }
        info!("Delivering {} stored message(s) to {}", items.len(), caller);
        items
            .into_iter()
            .map(|item| {
                OutboundMessage::reliable(caller, format!("From {}: {}", item.sender, item.body))
            })
            .collect()
    }
}

impl Default for CommandProcessor {
    fn default() -> Self {
        Self::new()
    }
}
