//! # BBS Core Module
//!
//! The message protocol and stateful command engine of the bulletin board.
//!
//! ## Components
//!
//! - [`acks`] - per-destination sequence tags and the pending-ack table
//! - [`mailbox`] - per-callsign FIFO of undelivered private mail
//! - [`groups`] - named chat groups and their membership rules
//! - [`commands`] - command parsing and execution against the stores
//! - [`session`] - the facade that owns all state: one line in, lines out
//! - [`server`] - async event loop wiring the session to APRS-IS
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  BbsServer      │ ← transport events, beacon timer, shutdown
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  Session        │ ← owns every store; handle_line()
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │  Command        │ ← mailbox / group mutations, replies
//! │  Processing     │
//! └─────────────────┘
//! ```
//!
//! ## Services
//!
//! 1. **Mail**: `msg CALL text` stores mail; `login` delivers and clears it
//! 2. **Chat groups**: `group create|join|leave|msg NAME ...`
//! 3. **Help**: `help` lists the commands

pub mod acks;
pub mod commands;
pub mod groups;
pub mod mailbox;
pub mod server;
pub mod session;

pub use commands::{CommandProcessor, OutboundMessage};
pub use server::BbsServer;
pub use session::Session;
