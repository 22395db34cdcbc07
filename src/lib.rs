//! # aprsbbs - Bulletin Board System for the APRS-IS Network
//!
//! A store-and-forward BBS that logs in to an APRS-IS relay as a fixed
//! station, watches every inbound line for messages addressed to itself and
//! answers them. Callers can pick up mail left for them, leave mail for other
//! stations, and talk in named chat groups.
//!
//! ## Features
//!
//! - **Private Mail**: `msg CALL text` stores mail; `login` delivers it in order.
//! - **Chat Groups**: create, join, leave and fan out messages to members.
//! - **Delivery Tracking**: per-station `{NN` sequence tags with ack/rej correlation.
//! - **Object Beacon**: optional periodic APRS object announcing the BBS.
//! - **Async Transport**: Tokio reader/writer tasks over one TCP connection.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use aprsbbs::config::Config;
//! use aprsbbs::bbs::BbsServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let mut server = BbsServer::new(config)?;
//!     server.connect().await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`bbs`] - mailboxes, chat groups, ack tracking, command engine and server loop
//! - [`aprs`] - wire codec, passcode, object beacon and APRS-IS client
//! - [`config`] - configuration management and validation
//! - [`validation`] - callsign validation
//! - [`metrics`] - per-session traffic counters
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   BBS Server    │ ← event loop, beacon timer
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   Session       │ ← all BBS state; one line in, lines out
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   APRS-IS       │ ← TCP login, reader / writer tasks
//! │   Client        │
//! └─────────────────┘
//! ```
//!
//! All state is held in memory and is lost on restart.

pub mod aprs;
pub mod bbs;
pub mod config;
pub mod logutil;
pub mod metrics;
pub mod validation;
