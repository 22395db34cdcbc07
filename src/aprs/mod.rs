//! # APRS-IS Protocol Module
//!
//! Everything that knows about the APRS wire format and the APRS-IS relay:
//!
//! - [`codec`] - message line parsing and outbound line formatting
//! - [`passcode`] - APRS-IS login passcode derivation
//! - [`beacon`] - object beacon formatting and scheduling
//! - [`client`] - TCP connection, login handshake and reader/writer tasks
//!
//! ## Wire Format
//!
//! ```text
//! N0CALL>APRS,TCPIP*::BBSCALL  :msg N1CALL hello{12
//! └─────┘ └─────────┘ └───────┘ └──────────────┘└─┘
//! source  path        addressee body            sequence tag
//! ```
//!
//! The codec never fails: lines that are not addressed messages are simply
//! reported as such and dropped by the caller.

pub mod beacon;
pub mod client;
pub mod codec;
pub mod passcode;

pub use client::{AprsConnection, LoginParams};
pub use codec::{InboundFrame, Parsed};

use thiserror::Error;

/// Errors raised by the APRS-IS transport.
#[derive(Debug, Error)]
pub enum AprsError {
    /// Host name resolution failed or produced no usable address.
    #[error("could not resolve {host}:{port}: {reason}")]
    Resolve {
        host: String,
        port: u16,
        reason: String,
    },

    /// Every resolved address refused or timed out.
    #[error("could not connect to {host}:{port}")]
    Connect { host: String, port: u16 },

    /// Wrapper around socket IO errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
