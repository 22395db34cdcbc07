//! Callsign validation.

/// Callsign validation errors with helpful messages
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CallsignError {
    #[error("Callsign is empty")]
    Empty,

    #[error("Callsign is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("Callsign contains invalid characters: {chars}")]
    InvalidCharacters { chars: String },

    #[error("Callsign SSID '{ssid}' is not valid")]
    InvalidSsid { ssid: String },
}

/// Longest station identifier APRS-IS accepts, SSID included.
pub const MAX_CALLSIGN_LEN: usize = 9;

/// Validate a station callsign and return it upper-cased.
///
/// Accepts `BASE` or `BASE-SSID` where both parts are ASCII alphanumeric and
/// the SSID is one or two characters.
pub fn validate_callsign(callsign: &str) -> Result<String, CallsignError> {
    let upper = callsign.trim().to_ascii_uppercase();
    if upper.is_empty() {
        return Err(CallsignError::Empty);
    }
    if upper.len() > MAX_CALLSIGN_LEN {
        return Err(CallsignError::TooLong {
            max: MAX_CALLSIGN_LEN,
        });
    }
    let bad: String = upper
        .chars()
        .filter(|c| !(c.is_ascii_alphanumeric() || *c == '-'))
        .collect();
    if !bad.is_empty() {
        return Err(CallsignError::InvalidCharacters { chars: bad });
    }
    let (base, ssid) = match upper.split_once('-') {
        Some((base, ssid)) => (base, Some(ssid)),
        None => (upper.as_str(), None),
    };
    if base.is_empty() {
        return Err(CallsignError::Empty);
    }
    if let Some(ssid) = ssid {
        if ssid.is_empty() || ssid.len() > 2 || ssid.contains('-') {
            return Err(CallsignError::InvalidSsid {
                ssid: ssid.to_string(),
            });
        }
    }
    Ok(upper)
}
