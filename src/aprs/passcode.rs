//! APRS-IS login passcode derivation.

/// Derive the APRS-IS passcode for `callsign`.
///
/// Only the base callsign counts: any `-SSID` suffix is dropped and the rest
/// is upper-cased before hashing. Bytes are folded in pairs, the first of
/// each pair into the high byte and the second into the low byte of a
/// 16-bit hash seeded with `0x73E2`.
pub fn generate(callsign: &str) -> u32 {
    let base = base_callsign(callsign);
    let mut hash: i32 = 0x73E2;
    for pair in base.as_bytes().chunks(2) {
        hash ^= (pair[0] as i32) << 8;
        if let Some(&low) = pair.get(1) {
            hash ^= low as i32;
        }
    }
    hash.unsigned_abs()
}

/// Callsign with any SSID removed, upper-cased.
pub fn base_callsign(callsign: &str) -> String {
    callsign
        .trim()
        .split('-')
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ssid_and_case_do_not_change_passcode() {
        let plain = generate("N0CALL");
        assert_eq!(generate("n0call"), plain);
        assert_eq!(generate("N0CALL-10"), plain);
    }

    #[test]
    fn known_values() {
        // 0x73E2 ^ ('N' << 8) ^ '0' ^ ('C' << 8) ^ 'A' ^ ('L' << 8) ^ 'L'
        let expected = 0x73E2 ^ (0x4E << 8) ^ 0x30 ^ (0x43 << 8) ^ 0x41 ^ (0x4C << 8) ^ 0x4C;
        assert_eq!(generate("N0CALL"), expected as u32);
        // Odd length: last byte only touches the high half.
        let expected = 0x73E2 ^ (0x41 << 8) ^ 0x42 ^ (0x43 << 8);
        assert_eq!(generate("ABC"), expected as u32);
        assert_eq!(generate(""), 0x73E2);
    }
}
