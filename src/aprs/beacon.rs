//! Periodic APRS object beacon announcing the BBS on the map.
//!
//! The beacon is a stateless producer of one fixed object report. It shares
//! the line formatter with the message core but none of its stores; the
//! server drives it from its housekeeping tick.
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

use super::codec::{format_raw, ADDRESSEE_WIDTH};
use crate::config::BeaconConfig;

/// Object report contents.
#[derive(Debug, Clone)]
pub struct ObjectBeacon {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub symbol_table: char,
    pub symbol_code: char,
    pub comment: String,
}

impl ObjectBeacon {
    pub fn from_config(cfg: &BeaconConfig) -> Self {
        Self {
            name: cfg.name.clone(),
            latitude: cfg.latitude,
            longitude: cfg.longitude,
            symbol_table: cfg.symbol_table.chars().next().unwrap_or('/'),
            symbol_code: cfg.symbol_code.chars().next().unwrap_or('B'),
            comment: cfg.comment.clone(),
        }
    }

    /// Object information field: `;NAME_____*DDHHMMzLAT T LON C comment`.
    pub fn information(&self, now: DateTime<Utc>) -> String {
        let name: String = self.name.chars().take(ADDRESSEE_WIDTH).collect();
        format!(
            ";{:<width$}*{}{}{}{}{}{}",
            name,
            now.format("%d%H%Mz"),
            format_latitude(self.latitude),
            self.symbol_table,
            format_longitude(self.longitude),
            self.symbol_code,
            self.comment,
            width = ADDRESSEE_WIDTH
        )
    }

    /// Complete wire line originated by `our_call`.
    pub fn line(&self, our_call: &str, now: DateTime<Utc>) -> String {
        format_raw(our_call, &self.information(now))
    }
}

/// `DDMM.mmN` / `DDMM.mmS`.
pub fn format_latitude(lat: f64) -> String {
    let hemisphere = if lat < 0.0 { 'S' } else { 'N' };
    let (deg, min) = degrees_minutes(lat.abs().min(90.0));
    format!("{:02}{:05.2}{}", deg, min, hemisphere)
}

/// `DDDMM.mmE` / `DDDMM.mmW`.
pub fn format_longitude(lon: f64) -> String {
    let hemisphere = if lon < 0.0 { 'W' } else { 'E' };
    let (deg, min) = degrees_minutes(lon.abs().min(180.0));
    format!("{:03}{:05.2}{}", deg, min, hemisphere)
}

fn degrees_minutes(value: f64) -> (u32, f64) {
    let mut deg = value.trunc() as u32;
    // Round to hundredths first so 59.999 does not print as "60.00".
    let mut min = ((value - value.trunc()) * 60.0 * 100.0).round() / 100.0;
    if min >= 60.0 {
        deg += 1;
        min = 0.0;
    }
    (deg, min)
}

/// Interval bookkeeping for the beacon timer.
#[derive(Debug)]
pub struct BeaconSchedule {
    interval: Duration,
    last_sent: Option<Instant>,
}

impl BeaconSchedule {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_sent: None,
        }
    }

    /// True when a beacon is due at `now`; the first beacon is due at once.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_sent {
            None => true,
            Some(last) => now.duration_since(last) >= self.interval,
        }
    }

    pub fn mark_sent(&mut self, now: Instant) {
        self.last_sent = Some(now);
    }
}
