use anyhow::{anyhow, Result};
use log::{debug, info, warn};
use tokio::time::{Duration, Instant};

use super::session::Session;
use crate::aprs::beacon::{BeaconSchedule, ObjectBeacon};
use crate::aprs::client::{AprsConnection, ConnectParams, LoginParams};
use crate::config::Config;

/// # BBS Server
///
/// Runs the BBS against a live APRS-IS connection: feeds every received line
/// into the [Session], queues its replies on the transport writer, and fires
/// the optional object beacon from a housekeeping tick.
///
/// ```text
/// ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
/// │  reader task    │───→│   BbsServer     │───→│  writer task    │
/// │  (lines in)     │    │   + Session     │    │  (lines out)    │
/// └─────────────────┘    └─────────────────┘    └─────────────────┘
///                               ↑
///                        beacon tick / ctrl-c
/// ```
///
/// ## Usage
///
/// ```rust,no_run
/// use aprsbbs::bbs::BbsServer;
/// use aprsbbs::config::Config;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = Config::load("config.toml").await?;
///     let mut server = BbsServer::new(config)?;
///     server.connect().await?;
///     server.run().await
/// }
/// ```
///
/// The session is only ever touched from the `run` loop, so the stores need
/// no locking. There is no reconnect: when the relay drops the connection,
/// `run` returns.
pub struct BbsServer {
    config: Config,
    session: Session,
    connection: Option<AprsConnection>,
    beacon: Option<(ObjectBeacon, BeaconSchedule)>,
}

impl BbsServer {
    /// Validate the configuration and build an unconnected server.
    pub fn new(mut config: Config) -> Result<Self> {
        config.validate()?;
        let session = Session::from_config(&config);
        let beacon = if config.beacon.enabled {
            let interval = Duration::from_secs(config.beacon.interval_minutes * 60);
            Some((
                ObjectBeacon::from_config(&config.beacon),
                BeaconSchedule::new(interval),
            ))
        } else {
            None
        };
        Ok(Self {
            config,
            session,
            connection: None,
            beacon,
        })
    }

    pub fn login_params(&self) -> LoginParams {
        LoginParams {
            callsign: self.config.bbs.callsign.clone(),
            passcode: self.config.effective_passcode(),
            software_name: self.config.bbs.software_name.clone(),
            software_version: self.config.bbs.software_version.clone(),
            filter: self.config.effective_filter(),
        }
    }

    pub fn connect_params(&self) -> ConnectParams {
        let aprs = &self.config.aprs_is;
        ConnectParams {
            host: aprs.server.clone(),
            port: aprs.port,
            ipv4_only: aprs.ipv4_only,
            connect_timeout: Duration::from_secs(aprs.connect_timeout_secs),
            banner_timeout: Duration::from_secs(aprs.banner_timeout_secs),
        }
    }

    /// Connect and log in to the configured APRS-IS server.
    pub async fn connect(&mut self) -> Result<()> {
        let conn = AprsConnection::connect(&self.connect_params(), &self.login_params()).await?;
        if let Some(banner) = &conn.banner {
            info!("APRS-IS: {}", banner);
        }
        self.connection = Some(conn);
        Ok(())
    }

    /// Use an already established connection.
    pub fn attach(&mut self, conn: AprsConnection) {
        self.connection = Some(conn);
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Main event loop. Returns on ctrl-c or when the connection closes.
    pub async fn run(&mut self) -> Result<()> {
        let mut conn = self
            .connection
            .take()
            .ok_or_else(|| anyhow!("BBS server is not connected"))?;
        info!("BBS {} running", self.session.callsign());

        let mut periodic = tokio::time::interval(Duration::from_secs(1));
        periodic.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                line = conn.recv_line() => {
                    match line {
                        Some(line) => {
                            for out in self.session.handle_line(&line) {
                                if !conn.send_line(out) {
                                    warn!("Writer channel closed; dropping reply");
                                }
                            }
                        }
                        None => {
                            warn!("APRS-IS connection lost; stopping");
                            break;
                        }
                    }
                }
                _ = periodic.tick() => {
                    if let Some(line) = self.due_beacon(Instant::now()) {
                        info!("Sending object beacon");
                        if !conn.send_line(line) {
                            warn!("Writer channel closed; beacon dropped");
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        conn.shutdown().await;
        self.log_stats();
        Ok(())
    }

    /// Beacon line if one is enabled and due at `now`.
    fn due_beacon(&mut self, now: Instant) -> Option<String> {
        let (beacon, schedule) = self.beacon.as_mut()?;
        let now = now.into_std();
        if !schedule.is_due(now) {
            return None;
        }
        schedule.mark_sent(now);
        Some(beacon.line(&self.config.bbs.callsign, chrono::Utc::now()))
    }

    fn log_stats(&self) {
        let m = self.session.metrics();
        match serde_json::to_string(&m) {
            Ok(json) => info!("Session stats: {}", json),
            Err(e) => debug!("Could not serialize stats: {}", e),
        }
        info!(
            "{} message(s) still waiting in mailboxes, {} group(s), {} unacknowledged",
            self.session.mailboxes().total_pending(),
            self.session.groups().len(),
            self.session.acks().pending_len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_params_follow_config() {
        let mut cfg = Config::default();
        cfg.bbs.callsign = "n0call-10".into();
        cfg.bbs.software_version = "9.9".into();
        let server = BbsServer::new(cfg).unwrap();
        let login = server.login_params();
        assert_eq!(login.callsign, "N0CALL-10");
        assert_eq!(
            login.login_line(),
            format!(
                "user N0CALL-10 pass {} vers APRSBBS 9.9 filter m/N0CALL-10",
                crate::aprs::passcode::generate("N0CALL")
            )
        );
    }

    #[test]
    fn beacon_only_when_enabled_and_due() {
        let mut cfg = Config::default();
        let mut server = BbsServer::new(cfg.clone()).unwrap();
        assert!(server.due_beacon(Instant::now()).is_none());

        cfg.beacon.enabled = true;
        cfg.beacon.interval_minutes = 10;
        let mut server = BbsServer::new(cfg).unwrap();
        let t0 = Instant::now();
        let line = server.due_beacon(t0).expect("first beacon due");
        assert!(line.starts_with("N0CALL>APRS,TCPIP*:;BBS      *"));
        assert!(server.due_beacon(t0 + Duration::from_secs(60)).is_none());
        assert!(server.due_beacon(t0 + Duration::from_secs(600)).is_some());
    }

    #[tokio::test]
    async fn run_requires_connection() {
        let mut server = BbsServer::new(Config::default()).unwrap();
        assert!(server.run().await.is_err());
    }
}
