//! APRS-IS TCP transport.
//!
//! Connects to a relay, sends the login line straight away (servers differ on
//! whether and when they send a banner, so we never block on it), reads at
//! most one banner/logresp line with a short timeout, then splits the socket
//! into a reader task and a writer task that talk to the rest of the program
//! over unbounded channels.
//!
//! There is no reconnect logic here: when the relay closes the
//! connection the reader task ends and its channel closes.
use log::{debug, error, info, trace, warn};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::AprsError;
use crate::logutil::escape_log;

/// Values that make up the APRS-IS login line.
#[derive(Debug, Clone)]
pub struct LoginParams {
    pub callsign: String,
    pub passcode: u32,
    pub software_name: String,
    pub software_version: String,
    pub filter: String,
}

impl LoginParams {
    /// `user CALL pass CODE vers NAME VERSION FILTER`
    pub fn login_line(&self) -> String {
        format!(
            "user {} pass {} vers {} {} {}",
            self.callsign.to_ascii_uppercase(),
            self.passcode,
            self.software_name,
            self.software_version,
            self.filter
        )
    }
}

/// Where and how to connect.
#[derive(Debug, Clone)]
pub struct ConnectParams {
    pub host: String,
    pub port: u16,
    pub ipv4_only: bool,
    pub connect_timeout: Duration,
    pub banner_timeout: Duration,
}

/// Control messages for the writer task
#[derive(Debug)]
pub enum ControlMessage {
    Shutdown,
}

/// A logged-in APRS-IS session with its reader and writer tasks running.
pub struct AprsConnection {
    /// First line the server sent after login, if any arrived in time.
    pub banner: Option<String>,
    inbound_rx: mpsc::UnboundedReceiver<String>,
    outgoing_tx: mpsc::UnboundedSender<String>,
    control_tx: mpsc::UnboundedSender<ControlMessage>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl AprsConnection {
    /// Resolve, connect (IPv4 addresses first) and log in.
    pub async fn connect(params: &ConnectParams, login: &LoginParams) -> Result<Self, AprsError> {
        info!(
            "Connecting to APRS-IS server {}:{} as {}",
            params.host, params.port, login.callsign
        );
        let addrs = resolve(&params.host, params.port, params.ipv4_only).await?;
        for addr in addrs {
            match tokio::time::timeout(params.connect_timeout, TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => {
                    info!("Connected to {}", addr);
                    return Self::from_stream(stream, login, params.banner_timeout).await;
                }
                Ok(Err(e)) => warn!("Connect attempt to {} failed: {}", addr, e),
                Err(_) => warn!(
                    "Connect attempt to {} timed out after {:?}",
                    addr, params.connect_timeout
                ),
            }
        }
        error!("Could not connect to {}:{}", params.host, params.port);
        Err(AprsError::Connect {
            host: params.host.clone(),
            port: params.port,
        })
    }

    /// Log in over an already-open stream and start the reader/writer tasks.
    pub async fn from_stream<S>(
        stream: S,
        login: &LoginParams,
        banner_timeout: Duration,
    ) -> Result<Self, AprsError>
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, mut write_half) = tokio::io::split(stream);
        send_login(&mut write_half, login).await?;
        let mut reader = BufReader::new(read_half);
        let banner = read_banner(&mut reader, banner_timeout).await;

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let reader = tokio::spawn(read_lines(reader, inbound_tx));
        let writer = tokio::spawn(write_lines(write_half, outgoing_rx, control_rx));

        Ok(Self {
            banner,
            inbound_rx,
            outgoing_tx,
            control_tx,
            reader,
            writer,
        })
    }

    /// Next inbound line; `None` once the connection is gone.
    pub async fn recv_line(&mut self) -> Option<String> {
        self.inbound_rx.recv().await
    }

    /// Queue a line (without terminator) for transmission.
    pub fn send_line(&self, line: String) -> bool {
        self.outgoing_tx.send(line).is_ok()
    }

    /// Stop the writer after it drains what is already queued, and drop the reader.
    pub async fn shutdown(self) {
        let _ = self.control_tx.send(ControlMessage::Shutdown);
        drop(self.outgoing_tx);
        if let Err(e) = self.writer.await {
            debug!("Writer task ended abnormally: {}", e);
        }
        self.reader.abort();
    }
}

async fn resolve(host: &str, port: u16, ipv4_only: bool) -> Result<Vec<SocketAddr>, AprsError> {
    let resolved = tokio::net::lookup_host((host, port))
        .await
        .map_err(|e| AprsError::Resolve {
            host: host.to_string(),
            port,
            reason: e.to_string(),
        })?;
    let addrs = order_addresses(resolved.collect(), ipv4_only);
    if addrs.is_empty() {
        return Err(AprsError::Resolve {
            host: host.to_string(),
            port,
            reason: "no usable addresses".to_string(),
        });
    }
    Ok(addrs)
}

/// IPv4 first, keeping resolver order within each family.
pub fn order_addresses(mut addrs: Vec<SocketAddr>, ipv4_only: bool) -> Vec<SocketAddr> {
    if ipv4_only {
        addrs.retain(|a| a.is_ipv4());
    }
    addrs.sort_by_key(|a| !a.is_ipv4());
    addrs
}

/// Write the login line terminated by CRLF.
pub async fn send_login<W>(writer: &mut W, login: &LoginParams) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let line = login.login_line();
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\r\n").await?;
    writer.flush().await?;
    debug!("Sent login line: {}", escape_log(&line));
    Ok(())
}

/// Read one line with a timeout. Timeouts, EOF and errors are all non-fatal.
pub async fn read_banner<R>(reader: &mut R, wait: Duration) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    match tokio::time::timeout(wait, reader.read_until(b'\n', &mut buf)).await {
        Ok(Ok(n)) if n > 0 => {
            let line = String::from_utf8_lossy(&buf).trim().to_string();
            if line.is_empty() {
                None
            } else {
                debug!("Server: {}", escape_log(&line));
                Some(line)
            }
        }
        Ok(Ok(_)) => None,
        Ok(Err(e)) => {
            debug!("Banner read failed: {}", e);
            None
        }
        Err(_) => {
            trace!("No banner within {:?}", wait);
            None
        }
    }
}

/// Reader loop: forwards every non-empty, non-comment line until EOF.
pub async fn read_lines<R>(mut reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => {
                warn!("Connection closed by server");
                break;
            }
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf).trim().to_string();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                debug!("RX: {}", escape_log(&line));
                if tx.send(line).is_err() {
                    debug!("Inbound channel closed; stopping reader");
                    break;
                }
            }
            Err(e) => {
                error!("Error reading from APRS-IS: {}", e);
                break;
            }
        }
    }
}

/// Writer loop: appends CRLF to each queued line. A failed write is logged
/// and the line dropped.
pub async fn write_lines<W>(
    mut writer: W,
    mut outgoing_rx: mpsc::UnboundedReceiver<String>,
    mut control_rx: mpsc::UnboundedReceiver<ControlMessage>,
) where
    W: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            biased;
            line = outgoing_rx.recv() => {
                match line {
                    Some(line) => write_one(&mut writer, &line).await,
                    None => break,
                }
            }
            ctrl = control_rx.recv() => {
                match ctrl {
                    Some(ControlMessage::Shutdown) | None => {
                        while let Ok(line) = outgoing_rx.try_recv() {
                            write_one(&mut writer, &line).await;
                        }
                        info!("Writer task received shutdown signal");
                        break;
                    }
                }
            }
        }
    }
}

async fn write_one<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) {
    let mut packet = Vec::with_capacity(line.len() + 2);
    packet.extend_from_slice(line.as_bytes());
    packet.extend_from_slice(b"\r\n");
    let result = async {
        writer.write_all(&packet).await?;
        writer.flush().await
    }
    .await;
    match result {
        Ok(()) => debug!("TX: {}", escape_log(line)),
        Err(e) => error!("Failed to send '{}': {}", escape_log(line), e),
    }
}
