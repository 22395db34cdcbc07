//! APRS-IS login handshake and line transport over mock and in-memory streams.

use std::time::Duration;

use aprsbbs::aprs::client::{self, AprsConnection, ControlMessage, LoginParams};
use aprsbbs::bbs::BbsServer;
use aprsbbs::config::Config;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

fn login() -> LoginParams {
    LoginParams {
        callsign: "BBSCALL".into(),
        passcode: 12345,
        software_name: "APRSBBS".into(),
        software_version: "0.1.0".into(),
        filter: "filter m/BBSCALL".into(),
    }
}

#[tokio::test]
async fn login_line_is_crlf_terminated() {
    let mut mock = tokio_test::io::Builder::new()
        .write(b"user BBSCALL pass 12345 vers APRSBBS 0.1.0 filter m/BBSCALL\r\n")
        .build();
    client::send_login(&mut mock, &login()).await.expect("login");
}

#[tokio::test]
async fn banner_is_optional() {
    let mock = tokio_test::io::Builder::new()
        .read(b"# logresp BBSCALL verified, server T2TEST\r\n")
        .build();
    let mut reader = BufReader::new(mock);
    let banner = client::read_banner(&mut reader, Duration::from_secs(1)).await;
    assert_eq!(banner.as_deref(), Some("# logresp BBSCALL verified, server T2TEST"));

    let mut eof = BufReader::new(tokio_test::io::Builder::new().build());
    assert_eq!(client::read_banner(&mut eof, Duration::from_secs(1)).await, None);
}

#[tokio::test]
async fn reader_skips_comments_and_blank_lines() {
    let mock = tokio_test::io::Builder::new()
        .read(b"# aprsc 2.1.14\r\n")
        .read(b"\r\n")
        .read(b"N0CALL>APRS,TCPIP*::BBSCALL  :login\r\n")
        .read(b"W1AW>APRS:>status\n")
        .build();
    let (tx, mut rx) = mpsc::unbounded_channel();
    client::read_lines(BufReader::new(mock), tx).await;

    assert_eq!(rx.recv().await.as_deref(), Some("N0CALL>APRS,TCPIP*::BBSCALL  :login"));
    assert_eq!(rx.recv().await.as_deref(), Some("W1AW>APRS:>status"));
    // Reader ended at EOF, so the channel is closed.
    assert_eq!(rx.recv().await, None);
}

#[tokio::test]
async fn writer_appends_crlf_and_drains_on_shutdown() {
    let mock = tokio_test::io::Builder::new()
        .write(b"BBSCALL>APRS,TCPIP*::N0CALL   :one\r\n")
        .write(b"BBSCALL>APRS,TCPIP*::N0CALL   :two\r\n")
        .build();
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (ctrl_tx, ctrl_rx) = mpsc::unbounded_channel();
    out_tx.send("BBSCALL>APRS,TCPIP*::N0CALL   :one".to_string()).unwrap();
    out_tx.send("BBSCALL>APRS,TCPIP*::N0CALL   :two".to_string()).unwrap();
    ctrl_tx.send(ControlMessage::Shutdown).unwrap();

    client::write_lines(mock, out_rx, ctrl_rx).await;
}

#[tokio::test]
async fn server_answers_over_a_live_stream() {
    let mut cfg = Config::default();
    cfg.bbs.callsign = "BBSCALL".into();
    let mut server = BbsServer::new(cfg).expect("server");

    let (client_side, mut relay) = tokio::io::duplex(16 * 1024);
    relay.write_all(b"# aprsc 2.1.14-g5e22b37\r\n").await.unwrap();

    let conn = AprsConnection::from_stream(client_side, &server.login_params(), Duration::from_secs(1))
        .await
        .expect("login");
    assert_eq!(conn.banner.as_deref(), Some("# aprsc 2.1.14-g5e22b37"));
    server.attach(conn);

    relay
        .write_all(b"N0CALL>APRS,TCPIP*::BBSCALL  :msg N1CALL hello there{9\r\n")
        .await
        .unwrap();
    relay
        .write_all(b"N1CALL>APRS,TCPIP*::BBSCALL  :login\r\n")
        .await
        .unwrap();
    // Closing our side ends the run loop once both lines are handled.
    relay.shutdown().await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), server.run())
        .await
        .expect("run finished")
        .expect("run ok");

    let mut lines = BufReader::new(relay).lines();
    let mut received = Vec::new();
    for _ in 0..4 {
        let line = tokio::time::timeout(Duration::from_secs(1), lines.next_line())
            .await
            .expect("line in time")
            .expect("read")
            .expect("line present");
        received.push(line);
    }
    assert_eq!(
        received,
        vec![
            format!(
                "user BBSCALL pass {} vers APRSBBS {} filter m/BBSCALL",
                aprsbbs::aprs::passcode::generate("BBSCALL"),
                env!("CARGO_PKG_VERSION")
            ),
            "BBSCALL>APRS,TCPIP*::N0CALL   :Stored message for N1CALL.".to_string(),
            "BBSCALL>APRS,TCPIP*::N0CALL   :ack9".to_string(),
            "BBSCALL>APRS,TCPIP*::N1CALL   :From N0CALL: hello there{01".to_string(),
        ]
    );
    assert_eq!(server.session().acks().pending_len(), 1);
    assert_eq!(server.session().metrics().acks_sent, 1);
}
