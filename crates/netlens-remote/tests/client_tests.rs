// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use netlens_app::{AlertId, Endpoint, ProfileId, TimeWindowId, ViewKind};
use netlens_remote::Client;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

fn json_response(body: &str, status: u16) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        )
}

#[test]
fn unreachable_backend_error_names_the_server() {
    let client = Client::new("http://127.0.0.1:1", Duration::from_millis(50))
        .expect("client should initialize");

    let error = client
        .ping()
        .expect_err("ping should fail for unreachable endpoint");
    let message = error.to_string();
    assert!(message.contains("cannot reach http://127.0.0.1:1/"));
    assert!(message.contains("analysis web server"));
}

#[test]
fn fetch_rows_reads_data_envelope() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/analysis/timeline/192.168.1.5/timewindow2");
        let body = r#"{"data":[
            {"timestamp":"2026/01/05 11:00:01","daddr":"8.8.8.8","info":{"query":"example.com"}},
            {"timestamp":"2026/01/05 11:00:07","daddr":"1.1.1.1"}
        ]}"#;
        request
            .respond(json_response(body, 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let rows = client.fetch_rows(&Endpoint::View {
        view: ViewKind::Timeline,
        profile: ProfileId::from("192.168.1.5"),
        time_window: TimeWindowId::from("timewindow2"),
    })?;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].text("daddr").as_deref(), Some("8.8.8.8"));
    assert_eq!(
        rows[0].detail_pairs("info"),
        Some(vec![("Query".to_owned(), "example.com".to_owned())])
    );

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn fetch_rows_requests_nested_evidence_route() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/analysis/evidence/192.168.1.5/tw1/7");
        request
            .respond(json_response(
                r#"{"data":[{"type_evidence":"PortScan","confidence":0.8}]}"#,
                200,
            ))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let rows = client.fetch_rows(&Endpoint::Evidence {
        profile: ProfileId::from("192.168.1.5"),
        time_window: TimeWindowId::from("tw1"),
        alert: AlertId::from("7"),
    })?;
    assert_eq!(rows[0].text("type_evidence").as_deref(), Some("PortScan"));

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn missing_data_key_yields_no_rows() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/analysis/profiles_tws");
        request
            .respond(json_response("{}", 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    assert_eq!(client.ping()?, 0);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn server_error_message_is_surfaced() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response(r#"{"error":"redis unavailable"}"#, 503))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let error = client
        .fetch_rows(&Endpoint::Info {
            key: "8.8.8.8".to_owned(),
        })
        .expect_err("503 should fail");
    assert_eq!(error.to_string(), "server error (503): redis unavailable");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn malformed_body_reports_route() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response("not json", 200))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let error = client
        .fetch_rows(&Endpoint::TimeWindows {
            profile: ProfileId::from("10.0.0.1"),
        })
        .expect_err("decode should fail");
    assert!(error.to_string().contains("/analysis/tws/10.0.0.1"));

    handle.join().expect("server thread should join");
    Ok(())
}
