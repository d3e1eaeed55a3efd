// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use netlens_app::{Endpoint, FetchRequest, Row};
use netlens_remote::Client;
use netlens_testkit::DemoBackend;
use netlens_tui::{AppRuntime, InternalEvent, fetch_completed};
use std::sync::mpsc::Sender;
use std::thread;

/// Talks to the analysis web server. Each fetch runs on its own thread so
/// slow routes never block key handling.
pub struct HttpRuntime {
    client: Client,
}

impl HttpRuntime {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

impl AppRuntime for HttpRuntime {
    fn fetch_rows(&mut self, endpoint: &Endpoint) -> Result<Vec<Row>> {
        self.client.fetch_rows(endpoint)
    }

    fn spawn_fetch(&mut self, request: FetchRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let client = self.client.clone();
        thread::Builder::new()
            .name(format!("fetch-{}", request.table))
            .spawn(move || {
                let result = client.fetch_rows(&request.endpoint);
                if let Err(error) = &result {
                    tracing::warn!(path = %request.endpoint.path(), error = %format!("{error:#}"), "fetch failed");
                }
                let _ = tx.send(InternalEvent::Fetch(fetch_completed(&request, result)));
            })
            .map_err(|error| anyhow!("spawn fetch thread: {error}"))?;
        Ok(())
    }
}

/// Serves seeded traffic from memory for `--demo`.
pub struct DemoRuntime {
    backend: DemoBackend,
}

impl DemoRuntime {
    pub fn new(backend: DemoBackend) -> Self {
        Self { backend }
    }
}

impl AppRuntime for DemoRuntime {
    fn fetch_rows(&mut self, endpoint: &Endpoint) -> Result<Vec<Row>> {
        self.backend.rows(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::{DemoRuntime, HttpRuntime};
    use anyhow::{Result, anyhow};
    use netlens_app::{
        Endpoint, FetchOutcome, FetchRequest, ProfileId, TableHandle, TimeWindowId, ViewKind,
    };
    use netlens_remote::Client;
    use netlens_testkit::{DEMO_SEED, DemoBackend};
    use netlens_tui::{AppRuntime, InternalEvent};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;
    use tiny_http::{Response, Server};

    #[test]
    fn http_runtime_reports_rows_on_channel() -> Result<()> {
        let server =
            Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
        let addr = format!("http://{}", server.server_addr());
        let handle = thread::spawn(move || {
            let request = server.recv().expect("request expected");
            assert_eq!(request.url(), "/analysis/alerts/10.0.0.9/timewindow4");
            request
                .respond(Response::from_string(r#"{"data":[{"alert_id":"1"}]}"#))
                .expect("response should succeed");
        });

        let mut runtime = HttpRuntime::new(Client::new(&addr, Duration::from_secs(1))?);
        let (tx, rx) = mpsc::channel();
        runtime.spawn_fetch(
            FetchRequest {
                table: TableHandle::new(3),
                endpoint: Endpoint::View {
                    view: ViewKind::Alerts,
                    profile: ProfileId::from("10.0.0.9"),
                    time_window: TimeWindowId::from("timewindow4"),
                },
                generation: 2,
            },
            tx,
        )?;

        let InternalEvent::Fetch(completed) = rx.recv_timeout(Duration::from_secs(5))? else {
            panic!("expected fetch completion");
        };
        assert_eq!(completed.table, TableHandle::new(3));
        assert_eq!(completed.generation, 2);
        let FetchOutcome::Rows { rows, .. } = completed.outcome else {
            panic!("expected rows");
        };
        assert_eq!(rows[0].text("alert_id").as_deref(), Some("1"));

        handle.join().expect("server thread should join");
        Ok(())
    }

    #[test]
    fn http_runtime_reports_failures_on_channel() -> Result<()> {
        let mut runtime =
            HttpRuntime::new(Client::new("http://127.0.0.1:1", Duration::from_millis(50))?);
        let (tx, rx) = mpsc::channel();
        runtime.spawn_fetch(
            FetchRequest {
                table: TableHandle::new(1),
                endpoint: Endpoint::Profiles,
                generation: 1,
            },
            tx,
        )?;

        let InternalEvent::Fetch(completed) = rx.recv_timeout(Duration::from_secs(5))? else {
            panic!("expected fetch completion");
        };
        let FetchOutcome::Failed { error } = completed.outcome else {
            panic!("expected failure");
        };
        assert!(error.contains("cannot reach"));
        Ok(())
    }

    #[test]
    fn demo_runtime_serves_profiles_inline() -> Result<()> {
        let mut runtime = DemoRuntime::new(DemoBackend::seeded(DEMO_SEED));
        let (tx, rx) = mpsc::channel();
        runtime.spawn_fetch(
            FetchRequest {
                table: TableHandle::new(1),
                endpoint: Endpoint::Profiles,
                generation: 1,
            },
            tx,
        )?;

        let InternalEvent::Fetch(completed) = rx.try_recv()? else {
            panic!("expected fetch completion");
        };
        let FetchOutcome::Rows { rows, .. } = completed.outcome else {
            panic!("expected rows");
        };
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].text("profile").as_deref(), Some("192.168.1.5"));
        Ok(())
    }
}
