// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use netlens_app::{Endpoint, ProfileId, Row, TimeWindowId, ViewKind};
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use time::macros::{datetime, format_description};
use time::{Duration, OffsetDateTime};

pub const DEMO_SEED: u64 = 7;

/// (address, country, ASN org, reverse DNS)
const REMOTE_HOSTS: [(&str, &str, &str, &str); 10] = [
    ("8.8.8.8", "US", "GOOGLE", "dns.google"),
    ("1.1.1.1", "AU", "CLOUDFLARENET", "one.one.one.one"),
    ("151.101.1.69", "US", "FASTLY", "-"),
    ("185.199.108.153", "US", "GITHUB", "cdn-185-199-108-153.github.com"),
    ("93.184.216.34", "US", "EDGECAST", "-"),
    ("195.113.232.90", "CZ", "CESNET", "-"),
    ("45.33.32.156", "US", "LINODE-AP", "scanme.nmap.org"),
    ("91.189.91.38", "GB", "CANONICAL", "-"),
    ("140.82.121.4", "DE", "GITHUB", "lb-140-82-121-4-fra.github.com"),
    ("77.75.75.172", "CZ", "SEZNAM", "www.seznam.cz"),
];

/// (service, port/proto)
const SERVICES: [(&str, &str); 6] = [
    ("dns", "53/udp"),
    ("https", "443/tcp"),
    ("http", "80/tcp"),
    ("ssh", "22/tcp"),
    ("ntp", "123/udp"),
    ("smtp", "25/tcp"),
];

const DOMAINS: [&str; 8] = [
    "example.com",
    "updates.vendor.test",
    "cdn.assets.test",
    "api.telemetry.test",
    "mail.corp.test",
    "time.pool.test",
    "login.portal.test",
    "static.news.test",
];

const CONNECTION_STATES: [&str; 4] = ["Established", "Not Established", "Closed", "Rejected"];

/// (evidence type, category, description prefix)
const EVIDENCE_KINDS: [(&str, &str, &str); 6] = [
    (
        "PortScanType2",
        "Recon.Scanning",
        "horizontal port scan to port 23/TCP",
    ),
    (
        "MaliciousJA3",
        "Intrusion.Botnet",
        "malicious JA3 fingerprint seen towards",
    ),
    (
        "LongConnection",
        "Anomaly.Connection",
        "long connection to",
    ),
    ("SSHSuccessful", "Attempt.Login", "SSH successful to"),
    (
        "ThreatIntelligenceBlacklistIP",
        "Intrusion.Botnet",
        "connection to blacklisted IP",
    ),
    (
        "DNSWithoutConnection",
        "Anomaly.Traffic",
        "domain resolved without a following connection to",
    ),
];

const THREAT_LEVELS: [&str; 5] = ["info", "low", "medium", "high", "critical"];

const TUPLE_BEHAVIORS: [&str; 5] = ["88*y.y.y.", "11.R.R.R.", "44,C,C,C,", "99+z+z+z+", "5.5.5.a."];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn chance(&mut self, percent: u64) -> bool {
        self.next_u64() % 100 < percent
    }
}

/// Seeded generator of backend-shaped rows.
#[derive(Debug, Clone)]
pub struct TrafficFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl TrafficFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn int_range(&mut self, min: usize, max: usize) -> usize {
        if max <= min {
            return min;
        }
        min + self.rng.int_n(max - min + 1)
    }

    pub fn remote_address(&mut self) -> &'static str {
        REMOTE_HOSTS[self.rng.int_n(REMOTE_HOSTS.len())].0
    }

    pub fn timeline_row(&mut self, at: OffsetDateTime, daddr: &str) -> Row {
        let (service, port_proto) = SERVICES[self.rng.int_n(SERVICES.len())];
        let sent = self.int_range(60, 48_000);
        let received = self.int_range(0, 120_000);
        let state = self.pick(&CONNECTION_STATES);
        let warning = if state == "Rejected" {
            "connection refused by remote host"
        } else {
            ""
        };

        let mut row = Row::from_pairs([
            ("timestamp", json!(display_timestamp(at))),
            ("dport_name", json!(service.to_uppercase())),
            ("preposition", json!("to")),
            ("daddr", json!(daddr)),
            ("dport/proto", json!(port_proto)),
            ("state", json!(state)),
            ("Sent", json!(sent)),
            ("Recv", json!(received)),
            ("Tot", json!(sent + received)),
            ("Duration", json!(format!("{:.2}", self.rng.int_n(9_000) as f64 / 100.0))),
            ("warning", json!(warning)),
        ]);
        if let Some(info) = self.service_info(service) {
            row = row.with("info", info);
        }
        row
    }

    pub fn flow_row(&mut self, at: OffsetDateTime, saddr: &str, daddr: &str) -> Row {
        let (_, port_proto) = SERVICES[self.rng.int_n(SERVICES.len())];
        let (dport, proto) = port_proto.split_once('/').unwrap_or((port_proto, "tcp"));
        let packets = self.int_range(1, 400);
        Row::from_pairs([
            ("uid", json!(format!("C{:012x}", self.rng.next_u64() >> 16))),
            ("ts", json!(display_timestamp(at))),
            ("dur", json!(format!("{:.5}", self.rng.int_n(600_000) as f64 / 1000.0))),
            ("saddr", json!(saddr)),
            ("sport", json!(self.int_range(32_768, 60_999))),
            ("daddr", json!(daddr)),
            ("dport", json!(dport)),
            ("proto", json!(proto)),
            ("state", json!(self.pick(&["S0", "SF", "REJ", "RSTO"]))),
            ("pkts", json!(packets)),
            ("allbytes", json!(packets * self.int_range(60, 1_400))),
        ])
    }

    pub fn tuple_row(&mut self, address: &str) -> Row {
        let (_, port_proto) = SERVICES[self.rng.int_n(SERVICES.len())];
        let (port, proto) = port_proto.split_once('/').unwrap_or((port_proto, "tcp"));
        let info = ip_info_row(address);
        let mut row = Row::from_pairs([
            ("tuple", json!(format!("{address}-{port}-{proto}"))),
            ("string", json!(self.pick(&TUPLE_BEHAVIORS))),
        ]);
        for (field, value) in info.fields().filter(|(field, _)| field.as_str() != "ip") {
            row = row.with(field.clone(), value.clone());
        }
        row
    }

    pub fn evidence_row(&mut self, at: OffsetDateTime, target: &str) -> Row {
        let (kind, category, description) = EVIDENCE_KINDS[self.rng.int_n(EVIDENCE_KINDS.len())];
        let confidence = self.int_range(2, 10) as f64 / 10.0;
        let tag = if self.rng.chance(30) { "CC" } else { "-" };
        Row::from_pairs([
            ("stime", json!(display_timestamp(at))),
            ("type_evidence", json!(kind)),
            ("confidence", json!(confidence)),
            ("threat_level", json!(self.pick(&THREAT_LEVELS))),
            ("category", json!(category)),
            ("source_target_tag", json!(tag)),
            ("description", json!(format!("{description} {target}"))),
        ])
    }

    fn service_info(&mut self, service: &str) -> Option<Value> {
        match service {
            "dns" => {
                let query = self.pick(&DOMAINS);
                Some(json!({
                    "query": query,
                    "answers": [self.remote_address()],
                }))
            }
            "http" => Some(json!({
                "host": self.pick(&DOMAINS),
                "method": "GET",
                "status_code": 200,
            })),
            "https" => Some(json!({ "server_name": self.pick(&DOMAINS) })),
            _ => None,
        }
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }
}

#[derive(Debug, Clone)]
struct DemoWindow {
    id: String,
    name: String,
    blocked: bool,
    views: BTreeMap<ViewKind, Vec<Row>>,
    alert_evidence: BTreeMap<String, Vec<Row>>,
}

#[derive(Debug, Clone)]
struct DemoProfile {
    address: String,
    windows: Vec<DemoWindow>,
}

impl DemoProfile {
    fn blocked(&self) -> bool {
        self.windows.iter().any(|window| window.blocked)
    }

    fn window(&self, id: &str) -> Option<&DemoWindow> {
        self.windows.iter().find(|window| window.id == id)
    }
}

/// In-memory stand-in for the analysis web server, answering every route
/// with generated data.
#[derive(Debug, Clone)]
pub struct DemoBackend {
    profiles: Vec<DemoProfile>,
    info: BTreeMap<String, Row>,
}

impl DemoBackend {
    pub fn seeded(seed: u64) -> Self {
        Self::generate(seed, 4, 3)
    }

    pub fn generate(seed: u64, profile_count: usize, windows_per_profile: usize) -> Self {
        let mut faker = TrafficFaker::new(seed);
        let mut next_alert = 1_u64;
        let mut addresses = BTreeSet::new();

        let profiles = (0..profile_count)
            .map(|index| {
                let address = format!("192.168.1.{}", 5 + index * 7);
                addresses.insert(address.clone());
                let windows = (0..windows_per_profile)
                    .map(|window| {
                        generate_window(
                            &mut faker,
                            &address,
                            window + 1,
                            &mut next_alert,
                            &mut addresses,
                        )
                    })
                    .collect();
                DemoProfile { address, windows }
            })
            .collect();

        let info = addresses
            .into_iter()
            .map(|address| {
                let row = ip_info_row(&address);
                (address, row)
            })
            .collect();

        Self { profiles, info }
    }

    pub fn profile_ids(&self) -> Vec<ProfileId> {
        self.profiles
            .iter()
            .map(|profile| ProfileId::new(profile.address.clone()))
            .collect()
    }

    pub fn time_window_ids(&self, profile: &ProfileId) -> Vec<TimeWindowId> {
        self.profile(profile.as_str())
            .map(|profile| {
                profile
                    .windows
                    .iter()
                    .map(|window| TimeWindowId::new(window.id.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Answers a route the way the web server would.
    pub fn rows(&self, endpoint: &Endpoint) -> Result<Vec<Row>> {
        match endpoint {
            Endpoint::Profiles => Ok(self
                .profiles
                .iter()
                .map(|profile| {
                    Row::from_pairs([
                        ("profile", json!(profile.address)),
                        ("blocked", json!(profile.blocked())),
                    ])
                })
                .collect()),
            Endpoint::TimeWindows { profile } => {
                let profile = self.require_profile(profile.as_str())?;
                Ok(profile
                    .windows
                    .iter()
                    .map(|window| {
                        Row::from_pairs([
                            ("tw", json!(window.id)),
                            ("name", json!(window.name)),
                            ("blocked", json!(window.blocked)),
                        ])
                    })
                    .collect())
            }
            Endpoint::View {
                view,
                profile,
                time_window,
            } => {
                let window = self.require_window(profile, time_window)?;
                Ok(window.views.get(view).cloned().unwrap_or_default())
            }
            Endpoint::Info { key } => Ok(vec![
                self.info
                    .get(key)
                    .cloned()
                    .unwrap_or_else(|| unknown_info_row(key)),
            ]),
            Endpoint::Evidence {
                profile,
                time_window,
                alert,
            } => {
                let window = self.require_window(profile, time_window)?;
                window
                    .alert_evidence
                    .get(alert.as_str())
                    .cloned()
                    .ok_or_else(|| anyhow!("unknown alert {alert} in {profile}/{time_window}"))
            }
        }
    }

    fn profile(&self, address: &str) -> Option<&DemoProfile> {
        self.profiles
            .iter()
            .find(|profile| profile.address == address)
    }

    fn require_profile(&self, address: &str) -> Result<&DemoProfile> {
        self.profile(address)
            .ok_or_else(|| anyhow!("unknown profile {address}"))
    }

    fn require_window(
        &self,
        profile: &ProfileId,
        time_window: &TimeWindowId,
    ) -> Result<&DemoWindow> {
        self.require_profile(profile.as_str())?
            .window(time_window.as_str())
            .ok_or_else(|| anyhow!("unknown time window {time_window} for {profile}"))
    }
}

fn generate_window(
    faker: &mut TrafficFaker,
    profile: &str,
    number: usize,
    next_alert: &mut u64,
    addresses: &mut BTreeSet<String>,
) -> DemoWindow {
    let start = fixture_datetime() + Duration::hours(number as i64 - 1);
    let id = format!("timewindow{number}");
    let name = format!("TW {number}:{}", display_timestamp(start));

    let mut timeline = Vec::new();
    let mut contacted = BTreeSet::new();
    for step in 0..faker.int_range(6, 12) {
        let daddr = faker.remote_address();
        contacted.insert(daddr);
        addresses.insert(daddr.to_owned());
        let at = start + Duration::seconds(step as i64 * 37);
        timeline.push(faker.timeline_row(at, daddr));
    }

    let flows = (0..faker.int_range(4, 8))
        .map(|step| {
            let daddr = faker.remote_address();
            addresses.insert(daddr.to_owned());
            faker.flow_row(start + Duration::seconds(step as i64 * 53), profile, daddr)
        })
        .collect::<Vec<_>>();

    let out_tuples = contacted
        .iter()
        .map(|address| faker.tuple_row(address))
        .collect::<Vec<_>>();
    let in_tuples = (0..faker.int_range(0, 3))
        .map(|_| {
            let source = faker.remote_address();
            addresses.insert(source.to_owned());
            faker.tuple_row(source)
        })
        .collect::<Vec<_>>();

    let mut alerts = Vec::new();
    let mut alert_evidence = BTreeMap::new();
    let mut all_evidence = Vec::new();
    let mut blocked = false;
    for _ in 0..faker.int_range(0, 2) {
        let alert_id = next_alert.to_string();
        *next_alert += 1;
        let raised = start + Duration::minutes(faker.int_range(5, 55) as i64);
        let evidence = (0..faker.int_range(1, 3))
            .map(|step| {
                let target = faker.remote_address();
                faker.evidence_row(raised - Duration::seconds(step as i64 * 90), target)
            })
            .collect::<Vec<_>>();
        blocked |= evidence.iter().any(|row| {
            matches!(
                row.text("threat_level").as_deref(),
                Some("high" | "critical")
            )
        });
        alerts.push(Row::from_pairs([
            ("alert", json!(display_timestamp(raised))),
            ("alert_id", json!(alert_id)),
            ("profileid", json!(profile)),
            ("timewindow", json!(name)),
            ("evidence_count", json!(evidence.len())),
        ]));
        all_evidence.extend(evidence.iter().cloned());
        alert_evidence.insert(alert_id, evidence);
    }
    for _ in 0..faker.int_range(0, 2) {
        let target = faker.remote_address();
        all_evidence.push(faker.evidence_row(start + Duration::minutes(42), target));
    }

    let views = BTreeMap::from([
        (ViewKind::Timeline, timeline),
        (ViewKind::TimelineFlows, flows),
        (ViewKind::Alerts, alerts),
        (ViewKind::InTuples, in_tuples),
        (ViewKind::OutTuples, out_tuples),
        (ViewKind::Evidence, all_evidence),
    ]);

    DemoWindow {
        id,
        name,
        blocked,
        views,
        alert_evidence,
    }
}

/// Info panel row for an address; every field is present and `-` when the
/// backend has nothing cached.
pub fn ip_info_row(address: &str) -> Row {
    let Some((_, country, asn, rdns)) = REMOTE_HOSTS
        .iter()
        .find(|(candidate, ..)| *candidate == address)
    else {
        return unknown_info_row(address);
    };
    let threat_intel = if *asn == "LINODE-AP" {
        "known scanner,medium threat level"
    } else {
        "-"
    };
    Row::from_pairs([
        ("ip", json!(address)),
        ("geocountry", json!(country)),
        ("asnorg", json!([asn])),
        ("reverse_dns", json!(rdns)),
        ("threat_intel", json!([threat_intel])),
        ("url", json!("-")),
        ("down_file", json!("-")),
        ("ref_file", json!("-")),
        ("com_file", json!("-")),
    ])
}

fn unknown_info_row(address: &str) -> Row {
    let mut row = Row::from_pairs([("ip", json!(address))]);
    for field in [
        "geocountry",
        "asnorg",
        "reverse_dns",
        "threat_intel",
        "url",
        "down_file",
        "ref_file",
        "com_file",
    ] {
        row = row.with(field, "-");
    }
    row
}

fn display_timestamp(at: OffsetDateTime) -> String {
    at.format(format_description!(
        "[year]/[month]/[day] [hour]:[minute]:[second]"
    ))
    .unwrap_or_default()
}

/// Rows shaped like the profile listing.
pub fn profile_rows(addresses: &[&str]) -> Vec<Row> {
    addresses
        .iter()
        .map(|address| Row::from_pairs([("profile", json!(address)), ("blocked", json!(false))]))
        .collect()
}

/// Rows shaped like a profile's time-window listing; names are upper-cased ids.
pub fn time_window_rows(ids: &[&str]) -> Vec<Row> {
    ids.iter()
        .map(|id| {
            Row::from_pairs([
                ("tw", json!(id)),
                ("name", json!(id.to_uppercase())),
                ("blocked", json!(false)),
            ])
        })
        .collect()
}

pub fn temp_config_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("config.toml");
    Ok((dir, path))
}

/// Start of the first generated time window.
pub fn fixture_datetime() -> OffsetDateTime {
    datetime!(2026-02-19 12:00:00 UTC)
}

#[cfg(test)]
mod tests {
    use super::{
        DEMO_SEED, DemoBackend, TrafficFaker, fixture_datetime, ip_info_row, time_window_rows,
    };
    use netlens_app::{
        AlertId, Endpoint, ProfileId, ProfileSummary, TimeWindow, TimeWindowId, ViewKind,
    };

    fn first_window(backend: &DemoBackend) -> (ProfileId, TimeWindowId) {
        let profile = backend.profile_ids().remove(0);
        let window = backend.time_window_ids(&profile).remove(0);
        (profile, window)
    }

    #[test]
    fn same_seed_generates_same_data() {
        let left = DemoBackend::seeded(42);
        let right = DemoBackend::seeded(42);
        let (profile, window) = first_window(&left);
        let endpoint = Endpoint::View {
            view: ViewKind::Timeline,
            profile,
            time_window: window,
        };
        assert_eq!(
            left.rows(&endpoint).expect("rows"),
            right.rows(&endpoint).expect("rows")
        );
    }

    #[test]
    fn faker_normalizes_zero_seed() {
        assert_eq!(TrafficFaker::new(0).seed(), 1);
    }

    #[test]
    fn profile_listing_parses_into_summaries() {
        let backend = DemoBackend::generate(DEMO_SEED, 3, 2);
        let rows = backend.rows(&Endpoint::Profiles).expect("profiles");
        let summaries = rows
            .iter()
            .filter_map(ProfileSummary::from_row)
            .collect::<Vec<_>>();
        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0].id, ProfileId::from("192.168.1.5"));
    }

    #[test]
    fn time_windows_carry_display_names() {
        let backend = DemoBackend::generate(DEMO_SEED, 1, 3);
        let rows = backend
            .rows(&Endpoint::TimeWindows {
                profile: ProfileId::from("192.168.1.5"),
            })
            .expect("time windows");
        let windows = rows
            .iter()
            .filter_map(TimeWindow::from_row)
            .collect::<Vec<_>>();
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].id, TimeWindowId::from("timewindow1"));
        assert_eq!(windows[0].name, "TW 1:2026/02/19 12:00:00");
        assert_eq!(windows[2].name, "TW 3:2026/02/19 14:00:00");
    }

    #[test]
    fn alert_evidence_counts_match_nested_rows() {
        let backend = DemoBackend::generate(DEMO_SEED, 4, 4);
        let mut alerts_seen = 0;
        for profile in backend.profile_ids() {
            for window in backend.time_window_ids(&profile) {
                let alerts = backend
                    .rows(&Endpoint::View {
                        view: ViewKind::Alerts,
                        profile: profile.clone(),
                        time_window: window.clone(),
                    })
                    .expect("alerts");
                for alert in alerts {
                    alerts_seen += 1;
                    let id = alert.text("alert_id").expect("alert id");
                    let evidence = backend
                        .rows(&Endpoint::Evidence {
                            profile: profile.clone(),
                            time_window: window.clone(),
                            alert: AlertId::new(id),
                        })
                        .expect("evidence");
                    assert_eq!(
                        alert.text("evidence_count"),
                        Some(evidence.len().to_string())
                    );
                }
            }
        }
        assert!(alerts_seen > 0, "seeded data should include alerts");
    }

    #[test]
    fn every_contacted_address_has_info() {
        let backend = DemoBackend::seeded(DEMO_SEED);
        let (profile, window) = first_window(&backend);
        let timeline = backend
            .rows(&Endpoint::View {
                view: ViewKind::Timeline,
                profile,
                time_window: window,
            })
            .expect("timeline");
        assert!(!timeline.is_empty());
        for row in timeline {
            let daddr = row.text("daddr").expect("daddr");
            let info = backend
                .rows(&Endpoint::Info { key: daddr.clone() })
                .expect("info");
            assert_eq!(info.len(), 1);
            assert_eq!(info[0].text("ip"), Some(daddr));
            assert!(info[0].text("geocountry").is_some());
        }
    }

    #[test]
    fn unknown_address_info_is_placeholder() {
        let info = ip_info_row("203.0.113.9");
        assert_eq!(info.text("geocountry").as_deref(), Some("-"));
        assert_eq!(info.text("ip").as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn unknown_routes_are_errors() {
        let backend = DemoBackend::seeded(DEMO_SEED);
        let error = backend
            .rows(&Endpoint::TimeWindows {
                profile: ProfileId::from("10.9.9.9"),
            })
            .expect_err("unknown profile");
        assert!(error.to_string().contains("10.9.9.9"));

        let (profile, window) = first_window(&backend);
        assert!(
            backend
                .rows(&Endpoint::Evidence {
                    profile,
                    time_window: window,
                    alert: AlertId::from("no-such-alert"),
                })
                .is_err()
        );
    }

    #[test]
    fn blocked_profile_has_a_blocked_window() {
        let backend = DemoBackend::generate(DEMO_SEED, 6, 4);
        for row in backend.rows(&Endpoint::Profiles).expect("profiles") {
            let summary = ProfileSummary::from_row(&row).expect("summary");
            let windows = backend
                .rows(&Endpoint::TimeWindows {
                    profile: summary.id.clone(),
                })
                .expect("windows");
            let any_blocked = windows
                .iter()
                .filter_map(TimeWindow::from_row)
                .any(|window| window.blocked);
            assert_eq!(summary.blocked, any_blocked);
        }
    }

    #[test]
    fn fixture_helpers_build_parseable_rows() {
        let rows = time_window_rows(&["tw0", "tw1"]);
        let window = TimeWindow::from_row(&rows[1]).expect("window");
        assert_eq!(window.name, "TW1");
        assert_eq!(fixture_datetime().year(), 2026);
    }
}
