//! Connectivity tests against provider endpoints.
//!
//! Credentials are resolved on the calling thread before any worker
//! starts; workers only see the pre-fetched values. Probes run on a bounded
//! pool of scoped threads with a blocking HTTP client. With `fail_fast`,
//! the first non-skipped failure stops workers from picking up new tests;
//! tests already running finish and are reported.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Serialize;
use tracing::debug;
use zeroize::Zeroizing;

use crate::core::catalog::{AuthLocation, AuthMethod, HttpMethod, ServiceDescriptor};
use crate::core::codec::{self, SecretMap};
use crate::core::constants::{CONNECT_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS, TEST_WORKERS};
use crate::error::Result;

/// Stand-in for the credential in redacted commands.
const REDACTED: &str = "****";

/// One test to run.
pub struct TestCase {
    pub descriptor: ServiceDescriptor,
    pub credential: Option<Zeroizing<String>>,
}

/// Outcome of one test.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub service: String,
    pub ok: bool,
    pub skipped: bool,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redacted_command: Option<String>,
}

impl TestResult {
    fn skipped(service: &str, reason: &str) -> Self {
        Self {
            service: service.to_string(),
            ok: false,
            skipped: true,
            duration_ms: 0,
            error_message: Some(reason.to_string()),
            http_status: None,
            redacted_command: None,
        }
    }

    /// Ran and did not succeed.
    pub fn failed(&self) -> bool {
        !self.ok && !self.skipped
    }
}

#[derive(Debug, Clone)]
pub struct TestOptions {
    pub workers: usize,
    pub fail_fast: bool,
    /// Print a line per failure to stderr.
    pub debug: bool,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            workers: TEST_WORKERS,
            fail_fast: false,
            debug: false,
        }
    }
}

/// A fully built HTTP request.
#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl Probe {
    /// Build the request for `descriptor` carrying `credential`.
    pub fn build(descriptor: &ServiceDescriptor, credential: &str) -> std::result::Result<Self, String> {
        Self::assemble(descriptor, credential, false)
    }

    /// The same request with the credential masked, rendered as curl.
    pub fn redacted(descriptor: &ServiceDescriptor) -> String {
        match Self::assemble(descriptor, REDACTED, true) {
            Ok(p) => p.to_curl(),
            Err(_) => format!("curl -X {} '{}'", descriptor.test_method.as_str(), descriptor.test_endpoint),
        }
    }

    fn assemble(
        d: &ServiceDescriptor,
        credential: &str,
        redact: bool,
    ) -> std::result::Result<Self, String> {
        let mut url = Url::parse(&d.test_endpoint).map_err(|e| format!("invalid endpoint: {}", e))?;
        let mut headers: Vec<(String, String)> =
            d.headers.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        let mut body = (!d.test_body.is_empty()).then(|| d.test_body.clone());

        match d.auth_location {
            AuthLocation::Header => {
                let value = match d.auth_method {
                    AuthMethod::Basic if !redact => STANDARD.encode(credential.as_bytes()),
                    _ => credential.to_string(),
                };
                let prefix = match (d.auth_method, d.auth_prefix.is_empty()) {
                    (AuthMethod::Basic, true) => "Basic ",
                    _ => d.auth_prefix.as_str(),
                };
                headers.push((d.auth_parameter.clone(), format!("{}{}", prefix, value)));
            }
            AuthLocation::Query => {
                url.query_pairs_mut().append_pair(&d.auth_parameter, credential);
            }
            AuthLocation::Body => {
                // the template already quotes the placeholder
                let quoted = serde_json::Value::String(credential.to_string()).to_string();
                let inner = &quoted[1..quoted.len() - 1];
                body = Some(d.test_body.replace("{credential}", inner));
            }
        }

        Ok(Self {
            method: d.test_method,
            url: url.to_string(),
            headers,
            body,
        })
    }

    /// Render as a curl command line.
    pub fn to_curl(&self) -> String {
        let mut out = format!("curl -sS -X {} '{}'", self.method.as_str(), self.url);
        for (k, v) in &self.headers {
            out.push_str(&format!(" -H '{}: {}'", k, v));
        }
        if let Some(body) = &self.body {
            out.push_str(&format!(" -H 'Content-Type: application/json' -d '{}'", body));
        }
        out
    }
}

/// Response status, or a transport error description.
pub type ProbeOutcome = std::result::Result<u16, String>;

/// Resolve a descriptor's credential: profile override, then vault, then
/// the process environment. `keyName` is tried before aliases in each.
pub fn resolve_credential<F>(
    descriptor: &ServiceDescriptor,
    overrides: &SecretMap,
    vault: &SecretMap,
    env: F,
) -> Option<Zeroizing<String>>
where
    F: Fn(&str) -> Option<String>,
{
    for source in [overrides, vault] {
        for name in descriptor.key_names() {
            if let Some(v) = source.get(name).filter(|v| !v.is_empty()) {
                return Some(codec::text(v));
            }
        }
    }
    descriptor
        .key_names()
        .find_map(|name| env(name).filter(|v| !v.is_empty()))
        .map(Zeroizing::new)
}

/// Build the shared HTTP client.
pub fn client() -> Result<Client> {
    Ok(Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .user_agent(concat!("ak/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Send a probe with `client`.
pub fn send(client: &Client, probe: &Probe) -> ProbeOutcome {
    let method = match probe.method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
    };
    let mut request = client.request(method, probe.url.as_str());
    for (k, v) in &probe.headers {
        request = request.header(k.as_str(), v.as_str());
    }
    if let Some(body) = &probe.body {
        request = request
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.clone());
    }
    match request.send() {
        Ok(response) => Ok(response.status().as_u16()),
        Err(e) if e.is_timeout() => Err("request timed out".to_string()),
        Err(e) if e.is_connect() => Err(format!("connection failed: {}", e.without_url())),
        Err(e) => Err(e.without_url().to_string()),
    }
}

/// Run tests over the network.
pub fn run(cases: Vec<TestCase>, options: &TestOptions) -> Result<Vec<TestResult>> {
    let client = client()?;
    Ok(run_with(cases, options, |probe| send(&client, probe)))
}

/// Run tests with a custom transport. Results arrive in completion order.
pub fn run_with<F>(cases: Vec<TestCase>, options: &TestOptions, transport: F) -> Vec<TestResult>
where
    F: Fn(&Probe) -> ProbeOutcome + Sync,
{
    let mut results = Vec::with_capacity(cases.len());
    let mut runnable = Vec::new();
    for case in cases {
        if !case.descriptor.can_test() {
            results.push(TestResult::skipped(&case.descriptor.name, "not testable"));
        } else if case.credential.is_none() {
            results.push(TestResult::skipped(&case.descriptor.name, "no credential"));
        } else {
            runnable.push(case);
        }
    }
    if runnable.is_empty() {
        return results;
    }

    let next = AtomicUsize::new(0);
    let cancelled = AtomicBool::new(false);
    let workers = options.workers.clamp(1, runnable.len());
    let (tx, rx) = mpsc::channel();

    thread::scope(|s| {
        for _ in 0..workers {
            let tx = tx.clone();
            let (next, cancelled, runnable, transport) = (&next, &cancelled, &runnable, &transport);
            s.spawn(move || loop {
                if options.fail_fast && cancelled.load(Ordering::SeqCst) {
                    break;
                }
                let idx = next.fetch_add(1, Ordering::SeqCst);
                let Some(case) = runnable.get(idx) else {
                    break;
                };
                let result = execute(case, transport);
                if options.fail_fast && result.failed() {
                    cancelled.store(true, Ordering::SeqCst);
                }
                if tx.send(result).is_err() {
                    break;
                }
            });
        }
        drop(tx);

        for result in rx {
            if options.debug && result.failed() {
                eprintln!(
                    "[debug] service={} status={} error={}",
                    result.service,
                    result
                        .http_status
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    result.error_message.as_deref().unwrap_or("-")
                );
            }
            results.push(result);
        }
    });

    results
}

fn execute<F>(case: &TestCase, transport: &F) -> TestResult
where
    F: Fn(&Probe) -> ProbeOutcome,
{
    let d = &case.descriptor;
    let credential = case.credential.as_deref().map(String::as_str).unwrap_or_default();
    let redacted = Probe::redacted(d);
    let started = Instant::now();

    let outcome = Probe::build(d, credential).and_then(|probe| transport(&probe));
    let duration_ms = started.elapsed().as_millis() as u64;
    debug!(service = %d.name, duration_ms, "probe finished");

    let mut result = TestResult {
        service: d.name.clone(),
        ok: false,
        skipped: false,
        duration_ms,
        error_message: None,
        http_status: None,
        redacted_command: Some(redacted),
    };
    match outcome {
        Ok(status) if (200..300).contains(&status) => {
            result.ok = true;
            result.http_status = Some(status);
        }
        Ok(status) => {
            let reason = reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("unexpected status");
            result.http_status = Some(status);
            result.error_message = Some(format!("HTTP {} {}", status, reason));
        }
        Err(message) => result.error_message = Some(message),
    }
    result
}
