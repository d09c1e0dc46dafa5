//! In-memory stand-in for the appliance's `/VMtest/` API.
//!
//! Answers every endpoint the client knows about with the appliance's JSON
//! shape (`{"status": "<code>", "data": ...}`), checks basic auth, and keeps
//! a copy of every request it receives so tests can inspect the wire format.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, Method, StatusCode},
    routing::get,
    Json, Router,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub const VALIDATE_SUCCESS: &str =
    "All the config has been validated, please go ahead to kick off testing";

/// A request as it arrived, before any interpretation.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub endpoint: String,
    pub query: HashMap<String, String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<String>,
    pub body: Vec<u8>,
}

/// One part of a multipart body.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl Part {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

#[derive(Debug, Default)]
pub struct Appliance {
    /// Expected `Authorization` header value.
    pub authorization: String,
    pub config: Vec<(String, String)>,
    pub param_files: HashMap<String, Vec<String>>,
    pub uploads: Vec<String>,
    pub log: Vec<String>,
    pub running: bool,
    /// `istestfinish` polls a run takes before it reports completion.
    pub run_polls: u32,
    polls_left: u32,
    pub requests: Vec<RecordedRequest>,
}

pub type Db = Arc<RwLock<Appliance>>;

impl Appliance {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            authorization: format!("Basic {}", STANDARD.encode(format!("{username}:{password}"))),
            run_polls: 2,
            ..Self::default()
        }
    }

    pub fn shared(self) -> Db {
        Arc::new(RwLock::new(self))
    }
}

#[derive(Serialize)]
struct Reply {
    status: String,
    data: Value,
}

fn reply(status: StatusCode, data: impl Into<Value>) -> (StatusCode, Json<Reply>) {
    (
        status,
        Json(Reply {
            status: status.as_u16().to_string(),
            data: data.into(),
        }),
    )
}

pub fn app(db: Db) -> Router {
    Router::new()
        .route("/VMtest/{endpoint}", get(handle).post(handle))
        .with_state(db)
}

pub async fn run(listener: TcpListener, db: Db) -> Result<(), std::io::Error> {
    axum::serve(listener, app(db)).await
}

/// Split a `multipart/form-data` body into its parts.
///
/// Returns `None` when the content type names no boundary.
pub fn parse_form(content_type: &str, body: &[u8]) -> Option<Vec<Part>> {
    let boundary = content_type.split("boundary=").nth(1)?.trim();
    let delimiter = format!("--{boundary}").into_bytes();

    let mut starts = Vec::new();
    let mut from = 0;
    while let Some(pos) = find(body, &delimiter, from) {
        starts.push(pos);
        from = pos + delimiter.len();
    }

    let mut parts = Vec::new();
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(body.len());
        let segment = &body[start + delimiter.len()..end];
        if segment.starts_with(b"--") {
            break;
        }
        let segment = segment.strip_prefix(b"\r\n").unwrap_or(segment);
        let split = find(segment, b"\r\n\r\n", 0)?;
        let head = String::from_utf8_lossy(&segment[..split]);
        let data = &segment[split + 4..];
        let data = data.strip_suffix(b"\r\n").unwrap_or(data);

        let mut part = Part {
            name: String::new(),
            filename: None,
            content_type: None,
            data: data.to_vec(),
        };
        for line in head.split("\r\n") {
            if let Some(disposition) = line.strip_prefix("Content-Disposition: form-data;") {
                for attr in disposition.split(';') {
                    let Some((key, value)) = attr.trim().split_once('=') else {
                        continue;
                    };
                    let value = value.trim_matches('"').to_string();
                    match key {
                        "name" => part.name = value,
                        "filename" => part.filename = Some(value),
                        _ => {}
                    }
                }
            } else if let Some(ct) = line.strip_prefix("Content-Type: ") {
                part.content_type = Some(ct.to_string());
            }
        }
        parts.push(part);
    }
    Some(parts)
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

fn field<'a>(parts: &'a [Part], name: &str) -> Option<&'a Part> {
    parts.iter().find(|p| p.name == name && p.filename.is_none())
}

fn file<'a>(parts: &'a [Part], name: &str) -> Option<&'a Part> {
    parts.iter().find(|p| p.name == name && p.filename.is_some())
}

async fn handle(
    State(db): State<Db>,
    method: Method,
    Path(endpoint): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Reply>) {
    let header_str = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    let recorded = RecordedRequest {
        method: method.to_string(),
        endpoint: endpoint.clone(),
        query,
        authorization: header_str(header::AUTHORIZATION),
        content_type: header_str(header::CONTENT_TYPE),
        content_length: header_str(header::CONTENT_LENGTH),
        body: body.to_vec(),
    };

    let mut appliance = db.write().await;
    appliance.requests.push(recorded.clone());
    tracing::debug!(%method, %endpoint, "mock appliance request");

    if recorded.authorization.as_deref() != Some(appliance.authorization.as_str()) {
        return reply(StatusCode::UNAUTHORIZED, "Unauthorized");
    }
    let parts = recorded
        .content_type
        .as_deref()
        .and_then(|ct| parse_form(ct, &recorded.body))
        .unwrap_or_default();

    appliance.dispatch(&endpoint, &recorded.query, &parts)
}

impl Appliance {
    fn dispatch(
        &mut self,
        endpoint: &str,
        query: &HashMap<String, String>,
        parts: &[Part],
    ) -> (StatusCode, Json<Reply>) {
        match endpoint {
            "readconfigfile" => {
                let config: serde_json::Map<String, Value> = self
                    .config
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect();
                reply(StatusCode::OK, Value::Object(config))
            }
            "generatefile" => {
                self.config = parts.iter().map(|p| (p.name.clone(), p.text())).collect();
                reply(StatusCode::OK, "Configuration saved")
            }
            "getvdbenchparamFile" => {
                let tool = field(parts, "tool").map(Part::text).unwrap_or_default();
                let files = self.param_files.get(&tool).cloned().unwrap_or_default();
                reply(StatusCode::OK, json!(files))
            }
            "generateParam" => {
                let keys = [
                    "tool",
                    "diskNum",
                    "workSet",
                    "blockSize",
                    "readPercent",
                    "randomPercent",
                    "threadNum",
                ];
                let values: Option<Vec<String>> = keys
                    .iter()
                    .map(|k| field(parts, k).map(Part::text))
                    .collect();
                let Some(v) = values else {
                    return reply(StatusCode::INTERNAL_SERVER_ERROR, "Missing workload parameter");
                };
                let name = format!(
                    "{}-{}vmdk-{}ws-{}-{}rdpct-{}randompct-{}threads",
                    v[0], v[1], v[2], v[3], v[4], v[5], v[6]
                );
                self.param_files.entry(v[0].clone()).or_default().push(name.clone());
                reply(StatusCode::OK, name)
            }
            "deleteFile" => {
                let name = query.get("name").cloned().unwrap_or_default();
                let tool = query.get("tool").cloned().unwrap_or_default();
                let files = self.param_files.entry(tool).or_default();
                match files.iter().position(|f| *f == name) {
                    Some(i) => {
                        files.remove(i);
                        reply(StatusCode::OK, format!("{name} deleted"))
                    }
                    None => reply(StatusCode::INTERNAL_SERVER_ERROR, format!("{name} not found")),
                }
            }
            "uploadvdbench" => match file(parts, "vdbenchfile") {
                Some(part) => {
                    let name = part.filename.clone().unwrap_or_default();
                    self.uploads.push(name.clone());
                    reply(StatusCode::OK, format!("{name} uploaded"))
                }
                None => reply(StatusCode::INTERNAL_SERVER_ERROR, "No vdbench archive attached"),
            },
            "uploadParamfile" => {
                let tool = field(parts, "tool").map(Part::text);
                match (tool, file(parts, "paramfile")) {
                    (Some(tool), Some(part)) => {
                        let name = part.filename.clone().unwrap_or_default();
                        self.param_files.entry(tool).or_default().push(name.clone());
                        reply(StatusCode::OK, format!("{name} uploaded"))
                    }
                    _ => reply(StatusCode::INTERNAL_SERVER_ERROR, "No parameter file attached"),
                }
            }
            "validatefile" => {
                let configured = self
                    .config
                    .iter()
                    .any(|(k, v)| k == "vcenterIp" && !v.is_empty());
                if configured {
                    reply(
                        StatusCode::OK,
                        format!("Validating configuration...<br>{VALIDATE_SUCCESS}"),
                    )
                } else {
                    reply(StatusCode::OK, "vCenter IP is not specified")
                }
            }
            "runtest" => {
                if self.running {
                    return reply(StatusCode::INTERNAL_SERVER_ERROR, "Testing is already running");
                }
                self.running = true;
                self.polls_left = self.run_polls;
                self.log = vec!["Test started".to_string()];
                reply(StatusCode::OK, "Test started")
            }
            "killtest" => {
                self.running = false;
                self.log.push("Testing killed".to_string());
                reply(StatusCode::OK, "Testing killed")
            }
            "istestfinish" => {
                if self.running && self.polls_left > 0 {
                    self.polls_left -= 1;
                    let step = self.run_polls - self.polls_left;
                    self.log.push(format!("Running test case {step}"));
                    return reply(StatusCode::INTERNAL_SERVER_ERROR, "Testing");
                }
                if self.running {
                    self.running = false;
                    self.log.push("Test finished".to_string());
                }
                reply(StatusCode::OK, "Test finished")
            }
            "cleanupvms" => reply(StatusCode::OK, "Guest VMs deleted"),
            "readlog" => reply(StatusCode::OK, self.log.join("<br>")),
            _ => reply(StatusCode::NOT_FOUND, "Unknown endpoint"),
        }
    }
}
