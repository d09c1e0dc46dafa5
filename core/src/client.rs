//! Blocking client for the appliance's `/VMtest/` API.
//!
//! # Design
//! Every call goes through one primitive: build a multipart form, wrap it in
//! an `HttpRequest` carrying the content type, basic-auth header and length,
//! hand it to the `Transport`, then decode the body as JSON. A call counts
//! as successful when the decoded object has `status` equal to the string
//! `"200"`; anything else, including the number `200`, is a failure.
//!
//! `build_request` and `parse_response` never touch the network, so request
//! marshalling can be checked without an appliance. The endpoint wrappers
//! only choose an `Endpoint` and the fields to send.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::config::{ClientConfig, Tool};
use crate::endpoint::Endpoint;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::multipart::MultipartForm;
use crate::status::StatusBuffer;
use crate::transport::{Transport, UreqTransport};
use crate::types::{Outcome, Reply, Validation, VALIDATE_SUCCESS};

/// True when `body` is an object whose `status` is the string `"200"`.
pub fn is_status_200(body: &Value) -> bool {
    body.get("status").and_then(Value::as_str) == Some("200")
}

/// Label a decoded body as success or failure.
pub fn classify(body: Value) -> Reply {
    let outcome = if is_status_200(&body) {
        Outcome::Success
    } else {
        Outcome::Fail
    };
    Reply { outcome, body }
}

/// Client for one appliance.
///
/// One request is in flight at a time. The client also owns the
/// `StatusBuffer` used by `read_test_status`.
#[derive(Debug)]
pub struct ApplianceClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
    status: StatusBuffer,
}

impl ApplianceClient<UreqTransport> {
    pub fn new(config: ClientConfig) -> Self {
        let transport = UreqTransport::from_config(&config);
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> ApplianceClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            status: StatusBuffer::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// All log text seen by `read_test_status` so far.
    pub fn status_buffer(&self) -> &StatusBuffer {
        &self.status
    }

    pub fn build_request(
        &self,
        endpoint: Endpoint,
        query: &[(&str, &str)],
        form: &MultipartForm,
    ) -> HttpRequest {
        let mut url = format!("{}{}", self.config.base_url(), endpoint.path());
        if !query.is_empty() {
            let pairs: Vec<String> = query
                .iter()
                .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
                .collect();
            url.push('?');
            url.push_str(&pairs.join("&"));
        }
        let body = form.to_bytes();
        HttpRequest {
            method: endpoint.method(),
            url,
            headers: vec![
                ("Content-Type".to_string(), form.content_type()),
                ("Authorization".to_string(), self.config.credential.authorization()),
                ("Content-Length".to_string(), body.len().to_string()),
            ],
            body,
        }
    }

    /// Decode a response body. The HTTP status line is not consulted.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, ApiError> {
        serde_json::from_slice(&response.body)
            .map_err(|e| ApiError::DeserializationError(e.to_string()))
    }

    /// Send `form` to `endpoint` and return the decoded JSON body.
    pub fn call(
        &self,
        endpoint: Endpoint,
        query: &[(&str, &str)],
        form: MultipartForm,
    ) -> Result<Value, ApiError> {
        let request = self.build_request(endpoint, query, &form);
        debug!(
            %endpoint,
            method = request.method.as_str(),
            fields = form.fields().len(),
            files = form.files().len(),
            body_len = request.body.len(),
            "sending request"
        );
        let response = self.transport.execute(&request)?;
        debug!(%endpoint, http_status = response.status, "response received");
        self.parse_response(response)
    }

    fn reply(
        &self,
        endpoint: Endpoint,
        query: &[(&str, &str)],
        form: MultipartForm,
    ) -> Result<Reply, ApiError> {
        let reply = classify(self.call(endpoint, query, form)?);
        debug!(%endpoint, outcome = %reply.outcome, "call classified");
        Ok(reply)
    }

    fn upload<K, V>(
        &self,
        endpoint: Endpoint,
        fields: &[(K, V)],
        path: &Path,
    ) -> Result<Reply, ApiError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut form = form_from(fields);
        if let Some(field) = endpoint.file_field() {
            form.add_file_path(field, path)?;
        }
        self.reply(endpoint, &[], form)
    }

    /// Current appliance configuration (`perf-conf.yaml`), undecorated.
    pub fn read_config(&self) -> Result<Value, ApiError> {
        self.call(Endpoint::ReadConfig, &[], MultipartForm::new())
    }

    /// Write the appliance test configuration from the given fields.
    pub fn configure<K, V>(&self, params: &[(K, V)]) -> Result<Reply, ApiError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.reply(Endpoint::Configure, &[], form_from(params))
    }

    /// Parameter files stored for `tool`, or for the client's tool.
    ///
    /// Returns the body's `data` member, `Null` when it is absent.
    pub fn get_param_files(&self, tool: Option<Tool>) -> Result<Value, ApiError> {
        let endpoint = Endpoint::ListParamFiles;
        let tool = tool.unwrap_or(self.config.tool);
        let fields = named(endpoint.form_fields(), &[tool.as_str()]);
        let body = self.call(endpoint, &[], form_from(&fields))?;
        Ok(body.get("data").cloned().unwrap_or(Value::Null))
    }

    /// Generate a workload parameter file on the appliance.
    pub fn generate_param_file<K, V>(&self, params: &[(K, V)]) -> Result<Reply, ApiError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.reply(Endpoint::GenerateParamFile, &[], form_from(params))
    }

    /// Delete a workload parameter file by name.
    pub fn delete_param_file(&self, filename: &str, tool: Option<Tool>) -> Result<Reply, ApiError> {
        let endpoint = Endpoint::DeleteParamFile;
        let tool = tool.unwrap_or(self.config.tool);
        let query = named(endpoint.query_fields(), &[filename, tool.as_str()]);
        self.reply(endpoint, &query, MultipartForm::new())
    }

    /// Upload a local vdbench distribution archive.
    pub fn upload_vdbench_zip(&self, path: impl AsRef<Path>) -> Result<Reply, ApiError> {
        self.upload::<&str, &str>(Endpoint::UploadVdbench, &[], path.as_ref())
    }

    /// Upload a local workload parameter file for the client's tool.
    pub fn upload_param_file(&self, path: impl AsRef<Path>) -> Result<Reply, ApiError> {
        let endpoint = Endpoint::UploadParamFile;
        let fields = named(endpoint.form_fields(), &[self.config.tool.as_str()]);
        self.upload(endpoint, fields.as_slice(), path.as_ref())
    }

    /// Ask the appliance to check its configuration before a run.
    pub fn prevalidation(&self) -> Result<Validation, ApiError> {
        let body = self.call(Endpoint::Validate, &[], MultipartForm::new())?;
        let message = match body.get("data") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        Ok(Validation {
            passed: message.contains(VALIDATE_SUCCESS),
            message,
        })
    }

    pub fn start_testing(&self) -> Result<Reply, ApiError> {
        self.reply(Endpoint::RunTest, &[], MultipartForm::new())
    }

    pub fn kill_testing(&self) -> Result<Reply, ApiError> {
        self.reply(Endpoint::KillTest, &[], MultipartForm::new())
    }

    pub fn is_test_finished(&self) -> Result<bool, ApiError> {
        let body = self.call(Endpoint::IsTestFinished, &[], MultipartForm::new())?;
        Ok(is_status_200(&body))
    }

    /// Delete the guest VMs deployed for testing.
    pub fn cleanup_vms(&self) -> Result<Reply, ApiError> {
        self.reply(Endpoint::CleanupVms, &[], MultipartForm::new())
    }

    /// Poll the test log.
    ///
    /// Returns the accumulated log when the poll brought new text, `None`
    /// when there was nothing new.
    pub fn read_test_status(&mut self) -> Result<Option<String>, ApiError> {
        let body = self.call(Endpoint::ReadLog, &[], MultipartForm::new())?;
        let Some(raw) = body.get("data").and_then(Value::as_str) else {
            return Ok(None);
        };
        Ok(self.status.absorb(raw).map(str::to_string))
    }
}

/// Pair an endpoint's required field names with the caller's values.
fn named<'a>(names: &[&'static str], values: &[&'a str]) -> Vec<(&'static str, &'a str)> {
    debug_assert_eq!(names.len(), values.len());
    names.iter().copied().zip(values.iter().copied()).collect()
}

fn form_from<K, V>(fields: &[(K, V)]) -> MultipartForm
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut form = MultipartForm::new();
    for (name, value) in fields {
        form.add_field(name.as_ref(), value.as_ref());
    }
    form
}
