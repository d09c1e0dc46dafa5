//! Blocking client for the HCIBench benchmarking appliance's HTTP API.
//!
//! # Overview
//! Authenticates with basic credentials over TLS, uploads workload files,
//! triggers configuration and test runs, and polls the test log.
//!
//! # Design
//! - Every call funnels through `ApplianceClient::call`: a multipart body
//!   from `MultipartForm`, an `HttpRequest` built as plain data, one round
//!   trip through a `Transport`, and a JSON decode.
//! - Success means the JSON `status` member equals the string `"200"`.
//! - `Endpoint` lists the appliance's endpoints as data; the wrapper methods
//!   only pick an entry and the fields to send.
//! - `StatusBuffer` turns repeated full-log polls into incremental output.
//! - The core never exits the process. An unreachable appliance surfaces as
//!   `ApiError::Connect` and the caller decides whether that is fatal.

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod multipart;
pub mod status;
pub mod transport;
pub mod types;

pub use client::{classify, is_status_200, ApplianceClient};
pub use config::{ClientConfig, Credential, Scheme, Tool, BASE_PATH, DEFAULT_PORT};
pub use endpoint::Endpoint;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use multipart::{make_boundary, FormField, FormFile, MultipartForm};
pub use status::StatusBuffer;
pub use transport::{Transport, UreqTransport};
pub use types::{param_file_name, Outcome, Reply, Validation, VALIDATE_SUCCESS};
