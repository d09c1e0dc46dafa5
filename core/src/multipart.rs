//! `multipart/form-data` body builder.
//!
//! # Design
//! Every appliance call carries a multipart body, even when it has nothing to
//! say. Fields keep their insertion order and are never deduplicated. Files
//! are read into memory when they are added, not streamed at send time.
//!
//! Values are written verbatim. A value that happens to contain the boundary
//! corrupts the body; the boundary is long and host/time specific, so this
//! is left unchecked.

use std::io::Read;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::error::ApiError;

const CRLF: &[u8] = b"\r\n";

/// Fallback MIME type for files whose extension is not recognised.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// A plain text form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    pub name: String,
    pub value: String,
}

/// A file attachment, already read into memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFile {
    pub field_name: String,
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// Generate a boundary token for one form.
///
/// Made of host identity, process id, a fractional unix timestamp and a
/// random component. Unique with high probability, not by construction.
pub fn make_boundary() -> String {
    let host = std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .ok()
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();
    format!(
        "{host}.{pid}.{timestamp:.6}.{random}",
        pid = std::process::id(),
        random = Uuid::new_v4().simple()
    )
}

/// Accumulates fields and files for one request body.
#[derive(Debug, Clone)]
pub struct MultipartForm {
    boundary: String,
    fields: Vec<FormField>,
    files: Vec<FormFile>,
}

impl Default for MultipartForm {
    fn default() -> Self {
        Self::new()
    }
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::with_boundary(make_boundary())
    }

    /// Build a form around a fixed boundary, for reproducible output.
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            boundary: boundary.into(),
            fields: Vec::new(),
            files: Vec::new(),
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn files(&self) -> &[FormFile] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.files.is_empty()
    }

    /// Value for the `Content-Type` request header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn add_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push(FormField {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Attach the whole of `reader` under `field_name`.
    ///
    /// The content type is guessed from `filename`.
    pub fn add_file(
        &mut self,
        field_name: impl Into<String>,
        filename: impl Into<String>,
        mut reader: impl Read,
    ) -> std::io::Result<()> {
        let mut content = Vec::new();
        reader.read_to_end(&mut content)?;
        self.add_file_bytes(field_name, filename, None, content);
        Ok(())
    }

    /// Attach in-memory bytes. `content_type` overrides the guess from `filename`.
    pub fn add_file_bytes(
        &mut self,
        field_name: impl Into<String>,
        filename: impl Into<String>,
        content_type: Option<&str>,
        content: Vec<u8>,
    ) {
        let filename = filename.into();
        let content_type = match content_type {
            Some(ct) => ct.to_string(),
            None => guess_content_type(&filename),
        };
        self.files.push(FormFile {
            field_name: field_name.into(),
            filename,
            content_type,
            content,
        });
    }

    /// Read a local file and attach it under its final path component.
    pub fn add_file_path(
        &mut self,
        field_name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<(), ApiError> {
        let path = path.as_ref();
        let upload_error = |source| ApiError::Upload {
            path: path.to_path_buf(),
            source,
        };
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let file = std::fs::File::open(path).map_err(upload_error)?;
        self.add_file(field_name, filename, file).map_err(upload_error)
    }

    /// Serialize the form into a request body.
    ///
    /// Fields come first, then files, then the closing delimiter. A form with
    /// no parts still emits a lone CRLF before the closing delimiter; the
    /// appliance expects that exact shape for empty requests.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        for field in &self.fields {
            self.write_delimiter(&mut buf);
            buf.extend_from_slice(
                format!("Content-Disposition: form-data; name=\"{}\"", field.name).as_bytes(),
            );
            buf.extend_from_slice(CRLF);
            buf.extend_from_slice(CRLF);
            buf.extend_from_slice(field.value.as_bytes());
            buf.extend_from_slice(CRLF);
        }
        for file in &self.files {
            self.write_delimiter(&mut buf);
            buf.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"",
                    file.field_name, file.filename
                )
                .as_bytes(),
            );
            buf.extend_from_slice(CRLF);
            buf.extend_from_slice(format!("Content-Type: {}", file.content_type).as_bytes());
            buf.extend_from_slice(CRLF);
            buf.extend_from_slice(CRLF);
            buf.extend_from_slice(&file.content);
            buf.extend_from_slice(CRLF);
        }
        if buf.is_empty() {
            buf.extend_from_slice(CRLF);
        }
        buf.extend_from_slice(format!("--{}--", self.boundary).as_bytes());
        buf.extend_from_slice(CRLF);
        buf
    }

    fn write_delimiter(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(b"--");
        buf.extend_from_slice(self.boundary.as_bytes());
        buf.extend_from_slice(CRLF);
    }
}

fn guess_content_type(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_or_octet_stream()
        .to_string()
}
