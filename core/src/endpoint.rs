//! The appliance's endpoints as data.
//!
//! Every endpoint has the same shape: a fixed path under `/VMtest/`, a
//! method, the fields it requires and at most one file field. Wrappers on
//! `ApplianceClient` pick an entry here and supply the values.

use std::fmt;

use crate::http::HttpMethod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    ReadConfig,
    Configure,
    ListParamFiles,
    GenerateParamFile,
    DeleteParamFile,
    UploadVdbench,
    UploadParamFile,
    Validate,
    RunTest,
    KillTest,
    IsTestFinished,
    CleanupVms,
    ReadLog,
}

impl Endpoint {
    pub const ALL: [Endpoint; 13] = [
        Endpoint::ReadConfig,
        Endpoint::Configure,
        Endpoint::ListParamFiles,
        Endpoint::GenerateParamFile,
        Endpoint::DeleteParamFile,
        Endpoint::UploadVdbench,
        Endpoint::UploadParamFile,
        Endpoint::Validate,
        Endpoint::RunTest,
        Endpoint::KillTest,
        Endpoint::IsTestFinished,
        Endpoint::CleanupVms,
        Endpoint::ReadLog,
    ];

    /// Path relative to the base path, without query string.
    pub const fn path(self) -> &'static str {
        match self {
            Endpoint::ReadConfig => "readconfigfile",
            Endpoint::Configure => "generatefile",
            Endpoint::ListParamFiles => "getvdbenchparamFile",
            Endpoint::GenerateParamFile => "generateParam",
            Endpoint::DeleteParamFile => "deleteFile",
            Endpoint::UploadVdbench => "uploadvdbench",
            Endpoint::UploadParamFile => "uploadParamfile",
            Endpoint::Validate => "validatefile",
            Endpoint::RunTest => "runtest",
            Endpoint::KillTest => "killtest",
            Endpoint::IsTestFinished => "istestfinish",
            Endpoint::CleanupVms => "cleanupvms",
            Endpoint::ReadLog => "readlog",
        }
    }

    pub const fn method(self) -> HttpMethod {
        match self {
            Endpoint::ReadLog => HttpMethod::Get,
            _ => HttpMethod::Post,
        }
    }

    /// Form fields the appliance requires, in the order they are sent.
    ///
    /// Endpoints that take caller-defined parameter sets (`generatefile`,
    /// `generateParam`) require nothing fixed here.
    pub const fn form_fields(self) -> &'static [&'static str] {
        match self {
            Endpoint::ListParamFiles | Endpoint::UploadParamFile => &["tool"],
            _ => &[],
        }
    }

    /// Query parameters the appliance requires, in the order they are sent.
    pub const fn query_fields(self) -> &'static [&'static str] {
        match self {
            Endpoint::DeleteParamFile => &["name", "tool"],
            _ => &[],
        }
    }

    /// Form field name carrying the uploaded file, for upload endpoints.
    pub const fn file_field(self) -> Option<&'static str> {
        match self {
            Endpoint::UploadVdbench => Some("vdbenchfile"),
            Endpoint::UploadParamFile => Some("paramfile"),
            _ => None,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn paths_are_unique() {
        let paths: HashSet<_> = Endpoint::ALL.iter().map(|e| e.path()).collect();
        assert_eq!(paths.len(), Endpoint::ALL.len());
    }

    #[test]
    fn only_readlog_is_get() {
        for endpoint in Endpoint::ALL {
            let expected = if endpoint == Endpoint::ReadLog {
                HttpMethod::Get
            } else {
                HttpMethod::Post
            };
            assert_eq!(endpoint.method(), expected, "{endpoint}");
        }
    }

    #[test]
    fn upload_endpoints_name_their_file_field() {
        assert_eq!(Endpoint::UploadVdbench.file_field(), Some("vdbenchfile"));
        assert_eq!(Endpoint::UploadParamFile.file_field(), Some("paramfile"));
        assert_eq!(Endpoint::RunTest.file_field(), None);
    }

    #[test]
    fn required_fields() {
        assert_eq!(Endpoint::ListParamFiles.form_fields(), ["tool"]);
        assert_eq!(Endpoint::UploadParamFile.form_fields(), ["tool"]);
        assert_eq!(Endpoint::DeleteParamFile.query_fields(), ["name", "tool"]);
        assert!(Endpoint::DeleteParamFile.form_fields().is_empty());

        let with_query: Vec<_> = Endpoint::ALL
            .iter()
            .filter(|e| !e.query_fields().is_empty())
            .collect();
        assert_eq!(with_query, [&Endpoint::DeleteParamFile]);
    }
}
