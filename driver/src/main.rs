//! Walk-through of a complete appliance session.
//!
//! Kills any running test, manages parameter files, configures the
//! appliance, validates, then starts a test and polls its log until it
//! finishes. Connection settings come from the environment:
//!
//! | variable              | default          |
//! |-----------------------|------------------|
//! | `HCIBENCH_HOST`       | `127.0.0.1`      |
//! | `HCIBENCH_PORT`       | `8443`           |
//! | `HCIBENCH_USER`       | `root`           |
//! | `HCIBENCH_PASSWORD`   | `vmware`         |
//! | `HCIBENCH_TOOL`       | `fio`            |
//! | `HCIBENCH_DATA_DIR`   | `data`           |
//! | `HCIBENCH_POLL_SECS`  | `180`            |
//! | `HCIBENCH_INSECURE`   | `true`           |
//! | `HCIBENCH_PLAIN_HTTP` | `false`          |
//!
//! The process exits with status 1 when the appliance cannot be reached.

mod workload;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use hcibench_core::{param_file_name, ApiError, ApplianceClient, ClientConfig, Scheme, Tool};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use workload::{CONFIGURATION, PARAM_FILE, WORKLOAD};

#[derive(Debug, Clone, PartialEq)]
struct Settings {
    host: String,
    port: u16,
    user: String,
    password: String,
    tool: Tool,
    data_dir: PathBuf,
    poll_interval: Duration,
    insecure: bool,
    plain_http: bool,
}

impl Settings {
    fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());
        let flag = |key: &str, default: bool| match get(key).as_deref() {
            Some("1" | "true" | "yes") => Ok(true),
            Some("0" | "false" | "no") => Ok(false),
            Some(other) => Err(format!("{key}: expected a boolean, got `{other}`")),
            None => Ok(default),
        };

        let port: u16 = var("HCIBENCH_PORT", "8443")
            .parse()
            .map_err(|e| format!("HCIBENCH_PORT: {e}"))?;
        let poll_secs: u64 = var("HCIBENCH_POLL_SECS", "180")
            .parse()
            .map_err(|e| format!("HCIBENCH_POLL_SECS: {e}"))?;
        let tool: Tool = var("HCIBENCH_TOOL", "fio")
            .parse()
            .map_err(|e: ApiError| e.to_string())?;

        Ok(Self {
            host: var("HCIBENCH_HOST", "127.0.0.1"),
            port,
            user: var("HCIBENCH_USER", "root"),
            password: var("HCIBENCH_PASSWORD", "vmware"),
            tool,
            data_dir: PathBuf::from(var("HCIBENCH_DATA_DIR", "data")),
            poll_interval: Duration::from_secs(poll_secs),
            insecure: flag("HCIBENCH_INSECURE", true)?,
            plain_http: flag("HCIBENCH_PLAIN_HTTP", false)?,
        })
    }

    fn client_config(&self) -> ClientConfig {
        let scheme = if self.plain_http {
            Scheme::Http
        } else {
            Scheme::Https
        };
        ClientConfig::new(&self.host, &self.user, &self.password, self.tool)
            .port(self.port)
            .scheme(scheme)
            .danger_accept_invalid_certs(self.insecure)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            error!("invalid settings: {e}");
            return ExitCode::from(2);
        }
    };

    match run(&settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e @ ApiError::Connect { .. }) => {
            error!("{e}");
            ExitCode::from(1)
        }
        Err(e) => {
            error!("{e}");
            ExitCode::from(2)
        }
    }
}

fn run(settings: &Settings) -> Result<(), ApiError> {
    println!("Starting HCIBench example\n{}\n", "-".repeat(56));

    println!("1. Creating client");
    println!("   Host: {}:{}", settings.host, settings.port);
    println!("   Username: {}", settings.user);
    println!("   Tool: {}\n", settings.tool);
    if settings.insecure {
        warn!("certificate validation disabled for {}", settings.host);
    }
    let mut client = ApplianceClient::new(settings.client_config());

    println!("2. Kill testing");
    let reply = client.kill_testing()?;
    println!("   Status: {}\n   Data: {}\n", reply.outcome, reply.body);

    let param_path = settings.data_dir.join(PARAM_FILE);
    println!("3. Uploading {} parameter file\n   Path: {}", settings.tool, param_path.display());
    if param_path.exists() {
        let reply = client.upload_param_file(&param_path)?;
        println!("   Status: {}\n   Data: {}\n", reply.outcome, reply.body);
    } else {
        println!("   Parameter file does not exist, skipping\n");
    }

    println!("4. Getting {} parameter files", settings.tool);
    println!("   Data: {}\n", client.get_param_files(Some(settings.tool))?);

    println!("5. Deleting test parameters\n   Filename: {PARAM_FILE}");
    let reply = client.delete_param_file(PARAM_FILE, Some(settings.tool))?;
    println!("   Status: {}\n   Data: {}\n", reply.outcome, reply.body);

    println!("6. Getting {} parameter files", settings.tool);
    println!("   Data: {}\n", client.get_param_files(Some(settings.tool))?);

    let zip_path = settings.data_dir.join("vdbench50407.zip");
    println!("7. Uploading vdbench zip file\n   Path: {}", zip_path.display());
    if zip_path.exists() {
        let reply = client.upload_vdbench_zip(&zip_path)?;
        println!("   Status: {}\n   Data: {}\n", reply.outcome, reply.body);
    } else {
        println!("   vdbench zip file does not exist, skipping\n");
    }

    println!("8. Generate parameter file");
    let reply = client.generate_param_file(WORKLOAD)?;
    println!("   Status: {}\n   Data: {}", reply.outcome, reply.body);
    println!("   Test name: {}\n", param_file_name(WORKLOAD)?);

    println!("9. Configure HCIBench");
    let reply = client.configure(CONFIGURATION)?;
    println!("   Status: {}\n   Data: {}\n", reply.outcome, reply.body);

    println!("10. Reading HCIBench configuration");
    println!("    Data: {}\n", client.read_config()?);

    println!("11. Deleting worker VMs");
    let reply = client.cleanup_vms()?;
    println!("    Status: {}\n    Data: {}\n", reply.outcome, reply.body);

    println!("12. Perform prevalidation");
    let validation = client.prevalidation()?;
    println!(
        "    Status: {}\n    Result:\n{}\n",
        validation.passed,
        validation.message.replace("<br>", "\n")
    );

    if validation.passed {
        println!("13. Starting test");
        let reply = client.start_testing()?;
        println!("    Status: {}\n    Data: {}", reply.outcome, reply.body);

        println!("13.1 Waiting for test completion");
        while !client.is_test_finished()? {
            match client.read_test_status()? {
                Some(status) => println!("    Status: {status}"),
                None => info!("no new test output"),
            }
            std::thread::sleep(settings.poll_interval);
        }
    }

    println!("Sample complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.port, 8443);
        assert_eq!(s.tool, Tool::Fio);
        assert_eq!(s.poll_interval, Duration::from_secs(180));
        assert!(s.insecure);
        assert!(!s.plain_http);
        assert_eq!(s.client_config().base_url(), "https://127.0.0.1:8443/VMtest/");
        assert!(s.client_config().accept_invalid_certs);
    }

    #[test]
    fn overrides() {
        let s = settings(&[
            ("HCIBENCH_HOST", "localhost"),
            ("HCIBENCH_PORT", "3000"),
            ("HCIBENCH_TOOL", "vdbench"),
            ("HCIBENCH_PLAIN_HTTP", "true"),
            ("HCIBENCH_INSECURE", "no"),
        ])
        .unwrap();
        assert_eq!(s.tool, Tool::Vdbench);
        assert_eq!(s.client_config().base_url(), "http://localhost:3000/VMtest/");
        assert!(!s.client_config().accept_invalid_certs);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(settings(&[("HCIBENCH_PORT", "eighty")]).is_err());
        assert!(settings(&[("HCIBENCH_TOOL", "iometer")]).is_err());
        assert!(settings(&[("HCIBENCH_INSECURE", "maybe")]).is_err());
    }
}
