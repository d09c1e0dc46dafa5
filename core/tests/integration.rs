//! Full appliance workflow against the live mock appliance.
//!
//! # Design
//! Starts the mock appliance on a random port, then drives every client
//! operation over real HTTP through `UreqTransport`. Validates the multipart
//! wire format and basic auth as the server sees them, plus the polling loop
//! a caller would run while a test executes.

use hcibench_core::{
    ApiError, ApplianceClient, ClientConfig, Outcome, Scheme, Tool, VALIDATE_SUCCESS,
};
use mock_appliance::{parse_form, Appliance, Db};

fn start_appliance() -> (std::net::SocketAddr, Db) {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();
    let db = Appliance::new("root", "vmware").shared();

    let server_db = db.clone();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_appliance::run(listener, server_db).await
        })
        .unwrap();
    });
    (addr, db)
}

fn client_for(addr: std::net::SocketAddr, password: &str) -> ApplianceClient {
    let config = ClientConfig::new(&addr.ip().to_string(), "root", password, Tool::Fio)
        .port(addr.port())
        .scheme(Scheme::Http);
    ApplianceClient::new(config)
}

/// Snapshot of what the mock appliance has recorded so far.
fn recorded(db: &Db) -> Vec<mock_appliance::RecordedRequest> {
    db.blocking_read().requests.clone()
}

#[test]
fn kill_testing_sends_empty_form() {
    let (addr, db) = start_appliance();
    let client = client_for(addr, "vmware");

    let reply = client.kill_testing().unwrap();
    assert_eq!(reply.outcome, Outcome::Success);

    let requests = recorded(&db);
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.method, "POST");
    assert_eq!(req.endpoint, "killtest");
    assert_eq!(req.authorization.as_deref(), Some("Basic cm9vdDp2bXdhcmU="));

    let content_type = req.content_type.as_deref().unwrap();
    let boundary = content_type
        .strip_prefix("multipart/form-data; boundary=")
        .unwrap();
    assert_eq!(req.body, format!("\r\n--{boundary}--\r\n").into_bytes());
    assert_eq!(req.content_length.as_deref(), Some(req.body.len().to_string().as_str()));
    assert!(parse_form(content_type, &req.body).unwrap().is_empty());
}

#[test]
fn wrong_password_is_a_failure_outcome() {
    let (addr, _db) = start_appliance();
    let client = client_for(addr, "wrong");

    let reply = client.start_testing().unwrap();
    assert_eq!(reply.outcome, Outcome::Fail);
    assert_eq!(reply.body["status"], "401");
}

#[test]
fn full_workflow() {
    let (addr, db) = start_appliance();
    let mut client = client_for(addr, "vmware");
    let dir = tempfile::tempdir().unwrap();

    // Step 1: upload a parameter file; it shows up under the client's tool.
    let param_path = dir
        .path()
        .join("fio-1vmdk-100ws-4-100rdpct-100randompct-2threads");
    std::fs::write(&param_path, "[global]\nbs=4k\n").unwrap();
    let reply = client.upload_param_file(&param_path).unwrap();
    assert!(reply.is_success(), "upload failed: {:?}", reply.body);

    let files = client.get_param_files(None).unwrap();
    assert_eq!(
        files,
        serde_json::json!(["fio-1vmdk-100ws-4-100rdpct-100randompct-2threads"])
    );

    // The server saw a tool field and the file part, in that order.
    let upload = recorded(&db)
        .into_iter()
        .find(|r| r.endpoint == "uploadParamfile")
        .unwrap();
    let parts = parse_form(upload.content_type.as_deref().unwrap(), &upload.body).unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!((parts[0].name.as_str(), parts[0].text().as_str()), ("tool", "fio"));
    assert_eq!(parts[1].name, "paramfile");
    assert_eq!(parts[1].content_type.as_deref(), Some("application/octet-stream"));
    assert_eq!(parts[1].data, b"[global]\nbs=4k\n");

    // Step 2: delete it again.
    let reply = client
        .delete_param_file("fio-1vmdk-100ws-4-100rdpct-100randompct-2threads", Some(Tool::Fio))
        .unwrap();
    assert!(reply.is_success());
    assert_eq!(client.get_param_files(Some(Tool::Fio)).unwrap(), serde_json::json!([]));

    // Step 3: deleting a missing file is a failure outcome, not an error.
    let reply = client.delete_param_file("missing", None).unwrap();
    assert_eq!(reply.outcome, Outcome::Fail);

    // Step 4: upload a vdbench archive.
    let zip_path = dir.path().join("vdbench50407.zip");
    std::fs::write(&zip_path, [0x50, 0x4b, 0x03, 0x04]).unwrap();
    assert!(client.upload_vdbench_zip(&zip_path).unwrap().is_success());
    assert_eq!(db.blocking_read().uploads, ["vdbench50407.zip"]);

    // Step 5: generate a parameter file.
    let params = [
        ("diskNum", "8"),
        ("workSet", "100"),
        ("threadNum", "4"),
        ("blockSize", "4k"),
        ("readPercent", "70"),
        ("randomPercent", "100"),
        ("tool", "fio"),
    ];
    let reply = client.generate_param_file(&params).unwrap();
    assert!(reply.is_success());
    assert_eq!(
        reply.data().and_then(|d| d.as_str()),
        Some(hcibench_core::param_file_name(&params).unwrap().as_str())
    );

    // Step 6: prevalidation fails before configuration ...
    let validation = client.prevalidation().unwrap();
    assert!(!validation.passed);

    // ... and passes after it.
    let reply = client
        .configure(&[("tool", "fio"), ("vcenterIp", "vc.lab"), ("vmNum", "20")])
        .unwrap();
    assert!(reply.is_success());
    let config = client.read_config().unwrap();
    assert_eq!(config["data"]["vcenterIp"], "vc.lab");
    let validation = client.prevalidation().unwrap();
    assert!(validation.passed, "{}", validation.message);
    assert!(validation.message.contains(VALIDATE_SUCCESS));

    // Step 7: run a test and poll until it finishes.
    assert!(client.start_testing().unwrap().is_success());
    let mut updates = Vec::new();
    while !client.is_test_finished().unwrap() {
        if let Some(status) = client.read_test_status().unwrap() {
            updates.push(status);
        }
    }
    assert_eq!(
        updates,
        [
            "Test started\nRunning test case 1\n",
            "Test started\nRunning test case 1\nRunning test case 2\n",
        ]
    );
    let last = client.read_test_status().unwrap();
    assert_eq!(
        last.as_deref(),
        Some("Test started\nRunning test case 1\nRunning test case 2\nTest finished\n")
    );
    assert_eq!(client.read_test_status().unwrap(), None);

    // Step 8: clean up.
    assert!(client.cleanup_vms().unwrap().is_success());

    let readlog = recorded(&db)
        .into_iter()
        .find(|r| r.endpoint == "readlog")
        .unwrap();
    assert_eq!(readlog.method, "GET");
}

#[test]
fn unreachable_appliance_is_a_connect_error() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let config = ClientConfig::new("127.0.0.1", "root", "vmware", Tool::Fio)
        .port(port)
        .scheme(Scheme::Http);
    let client = ApplianceClient::new(config);

    let err = client.kill_testing().unwrap_err();
    assert!(matches!(err, ApiError::Connect { .. }), "unexpected error: {err}");
}
