use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use rackview_infra::enrichment::UNKNOWN;
use rackview_infra::proxmox::ProxmoxSource;
use rackview_infra::{FetchError, FetchRequest, InventorySource};
use rackview_model::{DeviceStatus, VmStatus};
use rackview_store::{ConnectionParams, MemoryStorage, SessionStore, SessionTicket, Stored};
use serde_json::{Value, json};

const TICKET: &str = "PVE:root@pam:good";

#[derive(Default)]
struct FakeCluster {
    logins: AtomicUsize,
    reject_tickets: AtomicBool,
}

type Reply = (StatusCode, Json<Value>);

fn ok(data: Value) -> Reply {
    (StatusCode::OK, Json(json!({ "data": data })))
}

fn fail(status: StatusCode) -> Reply {
    (status, Json(json!({ "data": null })))
}

fn authorized(cluster: &FakeCluster, headers: &HeaderMap) -> bool {
    !cluster.reject_tickets.load(Ordering::SeqCst)
        && headers.get("authorization").and_then(|v| v.to_str().ok())
            == Some(&format!("PVEAuthCookie={TICKET}")[..])
}

async fn login(State(cluster): State<Arc<FakeCluster>>, body: String) -> Reply {
    cluster.logins.fetch_add(1, Ordering::SeqCst);
    if body.contains("password=secret") {
        ok(json!({ "ticket": TICKET, "CSRFPreventionToken": "csrf" }))
    } else {
        fail(StatusCode::UNAUTHORIZED)
    }
}

async fn nodes(State(cluster): State<Arc<FakeCluster>>, headers: HeaderMap) -> Reply {
    if !authorized(&cluster, &headers) {
        return fail(StatusCode::UNAUTHORIZED);
    }
    ok(json!([
        { "node": "pve1", "status": "online", "ip": "192.168.1.101" },
        { "node": "pve2", "status": "unknown" }
    ]))
}

async fn node_status(Path(node): Path<String>) -> Reply {
    match node.as_str() {
        "pve1" => ok(json!({
            "cpuinfo": { "model": "AMD EPYC 7302", "cpus": 32 },
            "memory": { "total": 274877906944u64, "used": 1 }
        })),
        _ => fail(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

async fn qemu(Path(node): Path<String>) -> Reply {
    match node.as_str() {
        "pve1" => ok(json!([
            { "vmid": 100, "name": "web", "status": "running", "cpus": 4, "maxmem": 8589934592u64 },
            { "vmid": 101, "status": "stopped", "maxmem": 2147483648u64 }
        ])),
        _ => fail(StatusCode::SERVICE_UNAVAILABLE),
    }
}

async fn qemu_config(Path((_node, vmid)): Path<(String, u32)>) -> Reply {
    match vmid {
        100 => ok(json!({
            "ostype": "l26",
            "scsi0": "local-lvm:vm-100-disk-0,size=32G",
            "sata1": "local-lvm:vm-100-disk-1,size=512M",
            "ide2": "none,media=cdrom"
        })),
        _ => fail(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

async fn agent(Path((_node, vmid)): Path<(String, u32)>) -> Reply {
    match vmid {
        100 => ok(json!({ "result": [
            { "name": "lo", "ip-addresses": [{ "ip-address-type": "ipv6", "ip-address": "::1" }] },
            { "name": "eth0", "ip-addresses": [{ "ip-address-type": "ipv4", "ip-address": "10.0.0.50" }] }
        ] })),
        _ => fail(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

async fn serve(cluster: Arc<FakeCluster>) -> String {
    let router = Router::new()
        .route("/api2/json/access/ticket", post(login))
        .route("/api2/json/nodes", get(nodes))
        .route("/api2/json/nodes/{node}/status", get(node_status))
        .route("/api2/json/nodes/{node}/qemu", get(qemu))
        .route("/api2/json/nodes/{node}/qemu/{vmid}/config", get(qemu_config))
        .route(
            "/api2/json/nodes/{node}/qemu/{vmid}/agent/network-get-interfaces",
            get(agent),
        )
        .with_state(cluster);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/api2/json")
}

fn params(url: &str) -> ConnectionParams {
    ConnectionParams {
        url: url.to_string(),
        username: "root@pam".into(),
        use_mock_data: false,
    }
}

fn source() -> (ProxmoxSource, SessionStore) {
    let session = SessionStore::new(Arc::new(MemoryStorage::new()));
    (ProxmoxSource::new(session.clone(), reqwest::Client::new()), session)
}

#[tokio::test]
async fn fetch_builds_inventory_and_degrades_enrichment() {
    let cluster = Arc::new(FakeCluster::default());
    let url = serve(cluster.clone()).await;
    let (source, session) = source();

    let snapshot = source
        .fetch(&FetchRequest::new(&params(&url), Some("secret")))
        .await
        .unwrap();

    assert!(snapshot.is_valid(), "{:?}", snapshot.validate());
    assert!(session.cached_ticket().is_some());

    let pve1 = snapshot.device("node-pve1").unwrap();
    assert_eq!(pve1.status, DeviceStatus::Online);
    assert_eq!(pve1.ip_address.as_deref(), Some("192.168.1.101"));
    assert_eq!(pve1.rack_id.as_deref(), Some("rack-1"));
    match &pve1.kind {
        rackview_model::DeviceKind::Node(spec) => {
            assert_eq!(spec.cpu_model, "AMD EPYC 7302");
            assert_eq!(spec.cpu_cores, 32);
            assert_eq!(spec.memory, 256 << 30);
        }
        other => panic!("unexpected kind {other:?}"),
    }

    // pve2's status call fails: placeholders, not an error.
    let pve2 = snapshot.device("node-pve2").unwrap();
    assert_eq!(pve2.status, DeviceStatus::Offline);
    match &pve2.kind {
        rackview_model::DeviceKind::Node(spec) => {
            assert_eq!(spec.cpu_model, UNKNOWN);
            assert_eq!(spec.cpu_cores, 0);
        }
        other => panic!("unexpected kind {other:?}"),
    }

    // pve2's VM listing fails: it simply contributes no VMs.
    assert_eq!(snapshot.vms.len(), 2);

    let web = snapshot.vm("vm-100").unwrap();
    assert_eq!(web.status, VmStatus::Running);
    assert_eq!(web.os, "Linux 2.6/3.x/4.x/5.x");
    assert_eq!(web.disk, 32.5);
    assert_eq!(web.ip_address, "10.0.0.50");
    assert_eq!(web.memory, 8192);
    assert_eq!(web.cpu_cores, 4);
    assert_eq!(web.node_id, "node-pve1");

    let unnamed = snapshot.vm("vm-101").unwrap();
    assert_eq!(unnamed.name, "VM 101");
    assert_eq!(unnamed.status, VmStatus::Stopped);
    assert_eq!(unnamed.os, UNKNOWN);
    assert_eq!(unnamed.ip_address, UNKNOWN);
    assert_eq!(unnamed.disk, 0.0);
    assert_eq!(unnamed.cpu_cores, 1);
    assert_eq!(unnamed.memory, 2048);

    assert!(snapshot.placeable().all(|d| d.rack_id.as_deref() == Some("rack-1")));
}

#[tokio::test]
async fn cached_ticket_skips_login() {
    let cluster = Arc::new(FakeCluster::default());
    let url = serve(cluster.clone()).await;
    let (source, session) = source();
    session
        .save_ticket(&SessionTicket::new(TICKET, "csrf", Utc::now()))
        .unwrap();

    source
        .fetch(&FetchRequest::new(&params(&url), None))
        .await
        .unwrap();

    assert_eq!(cluster.logins.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_ticket_and_password_requires_authentication() {
    let cluster = Arc::new(FakeCluster::default());
    let url = serve(cluster.clone()).await;
    let (source, _) = source();

    let err = source
        .fetch(&FetchRequest::new(&params(&url), None))
        .await
        .unwrap_err();

    assert_eq!(err, FetchError::AuthenticationRequired);
    assert_eq!(cluster.logins.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn wrong_password_fails_authentication() {
    let cluster = Arc::new(FakeCluster::default());
    let url = serve(cluster).await;
    let (source, session) = source();

    let err = source
        .fetch(&FetchRequest::new(&params(&url), Some("nope")))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::AuthenticationFailed(_)), "{err:?}");
    assert!(session.cached_ticket().is_none());
}

#[tokio::test]
async fn rejected_ticket_expires_session_and_purges_it() {
    let cluster = Arc::new(FakeCluster::default());
    let url = serve(cluster.clone()).await;
    let (source, session) = source();
    session
        .save_ticket(&SessionTicket::new(TICKET, "csrf", Utc::now()))
        .unwrap();
    cluster.reject_tickets.store(true, Ordering::SeqCst);

    let err = source
        .fetch(&FetchRequest::new(&params(&url), None))
        .await
        .unwrap_err();

    assert_eq!(err, FetchError::SessionExpired);
    assert!(session.cached_ticket().is_none());
}

#[tokio::test]
async fn ticket_past_its_window_expires_session() {
    let cluster = Arc::new(FakeCluster::default());
    let url = serve(cluster.clone()).await;
    let (source, session) = source();
    let issued = Utc::now() - chrono::Duration::hours(3);
    session
        .save_ticket(&SessionTicket::new(TICKET, "csrf", issued))
        .unwrap();

    let err = source
        .fetch(&FetchRequest::new(&params(&url), None))
        .await
        .unwrap_err();

    assert_eq!(err, FetchError::SessionExpired);
    assert!(matches!(session.inspect_ticket(), Stored::Absent));
    assert_eq!(cluster.logins.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn ticket_past_its_window_is_replaced_when_password_given() {
    let cluster = Arc::new(FakeCluster::default());
    let url = serve(cluster.clone()).await;
    let (source, session) = source();
    let issued = Utc::now() - chrono::Duration::hours(3);
    session
        .save_ticket(&SessionTicket::new(TICKET, "csrf", issued))
        .unwrap();

    source
        .fetch(&FetchRequest::new(&params(&url), Some("secret")))
        .await
        .unwrap();

    assert_eq!(cluster.logins.load(Ordering::SeqCst), 1);
    assert!(session.cached_ticket().is_some());
}

#[tokio::test]
async fn unreachable_endpoint_is_a_network_error() {
    let (source, _) = source();

    let err = source
        .fetch(&FetchRequest::new(&params("http://127.0.0.1:9/api2/json"), Some("secret")))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::NetworkUnreachable(_)), "{err:?}");
}
