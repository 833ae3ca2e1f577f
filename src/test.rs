//! In-process mock ACME server for the test suite.
//!
//! State lives in atomics so tests can assert how the client drove the
//! protocol; resource status advances when the client confirms a
//! challenge and when it finalizes the order.

use std::{
    convert::Infallible,
    future::ready,
    net::TcpListener,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

use actix_http::{HttpService, Method, Request, Response, ResponseBuilder, StatusCode};
use actix_server::{Server, ServerHandle};
use actix_web::body::BoxBody;
use serde_json::json;

pub struct MockState {
    pub new_nonce_hits: AtomicUsize,
    pub challenge_confirms: AtomicUsize,
    pub finalized: AtomicBool,
    pub revoked: AtomicBool,
    pub slow_auth_hits: AtomicUsize,
    pub stuck_auth_hits: AtomicUsize,
}

pub struct TestServer {
    pub base_url: String,
    pub dir_url: String,

    /// PEM chain the mock issues: leaf for `example.org`, then its CA.
    pub cert_pem: String,

    /// DER of the issued leaf.
    pub cert_der: Vec<u8>,

    pub state: Arc<MockState>,
    handle: ServerHandle,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        drop(self.handle.stop(false));
    }
}

#[derive(Clone)]
struct Ctx {
    url: String,
    cert_pem: String,
    state: Arc<MockState>,
}

/// Every response carries a nonce so the client's slot stays filled.
fn respond(status: StatusCode) -> ResponseBuilder {
    let mut res = Response::build(status);
    res.insert_header(("Replay-Nonce", "8_uBBV3N2DBRJczhoiB46ugJKUkUHxGzVe6xIMpjHFM"));
    res
}

fn json_body(mut res: ResponseBuilder, body: serde_json::Value) -> Response<BoxBody> {
    res.insert_header(("Content-Type", "application/json"));
    res.body(body.to_string()).map_into_boxed_body()
}

fn get_directory(ctx: &Ctx) -> Response<BoxBody> {
    json_body(
        respond(StatusCode::OK),
        json!({
            "newNonce": format!("{}/acme/new-nonce", ctx.url),
            "newAccount": format!("{}/acme/new-acct", ctx.url),
            "newOrder": format!("{}/acme/new-order", ctx.url),
            "revokeCert": format!("{}/acme/revoke-cert", ctx.url),
            "keyChange": format!("{}/acme/key-change", ctx.url),
            "meta": { "caaIdentities": ["testdir.org"] },
        }),
    )
}

fn head_new_nonce(ctx: &Ctx) -> Response<BoxBody> {
    ctx.state.new_nonce_hits.fetch_add(1, Ordering::SeqCst);
    respond(StatusCode::NO_CONTENT).finish().map_into_boxed_body()
}

fn post_new_acct(ctx: &Ctx) -> Response<BoxBody> {
    let mut res = respond(StatusCode::CREATED);
    res.insert_header(("Location", format!("{}/acme/acct/1", ctx.url)));
    json_body(
        res,
        json!({
            "status": "valid",
            "contact": ["mailto:admin@example.org"],
            "orders": format!("{}/acme/acct/1/orders", ctx.url),
        }),
    )
}

fn order_object(ctx: &Ctx) -> serde_json::Value {
    let finalized = ctx.state.finalized.load(Ordering::SeqCst);
    let confirmed = ctx.state.challenge_confirms.load(Ordering::SeqCst) > 0;

    let status = if finalized {
        "valid"
    } else if confirmed {
        "ready"
    } else {
        "pending"
    };

    let mut order = json!({
        "status": status,
        "expires": "2026-12-31T00:00:00Z",
        "identifiers": [{ "type": "dns", "value": "example.org" }],
        "authorizations": [format!("{}/acme/authz/1", ctx.url)],
        "finalize": format!("{}/acme/finalize/1", ctx.url),
    });

    if finalized {
        order["certificate"] = json!(format!("{}/acme/cert/1", ctx.url));
    }

    order
}

fn post_new_order(ctx: &Ctx) -> Response<BoxBody> {
    let mut res = respond(StatusCode::CREATED);
    res.insert_header(("Location", format!("{}/acme/order/1", ctx.url)));
    json_body(res, order_object(ctx))
}

fn post_get_order(ctx: &Ctx) -> Response<BoxBody> {
    json_body(respond(StatusCode::OK), order_object(ctx))
}

fn authz_object(ctx: &Ctx, status: &str) -> serde_json::Value {
    json!({
        "identifier": { "type": "dns", "value": "example.org" },
        "status": status,
        "expires": "2026-12-31T00:00:00Z",
        "challenges": [
            {
                "type": "http-01",
                "status": if status == "valid" { "valid" } else { "pending" },
                "url": format!("{}/acme/chall/1", ctx.url),
                "token": "abc123",
            },
            {
                "type": "dns-01",
                "status": if status == "valid" { "valid" } else { "pending" },
                "url": format!("{}/acme/chall/2", ctx.url),
                "token": "def456",
            },
        ],
    })
}

fn post_authz(ctx: &Ctx) -> Response<BoxBody> {
    let status = if ctx.state.challenge_confirms.load(Ordering::SeqCst) > 0 {
        "valid"
    } else {
        "pending"
    };
    json_body(respond(StatusCode::OK), authz_object(ctx, status))
}

/// Turns valid on the third fetch.
fn post_authz_slow(ctx: &Ctx) -> Response<BoxBody> {
    let hits = ctx.state.slow_auth_hits.fetch_add(1, Ordering::SeqCst) + 1;
    let status = if hits >= 3 { "valid" } else { "pending" };
    json_body(respond(StatusCode::OK), authz_object(ctx, status))
}

/// Never leaves pending.
fn post_authz_stuck(ctx: &Ctx) -> Response<BoxBody> {
    ctx.state.stuck_auth_hits.fetch_add(1, Ordering::SeqCst);
    json_body(respond(StatusCode::OK), authz_object(ctx, "pending"))
}

fn post_challenge(ctx: &Ctx, url: &str, token: &str) -> Response<BoxBody> {
    ctx.state.challenge_confirms.fetch_add(1, Ordering::SeqCst);
    json_body(
        respond(StatusCode::OK),
        json!({
            "type": if token == "abc123" { "http-01" } else { "dns-01" },
            "status": "processing",
            "url": url,
            "token": token,
        }),
    )
}

fn post_finalize(ctx: &Ctx) -> Response<BoxBody> {
    ctx.state.finalized.store(true, Ordering::SeqCst);
    json_body(respond(StatusCode::OK), order_object(ctx))
}

fn post_certificate(ctx: &Ctx) -> Response<BoxBody> {
    let mut res = respond(StatusCode::OK);
    res.insert_header(("Content-Type", "application/pem-certificate-chain"));
    res.body(ctx.cert_pem.clone()).map_into_boxed_body()
}

fn post_revoke(ctx: &Ctx) -> Response<BoxBody> {
    ctx.state.revoked.store(true, Ordering::SeqCst);
    respond(StatusCode::OK).finish().map_into_boxed_body()
}

fn route_request(req: Request, ctx: &Ctx) -> Response<BoxBody> {
    match (req.method(), req.path()) {
        (&Method::GET, "/directory") => get_directory(ctx),
        (&Method::HEAD, "/acme/new-nonce") => head_new_nonce(ctx),
        (&Method::POST, "/acme/new-acct") => post_new_acct(ctx),
        (&Method::POST, "/acme/new-order") => post_new_order(ctx),
        (&Method::POST, "/acme/order/1") => post_get_order(ctx),
        (&Method::POST, "/acme/authz/1") => post_authz(ctx),
        (&Method::POST, "/acme/authz/slow") => post_authz_slow(ctx),
        (&Method::POST, "/acme/authz/stuck") => post_authz_stuck(ctx),
        (&Method::POST, "/acme/chall/1") => {
            let url = format!("{}/acme/chall/1", ctx.url);
            post_challenge(ctx, &url, "abc123")
        }
        (&Method::POST, "/acme/chall/2") => {
            let url = format!("{}/acme/chall/2", ctx.url);
            post_challenge(ctx, &url, "def456")
        }
        (&Method::POST, "/acme/finalize/1") => post_finalize(ctx),
        (&Method::POST, "/acme/cert/1") => post_certificate(ctx),
        (&Method::POST, "/acme/revoke-cert") => post_revoke(ctx),

        (_, _) => respond(StatusCode::NOT_FOUND).finish().map_into_boxed_body(),
    }
}

fn issue_chain() -> (String, Vec<u8>) {
    let ca_key = rcgen::KeyPair::generate().unwrap();
    let mut ca_params = rcgen::CertificateParams::new(Vec::new()).unwrap();
    ca_params.is_ca = rcgen::IsCa::Ca(rcgen::BasicConstraints::Unconstrained);
    let ca = ca_params.self_signed(&ca_key).unwrap();

    let leaf_key = rcgen::KeyPair::generate().unwrap();
    let leaf = rcgen::CertificateParams::new(vec!["example.org".to_owned()])
        .unwrap()
        .signed_by(&leaf_key, &ca, &ca_key)
        .unwrap();

    let chain_pem = format!("{}{}", leaf.pem(), ca.pem());
    (chain_pem, leaf.der().to_vec())
}

pub fn with_directory_server() -> TestServer {
    let _ = env_logger::builder().is_test(true).try_init();

    let lst = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = lst.local_addr().unwrap().port();

    let base_url = format!("http://127.0.0.1:{port}");
    let dir_url = format!("{base_url}/directory");

    let (cert_pem, cert_der) = issue_chain();

    let state = Arc::new(MockState {
        new_nonce_hits: AtomicUsize::new(0),
        challenge_confirms: AtomicUsize::new(0),
        finalized: AtomicBool::new(false),
        revoked: AtomicBool::new(false),
        slow_auth_hits: AtomicUsize::new(0),
        stuck_auth_hits: AtomicUsize::new(0),
    });

    let ctx = Ctx {
        url: base_url.clone(),
        cert_pem: cert_pem.clone(),
        state: Arc::clone(&state),
    };

    let server = Server::build()
        .listen("acme", lst, move || {
            let ctx = ctx.clone();

            HttpService::build()
                .finish(move |req| ready(Ok::<_, Infallible>(route_request(req, &ctx))))
                .tcp()
        })
        .unwrap()
        .workers(1)
        .run();

    let handle = server.handle();

    tokio::spawn(server);

    TestServer {
        base_url,
        dir_url,
        cert_pem,
        cert_der,
        state,
        handle,
    }
}

#[tokio::test]
pub async fn test_make_directory() {
    let server = with_directory_server();
    let res = reqwest::get(&server.dir_url).await.unwrap();
    assert!(res.status().is_success());
}
