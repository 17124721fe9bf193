//! Loopback HTTP servers that redirect in known ways.

use std::net::SocketAddr;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::header::{AUTHORIZATION, LOCATION, REFERER};
use axum::http::{HeaderMap, HeaderName, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Clone)]
struct AppState {
    /// The other server, for cross-host redirects.
    peer: SocketAddr,
}

/// A running test server. Aborted on drop.
pub struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start two servers that know each other's address.
    pub async fn pair() -> anyhow::Result<(TestServer, TestServer)> {
        let a = TcpListener::bind("127.0.0.1:0").await?;
        let b = TcpListener::bind("127.0.0.1:0").await?;
        let (a_addr, b_addr) = (a.local_addr()?, b.local_addr()?);
        Ok((serve(a, a_addr, b_addr), serve(b, b_addr, a_addr)))
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn serve(listener: TcpListener, addr: SocketAddr, peer: SocketAddr) -> TestServer {
    let app = Router::new()
        .route("/chain/{n}", get(chain))
        .route("/loop", any(|| async { redirect(StatusCode::FOUND, "/loop") }))
        .route("/see-other", any(|| async { redirect(StatusCode::SEE_OTHER, "/echo") }))
        .route("/temporary", any(|| async { redirect(StatusCode::TEMPORARY_REDIRECT, "/echo") }))
        .route("/found", any(|| async { redirect(StatusCode::FOUND, "/echo") }))
        .route("/malformed", get(|| async { redirect(StatusCode::FOUND, "ftp://files.example/x") }))
        .route("/cross", any(cross))
        .route("/echo", any(echo))
        .with_state(AppState { peer });

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("test server error: {e}");
        }
    });

    TestServer { addr, handle }
}

fn redirect(status: StatusCode, location: &str) -> Response {
    (status, [(LOCATION, location.to_string())], "redirecting").into_response()
}

/// `/chain/n` redirects to `/chain/n-1`; `/chain/0` answers 200.
async fn chain(Path(n): Path<u32>) -> Response {
    match n.checked_sub(1) {
        Some(next) => redirect(StatusCode::FOUND, &format!("/chain/{next}")),
        None => (StatusCode::OK, "done").into_response(),
    }
}

async fn cross(State(state): State<AppState>) -> Response {
    redirect(StatusCode::FOUND, &format!("http://{}/echo", state.peer))
}

/// Describe the request as `key=value` lines.
async fn echo(method: Method, headers: HeaderMap, body: String) -> String {
    format!(
        "method={method}\nbody={body}\nreferer={}\nauthorization={}\n",
        header(&headers, REFERER),
        header(&headers, AUTHORIZATION),
    )
}

fn header(headers: &HeaderMap, name: HeaderName) -> &str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}

/// Pick `key` out of an `/echo` response.
pub fn echoed<'a>(echo: &'a str, key: &str) -> Option<&'a str> {
    echo.lines()
        .filter_map(|line| line.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}
