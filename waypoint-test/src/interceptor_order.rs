use std::sync::{Arc, Mutex};
use std::time::Duration;

use http::StatusCode;
use waypoint_client::{
    CancellationToken, Client, ClientBuilder, FnInterceptor, HyperTransport, Interceptor,
    RedirectPolicy, Request, RetryInterceptor, RetryPolicy,
};

use crate::report::Report;
use crate::server::TestServer;

type Log = Arc<Mutex<Vec<String>>>;

pub async fn run(home: &TestServer) -> anyhow::Result<()> {
    let mut report = Report::new("Interceptor Order");

    report.case("network interceptor sees every leg", per_leg(home).await);
    report.case("application interceptor sees one call", per_call(home).await);
    report.case("cancelled call never reaches the server", cancelled(home).await);
    report.case("retry gives up on a closed port", retry_closed_port().await);

    report.finish()
}

fn logging(name: &'static str, log: Log) -> impl Interceptor {
    FnInterceptor::new(move |request, cancel, next| {
        log.lock()
            .unwrap()
            .push(format!("{name} {} {}", request.method(), request.uri().path()));
        Box::pin(async move { next.send(request, cancel).await })
    })
}

async fn traced_call(home: &TestServer) -> anyhow::Result<Vec<String>> {
    let log = Log::default();
    let client = ClientBuilder::new(HyperTransport::new()?)
        .with_interceptor(logging("app", log.clone()))
        .follow_redirects(RedirectPolicy::default())?
        .with_network_interceptor(logging("net", log.clone()))
        .build();

    let response = client.execute(Request::parse(&home.url("/chain/2"))?).await?;
    anyhow::ensure!(response.status() == StatusCode::OK, "status {}", response.status());

    let entries = log.lock().unwrap().clone();
    Ok(entries)
}

async fn per_leg(home: &TestServer) -> anyhow::Result<()> {
    let log = traced_call(home).await?;
    let network: Vec<_> = log.iter().filter(|e| e.starts_with("net ")).collect();
    anyhow::ensure!(
        network == ["net GET /chain/2", "net GET /chain/1", "net GET /chain/0"],
        "log {log:?}"
    );
    Ok(())
}

async fn per_call(home: &TestServer) -> anyhow::Result<()> {
    let log = traced_call(home).await?;
    anyhow::ensure!(log.first().map(String::as_str) == Some("app GET /chain/2"), "log {log:?}");
    anyhow::ensure!(log.iter().filter(|e| e.starts_with("app ")).count() == 1, "log {log:?}");
    Ok(())
}

async fn cancelled(home: &TestServer) -> anyhow::Result<()> {
    let log = Log::default();
    let client = ClientBuilder::new(HyperTransport::new()?)
        .follow_redirects(RedirectPolicy::default())?
        .with_network_interceptor(logging("net", log.clone()))
        .build();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = client.send(Request::parse(&home.url("/chain/3"))?, cancel).await;

    match result {
        Err(e) if e.is_cancelled() => {}
        Err(e) => anyhow::bail!("expected Cancelled, got {e}"),
        Ok(response) => anyhow::bail!("expected Cancelled, got {}", response.status()),
    }
    let log = log.lock().unwrap();
    anyhow::ensure!(log.is_empty(), "log {log:?}");
    Ok(())
}

async fn retry_closed_port() -> anyhow::Result<()> {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
        listener.local_addr()?.port()
    };

    let log = Log::default();
    let retry = RetryInterceptor::new(
        RetryPolicy::new()
            .max_retries(2)
            .base_delay(Duration::from_millis(10))
            .max_delay(Duration::from_millis(50)),
    )?;
    let client = ClientBuilder::new(HyperTransport::new()?)
        .with_interceptor(retry)
        .with_network_interceptor(logging("net", log.clone()))
        .build();

    let err = match client.execute(Request::parse(&format!("http://127.0.0.1:{port}/"))?).await {
        Err(e) => e,
        Ok(response) => anyhow::bail!("expected a transport error, got {}", response.status()),
    };
    anyhow::ensure!(err.is_transport(), "unexpected error {err}");

    let attempts = log.lock().unwrap().len();
    anyhow::ensure!(attempts == 3, "{attempts} attempts");
    Ok(())
}
