use http::header::{AUTHORIZATION, CONTENT_TYPE};
use http::{HeaderValue, Method, StatusCode};
use waypoint_client::{RedirectPolicy, Request, Response};

use crate::report::Report;
use crate::server::{TestServer, echoed};
use crate::{body_text, redirecting_client};

pub async fn run(home: &TestServer) -> anyhow::Result<()> {
    let mut report = Report::new("Method Rewrite");

    report.case("POST + 303 becomes GET", rewritten(home, "/see-other").await);
    report.case("POST + 302 becomes GET", rewritten(home, "/found").await);
    report.case("POST + 307 keeps method and body", preserved(home).await);
    report.case("Referer names the previous leg", referer(home).await);
    report.case("Referer disabled", no_referer(home).await);

    report.finish()
}

fn post(home: &TestServer, path: &str) -> anyhow::Result<Request> {
    Ok(Request::parse(&home.url(path))?
        .with_method(Method::POST)
        .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
        .with_header(AUTHORIZATION, HeaderValue::from_static("Bearer home-token"))
        .with_body("payload"))
}

async fn echo(response: &mut Response) -> anyhow::Result<String> {
    anyhow::ensure!(response.status() == StatusCode::OK, "status {}", response.status());
    body_text(response).await
}

async fn rewritten(home: &TestServer, path: &str) -> anyhow::Result<()> {
    let client = redirecting_client(RedirectPolicy::default())?;
    let mut response = client.execute(post(home, path)?).await?;
    let echo = echo(&mut response).await?;

    anyhow::ensure!(echoed(&echo, "method") == Some("GET"), "echo {echo:?}");
    anyhow::ensure!(echoed(&echo, "body") == Some(""), "echo {echo:?}");
    // Same host: everything else about the request survives.
    anyhow::ensure!(
        echoed(&echo, "authorization") == Some("Bearer home-token"),
        "echo {echo:?}"
    );
    anyhow::ensure!(response.request().method() == Method::GET);
    anyhow::ensure!(response.request().body().is_none());
    Ok(())
}

async fn preserved(home: &TestServer) -> anyhow::Result<()> {
    let client = redirecting_client(RedirectPolicy::default())?;
    let mut response = client.execute(post(home, "/temporary")?).await?;
    let echo = echo(&mut response).await?;

    anyhow::ensure!(echoed(&echo, "method") == Some("POST"), "echo {echo:?}");
    anyhow::ensure!(echoed(&echo, "body") == Some("payload"), "echo {echo:?}");
    Ok(())
}

async fn referer(home: &TestServer) -> anyhow::Result<()> {
    let client = redirecting_client(RedirectPolicy::default())?;
    let mut response = client.execute(Request::parse(&home.url("/found"))?).await?;
    let echo = echo(&mut response).await?;

    let expected = home.url("/found");
    anyhow::ensure!(echoed(&echo, "referer") == Some(expected.as_str()), "echo {echo:?}");
    Ok(())
}

async fn no_referer(home: &TestServer) -> anyhow::Result<()> {
    let client = redirecting_client(RedirectPolicy::new().auto_referrer(false))?;
    let mut response = client.execute(Request::parse(&home.url("/found"))?).await?;
    let echo = echo(&mut response).await?;

    anyhow::ensure!(echoed(&echo, "referer") == Some("-"), "echo {echo:?}");
    Ok(())
}
