use http::header::AUTHORIZATION;
use http::{HeaderValue, Method, StatusCode};
use waypoint_client::{RedirectPolicy, Request};

use crate::report::Report;
use crate::server::{TestServer, echoed};
use crate::{body_text, redirecting_client};

pub async fn run(home: &TestServer, away: &TestServer) -> anyhow::Result<()> {
    let mut report = Report::new("Cross-Host Redirect");

    report.case("credentials are not forwarded", strips_headers(home, away).await);
    report.case("POST becomes a fresh GET", fresh_get(home).await);

    report.finish()
}

async fn strips_headers(home: &TestServer, away: &TestServer) -> anyhow::Result<()> {
    let client = redirecting_client(RedirectPolicy::default())?;
    let request = Request::parse(&home.url("/cross"))?
        .with_header(AUTHORIZATION, HeaderValue::from_static("Bearer home-token"));
    let mut response = client.execute(request).await?;

    anyhow::ensure!(response.status() == StatusCode::OK, "status {}", response.status());
    let landed = response.request().uri().to_string();
    anyhow::ensure!(landed == away.url("/echo"), "landed on {landed}");

    let echo = body_text(&mut response).await?;
    anyhow::ensure!(echoed(&echo, "authorization") == Some("-"), "echo {echo:?}");
    let referer = home.url("/cross");
    anyhow::ensure!(echoed(&echo, "referer") == Some(referer.as_str()), "echo {echo:?}");
    Ok(())
}

async fn fresh_get(home: &TestServer) -> anyhow::Result<()> {
    let client = redirecting_client(RedirectPolicy::default())?;
    let request = Request::parse(&home.url("/cross"))?
        .with_method(Method::PUT)
        .with_body("payload");
    let mut response = client.execute(request).await?;

    let echo = body_text(&mut response).await?;
    anyhow::ensure!(echoed(&echo, "method") == Some("GET"), "echo {echo:?}");
    anyhow::ensure!(echoed(&echo, "body") == Some(""), "echo {echo:?}");
    Ok(())
}
