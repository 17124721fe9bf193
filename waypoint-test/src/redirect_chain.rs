use http::{Method, StatusCode};
use waypoint_client::{ClientError, RedirectPolicy, Request};

use crate::report::Report;
use crate::server::TestServer;
use crate::{body_text, redirecting_client};

pub async fn run(home: &TestServer) -> anyhow::Result<()> {
    let mut report = Report::new("Redirect Chain");

    report.case("three redirects end in 200", follows_chain(home).await);
    report.case("chain exactly at the limit", at_limit(home).await);
    report.case("redirect loop hits the limit", loop_limit(home).await);
    report.case("HEAD is not followed", head_not_followed(home).await);
    report.case("unusable Location is returned", malformed_location(home).await);
    report.case("concurrent calls share one pipeline", concurrent(home).await);

    report.finish()
}

async fn follows_chain(home: &TestServer) -> anyhow::Result<()> {
    let client = redirecting_client(RedirectPolicy::default())?;
    let mut response = client.execute(Request::parse(&home.url("/chain/3"))?).await?;

    anyhow::ensure!(response.status() == StatusCode::OK, "status {}", response.status());
    anyhow::ensure!(response.redirect_count() == 3, "redirect_count {}", response.redirect_count());
    anyhow::ensure!(response.request().uri().path() == "/chain/0");

    let paths: Vec<_> = response.history().map(|r| r.request().uri().path().to_string()).collect();
    anyhow::ensure!(
        paths == ["/chain/1", "/chain/2", "/chain/3"],
        "history {paths:?}"
    );

    let body = body_text(&mut response).await?;
    anyhow::ensure!(body == "done", "body {body:?}");
    Ok(())
}

async fn at_limit(home: &TestServer) -> anyhow::Result<()> {
    let client = redirecting_client(RedirectPolicy::new().max_redirects(5))?;
    let response = client.execute(Request::parse(&home.url("/chain/5"))?).await?;

    anyhow::ensure!(response.status() == StatusCode::OK, "status {}", response.status());
    anyhow::ensure!(response.redirect_count() == 5, "redirect_count {}", response.redirect_count());
    Ok(())
}

async fn loop_limit(home: &TestServer) -> anyhow::Result<()> {
    let client = redirecting_client(RedirectPolicy::new().max_redirects(5))?;
    let result = client.execute(Request::parse(&home.url("/loop"))?).await;

    match result {
        Err(ClientError::TooManyRedirects { max, response }) => {
            anyhow::ensure!(max == 5, "max {max}");
            anyhow::ensure!(response.status() == StatusCode::FOUND, "status {}", response.status());
            anyhow::ensure!(response.redirect_count() == 5, "redirect_count {}", response.redirect_count());
            Ok(())
        }
        Err(e) => anyhow::bail!("expected TooManyRedirects, got {e}"),
        Ok(response) => anyhow::bail!("expected TooManyRedirects, got {}", response.status()),
    }
}

async fn head_not_followed(home: &TestServer) -> anyhow::Result<()> {
    let client = redirecting_client(RedirectPolicy::default())?;
    let request = Request::parse(&home.url("/chain/1"))?.with_method(Method::HEAD);
    let response = client.execute(request).await?;

    anyhow::ensure!(response.status() == StatusCode::FOUND, "status {}", response.status());
    anyhow::ensure!(response.location() == Some("/chain/0"), "location {:?}", response.location());
    anyhow::ensure!(response.redirect_count() == 0, "redirect_count {}", response.redirect_count());
    Ok(())
}

async fn malformed_location(home: &TestServer) -> anyhow::Result<()> {
    let client = redirecting_client(RedirectPolicy::default())?;
    let response = client.execute(Request::parse(&home.url("/malformed"))?).await?;

    anyhow::ensure!(response.status() == StatusCode::FOUND, "status {}", response.status());
    anyhow::ensure!(response.redirect_count() == 0, "redirect_count {}", response.redirect_count());
    Ok(())
}

async fn concurrent(home: &TestServer) -> anyhow::Result<()> {
    let client = redirecting_client(RedirectPolicy::default())?;

    let mut handles = Vec::new();
    for n in 0..8 {
        let client = client.clone();
        let url = home.url(&format!("/chain/{n}"));
        handles.push(tokio::spawn(async move {
            let response = client.execute(Request::parse(&url)?).await?;
            anyhow::Ok((n, response.status(), response.redirect_count()))
        }));
    }

    for handle in handles {
        let (n, status, redirects) = handle.await??;
        anyhow::ensure!(status == StatusCode::OK, "chain/{n}: status {status}");
        anyhow::ensure!(redirects == n, "chain/{n}: {redirects} redirects");
    }
    Ok(())
}
