mod cross_host;
mod interceptor_order;
mod method_rewrite;
mod redirect_chain;
mod report;
mod server;

use waypoint_client::{ClientBuilder, HyperTransport, Pipeline, RedirectPolicy};

use crate::server::TestServer;

/// A pipeline over the real transport that follows redirects.
pub fn redirecting_client(policy: RedirectPolicy) -> anyhow::Result<Pipeline> {
    Ok(ClientBuilder::new(HyperTransport::new()?)
        .follow_redirects(policy)?
        .build())
}

/// Read a response body as UTF-8.
pub async fn body_text(response: &mut waypoint_client::Response) -> anyhow::Result<String> {
    let bytes = response.bytes().await?;
    Ok(String::from_utf8(bytes.to_vec())?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,waypoint_client=debug".parse().unwrap()),
        )
        .init();

    let (home, away) = TestServer::pair().await?;
    tracing::info!(home = %home.url("/"), away = %away.url("/"), "test servers listening");

    redirect_chain::run(&home).await?;
    method_rewrite::run(&home).await?;
    cross_host::run(&home, &away).await?;
    interceptor_order::run(&home).await
}
