use asearch_client::SearchClient;
use asearch_core::AppConfig;

/// Calls `/api/ping` and reports the answer.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the backend is
/// unreachable after retries.
pub(crate) async fn run_ping(config: &AppConfig) -> anyhow::Result<()> {
    let client = SearchClient::from_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build search client: {e}"))?;

    let pong = client
        .ping()
        .await
        .map_err(|e| anyhow::anyhow!("ping to {} failed: {e}", client.base_url()))?;

    if pong {
        println!("pong from {}", client.base_url());
    } else {
        println!("{} answered without pong", client.base_url());
    }
    Ok(())
}
