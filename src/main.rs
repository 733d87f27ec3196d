#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = learnbridge_gateway::run().await {
        eprintln!("learnbridge-gateway fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
