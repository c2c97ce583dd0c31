#[tokio::main]
async fn main() -> anyhow::Result<()> {
    txfuzz::node::run_cli().await
}
