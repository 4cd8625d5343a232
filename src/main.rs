#[tokio::main]
async fn main() -> anyhow::Result<()> {
    nugetfee::node::run_cli().await
}
