#[tokio::main]
async fn main() -> anyhow::Result<()> {
    reservaya_backend::run().await
}
