#[tokio::main]
async fn main() -> anyhow::Result<()> {
    citecatch_lib::run().await
}
