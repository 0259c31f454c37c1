#[tokio::main]
async fn main() {
    mf6_lsp::run().await;
}
