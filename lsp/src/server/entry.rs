use tower_lsp::{LspService, Server};

use super::state::Mf6LanguageServer;

pub async fn run() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(Mf6LanguageServer::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
