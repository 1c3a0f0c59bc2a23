use clap::Parser;
use orasort::cli::{self, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    cli::init_tracing(&cli);

    if let Err(error) = cli::run(cli).await {
        tracing::error!(%error, "sort job failed");
        std::process::exit(error.exit_code());
    }
}
