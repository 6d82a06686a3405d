use clap::Parser;
use quote_flow::cli::{run, Cli};
use quote_flow::init;

#[tokio::main]
async fn main() {
    init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
