use clap::Parser;

use storeflow::cli::{self, Args, Command};
use storeflow::config::{credentials, load_storage_config};
use storeflow::error::Result;
use storeflow::node::OperationRegistry;
use storeflow::storage::OpenDalClient;

#[tokio::main]
async fn main() {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let args = Args::parse();

    if let Err(e) = run_app(args).await {
        match e.item_index() {
            Some(index) => eprintln!("Error (item {index}): {e}"),
            None => eprintln!("Error: {e}"),
        }
        std::process::exit(1);
    }
}

async fn run_app(args: Args) -> Result<()> {
    let registry = OperationRegistry::standard();
    match args.command {
        Command::Operations => cli::list_operations(&registry),
        Command::Run(run_args) => {
            let config = load_storage_config()?;
            let credentials = credentials(&config);
            let client = OpenDalClient::new(config).await?;
            cli::run(run_args, &registry, &client, &credentials).await
        }
    }
}
