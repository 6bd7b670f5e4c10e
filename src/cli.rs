use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

use crate::error::Result;
use crate::node::{BatchContext, Credentials, Dispatcher, OperationRegistry};
use crate::storage::StorageClient;
use crate::wrap_err;

const STDIN_NAME: &str = "<stdin>";

#[derive(Parser, Debug)]
#[command(
    name = "storeflow",
    version,
    about = "Run object storage operations over a batch of workflow items"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a batch read as JSON from a file or stdin
    Run(RunArgs),
    /// List supported operation codes
    Operations,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Batch document to read; stdin when omitted
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Record failed items in the output instead of aborting the batch
    #[arg(long)]
    pub continue_on_fail: bool,

    /// Pretty-print the output items
    #[arg(long)]
    pub pretty: bool,
}

/// Print the supported operation codes, one per line.
pub fn list_operations(registry: &OperationRegistry) -> Result<()> {
    for code in registry.list_supported() {
        println!("{code}");
    }
    Ok(())
}

/// Run one batch and print its output items as JSON on stdout.
pub async fn run<C: StorageClient>(
    args: RunArgs,
    registry: &OperationRegistry,
    client: &C,
    credentials: &Credentials,
) -> Result<()> {
    let mut batch = read_batch(args.input.as_ref()).await?;
    batch.continue_on_fail |= args.continue_on_fail;
    log::debug!(
        "running batch items={} continue_on_fail={}",
        batch.items.len(),
        batch.continue_on_fail
    );

    let outputs = Dispatcher::new(registry, client)
        .run(&batch, Some(credentials))
        .await?;

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&outputs)?
    } else {
        serde_json::to_string(&outputs)?
    };
    println!("{rendered}");
    Ok(())
}

async fn read_batch(input: Option<&PathBuf>) -> Result<BatchContext> {
    let (name, text) = match input {
        Some(path) => {
            let name = path.display().to_string();
            let text = wrap_err!(
                tokio::fs::read_to_string(path).await,
                ReadBatchFailed { path: name.clone() }
            )?;
            (name, text)
        }
        None => {
            let mut text = String::new();
            wrap_err!(
                tokio::io::stdin().read_to_string(&mut text).await,
                ReadBatchFailed {
                    path: STDIN_NAME.to_string()
                }
            )?;
            (STDIN_NAME.to_string(), text)
        }
    };
    wrap_err!(
        serde_json::from_str::<BatchContext>(&text),
        ReadBatchFailed { path: name }
    )
}
