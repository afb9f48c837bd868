//! Command-line entry point.
//!
//! ```text
//! ragflow                      read a {"query": ...} event from stdin
//! ragflow --query <text>       build the event from the argument
//! ragflow index <file.json>    index a JSON array of products
//! ```
//!
//! Configuration comes from the environment (see `PipelineConfig::from_env`).

use anyhow::{bail, Context};
use ragflow::events::{EventSink, LoggingEventSink};
use ragflow::handler::RecommendationHandler;
use ragflow::indexing::{load_products, ProductIndexer};
use ragflow::observability::{init_tracing, LogFormat};
use ragflow::pipeline::workflows;
use ragflow::ports::Embedder;
use ragflow::{config::PipelineConfig, providers::Services};
use std::io::Read;
use std::sync::Arc;

const USAGE: &str = "usage: ragflow [--query <text>] | ragflow index <products.json>";

enum Command {
    Handle(Option<String>),
    Index(String),
    Help,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Command> {
    match args.next().as_deref() {
        None => Ok(Command::Handle(None)),
        Some("-h" | "--help") => Ok(Command::Help),
        Some("-q" | "--query") => {
            let query = args.next().context("--query needs a value")?;
            Ok(Command::Handle(Some(query)))
        }
        Some("index") => {
            let path = args.next().context("index needs a products file")?;
            Ok(Command::Index(path))
        }
        Some(other) => bail!("unknown argument '{other}'\n{USAGE}"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let format: LogFormat = std::env::var("RAGFLOW_LOG_FORMAT")
        .unwrap_or_default()
        .parse()?;
    init_tracing(format)?;

    let command = parse_args(std::env::args().skip(1))?;
    if matches!(command, Command::Help) {
        println!("{USAGE}");
        return Ok(());
    }

    let config = PipelineConfig::from_env()?;
    let services = Services::from_config(&config).context("invalid configuration")?;

    match command {
        Command::Handle(query) => {
            let event = match query {
                Some(query) => serde_json::json!({ "query": query }),
                None => {
                    let mut input = String::new();
                    std::io::stdin()
                        .read_to_string(&mut input)
                        .context("failed to read event from stdin")?;
                    serde_json::from_str(&input).context("stdin is not a JSON event")?
                }
            };

            let sink: Arc<dyn EventSink> = Arc::new(LoggingEventSink::debug());
            let pipeline =
                workflows::build(services.retriever, services.generator, &config, Some(sink))?;
            let response = RecommendationHandler::new(pipeline, &config).handle(&event).await;
            println!("{}", serde_json::to_string(&response)?);
        }
        Command::Index(path) => {
            let products = load_products(&path).with_context(|| format!("failed to load products from {path}"))?;

            let indexer = ProductIndexer::new(
                services.index,
                services.embedder as Arc<dyn Embedder>,
                config.vector_store.dimension,
            );
            let count = indexer.index_all(&products).await?;
            println!("indexed {count} products into {}", config.vector_store.index);
        }
        Command::Help => {}
    }

    Ok(())
}
