//! a2a-dispatch: terminal front-end for the dispatcher.
//!
//! Reads one query per line from stdin, prints the routing decision and the
//! evolving answer. Configuration comes from the environment (a `.env` file
//! is loaded if present); logs go to stderr, filtered by `RUST_LOG`.

use a2a_dispatch::prelude::*;
use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = DispatcherConfig::from_env().context("failed to read configuration")?;
    let dispatcher = DispatcherBuilder::from_config(&config)
        .build()
        .context("failed to build dispatcher")?;

    for (kind, card) in dispatcher.discover_agents().await {
        match card {
            Some(card) => tracing::info!(
                agent = %kind,
                name = card.name().unwrap_or("unnamed"),
                streaming = card.supports_streaming(),
                "discovered agent"
            ),
            None => tracing::warn!(agent = %kind, "agent card unavailable"),
        }
    }

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if matches!(query, "exit" | "quit") {
            break;
        }

        let (decision, reply) = dispatcher.dispatch(query).await;
        let label = decision.label().to_ascii_uppercase();
        stdout
            .write_all(format!("Routing to {label} agent...\n").as_bytes())
            .await?;

        match reply {
            Reply::Text(text) => {
                stdout.write_all(format!("{text}\n").as_bytes()).await?;
            }
            Reply::Stream(mut live) => {
                let mut shown = String::new();
                while let Some(snapshot) = live.next().await {
                    match snapshot {
                        Ok(result) => {
                            if !result.content.is_empty() && result.content != shown {
                                stdout.write_all(format!("{}\n", result.content).as_bytes()).await?;
                                shown = result.content;
                            }
                            if let Some(error) = &result.error {
                                stdout.write_all(format!("[error] {error}\n").as_bytes()).await?;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "stream broke before completion");
                            break;
                        }
                    }
                }
            }
        }
        stdout.flush().await?;
    }

    Ok(())
}
