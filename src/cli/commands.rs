//! CLI commands

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::agent::{accommodation, weather};
use crate::config::{Config, ServerConfig};
use crate::llm::{ChatModel, OpenAiChatModel};
use crate::remote::{CardResolver, DiscoveryReport};
use crate::router::RoutingAgent;
use crate::server::{A2aServer, AgentExecutor};
use crate::session::InMemorySessionStore;
use crate::weather::WeatherClient;

#[derive(Parser)]
#[command(name = "switchboard")]
#[command(about = "Routes chat turns to specialized remote agents", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config path (default: ~/.switchboard/config.yml)
    #[arg(long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the routing agent on stdin
    Chat,

    /// Send a single message to the routing agent
    Ask {
        /// Message text
        message: String,

        /// Session ID (default: host.session_id from config)
        #[arg(long)]
        session: Option<String>,
    },

    /// Serve the weather agent
    ServeWeather {
        /// Bind host
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,
    },

    /// Serve the accommodation agent
    ServeAccommodation {
        /// Bind host
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,

        /// Log filter, e.g. info or debug
        #[arg(long)]
        log_level: Option<String>,
    },

    /// Fetch and print the agent card published at an address
    Card {
        /// Agent base address
        address: String,
    },
}

impl Cli {
    /// Log filter requested on the command line, if any
    pub fn log_filter(&self) -> Option<&str> {
        match &self.command {
            Commands::ServeAccommodation { log_level, .. } => log_level.as_deref(),
            _ => None,
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_env();

    // Create a multi-threaded runtime for CLI operations
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    rt.block_on(async {
        match cli.command {
            Commands::Chat => {
                let router = build_router(&config).await?;
                let session_id = config.host.session_id.clone();

                println!("Type a message, or 'quit' to exit.");
                let stdin = std::io::stdin();
                loop {
                    print!("> ");
                    std::io::stdout().flush()?;

                    let mut line = String::new();
                    if stdin.lock().read_line(&mut line)? == 0 {
                        break;
                    }
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if line == "quit" || line == "exit" {
                        break;
                    }

                    for fragment in router.handle_user_message(line, &session_id).await {
                        println!("{}", fragment);
                    }
                }
                Ok(())
            }

            Commands::Ask { message, session } => {
                let router = build_router(&config).await?;
                let session_id = session.unwrap_or_else(|| config.host.session_id.clone());

                for fragment in router.handle_user_message(&message, &session_id).await {
                    println!("{}", fragment);
                }
                Ok(())
            }

            Commands::ServeWeather { host, port } => {
                let server_config = with_bind(&config.weather_agent, host, port);
                let model = chat_model(&config, &config.llm.weather_model)?;
                let client = Arc::new(WeatherClient::new(&config.weather));

                let agent = weather::weather_agent(model, client, config.weather.max_tool_iterations);
                let card = weather::agent_card(server_config.card_url());

                tracing::info!("Starting weather agent on {}", server_config.bind_addr());
                let server = A2aServer::new(
                    server_config.bind_addr(),
                    card,
                    AgentExecutor::new(Arc::new(agent)),
                );
                server.run().await
            }

            Commands::ServeAccommodation { host, port, .. } => {
                let server_config = with_bind(&config.accommodation_agent, host, port);
                let model = chat_model(&config, &config.llm.accommodation_model)?;

                let agent = accommodation::accommodation_agent(model);
                let card = accommodation::agent_card(server_config.card_url());

                tracing::info!("Starting accommodation agent on {}", server_config.bind_addr());
                let server = A2aServer::new(
                    server_config.bind_addr(),
                    card,
                    AgentExecutor::new(Arc::new(agent)),
                );
                server.run().await
            }

            Commands::Card { address } => {
                let card = CardResolver::new()
                    .resolve(&address)
                    .await
                    .with_context(|| format!("Failed to fetch agent card from {}", address))?;

                println!("{}", serde_json::to_string_pretty(&card)?);
                Ok(())
            }
        }
    })
}

fn chat_model(config: &Config, model: &str) -> Result<Arc<dyn ChatModel>> {
    let model = OpenAiChatModel::from_config(&config.llm, model)
        .context("Failed to create chat model")?;
    Ok(Arc::new(model))
}

fn with_bind(base: &ServerConfig, host: Option<String>, port: Option<u16>) -> ServerConfig {
    let mut server = base.clone();
    if let Some(host) = host {
        server.host = host;
    }
    if let Some(port) = port {
        server.port = port;
    }
    server
}

async fn build_router(config: &Config) -> Result<RoutingAgent> {
    let model = chat_model(config, &config.llm.router_model)?;
    let store = Arc::new(InMemorySessionStore::new());

    let (router, report) = RoutingAgent::create(model, store, &config.host.remote_agents).await;
    print_discovery(&report);

    Ok(router)
}

fn print_discovery(report: &DiscoveryReport) {
    for skipped in &report.skipped {
        eprintln!("Skipping {}: {}", skipped.address, skipped.reason);
    }
    if report.registered.is_empty() {
        eprintln!("No remote agents available; the host can only answer directly.");
    }
    for (address, card) in &report.registered {
        println!("Connected to {} at {}", card.name, address);
    }
}
