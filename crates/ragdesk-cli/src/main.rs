mod chat;
mod serve;
mod tasks;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result};
use tracing_subscriber::EnvFilter;

use ragdesk_core::breakdown::{break_down_task, breakdown_llm};
use ragdesk_core::config::{DEFAULT_OPENAI_MODEL, DEFAULT_PORT};
use ragdesk_core::{Config, FileStorage, RagAgent, TaskManager, LLM};

#[derive(Parser)]
#[command(name = "ragdesk")]
#[command(about = "Task manager with AI breakdown and a document-aware chat assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive task manager menu
    Tasks {
        /// Load tasks from this file on start
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Ask the model to break a task into simpler tasks
    Breakdown {
        /// The task to break down
        #[arg(required = true)]
        task: Vec<String>,
    },
    /// Chat with the assistant in the terminal
    Chat {
        /// Chat model to use
        #[arg(long)]
        model: Option<String>,
        /// Sampling temperature
        #[arg(long)]
        temperature: Option<f32>,
        /// Documents to add to the knowledge base before chatting
        #[arg(long, num_args = 1..)]
        ingest: Vec<PathBuf>,
    },
    /// Run the assistant web interface
    Serve {
        /// Host to run the interface on
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to run the interface on
        #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Chat model to use
        #[arg(long, default_value = DEFAULT_OPENAI_MODEL)]
        model: String,
        /// Sampling temperature
        #[arg(long, default_value_t = 0.7)]
        temperature: f32,
        /// Request a public link (not supported; serves locally)
        #[arg(long)]
        share: bool,
        /// Enable debug logging
        #[arg(long)]
        debug: bool,
        /// Open the browser once the server is up
        #[arg(long)]
        open: bool,
    },
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let debug = matches!(cli.command, Commands::Serve { debug: true, .. });
    init_tracing(debug);

    let mut config = Config::load()?;

    match cli.command {
        Commands::Tasks { file } => {
            let mut manager = TaskManager::new(FileStorage::new());
            if let Some(path) = file {
                let outcome = manager.load_tasks(&path)?;
                tracing::info!(?outcome, path = %path.display(), "Loaded tasks");
            }

            // The menu still works without a key; only option 8 needs one.
            let llm = match breakdown_client(&config) {
                Ok(llm) => Some(llm),
                Err(e) => {
                    tracing::warn!("AI breakdown unavailable: {}", e);
                    None
                }
            };

            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            tasks::run_menu(
                &mut stdin.lock(),
                &mut stdout,
                &mut manager,
                llm.as_deref(),
                &config.tasks.default_file,
            )
            .await?;
        }
        Commands::Breakdown { task } => {
            let llm = breakdown_client(&config)?;
            let result = break_down_task(&*llm, &task.join(" ")).await?;
            println!("\nAI-generated breakdown:");
            println!("{}", result);
        }
        Commands::Chat {
            model,
            temperature,
            ingest,
        } => {
            if let Some(model) = model {
                config.llm.model = Some(model);
            }
            if let Some(temperature) = temperature {
                config.llm.temperature = temperature;
            }

            let mut agent = RagAgent::from_config(&config, None)?;
            for path in &ingest {
                let added = agent.ingest_file(path).await?;
                println!("Added {} chunks from {}", added, path.display());
            }

            chat::run(&mut agent).await?;
        }
        Commands::Serve {
            host,
            port,
            model,
            temperature,
            share,
            debug: _,
            open,
        } => {
            config.llm.model = Some(model);
            config.llm.temperature = temperature;
            config.server.host = host;
            config.server.port = port;

            if share {
                tracing::warn!("Public share links are not supported; serving locally only");
            }

            let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty());
            if config.llm.resolve_api_key(api_key.clone()).is_none() && config.llm.provider != "ollama" {
                return Err(eyre!(
                    "OPENAI_API_KEY not found in environment variables. Set it before starting the server."
                ));
            }

            let agent = RagAgent::from_config(&config, api_key)?;
            serve::start_server(serve::ServeConfig::from_config(&config, open), agent).await?;
        }
    }

    Ok(())
}

/// Builds the chat client used for task breakdown.
fn breakdown_client(config: &Config) -> Result<Box<dyn LLM>> {
    if config.llm.provider != "ollama" && config.llm.api_key_or_env().is_none() {
        return Err(eyre!("No API key configured for provider '{}'", config.llm.provider));
    }
    Ok(breakdown_llm(config)?)
}
