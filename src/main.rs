//! prompt-enhancer - enhance prompts with a local Ollama model

use std::io::Read;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use prompt_enhancer::config::{Config, ConfigOptions};
use prompt_enhancer::enhancer::{parse_param, EnhancerServer, PromptEnhancer, TechniqueParams};
use prompt_enhancer::Technique;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "prompt-enhancer")]
#[command(about = "Enhance prompts with structured techniques and a local Ollama model")]
struct Args {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(ClapArgs, Debug)]
struct GlobalArgs {
    /// Ollama server URL (defaults to $OLLAMA_HOST, then http://localhost:11434)
    #[arg(long, global = true)]
    ollama_url: Option<String>,

    /// Model to use (defaults to $PROMPT_ENHANCER_MODEL, then llama3)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Timeout for generate calls, in seconds
    #[arg(long, global = true)]
    generate_timeout: Option<u64>,

    /// Timeout for listing models, in seconds
    #[arg(long, global = true)]
    models_timeout: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the Web UI (default)
    Serve {
        /// Port for the Web UI; the next free port is used if taken
        #[arg(long)]
        port: Option<u16>,

        /// Do not open a browser window
        #[arg(long)]
        no_browser: bool,
    },
    /// Enhance a prompt and print the result
    Enhance {
        /// Prompt text, or "-" to read from stdin
        prompt: String,

        /// Technique key; chosen automatically when omitted
        #[arg(long)]
        technique: Option<Technique>,

        /// Template parameter as key=value (repeatable)
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// Run a prompt against the model and print the response
    Generate {
        /// Prompt text, or "-" to read from stdin
        prompt: String,
    },
    /// List models available on the Ollama server
    Models,
    /// List enhancement techniques
    Techniques,
    /// Score a prompt locally and print suggestions as JSON
    Analyze {
        /// Prompt text, or "-" to read from stdin
        prompt: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output on stdout stays clean
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let command = args.command.unwrap_or(Command::Serve {
        port: None,
        no_browser: false,
    });

    let (ui_port, no_browser) = match &command {
        Command::Serve { port, no_browser } => (*port, *no_browser),
        _ => (None, true),
    };

    let config = Config::new(ConfigOptions {
        ollama_url: args.global.ollama_url,
        default_model: args.global.model,
        generate_timeout: args.global.generate_timeout,
        models_timeout: args.global.models_timeout,
        ui_port,
        no_browser,
    })?;

    let enhancer = Arc::new(PromptEnhancer::new(config.clone())?);

    if let Err(e) = run(command, enhancer, &config).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(command: Command, enhancer: Arc<PromptEnhancer>, config: &Config) -> Result<()> {
    match command {
        Command::Serve { .. } => serve(enhancer, config).await,
        Command::Enhance {
            prompt,
            technique,
            params,
        } => {
            let prompt = read_prompt(prompt)?;
            let enhancement = match technique {
                Some(technique) => {
                    let params: TechniqueParams = params.into_iter().collect();
                    enhancer.enhance(&prompt, technique, &params, None).await?
                }
                None => {
                    if !params.is_empty() {
                        warn!("--param is ignored without --technique");
                    }
                    enhancer.auto_enhance(&prompt, None).await?
                }
            };

            eprintln!(
                "Chosen Strategy: {} - {}",
                enhancement.technique.name(),
                enhancement.technique.description()
            );
            if let Some(critique) = &enhancement.critique {
                eprintln!("\nAI Critique:\n{}\n", critique);
            }
            println!("{}", enhancement.enhanced_prompt);
            Ok(())
        }
        Command::Generate { prompt } => {
            let prompt = read_prompt(prompt)?;
            let response = enhancer.generate_response(&prompt, None).await?;
            println!("{}", response);
            Ok(())
        }
        Command::Models => {
            let listing = enhancer.list_models().await;
            if !listing.connected {
                return Err(anyhow!(
                    "Could not connect to Ollama at {}. Please ensure it's running.",
                    config.ollama_url
                ));
            }
            for model in listing.models {
                println!("{}", model);
            }
            Ok(())
        }
        Command::Techniques => {
            for technique in Technique::ALL {
                println!(
                    "{:<20} {} - {}",
                    technique.key(),
                    technique.name(),
                    technique.description()
                );
            }
            Ok(())
        }
        Command::Analyze { prompt } => {
            let prompt = read_prompt(prompt)?;
            let analysis = enhancer.analyze(&prompt);
            println!("{}", serde_json::to_string_pretty(&analysis)?);
            Ok(())
        }
    }
}

async fn serve(enhancer: Arc<PromptEnhancer>, config: &Config) -> Result<()> {
    info!(
        "Starting prompt enhancer UI (Ollama: {}, model: {})",
        config.ollama_url, config.default_model
    );

    let server = EnhancerServer::new(enhancer);
    server.start().await?;

    let url = server.url().await;
    println!("Prompt enhancer running at {}", url);

    if !config.no_browser {
        if let Err(e) = open::that(&url) {
            warn!("Could not auto-open browser: {}, URL: {}", e, url);
        }
    }

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    Ok(())
}

/// Resolve a prompt argument, reading stdin for "-"
fn read_prompt(arg: String) -> Result<String> {
    if arg != "-" {
        return Ok(arg);
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}
