use anyhow::Result;
use clap::{Parser, Subcommand};
use gizmo_core::tools::{
    CodeSandboxTool, ImageGenConfig, ModelDownloadTool, TextToImageTool, TravelDurationTool,
    VisitWebpageTool, WebSearchTool,
};
use gizmo_core::{AgentLoop, ContextBuilder, ManagedAgent, Provider, ToolRegistry, config, providers};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod onboard;
mod repl;

#[derive(Parser)]
#[command(name = "gizmo")]
#[command(about = "gizmo - a tiny tool-calling agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive setup wizard
    Onboard,
    /// Chat with the configured model. Type "exit" to quit.
    Chat {
        /// Send a single message instead of starting the REPL
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Answer a task using web search and webpage reading
    Ask { task: String },
    /// Delegate research to a managed web agent
    Research { task: String },
    /// Plan a journey using travel-duration lookups
    Trip { request: String },
    /// Improve a prompt and generate an image from it
    Imagine { prompt: String },
    /// Solve a task by running code in a remote sandbox
    Exec { task: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let command = cli.command.unwrap_or_else(|| {
        if !config::config_exists() {
            Commands::Onboard
        } else {
            Commands::Chat { message: None }
        }
    });

    match command {
        Commands::Onboard => {
            let onboard_config = onboard::run_onboard()?;
            config::save_config(&onboard_config)?;
        }
        Commands::Chat { message } => {
            let (_, provider) = load_backend()?;
            match message {
                Some(message) => repl::one_shot(provider, &message).await?,
                None => repl::run(provider).await?,
            }
        }
        Commands::Ask { task } => {
            let (config, provider) = load_backend()?;

            let registry = Arc::new(ToolRegistry::new());
            registry.register(Box::new(WebSearchTool::new()))?;
            registry.register(Box::new(VisitWebpageTool::new()))?;

            let agent = build_agent(
                provider,
                registry,
                "You are a helpful assistant. Use web_search to find information and visit_webpage to read pages before answering.",
                &config,
            );
            run_and_print(&agent, &task).await?;
        }
        Commands::Research { task } => {
            let (config, provider) = load_backend()?;

            let web_registry = Arc::new(ToolRegistry::new());
            web_registry.register(Box::new(WebSearchTool::new()))?;
            web_registry.register(Box::new(VisitWebpageTool::new()))?;

            let web_agent = build_agent(
                provider.clone(),
                web_registry,
                "You are a web research agent. Search, read pages, and report your findings concisely.",
                &config,
            );

            let registry = Arc::new(ToolRegistry::new());
            registry.register(Box::new(ManagedAgent::new(
                "search",
                "Runs web searches for you. Give it your query as an argument.",
                web_agent,
            )))?;

            let manager = build_agent(
                provider,
                registry,
                "You are a manager agent. Delegate research to your 'search' agent, then synthesize a final answer.",
                &config,
            );
            run_and_print(&manager, &task).await?;
        }
        Commands::Trip { request } => {
            let (config, provider) = load_backend()?;

            let registry = Arc::new(ToolRegistry::new());
            registry.register(Box::new(TravelDurationTool::new(config.resolve_maps_key()?)))?;

            let agent = build_agent(
                provider,
                registry,
                "You are a travel planner. Use get_travel_duration to check how long legs of a journey take, and build a realistic itinerary.",
                &config,
            );
            run_and_print(&agent, &request).await?;
        }
        Commands::Imagine { prompt } => {
            let (config, provider) = load_backend()?;

            let image_config = ImageGenConfig {
                output_path: config.image_output.clone(),
                ..Default::default()
            };
            let registry = Arc::new(ToolRegistry::new());
            registry.register(Box::new(TextToImageTool::new(
                config.resolve_hf_token()?,
                image_config,
            )))?;
            registry.register(Box::new(ModelDownloadTool::new()))?;

            let agent = build_agent(
                provider,
                registry,
                "You are an image-generation assistant. Improve prompts before generating, and report where the image was saved.",
                &config,
            );
            let task = format!(
                "Improve this prompt, then generate an image of it. Prompt: {}. Get the latest model for text-to-image from the model hub first.",
                prompt
            );
            run_and_print(&agent, &task).await?;
        }
        Commands::Exec { task } => {
            let (config, provider) = load_backend()?;

            let mut sandbox = CodeSandboxTool::new(config.resolve_sandbox_key()?);
            if let Some(base_url) = &config.sandbox_base_url {
                sandbox = sandbox.with_base_url(base_url.clone());
            }

            let registry = Arc::new(ToolRegistry::new());
            registry.register(Box::new(sandbox))?;
            registry.register(Box::new(VisitWebpageTool::new()))?;

            let agent = build_agent(
                provider,
                registry,
                "You are a coding assistant. Solve tasks by writing code and executing it with run_code; read webpages when you need data.",
                &config,
            );
            run_and_print(&agent, &task).await?;
        }
    }

    Ok(())
}

fn load_backend() -> Result<(config::Config, Arc<dyn Provider>)> {
    let config = config::load_config()?;
    let provider: Arc<dyn Provider> = Arc::from(providers::create_provider(&config)?);
    Ok((config, provider))
}

fn build_agent(
    provider: Arc<dyn Provider>,
    registry: Arc<ToolRegistry>,
    instructions: &str,
    config: &config::Config,
) -> AgentLoop {
    AgentLoop::new(
        provider,
        ContextBuilder::new().with_instructions(instructions),
        registry,
    )
    .with_max_steps(config.max_steps)
}

async fn run_and_print(agent: &AgentLoop, task: &str) -> Result<()> {
    println!();
    match agent.run(task).await {
        Ok(answer) => {
            termimad::print_text(&answer);
            Ok(())
        }
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            Err(e)
        }
    }
}
