use anyhow::{Context, Result};
use console::style;
use dialoguer::{Input, Select};
use gizmo_core::config::Config;

const BANNER: &str = r"
    -----------------------------------
     g i z m o  —  tiny tool agent
    -----------------------------------
";

const PROVIDERS: &[(&str, &str)] = &[
    ("huggingface", "Qwen/Qwen2.5-Coder-32B-Instruct"),
    ("openai", "gpt-4o-mini"),
    ("ollama", "mistral"),
];

fn print_step(step: usize, total: usize, title: &str) {
    println!();
    println!(
        "{}",
        style(format!("[{}/{}] {}", step, total, title))
            .cyan()
            .bold()
    );
    println!();
}

fn setup_provider() -> Result<usize> {
    let names: Vec<&str> = PROVIDERS.iter().map(|(name, _)| *name).collect();

    let selection = Select::new()
        .with_prompt("Select your model backend")
        .items(&names)
        .default(0)
        .interact()
        .context("Failed to select backend")?;

    Ok(selection)
}

fn setup_api_key(provider: &str) -> Result<String> {
    if provider == "ollama" {
        return Ok(String::new());
    }

    let api_key: String = Input::new()
        .with_prompt("Enter your API key (leave empty to use environment variables)")
        .allow_empty(true)
        .interact_text()
        .context("Failed to read API key")?;

    Ok(api_key)
}

fn setup_model(default_model: &str) -> Result<String> {
    let model: String = Input::new()
        .with_prompt("Model")
        .default(default_model.to_string())
        .interact_text()
        .context("Failed to read model")?;

    Ok(model)
}

pub fn run_onboard() -> Result<Config> {
    println!("{}", style(BANNER).cyan().bold());

    println!("  {}", style("Welcome to gizmo!").white().bold());
    println!(
        "  {}",
        style("This wizard will configure your agent in under 30 seconds.").dim()
    );

    print_step(1, 3, "Model Backend");
    let selection = setup_provider()?;
    let (provider, default_model) = PROVIDERS[selection];

    print_step(2, 3, "Credentials");
    let api_key = setup_api_key(provider)?;

    print_step(3, 3, "Model Selection");
    let model = setup_model(default_model)?;

    let config = Config {
        provider: Some(provider.to_string()),
        api_key,
        model,
        ..Default::default()
    };

    println!();
    println!("  {} Configuration complete!", style("✓").green().bold());
    println!(
        "  {} Config saved to {}",
        style("→").green(),
        style(gizmo_core::config::get_config_path().display()).cyan()
    );
    println!(
        "  {} Tool credentials (GMAPS_API_KEY, SANDBOX_API_KEY, HF_TOKEN) are read from the environment.",
        style("→").green()
    );
    println!();
    println!(
        "  {} You can now run: {}",
        style("→").green(),
        style("gizmo chat").cyan().bold()
    );
    println!();

    Ok(config)
}
