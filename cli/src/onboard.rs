use anyhow::{Context, Result};
use console::style;
use dialoguer::{Input, Select};
use parley_core::config::{AgentConfig, Config, MemoryPolicy};

const BANNER: &str = r"
    -------------------------------------

      p a r l e y

      chat with a model that can use tools

    -------------------------------------
";

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

fn setup_provider() -> Result<String> {
    let providers = vec!["openai", "ollama"];

    let selection = Select::new()
        .with_prompt("Select your model provider")
        .items(&providers)
        .default(0)
        .interact()
        .context("Failed to select provider")?;

    Ok(providers[selection].to_string())
}

fn setup_api_key() -> Result<String> {
    let api_key: String = Input::new()
        .with_prompt("Enter your OpenAI API key (leave empty to use OPENAI_API_KEY)")
        .allow_empty(true)
        .interact_text()
        .context("Failed to read API key")?;

    if api_key.is_empty() && std::env::var("OPENAI_API_KEY").is_err() {
        return Err(anyhow::anyhow!(
            "API key cannot be empty when OPENAI_API_KEY is not set. Get one at https://platform.openai.com/api-keys"
        ));
    }

    Ok(api_key)
}

fn setup_model(provider: &str) -> Result<String> {
    let models = match provider {
        "ollama" => vec!["llama3.2", "qwen2.5", "mistral"],
        _ => vec![
            "gpt-3.5-turbo (faster, cheaper)",
            "gpt-4 (more capable, slower)",
            "gpt-4o-mini",
        ],
    };

    let selection = Select::new()
        .with_prompt("Select your model")
        .items(&models)
        .default(0)
        .interact()
        .context("Failed to select model")?;

    let model = models[selection];
    Ok(model.split_whitespace().next().unwrap_or(model).to_string())
}

fn setup_memory() -> Result<MemoryPolicy> {
    let policies = vec![
        "full (keep the whole history within the token budget)",
        "summarized (compress older turns into a summary)",
    ];

    let selection = Select::new()
        .with_prompt("Select how conversation memory is kept")
        .items(&policies)
        .default(0)
        .interact()
        .context("Failed to select memory policy")?;

    Ok(if selection == 1 {
        MemoryPolicy::Summarized
    } else {
        MemoryPolicy::Full
    })
}

pub fn run_onboard() -> Result<Config> {
    println!("{}", style(BANNER).cyan().bold());
    println!("  {}", style("Welcome to parley!").white().bold());
    println!(
        "  {}",
        style("This wizard will configure your assistant in under 30 seconds.").dim()
    );
    println!();

    print_step(1, 3, "Provider Setup");
    let provider = setup_provider()?;
    let api_key = if provider == "openai" {
        setup_api_key()?
    } else {
        String::new()
    };

    print_step(2, 3, "Model Selection");
    let model = setup_model(&provider)?;

    print_step(3, 3, "Memory");
    let memory_policy = setup_memory()?;

    let config = Config {
        provider: Some(provider),
        api_key,
        model,
        agent: AgentConfig {
            memory_policy,
            ..Default::default()
        },
        ..Default::default()
    };

    println!();
    println!("  {} Configuration complete!", style("✓").green().bold());
    println!(
        "  {} Config saved to {}",
        style("→").green(),
        style(parley_core::config::get_config_path().display()).cyan()
    );
    println!();
    println!(
        "  {} You can now run: {}",
        style("→").green(),
        style("parley chat").cyan().bold()
    );
    println!();

    Ok(config)
}
