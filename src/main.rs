use anyhow::{Context, Result};
use bat::PrettyPrinter;
use clap::Parser;
use cliclack::{input, spinner};
use console::style;
use std::io::{BufRead, IsTerminal};
use tracing_subscriber::EnvFilter;

use tally::agent::{Agent, AgentConfig};
use tally::evaluator::EvaluatorMode;
use tally::providers::configs::openai::OpenAiProviderConfig;
use tally::providers::openai::OpenAiProvider;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// OpenAI API Key (can also be set via OPENAI_API_KEY environment variable)
    #[arg(short, long)]
    api_key: Option<String>,

    /// Model to use [default: OPENAI_MODEL or gpt-4o]
    #[arg(short, long)]
    model: Option<String>,

    /// API host [default: OPENAI_API_HOST or https://api.openai.com]
    #[arg(long)]
    host: Option<String>,

    /// System prompt that opens the conversation
    #[arg(short, long)]
    system: Option<String>,

    /// Calculator evaluator: simple or standard
    #[arg(short, long)]
    evaluator: Option<EvaluatorMode>,

    /// Answer a single message and exit
    #[arg(long)]
    message: Option<String>,
}

fn main() -> Result<()> {
    // A missing .env file is fine, the environment may already be set
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut provider_config = OpenAiProviderConfig::from_env_with(cli.api_key).context(
        "API key must be provided via --api-key or OPENAI_API_KEY environment variable",
    )?;
    if let Some(host) = cli.host {
        provider_config.host = host;
    }
    if let Some(model) = cli.model {
        provider_config.model = model;
    }

    let mut agent_config = AgentConfig::from_env()?;
    if let Some(system) = cli.system {
        agent_config.system_prompt = Some(system);
    }
    if let Some(evaluator) = cli.evaluator {
        agent_config.evaluator = evaluator;
    }

    let provider = OpenAiProvider::new(provider_config)?;
    let mut agent = Agent::new(Box::new(provider), agent_config);

    if let Some(message) = cli.message {
        return answer_once(&mut agent, &message);
    }
    if !std::io::stdin().is_terminal() {
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Error reading input")?;
        return answer_once(&mut agent, line.trim());
    }

    println!(
        "tally {}",
        style("- type \"exit\" to end the session").dim()
    );
    println!("\n");

    loop {
        let message_text: String = input("Message:").placeholder("").multiline().interact()?;

        if message_text.trim().eq_ignore_ascii_case("exit") {
            break;
        }

        let spin = spinner();
        spin.start("awaiting reply");
        let reply = agent.process_message(message_text.trim());
        spin.stop("");

        match reply {
            Ok(answer) => render(&answer)?,
            Err(err) => eprintln!("{}", style(format!("Error processing message: {}", err)).red()),
        }
        println!("\n");
    }

    let usage = agent.usage();
    if let Some(total) = usage.total_tokens {
        println!("{}", style(format!("{} tokens used", total)).dim());
    }
    Ok(())
}

fn answer_once(agent: &mut Agent, message: &str) -> Result<()> {
    let answer = agent
        .process_message(message)
        .context("Error processing message")?;
    println!("Assistant: {}", answer);
    Ok(())
}

fn render(content: &str) -> Result<()> {
    PrettyPrinter::new()
        .input_from_bytes(content.as_bytes())
        .language("markdown")
        .print()?;
    Ok(())
}
