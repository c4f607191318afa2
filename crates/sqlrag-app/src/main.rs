//! sqlrag binary - composition root.
//!
//! 1. Parse CLI and load configuration from TOML
//! 2. Initialize logging to stderr
//! 3. Wire model, retriever and database into a chat session
//! 4. Run the requested command (interactive chat by default)

mod cli;

use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use sqlrag_chat::{is_exit_command, ChatSession};
use sqlrag_core::{ConversationState, SqlRagConfig};
use sqlrag_storage::{extract_schema, format_schema_chunk, Database, SqlExecutor};
use sqlrag_vector::knowledge;

use cli::{CliArgs, Command};

/// Interactive loop over stdin until an exit word or EOF.
async fn run_chat(config: &SqlRagConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = ChatSession::from_config(config).await?;

    println!("Welcome to the SQL RAG chatbot!");
    println!("Type 'exit', 'quit', 'bye', or '/bye' to exit.");
    println!("{}", "-".repeat(50));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\nMessage: ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!("\nGoodbye!");
            break;
        };
        if is_exit_command(&line) {
            println!("Bye Bye!");
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        let outcome = session.submit(&line).await;
        if let Some(sql) = &outcome.sql_query {
            tracing::debug!(sql = %sql, "Turn used SQL");
        }
        println!("Assistant: {}", outcome.answer);
    }

    tracing::info!(session_id = %session.id(), turns = session.state().memory.len() / 2, "Chat ended");
    Ok(())
}

async fn run_ask(config: &SqlRagConfig, question: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = ChatSession::from_config(config).await?;
    let outcome = session.submit(question).await;
    println!("{}", outcome.answer);
    Ok(())
}

/// Run a statement the way the executor handles a bare message: extract, then execute.
fn run_sql(config: &SqlRagConfig, statement: &str) {
    let executor = SqlExecutor::new(Database::new(&config.database.path));

    let mut state = ConversationState::new();
    state.push_user(statement);
    let result = executor.execute_state(&mut state);

    if result.is_success() {
        println!("{}", result.results);
    } else {
        eprintln!("{}", result.results);
    }
}

fn run_schema(config: &SqlRagConfig, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::new(&config.database.path);
    let tables = extract_schema(&db)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&tables)?);
    } else {
        let chunks: Vec<String> = tables.iter().map(format_schema_chunk).collect();
        println!("{}", chunks.join("\n\n---\n"));
    }
    Ok(())
}

fn run_build_kb(
    config: &SqlRagConfig,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::new(&config.database.path);
    let path = output.unwrap_or_else(|| PathBuf::from(&config.retrieval.knowledge_base_path));

    let text = knowledge::build_from_database(&db)?;
    knowledge::write_knowledge_base(&path, &text)?;
    println!("Knowledge base written to {}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config.
    let config_file = args.resolve_config_path();
    let config = args.apply_overrides(SqlRagConfig::load_or_default(&config_file));

    // Tracing. RUST_LOG wins over --log-level and the config file.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.general.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Starting sqlrag v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        path = %config_file.display(),
        database = %config.database.path,
        model = %config.llm.model,
        "Configuration resolved"
    );

    match args.command() {
        Command::Chat => run_chat(&config).await?,
        Command::Ask { question } => run_ask(&config, &question).await?,
        Command::Sql { statement } => run_sql(&config, &statement),
        Command::Schema { json } => run_schema(&config, json)?,
        Command::BuildKb { output } => run_build_kb(&config, output)?,
    }

    Ok(())
}
