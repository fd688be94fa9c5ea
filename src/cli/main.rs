use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::sync::Arc;
use todo_search::{
    config::Config,
    models::{
        CompletionInterval, CreateTodoRequest, Priority, Severity, SortDirection, StatsQuery,
        TodoFilter, TodoStatus, UpdateTodoRequest,
    },
    search::HttpEngine,
    TodoRepository,
};

#[derive(Parser)]
#[command(name = "todo-search-cli")]
#[command(about = "Todo search data-access CLI", long_about = None)]
struct Cli {
    /// Configuration file (defaults to CONFIG_PATH or config/default.toml)
    #[arg(short, long, env = "CONFIG_PATH")]
    config: Option<String>,

    /// Override the search engine URL
    #[arg(short, long)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the index if it does not exist
    EnsureIndex,

    /// Fill defaults into documents missing newer fields
    Backfill,

    /// Create a todo
    Create {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        status: Option<TodoStatus>,

        #[arg(short = 'T', long = "tag")]
        tags: Vec<String>,

        #[arg(short, long)]
        assignee: Option<String>,

        #[arg(short, long)]
        priority: Option<Priority>,

        #[arg(short = 'S', long)]
        severity: Option<Severity>,

        #[arg(long)]
        due_date: Option<DateTime<Utc>>,

        #[arg(short = 'f', long = "framework")]
        compliance_frameworks: Vec<String>,
    },

    /// Get a todo by id
    Get {
        #[arg(value_name = "TODO_ID")]
        id: String,
    },

    /// Partially update a todo from a JSON payload
    Update {
        #[arg(value_name = "TODO_ID")]
        id: String,

        /// e.g. '{"status":"done","dueDate":null}'
        #[arg(short, long)]
        data: String,
    },

    /// Delete a todo
    Delete {
        #[arg(value_name = "TODO_ID")]
        id: String,
    },

    /// Search todos
    Search {
        #[arg(short, long)]
        query: Option<String>,

        #[arg(short, long)]
        status: Vec<TodoStatus>,

        #[arg(short, long)]
        priority: Vec<Priority>,

        #[arg(short = 'S', long)]
        severity: Vec<Severity>,

        #[arg(short = 'T', long = "tag")]
        tags: Vec<String>,

        #[arg(short = 'f', long = "framework")]
        compliance_frameworks: Vec<String>,

        #[arg(short, long)]
        assignee: Option<String>,

        #[arg(long)]
        overdue: Option<bool>,

        #[arg(long)]
        sort: Option<String>,

        #[arg(long)]
        direction: Option<SortDirection>,

        #[arg(long)]
        page: Option<u32>,

        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Basic dashboard statistics
    Stats {
        #[arg(long)]
        created_after: Option<DateTime<Utc>>,

        #[arg(long)]
        created_before: Option<DateTime<Utc>>,

        #[arg(short, long)]
        interval: Option<CompletionInterval>,
    },

    /// Compliance, overdue and priority/severity analytics
    Analytics {
        #[arg(long)]
        created_after: Option<DateTime<Utc>>,

        #[arg(long)]
        created_before: Option<DateTime<Utc>>,
    },

    /// Tags and compliance frameworks currently in use
    Suggestions,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_search=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;
    if let Some(url) = cli.url {
        config.engine.url = url;
    }

    let engine = Arc::new(HttpEngine::new(&config.engine)?);
    let repository = TodoRepository::new(engine, config.search.clone());

    match cli.command {
        Commands::EnsureIndex => {
            repository.index_manager().ensure_index().await?;
            println!("Index '{}' is ready", repository.index_manager().index_name());
        }

        Commands::Backfill => {
            let updated = repository.index_manager().backfill().await?;
            println!("Backfilled {} documents", updated);
        }

        Commands::Create {
            title,
            description,
            status,
            tags,
            assignee,
            priority,
            severity,
            due_date,
            compliance_frameworks,
        } => {
            let request = CreateTodoRequest {
                title,
                description,
                status,
                tags: (!tags.is_empty()).then_some(tags),
                assignee,
                priority,
                severity,
                due_date,
                compliance_frameworks: (!compliance_frameworks.is_empty())
                    .then_some(compliance_frameworks),
            };
            request.check()?;
            print_json(&repository.create(&request).await?)?;
        }

        Commands::Get { id } => {
            print_json(&repository.get_by_id(&id).await?)?;
        }

        Commands::Update { id, data } => {
            let request: UpdateTodoRequest =
                serde_json::from_str(&data).context("Invalid update payload")?;
            request.check()?;
            print_json(&repository.update(&id, &request).await?)?;
        }

        Commands::Delete { id } => {
            repository.delete(&id).await?;
            println!("Deleted {}", id);
        }

        Commands::Search {
            query,
            status,
            priority,
            severity,
            tags,
            compliance_frameworks,
            assignee,
            overdue,
            sort,
            direction,
            page,
            page_size,
        } => {
            let filter = TodoFilter {
                page,
                page_size,
                status,
                priority,
                severity,
                tags,
                compliance_frameworks,
                assignee,
                search_text: query,
                is_overdue: overdue,
                sort_field: sort,
                sort_direction: direction,
                ..Default::default()
            };
            print_json(&repository.search(&filter).await?)?;
        }

        Commands::Stats {
            created_after,
            created_before,
            interval,
        } => {
            let query = StatsQuery {
                created_after,
                created_before,
                interval,
            };
            print_json(&repository.get_stats(&query).await?)?;
        }

        Commands::Analytics {
            created_after,
            created_before,
        } => {
            let query = StatsQuery {
                created_after,
                created_before,
                interval: None,
            };
            print_json(&repository.get_analytics(&query).await?)?;
        }

        Commands::Suggestions => {
            print_json(&repository.get_suggestions().await?)?;
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
