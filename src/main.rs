use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reddit_cleaner::config::{Config, TOKEN_ENV_VAR};
use reddit_cleaner::reddit::{
    batch_unsubscribe, fetch_subscriptions, filter_subreddits, BatchOptions, BatchProgress,
    DirectTransport, Endpoints, RelayTransport, Selection, Subreddit, Transport,
};
use reddit_cleaner::relay::{self, RelayState};
use reddit_cleaner::util::{fit_to_width, single_line};
use secrecy::SecretString;
use std::io::{BufRead, Write};
use std::path::PathBuf;

const NAME_WIDTH: usize = 24;
const DESCRIPTION_WIDTH: usize = 60;

#[derive(Parser, Debug)]
#[command(
    name = "reddit-cleaner",
    about = "List Reddit subscriptions and unsubscribe from them in bulk"
)]
struct Args {
    /// Config file (default: ~/.config/reddit-cleaner/config.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Send API calls through this relay endpoint instead of directly
    #[arg(long, value_name = "URL", global = true)]
    relay: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every subscribed subreddit
    List {
        /// Only show subreddits whose name or description contains this text
        #[arg(long, value_name = "QUERY")]
        filter: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Unsubscribe from subreddits in rate-limited batches
    Unsubscribe {
        /// Subreddit names (without the r/ prefix)
        names: Vec<String>,

        /// Unsubscribe from every subscribed subreddit
        #[arg(long, conflicts_with_all = ["names", "filter"])]
        all: bool,

        /// Unsubscribe from every subscribed subreddit matching this text
        #[arg(long, value_name = "QUERY", conflicts_with = "names")]
        filter: Option<String>,

        /// Show what would be unsubscribed without doing it
        #[arg(long)]
        dry_run: bool,

        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,

        /// Concurrent requests per batch
        #[arg(long, value_name = "N")]
        batch_size: Option<usize>,

        /// Pause between batches in milliseconds
        #[arg(long, value_name = "MS")]
        cooldown_ms: Option<u64>,
    },

    /// Run the credential relay
    Serve {
        /// Address to bind (overrides config)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },
}

/// Everything a list/unsubscribe command needs to talk to the API.
struct Session {
    transport: Box<dyn Transport>,
    endpoints: Endpoints,
    token: SecretString,
    max_pages: usize,
}

impl Session {
    fn new(config: &Config, relay_override: Option<String>) -> Result<Self> {
        let token = config.resolve_token().with_context(|| {
            format!(
                "No access token: set {} or access_token in the config file",
                TOKEN_ENV_VAR
            )
        })?;

        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        let transport: Box<dyn Transport> = match relay_override.or(config.relay_url.clone()) {
            Some(relay_url) => {
                tracing::info!(relay = %relay_url, "Routing API calls through relay");
                Box::new(
                    RelayTransport::new(client, relay_url).with_timeout(config.request_timeout()),
                )
            }
            None => Box::new(
                DirectTransport::new(client)
                    .with_user_agent(&config.user_agent)
                    .with_timeout(config.request_timeout()),
            ),
        };

        let endpoints = Endpoints::new(&config.api_base)
            .with_context(|| format!("Invalid api_base '{}'", config.api_base))?;

        Ok(Self {
            transport,
            endpoints,
            token: SecretString::from(token),
            max_pages: config.max_pages,
        })
    }

    async fn subscriptions(&self) -> Result<Vec<Subreddit>> {
        fetch_subscriptions(
            self.transport.as_ref(),
            &self.endpoints,
            &self.token,
            self.max_pages,
        )
        .await
        .context("Failed to list subscriptions")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match args.config.clone().or_else(Config::default_path) {
        Some(path) => Config::load(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    tracing::debug!(config = ?config, "Resolved configuration");

    match args.command {
        Command::List { filter, json } => {
            let session = Session::new(&config, args.relay)?;
            let subs = session.subscriptions().await?;
            let shown = filter_subreddits(&subs, filter.as_deref().unwrap_or(""));

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&shown).context("Failed to encode JSON")?
                );
            } else {
                print_table(&shown);
                println!();
                println!("{} of {} subscriptions shown", shown.len(), subs.len());
            }
        }

        Command::Unsubscribe {
            names,
            all,
            filter,
            dry_run,
            yes,
            batch_size,
            cooldown_ms,
        } => {
            if names.is_empty() && !all && filter.is_none() {
                anyhow::bail!("Nothing selected: pass subreddit names, --filter QUERY, or --all");
            }

            let session = Session::new(&config, args.relay)?;

            let selection: Selection = if names.is_empty() {
                let subs = session.subscriptions().await?;
                let query = if all { "" } else { filter.as_deref().unwrap_or("") };
                filter_subreddits(&subs, query).into_iter().collect()
            } else {
                let mut selection = Selection::new();
                selection.extend(&names);
                selection
            };

            if selection.is_empty() {
                println!("No subreddits matched; nothing to do.");
                return Ok(());
            }

            if dry_run {
                for name in selection.names() {
                    println!("would unsubscribe: r/{}", name);
                }
                println!("{} subreddits selected (dry run)", selection.len());
                return Ok(());
            }

            if !yes && !confirm(selection.len())? {
                println!("Aborted.");
                return Ok(());
            }

            let options = BatchOptions {
                batch_size: batch_size.unwrap_or(config.batch_size),
                cooldown: cooldown_ms
                    .map(std::time::Duration::from_millis)
                    .unwrap_or_else(|| config.cooldown()),
            };

            let names = selection.into_names();
            let mut last = BatchProgress {
                processed: 0,
                total: names.len(),
            };
            let result = batch_unsubscribe(
                session.transport.as_ref(),
                &session.endpoints,
                &session.token,
                &names,
                options,
                |progress| {
                    println!(
                        "[{:>3}%] {}/{} unsubscribed",
                        progress.percent(),
                        progress.processed,
                        progress.total
                    );
                    last = progress;
                },
            )
            .await;

            if let Err(e) = result {
                eprintln!(
                    "Stopped after {} of {} subreddits; the remaining {} were not confirmed.",
                    last.processed,
                    last.total,
                    last.total - last.processed
                );
                return Err(e).context("Bulk unsubscribe failed");
            }
            println!("Done: unsubscribed from {} subreddits.", last.total);
        }

        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.relay.bind.clone());
            let client = reqwest::Client::builder()
                .build()
                .context("Failed to build HTTP client")?;
            let transport = DirectTransport::new(client)
                .with_user_agent(&config.user_agent)
                .with_timeout(config.request_timeout());
            let state = RelayState::new(transport, config.relay.allowed_hosts.clone());

            println!("Relay listening on http://{}{}", bind, relay::RELAY_PATH);
            relay::serve(&bind, state)
                .await
                .with_context(|| format!("Relay failed on {}", bind))?;
        }
    }

    Ok(())
}

fn print_table(subs: &[&Subreddit]) {
    println!(
        "{}  {:>10}  {}",
        fit_to_width("NAME", NAME_WIDTH),
        "MEMBERS",
        "DESCRIPTION"
    );
    for sub in subs {
        let description = single_line(&sub.description);
        println!(
            "{}  {:>10}  {}",
            fit_to_width(&sub.display_name, NAME_WIDTH),
            sub.subscribers,
            fit_to_width(&description, DESCRIPTION_WIDTH).trim_end()
        );
    }
}

fn confirm(count: usize) -> Result<bool> {
    print!("Unsubscribe from {} subreddits? [y/N] ", count);
    std::io::stdout().flush().context("Failed to flush stdout")?;

    let mut answer = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut answer)
        .context("Failed to read confirmation")?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
