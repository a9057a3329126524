//! Scout - web-search-augmented chat in the terminal.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use scout::agents::OPENAI_BASE_URL;
use scout::cli::{run_interactive, run_single_prompt};
use scout::config::{Settings, XdgDirs, DEFAULT_MODEL};
use scout::session::{SearchTopic, DEFAULT_RESULT_COUNT, MAX_RESULT_COUNT, MIN_RESULT_COUNT};

/// Scout - ask questions, get answers backed by live web search 🔎
#[derive(Parser, Debug)]
#[command(name = "scout")]
#[command(version, about, long_about = None)]
struct Args {
    /// Execute a single prompt and exit
    #[arg(short, long)]
    prompt: Option<String>,

    /// Chat model to use
    #[arg(short, long, env = "SCOUT_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// API key for the chat model
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = OPENAI_BASE_URL)]
    base_url: String,

    /// API key for Tavily web search
    #[arg(long, env = "TAVILY_API_KEY", hide_env_values = true)]
    tavily_key: Option<String>,

    /// Number of search results per query
    #[arg(
        short = 'n',
        long,
        env = "SCOUT_SEARCH_RESULTS",
        default_value_t = DEFAULT_RESULT_COUNT,
        value_parser = clap::value_parser!(u8).range((MIN_RESULT_COUNT as i64)..=(MAX_RESULT_COUNT as i64))
    )]
    results: u8,

    /// Search topic (general or news)
    #[arg(long, default_value = "general", value_parser = parse_topic)]
    topic: SearchTopic,

    /// Only search this domain (repeatable)
    #[arg(long = "domain", value_name = "DOMAIN")]
    domains: Vec<String>,

    /// Working directory (like git -C)
    #[arg(short = 'C', long, visible_alias = "directory")]
    cwd: Option<String>,

    /// Enable debug logging (equivalent to RUST_LOG=debug)
    #[arg(short = 'd', long)]
    debug: bool,

    /// Enable verbose logging (equivalent to RUST_LOG=trace)
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn parse_topic(s: &str) -> Result<SearchTopic, String> {
    s.parse()
}

impl Args {
    fn settings(self) -> Settings {
        Settings {
            model: self.model,
            openai_api_key: self.api_key.filter(|k| !k.trim().is_empty()),
            base_url: self.base_url,
            tavily_api_key: self.tavily_key.filter(|k| !k.trim().is_empty()),
            result_count: self.results,
            topic: self.topic,
            domains: self.domains,
        }
    }
}

/// Load `.env` from the working directory, then the user config directory.
///
/// Variables already set in the environment win.
fn load_env_files() {
    let _ = dotenvy::from_path(".env");
    let _ = dotenvy::from_path(XdgDirs::new().env_file());
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Change working directory if specified (do this early)
    if let Some(cwd) = &args.cwd {
        std::env::set_current_dir(cwd)?;
    }

    // Env fallbacks are read during parsing, so parse again once .env is loaded.
    load_env_files();
    let args = Args::parse();

    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async {
        // Determine log level from args or env
        let default_filter = if args.verbose {
            "trace"
        } else if args.debug {
            "debug"
        } else {
            "warn" // Quiet by default for normal use
        };

        // Initialize tracing with stderr output
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();

        if args.debug || args.verbose {
            tracing::info!("Debug logging enabled");
        }

        let prompt = args.prompt.clone();
        let settings = args.settings();
        tracing::debug!(?settings, "Resolved settings");

        match prompt {
            Some(prompt) => run_single_prompt(settings, &prompt).await,
            None => run_interactive(settings).await,
        }
    })
}
