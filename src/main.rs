use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dream_oracle::app::App;
use dream_oracle::models::{Config, API_KEY_VAR};
use dream_oracle::repl::Repl;
use std::io::{self, BufRead, Write};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "dream-oracle")]
#[command(about = "Turn dreams into images and readings")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate one image for a dream and open it.
    Visualize {
        /// Dream text. Read from stdin when omitted.
        dream: Vec<String>,

        /// Do not open the saved image.
        #[arg(long)]
        no_open: bool,
    },
    /// Interactive session with three images and a reading (default).
    Session {
        /// Hide progress indicators.
        #[arg(long)]
        no_progress: bool,
    },
    /// Print the effective configuration with the API key masked.
    ShowEnv,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dream_oracle=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Session { no_progress: false });

    if let Err(e) = run(command).await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn run(command: Command) -> Result<()> {
    match command {
        Command::ShowEnv => show_env(),
        Command::Visualize { dream, no_open } => visualize(dream, no_open).await,
        Command::Session { no_progress } => session(no_progress).await,
    }
}

fn show_env() -> Result<()> {
    dotenvy::dotenv().ok();
    let key = std::env::var(API_KEY_VAR).ok();
    let masked = key
        .as_deref()
        .map(mask_secret)
        .unwrap_or_else(|| "(not set)".to_string());
    println!("{}={}", API_KEY_VAR, masked);

    match Config::from_env() {
        Ok(config) => {
            println!("OPENAI_BASE_URL={}", config.openai_base_url);
            println!("DREAM_CHAT_MODEL={}", config.chat_model);
            println!("DREAM_IMAGE_MODEL={}", config.image_model);
            println!("DREAM_IMAGE_SIZE={}", config.image_size);
            println!("DREAM_IMAGE_QUALITY={}", config.image_quality);
            println!("DREAM_OUTPUT_DIR={}", config.output_dir.display());
            println!("DREAM_IMAGE_CONCURRENCY={}", config.image_concurrency);
            println!("DREAM_IMAGE_RETRIES={}", config.image_retries);
            println!("DREAM_RETRY_DELAY_MS={}", config.retry_delay_ms);
        }
        Err(e) => warn!("Configuration incomplete: {}", e),
    }
    Ok(())
}

async fn visualize(words: Vec<String>, no_open: bool) -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let app = App::from_config(&config);

    let mut dream = words.join(" ");
    if dream.trim().is_empty() {
        print!("Describe your dream: ");
        io::stdout().flush()?;
        io::stdin().lock().read_line(&mut dream)?;
    }
    let dream = dream.trim();
    if dream.is_empty() {
        anyhow::bail!("The dream description is empty");
    }

    let result = app.visualize(dream).await?;
    println!("Keywords: {}", result.keywords);
    println!("Prompt: {}", result.prompt);
    println!("Image: {}", result.image.url);

    let path = app.download(&result.image, "dream_image_1").await?;
    println!("Saved to {}", path.display());

    if !no_open {
        if let Err(e) = open::that(&path) {
            warn!("Could not open {}: {}", path.display(), e);
        }
    }
    Ok(())
}

async fn session(no_progress: bool) -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let app = App::from_config(&config);

    let stdin = io::stdin();
    let mut repl = Repl::new(&app, stdin.lock(), io::stdout()).with_progress(!no_progress);
    info!(
        "Session {} started at {}",
        repl.session().id(),
        repl.session().started_at().format("%Y-%m-%d %H:%M:%S")
    );
    repl.run().await?;
    info!(
        "Session {} ended with {} readings",
        repl.session().id(),
        repl.session().history().len()
    );
    Ok(())
}

/// Keep the first and last four characters of a secret.
fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
