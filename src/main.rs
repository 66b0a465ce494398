use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncReadExt, BufReader};
use tracing::{error, info};

use content_remixer::app::{EditOutcome, Remixer};
use content_remixer::config;
use content_remixer::generator::Generator;
use content_remixer::model::chars_remaining;
use content_remixer::{session, share, store, view};

#[derive(Debug, Parser)]
#[command(author, version, about = "Remix blog posts into tweets and keep the good ones")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate tweets from a file, or stdin when no file is given
    Remix {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Manage saved tweets
    Saved {
        #[command(subcommand)]
        action: SavedAction,
    },
    /// Open the posting intent for a text in the browser
    Share { text: String },
    /// Interactive session
    Interactive,
    /// Print an example config file
    ConfigExample,
}

#[derive(Debug, Subcommand)]
enum SavedAction {
    List,
    Add { text: String },
    Edit { id: i64, text: String },
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match args.command {
        Command::ConfigExample => {
            print!("{}", config::example());
        }
        Command::Share { text } => {
            println!("{}", share::share(&text));
        }
        Command::Remix { file } => {
            let (_, generator) = setup(&args.config)?;
            let text = match file {
                Some(path) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    tokio::io::stdin().read_to_string(&mut buf).await?;
                    buf
                }
            };
            if text.trim().is_empty() {
                info!("input is empty; nothing to remix");
                return Ok(());
            }
            match generator.generate(&text).await {
                Ok(posts) => {
                    for (idx, post) in posts.iter().enumerate() {
                        println!("({}) {}", idx + 1, post);
                        println!("    {} characters remaining", chars_remaining(post));
                    }
                }
                Err(err) => {
                    error!(?err, "generation failed");
                    println!("{}", err.user_message());
                }
            }
        }
        Command::Saved { action } => {
            let (cfg, generator) = setup(&args.config)?;
            let store = store::open_store(&cfg).await?;
            let remixer = Remixer::new(generator, store);
            match action {
                SavedAction::List => {
                    remixer.refresh().await;
                }
                SavedAction::Add { text } => {
                    remixer.save(&text).await;
                }
                SavedAction::Edit { id, text } => {
                    if remixer.edit_saved(id, &text).await == EditOutcome::NotFound {
                        println!("no saved tweet with id {id}");
                    }
                }
                SavedAction::Delete { id } => {
                    remixer.delete(id).await;
                }
            }
            let mut out = String::new();
            let state = remixer.snapshot().await;
            view::render_saved(&state, &mut out);
            print!("{out}");
            if let Some(notice) = state.notice {
                println!("! {notice}");
            }
        }
        Command::Interactive => {
            let (cfg, generator) = setup(&args.config)?;
            let store = store::open_store(&cfg).await?;
            let remixer = Remixer::new(generator, store);
            info!("starting interactive session");
            session::run(
                &remixer,
                BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
                true,
            )
            .await?;
        }
    }

    Ok(())
}

/// Load the config and build the generator. Missing secrets only warn.
fn setup(path: &Path) -> Result<(config::Config, Generator)> {
    let cfg = config::load(Some(path))?;
    cfg.warn_missing();
    let generator = Generator::from_config(&cfg.openai)?;
    Ok((cfg, generator))
}
