use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use odysee_api::config::ClientConfig;
use odysee_api::{ChannelScraper, OdyseeClient, RecommendationEngine};

#[derive(Parser)]
#[command(name = "odysee")]
#[command(about = "Fetch Odysee channel, video and comment metadata as JSON")]
#[command(version)]
struct Cli {
    /// Use this auth token instead of registering an anonymous user
    #[arg(long, global = true)]
    auth_token: Option<String>,

    /// Attempts per request before giving up
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..))]
    max_attempts: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Channel lookups
    #[command(subcommand)]
    Channel(ChannelCommand),

    /// Per-video lookups
    #[command(subcommand)]
    Video(VideoCommand),

    /// Lower level helpers
    #[command(subcommand)]
    Misc(MiscCommand),

    /// Crawl related videos from the given channels and weigh channel edges
    Graph {
        /// Seed channel name, with or without the leading @
        #[arg(long = "channel", required = true)]
        channels: Vec<String>,

        #[arg(long, default_value_t = 1)]
        iterations: usize,
    },
}

#[derive(Subcommand)]
enum ChannelCommand {
    /// Resolved profile plus subscriber count
    Profile {
        #[arg(long)]
        name: String,
    },
    /// Every claim of the channel, as returned by claim_search
    Videos {
        #[arg(long)]
        id: String,
    },
    Subscribers {
        #[arg(long)]
        id: String,
    },
}

#[derive(Subcommand)]
enum VideoCommand {
    Views {
        #[arg(long)]
        id: String,
    },
    Comments {
        #[arg(long)]
        id: String,
    },
    Reactions {
        #[arg(long)]
        id: String,
    },
    StreamingUrl {
        #[arg(long)]
        canonical_url: String,
    },
    Recommended {
        #[arg(long)]
        id: String,
        #[arg(long)]
        title: String,
    },
}

#[derive(Subcommand)]
enum MiscCommand {
    /// Add likes/dislikes to raw comments
    CommentReactions {
        /// JSON array of raw comment records
        #[arg(long)]
        comments: String,
    },
    ResolveNames {
        #[arg(long = "name", required = true)]
        names: Vec<String>,
    },
}

fn to_pretty<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

async fn run_channel(client: &OdyseeClient, command: ChannelCommand) -> Result<String> {
    match command {
        ChannelCommand::Profile { name } => {
            let scraper = ChannelScraper::new(client, &name).await?;
            to_pretty(&scraper.get_entity().await?)
        }
        ChannelCommand::Videos { id } => to_pretty(&client.list_channel_videos(id).send().await?),
        ChannelCommand::Subscribers { id } => to_pretty(&client.get_subscribers(id).send().await?),
    }
}

async fn run_video(client: &OdyseeClient, command: VideoCommand) -> Result<String> {
    match command {
        VideoCommand::Views { id } => to_pretty(&client.get_views(id).send().await?),
        VideoCommand::Comments { id } => to_pretty(&client.list_comments(id).send().await?),
        VideoCommand::Reactions { id } => {
            let (likes, dislikes) = client.get_video_reactions(id).send().await?;
            to_pretty(&json!({ "likes": likes, "dislikes": dislikes }))
        }
        VideoCommand::StreamingUrl { canonical_url } => {
            to_pretty(&client.get_streaming_url(canonical_url).send().await?)
        }
        VideoCommand::Recommended { id, title } => {
            to_pretty(&client.get_recommended(title, id).send().await?)
        }
    }
}

async fn run_misc(client: &OdyseeClient, command: MiscCommand) -> Result<String> {
    match command {
        MiscCommand::CommentReactions { comments } => {
            let comments: Vec<Value> =
                serde_json::from_str(&comments).context("--comments must be a JSON array")?;
            to_pretty(&client.comment_reactions(comments).send().await?)
        }
        MiscCommand::ResolveNames { names } => to_pretty(&client.resolve_names(names).send().await?),
    }
}

async fn run(cli: Cli) -> Result<String> {
    let mut config = ClientConfig::from_env().context("loading configuration")?;
    if let Some(max_attempts) = cli.max_attempts {
        config.retry.max_attempts = max_attempts;
    }

    let mut client = OdyseeClient::new(config)?;
    if let Some(auth_token) = cli.auth_token {
        client = client.with_auth_token(auth_token);
    }

    match cli.command {
        Commands::Channel(command) => run_channel(&client, command).await,
        Commands::Video(command) => run_video(&client, command).await,
        Commands::Misc(command) => run_misc(&client, command).await,
        Commands::Graph {
            channels,
            iterations,
        } => {
            let graph = RecommendationEngine::new(&client, channels)
                .generate(iterations)
                .await?;
            to_pretty(&graph)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout carries the JSON result only
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("odysee_api=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    tokio::select! {
        result = run(cli) => match result {
            Ok(output) => {
                println!("{output}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("An error occurred: {e:#}");
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("User interruption detected (Ctrl+C)");
            ExitCode::from(130)
        }
    }
}
