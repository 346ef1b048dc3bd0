use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::info;
use setlyrics::{
    clients::errors::Result,
    collector::{Collector, ConfigBuilder},
    http_api::{self, LyricsResponse},
    playlist_link::parse_playlist_link,
    settings::Settings,
};

#[derive(Parser)]
#[command(name = "setlyrics")]
#[command(version, about = "Fetch the lyrics of every track in a Spotify playlist", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (default)
    Serve {
        /// Address to listen on, overrides BIND_ADDR
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Print the lyrics of a playlist as JSON and exit
    Fetch {
        /// https://open.spotify.com/playlist/<id>?...
        playlist_link: String,
    },
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Serve { bind: None }) {
        Commands::Serve { bind } => serve(bind).await,
        Commands::Fetch { playlist_link } => fetch(&playlist_link).await,
    }
}

async fn serve(bind: Option<SocketAddr>) -> Result<()> {
    info!("Loading settings ...");
    let mut settings = Settings::from_env()?;
    if let Some(bind) = bind {
        settings.bind_addr = bind;
    }

    info!("Authorizing clients ...");
    let config = ConfigBuilder::new().build(&settings).await?;
    info!(
        "Lyrics policy {:?}, {} worker slots, pages of {}",
        settings.lyrics_policy, settings.worker_pool_size, settings.page_size
    );
    let collector = Arc::new(Collector::new(config));

    let router = http_api::create_router(Arc::clone(&collector), &settings.allowed_origin)?;
    http_api::serve(router, settings.bind_addr).await?;
    collector.pool().close();
    Ok(())
}

async fn fetch(playlist_link: &str) -> Result<()> {
    // Fail before touching the network
    parse_playlist_link(playlist_link)?;

    let settings = Settings::from_env()?;
    let collector = Collector::new(ConfigBuilder::new().build(&settings).await?);
    let lyrics = collector.collect(playlist_link).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&LyricsResponse { lyrics })?
    );
    Ok(())
}
