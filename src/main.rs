//! `rstc`: a small command-line front end over `rs_torrent_client`.
//!
//! Parses a `.torrent` file, prints a summary of its metadata, and reports
//! the computed info hash — enough to exercise the bencode codec and torrent
//! model end to end without a full download loop.
use clap::Parser;
use rs_torrent_client::config::Config;
use rs_torrent_client::torrent::TorrentFile;
use tracing::info;

/** Command-line arguments for `rstc`.

# Example
```text
rstc path/to/file.torrent
``` */
#[derive(Debug, Parser)]
#[command(name = "rstc", version, about = "A small BitTorrent client")]
struct Cli {
    /// Path to the .torrent file to inspect.
    torrent_path: std::path::PathBuf,

    /// Path to an optional TOML config file (defaults to $HOME/Downloads).
    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default_config()?,
    };
    info!(download_location = %config.download_location.display(), "loaded configuration");

    let torrent = TorrentFile::from_file(&cli.torrent_path)?;
    info!(path = %cli.torrent_path.display(), "parsed torrent file");

    println!("name:        {}", torrent.info.name);
    println!("announce:    {}", torrent.announce);
    println!("info hash:   {}", hex::encode(torrent.info_hash));
    println!("total size:  {} bytes", torrent.total_length());
    println!("pieces:      {}", torrent.num_pieces());
    println!("directory:   {}", torrent.is_directory());

    Ok(())
}
