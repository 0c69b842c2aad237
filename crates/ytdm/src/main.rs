use std::sync::Arc;

use ytdm_core::{config::Config, feed::FeedSource};
use ytdm_feed::YouTubeFeed;

#[tokio::main]
async fn main() -> Result<(), ytdm_core::Error> {
    ytdm_core::logging::init("ytdm")?;

    let cfg = Arc::new(Config::load()?);
    println!("[BOOT] Watching channel {}", cfg.youtube_channel_id);

    let feed: Arc<dyn FeedSource> = Arc::new(YouTubeFeed::new(cfg.feed_url.clone()));

    ytdm_discord::run(cfg, feed)
        .await
        .map_err(|e| ytdm_core::Error::Chat(format!("discord bot failed: {e}")))?;

    Ok(())
}
