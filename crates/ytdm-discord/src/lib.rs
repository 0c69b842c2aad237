//! Discord adapter (serenity).
//!
//! This crate implements the core `ChatPort` over the gateway, owns the
//! event handler, and wires the poll/rotate timers plus process signals.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, OnceLock,
};

use serenity::all::{
    ActivityData, Client, Colour, Context, CreateEmbed, CreateMessage, EventHandler,
    GatewayIntents, Message, OnlineStatus, Ready, Timestamp,
};

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use ytdm_core::{
    alerting::{self, AlertKind},
    config::Config,
    domain::{GuildId, RoleId, UserId},
    errors::Error,
    feed::FeedSource,
    messaging::{
        port::ChatPort,
        types::{ActivityKind, PresenceEntry, VideoEmbed},
    },
    poller::Poller,
    presence::{Rotator, StatusState},
    subscription, Result,
};

/// `ChatPort` over a live gateway context.
#[derive(Clone)]
pub struct DiscordChat {
    ctx: Context,
}

impl DiscordChat {
    pub fn new(ctx: Context) -> Self {
        Self { ctx }
    }

    fn map_err(e: serenity::Error) -> Error {
        Error::Chat(format!("discord error: {e}"))
    }
}

#[async_trait::async_trait]
impl ChatPort for DiscordChat {
    async fn joined_guilds(&self) -> Result<Vec<GuildId>> {
        Ok(self
            .ctx
            .cache
            .guilds()
            .into_iter()
            .map(|g| GuildId(g.get()))
            .collect())
    }

    async fn role_members(&self, guild: GuildId, role: RoleId) -> Result<Option<Vec<UserId>>> {
        let guild_id = serenity::all::GuildId::new(guild.0);
        let role_id = serenity::all::RoleId::new(role.0);

        let roles = guild_id
            .roles(&self.ctx.http)
            .await
            .map_err(Self::map_err)?;
        if !roles.contains_key(&role_id) {
            return Ok(None);
        }

        // REST fetch on purpose; the gateway cache misses role updates.
        let members = guild_id
            .members(&self.ctx.http, None, None)
            .await
            .map_err(Self::map_err)?;

        Ok(Some(
            members
                .into_iter()
                .filter(|m| m.roles.contains(&role_id))
                .map(|m| UserId(m.user.id.get()))
                .collect(),
        ))
    }

    async fn send_direct(
        &self,
        user: UserId,
        content: &str,
        embed: Option<&VideoEmbed>,
    ) -> Result<()> {
        let user_id = serenity::all::UserId::new(user.0);
        let channel = user_id
            .create_dm_channel(&self.ctx.http)
            .await
            .map_err(Self::map_err)?;

        let mut message = CreateMessage::new().content(content);
        if let Some(e) = embed {
            let timestamp = Timestamp::from_unix_timestamp(e.timestamp.timestamp())
                .unwrap_or_else(|_| Timestamp::now());
            message = message.embed(
                CreateEmbed::new()
                    .title(e.title.clone())
                    .colour(Colour::new(e.color))
                    .image(e.image_url.clone())
                    .timestamp(timestamp),
            );
        }

        channel
            .id
            .send_message(&self.ctx.http, message)
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn set_presence(&self, entry: &PresenceEntry) -> Result<()> {
        let activity = match entry.kind {
            ActivityKind::Watching => ActivityData::watching(entry.label.clone()),
            ActivityKind::Playing => ActivityData::playing(entry.label.clone()),
        };
        self.ctx.set_presence(Some(activity), OnlineStatus::Online);
        Ok(())
    }
}

struct Handler {
    cfg: Arc<Config>,
    feed: Arc<dyn FeedSource>,
    status: Arc<Mutex<StatusState>>,
    chat_slot: Arc<OnceLock<Arc<DiscordChat>>>,
    shutdown: CancellationToken,
    started: AtomicBool,
}

#[serenity::async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        // Reconnects fire `ready` again; never double-start the timers.
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        println!("[GATEWAY] Logged in as {}", ready.user.name);

        let chat = Arc::new(DiscordChat::new(ctx));
        let _ = self.chat_slot.set(chat.clone());

        let poller = Poller::new(
            self.cfg.clone(),
            self.feed.clone(),
            chat.clone(),
            self.status.clone(),
        );
        let rotator = Rotator::new(chat.clone(), self.status.clone(), self.cfg.rotate_interval);

        let poll_cancel = self.shutdown.clone();
        let poll_task = tokio::spawn(async move { poller.run(poll_cancel).await });

        let rotate_cancel = self.shutdown.clone();
        let rotate_task = tokio::spawn(async move { rotator.run(rotate_cancel).await });

        // A panicking loop is fatal: alert the operator and bail out.
        let owner = self.cfg.owner_id;
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::try_join!(poll_task, rotate_task) {
                if shutdown.is_cancelled() {
                    return;
                }
                eprintln!("[FATAL] Background task died: {e}");
                alerting::notify_operator(
                    chat.as_ref(),
                    owner,
                    AlertKind::TaskFailure,
                    &e.to_string(),
                )
                .await;
                std::process::exit(1);
            }
        });
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot || msg.guild_id.is_some() {
            return;
        }

        let user = UserId(msg.author.id.get());
        match subscription::handle_direct_text(&self.cfg.stopped_users_file, user, &msg.content) {
            Ok(Some(reply)) => {
                if let Err(e) = msg.channel_id.say(&ctx.http, reply.text()).await {
                    eprintln!("[DM] Failed to reply to {}: {e}", user.0);
                }
            }
            Ok(None) => {}
            Err(e) => eprintln!("[DM] Subscription update failed: {e}"),
        }
    }
}

/// Connect and run until the gateway dies or a termination signal lands.
///
/// Fatal gateway errors alert the operator and bubble up (exit 1 in the
/// binary); SIGTERM / Ctrl-C alerts `Shutdown` and returns Ok (exit 0).
pub async fn run(cfg: Arc<Config>, feed: Arc<dyn FeedSource>) -> anyhow::Result<()> {
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let status = Arc::new(Mutex::new(StatusState::new(&cfg)));
    let chat_slot: Arc<OnceLock<Arc<DiscordChat>>> = Arc::new(OnceLock::new());
    let shutdown = CancellationToken::new();

    let handler = Handler {
        cfg: cfg.clone(),
        feed,
        status,
        chat_slot: chat_slot.clone(),
        shutdown: shutdown.clone(),
        started: AtomicBool::new(false),
    };

    let mut client = Client::builder(&cfg.discord_token, intents)
        .event_handler(handler)
        .await?;

    let shard_manager = client.shard_manager.clone();

    tokio::select! {
        res = client.start() => {
            shutdown.cancel();
            if let Err(e) = res {
                if let Some(chat) = chat_slot.get() {
                    alerting::notify_operator(
                        chat.as_ref(),
                        cfg.owner_id,
                        AlertKind::FatalError,
                        &e.to_string(),
                    )
                    .await;
                }
                return Err(e.into());
            }
            Ok(())
        }
        _ = shutdown_signal() => {
            println!("[GATEWAY] Termination signal received, shutting down");
            shutdown.cancel();
            if let Some(chat) = chat_slot.get() {
                alerting::notify_operator(
                    chat.as_ref(),
                    cfg.owner_id,
                    AlertKind::Shutdown,
                    "termination signal received",
                )
                .await;
            }
            shard_manager.shutdown_all().await;
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut term = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
