//! # Background Playback Example
//!
//! Drives a `PlaybackService` through a typical host lifecycle using the
//! desktop shims: create, bind, a few notification taps, dismissal.
//!
//! Run with: `cargo run --example background_playback --package core-service`

use std::sync::Arc;

use anyhow::Context;
use bridge_desktop::{
    BundledCatalogSource, DesktopForegroundHost, DesktopMediaSession, LoggingNotificationSink,
    QueuePlayerEngineFactory, DEFAULT_CATALOG_ASSET,
};
use bridge_traits::LogLevel;
use core_runtime::config::CoreConfig;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_service::PlaybackService;

const CATALOG: &[u8] = br#"[
    {
        "url": "https://bitdash-a.akamaihd.net/content/sintel/hls/playlist.m3u8",
        "title": "Sintel",
        "description": "Blender open movie"
    },
    {
        "url": "https://test-streams.mux.dev/x36xhzz/x36xhzz.m3u8",
        "title": "Big Buck Bunny",
        "description": "Mux test stream"
    },
    {
        "url": "https://cdn.example.com/tears/master.m3u8?token=secret",
        "title": "Tears of Steel",
        "description": "Signed stream"
    }
]"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug),
    )
    .context("initialize logging")?;

    let foreground = Arc::new(DesktopForegroundHost::new());
    let sink = Arc::new(LoggingNotificationSink::new());
    let config = CoreConfig::builder()
        .catalog_source(Arc::new(BundledCatalogSource::new(
            DEFAULT_CATALOG_ASSET,
            CATALOG,
        )))
        .engine_factory(Arc::new(QueuePlayerEngineFactory::new()))
        .notification_sink(sink.clone())
        .media_session(Arc::new(DesktopMediaSession::new()))
        .foreground_host(foreground.clone())
        .build()
        .context("build core config")?;

    let service = PlaybackService::new(config);
    let mut events = service.events().subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("event: {}", event.description());
        }
    });

    service.on_create().await;
    service
        .on_start_command(Some("START_FOREGROUND_ACTION"))
        .await;

    let binding = service.on_bind().await;
    let player = binding
        .into_player()
        .context("no playback session")?;
    println!("bound to session {}", player.session_id());

    for action in ["next", "pause", "play", "skip", "previous", "rewind"] {
        service.on_notification_action(action).await?;
        if let Some(posted) = sink.last_posted() {
            let actions: Vec<&str> = posted.actions.iter().map(|a| a.id()).collect();
            println!("{:>8} -> {} {:?}", action, posted.title, actions);
        }
    }

    service.on_unbind();
    service.on_notification_dismissed().await?;
    foreground.wait_for_stop().await;
    println!("foreground stopped, player alive: {}", player.is_alive());

    service.on_destroy().await?;
    drop(service);
    printer.abort();
    Ok(())
}
