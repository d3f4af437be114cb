use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use bookbot_core::{
    analytics::AnalyticsLogger,
    cache::{DeliveryCache, FileDeliveryCache},
    catalog::port::CatalogGateway,
    config::Config,
    delivery::{DeliveryService, DownloadCounter, RelayIndex},
    messaging::{
        port::MessagingPort,
        throttled::{ThrottleConfig, ThrottledMessenger},
    },
    search::SearchService,
    settings::{FileSettingsStore, SettingsStore},
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub messenger: Arc<dyn MessagingPort>,
    pub search: Arc<SearchService>,
    pub delivery: Arc<DeliveryService>,
    pub settings: Arc<dyn SettingsStore>,
    pub analytics: Arc<AnalyticsLogger>,
}

/// Wire the services together and run long polling until shutdown.
pub async fn run_polling(
    cfg: Arc<Config>,
    gateway: Arc<dyn CatalogGateway>,
    relay: Option<Arc<dyn RelayIndex>>,
    counter: Arc<dyn DownloadCounter>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    // Basic startup info.
    if let Ok(me) = bot.get_me().await {
        println!("bookbot started: @{}", me.username());
    }
    println!("Catalog: {}", cfg.catalog_url);
    println!(
        "Relay channel: {}",
        cfg.relay_url.as_deref().unwrap_or("disabled")
    );

    // All outbound traffic goes through the throttle; RetryAfter handling
    // stays in the Telegram adapter underneath.
    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
        raw_messenger,
        ThrottleConfig::default(),
    ));

    let settings: Arc<dyn SettingsStore> =
        Arc::new(FileSettingsStore::load(cfg.settings_file.clone()));
    let cache: Arc<dyn DeliveryCache> =
        Arc::new(FileDeliveryCache::load(cfg.delivery_cache_file.clone()));

    let search = Arc::new(SearchService::new(
        cfg.clone(),
        messenger.clone(),
        gateway.clone(),
        settings.clone(),
    ));
    let delivery = Arc::new(DeliveryService::new(
        cfg.clone(),
        messenger.clone(),
        gateway,
        cache,
        relay,
        counter,
        settings.clone(),
        search.clone(),
    ));

    let analytics = Arc::new(AnalyticsLogger::new(
        cfg.analytics_log_path.clone(),
        cfg.analytics_log_json,
    ));

    let state = Arc::new(AppState {
        cfg,
        messenger,
        search,
        delivery,
        settings,
        analytics,
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_inline_query().endpoint(handlers::handle_inline_query))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
