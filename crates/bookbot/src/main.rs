use std::sync::Arc;

use bookbot_catalog::{CatalogClient, CounterClient, RelayClient};
use bookbot_core::{
    catalog::port::CatalogGateway,
    config::Config,
    delivery::{DownloadCounter, RelayIndex},
};

#[tokio::main]
async fn main() -> Result<(), bookbot_core::Error> {
    bookbot_core::logging::init("bookbot")?;

    let cfg = Arc::new(Config::load()?);

    let gateway: Arc<dyn CatalogGateway> = Arc::new(CatalogClient::new(&cfg));
    let relay: Option<Arc<dyn RelayIndex>> = cfg
        .relay_url
        .as_ref()
        .map(|url| Arc::new(RelayClient::new(url.clone())) as Arc<dyn RelayIndex>);
    let counter: Arc<dyn DownloadCounter> = Arc::new(CounterClient::new(&cfg));

    bookbot_telegram::router::run_polling(cfg, gateway, relay, counter)
        .await
        .map_err(|e| bookbot_core::Error::Messaging(format!("telegram bot failed: {e}")))?;

    Ok(())
}
