use crate::prelude::*;
use crate::service::var_service::get_log_level;
use tracing_subscriber::{filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub async fn set_logging() -> Result<()> {
    let level = match get_log_level().await {
        Ok(level) => level,
        Err(e) => {
            eprintln!("{}, falling back to INFO", e);
            tracing::Level::INFO
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(LevelFilter::from_level(level))
        .try_init()?;

    Ok(())
}
