use crate::config::Config;
use crate::convert::Converter;
use crate::db::{DbPool, get_pool_stats};
use crate::sse::{FeedSender, create_feed};
use std::sync::Arc;
use tokio::time::{Duration, interval};
use tracing::{debug, error};

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub feed: FeedSender,
    pub converter: Arc<Converter>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(db: DbPool, config: &Config) -> Self {
        let converter = Converter::new(&config.converter_program, config.convert_timeout);

        AppState {
            db,
            feed: create_feed(),
            converter: Arc::new(converter),
            max_upload_bytes: config.max_upload_bytes,
        }
    }

    /// Periodically checks out a connection so a dead database shows up in
    /// the logs before the next request hits it.
    pub fn spawn_health_check(&self) {
        let db = self.db.clone();
        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                match db.acquire().await {
                    Ok(conn) => {
                        drop(conn);
                        debug!("{}", get_pool_stats(&db));
                    }
                    Err(e) => {
                        error!("Database connection health check failed: {}", e);
                    }
                }
            }
        });
    }
}
