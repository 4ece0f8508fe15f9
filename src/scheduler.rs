use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, interval};
use tracing::{error, info};

use crate::config::SchedulerConfig;
use crate::state::SharedState;

/// Background maintenance: sweeps expired cached recipes on one cadence and
/// aged image-cache entries on another. Both sweeps are idempotent, so a
/// missed or doubled tick is harmless.
pub struct Scheduler {
    state: Arc<SharedState>,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    pub fn new(state: Arc<SharedState>, config: SchedulerConfig) -> Self {
        Self {
            state,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!(
            recipe_purge_hours = self.config.recipe_purge_interval_hours,
            image_purge_hours = self.config.image_purge_interval_hours,
            "Starting maintenance scheduler"
        );

        let mut recipe_interval = interval(Duration::from_secs(
            u64::from(self.config.recipe_purge_interval_hours) * 60 * 60,
        ));
        let mut image_interval = interval(Duration::from_secs(
            u64::from(self.config.image_purge_interval_hours) * 60 * 60,
        ));

        // The first tick of an interval fires immediately; consume both so
        // the sweeps start one period after boot.
        recipe_interval.tick().await;
        image_interval.tick().await;

        loop {
            tokio::select! {
                _ = recipe_interval.tick() => {
                    if !*self.running.read().await {
                        break;
                    }
                    if let Err(e) = self.purge_expired_recipes().await {
                        error!("Scheduled recipe purge failed: {}", e);
                    }
                }
                _ = image_interval.tick() => {
                    if !*self.running.read().await {
                        break;
                    }
                    if let Err(e) = self.purge_old_images().await {
                        error!("Scheduled image purge failed: {}", e);
                    }
                }
            }
        }

        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Runs both sweeps once, for the `purge` CLI command and tests.
    pub async fn run_once(&self) -> Result<()> {
        self.purge_expired_recipes().await?;
        self.purge_old_images().await?;
        Ok(())
    }

    async fn purge_expired_recipes(&self) -> Result<()> {
        let deleted = self.state.recipe_service.purge_expired().await?;
        info!(deleted, "Expired recipe sweep complete");
        Ok(())
    }

    async fn purge_old_images(&self) -> Result<()> {
        let max_age_days = self.state.config.read().await.images.cache_max_age_days;
        let cutoff = Utc::now() - ChronoDuration::days(max_age_days);

        let deleted = self.state.store.delete_images_older_than(cutoff).await?;
        info!(deleted, "Image cache sweep complete");
        Ok(())
    }
}
