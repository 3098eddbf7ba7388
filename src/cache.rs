//! In-memory caching using moka
//!
//! Caches the accommodation catalog, which changes rarely. The
//! availability index is rebuilt from the date documents on every request
//! and is never cached.

use moka::future::Cache;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};

use crate::booking::models::RoomOffering;
use crate::booking::queries;

/// Application cache holding parsed room offerings
#[derive(Clone)]
pub struct AppCache {
    /// Single offerings (room id -> RoomOffering)
    pub rooms: Cache<String, Arc<RoomOffering>>,
    /// Catalog listings (cache_key -> Vec<RoomOffering>)
    pub room_lists: Cache<String, Arc<Vec<RoomOffering>>>,
}

impl AppCache {
    /// Create a new cache instance with configured TTLs
    pub fn new() -> Self {
        Self {
            // Offerings: 200 entries, 10 min TTL, 5 min idle
            rooms: Cache::builder()
                .max_capacity(200)
                .time_to_live(Duration::from_secs(10 * 60))
                .time_to_idle(Duration::from_secs(5 * 60))
                .build(),

            // Catalog listings: one per category filter, 5 min TTL
            room_lists: Cache::builder()
                .max_capacity(10)
                .time_to_live(Duration::from_secs(5 * 60))
                .build(),
        }
    }

    /// Get cache statistics for monitoring
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            rooms_size: self.rooms.entry_count(),
            room_lists_size: self.room_lists.entry_count(),
        }
    }

    /// Invalidate all caches
    pub fn invalidate_all(&self) {
        self.rooms.invalidate_all();
        self.room_lists.invalidate_all();
        info!("All caches invalidated");
    }

    /// Generate cache key for a catalog listing
    pub fn room_list_key(category: Option<&str>) -> String {
        match category {
            Some(cat) => format!("rooms:{}", cat),
            None => "rooms:all".to_string(),
        }
    }
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics for the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub rooms_size: u64,
    pub room_lists_size: u64,
}

/// Start background cache warmer
///
/// Warms the catalog on startup and refreshes every 10 minutes.
pub async fn start_cache_warmer(cache: AppCache, db: PgPool) {
    warm_cache(&cache, &db).await;

    let mut interval = interval(Duration::from_secs(10 * 60));
    loop {
        interval.tick().await;
        warm_cache(&cache, &db).await;
    }
}

/// Warm the cache with the full catalog
async fn warm_cache(cache: &AppCache, db: &PgPool) {
    info!("Starting cache warm-up...");

    match queries::list_accommodations(db, None).await {
        Ok(rows) => {
            let rooms: Vec<RoomOffering> = rows.into_iter().map(|row| row.parse()).collect();
            for room in &rooms {
                cache
                    .rooms
                    .insert(room.id.clone(), Arc::new(room.clone()))
                    .await;
            }
            cache
                .room_lists
                .insert(AppCache::room_list_key(None), Arc::new(rooms))
                .await;
        }
        Err(e) => warn!("Failed to warm catalog cache: {}", e),
    }

    info!("Cache warm-up complete. Stats: {:?}", cache.stats());
}
