use crate::redis_client::RedisClient;
use tracing::info;

pub mod holds;

/// Redis-слой: удержания мест с TTL
#[derive(Clone)]
pub struct CacheService {
    redis: RedisClient,
}

impl CacheService {
    pub fn new(redis: RedisClient) -> Self {
        Self { redis }
    }

    // Проверка соединения при старте
    pub async fn ping(&self) -> redis::RedisResult<()> {
        let mut conn = self.redis.conn.clone();
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        info!("Redis answered {}", pong);
        Ok(())
    }
}
