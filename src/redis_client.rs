use redis::{aio::ConnectionManager, Client};
use tracing::info;

// Соединение с автоматическим переподключением, дешево клонируется
#[derive(Clone)]
pub struct RedisClient {
    pub conn: ConnectionManager,
}

impl RedisClient {
    pub async fn new(redis_url: &str) -> redis::RedisResult<Self> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        info!("Redis connection manager ready");
        Ok(RedisClient { conn })
    }
}
