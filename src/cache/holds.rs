use futures::future::BoxFuture;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::cache::CacheService;
use crate::error::AppResult;
use crate::models::LayoutScope;
use crate::services::holds::HoldStore;

const HOLD_PREFIX: &str = "hold";

// Захват свободного ключа или продление своего, одной командой на сервере
const CLAIM_SCRIPT: &str = r#"
if redis.call("SET", KEYS[1], ARGV[1], "NX", "EX", ARGV[2]) then
    return 1
end
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("EXPIRE", KEYS[1], ARGV[2])
end
return 0
"#;

// Удаляем ключ только если он принадлежит этому держателю
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
end
return 0
"#;

fn hold_key(scope: &LayoutScope, seat_id: &str) -> String {
    format!("{}:{}:{}:{}", HOLD_PREFIX, scope.layout_key, scope.date, seat_id)
}

impl HoldStore for CacheService {
    fn claim<'a>(
        &'a self,
        scope: &'a LayoutScope,
        seat_id: &'a str,
        holder: &'a str,
        ttl: Duration,
    ) -> BoxFuture<'a, AppResult<bool>> {
        Box::pin(async move {
            let mut conn = self.redis.conn.clone();
            let claimed: i64 = redis::Script::new(CLAIM_SCRIPT)
                .key(hold_key(scope, seat_id))
                .arg(holder)
                .arg(ttl.as_secs().max(1))
                .invoke_async(&mut conn)
                .await?;

            if claimed == 1 {
                return Ok(true);
            }

            debug!("Seat {} on {} already held", seat_id, scope);
            Ok(false)
        })
    }

    fn release<'a>(
        &'a self,
        scope: &'a LayoutScope,
        seat_id: &'a str,
        holder: &'a str,
    ) -> BoxFuture<'a, AppResult<bool>> {
        Box::pin(async move {
            let mut conn = self.redis.conn.clone();
            let deleted: i64 = redis::Script::new(RELEASE_SCRIPT)
                .key(hold_key(scope, seat_id))
                .arg(holder)
                .invoke_async(&mut conn)
                .await?;
            Ok(deleted > 0)
        })
    }

    fn holders<'a>(
        &'a self,
        scope: &'a LayoutScope,
        seat_ids: &'a [String],
    ) -> BoxFuture<'a, AppResult<HashMap<String, String>>> {
        Box::pin(async move {
            if seat_ids.is_empty() {
                return Ok(HashMap::new());
            }

            // Все GET одним pipeline
            let mut conn = self.redis.conn.clone();
            let mut pipe = redis::pipe();
            for seat_id in seat_ids {
                pipe.get(hold_key(scope, seat_id));
            }
            let results: Vec<Option<String>> = pipe.query_async(&mut conn).await?;

            Ok(seat_ids
                .iter()
                .zip(results)
                .filter_map(|(id, holder)| holder.map(|h| (id.clone(), h)))
                .collect())
        })
    }
}
