use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

use crate::AppState;

pub struct CleanupService {
    state: Arc<AppState>,
}

impl CleanupService {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Один проход: закрывает брошенные сессии и снимает их удержания
    pub async fn run_once(&self) -> usize {
        let swept = self.state.sessions.sweep_expired().await;
        if swept > 0 {
            info!("🧹 Swept {} idle booking sessions", swept);
        }
        swept
    }

    /// Фоновый цикл очистки
    pub fn spawn(self, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(every).await;
                self.run_once().await;
            }
        })
    }
}
