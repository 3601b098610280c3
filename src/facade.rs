//! System facade
//!
//! Lifecycle surface over an external system controller (UI shell, service
//! supervisor). The facade owns nothing; it delegates each call and logs
//! the transition.

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Lifecycle contract the surrounding system implements
#[async_trait]
pub trait SystemController: Send + Sync {
    async fn show(&self) -> Result<()>;
    async fn hide(&self) -> Result<()>;
    async fn close(&self) -> Result<()>;
    async fn status(&self) -> serde_json::Value;
}

/// Thin delegating wrapper around a [`SystemController`]
pub struct SystemFacade {
    controller: Arc<dyn SystemController>,
}

impl SystemFacade {
    pub fn new(controller: Arc<dyn SystemController>) -> Self {
        Self { controller }
    }

    pub async fn show(&self) -> Result<()> {
        tracing::info!("System show requested");
        self.controller.show().await
    }

    pub async fn hide(&self) -> Result<()> {
        tracing::info!("System hide requested");
        self.controller.hide().await
    }

    pub async fn close(&self) -> Result<()> {
        tracing::info!("System close requested");
        self.controller.close().await
    }

    pub async fn status(&self) -> serde_json::Value {
        self.controller.status().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingController {
        shows: AtomicUsize,
        hides: AtomicUsize,
        closes: AtomicUsize,
    }

    #[async_trait]
    impl SystemController for CountingController {
        async fn show(&self) -> Result<()> {
            self.shows.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn hide(&self) -> Result<()> {
            self.hides.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn close(&self) -> Result<()> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn status(&self) -> serde_json::Value {
            json!({
                "shows": self.shows.load(Ordering::SeqCst),
                "hides": self.hides.load(Ordering::SeqCst),
            })
        }
    }

    #[tokio::test]
    async fn test_facade_delegates_each_call() {
        let controller = Arc::new(CountingController::default());
        let facade = SystemFacade::new(controller.clone());

        facade.show().await.unwrap();
        facade.hide().await.unwrap();
        facade.close().await.unwrap();

        assert_eq!(controller.shows.load(Ordering::SeqCst), 1);
        assert_eq!(controller.hides.load(Ordering::SeqCst), 1);
        assert_eq!(controller.closes.load(Ordering::SeqCst), 1);
        assert_eq!(facade.status().await, json!({"shows": 1, "hides": 1}));
    }
}
