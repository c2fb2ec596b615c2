use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Level, warn};

const ALERT_QUEUE_CAPACITY: usize = 256;

/// Fields naming the entity an alert is about. Sinks list them first and the
/// layer copies them down from enclosing spans.
pub(crate) const CORRELATION_FIELDS: [&str; 5] = [
    "booking_id",
    "user_id",
    "provider_id",
    "idempotency_key",
    "event_type",
];

#[derive(Clone, Debug)]
pub(crate) struct SpanSummary {
    pub(crate) name: String,
    pub(crate) fields: BTreeMap<String, String>,
}

/// One log event that crossed the alert threshold.
#[derive(Clone, Debug)]
pub(crate) struct AlertEvent {
    pub(crate) level: Level,
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) service_name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
    pub(crate) target: String,
    pub(crate) location: Option<String>,
    pub(crate) message: Option<String>,
    pub(crate) fields: BTreeMap<String, String>,
    pub(crate) spans: Vec<SpanSummary>,
}

#[async_trait]
pub(crate) trait AlertSink: Send + Sync {
    async fn deliver(&self, alert: &AlertEvent) -> Result<()>;
    fn name(&self) -> &'static str;
}

/// Hands alerts to a background task so that logging never waits on a
/// network call.
#[derive(Clone)]
pub(crate) struct AlertDispatcher {
    tx: mpsc::Sender<AlertEvent>,
}

impl AlertDispatcher {
    pub(crate) fn spawn(sinks: Vec<Arc<dyn AlertSink>>) -> Self {
        let (tx, mut rx) = mpsc::channel::<AlertEvent>(ALERT_QUEUE_CAPACITY);

        tokio::spawn(async move {
            while let Some(alert) = rx.recv().await {
                for sink in &sinks {
                    if let Err(error) = sink.deliver(&alert).await {
                        // Warn sits below the alert threshold, so this cannot loop.
                        warn!(sink = sink.name(), error = %error, "observability: alert delivery failed");
                    }
                }
            }
        });

        Self { tx }
    }

    pub(crate) fn dispatch(&self, alert: AlertEvent) {
        match self.tx.try_send(alert) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("observability: alert queue full, dropping alert");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                warn!("observability: alert queue closed, dropping alert");
            }
        }
    }
}
