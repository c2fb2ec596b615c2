use anyhow::{Result, anyhow};
use reqwest::{
    Client,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::NotificationSender;
use crate::domain::value_objects::enums::notification_categories::NotificationCategory;

const FCM_SEND_URL: &str = "https://fcm.googleapis.com/fcm/send";
const PUSH_QUEUE_CAPACITY: usize = 512;

#[derive(Debug, Clone, PartialEq, Serialize)]
struct PushNotification {
    title: String,
    body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct PushData {
    category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct PushMessage {
    to: String,
    notification: PushNotification,
    data: PushData,
}

impl PushMessage {
    fn new(device_token: &str, category: NotificationCategory, subject_name: &str) -> Self {
        let rendered = category.render(subject_name);
        Self {
            to: device_token.to_string(),
            notification: PushNotification {
                title: rendered.title,
                body: rendered.body,
            },
            data: PushData {
                category: category.to_string(),
            },
        }
    }
}

/// Firebase Cloud Messaging sender. Messages are queued and posted by a
/// background task.
pub struct FcmNotifier {
    tx: mpsc::Sender<PushMessage>,
}

impl FcmNotifier {
    /// Spawns the delivery task; call from within a tokio runtime.
    pub fn spawn(server_key: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;
        let (tx, mut rx) = mpsc::channel::<PushMessage>(PUSH_QUEUE_CAPACITY);

        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let category = message.data.category.clone();
                match deliver(&client, &server_key, &message).await {
                    Ok(()) => debug!(%category, "notifications: push delivered"),
                    Err(err) => warn!(%category, error = %err, "notifications: push failed"),
                }
            }
        });

        Ok(Self { tx })
    }
}

async fn deliver(client: &Client, server_key: &str, message: &PushMessage) -> Result<()> {
    let response = client
        .post(FCM_SEND_URL)
        .header(AUTHORIZATION, format!("key={server_key}"))
        .header(CONTENT_TYPE, "application/json")
        .json(message)
        .send()
        .await?;

    if response.status().is_success() {
        return Ok(());
    }

    Err(anyhow!("fcm returned non-success status: {}", response.status()))
}

impl NotificationSender for FcmNotifier {
    fn notify(&self, device_token: &str, category: NotificationCategory, subject_name: &str) {
        let message = PushMessage::new(device_token, category, subject_name);
        if let Err(err) = self.tx.try_send(message) {
            let reason = match err {
                mpsc::error::TrySendError::Full(_) => "queue full",
                mpsc::error::TrySendError::Closed(_) => "queue closed",
            };
            warn!(%category, reason, "notifications: dropping push notification");
        }
    }
}
