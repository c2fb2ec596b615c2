use super::alerts::{AlertEvent, AlertSink, CORRELATION_FIELDS};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use url::Url;

const DISCORD_CONTENT_LIMIT: usize = 2000;
const TRUNCATION_SUFFIX: &str = "\n… (truncated)";

pub(crate) struct DiscordAlertSink {
    webhook_url: Url,
    client: Client,
}

impl DiscordAlertSink {
    pub(crate) fn new(webhook_url: Url) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(3)).build()?;

        Ok(Self {
            webhook_url,
            client,
        })
    }
}

fn render(alert: &AlertEvent) -> String {
    let mut lines = vec![
        format!(
            "**{}** `{}` `{}` `{}`",
            alert.service_name,
            alert.environment,
            alert.component,
            alert.level.as_str()
        ),
        format!(
            "`{}` `{}`{}",
            alert.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            alert.target,
            alert
                .location
                .as_ref()
                .map(|loc| format!(" `{loc}`"))
                .unwrap_or_default()
        ),
    ];

    if let Some(message) = alert.message.as_ref().filter(|m| !m.trim().is_empty()) {
        lines.push(format!("> {}", message.trim()));
    }

    let leading = CORRELATION_FIELDS
        .iter()
        .filter_map(|key| alert.fields.get(*key).map(|value| (*key, value)));
    let trailing = alert
        .fields
        .iter()
        .filter(|(key, _)| !CORRELATION_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.as_str(), value));
    let fields: Vec<_> = leading.chain(trailing).collect();

    if !fields.is_empty() {
        lines.push("fields:".to_string());
        lines.extend(fields.into_iter().map(|(k, v)| format!("- `{k}` = `{v}`")));
    }

    for span in alert.spans.iter().filter(|s| !s.fields.is_empty()) {
        lines.push(format!("span `{}`:", span.name));
        lines.extend(span.fields.iter().map(|(k, v)| format!("- `{k}` = `{v}`")));
    }

    truncate(lines.join("\n"))
}

fn truncate(content: String) -> String {
    if content.chars().count() <= DISCORD_CONTENT_LIMIT {
        return content;
    }

    let allowed = DISCORD_CONTENT_LIMIT - TRUNCATION_SUFFIX.chars().count();
    let mut truncated: String = content.chars().take(allowed).collect();
    truncated.push_str(TRUNCATION_SUFFIX);
    truncated
}

#[async_trait]
impl AlertSink for DiscordAlertSink {
    async fn deliver(&self, alert: &AlertEvent) -> Result<()> {
        let response = self
            .client
            .post(self.webhook_url.clone())
            .json(&json!({ "content": render(alert) }))
            .send()
            .await
            // reqwest errors carry the URL, which carries the webhook token.
            .map_err(|err| {
                if err.is_timeout() {
                    anyhow!("discord webhook request timed out")
                } else if err.is_connect() {
                    anyhow!("discord webhook connection failed")
                } else {
                    anyhow!("discord webhook request failed")
                }
            })?;

        if response.status().is_success() {
            return Ok(());
        }

        Err(anyhow!(
            "discord webhook returned non-success status: {}",
            response.status()
        ))
    }

    fn name(&self) -> &'static str {
        "discord"
    }
}
