use crate::adapters::http::WebhookClient;
use crate::domain::ports::CommitHistory;
use serde::Serialize;
use serde_json::{json, Value};

const EMBED_COLOR: u32 = 5814783;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseInfo {
    pub tag: String,
    pub skill_count: usize,
    pub commit_message: String,
    pub repository: String,
}

impl ReleaseInfo {
    /// Git failures fall back to `"unknown"` and an empty commit message.
    pub async fn gather<H: CommitHistory + ?Sized>(
        history: &H,
        skill_count: usize,
        default_repository: &str,
    ) -> Self {
        let tag = history.latest_tag().await.unwrap_or_else(|e| {
            tracing::warn!("⚠️ Could not determine release tag: {}", e);
            "unknown".to_string()
        });
        let commit_message = history.head_subject().await.unwrap_or_default();
        let repository = std::env::var("GITHUB_REPOSITORY")
            .ok()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| default_repository.to_string());

        Self {
            tag,
            skill_count,
            commit_message,
            repository,
        }
    }
}

pub fn discord_payload(info: &ReleaseInfo) -> Value {
    json!({
        "embeds": [{
            "title": format!("New Release: {}", info.tag),
            "description": "Claude Skills collection has been updated!",
            "color": EMBED_COLOR,
            "fields": [
                { "name": "Total Skills", "value": info.skill_count.to_string(), "inline": true },
                { "name": "Repository", "value": info.repository, "inline": true }
            ],
            "footer": { "text": "Claude Skills Collection" }
        }]
    })
}

pub fn slack_payload(info: &ReleaseInfo) -> Value {
    json!({
        "blocks": [
            {
                "type": "header",
                "text": { "type": "plain_text", "text": format!("New Release: {}", info.tag) }
            },
            {
                "type": "section",
                "fields": [
                    { "type": "mrkdwn", "text": format!("*Total Skills:*\n{}", info.skill_count) },
                    { "type": "mrkdwn", "text": format!("*Repository:*\n{}", info.repository) }
                ]
            }
        ]
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent { attempts: u32 },
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelOutcome {
    pub channel: &'static str,
    pub delivery: Delivery,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyReport {
    pub outcomes: Vec<ChannelOutcome>,
}

impl NotifyReport {
    /// True when at least one channel was configured and none succeeded.
    pub fn all_failed(&self) -> bool {
        let attempted: Vec<&ChannelOutcome> = self
            .outcomes
            .iter()
            .filter(|o| o.delivery != Delivery::Skipped)
            .collect();
        !attempted.is_empty()
            && attempted
                .iter()
                .all(|o| matches!(o.delivery, Delivery::Failed(_)))
    }
}

pub struct Notifier {
    client: WebhookClient,
    discord: Option<String>,
    slack: Option<String>,
}

impl Notifier {
    pub fn new(client: WebhookClient, discord: Option<String>, slack: Option<String>) -> Self {
        Self {
            client,
            discord,
            slack,
        }
    }

    async fn deliver(&self, channel: &'static str, url: Option<&str>, payload: Value) -> ChannelOutcome {
        let delivery = match url {
            None => {
                tracing::info!("{} webhook not configured, skipping", channel);
                Delivery::Skipped
            }
            Some(url) => match self.client.post_json(channel, url, &payload).await {
                Ok(attempts) => {
                    tracing::info!("✅ {} notification sent", channel);
                    Delivery::Sent { attempts }
                }
                Err(e) => {
                    tracing::error!("❌ {}", e);
                    Delivery::Failed(e.to_string())
                }
            },
        };
        ChannelOutcome { channel, delivery }
    }

    /// Both channels are always attempted; one failing never stops the other.
    pub async fn notify(&self, info: &ReleaseInfo) -> NotifyReport {
        let discord = self
            .deliver("Discord", self.discord.as_deref(), discord_payload(info))
            .await;
        let slack = self
            .deliver("Slack", self.slack.as_deref(), slack_payload(info))
            .await;
        NotifyReport {
            outcomes: vec![discord, slack],
        }
    }
}
