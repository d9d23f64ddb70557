use httpmock::prelude::*;
use skillkit::app::generator::{parse_prompts, Generator, Mode};
use skillkit::app::notify::{Delivery, Notifier, ReleaseInfo};
use skillkit::config::toml_config::GeneratorConfig;
use skillkit::utils::retry::RetryPolicy;
use skillkit::{AnthropicClient, LocalStorage, WebhookClient};
use std::time::Duration;
use tempfile::TempDir;

fn fast_retry(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        initial_delay_ms: 1,
        max_delay_ms: 5,
        jitter: 0.0,
        ..RetryPolicy::default()
    }
}

fn release() -> ReleaseInfo {
    ReleaseInfo {
        tag: "v1.4.0".to_string(),
        skill_count: 120,
        commit_message: "Add kafka skill".to_string(),
        repository: "acme/skills".to_string(),
    }
}

#[tokio::test]
async fn test_notify_delivers_both_channels() {
    let server = MockServer::start();
    let discord = server.mock(|when, then| {
        when.method(POST)
            .path("/discord")
            .header("Content-Type", "application/json")
            .body_contains("New Release: v1.4.0");
        then.status(204);
    });
    let slack = server.mock(|when, then| {
        when.method(POST).path("/slack").body_contains("*Total Skills:*");
        then.status(200).body("ok");
    });

    let client = WebhookClient::new(5, fast_retry(2)).unwrap();
    let notifier = Notifier::new(client, Some(server.url("/discord")), Some(server.url("/slack")));
    let report = notifier.notify(&release()).await;

    discord.assert();
    slack.assert();
    assert!(!report.all_failed());
    assert!(report
        .outcomes
        .iter()
        .all(|o| o.delivery == Delivery::Sent { attempts: 1 }));
}

#[tokio::test]
async fn test_notify_retries_server_errors_then_fails() {
    let server = MockServer::start();
    let discord = server.mock(|when, then| {
        when.method(POST).path("/discord");
        then.status(503).body("unavailable");
    });

    let client = WebhookClient::new(5, fast_retry(2)).unwrap();
    let notifier = Notifier::new(client, Some(server.url("/discord")), None);
    let report = notifier.notify(&release()).await;

    discord.assert_hits(3);
    assert!(report.all_failed());
    match &report.outcomes[0].delivery {
        Delivery::Failed(message) => assert!(message.contains("after 3 attempts")),
        other => panic!("unexpected delivery {:?}", other),
    }
    assert_eq!(report.outcomes[1].delivery, Delivery::Skipped);
}

#[tokio::test]
async fn test_notify_client_error_is_not_retried() {
    let server = MockServer::start();
    let slack = server.mock(|when, then| {
        when.method(POST).path("/slack");
        then.status(404).body("no_service");
    });

    let client = WebhookClient::new(5, fast_retry(3)).unwrap();
    let notifier = Notifier::new(client, None, Some(server.url("/slack")));
    let report = notifier.notify(&release()).await;

    slack.assert_hits(1);
    assert!(report.all_failed());
}

#[tokio::test]
async fn test_generator_with_messages_api() {
    let server = MockServer::start();
    let api = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/messages")
            .header("x-api-key", "test-key")
            .header("anthropic-version", "2023-06-01")
            .body_contains("\"role\":\"user\"")
            .body_contains("write about kafka");
        then.status(200).json_body(serde_json::json!({
            "id": "msg_1",
            "type": "message",
            "content": [
                {"type": "text", "text": "# Kafka\n\n## Overview\n"}
            ]
        }));
    });

    let config = GeneratorConfig {
        api_base: server.base_url(),
        retry: fast_retry(1),
        timeout_seconds: 5,
        ..GeneratorConfig::default()
    };
    let client = AnthropicClient::new(&config, "test-key").unwrap();

    let prompts = parse_prompts(
        r#"{"batches": [{"batch": "08", "category": "Messaging", "skills": [
            {"name": "kafka", "path": "08-messaging-queue/kafka/SKILL.md", "prompt": "write about kafka"}
        ]}]}"#,
    )
    .unwrap();

    let dir = TempDir::new().unwrap();
    let storage = LocalStorage::new(dir.path());
    let mut generator = Generator::new(storage, client, "tools/generation_state.json", Duration::ZERO)
        .await
        .unwrap();
    let summary = generator.run(&prompts, &Mode::All).await.unwrap();

    api.assert();
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 0);
    let written = std::fs::read_to_string(dir.path().join("08-messaging-queue/kafka/SKILL.md")).unwrap();
    assert_eq!(written, "# Kafka\n\n## Overview\n");
    assert!(dir.path().join("tools/generation_state.json").is_file());
}

#[tokio::test]
async fn test_generator_records_failed_requests() {
    let server = MockServer::start();
    let api = server.mock(|when, then| {
        when.method(POST).path("/v1/messages");
        then.status(401).json_body(serde_json::json!({"error": {"type": "authentication_error"}}));
    });

    let config = GeneratorConfig {
        api_base: server.base_url(),
        retry: fast_retry(2),
        ..GeneratorConfig::default()
    };
    let client = AnthropicClient::new(&config, "bad-key").unwrap();
    let prompts = parse_prompts(
        r#"{"batches": [{"batch": "01", "category": "Foundations", "skills": [
            {"name": "python", "path": "01-foundations/python/SKILL.md", "prompt": "p"}
        ]}]}"#,
    )
    .unwrap();

    let dir = TempDir::new().unwrap();
    let mut generator = Generator::new(LocalStorage::new(dir.path()), client, "state.json", Duration::ZERO)
        .await
        .unwrap();
    let summary = generator.run(&prompts, &Mode::All).await.unwrap();

    api.assert_hits(1);
    assert_eq!(summary.failed, 1);
    assert_eq!(generator.state().failed, vec!["01-foundations/python/SKILL.md"]);
    assert!(!dir.path().join("01-foundations/python/SKILL.md").exists());
}
