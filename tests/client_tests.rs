use channel_digest::core::models::{Author, Message};
use channel_digest::discord::client::UNKNOWN_SERVER;
use channel_digest::discord::snowflake::date_to_snowflake;
use channel_digest::discord::{DiscordClient, MessagePageSource, WindowOptions, fetch_window};
use channel_digest::errors::DigestError;
use chrono::{Duration, TimeZone, Utc};
use mockito::Matcher;

const TOKEN: &str = "test-token";
const CHANNEL: &str = "111";

fn messages_path() -> String {
    format!("/channels/{CHANNEL}/messages")
}

fn message(minutes_ago: i64) -> Message {
    let timestamp =
        Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap() - Duration::minutes(minutes_ago);
    Message {
        id: date_to_snowflake(timestamp).unwrap(),
        author: Some(Author {
            username: "alice".to_string(),
        }),
        content: format!("m{minutes_ago}"),
        timestamp,
    }
}

async fn status_error(status: usize, retry_after: Option<&str>) -> DigestError {
    let mut server = mockito::Server::new_async().await;
    let mut mock = server
        .mock("GET", messages_path().as_str())
        .match_query(Matcher::Any)
        .with_status(status);
    if let Some(value) = retry_after {
        mock = mock.with_header("retry-after", value);
    }
    let _mock = mock.create_async().await;

    let client = DiscordClient::new(TOKEN.to_string(), Some(server.url()));
    client
        .fetch_page(CHANNEL, Some("1"), None)
        .await
        .expect_err("non-2xx must fail")
}

#[tokio::test]
async fn test_fetch_page_sends_cursor_limit_and_token() {
    let mut server = mockito::Server::new_async().await;
    let body = serde_json::to_string(&vec![message(0), message(1)]).unwrap();
    let mock = server
        .mock("GET", messages_path().as_str())
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("limit".into(), "100".into()),
            Matcher::UrlEncoded("before".into(), "12345".into()),
        ]))
        .match_header("authorization", TOKEN)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create_async()
        .await;

    let client = DiscordClient::new(TOKEN.to_string(), Some(server.url()));
    let page = client.fetch_page(CHANNEL, Some("12345"), None).await.unwrap();

    mock.assert_async().await;
    assert_eq!(page.len(), 2);
    assert_eq!(page[0], message(0));
}

#[tokio::test]
async fn test_fetch_page_passes_after_cursor() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", messages_path().as_str())
        .match_query(Matcher::UrlEncoded("after".into(), "777".into()))
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;

    let client = DiscordClient::new(TOKEN.to_string(), Some(server.url()));
    let page = client.fetch_page(CHANNEL, None, Some("777")).await.unwrap();

    mock.assert_async().await;
    assert!(page.is_empty());
}

#[tokio::test]
async fn test_status_classification() {
    assert!(matches!(status_error(401, None).await, DigestError::Auth));
    assert!(matches!(status_error(403, None).await, DigestError::Permission));
    assert!(matches!(status_error(404, None).await, DigestError::NotFound));
    assert!(matches!(
        status_error(502, None).await,
        DigestError::Http { status: 502 }
    ));
}

#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    assert!(matches!(
        status_error(429, Some("12")).await,
        DigestError::RateLimited {
            retry_after_seconds: 12
        }
    ));
}

#[tokio::test]
async fn test_rate_limit_defaults_without_header() {
    assert!(matches!(
        status_error(429, None).await,
        DigestError::RateLimited {
            retry_after_seconds: 5
        }
    ));
    assert!(matches!(
        status_error(429, Some("whenever")).await,
        DigestError::RateLimited {
            retry_after_seconds: 5
        }
    ));
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", messages_path().as_str())
        .match_query(Matcher::UrlEncoded("limit".into(), "100".into()))
        .with_status(200)
        .with_body("{\"message\": \"not an array\"}")
        .create_async()
        .await;

    let client = DiscordClient::new(TOKEN.to_string(), Some(server.url()));
    let err = client.fetch_page(CHANNEL, None, None).await.unwrap_err();
    assert!(matches!(err, DigestError::Parse(_)));
}

#[tokio::test]
async fn test_metadata_lookups() {
    let mut server = mockito::Server::new_async().await;
    let _channel = server
        .mock("GET", format!("/channels/{CHANNEL}").as_str())
        .with_status(200)
        .with_body(r#"{"id": "111", "name": "general", "guild_id": "222"}"#)
        .create_async()
        .await;
    let _guild = server
        .mock("GET", "/guilds/222")
        .with_status(200)
        .with_body(r#"{"id": "222", "name": "Traders"}"#)
        .create_async()
        .await;

    let client = DiscordClient::new(TOKEN.to_string(), Some(server.url()));
    let info = client.get_channel_info(CHANNEL).await;

    assert_eq!(info.name.as_deref(), Some("general"));
    assert_eq!(info.guild_id.as_deref(), Some("222"));
    assert_eq!(client.get_guild_name("222").await, "Traders");
}

#[tokio::test]
async fn test_metadata_failures_degrade_to_placeholders() {
    let mut server = mockito::Server::new_async().await;
    let _channel = server
        .mock("GET", format!("/channels/{CHANNEL}").as_str())
        .with_status(403)
        .create_async()
        .await;
    let _guild = server
        .mock("GET", "/guilds/222")
        .with_status(500)
        .create_async()
        .await;

    let client = DiscordClient::new(TOKEN.to_string(), Some(server.url()));

    assert_eq!(client.get_channel_info(CHANNEL).await.name, None);
    assert_eq!(client.get_guild_name("222").await, UNKNOWN_SERVER);
}

#[tokio::test]
async fn test_window_walk_over_http() {
    let to = Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap();
    let from = to - Duration::minutes(149);
    let first_page: Vec<Message> = (0..100).map(message).collect();
    let second_page: Vec<Message> = (100..200).map(message).collect();
    let first_cursor = date_to_snowflake(to).unwrap();
    let second_cursor = message(99).id;

    let mut server = mockito::Server::new_async().await;
    let page_one = server
        .mock("GET", messages_path().as_str())
        .match_query(Matcher::UrlEncoded("before".into(), first_cursor))
        .with_status(200)
        .with_body(serde_json::to_string(&first_page).unwrap())
        .expect(1)
        .create_async()
        .await;
    let page_two = server
        .mock("GET", messages_path().as_str())
        .match_query(Matcher::UrlEncoded("before".into(), second_cursor))
        .with_status(200)
        .with_body(serde_json::to_string(&second_page).unwrap())
        .expect(1)
        .create_async()
        .await;

    let client = DiscordClient::new(TOKEN.to_string(), Some(server.url()));
    let options = WindowOptions {
        rate_limit_delay: std::time::Duration::from_millis(5),
        ..WindowOptions::default()
    };
    let window = fetch_window(&client, CHANNEL, from, Some(to), &options)
        .await
        .unwrap();

    page_one.assert_async().await;
    page_two.assert_async().await;
    assert_eq!(window.messages.len(), 150);
    assert_eq!(window.messages.first().unwrap().id, message(149).id);
    assert_eq!(window.messages.last().unwrap().id, message(0).id);
}

#[tokio::test]
async fn test_window_walk_surfaces_rate_limit() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", messages_path().as_str())
        .match_query(Matcher::Any)
        .with_status(429)
        .with_header("retry-after", "12")
        .create_async()
        .await;

    let client = DiscordClient::new(TOKEN.to_string(), Some(server.url()));
    let from = Utc::now() - Duration::days(1);
    let err = fetch_window(&client, CHANNEL, from, None, &WindowOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, DigestError::FetchWindow(_)));
    assert!(matches!(
        err.root_cause(),
        DigestError::RateLimited {
            retry_after_seconds: 12
        }
    ));
}
