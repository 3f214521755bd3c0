use clap::Parser;
use serde_json::json;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path},
};

use linkogenei_agent::cli::{
    commands::{AppError, cmd_detect, cmd_save, cmd_scan},
    config::{AppConfig, Cli, Commands, load_config},
};

fn fixture(name: &str) -> String {
    let base = std::env::current_dir().unwrap();
    base.join("tests").join("fixtures").join(name).display().to_string()
}

// ============================================================================
// CLI Argument Parsing Tests
// ============================================================================

#[test]
fn cli_parse_scan_minimal() {
    let cli = Cli::parse_from(["linkogenei-agent", "scan", "--page", "page.json"]);
    match cli.command {
        Commands::Scan { page, origin, json } => {
            assert_eq!(page, "page.json");
            assert_eq!(origin, None);
            assert!(!json);
        }
        _ => panic!("Expected Scan command"),
    }
}

#[test]
fn cli_parse_scan_all_args() {
    let cli = Cli::parse_from([
        "linkogenei-agent",
        "scan",
        "--page",
        "page.json",
        "--origin",
        "https://twitter.com/home",
        "--json",
    ]);
    match cli.command {
        Commands::Scan { page, origin, json } => {
            assert_eq!(page, "page.json");
            assert_eq!(origin.as_deref(), Some("https://twitter.com/home"));
            assert!(json);
        }
        _ => panic!("Expected Scan command"),
    }
}

#[test]
fn cli_parse_save_defaults_to_first_post() {
    let cli = Cli::parse_from(["linkogenei-agent", "save", "--page", "p.json", "--token", "abc"]);
    match cli.command {
        Commands::Save { page, token, post } => {
            assert_eq!(page, "p.json");
            assert_eq!(token, "abc");
            assert_eq!(post, 1);
        }
        _ => panic!("Expected Save command"),
    }
}

#[test]
fn cli_parse_detect_and_platforms() {
    let cli = Cli::parse_from(["linkogenei-agent", "detect", "--origin", "x.com"]);
    assert!(matches!(cli.command, Commands::Detect { origin } if origin == "x.com"));

    let cli = Cli::parse_from(["linkogenei-agent", "platforms"]);
    assert!(matches!(cli.command, Commands::Platforms));
}

#[test]
fn cli_parse_global_flags() {
    let cli = Cli::parse_from([
        "linkogenei-agent",
        "-vv",
        "--endpoint",
        "https://genei.example/api/linkogenei",
        "--config",
        "custom.yaml",
        "platforms",
    ]);
    assert_eq!(cli.verbose, 2);
    assert_eq!(cli.endpoint.as_deref(), Some("https://genei.example/api/linkogenei"));
    assert_eq!(cli.config.as_deref(), Some("custom.yaml"));
}

#[test]
fn cli_rejects_save_without_token() {
    assert!(Cli::try_parse_from(["linkogenei-agent", "save", "--page", "p.json"]).is_err());
}

// ============================================================================
// Config File Tests
// ============================================================================

#[test]
fn config_load_missing_file() {
    let config = load_config(Some("nonexistent_file_that_does_not_exist.yaml"));
    // Should return defaults without error
    assert_eq!(config.endpoint.base_url, "http://localhost:5001/api/linkogenei");
    assert_eq!(config.scan.debounce_ms, 150);
}

#[test]
fn config_default_values() {
    let config = AppConfig::default();
    assert_eq!(config.endpoint.base_url, "http://localhost:5001/api/linkogenei");
    assert_eq!(config.endpoint.timeout_secs, 15);
    assert_eq!(config.scan.debounce_ms, 150);
    assert_eq!(config.scan.max_wait_ms, 1000);
    assert_eq!(config.notifications.display_ms, 3000);
    assert!(config.platforms.is_empty());

    let settings = config.engine_settings();
    assert_eq!(settings.request_timeout, std::time::Duration::from_secs(15));
    assert_eq!(settings.debounce, std::time::Duration::from_millis(150));
    assert_eq!(settings.max_wait, std::time::Duration::from_millis(1000));
}

#[test]
fn config_partial_yaml() {
    let yaml = r#"
endpoint:
  base_url: "https://genei.example/api/linkogenei"
scan:
  debounce_ms: 0
"#;
    let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.endpoint.base_url, "https://genei.example/api/linkogenei");
    // Other endpoint fields get defaults
    assert_eq!(config.endpoint.timeout_secs, 15);
    assert_eq!(config.scan.debounce_ms, 0);
    assert_eq!(config.notifications.display_ms, 3000);
    assert!(config.engine_settings().debounce.is_zero());
}

#[test]
fn config_platforms_extend_the_registry() {
    let yaml = r#"
platforms:
  - id: bluesky
    display_name: Bluesky
    hostnames: [bsky.app]
    base_url: https://bsky.app
    post_selector: 'div[data-testid^="feedItem"]'
    url_strategies:
      - kind: any_link
        patterns: ['/post/']
"#;
    let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
    let registry = config.registry().unwrap();
    assert_eq!(registry.len(), 6);
    assert!(cmd_detect(&config, "https://bsky.app/profile/rust").unwrap());
}

#[test]
fn endpoint_flag_overrides_config() {
    let config = AppConfig::default();
    assert_eq!(config.endpoint_url(None), "http://localhost:5001/api/linkogenei");
    assert_eq!(config.endpoint_url(Some("http://other")), "http://other");
}

// ============================================================================
// Command Tests
// ============================================================================

#[test]
fn detect_reports_unsupported_origins() {
    let config = AppConfig::default();
    assert!(cmd_detect(&config, "https://www.youtube.com/").unwrap());
    assert!(!cmd_detect(&config, "https://example.com").unwrap());
}

#[test]
fn scan_lists_resolvable_posts() {
    let posts = cmd_scan(&AppConfig::default(), &fixture("x_home.json"), None, false).unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].url, "https://x.com/rustlang/status/1790000000000000001");
    assert_eq!(
        posts[0].media_url.as_deref(),
        Some("https://pbs.twimg.com/media/GNabc.jpg?format=jpg&name=small")
    );
    assert_eq!(posts[0].platform, "X (Twitter)");
    assert_eq!(posts[1].url, "https://x.com/ferris/status/1790000000000000002");
    assert_eq!(posts[1].media_url, None);
}

#[test]
fn scan_origin_override_changes_the_platform() {
    let posts = cmd_scan(
        &AppConfig::default(),
        &fixture("x_home.json"),
        Some("https://twitter.com/home"),
        true,
    )
    .unwrap();
    assert_eq!(posts[0].url, "https://twitter.com/rustlang/status/1790000000000000001");
    assert_eq!(posts[0].platform, "Twitter");
}

#[test]
fn scan_of_unsupported_page_is_an_error() {
    let result = cmd_scan(
        &AppConfig::default(),
        &fixture("x_home.json"),
        Some("https://example.com"),
        false,
    );
    assert!(matches!(result, Err(AppError::UnsupportedPage(_))));
}

#[test]
fn scan_of_missing_file_is_an_error() {
    let result = cmd_scan(&AppConfig::default(), "does/not/exist.json", None, false);
    assert!(matches!(result, Err(AppError::Snapshot(_))));
}

#[tokio::test]
async fn save_posts_the_selected_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/linkogenei/save-post"))
        .and(header("authorization", "Bearer abc"))
        .and(body_partial_json(json!({
            "url": "https://x.com/ferris/status/1790000000000000002",
            "platform": "X (Twitter)",
            "title": "Home / X"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    let base = format!("{}/api/linkogenei", server.uri());
    let saved = cmd_save(&AppConfig::default(), Some(&base), &fixture("x_home.json"), "abc", 2)
        .await
        .unwrap();
    assert!(saved);
}

#[tokio::test]
async fn save_reports_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "success": false })))
        .mount(&server)
        .await;

    let base = format!("{}/api/linkogenei", server.uri());
    let saved = cmd_save(&AppConfig::default(), Some(&base), &fixture("x_home.json"), "expired", 1)
        .await
        .unwrap();
    assert!(!saved);
}

#[tokio::test]
async fn save_of_missing_post_is_an_error() {
    let result = cmd_save(&AppConfig::default(), None, &fixture("x_home.json"), "abc", 9).await;
    assert!(matches!(
        result,
        Err(AppError::PostOutOfRange { requested: 9, available: 2 })
    ));

    let result = cmd_save(&AppConfig::default(), None, &fixture("x_home.json"), "abc", 0).await;
    assert!(matches!(result, Err(AppError::PostOutOfRange { requested: 0, .. })));
}
