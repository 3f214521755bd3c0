use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::annotate::annotator::SaveState;
use crate::annotate::notifier::visible_notifications;
use crate::cli::config::AppConfig;
use crate::dom::Page;
use crate::dom::snapshot::{PageSnapshot, SnapshotError};
use crate::engine::context::EngineContext;
use crate::engine::engine::Engine;
use crate::extract::extractor::ExtractedPost;
use crate::platform::descriptor::PlatformDescriptor;
use crate::platform::detector::detect;
use crate::platform::registry::{PlatformRegistry, RegistryError};
use crate::scan::scanner::Scanner;
use crate::submit::endpoint::HttpSaveEndpoint;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("no supported platform serves {0}")]
    UnsupportedPage(String),

    #[error("post {requested} requested but only {available} could be annotated")]
    PostOutOfRange { requested: usize, available: usize },

    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("save task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

// ============================================================================
// platforms subcommand
// ============================================================================

pub fn cmd_platforms(config: &AppConfig) -> Result<(), AppError> {
    let registry = config.registry()?;
    println!("{} supported platforms:", registry.len());
    for platform in registry.iter() {
        println!(
            "  {:<10} {:<14} {} ({} url strategies, {} media strategies)",
            platform.id,
            platform.display_name,
            platform.hostnames.join(", "),
            platform.url_strategies.len(),
            platform.media_strategies.len()
        );
    }
    Ok(())
}

// ============================================================================
// detect subcommand
// ============================================================================

/// Print the platform serving `origin`. Returns whether one matched.
pub fn cmd_detect(config: &AppConfig, origin: &str) -> Result<bool, AppError> {
    let registry = config.registry()?;
    match detect(&registry, origin) {
        Some(id) => {
            println!("{}", id);
            Ok(true)
        }
        None => {
            println!("unsupported");
            Ok(false)
        }
    }
}

// ============================================================================
// scan subcommand
// ============================================================================

/// Annotate a captured page once and list the posts that received a control.
pub fn cmd_scan(
    config: &AppConfig,
    page_path: &str,
    origin: Option<&str>,
    json: bool,
) -> Result<Vec<ExtractedPost>, AppError> {
    let registry = config.registry()?;
    let mut snapshot = PageSnapshot::load(page_path)?;
    if let Some(origin) = origin {
        snapshot.url = origin.to_string();
    }

    let platform = platform_for(&registry, &snapshot.url)?;
    let context = Arc::new(EngineContext::new());
    context.activate(None, Some(platform.id.clone()));
    let scanner = Scanner::new(Arc::new(platform.clone()), context);

    let mut doc = snapshot.into_document();
    let body = doc.body();
    let report = scanner.scan(&mut doc, body);
    let posts: Vec<ExtractedPost> = report.annotated.into_iter().map(|c| c.extracted).collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&posts)?);
    } else {
        println!(
            "{}: {} candidates, {} annotated, {} without permalink{}",
            platform.display_name,
            report.candidates,
            posts.len(),
            report.unresolved,
            if report.used_fallback { " (fallback discovery)" } else { "" }
        );
        for (i, post) in posts.iter().enumerate() {
            println!("  [{}] {}", i + 1, post.url);
            if let Some(media) = &post.media_url {
                println!("      media: {}", media);
            }
        }
    }

    Ok(posts)
}

// ============================================================================
// save subcommand
// ============================================================================

/// Run one captured page through the full pipeline and click the save
/// control of post number `post` (1-based). Returns whether it was saved.
pub async fn cmd_save(
    config: &AppConfig,
    endpoint_flag: Option<&str>,
    page_path: &str,
    token: &str,
    post: usize,
) -> Result<bool, AppError> {
    let registry = Arc::new(config.registry()?);
    let snapshot = PageSnapshot::load(page_path)?;
    platform_for(&registry, &snapshot.url)?;

    let base_url = config.endpoint_url(endpoint_flag);
    debug!(%base_url, "using save service");
    let endpoint = Arc::new(HttpSaveEndpoint::new(base_url));
    let page = Page::new(snapshot.into_document());
    let engine = Engine::new(page.clone(), registry, endpoint, config.engine_settings());

    engine.activate(token);
    let controls = engine.context().controls();
    let available = controls.len();
    let Some(control) = post.checked_sub(1).and_then(|i| controls.into_iter().nth(i)) else {
        engine.deactivate();
        return Err(AppError::PostOutOfRange {
            requested: post,
            available,
        });
    };

    info!(url = %control.extracted.url, "clicking save control");
    let state = match engine.click(control.id) {
        Some(task) => task.await?,
        None => SaveState::Idle,
    };

    for message in page.with(|doc| visible_notifications(doc)) {
        println!("{}", message);
    }
    engine.deactivate();

    Ok(state == SaveState::Saved)
}

// ============================================================================
// Helpers
// ============================================================================

fn platform_for<'a>(
    registry: &'a PlatformRegistry,
    url: &str,
) -> Result<&'a PlatformDescriptor, AppError> {
    detect(registry, url)
        .and_then(|id| registry.get(&id))
        .ok_or_else(|| AppError::UnsupportedPage(url.to_string()))
}
