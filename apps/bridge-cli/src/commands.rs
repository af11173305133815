//! Subcommand implementations, returning their output as text

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::json;

use viewer_bridge::testing::InMemoryViewer;
use viewer_bridge::{
    build_viewer_url, initial_plan, QueueBucket, ReadinessStage, ViewerBridge, ViewerOptions,
};

/// Load options from `config` (or defaults) and apply the `--file` override
pub fn load_options(config: Option<&Path>, file: Option<String>) -> Result<ViewerOptions> {
    let mut options = match config {
        Some(path) => ViewerOptions::from_file(path)?,
        None => ViewerOptions::default(),
    };
    if let Some(file) = file {
        options.source = Some(file);
    }
    options.validate().context("Invalid viewer configuration")?;
    Ok(options)
}

pub fn url(options: &ViewerOptions) -> String {
    build_viewer_url(options)
}

/// Initial commands grouped by the bucket they wait in
pub fn plan(options: &ViewerOptions) -> String {
    let commands = initial_plan(options);
    let mut out = String::new();
    for bucket in QueueBucket::ALL {
        let in_bucket: Vec<_> = commands
            .iter()
            .filter(|c| c.default_bucket() == bucket)
            .collect();
        if in_bucket.is_empty() {
            continue;
        }
        out.push_str(&format!("[{}]\n", bucket.name()));
        for command in in_bucket {
            out.push_str(&format!("  {} {}\n", command.action(), command.payload()));
        }
    }
    if out.is_empty() {
        out.push_str("(no commands)\n");
    }
    out
}

/// Drive the bridge through a full load against the in-memory viewer and
/// return every message it posted, one JSON document per line
pub async fn simulate(options: ViewerOptions, pages: u32) -> Result<String> {
    if pages == 0 {
        bail!("--pages must be at least 1");
    }
    let viewer_id = options
        .viewer_id
        .clone()
        .unwrap_or_else(|| "simulated".to_string());
    let options = options.with_viewer_id(viewer_id.clone());

    let viewer = InMemoryViewer::new(&viewer_id);
    let (bridge, _events) = ViewerBridge::new(options, Box::new(viewer.surface()));
    viewer.connect(bridge.response_router());

    bridge.load().await.context("Viewer failed to load")?;
    for stage in [
        ReadinessStage::ScriptLoaded,
        ReadinessStage::ChannelReady,
        ReadinessStage::ApplicationReady,
        ReadinessStage::ViewerReady,
    ] {
        bridge.handle_message(&viewer.readiness(stage)).await?;
    }
    bridge
        .handle_message(&viewer.event("pagesLoaded", json!(pages)))
        .await?;

    let mut out = String::new();
    for message in viewer.received() {
        out.push_str(&serde_json::to_string(&message)?);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn options() -> ViewerOptions {
        ViewerOptions::from_toml_str(
            r#"
            viewer_id = "cli"
            source = "doc.pdf"
            locale = "nl"
            find = false
            zoom = "75"
            page = 2
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_plan_groups_by_bucket() {
        assert_eq!(
            plan(&options()),
            "[immediate]\n  set-locale \"nl\"\n\
             [viewer-ready]\n  show-find false\n\
             [document-loaded]\n  set-zoom 0.75\n  set-page 2\n"
        );
        assert_eq!(plan(&ViewerOptions::default()), "(no commands)\n");
    }

    #[test]
    fn test_file_override() {
        let options = load_options(None, Some("other.pdf".to_string())).unwrap();
        assert_eq!(url(&options), "assets/pdfjs/web/viewer.html?file=other.pdf");
    }

    #[tokio::test]
    async fn test_simulate_lists_posted_messages() {
        let output = simulate(options(), 5).await.unwrap();
        let actions: Vec<String> = output
            .lines()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                value["action"].as_str().unwrap().to_string()
            })
            .collect();
        assert_eq!(actions, vec!["set-locale", "show-find", "set-zoom", "set-page"]);
    }

    #[tokio::test]
    async fn test_simulate_rejects_zero_pages() {
        assert!(simulate(options(), 0).await.is_err());
    }
}
