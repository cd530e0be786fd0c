use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config;
use crate::data::RedditCommentFetcher;
use crate::reddit;
use crate::stash::Stash;
use crate::storage;
use crate::ui;

pub fn run() -> Result<()> {
    let cfg = config::load(config::LoadOptions::default()).context("load config")?;
    let config_path = config::default_path();
    let display_path = friendly_path(config_path.as_ref());

    let store = Arc::new(
        storage::Store::open(storage::Options {
            path: cfg.storage.path.clone(),
        })
        .context("open storage")?,
    );

    let user_agent = if !cfg.reddit.user_agent.trim().is_empty() {
        cfg.reddit.user_agent.clone()
    } else {
        format!("redstash/{}", crate::VERSION)
    };

    let client = reddit::Client::new(reddit::ClientConfig {
        user_agent,
        base_url: Some(cfg.reddit.base_url.clone()),
        timeout: Some(cfg.reddit.timeout),
        http_client: None,
    })
    .context("build reddit client")?;
    let fetcher = Arc::new(RedditCommentFetcher::new(Arc::new(client)));
    let stash = Arc::new(Stash::new(store, fetcher));

    let records = stash.all().context("load saved comments")?;
    let status = if records.is_empty() {
        "Press i, paste a Reddit comment URL, and hit Enter to save it.".to_string()
    } else {
        format!(
            "{} saved comment(s). j/k to move, r to refresh, q to quit.",
            records.len()
        )
    };

    let options = ui::Options {
        status_message: status,
        records,
        stash,
        config_path: display_path,
    };

    let mut model = ui::Model::new(options);
    model.run()
}

fn friendly_path(path: Option<&std::path::PathBuf>) -> String {
    if let Some(path) = path {
        if let Some(home) = dirs::home_dir() {
            if let Ok(stripped) = path.strip_prefix(&home) {
                let mut display = String::from("~");
                if !stripped.as_os_str().is_empty() {
                    display.push_str(&format!("/{}", stripped.display()));
                }
                return display;
            }
        }
        path.display().to_string()
    } else {
        "~/.config/redstash/config.yaml".to_string()
    }
}
