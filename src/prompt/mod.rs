//! Interactive prompts.
//!
//! Steps never talk to the terminal directly; they go through [`Prompter`] so
//! tests can script answers and count how often a question was asked.

use crate::error::{CliError, Result};
use async_trait::async_trait;
use console::style;
use dialoguer::{Confirm, Password, Select, theme::ColorfulTheme};
use std::time::Duration;

/// Questions a release run may ask the operator
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Yes/no question
    async fn confirm(&self, message: &str, default: bool) -> Result<bool>;

    /// Pick one of `items`, returning its index
    async fn select(&self, message: &str, items: &[String]) -> Result<usize>;

    /// Hidden input
    async fn password(&self, message: &str) -> Result<String>;

    /// Open `url` in a browser once `delay` has passed, without waiting for it
    fn open_browser_after(&self, url: &str, delay: Duration);
}

/// dialoguer-backed prompter for a real terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    /// Create a terminal prompter
    pub fn new() -> Self {
        Self
    }
}

fn prompt_failed(e: impl std::fmt::Display) -> CliError {
    CliError::PromptFailed {
        reason: e.to_string(),
    }
}

/// Run a blocking dialoguer call off the async runtime
async fn blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> dialoguer::Result<T> + Send + 'static,
{
    let answer = tokio::task::spawn_blocking(f)
        .await
        .map_err(prompt_failed)?
        .map_err(prompt_failed)?;
    Ok(answer)
}

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn confirm(&self, message: &str, default: bool) -> Result<bool> {
        let message = message.to_string();
        blocking(move || {
            Confirm::with_theme(&ColorfulTheme::default())
                .with_prompt(message)
                .default(default)
                .interact()
        })
        .await
    }

    async fn select(&self, message: &str, items: &[String]) -> Result<usize> {
        let message = message.to_string();
        let items = items.to_vec();
        blocking(move || {
            Select::with_theme(&ColorfulTheme::default())
                .with_prompt(message)
                .items(&items)
                .default(0)
                .interact()
        })
        .await
    }

    async fn password(&self, message: &str) -> Result<String> {
        let message = message.to_string();
        blocking(move || {
            Password::with_theme(&ColorfulTheme::default())
                .with_prompt(message)
                .interact()
        })
        .await
    }

    fn open_browser_after(&self, url: &str, delay: Duration) {
        let url = url.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            eprintln!("{}", style(format!("Opening {url}")).dim());
            if let Err(e) = open::that(&url) {
                log::warn!("Failed to open browser for {url}: {e}");
            }
        });
    }
}
