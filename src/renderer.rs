use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use colored::*;
use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::SiteConfig;
use crate::models::ImageRecord;

/// A single browser tab the downloader drives for the whole run.
#[async_trait(?Send)]
pub trait PageRenderer {
    /// Loads `url` and waits for the page to settle.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Rendered HTML of the current page.
    async fn content(&self) -> Result<String>;

    /// `src` and `naturalWidth` of every image matching `selector`.
    async fn images(&self, selector: &str) -> Result<Vec<ImageRecord>>;

    /// Clicks the first element matching `selector` and waits for the
    /// navigation it triggers.
    async fn click_and_wait(&self, selector: &str) -> Result<()>;
}

pub struct ChromeRenderer {
    browser: Browser,
    page: Page,
    handle: JoinHandle<()>,
}

impl ChromeRenderer {
    pub async fn launch(config: &SiteConfig) -> Result<Self> {
        let browser_config = BrowserConfig::builder()
            .window_size(config.window_size.0, config.window_size.1)
            .build()
            .map_err(|e| anyhow!("Failed to create browser config: {}", e))?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| anyhow!("Failed to launch browser: {}", e))?;

        let handle = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if let Err(err) = h {
                    let err_str = err.to_string();
                    if !err_str.contains("data did not match any variant")
                        && !err_str.contains("untagged enum Message")
                    {
                        error!("Browser handler error: {}", err);
                    } else {
                        debug!("Chrome protocol message ignored: {}", err);
                    }
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handle.abort();
                return Err(anyhow!("Failed to create new page: {}", e));
            }
        };

        Ok(Self {
            browser,
            page,
            handle,
        })
    }

    pub async fn close(mut self) {
        self.browser.close().await.ok();
        self.handle.abort();
    }
}

#[async_trait(?Send)]
impl PageRenderer for ChromeRenderer {
    async fn navigate(&self, url: &str) -> Result<()> {
        info!("Visiting \"{}\"", url.green());

        self.page
            .goto(url)
            .await
            .map_err(|e| anyhow!("Failed to navigate to {}: {}", url, e))?;

        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| anyhow!("Failed to wait for navigation: {}", e))?;

        Ok(())
    }

    async fn content(&self) -> Result<String> {
        self.page
            .content()
            .await
            .map_err(|e| anyhow!("Failed to get page content: {}", e))
    }

    async fn images(&self, selector: &str) -> Result<Vec<ImageRecord>> {
        let js_code = images_script(selector)?;

        self.page
            .evaluate(js_code.as_str())
            .await
            .map_err(|e| anyhow!("Failed to extract images: {}", e))?
            .into_value::<Vec<ImageRecord>>()
            .map_err(|e| anyhow!("Failed to parse image list: {}", e))
    }

    async fn click_and_wait(&self, selector: &str) -> Result<()> {
        self.page
            .find_element(selector)
            .await
            .map_err(|e| anyhow!("No element for '{}': {}", selector, e))?
            .click()
            .await
            .map_err(|e| anyhow!("Failed to click '{}': {}", selector, e))?;

        self.page
            .wait_for_navigation()
            .await
            .map_err(|e| anyhow!("Failed to wait for navigation: {}", e))?;

        Ok(())
    }
}

fn images_script(selector: &str) -> Result<String> {
    let selector = serde_json::to_string(selector)?;
    Ok(format!(
        "Array.from(document.querySelectorAll({}), ({{ src, naturalWidth }}) => ({{ src, naturalWidth }}))",
        selector
    ))
}
