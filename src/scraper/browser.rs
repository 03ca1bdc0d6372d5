//! Browser automation using chromiumoxide.
//!
//! Every fetch launches its own browser, renders one page and tears the
//! browser down again before returning.

use chromiumoxide::browser::{Browser as ChromeBrowser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams, EventLoadingFailed, EventLoadingFinished, EventRequestWillBeSent,
};
use chromiumoxide::error::CdpError;
use chromiumoxide::listeners::EventStream;
use chromiumoxide::page::Page;
use futures::StreamExt;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::fmt::Display;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::BrowserSettings;
use crate::error::FetchError;

/// Quiet period with no requests in flight before the page counts as idle
const NETWORK_QUIET_WINDOW: Duration = Duration::from_millis(500);
/// Upper bound for a graceful browser shutdown before the process is killed
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Rendered page handed to the extractors
#[derive(Debug, Clone, Default)]
pub struct RenderedPage {
    pub html: String,
    pub script_contents: Vec<String>,
    pub title: String,
}

impl RenderedPage {
    /// Build from rendered HTML; scripts and a missing title are read from the markup.
    pub fn from_html(html: String, title: Option<String>) -> Self {
        let document = Html::parse_document(&html);

        let script_contents = match Selector::parse("script") {
            Ok(selector) => document
                .select(&selector)
                .map(|s| s.text().collect::<String>())
                .filter(|text| !text.trim().is_empty())
                .collect(),
            Err(_) => Vec::new(),
        };

        let title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| {
                Selector::parse("title")
                    .ok()
                    .and_then(|sel| document.select(&sel).next())
                    .map(|t| t.text().collect::<String>().trim().to_string())
                    .unwrap_or_default()
            });

        Self {
            html,
            script_contents,
            title,
        }
    }
}

/// Request ids seen on the page that have not finished or failed yet
#[derive(Debug, Default)]
struct InFlight {
    pending: HashSet<String>,
    settled: HashSet<String>,
}

impl InFlight {
    /// Redirect hops reuse the request id; ids already settled stay settled.
    fn started(&mut self, id: &str) {
        if !self.settled.contains(id) {
            self.pending.insert(id.to_string());
        }
    }

    fn settled(&mut self, id: &str) {
        self.pending.remove(id);
        self.settled.insert(id.to_string());
    }

    fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Network domain listeners attached to a page before navigation
struct NetworkWatch {
    sent: EventStream<EventRequestWillBeSent>,
    finished: EventStream<EventLoadingFinished>,
    failed: EventStream<EventLoadingFailed>,
}

impl NetworkWatch {
    async fn attach(page: &Page) -> Result<Self, CdpError> {
        page.execute(EnableParams::default()).await?;
        Ok(Self {
            sent: page.event_listener::<EventRequestWillBeSent>().await?,
            finished: page.event_listener::<EventLoadingFinished>().await?,
            failed: page.event_listener::<EventLoadingFailed>().await?,
        })
    }

    /// Resolve once no request is in flight and no network event arrived for
    /// `NETWORK_QUIET_WINDOW`. Callers bound this with their own timeout.
    async fn wait_for_idle(mut self) {
        let mut in_flight = InFlight::default();

        loop {
            tokio::select! {
                Some(event) = self.sent.next() => in_flight.started(event.request_id.inner()),
                Some(event) = self.finished.next() => in_flight.settled(event.request_id.inner()),
                Some(event) = self.failed.next() => in_flight.settled(event.request_id.inner()),
                _ = tokio::time::sleep(NETWORK_QUIET_WINDOW), if in_flight.is_idle() => return,
                else => {
                    debug!("Network event streams closed before the page went idle");
                    return;
                }
            }
        }
    }
}

/// Browser wrapper for web scraping
pub struct Browser {
    browser: ChromeBrowser,
    handle: tokio::task::JoinHandle<()>,
}

impl Browser {
    /// Launch a new headless browser instance
    pub async fn launch(settings: &BrowserSettings) -> Result<Self, FetchError> {
        let mut builder = BrowserConfig::builder();
        if let Some(path) = resolve_executable(settings)? {
            debug!("Using browser executable {}", path.display());
            builder = builder.chrome_executable(path);
        }
        if settings.no_sandbox {
            builder = builder.no_sandbox();
        }

        let config = builder
            .disable_default_args()
            .arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-accelerated-2d-canvas")
            .arg("--no-first-run")
            .arg("--no-zygote")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--disable-sync")
            .arg("--mute-audio")
            .arg(format!("--user-agent={}", settings.user_agent))
            .window_size(1920, 1080)
            .request_timeout(settings.navigation_timeout())
            .build()
            .map_err(FetchError::LaunchFailed)?;

        let (browser, mut handler) = ChromeBrowser::launch(config)
            .await
            .map_err(|e| FetchError::LaunchFailed(e.to_string()))?;

        // Handler task must keep running for the browser to work
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
        });

        Ok(Self { browser, handle })
    }

    /// Navigate to `url` and return the page once the network has settled.
    pub async fn fetch_page(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<RenderedPage, FetchError> {
        let to_fetch_error = |e| nav_error(url, timeout, e);

        let navigation = async {
            let page = self
                .browser
                .new_page("about:blank")
                .await
                .map_err(to_fetch_error)?;
            let network = NetworkWatch::attach(&page).await.map_err(to_fetch_error)?;

            debug!("Navigating to {}", url);
            page.goto(url).await.map_err(to_fetch_error)?;
            network.wait_for_idle().await;
            debug!("Network idle on {}", url);

            let html = page.content().await.map_err(to_fetch_error)?;
            let title = page.get_title().await.ok().flatten();

            if let Err(e) = page.close().await {
                debug!("Failed to close page: {}", e);
            }
            Ok::<_, FetchError>(RenderedPage::from_html(html, title))
        };

        match tokio::time::timeout(timeout, navigation).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::NavigationTimeout {
                url: url.to_string(),
                timeout_secs: timeout.as_secs(),
            }),
        }
    }

    /// Close the browser and reap its process, killing it when a graceful
    /// shutdown fails or exceeds `CLOSE_TIMEOUT`.
    pub async fn close(mut self) {
        let browser = &mut self.browser;
        let shutdown = async {
            browser.close().await.map_err(|e| e.to_string())?;
            browser.wait().await.map_err(|e| e.to_string())?;
            Ok::<_, String>(())
        };

        if !completes_within(CLOSE_TIMEOUT, shutdown).await {
            if let Some(Err(e)) = self.browser.kill().await {
                warn!("Failed to kill browser: {}", e);
            }
        }
        self.handle.abort();
    }
}

impl Drop for Browser {
    fn drop(&mut self) {
        // chromiumoxide kills a still-running child when its Browser drops
        self.handle.abort();
    }
}

/// Launch a browser, render `url`, release the browser on every path.
pub async fn fetch(url: &str, settings: &BrowserSettings) -> Result<RenderedPage, FetchError> {
    info!("Launching browser to scrape: {}", url);
    let browser = Browser::launch(settings).await?;

    let result = browser.fetch_page(url, settings.navigation_timeout()).await;
    browser.close().await;

    if let Ok(page) = &result {
        info!(
            "Rendered {} ({} bytes, {} scripts)",
            url,
            page.html.len(),
            page.script_contents.len()
        );
    }
    result
}

/// Await `step` for at most `deadline`; false when it failed or ran out of time.
async fn completes_within<F, E>(deadline: Duration, step: F) -> bool
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    match tokio::time::timeout(deadline, step).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!("Browser shutdown failed: {}", e);
            false
        }
        Err(_) => {
            warn!("Browser shutdown timed out after {:?}", deadline);
            false
        }
    }
}

fn nav_error(url: &str, timeout: Duration, e: CdpError) -> FetchError {
    match e {
        CdpError::Timeout => FetchError::NavigationTimeout {
            url: url.to_string(),
            timeout_secs: timeout.as_secs(),
        },
        other => FetchError::NavigationError(other.to_string()),
    }
}

/// Pick the browser executable.
///
/// An explicit setting must exist. Otherwise `CHROME_BIN` /
/// `PUPPETEER_EXECUTABLE_PATH`, then well-known install locations; `None`
/// leaves detection to chromiumoxide.
pub fn resolve_executable(settings: &BrowserSettings) -> Result<Option<PathBuf>, FetchError> {
    if let Some(explicit) = &settings.executable {
        let path = PathBuf::from(explicit);
        if path.exists() {
            return Ok(Some(path));
        }
        return Err(FetchError::LaunchFailed(format!(
            "configured browser executable not found: {}",
            explicit
        )));
    }

    for var in ["CHROME_BIN", "PUPPETEER_EXECUTABLE_PATH"] {
        if let Ok(value) = std::env::var(var) {
            let path = PathBuf::from(value);
            if path.exists() {
                return Ok(Some(path));
            }
        }
    }

    Ok(well_known_locations().into_iter().find(|p| p.exists()))
}

fn well_known_locations() -> Vec<PathBuf> {
    if cfg!(target_os = "windows") {
        let mut paths = vec![
            PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
            PathBuf::from(r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe"),
        ];
        if let Ok(local) = std::env::var("LOCALAPPDATA") {
            paths.push(Path::new(&local).join(r"Google\Chrome\Application\chrome.exe"));
        }
        paths
    } else if cfg!(target_os = "macos") {
        vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ]
    } else {
        [
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/snap/bin/chromium",
        ]
        .iter()
        .map(PathBuf::from)
        .collect()
    }
}
