//! Browser session lifecycle: launching Headless Chrome with bounded retries
//! and releasing it on every exit path.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use headless_chrome::{Browser, LaunchOptions, Tab};
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use tracing::{debug, error, info, warn};

use crate::error::SessionInitError;

pub static USER_AGENTS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:124.0) Gecko/20100101 Firefox/124.0",
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/123.0.0.0 Safari/537.36",
    ]
});

const FALLBACK_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

/// Picks a user agent from the pool at random.
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FALLBACK_USER_AGENT)
}

/// One open browser page the fetcher drives.
pub trait BrowserSession {
    /// Loads `url` and waits for navigation to settle.
    fn navigate(&self, url: &str) -> Result<()>;

    /// Whether an element matching `selector` shows up within `timeout`.
    fn wait_for(&self, selector: &str, timeout: Duration) -> bool;

    /// Current page HTML.
    fn content(&self) -> Result<String>;

    fn close(&mut self) -> Result<()>;
}

/// Starts a fresh session presenting `user_agent`.
pub trait SessionLauncher {
    fn launch(&self, user_agent: &str) -> Result<Box<dyn BrowserSession>>;
}

/// Fixed-backoff retry budget for session setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

// ============================================================================
// Headless Chrome
// ============================================================================

/// Launches isolated headless Chrome instances.
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    pub chrome_path: Option<PathBuf>,
}

impl ChromeLauncher {
    pub fn new(chrome_path: Option<PathBuf>) -> Self {
        Self { chrome_path }
    }
}

impl SessionLauncher for ChromeLauncher {
    fn launch(&self, user_agent: &str) -> Result<Box<dyn BrowserSession>> {
        // Incognito, non-interactive profile
        let mut args = vec![
            OsStr::new("--disable-gpu"),
            OsStr::new("--no-sandbox"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--incognito"),
        ];
        let ua_arg = format!("--user-agent={}", user_agent);
        args.push(OsStr::new(&ua_arg));

        match &self.chrome_path {
            Some(path) => info!("🧭 Using configured Chrome binary: {}", path.display()),
            None => debug!("🧭 Auto-detecting Chrome binary"),
        }

        let browser = Browser::new(LaunchOptions {
            headless: true,
            window_size: Some((1920, 1080)),
            path: self.chrome_path.clone(),
            args,
            ..Default::default()
        })?;
        let tab = browser.new_tab()?;

        Ok(Box::new(ChromeSession {
            browser: Some(browser),
            tab,
        }))
    }
}

pub struct ChromeSession {
    browser: Option<Browser>,
    tab: Arc<Tab>,
}

impl BrowserSession for ChromeSession {
    fn navigate(&self, url: &str) -> Result<()> {
        self.tab.navigate_to(url)?;
        self.tab.wait_until_navigated()?;
        Ok(())
    }

    fn wait_for(&self, selector: &str, timeout: Duration) -> bool {
        self.tab
            .wait_for_element_with_custom_timeout(selector, timeout)
            .is_ok()
    }

    fn content(&self) -> Result<String> {
        self.tab.get_content()
    }

    fn close(&mut self) -> Result<()> {
        let tab_result = self.tab.close(true);
        // Dropping the browser kills the Chrome process.
        self.browser.take();
        tab_result.map(|_| ())
    }
}

// ============================================================================
// Session manager
// ============================================================================

/// Owns at most one session for the lifetime of a single analysis.
///
/// The session is closed by [`SessionManager::release`] or, failing that, when
/// the manager is dropped.
pub struct SessionManager<'l> {
    launcher: &'l dyn SessionLauncher,
    policy: RetryPolicy,
    session: Option<Box<dyn BrowserSession>>,
}

impl<'l> SessionManager<'l> {
    pub fn new(launcher: &'l dyn SessionLauncher, policy: RetryPolicy) -> Self {
        Self {
            launcher,
            policy,
            session: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    /// Returns the open session, launching one if needed. Each attempt uses a
    /// fresh random user agent; attempts are spaced by the policy backoff.
    pub fn acquire(&mut self) -> Result<&dyn BrowserSession, SessionInitError> {
        if self.session.is_none() {
            self.session = Some(self.launch_with_retry()?);
        } else {
            debug!("♻️ Reusing open browser session");
        }

        match self.session.as_deref() {
            Some(session) => Ok(session),
            None => Err(SessionInitError {
                attempts: 0,
                last_error: "session missing after launch".to_string(),
            }),
        }
    }

    fn launch_with_retry(&self) -> Result<Box<dyn BrowserSession>, SessionInitError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::from("no attempt made");

        for attempt in 1..=max_attempts {
            let user_agent = random_user_agent();
            debug!("Using User-Agent (attempt {}): {}", attempt, user_agent);

            match self.launcher.launch(user_agent) {
                Ok(session) => {
                    info!("✅ Browser session ready (attempt {}/{})", attempt, max_attempts);
                    return Ok(session);
                }
                Err(e) => {
                    error!("❌ Session setup failed (attempt {}/{}): {}", attempt, max_attempts, e);
                    last_error = e.to_string();
                    if attempt < max_attempts {
                        std::thread::sleep(self.policy.backoff);
                    }
                }
            }
        }

        error!("🔥 Failed to initialize browser session after {} attempts", max_attempts);
        Err(SessionInitError {
            attempts: max_attempts,
            last_error,
        })
    }

    /// Closes the session if one is open. Close failures are logged only.
    pub fn release(&mut self) {
        if let Some(mut session) = self.session.take() {
            match session.close() {
                Ok(()) => info!("🧹 Browser session closed"),
                Err(e) => warn!("⚠️ Error closing browser session: {}", e),
            }
        }
    }
}

impl Drop for SessionManager<'_> {
    fn drop(&mut self) {
        self.release();
    }
}
