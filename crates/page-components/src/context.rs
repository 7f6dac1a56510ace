// Execution context
//
// The unit of isolation: one driver session, one handle cache, one configuration snapshot and
// one log sink. Every handle is built from a context and keeps a clone of it, so several contexts
// can coexist in one process (e.g. parallel tests) without sharing any state.

use crate::api::{BrowserKind, ComponentConfig, SessionProvider};
use crate::cache::HandleCache;
use crate::driver::{By, NativeDriver};
use crate::error::Result;
use crate::locator::{Element, Elements, Frame};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Log sink receiving one line per resolution or action event
pub type LogSink = Arc<dyn Fn(&str) + Send + Sync>;

struct ContextInner {
    driver: Arc<dyn NativeDriver>,
    cache: HandleCache,
    config: ComponentConfig,
    logger: RwLock<LogSink>,
}

/// Owns the driver session and handle cache that handles resolve against.
///
/// Cloning is cheap and yields the same context (shared cache, shared driver).
///
/// # Example
///
/// ```ignore
/// use page_components::{ComponentConfig, ExecutionContext};
///
/// let ctx = ExecutionContext::new(driver, ComponentConfig::default());
/// ctx.set_logger(|line| println!("[ui] {}", line));
///
/// let search = ctx.element("input[name='q']").named("SearchPage.query");
/// search.set_text("rust").await?;
/// ```
#[derive(Clone)]
pub struct ExecutionContext {
    inner: Arc<ContextInner>,
}

impl ExecutionContext {
    pub fn new(driver: Arc<dyn NativeDriver>, config: ComponentConfig) -> Self {
        let logger: LogSink = Arc::new(default_sink);
        Self {
            inner: Arc::new(ContextInner {
                driver,
                cache: HandleCache::new(),
                config,
                logger: RwLock::new(logger),
            }),
        }
    }

    /// Asks `provider` for a session for the configured browser.
    ///
    /// Fails with `Error::UnsupportedDriver` before contacting the provider if the configured
    /// browser name is not recognised.
    pub async fn launch(provider: &dyn SessionProvider, config: ComponentConfig) -> Result<Self> {
        let browser: BrowserKind = config.browser_name.parse()?;
        tracing::debug!("Launching {} session", browser);
        let driver = provider.launch(browser, &config).await?;
        Ok(Self::new(driver, config))
    }

    pub fn driver(&self) -> &dyn NativeDriver {
        self.inner.driver.as_ref()
    }

    pub fn cache(&self) -> &HandleCache {
        &self.inner.cache
    }

    pub fn config(&self) -> &ComponentConfig {
        &self.inner.config
    }

    /// Replaces the log sink for this context only
    pub fn set_logger<F>(&self, sink: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let sink: LogSink = Arc::new(sink);
        *self.inner.logger.write() = sink;
    }

    /// Emits one line to this context's log sink
    pub fn log(&self, message: &str) {
        let sink = Arc::clone(&self.inner.logger.read());
        sink(message);
    }

    /// Returns true if both values refer to the same context
    pub fn same_context(&self, other: &ExecutionContext) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Declares an element handle. Nothing is searched until it is used.
    pub fn element(&self, by: impl Into<By>) -> Element {
        Element::new(self, by)
    }

    /// Declares an element collection
    pub fn elements(&self, by: impl Into<By>) -> Elements {
        Elements::new(self, by)
    }

    /// Declares an iframe scope
    pub fn frame(&self, by: impl Into<By>) -> Frame {
        Frame::new(self, by)
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("config", &self.inner.config)
            .field("cached_entries", &self.inner.cache.len())
            .finish()
    }
}

fn default_sink(message: &str) {
    tracing::info!(target: "page_components", "{}", message);
}
