// Element - Lazy, self-healing handle to a single DOM node
//
// An Element is declared once (often as a page-object field) and resolved on first use.
// The resolved reference is cached per execution context and transparently re-resolved when
// the page replaces the node.
//
// Resolution order on every fresh search:
//   default content -> container chain (root to leaf) -> frame -> descriptor search
//
// Frame selection is global session state that another handle may have changed since the last
// search, so the whole path is re-derived each time rather than trusted from a previous pass.

use crate::assertions::ElementVerification;
use crate::context::ExecutionContext;
use crate::driver::{By, ElementRef, NativeDriver, Point, Size, ext};
use crate::error::{Error, Result};
use crate::locator::{Elements, Frame, Select};
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Whether hidden nodes count as matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Only displayed nodes match (default)
    #[default]
    VisibleOnly,
    /// Any attached node matches
    IncludeHidden,
}

impl Visibility {
    pub(crate) fn from_find_hidden(find_hidden: bool) -> Self {
        if find_hidden {
            Visibility::IncludeHidden
        } else {
            Visibility::VisibleOnly
        }
    }
}

/// Outcome of a resolution pass. Driver failures travel separately as `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Resolution {
    Found(ElementRef),
    NotFound,
}

/// A lazily resolved, cached handle to one element.
///
/// Cloning is cheap; clones share the resolved reference.
///
/// # Examples
///
/// ```ignore
/// use page_components::{By, ExecutionContext};
///
/// let results = ctx.element("#search-results").named("SearchPage.results");
/// let first_link = results.element("a.result-link");
///
/// // Resolves `#search-results`, then searches its descendants for the link
/// first_link.click().await?;
///
/// // Polls until the condition holds, then returns the element for chaining
/// first_link.verify().is_displayed().await?.click().await?;
/// ```
#[derive(Clone)]
pub struct Element {
    context: ExecutionContext,
    by: By,
    name: Arc<str>,
    container: Option<Arc<Element>>,
    frame: Option<Arc<Frame>>,
    timeout: Duration,
    visibility: Visibility,
    index: usize,
    cached: Arc<Mutex<Option<ElementRef>>>,
}

impl Element {
    /// Declares a new handle. Use `ctx.element(...)` in application code.
    pub fn new(context: &ExecutionContext, by: impl Into<By>) -> Self {
        let config = context.config();
        Self {
            context: context.clone(),
            by: by.into(),
            name: Arc::from("Element"),
            container: None,
            frame: None,
            timeout: config.element_timeout(),
            visibility: Visibility::from_find_hidden(config.find_hidden),
            index: 0,
            cached: Arc::new(Mutex::new(None)),
        }
    }

    /// Builds the handle for the `index`-th (1-based) member of a freshly resolved collection.
    pub(crate) fn at_index(&self, index: usize, element: ElementRef) -> Self {
        Self {
            index,
            cached: Arc::new(Mutex::new(Some(element))),
            ..self.clone()
        }
    }

    // Builders. Each returns a handle with its own (empty) resolution slot.

    /// Sets the display name used in logs, errors and the cache key
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Arc::from(name.into());
        self.detached()
    }

    /// Restricts the search to descendants of `container`
    pub fn within(mut self, container: &Element) -> Self {
        self.container = Some(Arc::new(container.clone()));
        self.detached()
    }

    /// Selects `frame` before searching
    pub fn in_frame(mut self, frame: &Frame) -> Self {
        self.frame = Some(Arc::new(frame.clone()));
        self.detached()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self.detached()
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self.detached()
    }

    /// Shorthand for `with_visibility(Visibility::IncludeHidden)` when `find_hidden` is true
    pub fn find_hidden(self, find_hidden: bool) -> Self {
        self.with_visibility(Visibility::from_find_hidden(find_hidden))
    }

    fn detached(mut self) -> Self {
        self.cached = Arc::new(Mutex::new(None));
        self
    }

    // Child scoping

    // Children inherit this element's frame, since they live in the same document.

    /// Declares a descendant of this element
    pub fn element(&self, by: impl Into<By>) -> Element {
        let child = Element::new(&self.context, by).within(self);
        match &self.frame {
            Some(frame) => child.in_frame(frame),
            None => child,
        }
    }

    /// Declares a collection of descendants of this element
    pub fn elements(&self, by: impl Into<By>) -> Elements {
        let children = Elements::new(&self.context, by).within(self);
        match &self.frame {
            Some(frame) => children.in_frame(frame),
            None => children,
        }
    }

    /// Declares an iframe inside this element
    pub fn frame(&self, by: impl Into<By>) -> Frame {
        let child = Frame::new(&self.context, by).within(self);
        match &self.frame {
            Some(parent) => child.in_frame(parent),
            None => child,
        }
    }

    // Accessors

    pub fn context(&self) -> &ExecutionContext {
        &self.context
    }

    pub fn by(&self) -> &By {
        &self.by
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn container(&self) -> Option<&Element> {
        self.container.as_deref()
    }

    pub fn frame_scope(&self) -> Option<&Frame> {
        self.frame.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// 1-based position inside the collection this handle came from, 0 if standalone
    pub fn index(&self) -> usize {
        self.index
    }

    /// The last reference this handle resolved to, without probing it
    pub fn wrapped_element(&self) -> Option<ElementRef> {
        self.cached.lock().clone()
    }

    /// The composite description, also used as the cache key
    pub fn description(&self) -> String {
        self.to_string()
    }

    // Resolution

    /// Resolves the element, waiting up to the handle's timeout.
    ///
    /// Returns the cached reference when it still passes the staleness probe.
    pub async fn resolve(&self) -> Result<ElementRef> {
        let deadline = Instant::now() + self.timeout;
        match self.locate(deadline).await? {
            Resolution::Found(element) => Ok(element),
            Resolution::NotFound => Err(self.not_found()),
        }
    }

    /// Resolves the element and confirms the reference is fresh before returning it.
    ///
    /// Every accessor and action goes through this.
    pub async fn wait_until_stable(&self) -> Result<ElementRef> {
        self.wait_until_stable_by(Instant::now() + self.timeout).await
    }

    pub(crate) async fn wait_until_stable_by(&self, deadline: Instant) -> Result<ElementRef> {
        let driver = self.context.driver();
        loop {
            match self.locate(deadline).await? {
                Resolution::Found(element) => {
                    if !ext::is_stale(driver, &element).await {
                        return Ok(element);
                    }
                    self.forget();
                }
                Resolution::NotFound => return Err(self.not_found()),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(self.not_found());
            }
            tokio::time::sleep(self.context.config().poll_interval().min(deadline - now)).await;
        }
    }

    /// Runs one resolution pass bounded by `deadline`.
    pub(crate) fn locate(&self, deadline: Instant) -> BoxFuture<'_, Result<Resolution>> {
        Box::pin(async move {
            if let Some(element) = self.cached_ref().await {
                return Ok(Resolution::Found(element));
            }

            let driver = self.context.driver();
            let config = self.context.config();
            let started = Instant::now();

            if config.wait_for_ajax {
                ext::wait_for_ajax(driver, deadline.saturating_duration_since(started)).await;
            }

            loop {
                if let Some(element) = self.search(deadline).await? {
                    self.remember(element.clone());
                    if config.highlight_on_find {
                        ext::highlight(driver, &element).await;
                    }
                    self.context.log(&format!(
                        "{} found after {} ms",
                        self,
                        started.elapsed().as_millis()
                    ));
                    return Ok(Resolution::Found(element));
                }

                let now = Instant::now();
                if now >= deadline {
                    tracing::debug!("{} not found after {:?}", self, now - started);
                    return Ok(Resolution::NotFound);
                }
                tokio::time::sleep(config.poll_interval().min(deadline - now)).await;
            }
        })
    }

    /// One search attempt: activate default content, container and frame, then query.
    async fn search(&self, deadline: Instant) -> Result<Option<ElementRef>> {
        let driver = self.context.driver();
        driver.switch_to_default_content().await?;

        let root = match &self.container {
            Some(container) => match container.locate(deadline).await? {
                Resolution::Found(root) => Some(root),
                Resolution::NotFound => return Ok(None),
            },
            None => None,
        };

        if let Some(frame) = &self.frame {
            if self.container().is_some_and(|c| c.frame_scope().is_some()) {
                // A fresh container search may have left the session inside a frame
                driver.switch_to_default_content().await?;
            }
            if !frame.enter_by(deadline).await? {
                return Ok(None);
            }
        }

        match self.visibility {
            Visibility::VisibleOnly => tracing::debug!("Finding visible {}", self),
            Visibility::IncludeHidden => tracing::debug!("Finding {}", self),
        }

        let candidates = match driver.find_elements(root.as_ref(), &self.by).await {
            Ok(candidates) => candidates,
            Err(e) if e.is_stale() => {
                // The container was replaced between resolving it and searching inside it
                if let Some(container) = &self.container {
                    container.forget();
                }
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let candidates = match self.visibility {
            Visibility::VisibleOnly => ext::filter_displayed(driver, candidates).await,
            Visibility::IncludeHidden => candidates,
        };

        Ok(candidates.into_iter().nth(self.index.saturating_sub(1)))
    }

    /// The handle's own reference, or the context cache entry, if it passes the probe
    async fn cached_ref(&self) -> Option<ElementRef> {
        let driver = self.context.driver();

        let slot = self.cached.lock().clone();
        if let Some(element) = slot {
            if !ext::is_stale(driver, &element).await {
                return Some(element);
            }
            self.cached.lock().take();
        }

        let element = self.context.cache().get(driver, &self.description()).await?;
        *self.cached.lock() = Some(element.clone());
        Some(element)
    }

    fn remember(&self, element: ElementRef) {
        *self.cached.lock() = Some(element.clone());
        self.context.cache().put(self.description(), element);
    }

    /// Drops the resolved reference from the handle and the context cache
    pub(crate) fn forget(&self) {
        self.cached.lock().take();
        self.context.cache().evict(&self.description());
    }

    fn not_found(&self) -> Error {
        Error::ElementNotFound {
            description: self.description(),
            timeout_ms: self.timeout.as_millis() as u64,
        }
    }

    /// Runs `op` against a fresh reference, re-resolving if the reference goes stale mid-call.
    pub(crate) async fn with_element<'a, T, F, Fut>(&'a self, op: F) -> Result<T>
    where
        F: Fn(&'a dyn NativeDriver, ElementRef) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let deadline = Instant::now() + self.timeout;
        loop {
            let element = self.wait_until_stable_by(deadline).await?;
            match op(self.context.driver(), element).await {
                Err(e) if e.is_stale() && Instant::now() < deadline => {
                    tracing::debug!("{} went stale mid-operation, re-resolving", self);
                    self.forget();
                }
                other => return other,
            }
        }
    }

    /// Runs `op` after a single resolution attempt. `None` means not found (or stale).
    pub(crate) async fn try_once<'a, T, F, Fut>(&'a self, op: F) -> Result<Option<T>>
    where
        F: FnOnce(&'a dyn NativeDriver, ElementRef) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match self.locate(Instant::now()).await? {
            Resolution::NotFound => Ok(None),
            Resolution::Found(element) => match op(self.context.driver(), element).await {
                Ok(value) => Ok(Some(value)),
                Err(e) if e.is_stale() => {
                    self.forget();
                    Ok(None)
                }
                Err(e) => Err(e),
            },
        }
    }

    // Read accessors

    pub async fn text(&self) -> Result<String> {
        self.with_element(|driver, element| async move { driver.text(&element).await })
            .await
    }

    pub async fn tag_name(&self) -> Result<String> {
        self.with_element(|driver, element| async move { driver.tag_name(&element).await })
            .await
    }

    pub async fn is_enabled(&self) -> Result<bool> {
        self.with_element(|driver, element| async move { driver.is_enabled(&element).await })
            .await
    }

    pub async fn is_selected(&self) -> Result<bool> {
        self.with_element(|driver, element| async move { driver.is_selected(&element).await })
            .await
    }

    pub async fn location(&self) -> Result<Point> {
        self.with_element(|driver, element| async move { driver.location(&element).await })
            .await
    }

    pub async fn size(&self) -> Result<Size> {
        self.with_element(|driver, element| async move { driver.size(&element).await })
            .await
    }

    pub async fn get_attribute(&self, name: &str) -> Result<Option<String>> {
        self.with_element(move |driver, element| async move {
            driver.get_attribute(&element, name).await
        })
        .await
    }

    pub async fn get_css_value(&self, name: &str) -> Result<String> {
        self.with_element(move |driver, element| async move {
            driver.get_css_value(&element, name).await
        })
        .await
    }

    pub async fn get_property(&self, name: &str) -> Result<Option<String>> {
        self.with_element(move |driver, element| async move {
            driver.get_property(&element, name).await
        })
        .await
    }

    /// The `value` attribute
    pub async fn value(&self) -> Result<Option<String>> {
        self.get_attribute("value").await
    }

    /// Returns whether the element exists, waiting up to the timeout for it to appear.
    ///
    /// The one accessor that reports "not found" as `false` instead of an error.
    /// Driver failures still propagate.
    pub async fn is_present(&self) -> Result<bool> {
        let deadline = Instant::now() + self.timeout;
        Ok(matches!(
            self.locate(deadline).await?,
            Resolution::Found(_)
        ))
    }

    /// Returns whether the element is present and displayed. Never fails for a missing element.
    pub async fn is_displayed(&self) -> Result<bool> {
        if !self.is_present().await? {
            return Ok(false);
        }
        self.with_element(|driver, element| async move { driver.is_displayed(&element).await })
            .await
    }

    // Actions. Each logs once the native call has succeeded.

    pub async fn click(&self) -> Result<&Self> {
        self.with_element(|driver, element| async move { driver.click(&element).await })
            .await?;
        self.context.log(&format!("Clicked {}", self));
        Ok(self)
    }

    pub async fn clear(&self) -> Result<&Self> {
        self.with_element(|driver, element| async move { driver.clear(&element).await })
            .await?;
        self.context.log(&format!("Cleared {}", self));
        Ok(self)
    }

    pub async fn send_keys(&self, text: &str) -> Result<&Self> {
        self.with_element(move |driver, element| async move {
            driver.send_keys(&element, text).await
        })
        .await?;
        self.context.log(&format!("Sent keys '{}' into {}", text, self));
        Ok(self)
    }

    pub async fn submit(&self) -> Result<&Self> {
        self.with_element(|driver, element| async move { driver.submit(&element).await })
            .await?;
        self.context.log(&format!("Submitted {}", self));
        Ok(self)
    }

    /// Clears the element, then types `value` into it
    pub async fn set_text(&self, value: &str) -> Result<&Self> {
        self.with_element(move |driver, element| async move {
            driver.clear(&element).await?;
            driver.send_keys(&element, value).await
        })
        .await?;
        self.context.log(&format!("Set {} text to '{}'", self, value));
        Ok(self)
    }

    pub async fn hover(&self) -> Result<&Self> {
        self.with_element(|driver, element| async move { driver.hover(&element).await })
            .await?;
        self.context.log(&format!("Mouse hover over {}", self));
        Ok(self)
    }

    /// Returns a dropdown helper for this `<select>` element
    pub async fn select(&self) -> Result<Select<'_>> {
        self.wait_until_stable().await?;
        Ok(Select::new(self))
    }

    // Verifications

    /// Polls until a condition holds
    pub fn verify(&self) -> ElementVerification<'_> {
        ElementVerification::new(self, true)
    }

    /// Polls until a condition no longer holds
    pub fn verify_not(&self) -> ElementVerification<'_> {
        ElementVerification::new(self, false)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}'", self.name, self.by)?;
        if self.index != 0 {
            write!(f, " [{}]", self.index)?;
        }
        if let Some(frame) = &self.frame {
            write!(f, " in frame '{}'", frame)?;
        }
        if let Some(container) = &self.container {
            write!(f, " with container '{}'", container)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("description", &self.to_string())
            .field("timeout", &self.timeout)
            .field("visibility", &self.visibility)
            .finish()
    }
}
