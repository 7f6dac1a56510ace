// Elements - Lazy handle to an ordered collection of DOM nodes
//
// Resolves to a list of `Element`s, each carrying its 1-based position and the reference found
// in that pass. The list is cached as a unit: if any member goes stale the whole entry is thrown
// away and the collection is searched again with a single `find_elements` call.

use crate::assertions::ElementsVerification;
use crate::context::ExecutionContext;
use crate::driver::{By, ElementRef, ext};
use crate::error::{Error, Result};
use crate::locator::element::{Element, Resolution, Visibility};
use crate::locator::Frame;
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// A lazily resolved collection of elements.
///
/// Every call re-resolves (hitting the cache when it is still valid), so iterating after the page
/// changed always sees the current set.
///
/// # Example
///
/// ```ignore
/// let rows = ctx.elements("table#orders tbody tr").named("OrdersPage.rows");
///
/// rows.verify().count_greater_than(0).await?;
/// for row in rows.resolve().await? {
///     println!("{}: {}", row.index(), row.text().await?);
/// }
/// ```
#[derive(Clone)]
pub struct Elements {
    // Carries descriptor, name, container, frame, timeout and visibility. Members are built
    // from it with their index and reference filled in.
    template: Element,
}

impl Elements {
    /// Declares a new collection. Use `ctx.elements(...)` in application code.
    pub fn new(context: &ExecutionContext, by: impl Into<By>) -> Self {
        Self {
            template: Element::new(context, by).named("Elements"),
        }
    }

    pub fn named(self, name: impl Into<String>) -> Self {
        Self {
            template: self.template.named(name),
        }
    }

    pub fn within(self, container: &Element) -> Self {
        Self {
            template: self.template.within(container),
        }
    }

    pub fn in_frame(self, frame: &Frame) -> Self {
        Self {
            template: self.template.in_frame(frame),
        }
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self {
            template: self.template.with_timeout(timeout),
        }
    }

    pub fn with_visibility(self, visibility: Visibility) -> Self {
        Self {
            template: self.template.with_visibility(visibility),
        }
    }

    pub fn find_hidden(self, find_hidden: bool) -> Self {
        Self {
            template: self.template.find_hidden(find_hidden),
        }
    }

    pub fn context(&self) -> &ExecutionContext {
        self.template.context()
    }

    pub fn by(&self) -> &By {
        self.template.by()
    }

    pub fn name(&self) -> &str {
        self.template.name()
    }

    pub fn timeout(&self) -> Duration {
        self.template.timeout()
    }

    pub fn visibility(&self) -> Visibility {
        self.template.visibility()
    }

    pub fn description(&self) -> String {
        self.to_string()
    }

    /// Resolves the collection. An empty vector means nothing matched.
    ///
    /// The container (if any) is waited for up to the collection's timeout; a container that never
    /// appears yields an empty collection.
    pub async fn resolve(&self) -> Result<Vec<Element>> {
        self.resolve_by(Instant::now() + self.timeout()).await
    }

    /// Resolves the collection, polling until it has at least one member.
    ///
    /// Fails with `ElementNotFound` if the collection is still empty when the timeout elapses.
    pub async fn wait_for(&self) -> Result<Vec<Element>> {
        let deadline = Instant::now() + self.timeout();
        loop {
            let elements = self.resolve_by(deadline).await?;
            if !elements.is_empty() {
                return Ok(elements);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(Error::ElementNotFound {
                    description: self.description(),
                    timeout_ms: self.timeout().as_millis() as u64,
                });
            }
            tokio::time::sleep(self.context().config().poll_interval().min(deadline - now)).await;
        }
    }

    /// Queries once, bypassing the cached list, and refreshes the cache with the result.
    ///
    /// A cached list stays valid while members are added next to it, so polling checks on the
    /// collection's size must look at the page every tick.
    pub(crate) async fn resolve_fresh(&self) -> Result<Vec<Element>> {
        let refs = self.search(Instant::now()).await?;
        self.store(&refs);
        Ok(self.wrap(refs))
    }

    async fn resolve_by(&self, deadline: Instant) -> Result<Vec<Element>> {
        let context = self.context();

        let refs = match context.cache().get_all(context.driver(), &self.description()).await {
            Some(refs) => refs,
            None => {
                let refs = self.search(deadline).await?;
                self.store(&refs);
                refs
            }
        };

        Ok(self.wrap(refs))
    }

    // Empty results are never cached
    fn store(&self, refs: &[ElementRef]) {
        let cache = self.context().cache();
        let key = self.description();
        if refs.is_empty() {
            cache.evict_all(&key);
        } else {
            cache.put_all(key, refs.to_vec());
        }
    }

    fn wrap(&self, refs: Vec<ElementRef>) -> Vec<Element> {
        refs.into_iter()
            .enumerate()
            .map(|(i, element)| self.template.at_index(i + 1, element))
            .collect()
    }

    async fn search(&self, deadline: Instant) -> Result<Vec<ElementRef>> {
        let context = self.context();
        let driver = context.driver();
        let config = context.config();
        let started = Instant::now();

        if config.wait_for_ajax {
            ext::wait_for_ajax(driver, deadline.saturating_duration_since(started)).await;
        }

        driver.switch_to_default_content().await?;

        let container = self.template.container();
        let root = match container {
            Some(container) => match container.locate(deadline).await? {
                Resolution::Found(root) => Some(root),
                Resolution::NotFound => {
                    tracing::debug!("Container of {} not found, collection is empty", self);
                    return Ok(Vec::new());
                }
            },
            None => None,
        };

        if let Some(frame) = self.template.frame_scope() {
            if container.is_some_and(|c| c.frame_scope().is_some()) {
                driver.switch_to_default_content().await?;
            }
            if !frame.enter_by(deadline).await? {
                tracing::debug!("Frame of {} not found, collection is empty", self);
                return Ok(Vec::new());
            }
        }

        let found = match driver.find_elements(root.as_ref(), self.by()).await {
            Ok(found) => found,
            Err(e) if e.is_stale() => {
                if let Some(container) = container {
                    container.forget();
                }
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let found = match self.visibility() {
            Visibility::VisibleOnly => ext::filter_displayed(driver, found).await,
            Visibility::IncludeHidden => found,
        };

        if config.highlight_on_find {
            for element in &found {
                ext::highlight(driver, element).await;
            }
        }

        // Members are cached under their own descriptions so they can re-resolve by position
        for (i, element) in found.iter().enumerate() {
            let member = self.template.at_index(i + 1, element.clone());
            context.cache().put(member.description(), element.clone());
        }

        context.log(&format!(
            "Found {} {} after {} ms",
            found.len(),
            self,
            started.elapsed().as_millis()
        ));
        Ok(found)
    }

    /// Number of matching elements (triggers resolution)
    pub async fn count(&self) -> Result<usize> {
        Ok(self.resolve().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.count().await? == 0)
    }

    /// The element at 0-based `position`, if the collection currently has one there
    pub async fn nth(&self, position: usize) -> Result<Option<Element>> {
        Ok(self.resolve().await?.into_iter().nth(position))
    }

    /// The member with 1-based ordinal `index`, matching `Element::index`
    pub async fn get(&self, index: usize) -> Result<Option<Element>> {
        match index.checked_sub(1) {
            Some(position) => self.nth(position).await,
            None => Ok(None),
        }
    }

    pub async fn first(&self) -> Result<Option<Element>> {
        self.nth(0).await
    }

    /// Text of every member, in order
    pub async fn texts(&self) -> Result<Vec<String>> {
        let mut texts = Vec::new();
        for element in self.resolve().await? {
            texts.push(element.text().await?);
        }
        Ok(texts)
    }

    /// Polls until a collection condition holds
    pub fn verify(&self) -> ElementsVerification<'_> {
        ElementsVerification::new(self, true)
    }

    /// Polls until a collection condition no longer holds
    pub fn verify_not(&self) -> ElementsVerification<'_> {
        ElementsVerification::new(self, false)
    }
}

impl fmt::Display for Elements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.template, f)
    }
}

impl fmt::Debug for Elements {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Elements")
            .field("description", &self.to_string())
            .field("timeout", &self.timeout())
            .finish()
    }
}
