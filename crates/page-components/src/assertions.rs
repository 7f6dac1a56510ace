// Assertions - Polling verifications for elements and collections
//
// Each verification re-evaluates its condition on a fixed interval until it matches the expected
// polarity or the timeout elapses. A tick makes a single resolution attempt, so an element that
// appears mid-verification is picked up on the next tick instead of after its own timeout.

use crate::error::{Error, Result};
use crate::locator::{Element, Elements};
use regex::Regex;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Result of evaluating a condition once
struct Check {
    passed: bool,
    // What was observed, for the failure message
    actual: Option<String>,
}

impl Check {
    fn new(passed: bool) -> Self {
        Self {
            passed,
            actual: None,
        }
    }

    fn observed(passed: bool, actual: impl Into<String>) -> Self {
        Self {
            passed,
            actual: Some(actual.into()),
        }
    }

    fn missing() -> Self {
        Self::observed(false, "element not found")
    }
}

/// Polling settings shared by both verification kinds
#[derive(Debug, Clone, Copy)]
struct Polling {
    expected: bool,
    timeout: Duration,
    interval: Duration,
}

impl Polling {
    async fn until<F, Fut>(&self, target: &str, condition: &str, mut probe: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Check>>,
    {
        let started = Instant::now();
        let deadline = started + self.timeout;

        loop {
            let check = probe().await?;
            if check.passed == self.expected {
                tracing::debug!(
                    "Verified {} {} {} after {:?}",
                    target,
                    if self.expected { "is" } else { "is not" },
                    condition,
                    started.elapsed()
                );
                return Ok(());
            }

            let now = Instant::now();
            if now >= deadline {
                let mut message = if self.expected {
                    format!("{} was not {} after {:?}", target, condition, self.timeout)
                } else {
                    format!("{} was still {} after {:?}", target, condition, self.timeout)
                };
                if let Some(actual) = check.actual {
                    message.push_str(&format!(" (actual: {})", actual));
                }
                return Err(Error::AssertionTimeout(message));
            }

            tokio::time::sleep(self.interval.min(deadline - now)).await;
        }
    }
}

/// Polling verifications on a single element.
///
/// Obtained from [`Element::verify`] (expects each condition to hold) or
/// [`Element::verify_not`] (expects it not to hold). On success the element is returned so calls
/// can be chained.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
///
/// let banner = ctx.element(".banner").named("Home.banner");
/// banner.verify().is_displayed().await?;
/// banner.verify().text_contains("Welcome").await?;
///
/// ctx.element(".spinner")
///     .verify_not()
///     .with_timeout(Duration::from_secs(30))
///     .is_displayed()
///     .await?;
/// ```
pub struct ElementVerification<'a> {
    element: &'a Element,
    polling: Polling,
}

impl<'a> ElementVerification<'a> {
    pub(crate) fn new(element: &'a Element, expected: bool) -> Self {
        Self {
            element,
            polling: Polling {
                expected,
                timeout: element.timeout(),
                interval: element.context().config().poll_interval(),
            },
        }
    }

    /// Overrides the timeout (defaults to the element's own timeout)
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.polling.timeout = timeout;
        self
    }

    /// Overrides the poll interval (defaults to `PollIntervalMs`, 100 ms)
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.polling.interval = interval;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.polling.timeout
    }

    pub fn poll_interval(&self) -> Duration {
        self.polling.interval
    }

    async fn until<F, Fut>(self, condition: &str, probe: F) -> Result<&'a Element>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Check>>,
    {
        self.polling
            .until(&self.element.description(), condition, probe)
            .await?;
        Ok(self.element)
    }

    pub async fn is_displayed(self) -> Result<&'a Element> {
        let element = self.element;
        self.until("displayed", move || async move {
            let displayed = element
                .try_once(|driver, el| async move { driver.is_displayed(&el).await })
                .await?;
            Ok(match displayed {
                Some(displayed) => Check::new(displayed),
                None => Check::missing(),
            })
        })
        .await
    }

    pub async fn is_present(self) -> Result<&'a Element> {
        let element = self.element;
        self.until("present", move || async move {
            let present = element
                .try_once(|_, _| async move { Ok(()) })
                .await?
                .is_some();
            Ok(Check::new(present))
        })
        .await
    }

    pub async fn is_enabled(self) -> Result<&'a Element> {
        let element = self.element;
        self.until("enabled", move || async move {
            let enabled = element
                .try_once(|driver, el| async move { driver.is_enabled(&el).await })
                .await?;
            Ok(match enabled {
                Some(enabled) => Check::new(enabled),
                None => Check::missing(),
            })
        })
        .await
    }

    /// Text equals `expected` exactly
    pub async fn text_is(self, expected: &str) -> Result<&'a Element> {
        let element = self.element;
        let condition = format!("matching text '{}'", expected);
        self.until(&condition, move || async move {
            Ok(match read_text(element).await? {
                Some(text) => Check::observed(text == expected, format!("'{}'", text)),
                None => Check::missing(),
            })
        })
        .await
    }

    pub async fn text_contains(self, expected: &str) -> Result<&'a Element> {
        let element = self.element;
        let condition = format!("containing text '{}'", expected);
        self.until(&condition, move || async move {
            Ok(match read_text(element).await? {
                Some(text) => Check::observed(text.contains(expected), format!("'{}'", text)),
                None => Check::missing(),
            })
        })
        .await
    }

    /// Text matches the regular expression `pattern`. An invalid pattern fails immediately.
    pub async fn text_matches(self, pattern: &str) -> Result<&'a Element> {
        let regex = Regex::new(pattern).map_err(|e| {
            Error::InvalidArgument(format!("Invalid regex pattern '{}': {}", pattern, e))
        })?;
        let regex = &regex;
        let element = self.element;
        let condition = format!("matching /{}/", pattern);
        self.until(&condition, move || async move {
            Ok(match read_text(element).await? {
                Some(text) => Check::observed(regex.is_match(&text), format!("'{}'", text)),
                None => Check::missing(),
            })
        })
        .await
    }

    /// Attribute `name` equals `expected`. A missing attribute never matches.
    pub async fn attribute_is(self, name: &str, expected: &str) -> Result<&'a Element> {
        let element = self.element;
        let condition = format!("matching {}='{}'", name, expected);
        self.until(&condition, move || async move {
            Ok(match read_attribute(element, name).await? {
                Some(Some(value)) => Check::observed(value == expected, format!("'{}'", value)),
                Some(None) => Check::observed(false, format!("no {} attribute", name)),
                None => Check::missing(),
            })
        })
        .await
    }

    pub async fn value_is(self, expected: &str) -> Result<&'a Element> {
        let element = self.element;
        let condition = format!("matching value '{}'", expected);
        self.until(&condition, move || async move {
            Ok(match read_attribute(element, "value").await? {
                Some(Some(value)) => Check::observed(value == expected, format!("'{}'", value)),
                Some(None) => Check::observed(false, "no value"),
                None => Check::missing(),
            })
        })
        .await
    }
}

async fn read_text(element: &Element) -> Result<Option<String>> {
    element
        .try_once(|driver, el| async move { driver.text(&el).await })
        .await
}

async fn read_attribute(element: &Element, name: &str) -> Result<Option<Option<String>>> {
    element
        .try_once(|driver, el| async move { driver.get_attribute(&el, name).await })
        .await
}

/// Polling verifications on a collection.
///
/// Obtained from [`Elements::verify`] or [`Elements::verify_not`].
///
/// # Example
///
/// ```ignore
/// let rows = ctx.elements("table#orders tbody tr");
/// rows.verify().count(3).await?;
/// rows.verify_not().is_present().await?;
/// ```
pub struct ElementsVerification<'a> {
    elements: &'a Elements,
    polling: Polling,
}

impl<'a> ElementsVerification<'a> {
    pub(crate) fn new(elements: &'a Elements, expected: bool) -> Self {
        Self {
            elements,
            polling: Polling {
                expected,
                timeout: elements.timeout(),
                interval: elements.context().config().poll_interval(),
            },
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.polling.timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.polling.interval = interval;
        self
    }

    async fn until_count<P>(self, condition: &str, predicate: P) -> Result<&'a Elements>
    where
        P: Fn(usize) -> bool,
    {
        let elements = self.elements;
        let predicate = &predicate;
        self.polling
            .until(&elements.description(), condition, move || async move {
                let count = elements.resolve_fresh().await?.len();
                Ok(Check::observed(predicate(count), format!("{} elements", count)))
            })
            .await?;
        Ok(elements)
    }

    /// At least one element matches
    pub async fn is_present(self) -> Result<&'a Elements> {
        self.until_count("present", |count| count > 0).await
    }

    pub async fn count(self, expected: usize) -> Result<&'a Elements> {
        let condition = format!("holding {} elements", expected);
        self.until_count(&condition, move |count| count == expected)
            .await
    }

    pub async fn count_greater_than(self, bound: usize) -> Result<&'a Elements> {
        let condition = format!("holding more than {} elements", bound);
        self.until_count(&condition, move |count| count > bound)
            .await
    }
}
