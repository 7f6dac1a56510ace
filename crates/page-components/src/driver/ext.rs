// Driver extensions
//
// Helpers composed purely from `NativeDriver` primitives: the staleness probe, visibility
// filtering, highlighting found elements, and waiting for in-flight ajax requests.

use super::{ElementRef, NativeDriver};
use std::time::Duration;
use tokio::time::Instant;

/// Interval between ajax quiescence checks
const AJAX_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Background colour used by `highlight`
pub const HIGHLIGHT_COLOR: &str = "yellow";

/// How long a highlighted element keeps its highlight colour
pub const HIGHLIGHT_DURATION: Duration = Duration::from_millis(30);

/// Each script evaluates to `true` once the corresponding library has no requests in flight
/// (or is not loaded on the page at all).
const AJAX_IDLE_CHECKS: [&str; 3] = [
    r#"return (typeof jQuery === "undefined" || jQuery.active == 0);"#,
    r#"return (typeof Ajax === "undefined" || Ajax.activeRequestCount == 0);"#,
    r#"return (typeof dojo === "undefined" || dojo.io.XMLHTTPTransport.inFlight.length == 0);"#,
];

/// Probes a reference by reading a cheap property.
///
/// Any error, stale or otherwise, means the reference cannot be trusted.
pub async fn is_stale(driver: &dyn NativeDriver, element: &ElementRef) -> bool {
    driver.is_enabled(element).await.is_err()
}

/// Keeps only the displayed references, preserving order.
///
/// A reference that errors while being checked (typically because it went stale between the
/// search and the check) is dropped rather than failing the whole filter.
pub async fn filter_displayed(driver: &dyn NativeDriver, elements: Vec<ElementRef>) -> Vec<ElementRef> {
    let mut visible = Vec::with_capacity(elements.len());
    for element in elements {
        match driver.is_displayed(&element).await {
            Ok(true) => visible.push(element),
            Ok(false) => {}
            Err(e) => tracing::debug!("Dropping {} from visible set: {}", element, e),
        }
    }
    visible
}

/// Flashes the element's background so a watching user can see what was found.
///
/// Cosmetic only: failures are logged and ignored.
pub async fn highlight(driver: &dyn NativeDriver, element: &ElementRef) {
    let args = std::slice::from_ref(element);
    let original = match driver
        .execute_script("return arguments[0].style.background;", args)
        .await
    {
        Ok(value) => value.as_str().unwrap_or_default().to_string(),
        Err(e) => {
            tracing::debug!("Highlight of {} skipped: {}", element, e);
            return;
        }
    };

    let set = format!("arguments[0].style.background='{}'; return;", HIGHLIGHT_COLOR);
    if driver.execute_script(&set, args).await.is_err() {
        return;
    }
    tokio::time::sleep(HIGHLIGHT_DURATION).await;

    let restore = format!("arguments[0].style.background='{}'; return;", original);
    if let Err(e) = driver.execute_script(&restore, args).await {
        tracing::debug!("Failed to restore background of {}: {}", element, e);
    }
}

/// Waits until jQuery, Prototype and dojo report no requests in flight, or `timeout` elapses.
///
/// Best effort: script errors count as "idle" and the timeout is swallowed.
pub async fn wait_for_ajax(driver: &dyn NativeDriver, timeout: Duration) {
    let deadline = Instant::now() + timeout;

    for check in AJAX_IDLE_CHECKS {
        loop {
            let idle = match driver.execute_script(check, &[]).await {
                Ok(value) => value.as_bool().unwrap_or(true),
                Err(_) => true,
            };
            if idle {
                break;
            }

            let now = Instant::now();
            if now >= deadline {
                tracing::debug!("Ajax requests still in flight after {:?}, continuing", timeout);
                return;
            }
            tokio::time::sleep(AJAX_POLL_INTERVAL.min(deadline - now)).await;
        }
    }
}
