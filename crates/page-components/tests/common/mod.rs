// Shared test support: an in-memory DOM behind the NativeDriver trait
//
// Nodes live in one flat arena. Each node has a current reference token; `replace` issues a new
// token so references handed out earlier become stale, mimicking a page re-render. A reference
// only works while its own document (top level or an iframe) is selected. Time-based
// behaviour (nodes that appear or become visible later) uses tokio's clock so tests can run with
// `start_paused = true`.

#![allow(dead_code)]

use async_trait::async_trait;
use page_components::{
    By, ComponentConfig, ElementRef, Error, ExecutionContext, NativeDriver, Point, Result, Size,
};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Once};
use std::time::Duration;
use tokio::time::Instant;

static TRACING: Once = Once::new();

/// Installs a fmt subscriber once per test binary. Honors RUST_LOG.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Node ids are indices into the arena
pub type NodeId = usize;

/// Declarative node description used by tests
#[derive(Debug, Clone)]
pub struct FakeNode {
    selectors: Vec<String>,
    tag: String,
    text: String,
    parent: Option<NodeId>,
    frame: Option<NodeId>,
    displayed: bool,
    enabled: bool,
    selected: bool,
    visible_after: Option<Duration>,
    attached_after: Option<Duration>,
    attrs: HashMap<String, String>,
}

impl FakeNode {
    /// A displayed, enabled `div` matched by `selector`
    pub fn new(selector: &str) -> Self {
        Self {
            selectors: vec![selector.to_string()],
            tag: "div".to_string(),
            text: String::new(),
            parent: None,
            frame: None,
            displayed: true,
            enabled: true,
            selected: false,
            visible_after: None,
            attached_after: None,
            attrs: HashMap::new(),
        }
    }

    pub fn also_matches(mut self, selector: &str) -> Self {
        self.selectors.push(selector.to_string());
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = tag.to_string();
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn within(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Places the node in the document of the iframe node `frame`
    pub fn in_frame(mut self, frame: NodeId) -> Self {
        self.frame = Some(frame);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    /// Attached but hidden until `delay` has passed
    pub fn visible_after(mut self, delay: Duration) -> Self {
        self.visible_after = Some(delay);
        self
    }

    /// Not in the DOM until `delay` has passed
    pub fn attached_after(mut self, delay: Duration) -> Self {
        self.attached_after = Some(delay);
        self
    }
}

#[derive(Debug)]
struct Node {
    props: FakeNode,
    token: String,
    generation: u32,
    attached: bool,
    visible_at: Option<Instant>,
    attached_at: Option<Instant>,
}

impl Node {
    fn is_attached(&self, now: Instant) -> bool {
        self.attached && self.attached_at.is_none_or(|at| now >= at)
    }

    fn is_displayed(&self, now: Instant) -> bool {
        self.props.displayed && self.visible_at.is_none_or(|at| now >= at)
    }

    fn matches(&self, by: &By) -> bool {
        if self.props.selectors.iter().any(|s| s == by.value()) {
            return true;
        }
        match by {
            By::TagName(tag) => &self.props.tag == tag,
            By::Id(id) => self.props.attrs.get("id") == Some(id),
            _ => false,
        }
    }
}

#[derive(Debug, Default)]
struct Dom {
    nodes: Vec<Node>,
    tokens: HashMap<String, NodeId>,
    current_frame: Option<NodeId>,
    counters: Counters,
    calls: Vec<String>,
    visited: Vec<String>,
    scripts: ScriptMode,
}

/// How `execute_script` answers. Ajax idle checks read the result as a boolean.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ScriptMode {
    /// Every script returns `true`
    #[default]
    Idle,
    /// The next `n` scripts return `false`, then `Idle`
    BusyFor(usize),
    /// Every script returns `false`
    Busy,
    /// Every script fails with a transport error
    Failing,
}

/// Driver call counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    pub find_elements: usize,
    pub default_content: usize,
    pub switch_to_frame: usize,
    pub scripts: usize,
    pub probes: usize,
}

impl Dom {
    /// The node behind a reference that is attached and belongs to the selected document.
    ///
    /// Like a real session, a reference from another frame cannot be read or acted on.
    fn live(&self, element: &ElementRef) -> Result<NodeId> {
        let id = self.attached(element)?;
        if self.nodes[id].props.frame != self.current_frame {
            return Err(Error::StaleElement(element.id().to_string()));
        }
        Ok(id)
    }

    /// The node behind a reference that is still attached, in whichever document.
    fn attached(&self, element: &ElementRef) -> Result<NodeId> {
        let now = Instant::now();
        match self.tokens.get(element.id()) {
            Some(&id) if self.nodes[id].token == element.id() && self.nodes[id].is_attached(now) => {
                Ok(id)
            }
            _ => Err(Error::StaleElement(element.id().to_string())),
        }
    }

    fn is_descendant(&self, mut node: NodeId, ancestor: NodeId) -> bool {
        while let Some(parent) = self.nodes[node].props.parent {
            if parent == ancestor {
                return true;
            }
            node = parent;
        }
        false
    }

    fn label(&self, id: NodeId) -> String {
        self.nodes[id].props.selectors[0].clone()
    }
}

/// In-memory NativeDriver
#[derive(Debug, Default)]
pub struct FakeDriver {
    dom: Mutex<Dom>,
}

impl FakeDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add(&self, props: FakeNode) -> NodeId {
        let now = Instant::now();
        let mut dom = self.dom.lock();
        let id = dom.nodes.len();
        let token = format!("node-{}-0", id);
        dom.tokens.insert(token.clone(), id);
        dom.nodes.push(Node {
            visible_at: props.visible_after.map(|d| now + d),
            attached_at: props.attached_after.map(|d| now + d),
            props,
            token,
            generation: 0,
            attached: true,
        });
        id
    }

    /// Re-renders the node: same content, new reference. Old references become stale.
    pub fn replace(&self, id: NodeId) {
        let mut dom = self.dom.lock();
        let node = &mut dom.nodes[id];
        node.generation += 1;
        node.token = format!("node-{}-{}", id, node.generation);
        let token = node.token.clone();
        dom.tokens.insert(token, id);
    }

    pub fn detach(&self, id: NodeId) {
        self.dom.lock().nodes[id].attached = false;
    }

    pub fn attach(&self, id: NodeId) {
        self.replace(id);
        self.dom.lock().nodes[id].attached = true;
    }

    pub fn set_text(&self, id: NodeId, text: &str) {
        self.dom.lock().nodes[id].props.text = text.to_string();
    }

    pub fn set_displayed(&self, id: NodeId, displayed: bool) {
        let mut dom = self.dom.lock();
        dom.nodes[id].props.displayed = displayed;
        dom.nodes[id].visible_at = None;
    }

    pub fn set_attr(&self, id: NodeId, name: &str, value: &str) {
        self.dom.lock().nodes[id]
            .props
            .attrs
            .insert(name.to_string(), value.to_string());
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<String> {
        self.dom.lock().nodes[id].props.attrs.get(name).cloned()
    }

    pub fn is_selected_node(&self, id: NodeId) -> bool {
        self.dom.lock().nodes[id].props.selected
    }

    /// The reference currently valid for `id`
    pub fn current_ref(&self, id: NodeId) -> ElementRef {
        ElementRef::new(self.dom.lock().nodes[id].token.as_str())
    }

    pub fn counters(&self) -> Counters {
        self.dom.lock().counters
    }

    /// Resets counters and the call log
    pub fn reset(&self) {
        let mut dom = self.dom.lock();
        dom.counters = Counters::default();
        dom.calls.clear();
    }

    /// Ordered log of activation and action calls (probes and scripts are not recorded)
    pub fn calls(&self) -> Vec<String> {
        self.dom.lock().calls.clone()
    }

    pub fn set_scripts(&self, mode: ScriptMode) {
        self.dom.lock().scripts = mode;
    }

    pub fn visited(&self) -> Vec<String> {
        self.dom.lock().visited.clone()
    }

    fn act<T>(&self, element: &ElementRef, verb: &str, f: impl FnOnce(&mut Node) -> T) -> Result<T> {
        let mut dom = self.dom.lock();
        let id = dom.live(element)?;
        let call = format!("{} {}", verb, dom.label(id));
        dom.calls.push(call);
        Ok(f(&mut dom.nodes[id]))
    }

    fn read<T>(&self, element: &ElementRef, f: impl FnOnce(&Node) -> T) -> Result<T> {
        let dom = self.dom.lock();
        let id = dom.live(element)?;
        Ok(f(&dom.nodes[id]))
    }
}

#[async_trait]
impl NativeDriver for FakeDriver {
    async fn find_elements(&self, scope: Option<&ElementRef>, by: &By) -> Result<Vec<ElementRef>> {
        let now = Instant::now();
        let mut dom = self.dom.lock();
        dom.counters.find_elements += 1;
        dom.calls.push(format!("find {}", by.value()));

        // Containers are resolved before the frame switch, so a scope may sit in the parent
        // document of the nodes being searched
        let root = match scope {
            Some(scope) => Some(dom.attached(scope)?),
            None => None,
        };

        let found = dom
            .nodes
            .iter()
            .enumerate()
            .filter(|(id, node)| {
                node.is_attached(now)
                    && node.matches(by)
                    && node.props.frame == dom.current_frame
                    && root.is_none_or(|root| dom.is_descendant(*id, root))
            })
            .map(|(_, node)| ElementRef::new(node.token.as_str()))
            .collect();
        Ok(found)
    }

    async fn click(&self, element: &ElementRef) -> Result<()> {
        let mut dom = self.dom.lock();
        let id = dom.live(element)?;
        let call = format!("click {}", dom.label(id));
        dom.calls.push(call);

        // Clicking an option selects it and deselects its siblings
        if dom.nodes[id].props.tag == "option" {
            let parent = dom.nodes[id].props.parent;
            for node in dom.nodes.iter_mut() {
                if node.props.tag == "option" && node.props.parent == parent {
                    node.props.selected = false;
                }
            }
            dom.nodes[id].props.selected = true;
        }
        Ok(())
    }

    async fn send_keys(&self, element: &ElementRef, text: &str) -> Result<()> {
        self.act(element, "send_keys", |node| {
            node.props
                .attrs
                .entry("value".to_string())
                .or_default()
                .push_str(text);
        })
    }

    async fn clear(&self, element: &ElementRef) -> Result<()> {
        self.act(element, "clear", |node| {
            node.props.attrs.insert("value".to_string(), String::new());
        })
    }

    async fn submit(&self, element: &ElementRef) -> Result<()> {
        self.act(element, "submit", |_| ())
    }

    async fn hover(&self, element: &ElementRef) -> Result<()> {
        self.act(element, "hover", |_| ())
    }

    async fn text(&self, element: &ElementRef) -> Result<String> {
        self.read(element, |node| node.props.text.clone())
    }

    async fn tag_name(&self, element: &ElementRef) -> Result<String> {
        self.read(element, |node| node.props.tag.clone())
    }

    async fn is_enabled(&self, element: &ElementRef) -> Result<bool> {
        self.dom.lock().counters.probes += 1;
        self.read(element, |node| node.props.enabled)
    }

    async fn is_selected(&self, element: &ElementRef) -> Result<bool> {
        self.read(element, |node| node.props.selected)
    }

    async fn is_displayed(&self, element: &ElementRef) -> Result<bool> {
        let now = Instant::now();
        self.read(element, |node| node.is_displayed(now))
    }

    async fn location(&self, element: &ElementRef) -> Result<Point> {
        self.read(element, |_| Point { x: 10, y: 20 })
    }

    async fn size(&self, element: &ElementRef) -> Result<Size> {
        self.read(element, |_| Size {
            width: 100,
            height: 30,
        })
    }

    async fn get_attribute(&self, element: &ElementRef, name: &str) -> Result<Option<String>> {
        self.read(element, |node| node.props.attrs.get(name).cloned())
    }

    async fn get_css_value(&self, element: &ElementRef, name: &str) -> Result<String> {
        self.read(element, |node| {
            node.props
                .attrs
                .get(&format!("style:{}", name))
                .cloned()
                .unwrap_or_default()
        })
    }

    async fn get_property(&self, element: &ElementRef, name: &str) -> Result<Option<String>> {
        self.read(element, |node| match name {
            "textContent" => Some(node.props.text.clone()),
            _ => node.props.attrs.get(name).cloned(),
        })
    }

    async fn execute_script(&self, _script: &str, _args: &[ElementRef]) -> Result<Value> {
        let mut dom = self.dom.lock();
        dom.counters.scripts += 1;
        match dom.scripts {
            ScriptMode::Idle => Ok(Value::Bool(true)),
            ScriptMode::BusyFor(n) => {
                dom.scripts = if n > 1 {
                    ScriptMode::BusyFor(n - 1)
                } else {
                    ScriptMode::Idle
                };
                Ok(Value::Bool(false))
            }
            ScriptMode::Busy => Ok(Value::Bool(false)),
            ScriptMode::Failing => Err(Error::Transport("javascript error".to_string())),
        }
    }

    async fn switch_to_frame(&self, frame: &ElementRef) -> Result<()> {
        let mut dom = self.dom.lock();
        let id = dom.live(frame)?;
        dom.counters.switch_to_frame += 1;
        let call = format!("switch_to_frame {}", dom.label(id));
        dom.calls.push(call);
        dom.current_frame = Some(id);
        Ok(())
    }

    async fn switch_to_default_content(&self) -> Result<()> {
        let mut dom = self.dom.lock();
        dom.counters.default_content += 1;
        dom.calls.push("default_content".to_string());
        dom.current_frame = None;
        Ok(())
    }

    async fn navigate(&self, url: &str) -> Result<()> {
        self.dom.lock().visited.push(url.to_string());
        Ok(())
    }
}

/// Config used by most tests: short timeout, no ajax wait
pub fn test_config() -> ComponentConfig {
    ComponentConfig::default()
        .with_element_timeout(Duration::from_secs(2))
        .with_wait_for_ajax(false)
}

/// Builds a context over `driver`
pub fn context(driver: &Arc<FakeDriver>, config: ComponentConfig) -> ExecutionContext {
    init_tracing();
    ExecutionContext::new(driver.clone(), config)
}

/// Routes the context's log lines into a shared vector
pub fn capture_log(ctx: &ExecutionContext) -> Arc<Mutex<Vec<String>>> {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&lines);
    ctx.set_logger(move |line| sink.lock().push(line.to_string()));
    lines
}
