//! Target inputs and resolver traits.
//!
//! Targets are opaque string handles. Authoring calls accept selectors, concrete
//! handles or ordered lists of either; a host-provided [`TargetResolver`] maps
//! selectors to handles. Resolution output is ordered and de-duplicated.

use hashbrown::{HashMap, HashSet};

/// Opaque target handle (small string key).
pub type TargetHandle = String;

/// What an authoring call wants to animate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Targets {
    /// Resolved through the [`TargetResolver`], relative to the active root.
    Selector(String),
    /// Passed through as-is.
    Handle(TargetHandle),
    List(Vec<Targets>),
}

impl Targets {
    pub fn selector(s: impl Into<String>) -> Self {
        Targets::Selector(s.into())
    }

    pub fn handle(h: impl Into<TargetHandle>) -> Self {
        Targets::Handle(h.into())
    }

    pub fn handles<I, S>(handles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TargetHandle>,
    {
        Targets::List(handles.into_iter().map(|h| Targets::Handle(h.into())).collect())
    }
}

impl From<&str> for Targets {
    fn from(s: &str) -> Self {
        Targets::Selector(s.to_string())
    }
}

impl From<String> for Targets {
    fn from(s: String) -> Self {
        Targets::Selector(s)
    }
}

impl From<Vec<&str>> for Targets {
    fn from(v: Vec<&str>) -> Self {
        Targets::List(v.into_iter().map(Targets::from).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Targets {
    fn from(v: [&str; N]) -> Self {
        Targets::List(v.into_iter().map(Targets::from).collect())
    }
}

/// Trait for resolving selectors to opaque handles.
/// Hosts implement this and hand it to `Engine::new`.
pub trait TargetResolver {
    /// Resolve `selector` within `root` (`None` means the whole document).
    fn resolve(&mut self, root: Option<&TargetHandle>, selector: &str) -> Vec<TargetHandle>;
}

/// Flatten `targets` into an ordered, de-duplicated handle list.
pub fn resolve_targets(
    resolver: &mut dyn TargetResolver,
    root: Option<&TargetHandle>,
    targets: &Targets,
) -> Vec<TargetHandle> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    collect(resolver, root, targets, &mut out, &mut seen);
    out
}

fn collect(
    resolver: &mut dyn TargetResolver,
    root: Option<&TargetHandle>,
    targets: &Targets,
    out: &mut Vec<TargetHandle>,
    seen: &mut HashSet<TargetHandle>,
) {
    match targets {
        Targets::Selector(sel) => {
            for h in resolver.resolve(root, sel) {
                if seen.insert(h.clone()) {
                    out.push(h);
                }
            }
        }
        Targets::Handle(h) => {
            if seen.insert(h.clone()) {
                out.push(h.clone());
            }
        }
        Targets::List(items) => {
            for t in items {
                collect(resolver, root, t, out, seen);
            }
        }
    }
}

/// Table-driven resolver: selector -> handles, optionally scoped under a root.
#[derive(Default, Debug, Clone)]
pub struct SelectorTable {
    global: HashMap<String, Vec<TargetHandle>>,
    scoped: HashMap<(TargetHandle, String), Vec<TargetHandle>>,
}

impl SelectorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register handles for a selector regardless of root.
    pub fn insert<I, S>(&mut self, selector: &str, handles: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TargetHandle>,
    {
        self.global.insert(
            selector.to_string(),
            handles.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Register handles that only match when resolving under `root`.
    pub fn insert_scoped<I, S>(&mut self, root: &str, selector: &str, handles: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TargetHandle>,
    {
        self.scoped.insert(
            (root.to_string(), selector.to_string()),
            handles.into_iter().map(Into::into).collect(),
        );
        self
    }
}

impl TargetResolver for SelectorTable {
    fn resolve(&mut self, root: Option<&TargetHandle>, selector: &str) -> Vec<TargetHandle> {
        if let Some(root) = root {
            if let Some(hits) = self.scoped.get(&(root.clone(), selector.to_string())) {
                return hits.clone();
            }
        }
        self.global.get(selector).cloned().unwrap_or_default()
    }
}
