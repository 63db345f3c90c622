//! Loaded resource bookkeeping
//!
//! Scripts, modules and stylesheets injected through the console, keyed by
//! URL. Loading a URL a second time (or reloading it by its 1-based list
//! index) swaps the live element for a cache-busted one (`?c=N`) instead of
//! adding a duplicate record.

use crate::console_log;
use crate::error::{ConsoleError, ConsoleResult};
use std::fmt;

/// Called once the injected element has loaded
pub type LoadCallback = Box<dyn FnOnce()>;

/// Kind of injected resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Script,
    Module,
    Stylesheet,
}

impl ResourceKind {
    fn label(self) -> &'static str {
        match self {
            ResourceKind::Script => "Script",
            ResourceKind::Module => "Module",
            ResourceKind::Stylesheet => "Stylesheet",
        }
    }

    fn plural(self) -> &'static str {
        match self {
            ResourceKind::Script => "scripts",
            ResourceKind::Module => "modules",
            ResourceKind::Stylesheet => "stylesheets",
        }
    }
}

/// Opaque reference to a live injected element, issued by the loader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceHandle(pub usize);

/// Injects and removes resource elements in the page
pub trait ResourceLoader {
    /// Inject `url` as a new element of `kind`
    fn inject(
        &self,
        url: &str,
        kind: ResourceKind,
        on_load: Option<LoadCallback>,
    ) -> ConsoleResult<ResourceHandle>;

    /// Remove a previously injected element
    fn remove(&self, handle: ResourceHandle);
}

/// One loaded URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedResource {
    pub url: String,
    pub kind: ResourceKind,
    pub element: ResourceHandle,
    /// Next cache-busting value
    pub counter: u32,
}

/// Result of a reload request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    Reloaded { url: String, busted_url: String },
    OutOfRange(ResourceKind),
}

impl fmt::Display for ReloadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReloadOutcome::Reloaded { busted_url, .. } => write!(f, "Reloaded {}", busted_url),
            ReloadOutcome::OutOfRange(kind) => write!(f, "{} index is out of range!", kind.label()),
        }
    }
}

/// Table of loaded resources, in load order
#[derive(Debug, Default)]
pub struct ResourceTable {
    entries: Vec<LoadedResource>,
}

impl ResourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resources of one kind, in load order
    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &LoadedResource> {
        self.entries.iter().filter(move |r| r.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load `url`, or replace its live element if already loaded.
    pub fn load(
        &mut self,
        loader: &dyn ResourceLoader,
        url: &str,
        kind: ResourceKind,
        on_load: Option<LoadCallback>,
    ) -> ConsoleResult<()> {
        if url.is_empty() {
            return Err(ConsoleError::MissingArgument("url"));
        }
        if let Some(pos) = self
            .entries
            .iter()
            .position(|r| r.kind == kind && r.url == url)
        {
            replace_element(loader, &mut self.entries[pos], on_load)?;
            return Ok(());
        }
        let element = loader.inject(url, kind, on_load)?;
        console_log!("[loader] loaded {} {}", kind.label().to_lowercase(), url);
        self.entries.push(LoadedResource {
            url: url.to_string(),
            kind,
            element,
            counter: 1,
        });
        Ok(())
    }

    /// Reload the `index`-th (1-based) resource of `kind`.
    pub fn reload(
        &mut self,
        loader: &dyn ResourceLoader,
        kind: ResourceKind,
        index: i64,
    ) -> ConsoleResult<ReloadOutcome> {
        let position = usize::try_from(index)
            .ok()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| {
                self.entries
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| r.kind == kind)
                    .nth(i)
                    .map(|(pos, _)| pos)
            });
        let Some(position) = position else {
            return Ok(ReloadOutcome::OutOfRange(kind));
        };
        let resource = &mut self.entries[position];
        let busted_url = replace_element(loader, resource, None)?;
        Ok(ReloadOutcome::Reloaded {
            url: resource.url.clone(),
            busted_url,
        })
    }

    /// Numbered listing, e.g. `Loaded scripts (1):\n1. app.js`
    pub fn list(&self, kind: ResourceKind) -> String {
        let urls: Vec<&str> = self.of_kind(kind).map(|r| r.url.as_str()).collect();
        let mut out = format!("Loaded {} ({}):", kind.plural(), urls.len());
        for (i, url) in urls.iter().enumerate() {
            out.push_str(&format!("\n{}. {}", i + 1, url));
        }
        out
    }
}

/// Inject a cache-busted copy, then drop the old element.
fn replace_element(
    loader: &dyn ResourceLoader,
    resource: &mut LoadedResource,
    on_load: Option<LoadCallback>,
) -> ConsoleResult<String> {
    let busted = cache_busted(&resource.url, resource.counter);
    let element = loader.inject(&busted, resource.kind, on_load)?;
    loader.remove(resource.element);
    resource.element = element;
    resource.counter += 1;
    console_log!("[loader] reloaded {}", busted);
    Ok(busted)
}

fn cache_busted(url: &str, counter: u32) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{}{}c={}", url, sep, counter)
}
