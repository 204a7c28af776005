mod provider;
mod swiggy;
mod wipro;

pub use provider::{PaginationStyle, SiteAdapter};
pub use swiggy::Swiggy;
pub use wipro::Wipro;

use std::collections::BTreeMap;
use std::sync::Arc;

/// Maps site identifiers to their adapters. Supporting a new career site is
/// a matter of implementing [`SiteAdapter`] and registering it here.
#[derive(Clone)]
pub struct SiteRegistry {
    adapters: BTreeMap<&'static str, Arc<dyn SiteAdapter>>,
}

impl SiteRegistry {
    pub fn empty() -> Self {
        Self {
            adapters: BTreeMap::new(),
        }
    }

    /// Registry with every built-in site.
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Swiggy::new()).register(Wipro::new());
        registry
    }

    pub fn register<A>(&mut self, adapter: A) -> &mut Self
    where
        A: SiteAdapter + 'static,
    {
        self.adapters.insert(adapter.id(), Arc::new(adapter));
        self
    }

    /// Look up a caller-supplied site name. Matching ignores case and
    /// surrounding whitespace.
    pub fn get(&self, site: &str) -> Option<Arc<dyn SiteAdapter>> {
        let key = site.trim().to_lowercase();
        self.adapters.get(key.as_str()).cloned()
    }

    pub fn supported(&self) -> Vec<&'static str> {
        self.adapters.keys().copied().collect()
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
