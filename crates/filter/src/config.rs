//! Filter configuration, factory, and the host-owned registry.
//!
//! Registration is modeled as explicit values: the host builds a
//! [`FilterRegistry`] at process start, registers the factories it ships,
//! and later looks them up by the names its configuration references.
//! Nothing here is module-level mutable state; a registry is just data the
//! host owns.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::filter::{ClickHouseFilter, NetworkFilter};

/// Canonical registration name of the ClickHouse network filter.
pub const FILTER_NAME: &str = "envoy.filters.network.clickhouse";

/// Legacy alias retained for configurations predating the canonical name.
pub const FILTER_ALIAS: &str = "envoy.clickhouse";

/// Configuration message for the ClickHouse filter.
///
/// The filter is keyed to a configuration with no fields; unknown keys are
/// rejected so a typo in a host config fails loudly.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {}

/// Builds per-connection filter instances from a parsed configuration.
pub trait FilterFactory: Send + Sync {
    /// Canonical name the factory registers under.
    fn name(&self) -> &'static str;

    /// Additional names the factory answers to.
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    /// Whether filters built by this factory terminate the filter chain.
    fn is_terminal(&self) -> bool {
        false
    }

    /// Creates a fresh filter for one connection.
    fn create(&self) -> Box<dyn NetworkFilter>;
}

/// Factory for [`ClickHouseFilter`] instances.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClickHouseFilterFactory {
    config: FilterConfig,
}

impl ClickHouseFilterFactory {
    /// Creates a factory keyed to `config`.
    #[must_use]
    pub const fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// The configuration this factory was built from.
    #[must_use]
    pub const fn config(&self) -> &FilterConfig {
        &self.config
    }
}

impl FilterFactory for ClickHouseFilterFactory {
    fn name(&self) -> &'static str {
        FILTER_NAME
    }

    fn aliases(&self) -> &'static [&'static str] {
        &[FILTER_ALIAS]
    }

    fn create(&self) -> Box<dyn NetworkFilter> {
        Box::new(ClickHouseFilter::new())
    }
}

/// Name-keyed collection of filter factories owned by the host.
#[derive(Default)]
pub struct FilterRegistry {
    factories: HashMap<&'static str, Arc<dyn FilterFactory>>,
}

impl FilterRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `factory` under its canonical name and every alias,
    /// replacing earlier entries with the same names.
    pub fn register(&mut self, factory: Arc<dyn FilterFactory>) {
        for name in std::iter::once(factory.name()).chain(factory.aliases().iter().copied()) {
            self.factories.insert(name, Arc::clone(&factory));
        }
    }

    /// Looks a factory up by canonical name or alias.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn FilterFactory>> {
        self.factories.get(name).cloned()
    }

    /// Every name the registry currently answers to, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterRegistry")
            .field("names", &self.names())
            .finish()
    }
}

/// Registers the ClickHouse filter factory the way a host does at startup.
pub fn register_clickhouse_filter(registry: &mut FilterRegistry, config: FilterConfig) {
    registry.register(Arc::new(ClickHouseFilterFactory::new(config)));
}
