//! Name-keyed registry of target acquisition strategies and filters.
//!
//! Skill definitions refer to targeting collaborators by name; the registry
//! resolves those names into a [`TargetingBinding`] when a skill is equipped.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use skill_core::{TargetAcquisition, TargetFilter, TargetingBinding, TargetingSpec};

#[derive(Clone, Default)]
pub struct TargetingRegistry {
    strategies: HashMap<String, Arc<dyn TargetAcquisition>>,
    filters: HashMap<String, Arc<dyn TargetFilter>>,
}

impl TargetingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `strategy` under its own name, replacing any previous one.
    pub fn register_strategy(&mut self, strategy: Arc<dyn TargetAcquisition>) -> &mut Self {
        self.strategies.insert(strategy.name().to_owned(), strategy);
        self
    }

    pub fn register_filter(&mut self, filter: Arc<dyn TargetFilter>) -> &mut Self {
        self.filters.insert(filter.name().to_owned(), filter);
        self
    }

    pub fn strategy(&self, name: &str) -> Option<&Arc<dyn TargetAcquisition>> {
        self.strategies.get(name)
    }

    pub fn filter(&self, name: &str) -> Option<&Arc<dyn TargetFilter>> {
        self.filters.get(name)
    }

    /// Resolves the names in `spec`.
    ///
    /// Unknown names are configuration defects. They are logged and the skill
    /// is left unbound, so every cast finds no targets. A filter is never
    /// dropped on its own since that would widen the target set.
    pub fn bind(&self, spec: &TargetingSpec) -> TargetingBinding {
        let strategy = match spec.strategy.as_deref() {
            Some(name) => {
                let found = self.strategy(name).cloned();
                if found.is_none() {
                    warn!(target: "skill::runtime", strategy = name, "unknown targeting strategy");
                }
                found
            }
            None => None,
        };

        let mut binding = TargetingBinding {
            strategy,
            ..TargetingBinding::default()
        };
        for name in &spec.filters {
            match self.filter(name) {
                Some(filter) => binding.filters.push(Arc::clone(filter)),
                None => {
                    warn!(target: "skill::runtime", filter = %name, "unknown target filter");
                    return TargetingBinding::unbound();
                }
            }
        }
        binding
    }
}

impl std::fmt::Debug for TargetingRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut strategies: Vec<_> = self.strategies.keys().collect();
        strategies.sort();
        let mut filters: Vec<_> = self.filters.keys().collect();
        filters.sort();
        f.debug_struct("TargetingRegistry")
            .field("strategies", &strategies)
            .field("filters", &filters)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skill_core::{CastContext, EntityId, HookError};

    struct Named(&'static str);

    impl TargetAcquisition for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn acquire(&self, _ctx: &CastContext<'_>) -> Result<Vec<EntityId>, HookError> {
            Ok(Vec::new())
        }
    }

    impl TargetFilter for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn is_valid(&self, _ctx: &CastContext<'_>, _entity: EntityId) -> bool {
            true
        }
    }

    #[test]
    fn bind_resolves_known_names() {
        let mut registry = TargetingRegistry::new();
        registry
            .register_strategy(Arc::new(Named("cone")))
            .register_filter(Arc::new(Named("enemy")));

        let spec = TargetingSpec {
            strategy: Some("cone".into()),
            filters: vec!["enemy".into()],
            ..TargetingSpec::default()
        };
        let binding = registry.bind(&spec);
        assert_eq!(binding.strategy.map(|s| s.name().to_owned()), Some("cone".into()));
        assert_eq!(binding.filters.len(), 1);
    }

    #[test]
    fn unknown_filter_unbinds_the_skill() {
        let mut registry = TargetingRegistry::new();
        registry
            .register_strategy(Arc::new(Named("cone")))
            .register_filter(Arc::new(Named("enemy")));

        let spec = TargetingSpec {
            strategy: Some("cone".into()),
            filters: vec!["enemy".into(), "missing".into()],
            ..TargetingSpec::default()
        };
        let binding = registry.bind(&spec);
        assert!(binding.strategy.is_none());
        assert!(binding.filters.is_empty());
    }

    #[test]
    fn unknown_strategy_binds_nothing() {
        let registry = TargetingRegistry::new();
        let spec = TargetingSpec {
            strategy: Some("nowhere".into()),
            ..TargetingSpec::default()
        };
        assert!(registry.bind(&spec).strategy.is_none());
    }
}
