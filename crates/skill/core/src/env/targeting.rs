use std::fmt;
use std::sync::Arc;

use crate::cast::CastContext;
use crate::types::EntityId;

use super::HookError;

/// Target acquisition strategy backed by host-side spatial queries.
///
/// Implementations read the caster position, aim and the modified
/// [`crate::TargetingConfig`] from the context and return candidate entities.
pub trait TargetAcquisition: Send + Sync {
    fn name(&self) -> &str;

    fn acquire(&self, ctx: &CastContext<'_>) -> Result<Vec<EntityId>, HookError>;
}

/// Predicate deciding whether an acquired entity remains a target.
pub trait TargetFilter: Send + Sync {
    fn name(&self) -> &str;

    fn is_valid(&self, ctx: &CastContext<'_>, entity: EntityId) -> bool;
}

/// Logical AND over a list of filters. An empty group accepts everything.
#[derive(Clone, Default)]
pub struct FilterGroup {
    filters: Vec<Arc<dyn TargetFilter>>,
}

impl FilterGroup {
    pub fn new(filters: Vec<Arc<dyn TargetFilter>>) -> Self {
        Self { filters }
    }

    pub fn push(&mut self, filter: Arc<dyn TargetFilter>) {
        self.filters.push(filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn is_valid(&self, ctx: &CastContext<'_>, entity: EntityId) -> bool {
        self.filters.iter().all(|filter| filter.is_valid(ctx, entity))
    }
}

impl fmt::Debug for FilterGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.filters.iter().map(|filter| filter.name()))
            .finish()
    }
}
