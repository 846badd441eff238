//! Template/component associations derived from the template side.
//!
//! Only templates record the relation (their `composed_of` list), so the reverse
//! direction is rebuilt by scanning every template definition.

use std::{collections::HashMap, sync::Arc};

use shared::{
    domain::{ComponentName, TemplateName},
    error::ApiError,
    protocol::NamedTemplate,
};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::TemplateService;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssociationMap {
    templates_by_component: HashMap<ComponentName, Vec<TemplateName>>,
    components_by_template: HashMap<TemplateName, Vec<ComponentName>>,
}

impl AssociationMap {
    /// Templates are visited in the order given, so each component's template list
    /// follows the catalog order.
    pub fn build(templates: &[NamedTemplate]) -> Self {
        let mut map = Self::default();
        for template in templates {
            let components = template.index_template.components();
            for component in components {
                map.templates_by_component
                    .entry(component.clone())
                    .or_default()
                    .push(template.name.clone());
            }
            map.components_by_template
                .insert(template.name.clone(), components.to_vec());
        }
        map
    }

    pub fn templates_for(&self, component: &ComponentName) -> &[TemplateName] {
        self.templates_by_component
            .get(component)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn components_of(&self, template: &TemplateName) -> &[ComponentName] {
        self.components_by_template
            .get(template)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn template_count(&self) -> usize {
        self.components_by_template.len()
    }
}

#[derive(Default)]
struct CacheState {
    map: Option<Arc<AssociationMap>>,
    generation: u64,
}

/// Lazily built association map shared by every association view. Invalidation is
/// wholesale; the next read rebuilds from a full scan.
#[derive(Clone, Default)]
pub struct AssociationCache {
    state: Arc<RwLock<CacheState>>,
}

impl AssociationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_loaded(&self) -> bool {
        self.state.read().await.map.is_some()
    }

    pub async fn invalidate(&self) {
        let mut state = self.state.write().await;
        state.map = None;
        state.generation += 1;
        debug!(generation = state.generation, "association cache invalidated");
    }

    /// Returns the cached map, building it first when absent or invalidated.
    pub async fn get_or_load(
        &self,
        service: &dyn TemplateService,
    ) -> Result<Arc<AssociationMap>, ApiError> {
        if let Some(map) = self.state.read().await.map.clone() {
            return Ok(map);
        }
        self.reload(service).await
    }

    /// Rebuilds unconditionally. A build that races with `invalidate` is returned to
    /// its caller but not stored.
    pub async fn reload(
        &self,
        service: &dyn TemplateService,
    ) -> Result<Arc<AssociationMap>, ApiError> {
        let generation = self.state.read().await.generation;
        let templates = service.get_template_details().await?;
        let map = Arc::new(AssociationMap::build(&templates));

        let mut state = self.state.write().await;
        if state.generation == generation {
            state.map = Some(Arc::clone(&map));
            info!(templates = map.template_count(), "association map rebuilt");
        } else {
            debug!("discarding association map built before invalidation");
        }
        Ok(map)
    }
}

#[cfg(test)]
#[path = "tests/association_tests.rs"]
mod tests;
