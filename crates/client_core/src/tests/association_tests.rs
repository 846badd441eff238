use super::*;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Mutex,
};

use async_trait::async_trait;
use shared::{
    error::ErrorCode,
    protocol::{CatalogEntry, TemplateDefinition},
    query::CatalogFilter,
};

fn named(name: &str, components: &[&str]) -> NamedTemplate {
    NamedTemplate {
        name: name.into(),
        index_template: TemplateDefinition {
            composed_of: Some(components.iter().map(|c| ComponentName::from(*c)).collect()),
            ..Default::default()
        },
    }
}

struct CountingService {
    templates: Vec<NamedTemplate>,
    detail_calls: AtomicUsize,
    fail: bool,
    invalidate_on_next_fetch: Mutex<Option<AssociationCache>>,
}

impl CountingService {
    fn new(templates: Vec<NamedTemplate>) -> Self {
        Self {
            templates,
            detail_calls: AtomicUsize::new(0),
            fail: false,
            invalidate_on_next_fetch: Mutex::new(None),
        }
    }
}

#[async_trait]
impl TemplateService for CountingService {
    async fn list_templates_catalog(
        &self,
        _filter: &CatalogFilter,
    ) -> Result<Vec<CatalogEntry>, ApiError> {
        Ok(Vec::new())
    }

    async fn get_template_details(&self) -> Result<Vec<NamedTemplate>, ApiError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let racing = self.invalidate_on_next_fetch.lock().expect("lock").take();
        if let Some(cache) = racing {
            cache.invalidate().await;
        }
        if self.fail {
            return Err(ApiError::new(ErrorCode::Unauthorized, "401 Unauthorized"));
        }
        Ok(self.templates.clone())
    }

    async fn get_template_definition(
        &self,
        _name: &TemplateName,
    ) -> Result<TemplateDefinition, ApiError> {
        Err(ApiError::internal("unused"))
    }

    async fn replace_template_definition(
        &self,
        _name: &TemplateName,
        _definition: &TemplateDefinition,
    ) -> Result<(), ApiError> {
        Err(ApiError::internal("unused"))
    }
}

#[test]
fn reverse_map_lists_referencing_templates_in_catalog_order() {
    let map = AssociationMap::build(&[
        named("t1", &["c1", "c2"]),
        named("t2", &["c2"]),
        named("t3", &[]),
    ]);

    assert_eq!(map.templates_for(&"c1".into()), [TemplateName::from("t1")]);
    assert_eq!(
        map.templates_for(&"c2".into()),
        [TemplateName::from("t1"), TemplateName::from("t2")]
    );
    assert!(map.templates_for(&"c9".into()).is_empty());
}

#[test]
fn forward_map_is_the_stored_composition() {
    let map = AssociationMap::build(&[named("t1", &["c2", "c1"])]);

    assert_eq!(
        map.components_of(&"t1".into()),
        [ComponentName::from("c2"), ComponentName::from("c1")]
    );
    assert!(map.components_of(&"missing".into()).is_empty());
    assert_eq!(map.template_count(), 1);
}

#[tokio::test]
async fn cache_fetches_once_until_invalidated() {
    let service = CountingService::new(vec![named("t1", &["c1"])]);
    let cache = AssociationCache::new();
    assert!(!cache.is_loaded().await);

    cache.get_or_load(&service).await.expect("first");
    cache.get_or_load(&service).await.expect("second");
    assert_eq!(service.detail_calls.load(Ordering::SeqCst), 1);

    cache.invalidate().await;
    assert!(!cache.is_loaded().await);
    cache.get_or_load(&service).await.expect("third");
    assert_eq!(service.detail_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn clones_share_one_cache() {
    let service = CountingService::new(vec![named("t1", &["c1"])]);
    let cache = AssociationCache::new();
    let other = cache.clone();

    cache.get_or_load(&service).await.expect("load");
    assert!(other.is_loaded().await);
    other.invalidate().await;
    assert!(!cache.is_loaded().await);
}

#[tokio::test]
async fn failed_build_leaves_cache_empty() {
    let mut service = CountingService::new(Vec::new());
    service.fail = true;
    let cache = AssociationCache::new();

    let err = cache.get_or_load(&service).await.expect_err("must fail");
    assert_eq!(err.message, "401 Unauthorized");
    assert!(!cache.is_loaded().await);
}

#[tokio::test]
async fn build_racing_an_invalidation_is_returned_but_not_stored() {
    let service = CountingService::new(vec![named("t1", &["c1"])]);
    let cache = AssociationCache::new();
    *service.invalidate_on_next_fetch.lock().expect("lock") = Some(cache.clone());

    let raced = cache.get_or_load(&service).await.expect("load");
    assert_eq!(raced.templates_for(&"c1".into()), [TemplateName::from("t1")]);
    assert!(!cache.is_loaded().await);

    cache.get_or_load(&service).await.expect("reload");
    assert!(cache.is_loaded().await);
    assert_eq!(service.detail_calls.load(Ordering::SeqCst), 2);
}
