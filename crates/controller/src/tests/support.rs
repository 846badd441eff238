//! In-memory cluster and notification sink shared by the controller tests.

use std::sync::Mutex;

use async_trait::async_trait;
use client_core::TemplateService;
use shared::{
    domain::{ComponentName, TemplateName},
    error::{ApiError, ErrorCode},
    protocol::{CatalogEntry, NamedTemplate, TemplateDefinition},
    query::CatalogFilter,
};

use crate::events::{Notifier, UiError};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Catalog(CatalogFilter),
    Details,
    Get(TemplateName),
    Replace(TemplateName, TemplateDefinition),
}

#[derive(Default)]
pub struct FakeCluster {
    catalog: Mutex<Vec<CatalogEntry>>,
    templates: Mutex<Vec<NamedTemplate>>,
    calls: Mutex<Vec<Call>>,
    catalog_error: Option<ApiError>,
    details_error: Option<ApiError>,
    write_error: Option<ApiError>,
}

pub fn definition(components: &[&str]) -> TemplateDefinition {
    TemplateDefinition {
        index_patterns: vec!["logs-*".into()],
        composed_of: Some(components.iter().map(|c| ComponentName::from(*c)).collect()),
        priority: Some(10),
        ..Default::default()
    }
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_template(self, name: &str, components: &[&str]) -> Self {
        self.with_definition(name, definition(components))
    }

    pub fn with_definition(self, name: &str, definition: TemplateDefinition) -> Self {
        self.catalog.lock().expect("lock").push(CatalogEntry {
            name: name.into(),
            index_patterns: format!("[{}]", definition.index_patterns.join(", ")),
            order: definition.priority.map(|p| p.to_string()),
            version: None,
            composed_of: Some(format!(
                "[{}]",
                definition
                    .components()
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )),
        });
        self.templates.lock().expect("lock").push(NamedTemplate {
            name: name.into(),
            index_template: definition,
        });
        self
    }

    pub fn with_legacy_template(self, name: &str) -> Self {
        self.catalog.lock().expect("lock").push(CatalogEntry {
            name: name.into(),
            index_patterns: "[legacy-*]".into(),
            order: Some("0".into()),
            version: None,
            composed_of: Some(String::new()),
        });
        self
    }

    pub fn failing_catalog(mut self, message: &str) -> Self {
        self.catalog_error = Some(ApiError::new(ErrorCode::Internal, message));
        self
    }

    pub fn failing_details(mut self, message: &str) -> Self {
        self.details_error = Some(ApiError::new(ErrorCode::Internal, message));
        self
    }

    pub fn failing_writes(mut self, message: &str) -> Self {
        self.write_error = Some(ApiError::new(ErrorCode::Forbidden, message));
        self
    }

    /// Out-of-band edit, as if another operator changed the template.
    pub fn set_components(&self, name: &str, components: &[&str]) {
        let mut templates = self.templates.lock().expect("lock");
        if let Some(item) = templates.iter_mut().find(|item| item.name.as_str() == name) {
            item.index_template.composed_of =
                Some(components.iter().map(|c| ComponentName::from(*c)).collect());
        }
    }

    pub fn remove_template(&self, name: &str) {
        self.catalog
            .lock()
            .expect("lock")
            .retain(|entry| entry.name.as_str() != name);
        self.templates
            .lock()
            .expect("lock")
            .retain(|item| item.name.as_str() != name);
    }

    pub fn template(&self, name: &str) -> Option<TemplateDefinition> {
        self.templates
            .lock()
            .expect("lock")
            .iter()
            .find(|item| item.name.as_str() == name)
            .map(|item| item.index_template.clone())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("lock").clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|call| matches(call)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().expect("lock").push(call);
    }
}

#[async_trait]
impl TemplateService for FakeCluster {
    async fn list_templates_catalog(
        &self,
        filter: &CatalogFilter,
    ) -> Result<Vec<CatalogEntry>, ApiError> {
        self.record(Call::Catalog(filter.clone()));
        if let Some(err) = &self.catalog_error {
            return Err(err.clone());
        }
        let needle = filter.name_pattern.trim_matches('*');
        Ok(self
            .catalog
            .lock()
            .expect("lock")
            .iter()
            .filter(|entry| entry.name.as_str().contains(needle))
            .cloned()
            .collect())
    }

    async fn get_template_details(&self) -> Result<Vec<NamedTemplate>, ApiError> {
        self.record(Call::Details);
        if let Some(err) = &self.details_error {
            return Err(err.clone());
        }
        Ok(self.templates.lock().expect("lock").clone())
    }

    async fn get_template_definition(
        &self,
        name: &TemplateName,
    ) -> Result<TemplateDefinition, ApiError> {
        self.record(Call::Get(name.clone()));
        self.template(name.as_str()).ok_or_else(|| {
            ApiError::new(
                ErrorCode::NotFound,
                format!("index template [{name}] not found"),
            )
        })
    }

    async fn replace_template_definition(
        &self,
        name: &TemplateName,
        definition: &TemplateDefinition,
    ) -> Result<(), ApiError> {
        self.record(Call::Replace(name.clone(), definition.clone()));
        if let Some(err) = &self.write_error {
            return Err(err.clone());
        }
        let mut templates = self.templates.lock().expect("lock");
        if let Some(item) = templates.iter_mut().find(|item| &item.name == name) {
            item.index_template = definition.clone();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    successes: Mutex<Vec<String>>,
    errors: Mutex<Vec<UiError>>,
}

impl RecordingNotifier {
    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().expect("lock").clone()
    }

    pub fn errors(&self) -> Vec<UiError> {
        self.errors.lock().expect("lock").clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_success(&self, message: &str) {
        self.successes
            .lock()
            .expect("lock")
            .push(message.to_string());
    }

    fn notify_error(&self, error: &UiError) {
        self.errors.lock().expect("lock").push(error.clone());
    }
}
