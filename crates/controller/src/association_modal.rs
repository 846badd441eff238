//! Overlay listing the entities related to one anchor (a component's templates, or
//! a template's components), with a confirm-then-commit unlink per row.
//!
//! Unlink state machine:
//! `Idle -> Confirming -> (cancel -> Idle) | (confirm -> Committing -> Idle)`.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use client_core::{AssociationCache, AssociationMap, TemplateService};
use shared::{
    domain::{ComponentName, SortDirection, TemplateName},
    error::ApiError,
    protocol::TemplateDefinition,
    query::page_range,
};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    events::{Notifier, UiError, UiErrorContext},
    navigation::{component_editor_route, template_editor_route},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    Component(ComponentName),
    Template(TemplateName),
}

impl Anchor {
    pub fn name(&self) -> &str {
        match self {
            Anchor::Component(name) => name.as_str(),
            Anchor::Template(name) => name.as_str(),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Anchor::Component(_) => "Associated index templates",
            Anchor::Template(_) => "Associated component templates",
        }
    }

    pub fn column_label(&self) -> &'static str {
        match self {
            Anchor::Component(_) => "Templates",
            Anchor::Template(_) => "Component templates",
        }
    }

    fn related_items(&self, map: &AssociationMap) -> Vec<String> {
        match self {
            Anchor::Component(component) => map
                .templates_for(component)
                .iter()
                .map(|name| name.to_string())
                .collect(),
            Anchor::Template(template) => map
                .components_of(template)
                .iter()
                .map(|name| name.to_string())
                .collect(),
        }
    }

    /// The relation between this anchor and one of its rows. The template side is
    /// always the one that stores it.
    pub fn relation_with(&self, row: &str) -> Relation {
        match self {
            Anchor::Component(component) => Relation {
                template: TemplateName::from(row),
                component: component.clone(),
            },
            Anchor::Template(template) => Relation {
                template: template.clone(),
                component: ComponentName::from(row),
            },
        }
    }

    pub fn item_link(&self, row: &str) -> String {
        match self {
            Anchor::Component(_) => template_editor_route(row),
            Anchor::Template(_) => component_editor_route(row),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub template: TemplateName,
    pub component: ComponentName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmDialog {
    pub title: String,
    pub body: String,
    pub confirm_label: &'static str,
    pub danger: bool,
}

impl ConfirmDialog {
    fn for_unlink(row: &str, relation: &Relation) -> Self {
        Self {
            title: format!("Unlink from {row}?"),
            body: format!(
                "The component {} will be removed from the template {}. This will affect any new indexes created with the template.",
                relation.component, relation.template
            ),
            confirm_label: "Unlink",
            danger: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlinkPhase {
    Idle,
    Confirming(Relation),
    Committing(Relation),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnlinkError {
    #[error("'{0}' is not associated with '{1}'")]
    UnknownRow(String, String),
    #[error("another unlink is already in progress")]
    Busy,
    #[error("no unlink is awaiting confirmation")]
    NothingToConfirm,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UnlinkOutcome {
    Unlinked(Relation),
    Failed(ApiError),
}

/// Handed to the host's trigger so it can open the overlay.
#[derive(Debug, Clone, Default)]
pub struct VisibilitySetter(Arc<AtomicBool>);

impl VisibilitySetter {
    pub fn set(&self, visible: bool) {
        self.0.store(visible, Ordering::SeqCst);
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub const DEFAULT_MODAL_PAGE_SIZE: usize = 10;

type UnlinkCallback = Box<dyn Fn(&TemplateName) + Send + Sync>;

/// Reads the template's current definition and writes it back without the
/// component. The read must succeed before anything is written.
pub async fn commit_unlink(
    service: &dyn TemplateService,
    relation: &Relation,
) -> Result<TemplateDefinition, ApiError> {
    let current = service.get_template_definition(&relation.template).await?;
    let updated = current.without_component(&relation.component);
    service
        .replace_template_definition(&relation.template, &updated)
        .await?;
    Ok(updated)
}

pub struct AssociationModal {
    anchor: Anchor,
    service: Arc<dyn TemplateService>,
    notifier: Arc<dyn Notifier>,
    cache: AssociationCache,
    visibility: VisibilitySetter,
    on_unlink: Option<UnlinkCallback>,
    items: Vec<String>,
    loading: bool,
    load_error: Option<ApiError>,
    sort: Option<SortDirection>,
    page: usize,
    page_size: usize,
    phase: UnlinkPhase,
}

impl AssociationModal {
    pub fn new(
        anchor: Anchor,
        service: Arc<dyn TemplateService>,
        notifier: Arc<dyn Notifier>,
        cache: AssociationCache,
    ) -> Self {
        Self {
            anchor,
            service,
            notifier,
            cache,
            visibility: VisibilitySetter::default(),
            on_unlink: None,
            items: Vec::new(),
            loading: false,
            load_error: None,
            sort: None,
            page: 0,
            page_size: DEFAULT_MODAL_PAGE_SIZE,
            phase: UnlinkPhase::Idle,
        }
    }

    pub fn with_on_unlink(
        mut self,
        callback: impl Fn(&TemplateName) + Send + Sync + 'static,
    ) -> Self {
        self.on_unlink = Some(Box::new(callback));
        self
    }

    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    /// Lets the host render its own trigger; the overlay stays closed until the
    /// trigger flips the setter.
    pub fn render_trigger<R>(&self, render: impl FnOnce(&VisibilitySetter) -> R) -> R {
        render(&self.visibility)
    }

    pub fn is_visible(&self) -> bool {
        self.visibility.get()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn phase(&self) -> &UnlinkPhase {
        &self.phase
    }

    /// Failure of the most recent association load, cleared by the next success.
    pub fn load_error(&self) -> Option<&ApiError> {
        self.load_error.as_ref()
    }

    /// Related names in display order: stored order until the operator sorts.
    pub fn items(&self) -> Vec<String> {
        let mut items = self.items.clone();
        match self.sort {
            Some(SortDirection::Asc) => items.sort(),
            Some(SortDirection::Desc) => items.sort_by(|a, b| b.cmp(a)),
            None => {}
        }
        items
    }

    pub fn toggle_sort(&mut self) -> SortDirection {
        let next = match self.sort {
            Some(SortDirection::Asc) => SortDirection::Desc,
            _ => SortDirection::Asc,
        };
        self.sort = Some(next);
        self.page = 0;
        next
    }

    /// The rows of the current page, in display order.
    pub fn page_items(&self) -> Vec<String> {
        let items = self.items();
        let range = page_range(self.page, self.page_size, items.len());
        items[range].to_vec()
    }

    pub fn page_index(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        self.items.len().div_ceil(self.page_size).max(1)
    }

    pub fn set_page(&mut self, index: usize, size: usize) {
        if size > 0 {
            self.page_size = size;
        }
        self.page = index.min(self.page_count() - 1);
    }

    pub async fn open(&mut self) {
        self.visibility.set(true);
        self.sync().await;
    }

    pub fn close(&mut self) {
        self.visibility.set(false);
        if matches!(self.phase, UnlinkPhase::Confirming(_)) {
            self.phase = UnlinkPhase::Idle;
        }
    }

    /// Brings the items in line with the shared cache while visible, rebuilding
    /// the cache first if it was never loaded or has been invalidated.
    pub async fn sync(&mut self) {
        if !self.is_visible() {
            return;
        }
        self.loading = true;
        match self.cache.get_or_load(self.service.as_ref()).await {
            Ok(map) => {
                self.items = self.anchor.related_items(&map);
                self.page = self.page.min(self.page_count() - 1);
                self.load_error = None;
            }
            Err(err) => {
                warn!(anchor = self.anchor.name(), error = %err, "failed to load associations");
                self.notifier
                    .notify_error(&UiError::from_api(UiErrorContext::LoadAssociations, &err));
                self.load_error = Some(err);
            }
        }
        self.loading = false;
    }

    pub fn request_unlink(&mut self, row: &str) -> Result<ConfirmDialog, UnlinkError> {
        if self.phase != UnlinkPhase::Idle {
            return Err(UnlinkError::Busy);
        }
        if !self.items.iter().any(|item| item == row) {
            return Err(UnlinkError::UnknownRow(
                row.to_string(),
                self.anchor.name().to_string(),
            ));
        }
        let relation = self.anchor.relation_with(row);
        let dialog = ConfirmDialog::for_unlink(row, &relation);
        self.phase = UnlinkPhase::Confirming(relation);
        Ok(dialog)
    }

    pub fn cancel(&mut self) -> bool {
        if matches!(self.phase, UnlinkPhase::Confirming(_)) {
            self.phase = UnlinkPhase::Idle;
            true
        } else {
            false
        }
    }

    pub async fn confirm(&mut self) -> Result<UnlinkOutcome, UnlinkError> {
        let relation = match &self.phase {
            UnlinkPhase::Confirming(relation) => relation.clone(),
            UnlinkPhase::Committing(_) => return Err(UnlinkError::Busy),
            UnlinkPhase::Idle => return Err(UnlinkError::NothingToConfirm),
        };
        self.phase = UnlinkPhase::Committing(relation.clone());
        let result = commit_unlink(self.service.as_ref(), &relation).await;
        self.phase = UnlinkPhase::Idle;

        match result {
            Ok(_) => {
                info!(
                    template = %relation.template,
                    component = %relation.component,
                    "component unlinked from template"
                );
                if let Some(callback) = &self.on_unlink {
                    callback(&relation.template);
                }
                self.cache.invalidate().await;
                self.notifier.notify_success(&format!(
                    "{} has been successfully unlinked from {}.",
                    relation.component, relation.template
                ));
                self.sync().await;
                Ok(UnlinkOutcome::Unlinked(relation))
            }
            Err(err) => {
                warn!(
                    template = %relation.template,
                    component = %relation.component,
                    error = %err,
                    "unlink failed"
                );
                self.notifier
                    .notify_error(&UiError::from_api(UiErrorContext::Unlink, &err));
                Ok(UnlinkOutcome::Failed(err))
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/association_modal_tests.rs"]
mod tests;
