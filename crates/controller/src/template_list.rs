//! Paginated, sorted, filtered template table.
//!
//! Each load merges the template catalog with the full definitions, slices the
//! requested page locally, and is tagged with a sequence number so that only the
//! latest load may write into the view.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use client_core::{AssociationCache, TemplateService};
use shared::{
    domain::{SortDirection, SortField, TemplateName, TemplateType},
    error::ApiError,
    protocol::{CatalogEntry, NamedTemplate, TemplateDefinition},
    query::{ListQuery, SearchFilter, PAGE_SIZE_OPTIONS},
};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::{
    association_modal::{Anchor, AssociationModal},
    debounce::{Admission, Debouncer},
    events::{Notifier, UiError, UiErrorContext},
    navigation::{Navigator, CREATE_TEMPLATE_ROUTE},
};

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateRow {
    pub entry: CatalogEntry,
    pub detail: Option<TemplateDefinition>,
}

impl TemplateRow {
    pub fn name(&self) -> &TemplateName {
        &self.entry.name
    }

    pub fn template_type(&self) -> TemplateType {
        self.detail
            .as_ref()
            .map_or(TemplateType::Indexes, TemplateDefinition::template_type)
    }

    pub fn index_patterns(&self) -> &str {
        &self.entry.index_patterns
    }

    pub fn priority(&self) -> &str {
        self.entry.order.as_deref().unwrap_or_default()
    }

    /// Count shown on the "associated component templates" link.
    pub fn associated_component_count(&self) -> usize {
        self.detail
            .as_ref()
            .map_or(0, |detail| detail.components().len())
    }
}

/// Joins catalog rows with their definitions by name. Catalog rows without a
/// composition column are legacy templates and are dropped.
pub fn merge_catalog(entries: Vec<CatalogEntry>, details: Vec<NamedTemplate>) -> Vec<TemplateRow> {
    let mut details: HashMap<TemplateName, TemplateDefinition> = details
        .into_iter()
        .map(|item| (item.name, item.index_template))
        .collect();
    entries
        .into_iter()
        .filter(CatalogEntry::has_composition)
        .map(|entry| {
            let detail = details.remove(&entry.name);
            TemplateRow { entry, detail }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyStateAction {
    CreateTemplate,
    ResetFilters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    NoTemplates,
    NoMatches,
}

impl EmptyState {
    pub fn message(self) -> &'static str {
        match self {
            EmptyState::NoTemplates => "You have no templates.",
            EmptyState::NoMatches => {
                "There are no templates matching your applied filters. Reset your filters to view your templates."
            }
        }
    }

    pub fn action(self) -> EmptyStateAction {
        match self {
            EmptyState::NoTemplates => EmptyStateAction::CreateTemplate,
            EmptyState::NoMatches => EmptyStateAction::ResetFilters,
        }
    }

    pub fn action_label(self) -> &'static str {
        match self.action() {
            EmptyStateAction::CreateTemplate => "Create template",
            EmptyStateAction::ResetFilters => "Reset filters",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageChange {
    pub index: usize,
    pub size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortChange {
    pub field: Option<SortField>,
    pub direction: Option<SortDirection>,
}

/// Table interaction reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableChange {
    pub page: Option<PageChange>,
    pub sort: Option<SortChange>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Applied { total: usize },
    Failed(ApiError),
    /// Coalesced into a trailing load due at the given instant.
    Deferred(Instant),
    /// A newer load was issued after this one.
    Stale,
    Unmounted,
}

#[derive(Debug, Clone)]
pub struct LoadTicket {
    seq: u64,
    query: ListQuery,
}

#[derive(Debug)]
pub struct LoadResult {
    seq: u64,
    rows: Result<Vec<TemplateRow>, ApiError>,
}

/// Fetches the catalog and the definitions concurrently and merges them. A failed
/// definition fetch degrades to rows without details.
pub async fn fetch_rows(service: &dyn TemplateService, ticket: LoadTicket) -> LoadResult {
    let filter = ticket.query.catalog_filter();
    let (catalog, details) = futures::join!(
        service.list_templates_catalog(&filter),
        service.get_template_details()
    );
    let details = details.unwrap_or_else(|err| {
        warn!(error = %err, "template details unavailable; rendering catalog only");
        Vec::new()
    });
    LoadResult {
        seq: ticket.seq,
        rows: catalog.map(|entries| merge_catalog(entries, details)),
    }
}

/// Cloneable flag other views raise to ask the list for a reload.
#[derive(Debug, Clone, Default)]
pub struct ReloadTrigger(Arc<AtomicBool>);

impl ReloadTrigger {
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

pub struct TemplateListController {
    service: Arc<dyn TemplateService>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    query: ListQuery,
    rows: Vec<TemplateRow>,
    total: usize,
    selected: Vec<TemplateRow>,
    loading: bool,
    mounted: bool,
    issued_seq: u64,
    debouncer: Debouncer,
    reload: ReloadTrigger,
}

impl TemplateListController {
    /// Restores the view state from the navigator's current query string.
    pub fn new(
        service: Arc<dyn TemplateService>,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let query = ListQuery::from_query_string(&navigator.current_query());
        Self {
            service,
            notifier,
            navigator,
            query,
            rows: Vec::new(),
            total: 0,
            selected: Vec::new(),
            loading: false,
            mounted: false,
            issued_seq: 0,
            debouncer: Debouncer::default(),
            reload: ReloadTrigger::default(),
        }
    }

    pub fn with_debounce(mut self, wait: Duration) -> Self {
        self.debouncer = Debouncer::new(wait);
        self
    }

    pub fn query(&self) -> &ListQuery {
        &self.query
    }

    /// Rows of the current page.
    pub fn rows(&self) -> &[TemplateRow] {
        &self.rows
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn selected(&self) -> &[TemplateRow] {
        &self.selected
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn page_size_options(&self) -> &'static [usize] {
        &PAGE_SIZE_OPTIONS
    }

    pub async fn mount(&mut self) -> LoadOutcome {
        self.mounted = true;
        self.load().await
    }

    /// Responses arriving after this point are dropped.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.loading = false;
    }

    pub async fn load(&mut self) -> LoadOutcome {
        match self.debouncer.admit(Instant::now()) {
            Admission::Now => self.run_load().await,
            Admission::Deferred(deadline) => {
                debug!("template load coalesced into trailing call");
                LoadOutcome::Deferred(deadline)
            }
        }
    }

    /// Waits for and runs the trailing debounced load, if one is pending.
    pub async fn flush_pending(&mut self) -> Option<LoadOutcome> {
        let deadline = self.debouncer.pending_deadline()?;
        sleep_until(deadline).await;
        if self.debouncer.take_due(Instant::now()) {
            Some(self.run_load().await)
        } else {
            None
        }
    }

    async fn run_load(&mut self) -> LoadOutcome {
        let ticket = self.begin_load();
        let result = fetch_rows(self.service.as_ref(), ticket).await;
        self.apply(result)
    }

    /// Issues a new sequence number and publishes the query to the navigator. Any
    /// earlier ticket becomes stale.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued_seq += 1;
        self.loading = true;
        self.navigator.replace_query(&self.query.to_query_string());
        LoadTicket {
            seq: self.issued_seq,
            query: self.query.clone(),
        }
    }

    pub fn apply(&mut self, result: LoadResult) -> LoadOutcome {
        if !self.mounted {
            debug!(seq = result.seq, "dropping template load for unmounted view");
            return LoadOutcome::Unmounted;
        }
        if result.seq != self.issued_seq {
            debug!(
                seq = result.seq,
                latest = self.issued_seq,
                "dropping stale template load"
            );
            return LoadOutcome::Stale;
        }
        self.loading = false;

        match result.rows {
            Ok(all_rows) => {
                let total = all_rows.len();
                self.selected = self
                    .selected
                    .iter()
                    .filter_map(|item| all_rows.iter().find(|row| row.name() == item.name()))
                    .cloned()
                    .collect();
                self.rows = all_rows[self.query.page_range(total)].to_vec();
                self.total = total;
                info!(total, page = self.query.from, "templates loaded");
                LoadOutcome::Applied { total }
            }
            Err(err) => {
                self.rows.clear();
                self.total = 0;
                self.notifier
                    .notify_error(&UiError::from_api(UiErrorContext::LoadTemplates, &err));
                LoadOutcome::Failed(err)
            }
        }
    }

    pub async fn on_table_change(&mut self, change: TableChange) -> LoadOutcome {
        if let Some(page) = change.page {
            self.query.from = page.index;
            if page.size > 0 {
                self.query.size = page.size;
            }
        }
        if let Some(sort) = change.sort {
            self.query.sort_field = sort.field.unwrap_or(ListQuery::default().sort_field);
            if let Some(direction) = sort.direction {
                self.query.sort_direction = direction;
            }
        }
        self.load().await
    }

    pub async fn on_search_change(&mut self, filter: SearchFilter) -> LoadOutcome {
        self.query.from = 0;
        self.query.search = filter.search;
        self.load().await
    }

    pub fn on_selection_change(&mut self, items: Vec<TemplateRow>) {
        self.selected = items;
    }

    pub async fn reset_filters(&mut self) -> LoadOutcome {
        self.query.search = SearchFilter::default().search;
        self.load().await
    }

    pub fn create_template(&self) {
        self.navigator.push(CREATE_TEMPLATE_ROUTE);
    }

    /// Which empty prompt to show, if the current page has no rows.
    pub fn empty_state(&self) -> Option<EmptyState> {
        if !self.rows.is_empty() || self.loading {
            return None;
        }
        Some(if self.query.is_default_filter() {
            EmptyState::NoTemplates
        } else {
            EmptyState::NoMatches
        })
    }

    pub fn reload_trigger(&self) -> ReloadTrigger {
        self.reload.clone()
    }

    /// Runs a reload if another view asked for one since the last call.
    pub async fn apply_requested_reload(&mut self) -> Option<LoadOutcome> {
        if self.reload.take() {
            Some(self.load().await)
        } else {
            None
        }
    }

    /// Association view for a row's component templates. A successful unlink asks
    /// this list to reload.
    pub fn association_modal_for(
        &self,
        row: &TemplateRow,
        cache: AssociationCache,
    ) -> AssociationModal {
        let reload = self.reload.clone();
        AssociationModal::new(
            Anchor::Template(row.name().clone()),
            Arc::clone(&self.service),
            Arc::clone(&self.notifier),
            cache,
        )
        .with_on_unlink(move |_template| reload.request())
    }
}

#[cfg(test)]
#[path = "tests/template_list_tests.rs"]
mod tests;
