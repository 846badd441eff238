//! Headless view-controllers for browsing index templates and unlinking component
//! templates. Rendering is left to the host; every state transition lives here.

pub mod association_modal;
pub mod debounce;
pub mod events;
pub mod navigation;
pub mod template_list;

pub use association_modal::{
    Anchor, AssociationModal, ConfirmDialog, Relation, UnlinkError, UnlinkOutcome, UnlinkPhase,
    VisibilitySetter,
};
pub use events::{Notifier, UiError, UiErrorCategory, UiErrorContext};
pub use navigation::{MemoryNavigator, Navigator};
pub use template_list::{
    EmptyState, EmptyStateAction, LoadOutcome, ReloadTrigger, TableChange, TemplateListController,
    TemplateRow,
};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
