//! Address-bar abstraction: the list view mirrors its query state here so a link
//! reproduces the view.

use std::sync::{Mutex, PoisonError};

pub const TEMPLATES_ROUTE: &str = "/templates";
pub const CREATE_TEMPLATE_ROUTE: &str = "/create-template";
pub const CREATE_COMPONENT_TEMPLATE_ROUTE: &str = "/create-composable-template";

pub fn template_editor_route(name: &str) -> String {
    format!("{CREATE_TEMPLATE_ROUTE}/{name}")
}

pub fn component_editor_route(name: &str) -> String {
    format!("{CREATE_COMPONENT_TEMPLATE_ROUTE}/{name}")
}

pub trait Navigator: Send + Sync {
    /// Query string of the current location, without the leading `?`.
    fn current_query(&self) -> String;
    /// Rewrites the current location's query in place (no new history entry).
    fn replace_query(&self, query: &str);
    fn push(&self, route: &str);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: String,
}

impl Location {
    pub fn href(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }
}

/// In-process history stack.
#[derive(Debug, Default)]
pub struct MemoryNavigator {
    history: Mutex<Vec<Location>>,
}

impl MemoryNavigator {
    pub fn new(path: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            history: Mutex::new(vec![Location {
                path: path.into(),
                query: query.into(),
            }]),
        }
    }

    pub fn location(&self) -> Location {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.last().cloned().unwrap_or_default()
    }

    pub fn history_len(&self) -> usize {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Navigator for MemoryNavigator {
    fn current_query(&self) -> String {
        self.location().query
    }

    fn replace_query(&self, query: &str) {
        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        match history.last_mut() {
            Some(location) => location.query = query.to_string(),
            None => history.push(Location {
                path: TEMPLATES_ROUTE.to_string(),
                query: query.to_string(),
            }),
        }
    }

    fn push(&self, route: &str) {
        let (path, query) = route.split_once('?').unwrap_or((route, ""));
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Location {
                path: path.to_string(),
                query: query.to_string(),
            });
    }
}
