use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::{ComponentName, TemplateName, TemplateType};

/// One row of the lightweight template catalog (`_cat/templates`). Every column
/// arrives as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: TemplateName,
    #[serde(default)]
    pub index_patterns: String,
    #[serde(default)]
    pub order: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub composed_of: Option<String>,
}

impl CatalogEntry {
    /// Legacy templates report no composition column at all, or an empty one.
    pub fn has_composition(&self) -> bool {
        self.composed_of
            .as_deref()
            .is_some_and(|raw| !raw.trim().is_empty())
    }
}

/// Full remote definition of a composable index template.
///
/// Fields this client does not model are kept in `extra` so that a whole-document
/// replace writes them back untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateDefinition {
    #[serde(default)]
    pub index_patterns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub composed_of: Option<Vec<ComponentName>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_stream: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TemplateDefinition {
    pub fn components(&self) -> &[ComponentName] {
        self.composed_of.as_deref().unwrap_or_default()
    }

    pub fn template_type(&self) -> TemplateType {
        match &self.data_stream {
            Some(Value::Object(_)) => TemplateType::DataStreams,
            _ => TemplateType::Indexes,
        }
    }

    /// Copy of this definition with `component` dropped from `composed_of`. The
    /// order of the remaining components is preserved; a missing component leaves
    /// the list as it was.
    pub fn without_component(&self, component: &ComponentName) -> Self {
        let composed_of = self
            .components()
            .iter()
            .filter(|item| *item != component)
            .cloned()
            .collect();
        Self {
            composed_of: Some(composed_of),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedTemplate {
    pub name: TemplateName,
    pub index_template: TemplateDefinition,
}

/// Envelope of `GET _index_template/...`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexTemplatesResponse {
    #[serde(default)]
    pub index_templates: Vec<NamedTemplate>,
}

#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    error: RemoteErrorDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RemoteErrorDetail {
    Structured { reason: String },
    Plain(String),
}

/// Pulls `error.reason` (or a plain `error` string) out of a cluster error body.
pub fn remote_error_reason(body: &str) -> Option<String> {
    let parsed: RemoteErrorBody = serde_json::from_str(body).ok()?;
    match parsed.error {
        RemoteErrorDetail::Structured { reason } => Some(reason),
        RemoteErrorDetail::Plain(text) => Some(text),
    }
}
