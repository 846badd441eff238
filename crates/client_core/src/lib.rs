use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::TemplateName,
    error::{ApiError, ErrorCode},
    protocol::{
        remote_error_reason, CatalogEntry, IndexTemplatesResponse, NamedTemplate,
        TemplateDefinition,
    },
    query::CatalogFilter,
};
use tracing::{debug, warn};
use url::Url;

pub mod association;
pub use association::{AssociationCache, AssociationMap};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Remote operations the template views depend on. Every failure carries the
/// cluster's own error text.
#[async_trait]
pub trait TemplateService: Send + Sync {
    async fn list_templates_catalog(
        &self,
        filter: &CatalogFilter,
    ) -> Result<Vec<CatalogEntry>, ApiError>;
    async fn get_template_details(&self) -> Result<Vec<NamedTemplate>, ApiError>;
    async fn get_template_definition(
        &self,
        name: &TemplateName,
    ) -> Result<TemplateDefinition, ApiError>;
    async fn replace_template_definition(
        &self,
        name: &TemplateName,
        definition: &TemplateDefinition,
    ) -> Result<(), ApiError>;
}

#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub cluster_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub request_timeout: Duration,
}

impl ClientOptions {
    pub fn new(cluster_url: impl Into<String>) -> Self {
        Self {
            cluster_url: cluster_url.into(),
            username: None,
            password: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// `TemplateService` over the cluster's REST API.
pub struct TemplateClient {
    http: Client,
    base_url: Url,
    username: Option<String>,
    password: Option<String>,
}

impl TemplateClient {
    pub fn new(options: ClientOptions) -> Result<Self> {
        let mut base_url = Url::parse(&options.cluster_url)
            .with_context(|| format!("invalid cluster url '{}'", options.cluster_url))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = Client::builder()
            .timeout(options.request_timeout)
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            http,
            base_url,
            username: options.username,
            password: options.password,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ApiError::internal(format!("cluster url '{}' cannot be a base", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.http.request(method, url);
        match &self.username {
            Some(username) => builder.basic_auth(username, self.password.as_ref()),
            None => builder,
        }
    }

    async fn fetch_index_templates(&self, pattern: &str) -> Result<Vec<NamedTemplate>, ApiError> {
        let url = self.endpoint(&["_index_template", pattern])?;
        let response = send(self.request(Method::GET, url)).await?;
        let body: IndexTemplatesResponse = decode(response).await?;
        Ok(body.index_templates)
    }
}

async fn send(builder: RequestBuilder) -> Result<Response, ApiError> {
    let response = builder
        .send()
        .await
        .map_err(|err| ApiError::internal(err.to_string()))?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = remote_error_reason(&body).unwrap_or_else(|| status.to_string());
    warn!(status = status.as_u16(), %message, "cluster rejected template request");
    Err(ApiError::new(ErrorCode::from_status(status.as_u16()), message))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    response
        .json::<T>()
        .await
        .map_err(|err| ApiError::internal(format!("malformed cluster response: {err}")))
}

#[async_trait]
impl TemplateService for TemplateClient {
    async fn list_templates_catalog(
        &self,
        filter: &CatalogFilter,
    ) -> Result<Vec<CatalogEntry>, ApiError> {
        let url = self.endpoint(&["_cat", "templates"])?;
        let sort = filter.sort_spec();
        debug!(name = %filter.name_pattern, sort = %sort, "listing template catalog");
        let response = send(self.request(Method::GET, url).query(&[
            ("format", "json"),
            ("name", filter.name_pattern.as_str()),
            ("s", sort.as_str()),
        ]))
        .await?;
        decode(response).await
    }

    async fn get_template_details(&self) -> Result<Vec<NamedTemplate>, ApiError> {
        debug!("fetching all template definitions");
        self.fetch_index_templates("*").await
    }

    async fn get_template_definition(
        &self,
        name: &TemplateName,
    ) -> Result<TemplateDefinition, ApiError> {
        debug!(template = %name, "fetching template definition");
        let templates = self.fetch_index_templates(name.as_str()).await?;
        templates
            .into_iter()
            .find(|item| &item.name == name)
            .map(|item| item.index_template)
            .ok_or_else(|| {
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
        let url = self.endpoint(&["_index_template", name.as_str()])?;
        debug!(
            template = %name,
            components = definition.components().len(),
            "replacing template definition"
        );
        send(self.request(Method::POST, url).json(definition)).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
