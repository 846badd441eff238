use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{AssociationCache, TemplateClient, TemplateService};
use controller::{
    association_modal::DEFAULT_MODAL_PAGE_SIZE, navigation::TEMPLATES_ROUTE, Anchor,
    AssociationModal, LoadOutcome, MemoryNavigator, Notifier, TemplateListController, UiError,
    UnlinkOutcome,
};
use shared::{
    domain::{SortDirection, SortField},
    error::{ApiError, ApiException},
    query::ListQuery,
};
use tokio::io::{stdin, AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::load_settings;

#[derive(Parser, Debug)]
#[command(name = "template-console", about = "Browse index templates and unlink component templates")]
struct Args {
    #[arg(long)]
    cluster_url: Option<String>,
    #[arg(long)]
    username: Option<String>,
    #[arg(long)]
    password: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List composable index templates.
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, value_parser = parse_sort_field)]
        sort_field: Option<SortField>,
        #[arg(long, value_parser = parse_sort_direction)]
        sort_direction: Option<SortDirection>,
        #[arg(long)]
        page: Option<usize>,
        #[arg(long)]
        size: Option<usize>,
        /// Restore a view from a shared query string; flags still override it.
        #[arg(long)]
        query: Option<String>,
    },
    /// Show the component templates an index template is composed of.
    Components {
        template: String,
        #[arg(long, default_value_t = 0)]
        page: usize,
    },
    /// Show the index templates that reference a component template.
    Templates {
        component: String,
        #[arg(long, default_value_t = 0)]
        page: usize,
    },
    /// Remove a component template from an index template's composition.
    Unlink {
        #[arg(long)]
        component: String,
        #[arg(long)]
        template: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

fn parse_sort_field(raw: &str) -> Result<SortField, String> {
    SortField::parse(raw).ok_or_else(|| format!("unknown sort field '{raw}'"))
}

fn parse_sort_direction(raw: &str) -> Result<SortDirection, String> {
    SortDirection::parse(raw).ok_or_else(|| format!("unknown sort direction '{raw}'"))
}

fn remote_failure(err: ApiError, what: &'static str) -> anyhow::Error {
    anyhow::Error::new(ApiException::from(err)).context(what)
}

/// Opens the modal, prints the requested page and fails if the associations could not
/// be loaded.
async fn show_associations(mut modal: AssociationModal, page: usize) -> Result<()> {
    modal.open().await;
    if let Some(err) = modal.load_error() {
        return Err(remote_failure(err.clone(), "failed to load associations"));
    }
    modal.set_page(page, DEFAULT_MODAL_PAGE_SIZE);
    print!("{}", render::association_list(&modal));
    Ok(())
}

struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify_success(&self, message: &str) {
        info!(%message, "success");
        println!("{message}");
    }

    fn notify_error(&self, error: &UiError) {
        error!(
            context = ?error.context(),
            category = ?error.category(),
            message = error.message(),
            "operation failed"
        );
        eprintln!("error: {}", error.message());
        if error.requires_reauth() {
            eprintln!("check the configured cluster credentials and retry");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings()?;
    if let Some(url) = args.cluster_url {
        settings.cluster_url = url;
    }
    if let Some(username) = args.username {
        settings.username = Some(username);
    }
    if let Some(password) = args.password {
        settings.password = Some(password);
    }

    let service: Arc<dyn TemplateService> = Arc::new(
        TemplateClient::new(settings.client_options()).context("failed to create cluster client")?,
    );
    let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier);

    match args.command {
        Command::List {
            search,
            sort_field,
            sort_direction,
            page,
            size,
            query,
        } => {
            let mut view = match query {
                Some(raw) => ListQuery::from_query_string(&raw),
                None => ListQuery {
                    size: settings.page_size,
                    ..Default::default()
                },
            };
            if let Some(search) = search {
                view.search = search;
            }
            if let Some(field) = sort_field {
                view.sort_field = field;
            }
            if let Some(direction) = sort_direction {
                view.sort_direction = direction;
            }
            if let Some(page) = page {
                view.from = page;
            }
            if let Some(size) = size.filter(|size| *size > 0) {
                view.size = size;
            }

            let navigator = Arc::new(MemoryNavigator::new(
                TEMPLATES_ROUTE,
                view.to_query_string(),
            ));
            let mut list = TemplateListController::new(service, notifier, navigator.clone())
                .with_debounce(settings.debounce());
            let outcome = list.mount().await;
            print!("{}", render::template_table(&list));
            println!("link: {}", navigator.location().href());
            if let LoadOutcome::Failed(err) = outcome {
                return Err(remote_failure(err, "failed to load templates"));
            }
        }
        Command::Components { template, page } => {
            let modal = AssociationModal::new(
                Anchor::Template(template.into()),
                service,
                notifier,
                AssociationCache::new(),
            );
            show_associations(modal, page).await?;
        }
        Command::Templates { component, page } => {
            let modal = AssociationModal::new(
                Anchor::Component(component.into()),
                service,
                notifier,
                AssociationCache::new(),
            );
            show_associations(modal, page).await?;
        }
        Command::Unlink {
            component,
            template,
            yes,
        } => {
            let mut modal = AssociationModal::new(
                Anchor::Component(component.into()),
                service,
                notifier,
                AssociationCache::new(),
            )
            .with_on_unlink(|template| info!(%template, "template composition changed"));
            modal.open().await;
            if let Some(err) = modal.load_error() {
                return Err(remote_failure(err.clone(), "failed to load associations"));
            }

            let dialog = modal.request_unlink(&template)?;
            print!("{}", render::confirm_dialog(&dialog));
            if !yes && !prompt_confirm(dialog.confirm_label).await? {
                modal.cancel();
                println!("Cancelled.");
                return Ok(());
            }
            if let UnlinkOutcome::Failed(err) = modal.confirm().await? {
                return Err(remote_failure(err, "unlink failed"));
            }
        }
    }

    Ok(())
}

async fn prompt_confirm(label: &str) -> Result<bool> {
    println!("{label}? [y/N]");
    let mut answer = String::new();
    BufReader::new(stdin())
        .read_line(&mut answer)
        .await
        .context("failed to read confirmation")?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
