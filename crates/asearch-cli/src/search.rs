//! One-shot `search` command.

use asearch_client::{FetchOrchestrator, SearchClient, SearchOutcome};
use asearch_core::{
    AppConfig, FieldId, PageRequest, PreferenceStore, Region, SortDirection, SortState, ViewState,
};

use crate::render;

/// View settings for a one-shot search, as given on the command line.
#[derive(Debug)]
pub(crate) struct SearchOptions {
    pub region: Option<String>,
    pub filter: String,
    pub sort: FieldId,
    pub descending: bool,
    pub page: usize,
    pub page_size: usize,
    pub json: bool,
}

impl SearchOptions {
    fn view(&self) -> ViewState {
        ViewState {
            filter_text: self.filter.clone(),
            sort: SortState {
                field: self.sort,
                direction: if self.descending {
                    SortDirection::Descending
                } else {
                    SortDirection::Ascending
                },
            },
            page: PageRequest {
                index: self.page,
                size: self.page_size,
            },
        }
    }
}

/// Picks the region for this search: an explicit `--region` wins, otherwise
/// the saved preference. An explicit code that is not in the catalog is still
/// passed through to the API.
pub(crate) fn effective_region(
    config: &AppConfig,
    preferences: &impl PreferenceStore,
    requested: Option<&str>,
) -> Region {
    match requested {
        Some(code) => config.regions.resolve(&code.trim().into()),
        None => preferences.get(),
    }
}

/// Runs one search and prints the requested page.
///
/// A blank query prints a notice and does not contact the backend. A failed
/// search is reported as a notice rather than an error exit, matching what
/// the interactive shell shows.
///
/// # Errors
///
/// Returns an error if the client cannot be built or JSON output fails to
/// serialize.
pub(crate) async fn run_search(
    config: &AppConfig,
    preferences: &impl PreferenceStore,
    query: &str,
    options: &SearchOptions,
) -> anyhow::Result<()> {
    let client = SearchClient::from_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build search client: {e}"))?;
    let region = effective_region(config, preferences, options.region.as_deref());

    let mut orchestrator = FetchOrchestrator::new();
    if orchestrator.search(&client, query, &region.value).await == SearchOutcome::NoQuery {
        println!("nothing to search: the query is blank");
        return Ok(());
    }

    let view = options.view();
    if options.json {
        let page = view.render(orchestrator.results());
        println!("{}", serde_json::to_string_pretty(&page.rows)?);
        if let Some(error) = orchestrator.last_error() {
            eprintln!("search failed: {error}");
        }
        return Ok(());
    }

    let links = render::LinkStyle::for_stdout();
    println!("Results for \"{}\" in {region}", query.trim());
    print!("{}", render::render_view(&orchestrator, &view, links));
    Ok(())
}
