//! Interactive search session.
//!
//! Plain lines are searches; lines starting with `:` adjust the view. Input
//! keeps being read while searches are in flight, so a new query can be
//! typed before the previous one returns. Only the newest search is ever
//! displayed.

use std::future::Future;

use asearch_client::{
    ClientError, FetchOrchestrator, SearchBackend, SearchClient, SearchTicket, Settlement,
};
use asearch_core::{
    build_query, AppConfig, FieldId, PageRequest, PreferenceStore, Region, SortDirection,
    ViewState,
};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{region, render};

const HELP: &str = "\
commands:
  <text>                 search for <text> in the current region
  :filter [text]         show only rows containing text (empty clears)
  :sort <field> [asc|desc]
                         sort by rank, description, price, rating or reviews;
                         repeating a field flips its direction
  :page <n> | :next | :prev
                         move between pages
  :region [code]         show regions, or switch and save the region
  :help                  show this help
  :quit                  leave the shell";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ShellCommand {
    Search(String),
    Filter(String),
    Sort(FieldId, Option<SortDirection>),
    Page(usize),
    NextPage,
    PrevPage,
    Region(Option<String>),
    Help,
    Quit,
    Empty,
    Invalid(String),
}

/// Parses one input line.
pub(crate) fn parse_command(line: &str) -> ShellCommand {
    let line = line.trim();
    if line.is_empty() {
        return ShellCommand::Empty;
    }
    let Some(rest) = line.strip_prefix(':') else {
        return ShellCommand::Search(line.to_owned());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name.to_lowercase().as_str() {
        "filter" | "f" => ShellCommand::Filter(arg.to_owned()),
        "sort" | "s" => parse_sort(arg),
        "page" | "p" => match arg.parse::<usize>() {
            Ok(index) if index > 0 => ShellCommand::Page(index),
            _ => ShellCommand::Invalid(format!("expected a page number >= 1, got '{arg}'")),
        },
        "next" | "n" => ShellCommand::NextPage,
        "prev" => ShellCommand::PrevPage,
        "region" | "r" => ShellCommand::Region((!arg.is_empty()).then(|| arg.to_owned())),
        "help" | "h" | "?" => ShellCommand::Help,
        "quit" | "q" | "exit" => ShellCommand::Quit,
        other => ShellCommand::Invalid(format!("unknown command ':{other}'; try :help")),
    }
}

fn parse_sort(arg: &str) -> ShellCommand {
    let mut words = arg.split_whitespace();
    let Some(field) = words.next() else {
        return ShellCommand::Invalid("usage: :sort <field> [asc|desc]".to_owned());
    };
    let field = match field.parse::<FieldId>() {
        Ok(field) => field,
        Err(e) => return ShellCommand::Invalid(e),
    };
    let direction = match words.next().map(str::to_lowercase).as_deref() {
        None => None,
        Some("asc") => Some(SortDirection::Ascending),
        Some("desc") => Some(SortDirection::Descending),
        Some(other) => {
            return ShellCommand::Invalid(format!("expected asc or desc, got '{other}'"));
        }
    };
    ShellCommand::Sort(field, direction)
}

/// Applies a sort command to `view`. Without an explicit direction this is a
/// header click: the same field flips, a new field starts ascending.
pub(crate) fn apply_sort(view: &mut ViewState, field: FieldId, direction: Option<SortDirection>) {
    match direction {
        Some(direction) => {
            view.sort.field = field;
            view.sort.direction = direction;
        }
        None => view.sort.select(field),
    }
    view.page.index = 1;
}

fn fetch<'a>(
    backend: &'a SearchClient,
    ticket: SearchTicket,
) -> impl Future<Output = (SearchTicket, Result<Vec<serde_json::Value>, ClientError>)> + 'a {
    async move {
        let outcome = backend.fetch(ticket.request()).await;
        (ticket, outcome)
    }
}

/// Runs the shell until `:quit` or end of input.
///
/// The backend is pinged once up front; an unreachable backend is reported
/// but does not stop the session.
///
/// On end of input, searches still in flight are awaited and the final one
/// is rendered before returning.
///
/// # Errors
///
/// Returns an error if the client cannot be built or stdin cannot be read.
pub(crate) async fn run_shell(
    config: &AppConfig,
    preferences: &mut impl PreferenceStore,
) -> anyhow::Result<()> {
    let client = SearchClient::from_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build search client: {e}"))?;
    let mut orchestrator = FetchOrchestrator::new();
    let mut view = ViewState::new(config.page_size);
    let links = render::LinkStyle::for_stdout();
    let mut region = preferences.get();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut in_flight = FuturesUnordered::new();

    match client.ping().await {
        Ok(true) => {}
        Ok(false) => println!("warning: {} answered the ping without pong", client.base_url()),
        Err(e) => {
            tracing::warn!(error = %e, "search backend ping failed");
            println!("warning: search backend not reachable at {}", client.base_url());
        }
    }
    println!("asearch shell, region {region}. Type :help for commands.");

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match parse_command(&line) {
                    ShellCommand::Empty => {}
                    ShellCommand::Quit => return Ok(()),
                    ShellCommand::Help => println!("{HELP}"),
                    ShellCommand::Invalid(message) => println!("{message}"),
                    ShellCommand::Search(text) => {
                        if let Some(request) = build_query(&text, &region.value) {
                            view.page = PageRequest::first(view.page.size);
                            let ticket = orchestrator.issue(request);
                            println!("searching for \"{text}\" in {region}...");
                            in_flight.push(fetch(&client, ticket));
                        }
                    }
                    ShellCommand::Filter(text) => {
                        view.filter_text = text;
                        view.page.index = 1;
                        print!("{}", render::render_view(&orchestrator, &view, links));
                    }
                    ShellCommand::Sort(field, direction) => {
                        apply_sort(&mut view, field, direction);
                        print!("{}", render::render_view(&orchestrator, &view, links));
                    }
                    ShellCommand::Page(index) => {
                        view.page.index = index;
                        print!("{}", render::render_view(&orchestrator, &view, links));
                    }
                    ShellCommand::NextPage => {
                        view.page.index = view.render(orchestrator.results()).index + 1;
                        print!("{}", render::render_view(&orchestrator, &view, links));
                    }
                    ShellCommand::PrevPage => {
                        view.page.index = view
                            .render(orchestrator.results())
                            .index
                            .saturating_sub(1)
                            .max(1);
                        print!("{}", render::render_view(&orchestrator, &view, links));
                    }
                    ShellCommand::Region(None) => {
                        region::run_region_list(config, &*preferences);
                    }
                    ShellCommand::Region(Some(code)) => {
                        if let Some(next) = switch_region(config, preferences, &code) {
                            region = next;
                        }
                    }
                }
            }
            Some((ticket, outcome)) = in_flight.next(), if !in_flight.is_empty() => {
                if !matches!(orchestrator.settle(ticket, outcome), Settlement::Stale { .. }) {
                    print!("{}", render::render_view(&orchestrator, &view, links));
                }
            }
        }
    }

    while let Some((ticket, outcome)) = in_flight.next().await {
        if !matches!(orchestrator.settle(ticket, outcome), Settlement::Stale { .. }) {
            print!("{}", render::render_view(&orchestrator, &view, links));
        }
    }
    Ok(())
}

/// Looks `code` up in the catalog and saves it. Problems are printed, not
/// returned, so a typo does not end the session.
fn switch_region(
    config: &AppConfig,
    preferences: &mut impl PreferenceStore,
    code: &str,
) -> Option<Region> {
    let Some(region) = config.regions.find(code).cloned() else {
        println!(
            "unknown region '{code}'; available: {}",
            region::available_codes(config)
        );
        return None;
    };

    if let Err(e) = preferences.set(region.clone()) {
        tracing::warn!(error = %e, "failed to save region preference");
        println!("region switched for this session only: {e}");
    } else {
        println!("region set to {region}");
    }
    Some(region)
}
