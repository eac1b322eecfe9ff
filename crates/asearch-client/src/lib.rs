pub mod client;
pub mod error;
pub mod orchestrator;
mod retry;

pub use client::SearchClient;
pub use error::ClientError;
pub use orchestrator::{
    FetchOrchestrator, FetchState, SearchBackend, SearchOutcome, SearchTicket, Settlement,
};
