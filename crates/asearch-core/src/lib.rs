//! Result-processing pipeline shared by the ASearch front ends.
//!
//! Raw records from `/api/search` flow through [`derive`] into
//! [`DisplayResult`]s, which the [`collection`] engine filters, sorts and
//! paginates for display. Region selection is persisted through a
//! [`PreferenceStore`].

pub mod app_config;
pub mod collection;
pub mod columns;
pub mod config;
pub mod derive;
pub mod error;
pub mod preferences;
pub mod query;
pub mod regions;
pub mod types;

pub use app_config::{AppConfig, Environment};
pub use collection::{
    match_count_label, paginate, project, FieldId, Page, PageRequest, Projection, SortDirection,
    SortState, ViewState,
};
pub use columns::{Column, ColumnId, COLUMNS};
pub use config::{load_app_config, load_app_config_from_env};
pub use derive::{derive, derive_values, parse_price, Derived, RejectedRecord};
pub use error::{ConfigError, PreferenceError};
pub use preferences::{JsonFilePreferences, MemoryPreferences, PreferenceStore, PREFERENCE_KEY};
pub use query::{build_query, RequestDescriptor, SearchQuery, PING_PATH, SEARCH_PATH};
pub use regions::{load_regions, RegionCatalog};
pub use types::{DisplayResult, RawResult, Region, RegionCode};
