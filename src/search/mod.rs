//! Query parameters, the pagination state machine and the fetch worker.

pub mod controller;
pub mod fetcher;
pub mod params;

pub use controller::{FetchOutcome, FetchRequest, FetchResult, SearchController, SearchState};
pub use fetcher::Fetcher;
pub use params::{Category, SearchParams, SortMode, PAGE_SIZE};
