pub mod api_client;
pub mod config;
pub mod debouncer;
pub mod history;
pub mod logging;
pub mod search;
pub mod table_display;
pub mod ui;
