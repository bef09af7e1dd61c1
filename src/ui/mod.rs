pub mod results_view;
pub mod tui;

pub use tui::run_tui;
