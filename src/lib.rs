pub mod app;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod report;
pub mod sheet;
pub mod state;
pub mod stats;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use report::{GeminiClient, ReportGenerator};
pub use sheet::{RecordStore, SheetClient};
pub use state::AppState;
