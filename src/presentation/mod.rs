pub mod app;
pub mod wasm_api;
pub mod widgets;

pub use app::{App, ChartSummary, SentimentChart};
pub use wasm_api::mount_sentiment_chart;
