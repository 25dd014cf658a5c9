pub mod animation;
pub mod chart;
pub mod errors;
pub mod interaction;
pub mod logging;
pub mod market_data;
pub mod sentiment;
