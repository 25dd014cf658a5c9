use crate::domain::errors::ChartResult;
use crate::domain::market_data::{ChartData, ChartQuery, Resolution};
use futures::future::LocalBoxFuture;

/// Source of price and sentiment series for a query.
///
/// Futures are `!Send`: everything runs on the UI thread.
pub trait ChartDataSource {
    fn fetch(&self, query: ChartQuery) -> LocalBoxFuture<'static, ChartResult<ChartData>>;
}

/// Session-scoped storage for the user's chosen resolution.
///
/// `load` never fails: missing or unrecognized values are `None`.
pub trait ResolutionPreference {
    fn load(&self) -> Option<Resolution>;
    fn save(&self, resolution: Resolution);
}
