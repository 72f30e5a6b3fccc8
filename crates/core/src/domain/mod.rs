pub mod contract;
pub mod series;

pub use series::{DataPoint, Dataset, ForecastPoint, ForecastResult, PointError};
