pub mod error;
pub mod filter;
pub mod influxql;
pub mod store;

pub use error::StoreError;
pub use filter::Filter;
pub use influxql::{AggregationQuery, Reducer, RowQuery, Statement, TimeOrder};
pub use store::TimeSeriesStore;
