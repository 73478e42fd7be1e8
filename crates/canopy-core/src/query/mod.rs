//! Read-side input validation: where-filters, ordering, grouping, and
//! aggregation.

pub mod aggregate;
pub mod order_by;
pub mod scalar_filter;
pub mod where_builder;

pub use aggregate::{AggregateSelectValidator, AggregateSpec, GroupByValidator};
pub use order_by::OrderByValidator;
pub use scalar_filter::validate_scalar_filter;
pub use where_builder::WhereValidator;
