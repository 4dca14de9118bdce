//! SQL aggregation clauses to Elasticsearch aggregation DSL
//!
//! This crate compiles the aggregate-function list of a SELECT clause plus
//! its GROUP BY items into the nested `aggregations` tree Elasticsearch
//! expects, consuming sqlparser-rs ASTs as input.
//!
//! Plain GROUP BY columns become `terms` buckets, `date_histogram` and
//! `range` calls become their bucket types, and aggregate functions
//! (`count`, `min`, `max`, `avg`, ...) become metric leaves nested at the
//! innermost level. The first GROUP BY item is the outermost bucket.
//!
//! # Example
//!
//! ```ignore
//! use esaggs::{AggTranslator, SqlParser};
//!
//! let select = SqlParser::parse_select(
//!     "SELECT count(*), avg(price) FROM products GROUP BY category",
//! )?;
//! let tree = AggTranslator::new().translate_select(&select)?;
//! println!("{}", tree.to_json());
//! ```

mod buckets;
mod error;
mod metrics;
mod node;
mod parser;
mod translator;

pub use error::{AggError, Result};
pub use metrics::{compile_metrics, extract_aggregate_calls, AggregateCall, COUNT_ALL_FIELD};
pub use node::{AggNode, AggTree, BucketParams, RangeBound};
pub use parser::SqlParser;
pub use translator::{AggConfig, AggTranslator};
