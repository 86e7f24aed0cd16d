#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`facet`]: Distinct-value facet derivation in encounter order
//! - [`filter`]: Filter form, query-parameter mapping, and the predicate engine
//! - [`store`]: `ExecutionHistory` store (filtered view, execution days, replay, campaign link)
//! - [`sync`]: Debounced bidirectional filter/query-parameter synchronizer
//!
//! # Data Flow
//!
//! ```text
//! Execution[] --replace()--> ExecutionHistory --Facets::derive()--> option sets
//!                                  |
//!      URL params --navigate()--> FilterSync --watch--> ExecutionFilter
//!                                  |                          |
//!                      debounce -> to_query_params()    filtered() -> Vec<&Execution>
//! ```

pub mod facet;
pub mod filter;
pub mod store;
pub mod sync;

// --- Public API Re-exports ---

pub use facet::Facets;
pub use filter::matcher::{DisplayZone, ExecutionMatcher};
pub use filter::query::{QueryParams, format_date, from_query_params, parse_date, to_query_params};
pub use filter::{ExecutionFilter, FilterDate, SelectOption};
pub use store::{ExecutionHistory, ReplayRequest};
pub use sync::{FilterSync, SyncOptions, SyncStopped};
