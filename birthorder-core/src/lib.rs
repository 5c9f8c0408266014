//! birthorder-core: submission model, validation, aggregation and CSV export.
//!
//! Nothing here touches storage or HTTP; the server crate drives these
//! functions from whichever store backend is configured.

pub mod error;
pub mod export;
pub mod statistics;
pub mod submission;
pub mod validation;

pub use error::{ExportError, ValidationError};
pub use export::{export_csv, export_rows, Cell, ExportRow, FieldLayout};
pub use statistics::{
    compute_statistics, recombine, GenderDistribution, GroupAggregate, RegionCount, Statistics,
    StatisticsOutcome,
};
pub use submission::{AgeRange, Gender, NewSubmission, Region, RequestContext, Submission};
pub use validation::validate;
