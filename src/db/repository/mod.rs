//! Repository layer: entity-scoped database operations, one sub-module per table.

mod funnel;
mod offer;
mod offer_context;
mod offer_file;
mod sales_report;
mod user;
mod workspace;

pub use funnel::*;
pub use offer::*;
pub use offer_context::*;
pub use offer_file::*;
pub use sales_report::*;
pub use user::*;
pub use workspace::*;
