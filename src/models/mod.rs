pub mod analysis;
pub mod enums;
pub mod funnel;
pub mod offer;
pub mod offer_context;
pub mod offer_file;
pub mod sales_report;
pub mod user;
pub mod workspace;

pub use analysis::*;
pub use funnel::*;
pub use offer::*;
pub use offer_context::*;
pub use offer_file::*;
pub use sales_report::*;
pub use user::*;
pub use workspace::*;
