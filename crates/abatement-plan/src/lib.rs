mod cache;
mod catalog;
mod plan;
mod report;

#[cfg(feature = "wasm")]
mod wasm;

pub use cache::{ProblemKey, SolveCache};
pub use catalog::{COST_COLUMN, Catalog, CatalogError, NAME_COLUMN, Project, Target};
pub use plan::{Plan, Selection};
pub use report::{IMPLEMENTED_THRESHOLD, NamedShortfall, Report, ReportRow, render_tableau, render_trace};
