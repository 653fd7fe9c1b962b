//! Deletion of selected report items.

mod category_cleaning;
mod path_precheck;
mod single_deletion;

pub use category_cleaning::{CleanExecutor, CleanSummary};
pub use single_deletion::{delete_with_precheck, drop_path, DeleteOutcome};
