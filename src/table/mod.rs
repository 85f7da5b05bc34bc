//! Hierarchical summary tables
//!
//! - **hierarchy**: the L1/L2/L3 row tree and its configuration format
//! - **builder**: resampling, row ordering and the two time axes
//! - **style**: row and column styling of the rendered table

pub mod builder;
pub mod hierarchy;
pub mod style;

pub use builder::{build_table, HierarchicalTable};
pub use hierarchy::{Hierarchy, HierarchyNode, Level};
pub use style::{column_styles, header_style, row_styles};
