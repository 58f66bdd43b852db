pub mod charts;
pub mod controls;
pub mod datatable;
pub mod filters;
pub mod insights;
