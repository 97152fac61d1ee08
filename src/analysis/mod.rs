pub mod stats;
pub mod validation;
pub mod weekly;
