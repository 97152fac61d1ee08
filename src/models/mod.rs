pub mod dashboard;
pub mod goal;
pub mod progress;
pub mod resource;
pub mod workspace;
