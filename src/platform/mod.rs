pub mod descriptor;
pub mod detector;
pub mod registry;
