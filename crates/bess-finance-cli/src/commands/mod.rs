pub mod model;
pub mod optimizer;
pub mod portfolio;
pub mod presets;
pub mod sensitivity;
