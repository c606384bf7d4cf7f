pub mod constants;
pub mod context;
pub mod headless;
