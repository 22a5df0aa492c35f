pub mod args;
pub mod component;
pub mod plan;
pub mod settings;
pub mod workspace;
