pub mod command;
pub mod scene;
