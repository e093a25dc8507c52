pub mod errors;
pub mod loader;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod prompt_template;
pub mod providers;
pub mod settings;
pub mod store;
