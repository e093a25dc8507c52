pub mod export;
pub mod extract;
pub mod history;
pub mod version;
