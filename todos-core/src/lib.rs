pub mod pagination;
pub mod settings;
pub mod todos;
pub mod utils;
pub mod validation;
