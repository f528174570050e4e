pub mod todos;
pub mod tokens;
pub mod users;

pub use todos::TodoService;
pub use tokens::TokenService;
pub use users::UserService;
