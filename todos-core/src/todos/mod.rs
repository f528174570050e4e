pub mod model;
pub mod requests;
pub mod status;

pub use model::{NewTodo, Todo, TodoChanges};
pub use requests::{CreateTodoRequest, UpdateTodoRequest};
pub use status::TodoStatus;
