pub mod task;

pub use task::{CreateTaskRequest, Task, TaskPatch};
