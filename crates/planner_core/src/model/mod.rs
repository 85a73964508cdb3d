mod task;

pub use task::{Task, TaskChanges};
