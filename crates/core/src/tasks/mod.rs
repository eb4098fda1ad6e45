pub mod manager;
pub mod task;

pub use manager::AsyncTaskManager;
pub use task::{AsyncTask, TaskReport, TaskStatus};
