use crate::errors::CoreError;
use crate::tasks::{AsyncTask, TaskReport, TaskStatus};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use uuid::Uuid;

/// Runs a batch of independent tasks concurrently on the caller's task.
///
/// Tasks are added while idle and started once. The manager never returns to
/// idle: a second `start` or any later `add_task` is rejected.
pub struct AsyncTaskManager<'a, T> {
    tasks: Vec<AsyncTask<'a, T>>,
    running: bool,
    completed: usize,
}

impl<'a, T: Send + 'a> AsyncTaskManager<'a, T> {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            running: false,
            completed: 0,
        }
    }

    pub fn add_task<F>(
        &mut self,
        label: impl Into<String>,
        future: BoxFuture<'a, Result<T, CoreError>>,
        on_result: F,
    ) -> Result<Uuid, CoreError>
    where
        F: FnOnce(T) -> Result<(), CoreError> + Send + 'a,
    {
        if self.running {
            return Err(CoreError::AsyncTaskAlreadyRunning);
        }
        let task = AsyncTask::new(label.into(), future, Box::new(on_result));
        let id = task.id();
        self.tasks.push(task);
        Ok(id)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Launch every task and drive them to completion.
    ///
    /// `on_all_complete` fires once, after every task completed. On the first
    /// failure `on_any_failure` fires, the tasks still in flight are dropped
    /// and marked cancelled, and `AsyncTaskRunningFailed` is returned.
    pub async fn start<C, E>(&mut self, on_all_complete: C, on_any_failure: E) -> Result<(), CoreError>
    where
        C: FnOnce(),
        E: FnOnce(&CoreError),
    {
        if self.running {
            return Err(CoreError::AsyncTaskAlreadyRunning);
        }
        self.running = true;

        let total = self.tasks.len();
        tracing::info!("Starting {} async tasks", total);

        let mut in_flight = FuturesUnordered::new();
        for (index, task) in self.tasks.iter_mut().enumerate() {
            if let Some(future) = task.take_future() {
                task.mark_running();
                in_flight.push(async move { (index, future.await) });
            }
        }

        if total == 0 {
            on_all_complete();
            return Ok(());
        }

        let mut on_all_complete = Some(on_all_complete);
        let mut failure = None;
        while let Some((index, outcome)) = in_flight.next().await {
            let task = &mut self.tasks[index];
            let outcome = outcome.and_then(|value| task.deliver(value));

            match outcome {
                Ok(()) => {
                    task.finish(TaskStatus::Completed, None);
                    self.completed += 1;
                    tracing::debug!(
                        "Task {} completed ({}/{})",
                        task.label(),
                        self.completed,
                        total
                    );
                    if self.completed == total {
                        if let Some(callback) = on_all_complete.take() {
                            callback();
                        }
                    }
                }
                Err(error) => {
                    task.finish(TaskStatus::Failed, Some(error.to_string()));
                    let label = task.label().to_string();
                    tracing::error!("Task {} failed: {}", label, error);
                    failure = Some((label, error));
                    break;
                }
            }
        }
        drop(in_flight);

        match failure {
            Some((label, error)) => {
                on_any_failure(&error);
                self.cancel_in_flight();
                Err(CoreError::task_failed(label, error.to_string()))
            }
            None => Ok(()),
        }
    }

    fn cancel_in_flight(&mut self) {
        for task in self
            .tasks
            .iter_mut()
            .filter(|task| task.status() == TaskStatus::Running)
        {
            tracing::warn!("Cancelling task {}", task.label());
            task.finish(TaskStatus::Cancelled, None);
        }
    }

    pub fn completed_count(&self) -> usize {
        self.completed
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task_reports(&self) -> Vec<TaskReport> {
        self.tasks.iter().map(AsyncTask::report).collect()
    }
}

impl<'a, T: Send + 'a> Default for AsyncTaskManager<'a, T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn delayed(value: u32, millis: u64) -> BoxFuture<'static, Result<u32, CoreError>> {
        async move {
            tokio::time::sleep(Duration::from_millis(millis)).await;
            Ok(value)
        }
        .boxed()
    }

    #[tokio::test]
    async fn test_all_complete_fires_once_in_any_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let fired = AtomicUsize::new(0);
        let mut manager = AsyncTaskManager::new();

        for (value, millis) in [(1, 30), (2, 5), (3, 15)] {
            let seen = Arc::clone(&seen);
            manager
                .add_task(format!("task-{}", value), delayed(value, millis), move |v| {
                    seen.lock().unwrap().push(v);
                    Ok(())
                })
                .unwrap();
        }

        manager
            .start(|| {
                fired.fetch_add(1, Ordering::SeqCst);
            }, |_| panic!("no task should fail"))
            .await
            .unwrap();

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(*seen.lock().unwrap(), vec![2, 3, 1]);
        assert_eq!(manager.completed_count(), 3);
        assert!(manager
            .task_reports()
            .iter()
            .all(|r| r.status == TaskStatus::Completed && r.duration.is_some()));
    }

    #[tokio::test]
    async fn test_start_and_add_rejected_once_running() {
        let mut manager: AsyncTaskManager<'_, u32> = AsyncTaskManager::new();
        manager.add_task("one", delayed(1, 1), |_| Ok(())).unwrap();
        manager.start(|| {}, |_| {}).await.unwrap();

        assert!(manager.is_running());
        assert!(matches!(
            manager.start(|| {}, |_| {}).await,
            Err(CoreError::AsyncTaskAlreadyRunning)
        ));
        assert!(matches!(
            manager.add_task("two", delayed(2, 1), |_| Ok(())),
            Err(CoreError::AsyncTaskAlreadyRunning)
        ));
    }

    #[tokio::test]
    async fn test_first_failure_cancels_siblings() {
        let failures = AtomicUsize::new(0);
        let completed = AtomicUsize::new(0);
        let mut manager = AsyncTaskManager::new();

        manager.add_task("fast", delayed(1, 1), |_| Ok(())).unwrap();
        manager
            .add_task(
                "broken",
                async {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Err(CoreError::configuration("boom"))
                }
                .boxed(),
                |_: u32| Ok(()),
            )
            .unwrap();
        manager.add_task("slow", delayed(3, 500), |_| Ok(())).unwrap();

        let result = manager
            .start(
                || {
                    completed.fetch_add(1, Ordering::SeqCst);
                },
                |_| {
                    failures.fetch_add(1, Ordering::SeqCst);
                },
            )
            .await;

        match result {
            Err(CoreError::AsyncTaskRunningFailed { task, .. }) => assert_eq!(task, "broken"),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(failures.load(Ordering::SeqCst), 1);
        assert_eq!(completed.load(Ordering::SeqCst), 0);

        let statuses: Vec<_> = manager.task_reports().iter().map(|r| r.status).collect();
        assert_eq!(
            statuses,
            vec![TaskStatus::Completed, TaskStatus::Failed, TaskStatus::Cancelled]
        );
    }

    #[tokio::test]
    async fn test_callback_error_fails_the_task() {
        let mut manager = AsyncTaskManager::new();
        manager
            .add_task("dup", delayed(1, 1), |_| Err(CoreError::duplicate_definition("A")))
            .unwrap();
        let err = manager.start(|| {}, |_| {}).await.unwrap_err();
        assert!(err.is_batch());
        assert_eq!(manager.task_reports()[0].status, TaskStatus::Failed);
    }

    #[tokio::test]
    async fn test_empty_batch_completes_immediately() {
        let fired = AtomicUsize::new(0);
        let mut manager: AsyncTaskManager<'_, ()> = AsyncTaskManager::new();
        manager
            .start(|| {
                fired.fetch_add(1, Ordering::SeqCst);
            }, |_| {})
            .await
            .unwrap();
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
