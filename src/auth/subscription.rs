use std::future::Future;

use tokio::{sync::watch, task::JoinHandle};

use crate::auth::Session;

/// A background listener for session changes.
///
/// The listener stops when [AuthSubscription::unsubscribe] is called or the
/// subscription is dropped.
#[derive(Debug)]
pub struct AuthSubscription {
    task: Option<JoinHandle<()>>,
}

impl AuthSubscription {
    /// Call `on_change` with the current session, then again after every change.
    ///
    /// Must be called from within a tokio runtime.
    pub fn subscribe<F, Fut>(mut receiver: watch::Receiver<Option<Session>>, mut on_change: F) -> Self
    where
        F: FnMut(Option<Session>) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            let session = receiver.borrow_and_update().clone();
            on_change(session).await;

            while receiver.changed().await.is_ok() {
                let session = receiver.borrow_and_update().clone();
                on_change(session).await;
            }

            tracing::debug!("Session channel closed, auth subscription finished");
        });

        Self { task: Some(task) }
    }

    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    pub fn unsubscribe(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for AuthSubscription {
    fn drop(&mut self) {
        self.stop();
    }
}
