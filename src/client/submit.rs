//! Hand-off between a form that produces a result and the dialog shell that
//! delivers it to whoever opened the dialog.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use serde_json::Value;

pub type SubmitHandler = Arc<dyn Fn() -> BoxFuture<'static, Option<Value>> + Send + Sync>;

/// Receives the resolved result of a submit. Errors are logged, never raised.
pub type OnSave = Arc<dyn Fn(Option<Value>) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Wraps an async closure as an [`OnSave`].
pub fn on_save<F, Fut>(callback: F) -> OnSave
where
    F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    Arc::new(move |value| callback(value).boxed())
}

#[derive(Default)]
struct Slots {
    handler: Option<SubmitHandler>,
    result: Option<Value>,
}

#[derive(Clone, Default)]
pub struct DialogSubmitController {
    slots: Arc<Mutex<Slots>>,
    on_save: Option<OnSave>,
    auto_commit_suspended: Arc<AtomicBool>,
}

impl DialogSubmitController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_on_save(on_save: OnSave) -> Self {
        Self {
            on_save: Some(on_save),
            ..Self::default()
        }
    }

    fn slots(&self) -> MutexGuard<'_, Slots> {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replaces any previously registered handler.
    pub fn register_submit<F, Fut>(&self, handler: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Option<Value>> + Send + 'static,
    {
        let handler: SubmitHandler = Arc::new(move || handler().boxed());
        self.slots().handler = Some(handler);
    }

    pub fn unregister_submit(&self) {
        self.slots().handler = None;
    }

    pub fn has_handler(&self) -> bool {
        self.slots().handler.is_some()
    }

    pub fn set_result(&self, value: Value) {
        self.slots().result = Some(value);
    }

    pub fn clear_result(&self) {
        self.slots().result = None;
    }

    pub fn get_result(&self) -> Option<Value> {
        self.slots().result.clone()
    }

    /// Runs the registered handler (if any), falls back to the result slot
    /// when it yields nothing, and forwards the outcome to `on_save` once.
    pub async fn trigger_submit(&self) -> Option<Value> {
        let handler = self.slots().handler.clone();
        let produced = match handler {
            Some(handler) => handler().await,
            None => None,
        };
        let resolved = produced.or_else(|| self.get_result());

        if let Some(on_save) = &self.on_save {
            deliver(on_save, resolved.clone()).await;
        }
        resolved
    }

    /// Marks inline editors as not allowed to commit on blur until the guard
    /// is dropped. Guards nest; each restores the value it found.
    pub fn suspend_auto_commit(&self) -> AutoCommitGuard {
        let previous = self.auto_commit_suspended.swap(true, Ordering::SeqCst);
        AutoCommitGuard {
            flag: Arc::clone(&self.auto_commit_suspended),
            previous,
        }
    }

    pub fn auto_commit_suspended(&self) -> bool {
        self.auto_commit_suspended.load(Ordering::SeqCst)
    }
}

pub struct AutoCommitGuard {
    flag: Arc<AtomicBool>,
    previous: bool,
}

impl Drop for AutoCommitGuard {
    fn drop(&mut self) {
        self.flag.store(self.previous, Ordering::SeqCst);
    }
}

async fn deliver(on_save: &OnSave, value: Option<Value>) {
    if let Err(err) = on_save(value).await {
        tracing::warn!(error = %err, "on_save callback failed after a successful submit");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    fn recording_on_save() -> (OnSave, Arc<Mutex<Vec<Option<Value>>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&calls);
        let callback = on_save(move |value| {
            let sink = Arc::clone(&sink);
            async move {
                sink.lock().unwrap().push(value);
                Ok(())
            }
        });
        (callback, calls)
    }

    #[tokio::test]
    async fn falls_back_to_result_slot_without_handler() {
        let (callback, calls) = recording_on_save();
        let controller = DialogSubmitController::with_on_save(callback);
        controller.set_result(json!({ "id": "p-1" }));

        let resolved = controller.trigger_submit().await;

        assert_eq!(resolved, Some(json!({ "id": "p-1" })));
        assert_eq!(*calls.lock().unwrap(), vec![Some(json!({ "id": "p-1" }))]);
    }

    #[tokio::test]
    async fn empty_controller_forwards_nothing_once() {
        let (callback, calls) = recording_on_save();
        let controller = DialogSubmitController::with_on_save(callback);

        assert_eq!(controller.trigger_submit().await, None);
        assert_eq!(*calls.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn handler_result_wins_over_slot() {
        let (callback, calls) = recording_on_save();
        let controller = DialogSubmitController::with_on_save(callback);
        controller.set_result(json!({ "id": "slot" }));
        controller.register_submit(|| async { Some(json!({ "id": "form" })) });

        assert_eq!(controller.trigger_submit().await, Some(json!({ "id": "form" })));
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn handler_yielding_nothing_uses_slot() {
        let controller = DialogSubmitController::new();
        controller.set_result(json!({ "id": "slot" }));
        controller.register_submit(|| async { None });

        assert_eq!(controller.trigger_submit().await, Some(json!({ "id": "slot" })));
    }

    #[tokio::test]
    async fn last_registration_wins() {
        let first = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&first);
        let controller = DialogSubmitController::new();
        controller.register_submit(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Some(json!(1)) }
        });
        controller.register_submit(|| async { Some(json!(2)) });

        assert_eq!(controller.trigger_submit().await, Some(json!(2)));
        assert_eq!(first.load(Ordering::SeqCst), 0);

        controller.unregister_submit();
        assert!(!controller.has_handler());
        assert_eq!(controller.trigger_submit().await, None);
    }

    #[tokio::test]
    async fn on_save_errors_are_swallowed() {
        let controller = DialogSubmitController::with_on_save(on_save(|_| async {
            Err(anyhow::anyhow!("outer form exploded"))
        }));
        controller.set_result(json!({ "id": "eq-1" }));

        assert_eq!(controller.trigger_submit().await, Some(json!({ "id": "eq-1" })));
    }

    #[test]
    fn auto_commit_guard_restores_previous_value() {
        let controller = DialogSubmitController::new();
        assert!(!controller.auto_commit_suspended());
        {
            let _outer = controller.suspend_auto_commit();
            {
                let _inner = controller.suspend_auto_commit();
                assert!(controller.auto_commit_suspended());
            }
            assert!(controller.auto_commit_suspended());
        }
        assert!(!controller.auto_commit_suspended());
    }
}
