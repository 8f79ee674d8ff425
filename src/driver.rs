use tracing::{debug, info};

use crate::error::{ProcessError, TrackerError};
use crate::process::{ErrorRecord, Process, ResultValue, State};
use crate::store::ProcessStore;
use crate::webhook::{WebhookEndpoints, WebhookNotifier, WebhookTransport};

/// Loads a stored process, failing when it does not exist.
pub fn load_process(
    store: &impl ProcessStore,
    company_id: i64,
    id: &str,
) -> Result<Process, TrackerError> {
    let row = store
        .load(company_id, id)?
        .ok_or_else(|| TrackerError::ProcessNotFound(id.to_string()))?;
    Ok(Process::from_row(row)?)
}

/// Drives one process: applies each operation, persists the new state, then
/// mirrors the change to the webhook notifier when one is attached.
///
/// Persistence happens before notification, so a failed webhook is returned
/// to the caller but never undoes the saved state.
pub struct ProcessDriver<S, T> {
    process: Process,
    store: S,
    notifier: Option<WebhookNotifier<T>>,
}

impl<S: ProcessStore, T: WebhookTransport> ProcessDriver<S, T> {
    pub fn new(process: Process, store: S, notifier: Option<WebhookNotifier<T>>) -> Self {
        Self {
            process,
            store,
            notifier,
        }
    }

    /// Attaches to a process, building a notifier for it when `webhooks` is
    /// given. A process that is already initialized gets a notifier that
    /// assumes its init notification went out.
    pub fn attach(process: Process, store: S, webhooks: Option<(WebhookEndpoints, T)>) -> Self {
        let notifier = webhooks.map(|(endpoints, transport)| {
            if process.is_initialized() {
                WebhookNotifier::resume(process.id(), endpoints, transport)
            } else {
                WebhookNotifier::new(process.id(), endpoints, transport)
            }
        });
        Self::new(process, store, notifier)
    }

    pub fn process(&self) -> &Process {
        &self.process
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> Option<&WebhookNotifier<T>> {
        self.notifier.as_ref()
    }

    /// Persists the current state.
    pub fn save(&self) -> Result<(), TrackerError> {
        self.store.save(&self.process.to_row()?)?;
        debug!(process_id = %self.process.id(), state = %self.process.state(), "process saved");
        Ok(())
    }

    pub async fn initialize(&mut self, expected: Option<u64>) -> Result<(), TrackerError> {
        self.process.initialize(expected)?;
        self.save()?;
        if let Some(notifier) = self.notifier.as_mut() {
            notifier.init_webhook(expected).await?;
        }
        Ok(())
    }

    /// Records `count` handled units and reports them in one notification.
    pub async fn handle(&mut self, count: u64) -> Result<(), TrackerError> {
        if count == 0 {
            return Ok(());
        }
        let reported = delta(count)?;
        self.process.handle_many(count)?;
        self.save()?;
        if let Some(notifier) = &self.notifier {
            notifier.handle_webhook(reported).await?;
        }
        Ok(())
    }

    /// Records `count` skipped units and reports them in one notification.
    pub async fn skip(&mut self, count: u64) -> Result<(), TrackerError> {
        if count == 0 {
            return Ok(());
        }
        let reported = delta(count)?;
        self.process.skip_many(count)?;
        self.save()?;
        if let Some(notifier) = &self.notifier {
            notifier.skip_webhook(reported).await?;
        }
        Ok(())
    }

    /// Records a batch of errors and reports them in one notification.
    pub async fn add_errors(&mut self, errors: Vec<ErrorRecord>) -> Result<(), TrackerError> {
        if errors.is_empty() {
            return Ok(());
        }
        for error in &errors {
            self.process.add_error(error.clone())?;
        }
        self.save()?;
        if let Some(notifier) = &self.notifier {
            notifier.error_webhook(&errors).await?;
        }
        Ok(())
    }

    pub fn set_state(&mut self, state: State) -> Result<(), TrackerError> {
        self.process.set_state(state)?;
        self.save()
    }

    pub fn set_description(&mut self, description: Option<String>) -> Result<(), TrackerError> {
        self.process.set_description(description);
        self.save()
    }

    /// Stops the process abnormally and reports the fatal error and the
    /// failed result. Nothing is sent when the notifier never announced
    /// the process.
    pub async fn terminate(&mut self, error: ErrorRecord) -> Result<(), TrackerError> {
        self.process.terminate(error.clone())?;
        self.save()?;
        if let Some(notifier) = self.notifier.as_ref().filter(|n| n.is_initialized()) {
            notifier.error_webhook(std::slice::from_ref(&error)).await?;
            self.notify_result(notifier).await?;
        } else {
            info!(process_id = %self.process.id(), "terminated without webhook notification");
        }
        Ok(())
    }

    pub async fn finish(&mut self, value: impl Into<ResultValue>) -> Result<(), TrackerError> {
        self.process.finish(value)?;
        self.save()?;
        if let Some(notifier) = &self.notifier {
            self.notify_result(notifier).await?;
        }
        Ok(())
    }

    async fn notify_result(&self, notifier: &WebhookNotifier<T>) -> Result<(), TrackerError> {
        if let Some(result) = self.process.result() {
            notifier.result_webhook(result).await?;
        }
        Ok(())
    }
}

fn delta(count: u64) -> Result<i64, ProcessError> {
    i64::try_from(count)
        .map_err(|_| ProcessError::InvalidArgument(format!("count {count} is too large")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::ProcessResult;
    use crate::store::MemoryStore;
    use crate::webhook::testing::RecordingTransport;
    use serde_json::json;

    fn driver() -> ProcessDriver<MemoryStore, RecordingTransport> {
        ProcessDriver::attach(
            Process::with_id("p-1", 1, 2),
            MemoryStore::new(),
            Some((
                WebhookEndpoints::under("http://hooks"),
                RecordingTransport::default(),
            )),
        )
    }

    fn urls(driver: &ProcessDriver<MemoryStore, RecordingTransport>) -> Vec<String> {
        driver
            .notifier()
            .unwrap()
            .transport()
            .calls()
            .into_iter()
            .map(|c| c.url)
            .collect()
    }

    fn stored(driver: &ProcessDriver<MemoryStore, RecordingTransport>) -> Process {
        load_process(driver.store(), 1, "p-1").unwrap()
    }

    #[tokio::test]
    async fn full_run_saves_and_notifies() {
        let mut d = driver();
        d.initialize(Some(100)).await.unwrap();
        d.handle(2).await.unwrap();
        d.skip(3).await.unwrap();
        d.add_errors(vec![ErrorRecord::with_entity("bad", 5i64)])
            .await
            .unwrap();
        d.finish(true).await.unwrap();

        let p = stored(&d);
        assert_eq!(p.handled_count(), 2);
        assert_eq!(p.skipped_count(), 97);
        assert_eq!(p.failed_count(), 1);
        assert_eq!(p.state(), State::Ended);

        assert_eq!(
            urls(&d),
            vec![
                "http://hooks/init",
                "http://hooks/handle",
                "http://hooks/skip",
                "http://hooks/error",
                "http://hooks/result",
            ]
        );
        let calls = d.notifier().unwrap().transport().calls();
        assert_eq!(calls[1].body, json!({"count": 2}));
        assert_eq!(calls[4].body, json!({"type": "value", "value": true}));
    }

    #[tokio::test]
    async fn zero_counts_change_nothing() {
        let mut d = driver();
        d.initialize(None).await.unwrap();
        d.handle(0).await.unwrap();
        d.add_errors(Vec::new()).await.unwrap();
        assert_eq!(urls(&d), vec!["http://hooks/init"]);
    }

    #[tokio::test]
    async fn large_batches_are_counted_at_once() {
        let mut d = driver();
        d.initialize(None).await.unwrap();
        d.handle(i64::MAX as u64).await.unwrap();
        assert_eq!(stored(&d).handled_count(), i64::MAX as u64);

        let err = d.skip(u64::MAX).await.unwrap_err();
        assert!(matches!(err, TrackerError::Process(ProcessError::InvalidArgument(_))));
        assert_eq!(d.process().skipped_count(), 0);
        assert_eq!(urls(&d), vec!["http://hooks/init", "http://hooks/handle"]);
    }

    #[tokio::test]
    async fn terminate_reports_error_then_failed_result() {
        let mut d = driver();
        d.initialize(Some(10)).await.unwrap();
        d.terminate(ErrorRecord::new("fatal")).await.unwrap();

        let calls = d.notifier().unwrap().transport().calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(
            calls[1].body,
            json!({"errors": [{"message": "fatal", "entityId": null}]})
        );
        assert_eq!(calls[2].body, json!({"type": "failed", "value": false}));
        assert_eq!(stored(&d).failed_count(), 10);
    }

    #[tokio::test]
    async fn terminate_before_init_sends_nothing() {
        let mut d = driver();
        d.terminate(ErrorRecord::new("aborted")).await.unwrap();
        assert!(urls(&d).is_empty());
        assert_eq!(stored(&d).result(), Some(&ProcessResult::Failed));
    }

    #[tokio::test]
    async fn delivery_failure_keeps_saved_state() {
        let mut d = driver();
        d.initialize(Some(5)).await.unwrap();
        d.notifier().unwrap().transport().fail_with_status(503);

        let err = d.handle(1).await.unwrap_err();
        assert!(err.is_delivery());
        assert_eq!(d.process().handled_count(), 1);
        assert_eq!(stored(&d).handled_count(), 1);
    }

    #[tokio::test]
    async fn rejected_operation_is_not_saved() {
        let mut d = driver();
        let err = d.handle(1).await.unwrap_err();
        assert!(matches!(err, TrackerError::Process(ProcessError::NotInitialized)));
        assert!(matches!(
            load_process(d.store(), 1, "p-1"),
            Err(TrackerError::ProcessNotFound(_))
        ));
    }

    #[tokio::test]
    async fn attach_to_initialized_process_resumes_notifier() {
        let mut process = Process::with_id("p-1", 1, 2);
        process.initialize(Some(3)).unwrap();
        let mut d = ProcessDriver::attach(
            process,
            MemoryStore::new(),
            Some((
                WebhookEndpoints::under("http://hooks"),
                RecordingTransport::default(),
            )),
        );
        d.handle(1).await.unwrap();
        assert_eq!(urls(&d), vec!["http://hooks/handle"]);
    }

    #[tokio::test]
    async fn description_changes_after_finish() {
        let mut d = driver();
        d.initialize(Some(1)).await.unwrap();
        d.finish("done").await.unwrap();
        d.set_description(Some("archived".into())).unwrap();
        assert_eq!(stored(&d).description(), Some("archived"));
        assert!(d.set_state(State::PostProcessing).is_err());
    }

    #[tokio::test]
    async fn driver_without_notifier_only_saves() {
        let mut d: ProcessDriver<MemoryStore, RecordingTransport> =
            ProcessDriver::attach(Process::with_id("p-1", 1, 2), MemoryStore::new(), None);
        d.initialize(Some(2)).await.unwrap();
        d.handle(2).await.unwrap();
        d.finish(1i64).await.unwrap();
        assert!(d.notifier().is_none());
        assert_eq!(stored(&d).handled_count(), 2);
    }
}
