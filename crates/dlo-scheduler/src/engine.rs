use std::sync::Arc;
use std::time::Duration;

use dlo_memories::{DeliveryOutcome, Memory, MemoryStatus, MemoryStore};
use dlo_notify::Notifier;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use crate::{
    clock::{Clock, SystemClock},
    compose::MessageTemplate,
    error::{Result, SchedulerError},
    types::{CycleReport, SendNowReport},
};

/// Sends due memories and records what happened to each.
///
/// Cheap to clone: the store shares its connection and the notifier and
/// clock are reference counted. The loop and request handlers can each hold
/// an engine over their own connection.
#[derive(Clone)]
pub struct DeliveryEngine {
    store: MemoryStore,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    template: MessageTemplate,
}

impl DeliveryEngine {
    pub fn new(store: MemoryStore, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            clock: Arc::new(SystemClock),
            template: MessageTemplate::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_template(mut self, template: MessageTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// One pass over everything due at the clock's current time.
    ///
    /// Each memory is committed on its own, so a crash mid-cycle keeps the
    /// outcomes already recorded. A failed send or a failed write for one
    /// memory does not stop the others. Only an error loading the due set
    /// aborts the cycle.
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        let now = self.clock.now();
        let due = self.store.due(now)?;
        let mut report = CycleReport {
            due: due.len(),
            ..CycleReport::default()
        };
        if due.is_empty() {
            return Ok(report);
        }
        info!(count = due.len(), "delivering due memories");

        for memory in &due {
            match self.deliver(memory, MemoryStatus::Scheduled).await {
                Ok((_, Some(DeliveryOutcome::Sent { .. }))) => report.sent += 1,
                Ok((_, Some(DeliveryOutcome::Failed))) => report.failed += 1,
                Ok((_, None)) => report.superseded += 1,
                Err(e) => {
                    error!(memory_id = %memory.id, "could not record delivery outcome: {e}");
                    report.unrecorded += 1;
                }
            }
        }

        info!(
            sent = report.sent,
            failed = report.failed,
            superseded = report.superseded,
            unrecorded = report.unrecorded,
            "delivery cycle finished"
        );
        Ok(report)
    }

    /// Send one memory immediately, whatever its status or `send_at`.
    ///
    /// The memory must belong to `owner_id`; otherwise this is `NotFound`
    /// and nothing is sent or written. Terminal memories are resent and
    /// their status overwritten with the new outcome. A memory deleted after
    /// the send still yields a report, built from the copy that was sent.
    pub async fn send_now(&self, id: &str, owner_id: &str) -> Result<SendNowReport> {
        let memory = self.store.get(id, owner_id)?;
        info!(memory_id = %memory.id, status = %memory.status, "manual send requested");

        let (delivered, outcome) = self.deliver(&memory, memory.status).await?;
        let memory = match self.store.get(id, owner_id) {
            Ok(current) => current,
            // Deleted while the send was in flight: report on what was sent.
            Err(e) if e.is_not_found() => {
                warn!(memory_id = %id, delivered, "memory deleted during manual send");
                let mut last = memory;
                if let Some(outcome) = outcome {
                    last.status = outcome.status();
                    last.sent_at = outcome.sent_at();
                }
                last
            }
            Err(e) => return Err(e.into()),
        };
        Ok(SendNowReport {
            delivered,
            recorded: outcome.is_some(),
            memory,
        })
    }

    /// Send and record, expecting the stored status to still be `expected`.
    /// Returns whether the transport accepted the message and the outcome
    /// that was written, if the write won.
    async fn deliver(
        &self,
        memory: &Memory,
        expected: MemoryStatus,
    ) -> Result<(bool, Option<DeliveryOutcome>)> {
        let email = self.template.email_for(memory);
        let delivered = self.notifier.send(&email).await;
        let outcome = if delivered {
            DeliveryOutcome::Sent {
                at: self.clock.now(),
            }
        } else {
            warn!(memory_id = %memory.id, notifier = self.notifier.name(), "delivery failed");
            DeliveryOutcome::Failed
        };
        let applied = self.store.record_outcome(&memory.id, expected, outcome)?;
        Ok((delivered, applied.then_some(outcome)))
    }

    /// Delivery loop. Runs a cycle now and then every `every`, until
    /// `shutdown` broadcasts `true`. A cycle that overruns the period
    /// delays the next tick instead of stacking up behind it.
    pub async fn run(self, every: Duration, mut shutdown: watch::Receiver<bool>) {
        if every.is_zero() {
            error!("delivery interval must be positive; engine not started");
            return;
        }
        info!(interval_secs = every.as_secs(), "delivery engine started");

        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.run_cycle().await {
                        error!("delivery cycle error: {e}");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("delivery engine shutting down");
                        break;
                    }
                }
            }
        }
    }
}

/// Background task running [`DeliveryEngine::run`].
pub struct DeliveryScheduler {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl DeliveryScheduler {
    /// Spawn the delivery loop onto the current runtime. `every` must be
    /// non-zero.
    pub fn start(engine: DeliveryEngine, every: Duration) -> Result<Self> {
        if every.is_zero() {
            return Err(SchedulerError::InvalidInterval);
        }
        let (shutdown, rx) = watch::channel(false);
        let handle = tokio::spawn(engine.run(every, rx));
        Ok(Self { shutdown, handle })
    }

    /// Signal shutdown and wait for the loop to exit. A cycle in progress
    /// is allowed to finish.
    pub async fn stop(self) {
        // The receiver only goes away if the task already ended.
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            error!("delivery task ended abnormally: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use dlo_memories::{lock, NewMemory};
    use dlo_notify::OutgoingEmail;
    use std::sync::Mutex;

    use crate::clock::FixedClock;

    /// Records every email and answers with a fixed result.
    struct Recorder {
        ok: bool,
        sent: Mutex<Vec<OutgoingEmail>>,
    }

    impl Recorder {
        fn new(ok: bool) -> Arc<Self> {
            Arc::new(Self {
                ok,
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Notifier for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        async fn send(&self, email: &OutgoingEmail) -> bool {
            self.sent.lock().unwrap().push(email.clone());
            self.ok
        }
    }

    fn start() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap()
    }

    fn setup(ok: bool) -> (DeliveryEngine, Arc<Recorder>, Arc<FixedClock>, String) {
        let store = MemoryStore::open(dlo_users::db::open_in_memory().unwrap()).unwrap();
        let owner = dlo_users::account::create_user(
            &lock(store.connection()),
            "owner@example.com",
            "Owner",
            "secret1",
        )
        .unwrap()
        .id;
        let notifier = Recorder::new(ok);
        let clock = Arc::new(FixedClock::new(start()));
        let engine = DeliveryEngine::new(store, notifier.clone()).with_clock(clock.clone());
        (engine, notifier, clock, owner)
    }

    fn schedule(engine: &DeliveryEngine, owner: &str, title: &str, at: chrono::DateTime<Utc>) -> Memory {
        engine
            .store()
            .create(
                owner,
                NewMemory {
                    title: title.to_string(),
                    recipient_email: "kid@example.com".to_string(),
                    message: "I love you.".to_string(),
                    send_at: at,
                },
            )
            .unwrap()
    }

    #[tokio::test]
    async fn empty_cycle_sends_nothing() {
        let (engine, notifier, _, owner) = setup(true);
        schedule(&engine, &owner, "later", start() + ChronoDuration::hours(1));

        let report = engine.run_cycle().await.unwrap();
        assert_eq!(report, CycleReport::default());
        assert!(notifier.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cycle_uses_template_and_stamps_sent_at() {
        let (engine, notifier, clock, owner) = setup(true);
        let engine = engine.with_template(MessageTemplate::new("Capsule"));
        let m = schedule(&engine, &owner, "Birthday", start() - ChronoDuration::minutes(1));
        clock.advance(ChronoDuration::seconds(5));

        let report = engine.run_cycle().await.unwrap();
        assert_eq!(report.due, 1);
        assert_eq!(report.sent, 1);

        let emails = notifier.sent.lock().unwrap().clone();
        assert_eq!(emails.len(), 1);
        assert_eq!(emails[0].to, "kid@example.com");
        assert_eq!(emails[0].subject, "[Capsule] Birthday");
        assert!(emails[0].body.contains("I love you."));

        let stored = engine.store().get(&m.id, &owner).unwrap();
        assert_eq!(stored.status, MemoryStatus::Sent);
        assert_eq!(stored.sent_at, Some(clock.now()));
        assert!(stored.sent_at.unwrap() >= stored.send_at);
    }

    #[tokio::test]
    async fn failed_send_is_terminal_for_the_cycle() {
        let (engine, notifier, _, owner) = setup(false);
        let m = schedule(&engine, &owner, "x", start());

        let report = engine.run_cycle().await.unwrap();
        assert_eq!(report.failed, 1);
        let stored = engine.store().get(&m.id, &owner).unwrap();
        assert_eq!(stored.status, MemoryStatus::Failed);
        assert_eq!(stored.sent_at, None);

        // Not retried by later cycles.
        engine.run_cycle().await.unwrap();
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn send_now_ignores_send_at() {
        let (engine, notifier, _, owner) = setup(true);
        let m = schedule(&engine, &owner, "future", start() + ChronoDuration::days(365));

        let report = engine.send_now(&m.id, &owner).await.unwrap();
        assert!(report.delivered);
        assert!(report.recorded);
        assert_eq!(report.memory.status, MemoryStatus::Sent);
        assert_eq!(notifier.sent.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn scheduler_stops_cleanly() {
        let (engine, _, _, _) = setup(true);
        let scheduler = DeliveryScheduler::start(engine, Duration::from_secs(3600)).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        tokio::time::timeout(Duration::from_secs(5), scheduler.stop())
            .await
            .expect("scheduler did not stop");
    }

    #[tokio::test]
    async fn zero_interval_is_rejected() {
        let (engine, notifier, _, owner) = setup(true);
        schedule(&engine, &owner, "due", start());
        let err = DeliveryScheduler::start(engine, Duration::ZERO).err().unwrap();
        assert!(matches!(err, SchedulerError::InvalidInterval));
        assert!(notifier.sent.lock().unwrap().is_empty());
    }
}
