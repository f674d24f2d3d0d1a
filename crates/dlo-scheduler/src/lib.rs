//! `dlo-scheduler` — periodic delivery of due memories.
//!
//! # Overview
//!
//! [`DeliveryEngine::run_cycle`] loads every memory that is `scheduled` with
//! `send_at <= now`, hands each to the [`dlo_notify::Notifier`], and records
//! the outcome on that memory before moving to the next. Each write is a
//! compare-and-set against `scheduled`, so a memory another writer already
//! finished is left alone.
//!
//! [`DeliveryScheduler`] drives cycles on a fixed interval from a single
//! task; a cycle always finishes before the next can begin.
//!
//! [`DeliveryEngine::send_now`] is the manual path: one memory, owner
//! checked, any current status, same sender call and formatting.

pub mod clock;
pub mod compose;
pub mod engine;
pub mod error;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use compose::MessageTemplate;
pub use engine::{DeliveryEngine, DeliveryScheduler};
pub use error::{Result, SchedulerError};
pub use types::{CycleReport, SendNowReport};
