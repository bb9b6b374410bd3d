//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (wall clock, timers, animation-frame deltas)
//! - Storage (LocalStorage on web, in-memory natively and in tests)
//! - The logged-in session

pub mod clock;
pub mod scheduler;
pub mod session;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock, iso8601};
pub use scheduler::{Fired, FrameClock, TimerId, TimerQueue};
pub use session::{Guest, Session, SessionProvider, StoredSession};
pub use storage::{KeyValueStore, MemoryStore, StorageError};

#[cfg(target_arch = "wasm32")]
pub use storage::LocalStorage;
