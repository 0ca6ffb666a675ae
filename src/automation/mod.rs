//! Drivers that decide when mint cycles run.
//!
//! # Data Flow
//! ```text
//! Mode::resolve(CLI flags, [automation])
//!     Once     → one cycle over every target
//!     Loop     → one job, cycle every loop_interval_secs
//!     Schedule → one job per configured interval
//!     Watch    → one job per target: ticker live? → cycle for that target
//!
//! every job ─ lock(shared orchestrator) ─ run_cycle ─ unlock
//!     └─ select! on the shutdown receiver between and during cycles
//! ```
//!
//! # Design Decisions
//! - One orchestrator behind an async mutex: one attempt in flight per process
//! - Shutdown cancels the running cycle; dropped attempts release reservations

pub mod drivers;
pub mod mode;

pub use drivers::{run_interval_job, run_mode, run_once, run_watcher, SharedOrchestrator};
pub use mode::{Mode, ModeFlags};
