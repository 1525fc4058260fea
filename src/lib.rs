//! taskpad - Personal Task Tracking Library
//!
//! In-memory tracking of tasks, epics, and subtasks with a recency-ordered
//! view history and optional snapshot persistence.
//!
//! # Core Concepts
//!
//! - **Tasks**: the base trackable unit with a name, description, and status
//! - **Epics**: tasks whose status is derived from their subtasks
//! - **Subtasks**: tasks that belong to exactly one epic
//! - **View History**: a duplicate-free, recency-ordered record of every
//!   fetch by id, maintained in O(1) per operation
//! - **Snapshots**: the whole manager state as one atomically written JSON file
//!
//! # Module Organization
//!
//! - `config`: Configuration loading from `taskpad.toml`
//! - `error`: Error types and result aliases
//! - `history`: View-history tracking
//! - `manager`: The in-memory task manager
//! - `storage`: Snapshot file storage
//! - `task`: Task, epic, and subtask records

pub mod config;
pub mod error;
pub mod history;
pub mod manager;
pub mod storage;
pub mod task;

pub use error::{Error, Result};
pub use manager::TaskManager;
