//! Orchestration engine for outdiff.
//!
//! Drives a diff run: a FIFO queue of [`Evaluator`] tasks, seeded with one
//! root evaluator, drained by a bounded pool of blocking workers. Each task
//! compares one level of the two outputs, attaches its result node to the
//! shared diff tree, and may enqueue deeper evaluators for the items it found
//! on both sides.
//!
//! # Key Types
//!
//! - [`DiffEngine`] -- The scheduler; [`DiffEngine::run`] is the entry point
//! - [`Evaluator`] / [`Produced`] -- The protocol every comparison unit implements
//! - [`TaskQueue`] -- Shared FIFO handed to every task
//! - [`EvaluatorRegistry`] / [`SharedItem`] -- Name-based dispatch to specialized evaluators
//! - [`EngineConfig`] -- Worker count and per-task timeout
//! - [`EvalError`] / [`EngineError`] -- Task-local and run-aborting failures

pub mod config;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod queue;
pub mod registry;

pub use config::EngineConfig;
pub use engine::{DiffEngine, RunReport, RunStats};
pub use error::{EngineError, EngineResult, EvalError, EvalResult};
pub use evaluator::{produce, produce_one, Evaluator, Produced};
pub use queue::{Task, TaskQueue};
pub use registry::{Constructor, EvaluatorRegistry, Matcher, SharedItem};
