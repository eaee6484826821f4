pub mod accuracy;
pub mod board_utils;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod openings;
pub mod report;
pub mod scheduler;
pub mod tactics;
pub mod uci;

pub use config::{AnalysisOptions, EngineConfig, ReporterConfig};
pub use engine::{EngineLauncher, ProcessLauncher, UciEngine};
pub use error::AnalysisError;
pub use openings::OpeningBook;
pub use report::{annotate_tree, GameReport};
pub use scheduler::EvaluationScheduler;
