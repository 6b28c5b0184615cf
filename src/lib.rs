// THEORY:
// This file is the main entry point for the `form_vision` library crate. It exports the
// comparison engine as a small public API: a `ComparisonSession` that buffers landmark
// frames for a reference and a target clip, and the `AdviceComposer` strategies that
// turn those buffers into feedback.
//
// The analysis itself lives in `core_modules`, one layer per file, leaves first:
// landmark data, sequence buffering, scale normalization, release detection, phase
// alignment and joint comparison. The pose detector that produces the landmarks is an
// external collaborator and is not part of this crate.

pub mod advice;
pub mod config;
pub mod core_modules;
pub mod error;
pub mod pipeline;

pub use advice::remote::RemoteAdviceClient;
pub use advice::{AdviceComposer, LocalComposer, RemoteComposer};
pub use config::Config;
pub use error::{AdviceError, ConfigError};
pub use pipeline::{ComparisonSession, Side};
