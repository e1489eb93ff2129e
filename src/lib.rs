// Library surface for the adaptive progression core.
// Rendering, question generation and the gameplay loop live in the host app.
pub mod attempt;
pub mod category;
pub mod controller;
pub mod engine;
pub mod error;
pub mod report;
pub mod settings;
pub mod store;
pub mod window;

pub use attempt::{AttemptRecord, Outcome, ProgressKey};
pub use category::{Category, CommonGroups};
pub use controller::Decision;
pub use engine::ProgressionEngine;
pub use error::{ProgressError, Result};
pub use settings::ProgressionSettings;
pub use store::{MemoryProgressStore, ProgressStore, SqliteProgressStore};
pub use window::Window;
