pub mod access;
pub mod boundary;
pub mod error;
pub mod ignore;
pub mod pattern;
pub mod settings;
pub mod walk;

// Public library API - embedders normally only need these; the rest is
// public anyway for anyone wiring the pieces together differently.
pub use access::FileAccess;
pub use boundary::Boundaries;
pub use error::{FsError, Result};
pub use settings::{Settings, SettingsManager};
