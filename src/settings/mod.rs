//! File-backed settings. `bin/settings_demo.rs` loads the bundled files by hand.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
