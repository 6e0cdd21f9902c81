//! Output generation for the console and the optional JSON report.
//!
//! # Submodules
//!
//! - [`console`]: Frames the model's reply for the terminal
//! - [`json`]: Writes a [`RunReport`](crate::models::RunReport) to disk
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2026-10-17/
//!     ├── 093012_acme-corp-stock.json
//!     └── 141505_widget-tariffs.json
//! ```

pub mod console;
pub mod json;
