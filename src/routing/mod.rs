//! File-based routing subsystem.
//!
//! # Data Flow
//! ```text
//! Routes node (tree/walker.rs):
//!     → source.rs (list route + config modules, deterministic order)
//!     → paths.rs (URL derivation from file paths)
//!     → merge.rs (config chain, root-to-leaf merge)
//!     → discover.rs (register each exported method handler)
//!     → RouteInfo table
//! ```
//!
//! # Design Decisions
//! - Discovery is a pure function of source contents: same tree in, same
//!   ordered route table out
//! - Per-module failures are logged and skipped; siblings keep registering
//! - Routes compiled at startup, immutable at runtime

pub mod discover;
pub mod merge;
pub mod paths;
pub mod source;

pub use discover::{discover_and_register, RouteInfo};
pub use merge::ParsedConfig;
pub use source::{ConfigModule, FsModules, ModuleError, ModuleExport, ModuleSource, RouteModule, StaticModules};
