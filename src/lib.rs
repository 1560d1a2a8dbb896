//! Terminal venue guide for EPPA 2025.
//!
//! The page is a plugin-driven runtime: a layout tree is solved into zones,
//! plugins queue zone content, and the renderer repaints only zones whose
//! content hash changed. The venue map model in [`venue`] is the core state
//! machine; chat, countdown, registration, lineup, tickets and location are
//! sections around it.

pub mod app;
pub mod chat;
pub mod config;
pub mod countdown;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod lineup;
pub mod location;
pub mod logging;
pub mod metrics;
pub mod registration;
pub mod registry;
pub mod render;
pub mod runtime;
pub mod tickets;
pub mod venue;
pub mod width;

pub use error::{PageError, Result};
pub use geometry::{Rect, Size};
pub use layout::{Constraint, Direction, LayoutNode, LayoutTree, NodeId};
pub use logging::{LogEvent, LogFields, LogLevel, Logger, LoggingError, LoggingResult};
pub use metrics::{MetricSnapshot, RuntimeMetrics};
pub use registry::{ZoneContent, ZoneId, ZoneRegistry, ZoneState};
pub use render::AnsiRenderer;
pub use runtime::diagnostics::LifecycleLoggerPlugin;
pub use runtime::driver::cli::{CliDriver, CliDriverError, DriverResult};
pub use runtime::focus::{FocusEntry, FocusRegistry, FocusRing, SharedFocus};
pub use runtime::{
    EventFlow, PagePlugin, PageRuntime, RuntimeConfig, RuntimeContext, RuntimeEvent,
};
pub use venue::{Area, AreaCatalog, Floor, MapChange, MapViewState, VenueMap};
pub use width::{display_width, truncate_display};
