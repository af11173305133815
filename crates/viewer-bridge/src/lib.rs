//! Control bridge for an embedded PDF.js viewer
//!
//! The host configures and drives a viewer that lives in an iframe or a
//! separate window. Commands are queued until the viewer is far enough
//! along to accept them, sent over `postMessage`, and answered by id.
//! Viewer events come back through the same channel and are surfaced as
//! [`BridgeEvent`]s.
//!
//! ```no_run
//! use viewer_bridge::{testing::InMemoryViewer, ViewerBridge, ViewerOptions};
//!
//! # async fn run() -> viewer_bridge::Result<()> {
//! let viewer = InMemoryViewer::new("main");
//! let options = ViewerOptions::new("/files/report.pdf").with_viewer_id("main");
//! let (bridge, _events) = ViewerBridge::new(options, Box::new(viewer.surface()));
//! bridge.load().await?;
//! bridge.set_zoom("page-width").await;
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod bridge;
pub mod command;
pub mod error;
pub mod events;
pub mod options;
pub mod origin;
pub mod platform;
pub mod protocol;
pub mod queue;
pub mod readiness;
pub mod testing;
pub mod transform;
pub mod transport;
pub mod url;

pub use action::{ActionExecutionResult, ActionStatus, ActionTicket, ViewerAction};
pub use bridge::{initial_plan, BridgeState, EventStream, ViewerBridge};
pub use command::ViewerCommand;
pub use error::{BridgeError, Result};
pub use events::{BridgeEvent, ViewerEventKind};
pub use options::{EventSubscriptions, ViewerOptions};
pub use origin::{BoundProperty, ChangeOrigin, ChangeOriginTracker, PropertyChange};
pub use queue::{ActionExecutor, ActionQueueManager, QueueBucket, QueueStatus};
pub use readiness::{ReadinessStage, ReadinessTracker};
pub use transform::{CursorTool, PageMode, Rotation, ScrollMode, SpreadMode, ViewerMode, Zoom};
pub use transport::{PostMessageExecutor, RemoteHandle, ResponseRouter, ViewerSurface};
pub use url::build_viewer_url;
