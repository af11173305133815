//! The bridge component
//!
//! [`ViewerBridge`] owns one viewer instance at a time. Host calls become
//! [`ViewerCommand`]s that wait in the readiness-gated queue, and everything
//! the viewer posts back enters through [`ViewerBridge::handle_message`].
//!
//! All state lives behind `RefCell`s and is never borrowed across an
//! `.await`, so host calls and inbound messages can interleave freely on
//! the single UI thread.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use chrono::Utc;
use futures::channel::mpsc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::action::{ActionExecutionResult, ActionStatus, ViewerAction};
use crate::command::ViewerCommand;
use crate::error::Result;
use crate::events::{param_page, param_value, BridgeEvent, ViewerEventKind};
use crate::options::ViewerOptions;
use crate::origin::{BoundProperty, ChangeOrigin, ChangeOriginTracker, PropertyChange};
use crate::platform;
use crate::protocol::{InboundMessage, ViewerEventMessage};
use crate::queue::{ActionQueueManager, QueueStatus};
use crate::readiness::{ReadinessStage, ReadinessTracker};
use crate::transform::{CursorTool, PageMode, Rotation, ScrollMode, SpreadMode, ViewerMode, Zoom};
use crate::transport::{PostMessageExecutor, ResponseRouter, ViewerSurface};
use crate::url::build_viewer_url;

/// Host-side view of the viewer lifecycle. Only moves forward until the
/// instance is torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BridgeState {
    #[default]
    Uninitialized,
    Loading,
    ChannelReady,
    ViewerReady,
    DocumentLoaded,
}

impl BridgeState {
    fn from_stage(stage: ReadinessStage) -> Self {
        match stage {
            ReadinessStage::Uninitialized | ReadinessStage::ScriptLoaded => BridgeState::Loading,
            ReadinessStage::ChannelReady | ReadinessStage::ApplicationReady => {
                BridgeState::ChannelReady
            }
            ReadinessStage::ViewerReady => BridgeState::ViewerReady,
            ReadinessStage::DocumentLoaded => BridgeState::DocumentLoaded,
        }
    }
}

/// Receiving end of the bridge's host-facing events
pub type EventStream = mpsc::UnboundedReceiver<BridgeEvent>;

/// Last known values of the two-way properties
#[derive(Debug, Clone, Default)]
struct BoundState {
    page: Option<u32>,
    page_count: Option<u32>,
    zoom: Option<Zoom>,
    rotation: Option<Rotation>,
    cursor: Option<CursorTool>,
    scroll: Option<ScrollMode>,
    spread: Option<SpreadMode>,
    page_mode: Option<PageMode>,
}

impl BoundState {
    fn from_options(options: &ViewerOptions) -> Self {
        Self {
            page: options.page,
            page_count: None,
            zoom: options.zoom_value(),
            rotation: options.rotation_value(),
            cursor: options.cursor_value(),
            scroll: options.scroll_value(),
            spread: options.spread_value(),
            page_mode: options.page_mode_value(),
        }
    }
}

/// Commands queued when a viewer instance is created.
///
/// Error text and locale only need the channel, toolbar and mode settings
/// need the viewer components, and navigation waits for the document.
/// One-shot actions (start print, rotate on load, last page) are left to the
/// bootstrap URL since sending them twice would repeat them.
pub fn initial_plan(options: &ViewerOptions) -> Vec<ViewerCommand> {
    let mut plan = Vec::new();

    if let Some(message) = &options.error_message {
        plan.push(ViewerCommand::SetErrorMessage {
            message: message.clone(),
            override_default: options.error_override,
            append: options.error_append,
        });
    }
    if let Some(locale) = &options.locale {
        plan.push(ViewerCommand::SetLocale(locale.clone()));
    }

    let toggles: [(Option<bool>, fn(bool) -> ViewerCommand); 6] = [
        (options.download, ViewerCommand::ShowDownload),
        (options.print, ViewerCommand::ShowPrint),
        (options.full_screen, ViewerCommand::ShowFullscreen),
        (options.find, ViewerCommand::ShowFind),
        (options.view_bookmark, ViewerCommand::ShowBookmark),
        (options.open_file, ViewerCommand::ShowOpenFile),
    ];
    for (value, command) in toggles {
        if let Some(visible) = value {
            plan.push(command(visible));
        }
    }

    if let Some(cursor) = options.cursor_value() {
        plan.push(ViewerCommand::SetCursor(cursor));
    }
    if let Some(scroll) = options.scroll_value() {
        plan.push(ViewerCommand::SetScroll(scroll));
    }
    if let Some(spread) = options.spread_value() {
        plan.push(ViewerCommand::SetSpread(spread));
    }

    if let Some(zoom) = options.zoom_value() {
        plan.push(ViewerCommand::SetZoom(zoom));
    }
    if let Some(page) = options.page {
        plan.push(ViewerCommand::SetPage(page));
    }
    if let Some(rotation) = options.rotation_value() {
        plan.push(ViewerCommand::SetRotation(rotation));
    }
    if let Some(dest) = &options.named_dest {
        plan.push(ViewerCommand::GoToNamedDest(dest.clone()));
    }
    if let Some(mode) = options.page_mode_value() {
        plan.push(ViewerCommand::UpdatePageMode(mode));
    }

    plan
}

pub struct ViewerBridge {
    options: RefCell<ViewerOptions>,
    diagnostics: bool,
    surface: RefCell<Box<dyn ViewerSurface>>,
    queue: RefCell<Rc<ActionQueueManager>>,
    readiness: RefCell<ReadinessTracker>,
    origin: RefCell<ChangeOriginTracker>,
    router: Rc<ResponseRouter>,
    bound: Rc<RefCell<BoundState>>,
    state: Cell<BridgeState>,
    viewer_url: RefCell<Option<String>>,
    events: mpsc::UnboundedSender<BridgeEvent>,
}

impl ViewerBridge {
    pub fn new(options: ViewerOptions, surface: Box<dyn ViewerSurface>) -> (Self, EventStream) {
        let (events, stream) = mpsc::unbounded();
        let diagnostics = options.diagnostic_logs;
        let bridge = Self {
            bound: Rc::new(RefCell::new(BoundState::from_options(&options))),
            options: RefCell::new(options),
            diagnostics,
            surface: RefCell::new(surface),
            queue: RefCell::new(Rc::new(ActionQueueManager::new(diagnostics))),
            readiness: RefCell::new(ReadinessTracker::new()),
            origin: RefCell::new(ChangeOriginTracker::new()),
            router: Rc::new(ResponseRouter::new()),
            state: Cell::new(BridgeState::Uninitialized),
            viewer_url: RefCell::new(None),
            events,
        };
        (bridge, stream)
    }

    fn queue(&self) -> Rc<ActionQueueManager> {
        Rc::clone(&self.queue.borrow())
    }

    fn emit(&self, event: BridgeEvent) {
        // Host may have dropped the stream; events are then discarded.
        let _ = self.events.unbounded_send(event);
    }

    fn set_state(&self, state: BridgeState) {
        if self.state.replace(state) != state {
            if self.diagnostics {
                debug!("Bridge state -> {:?}", state);
            }
            self.emit(BridgeEvent::StateChanged { state });
        }
    }

    /// Router that correlates `control-response` messages with dispatches
    pub fn response_router(&self) -> Rc<ResponseRouter> {
        Rc::clone(&self.router)
    }

    /// Options as they would be used for the next load, with the current
    /// two-way property values folded in
    pub fn effective_options(&self) -> ViewerOptions {
        let mut options = self.options.borrow().clone();
        let bound = self.bound.borrow();
        if let Some(page) = bound.page {
            options.page = Some(page);
        }
        if let Some(zoom) = bound.zoom {
            options.zoom = Some(zoom.as_host_str());
        }
        if let Some(rotation) = bound.rotation {
            options.rotation = Some(rotation.degrees() as i64);
        }
        if let Some(cursor) = bound.cursor {
            options.cursor = Some(cursor.as_host_str().to_string());
        }
        if let Some(scroll) = bound.scroll {
            options.scroll = Some(scroll.as_host_str().to_string());
        }
        if let Some(spread) = bound.spread {
            options.spread = Some(spread.as_host_str().to_string());
        }
        if let Some(mode) = bound.page_mode {
            options.page_mode = Some(mode.as_host_str().to_string());
        }
        options
    }

    /// Wrap a command in an action, guarding page jumps against the known
    /// page count
    fn action_for(&self, command: ViewerCommand) -> ViewerAction {
        let page = match &command {
            ViewerCommand::SetPage(page) => Some(*page),
            _ => None,
        };
        let action = ViewerAction::new(command);
        match page {
            Some(page) => {
                let bound = Rc::clone(&self.bound);
                action.when(move || bound.borrow().page_count.map_or(true, |count| page <= count))
            }
            None => action,
        }
    }

    /// Replace the container the viewer is loaded into. A loaded viewer is
    /// torn down first.
    pub fn set_surface(&self, surface: Box<dyn ViewerSurface>) {
        if self.state.get() != BridgeState::Uninitialized {
            self.teardown();
        }
        *self.surface.borrow_mut() = surface;
    }

    /// Create the viewer instance: open the surface at the bootstrap URL,
    /// install the transport and queue the initial settings.
    pub async fn load(&self) -> Result<()> {
        if self.state.get() != BridgeState::Uninitialized {
            debug!("Viewer already loaded, ignoring load()");
            return Ok(());
        }

        let options = self.effective_options();
        let url = build_viewer_url(&options);
        let opened = self.surface.borrow_mut().open(&url);
        let handle = match opened {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Could not open viewer: {}", e);
                return Err(e);
            }
        };

        let queue = self.queue();
        queue.set_post_message_executor(Rc::new(PostMessageExecutor::new(
            handle,
            Rc::clone(&self.router),
            Duration::from_millis(options.response_timeout_ms),
        )));
        if self.diagnostics {
            info!("Loading viewer from {}", url);
        }
        *self.viewer_url.borrow_mut() = Some(url);
        self.set_state(BridgeState::Loading);

        for command in initial_plan(&options) {
            let bucket = command.default_bucket();
            queue.queue_action(self.action_for(command), bucket).await;
        }
        Ok(())
    }

    /// Poll until the viewer reports a usable control channel.
    ///
    /// Returns false when the attempts run out; the immediate bucket is
    /// then flushed anyway with whatever stage is known.
    pub async fn wait_for_channel(&self) -> bool {
        if self.state.get() == BridgeState::Uninitialized {
            return false;
        }

        let (interval, attempts) = {
            let options = self.options.borrow();
            (
                Duration::from_millis(options.readiness_poll_interval_ms),
                options.readiness_max_attempts,
            )
        };

        for attempt in 1..=attempts {
            if self.has_channel() {
                return true;
            }
            let probed = self.surface.borrow().probe_readiness();
            if let Some(stage) = probed {
                self.advance_readiness(stage).await;
                if stage.has_channel() {
                    return true;
                }
            }
            if self.diagnostics {
                debug!("Viewer not ready (attempt {}/{})", attempt, attempts);
            }
            platform::sleep(interval).await;
        }

        if self.has_channel() {
            return true;
        }

        let stage = self.readiness.borrow().stage();
        warn!(
            "Viewer did not report a control channel after {} attempts, continuing with stage {:?}",
            attempts, stage
        );
        if self.state.get() == BridgeState::Loading {
            self.set_state(BridgeState::ChannelReady);
        }
        self.queue().set_ready(true, stage).await;
        false
    }

    fn has_channel(&self) -> bool {
        self.readiness
            .borrow()
            .is_at_least(ReadinessStage::ChannelReady)
    }

    async fn advance_readiness(&self, stage: ReadinessStage) {
        let progressed = self.readiness.borrow_mut().advance(stage);
        let Some(stage) = progressed else {
            return;
        };
        if self.diagnostics {
            debug!("Viewer readiness -> {:?}", stage);
        }
        // A forced channel may already be ahead of what the viewer reports
        let state = BridgeState::from_stage(stage);
        if state > self.state.get() {
            self.set_state(state);
        }
        self.queue().set_ready(stage.has_channel(), stage).await;
    }

    /// Tear down when the external window has been closed by the user
    fn check_closed(&self) -> bool {
        if self.state.get() == BridgeState::Uninitialized {
            return false;
        }
        let closed = self.surface.borrow().is_closed();
        if closed {
            info!("Viewer window was closed, resetting bridge");
            self.teardown();
        }
        closed
    }

    fn teardown(&self) {
        self.surface.borrow_mut().close();
        self.queue().clear_queues();
        self.router.cancel_all();
        self.readiness.borrow_mut().reset();
        self.origin.borrow_mut().clear();
        *self.queue.borrow_mut() = Rc::new(ActionQueueManager::new(self.diagnostics));
        self.bound.borrow_mut().page_count = None;
        *self.viewer_url.borrow_mut() = None;
        self.set_state(BridgeState::Uninitialized);
    }

    /// Destroy the current viewer instance and create a new one
    pub async fn refresh(&self) -> Result<()> {
        if self.state.get() != BridgeState::Uninitialized {
            self.teardown();
        }
        self.load().await
    }

    /// Point the viewer at another document. A loaded viewer is reloaded.
    pub async fn open_document(&self, source: impl Into<String>) -> Result<()> {
        self.options.borrow_mut().source = Some(source.into());
        {
            let mut bound = self.bound.borrow_mut();
            bound.page = None;
            bound.page_count = None;
        }
        if self.state.get() == BridgeState::Uninitialized {
            return Ok(());
        }
        self.refresh().await
    }

    /// Single entry point for everything the viewer posts to the host
    pub async fn handle_message(&self, data: &Value) -> Result<()> {
        self.origin.borrow_mut().tick();
        if self.check_closed() {
            return Ok(());
        }

        let Some(message) = InboundMessage::parse(data)? else {
            return Ok(());
        };

        match message {
            InboundMessage::Response(response) => {
                self.router.deliver(response);
            }
            InboundMessage::Readiness { viewer_id, stage } => {
                if !self.is_own_viewer(viewer_id.as_deref()) {
                    debug!("Ignoring readiness for viewer {:?}", viewer_id);
                    return Ok(());
                }
                if self.state.get() == BridgeState::Uninitialized {
                    debug!("Ignoring readiness {:?} without a loaded viewer", stage);
                    return Ok(());
                }
                self.advance_readiness(stage).await;
            }
            InboundMessage::Event(event) => self.dispatch_event(event).await,
        }
        Ok(())
    }

    fn is_own_viewer(&self, viewer_id: Option<&str>) -> bool {
        match viewer_id {
            Some(id) => self.options.borrow().viewer_id.as_deref() == Some(id),
            None => true,
        }
    }

    async fn dispatch_event(&self, message: ViewerEventMessage) {
        if self.options.borrow().viewer_id.as_deref() != Some(message.viewer_id.as_str()) {
            debug!("Ignoring event {} for viewer {}", message.event, message.viewer_id);
            return;
        }
        let Some(kind) = ViewerEventKind::from_name(&message.event) else {
            debug!("Ignoring unknown viewer event {}", message.event);
            return;
        };
        let param = &message.param;

        match kind {
            ViewerEventKind::PagesLoaded => {
                let Some(count) = param_page(param) else {
                    warn!("pagesLoaded without a page count: {}", param);
                    return;
                };
                {
                    let mut bound = self.bound.borrow_mut();
                    bound.page_count = Some(count);
                    if bound.page.is_some_and(|page| page > count) {
                        debug!("Dropping page {:?} beyond {} pages", bound.page, count);
                        bound.page = None;
                    }
                }
                self.emit(BridgeEvent::DocumentLoad { page_count: count });
                self.advance_readiness(ReadinessStage::DocumentLoaded).await;
                self.queue().on_document_loaded().await;
            }
            ViewerEventKind::PageChange => {
                let Some(page) = param_page(param) else {
                    return;
                };
                self.bound.borrow_mut().page = Some(page);
                self.emit(BridgeEvent::PageChange { page });
                self.record_user_change(BoundProperty::Page, Value::from(page));
            }
            ViewerEventKind::ScaleChange => {
                let zoom = Zoom::from_viewer(param_value(param));
                self.bound.borrow_mut().zoom = Some(zoom);
                self.record_user_change(BoundProperty::Zoom, Value::from(zoom.as_host_str()));
            }
            ViewerEventKind::RotationChange => {
                let rotation = Rotation::from_viewer(param_value(param));
                self.bound.borrow_mut().rotation = Some(rotation);
                self.record_user_change(BoundProperty::Rotation, Value::from(rotation.degrees()));
            }
            ViewerEventKind::CursorToolChange => {
                let cursor = CursorTool::from_viewer(param_value(param));
                self.bound.borrow_mut().cursor = Some(cursor);
                self.record_user_change(BoundProperty::Cursor, Value::from(cursor.as_host_str()));
            }
            ViewerEventKind::ScrollModeChange => {
                let scroll = ScrollMode::from_viewer(param_value(param));
                self.bound.borrow_mut().scroll = Some(scroll);
                self.record_user_change(BoundProperty::Scroll, Value::from(scroll.as_host_str()));
            }
            ViewerEventKind::SpreadModeChange => {
                let spread = SpreadMode::from_viewer(param_value(param));
                self.bound.borrow_mut().spread = Some(spread);
                self.record_user_change(BoundProperty::Spread, Value::from(spread.as_host_str()));
            }
            ViewerEventKind::PageModeChange => {
                let mode = PageMode::from_viewer(param_value(param));
                self.bound.borrow_mut().page_mode = Some(mode);
                self.record_user_change(BoundProperty::PageMode, Value::from(mode.as_host_str()));
            }
            other => match BridgeEvent::stateless(other, param) {
                Some(event) => self.emit(event),
                None => debug!("Dropping {} with unusable param {}", message.event, param),
            },
        }
    }

    fn record_user_change(&self, property: BoundProperty, value: Value) {
        self.origin.borrow_mut().mark_user_initiated(property);
        self.emit(BridgeEvent::PropertyChanged(PropertyChange {
            property,
            value,
            origin: ChangeOrigin::User,
            timestamp: Utc::now(),
        }));
    }

    /// Queue a command into its default bucket and return the action id
    pub async fn queue_command(&self, command: ViewerCommand) -> String {
        let bucket = command.default_bucket();
        let action = self.action_for(command);
        let id = action.id.clone();
        self.queue().queue_action(action, bucket).await;
        id
    }

    /// Host write to a two-way property.
    ///
    /// A write that only echoes back what the viewer just reported is
    /// dropped. Either way the slot now records a programmatic change, so a
    /// single user report suppresses at most one write.
    async fn write_property(
        &self,
        property: BoundProperty,
        unchanged: bool,
        command: ViewerCommand,
    ) -> Option<String> {
        let (echo, repeated) = {
            let origin = self.origin.borrow();
            (
                unchanged && origin.is_user_initiated(property),
                unchanged && origin.is_programmatic(property),
            )
        };
        self.origin.borrow_mut().mark_programmatic(property);
        if echo {
            if self.diagnostics {
                debug!("Suppressing echo of {:?}", property);
            }
            return None;
        }
        if repeated && self.diagnostics {
            debug!("{:?} written again with the same value", property);
        }
        Some(self.queue_command(command).await)
    }

    pub async fn set_page(&self, page: u32) -> Option<String> {
        if page == 0 {
            warn!("Ignoring page 0, pages start at 1");
            return None;
        }
        // A page past the end is still sent so its failure is recorded, but
        // it never becomes the bound page
        let unchanged = {
            let mut bound = self.bound.borrow_mut();
            if bound.page_count.is_some_and(|count| page > count) {
                false
            } else {
                bound.page.replace(page) == Some(page)
            }
        };
        self.write_property(BoundProperty::Page, unchanged, ViewerCommand::SetPage(page))
            .await
    }

    pub async fn set_zoom(&self, zoom: &str) -> Option<String> {
        let zoom = Zoom::from_host(zoom);
        let unchanged = self.bound.borrow_mut().zoom.replace(zoom) == Some(zoom);
        self.write_property(BoundProperty::Zoom, unchanged, ViewerCommand::SetZoom(zoom))
            .await
    }

    pub async fn set_rotation(&self, degrees: i64) -> Option<String> {
        let rotation = Rotation::from_degrees(degrees);
        let unchanged = self.bound.borrow_mut().rotation.replace(rotation) == Some(rotation);
        self.write_property(
            BoundProperty::Rotation,
            unchanged,
            ViewerCommand::SetRotation(rotation),
        )
        .await
    }

    pub async fn set_cursor(&self, cursor: &str) -> Option<String> {
        let cursor = CursorTool::from_host(cursor);
        let unchanged = self.bound.borrow_mut().cursor.replace(cursor) == Some(cursor);
        self.write_property(BoundProperty::Cursor, unchanged, ViewerCommand::SetCursor(cursor))
            .await
    }

    pub async fn set_scroll(&self, scroll: &str) -> Option<String> {
        let scroll = ScrollMode::from_host(scroll);
        let unchanged = self.bound.borrow_mut().scroll.replace(scroll) == Some(scroll);
        self.write_property(BoundProperty::Scroll, unchanged, ViewerCommand::SetScroll(scroll))
            .await
    }

    pub async fn set_spread(&self, spread: &str) -> Option<String> {
        let spread = SpreadMode::from_host(spread);
        let unchanged = self.bound.borrow_mut().spread.replace(spread) == Some(spread);
        self.write_property(BoundProperty::Spread, unchanged, ViewerCommand::SetSpread(spread))
            .await
    }

    pub async fn set_page_mode(&self, mode: &str) -> Option<String> {
        let mode = PageMode::from_host(mode);
        let unchanged = self.bound.borrow_mut().page_mode.replace(mode) == Some(mode);
        self.write_property(
            BoundProperty::PageMode,
            unchanged,
            ViewerCommand::UpdatePageMode(mode),
        )
        .await
    }

    pub async fn set_named_dest(&self, dest: &str) -> String {
        self.options.borrow_mut().named_dest = Some(dest.to_string());
        self.queue_command(ViewerCommand::GoToNamedDest(dest.to_string()))
            .await
    }

    pub async fn set_locale(&self, locale: &str) -> String {
        self.options.borrow_mut().locale = Some(locale.to_string());
        self.queue_command(ViewerCommand::SetLocale(locale.to_string()))
            .await
    }

    pub async fn set_error_message(&self, message: &str, override_default: bool, append: bool) -> String {
        {
            let mut options = self.options.borrow_mut();
            options.error_message = Some(message.to_string());
            options.error_override = override_default;
            options.error_append = append;
        }
        self.queue_command(ViewerCommand::SetErrorMessage {
            message: message.to_string(),
            override_default,
            append,
        })
        .await
    }

    pub async fn show_download(&self, visible: bool) -> String {
        self.options.borrow_mut().download = Some(visible);
        self.queue_command(ViewerCommand::ShowDownload(visible)).await
    }

    pub async fn show_print(&self, visible: bool) -> String {
        self.options.borrow_mut().print = Some(visible);
        self.queue_command(ViewerCommand::ShowPrint(visible)).await
    }

    pub async fn show_fullscreen(&self, visible: bool) -> String {
        self.options.borrow_mut().full_screen = Some(visible);
        self.queue_command(ViewerCommand::ShowFullscreen(visible)).await
    }

    pub async fn show_find(&self, visible: bool) -> String {
        self.options.borrow_mut().find = Some(visible);
        self.queue_command(ViewerCommand::ShowFind(visible)).await
    }

    pub async fn show_bookmark(&self, visible: bool) -> String {
        self.options.borrow_mut().view_bookmark = Some(visible);
        self.queue_command(ViewerCommand::ShowBookmark(visible)).await
    }

    pub async fn show_open_file(&self, visible: bool) -> String {
        self.options.borrow_mut().open_file = Some(visible);
        self.queue_command(ViewerCommand::ShowOpenFile(visible)).await
    }

    /// Run a command right away, bypassing the readiness buckets
    pub async fn send_command(&self, command: ViewerCommand) -> ActionExecutionResult {
        let action = self.action_for(command);
        self.queue().execute_action(action).await
    }

    pub async fn trigger_print(&self) -> ActionExecutionResult {
        self.send_command(ViewerCommand::TriggerPrint).await
    }

    pub async fn trigger_download(&self) -> ActionExecutionResult {
        self.send_command(ViewerCommand::TriggerDownload).await
    }

    pub async fn rotate_cw(&self) -> ActionExecutionResult {
        let result = self.send_command(ViewerCommand::TriggerRotateCw).await;
        if result.success {
            let mut bound = self.bound.borrow_mut();
            bound.rotation = Some(bound.rotation.unwrap_or_default().rotate_cw());
        }
        result
    }

    pub async fn rotate_ccw(&self) -> ActionExecutionResult {
        let result = self.send_command(ViewerCommand::TriggerRotateCcw).await;
        if result.success {
            let mut bound = self.bound.borrow_mut();
            bound.rotation = Some(bound.rotation.unwrap_or_default().rotate_ccw());
        }
        result
    }

    pub async fn go_to_last_page(&self) -> ActionExecutionResult {
        let result = self.send_command(ViewerCommand::GoToLastPage).await;
        if result.success {
            let mut bound = self.bound.borrow_mut();
            if let Some(count) = bound.page_count {
                bound.page = Some(count);
            }
        }
        result
    }

    pub fn state(&self) -> BridgeState {
        self.state.get()
    }

    pub fn stage(&self) -> ReadinessStage {
        self.readiness.borrow().stage()
    }

    pub fn page(&self) -> Option<u32> {
        self.bound.borrow().page
    }

    pub fn page_count(&self) -> Option<u32> {
        self.bound.borrow().page_count
    }

    pub fn zoom(&self) -> Option<Zoom> {
        self.bound.borrow().zoom
    }

    pub fn rotation(&self) -> Rotation {
        self.bound.borrow().rotation.unwrap_or_default()
    }

    pub fn cursor(&self) -> Option<CursorTool> {
        self.bound.borrow().cursor
    }

    pub fn scroll(&self) -> Option<ScrollMode> {
        self.bound.borrow().scroll
    }

    pub fn spread(&self) -> Option<SpreadMode> {
        self.bound.borrow().spread
    }

    pub fn page_mode(&self) -> Option<PageMode> {
        self.bound.borrow().page_mode
    }

    pub fn viewer_url(&self) -> Option<String> {
        self.viewer_url.borrow().clone()
    }

    pub fn action_status(&self, id: &str) -> ActionStatus {
        self.queue().get_action_status(id)
    }

    pub fn action_result(&self, id: &str) -> Option<ActionExecutionResult> {
        self.queue().get_action_result(id)
    }

    pub fn queue_status(&self) -> QueueStatus {
        self.queue().get_queue_status()
    }

    pub fn is_window_closed(&self) -> bool {
        self.surface.borrow().is_closed()
    }
}
