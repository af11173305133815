//! End-to-end flows through the bridge against the in-memory viewer

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use viewer_bridge::testing::InMemoryViewer;
use viewer_bridge::{
    ActionStatus, BoundProperty, BridgeError, BridgeEvent, BridgeState, ChangeOrigin,
    EventStream, EventSubscriptions, ReadinessStage, Rotation, ViewerAction, ViewerBridge,
    ViewerCommand, ViewerOptions, Zoom,
};

fn setup(options: ViewerOptions) -> (ViewerBridge, EventStream, InMemoryViewer) {
    let viewer = InMemoryViewer::new("main");
    let (bridge, events) = ViewerBridge::new(options, Box::new(viewer.surface()));
    viewer.connect(bridge.response_router());
    (bridge, events, viewer)
}

fn options() -> ViewerOptions {
    ViewerOptions::new("/files/report.pdf")
        .with_viewer_id("main")
        .with_events(EventSubscriptions::all())
}

fn drain(events: &mut EventStream) -> Vec<BridgeEvent> {
    let mut out = Vec::new();
    while let Ok(Some(event)) = events.try_next() {
        out.push(event);
    }
    out
}

async fn bring_up(bridge: &ViewerBridge, viewer: &InMemoryViewer, pages: u32) {
    for stage in [
        ReadinessStage::ScriptLoaded,
        ReadinessStage::ChannelReady,
        ReadinessStage::ApplicationReady,
        ReadinessStage::ViewerReady,
    ] {
        bridge.handle_message(&viewer.readiness(stage)).await.unwrap();
    }
    bridge
        .handle_message(&viewer.event("pagesLoaded", json!(pages)))
        .await
        .unwrap();
}

#[tokio::test]
async fn full_lifecycle_applies_configuration_once() {
    let mut opts = options()
        .with_page(4)
        .with_zoom("page-width")
        .with_error_message("Document unavailable", true);
    opts.rotation = Some(95);
    opts.scroll = Some("wrapped".to_string());
    opts.locale = Some("fr".to_string());
    let (bridge, mut events, viewer) = setup(opts);

    bridge.load().await.unwrap();
    let url = bridge.viewer_url().unwrap();
    assert!(url.starts_with("assets/pdfjs/web/viewer.html?file=%2Ffiles%2Freport.pdf&viewerId=main"));
    assert!(url.contains("&scroll=WRAPPED&locale=fr#&page=4&zoom=page-width"));
    assert!(url.ends_with("&errorMessage=Document%20unavailable&errorOverride=true"));

    bring_up(&bridge, &viewer, 20).await;

    assert_eq!(
        viewer.received_actions(),
        vec![
            "set-error-message",
            "set-locale",
            "set-scroll",
            "set-zoom",
            "set-page",
            "set-rotation",
        ]
    );
    assert_eq!(viewer.current_page(), Some(4));
    assert_eq!(viewer.current_zoom(), Some(Zoom::PageWidth));
    assert_eq!(viewer.current_rotation(), Rotation::from_degrees(90));

    let states: Vec<BridgeState> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            BridgeEvent::StateChanged { state } => Some(state),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        vec![
            BridgeState::Loading,
            BridgeState::ChannelReady,
            BridgeState::ViewerReady,
            BridgeState::DocumentLoaded,
        ]
    );
    assert_eq!(bridge.queue_status().pending(), 0);
}

#[tokio::test]
async fn readiness_arriving_out_of_order_never_regresses() {
    let (bridge, _events, viewer) = setup(options());
    bridge.load().await.unwrap();

    bridge
        .handle_message(&viewer.readiness(ReadinessStage::ViewerReady))
        .await
        .unwrap();
    bridge
        .handle_message(&viewer.readiness(ReadinessStage::ScriptLoaded))
        .await
        .unwrap();

    assert_eq!(bridge.stage(), ReadinessStage::ViewerReady);
    assert_eq!(bridge.state(), BridgeState::ViewerReady);
}

#[tokio::test]
async fn properties_set_before_load_wait_for_the_viewer() {
    let (bridge, _events, viewer) = setup(options());

    let cursor = bridge.set_cursor("grab").await.unwrap();
    let page = bridge.set_page(2).await.unwrap();
    assert_eq!(bridge.action_status(&cursor), ActionStatus::Pending);

    bridge.load().await.unwrap();
    bring_up(&bridge, &viewer, 5).await;

    assert_eq!(bridge.action_status(&cursor), ActionStatus::Completed);
    assert_eq!(bridge.action_status(&page), ActionStatus::Completed);
    // the cursor was already folded into the URL and plan as well
    assert!(viewer.received_actions().contains(&"set-cursor".to_string()));
    assert_eq!(viewer.current_page(), Some(2));
}

#[tokio::test]
async fn user_changes_are_reported_and_not_echoed() {
    let (bridge, mut events, viewer) = setup(options());
    bridge.load().await.unwrap();
    bring_up(&bridge, &viewer, 8).await;
    drain(&mut events);

    bridge
        .handle_message(&viewer.event("rotationChange", json!(180)))
        .await
        .unwrap();
    let changes: Vec<_> = drain(&mut events)
        .into_iter()
        .filter_map(|e| match e {
            BridgeEvent::PropertyChanged(change) => Some(change),
            _ => None,
        })
        .collect();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].property, BoundProperty::Rotation);
    assert_eq!(changes[0].origin, ChangeOrigin::User);
    assert_eq!(changes[0].value, json!(180));

    let before = viewer.received().len();
    assert_eq!(bridge.set_rotation(180).await, None);
    assert_eq!(viewer.received().len(), before);

    // next inbound message starts a new turn; the same value is sent again
    bridge
        .handle_message(&viewer.event("idle", Value::Null))
        .await
        .unwrap();
    assert!(bridge.set_rotation(180).await.is_some());
    assert_eq!(viewer.received().len(), before + 1);
}

#[tokio::test]
async fn on_demand_result_reports_rejection() {
    let (bridge, _events, viewer) = setup(options());
    bridge.load().await.unwrap();

    let result = bridge
        .send_command(ViewerCommand::Raw {
            action: "bad-action".to_string(),
            payload: Value::Null,
        })
        .await;

    assert!(!result.success);
    assert!(result
        .error
        .as_deref()
        .unwrap()
        .contains("Unknown action: bad-action"));
    assert_eq!(bridge.action_status(&result.action_id), ActionStatus::Failed);

    // the viewer stays usable
    let print = bridge.trigger_print().await;
    assert!(print.success);
    assert_eq!(viewer.applied(), vec![ViewerCommand::TriggerPrint]);
}

#[tokio::test(start_paused = true)]
async fn silent_viewer_times_out_instead_of_hanging() {
    let mut opts = options();
    opts.response_timeout_ms = 500;
    let (bridge, _events, viewer) = setup(opts);
    bridge.load().await.unwrap();
    viewer.set_silent(true);

    let result = bridge.trigger_download().await;
    assert!(!result.success);
    assert!(result.error.unwrap().contains("within 500ms"));
    assert_eq!(bridge.response_router().pending(), 0);
}

#[tokio::test]
async fn popup_blocked_leaves_bridge_unloaded() {
    let (bridge, mut events, viewer) = setup(options().with_external_window(Some(
        "width=800,height=600".to_string(),
    )));
    viewer.block_popups(true);

    let err = bridge.load().await.unwrap_err();
    assert!(matches!(err, BridgeError::PopupBlocked));
    assert_eq!(bridge.state(), BridgeState::Uninitialized);
    assert_eq!(bridge.viewer_url(), None);
    assert!(drain(&mut events).is_empty());

    viewer.block_popups(false);
    bridge.load().await.unwrap();
    assert_eq!(bridge.state(), BridgeState::Loading);
}

#[tokio::test]
async fn teardown_cancels_outstanding_tickets() {
    let (bridge, _events, viewer) = setup(options());
    bridge.load().await.unwrap();

    let queue = viewer_bridge::ActionQueueManager::new(false);
    let (action, ticket) = ViewerAction::new(ViewerCommand::GoToLastPage).with_ticket();
    queue
        .queue_action(action, viewer_bridge::QueueBucket::DocumentLoaded)
        .await;
    queue.clear_queues();
    assert!(matches!(ticket.await, Err(BridgeError::Cancelled)));

    bridge.refresh().await.unwrap();
    assert_eq!(viewer.opened_urls().len(), 2);
}

#[tokio::test]
async fn document_error_and_find_events_are_forwarded() {
    let (bridge, mut events, viewer) = setup(options());
    bridge.load().await.unwrap();
    drain(&mut events);

    bridge
        .handle_message(&viewer.event("documentError", json!({"message": "Invalid PDF"})))
        .await
        .unwrap();
    bridge
        .handle_message(&viewer.event(
            "updateFindMatchesCount",
            json!({"matchesCount": {"current": 3, "total": 11}}),
        ))
        .await
        .unwrap();
    // foreign page scripts post messages too
    bridge
        .handle_message(&json!({"source": "react-devtools"}))
        .await
        .unwrap();

    assert_eq!(
        drain(&mut events),
        vec![
            BridgeEvent::DocumentError {
                message: "Invalid PDF".to_string()
            },
            BridgeEvent::FindMatchesCount {
                current: 3,
                total: 11
            },
        ]
    );
}
