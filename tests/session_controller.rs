//! Session controller tests against scripted backends

mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::*;
use framesnap::*;
use serial_test::serial;
use tempfile::tempdir;

fn controller(opener: Arc<ScriptedOpener>, inventory: ScriptedInventory) -> SessionController {
    init_logging();
    let config = SessionConfigBuilder::new()
        .device_poll_floor(Duration::from_millis(2))
        .region_poll_floor(Duration::from_millis(5))
        .build()
        .unwrap();
    SessionController::with_backends(config, opener, Box::new(inventory)).unwrap()
}

/// Poll until an event matching `pred` shows up, collecting everything seen
fn poll_until(
    session: &mut SessionController,
    pred: impl Fn(&SessionEvent) -> bool,
) -> Vec<SessionEvent> {
    let mut seen = Vec::new();
    let found = wait_for(Duration::from_secs(5), || {
        let events = session.poll_events();
        let hit = events.iter().any(&pred);
        seen.extend(events);
        hit
    });
    assert!(found, "event not observed; saw {:?}", seen);
    seen
}

fn wait_for_frame(session: &mut SessionController) {
    poll_until(session, |e| matches!(e, SessionEvent::Frame(_)));
}

#[test]
fn test_start_without_selection_fails() {
    let mut session = controller(ScriptedOpener::endless(), ScriptedInventory::default());
    assert!(matches!(
        session.start_session(),
        Err(SessionError::NoSourceSelected)
    ));
    assert_eq!(session.state(), SessionState::Idle);
}

#[test]
fn test_unavailable_device_stops_without_frames() {
    let opener = ScriptedOpener::unavailable();
    let mut session = controller(Arc::clone(&opener), ScriptedInventory::default());

    session
        .select_source(SourceDescriptor::Device { index: 7 })
        .unwrap();
    session.start_session().unwrap();

    let events = poll_until(&mut session, |e| matches!(e, SessionEvent::Stopped(_)));
    assert!(!events.iter().any(|e| matches!(e, SessionEvent::Frame(_))));
    assert!(matches!(
        events.last(),
        Some(SessionEvent::Stopped(StopReason::OpenFailed(
            OpenError::Unavailable { .. }
        )))
    ));
    assert_eq!(session.state(), SessionState::Stopped);
    assert!(session.latest_frame().is_none());
}

#[test]
#[serial]
fn test_no_frame_events_after_stop() {
    let opener = ScriptedOpener::endless();
    let mut session = controller(Arc::clone(&opener), ScriptedInventory::default());

    session
        .select_source(SourceDescriptor::Stream {
            url: "rtsp://camera.local/live".to_string(),
        })
        .unwrap();
    session.start_session().unwrap();
    wait_for_frame(&mut session);

    // Let frame events pile up unread before stopping
    thread::sleep(Duration::from_millis(30));
    session.stop_session().unwrap();
    assert_eq!(session.state(), SessionState::Stopped);
    assert_eq!(opener.closes(), 1);

    let after = session.poll_events();
    assert!(!after.iter().any(|e| matches!(e, SessionEvent::Frame(_))));
    assert_eq!(
        after.last(),
        Some(&SessionEvent::Stopped(StopReason::Requested))
    );

    thread::sleep(Duration::from_millis(30));
    assert!(session.poll_events().is_empty());
}

#[test]
fn test_connected_event_makes_session_live() {
    let mut session = controller(ScriptedOpener::endless(), ScriptedInventory::default());
    session
        .select_source(SourceDescriptor::Device { index: 0 })
        .unwrap();
    session.start_session().unwrap();
    assert!(session.is_live());

    poll_until(&mut session, |e| matches!(e, SessionEvent::Connected(_)));
    assert_eq!(session.state(), SessionState::Live);
    session.stop_session().unwrap();
}

#[test]
fn test_changes_rejected_while_live() {
    let mut session = controller(ScriptedOpener::endless(), ScriptedInventory::default());
    session
        .select_source(SourceDescriptor::Device { index: 0 })
        .unwrap();
    session.start_session().unwrap();

    assert!(matches!(
        session.select_source(SourceDescriptor::Device { index: 1 }),
        Err(SessionError::SessionActive)
    ));
    assert!(matches!(
        session.start_session(),
        Err(SessionError::SessionActive)
    ));

    session.stop_session().unwrap();
    assert!(matches!(
        session.stop_session(),
        Err(SessionError::NoActiveSession)
    ));
    session
        .select_source(SourceDescriptor::Device { index: 1 })
        .unwrap();
}

#[test]
fn test_restart_after_source_ends() {
    let opener = ScriptedOpener::limited(2, PullError::Fatal("eof".to_string()));
    let mut session = controller(Arc::clone(&opener), ScriptedInventory::default());
    session
        .select_source(SourceDescriptor::Device { index: 0 })
        .unwrap();

    for round in 1..=2 {
        session.start_session().unwrap();
        poll_until(&mut session, |e| {
            matches!(e, SessionEvent::Stopped(StopReason::PullFailed(_)))
        });
        assert_eq!(session.state(), SessionState::Stopped);
        assert_eq!(opener.opens(), round);
        assert_eq!(opener.closes(), round);
    }
}

#[test]
fn test_refresh_then_select_first_resolves_entry() {
    let opener = ScriptedOpener::endless();
    let inventory = ScriptedInventory::listing(vec![window("Editor", 0x11), window("Browser", 0x22)]);
    let mut session = controller(Arc::clone(&opener), inventory);

    let first = session.refresh_windows().first().cloned().unwrap();
    session.select_window(&first.title).unwrap();
    session.start_session().unwrap();
    poll_until(&mut session, |e| matches!(e, SessionEvent::Connected(_)));
    session.stop_session().unwrap();

    assert_eq!(
        opener.last_descriptor(),
        Some(SourceDescriptor::from_window(&first))
    );
    assert_eq!(
        opener.last_descriptor().unwrap().kind(),
        SourceKind::Region
    );
}

#[test]
fn test_unknown_window_is_rejected() {
    let inventory = ScriptedInventory::listing(vec![window("Editor", 1)]);
    let mut session = controller(ScriptedOpener::endless(), inventory);
    session.refresh_windows();

    assert!(matches!(
        session.select_window("Terminal"),
        Err(SessionError::UnknownWindow(title)) if title == "Terminal"
    ));
}

#[test]
fn test_refresh_rebinds_selection() {
    let inventory = ScriptedInventory::listing(vec![window("Editor", 1), window("Browser", 2)]);
    let mut session = controller(ScriptedOpener::endless(), inventory.clone());

    session.refresh_windows();
    session.select_window("Browser").unwrap();

    // Title survives with a new handle
    inventory.set(vec![window("Browser", 9), window("Editor", 1)]);
    let generation = session.windows().generation();
    session.refresh_windows();
    assert!(session.windows().generation() > generation);
    assert_eq!(
        session.selection(),
        Some(&Selection::Window("Browser".to_string()))
    );

    // Title gone: fall back to the first entry
    inventory.set(vec![window("Mail", 3), window("Editor", 1)]);
    session.refresh_windows();
    assert_eq!(
        session.selection(),
        Some(&Selection::Window("Mail".to_string()))
    );

    // Nothing listed: selection cleared
    inventory.set(Vec::new());
    session.refresh_windows();
    assert!(session.selection().is_none());
}

#[test]
fn test_region_without_refresh_has_no_target() {
    let opener = ScriptedOpener::endless();
    let mut session = controller(Arc::clone(&opener), ScriptedInventory::default());
    session
        .select_source(SourceDescriptor::Region {
            target: RegionTarget::FullScreen,
            bounds: None,
        })
        .unwrap();

    assert!(matches!(
        session.start_session(),
        Err(SessionError::Open(OpenError::NoTarget(_)))
    ));
    assert_eq!(opener.opens(), 0);
}

#[test]
fn test_unsupported_inventory_offers_full_screen() {
    let opener = ScriptedOpener::endless();
    let mut session = controller(Arc::clone(&opener), ScriptedInventory::unsupported());

    let titles: Vec<String> = session
        .refresh_windows()
        .titles()
        .map(str::to_string)
        .collect();
    assert_eq!(titles, vec![WindowEntry::FULL_SCREEN_TITLE.to_string()]);

    session.select_window(WindowEntry::FULL_SCREEN_TITLE).unwrap();
    session.start_session().unwrap();
    poll_until(&mut session, |e| matches!(e, SessionEvent::Connected(_)));
    session.stop_session().unwrap();

    assert_eq!(
        opener.last_descriptor(),
        Some(SourceDescriptor::Region {
            target: RegionTarget::FullScreen,
            bounds: None
        })
    );
}

#[test]
fn test_capture_and_save_flow() {
    let dir = tempdir().unwrap();
    let mut session = controller(ScriptedOpener::endless(), ScriptedInventory::default());
    session.set_output_dir(dir.path());

    assert!(matches!(
        session.request_capture(),
        Err(SessionError::NoActiveSession)
    ));
    assert!(matches!(
        session.request_save("early", None),
        Err(SaveError::NothingCaptured)
    ));

    session
        .select_source(SourceDescriptor::Device { index: 0 })
        .unwrap();
    session.start_session().unwrap();
    wait_for_frame(&mut session);

    let captured = session.request_capture().unwrap();
    assert_eq!(session.pending_snapshot().unwrap().frame, captured);

    // Failed save keeps the snapshot for a retry
    let missing = dir.path().join("missing");
    assert!(matches!(
        session.request_save("first", Some(&missing)),
        Err(SaveError::Io { .. })
    ));
    assert!(session.pending_snapshot().is_some());

    let path = session.request_save("first", None).unwrap();
    assert_eq!(path, dir.path().join("first.jpg"));
    assert!(session.pending_snapshot().is_none());
    assert!(matches!(
        session.request_save("again", None),
        Err(SaveError::NothingCaptured)
    ));

    session.stop_session().unwrap();
    assert!(matches!(
        session.request_capture(),
        Err(SessionError::NoActiveSession)
    ));

    let saved = image::open(&path).unwrap();
    assert_eq!((saved.width(), saved.height()), (captured.width, captured.height));
}

#[test]
fn test_preview_fits_min_viewport() {
    let mut session = controller(ScriptedOpener::endless(), ScriptedInventory::default());
    assert!(session.preview(Dimensions::new(800, 600)).is_none());

    session
        .select_source(SourceDescriptor::Device { index: 0 })
        .unwrap();
    session.start_session().unwrap();
    wait_for_frame(&mut session);

    // 64x48 frames, collapsed viewport floored to 640x480
    let preview = session.preview(Dimensions::new(0, 0)).unwrap();
    assert_eq!((preview.width, preview.height), (640, 480));

    let rgb = session.preview_rgb(Dimensions::new(1000, 600)).unwrap();
    assert_eq!(rgb.dimensions(), (800, 600));

    session.stop_session().unwrap();
}

#[test]
fn test_invalid_configuration_is_rejected() {
    let mut config = SessionConfig::default();
    config.jpeg_quality = 0;
    let result = SessionController::with_backends(
        config,
        ScriptedOpener::endless(),
        Box::new(ScriptedInventory::default()),
    );
    assert!(matches!(
        result,
        Err(SessionError::InvalidConfiguration(_))
    ));
}

#[test]
#[serial]
fn test_unpolled_frames_are_coalesced() {
    let mut session = controller(ScriptedOpener::endless(), ScriptedInventory::default());
    session
        .select_source(SourceDescriptor::Device { index: 0 })
        .unwrap();
    session.start_session().unwrap();

    // Hundreds of frames are published at a 2ms floor while nobody polls
    thread::sleep(Duration::from_millis(500));
    let events = session.poll_events();
    let frames: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::Frame(frame) => Some(frame.sequence),
            _ => None,
        })
        .collect();

    assert!(frames.len() <= 1, "{} frame events queued", frames.len());
    assert!(matches!(events.first(), Some(SessionEvent::Connected(_))));
    assert!(session.latest_frame().unwrap().sequence > 10);

    session.stop_session().unwrap();
}

#[test]
fn test_stale_window_descriptor_has_no_target() {
    let inventory = ScriptedInventory::listing(vec![window("Editor", 1)]);
    let opener = ScriptedOpener::endless();
    let mut session = controller(Arc::clone(&opener), inventory.clone());
    session.refresh_windows();

    let stale = SourceDescriptor::Region {
        target: RegionTarget::Window(WindowHandle(42)),
        bounds: Some(Rectangle::new(0, 0, 100, 100)),
    };
    session.select_source(stale.clone()).unwrap();
    assert!(matches!(
        session.start_session(),
        Err(SessionError::Open(OpenError::NoTarget(_)))
    ));
    assert_eq!(opener.opens(), 0);

    // Listed by a later refresh, the same descriptor opens
    inventory.set(vec![window("Editor", 1), window("Viewer", 42)]);
    session.refresh_windows();
    session.start_session().unwrap();
    poll_until(&mut session, |e| matches!(e, SessionEvent::Connected(_)));
    session.stop_session().unwrap();
    assert_eq!(opener.last_descriptor(), Some(stale));
}
