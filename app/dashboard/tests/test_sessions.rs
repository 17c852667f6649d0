//! FILENAME: tests/test_sessions.rs
//! Integration tests for the session registry.

mod common;

use std::sync::Arc;
use std::thread;

use app_lib::{close_session, get_filter_panel, open_session, render_report, select, AppError, AppState, SessionId};
use common::{fixture_dataset, TestHarness};

#[test]
fn test_sessions_are_independent() {
    let harness = TestHarness::new();
    let other = open_session(&harness.state).unwrap();
    assert_eq!(harness.state.session_count(), 2);

    harness.select("Province", "Punjab").unwrap();
    select(&harness.state, other, "Province", "Sindh").unwrap();

    assert_eq!(harness.scalar("total_population"), 1480.0);
    let other_report = render_report(&harness.state, other).unwrap();
    assert_eq!(
        other_report.aggregate("total_population").unwrap().output.as_scalar(),
        Some(2040.0)
    );
}

#[test]
fn test_close_session() {
    let harness = TestHarness::new();
    close_session(&harness.state, harness.session).unwrap();
    assert_eq!(harness.state.session_count(), 0);

    assert!(matches!(
        get_filter_panel(&harness.state, harness.session),
        Err(AppError::UnknownSession(id)) if id == harness.session
    ));
    assert!(matches!(
        close_session(&harness.state, harness.session),
        Err(AppError::UnknownSession(_))
    ));
}

#[test]
fn test_unknown_session_id() {
    let harness = TestHarness::new();
    let stranger = SessionId::new_v4();
    assert!(matches!(
        select(&harness.state, stranger, "Province", "Punjab"),
        Err(AppError::UnknownSession(_))
    ));
}

#[test]
fn test_concurrent_sessions_share_one_dataset() {
    let state = Arc::new(AppState::with_dataset(Default::default(), fixture_dataset()).unwrap());
    let provinces = ["Punjab", "Sindh", "Punjab", "Sindh"];

    let handles: Vec<_> = provinces
        .iter()
        .map(|&province| {
            let state = Arc::clone(&state);
            thread::spawn(move || {
                let id = open_session(&state).unwrap();
                select(&state, id, "Province", province).unwrap();
                let report = render_report(&state, id).unwrap();
                (province, report.aggregate("total_population").unwrap().output.as_scalar())
            })
        })
        .collect();

    for handle in handles {
        let (province, total) = handle.join().unwrap();
        let expected = if province == "Punjab" { 1480.0 } else { 2040.0 };
        assert_eq!(total, Some(expected));
    }
    assert_eq!(state.session_count(), 4);
    assert_eq!(Arc::strong_count(&state.dataset), 1 + 4);
}
