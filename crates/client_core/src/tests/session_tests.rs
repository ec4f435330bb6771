use super::*;
use shared::protocol::SearchResult;

fn response(answer: &str) -> QueryResponse {
    QueryResponse {
        answer: answer.to_string(),
        results: vec![SearchResult {
            title: "T".to_string(),
            content: "C".to_string(),
            url: "http://x".to_string(),
            score: 0.9,
        }],
    }
}

fn network_error() -> SearchError {
    SearchError::NetworkOrServer {
        message: "Search failed. Check that the search server is running.".to_string(),
    }
}

#[test]
fn starts_idle_without_any_query_id() {
    let controller = SessionController::new();
    assert_eq!(controller.current_state(), &SessionState::Idle);
    assert_eq!(controller.last_query_id(), None);
}

#[test]
fn blank_input_leaves_every_state_untouched() {
    let mut controller = SessionController::new();
    for blank in ["", " ", "\t\n", "\u{3000}"] {
        assert_eq!(controller.submit(blank), None);
        assert_eq!(controller.current_state(), &SessionState::Idle);
    }

    let pending = controller.submit("foo").expect("accepted");
    controller.settle(pending.query_id, Ok(response("Hello")));
    let settled = controller.current_state().clone();

    assert_eq!(controller.submit("   "), None);
    assert_eq!(controller.current_state(), &settled);
    assert_eq!(controller.last_query_id(), Some(pending.query_id));
}

#[test]
fn submit_trims_and_goes_pending_synchronously() {
    let mut controller = SessionController::new();
    let pending = controller.submit("  what is cosense  ").expect("accepted");

    assert_eq!(pending.query, "what is cosense");
    assert_eq!(
        controller.current_state(),
        &SessionState::Pending {
            query_id: pending.query_id,
            query: "what is cosense".to_string(),
        }
    );
}

#[test]
fn matching_success_settles_with_exact_response() {
    let mut controller = SessionController::new();
    let pending = controller.submit("foo").expect("accepted");

    assert!(controller.settle(pending.query_id, Ok(response("Hello"))));
    assert_eq!(
        controller.current_state(),
        &SessionState::Success {
            query_id: pending.query_id,
            response: response("Hello"),
        }
    );
}

#[test]
fn matching_failure_surfaces_non_empty_message() {
    let mut controller = SessionController::new();
    let pending = controller.submit("bar").expect("accepted");

    assert!(controller.settle(pending.query_id, Err(network_error())));
    match controller.current_state() {
        SessionState::Failure { query_id, message } => {
            assert_eq!(*query_id, pending.query_id);
            assert!(!message.is_empty());
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn late_outcome_of_superseded_query_is_discarded() {
    let mut controller = SessionController::new();
    let first = controller.submit("a").expect("accepted");
    let second = controller.submit("b").expect("accepted");

    assert!(controller.settle(second.query_id, Ok(response("from b"))));
    assert!(!controller.settle(first.query_id, Ok(response("from a"))));
    assert_eq!(
        controller.current_state(),
        &SessionState::Success {
            query_id: second.query_id,
            response: response("from b"),
        }
    );

    assert!(!controller.settle(first.query_id, Err(network_error())));
    assert!(matches!(
        controller.current_state(),
        SessionState::Success { .. }
    ));
}

#[test]
fn stale_outcome_while_newer_query_pending_keeps_pending() {
    let mut controller = SessionController::new();
    let first = controller.submit("a").expect("accepted");
    let second = controller.submit("b").expect("accepted");

    assert!(!controller.settle(first.query_id, Err(network_error())));
    assert_eq!(
        controller.current_state(),
        &SessionState::Pending {
            query_id: second.query_id,
            query: "b".to_string(),
        }
    );
}

#[test]
fn settling_twice_only_applies_once() {
    let mut controller = SessionController::new();
    let pending = controller.submit("foo").expect("accepted");

    assert!(controller.settle(pending.query_id, Ok(response("Hello"))));
    assert!(!controller.settle(pending.query_id, Err(network_error())));
    assert!(matches!(
        controller.current_state(),
        SessionState::Success { .. }
    ));
}

#[test]
fn resubmitting_after_settlement_uses_strictly_greater_ids() {
    let mut controller = SessionController::new();
    let mut previous = None;

    for (query, outcome) in [
        ("one", Ok(response("first"))),
        ("two", Err(network_error())),
        ("three", Ok(response("third"))),
    ] {
        let pending = controller.submit(query).expect("accepted");
        if let Some(previous) = previous {
            assert!(pending.query_id > previous);
        }
        assert!(controller.current_state().is_pending());
        controller.settle(pending.query_id, outcome);
        previous = Some(pending.query_id);
    }

    assert_eq!(
        controller.current_state(),
        &SessionState::Success {
            query_id: QueryId(3),
            response: response("third"),
        }
    );
}

#[test]
fn failure_is_replaced_rather_than_shown_alongside_new_answer() {
    let mut controller = SessionController::new();
    let failed = controller.submit("bar").expect("accepted");
    controller.settle(failed.query_id, Err(network_error()));

    let retried = controller.submit("bar").expect("accepted");
    assert_eq!(controller.current_state().label(), "pending");

    controller.settle(retried.query_id, Ok(response("Hello")));
    assert!(matches!(
        controller.current_state(),
        SessionState::Success { response, .. } if response.answer == "Hello"
    ));
}
