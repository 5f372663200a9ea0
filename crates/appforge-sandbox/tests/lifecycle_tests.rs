use appforge_sandbox::{
    allowed_transitions, validate_transition, ChannelMessage, Delivery, DocumentBuilder,
    ErrorReport, IsolationPolicy, LifecycleController, LifecycleState, SandboxEvent,
};
use appforge_test_utils::{valid_artifact, THROWING_APP};
use proptest::prelude::*;

fn any_state() -> impl Strategy<Value = LifecycleState> {
    prop_oneof![
        Just(LifecycleState::Empty),
        Just(LifecycleState::Mounted),
        Just(LifecycleState::Errored),
    ]
}

#[test]
fn test_empty_transitions() {
    assert!(validate_transition(LifecycleState::Empty, LifecycleState::Mounted).is_ok());
    assert!(validate_transition(LifecycleState::Empty, LifecycleState::Errored).is_err());
    assert!(validate_transition(LifecycleState::Empty, LifecycleState::Empty).is_err());
}

#[test]
fn test_no_way_back_to_empty() {
    assert!(validate_transition(LifecycleState::Mounted, LifecycleState::Empty).is_err());
    assert!(validate_transition(LifecycleState::Errored, LifecycleState::Empty).is_err());
}

#[test]
fn test_raw_messages_drive_controller() {
    let mut controller = LifecycleController::default();
    let generation = controller.mount(valid_artifact()).unwrap();

    let raw = format!(
        r#"{{"type":"ERROR","generation":{generation},"message":"items is undefined","stack":"at App"}}"#
    );
    assert_eq!(controller.deliver(&raw), Delivery::Applied(LifecycleState::Errored));
    assert_eq!(
        controller.status().last_error,
        Some(ErrorReport::new("items is undefined").with_stack("at App"))
    );

    let bogus = format!(r#"{{"type":"PWNED","generation":{generation}}}"#);
    assert!(matches!(controller.deliver(&bogus), Delivery::Rejected(_)));
    assert_eq!(controller.state(), LifecycleState::Errored);
}

#[test]
fn test_throwing_artifact_document_is_sandboxed() {
    let artifact = appforge_test_utils::checked_artifact(THROWING_APP);
    assert!(artifact.is_valid());

    let html = DocumentBuilder::default().build(&artifact, "Broken", 4).unwrap();
    assert!(html.contains("\"generation\":4,"));

    let iframe = IsolationPolicy::default().iframe_markup(&html, "Broken", 4);
    assert!(iframe.contains("sandbox=\"allow-scripts\""));
}

#[derive(Debug, Clone)]
enum Op {
    Mount,
    Refresh,
    Error { lag: u64 },
    Rendered { lag: u64 },
    Ready,
    ToggleView,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Mount),
        Just(Op::Refresh),
        (0u64..3).prop_map(|lag| Op::Error { lag }),
        (0u64..3).prop_map(|lag| Op::Rendered { lag }),
        Just(Op::Ready),
        Just(Op::ToggleView),
    ]
}

proptest! {
    #[test]
    fn prop_all_transitions_are_subset_of_allowed(from in any_state(), to in any_state()) {
        let res = validate_transition(from, to);
        let allowed = allowed_transitions(from);
        prop_assert_eq!(res.is_ok(), allowed.contains(&to));
    }

    #[test]
    fn prop_stale_events_never_touch_active_session(ops in proptest::collection::vec(op(), 1..40)) {
        let mut controller = LifecycleController::new(None);
        let mut generations_seen: u64 = 0;

        for op in ops {
            let before = controller.status();
            match op {
                Op::Mount => {
                    let generation = controller.mount(valid_artifact()).unwrap();
                    prop_assert_eq!(generation, generations_seen + 1);
                    generations_seen = generation;
                    prop_assert_eq!(controller.state(), LifecycleState::Mounted);
                    prop_assert!(controller.status().last_error.is_none());
                }
                Op::Refresh => match controller.refresh() {
                    Some(generation) => {
                        prop_assert_eq!(generation, generations_seen + 1);
                        generations_seen = generation;
                        prop_assert_eq!(controller.state(), LifecycleState::Mounted);
                    }
                    None => prop_assert_eq!(controller.state(), LifecycleState::Empty),
                },
                Op::Error { lag } | Op::Rendered { lag } if lag > 0 => {
                    let Some(active) = controller.generation() else { continue };
                    let Some(stale) = active.checked_sub(lag).filter(|g| *g > 0) else { continue };
                    let event = if matches!(op, Op::Error { .. }) {
                        SandboxEvent::Error(ErrorReport::new("stale"))
                    } else {
                        SandboxEvent::Rendered
                    };
                    let delivery = controller.handle(ChannelMessage::new(stale, event));
                    let is_stale = matches!(delivery, Delivery::Stale { .. });
                    prop_assert!(is_stale);
                    prop_assert_eq!(controller.status(), before);
                }
                Op::Error { .. } => {
                    if let Some(active) = controller.generation() {
                        controller.handle(ChannelMessage::new(
                            active,
                            SandboxEvent::Error(ErrorReport::new("live")),
                        ));
                        prop_assert_eq!(controller.state(), LifecycleState::Errored);
                    }
                }
                Op::Rendered { .. } => {
                    if let Some(active) = controller.generation() {
                        controller.handle(ChannelMessage::new(active, SandboxEvent::Rendered));
                        prop_assert_eq!(controller.state(), LifecycleState::Mounted);
                        prop_assert!(controller.status().last_error.is_none());
                    }
                }
                Op::Ready => {
                    if let Some(active) = controller.generation() {
                        controller.handle(ChannelMessage::new(active, SandboxEvent::Ready));
                        prop_assert_eq!(controller.state(), before.state);
                    }
                }
                Op::ToggleView => {
                    controller.toggle_view();
                    prop_assert_eq!(controller.generation(), before.generation);
                    prop_assert_eq!(controller.state(), before.state);
                }
            }
        }
    }
}
