use nextpoint::trust_region::{LengthChange, LengthSchedule, compute_box};
use nextpoint::{Bounds, Error, History};

fn assert_close(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-12, "{a} != {b}");
}

#[test]
fn scenario_box_is_clipped_to_unit_square() {
    let bounds = Bounds::unit(2).unwrap();
    let history =
        History::from_parts(vec![vec![0.2, 0.3], vec![0.7, 0.8]], vec![1.0, 2.0]).unwrap();
    let anchor = &history.best().unwrap().input;
    assert_eq!(anchor, &[0.7, 0.8]);

    let region = compute_box(anchor, &bounds, 0.5).unwrap();
    assert_close(region.lower()[0], 0.45);
    assert_close(region.upper()[0], 0.95);
    assert_close(region.lower()[1], 0.55);
    assert_close(region.upper()[1], 1.0);
}

#[test]
fn box_is_subset_of_bounds() {
    let bounds = Bounds::new(vec![-2.0, 0.0, 100.0], vec![3.0, 0.5, 200.0]).unwrap();
    let anchors = [
        vec![-2.0, 0.0, 100.0],
        vec![3.0, 0.5, 200.0],
        vec![0.0, 0.25, 150.0],
        vec![2.9, 0.01, 101.0],
    ];
    for anchor in &anchors {
        for length in [1e-9, 0.1, 0.5, 1.0, 1.6, 10.0, 1e9] {
            let region = compute_box(anchor, &bounds, length).unwrap();
            for i in 0..3 {
                assert!(bounds.lower()[i] <= region.lower()[i]);
                assert!(region.lower()[i] <= anchor[i]);
                assert!(anchor[i] <= region.upper()[i]);
                assert!(region.upper()[i] <= bounds.upper()[i]);
            }
        }
    }
}

#[test]
fn box_collapses_and_expands_in_the_limits() {
    let bounds = Bounds::new(vec![0.0, -1.0], vec![10.0, 1.0]).unwrap();
    let anchor = [4.0, 0.2];

    let tiny = compute_box(&anchor, &bounds, 1e-12).unwrap();
    for i in 0..2 {
        assert!((tiny.upper()[i] - tiny.lower()[i]).abs() < 1e-10);
        assert!((tiny.lower()[i] - anchor[i]).abs() < 1e-10);
    }

    let huge = compute_box(&anchor, &bounds, 1e12).unwrap();
    assert_eq!(huge.lower(), bounds.lower());
    assert_eq!(huge.upper(), bounds.upper());
    assert!(!huge.is_degenerate());
}

#[test]
fn box_width_scales_with_global_width() {
    let bounds = Bounds::new(vec![0.0, 0.0], vec![1.0, 100.0]).unwrap();
    let region = compute_box(&[0.5, 50.0], &bounds, 0.2).unwrap();
    assert_close(region.upper()[0] - region.lower()[0], 0.2);
    assert!((region.upper()[1] - region.lower()[1] - 20.0).abs() < 1e-9);
}

#[test]
fn anchor_outside_bounds_is_rejected() {
    let bounds = Bounds::unit(2).unwrap();
    match compute_box(&[-0.1, 0.5], &bounds, 0.5) {
        Err(Error::AnchorOutOfBounds {
            dim,
            value,
            lower,
            upper,
        }) => {
            assert_eq!(dim, 0);
            assert_close(value, -0.1);
            assert_close(lower, 0.0);
            assert_close(upper, 1.0);
        }
        other => panic!("expected AnchorOutOfBounds, got {other:?}"),
    }
}

#[test]
fn negative_length_is_rejected() {
    let bounds = Bounds::unit(1).unwrap();
    assert!(matches!(
        compute_box(&[0.5], &bounds, -1.0),
        Err(Error::InvalidLength(_))
    ));
}

fn history_from_values(values: &[f64]) -> History {
    let inputs = (0..values.len())
        .map(|i| vec![f64::from(u32::try_from(i).unwrap()) / 100.0])
        .collect();
    History::from_parts(inputs, values.to_vec()).unwrap()
}

#[test]
fn replay_without_proposals_starts_at_init() {
    let schedule = LengthSchedule::default();
    let history = history_from_values(&[1.0, 0.5, 0.2]);
    let state = schedule.replay(&history, 3, 1, 1e-3).unwrap();
    assert_close(state.length(), 0.8);
    assert_eq!(state.successes(), 0);
    assert_eq!(state.failures(), 0);
}

#[test]
fn replay_expands_after_consecutive_successes() {
    let schedule = LengthSchedule::default();
    let history = history_from_values(&[1.0, 0.0, 1.5, 2.0, 2.5]);
    let state = schedule.replay(&history, 2, 1, 1e-3).unwrap();
    assert_close(state.length(), 1.6);
    assert_eq!(state.successes(), 0);
}

#[test]
fn replay_shrinks_after_consecutive_failures() {
    let schedule = LengthSchedule::default();
    let history = history_from_values(&[1.0, 0.9, 0.8, 1.0, 0.5, 0.7]);
    let state = schedule.replay(&history, 1, 1, 1e-3).unwrap();
    // Five failures: one halving, then one failure toward the next.
    assert_close(state.length(), 0.4);
    assert_eq!(state.failures(), 1);
}

#[test]
fn replay_ignores_improvements_below_tolerance() {
    let schedule = LengthSchedule::default();
    let history = history_from_values(&[10.0, 10.001, 10.002, 10.003, 10.004]);
    let state = schedule.replay(&history, 1, 1, 1e-3).unwrap();
    assert_close(state.length(), 0.4);
}

#[test]
fn replay_groups_batches() {
    let schedule = LengthSchedule {
        success_tolerance: 2,
        ..LengthSchedule::default()
    };
    // Batches of two: [0.5, 1.5] succeeds, [1.0, 1.2] fails, [3.0, 0.0] and
    // [0.0, 4.0] succeed.
    let history = history_from_values(&[1.0, 0.5, 1.5, 1.0, 1.2, 3.0, 0.0, 0.0, 4.0]);
    let state = schedule.replay(&history, 1, 2, 0.0).unwrap();
    assert_close(state.length(), 1.6);
}

#[test]
fn replay_restarts_after_collapse() {
    let schedule = LengthSchedule {
        init: 0.5,
        min: 0.2,
        max: 1.0,
        success_tolerance: 3,
        failure_tolerance: 1,
    };
    // Every proposal fails: 0.5 -> 0.25 -> 0.125 < min, restart at 0.5.
    let history = history_from_values(&[1.0, 0.0, 0.0]);
    let state = schedule.replay(&history, 1, 1, 0.0).unwrap();
    assert_eq!(state.restarts(), 1);
    assert_close(state.length(), 0.5);
}

#[test]
fn replay_validates_configuration() {
    let history = history_from_values(&[1.0, 2.0]);
    assert!(matches!(
        LengthSchedule::default().replay(&history, 1, 0, 0.0),
        Err(Error::InvalidConfig(_))
    ));
    let inverted = LengthSchedule {
        min: 1.0,
        max: 0.5,
        ..LengthSchedule::default()
    };
    assert!(matches!(
        inverted.replay(&history, 1, 1, 0.0),
        Err(Error::InvalidConfig(_))
    ));
}

#[test]
fn record_reports_changes() {
    let schedule = LengthSchedule {
        success_tolerance: 1,
        failure_tolerance: 1,
        ..LengthSchedule::default()
    };
    let mut state = schedule.start();
    assert_eq!(state.record(&schedule, true), LengthChange::Expanded);
    assert_eq!(state.record(&schedule, false), LengthChange::Shrunk);
    assert_close(state.length(), 0.8);
    assert!(!state.needs_restart(&schedule));
}
