use std::cell::RefCell;
use std::rc::Rc;

use quickcheck_macros::quickcheck;
use sentiment_chart_wasm::domain::animation::{AnimatedValue, AnimationHandle, ManualFrameScheduler, animate};
use sentiment_chart_wasm::domain::sentiment::{LabelStyle, sentiment_label};

fn recorder() -> (Rc<RefCell<Vec<f64>>>, impl Fn(f64) + 'static) {
    let values = Rc::new(RefCell::new(Vec::new()));
    let sink = {
        let values = Rc::clone(&values);
        move |value| values.borrow_mut().push(value)
    };
    (values, sink)
}

#[test]
fn counter_runs_zero_to_hundred_in_half_a_second() {
    let scheduler = ManualFrameScheduler::new();
    let (values, sink) = recorder();
    let handle = animate(&scheduler, 0.0, 100.0, 0.5, sink);

    scheduler.tick();
    assert_eq!(values.borrow().last(), Some(&0.0));

    scheduler.advance(250.0);
    let halfway = *values.borrow().last().unwrap();
    assert!(halfway > 50.0 && halfway < 100.0, "ease-out is past linear at the midpoint: {halfway}");

    scheduler.advance(250.0);
    assert_eq!(values.borrow().last(), Some(&100.0));
    assert!(handle.is_finished());
    assert_eq!(scheduler.pending(), 0);

    let count = values.borrow().len();
    scheduler.advance(16.0);
    assert_eq!(values.borrow().len(), count);
}

#[quickcheck]
fn last_update_is_exactly_the_target(from: i32, to: i32, duration_ms: u16, step_ms: u8) -> bool {
    let from = from as f64 / 100.0;
    let to = to as f64 / 100.0;
    let duration_ms = (duration_ms % 3000) as f64 + 1.0;
    let step_ms = (step_ms % 40) as f64 + 1.0;

    let scheduler = ManualFrameScheduler::new();
    let (values, sink) = recorder();
    let handle = animate(&scheduler, from, to, duration_ms / 1000.0, sink);
    scheduler.tick();
    scheduler.run_for(duration_ms + step_ms, step_ms);

    let values = values.borrow();
    let monotonic = values.windows(2).all(|pair| {
        if to >= from { pair[1] >= pair[0] - 1e-9 } else { pair[1] <= pair[0] + 1e-9 }
    });
    values.first() == Some(&from) && values.last() == Some(&to) && monotonic && handle.is_finished()
}

#[test]
fn cancelled_animation_emits_nothing_more() {
    let scheduler = ManualFrameScheduler::new();
    let (values, sink) = recorder();
    let mut handle = animate(&scheduler, 0.0, 1.0, 1.0, sink);

    scheduler.tick();
    scheduler.advance(16.0);
    let count = values.borrow().len();

    handle.cancel();
    assert_eq!(scheduler.pending(), 0);
    scheduler.advance(16.0);
    scheduler.advance(2000.0);
    assert_eq!(values.borrow().len(), count);
    assert!(!handle.is_finished());
}

#[test]
fn dropping_the_handle_cancels() {
    let scheduler = ManualFrameScheduler::new();
    let (values, sink) = recorder();
    let handle = animate(&scheduler, 0.0, 1.0, 1.0, sink);
    scheduler.tick();
    drop(handle);

    scheduler.run_for(2000.0, 16.0);
    assert_eq!(values.borrow().len(), 1);
}

#[test]
fn cancel_from_inside_an_update_stops_the_next_frame() {
    let scheduler = ManualFrameScheduler::new();
    let slot: Rc<RefCell<Option<AnimationHandle>>> = Rc::new(RefCell::new(None));
    let seen = Rc::new(RefCell::new(0usize));

    let handle = {
        let slot = Rc::clone(&slot);
        let seen = Rc::clone(&seen);
        animate(&scheduler, 0.0, 10.0, 1.0, move |_| {
            *seen.borrow_mut() += 1;
            if *seen.borrow() == 2 {
                if let Some(handle) = slot.borrow_mut().as_mut() {
                    handle.cancel();
                }
            }
        })
    };
    *slot.borrow_mut() = Some(handle);

    scheduler.run_for(1000.0, 16.0);
    assert_eq!(*seen.borrow(), 2);
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn new_target_supersedes_from_the_displayed_value() {
    let scheduler = ManualFrameScheduler::new();
    let (values, sink) = recorder();
    let mut value = AnimatedValue::new(scheduler.clone(), 0.0, 0.5, sink);

    value.set_target(100.0);
    scheduler.tick();
    scheduler.advance(100.0);
    let mid = value.displayed();
    assert!(mid > 0.0 && mid < 100.0);

    value.set_target(50.0);
    assert_eq!(scheduler.pending(), 1, "exactly one interpolation is queued");
    let before_retarget = values.borrow().len();

    scheduler.tick();
    assert_eq!(values.borrow()[before_retarget], mid);

    scheduler.run_for(1000.0, 16.0);
    assert_eq!(value.displayed(), 50.0);
    assert!(!value.is_animating());
    let after = &values.borrow()[before_retarget..];
    assert!(after.iter().all(|v| *v <= mid.max(50.0) + 1e-9 && *v >= mid.min(50.0) - 1e-9));
}

#[test]
fn large_jump_restarts_from_origin() {
    let scheduler = ManualFrameScheduler::new();
    let (values, sink) = recorder();
    let mut score = AnimatedValue::new(scheduler.clone(), 0.0, 0.3, sink)
        .with_restart_threshold(0.25, 0.0);

    score.set_target(0.8);
    scheduler.tick();
    scheduler.run_for(500.0, 16.0);
    assert_eq!(score.displayed(), 0.8);

    // Small move continues from where the display is.
    score.set_target(0.9);
    let start = values.borrow().len();
    scheduler.tick();
    assert_eq!(values.borrow()[start], 0.8);
    scheduler.run_for(500.0, 16.0);

    // Large move replays the sweep from neutral.
    score.set_target(-0.6);
    let start = values.borrow().len();
    scheduler.tick();
    assert_eq!(values.borrow()[start], 0.0);
    scheduler.run_for(500.0, 16.0);
    assert_eq!(score.displayed(), -0.6);
}

#[test]
fn unchanged_target_keeps_the_running_interpolation() {
    let scheduler = ManualFrameScheduler::new();
    let mut value = AnimatedValue::new(scheduler.clone(), 0.0, 1.0, |_| {});
    value.set_target(1.0);
    scheduler.tick();
    scheduler.advance(200.0);
    let displayed = value.displayed();

    value.set_target(1.0);
    scheduler.tick();
    assert_eq!(value.displayed(), displayed, "no restart from the initial value");
    assert!(value.is_animating());
}

#[test]
fn stop_leaves_the_value_where_it_is() {
    let scheduler = ManualFrameScheduler::new();
    let mut value = AnimatedValue::new(scheduler.clone(), 0.0, 1.0, |_| {});
    value.set_target(1.0);
    scheduler.tick();
    scheduler.advance(300.0);
    let displayed = value.displayed();

    value.stop();
    scheduler.run_for(2000.0, 16.0);
    assert_eq!(value.displayed(), displayed);
    assert_eq!(scheduler.pending(), 0);
}

#[test]
fn bearish_to_bullish_sweep_passes_through_neutral() {
    let scheduler = ManualFrameScheduler::new();
    let labels = Rc::new(RefCell::new(Vec::<&'static str>::new()));
    let _handle = {
        let labels = Rc::clone(&labels);
        animate(&scheduler, -1.0, 1.0, 0.8, move |score| {
            let label = sentiment_label(score, LabelStyle::Market);
            let mut labels = labels.borrow_mut();
            if labels.last() != Some(&label) {
                labels.push(label);
            }
        })
    };
    scheduler.tick();
    scheduler.run_for(1000.0, 8.0);

    assert_eq!(*labels.borrow(), vec!["Bearish", "Neutral", "Bullish"]);
}
