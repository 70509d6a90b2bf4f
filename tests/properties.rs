use assert_approx_eq::assert_approx_eq;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use value_controller::{DisposalMode, UpdateMode, ValueController, ValueEvent, ValueSpec};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn running() -> ValueController {
    init_logging();
    let mut controller = ValueController::new();
    controller.start_updates();
    controller
}

/// Ticks the controller at each time in turn
fn tick_at(controller: &mut ValueController, times: &[f64]) {
    for &t in times {
        controller.update(t);
    }
}

#[test]
fn simple_values_converge_for_any_partition() {
    let cases = [
        (100.0, 3.0, UpdateMode::FromZeroToValue, vec![0.3, 1.0, 2.2, 3.0]),
        (-40.0, 2.0, UpdateMode::FromZeroToValue, vec![1.999, 2.0]),
        (7.5, 0.5, UpdateMode::FromValueToZero, vec![0.1, 0.2, 0.3, 0.4, 0.5]),
        (250.0, 1.0, UpdateMode::FromZeroToValue, vec![1.0]),
    ];
    for (value, duration, mode, times) in cases {
        let mut controller = running();
        let key = controller.add_simple(value, duration, mode, DisposalMode::Manual).unwrap();
        controller.update(0.0);
        tick_at(&mut controller, &times);

        let dynamic = controller.get_dynamic_value(key).unwrap();
        let target = match mode {
            UpdateMode::FromZeroToValue => value,
            UpdateMode::FromValueToZero => 0.0,
        };
        assert_approx_eq!(dynamic.current_value(), target);
        assert!(dynamic.is_lapsed(), "value {} over {:?} did not lapse", value, times);
    }
}

#[test]
fn stacked_value_fires_one_event_per_stack() {
    for times in [vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], vec![6.0]] {
        let mut controller = running();
        let stacks = Rc::new(Cell::new(0));
        let lapses = Rc::new(Cell::new(0));
        let (s, l) = (Rc::clone(&stacks), Rc::clone(&lapses));
        controller.on_stack_lapsed(move |_, _| s.set(s.get() + 1));
        controller.on_value_lapsed(move |_, _| l.set(l.get() + 1));

        let key = controller
            .add_stacked(10.0, 2.0, 3, UpdateMode::FromZeroToValue, DisposalMode::Manual)
            .unwrap();
        controller.update(0.0);
        tick_at(&mut controller, &times);

        assert_eq!(stacks.get(), 2);
        assert_eq!(lapses.get(), 1);
        assert_eq!(controller.get_dynamic_value(key).unwrap().stacks(), 0);
    }
}

#[test]
fn looped_values_return_to_start_in_both_directions() {
    let mut controller = running();
    let lapses = Rc::new(Cell::new(0));
    let l = Rc::clone(&lapses);
    controller.on_value_lapsed(move |_, _| l.set(l.get() + 1));

    let up = controller.add_continuous_looped(0.0, 360.0, 60.0).unwrap();
    let down = controller.add_continuous_looped(10.0, -10.0, 4.0).unwrap();
    let times: Vec<f64> = (0..=24).map(|i| i as f64 * 5.0).collect();
    tick_at(&mut controller, &times);

    assert_approx_eq!(controller.get_dynamic_value(up).unwrap().current_value(), 0.0, 1e-6);
    assert_approx_eq!(controller.get_dynamic_value(down).unwrap().current_value(), 10.0, 1e-6);
    assert_eq!(lapses.get(), 0);
}

#[test]
fn one_long_update_settles_every_stack_and_cycle() {
    let mut controller = running();
    let stack_events = Rc::new(Cell::new(0));
    let lapses = Rc::new(Cell::new(0));
    let (s, l) = (Rc::clone(&stack_events), Rc::clone(&lapses));
    controller.on_stack_lapsed(move |_, _| s.set(s.get() + 1));
    controller.on_value_lapsed(move |_, _| l.set(l.get() + 1));

    let stacked = controller
        .add_stacked(1.0, 1.0, 2000, UpdateMode::FromZeroToValue, DisposalMode::Manual)
        .unwrap();
    let looped = controller.add_continuous_looped(0.0, 360.0, 60.0).unwrap();
    tick_at(&mut controller, &[0.0, 120_000.0]);

    let stacked = controller.get_dynamic_value(stacked).unwrap();
    assert_eq!(stacked.stacks(), 0);
    assert!(stacked.is_lapsed());
    assert_eq!(stack_events.get(), 1999);
    assert_eq!(lapses.get(), 1);

    let looped = controller.get_dynamic_value(looped).unwrap();
    assert_approx_eq!(looped.current_value(), 0.0);
    assert_approx_eq!(looped.remaining_duration(), 60.0);
}

#[test]
fn resuming_ignores_idle_time() {
    let mut controller = running();
    let timer = controller.add_timer(10.0).unwrap();
    let ramp = controller
        .add_simple(100.0, 10.0, UpdateMode::FromZeroToValue, DisposalMode::Manual)
        .unwrap();
    tick_at(&mut controller, &[0.0, 2.0]);

    controller.suspend_updates();
    tick_at(&mut controller, &[10.0, 30.0]);
    controller.start_updates_ignoring_idle(true);
    controller.update(50.0);

    assert_approx_eq!(controller.get_dynamic_value(timer).unwrap().remaining_duration(), 8.0);
    assert_approx_eq!(controller.get_dynamic_value(ramp).unwrap().current_value(), 20.0);

    controller.update(51.0);
    assert_approx_eq!(controller.get_dynamic_value(timer).unwrap().remaining_duration(), 7.0);
    assert_approx_eq!(controller.get_dynamic_value(ramp).unwrap().current_value(), 30.0);
}

#[test]
fn resuming_without_ignoring_catches_up() {
    let mut controller = running();
    let timer = controller.add_timer(10.0).unwrap();
    tick_at(&mut controller, &[0.0, 2.0]);
    controller.suspend_updates();
    controller.start_updates();
    controller.update(5.0);
    assert_approx_eq!(controller.get_dynamic_value(timer).unwrap().remaining_duration(), 5.0);
}

#[test]
fn folding_into_constants_keeps_the_total() {
    let mut controller = running();
    controller.add_constant_value(5.0);
    let key = controller
        .add_simple(-12.0, 2.0, UpdateMode::FromZeroToValue, DisposalMode::AutomaticAddToConstants)
        .unwrap();
    tick_at(&mut controller, &[0.0, 1.0]);
    assert_approx_eq!(controller.get_all_values_total(false), -1.0);

    controller.update(2.0);
    assert!(!controller.contains_dynamic_value(key));
    assert_approx_eq!(controller.get_constant_values_total(), -7.0);
    assert_approx_eq!(controller.get_all_values_total(false), -7.0);

    controller.update(3.0);
    assert_approx_eq!(controller.get_all_values_total(false), -7.0);
}

#[test]
fn folding_skips_a_zero_result() {
    let mut controller = running();
    controller
        .add_simple(6.0, 1.0, UpdateMode::FromValueToZero, DisposalMode::AutomaticAddToConstants)
        .unwrap();
    tick_at(&mut controller, &[0.0, 1.0]);
    assert_eq!(controller.dynamic_value_count(), 0);
    assert_eq!(controller.constant_value_count(), 0);
}

#[test]
fn combining_constants_preserves_total() {
    init_logging();
    let mut controller = ValueController::new();
    for v in [1.5, -2.25, 10.0, 0.75] {
        controller.add_constant_value(v);
    }
    let before = controller.get_constant_values_total();
    let key = controller.combine_constant_values();
    assert!(key.is_some());
    assert_approx_eq!(controller.get_constant_values_total(), before);
    assert_eq!(controller.constant_value_count(), 1);

    // Combining a single constant changes nothing
    assert_eq!(controller.combine_constant_values(), None);
    assert_approx_eq!(controller.get_constant_values_total(), before);
}

#[test]
fn keys_are_never_reused() {
    init_logging();
    let mut controller = ValueController::new();
    let first: Vec<_> = (0..3).map(|i| controller.add_constant_value(i as f64 + 1.0)).collect();
    assert!(first.windows(2).all(|w| w[0] < w[1]));
    controller.remove_all_constant_values();
    let next = controller.add_constant_value(9.0);
    assert!(next > first[2]);

    let a = controller.add_timer(1.0).unwrap();
    let b = controller.add_timer(2.0).unwrap();
    assert!(a < b);
    controller.remove_all_dynamic_values();
    assert_eq!(controller.dynamic_value_count(), 0);
    let c = controller.add_timer(1.0).unwrap();
    assert!(c > b);
}

#[test]
fn value_subscribers_fire_before_controller_subscribers() {
    let mut controller = running();
    let order = Rc::new(RefCell::new(Vec::new()));
    let o = Rc::clone(&order);
    controller.on_interval_lapsed(move |_, _| o.borrow_mut().push("controller"));

    let key = controller
        .add_dynamic_value(ValueSpec::counter(0.0, 3.0, 1.0, 1.0, DisposalMode::Manual))
        .unwrap();
    let o = Rc::clone(&order);
    controller
        .get_dynamic_value_mut(key)
        .unwrap()
        .on_interval_lapsed(move |_| o.borrow_mut().push("value"));

    tick_at(&mut controller, &[0.0, 1.0]);
    assert_eq!(*order.borrow(), vec!["value", "controller"]);
}

#[test]
fn removed_values_drop_their_subscribers() {
    let mut controller = running();
    let key = controller.add_timer(1.0).unwrap();
    let hits = Rc::new(Cell::new(0));
    let h = Rc::clone(&hits);
    controller
        .get_dynamic_value_mut(key)
        .unwrap()
        .on_interval_lapsed(move |_| h.set(h.get() + 1));
    tick_at(&mut controller, &[0.0, 1.0]);
    controller.remove_dynamic_value(key).unwrap();
    tick_at(&mut controller, &[2.0, 3.0]);
    assert_eq!(hits.get(), 1);
    // The closure and its captured counter have been released
    assert_eq!(Rc::strong_count(&hits), 1);
}

#[test]
fn events_are_typed() {
    let mut controller = running();
    let key = controller.add_timer(1.0).unwrap();
    controller.update(0.0);
    let value = controller.get_dynamic_value_mut(key).unwrap();
    value.update(1.0).unwrap();
    assert_eq!(value.drain_events(), vec![ValueEvent::IntervalLapsed]);
}
