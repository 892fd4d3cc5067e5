//! Property tests for jog handling.

mod common;

use common::Rig;
use polar_motion::Axis;
use proptest::prelude::*;

fn axis_letter(axis: Axis) -> char {
    match axis {
        Axis::Azimuth => 'X',
        Axis::Altitude => 'Y',
    }
}

fn any_axis() -> impl Strategy<Value = Axis> {
    prop_oneof![Just(Axis::Azimuth), Just(Axis::Altitude)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// A completed relative jog leaves the axis at exactly start + delta,
    /// or untouched when the delta rounds to no steps.
    #[test]
    fn relative_jog_ends_exactly_at_target(
        axis in any_axis(),
        start in -20.0f32..20.0,
        delta in -1.5f32..1.5,
    ) {
        let mut rig = Rig::new();
        rig.set_position(axis, start);

        let line = format!("$J=G91{}{:.3}\n", axis_letter(axis), delta);
        let sent: f32 = format!("{:.3}", delta).parse().unwrap();
        rig.send(line.as_bytes());
        rig.run_until_idle();

        let steps_per_degree = rig.controller.engine().axis_state(axis).steps_per_degree;
        let steps = (sent * steps_per_degree).round() as i64;
        let expected = if steps == 0 { start } else { start + sent };

        prop_assert_eq!(rig.position(axis), expected);
        prop_assert_eq!(rig.pulses(axis), steps);
    }

    /// Whatever the host sends, at most two jobs ever wait in the queue.
    #[test]
    fn queue_never_exceeds_capacity(
        commands in prop::collection::vec(
            (0u8..3, any_axis(), -0.5f32..0.5, any_axis(), -0.5f32..0.5, 0usize..40),
            1..8,
        ),
    ) {
        let mut rig = Rig::new();

        for (kind, first, a, second, b, polls) in commands {
            let line = match kind {
                0 => format!("$J=G91{}{:.3}\n", axis_letter(first), a),
                1 if first != second => format!(
                    "$J=G90{}{:.3}{}{:.3}\n",
                    axis_letter(first), a, axis_letter(second), b
                ),
                _ => format!("ALT:{:.3}\n", b),
            };
            rig.send(line.as_bytes());

            for _ in 0..=polls {
                rig.poll();
                prop_assert!(rig.controller.engine().queued() <= 2);
            }
        }

        rig.run_until_idle();
        prop_assert!(!rig.controller.engine().is_moving());
    }
}
