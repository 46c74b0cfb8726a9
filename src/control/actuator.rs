// Signed actuation value -> dual-direction duty pair
//
// Zero maps to both duties off, i.e. the H-bridge coasts. Nothing here brakes.

use super::ramp::RampState;
use crate::messages::{DutyFrame, DutyPair};

/// Map a signed current value to forward/reverse duty.
/// Magnitudes beyond the 8-bit PWM range saturate.
pub fn map(current: i32) -> DutyPair {
    let magnitude = u8::try_from(current.unsigned_abs()).unwrap_or(u8::MAX);
    match current.signum() {
        1 => DutyPair {
            forward: magnitude,
            reverse: 0,
        },
        -1 => DutyPair {
            forward: 0,
            reverse: magnitude,
        },
        _ => DutyPair::default(),
    }
}

/// Duty quadruple for both axes
pub fn frame(state: &RampState) -> DutyFrame {
    DutyFrame::new(map(state.throttle), map(state.steering))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_mapping() {
        assert_eq!(map(120), DutyPair { forward: 120, reverse: 0 });
        assert_eq!(map(-75), DutyPair { forward: 0, reverse: 75 });
        assert_eq!(map(0), DutyPair { forward: 0, reverse: 0 });
        assert_eq!(map(255), DutyPair { forward: 255, reverse: 0 });
        assert_eq!(map(-255), DutyPair { forward: 0, reverse: 255 });
    }

    #[test]
    fn test_at_most_one_side_active() {
        for current in -300..=300 {
            let duty = map(current);
            assert!(duty.forward == 0 || duty.reverse == 0, "both active for {}", current);
        }
    }

    #[test]
    fn test_saturates_out_of_range() {
        assert_eq!(map(1_000).forward, 255);
        assert_eq!(map(i32::MIN).reverse, 255);
    }

    #[test]
    fn test_frame_order() {
        let state = RampState {
            throttle: 200,
            steering: -150,
        };
        assert_eq!(frame(&state).as_tuple(), (200, 0, 0, 150));
    }
}
