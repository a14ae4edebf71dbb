//! Drag-to-move state machine.
//!
//! Positions are anchored at press time and recomputed from the total pointer
//! delta on every move, then rounded, so fractional pointer input never
//! accumulates into drift.

/// Current drag state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        /// Pointer position at press, screen coordinates
        press: (f64, f64),
        /// Panel position at press
        origin: (i32, i32),
    },
}

/// Tracks a drag of the overlay panel.
#[derive(Debug, Clone, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Primary button pressed. Returns `true` if a drag started.
    ///
    /// `position` is the panel's current position, possibly fractional.
    pub fn press(&mut self, pointer: (f64, f64), over_handle: bool, position: (f64, f64)) -> bool {
        if !over_handle || self.is_dragging() {
            return false;
        }
        self.state = DragState::Dragging {
            press: pointer,
            origin: (position.0.round() as i32, position.1.round() as i32),
        };
        true
    }

    /// Pointer moved. Returns the new integer panel position while dragging.
    pub fn moved(&mut self, pointer: (f64, f64)) -> Option<(i32, i32)> {
        match self.state {
            DragState::Idle => None,
            DragState::Dragging { press, origin } => {
                let dx = pointer.0 - press.0;
                let dy = pointer.1 - press.1;
                Some((
                    (f64::from(origin.0) + dx).round() as i32,
                    (f64::from(origin.1) + dy).round() as i32,
                ))
            }
        }
    }

    /// Button released. Returns `true` if a drag ended.
    pub fn release(&mut self) -> bool {
        self.end()
    }

    /// Pointer capture taken away. Returns `true` if a drag ended.
    pub fn capture_lost(&mut self) -> bool {
        self.end()
    }

    fn end(&mut self) -> bool {
        let was_dragging = self.is_dragging();
        self.state = DragState::Idle;
        was_dragging
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fractional_delta_rounds() {
        let mut drag = DragController::new();
        assert!(drag.press((500.0, 300.0), true, (100.0, 100.0)));
        assert_eq!(drag.moved((537.6, 287.8)), Some((138, 88)));
    }

    #[test]
    fn test_no_cumulative_drift() {
        let mut drag = DragController::new();
        drag.press((0.0, 0.0), true, (10.0, 10.0));
        let mut last = None;
        for i in 1..=100 {
            last = drag.moved((i as f64 * 0.4, 0.0));
        }
        assert_eq!(last, Some((50, 10)));
    }

    #[test]
    fn test_anchor_is_rounded() {
        let mut drag = DragController::new();
        drag.press((0.0, 0.0), true, (99.6, 100.4));
        assert_eq!(drag.moved((0.0, 0.0)), Some((100, 100)));
    }

    #[test]
    fn test_press_outside_handle_ignored() {
        let mut drag = DragController::new();
        assert!(!drag.press((0.0, 0.0), false, (0.0, 0.0)));
        assert_eq!(drag.moved((5.0, 5.0)), None);
    }

    #[test]
    fn test_release_and_capture_loss_end_drag() {
        let mut drag = DragController::new();
        drag.press((0.0, 0.0), true, (0.0, 0.0));
        assert!(drag.release());
        assert!(!drag.release());
        assert_eq!(drag.moved((3.0, 3.0)), None);

        drag.press((0.0, 0.0), true, (0.0, 0.0));
        assert!(drag.capture_lost());
        assert_eq!(drag.state(), DragState::Idle);
    }
}
