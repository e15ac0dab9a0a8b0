//! Swipe-to-delete gesture state machine.
//!
//! Interprets one pointer's touch sequence on a list row as either vertical
//! scroll or a horizontal swipe. The direction is locked by whichever axis
//! dominates first: a vertical start releases the gesture to native scroll
//! and can never turn into a delete, no matter how far the finger travels
//! horizontally afterwards. At most one row is tracked at a time.

use shared::TransactionId;

#[derive(Debug, Clone, PartialEq)]
pub struct SwipeConfig {
    /// Width of the delete background revealed behind the row, in px.
    pub reveal_width: f64,
    /// Horizontal offset (negative, leftwards) past which releasing the
    /// finger counts as delete intent.
    pub commit_threshold: f64,
    /// Minimum horizontal travel before the gesture locks to swiping.
    pub direction_lock: f64,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            reveal_width: 90.0,
            commit_threshold: -80.0,
            direction_lock: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Touch started, direction not decided yet.
    Undetermined,
    /// Horizontal won; the row tracks the finger.
    Swiping,
}

#[derive(Debug)]
struct ActiveSwipe {
    row: TransactionId,
    start_x: f64,
    start_y: f64,
    phase: Phase,
    offset: f64,
}

/// What the caller must do after feeding in a move event.
#[derive(Debug, Clone, PartialEq)]
pub enum SwipeUpdate {
    /// No active gesture, or direction still undetermined.
    None,
    /// Vertical won: do not preventDefault, let the page scroll.
    ReleaseToScroll,
    /// Horizontal tracking: preventDefault and translate the row.
    Track { row: TransactionId, offset_x: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SwipeOutcome {
    None,
    /// Spring the row back to zero offset.
    Cancelled { row: TransactionId },
    /// Past the commit threshold: ask for confirmation, then delete.
    Committed { row: TransactionId },
}

#[derive(Debug, Default)]
pub struct SwipeMachine {
    config: SwipeConfig,
    active: Option<ActiveSwipe>,
}

impl SwipeMachine {
    pub fn new(config: SwipeConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    pub fn config(&self) -> &SwipeConfig {
        &self.config
    }

    /// Row currently in `Swiping` state, if any.
    pub fn active_row(&self) -> Option<TransactionId> {
        self.active.as_ref().map(|a| a.row)
    }

    /// A touch on a second row while one gesture is live is ignored: exactly
    /// one row may swipe at a time.
    pub fn touch_start(&mut self, row: TransactionId, x: f64, y: f64) {
        if self.active.is_some() {
            return;
        }
        self.active = Some(ActiveSwipe {
            row,
            start_x: x,
            start_y: y,
            phase: Phase::Undetermined,
            offset: 0.0,
        });
    }

    pub fn touch_move(&mut self, x: f64, y: f64) -> SwipeUpdate {
        let Some(active) = self.active.as_mut() else {
            return SwipeUpdate::None;
        };
        let dx = x - active.start_x;
        let dy = y - active.start_y;

        if active.phase == Phase::Undetermined {
            if dx.abs() > dy.abs() && dx.abs() > self.config.direction_lock {
                active.phase = Phase::Swiping;
            } else if dy.abs() > dx.abs() {
                self.active = None;
                return SwipeUpdate::ReleaseToScroll;
            } else {
                return SwipeUpdate::None;
            }
        }

        let offset = Self::clamp_elastic(dx, self.config.reveal_width);
        active.offset = offset;
        SwipeUpdate::Track {
            row: active.row,
            offset_x: offset,
        }
    }

    pub fn touch_end(&mut self) -> SwipeOutcome {
        let Some(active) = self.active.take() else {
            return SwipeOutcome::None;
        };
        if active.phase == Phase::Swiping && active.offset <= self.config.commit_threshold {
            SwipeOutcome::Committed { row: active.row }
        } else if active.phase == Phase::Swiping {
            SwipeOutcome::Cancelled { row: active.row }
        } else {
            SwipeOutcome::None
        }
    }

    /// Left-only translation with sub-linear falloff past the reveal width,
    /// so the row never detaches from the finger.
    fn clamp_elastic(dx: f64, reveal_width: f64) -> f64 {
        if dx > 0.0 {
            return 0.0;
        }
        if -dx <= reveal_width {
            return dx;
        }
        let overshoot = -dx - reveal_width;
        -reveal_width - overshoot.powf(0.7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> SwipeMachine {
        SwipeMachine::new(SwipeConfig::default())
    }

    #[test]
    fn horizontal_drag_tracks_and_commits() {
        let mut m = machine();
        m.touch_start(1, 200.0, 100.0);
        assert_eq!(m.touch_move(180.0, 102.0), SwipeUpdate::Track { row: 1, offset_x: -20.0 });
        m.touch_move(115.0, 103.0);
        assert_eq!(m.touch_end(), SwipeOutcome::Committed { row: 1 });
        assert_eq!(m.active_row(), None);
    }

    #[test]
    fn short_swipe_cancels() {
        let mut m = machine();
        m.touch_start(1, 200.0, 100.0);
        m.touch_move(150.0, 101.0);
        assert_eq!(m.touch_end(), SwipeOutcome::Cancelled { row: 1 });
    }

    #[test]
    fn vertical_start_never_commits() {
        let mut m = machine();
        m.touch_start(1, 200.0, 100.0);
        assert_eq!(m.touch_move(199.0, 140.0), SwipeUpdate::ReleaseToScroll);
        // Any horizontal distance covered afterwards belongs to the scroll.
        assert_eq!(m.touch_move(40.0, 300.0), SwipeUpdate::None);
        assert_eq!(m.touch_end(), SwipeOutcome::None);
    }

    #[test]
    fn rightward_drag_is_clamped_to_zero() {
        let mut m = machine();
        m.touch_start(1, 200.0, 100.0);
        assert_eq!(m.touch_move(260.0, 100.0), SwipeUpdate::Track { row: 1, offset_x: 0.0 });
    }

    #[test]
    fn overshoot_is_elastic() {
        let mut m = machine();
        m.touch_start(1, 200.0, 100.0);
        let SwipeUpdate::Track { offset_x, .. } = m.touch_move(90.0, 100.0) else {
            panic!("expected tracking");
        };
        // 110px of travel: the last 20 are compressed sub-linearly.
        assert!(offset_x < -90.0);
        assert!(offset_x > -110.0);
        assert!((offset_x - (-90.0 - 20.0_f64.powf(0.7))).abs() < 1e-9);
    }

    #[test]
    fn tiny_jitter_stays_undetermined() {
        let mut m = machine();
        m.touch_start(1, 200.0, 100.0);
        assert_eq!(m.touch_move(195.0, 101.0), SwipeUpdate::None);
        assert_eq!(m.touch_end(), SwipeOutcome::None);
    }

    #[test]
    fn only_one_row_swipes_at_a_time() {
        let mut m = machine();
        m.touch_start(1, 200.0, 100.0);
        m.touch_move(150.0, 101.0);
        m.touch_start(2, 300.0, 100.0);
        assert_eq!(m.touch_move(100.0, 101.0), SwipeUpdate::Track { row: 1, offset_x: -100.0 - 10.0_f64.powf(0.7) });
        assert_eq!(m.touch_end(), SwipeOutcome::Committed { row: 1 });
    }
}
