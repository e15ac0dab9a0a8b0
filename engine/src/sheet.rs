//! Bottom sheet manager.
//!
//! Enforces "at most one sheet open". Opening and closing emit explicit
//! command lists — including a `HideAfter` with the configured transition
//! duration instead of racing `transitionend` — so the app layer can await
//! them deterministically. Each sheet supports drag-to-dismiss from its
//! header, suppressed while the sheet's own content is mid-scroll.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SheetKind {
    /// Transactions of one calendar day.
    DayDetail,
    /// Amount entry for a quick-add category.
    QuickAdd,
    /// Income/expense totals for the loaded range.
    SummaryDetail,
}

impl SheetKind {
    pub const ALL: [SheetKind; 3] = [
        SheetKind::DayDetail,
        SheetKind::QuickAdd,
        SheetKind::SummaryDetail,
    ];
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetConfig {
    /// Slide transition duration; `HideAfter` delays are derived from it.
    pub transition_ms: u32,
    /// Downward drag distance past which release dismisses the sheet.
    pub dismiss_threshold: f64,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            transition_ms: 300,
            dismiss_threshold: 100.0,
        }
    }
}

/// Renderer commands for open/close transitions.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetCommand {
    /// Unhide the sheet and slide it in.
    Show(SheetKind),
    /// Slide the sheet off-screen.
    AnimateOut(SheetKind),
    /// Hide the sheet once its slide-out transition has run.
    HideAfter { sheet: SheetKind, delay_ms: u32 },
    ShowBackdrop,
    HideBackdrop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    /// Not dragging (no active sheet, or suppressed by content scroll).
    None,
    /// Past the threshold: the sheet closes; run these commands.
    Dismissed(Vec<SheetCommand>),
    /// Under the threshold: spring the sheet back to zero offset.
    SpringBack(SheetKind),
}

#[derive(Debug)]
struct HeaderDrag {
    start_y: f64,
    offset: f64,
}

#[derive(Debug, Default)]
pub struct SheetManager {
    config: SheetConfig,
    active: Option<SheetKind>,
    drag: Option<HeaderDrag>,
}

impl SheetManager {
    pub fn new(config: SheetConfig) -> Self {
        Self {
            config,
            active: None,
            drag: None,
        }
    }

    pub fn config(&self) -> &SheetConfig {
        &self.config
    }

    pub fn active(&self) -> Option<SheetKind> {
        self.active
    }

    pub fn is_open(&self, kind: SheetKind) -> bool {
        self.active == Some(kind)
    }

    /// Opens `kind`, forcibly animating out whatever was open before. The
    /// backdrop is shared and stays up across the handover.
    pub fn open(&mut self, kind: SheetKind) -> Vec<SheetCommand> {
        if self.active == Some(kind) {
            return Vec::new();
        }
        self.drag = None;
        let mut commands = Vec::new();
        if let Some(previous) = self.active.replace(kind) {
            commands.push(SheetCommand::AnimateOut(previous));
            commands.push(SheetCommand::HideAfter {
                sheet: previous,
                delay_ms: self.config.transition_ms,
            });
        }
        commands.push(SheetCommand::ShowBackdrop);
        commands.push(SheetCommand::Show(kind));
        commands
    }

    pub fn close(&mut self) -> Vec<SheetCommand> {
        self.drag = None;
        let Some(open) = self.active.take() else {
            return Vec::new();
        };
        vec![
            SheetCommand::AnimateOut(open),
            SheetCommand::HideAfter {
                sheet: open,
                delay_ms: self.config.transition_ms,
            },
            SheetCommand::HideBackdrop,
        ]
    }

    /// Starts a header drag. Returns false (and tracks nothing) when no
    /// sheet is open or the sheet's content is scrolled away from the top —
    /// the gesture then belongs to the content scroll.
    pub fn drag_start(&mut self, y: f64, content_scroll_top: f64) -> bool {
        if self.active.is_none() || content_scroll_top > 0.0 {
            self.drag = None;
            return false;
        }
        self.drag = Some(HeaderDrag {
            start_y: y,
            offset: 0.0,
        });
        true
    }

    /// Tracks the finger downward; upward movement holds the sheet at zero.
    pub fn drag_move(&mut self, y: f64) -> Option<f64> {
        let drag = self.drag.as_mut()?;
        drag.offset = (y - drag.start_y).max(0.0);
        Some(drag.offset)
    }

    pub fn drag_end(&mut self) -> DragOutcome {
        let Some(drag) = self.drag.take() else {
            return DragOutcome::None;
        };
        let Some(open) = self.active else {
            return DragOutcome::None;
        };
        if drag.offset > self.config.dismiss_threshold {
            DragOutcome::Dismissed(self.close())
        } else {
            DragOutcome::SpringBack(open)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> SheetManager {
        SheetManager::new(SheetConfig::default())
    }

    #[test]
    fn open_shows_sheet_and_backdrop() {
        let mut m = manager();
        let commands = m.open(SheetKind::QuickAdd);
        assert_eq!(
            commands,
            vec![
                SheetCommand::ShowBackdrop,
                SheetCommand::Show(SheetKind::QuickAdd)
            ]
        );
        assert!(m.is_open(SheetKind::QuickAdd));
    }

    #[test]
    fn opening_a_second_sheet_retires_the_first() {
        let mut m = manager();
        m.open(SheetKind::DayDetail);
        let commands = m.open(SheetKind::QuickAdd);

        assert_eq!(
            commands,
            vec![
                SheetCommand::AnimateOut(SheetKind::DayDetail),
                SheetCommand::HideAfter {
                    sheet: SheetKind::DayDetail,
                    delay_ms: 300
                },
                SheetCommand::ShowBackdrop,
                SheetCommand::Show(SheetKind::QuickAdd),
            ]
        );
        // Singleton: exactly one sheet is active after the handover.
        assert_eq!(m.active(), Some(SheetKind::QuickAdd));
    }

    #[test]
    fn reopening_the_active_sheet_is_a_no_op() {
        let mut m = manager();
        m.open(SheetKind::DayDetail);
        assert!(m.open(SheetKind::DayDetail).is_empty());
    }

    #[test]
    fn close_hides_backdrop_after_transition() {
        let mut m = manager();
        m.open(SheetKind::SummaryDetail);
        let commands = m.close();
        assert_eq!(
            commands,
            vec![
                SheetCommand::AnimateOut(SheetKind::SummaryDetail),
                SheetCommand::HideAfter {
                    sheet: SheetKind::SummaryDetail,
                    delay_ms: 300
                },
                SheetCommand::HideBackdrop,
            ]
        );
        assert_eq!(m.active(), None);
        assert!(m.close().is_empty());
    }

    #[test]
    fn drag_past_threshold_dismisses() {
        let mut m = manager();
        m.open(SheetKind::DayDetail);
        assert!(m.drag_start(50.0, 0.0));
        assert_eq!(m.drag_move(120.0), Some(70.0));
        assert_eq!(m.drag_end(), DragOutcome::SpringBack(SheetKind::DayDetail));

        assert!(m.drag_start(50.0, 0.0));
        m.drag_move(180.0);
        let DragOutcome::Dismissed(commands) = m.drag_end() else {
            panic!("expected dismissal");
        };
        assert!(commands.contains(&SheetCommand::HideBackdrop));
        assert_eq!(m.active(), None);
    }

    #[test]
    fn drag_is_suppressed_while_content_scrolls() {
        let mut m = manager();
        m.open(SheetKind::DayDetail);
        assert!(!m.drag_start(50.0, 12.0));
        assert_eq!(m.drag_move(200.0), None);
        assert_eq!(m.drag_end(), DragOutcome::None);
        assert!(m.is_open(SheetKind::DayDetail));
    }

    #[test]
    fn upward_drag_holds_at_zero() {
        let mut m = manager();
        m.open(SheetKind::QuickAdd);
        m.drag_start(100.0, 0.0);
        assert_eq!(m.drag_move(40.0), Some(0.0));
    }
}
