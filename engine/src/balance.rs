//! Incrementally maintained running balance.
//!
//! The projector owns the authoritative numeric value; the rendered string is
//! derived from it and never read back. Per-mutation updates are O(1) signed
//! deltas — the value is only recomputed from the store on cold load or an
//! explicit full refresh. It can therefore drift from the server's number for
//! at most the duration of one in-flight mutation, and is corrected at that
//! mutation's settlement.

use shared::format_signed_money;

/// Direction of a balance change, for the transient flash on the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pulse {
    Increase,
    Decrease,
}

/// Snapshot handed to the renderer after an update.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceView {
    pub value: f64,
    pub display: String,
    /// `None` when the change should not flash (cold load, authoritative
    /// corrections, or right after the currency symbol changed).
    pub pulse: Option<Pulse>,
}

#[derive(Debug)]
pub struct BalanceProjector {
    value: f64,
    currency_symbol: String,
    /// Set on cold start and whenever the currency symbol changes: the old
    /// displayed value is not a valid comparison baseline, so the next
    /// update must not flash.
    suppress_next_pulse: bool,
}

impl BalanceProjector {
    pub fn new(currency_symbol: &str) -> Self {
        Self {
            value: 0.0,
            currency_symbol: currency_symbol.to_string(),
            suppress_next_pulse: true,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn currency_symbol(&self) -> &str {
        &self.currency_symbol
    }

    /// Applies one signed delta and classifies the change for the flash.
    pub fn apply_delta(&mut self, signed: f64) -> BalanceView {
        let old = self.value;
        self.value += signed;
        let pulse = if self.suppress_next_pulse || self.value == old {
            None
        } else if self.value > old {
            Some(Pulse::Increase)
        } else {
            Some(Pulse::Decrease)
        };
        self.suppress_next_pulse = false;
        BalanceView {
            value: self.value,
            display: self.display(),
            pulse,
        }
    }

    /// Authoritative settlement correction: adjusts the value without a
    /// flash. The user already saw their own change; this one is the
    /// server's.
    pub fn apply_correction(&mut self, signed: f64) -> BalanceView {
        self.value += signed;
        BalanceView {
            value: self.value,
            display: self.display(),
            pulse: None,
        }
    }

    /// Cold load / full refresh only.
    pub fn reset(&mut self, value: f64) -> BalanceView {
        self.value = value;
        self.suppress_next_pulse = false;
        BalanceView {
            value,
            display: self.display(),
            pulse: None,
        }
    }

    pub fn set_currency_symbol(&mut self, symbol: &str) -> BalanceView {
        self.currency_symbol = symbol.to_string();
        self.suppress_next_pulse = true;
        self.view()
    }

    pub fn view(&self) -> BalanceView {
        BalanceView {
            value: self.value,
            display: self.display(),
            pulse: None,
        }
    }

    fn display(&self) -> String {
        format_signed_money(&self.currency_symbol, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_update_after_cold_start_does_not_flash() {
        let mut balance = BalanceProjector::new("$");
        let view = balance.apply_delta(100.0);
        assert_eq!(view.value, 100.0);
        assert_eq!(view.pulse, None);
    }

    #[test]
    fn classifies_increase_and_decrease() {
        let mut balance = BalanceProjector::new("$");
        balance.reset(50.0);
        assert_eq!(balance.apply_delta(25.0).pulse, Some(Pulse::Increase));
        assert_eq!(balance.apply_delta(-10.0).pulse, Some(Pulse::Decrease));
        assert_eq!(balance.apply_delta(0.0).pulse, None);
    }

    #[test]
    fn currency_change_suppresses_one_pulse() {
        let mut balance = BalanceProjector::new("$");
        balance.reset(50.0);
        let view = balance.set_currency_symbol("€");
        assert_eq!(view.pulse, None);
        assert!(view.display.starts_with("+€"));
        assert_eq!(balance.apply_delta(10.0).pulse, None);
        assert_eq!(balance.apply_delta(10.0).pulse, Some(Pulse::Increase));
    }

    #[test]
    fn corrections_never_flash() {
        let mut balance = BalanceProjector::new("$");
        balance.reset(50.0);
        let view = balance.apply_correction(3.5);
        assert_eq!(view.value, 53.5);
        assert_eq!(view.pulse, None);
        assert_eq!(balance.apply_delta(1.0).pulse, Some(Pulse::Increase));
    }

    #[test]
    fn display_uses_compact_signed_format() {
        let mut balance = BalanceProjector::new("$");
        let view = balance.reset(1_300.0);
        assert_eq!(view.display, "+$1.3K");
        assert_eq!(balance.reset(0.0).display, "$0");
    }
}
