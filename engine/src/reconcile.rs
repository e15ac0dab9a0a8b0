//! Optimistic add/edit/delete orchestration.
//!
//! Every user intent is staged here synchronously: the store, the balance and
//! the returned view commands all change before any request goes out. The
//! frontend then issues the request and delivers the outcome through exactly
//! one `settle_*` call. Settlement either commits the server's authoritative
//! record in place or rolls the optimistic mutation back; the rendered state
//! afterwards equals the pre-staging state exactly.
//!
//! Bookkeeping is keyed by transaction id, which gives three properties:
//! - serialization: staging a second mutation against an id that already has
//!   one in flight is rejected (with one deliberate exception, see
//!   [`ReconcileEngine::stage_delete`]);
//! - idempotence: a duplicate settlement finds no bookkeeping entry and is a
//!   no-op;
//! - stale-id safety: a settlement for an id the user has meanwhile deleted
//!   does not re-insert anything.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use shared::{Category, CategoryId, Transaction, TransactionId, TransactionType};
use thiserror::Error;

use crate::balance::{BalanceProjector, BalanceView};
use crate::store::TransactionStore;

/// What the user asked for, before category resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionIntent {
    pub category_id: CategoryId,
    /// Best-effort value in the base currency. When `currency` is set this
    /// may be approximate; the server's converted amount corrects it at
    /// settlement.
    pub amount: f64,
    pub original_amount: Option<f64>,
    pub currency: Option<String>,
    pub date: DateTime<Utc>,
    pub note: Option<String>,
}

/// View commands emitted by staging and settlement. The engine never touches
/// the DOM; the renderer collaborator carries these out.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Row is in the store at its sorted position; render it (with the
    /// entrance animation when `animated`).
    InsertRow { id: TransactionId, animated: bool },
    /// Replace the rendered row `old_id` in place; on a confirmed add the id
    /// changes from the placeholder to the server id.
    ReplaceRow { old_id: TransactionId, id: TransactionId },
    /// Row left the store; remove it (with the collapse animation when
    /// `animated`). Carries the removed record so the renderer can animate
    /// a ghost out.
    RemoveRow { tx: Transaction, animated: bool },
    /// New balance to display, with its flash classification.
    Balance(BalanceView),
    /// User-visible failure notice.
    Alert(String),
    /// In-place rollback was not possible; reload the list from the server.
    FullReload,
    /// A superseded add was confirmed under this server id; the record must
    /// now be deleted server-side as well.
    DeleteOnServer { id: TransactionId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("this entry is still syncing, try again in a moment")]
    InFlight,
    #[error("transaction not found")]
    UnknownId,
    #[error("unknown category")]
    UnknownCategory,
    #[error("amount must be greater than zero")]
    InvalidAmount,
}

/// Whether a staged delete needs its own server request now, or rides on the
/// settlement of the add it superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStaging {
    Request,
    Deferred,
}

#[derive(Debug)]
enum InFlight {
    Add {
        /// The user deleted the optimistic row before the create settled.
        /// The row and delta are already reverted; on a successful create the
        /// confirmed record must be deleted server-side.
        superseded_by_delete: bool,
    },
    Edit {
        snapshot: Transaction,
    },
    Delete {
        snapshot: Transaction,
    },
}

#[derive(Debug)]
pub struct ReconcileEngine {
    store: TransactionStore,
    balance: BalanceProjector,
    categories: Vec<Category>,
    in_flight: HashMap<TransactionId, InFlight>,
    next_placeholder: TransactionId,
    page_in_flight: bool,
}

impl ReconcileEngine {
    pub fn new(currency_symbol: &str) -> Self {
        Self {
            store: TransactionStore::new(),
            balance: BalanceProjector::new(currency_symbol),
            categories: Vec::new(),
            in_flight: HashMap::new(),
            next_placeholder: -1,
            page_in_flight: false,
        }
    }

    pub fn store(&self) -> &TransactionStore {
        &self.store
    }

    pub fn balance(&self) -> &BalanceProjector {
        &self.balance
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn set_categories(&mut self, categories: Vec<Category>) {
        self.categories = categories;
    }

    pub fn set_currency_symbol(&mut self, symbol: &str) -> Effect {
        Effect::Balance(self.balance.set_currency_symbol(symbol))
    }

    pub fn is_in_flight(&self, id: TransactionId) -> bool {
        self.in_flight.contains_key(&id)
    }

    /// Cold load / full refresh: the one place the balance comes from a full
    /// server recomputation instead of deltas.
    pub fn cold_load(
        &mut self,
        mut transactions: Vec<Transaction>,
        balance: f64,
        page_limit: usize,
    ) -> Effect {
        for tx in &mut transactions {
            tx.normalize_legacy();
        }
        self.store.reset(transactions, page_limit);
        self.in_flight.clear();
        self.page_in_flight = false;
        Effect::Balance(self.balance.reset(balance))
    }

    // --- Add ---

    /// Builds the placeholder record, inserts it sorted, applies the signed
    /// delta and hands back the placeholder id the create settlement must be
    /// keyed by. All of it happens before the request is issued.
    pub fn stage_add(
        &mut self,
        intent: TransactionIntent,
    ) -> Result<(TransactionId, Vec<Effect>), MutationError> {
        let (category_name, transaction_type) = self.resolve_category(intent.category_id)?;
        if !(intent.amount > 0.0) {
            return Err(MutationError::InvalidAmount);
        }

        let id = self.next_placeholder;
        self.next_placeholder -= 1;

        let tx = Transaction {
            id,
            amount: intent.amount,
            original_amount: intent.original_amount,
            currency: intent.currency,
            category: category_name,
            transaction_type,
            date: intent.date,
            category_id: intent.category_id,
            note: intent.note,
        };
        let delta = tx.signed_amount();
        self.store.insert_sorted(tx);
        self.in_flight.insert(
            id,
            InFlight::Add {
                superseded_by_delete: false,
            },
        );

        let effects = vec![
            Effect::InsertRow { id, animated: true },
            Effect::Balance(self.balance.apply_delta(delta)),
        ];
        Ok((id, effects))
    }

    pub fn settle_add_success(
        &mut self,
        placeholder: TransactionId,
        mut server_tx: Transaction,
    ) -> Vec<Effect> {
        match self.in_flight.remove(&placeholder) {
            Some(InFlight::Add {
                superseded_by_delete: true,
            }) => {
                // The row is already gone locally; finish the delete on the
                // server now that its real id is known.
                vec![Effect::DeleteOnServer { id: server_tx.id }]
            }
            Some(InFlight::Add {
                superseded_by_delete: false,
            }) => {
                let Some(optimistic) = self.store.get(placeholder) else {
                    // Stale: nothing to confirm, never re-insert.
                    return Vec::new();
                };
                let correction = server_tx.signed_amount() - optimistic.signed_amount();
                server_tx.normalize_legacy();
                let id = server_tx.id;
                self.store.replace(placeholder, server_tx);

                let mut effects = vec![Effect::ReplaceRow {
                    old_id: placeholder,
                    id,
                }];
                if correction != 0.0 {
                    effects.push(Effect::Balance(self.balance.apply_correction(correction)));
                }
                effects
            }
            // Duplicate or unknown settlement: no-op.
            _ => Vec::new(),
        }
    }

    pub fn settle_add_failure(&mut self, placeholder: TransactionId, message: &str) -> Vec<Effect> {
        match self.in_flight.remove(&placeholder) {
            Some(InFlight::Add {
                superseded_by_delete: true,
            }) => {
                // Already reverted when the delete superseded it; the server
                // never created the row, so there is nothing left to undo.
                Vec::new()
            }
            Some(InFlight::Add {
                superseded_by_delete: false,
            }) => {
                let Some(tx) = self.store.remove(placeholder) else {
                    return Vec::new();
                };
                let delta = -tx.signed_amount();
                vec![
                    Effect::RemoveRow {
                        tx,
                        animated: false,
                    },
                    Effect::Balance(self.balance.apply_delta(delta)),
                    Effect::Alert(message.to_string()),
                ]
            }
            _ => Vec::new(),
        }
    }

    // --- Edit ---

    /// Snapshots the original, swaps in the tentative record and applies the
    /// net delta (`new.signed - old.signed`) in one step, so the flash is
    /// classified against the value the user was looking at. No
    /// recomputation.
    pub fn stage_edit(
        &mut self,
        id: TransactionId,
        intent: TransactionIntent,
    ) -> Result<Vec<Effect>, MutationError> {
        if self.in_flight.contains_key(&id) {
            return Err(MutationError::InFlight);
        }
        let (category_name, transaction_type) = self.resolve_category(intent.category_id)?;
        if !(intent.amount > 0.0) {
            return Err(MutationError::InvalidAmount);
        }
        let snapshot = self.store.get(id).ok_or(MutationError::UnknownId)?.clone();

        let tentative = Transaction {
            id,
            amount: intent.amount,
            original_amount: intent.original_amount,
            currency: intent.currency,
            category: category_name,
            transaction_type,
            date: intent.date,
            category_id: intent.category_id,
            note: intent.note,
        };

        let view = self
            .balance
            .apply_delta(tentative.signed_amount() - snapshot.signed_amount());
        self.store.replace(id, tentative);
        self.in_flight.insert(id, InFlight::Edit { snapshot });

        Ok(vec![
            Effect::ReplaceRow { old_id: id, id },
            Effect::Balance(view),
        ])
    }

    pub fn settle_edit_success(
        &mut self,
        id: TransactionId,
        mut server_tx: Transaction,
    ) -> Vec<Effect> {
        match self.in_flight.remove(&id) {
            Some(InFlight::Edit { .. }) => {
                let Some(tentative) = self.store.get(id) else {
                    return Vec::new();
                };
                let correction = server_tx.signed_amount() - tentative.signed_amount();
                server_tx.normalize_legacy();
                let new_id = server_tx.id;
                self.store.replace(id, server_tx);

                let mut effects = vec![Effect::ReplaceRow { old_id: id, id: new_id }];
                if correction != 0.0 {
                    effects.push(Effect::Balance(self.balance.apply_correction(correction)));
                }
                effects
            }
            _ => Vec::new(),
        }
    }

    pub fn settle_edit_failure(&mut self, id: TransactionId, message: &str) -> Vec<Effect> {
        match self.in_flight.remove(&id) {
            Some(InFlight::Edit { snapshot }) => {
                let Some(tentative) = self.store.get(id) else {
                    // The tentative record vanished under us; in-place
                    // rollback would be lossy, fall back to a reload.
                    return vec![Effect::Alert(message.to_string()), Effect::FullReload];
                };
                // Invert both staged deltas in one step.
                let rollback = snapshot.signed_amount() - tentative.signed_amount();
                let view = self.balance.apply_delta(rollback);
                self.store.replace(id, snapshot);
                vec![
                    Effect::ReplaceRow { old_id: id, id },
                    Effect::Balance(view),
                    Effect::Alert(message.to_string()),
                ]
            }
            _ => Vec::new(),
        }
    }

    // --- Delete ---

    /// Called after the user confirmed. Applies the inverse delta and removes
    /// the row immediately, before any acknowledgment.
    ///
    /// Deleting a row whose add is still in flight supersedes that add: the
    /// optimistic row is reverted right here, and the engine finishes the
    /// delete server-side once the create settles and the real id is known.
    /// Any other in-flight mutation on the id rejects the delete.
    pub fn stage_delete(
        &mut self,
        id: TransactionId,
    ) -> Result<(DeleteStaging, Vec<Effect>), MutationError> {
        match self.in_flight.get_mut(&id) {
            Some(InFlight::Add {
                superseded_by_delete,
            }) => {
                if *superseded_by_delete {
                    return Err(MutationError::InFlight);
                }
                *superseded_by_delete = true;
                let tx = self.store.remove(id).ok_or(MutationError::UnknownId)?;
                let delta = -tx.signed_amount();
                Ok((
                    DeleteStaging::Deferred,
                    vec![
                        Effect::RemoveRow { tx, animated: true },
                        Effect::Balance(self.balance.apply_delta(delta)),
                    ],
                ))
            }
            Some(_) => Err(MutationError::InFlight),
            None => {
                let tx = self.store.remove(id).ok_or(MutationError::UnknownId)?;
                let delta = -tx.signed_amount();
                let snapshot = tx.clone();
                self.in_flight.insert(id, InFlight::Delete { snapshot });
                Ok((
                    DeleteStaging::Request,
                    vec![
                        Effect::RemoveRow { tx, animated: true },
                        Effect::Balance(self.balance.apply_delta(delta)),
                    ],
                ))
            }
        }
    }

    pub fn settle_delete_success(&mut self, id: TransactionId) -> Vec<Effect> {
        match self.in_flight.remove(&id) {
            Some(InFlight::Delete { .. }) => Vec::new(),
            Some(other) => {
                // Not a delete; put it back untouched.
                self.in_flight.insert(id, other);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Reconstructs the removed entry from its snapshot. Re-insertion is
    /// always lossless here, so the full-reload fallback is never needed on
    /// this path.
    pub fn settle_delete_failure(&mut self, id: TransactionId, message: &str) -> Vec<Effect> {
        match self.in_flight.remove(&id) {
            Some(InFlight::Delete { snapshot }) => {
                let delta = snapshot.signed_amount();
                self.store.insert_sorted(snapshot);
                vec![
                    Effect::InsertRow { id, animated: true },
                    Effect::Balance(self.balance.apply_delta(delta)),
                    Effect::Alert(message.to_string()),
                ]
            }
            Some(other) => {
                self.in_flight.insert(id, other);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    // --- Pagination ---

    /// Returns the `(limit, offset)` window to fetch, or `None` when a page
    /// is already in flight or everything is loaded.
    pub fn begin_page(&mut self, limit: usize) -> Option<(usize, usize)> {
        if self.page_in_flight || self.store.is_all_loaded() {
            return None;
        }
        self.page_in_flight = true;
        Some((limit, self.store.offset()))
    }

    pub fn apply_page(&mut self, mut page: Vec<Transaction>, limit: usize) -> Vec<Effect> {
        self.page_in_flight = false;
        for tx in &mut page {
            tx.normalize_legacy();
        }
        let ids: Vec<TransactionId> = page.iter().map(|tx| tx.id).collect();
        self.store.append_page(page, limit);
        ids.into_iter()
            .map(|id| Effect::InsertRow { id, animated: false })
            .collect()
    }

    pub fn page_failed(&mut self, message: &str) -> Vec<Effect> {
        self.page_in_flight = false;
        vec![Effect::Alert(message.to_string())]
    }

    fn resolve_category(
        &self,
        id: CategoryId,
    ) -> Result<(String, TransactionType), MutationError> {
        self.category(id)
            .map(|c| (c.name.clone(), c.category_type))
            .ok_or(MutationError::UnknownCategory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balance::Pulse;
    use chrono::TimeZone;

    const LIMIT: usize = 50;

    fn categories() -> Vec<Category> {
        vec![
            Category {
                id: 1,
                name: "💰 Salary".to_string(),
                category_type: TransactionType::Income,
                user_id: None,
            },
            Category {
                id: 2,
                name: "🍔 Food".to_string(),
                category_type: TransactionType::Expense,
                user_id: None,
            },
        ]
    }

    fn engine() -> ReconcileEngine {
        let mut engine = ReconcileEngine::new("$");
        engine.set_categories(categories());
        engine.cold_load(Vec::new(), 0.0, LIMIT);
        engine
    }

    fn intent(category_id: CategoryId, amount: f64) -> TransactionIntent {
        TransactionIntent {
            category_id,
            amount,
            original_amount: None,
            currency: None,
            date: Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap(),
            note: None,
        }
    }

    fn server_tx(id: TransactionId, category_id: CategoryId, amount: f64) -> Transaction {
        let category = categories()
            .into_iter()
            .find(|c| c.id == category_id)
            .unwrap();
        Transaction {
            id,
            amount,
            original_amount: None,
            currency: None,
            category: category.name,
            transaction_type: category.category_type,
            date: Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap(),
            category_id,
            note: None,
        }
    }

    fn has_alert(effects: &[Effect]) -> bool {
        effects.iter().any(|e| matches!(e, Effect::Alert(_)))
    }

    #[test]
    fn add_is_applied_before_settlement() {
        let mut engine = engine();
        let (placeholder, effects) = engine.stage_add(intent(1, 100.0)).unwrap();
        assert!(placeholder < 0);
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::InsertRow { animated: true, .. })));
        assert_eq!(engine.store().len(), 1);
        assert_eq!(engine.balance().value(), 100.0);
    }

    #[test]
    fn add_success_confirms_in_place_without_reapplying_delta() {
        let mut engine = engine();
        let (placeholder, _) = engine.stage_add(intent(1, 100.0)).unwrap();
        let effects = engine.settle_add_success(placeholder, server_tx(7, 1, 100.0));

        assert_eq!(
            effects,
            vec![Effect::ReplaceRow {
                old_id: placeholder,
                id: 7
            }]
        );
        assert_eq!(engine.store().len(), 1);
        assert!(engine.store().contains(7));
        assert!(!engine.store().contains(placeholder));
        assert_eq!(engine.balance().value(), 100.0);
    }

    #[test]
    fn add_failure_rolls_back_exactly() {
        let mut engine = engine();
        engine.cold_load(vec![server_tx(1, 2, 30.0)], -30.0, LIMIT);
        let rows_before = engine.store().len();
        let balance_before = engine.balance().value();

        let (placeholder, _) = engine.stage_add(intent(2, 45.0)).unwrap();
        let effects = engine.settle_add_failure(placeholder, "network down");

        assert!(has_alert(&effects));
        assert_eq!(engine.store().len(), rows_before);
        assert_eq!(engine.balance().value(), balance_before);
        assert!(!engine.store().contains(placeholder));
    }

    #[test]
    fn duplicate_add_settlement_is_a_no_op() {
        let mut engine = engine();
        let (placeholder, _) = engine.stage_add(intent(1, 100.0)).unwrap();
        engine.settle_add_success(placeholder, server_tx(7, 1, 100.0));
        let again = engine.settle_add_success(placeholder, server_tx(7, 1, 100.0));

        assert!(again.is_empty());
        assert_eq!(engine.store().len(), 1);
        assert_eq!(engine.balance().value(), 100.0);
    }

    #[test]
    fn add_settlement_corrects_approximate_conversion() {
        let mut engine = engine();
        let mut foreign = intent(2, 11.0);
        foreign.original_amount = Some(1000.0);
        foreign.currency = Some("RUB".to_string());
        let (placeholder, _) = engine.stage_add(foreign).unwrap();
        assert_eq!(engine.balance().value(), -11.0);

        let mut confirmed = server_tx(9, 2, 10.4);
        confirmed.original_amount = Some(1000.0);
        confirmed.currency = Some("RUB".to_string());
        let effects = engine.settle_add_success(placeholder, confirmed);

        let balance_effect = effects
            .iter()
            .find_map(|e| match e {
                Effect::Balance(view) => Some(view),
                _ => None,
            })
            .expect("correction emitted");
        assert!((balance_effect.value - -10.4).abs() < 1e-9);
        assert_eq!(balance_effect.pulse, None);
        assert!((engine.balance().value() - engine.store().signed_total()).abs() < 1e-9);
    }

    #[test]
    fn edit_applies_net_delta_and_commits() {
        let mut engine = engine();
        engine.cold_load(vec![server_tx(5, 2, 50.0)], -50.0, LIMIT);

        let effects = engine.stage_edit(5, intent(2, 200.0)).unwrap();
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::ReplaceRow { old_id: 5, id: 5 })));
        assert_eq!(engine.balance().value(), -200.0);

        engine.settle_edit_success(5, server_tx(5, 2, 200.0));
        assert_eq!(engine.balance().value(), -200.0);
        assert_eq!(engine.store().get(5).unwrap().amount, 200.0);
    }

    #[test]
    fn edit_flash_follows_the_net_change() {
        let mut engine = engine();
        engine.cold_load(vec![server_tx(5, 2, 200.0)], -200.0, LIMIT);

        // Shrinking an expense raises the balance; the flash must say so.
        let effects = engine.stage_edit(5, intent(2, 50.0)).unwrap();
        let view = effects
            .iter()
            .find_map(|e| match e {
                Effect::Balance(view) => Some(view),
                _ => None,
            })
            .expect("balance emitted");
        assert_eq!(view.value, -50.0);
        assert_eq!(view.pulse, Some(Pulse::Increase));
    }

    #[test]
    fn currency_change_suppresses_exactly_one_edit_flash() {
        let mut engine = engine();
        engine.cold_load(vec![server_tx(5, 2, 50.0)], -50.0, LIMIT);
        engine.set_currency_symbol("€");

        let effects = engine.stage_edit(5, intent(2, 80.0)).unwrap();
        let view = effects
            .iter()
            .find_map(|e| match e {
                Effect::Balance(view) => Some(view),
                _ => None,
            })
            .expect("balance emitted");
        assert_eq!(view.pulse, None);

        // The one-shot suppression is spent; the next edit flashes again.
        engine.settle_edit_success(5, server_tx(5, 2, 80.0));
        let effects = engine.stage_edit(5, intent(2, 95.0)).unwrap();
        let view = effects
            .iter()
            .find_map(|e| match e {
                Effect::Balance(view) => Some(view),
                _ => None,
            })
            .expect("balance emitted");
        assert_eq!(view.pulse, Some(Pulse::Decrease));
    }

    #[test]
    fn edit_failure_restores_snapshot_and_both_deltas() {
        let mut engine = engine();
        engine.cold_load(vec![server_tx(5, 2, 50.0)], -50.0, LIMIT);
        let original = engine.store().get(5).unwrap().clone();

        engine.stage_edit(5, intent(2, 200.0)).unwrap();
        let effects = engine.settle_edit_failure(5, "rejected");

        assert!(has_alert(&effects));
        assert_eq!(engine.store().get(5).unwrap(), &original);
        assert_eq!(engine.balance().value(), -50.0);
    }

    #[test]
    fn edit_can_flip_type() {
        let mut engine = engine();
        engine.cold_load(vec![server_tx(5, 2, 50.0)], -50.0, LIMIT);

        engine.stage_edit(5, intent(1, 50.0)).unwrap();
        assert_eq!(engine.balance().value(), 50.0);
        engine.settle_edit_success(5, server_tx(5, 1, 50.0));
        assert_eq!(engine.balance().value(), engine.store().signed_total());
    }

    #[test]
    fn delete_applies_before_acknowledgment_and_restores_on_failure() {
        let mut engine = engine();
        engine.cold_load(vec![server_tx(5, 2, 50.0)], -50.0, LIMIT);

        let (staging, effects) = engine.stage_delete(5).unwrap();
        assert_eq!(staging, DeleteStaging::Request);
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::RemoveRow { animated: true, .. })));
        assert!(engine.store().is_empty());
        assert_eq!(engine.balance().value(), 0.0);

        let effects = engine.settle_delete_failure(5, "offline");
        assert!(has_alert(&effects));
        assert_eq!(engine.store().len(), 1);
        assert_eq!(engine.store().get(5).unwrap().amount, 50.0);
        assert_eq!(engine.balance().value(), -50.0);
    }

    #[test]
    fn concurrent_mutations_on_same_id_are_rejected() {
        let mut engine = engine();
        engine.cold_load(vec![server_tx(5, 2, 50.0)], -50.0, LIMIT);

        engine.stage_edit(5, intent(2, 60.0)).unwrap();
        assert_eq!(
            engine.stage_edit(5, intent(2, 70.0)).unwrap_err(),
            MutationError::InFlight
        );
        assert_eq!(
            engine.stage_delete(5).unwrap_err(),
            MutationError::InFlight
        );
    }

    #[test]
    fn mutations_on_different_ids_run_independently() {
        let mut engine = engine();
        engine.cold_load(vec![server_tx(5, 2, 50.0), server_tx(6, 2, 20.0)], -70.0, LIMIT);

        engine.stage_edit(5, intent(2, 60.0)).unwrap();
        engine.stage_edit(6, intent(2, 25.0)).unwrap();
        engine.settle_edit_success(6, server_tx(6, 2, 25.0));
        engine.settle_edit_failure(5, "rejected");

        assert_eq!(engine.balance().value(), engine.store().signed_total());
        assert_eq!(engine.store().get(5).unwrap().amount, 50.0);
        assert_eq!(engine.store().get(6).unwrap().amount, 25.0);
    }

    #[test]
    fn delete_supersedes_unsettled_add_with_create_winning_the_race() {
        let mut engine = engine();
        let (placeholder, _) = engine.stage_add(intent(1, 100.0)).unwrap();
        assert_eq!(engine.balance().value(), 100.0);

        let (staging, _) = engine.stage_delete(placeholder).unwrap();
        assert_eq!(staging, DeleteStaging::Deferred);
        assert!(engine.store().is_empty());
        assert_eq!(engine.balance().value(), 0.0);

        // Create settles afterwards: no row may reappear, and the confirmed
        // record must be deleted server-side.
        let effects = engine.settle_add_success(placeholder, server_tx(7, 1, 100.0));
        assert_eq!(effects, vec![Effect::DeleteOnServer { id: 7 }]);
        assert!(engine.store().is_empty());
        assert_eq!(engine.balance().value(), 0.0);
    }

    #[test]
    fn delete_supersedes_unsettled_add_with_failure_winning_the_race() {
        let mut engine = engine();
        let (placeholder, _) = engine.stage_add(intent(1, 100.0)).unwrap();
        engine.stage_delete(placeholder).unwrap();

        let effects = engine.settle_add_failure(placeholder, "network down");
        assert!(effects.is_empty());
        assert!(engine.store().is_empty());
        assert_eq!(engine.balance().value(), 0.0);
    }

    #[test]
    fn stale_delete_settlement_does_not_resurrect() {
        let mut engine = engine();
        engine.cold_load(vec![server_tx(5, 2, 50.0)], -50.0, LIMIT);
        engine.stage_delete(5).unwrap();
        engine.settle_delete_success(5);

        assert!(engine.settle_delete_failure(5, "late duplicate").is_empty());
        assert!(engine.settle_delete_success(5).is_empty());
        assert!(engine.store().is_empty());
        assert_eq!(engine.balance().value(), 0.0);
    }

    #[test]
    fn balance_is_conserved_over_a_mutation_sequence() {
        let mut engine = engine();
        engine.cold_load(Vec::new(), 0.0, LIMIT);

        let (p1, _) = engine.stage_add(intent(1, 1000.0)).unwrap();
        engine.settle_add_success(p1, server_tx(10, 1, 1000.0));

        let (p2, _) = engine.stage_add(intent(2, 120.0)).unwrap();
        engine.settle_add_success(p2, server_tx(11, 2, 120.0));

        engine.stage_edit(11, intent(2, 90.0)).unwrap();
        engine.settle_edit_success(11, server_tx(11, 2, 90.0));

        let (_, _effects) = engine.stage_delete(10).unwrap();
        engine.settle_delete_success(10);

        assert_eq!(engine.balance().value(), engine.store().signed_total());
        assert_eq!(engine.balance().value(), -90.0);
    }

    #[test]
    fn rejected_validation_changes_nothing() {
        let mut engine = engine();
        assert_eq!(
            engine.stage_add(intent(1, 0.0)).unwrap_err(),
            MutationError::InvalidAmount
        );
        assert_eq!(
            engine.stage_add(intent(99, 5.0)).unwrap_err(),
            MutationError::UnknownCategory
        );
        assert!(engine.store().is_empty());
        assert_eq!(engine.balance().value(), 0.0);
    }

    #[test]
    fn pagination_guards_and_appends() {
        let mut engine = engine();
        engine.cold_load(
            (0..LIMIT as i64)
                .map(|i| server_tx(100 + i, 2, 1.0))
                .collect(),
            -(LIMIT as f64),
            LIMIT,
        );

        let window = engine.begin_page(LIMIT).expect("first page request");
        assert_eq!(window, (LIMIT, LIMIT));
        assert!(engine.begin_page(LIMIT).is_none());

        engine.apply_page(vec![server_tx(50, 2, 1.0)], LIMIT);
        assert!(engine.store().is_all_loaded());
        assert!(engine.begin_page(LIMIT).is_none());
    }
}
