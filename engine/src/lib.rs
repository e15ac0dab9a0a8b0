//! # Optimistic mutation core
//!
//! Everything in this crate runs synchronously on the UI thread and knows
//! nothing about the DOM or the network. The frontend applies a user intent
//! here first (so the list, balance and sheets update instantly), issues the
//! matching request, and feeds the settlement back in exactly once. Each
//! staging or settlement call returns the view commands the renderer has to
//! carry out.
//!
//! ## Modules
//! - [`store`] — ordered transaction list plus the pagination cursor
//! - [`balance`] — incrementally maintained running balance
//! - [`reconcile`] — optimistic add/edit/delete and rollback orchestration
//! - [`swipe`] — swipe-to-delete gesture state machine
//! - [`sheet`] — single-active bottom sheet manager

pub mod balance;
pub mod reconcile;
pub mod sheet;
pub mod store;
pub mod swipe;

pub use balance::{BalanceProjector, BalanceView, Pulse};
pub use reconcile::{DeleteStaging, Effect, MutationError, ReconcileEngine, TransactionIntent};
pub use sheet::{DragOutcome, SheetCommand, SheetConfig, SheetKind, SheetManager};
pub use store::TransactionStore;
pub use swipe::{SwipeConfig, SwipeMachine, SwipeOutcome, SwipeUpdate};
