use std::cell::RefCell;
use std::rc::Rc;

use chrono::{NaiveDate, NaiveTime, Utc};
use gloo::timers::future::TimeoutFuture;
use shared::{
    Category, CategoryId, CreateTransactionRequest, Transaction, TransactionId, TransactionType,
    UpdateTransactionRequest,
};
use yew::prelude::*;

use engine::{
    DeleteStaging, DragOutcome, Effect, ReconcileEngine, SheetCommand, SheetConfig, SheetKind,
    SwipeConfig, SwipeMachine, SwipeOutcome, SwipeUpdate, TransactionIntent,
};
use engine::{BalanceView, SheetManager};

use crate::components::balance_header::BalanceHeader;
use crate::components::bottom_sheet::{BottomSheet, SheetVisual};
use crate::components::category_grid::CategoryGrid;
use crate::components::day_sheet::DaySheet;
use crate::components::quick_add_sheet::QuickAddSheet;
use crate::components::summary_sheet::SummarySheet;
use crate::components::transaction_form::{FormState, TransactionForm};
use crate::components::transaction_list::TransactionList;
use crate::services::api::{ApiClient, ApiError};
use crate::services::logging::Logger;
use crate::services::telegram::TelegramWebApp;

const PAGE_LIMIT: usize = 50;
/// Entrance flash and balance pulse duration, matching the CSS animations.
const ENTRANCE_MS: u32 = 600;
const PULSE_MS: u32 = 600;
/// Collapse animation of a removed row.
const COLLAPSE_MS: u32 = 300;
/// One-frame-ish delay between unhiding a sheet and starting its slide, so
/// the transition actually runs.
const SLIDE_IN_DELAY_MS: u32 = 20;

#[derive(Default)]
struct QuickAddState {
    category_id: Option<CategoryId>,
    amount: String,
}

/// Generation counter for the balance flash. Each new pulse issues a fresh
/// token for its expiry timer; a timer whose token is stale belongs to an
/// earlier flash and must not retire the current one.
#[derive(Default)]
struct PulseToken(u64);

impl PulseToken {
    fn issue(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    fn is_current(&self, token: u64) -> bool {
        token == self.0
    }
}

pub enum Msg {
    BootLoaded(Result<(Vec<Category>, Vec<Transaction>, f64), ApiError>),
    Reload,
    ReloadLoaded(Result<(Vec<Transaction>, f64), ApiError>),
    CurrencyChanged(String),
    LoadMore,
    PageLoaded(Result<Vec<Transaction>, ApiError>),

    QuickCategoryPicked(CategoryId),
    QuickAmountChanged(String),
    QuickSave,

    OpenAddForm,
    OpenEditForm(TransactionId),
    FormChanged(FormState),
    FormSave,
    FormCancel,
    FormDelete,

    AddSettled {
        placeholder: TransactionId,
        result: Result<Transaction, ApiError>,
    },
    EditSettled {
        id: TransactionId,
        result: Result<Transaction, ApiError>,
    },
    DeleteSettled {
        id: TransactionId,
        result: Result<(), ApiError>,
    },
    FollowUpDeleted(Result<(), ApiError>),

    SwipeTracked(Option<(TransactionId, f64)>),
    SwipeEnded(SwipeOutcome),
    DeleteConfirmed {
        id: TransactionId,
        confirmed: bool,
    },
    DepartureDone,
    HighlightDone(TransactionId),
    BalancePulseDone(u64),

    OpenSheet(SheetKind),
    OpenDaySheet(NaiveDate),
    CloseSheet,
    SheetSlidIn(SheetKind),
    SheetHidden(SheetKind),
    SheetDragStart {
        y: f64,
    },
    SheetDragMove(f64),
    SheetDragEnd,
}

pub struct App {
    api: Rc<ApiClient>,
    telegram: Rc<TelegramWebApp>,
    engine: ReconcileEngine,
    sheets: SheetManager,
    /// Shared with the touch callbacks, which must decide about
    /// `preventDefault` synchronously — before any message dispatch.
    swipe: Rc<RefCell<SwipeMachine>>,

    balance: BalanceView,
    currency_symbol: String,
    loading: bool,
    list_error: Option<String>,
    fatal_auth: bool,
    page_loading: bool,

    highlight_id: Option<TransactionId>,
    departing: Option<Transaction>,
    swipe_track: Option<(TransactionId, f64)>,
    pulse_token: PulseToken,

    form: Option<FormState>,
    quick: QuickAddState,
    day: Option<NaiveDate>,

    sheet_visuals: [SheetVisual; 3],
    content_refs: [NodeRef; 3],
    backdrop_shown: bool,
}

fn sheet_index(kind: SheetKind) -> usize {
    match kind {
        SheetKind::DayDetail => 0,
        SheetKind::QuickAdd => 1,
        SheetKind::SummaryDetail => 2,
    }
}

impl Component for App {
    type Message = Msg;
    type Properties = ();

    fn create(ctx: &Context<Self>) -> Self {
        let telegram = Rc::new(TelegramWebApp::connect());
        telegram.ready();
        telegram.expand();
        telegram.disable_vertical_swipes();

        let api = Rc::new(ApiClient::new(telegram.init_data()));
        let fatal_auth = !api.has_auth();
        if fatal_auth {
            Logger::error_with_component("app", "no init data, refusing to start");
        }

        let engine = ReconcileEngine::new("$");
        let balance = engine.balance().view();

        if !fatal_auth {
            let api = api.clone();
            ctx.link().send_future(async move {
                let result: Result<_, ApiError> = async {
                    let categories = api.list_categories().await?;
                    let transactions = api.list_transactions(PAGE_LIMIT, 0).await?;
                    let balance = api.get_balance().await?;
                    Ok((categories, transactions, balance))
                }
                .await;
                Msg::BootLoaded(result)
            });
        }

        Self {
            api,
            telegram,
            engine,
            sheets: SheetManager::new(SheetConfig::default()),
            swipe: Rc::new(RefCell::new(SwipeMachine::new(SwipeConfig::default()))),
            balance,
            currency_symbol: "$".to_string(),
            loading: !fatal_auth,
            list_error: None,
            fatal_auth,
            page_loading: false,
            highlight_id: None,
            departing: None,
            swipe_track: None,
            pulse_token: PulseToken::default(),
            form: None,
            quick: QuickAddState::default(),
            day: None,
            sheet_visuals: Default::default(),
            content_refs: Default::default(),
            backdrop_shown: false,
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::BootLoaded(Ok((categories, transactions, balance))) => {
                self.loading = false;
                self.list_error = None;
                self.engine.set_categories(categories);
                let effect = self.engine.cold_load(transactions, balance, PAGE_LIMIT);
                self.apply_effects(ctx, vec![effect]);
                true
            }
            Msg::BootLoaded(Err(error)) | Msg::ReloadLoaded(Err(error)) => {
                self.loading = false;
                if matches!(error, ApiError::MissingAuth) {
                    self.fatal_auth = true;
                }
                self.list_error = Some(error.to_string());
                Logger::error_with_component("app", &format!("load failed: {}", error));
                true
            }
            Msg::Reload => {
                self.loading = self.engine.store().is_empty();
                self.list_error = None;
                let api = self.api.clone();
                ctx.link().send_future(async move {
                    let result: Result<_, ApiError> = async {
                        let transactions = api.list_transactions(PAGE_LIMIT, 0).await?;
                        let balance = api.get_balance().await?;
                        Ok((transactions, balance))
                    }
                    .await;
                    Msg::ReloadLoaded(result)
                });
                true
            }
            Msg::ReloadLoaded(Ok((transactions, balance))) => {
                self.loading = false;
                self.list_error = None;
                let effect = self.engine.cold_load(transactions, balance, PAGE_LIMIT);
                self.apply_effects(ctx, vec![effect]);
                true
            }
            Msg::CurrencyChanged(symbol) => {
                self.currency_symbol = symbol.clone();
                let effect = self.engine.set_currency_symbol(&symbol);
                self.apply_effects(ctx, vec![effect]);
                true
            }
            Msg::LoadMore => {
                let Some((limit, offset)) = self.engine.begin_page(PAGE_LIMIT) else {
                    return false;
                };
                self.page_loading = true;
                let api = self.api.clone();
                ctx.link().send_future(async move {
                    Msg::PageLoaded(api.list_transactions(limit, offset).await)
                });
                true
            }
            Msg::PageLoaded(result) => {
                self.page_loading = false;
                let effects = match result {
                    Ok(page) => self.engine.apply_page(page, PAGE_LIMIT),
                    Err(error) => self.engine.page_failed(&error.to_string()),
                };
                self.apply_effects(ctx, effects);
                true
            }

            Msg::QuickCategoryPicked(category_id) => {
                self.quick = QuickAddState {
                    category_id: Some(category_id),
                    amount: String::new(),
                };
                let commands = self.sheets.open(SheetKind::QuickAdd);
                self.apply_sheet_commands(ctx, commands);
                true
            }
            Msg::QuickAmountChanged(amount) => {
                self.quick.amount = amount;
                true
            }
            Msg::QuickSave => {
                let Some(category_id) = self.quick.category_id else {
                    return false;
                };
                let amount: f64 = match self.quick.amount.trim().replace(',', ".").parse() {
                    Ok(v) if v > 0.0 => v,
                    _ => {
                        self.telegram.show_alert("Enter a valid amount");
                        return false;
                    }
                };
                let intent = TransactionIntent {
                    category_id,
                    amount,
                    original_amount: None,
                    currency: None,
                    date: Utc::now(),
                    note: None,
                };
                match self.engine.stage_add(intent) {
                    Ok((placeholder, effects)) => {
                        self.apply_effects(ctx, effects);
                        let commands = self.sheets.close();
                        self.apply_sheet_commands(ctx, commands);
                        let request = CreateTransactionRequest {
                            category_id,
                            amount,
                            currency: None,
                            date: Utc::now().date_naive().format("%Y-%m-%d").to_string(),
                            note: None,
                        };
                        let api = self.api.clone();
                        ctx.link().send_future(async move {
                            Msg::AddSettled {
                                placeholder,
                                result: api.create_transaction(&request).await,
                            }
                        });
                    }
                    Err(error) => self.telegram.show_alert(&error.to_string()),
                }
                true
            }

            Msg::OpenAddForm => {
                self.form = Some(FormState::for_add(Utc::now().date_naive()));
                true
            }
            Msg::OpenEditForm(id) => {
                if self.engine.is_in_flight(id) {
                    self.telegram
                        .show_alert("This entry is still syncing, try again in a moment");
                    return false;
                }
                let Some(tx) = self.engine.store().get(id) else {
                    return false;
                };
                self.form = Some(FormState::for_edit(tx));
                let commands = self.sheets.close();
                self.apply_sheet_commands(ctx, commands);
                true
            }
            Msg::FormChanged(state) => {
                self.form = Some(state);
                true
            }
            Msg::FormCancel => {
                self.form = None;
                true
            }
            Msg::FormSave => self.save_form(ctx),
            Msg::FormDelete => {
                let Some(id) = self.form.as_ref().and_then(|f| f.editing) else {
                    return false;
                };
                self.confirm_delete(ctx, id);
                false
            }

            Msg::AddSettled {
                placeholder,
                result,
            } => {
                let effects = match result {
                    Ok(server_tx) => self.engine.settle_add_success(placeholder, server_tx),
                    Err(error) => self
                        .engine
                        .settle_add_failure(placeholder, &error.to_string()),
                };
                self.apply_effects(ctx, effects);
                true
            }
            Msg::EditSettled { id, result } => {
                let effects = match result {
                    Ok(server_tx) => self.engine.settle_edit_success(id, server_tx),
                    Err(error) => self.engine.settle_edit_failure(id, &error.to_string()),
                };
                self.apply_effects(ctx, effects);
                true
            }
            Msg::DeleteSettled { id, result } => {
                let effects = match result {
                    Ok(()) => self.engine.settle_delete_success(id),
                    Err(error) => self.engine.settle_delete_failure(id, &error.to_string()),
                };
                self.apply_effects(ctx, effects);
                true
            }
            Msg::FollowUpDeleted(result) => {
                if let Err(error) = result {
                    // The server kept a record the client no longer shows;
                    // resync rather than guess.
                    Logger::error_with_component(
                        "app",
                        &format!("follow-up delete failed: {}", error),
                    );
                    self.telegram.show_alert(&error.to_string());
                    ctx.link().send_message(Msg::Reload);
                }
                false
            }

            Msg::SwipeTracked(track) => {
                self.swipe_track = track;
                true
            }
            Msg::SwipeEnded(outcome) => match outcome {
                SwipeOutcome::Committed { row } => {
                    // Hold the row at the reveal width while the user decides.
                    let reveal = self.swipe.borrow().config().reveal_width;
                    self.swipe_track = Some((row, -reveal));
                    self.telegram.haptic_impact("medium");
                    self.confirm_delete(ctx, row);
                    true
                }
                SwipeOutcome::Cancelled { .. } => {
                    self.swipe_track = None;
                    true
                }
                SwipeOutcome::None => false,
            },
            Msg::DeleteConfirmed { id, confirmed } => {
                self.swipe_track = None;
                if !confirmed {
                    return true;
                }
                if self.form.as_ref().and_then(|f| f.editing) == Some(id) {
                    self.form = None;
                }
                match self.engine.stage_delete(id) {
                    Ok((DeleteStaging::Request, effects)) => {
                        self.apply_effects(ctx, effects);
                        let api = self.api.clone();
                        ctx.link().send_future(async move {
                            Msg::DeleteSettled {
                                id,
                                result: api.delete_transaction(id).await,
                            }
                        });
                    }
                    Ok((DeleteStaging::Deferred, effects)) => {
                        // The create is still in flight; the engine finishes
                        // the delete when it settles.
                        self.apply_effects(ctx, effects);
                    }
                    Err(error) => self.telegram.show_alert(&error.to_string()),
                }
                true
            }
            Msg::DepartureDone => {
                self.departing = None;
                true
            }
            Msg::HighlightDone(id) => {
                if self.highlight_id == Some(id) {
                    self.highlight_id = None;
                    return true;
                }
                false
            }
            Msg::BalancePulseDone(token) => {
                if self.pulse_token.is_current(token) && self.balance.pulse.is_some() {
                    self.balance.pulse = None;
                    return true;
                }
                false
            }

            Msg::OpenSheet(kind) => {
                let commands = self.sheets.open(kind);
                self.apply_sheet_commands(ctx, commands);
                true
            }
            Msg::OpenDaySheet(day) => {
                self.day = Some(day);
                let commands = self.sheets.open(SheetKind::DayDetail);
                self.apply_sheet_commands(ctx, commands);
                true
            }
            Msg::CloseSheet => {
                let commands = self.sheets.close();
                self.apply_sheet_commands(ctx, commands);
                true
            }
            Msg::SheetSlidIn(kind) => {
                if self.sheets.is_open(kind) {
                    self.sheet_visuals[sheet_index(kind)].offscreen = false;
                    return true;
                }
                false
            }
            Msg::SheetHidden(kind) => {
                if !self.sheets.is_open(kind) {
                    let visual = &mut self.sheet_visuals[sheet_index(kind)];
                    visual.hidden = true;
                    visual.offscreen = true;
                    return true;
                }
                false
            }
            Msg::SheetDragStart { y } => {
                let scroll_top = self
                    .sheets
                    .active()
                    .and_then(|kind| self.content_refs[sheet_index(kind)].cast::<web_sys::Element>())
                    .map(|el| el.scroll_top() as f64)
                    .unwrap_or(0.0);
                self.sheets.drag_start(y, scroll_top);
                false
            }
            Msg::SheetDragMove(y) => {
                let Some(offset) = self.sheets.drag_move(y) else {
                    return false;
                };
                if let Some(kind) = self.sheets.active() {
                    self.sheet_visuals[sheet_index(kind)].drag_offset = offset;
                    return true;
                }
                false
            }
            Msg::SheetDragEnd => match self.sheets.drag_end() {
                DragOutcome::Dismissed(commands) => {
                    self.apply_sheet_commands(ctx, commands);
                    true
                }
                DragOutcome::SpringBack(kind) => {
                    self.sheet_visuals[sheet_index(kind)].drag_offset = 0.0;
                    true
                }
                DragOutcome::None => false,
            },
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        if self.fatal_auth {
            return html! {
                <div class="fatal-screen">
                    <h2>{"Can't start"}</h2>
                    <p>{ self.list_error.clone().unwrap_or_else(||
                        "Authentication data is missing. Please open this app from Telegram.".to_string()) }
                    </p>
                </div>
            };
        }

        if let Some(form) = &self.form {
            let on_delete = form
                .editing
                .map(|_| ctx.link().callback(|_| Msg::FormDelete));
            return html! {
                <TransactionForm
                    form={form.clone()}
                    categories={self.engine.categories().to_vec()}
                    on_change={ctx.link().callback(Msg::FormChanged)}
                    on_save={ctx.link().callback(|_| Msg::FormSave)}
                    on_cancel={ctx.link().callback(|_| Msg::FormCancel)}
                    {on_delete}
                />
            };
        }

        let on_row_touch_start = {
            let swipe = self.swipe.clone();
            Callback::from(move |(id, e): (TransactionId, TouchEvent)| {
                if let Some(touch) = e.touches().get(0) {
                    swipe
                        .borrow_mut()
                        .touch_start(id, touch.client_x() as f64, touch.client_y() as f64);
                }
            })
        };
        let on_row_touch_move = {
            let swipe = self.swipe.clone();
            let link = ctx.link().clone();
            Callback::from(move |e: TouchEvent| {
                let Some(touch) = e.touches().get(0) else {
                    return;
                };
                let update = swipe
                    .borrow_mut()
                    .touch_move(touch.client_x() as f64, touch.client_y() as f64);
                match update {
                    SwipeUpdate::Track { row, offset_x } => {
                        // Claim the gesture before the browser scrolls.
                        e.prevent_default();
                        link.send_message(Msg::SwipeTracked(Some((row, offset_x))));
                    }
                    SwipeUpdate::ReleaseToScroll => {
                        link.send_message(Msg::SwipeTracked(None));
                    }
                    SwipeUpdate::None => {}
                }
            })
        };
        let on_row_touch_end = {
            let swipe = self.swipe.clone();
            let link = ctx.link().clone();
            Callback::from(move |_: TouchEvent| {
                let outcome = swipe.borrow_mut().touch_end();
                link.send_message(Msg::SwipeEnded(outcome));
            })
        };

        let on_sheet_drag_start = ctx.link().batch_callback(|e: TouchEvent| {
            e.touches()
                .get(0)
                .map(|t| Msg::SheetDragStart { y: t.client_y() as f64 })
        });
        let on_sheet_drag_move = ctx.link().batch_callback(|e: TouchEvent| {
            e.prevent_default();
            e.touches()
                .get(0)
                .map(|t| Msg::SheetDragMove(t.client_y() as f64))
        });
        let on_sheet_drag_end = ctx.link().callback(|_: TouchEvent| Msg::SheetDragEnd);

        let transition_ms = self.sheets.config().transition_ms;
        let store = self.engine.store();

        let expense_categories: Vec<Category> = self
            .engine
            .categories()
            .iter()
            .filter(|c| c.category_type == TransactionType::Expense)
            .cloned()
            .collect();

        let day_title = self
            .day
            .map(|d| d.format("%b %-d").to_string())
            .unwrap_or_else(|| "Day".to_string());
        let day_transactions: Vec<Transaction> = self
            .day
            .map(|d| store.transactions_on(d).into_iter().cloned().collect())
            .unwrap_or_default();

        let quick_category = self
            .quick
            .category_id
            .and_then(|id| self.engine.category(id))
            .cloned();

        let (income, expense) = store.iter().fold((0.0, 0.0), |(i, e), tx| {
            match tx.transaction_type {
                TransactionType::Income => (i + tx.amount, e),
                TransactionType::Expense => (i, e + tx.amount),
            }
        });

        html! {
            <div class="app">
                <BalanceHeader
                    view={self.balance.clone()}
                    symbol={self.currency_symbol.clone()}
                    on_symbol_change={ctx.link().callback(Msg::CurrencyChanged)}
                    on_tap={ctx.link().callback(|_| Msg::OpenSheet(SheetKind::SummaryDetail))}
                />

                <TransactionList
                    transactions={store.iter().cloned().collect::<Vec<_>>()}
                    departing={self.departing.clone()}
                    highlight_id={self.highlight_id}
                    swipe_track={self.swipe_track}
                    currency_symbol={self.currency_symbol.clone()}
                    loading={self.loading}
                    error={self.list_error.clone()}
                    all_loaded={store.is_all_loaded()}
                    page_loading={self.page_loading}
                    on_retry={ctx.link().callback(|_| Msg::Reload)}
                    on_load_more={ctx.link().callback(|_| Msg::LoadMore)}
                    on_edit={ctx.link().callback(Msg::OpenEditForm)}
                    on_day_tap={ctx.link().callback(Msg::OpenDaySheet)}
                    on_row_touch_start={on_row_touch_start}
                    on_row_touch_move={on_row_touch_move}
                    on_row_touch_end={on_row_touch_end}
                />

                <CategoryGrid
                    categories={expense_categories}
                    on_pick={ctx.link().callback(Msg::QuickCategoryPicked)}
                />

                <button class="add-fab" onclick={ctx.link().callback(|_| Msg::OpenAddForm)}>
                    {"+"}
                </button>

                <div
                    class={classes!("backdrop", self.backdrop_shown.then_some("visible"))}
                    onclick={ctx.link().callback(|_| Msg::CloseSheet)}
                ></div>

                <BottomSheet
                    title={day_title}
                    visual={self.sheet_visuals[sheet_index(SheetKind::DayDetail)].clone()}
                    {transition_ms}
                    content_ref={self.content_refs[sheet_index(SheetKind::DayDetail)].clone()}
                    on_close={ctx.link().callback(|_| Msg::CloseSheet)}
                    on_drag_start={on_sheet_drag_start.clone()}
                    on_drag_move={on_sheet_drag_move.clone()}
                    on_drag_end={on_sheet_drag_end.clone()}
                >
                    <DaySheet
                        transactions={day_transactions}
                        currency_symbol={self.currency_symbol.clone()}
                        on_edit={ctx.link().callback(Msg::OpenEditForm)}
                    />
                </BottomSheet>

                <BottomSheet
                    title={"Quick Add".to_string()}
                    visual={self.sheet_visuals[sheet_index(SheetKind::QuickAdd)].clone()}
                    {transition_ms}
                    content_ref={self.content_refs[sheet_index(SheetKind::QuickAdd)].clone()}
                    on_close={ctx.link().callback(|_| Msg::CloseSheet)}
                    on_drag_start={on_sheet_drag_start.clone()}
                    on_drag_move={on_sheet_drag_move.clone()}
                    on_drag_end={on_sheet_drag_end.clone()}
                >
                    <QuickAddSheet
                        category={quick_category}
                        amount={self.quick.amount.clone()}
                        on_amount={ctx.link().callback(Msg::QuickAmountChanged)}
                        on_save={ctx.link().callback(|_| Msg::QuickSave)}
                    />
                </BottomSheet>

                <BottomSheet
                    title={"Summary".to_string()}
                    visual={self.sheet_visuals[sheet_index(SheetKind::SummaryDetail)].clone()}
                    {transition_ms}
                    content_ref={self.content_refs[sheet_index(SheetKind::SummaryDetail)].clone()}
                    on_close={ctx.link().callback(|_| Msg::CloseSheet)}
                    on_drag_start={on_sheet_drag_start}
                    on_drag_move={on_sheet_drag_move}
                    on_drag_end={on_sheet_drag_end}
                >
                    <SummarySheet
                        {income}
                        {expense}
                        currency_symbol={self.currency_symbol.clone()}
                        count={store.len()}
                    />
                </BottomSheet>
            </div>
        }
    }
}

impl App {
    /// Runs the engine's view commands against the rendered state and
    /// schedules the timers that retire the transient classes.
    fn apply_effects(&mut self, ctx: &Context<Self>, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::InsertRow { id, animated } => {
                    if animated {
                        self.highlight_id = Some(id);
                        ctx.link().send_future(async move {
                            TimeoutFuture::new(ENTRANCE_MS).await;
                            Msg::HighlightDone(id)
                        });
                    }
                }
                Effect::ReplaceRow { old_id, id } => {
                    // Keep the entrance flash attached across an id change.
                    if self.highlight_id == Some(old_id) {
                        self.highlight_id = Some(id);
                    }
                }
                Effect::RemoveRow { tx, animated } => {
                    if animated {
                        self.departing = Some(tx);
                        ctx.link().send_future(async {
                            TimeoutFuture::new(COLLAPSE_MS).await;
                            Msg::DepartureDone
                        });
                    }
                }
                Effect::Balance(view) => {
                    let pulsed = view.pulse.is_some();
                    self.balance = view;
                    if pulsed {
                        let token = self.pulse_token.issue();
                        ctx.link().send_future(async move {
                            TimeoutFuture::new(PULSE_MS).await;
                            Msg::BalancePulseDone(token)
                        });
                    }
                }
                Effect::Alert(message) => self.telegram.show_alert(&message),
                Effect::FullReload => ctx.link().send_message(Msg::Reload),
                Effect::DeleteOnServer { id } => {
                    let api = self.api.clone();
                    ctx.link().send_future(async move {
                        Msg::FollowUpDeleted(api.delete_transaction(id).await)
                    });
                }
            }
        }
    }

    fn apply_sheet_commands(&mut self, ctx: &Context<Self>, commands: Vec<SheetCommand>) {
        for command in commands {
            match command {
                SheetCommand::Show(kind) => {
                    let visual = &mut self.sheet_visuals[sheet_index(kind)];
                    visual.hidden = false;
                    visual.offscreen = true;
                    visual.drag_offset = 0.0;
                    ctx.link().send_future(async move {
                        TimeoutFuture::new(SLIDE_IN_DELAY_MS).await;
                        Msg::SheetSlidIn(kind)
                    });
                }
                SheetCommand::AnimateOut(kind) => {
                    let visual = &mut self.sheet_visuals[sheet_index(kind)];
                    visual.offscreen = true;
                    visual.drag_offset = 0.0;
                }
                SheetCommand::HideAfter { sheet, delay_ms } => {
                    ctx.link().send_future(async move {
                        TimeoutFuture::new(delay_ms).await;
                        Msg::SheetHidden(sheet)
                    });
                }
                SheetCommand::ShowBackdrop => self.backdrop_shown = true,
                SheetCommand::HideBackdrop => self.backdrop_shown = false,
            }
        }
    }

    fn confirm_delete(&self, ctx: &Context<Self>, id: TransactionId) {
        let telegram = self.telegram.clone();
        ctx.link().send_future(async move {
            let confirmed = telegram.show_confirm("Delete this entry?").await;
            Msg::DeleteConfirmed { id, confirmed }
        });
    }

    fn save_form(&mut self, ctx: &Context<Self>) -> bool {
        let Some(form) = self.form.clone() else {
            return false;
        };
        let parsed = match form.parse(self.engine.categories()) {
            Ok(parsed) => parsed,
            Err(message) => {
                if let Some(form) = &mut self.form {
                    form.error = Some(message);
                }
                return true;
            }
        };

        // For foreign entries the entered amount stands in for the converted
        // value until the server's authoritative conversion arrives; the
        // settlement correction closes the gap.
        let intent = TransactionIntent {
            category_id: parsed.category_id,
            amount: parsed.amount,
            original_amount: parsed.currency.is_some().then_some(parsed.amount),
            currency: parsed.currency.clone(),
            date: parsed.date.and_time(NaiveTime::MIN).and_utc(),
            note: parsed.note.clone(),
        };
        let date = parsed.date.format("%Y-%m-%d").to_string();

        match form.editing {
            Some(id) => match self.engine.stage_edit(id, intent) {
                Ok(effects) => {
                    self.apply_effects(ctx, effects);
                    self.form = None;
                    let request = UpdateTransactionRequest {
                        category_id: Some(parsed.category_id),
                        amount: Some(parsed.amount),
                        currency: Some(form.currency.clone()),
                        date: Some(date),
                        note: Some(parsed.note.unwrap_or_default()),
                    };
                    let api = self.api.clone();
                    ctx.link().send_future(async move {
                        Msg::EditSettled {
                            id,
                            result: api.update_transaction(id, &request).await,
                        }
                    });
                }
                Err(error) => {
                    if let Some(form) = &mut self.form {
                        form.error = Some(error.to_string());
                    }
                }
            },
            None => match self.engine.stage_add(intent) {
                Ok((placeholder, effects)) => {
                    self.apply_effects(ctx, effects);
                    self.form = None;
                    let request = CreateTransactionRequest {
                        category_id: parsed.category_id,
                        amount: parsed.amount,
                        currency: parsed.currency,
                        date,
                        note: parsed.note,
                    };
                    let api = self.api.clone();
                    ctx.link().send_future(async move {
                        Msg::AddSettled {
                            placeholder,
                            result: api.create_transaction(&request).await,
                        }
                    });
                }
                Err(error) => {
                    if let Some(form) = &mut self.form {
                        form.error = Some(error.to_string());
                    }
                }
            },
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_pulse_timer_does_not_retire_a_newer_flash() {
        let mut token = PulseToken::default();
        let first = token.issue();
        // A second flash starts before the first timer fires.
        let second = token.issue();

        assert!(!token.is_current(first));
        assert!(token.is_current(second));
    }
}
