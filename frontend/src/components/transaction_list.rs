use chrono::{NaiveDate, Utc};
use shared::{format_signed_money, split_category_icon, Transaction, TransactionId, TransactionType};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct TransactionListProps {
    /// Store contents, newest first.
    pub transactions: Vec<Transaction>,
    /// Row mid-collapse after an animated removal; rendered as a ghost at its
    /// old position until the animation ends.
    pub departing: Option<Transaction>,
    /// Row that just entered and should flash.
    pub highlight_id: Option<TransactionId>,
    /// Row currently tracking a swipe, with its horizontal offset.
    pub swipe_track: Option<(TransactionId, f64)>,
    pub currency_symbol: String,
    pub loading: bool,
    pub error: Option<String>,
    pub all_loaded: bool,
    pub page_loading: bool,
    pub on_retry: Callback<()>,
    pub on_load_more: Callback<()>,
    pub on_edit: Callback<TransactionId>,
    pub on_day_tap: Callback<NaiveDate>,
    pub on_row_touch_start: Callback<(TransactionId, TouchEvent)>,
    pub on_row_touch_move: Callback<TouchEvent>,
    pub on_row_touch_end: Callback<TouchEvent>,
}

#[function_component(TransactionList)]
pub fn transaction_list(props: &TransactionListProps) -> Html {
    if props.loading {
        return html! {
            <div class="transaction-list">
                { for (0..6).map(|_| html! {
                    <div class="row-skeleton">
                        <div class="skeleton-icon"></div>
                        <div class="skeleton-line"></div>
                    </div>
                }) }
            </div>
        };
    }
    if props.transactions.is_empty() && props.departing.is_none() {
        if let Some(error) = &props.error {
            return html! {
                <div class="list-placeholder list-error">
                    <p>{ error }</p>
                    <button onclick={props.on_retry.reform(|_| ())}>{"Retry"}</button>
                </div>
            };
        }
        return html! {
            <div class="list-placeholder list-empty">
                <p>{"No entries yet"}</p>
                <p class="hint">{"Tap a category below to add one"}</p>
            </div>
        };
    }

    // Weave the departing ghost back into its old slot so the collapse runs
    // where the row used to be.
    let mut rows: Vec<(&Transaction, bool)> =
        props.transactions.iter().map(|tx| (tx, false)).collect();
    if let Some(ghost) = &props.departing {
        if !rows.iter().any(|(tx, _)| tx.id == ghost.id) {
            let at = rows
                .iter()
                .position(|(tx, _)| (ghost.date, ghost.id) > (tx.date, tx.id))
                .unwrap_or(rows.len());
            rows.insert(at, (ghost, true));
        }
    }

    let today = Utc::now().date_naive();
    let mut grouped: Vec<Html> = Vec::new();
    let mut current_day: Option<NaiveDate> = None;
    for (tx, is_departing) in rows {
        let day = tx.day();
        if current_day != Some(day) {
            current_day = Some(day);
            grouped.push(html! {
                <div
                    class="day-header"
                    key={format!("day-{}", day)}
                    onclick={props.on_day_tap.reform(move |_| day)}
                >
                    { day_label(day, today) }
                </div>
            });
        }
        grouped.push(render_row(props, tx, is_departing));
    }

    html! {
        <div class="transaction-list">
            { for grouped }
            if !props.all_loaded {
                <button
                    class="load-more"
                    disabled={props.page_loading}
                    onclick={props.on_load_more.reform(|_| ())}
                >
                    { if props.page_loading { "Loading…" } else { "Load more" } }
                </button>
            }
        </div>
    }
}

fn render_row(props: &TransactionListProps, tx: &Transaction, departing: bool) -> Html {
    let id = tx.id;
    let (icon, label) = split_category_icon(&tx.category);
    let offset = match props.swipe_track {
        Some((row, offset_x)) if row == id => offset_x,
        _ => 0.0,
    };
    let row_style = if offset != 0.0 {
        format!("transform: translateX({}px); transition: none;", offset)
    } else {
        String::new()
    };
    let amount_class = match tx.transaction_type {
        TransactionType::Income => "amount income",
        TransactionType::Expense => "amount expense",
    };

    let on_touch_start = {
        let cb = props.on_row_touch_start.clone();
        Callback::from(move |e: TouchEvent| cb.emit((id, e)))
    };

    html! {
        <div
            class={classes!(
                "row-wrap",
                departing.then_some("row-collapsing"),
                (props.highlight_id == Some(id)).then_some("row-entering"),
            )}
            key={format!("tx-{}", id)}
        >
            <div class="row-delete-bg">{"Delete"}</div>
            <div
                class="row"
                style={row_style}
                onclick={props.on_edit.reform(move |_| id)}
                ontouchstart={on_touch_start}
                ontouchmove={props.on_row_touch_move.clone()}
                ontouchend={props.on_row_touch_end.clone()}
                ontouchcancel={props.on_row_touch_end.clone()}
            >
                <span class="row-icon">{ icon.unwrap_or("•") }</span>
                <div class="row-main">
                    <span class="row-category">{ label }</span>
                    if let Some(note) = &tx.note {
                        <span class="row-note">{ note }</span>
                    }
                </div>
                <div class="row-amounts">
                    <span class={amount_class}>
                        { format_signed_money(&props.currency_symbol, tx.signed_amount()) }
                    </span>
                    if let (Some(original), Some(code)) = (tx.original_amount, &tx.currency) {
                        <span class="row-original">{ format!("{} {}", original, code) }</span>
                    }
                </div>
            </div>
        </div>
    }
}

fn day_label(day: NaiveDate, today: NaiveDate) -> String {
    if day == today {
        "Today".to_string()
    } else if today.pred_opt() == Some(day) {
        "Yesterday".to_string()
    } else {
        day.format("%b %-d").to_string()
    }
}
