use chrono::NaiveDate;
use shared::{Category, CategoryId, TransactionId, TransactionType, BASE_CURRENCY};
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

/// Currencies offered in the entry form. The first one is the base the server
/// stores everything in; the rest are converted server-side.
pub const CURRENCIES: [&str; 4] = [BASE_CURRENCY, "EUR", "GBP", "RUB"];

/// Everything the full-screen add/edit form tracks, kept in the app state so
/// settlement messages and the form never disagree about what is being saved.
#[derive(Debug, Clone, PartialEq)]
pub struct FormState {
    /// `Some(id)` when editing an existing transaction.
    pub editing: Option<TransactionId>,
    pub transaction_type: TransactionType,
    pub category_id: Option<CategoryId>,
    pub amount: String,
    pub currency: String,
    /// `YYYY-MM-DD`, as the date input produces it.
    pub date: String,
    pub note: String,
    pub error: Option<String>,
}

/// Validated form output, ready to be staged and sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedForm {
    pub category_id: CategoryId,
    pub amount: f64,
    /// `None` for base-currency entries.
    pub currency: Option<String>,
    pub date: NaiveDate,
    pub note: Option<String>,
}

impl FormState {
    pub fn for_add(today: NaiveDate) -> Self {
        Self {
            editing: None,
            transaction_type: TransactionType::Expense,
            category_id: None,
            amount: String::new(),
            currency: BASE_CURRENCY.to_string(),
            date: today.format("%Y-%m-%d").to_string(),
            note: String::new(),
            error: None,
        }
    }

    pub fn for_edit(tx: &shared::Transaction) -> Self {
        // For foreign entries the form shows the amount as entered, not the
        // converted value.
        let (amount, currency) = match (&tx.currency, tx.original_amount) {
            (Some(code), Some(original)) => (original, code.clone()),
            _ => (tx.amount, BASE_CURRENCY.to_string()),
        };
        Self {
            editing: Some(tx.id),
            transaction_type: tx.transaction_type,
            category_id: Some(tx.category_id),
            amount: format_amount_input(amount),
            currency,
            date: tx.day().format("%Y-%m-%d").to_string(),
            note: tx.note.clone().unwrap_or_default(),
            error: None,
        }
    }

    /// Validates the raw fields. Categories are checked against the loaded
    /// list so a stale selection from a type switch cannot slip through.
    pub fn parse(&self, categories: &[Category]) -> Result<ParsedForm, String> {
        let category_id = self
            .category_id
            .filter(|id| {
                categories
                    .iter()
                    .any(|c| c.id == *id && c.category_type == self.transaction_type)
            })
            .ok_or_else(|| "Pick a category".to_string())?;
        let amount: f64 = self
            .amount
            .trim()
            .replace(',', ".")
            .parse()
            .map_err(|_| "Enter a valid amount".to_string())?;
        if !(amount > 0.0) {
            return Err("Amount must be greater than zero".to_string());
        }
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d")
            .map_err(|_| "Pick a date".to_string())?;
        let note = Some(self.note.trim().to_string()).filter(|n| !n.is_empty());
        let currency = Some(self.currency.clone()).filter(|c| c != BASE_CURRENCY);
        Ok(ParsedForm {
            category_id,
            amount,
            currency,
            date,
            note,
        })
    }
}

fn format_amount_input(amount: f64) -> String {
    if amount.fract() == 0.0 {
        format!("{:.0}", amount)
    } else {
        format!("{}", amount)
    }
}

#[derive(Properties, PartialEq)]
pub struct TransactionFormProps {
    pub form: FormState,
    pub categories: Vec<Category>,
    pub on_change: Callback<FormState>,
    pub on_save: Callback<()>,
    pub on_cancel: Callback<()>,
    /// Present only when editing.
    pub on_delete: Option<Callback<()>>,
}

#[function_component(TransactionForm)]
pub fn transaction_form(props: &TransactionFormProps) -> Html {
    let form = props.form.clone();

    let on_type = {
        let form = form.clone();
        let on_change = props.on_change.clone();
        Callback::from(move |transaction_type: TransactionType| {
            let mut next = form.clone();
            if next.transaction_type != transaction_type {
                next.transaction_type = transaction_type;
                // The category list switches with the type.
                next.category_id = None;
            }
            on_change.emit(next);
        })
    };
    let on_category = {
        let form = form.clone();
        let on_change = props.on_change.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            let mut next = form.clone();
            next.category_id = select.value().parse().ok();
            on_change.emit(next);
        })
    };
    let on_amount = {
        let form = form.clone();
        let on_change = props.on_change.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let mut next = form.clone();
            next.amount = input.value();
            on_change.emit(next);
        })
    };
    let on_currency = {
        let form = form.clone();
        let on_change = props.on_change.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            let mut next = form.clone();
            next.currency = select.value();
            on_change.emit(next);
        })
    };
    let on_date = {
        let form = form.clone();
        let on_change = props.on_change.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let mut next = form.clone();
            next.date = input.value();
            on_change.emit(next);
        })
    };
    let on_note = {
        let form = form.clone();
        let on_change = props.on_change.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            let mut next = form.clone();
            next.note = input.value();
            on_change.emit(next);
        })
    };

    let categories: Vec<&Category> = props
        .categories
        .iter()
        .filter(|c| c.category_type == form.transaction_type)
        .collect();

    html! {
        <div class="form-screen">
            <div class="form-header">
                <button class="form-cancel" onclick={props.on_cancel.reform(|_| ())}>{"Cancel"}</button>
                <h2>{ if form.editing.is_some() { "Edit Entry" } else { "New Entry" } }</h2>
                <button class="form-save" onclick={props.on_save.reform(|_| ())}>{"Save"}</button>
            </div>

            <div class="type-toggle">
                <button
                    class={classes!("type-btn", (form.transaction_type == TransactionType::Expense).then_some("active"))}
                    onclick={on_type.reform(|_| TransactionType::Expense)}
                >
                    {"Expense"}
                </button>
                <button
                    class={classes!("type-btn", (form.transaction_type == TransactionType::Income).then_some("active"))}
                    onclick={on_type.reform(|_| TransactionType::Income)}
                >
                    {"Income"}
                </button>
            </div>

            <label class="form-field">
                <span>{"Category"}</span>
                <select onchange={on_category}>
                    <option value="" selected={form.category_id.is_none()}>{"Pick a category"}</option>
                    { for categories.iter().map(|c| html! {
                        <option value={c.id.to_string()} selected={form.category_id == Some(c.id)}>
                            { &c.name }
                        </option>
                    }) }
                </select>
            </label>

            <div class="form-row">
                <label class="form-field amount-field">
                    <span>{"Amount"}</span>
                    <input
                        type="text"
                        inputmode="decimal"
                        placeholder="0.00"
                        value={form.amount.clone()}
                        oninput={on_amount}
                    />
                </label>
                <label class="form-field currency-field">
                    <span>{"Currency"}</span>
                    <select onchange={on_currency}>
                        { for CURRENCIES.iter().map(|code| html! {
                            <option value={*code} selected={form.currency == *code}>{ *code }</option>
                        }) }
                    </select>
                </label>
            </div>

            <label class="form-field">
                <span>{"Date"}</span>
                <input type="date" value={form.date.clone()} onchange={on_date} />
            </label>

            <label class="form-field">
                <span>{"Note"}</span>
                <input
                    type="text"
                    placeholder="Optional"
                    value={form.note.clone()}
                    oninput={on_note}
                />
            </label>

            if let Some(error) = &form.error {
                <div class="form-error">{ error }</div>
            }

            if let Some(on_delete) = &props.on_delete {
                <button class="form-delete" onclick={on_delete.reform(|_| ())}>
                    {"Delete Entry"}
                </button>
            }
        </div>
    }
}
