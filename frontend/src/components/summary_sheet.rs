use shared::{format_money, format_signed_money};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct SummarySheetProps {
    /// Totals over the loaded range.
    pub income: f64,
    pub expense: f64,
    pub currency_symbol: String,
    pub count: usize,
}

#[function_component(SummarySheet)]
pub fn summary_sheet(props: &SummarySheetProps) -> Html {
    let net = props.income - props.expense;
    html! {
        <div class="summary">
            <div class="summary-row">
                <span>{"Income"}</span>
                <span class="amount income">{ format_money(&props.currency_symbol, props.income) }</span>
            </div>
            <div class="summary-row">
                <span>{"Expenses"}</span>
                <span class="amount expense">{ format_money(&props.currency_symbol, props.expense) }</span>
            </div>
            <div class="summary-row summary-net">
                <span>{"Net"}</span>
                <span>{ format_signed_money(&props.currency_symbol, net) }</span>
            </div>
            <p class="hint">{ format!("{} entries loaded", props.count) }</p>
        </div>
    }
}
