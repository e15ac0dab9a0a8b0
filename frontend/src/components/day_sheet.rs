use shared::{format_signed_money, split_category_icon, Transaction, TransactionId, TransactionType};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct DaySheetProps {
    pub transactions: Vec<Transaction>,
    pub currency_symbol: String,
    pub on_edit: Callback<TransactionId>,
}

/// One calendar day's entries, with the day's net at the top.
#[function_component(DaySheet)]
pub fn day_sheet(props: &DaySheetProps) -> Html {
    let net: f64 = props.transactions.iter().map(Transaction::signed_amount).sum();

    html! {
        <div class="day-detail">
            <div class="day-net">
                { format_signed_money(&props.currency_symbol, net) }
            </div>
            if props.transactions.is_empty() {
                <p class="hint">{"Nothing on this day"}</p>
            }
            { for props.transactions.iter().map(|tx| {
                let id = tx.id;
                let (icon, label) = split_category_icon(&tx.category);
                let amount_class = match tx.transaction_type {
                    TransactionType::Income => "amount income",
                    TransactionType::Expense => "amount expense",
                };
                html! {
                    <div class="day-row" key={id} onclick={props.on_edit.reform(move |_| id)}>
                        <span class="row-icon">{ icon.unwrap_or("•") }</span>
                        <span class="row-category">{ label }</span>
                        <span class={amount_class}>
                            { format_signed_money(&props.currency_symbol, tx.signed_amount()) }
                        </span>
                    </div>
                }
            }) }
        </div>
    }
}
