use engine::{BalanceView, Pulse};
use web_sys::HtmlSelectElement;
use yew::prelude::*;

/// Symbols the user can pick for display. Pure presentation; no conversion.
pub const CURRENCY_SYMBOLS: [&str; 4] = ["$", "€", "£", "₽"];

#[derive(Properties, PartialEq)]
pub struct BalanceHeaderProps {
    pub view: BalanceView,
    pub symbol: String,
    pub on_symbol_change: Callback<String>,
    /// Tap on the balance opens the summary sheet.
    pub on_tap: Callback<()>,
}

#[function_component(BalanceHeader)]
pub fn balance_header(props: &BalanceHeaderProps) -> Html {
    let flash = match props.view.pulse {
        Some(Pulse::Increase) => Some("balance-flash-positive"),
        Some(Pulse::Decrease) => Some("balance-flash-negative"),
        None => None,
    };
    let on_symbol = {
        let on_symbol_change = props.on_symbol_change.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            on_symbol_change.emit(select.value());
        })
    };

    html! {
        <header class="balance-header">
            <div
                class={classes!("balance-value", flash)}
                onclick={props.on_tap.reform(|_| ())}
            >
                { &props.view.display }
            </div>
            <select class="symbol-select" onchange={on_symbol}>
                { for CURRENCY_SYMBOLS.iter().map(|s| html! {
                    <option value={*s} selected={props.symbol == *s}>{ *s }</option>
                }) }
            </select>
        </header>
    }
}
