use shared::{split_category_icon, Category};
use web_sys::HtmlInputElement;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct QuickAddSheetProps {
    /// Category picked from the grid; `None` only while the sheet is closed.
    pub category: Option<Category>,
    pub amount: String,
    pub on_amount: Callback<String>,
    pub on_save: Callback<()>,
}

/// Amount entry step of the quick-add flow.
#[function_component(QuickAddSheet)]
pub fn quick_add_sheet(props: &QuickAddSheetProps) -> Html {
    let on_input = {
        let on_amount = props.on_amount.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            on_amount.emit(input.value());
        })
    };
    let on_keydown = {
        let on_save = props.on_save.clone();
        Callback::from(move |e: KeyboardEvent| {
            if e.key() == "Enter" {
                on_save.emit(());
            }
        })
    };

    let (icon, label) = props
        .category
        .as_ref()
        .map(|c| split_category_icon(&c.name))
        .map(|(icon, label)| (icon.unwrap_or("•").to_string(), label.to_string()))
        .unwrap_or_default();

    html! {
        <div class="quick-add">
            <div class="quick-category">
                <span class="category-icon">{ icon }</span>
                <span class="category-label">{ label }</span>
            </div>
            <input
                class="quick-amount"
                type="text"
                inputmode="decimal"
                placeholder="0.00"
                value={props.amount.clone()}
                oninput={on_input}
                onkeydown={on_keydown}
            />
            <button class="quick-save" onclick={props.on_save.reform(|_| ())}>{"Add"}</button>
        </div>
    }
}
