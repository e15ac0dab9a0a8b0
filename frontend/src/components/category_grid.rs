use shared::{split_category_icon, Category, CategoryId};
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct CategoryGridProps {
    pub categories: Vec<Category>,
    pub on_pick: Callback<CategoryId>,
}

/// Quick-add grid: one tap on a category opens the amount sheet.
#[function_component(CategoryGrid)]
pub fn category_grid(props: &CategoryGridProps) -> Html {
    html! {
        <div class="category-grid">
            { for props.categories.iter().map(|category| {
                let (icon, label) = split_category_icon(&category.name);
                let id = category.id;
                html! {
                    <button
                        class="category-tile"
                        onclick={props.on_pick.reform(move |_| id)}
                    >
                        <span class="category-icon">{ icon.unwrap_or("•") }</span>
                        <span class="category-label">{ label }</span>
                    </button>
                }
            }) }
        </div>
    }
}
