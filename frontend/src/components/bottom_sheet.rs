use yew::prelude::*;

/// Rendered state of one sheet, driven by the sheet manager's commands.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetVisual {
    /// `display: none` — the sheet takes no part in layout.
    pub hidden: bool,
    /// Translated below the viewport; flipping this runs the slide.
    pub offscreen: bool,
    /// Live header-drag offset in px; transitions are off while nonzero so
    /// the sheet follows the finger.
    pub drag_offset: f64,
}

impl Default for SheetVisual {
    fn default() -> Self {
        Self {
            hidden: true,
            offscreen: true,
            drag_offset: 0.0,
        }
    }
}

#[derive(Properties, PartialEq)]
pub struct BottomSheetProps {
    pub title: String,
    pub visual: SheetVisual,
    pub transition_ms: u32,
    /// Scrollable content area; the app reads its scroll position to decide
    /// whether a header drag may start.
    pub content_ref: NodeRef,
    pub on_close: Callback<()>,
    pub on_drag_start: Callback<TouchEvent>,
    pub on_drag_move: Callback<TouchEvent>,
    pub on_drag_end: Callback<TouchEvent>,
    pub children: Children,
}

#[function_component(BottomSheet)]
pub fn bottom_sheet(props: &BottomSheetProps) -> Html {
    let visual = &props.visual;
    let style = if visual.hidden {
        "display: none;".to_string()
    } else if visual.offscreen {
        format!(
            "transform: translateY(100%); transition: transform {}ms ease;",
            props.transition_ms
        )
    } else if visual.drag_offset > 0.0 {
        format!(
            "transform: translateY({}px); transition: none;",
            visual.drag_offset
        )
    } else {
        format!(
            "transform: translateY(0); transition: transform {}ms ease;",
            props.transition_ms
        )
    };

    html! {
        <div class="bottom-sheet" style={style}>
            <div
                class="sheet-header"
                ontouchstart={props.on_drag_start.clone()}
                ontouchmove={props.on_drag_move.clone()}
                ontouchend={props.on_drag_end.clone()}
            >
                <div class="sheet-grabber"></div>
                <h3>{ &props.title }</h3>
                <button class="sheet-close" onclick={props.on_close.reform(|_| ())}>{"✕"}</button>
            </div>
            <div class="sheet-content" ref={props.content_ref.clone()}>
                { for props.children.iter() }
            </div>
        </div>
    }
}
