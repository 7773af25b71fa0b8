/// Reusable UI components

use web_sys::HtmlInputElement;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct SearchBoxProps {
    pub value: String,
    pub placeholder: AttrValue,
    pub on_change: Callback<String>,
    /// `(visible, total)`; shown only while a search term is entered.
    #[prop_or_default]
    pub counts: Option<(usize, usize)>,
}

#[function_component(SearchBox)]
pub fn search_box(props: &SearchBoxProps) -> Html {
    let oninput = {
        let on_change = props.on_change.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                on_change.emit(input.value());
            }
        })
    };

    let on_clear = {
        let on_change = props.on_change.clone();
        Callback::from(move |_: MouseEvent| on_change.emit(String::new()))
    };

    let has_term = !props.value.trim().is_empty();

    html! {
        <div class="search-container">
            <input
                type="text"
                class="search-input"
                placeholder={props.placeholder.clone()}
                value={props.value.clone()}
                {oninput}
            />
            if !props.value.is_empty() {
                <button class="clear-search-btn" title="Clear search" onclick={on_clear}>{"×"}</button>
            }
            if let (true, Some((visible, total))) = (has_term, props.counts) {
                <span class="search-count">{format!("{} of {}", visible, total)}</span>
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct EmptyStateProps {
    pub message: AttrValue,
}

#[function_component(EmptyState)]
pub fn empty_state(props: &EmptyStateProps) -> Html {
    html! {
        <p class="empty-state">{props.message.clone()}</p>
    }
}

#[derive(Properties, PartialEq)]
pub struct CheckRowProps {
    pub label: AttrValue,
    pub checked: bool,
    pub on_toggle: Callback<bool>,
    #[prop_or_default]
    pub title: Option<AttrValue>,
    #[prop_or_default]
    pub class: Classes,
    /// Row buttons, e.g. copy and delete.
    #[prop_or_default]
    pub children: Html,
}

#[function_component(CheckRow)]
pub fn check_row(props: &CheckRowProps) -> Html {
    let onchange = {
        let on_toggle = props.on_toggle.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            on_toggle.emit(input.checked());
        })
    };

    html! {
        <label class="event-item">
            <input type="checkbox" checked={props.checked} {onchange} />
            <span class={props.class.clone()} title={props.title.clone()}>{props.label.clone()}</span>
            {props.children.clone()}
        </label>
    }
}

#[derive(Properties, PartialEq)]
pub struct RowButtonProps {
    pub title: AttrValue,
    pub on_click: Callback<()>,
    pub children: Html,
    #[prop_or_else(|| AttrValue::from("delete-event-btn"))]
    pub class: AttrValue,
}

/// Small inline button that doesn't toggle the surrounding label.
#[function_component(RowButton)]
pub fn row_button(props: &RowButtonProps) -> Html {
    let onclick = {
        let on_click = props.on_click.clone();
        Callback::from(move |e: MouseEvent| {
            e.prevent_default();
            e.stop_propagation();
            on_click.emit(());
        })
    };

    html! {
        <button class={props.class.clone()} title={props.title.clone()} {onclick}>
            {props.children.clone()}
        </button>
    }
}
