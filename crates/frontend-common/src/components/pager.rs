//! Previous/next controls for a paged list

use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct PagerProps {
    /// Zero-based index of the shown page
    pub index: u32,
    pub total_pages: u32,
    pub on_previous: Callback<()>,
    pub on_next: Callback<()>,
}

#[function_component(Pager)]
pub fn pager(props: &PagerProps) -> Html {
    if props.total_pages <= 1 {
        return html! {};
    }

    let has_previous = props.index > 0;
    let has_next = props.index + 1 < props.total_pages;
    let on_previous = props.on_previous.reform(|_: MouseEvent| ());
    let on_next = props.on_next.reform(|_: MouseEvent| ());

    html! {
        <nav class="flex items-center justify-between pt-3 text-sm">
            <button class="px-3 py-1 rounded border disabled:opacity-50" disabled={!has_previous} onclick={on_previous}>
                {"Previous"}
            </button>
            <span class="text-gray-600">
                {format!("Page {} of {}", props.index + 1, props.total_pages)}
            </span>
            <button class="px-3 py-1 rounded border disabled:opacity-50" disabled={!has_next} onclick={on_next}>
                {"Next"}
            </button>
        </nav>
    }
}
