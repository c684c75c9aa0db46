//! "My builds" dashboard panel

use super::{Pager, Spinner};
use crate::dashboard::MyBuilds;
use crate::pagination::{LoadOutcome, PageController};
use crate::runtime::watch_changes;
use crate::services::{use_is_authenticated, use_services};
use chrono::{DateTime, Local, TimeZone};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use pnc_http::{BuildRecord, BuildStatus, ClientError};
use std::rc::Rc;
use web_sys::HtmlInputElement;
use yew::prelude::*;

fn status_class(status: BuildStatus) -> &'static str {
    match status {
        BuildStatus::Success => "bg-green-100 text-green-800",
        BuildStatus::Failed | BuildStatus::SystemError => "bg-red-100 text-red-800",
        BuildStatus::Unstable | BuildStatus::Rejected => "bg-yellow-100 text-yellow-800",
        BuildStatus::Building => "bg-blue-100 text-blue-800",
        BuildStatus::Cancelled | BuildStatus::Unknown => "bg-gray-100 text-gray-800",
    }
}

fn format_time(millis: Option<i64>) -> String {
    millis
        .and_then(|millis| Local.timestamp_millis_opt(millis).single())
        .map(|time: DateTime<Local>| time.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

#[function_component(MyBuildsPanel)]
pub fn my_builds_panel() -> Html {
    let services = use_services();
    let is_authenticated = use_is_authenticated();
    let update = use_force_update();
    let search_ref = use_node_ref();

    // Rebuilt when the session flips so initialisation stays gated on login
    let panel = {
        let services = services.clone();
        use_memo(is_authenticated, move |_| {
            MyBuilds::new(
                services.auth.clone(),
                services.client.clone(),
                &services.events,
                services.spawner.clone(),
            )
        })
    };

    {
        let panel = panel.clone();
        let spawner = services.spawner.clone();
        use_effect_with(is_authenticated, move |_| {
            let watcher = panel.page().map(|page| {
                watch_changes(&spawner, page.subscribe(), move || update.force_update())
            });
            panel.update();
            move || {
                if let Some(watcher) = watcher {
                    watcher.abort();
                }
            }
        });
    }

    if !panel.show() {
        return html! {};
    }
    let Some(page) = panel.page().cloned() else {
        return html! {};
    };

    let spawn: Spawn = {
        let spawner = services.spawner.clone();
        Rc::new(move |load: PageLoad| {
            spawner(
                async move {
                    if let Err(error) = load.await {
                        tracing::debug!(%error, "my builds navigation failed");
                    }
                }
                .boxed_local(),
            );
        })
    };

    let on_refresh = {
        let panel = panel.clone();
        Callback::from(move |_: MouseEvent| panel.update())
    };

    let on_search = {
        let page = page.clone();
        let spawn = spawn.clone();
        let search_ref = search_ref.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let Some(input) = search_ref.cast::<HtmlInputElement>() else {
                return;
            };
            let page = page.clone();
            spawn(async move { page.search(input.value()).await }.boxed_local());
        })
    };

    let on_previous = navigate(&page, &spawn, |page| async move { page.previous().await }.boxed_local());
    let on_next = navigate(&page, &spawn, |page| async move { page.next().await }.boxed_local());

    html! {
        <section class="bg-white shadow rounded-lg p-4">
            <header class="flex items-center justify-between mb-3">
                <h2 class="text-lg font-semibold text-gray-900">{"My Builds"}</h2>
                <div class="flex items-center space-x-2">
                    if page.is_loading() {
                        <Spinner inline=true />
                    }
                    <button class="text-sm text-blue-600 hover:text-blue-800" onclick={on_refresh}>
                        {"Refresh"}
                    </button>
                </div>
            </header>

            <form class="mb-3" onsubmit={on_search}>
                <input
                    ref={search_ref}
                    type="text"
                    class="block w-full px-3 py-2 border border-gray-300 rounded-md text-sm"
                    placeholder="Search builds..."
                    value={page.search_text()}
                />
            </form>

            if let Some(error) = page.error() {
                <div class="mb-3 p-3 bg-red-50 text-red-700 rounded text-sm">{error}</div>
            }

            <BuildTable records={page.items()} loading={page.is_loading()} />

            <Pager
                index={page.index()}
                total_pages={page.total_pages()}
                on_previous={on_previous}
                on_next={on_next}
            />
        </section>
    }
}

type PageLoad = LocalBoxFuture<'static, Result<LoadOutcome, ClientError>>;
type Spawn = Rc<dyn Fn(PageLoad)>;

fn navigate(
    page: &PageController<BuildRecord>,
    spawn: &Spawn,
    load: fn(PageController<BuildRecord>) -> PageLoad,
) -> Callback<()> {
    let page = page.clone();
    let spawn = spawn.clone();
    Callback::from(move |()| spawn(load(page.clone())))
}

#[derive(Properties, PartialEq)]
struct BuildTableProps {
    records: Vec<BuildRecord>,
    loading: bool,
}

#[function_component(BuildTable)]
fn build_table(props: &BuildTableProps) -> Html {
    if props.records.is_empty() {
        if props.loading {
            return html! { <Spinner text="Loading builds..." /> };
        }
        return html! {
            <p class="text-sm text-gray-500 py-4 text-center">{"You have not started any builds yet."}</p>
        };
    }

    html! {
        <table class="min-w-full divide-y divide-gray-200 text-sm">
            <thead class="bg-gray-50">
                <tr>
                    <th class="px-3 py-2 text-left font-medium text-gray-500">{"#"}</th>
                    <th class="px-3 py-2 text-left font-medium text-gray-500">{"Configuration"}</th>
                    <th class="px-3 py-2 text-left font-medium text-gray-500">{"Status"}</th>
                    <th class="px-3 py-2 text-left font-medium text-gray-500">{"Started"}</th>
                    <th class="px-3 py-2 text-left font-medium text-gray-500">{"Finished"}</th>
                </tr>
            </thead>
            <tbody class="divide-y divide-gray-200">
                {for props.records.iter().map(|record| html! {
                    <tr key={record.id}>
                        <td class="px-3 py-2">{record.id}</td>
                        <td class="px-3 py-2">{record.build_configuration_name.clone().unwrap_or_default()}</td>
                        <td class="px-3 py-2">
                            <span class={classes!("px-2", "py-0.5", "rounded-full", "text-xs", status_class(record.status))}>
                                {record.status.label()}
                            </span>
                        </td>
                        <td class="px-3 py-2">{format_time(record.start_time)}</td>
                        <td class="px-3 py-2">{format_time(record.end_time)}</td>
                    </tr>
                })}
            </tbody>
        </table>
    }
}
