//! Toasts for the notifications raised anywhere in the console

use crate::notifications::Notification;
use crate::runtime::watch_changes;
use crate::services::use_services;
use gloo::timers::callback::Timeout;
use yew::prelude::*;

/// Toasts disappear on their own after this long
const DISMISS_AFTER_MS: u32 = 5_000;

#[function_component(NotificationList)]
pub fn notification_list() -> Html {
    let services = use_services();
    let notifications = use_state(|| services.notifications.current());

    {
        let notifications = notifications.clone();
        let spawner = services.spawner.clone();
        use_effect_with(services.notifications.clone(), move |source| {
            let reader = source.clone();
            notifications.set(reader.current());
            let watcher = watch_changes(&spawner, source.subscribe(), move || {
                notifications.set(reader.current())
            });
            move || watcher.abort()
        });
    }

    html! {
        <div class="fixed top-4 right-4 z-50 space-y-2 w-80">
            {for notifications.iter().map(|notification| html! {
                <Toast key={notification.id} notification={notification.clone()} />
            })}
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct ToastProps {
    notification: Notification,
}

#[function_component(Toast)]
fn toast(props: &ToastProps) -> Html {
    let services = use_services();
    let id = props.notification.id;

    {
        let notifications = services.notifications.clone();
        use_effect_with(id, move |id| {
            let id = *id;
            let timeout = Timeout::new(DISMISS_AFTER_MS, move || notifications.dismiss(id));
            move || drop(timeout)
        });
    }

    let on_close = {
        let notifications = services.notifications.clone();
        Callback::from(move |_: MouseEvent| notifications.dismiss(id))
    };

    html! {
        <div class={classes!("flex", "items-start", "justify-between", "p-3", "border", "rounded", "shadow", props.notification.level.css_class())}>
            <span class="text-sm">{&props.notification.message}</span>
            <button class="ml-3 text-sm font-bold" onclick={on_close}>{"×"}</button>
        </div>
    }
}
