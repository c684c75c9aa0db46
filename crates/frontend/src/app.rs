use futures::FutureExt;
use pnc_frontend_common::auth::AuthService;
use pnc_frontend_common::components::{MyBuildsPanel, NotificationList, Spinner};
use pnc_frontend_common::config::AppConfig;
use pnc_frontend_common::env::{BrowserEnv, WebEnv};
use pnc_frontend_common::events::feed;
use pnc_frontend_common::notifications::Notifications;
use pnc_frontend_common::runtime::browser_spawner;
use pnc_frontend_common::services::{use_is_authenticated, use_services, Services, ServicesProvider};
use pnc_http::ClientError;
use yew::prelude::*;

/// Load configuration, sign in and start the notification feed
async fn bootstrap() -> Result<Services, ClientError> {
    let env = WebEnv::shared();
    let config = AppConfig::load(&env.origin()).await;
    tracing::info!(environment = ?config.environment, rest_url = %config.rest_url, "configuration loaded");

    let services = Services::new(
        &config,
        AuthService::new(env),
        Notifications::new(),
        browser_spawner(),
    )?;

    if config.interceptors_enabled() {
        // Failures are logged by the session and end in a page reload
        let _ = services.auth.login(&config.keycloak_config_url).await;
    }

    if !config.notifications_url.is_empty() {
        let url = config.notifications_url.clone();
        let events = services.events.clone();
        (services.spawner)(async move { feed::run(&url, events).await }.boxed_local());
    }

    Ok(services)
}

#[function_component(App)]
pub fn app() -> Html {
    let services = use_state(|| None::<Services>);
    let failure = use_state(|| None::<String>);

    {
        let services = services.clone();
        let failure = failure.clone();
        use_effect_with((), move |_| {
            wasm_bindgen_futures::spawn_local(async move {
                match bootstrap().await {
                    Ok(ready) => services.set(Some(ready)),
                    Err(error) => {
                        tracing::error!(%error, "failed to start the console");
                        failure.set(Some(error.to_string()));
                    }
                }
            });
        });
    }

    if let Some(message) = &*failure {
        return html! {
            <div class="max-w-xl mx-auto mt-12 p-4 bg-red-50 text-red-700 rounded">
                <h1 class="font-semibold mb-1">{"PNC is unavailable"}</h1>
                <p class="text-sm">{message}</p>
            </div>
        };
    }

    match &*services {
        Some(services) => html! {
            <ServicesProvider services={services.clone()}>
                <NotificationList />
                <Dashboard />
            </ServicesProvider>
        },
        None => html! { <Spinner text="Loading PNC..." /> },
    }
}

#[function_component(Dashboard)]
fn dashboard() -> Html {
    let services = use_services();
    let is_authenticated = use_is_authenticated();

    let on_logout = {
        let auth = services.auth.clone();
        Callback::from(move |_: MouseEvent| auth.logout())
    };

    html! {
        <div class="min-h-screen bg-gray-100">
            <nav class="bg-gray-900 text-white">
                <div class="max-w-6xl mx-auto px-4 h-14 flex items-center justify-between">
                    <span class="font-semibold">{"PNC Build System"}</span>
                    if is_authenticated {
                        <div class="flex items-center space-x-4 text-sm">
                            <span>{services.auth.username().unwrap_or_default()}</span>
                            <button class="px-3 py-1 rounded bg-gray-700 hover:bg-gray-600" onclick={on_logout}>
                                {"Log out"}
                            </button>
                        </div>
                    }
                </div>
            </nav>
            <main class="max-w-6xl mx-auto px-4 py-6">
                <MyBuildsPanel />
            </main>
        </div>
    }
}
