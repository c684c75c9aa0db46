//! Services shared with the component tree

use crate::auth::{session_interceptors, AuthService};
use crate::config::AppConfig;
use crate::events::EventBus;
use crate::notifications::Notifications;
use crate::runtime::{watch_changes, Spawner};
use pnc_http::{ClientError, Interceptors, PncClient};
use std::rc::Rc;
use yew::prelude::*;

pub struct ServicesInner {
    pub auth: AuthService,
    pub client: PncClient,
    pub events: EventBus,
    pub notifications: Notifications,
    pub spawner: Spawner,
}

/// Everything a component needs to talk to the session and the backend
#[derive(Clone)]
pub struct Services(Rc<ServicesInner>);

impl Services {
    /// Wire the REST client to the session.
    ///
    /// Interceptors are only installed when `config` says so.
    pub fn new(
        config: &AppConfig,
        auth: AuthService,
        notifications: Notifications,
        spawner: Spawner,
    ) -> Result<Self, ClientError> {
        let interceptors = if config.interceptors_enabled() {
            session_interceptors(&auth, &notifications)
        } else {
            Interceptors::none()
        };
        let client = PncClient::builder()
            .base_url(config.rest_url.clone())
            .interceptors(interceptors)
            .build()?;

        Ok(Self(Rc::new(ServicesInner {
            auth,
            client,
            events: EventBus::new(),
            notifications,
            spawner,
        })))
    }
}

impl std::ops::Deref for Services {
    type Target = ServicesInner;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl PartialEq for Services {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// Services provider props
#[derive(Properties, PartialEq)]
pub struct ServicesProviderProps {
    pub services: Services,
    pub children: Children,
}

#[function_component(ServicesProvider)]
pub fn services_provider(props: &ServicesProviderProps) -> Html {
    html! {
        <ContextProvider<Services> context={props.services.clone()}>
            {props.children.clone()}
        </ContextProvider<Services>>
    }
}

/// Hook to use the shared services
#[hook]
pub fn use_services() -> Services {
    use_context::<Services>()
        .expect("Services not found. Make sure to wrap your component with ServicesProvider")
}

/// Hook to check if authenticated; re-renders when the session changes
#[hook]
pub fn use_is_authenticated() -> bool {
    let services = use_services();
    let update = use_force_update();

    {
        let auth = services.auth.clone();
        let spawner = services.spawner.clone();
        use_effect_with(auth, move |auth| {
            let watcher = watch_changes(&spawner, auth.subscribe(), move || update.force_update());
            move || watcher.abort()
        });
    }

    services.auth.is_authenticated()
}
