//! "My builds" panel: the signed-in user's build records, newest first
//!
//! The panel only comes alive for an authenticated session. It reloads the
//! current page whenever a build starts or finishes.

use crate::auth::AuthService;
use crate::events::{EventBus, EventType};
use crate::pagination::{PageController, PageFuture};
use crate::runtime::Spawner;
use futures::future::{abortable, AbortHandle};
use futures::FutureExt;
use pnc_http::{BuildRecord, PageQuery, PncClient, SortOrder};
use tokio::sync::broadcast::error::RecvError;

/// Topics that make the panel re-query its current page
const RELOAD_ON: [EventType; 2] = [EventType::BuildStarted, EventType::BuildFinished];

/// Query the build records of whoever owns the session.
///
/// Sorting is fixed to descending id; paging is meaningless on unsorted data.
pub fn builds_loader(client: PncClient) -> impl Fn(PageQuery) -> PageFuture<BuildRecord> {
    move |query: PageQuery| {
        let client = client.clone();
        async move {
            let user = client.get_authenticated_user().await?;
            let query = query.with_sort(SortOrder::desc("id"));
            client.get_build_records_by_user(user.id, &query).await
        }
        .boxed_local()
    }
}

pub struct MyBuilds {
    auth: AuthService,
    page: Option<PageController<BuildRecord>>,
    spawner: Spawner,
    listener: Option<AbortHandle>,
}

impl MyBuilds {
    pub fn new(auth: AuthService, client: PncClient, events: &EventBus, spawner: Spawner) -> Self {
        let mut panel = Self {
            auth,
            page: None,
            spawner,
            listener: None,
        };
        if panel.auth.is_authenticated() {
            panel.init(client, events);
        }
        panel
    }

    fn init(&mut self, client: PncClient, events: &EventBus) {
        let page = PageController::new(builds_loader(client));
        let mut receiver = events.subscribe();

        let (listener, handle) = abortable({
            let page = page.clone();
            let spawner = self.spawner.clone();
            async move {
                loop {
                    match receiver.recv().await {
                        Ok(event) if RELOAD_ON.contains(&event.kind) => {
                            tracing::debug!(kind = %event.kind, id = ?event.id, "refreshing my builds");
                            spawn_reload(&spawner, &page);
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(missed)) => {
                            tracing::warn!(missed, "event backlog overflowed; refreshing my builds");
                            spawn_reload(&spawner, &page);
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            }
        });
        (self.spawner)(
            async move {
                let _ = listener.await;
            }
            .boxed_local(),
        );

        self.page = Some(page);
        self.listener = Some(handle);
    }

    /// Re-run the query for the current page
    pub fn update(&self) {
        if let Some(page) = &self.page {
            spawn_reload(&self.spawner, page);
        }
    }

    pub fn show(&self) -> bool {
        self.auth.is_authenticated()
    }

    pub fn page(&self) -> Option<&PageController<BuildRecord>> {
        self.page.as_ref()
    }
}

impl Drop for MyBuilds {
    fn drop(&mut self) {
        if let Some(listener) = &self.listener {
            listener.abort();
        }
    }
}

fn spawn_reload(spawner: &Spawner, page: &PageController<BuildRecord>) {
    let page = page.clone();
    spawner(
        async move {
            if let Err(error) = page.reload().await {
                tracing::debug!(%error, "my builds reload failed");
            }
        }
        .boxed_local(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::{InitOutcome, MockIdentityClient};
    use crate::env::testing::RecordingEnv;
    use crate::events::Event;
    use crate::runtime::testing::local_spawner;
    use serde_json::json;
    use std::future::Future;
    use std::rc::Rc;
    use std::time::Duration;
    use tokio::task::LocalSet;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn on_local_set<F: Future>(test: F) -> F::Output {
        LocalSet::new().run_until(test).await
    }

    async fn signed_in() -> AuthService {
        let mut identity = MockIdentityClient::new();
        identity
            .expect_init_login_required()
            .returning(|| Ok(InitOutcome::Authenticated));
        identity
            .expect_auth_server_url()
            .return_const("https://sso.example.com/auth".to_string());
        identity.expect_username().return_const(None::<String>);

        let auth = AuthService::new(Rc::new(RecordingEnv::default()));
        auth.login_with(Rc::new(identity)).await.unwrap();
        auth
    }

    async fn backend() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/loggedUser"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": { "id": 42, "username": "jdoe" }
            })))
            .mount(&server)
            .await;
        server
    }

    fn build_page(index: u32) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "pageIndex": index,
            "pageSize": 10,
            "totalPages": 4,
            "content": [{ "id": 100 + index, "status": "SUCCESS" }]
        }))
    }

    async fn build_queries(server: &MockServer) -> Vec<Vec<(String, String)>> {
        server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|request| request.url.path() == "/users/42/build-records")
            .map(|request| request.url.query_pairs().into_owned().collect())
            .collect()
    }

    /// Wait until `expected` build record queries arrived, then let stragglers land
    async fn settle(server: &MockServer, expected: usize) -> Vec<Vec<(String, String)>> {
        for _ in 0..100 {
            if build_queries(server).await.len() >= expected {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        build_queries(server).await
    }

    #[tokio::test]
    async fn test_hidden_and_inert_without_session() {
        on_local_set(async {
            let server = backend().await;
            let bus = EventBus::new();
            let auth = AuthService::new(Rc::new(RecordingEnv::default()));

            let panel = MyBuilds::new(
                auth,
                PncClient::new(server.uri()).unwrap(),
                &bus,
                local_spawner(),
            );
            bus.publish(Event {
                kind: EventType::BuildStarted,
                id: Some(1),
            });
            panel.update();

            assert!(!panel.show());
            assert!(panel.page().is_none());
            assert!(settle(&server, 0).await.is_empty());
        })
        .await;
    }

    #[tokio::test]
    async fn test_query_carries_user_page_search_and_sort() {
        on_local_set(async {
            let server = backend().await;
            // PNC takes `=desc=id` as the sort value. The legacy UI sent
            // `sort=desc=id`, repeating the parameter name inside the value.
            Mock::given(method("GET"))
                .and(path("/users/42/build-records"))
                .and(query_param("pageIndex", "0"))
                .and(query_param("pageSize", "10"))
                .and(query_param("search", "kernel"))
                .and(query_param("sort", "=desc=id"))
                .respond_with(build_page(0))
                .expect(1)
                .mount(&server)
                .await;

            let bus = EventBus::new();
            let panel = MyBuilds::new(
                signed_in().await,
                PncClient::new(server.uri()).unwrap(),
                &bus,
                local_spawner(),
            );

            assert!(panel.show());
            let page = panel.page().unwrap();
            page.search("kernel").await.unwrap();
            assert_eq!(page.items()[0].id, 100);
        })
        .await;
    }

    #[tokio::test]
    async fn test_build_events_reload_current_page_once_each() {
        on_local_set(async {
            let server = backend().await;
            Mock::given(method("GET"))
                .and(path("/users/42/build-records"))
                .respond_with(build_page(2))
                .mount(&server)
                .await;

            let bus = EventBus::new();
            let panel = MyBuilds::new(
                signed_in().await,
                PncClient::new(server.uri()).unwrap(),
                &bus,
                local_spawner(),
            );
            panel.page().unwrap().load_page(2).await.unwrap();

            bus.publish(Event {
                kind: EventType::BuildStarted,
                id: Some(5),
            });
            assert_eq!(settle(&server, 2).await.len(), 2);

            bus.publish(Event {
                kind: EventType::BuildFinished,
                id: Some(5),
            });
            assert_eq!(settle(&server, 3).await.len(), 3);

            bus.publish(Event {
                kind: EventType::BuildSetStarted,
                id: Some(5),
            });
            let queries = settle(&server, 4).await;
            assert_eq!(queries.len(), 3);

            for query in &queries[1..] {
                assert!(query.contains(&("pageIndex".to_string(), "2".to_string())));
                assert!(query.contains(&("sort".to_string(), "=desc=id".to_string())));
            }
        })
        .await;
    }

    #[tokio::test]
    async fn test_update_reloads_once() {
        on_local_set(async {
            let server = backend().await;
            Mock::given(method("GET"))
                .and(path("/users/42/build-records"))
                .respond_with(build_page(0))
                .expect(1)
                .mount(&server)
                .await;

            let bus = EventBus::new();
            let panel = MyBuilds::new(
                signed_in().await,
                PncClient::new(server.uri()).unwrap(),
                &bus,
                local_spawner(),
            );

            panel.update();
            assert_eq!(settle(&server, 1).await.len(), 1);
            assert_eq!(panel.page().unwrap().items().len(), 1);
        })
        .await;
    }

    #[tokio::test]
    async fn test_dropping_panel_stops_event_reloads() {
        on_local_set(async {
            let server = backend().await;
            let bus = EventBus::new();
            let panel = MyBuilds::new(
                signed_in().await,
                PncClient::new(server.uri()).unwrap(),
                &bus,
                local_spawner(),
            );
            drop(panel);

            bus.publish(Event {
                kind: EventType::BuildFinished,
                id: None,
            });
            assert!(settle(&server, 1).await.is_empty());
        })
        .await;
    }
}
