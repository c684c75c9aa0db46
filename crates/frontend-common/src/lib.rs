//! Browser side of the PNC web console: session handling, REST plumbing and
//! the dashboard widgets built on top of them.

pub mod auth;
pub mod components;
pub mod config;
pub mod dashboard;
pub mod env;
pub mod events;
pub mod logging;
pub mod notifications;
pub mod pagination;
pub mod runtime;
pub mod services;

pub use auth::AuthService;
pub use components::{MyBuildsPanel, NotificationList, Pager, Spinner};
pub use config::{AppConfig, AuthConfig, PageConfig};
pub use env::{BrowserEnv, WebEnv};
pub use events::{Event, EventBus, EventType};
pub use notifications::{Level, Notification, Notifications};
pub use pagination::{LoadOutcome, PageController};
pub use services::{use_is_authenticated, use_services, Services, ServicesProvider};
