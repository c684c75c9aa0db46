mod my_builds_panel;
mod notification_list;
mod pager;
mod spinner;

pub use my_builds_panel::MyBuildsPanel;
pub use notification_list::NotificationList;
pub use pager::Pager;
pub use spinner::LoadingSpinner as Spinner;
