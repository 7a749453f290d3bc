pub mod api;
pub mod poller;
pub mod view;

pub use api::ApiClient;
pub use poller::Poller;
pub use view::{CardAction, StatusFilter};
