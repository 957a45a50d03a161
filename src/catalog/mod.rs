//! Endpoint catalog
//!
//! Typed wrappers over [`ApiClient::fetch`] for the commonly used routes,
//! one module per resource group, plus the complete [`Endpoint`] table for
//! everything else. Wrappers only marshal arguments into [`Params`]:
//!
//! - absent optional arguments are omitted from the request;
//! - `additional` parameters are merged last and win on conflicts;
//! - methods taking an optional target user fall back to the user set with
//!   [`ApiClient::set_user`].
//!
//! Every wrapper issues a GET and returns the decoded body.

use crate::client::ApiClient;

pub mod activity_feed;
pub mod endpoint;
pub mod events;
pub mod gear;
pub mod groups;
pub mod params;
pub mod routes;
pub mod users;
pub mod workouts;

pub use activity_feed::ActivityFeedQuery;
pub use endpoint::Endpoint;
pub use events::NewEvent;
pub use groups::GroupUpdate;
pub use params::Params;
pub use routes::{RouteDraft, RouteQuery, RouteRef};
pub use users::UserStatsQuery;
pub use workouts::WorkoutRef;

impl ApiClient {
    /// `user_id`/`user_key` pair for routes that act on "a user, defaulting
    /// to the current one". The effective user only fills in when neither
    /// is given.
    pub(crate) fn user_params(&self, user_id: Option<&str>, user_key: Option<&str>) -> Params {
        let user_id = match user_key {
            Some(_) => user_id.map(str::to_string),
            None => self.target_user(user_id),
        };
        Params::new().opt("user_id", user_id).opt("user_key", user_key)
    }
}

/// `<prefix>_id` / `<prefix>_key` pair for routes that accept either.
pub(crate) fn id_or_key(prefix: &str, id: Option<u64>, key: Option<&str>) -> Params {
    Params::new()
        .opt(format!("{prefix}_id"), id)
        .opt(format!("{prefix}_key"), key)
}
