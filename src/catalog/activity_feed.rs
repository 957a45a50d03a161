//! `activity_feed/*`

use chrono::NaiveDate;
use serde::Serialize;

use crate::catalog::{Endpoint, Params};
use crate::client::ApiClient;
use crate::error::Result;
use crate::response::Decoded;

/// Filters for [`ApiClient::get_activity_feed`]. Every field is optional.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivityFeedQuery {
    pub user_id: Option<String>,
    pub user_key: Option<String>,
    /// Only entries on or after this day.
    pub date_since: Option<NaiveDate>,
    pub scope: Option<String>,
    pub start_record: Option<u32>,
    pub limit: Option<u32>,
    pub sort_by: Option<String>,
}

impl ApiClient {
    /// Activity feed for a user, the effective user by default.
    pub async fn get_activity_feed(&self, query: &ActivityFeedQuery) -> Result<Decoded> {
        let params = self
            .user_params(query.user_id.as_deref(), query.user_key.as_deref())
            .merge(Params::from_query(query)?);
        self.call_endpoint(Endpoint::GetActivityFeed, params).await
    }
}
