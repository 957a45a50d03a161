//! `events/*`

use chrono::NaiveDate;

use crate::catalog::{Endpoint, Params};
use crate::client::ApiClient;
use crate::error::Result;
use crate::response::Decoded;

/// Required fields of a new event.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub start_date: NaiveDate,
    /// Event type ids, all under the same parent type.
    pub type_ids: Vec<u64>,
    pub creator_type: u32,
    pub city: String,
    /// Two-letter country code.
    pub country: String,
    pub brief_description: String,
}

impl NewEvent {
    fn into_params(self) -> Params {
        let type_ids: Vec<String> = self.type_ids.iter().map(u64::to_string).collect();
        Params::new()
            .set("event_title", self.title)
            .date("event_start_date", Some(self.start_date))
            .set("event_type_id_list", type_ids.join(","))
            .set("event_creator_type", self.creator_type)
            .set("event_city", self.city)
            .set("event_country", self.country)
            .set("event_brief_description", self.brief_description)
    }
}

impl ApiClient {
    pub async fn create_event(&self, event: NewEvent, additional: Params) -> Result<Decoded> {
        let params = event.into_params().merge(additional);
        self.call_endpoint(Endpoint::CreateEvent, params).await
    }

    pub async fn delete_event(&self, event_key: &str) -> Result<Decoded> {
        self.event_call(Endpoint::DeleteEvent, event_key).await
    }

    pub async fn get_event(&self, event_key: &str) -> Result<Decoded> {
        self.event_call(Endpoint::GetEvent, event_key).await
    }

    /// Routes attached to an event.
    pub async fn get_event_routes(&self, event_key: &str) -> Result<Decoded> {
        self.event_call(Endpoint::GetEventRoutes, event_key).await
    }

    pub async fn get_event_types(&self) -> Result<Decoded> {
        self.call_endpoint(Endpoint::GetEventTypes, Params::new())
            .await
    }

    pub async fn publish_event(&self, event_key: &str) -> Result<Decoded> {
        self.event_call(Endpoint::PublishEvent, event_key).await
    }

    /// Event search; the API takes free-form criteria.
    pub async fn search_events(&self, criteria: Params) -> Result<Decoded> {
        self.call_endpoint(Endpoint::SearchEvents, criteria).await
    }

    pub async fn unpublish_event(&self, event_key: &str) -> Result<Decoded> {
        self.event_call(Endpoint::UnpublishEvent, event_key).await
    }

    async fn event_call(&self, endpoint: Endpoint, event_key: &str) -> Result<Decoded> {
        self.call_endpoint(endpoint, Params::new().set("event_key", event_key))
            .await
    }
}
