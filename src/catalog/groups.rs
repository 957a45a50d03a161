//! `groups/*`
//!
//! Groups are addressed by numeric id or by key; pass whichever you have.

use crate::catalog::{id_or_key, Endpoint, Params};
use crate::client::ApiClient;
use crate::error::Result;
use crate::response::Decoded;

/// Editable group fields.
#[derive(Debug, Clone)]
pub struct GroupUpdate {
    pub name: String,
    pub public: bool,
    pub contact_person: String,
    pub web_site: String,
}

impl ApiClient {
    pub async fn delete_group(&self, group_id: Option<u64>, group_key: Option<&str>) -> Result<Decoded> {
        self.group_call(Endpoint::DeleteGroup, group_id, group_key).await
    }

    pub async fn get_group(&self, group_id: Option<u64>, group_key: Option<&str>) -> Result<Decoded> {
        self.group_call(Endpoint::GetGroup, group_id, group_key).await
    }

    pub async fn get_group_stats(
        &self,
        group_id: Option<u64>,
        group_key: Option<&str>,
    ) -> Result<Decoded> {
        self.group_call(Endpoint::GetGroupStats, group_id, group_key)
            .await
    }

    pub async fn get_group_types(&self) -> Result<Decoded> {
        self.call_endpoint(Endpoint::GetGroupTypes, Params::new())
            .await
    }

    pub async fn join_group(&self, group_id: Option<u64>, group_key: Option<&str>) -> Result<Decoded> {
        self.group_call(Endpoint::JoinGroup, group_id, group_key).await
    }

    pub async fn leave_group(&self, group_id: Option<u64>, group_key: Option<&str>) -> Result<Decoded> {
        self.group_call(Endpoint::LeaveGroup, group_id, group_key).await
    }

    /// Updates a group; identify it through `additional` (`group_id` or
    /// `group_key`).
    pub async fn update_group(&self, update: GroupUpdate, additional: Params) -> Result<Decoded> {
        let params = Params::new()
            .set("group_name", update.name)
            .set("public_flag", u8::from(update.public))
            .set("group_contact_person", update.contact_person)
            .set("web_site", update.web_site)
            .merge(additional);
        self.call_endpoint(Endpoint::UpdateGroup, params).await
    }

    async fn group_call(
        &self,
        endpoint: Endpoint,
        group_id: Option<u64>,
        group_key: Option<&str>,
    ) -> Result<Decoded> {
        self.call_endpoint(endpoint, id_or_key("group", group_id, group_key))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::*;

    #[tokio::test]
    async fn test_join_group_by_id() {
        let (client, transport) = client();
        ok(&transport);
        client.join_group(Some(77), None).await.unwrap();

        let request = transport.last_request().unwrap();
        assert!(request.url.path().ends_with("/groups/join_group"));
        assert_eq!(sent(&request), pairs(&[("group_id", "77")]));
    }

    #[tokio::test]
    async fn test_update_group_flags_are_numeric() {
        let (client, transport) = client();
        ok(&transport);

        let update = GroupUpdate {
            name: "Trail Crew".to_string(),
            public: true,
            contact_person: "Sam".to_string(),
            web_site: "https://trail.example".to_string(),
        };
        client
            .update_group(update, Params::new().set("group_id", 77))
            .await
            .unwrap();

        let request = transport.last_request().unwrap();
        let params: Params = sent(&request).into_iter().collect();
        assert_eq!(params.get("public_flag"), Some("1"));
        assert_eq!(params.get("group_id"), Some("77"));
    }
}
