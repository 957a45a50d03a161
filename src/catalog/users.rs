//! `users/*`

use chrono::NaiveDate;
use serde::Serialize;

use crate::catalog::{id_or_key, Endpoint, Params};
use crate::client::ApiClient;
use crate::error::Result;
use crate::response::Decoded;

/// Filters for [`ApiClient::get_user_stats`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserStatsQuery {
    pub user_id: Option<String>,
    pub user_key: Option<String>,
    /// Sent as a comma-separated list.
    pub parent_workout_type_ids: Vec<u64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    /// Aggregation period, e.g. `week` or `month`.
    pub period: Option<String>,
}

impl ApiClient {
    /// The user record; the effective user when neither id nor key is given.
    pub async fn get_user(&self, user_id: Option<&str>, user_key: Option<&str>) -> Result<Decoded> {
        let params = self.user_params(user_id, user_key);
        self.call_endpoint(Endpoint::GetUser, params).await
    }

    pub async fn get_user_summary(
        &self,
        user_id: Option<&str>,
        user_key: Option<&str>,
        fundraising: Option<bool>,
    ) -> Result<Decoded> {
        let params = self
            .user_params(user_id, user_key)
            .opt("fundraising", fundraising.map(u8::from));
        self.call_endpoint(Endpoint::GetUserSummary, params).await
    }

    pub async fn get_user_stats(&self, query: &UserStatsQuery) -> Result<Decoded> {
        let mut params = Params::from_query(query)?;
        if query.parent_workout_type_ids.is_empty() {
            params.remove("parent_workout_type_ids");
        }
        let params = self
            .user_params(query.user_id.as_deref(), query.user_key.as_deref())
            .merge(params);
        self.call_endpoint(Endpoint::GetUserStats, params).await
    }

    pub async fn get_fundraising_stats(
        &self,
        user_id: Option<&str>,
        campaign_id: Option<u64>,
    ) -> Result<Decoded> {
        let params = self
            .user_params(user_id, None)
            .opt("campaign_id", campaign_id);
        self.call_endpoint(Endpoint::GetFundraisingStats, params)
            .await
    }

    pub async fn get_avatar(&self, size: Option<&str>, uid: Option<u64>) -> Result<Decoded> {
        let params = Params::new().opt("size", size).opt("uid", uid);
        self.call_endpoint(Endpoint::GetAvatar, params).await
    }

    /// Looks up user keys by email address.
    pub async fn get_user_keys(&self, email: &str) -> Result<Decoded> {
        self.call_endpoint(Endpoint::GetUserKeys, Params::new().set("email", email))
            .await
    }

    pub async fn is_premium_user(&self) -> Result<Decoded> {
        self.call_endpoint(Endpoint::IsPremiumUser, Params::new())
            .await
    }

    pub async fn is_duplicate_email(&self, email: &str) -> Result<Decoded> {
        let params = Params::new().set("email", email);
        self.call_endpoint(Endpoint::IsDuplicateEmail, params).await
    }

    pub async fn is_duplicate_username(&self, username: &str) -> Result<Decoded> {
        let params = Params::new().set("username", username);
        self.call_endpoint(Endpoint::IsDuplicateUsername, params)
            .await
    }

    pub async fn search_users(&self, keyword: Option<&str>, additional: Params) -> Result<Decoded> {
        let params = Params::new().opt("keyword", keyword).merge(additional);
        self.call_endpoint(Endpoint::SearchUsers, params).await
    }

    pub async fn update_user(&self, user_id: Option<&str>, changes: Params) -> Result<Decoded> {
        let params = self.user_params(user_id, None).merge(changes);
        self.call_endpoint(Endpoint::UpdateUser, params).await
    }

    // -- friends -----------------------------------------------------------

    pub async fn get_user_friends(
        &self,
        friend_list_id: Option<u64>,
        friend_list_key: Option<&str>,
        additional: Params,
    ) -> Result<Decoded> {
        let params = id_or_key("friend_list", friend_list_id, friend_list_key).merge(additional);
        self.call_endpoint(Endpoint::GetUserFriends, params).await
    }

    /// Pending friend requests, optionally filtered by `status`.
    pub async fn get_user_friend_requests(&self, status: Option<&str>) -> Result<Decoded> {
        let params = Params::new().opt("status", status);
        self.call_endpoint(Endpoint::GetUserFriendRequests, params)
            .await
    }

    /// Adds a friend by user id, user key or email.
    pub async fn add_friend(
        &self,
        friend_user_id: Option<u64>,
        friend_user_key: Option<&str>,
        friend_email: Option<&str>,
    ) -> Result<Decoded> {
        let params = id_or_key("friend_user", friend_user_id, friend_user_key)
            .opt("friend_email", friend_email);
        self.call_endpoint(Endpoint::AddFriend, params).await
    }

    pub async fn remove_friend(
        &self,
        friend_user_id: Option<u64>,
        friend_user_key: Option<&str>,
    ) -> Result<Decoded> {
        let params = id_or_key("friend_user", friend_user_id, friend_user_key);
        self.call_endpoint(Endpoint::RemoveFriend, params).await
    }

    pub async fn send_friend_request(
        &self,
        friend_user_id: Option<u64>,
        friend_user_key: Option<&str>,
        message: Option<&str>,
    ) -> Result<Decoded> {
        let params =
            id_or_key("friend_user", friend_user_id, friend_user_key).opt("message", message);
        self.call_endpoint(Endpoint::SendFriendRequest, params).await
    }

    pub async fn create_friend_list(&self, name: &str, description: Option<&str>) -> Result<Decoded> {
        let params = Params::new()
            .set("friend_list_name", name)
            .opt("friend_list_description", description);
        self.call_endpoint(Endpoint::CreateFriendList, params).await
    }

    pub async fn delete_friend_list(
        &self,
        friend_list_id: Option<u64>,
        friend_list_key: Option<&str>,
    ) -> Result<Decoded> {
        let params = id_or_key("friend_list", friend_list_id, friend_list_key);
        self.call_endpoint(Endpoint::DeleteFriendList, params).await
    }

    /// Puts an existing friend (by `friend_id`) on a friend list.
    pub async fn add_friend_to_friend_list(
        &self,
        friend_id: u64,
        friend_list_id: Option<u64>,
        friend_list_key: Option<&str>,
    ) -> Result<Decoded> {
        let params = id_or_key("friend_list", friend_list_id, friend_list_key)
            .set("friend_id", friend_id);
        self.call_endpoint(Endpoint::AddFriendToFriendList, params)
            .await
    }

    // -- messages ----------------------------------------------------------

    pub async fn get_user_messages(
        &self,
        status: Option<&str>,
        start_record: Option<u32>,
        limit: Option<u32>,
        sort_by: Option<&str>,
    ) -> Result<Decoded> {
        let params = Params::new()
            .opt("status", status)
            .opt("start_record", start_record)
            .opt("limit", limit)
            .opt("sort_by", sort_by);
        self.call_endpoint(Endpoint::GetUserMessages, params).await
    }

    /// Sends a private message to another user.
    pub async fn send_message(&self, user_id: u64, subject: &str, message: &str) -> Result<Decoded> {
        let params = Params::new()
            .set("user_id", user_id)
            .set("subject", subject)
            .set("message", message);
        self.call_endpoint(Endpoint::SendMessage, params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::*;

    #[tokio::test]
    async fn test_get_user_without_arguments_sends_no_user() {
        let (client, transport) = client();
        ok(&transport);
        client.get_user(None, None).await.unwrap();

        let request = transport.last_request().unwrap();
        assert!(request.url.path().ends_with("/users/get_user"));
        assert!(sent(&request).is_empty());
        assert!(request.params.contains(&("o".to_string(), "json".to_string())));
    }

    #[tokio::test]
    async fn test_get_user_stats_query() {
        let (client, transport) = client();
        ok(&transport);

        let query = UserStatsQuery {
            parent_workout_type_ids: vec![1, 5],
            date_from: NaiveDate::from_ymd_opt(2013, 1, 1),
            period: Some("month".to_string()),
            ..UserStatsQuery::default()
        };
        client.get_user_stats(&query).await.unwrap();

        let request = transport.last_request().unwrap();
        assert_eq!(
            sent(&request),
            pairs(&[
                ("date_from", "2013-01-01"),
                ("parent_workout_type_ids", "1,5"),
                ("period", "month"),
            ])
        );
    }

    #[tokio::test]
    async fn test_get_user_stats_omits_empty_type_list() {
        let (client, transport) = client();
        ok(&transport);
        client
            .get_user_stats(&UserStatsQuery::default())
            .await
            .unwrap();

        let request = transport.last_request().unwrap();
        assert!(sent(&request).is_empty());
    }

    #[tokio::test]
    async fn test_friend_list_parameters_are_spelled_correctly() {
        let (client, transport) = client();
        transport.push_response(200, "{}");
        transport.push_response(200, "{}");

        client.delete_friend_list(Some(3), None).await.unwrap();
        client
            .add_friend_to_friend_list(8, Some(3), None)
            .await
            .unwrap();

        let requests = transport.requests();
        assert_eq!(sent(&requests[0]), pairs(&[("friend_list_id", "3")]));
        assert_eq!(
            sent(&requests[1]),
            pairs(&[("friend_id", "8"), ("friend_list_id", "3")])
        );
    }
}
