//! `routes/*`
//!
//! A route is addressed by numeric id, by key, or by the deprecated 32
//! character `r` key; [`RouteRef`] picks exactly one of them.

use serde::Serialize;

use crate::catalog::{Endpoint, Params};
use crate::client::ApiClient;
use crate::error::Result;
use crate::response::Decoded;

/// How a route is identified in a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteRef {
    /// `route_id`
    Id(u64),
    /// `route_key`
    Key(String),
    /// `r`, the legacy route key
    Legacy(String),
}

impl RouteRef {
    fn to_params(&self) -> Params {
        match self {
            RouteRef::Id(id) => Params::new().set("route_id", id),
            RouteRef::Key(key) => Params::new().set("route_key", key),
            RouteRef::Legacy(r) => Params::new().set("r", r),
        }
    }
}

impl From<u64> for RouteRef {
    fn from(id: u64) -> Self {
        RouteRef::Id(id)
    }
}

/// Optional lookups for [`ApiClient::get_route`] and
/// [`ApiClient::get_route_distances`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct RouteQuery {
    /// Include the route's created date.
    pub created_date: Option<bool>,
    /// Include the route's activity type.
    pub activity_type: Option<bool>,
    /// Legacy JSON layout for the route data.
    pub old_json: Option<bool>,
    /// Include location information.
    pub loc: Option<bool>,
}

/// Fields of a saved route. `route_data` is the pipe-separated point list
/// `lng,lat,[marker],[order],[notes]|...`.
#[derive(Debug, Clone)]
pub struct RouteDraft {
    pub name: String,
    pub route_type_id: u64,
    /// Miles.
    pub total_distance: f64,
    pub route_data: String,
}

impl RouteDraft {
    fn to_params(&self) -> Params {
        Params::new()
            .set("route_name", &self.name)
            .set("route_type_id", self.route_type_id)
            .set("total_distance", self.total_distance)
            .set("route_data", &self.route_data)
    }
}

impl ApiClient {
    /// Copies a route into the authorized user's profile.
    pub async fn copy_route(&self, route: &RouteRef) -> Result<Decoded> {
        self.call_endpoint(Endpoint::CopyRoute, route.to_params())
            .await
    }

    pub async fn create_route(&self, draft: &RouteDraft, additional: Params) -> Result<Decoded> {
        let params = draft.to_params().merge(additional);
        self.call_endpoint(Endpoint::CreateRoute, params).await
    }

    pub async fn delete_route(&self, route: &RouteRef) -> Result<Decoded> {
        self.call_endpoint(Endpoint::DeleteRoute, route.to_params())
            .await
    }

    pub async fn get_point_elevation(&self, latitude: f64, longitude: f64) -> Result<Decoded> {
        let params = Params::new()
            .set("latitude", latitude)
            .set("longitude", longitude);
        self.call_endpoint(Endpoint::GetPointElevation, params).await
    }

    pub async fn get_route(&self, route: &RouteRef, query: &RouteQuery) -> Result<Decoded> {
        let params = route.to_params().merge(Params::from_query(query)?);
        self.call_endpoint(Endpoint::GetRoute, params).await
    }

    pub async fn get_route_climb_data(&self, route: &RouteRef) -> Result<Decoded> {
        self.call_endpoint(Endpoint::GetRouteClimbData, route.to_params())
            .await
    }

    /// Course file for a pace of `seconds_per_mile`.
    pub async fn get_route_crs(
        &self,
        route: &RouteRef,
        seconds_per_mile: u32,
        file_extension: Option<&str>,
    ) -> Result<Decoded> {
        let params = route
            .to_params()
            .set("seconds_per_mile", seconds_per_mile)
            .opt("file_extension", file_extension);
        self.call_endpoint(Endpoint::GetRouteCrs, params).await
    }

    pub async fn get_route_distances(
        &self,
        route: &RouteRef,
        query: &RouteQuery,
    ) -> Result<Decoded> {
        let params = route.to_params().merge(Params::from_query(query)?);
        self.call_endpoint(Endpoint::GetRouteDistances, params).await
    }

    pub async fn get_route_elevation_summary(&self, route: &RouteRef) -> Result<Decoded> {
        self.call_endpoint(Endpoint::GetRouteElevationSummary, route.to_params())
            .await
    }

    pub async fn get_route_gpx(&self, route: &RouteRef, elevation: Option<bool>) -> Result<Decoded> {
        let params = route
            .to_params()
            .opt("elevation_flag", elevation.map(u8::from));
        self.call_endpoint(Endpoint::GetRouteGpx, params).await
    }

    pub async fn get_route_kml(&self, route: &RouteRef, additional: Params) -> Result<Decoded> {
        let params = route.to_params().merge(additional);
        self.call_endpoint(Endpoint::GetRouteKml, params).await
    }

    /// Route start points for a user, the effective user by default.
    pub async fn get_route_start_locations(
        &self,
        user_id: Option<&str>,
        route_type_id: Option<u64>,
        limit: Option<u32>,
    ) -> Result<Decoded> {
        let params = self
            .user_params(user_id, None)
            .opt("route_type_id", route_type_id)
            .opt("limit", limit);
        self.call_endpoint(Endpoint::GetRouteStartLocations, params)
            .await
    }

    pub async fn get_route_types(&self) -> Result<Decoded> {
        self.call_endpoint(Endpoint::GetRouteTypes, Params::new())
            .await
    }

    /// Routes owned by a user, the effective user by default.
    pub async fn get_routes(&self, user_id: Option<&str>, additional: Params) -> Result<Decoded> {
        let params = self.user_params(user_id, None).merge(additional);
        self.call_endpoint(Endpoint::GetRoutes, params).await
    }

    pub async fn save_route(&self, draft: &RouteDraft, additional: Params) -> Result<Decoded> {
        let params = draft.to_params().merge(additional);
        self.call_endpoint(Endpoint::SaveRoute, params).await
    }

    /// [`save_route`](Self::save_route) with the route's city and country.
    pub async fn save_route2(
        &self,
        draft: &RouteDraft,
        city: &str,
        country: &str,
        additional: Params,
    ) -> Result<Decoded> {
        let params = draft
            .to_params()
            .set("city", city)
            .set("country", country)
            .merge(additional);
        self.call_endpoint(Endpoint::SaveRoute2, params).await
    }

    pub async fn search_routes(&self, user_id: Option<&str>, additional: Params) -> Result<Decoded> {
        let params = self.user_params(user_id, None).merge(additional);
        self.call_endpoint(Endpoint::SearchRoutes, params).await
    }

    /// Shares a route with a list of email addresses.
    pub async fn share_route(
        &self,
        route: &RouteRef,
        emails: &[&str],
        additional: Params,
    ) -> Result<Decoded> {
        let params = route
            .to_params()
            .set("email_address_list", emails.join(","))
            .merge(additional);
        self.call_endpoint(Endpoint::ShareRoute, params).await
    }
}
