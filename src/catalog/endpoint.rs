//! The full table of API routes
//!
//! Every route the 3.1 API exposes is a variant of [`Endpoint`]. Routes
//! without a typed wrapper are still reachable through
//! [`ApiClient::call_endpoint`](crate::client::ApiClient::call_endpoint)
//! with hand-built [`Params`](crate::catalog::Params).

use std::fmt;
use std::str::FromStr;

use crate::error::{MmfError, Result};

macro_rules! endpoints {
    ($( $(#[$meta:meta])* $variant:ident => $path:literal, )+) => {
        /// A catalogued API route.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Endpoint {
            $( $(#[$meta])* $variant, )+
        }

        impl Endpoint {
            /// Every route, grouped by resource.
            pub const ALL: &'static [Endpoint] = &[ $( Endpoint::$variant, )+ ];

            /// Route path relative to the API base, e.g. `users/get_user`.
            pub fn path(&self) -> &'static str {
                match self {
                    $( Endpoint::$variant => $path, )+
                }
            }
        }
    };
}

endpoints! {
    // activity_feed
    GetActivityFeed => "activity_feed/get_activity_feed",

    // events
    CreateEvent => "events/create_event",
    DeleteEvent => "events/delete_event",
    GetEvent => "events/get_event",
    GetEventRoutes => "events/get_event_routes",
    GetEventTypes => "events/get_event_types",
    PublishEvent => "events/publish_event",
    SearchEvents => "events/search_events",
    UnpublishEvent => "events/unpublish_event",

    // gear
    CreateGear => "gear/create_gear",
    CreateGearBrand => "gear/create_gear_brand",
    CreateGearType => "gear/create_gear_type",
    DeleteGear => "gear/delete_gear",
    GetGear => "gear/get_gear",
    GetGearOptions => "gear/get_gear_options",
    GetGearTypeOptions => "gear/get_gear_type_options",
    GetUserGear => "gear/get_user_gear",
    IsDuplicateGearBrandName => "gear/is_duplicate_gear_brand_name",
    SuggestGearBrands => "gear/suggest_gear_brands",

    // groups
    DeleteGroup => "groups/delete_group",
    GetGroup => "groups/get_group",
    GetGroupStats => "groups/get_group_stats",
    GetGroupTypes => "groups/get_group_types",
    JoinGroup => "groups/join_group",
    LeaveGroup => "groups/leave_group",
    UpdateGroup => "groups/update_group",

    // routes
    CopyRoute => "routes/copy_route",
    CreateRoute => "routes/create_route",
    DeleteRoute => "routes/delete_route",
    GetPointElevation => "routes/get_point_elevation",
    GetRoute => "routes/get_route",
    GetRouteClimbData => "routes/get_route_climb_data",
    GetRouteCrs => "routes/get_route_crs",
    GetRouteDistances => "routes/get_route_distances",
    GetRouteElevationSummary => "routes/get_route_elevation_summary",
    GetRouteGpx => "routes/get_route_gpx",
    GetRouteJson => "routes/get_route_json",
    GetRouteKml => "routes/get_route_kml",
    GetRouteKmlTour => "routes/get_route_kml_tour",
    GetRoutePointsCsv => "routes/get_route_points_csv",
    GetRoutePointsKml => "routes/get_route_points_kml",
    GetRouteStartLocations => "routes/get_route_start_locations",
    GetRouteTypes => "routes/get_route_types",
    GetRoutes => "routes/get_routes",
    ImportRoute => "routes/import_route",
    SaveRoute => "routes/save_route",
    /// Variant of `save_route` that also takes city and country.
    SaveRoute2 => "routes/save_route2",
    SearchRoutes => "routes/search_routes",
    ShareRoute => "routes/share_route",
    ViewMarkerImage => "routes/view_marker_image",
    ViewRouteElevation => "routes/view_route_elevation",
    ViewRouteImage => "routes/view_route_image",

    // users
    AddFriend => "users/add_friend",
    AddFriendToFriendList => "users/add_friend_to_friend_list",
    AssociateRemoteUser => "users/associate_remote_user",
    AuthenticateUser => "users/authenticate_user",
    CheckBbAuth => "users/check_bb_auth",
    CreateFriendList => "users/create_friend_list",
    CreateRemoteUser => "users/create_remote_user",
    CreateUser => "users/create_user",
    DeleteFriendList => "users/delete_friend_list",
    DeleteRemoteUser => "users/delete_remote_user",
    GetAvatar => "users/get_avatar",
    GetFundraisingStats => "users/get_fundraising_stats",
    GetMessage => "users/get_message",
    GetRemoteUserTypes => "users/get_remote_user_types",
    GetUser => "users/get_user",
    GetUserContacts => "users/get_user_contacts",
    GetUserFriendList => "users/get_user_friend_list",
    GetUserFriendListOptions => "users/get_user_friend_list_options",
    GetUserFriendRequests => "users/get_user_friend_requests",
    GetUserFriends => "users/get_user_friends",
    GetUserKeys => "users/get_user_keys",
    GetUserLocations => "users/get_user_locations",
    GetUserMessages => "users/get_user_messages",
    GetUserStats => "users/get_user_stats",
    GetUserSummary => "users/get_user_summary",
    Invite => "users/invite",
    IsDuplicateEmail => "users/is_duplicate_email",
    IsDuplicateUsername => "users/is_duplicate_username",
    IsPremiumUser => "users/is_premium_user",
    IsRemoteUser => "users/is_remote_user",
    IsValidUser => "users/is_valid_user",
    Login => "users/login",
    ProcessFriendRequests => "users/process_friend_requests",
    RemoveFriend => "users/remove_friend",
    RemoveFriendFromFriendList => "users/remove_friend_from_friend_list",
    SearchUsers => "users/search_users",
    SendFriendRequest => "users/send_friend_request",
    SendMessage => "users/send_message",
    TellFriendContent => "users/tell_friend_content",
    UpdateFriendList => "users/update_friend_list",
    UpdateUser => "users/update_user",
    UpdateUserMapSettings => "users/update_user_map_settings",
    UserOwnsContent => "users/user_owns_content",
    UserSummary => "users/user_summary",

    // workouts
    AddTimeSeries => "workouts/add_time_series",
    ConvertIsdsToWorkoutTrack => "workouts/convert_isds_to_workout_track",
    ConvertRouteToWorkoutTrack => "workouts/convert_route_to_workout_track",
    CreateWorkout => "workouts/create_workout",
    CreateWorkoutTrack => "workouts/create_workout_track",
    CreateWorkoutType => "workouts/create_workout_type",
    DeleteWorkout => "workouts/delete_workout",
    EditWorkout => "workouts/edit_workout",
    GetActivityTypes => "workouts/get_activity_types",
    GetCompendiumCompcodes => "workouts/get_compendium_compcodes",
    GetCompendiumHeadings => "workouts/get_compendium_headings",
    GetParentWorkoutTypes => "workouts/get_parent_workout_types",
    GetTcxStats => "workouts/get_tcx_stats",
    GetUserWorkoutStats => "workouts/get_user_workout_stats",
    GetWorkout => "workouts/get_workout",
    GetWorkoutFull => "workouts/get_workout_full",
    GetWorkoutLaps => "workouts/get_workout_laps",
    GetWorkoutTypes => "workouts/get_workout_types",
    GetWorkouts => "workouts/get_workouts",
    ImportTcx => "workouts/import_tcx",
    SaveWorkoutDataTrack => "workouts/save_workout_data_track",
    SearchWorkouts => "workouts/search_workouts",
    SuggestWorkoutTypes => "workouts/suggest_workout_types",
}

impl Endpoint {
    /// Resource group, the first path segment (`users`, `routes`, ...).
    pub fn group(&self) -> &'static str {
        self.path().split('/').next().unwrap_or_default()
    }

    /// Route name within its group, e.g. `get_user`.
    pub fn name(&self) -> &'static str {
        self.path().rsplit('/').next().unwrap_or_default()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Endpoint {
    type Err = MmfError;

    /// Accepts the route path with or without a leading `/`.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().trim_start_matches('/');
        Endpoint::ALL
            .iter()
            .copied()
            .find(|e| e.path() == wanted)
            .ok_or_else(|| MmfError::InvalidParameters(format!("unknown endpoint '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_paths_are_unique() {
        let paths: HashSet<_> = Endpoint::ALL.iter().map(Endpoint::path).collect();
        assert_eq!(paths.len(), Endpoint::ALL.len());
    }

    #[test]
    fn test_every_path_round_trips_through_from_str() {
        for endpoint in Endpoint::ALL {
            assert_eq!(endpoint.path().parse::<Endpoint>().unwrap(), *endpoint);
        }
    }

    #[test]
    fn test_catalog_covers_every_group() {
        let groups: HashSet<_> = Endpoint::ALL.iter().map(Endpoint::group).collect();
        for group in [
            "activity_feed",
            "events",
            "gear",
            "groups",
            "routes",
            "users",
            "workouts",
        ] {
            assert!(groups.contains(group), "missing group {group}");
        }
        assert_eq!(Endpoint::ALL.len(), 119);
    }

    #[test]
    fn test_search_events_has_its_own_route() {
        assert_eq!(Endpoint::SearchEvents.path(), "events/search_events");
        assert_ne!(Endpoint::SearchEvents.path(), Endpoint::PublishEvent.path());
    }

    #[test]
    fn test_from_str_accepts_leading_slash() {
        assert_eq!(
            "/users/get_user".parse::<Endpoint>().unwrap(),
            Endpoint::GetUser
        );
        assert_eq!(Endpoint::GetUser.name(), "get_user");
    }

    #[test]
    fn test_unknown_route_is_rejected() {
        assert!(matches!(
            "users/get_everything".parse::<Endpoint>(),
            Err(MmfError::InvalidParameters(_))
        ));
    }
}
