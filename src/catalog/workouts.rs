//! `workouts/*`

use chrono::NaiveDate;

use crate::catalog::{Endpoint, Params};
use crate::client::ApiClient;
use crate::error::Result;
use crate::response::Decoded;

/// How a workout is identified in a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkoutRef {
    /// `workout_id`
    Id(u64),
    /// `workout_key`
    Key(String),
}

impl WorkoutRef {
    fn to_params(&self) -> Params {
        match self {
            WorkoutRef::Id(id) => Params::new().set("workout_id", id),
            WorkoutRef::Key(key) => Params::new().set("workout_key", key),
        }
    }
}

impl From<u64> for WorkoutRef {
    fn from(id: u64) -> Self {
        WorkoutRef::Id(id)
    }
}

impl ApiClient {
    pub async fn create_workout(
        &self,
        workout_date: NaiveDate,
        description: &str,
        additional: Params,
    ) -> Result<Decoded> {
        let params = Params::new()
            .date("workout_date", Some(workout_date))
            .set("workout_description", description)
            .merge(additional);
        self.call_endpoint(Endpoint::CreateWorkout, params).await
    }

    pub async fn delete_workout(&self, workout: &WorkoutRef) -> Result<Decoded> {
        self.call_endpoint(Endpoint::DeleteWorkout, workout.to_params())
            .await
    }

    pub async fn edit_workout(&self, workout: &WorkoutRef, changes: Params) -> Result<Decoded> {
        let params = workout.to_params().merge(changes);
        self.call_endpoint(Endpoint::EditWorkout, params).await
    }

    pub async fn get_workout(&self, workout: &WorkoutRef) -> Result<Decoded> {
        self.call_endpoint(Endpoint::GetWorkout, workout.to_params())
            .await
    }

    /// The workout record including its child tracks.
    pub async fn get_workout_full(&self, workout: &WorkoutRef) -> Result<Decoded> {
        self.call_endpoint(Endpoint::GetWorkoutFull, workout.to_params())
            .await
    }

    pub async fn get_workout_laps(&self, workout: &WorkoutRef) -> Result<Decoded> {
        self.call_endpoint(Endpoint::GetWorkoutLaps, workout.to_params())
            .await
    }

    /// Workouts logged by a user, the effective user by default.
    pub async fn get_workouts(&self, user_id: Option<&str>, additional: Params) -> Result<Decoded> {
        let params = self.user_params(user_id, None).merge(additional);
        self.call_endpoint(Endpoint::GetWorkouts, params).await
    }

    pub async fn get_user_workout_stats(
        &self,
        user_id: Option<&str>,
        additional: Params,
    ) -> Result<Decoded> {
        let params = self.user_params(user_id, None).merge(additional);
        self.call_endpoint(Endpoint::GetUserWorkoutStats, params)
            .await
    }

    /// Workout types for a user, the effective user by default.
    pub async fn get_workout_types(
        &self,
        user_id: Option<&str>,
        parent_workout_type_id: Option<u64>,
    ) -> Result<Decoded> {
        let params = self
            .user_params(user_id, None)
            .opt("parent_workout_type_id", parent_workout_type_id);
        self.call_endpoint(Endpoint::GetWorkoutTypes, params).await
    }

    pub async fn get_parent_workout_types(&self) -> Result<Decoded> {
        self.call_endpoint(Endpoint::GetParentWorkoutTypes, Params::new())
            .await
    }

    pub async fn get_activity_types(&self, parent_activity_type_id: Option<u64>) -> Result<Decoded> {
        let params = Params::new().opt("parent_activity_type_id", parent_activity_type_id);
        self.call_endpoint(Endpoint::GetActivityTypes, params).await
    }

    pub async fn search_workouts(&self, keyword: Option<&str>, additional: Params) -> Result<Decoded> {
        let params = Params::new().opt("keyword", keyword).merge(additional);
        self.call_endpoint(Endpoint::SearchWorkouts, params).await
    }

    /// Creates a single-lap data track for a workout.
    pub async fn save_workout_data_track(
        &self,
        workout: &WorkoutRef,
        track_name: &str,
        additional: Params,
    ) -> Result<Decoded> {
        let params = workout
            .to_params()
            .set("workout_track_name", track_name)
            .merge(additional);
        self.call_endpoint(Endpoint::SaveWorkoutDataTrack, params)
            .await
    }

    /// Imports a TCX document as a workout.
    pub async fn import_tcx(&self, tcx: &str, additional: Params) -> Result<Decoded> {
        let params = Params::new().set("tcx", tcx).merge(additional);
        self.call_endpoint(Endpoint::ImportTcx, params).await
    }
}
