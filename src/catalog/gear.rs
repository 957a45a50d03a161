//! `gear/*`

use chrono::NaiveDate;

use crate::catalog::{id_or_key, Endpoint, Params};
use crate::client::ApiClient;
use crate::error::Result;
use crate::response::Decoded;

impl ApiClient {
    pub async fn create_gear(
        &self,
        gear_name: &str,
        gear_type_id: u64,
        purchase_date: NaiveDate,
        additional: Params,
    ) -> Result<Decoded> {
        let params = Params::new()
            .set("gear_name", gear_name)
            .set("gear_type_id", gear_type_id)
            .date("purchase_date", Some(purchase_date))
            .merge(additional);
        self.call_endpoint(Endpoint::CreateGear, params).await
    }

    pub async fn create_gear_brand(&self, brand_name: &str, gear_type_id: u64) -> Result<Decoded> {
        let params = Params::new()
            .set("gear_brand_name", brand_name)
            .set("gear_type_id", gear_type_id);
        self.call_endpoint(Endpoint::CreateGearBrand, params).await
    }

    /// Creates a gear type; `replacement_distance` is in miles.
    pub async fn create_gear_type(
        &self,
        type_name: &str,
        replacement_distance: Option<f64>,
    ) -> Result<Decoded> {
        let params = Params::new()
            .set("gear_type_name", type_name)
            .opt("replacement_distance", replacement_distance);
        self.call_endpoint(Endpoint::CreateGearType, params).await
    }

    pub async fn delete_gear(&self, gear_id: Option<u64>, gear_key: Option<&str>) -> Result<Decoded> {
        self.call_endpoint(Endpoint::DeleteGear, id_or_key("gear", gear_id, gear_key))
            .await
    }

    pub async fn get_gear(&self, gear_id: Option<u64>, gear_key: Option<&str>) -> Result<Decoded> {
        self.call_endpoint(Endpoint::GetGear, id_or_key("gear", gear_id, gear_key))
            .await
    }

    pub async fn get_gear_options(&self, gear_type_id: u64) -> Result<Decoded> {
        let params = Params::new().set("gear_type_id", gear_type_id);
        self.call_endpoint(Endpoint::GetGearOptions, params).await
    }

    pub async fn get_gear_type_options(&self) -> Result<Decoded> {
        self.call_endpoint(Endpoint::GetGearTypeOptions, Params::new())
            .await
    }

    /// Gear owned by the authorized user, optionally of one type.
    pub async fn get_user_gear(&self, gear_type_id: Option<u64>) -> Result<Decoded> {
        let params = Params::new().opt("gear_type_id", gear_type_id);
        self.call_endpoint(Endpoint::GetUserGear, params).await
    }

    pub async fn is_duplicate_gear_brand_name(&self, brand_name: &str) -> Result<Decoded> {
        let params = Params::new().set("gear_brand_name", brand_name);
        self.call_endpoint(Endpoint::IsDuplicateGearBrandName, params)
            .await
    }

    /// Brand name suggestions for the prefix `q`.
    pub async fn suggest_gear_brands(&self, gear_type_id: u64, q: &str) -> Result<Decoded> {
        let params = Params::new().set("gear_type_id", gear_type_id).set("q", q);
        self.call_endpoint(Endpoint::SuggestGearBrands, params).await
    }
}
