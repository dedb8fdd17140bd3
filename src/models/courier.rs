use serde::{Deserialize, Serialize, Serializer};

use crate::error::AppError;

pub type CourierId = i64;
pub type RegionId = i64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CourierType {
    Foot,
    Bike,
    Car,
}

impl CourierType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CourierType::Foot => "foot",
            CourierType::Bike => "bike",
            CourierType::Car => "car",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "foot" => Some(CourierType::Foot),
            "bike" => Some(CourierType::Bike),
            "car" => Some(CourierType::Car),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Courier {
    pub courier_id: CourierId,
    pub courier_type: CourierType,
    pub regions: Vec<RegionId>,
    pub working_hours: Vec<String>,
}

/// Partial profile update. Only these three fields may be changed after import.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CourierPatch {
    pub courier_type: Option<CourierType>,
    pub regions: Option<Vec<RegionId>>,
    pub working_hours: Option<Vec<String>>,
}

impl CourierPatch {
    pub fn is_empty(&self) -> bool {
        self.courier_type.is_none() && self.regions.is_none() && self.working_hours.is_none()
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.is_empty() {
            return Err(AppError::BadRequest("patch must set at least one field".to_string()));
        }

        if let Some(regions) = &self.regions {
            if let Some(region) = regions.iter().find(|region| **region < 0) {
                return Err(AppError::BadRequest(format!("region {region} must be >= 0")));
            }
        }

        if let Some(hours) = &self.working_hours {
            crate::engine::time_window::parse_all(hours)?;
        }

        Ok(())
    }

    pub fn apply(self, courier: &mut Courier) {
        if let Some(courier_type) = self.courier_type {
            courier.courier_type = courier_type;
        }
        if let Some(regions) = self.regions {
            courier.regions = regions;
        }
        if let Some(working_hours) = self.working_hours {
            courier.working_hours = working_hours;
        }
    }
}

/// Courier as shown by the detail endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CourierProfile {
    #[serde(flatten)]
    pub courier: Courier,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "rating_text"
    )]
    pub rating: Option<f64>,
    pub earnings: i64,
}

/// Ratings go out as 2-decimal text, `"0.00"` rather than `0.0`.
fn rating_text<S: Serializer>(rating: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match rating {
        Some(rating) => serializer.serialize_str(&format!("{rating:.2}")),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{Courier, CourierProfile, CourierType};

    fn profile(rating: Option<f64>) -> CourierProfile {
        CourierProfile {
            courier: Courier {
                courier_id: 1,
                courier_type: CourierType::Foot,
                regions: vec![1],
                working_hours: vec!["09:00-18:00".to_string()],
            },
            rating,
            earnings: 1000,
        }
    }

    #[test]
    fn rating_keeps_two_decimals() {
        let zero = serde_json::to_value(profile(Some(0.0))).unwrap();
        assert_eq!(zero["rating"], json!("0.00"));

        let top = serde_json::to_value(profile(Some(5.0))).unwrap();
        assert_eq!(top["rating"], json!("5.00"));

        let partial = serde_json::to_value(profile(Some(4.92))).unwrap();
        assert_eq!(partial["rating"], json!("4.92"));
    }

    #[test]
    fn missing_rating_is_omitted() {
        let value = serde_json::to_value(profile(None)).unwrap();
        assert!(value.get("rating").is_none());
        assert_eq!(value["earnings"], 1000);
        assert_eq!(value["courier_type"], "foot");
    }
}
