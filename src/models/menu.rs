use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One of the three daily meal slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealType {
    /// Slots in the order a day is generated.
    pub const ALL: [MealType; 3] = [MealType::Breakfast, MealType::Lunch, MealType::Dinner];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
        }
    }
}

impl std::fmt::Display for MealType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown meal type: {0}")]
pub struct MealTypeParseError(pub String);

impl std::str::FromStr for MealType {
    type Err = MealTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            _ => Err(MealTypeParseError(s.to_string())),
        }
    }
}

impl TryFrom<String> for MealType {
    type Error = MealTypeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Catalog entry. `meal_type` is stored as TEXT and parsed on read.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct MenuItem {
    pub id: Uuid,
    pub title: String,
    #[sqlx(try_from = "String")]
    pub meal_type: MealType,
    pub cuisine: String,
    pub is_active: bool,
    pub notes: Option<String>,
    pub allergens: Vec<String>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

/// Body for POST /menus.
#[derive(Debug, Deserialize)]
pub struct CreateMenuRequest {
    pub title: String,
    pub meal_type: MealType,
    pub cuisine: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub notes: Option<String>,
    #[serde(default)]
    pub allergens: Vec<String>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub image_url: Option<String>,
}

impl CreateMenuRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.title.trim().is_empty() {
            return Err("title must not be empty".into());
        }
        if self.cuisine.trim().is_empty() {
            return Err("cuisine must not be empty".into());
        }
        validate_budget(self.budget_min, self.budget_max)
    }
}

/// Absent key is `None`, explicit `null` is `Some(None)`.
pub(crate) fn nullable<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// Body for PATCH /menus/{id}. Absent fields are left unchanged; `null` clears
/// the optional ones.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateMenuRequest {
    pub title: Option<String>,
    pub meal_type: Option<MealType>,
    pub cuisine: Option<String>,
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "nullable")]
    pub notes: Option<Option<String>>,
    pub allergens: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub budget_min: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub budget_max: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub image_url: Option<Option<String>>,
}

impl UpdateMenuRequest {
    pub fn validate(&self) -> Result<(), String> {
        if matches!(&self.title, Some(t) if t.trim().is_empty()) {
            return Err("title must not be empty".into());
        }
        if matches!(&self.cuisine, Some(c) if c.trim().is_empty()) {
            return Err("cuisine must not be empty".into());
        }
        validate_budget(self.budget_min.flatten(), self.budget_max.flatten())
    }
}

pub(crate) fn validate_budget(min: Option<f64>, max: Option<f64>) -> Result<(), String> {
    if min.is_some_and(|v| v < 0.0) || max.is_some_and(|v| v < 0.0) {
        return Err("budget values must be >= 0".into());
    }
    Ok(())
}

/// Query params for GET /menus.
#[derive(Debug, Default, Deserialize)]
pub struct MenuListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort: Option<String>,
    /// Substring match on the title.
    pub search: Option<String>,
    pub meal_type: Option<MealType>,
    /// Case-insensitive substring match on the cuisine.
    pub cuisine: Option<String>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_type_parse_and_display() {
        for slot in MealType::ALL {
            assert_eq!(slot.to_string().parse::<MealType>().unwrap(), slot);
        }
        assert!("brunch".parse::<MealType>().is_err());
    }

    #[test]
    fn test_meal_type_serde_lowercase() {
        let json = serde_json::to_string(&MealType::Dinner).unwrap();
        assert_eq!(json, "\"dinner\"");
        let bad: Result<MealType, _> = serde_json::from_str("\"supper\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_create_request_defaults() {
        let req: CreateMenuRequest = serde_json::from_str(
            r#"{"title":"Pad Thai","meal_type":"lunch","cuisine":"Thai"}"#,
        )
        .unwrap();
        assert!(req.is_active);
        assert!(req.allergens.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_negative_budget_rejected() {
        let req = UpdateMenuRequest {
            budget_min: Some(Some(-1.0)),
            ..Default::default()
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_update_request_null_clears_field() {
        let req: UpdateMenuRequest =
            serde_json::from_str(r#"{"budget_max":null,"notes":"spicy"}"#).unwrap();
        assert_eq!(req.budget_max, Some(None));
        assert_eq!(req.budget_min, None);
        assert_eq!(req.notes, Some(Some("spicy".to_string())));
        assert_eq!(req.image_url, None);
        assert!(req.validate().is_ok());
    }
}
