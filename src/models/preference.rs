use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::menu::{nullable, validate_budget, MealType, MenuItem};

/// Per-user dietary and budget preferences.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Preference {
    pub user_id: Uuid,
    pub cuisines: Vec<String>,
    pub allergens_avoid: Vec<String>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub excluded_meal_types: Vec<MealType>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Preference {
    pub fn excludes(&self, slot: MealType) -> bool {
        self.excluded_meal_types.contains(&slot)
    }
}

/// DB row; meal types are TEXT[] and mapped into [`MealType`] on conversion.
#[derive(Debug, FromRow)]
pub struct PreferenceRow {
    pub user_id: Uuid,
    pub cuisines: Vec<String>,
    pub allergens_avoid: Vec<String>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
    pub excluded_meal_types: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PreferenceRow> for Preference {
    fn from(row: PreferenceRow) -> Self {
        let excluded_meal_types = row
            .excluded_meal_types
            .iter()
            .filter_map(|s| match s.parse::<MealType>() {
                Ok(slot) => Some(slot),
                Err(e) => {
                    tracing::warn!("ignoring stored preference for user {}: {e}", row.user_id);
                    None
                }
            })
            .collect();
        Self {
            user_id: row.user_id,
            cuisines: row.cuisines,
            allergens_avoid: row.allergens_avoid,
            budget_min: row.budget_min,
            budget_max: row.budget_max,
            excluded_meal_types,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Body for PATCH /preferences/me and /preferences/{user_id}.
/// A `null` budget bound removes that limit.
#[derive(Debug, Default, Deserialize)]
pub struct UpdatePreferenceRequest {
    pub cuisines: Option<Vec<String>>,
    pub allergens_avoid: Option<Vec<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub budget_min: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub budget_max: Option<Option<f64>>,
    pub excluded_meal_types: Option<Vec<MealType>>,
}

impl UpdatePreferenceRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_budget(self.budget_min.flatten(), self.budget_max.flatten())
    }
}

/// Catalog filter derived from a preference. Empty lists mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuFilter {
    pub cuisines: Vec<String>,
    pub allergens_avoid: Vec<String>,
    pub budget_min: Option<f64>,
    pub budget_max: Option<f64>,
}

impl From<&Preference> for MenuFilter {
    fn from(p: &Preference) -> Self {
        Self {
            cuisines: p.cuisines.clone(),
            allergens_avoid: p.allergens_avoid.clone(),
            budget_min: p.budget_min,
            budget_max: p.budget_max,
        }
    }
}

impl MenuFilter {
    /// Cuisine, allergen and budget eligibility. Slot and `is_active` are checked by the caller.
    ///
    /// An item bound that is absent is compatible with any user bound; otherwise the
    /// ranges must overlap (`item.max >= user.min` and `item.min <= user.max`).
    pub fn matches(&self, item: &MenuItem) -> bool {
        if !self.cuisines.is_empty() && !self.cuisines.contains(&item.cuisine) {
            return false;
        }
        if item.allergens.iter().any(|a| self.allergens_avoid.contains(a)) {
            return false;
        }
        if let (Some(user_min), Some(item_max)) = (self.budget_min, item.budget_max) {
            if item_max < user_min {
                return false;
            }
        }
        if let (Some(user_max), Some(item_min)) = (self.budget_max, item.budget_min) {
            if item_min > user_max {
                return false;
            }
        }
        true
    }
}

/// Canonical, order-independent cache key component for a filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreferenceSignature(String);

impl PreferenceSignature {
    /// Signature used when the user has no stored preference at all.
    pub fn default_profile() -> Self {
        Self("default".to_string())
    }

    pub fn of(filter: &MenuFilter) -> Self {
        let mut cuisines = filter.cuisines.clone();
        cuisines.sort();
        cuisines.dedup();
        let mut allergens = filter.allergens_avoid.clone();
        allergens.sort();
        allergens.dedup();
        // Tuple encoding through serde_json keeps list elements unambiguous.
        let encoded = serde_json::json!([cuisines, allergens, filter.budget_min, filter.budget_max]);
        Self(format!("pref:{encoded}"))
    }

    pub fn for_preference(preference: Option<&Preference>) -> Self {
        match preference {
            Some(p) => Self::of(&MenuFilter::from(p)),
            None => Self::default_profile(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(cuisine: &str, allergens: &[&str], min: Option<f64>, max: Option<f64>) -> MenuItem {
        MenuItem {
            id: Uuid::new_v4(),
            title: "dish".into(),
            meal_type: MealType::Lunch,
            cuisine: cuisine.into(),
            is_active: true,
            notes: None,
            allergens: allergens.iter().map(|s| s.to_string()).collect(),
            budget_min: min,
            budget_max: max,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn filter(cuisines: &[&str], allergens: &[&str]) -> MenuFilter {
        MenuFilter {
            cuisines: cuisines.iter().map(|s| s.to_string()).collect(),
            allergens_avoid: allergens.iter().map(|s| s.to_string()).collect(),
            budget_min: None,
            budget_max: None,
        }
    }

    #[test]
    fn test_signature_ignores_order() {
        let a = PreferenceSignature::of(&filter(&["Thai", "Japanese"], &["peanut", "shrimp"]));
        let b = PreferenceSignature::of(&filter(&["Japanese", "Thai"], &["shrimp", "peanut"]));
        assert_eq!(a, b);
    }

    #[test]
    fn test_signature_distinguishes_budget() {
        let mut with_budget = filter(&["Thai"], &[]);
        with_budget.budget_max = Some(100.0);
        assert_ne!(
            PreferenceSignature::of(&with_budget),
            PreferenceSignature::of(&filter(&["Thai"], &[]))
        );
    }

    #[test]
    fn test_default_signature_is_distinct() {
        assert_ne!(
            PreferenceSignature::default_profile(),
            PreferenceSignature::of(&MenuFilter::default())
        );
        assert_eq!(
            PreferenceSignature::for_preference(None),
            PreferenceSignature::default_profile()
        );
    }

    #[test]
    fn test_filter_cuisine_and_allergens() {
        let f = filter(&["Thai"], &["peanut"]);
        assert!(f.matches(&item("Thai", &["egg"], None, None)));
        assert!(!f.matches(&item("Thai", &["peanut", "egg"], None, None)));
        assert!(!f.matches(&item("Korean", &[], None, None)));
        assert!(MenuFilter::default().matches(&item("Korean", &["peanut"], None, None)));
    }

    #[test]
    fn test_filter_budget_overlap() {
        let f = MenuFilter {
            budget_min: Some(50.0),
            budget_max: Some(100.0),
            ..Default::default()
        };
        assert!(f.matches(&item("Thai", &[], Some(70.0), Some(120.0))));
        assert!(f.matches(&item("Thai", &[], None, None)));
        assert!(f.matches(&item("Thai", &[], None, Some(50.0))));
        assert!(!f.matches(&item("Thai", &[], Some(120.0), Some(200.0))));
        assert!(!f.matches(&item("Thai", &[], Some(10.0), Some(40.0))));
    }

    #[test]
    fn test_row_conversion_skips_unknown_slots() {
        let row = PreferenceRow {
            user_id: Uuid::new_v4(),
            cuisines: vec![],
            allergens_avoid: vec![],
            budget_min: None,
            budget_max: None,
            excluded_meal_types: vec!["lunch".into(), "brunch".into()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let pref = Preference::from(row);
        assert_eq!(pref.excluded_meal_types, vec![MealType::Lunch]);
        assert!(pref.excludes(MealType::Lunch));
        assert!(!pref.excludes(MealType::Dinner));
    }

    #[test]
    fn test_update_request_distinguishes_null_from_absent() {
        let req: UpdatePreferenceRequest =
            serde_json::from_str(r#"{"budget_min":null,"budget_max":80}"#).unwrap();
        assert_eq!(req.budget_min, Some(None));
        assert_eq!(req.budget_max, Some(Some(80.0)));

        let untouched: UpdatePreferenceRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(untouched.budget_min, None);
        assert_eq!(untouched.budget_max, None);
    }
}
