use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::menu::{MealType, MenuItem};

/// Stored record, one per (user_id, date).
#[derive(Debug, Clone, FromRow)]
pub struct DailySuggestionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub breakfast_menu_id: Option<Uuid>,
    pub lunch_menu_id: Option<Uuid>,
    pub dinner_menu_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DailySuggestionRow {
    pub fn menu_id(&self, slot: MealType) -> Option<Uuid> {
        match slot {
            MealType::Breakfast => self.breakfast_menu_id,
            MealType::Lunch => self.lunch_menu_id,
            MealType::Dinner => self.dinner_menu_id,
        }
    }
}

/// A day's suggestions with the chosen menu items expanded.
/// `date` serialises as `YYYY-MM-DD`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailySuggestion {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub breakfast: Option<MenuItem>,
    pub lunch: Option<MenuItem>,
    pub dinner: Option<MenuItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DailySuggestion {
    pub fn slot(&self, slot: MealType) -> Option<&MenuItem> {
        match slot {
            MealType::Breakfast => self.breakfast.as_ref(),
            MealType::Lunch => self.lunch.as_ref(),
            MealType::Dinner => self.dinner.as_ref(),
        }
    }

    pub fn slot_id(&self, slot: MealType) -> Option<Uuid> {
        self.slot(slot).map(|m| m.id)
    }
}

/// Slot assignments for an upsert.
///
/// Outer `None` leaves the stored value untouched; `Some(None)` clears the slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SuggestionPatch {
    pub breakfast: Option<Option<Uuid>>,
    pub lunch: Option<Option<Uuid>>,
    pub dinner: Option<Option<Uuid>>,
}

impl SuggestionPatch {
    /// Overwrites all three slots.
    pub fn all(breakfast: Option<Uuid>, lunch: Option<Uuid>, dinner: Option<Uuid>) -> Self {
        Self {
            breakfast: Some(breakfast),
            lunch: Some(lunch),
            dinner: Some(dinner),
        }
    }

    /// Touches a single slot only.
    pub fn only(slot: MealType, menu_id: Option<Uuid>) -> Self {
        let mut patch = Self::default();
        *patch.field_mut(slot) = Some(menu_id);
        patch
    }

    pub fn get(&self, slot: MealType) -> Option<Option<Uuid>> {
        match slot {
            MealType::Breakfast => self.breakfast,
            MealType::Lunch => self.lunch,
            MealType::Dinner => self.dinner,
        }
    }

    fn field_mut(&mut self, slot: MealType) -> &mut Option<Option<Uuid>> {
        match slot {
            MealType::Breakfast => &mut self.breakfast,
            MealType::Lunch => &mut self.lunch,
            MealType::Dinner => &mut self.dinner,
        }
    }
}

/// Body for POST /suggestions/reroll.
#[derive(Debug, Deserialize)]
pub struct RerollRequest {
    pub meal_type: MealType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patch_only_touches_one_slot() {
        let id = Uuid::new_v4();
        let patch = SuggestionPatch::only(MealType::Lunch, Some(id));
        assert_eq!(patch.get(MealType::Lunch), Some(Some(id)));
        assert_eq!(patch.get(MealType::Breakfast), None);
        assert_eq!(patch.get(MealType::Dinner), None);
    }

    #[test]
    fn test_patch_all_can_clear() {
        let patch = SuggestionPatch::all(None, None, None);
        for slot in MealType::ALL {
            assert_eq!(patch.get(slot), Some(None));
        }
    }

    #[test]
    fn test_reroll_request_rejects_unknown_slot() {
        assert!(serde_json::from_str::<RerollRequest>(r#"{"meal_type":"snack"}"#).is_err());
        let ok: RerollRequest = serde_json::from_str(r#"{"meal_type":"dinner"}"#).unwrap();
        assert_eq!(ok.meal_type, MealType::Dinner);
    }
}
