use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A row of a user's inventory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PantryItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PantryItem {
    pub fn new(user_id: Uuid, name: impl Into<String>, quantity: f64, unit: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: name.into(),
            quantity,
            unit: unit.into(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl fmt::Display for PantryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_empty() {
            write!(f, "{} {}", self.quantity, self.name)
        } else {
            write!(f, "{} {} {}", self.quantity, self.unit, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pantry_item_new() {
        let user = Uuid::new_v4();
        let item = PantryItem::new(user, "rice", 500.0, "g");
        assert_eq!(item.user_id, user);
        assert_eq!(item.name, "rice");
        assert_eq!(item.created_at, item.updated_at);
        assert_eq!(format!("{}", item), "500 g rice");
    }
}
