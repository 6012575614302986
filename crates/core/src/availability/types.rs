use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A club as returned by the upstream provider.
///
/// Only `id` is interpreted; every other field (name, address, attributes)
/// is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Club {
    pub id: i64,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Club {
    /// Creates a club with no attributes beyond its ID.
    pub fn new(id: i64) -> Self {
        Self {
            id,
            attributes: Map::new(),
        }
    }
}

/// A court as returned by the upstream provider. Belongs to exactly one club.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Court {
    pub id: i64,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Court {
    /// Creates a court with no attributes beyond its ID.
    pub fn new(id: i64) -> Self {
        Self {
            id,
            attributes: Map::new(),
        }
    }
}

/// A bookable time slot of one court on one calendar day.
///
/// Upstream numbers are not guaranteed to be integral, so every numeric
/// field is an `f64`. Fields beyond the known ones are carried through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub price: f64,
    /// Length of the slot in minutes.
    pub duration: f64,
    pub datetime: String,
    pub start: String,
    pub end: String,
    #[serde(rename = "_priority", alias = "priority")]
    pub priority: f64,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// A court together with its available slots for the queried day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourtWithAvailability {
    #[serde(flatten)]
    pub court: Court,
    pub available: Vec<Slot>,
}

impl CourtWithAvailability {
    /// Attaches the slots to a court. An upstream `available` field is
    /// replaced, never emitted next to the composed one.
    pub fn new(mut court: Court, available: Vec<Slot>) -> Self {
        court.attributes.remove("available");
        Self { court, available }
    }
}

/// A club together with its courts and their availability.
///
/// Built fresh for every query and only ever stored in the query cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubWithAvailability {
    #[serde(flatten)]
    pub club: Club,
    pub courts: Vec<CourtWithAvailability>,
}

impl ClubWithAvailability {
    /// Attaches the composed courts to a club. An upstream `courts` field is
    /// replaced, never emitted next to the composed one.
    pub fn new(mut club: Club, courts: Vec<CourtWithAvailability>) -> Self {
        club.attributes.remove("courts");
        Self { club, courts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_club_keeps_unknown_fields() {
        let club: Club = serde_json::from_value(json!({
            "id": 7,
            "name": "Padel Norte",
            "location": {"city": "Montevideo"}
        }))
        .unwrap();

        assert_eq!(club.id, 7);
        assert_eq!(club.attributes["name"], json!("Padel Norte"));
        assert_eq!(
            serde_json::to_value(&club).unwrap(),
            json!({"id": 7, "name": "Padel Norte", "location": {"city": "Montevideo"}})
        );
    }

    #[test]
    fn test_court_without_name() {
        let court: Court = serde_json::from_value(json!({"id": 10})).unwrap();
        assert_eq!(court, Court::new(10));
        assert!(court.attributes.is_empty());
    }

    #[test]
    fn test_slot_uses_upstream_priority_name() {
        let slot: Slot = serde_json::from_value(json!({
            "price": 3000,
            "duration": 90,
            "datetime": "2024-01-01T10:00:00",
            "start": "10:00",
            "end": "11:30",
            "_priority": 2
        }))
        .unwrap();

        assert_eq!(slot.price, 3000.0);
        assert_eq!(slot.priority, 2.0);
        assert_eq!(serde_json::to_value(&slot).unwrap()["_priority"], json!(2.0));
    }

    #[test]
    fn test_slot_accepts_fractional_numbers_and_keeps_extra_fields() {
        let slot: Slot = serde_json::from_value(json!({
            "price": 3000,
            "duration": 82.5,
            "datetime": "2024-01-01T10:00:00",
            "start": "10:00",
            "end": "11:22",
            "_priority": 0.5,
            "covered": true
        }))
        .unwrap();

        assert_eq!(slot.duration, 82.5);
        assert_eq!(slot.priority, 0.5);
        assert_eq!(serde_json::to_value(&slot).unwrap()["covered"], json!(true));
    }

    #[test]
    fn test_composed_shape() {
        let slot: Slot = serde_json::from_value(json!({
            "price": 10.5,
            "duration": 60,
            "datetime": "2024-01-01T10:00:00",
            "start": "10:00",
            "end": "11:00",
            "_priority": 0
        }))
        .unwrap();
        let composed = ClubWithAvailability::new(
            Club::new(1),
            vec![CourtWithAvailability::new(Court::new(10), vec![slot])],
        );

        let value = serde_json::to_value(&composed).unwrap();
        assert_eq!(value["id"], json!(1));
        assert_eq!(value["courts"][0]["id"], json!(10));
        assert_eq!(value["courts"][0]["available"][0]["start"], json!("10:00"));
    }

    #[test]
    fn test_composed_fields_replace_upstream_ones() {
        let club: Club =
            serde_json::from_value(json!({"id": 1, "courts": [{"id": 99}], "name": "A"})).unwrap();
        let court: Court =
            serde_json::from_value(json!({"id": 10, "available": "unknown"})).unwrap();

        let composed = ClubWithAvailability::new(
            club,
            vec![CourtWithAvailability::new(court, Vec::new())],
        );

        let bytes = serde_json::to_vec(&composed).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert_eq!(text.matches("\"courts\"").count(), 1);
        assert_eq!(text.matches("\"available\"").count(), 1);

        let decoded: ClubWithAvailability = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, composed);
        assert_eq!(decoded.courts[0].court.id, 10);
        assert_eq!(decoded.club.attributes["name"], json!("A"));
    }
}
