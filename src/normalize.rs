//! Canonicalizes records from the legacy upstream API, which capitalizes the
//! leading letter of field names inconsistently per field ("MaxGuests" one
//! response, "maxGuests" the next). Everything downstream of this module
//! assumes one casing and never falls back per call site.

use serde_json::Value;
use uuid::Uuid;

/// Look up `name` in `record`, trying the name as given and then with the
/// leading letter's case flipped. Unknown fields are simply absent.
fn lookup<'a>(record: &'a Value, name: &str) -> Option<&'a Value> {
    let obj = record.as_object()?;
    if let Some(v) = obj.get(name) {
        return Some(v);
    }
    let mut chars = name.chars();
    let first = chars.next()?;
    let flipped: String = if first.is_uppercase() {
        first.to_lowercase().chain(chars).collect()
    } else {
        first.to_uppercase().chain(chars).collect()
    };
    obj.get(&flipped)
}

pub fn str_field(record: &Value, name: &str) -> String {
    lookup(record, name)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

pub fn opt_str_field(record: &Value, name: &str) -> Option<String> {
    lookup(record, name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Numbers sometimes arrive as JSON strings upstream; accept both.
pub fn i64_field(record: &Value, name: &str) -> i64 {
    match lookup(record, name) {
        Some(Value::Number(n)) => n.as_i64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

pub fn f64_field(record: &Value, name: &str) -> Option<f64> {
    match lookup(record, name)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

pub fn bool_field(record: &Value, name: &str, default: bool) -> bool {
    lookup(record, name).and_then(Value::as_bool).unwrap_or(default)
}

pub fn uuid_field(record: &Value, name: &str) -> Option<Uuid> {
    lookup(record, name)
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
}

pub fn string_array_field(record: &Value, name: &str) -> Vec<String> {
    lookup(record, name)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Canonical shape of an upstream tour record.
#[derive(Debug, Clone)]
pub struct NormalizedTour {
    pub id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub max_guests: i32,
    pub duration_days: i32,
    pub status: String,
    pub is_featured: bool,
}

pub fn normalize_tour(raw: &Value) -> NormalizedTour {
    NormalizedTour {
        id: uuid_field(raw, "id"),
        name: str_field(raw, "name"),
        description: opt_str_field(raw, "description"),
        price: i64_field(raw, "price"),
        max_guests: i64_field(raw, "maxGuests") as i32,
        duration_days: i64_field(raw, "durationDays") as i32,
        status: str_field(raw, "status").to_lowercase(),
        is_featured: bool_field(raw, "isFeatured", false),
    }
}

/// Canonical shape of an upstream guide record. An absent active flag means
/// the guide is bookable; the upstream only sends it when deactivating.
#[derive(Debug, Clone)]
pub struct NormalizedGuide {
    pub id: Option<Uuid>,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub languages: Vec<String>,
    pub experience_years: i32,
    pub average_rating: Option<f64>,
    pub is_active: bool,
}

pub fn normalize_guide(raw: &Value) -> NormalizedGuide {
    NormalizedGuide {
        id: uuid_field(raw, "id"),
        full_name: str_field(raw, "fullName"),
        email: str_field(raw, "email"),
        phone: opt_str_field(raw, "phone"),
        languages: string_array_field(raw, "languages"),
        experience_years: i64_field(raw, "experienceYears") as i32,
        average_rating: f64_field(raw, "averageRating"),
        is_active: bool_field(raw, "isActive", true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_either_casing_per_field() {
        let raw = json!({
            "Name": "Mekong Delta",
            "price": "1200000",
            "MaxGuests": 8,
            "durationDays": 2,
            "IsFeatured": true
        });
        let tour = normalize_tour(&raw);
        assert_eq!(tour.name, "Mekong Delta");
        assert_eq!(tour.price, 1_200_000);
        assert_eq!(tour.max_guests, 8);
        assert_eq!(tour.duration_days, 2);
        assert!(tour.is_featured);
    }

    #[test]
    fn absent_fields_default_and_extras_are_ignored() {
        let raw = json!({ "SomethingNew": 42 });
        let tour = normalize_tour(&raw);
        assert_eq!(tour.name, "");
        assert_eq!(tour.price, 0);
        assert_eq!(tour.max_guests, 0);
        assert!(tour.description.is_none());
        assert!(!tour.is_featured);
        assert!(tour.id.is_none());
    }

    #[test]
    fn guide_active_defaults_to_true() {
        let raw = json!({
            "FullName": "Lan Nguyen",
            "Email": "lan@example.com",
            "Languages": ["vi", "en"],
            "experienceYears": 5
        });
        let guide = normalize_guide(&raw);
        assert_eq!(guide.full_name, "Lan Nguyen");
        assert_eq!(guide.languages, vec!["vi", "en"]);
        assert_eq!(guide.experience_years, 5);
        assert!(guide.is_active);
        assert!(guide.average_rating.is_none());
    }

    #[test]
    fn non_object_input_is_total() {
        let tour = normalize_tour(&json!("not an object"));
        assert_eq!(tour.name, "");
        assert_eq!(tour.price, 0);
    }
}
