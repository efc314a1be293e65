//! Entity schemas exchanged with the HR backend.
//!
//! # Design
//! Each managed entity has a record type (what the server returns, `id`
//! included) and a draft type (what a form submits). Drafts are explicit
//! structs rather than free-form maps, so a misspelled field is a compile
//! error instead of a silently ignored key.
//!
//! The backend is lenient about casing and number formats, so the readers
//! here are too: statuses accept `Active` as well as `active`, decimals may
//! arrive as JSON strings, and times may carry seconds.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};

/// Server-assigned identifier shared by every entity.
pub type EntityId = u64;

/// Community used when a holiday form leaves the field empty.
pub const DEFAULT_COMMUNITY: &str = "Other";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    #[serde(alias = "Active", alias = "ACTIVE")]
    Active,
    #[serde(alias = "Inactive", alias = "INACTIVE")]
    Inactive,
}

/// A public holiday as stored by the backend.
///
/// `leave_type` names a `LeaveType` by its label, not its id; renaming or
/// deleting the leave type leaves the reference dangling. On the wire the
/// field is `type`; a `leave_type` key is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holiday {
    pub id: EntityId,
    pub name: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(rename = "type", default)]
    pub leave_type: String,
    #[serde(default = "default_community")]
    pub community: String,
}

/// Holiday form payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayDraft {
    pub name: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(rename = "type")]
    pub leave_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community: Option<String>,
}

/// Optional year/month narrowing for the holiday list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HolidayFilter {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl HolidayFilter {
    pub fn year(year: i32) -> Self {
        Self {
            year: Some(year),
            month: None,
        }
    }

    pub fn month(year: i32, month: u32) -> Self {
        Self {
            year: Some(year),
            month: Some(month),
        }
    }
}

fn default_community() -> String {
    DEFAULT_COMMUNITY.to_string()
}

/// Display colour of a leave type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaveColor {
    Red,
    Orange,
    Yellow,
    Green,
    Teal,
    #[default]
    Blue,
    Indigo,
    Purple,
    Pink,
    #[serde(alias = "grey")]
    Gray,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveType {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub color: LeaveColor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveTypeDraft {
    pub name: String,
    #[serde(default)]
    pub color: LeaveColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarryForward {
    #[serde(alias = "Yes", alias = "YES")]
    Yes,
    #[default]
    #[serde(alias = "No", alias = "NO")]
    No,
}

/// Leave entitlement rule.
///
/// `leave_type` is free text, duplicated from the leave type label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeavePolicy {
    pub id: EntityId,
    pub leave_type: String,
    #[serde(deserialize_with = "number_or_string")]
    pub frequency: u32,
    #[serde(deserialize_with = "number_or_string")]
    pub amount: f64,
    #[serde(default)]
    pub carry_forward: CarryForward,
    #[serde(default)]
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeavePolicyDraft {
    pub leave_type: String,
    #[serde(deserialize_with = "number_or_string")]
    pub frequency: u32,
    #[serde(deserialize_with = "number_or_string")]
    pub amount: f64,
    #[serde(default)]
    pub carry_forward: CarryForward,
    #[serde(default)]
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkShift {
    pub id: EntityId,
    pub shift_type: String,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub status: Status,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkShiftDraft {
    pub shift_type: String,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    #[serde(default)]
    pub status: Status,
}

/// Body of `POST /reset-password/`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordReset {
    pub uid: String,
    pub token: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl fmt::Debug for PasswordReset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordReset")
            .field("uid", &self.uid)
            .finish_non_exhaustive()
    }
}

/// Accept `1.5` as well as `"1.5"`.
fn number_or_string<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: fmt::Display,
{
    use serde::de;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString<T> {
        Number(T),
        String(String),
    }

    match NumberOrString::<T>::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse::<T>().map_err(de::Error::custom),
    }
}

/// Time of day written as `HH:MM`, read as `HH:MM` or `HH:MM:SS`.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map_err(|_| de::Error::custom(format!("invalid time of day: {raw:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn holiday_reads_type_field_and_defaults_community() {
        let holiday: Holiday = serde_json::from_value(json!({
            "id": 3,
            "name": "Labour Day",
            "date": "2025-05-01",
            "status": "Active",
            "type": "Public"
        }))
        .unwrap();
        assert_eq!(holiday.leave_type, "Public");
        assert_eq!(holiday.community, "Other");
        assert_eq!(holiday.status, Status::Active);
        assert_eq!(holiday.description, None);
    }

    #[test]
    fn holiday_with_both_type_keys_reads_type() {
        let holiday: Holiday = serde_json::from_value(json!({
            "id": 4,
            "name": "New Year",
            "date": "2025-01-01",
            "type": "Public",
            "leave_type": "Legacy"
        }))
        .unwrap();
        assert_eq!(holiday.leave_type, "Public");
    }

    #[test]
    fn holiday_draft_writes_type_and_lowercase_status() {
        let draft = HolidayDraft {
            name: "New Year".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            description: None,
            status: Status::Inactive,
            leave_type: "Public".to_string(),
            community: None,
        };
        let value = serde_json::to_value(&draft).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "New Year",
                "date": "2025-01-01",
                "status": "inactive",
                "type": "Public"
            })
        );
    }

    #[test]
    fn leave_policy_accepts_decimal_strings() {
        let policy: LeavePolicy = serde_json::from_value(json!({
            "id": 1,
            "leave_type": "Annual",
            "frequency": "12",
            "amount": "1.50",
            "carry_forward": "Yes",
            "status": "active"
        }))
        .unwrap();
        assert_eq!(policy.frequency, 12);
        assert_eq!(policy.amount, 1.5);
        assert_eq!(policy.carry_forward, CarryForward::Yes);

        let numeric: LeavePolicy = serde_json::from_value(json!({
            "id": 2,
            "leave_type": "Sick",
            "frequency": 1,
            "amount": 0.5
        }))
        .unwrap();
        assert_eq!(numeric.amount, 0.5);
        assert_eq!(numeric.carry_forward, CarryForward::No);
    }

    #[test]
    fn leave_policy_rejects_garbage_amount() {
        let result: Result<LeavePolicy, _> = serde_json::from_value(json!({
            "id": 1,
            "leave_type": "Annual",
            "frequency": 1,
            "amount": "lots"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn work_shift_times_round_to_minutes() {
        let shift: WorkShift = serde_json::from_value(json!({
            "id": 9,
            "shift_type": "Morning",
            "start_time": "09:00:00",
            "end_time": "17:30",
            "status": "active"
        }))
        .unwrap();
        assert_eq!(shift.start_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());

        let value = serde_json::to_value(&shift).unwrap();
        assert_eq!(value["start_time"], "09:00");
        assert_eq!(value["end_time"], "17:30");
    }

    #[test]
    fn work_shift_rejects_bad_time() {
        let result: Result<WorkShiftDraft, _> = serde_json::from_value(json!({
            "shift_type": "Night",
            "start_time": "25:00",
            "end_time": "06:00"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn unknown_colour_is_rejected_and_grey_accepted() {
        let grey: LeaveTypeDraft =
            serde_json::from_value(json!({"name": "Unpaid", "color": "grey"})).unwrap();
        assert_eq!(grey.color, LeaveColor::Gray);
        assert_eq!(serde_json::to_value(grey.color).unwrap(), "gray");

        let bad: Result<LeaveTypeDraft, _> =
            serde_json::from_value(json!({"name": "Unpaid", "color": "chartreuse"}));
        assert!(bad.is_err());
    }

    #[test]
    fn password_reset_debug_hides_secrets() {
        let reset = PasswordReset {
            uid: "MQ".to_string(),
            token: "secret-token".to_string(),
            new_password: "hunter22".to_string(),
            confirm_password: "hunter22".to_string(),
        };
        let debug = format!("{reset:?}");
        assert!(debug.contains("MQ"));
        assert!(!debug.contains("hunter22"));
        assert!(!debug.contains("secret-token"));
    }
}
