//! The four collections managed by the console.
//!
//! Paths are the canonical ones. Leave policies use `/leave-policy/` for every
//! verb; work shifts are listed, updated and deleted through
//! `/work-time-view/` but created through `/work-time-policies/`.

use crate::client::Query;
use crate::resource::Resource;
use crate::types::{
    EntityId, Holiday, HolidayDraft, HolidayFilter, LeavePolicy, LeavePolicyDraft, LeaveType,
    LeaveTypeDraft, WorkShift, WorkShiftDraft, DEFAULT_COMMUNITY,
};

/// Public holidays, `/public-holidays/`.
#[derive(Debug, Clone, Copy)]
pub struct Holidays;

impl Resource for Holidays {
    type Entity = Holiday;
    type Draft = HolidayDraft;
    type Filter = HolidayFilter;

    const NAME: &'static str = "holiday";
    const COLLECTION_PATH: &'static str = "/public-holidays/";

    fn id(entity: &Holiday) -> EntityId {
        entity.id
    }

    fn draft_from(entity: &Holiday) -> HolidayDraft {
        HolidayDraft {
            name: entity.name.clone(),
            date: entity.date,
            description: entity.description.clone(),
            status: entity.status,
            leave_type: entity.leave_type.clone(),
            community: Some(entity.community.clone()),
        }
    }

    /// Blank optional fields are dropped and a missing community becomes
    /// `"Other"`.
    fn prepare(mut draft: HolidayDraft) -> HolidayDraft {
        draft.description = draft
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        let community = draft
            .community
            .take()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| DEFAULT_COMMUNITY.to_string());
        draft.community = Some(community);
        draft
    }

    fn query(filter: &HolidayFilter) -> Query {
        let mut query = Query::new();
        if let Some(year) = filter.year {
            query.push(("year".to_string(), year.to_string()));
        }
        if let Some(month) = filter.month {
            query.push(("month".to_string(), month.to_string()));
        }
        query
    }
}

/// Leave types, `/policyleavetype/`.
#[derive(Debug, Clone, Copy)]
pub struct LeaveTypes;

impl Resource for LeaveTypes {
    type Entity = LeaveType;
    type Draft = LeaveTypeDraft;
    type Filter = ();

    const NAME: &'static str = "leave type";
    const COLLECTION_PATH: &'static str = "/policyleavetype/";

    fn id(entity: &LeaveType) -> EntityId {
        entity.id
    }

    fn draft_from(entity: &LeaveType) -> LeaveTypeDraft {
        LeaveTypeDraft {
            name: entity.name.clone(),
            color: entity.color,
        }
    }

    fn prepare(mut draft: LeaveTypeDraft) -> LeaveTypeDraft {
        draft.name = draft.name.trim().to_string();
        draft
    }
}

/// Leave policies, `/leave-policy/`.
#[derive(Debug, Clone, Copy)]
pub struct LeavePolicies;

impl Resource for LeavePolicies {
    type Entity = LeavePolicy;
    type Draft = LeavePolicyDraft;
    type Filter = ();

    const NAME: &'static str = "leave policy";
    const COLLECTION_PATH: &'static str = "/leave-policy/";

    fn id(entity: &LeavePolicy) -> EntityId {
        entity.id
    }

    fn draft_from(entity: &LeavePolicy) -> LeavePolicyDraft {
        LeavePolicyDraft {
            leave_type: entity.leave_type.clone(),
            frequency: entity.frequency,
            amount: entity.amount,
            carry_forward: entity.carry_forward,
            status: entity.status,
        }
    }
}

/// Work shift schedules.
#[derive(Debug, Clone, Copy)]
pub struct WorkShifts;

impl Resource for WorkShifts {
    type Entity = WorkShift;
    type Draft = WorkShiftDraft;
    type Filter = ();

    const NAME: &'static str = "work shift";
    const COLLECTION_PATH: &'static str = "/work-time-view/";
    const CREATE_PATH: &'static str = "/work-time-policies/";

    fn id(entity: &WorkShift) -> EntityId {
        entity.id
    }

    fn draft_from(entity: &WorkShift) -> WorkShiftDraft {
        WorkShiftDraft {
            shift_type: entity.shift_type.clone(),
            start_time: entity.start_time,
            end_time: entity.end_time,
            status: entity.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Status;
    use chrono::NaiveDate;

    fn holiday_draft(community: Option<&str>) -> HolidayDraft {
        HolidayDraft {
            name: "Founders Day".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 9, 12).unwrap(),
            description: Some("  ".to_string()),
            status: Status::Active,
            leave_type: "Public".to_string(),
            community: community.map(str::to_string),
        }
    }

    #[test]
    fn holiday_prepare_defaults_community() {
        let prepared = Holidays::prepare(holiday_draft(None));
        assert_eq!(prepared.community.as_deref(), Some("Other"));
        assert_eq!(prepared.description, None);

        let blank = Holidays::prepare(holiday_draft(Some("   ")));
        assert_eq!(blank.community.as_deref(), Some("Other"));
    }

    #[test]
    fn holiday_prepare_keeps_given_community() {
        let prepared = Holidays::prepare(holiday_draft(Some(" Hindu ")));
        assert_eq!(prepared.community.as_deref(), Some("Hindu"));
    }

    #[test]
    fn holiday_query_skips_missing_parts() {
        assert!(Holidays::query(&HolidayFilter::default()).is_empty());
        assert_eq!(
            Holidays::query(&HolidayFilter::year(2024)),
            vec![("year".to_string(), "2024".to_string())]
        );
    }

    #[test]
    fn draft_from_round_trips_holiday_fields() {
        let holiday = Holiday {
            id: 5,
            name: "Eid".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            description: Some("End of Ramadan".to_string()),
            status: Status::Inactive,
            leave_type: "Religious".to_string(),
            community: "Muslim".to_string(),
        };
        let draft = Holidays::draft_from(&holiday);
        assert_eq!(draft.name, "Eid");
        assert_eq!(draft.community.as_deref(), Some("Muslim"));
        assert_eq!(draft.status, Status::Inactive);
    }

    #[test]
    fn leave_policies_update_in_place() {
        assert_eq!(LeavePolicies::CREATE_PATH, "/leave-policy/");
        assert_eq!(LeavePolicies::item_path(8), "/leave-policy/8/");
    }
}
