use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Participant is already registered for this event")]
    AlreadyRegistered,

    #[error("Participant is not registered for this event")]
    NotRegistered,

    #[error("Event is full: all {cap} places are taken")]
    CapacityExceeded { cap: i32 },

    #[error(
        "Schedule conflict with '{title}' on {date} ({start_time}-{end_time})"
    )]
    ScheduleConflict {
        title: String,
        date: String,
        start_time: String,
        end_time: String,
    },

    #[error("{0}")]
    NotEligible(String),

    #[error("Attendance has already been submitted for this event, date and session")]
    AlreadySubmitted,

    #[error("Attendance date is required")]
    MissingDate,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_conflict_message_names_the_colliding_event() {
        let err = CoreError::ScheduleConflict {
            title: "Hackathon".into(),
            date: "2025-01-01".into(),
            start_time: "10:00".into(),
            end_time: "11:00".into(),
        };
        assert_eq!(
            err.to_string(),
            "Schedule conflict with 'Hackathon' on 2025-01-01 (10:00-11:00)"
        );
    }

    #[test]
    fn not_eligible_message_is_passed_through() {
        let err = CoreError::NotEligible("Payment approval pending".into());
        assert_eq!(err.to_string(), "Payment approval pending");
    }
}
