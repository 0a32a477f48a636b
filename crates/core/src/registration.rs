//! Registration preconditions: participant eligibility and event capacity.

use crate::error::CoreError;

/// Payment is awaiting admin review.
pub const PAYMENT_PENDING: &str = "pending";

/// Payment was verified by an admin.
pub const PAYMENT_APPROVED: &str = "approved";

/// Payment was refused.
pub const PAYMENT_REJECTED: &str = "rejected";

/// Snapshot of the participant fields that decide eligibility.
#[derive(Debug, Clone, Copy)]
pub struct Eligibility<'a> {
    pub email: &'a str,
    pub is_approved: bool,
    pub payment_status: &'a str,
}

/// Whether `email` belongs to the institution's own mail domain.
///
/// Matches the domain itself and any subdomain of it, case-insensitively.
pub fn is_institution_email(email: &str, institution_domain: &str) -> bool {
    let domain = institution_domain.trim().trim_start_matches('@').to_ascii_lowercase();
    if domain.is_empty() {
        return false;
    }
    let Some((_, host)) = email.trim().rsplit_once('@') else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    host == domain || host.ends_with(&format!(".{domain}"))
}

/// Check that a participant may register for events.
///
/// Requires an approved account and an approved payment. The rejection
/// message depends on whether the participant signed up with an
/// institution address, since those pay through the institution's own
/// billing flow rather than the admin approval queue.
pub fn check_eligibility(
    participant: &Eligibility<'_>,
    institution_domain: &str,
) -> Result<(), CoreError> {
    if participant.is_approved && participant.payment_status == PAYMENT_APPROVED {
        return Ok(());
    }

    let message = if is_institution_email(participant.email, institution_domain) {
        "Please complete your event fee payment through your institution's billing portal \
         before registering for events"
    } else {
        "Your payment approval is pending. You can register for events once an admin \
         has approved it"
    };
    Err(CoreError::NotEligible(message.to_string()))
}

/// Check that an event still has a free place.
pub fn check_capacity(roster_size: i64, cap: i32) -> Result<(), CoreError> {
    if roster_size < i64::from(cap) {
        Ok(())
    } else {
        Err(CoreError::CapacityExceeded { cap })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const DOMAIN: &str = "college.edu";

    fn participant<'a>(email: &'a str, approved: bool, payment: &'a str) -> Eligibility<'a> {
        Eligibility {
            email,
            is_approved: approved,
            payment_status: payment,
        }
    }

    #[test]
    fn approved_account_with_approved_payment_is_eligible() {
        let p = participant("a@gmail.com", true, PAYMENT_APPROVED);
        assert!(check_eligibility(&p, DOMAIN).is_ok());
    }

    #[test]
    fn pending_payment_for_external_email_mentions_approval() {
        let p = participant("a@gmail.com", true, PAYMENT_PENDING);
        let err = check_eligibility(&p, DOMAIN).unwrap_err();
        assert_matches!(&err, CoreError::NotEligible(msg) if msg.contains("approval is pending"));
    }

    #[test]
    fn pending_payment_for_institution_email_mentions_billing_portal() {
        let p = participant("a@cs.college.edu", true, PAYMENT_PENDING);
        let err = check_eligibility(&p, DOMAIN).unwrap_err();
        assert_matches!(&err, CoreError::NotEligible(msg) if msg.contains("billing portal"));
    }

    #[test]
    fn unapproved_account_is_not_eligible_even_if_paid() {
        let p = participant("a@gmail.com", false, PAYMENT_APPROVED);
        assert_matches!(check_eligibility(&p, DOMAIN), Err(CoreError::NotEligible(_)));
    }

    #[test]
    fn rejected_payment_is_not_eligible() {
        let p = participant("a@gmail.com", true, PAYMENT_REJECTED);
        assert_matches!(check_eligibility(&p, DOMAIN), Err(CoreError::NotEligible(_)));
    }

    #[test]
    fn institution_email_matching() {
        assert!(is_institution_email("x@college.edu", DOMAIN));
        assert!(is_institution_email("x@MAIL.College.EDU", DOMAIN));
        assert!(is_institution_email("x@college.edu", "@college.edu"));
        assert!(!is_institution_email("x@notcollege.edu", DOMAIN));
        assert!(!is_institution_email("not-an-email", DOMAIN));
        assert!(!is_institution_email("x@college.edu", ""));
    }

    #[test]
    fn capacity_allows_until_cap_reached() {
        assert!(check_capacity(0, 1).is_ok());
        assert!(check_capacity(99, 100).is_ok());
        assert_matches!(check_capacity(1, 1), Err(CoreError::CapacityExceeded { cap: 1 }));
        assert_matches!(check_capacity(5, 2), Err(CoreError::CapacityExceeded { cap: 2 }));
    }
}
