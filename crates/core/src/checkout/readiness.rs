//! Readiness
//!
//! The checkout readiness predicate. A draft may proceed to payment only when
//! every [`ReadinessCondition`] holds; otherwise [`Readiness`] lists exactly
//! the conditions that failed, in a stable order, so a presentation layer can
//! render guidance for each.

use std::fmt;

use jiff::civil::Date;
use smallvec::SmallVec;

use crate::checkout::draft::{BookingDraft, ServiceType};

/// One of the independent conditions gating payment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReadinessCondition {
    /// A service type was chosen.
    ServiceTypeSelected,

    /// Both a date and a time were chosen.
    ScheduleSelected,

    /// The chosen date is today or later.
    ScheduleNotInPast,

    /// Customer name and phone are filled in.
    ContactProvided,

    /// The home address is complete (at-home bookings only).
    AddressComplete,

    /// The terms were accepted.
    TermsAccepted,

    /// Identity verification succeeded.
    IdentityVerified,
}

impl ReadinessCondition {
    /// Every condition, in evaluation order.
    pub const ALL: [ReadinessCondition; 7] = [
        ReadinessCondition::ServiceTypeSelected,
        ReadinessCondition::ScheduleSelected,
        ReadinessCondition::ScheduleNotInPast,
        ReadinessCondition::ContactProvided,
        ReadinessCondition::AddressComplete,
        ReadinessCondition::TermsAccepted,
        ReadinessCondition::IdentityVerified,
    ];

    /// Stable machine-readable label.
    pub fn label(self) -> &'static str {
        match self {
            ReadinessCondition::ServiceTypeSelected => "service_type",
            ReadinessCondition::ScheduleSelected => "schedule",
            ReadinessCondition::ScheduleNotInPast => "schedule_not_in_past",
            ReadinessCondition::ContactProvided => "contact",
            ReadinessCondition::AddressComplete => "address",
            ReadinessCondition::TermsAccepted => "terms",
            ReadinessCondition::IdentityVerified => "identity",
        }
    }

    /// Guidance shown to the customer when the condition fails.
    pub fn guidance(self) -> &'static str {
        match self {
            ReadinessCondition::ServiceTypeSelected => {
                "Choose whether you want the service at home or at the spa"
            }
            ReadinessCondition::ScheduleSelected => "Select a date and time for your appointment",
            ReadinessCondition::ScheduleNotInPast => "Pick a date from today onwards",
            ReadinessCondition::ContactProvided => "Enter your name and phone number",
            ReadinessCondition::AddressComplete => {
                "Complete your street, area, city and pincode"
            }
            ReadinessCondition::TermsAccepted => "Accept the terms and conditions",
            ReadinessCondition::IdentityVerified => "Verify your identity to continue",
        }
    }

    fn holds(self, draft: &BookingDraft, today: Date) -> bool {
        match self {
            ReadinessCondition::ServiceTypeSelected => draft.service_type.is_some(),
            ReadinessCondition::ScheduleSelected => draft.schedule().is_some(),
            // Only meaningful once a date exists; a missing date already fails
            // `ScheduleSelected`.
            ReadinessCondition::ScheduleNotInPast => draft.date.is_none_or(|date| date >= today),
            ReadinessCondition::ContactProvided => draft.customer.is_complete(),
            ReadinessCondition::AddressComplete => match draft.service_type {
                Some(ServiceType::AtHome) => draft.address.is_complete(),
                Some(ServiceType::VisitSpa) | None => true,
            },
            ReadinessCondition::TermsAccepted => draft.terms_accepted,
            ReadinessCondition::IdentityVerified => draft.identity_verified,
        }
    }
}

impl fmt::Display for ReadinessCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of evaluating the readiness predicate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Readiness {
    failed: SmallVec<[ReadinessCondition; 7]>,
}

impl Readiness {
    /// Evaluate every condition against `draft`, with `today` as the earliest
    /// acceptable appointment date.
    pub fn evaluate(draft: &BookingDraft, today: Date) -> Self {
        let failed = ReadinessCondition::ALL
            .into_iter()
            .filter(|condition| !condition.holds(draft, today))
            .collect();

        Self { failed }
    }

    /// Whether every condition holds.
    pub fn is_ready(&self) -> bool {
        self.failed.is_empty()
    }

    /// Failed conditions in evaluation order.
    pub fn failed(&self) -> &[ReadinessCondition] {
        &self.failed
    }

    /// Whether `condition` failed.
    pub fn has_failed(&self, condition: ReadinessCondition) -> bool {
        self.failed.contains(&condition)
    }

    /// Labels of the failed conditions.
    pub fn labels(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.failed.iter().map(|condition| condition.label())
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ready() {
            return f.write_str("ready");
        }

        let labels: Vec<&str> = self.labels().collect();

        write!(f, "unmet: {}", labels.join(", "))
    }
}
