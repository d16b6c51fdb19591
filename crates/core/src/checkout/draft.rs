//! Booking Draft

use std::{fmt, str::FromStr};

use jiff::civil::{self, Date, Time};
use serde::{Deserialize, Serialize};

/// Where the service is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    /// At the customer's address
    AtHome,

    /// At the provider's premises
    VisitSpa,
}

impl ServiceType {
    /// Wire label (`at_home`, `visit_spa`).
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceType::AtHome => "at_home",
            ServiceType::VisitSpa => "visit_spa",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised service type label
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown service type: {0}")]
pub struct UnknownServiceType(pub String);

impl FromStr for ServiceType {
    type Err = UnknownServiceType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "at_home" | "at-home" => Ok(ServiceType::AtHome),
            "visit_spa" | "visit-spa" => Ok(ServiceType::VisitSpa),
            other => Err(UnknownServiceType(other.to_string())),
        }
    }
}

/// Appointment date and time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Date
    pub date: Date,

    /// Start time
    pub time: Time,
}

/// Customer contact details
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    /// Full name
    pub name: String,

    /// Phone number
    pub phone: String,
}

impl CustomerInfo {
    /// Whether both name and phone are filled in.
    pub fn is_complete(&self) -> bool {
        is_filled(&self.name) && is_filled(&self.phone)
    }
}

/// Customer address for at-home services
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeAddress {
    /// House number and street
    pub street: String,

    /// Area or locality
    pub area: String,

    /// Optional landmark, never required
    pub landmark: Option<String>,

    /// City
    pub city: String,

    /// Postal code
    pub pincode: String,
}

impl HomeAddress {
    /// Whether street, area, city and pincode are all filled in.
    pub fn is_complete(&self) -> bool {
        [&self.street, &self.area, &self.city, &self.pincode]
            .into_iter()
            .all(|field| is_filled(field))
    }
}

/// Mutable pre-submission checkout state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingDraft {
    /// Selected service type
    pub service_type: Option<ServiceType>,

    /// Selected date
    pub date: Option<Date>,

    /// Selected start time
    pub time: Option<Time>,

    /// Contact details
    pub customer: CustomerInfo,

    /// Home address, only consulted for [`ServiceType::AtHome`]
    pub address: HomeAddress,

    /// Whether the terms and conditions were accepted
    pub terms_accepted: bool,

    /// Result of the external identity verification
    pub identity_verified: bool,
}

impl BookingDraft {
    /// Selected schedule, when both date and time are present.
    pub fn schedule(&self) -> Option<Schedule> {
        Some(Schedule {
            date: self.date?,
            time: self.time?,
        })
    }
}

/// Bookable start times offered to customers: 09:00 to 12:30 and 14:00 to
/// 18:30, every 30 minutes.
pub fn time_slots() -> impl Iterator<Item = Time> {
    [9_i8, 10, 11, 12, 14, 15, 16, 17, 18]
        .into_iter()
        .flat_map(|hour| [civil::time(hour, 0, 0, 0), civil::time(hour, 30, 0, 0)])
}

fn is_filled(value: &str) -> bool {
    !value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use jiff::civil::date;

    use super::*;

    #[test]
    fn schedule_requires_date_and_time() {
        let mut draft = BookingDraft {
            date: Some(date(2026, 10, 20)),
            ..BookingDraft::default()
        };

        assert!(draft.schedule().is_none());

        draft.time = Some(civil::time(9, 30, 0, 0));

        assert_eq!(
            draft.schedule(),
            Some(Schedule {
                date: date(2026, 10, 20),
                time: civil::time(9, 30, 0, 0),
            })
        );
    }

    #[test]
    fn blank_fields_do_not_count_as_filled() {
        let customer = CustomerInfo {
            name: "   ".to_string(),
            phone: "+91 98765 43210".to_string(),
        };

        assert!(!customer.is_complete());
    }

    #[test]
    fn landmark_is_optional() {
        let address = HomeAddress {
            street: "14 Residency Road".to_string(),
            area: "Ashok Nagar".to_string(),
            landmark: None,
            city: "Bengaluru".to_string(),
            pincode: "560025".to_string(),
        };

        assert!(address.is_complete());
    }

    #[test]
    fn any_missing_address_field_is_incomplete() {
        let complete = HomeAddress {
            street: "14 Residency Road".to_string(),
            area: "Ashok Nagar".to_string(),
            landmark: Some("Opposite the park".to_string()),
            city: "Bengaluru".to_string(),
            pincode: "560025".to_string(),
        };

        let variants = [
            HomeAddress {
                street: String::new(),
                ..complete.clone()
            },
            HomeAddress {
                area: String::new(),
                ..complete.clone()
            },
            HomeAddress {
                city: String::new(),
                ..complete.clone()
            },
            HomeAddress {
                pincode: String::new(),
                ..complete.clone()
            },
        ];

        for address in variants {
            assert!(!address.is_complete(), "{address:?} should be incomplete");
        }
    }

    #[test]
    fn service_type_parses_wire_labels() {
        assert_eq!("at_home".parse(), Ok(ServiceType::AtHome));
        assert_eq!("visit-spa".parse(), Ok(ServiceType::VisitSpa));
        assert!("delivery".parse::<ServiceType>().is_err());
        assert_eq!(ServiceType::VisitSpa.to_string(), "visit_spa");
    }

    #[test]
    fn time_slots_cover_morning_and_afternoon() {
        let slots: Vec<Time> = time_slots().collect();

        assert_eq!(slots.len(), 18);
        assert_eq!(slots.first(), Some(&civil::time(9, 0, 0, 0)));
        assert_eq!(slots.last(), Some(&civil::time(18, 30, 0, 0)));
        assert!(!slots.contains(&civil::time(13, 0, 0, 0)));
    }
}
