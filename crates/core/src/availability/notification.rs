//! Inbound change notifications and the domain events re-published for them.

use serde::{Deserialize, Serialize};

use super::Slot;

/// Club fields an upstream `club_updated` notification can report as changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClubField {
    Attributes,
    Openhours,
    LogoUrl,
    BackgroundUrl,
}

/// Court fields an upstream `court_updated` notification can report as changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtField {
    Attributes,
    Name,
}

/// A state change reported by the upstream provider.
///
/// The wire format is tagged by `type`; unknown tags fail to deserialize,
/// which is how the inbound boundary rejects them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ChangeNotification {
    BookingCreated {
        club_id: i64,
        court_id: i64,
        slot: Slot,
    },
    BookingCancelled {
        club_id: i64,
        court_id: i64,
        slot: Slot,
    },
    ClubUpdated {
        club_id: i64,
        fields: Vec<ClubField>,
    },
    CourtUpdated {
        club_id: i64,
        court_id: i64,
        fields: Vec<CourtField>,
    },
}

impl ChangeNotification {
    /// Returns the ID of the club the notification is about.
    pub fn club_id(&self) -> i64 {
        match self {
            ChangeNotification::BookingCreated { club_id, .. }
            | ChangeNotification::BookingCancelled { club_id, .. }
            | ChangeNotification::ClubUpdated { club_id, .. }
            | ChangeNotification::CourtUpdated { club_id, .. } => *club_id,
        }
    }

    /// Returns the ID of the court the notification is about, if any.
    pub fn court_id(&self) -> Option<i64> {
        match self {
            ChangeNotification::BookingCreated { court_id, .. }
            | ChangeNotification::BookingCancelled { court_id, .. }
            | ChangeNotification::CourtUpdated { court_id, .. } => Some(*court_id),
            ChangeNotification::ClubUpdated { .. } => None,
        }
    }

    /// Returns the wire name of the notification type.
    pub fn kind(&self) -> &'static str {
        match self {
            ChangeNotification::BookingCreated { .. } => "booking_created",
            ChangeNotification::BookingCancelled { .. } => "booking_cancelled",
            ChangeNotification::ClubUpdated { .. } => "club_updated",
            ChangeNotification::CourtUpdated { .. } => "court_updated",
        }
    }
}

/// Internal event published after the cache reflects a change notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum DomainEvent {
    SlotBooked {
        club_id: i64,
        court_id: i64,
        slot: Slot,
    },
    SlotAvailable {
        club_id: i64,
        court_id: i64,
        slot: Slot,
    },
    ClubUpdated {
        club_id: i64,
        fields: Vec<ClubField>,
    },
    CourtUpdated {
        club_id: i64,
        court_id: i64,
        fields: Vec<CourtField>,
    },
}

impl From<ChangeNotification> for DomainEvent {
    fn from(notification: ChangeNotification) -> Self {
        match notification {
            ChangeNotification::BookingCreated {
                club_id,
                court_id,
                slot,
            } => DomainEvent::SlotBooked {
                club_id,
                court_id,
                slot,
            },
            ChangeNotification::BookingCancelled {
                club_id,
                court_id,
                slot,
            } => DomainEvent::SlotAvailable {
                club_id,
                court_id,
                slot,
            },
            ChangeNotification::ClubUpdated { club_id, fields } => {
                DomainEvent::ClubUpdated { club_id, fields }
            }
            ChangeNotification::CourtUpdated {
                club_id,
                court_id,
                fields,
            } => DomainEvent::CourtUpdated {
                club_id,
                court_id,
                fields,
            },
        }
    }
}
