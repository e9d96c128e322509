//! Recurrence kinds and delivery progress states.
//!
//! Variant discriminants match the seed data order (1-based) in the
//! `recurrences` and `delivery_progress` lookup tables. These live in `core`
//! (zero internal deps) because the eligibility evaluator branches on them;
//! the `db` crate maps SMALLINT columns through [`Recurrence::from_id`] and
//! [`DeliveryProgress::from_id`].

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

// ---------------------------------------------------------------------------
// Recurrence
// ---------------------------------------------------------------------------

/// How often a notification definition fires.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recurrence {
    /// Fires at most once, on the first eligible date inside the range.
    Single = 1,
    /// Fires once per calendar day inside the range.
    Daily = 2,
    /// Fires once per week, on a fixed ISO weekday inside the range.
    Weekly = 3,
}

impl Recurrence {
    /// Every kind, in the fixed order a dispatch cycle processes them.
    pub const CYCLE_ORDER: [Recurrence; 3] =
        [Recurrence::Single, Recurrence::Daily, Recurrence::Weekly];

    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Map a SMALLINT column back to the enum. `None` for unseeded IDs.
    pub fn from_id(id: StatusId) -> Option<Self> {
        match id {
            1 => Some(Recurrence::Single),
            2 => Some(Recurrence::Daily),
            3 => Some(Recurrence::Weekly),
            _ => None,
        }
    }

    /// Lowercase name for log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Recurrence::Single => "single",
            Recurrence::Daily => "daily",
            Recurrence::Weekly => "weekly",
        }
    }
}

impl From<Recurrence> for StatusId {
    fn from(value: Recurrence) -> Self {
        value as StatusId
    }
}

// ---------------------------------------------------------------------------
// Delivery progress
// ---------------------------------------------------------------------------

/// Last known dispatch outcome for a notification definition.
///
/// `Pending` and `Active` are written by the management surface (created /
/// armed for dispatch); the engine only ever records `Success` or `Error`
/// after a transport attempt.
#[repr(i16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryProgress {
    Pending = 1,
    Active = 2,
    Success = 3,
    Error = 4,
}

impl DeliveryProgress {
    /// Return the database status ID.
    pub fn id(self) -> StatusId {
        self as StatusId
    }

    /// Map a SMALLINT column back to the enum. `None` for unseeded IDs.
    pub fn from_id(id: StatusId) -> Option<Self> {
        match id {
            1 => Some(DeliveryProgress::Pending),
            2 => Some(DeliveryProgress::Active),
            3 => Some(DeliveryProgress::Success),
            4 => Some(DeliveryProgress::Error),
            _ => None,
        }
    }
}

impl From<DeliveryProgress> for StatusId {
    fn from(value: DeliveryProgress) -> Self {
        value as StatusId
    }
}
