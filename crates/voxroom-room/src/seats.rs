//! The speaker seat table.
//!
//! Seats are published as one attribute per seat (`seat_<index>`), so an
//! update usually carries only a few of them. Every update is validated
//! as a whole against a candidate table and either applied completely or
//! not at all.

use std::collections::HashSet;

use voxroom_protocol::{
    seat_index, AttributeMap, Codec, JsonCodec, NetworkQuality, SeatModel, SeatStatus,
};

use crate::SeatError;

/// How [`SpeakerSeatRegistry::update_seats`] treats seats missing from
/// the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Missing seats become untaken: the payload is the whole table.
    Set,
    /// Missing seats keep their current value.
    Merge,
}

/// Derived view over the room's seat slots.
///
/// Invariants held after every successful call:
/// - `status == Occupied` exactly when `user_id` is present;
/// - a closed seat has nobody on it;
/// - no user sits on two seats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeakerSeatRegistry {
    seats: Vec<SeatModel>,
}

impl SpeakerSeatRegistry {
    /// An empty table (no room).
    pub fn new() -> Self {
        Self::default()
    }

    /// A table of `seat_num` untaken seats.
    pub fn with_layout(seat_num: u32) -> Self {
        Self {
            seats: (0..seat_num).map(SeatModel::untaken).collect(),
        }
    }

    pub fn seat_num(&self) -> u32 {
        u32::try_from(self.seats.len()).unwrap_or(u32::MAX)
    }

    pub fn seats(&self) -> &[SeatModel] {
        &self.seats
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn seat(&self, index: u32) -> Option<&SeatModel> {
        self.seats.get(index as usize)
    }

    /// The seat `user_id` sits on, if any.
    pub fn seat_of(&self, user_id: &str) -> Option<&SeatModel> {
        self.seats.iter().find(|s| s.is_taken_by(user_id))
    }

    /// Grows or shrinks the table to `seat_num` seats.
    ///
    /// Existing seats below `seat_num` are kept; new ones are untaken.
    /// Returns `true` if the size changed.
    pub fn resize(&mut self, seat_num: u32) -> bool {
        let current = self.seat_num();
        if current == seat_num {
            return false;
        }
        self.seats.truncate(seat_num as usize);
        self.seats.extend((current.min(seat_num)..seat_num).map(SeatModel::untaken));
        true
    }

    /// Applies the seat entries of a raw attribute payload.
    ///
    /// Keys that are not seat keys are ignored. Returns whether the table
    /// changed.
    ///
    /// # Errors
    /// Any malformed seat, out-of-range index, or invariant violation
    /// rejects the whole update; the table is left unchanged.
    pub fn update_seats(
        &mut self,
        attributes: &AttributeMap,
        mode: UpdateMode,
    ) -> Result<bool, SeatError> {
        let seat_num = self.seat_num();
        let incoming = parse_seats(attributes)?;

        let mut candidate = match mode {
            UpdateMode::Set => Self::with_layout(seat_num).seats,
            UpdateMode::Merge => self.seats.clone(),
        };
        for seat in incoming {
            let index = seat.index;
            let slot = candidate
                .get_mut(index as usize)
                .ok_or(SeatError::IndexOutOfRange { index, seat_num })?;
            *slot = carry_local_state(slot, seat);
        }
        validate(&candidate)?;

        let changed = candidate != self.seats;
        self.seats = candidate;
        Ok(changed)
    }

    /// Resets one seat to untaken. Returns `true` if it wasn't already.
    pub fn clear_seat(&mut self, index: u32) -> Result<bool, SeatError> {
        let seat_num = self.seat_num();
        let slot = self
            .seats
            .get_mut(index as usize)
            .ok_or(SeatError::IndexOutOfRange { index, seat_num })?;
        let cleared = SeatModel::untaken(index);
        if *slot == cleared {
            return Ok(false);
        }
        *slot = cleared;
        Ok(true)
    }

    /// Resets the seats named by `keys` to untaken.
    ///
    /// Used when seat attributes are deleted remotely. Non-seat keys are
    /// ignored. Rejected atomically like [`update_seats`](Self::update_seats).
    pub fn clear_seats<'a>(
        &mut self,
        keys: impl IntoIterator<Item = &'a String>,
    ) -> Result<bool, SeatError> {
        let mut candidate = self.clone();
        for key in keys {
            let Some(index) = seat_index(key) else {
                continue;
            };
            candidate.clear_seat(index?)?;
        }
        let changed = candidate != *self;
        *self = candidate;
        Ok(changed)
    }

    /// Records a microphone level for the seat `user_id` sits on.
    ///
    /// `level` is clamped to `0..=100`. Returns `true` if a seat changed.
    pub fn set_sound_level(&mut self, user_id: &str, level: f32) -> bool {
        let level = level.clamp(0.0, 100.0).round() as u8;
        match self.seats.iter_mut().find(|s| s.is_taken_by(user_id)) {
            Some(seat) if seat.sound_level != level => {
                seat.sound_level = level;
                true
            }
            _ => false,
        }
    }

    /// Records the network quality of the seat `user_id` sits on.
    pub fn set_network_quality(&mut self, user_id: &str, quality: NetworkQuality) -> bool {
        match self.seats.iter_mut().find(|s| s.is_taken_by(user_id)) {
            Some(seat) if seat.network_quality != quality => {
                seat.network_quality = quality;
                true
            }
            _ => false,
        }
    }
}

/// Decodes every seat entry in `attributes`, indexed by its key.
fn parse_seats(attributes: &AttributeMap) -> Result<Vec<SeatModel>, SeatError> {
    let mut seats = Vec::new();
    for (key, value) in attributes {
        let Some(index) = seat_index(key) else {
            continue;
        };
        let index = index?;
        let mut seat: SeatModel = JsonCodec.decode(value)?;
        if seat.index != index {
            tracing::debug!(%key, body_index = seat.index, "seat index mismatch, key wins");
            seat.index = index;
        }
        seats.push(seat);
    }
    Ok(seats)
}

/// Keeps the locally-fed fields when the same user stays on the seat.
fn carry_local_state(previous: &SeatModel, mut next: SeatModel) -> SeatModel {
    if next.user_id.is_some() && previous.user_id == next.user_id {
        next.sound_level = previous.sound_level;
        next.network_quality = previous.network_quality;
    }
    next
}

fn validate(seats: &[SeatModel]) -> Result<(), SeatError> {
    let mut seated = HashSet::new();
    for seat in seats {
        let user = seat.user_id.as_deref().filter(|u| !u.is_empty());
        let reason = match (seat.status, user) {
            (SeatStatus::Occupied, None) => Some("occupied seat has no user"),
            (SeatStatus::Untaken, Some(_)) => Some("untaken seat has a user"),
            (SeatStatus::Closed, Some(_)) => Some("closed seat cannot be occupied"),
            _ => None,
        };
        if let Some(reason) = reason {
            return Err(SeatError::Occupancy {
                index: seat.index,
                reason,
            });
        }
        if let Some(user_id) = user {
            if !seated.insert(user_id) {
                return Err(SeatError::DuplicateUser {
                    user_id: user_id.to_string(),
                });
            }
        }
    }
    Ok(())
}
