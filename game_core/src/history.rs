//! Bounded history of recent simulation frames
//!
//! A fixed-capacity ring of [`SimulationState`]s addressed by physical slot but
//! looked up by logical frame id. Stored frames are always contiguous in
//! frame id; appending to a full history evicts the oldest frame.

use crate::{FrameId, HistoryError, SimulationState};

/// Physical position of a frame inside the history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot(usize);

impl Slot {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct FrameHistory {
    slots: Box<[SimulationState]>,
    /// Slot holding the oldest retained frame
    oldest: usize,
    /// Slot the next append writes to
    next: usize,
    /// Disambiguates `oldest == next` between empty and full
    empty: bool,
}

impl FrameHistory {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history capacity must be greater than 0");
        Self {
            slots: vec![SimulationState::default(); capacity].into_boxed_slice(),
            oldest: 0,
            next: 0,
            empty: true,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn is_full(&self) -> bool {
        !self.empty && self.oldest == self.next
    }

    pub fn len(&self) -> usize {
        if self.empty {
            0
        } else if self.oldest < self.next {
            self.next - self.oldest
        } else {
            self.capacity() - self.oldest + self.next
        }
    }

    /// Drop every frame
    pub fn clear(&mut self) {
        self.oldest = 0;
        self.next = 0;
        self.empty = true;
    }

    /// Drop every frame and keep `state` as the only one, frame id included
    pub fn reset_with(&mut self, state: SimulationState) {
        self.clear();
        *self.append() = state;
    }

    /// Add a frame one after the newest (frame 0 when empty), evicting the
    /// oldest frame if the history is full. Only `frame_id` is filled in.
    pub fn append(&mut self) -> &mut SimulationState {
        let frame_id = if self.empty {
            0
        } else {
            self.slots[self.latest_index()].frame_id.wrapping_add(1)
        };
        let evict = self.is_full();
        let index = self.next;
        self.next = self.advance(self.next);
        if evict {
            self.oldest = self.advance(self.oldest);
        }
        self.empty = false;

        let slot = &mut self.slots[index];
        *slot = SimulationState {
            frame_id,
            ..SimulationState::default()
        };
        slot
    }

    /// Append a full copy of the newest frame with the next frame id
    pub fn duplicate_latest(&mut self) -> Result<&mut SimulationState, HistoryError> {
        let latest = *self.latest()?;
        let slot = self.append();
        *slot = SimulationState {
            frame_id: latest.frame_id.wrapping_add(1),
            ..latest
        };
        Ok(slot)
    }

    pub fn latest(&self) -> Result<&SimulationState, HistoryError> {
        self.latest_slot().map(|slot| self.get(slot))
    }

    pub fn latest_mut(&mut self) -> Result<&mut SimulationState, HistoryError> {
        let slot = self.latest_slot()?;
        Ok(self.get_mut(slot))
    }

    pub fn oldest(&self) -> Result<&SimulationState, HistoryError> {
        self.oldest_slot().map(|slot| self.get(slot))
    }

    pub fn latest_slot(&self) -> Result<Slot, HistoryError> {
        if self.empty {
            Err(HistoryError::Empty)
        } else {
            Ok(Slot(self.latest_index()))
        }
    }

    pub fn oldest_slot(&self) -> Result<Slot, HistoryError> {
        if self.empty {
            Err(HistoryError::Empty)
        } else {
            Ok(Slot(self.oldest))
        }
    }

    /// Retained frame ids as `(oldest, latest)`
    pub fn frame_range(&self) -> Option<(FrameId, FrameId)> {
        if self.empty {
            return None;
        }
        Some((
            self.slots[self.oldest].frame_id,
            self.slots[self.latest_index()].frame_id,
        ))
    }

    /// Find the slot holding `frame_id`, scanning from oldest to newest
    pub fn position(&self, frame_id: FrameId) -> Result<Slot, HistoryError> {
        let (oldest, latest) = self.frame_range().ok_or(HistoryError::Empty)?;
        let mut cursor = Some(Slot(self.oldest));
        while let Some(slot) = cursor {
            if self.slots[slot.0].frame_id == frame_id {
                return Ok(slot);
            }
            cursor = self.next(slot);
        }
        Err(HistoryError::FrameNotFound {
            frame: frame_id,
            oldest,
            latest,
        })
    }

    pub fn lookup(&self, frame_id: FrameId) -> Result<&SimulationState, HistoryError> {
        self.position(frame_id).map(|slot| self.get(slot))
    }

    pub fn lookup_mut(&mut self, frame_id: FrameId) -> Result<&mut SimulationState, HistoryError> {
        let slot = self.position(frame_id)?;
        Ok(self.get_mut(slot))
    }

    pub fn get(&self, slot: Slot) -> &SimulationState {
        &self.slots[slot.0]
    }

    pub fn get_mut(&mut self, slot: Slot) -> &mut SimulationState {
        &mut self.slots[slot.0]
    }

    /// Slot after `slot`, or `None` past the newest frame
    pub fn next(&self, slot: Slot) -> Option<Slot> {
        if self.empty || slot.0 == self.latest_index() || slot.0 >= self.capacity() {
            None
        } else {
            Some(Slot(self.advance(slot.0)))
        }
    }

    /// Slot before `slot`, or `None` before the oldest frame
    pub fn previous(&self, slot: Slot) -> Option<Slot> {
        if self.empty || slot.0 == self.oldest || slot.0 >= self.capacity() {
            None
        } else if slot.0 == 0 {
            Some(Slot(self.capacity() - 1))
        } else {
            Some(Slot(slot.0 - 1))
        }
    }

    /// Retained frames from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &SimulationState> + '_ {
        let start = if self.empty { None } else { Some(Slot(self.oldest)) };
        std::iter::successors(start, move |slot| self.next(*slot)).map(move |slot| self.get(slot))
    }

    fn latest_index(&self) -> usize {
        if self.next == 0 {
            self.capacity() - 1
        } else {
            self.next - 1
        }
    }

    fn advance(&self, index: usize) -> usize {
        (index + 1) % self.capacity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_history_is_empty() {
        let history = FrameHistory::new(4);
        assert!(history.is_empty());
        assert!(!history.is_full());
        assert_eq!(history.len(), 0);
        assert_eq!(history.latest(), Err(HistoryError::Empty));
        assert_eq!(history.frame_range(), None);
    }

    #[test]
    fn test_append_assigns_consecutive_frame_ids() {
        let mut history = FrameHistory::new(4);
        assert_eq!(history.append().frame_id, 0);
        assert_eq!(history.append().frame_id, 1);
        assert_eq!(history.append().frame_id, 2);
        assert_eq!(history.len(), 3);
        assert_eq!(history.frame_range(), Some((0, 2)));
    }

    #[test]
    fn test_append_evicts_oldest_when_full() {
        let mut history = FrameHistory::new(3);
        for _ in 0..3 {
            history.append();
        }
        assert!(history.is_full());

        history.append();
        assert!(history.is_full());
        assert_eq!(history.len(), 3);
        assert_eq!(history.frame_range(), Some((1, 3)));
        assert!(matches!(
            history.lookup(0),
            Err(HistoryError::FrameNotFound { frame: 0, oldest: 1, latest: 3 })
        ));
    }

    #[test]
    fn test_duplicate_latest_copies_content() {
        let mut history = FrameHistory::new(4);
        {
            let first = history.append();
            first.pos_self = 12_345;
            first.ball_speed_x = 40;
        }
        let copy = *history.duplicate_latest().unwrap();
        assert_eq!(copy.frame_id, 1);
        assert_eq!(copy.pos_self, 12_345);
        assert_eq!(copy.ball_speed_x, 40);
    }

    #[test]
    fn test_duplicate_latest_on_empty_history_fails() {
        let mut history = FrameHistory::new(4);
        assert_eq!(history.duplicate_latest().err(), Some(HistoryError::Empty));
    }

    #[test]
    fn test_lookup_future_frame_fails() {
        let mut history = FrameHistory::new(4);
        history.append();
        assert!(matches!(
            history.lookup(5),
            Err(HistoryError::FrameNotFound { frame: 5, .. })
        ));
    }

    #[test]
    fn test_next_and_previous_stay_in_live_range() {
        let mut history = FrameHistory::new(3);
        for _ in 0..5 {
            history.append();
        }
        // frames 2, 3, 4 retained, wrapped around the physical array
        let oldest = history.oldest_slot().unwrap();
        let latest = history.latest_slot().unwrap();
        assert_eq!(history.previous(oldest), None);
        assert_eq!(history.next(latest), None);

        let middle = history.next(oldest).unwrap();
        assert_eq!(history.get(middle).frame_id, 3);
        assert_eq!(history.next(middle), Some(latest));
        assert_eq!(history.previous(latest), Some(middle));
        assert_eq!(history.previous(middle), Some(oldest));
    }

    #[test]
    fn test_iter_walks_oldest_to_newest() {
        let mut history = FrameHistory::new(3);
        for _ in 0..4 {
            history.append();
        }
        let ids: Vec<FrameId> = history.iter().map(|s| s.frame_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_reset_with_keeps_frame_id() {
        let mut history = FrameHistory::new(3);
        for _ in 0..4 {
            history.append();
        }
        let seed = SimulationState {
            frame_id: 17,
            score_self: 2,
            ..SimulationState::default()
        };
        history.reset_with(seed);
        assert_eq!(history.len(), 1);
        assert_eq!(history.latest(), Ok(&seed));
        assert_eq!(history.append().frame_id, 18);
    }

    #[test]
    fn test_single_slot_history() {
        let mut history = FrameHistory::new(1);
        history.append();
        assert!(history.is_full());
        history.append();
        assert_eq!(history.frame_range(), Some((1, 1)));
        let only = history.latest_slot().unwrap();
        assert_eq!(history.next(only), None);
        assert_eq!(history.previous(only), None);
    }
}
