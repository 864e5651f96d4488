use crate::error::{Error, Result};

/// Splits point indices into the current medoids (`selected`, position = cluster id)
/// and the remaining candidates (`unselected`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSet {
    max_selected: usize,
    selected: Vec<usize>,
    unselected: Vec<usize>,
    membership: Vec<bool>,
}

impl SelectionSet {
    pub fn new(num_points: usize, max_selected: usize) -> Self {
        Self {
            max_selected,
            selected: Vec::with_capacity(max_selected),
            unselected: (0..num_points).collect(),
            membership: vec![false; num_points],
        }
    }

    /// Appends `idx` as the next medoid.
    pub fn select(&mut self, idx: usize) -> Result<()> {
        if self.selected.len() >= self.max_selected {
            return Err(Error::CapacityExceeded {
                capacity: self.max_selected,
            });
        }
        if idx >= self.membership.len() {
            return Err(Error::IndexOutOfBounds {
                index: idx,
                len: self.membership.len(),
            });
        }
        debug_assert!(!self.membership[idx], "{} is already selected", idx);

        self.remove_unselected(idx);
        self.selected.push(idx);
        self.membership[idx] = true;
        Ok(())
    }

    /// Puts `idx` in medoid slot `slot`; the displaced medoid becomes the last candidate.
    pub fn replace(&mut self, slot: usize, idx: usize) -> usize {
        debug_assert!(slot < self.selected.len());
        debug_assert!(!self.membership[idx], "{} is already selected", idx);

        let previous = self.selected[slot];
        self.remove_unselected(idx);
        self.unselected.push(previous);
        self.selected[slot] = idx;
        self.membership[previous] = false;
        self.membership[idx] = true;
        previous
    }

    fn remove_unselected(&mut self, idx: usize) {
        if let Some(pos) = self.unselected.iter().position(|&i| i == idx) {
            self.unselected.remove(pos);
        }
    }

    #[inline]
    pub fn is_selected(&self, idx: usize) -> bool {
        self.membership[idx]
    }

    #[inline]
    pub fn is_unselected(&self, idx: usize) -> bool {
        !self.membership[idx]
    }

    pub fn selected(&self) -> &[usize] {
        &self.selected
    }

    pub fn unselected(&self) -> &[usize] {
        &self.unselected
    }

    pub fn len(&self) -> usize {
        self.membership.len()
    }

    pub fn is_empty(&self) -> bool {
        self.membership.is_empty()
    }

    pub fn selected_len(&self) -> usize {
        self.selected.len()
    }

    pub fn unselected_len(&self) -> usize {
        self.unselected.len()
    }

    pub fn max_selected(&self) -> usize {
        self.max_selected
    }

    pub fn is_full(&self) -> bool {
        self.selected.len() == self.max_selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDICES: [usize; 5] = [5, 25, 30, 76, 91];

    fn filled() -> SelectionSet {
        let mut set = SelectionSet::new(100, 5);
        for &idx in INDICES.iter() {
            set.select(idx).unwrap();
        }
        set
    }

    #[test]
    fn starts_with_everything_unselected() {
        let set = SelectionSet::new(100, 5);
        assert_eq!(set.selected_len(), 0);
        assert_eq!(set.unselected_len(), 100);
        assert_eq!(set.len(), 100);
        assert_eq!(set.max_selected(), 5);
    }

    #[test]
    fn select_moves_indices() {
        let set = filled();
        for &idx in INDICES.iter() {
            assert!(set.is_selected(idx));
            assert!(!set.is_unselected(idx));
            assert!(!set.unselected().contains(&idx));
        }
        assert_eq!(set.selected(), &INDICES);
        assert_eq!(set.selected_len() + set.unselected_len(), set.len());
        assert!(set.is_full());
    }

    #[test]
    fn select_past_capacity_fails() {
        let mut set = filled();
        assert!(matches!(set.select(92), Err(Error::CapacityExceeded { capacity: 5 })));
        assert!(set.is_unselected(92));
    }

    #[test]
    fn replace_keeps_slot_position() {
        let mut set = filled();
        let previous = set.replace(3, 67);

        assert_eq!(previous, 76);
        assert_eq!(set.selected().iter().position(|&i| i == 67), Some(3));
        assert!(set.is_unselected(76));
        assert_eq!(set.unselected().last(), Some(&76));
        assert!(!set.unselected().contains(&67));
        assert_eq!(set.selected_len() + set.unselected_len(), 100);
    }
}
