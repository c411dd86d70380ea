use crate::sequencing::grid::Cell;

/// The arpeggiator's active set: which cells cycle, in the order they
/// arrived. Selection is pure round-robin over insertion order, so the
/// pattern is fully determined by the set and the global step counter.
#[derive(Default)]
pub struct Arpeggio {
    active: Vec<Cell>,
    /// Last cell actually sounded, for glide anchoring and teardown.
    pub last_played: Option<Cell>,
}

impl Arpeggio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a cell; duplicates keep their original position.
    pub fn add(&mut self, cell: Cell) {
        if !self.active.contains(&cell) {
            self.active.push(cell);
        }
    }

    /// Remove a cell. Returns true if it was present.
    pub fn remove(&mut self, cell: Cell) -> bool {
        let before = self.active.len();
        self.active.retain(|c| *c != cell);
        self.active.len() != before
    }

    pub fn clear(&mut self) -> Vec<Cell> {
        self.last_played = None;
        std::mem::take(&mut self.active)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.active
    }

    /// The cell that fires on `step`, round-robin over insertion order.
    pub fn cell_for_step(&self, step: u64) -> Option<Cell> {
        if self.active.is_empty() {
            return None;
        }
        Some(self.active[(step % self.active.len() as u64) as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: u8, y: u8) -> Cell {
        Cell { x, y }
    }

    #[test]
    fn round_robin_follows_insertion_order() {
        let mut arp = Arpeggio::new();
        arp.add(c(0, 0));
        arp.add(c(1, 0));
        arp.add(c(2, 0));

        let cycle: Vec<_> = (0..6).map(|s| arp.cell_for_step(s).unwrap()).collect();
        assert_eq!(
            cycle,
            vec![c(0, 0), c(1, 0), c(2, 0), c(0, 0), c(1, 0), c(2, 0)]
        );
    }

    #[test]
    fn duplicate_adds_keep_position() {
        let mut arp = Arpeggio::new();
        arp.add(c(0, 0));
        arp.add(c(1, 0));
        arp.add(c(0, 0));
        assert_eq!(arp.cells(), &[c(0, 0), c(1, 0)]);
    }

    #[test]
    fn removal_shrinks_the_cycle() {
        let mut arp = Arpeggio::new();
        arp.add(c(0, 0));
        arp.add(c(1, 0));
        arp.add(c(2, 0));
        assert!(arp.remove(c(1, 0)));
        assert!(!arp.remove(c(1, 0)));

        assert_eq!(arp.cell_for_step(0), Some(c(0, 0)));
        assert_eq!(arp.cell_for_step(1), Some(c(2, 0)));
    }

    #[test]
    fn empty_set_plays_nothing() {
        let arp = Arpeggio::new();
        assert_eq!(arp.cell_for_step(0), None);
    }
}
