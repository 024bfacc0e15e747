//! The passive clause queue
//!
//! An age/weight interleaved priority queue: most picks take the lightest
//! clause, but every `age_ratio`-th pick takes the oldest instead. The
//! ratio is deterministic, so every enqueued clause is popped after a
//! bounded number of age picks — the fairness requirement of the
//! saturation loop.

use indexmap::IndexMap;

/// Priority queue over passive clause ids. Insertion order is age order.
#[derive(Debug)]
pub struct PassiveQueue {
    /// clause id -> weight, in insertion (age) order
    entries: IndexMap<usize, u32>,
    age_ratio: u32,
    picks: u32,
}

impl PassiveQueue {
    pub fn new(age_ratio: u32) -> Self {
        PassiveQueue {
            entries: IndexMap::new(),
            age_ratio: age_ratio.max(1),
            picks: 0,
        }
    }

    pub fn push(&mut self, idx: usize, weight: u32) {
        self.entries.insert(idx, weight);
    }

    /// Pop by the interleaved heuristic
    pub fn pop(&mut self) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }
        self.picks = self.picks.wrapping_add(1);
        let pos = if self.picks % self.age_ratio == 0 {
            0 // oldest
        } else {
            self.entries
                .iter()
                .enumerate()
                .min_by_key(|(_, (_, &w))| w)
                .map(|(pos, _)| pos)
                .unwrap_or(0)
        };
        self.entries.shift_remove_index(pos).map(|(idx, _)| idx)
    }

    pub fn remove(&mut self, idx: usize) -> bool {
        self.entries.shift_remove(&idx).is_some()
    }

    pub fn contains(&self, idx: usize) -> bool {
        self.entries.contains_key(&idx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_picks_lightest() {
        let mut q = PassiveQueue::new(1000); // effectively never by age
        q.push(0, 10);
        q.push(1, 3);
        q.push(2, 7);
        assert_eq!(q.pop(), Some(1));
        assert_eq!(q.pop(), Some(2));
        assert_eq!(q.pop(), Some(0));
        assert_eq!(q.pop(), None);
    }

    #[test]
    fn test_age_interleaving_is_fair() {
        let mut q = PassiveQueue::new(2); // every 2nd pick by age
        // A heavy old clause must still be popped while light clauses keep
        // arriving
        q.push(0, 1000);
        let mut popped_heavy = false;
        let mut next_id = 1;
        for _ in 0..10 {
            q.push(next_id, 1);
            next_id += 1;
            if q.pop() == Some(0) {
                popped_heavy = true;
                break;
            }
        }
        assert!(popped_heavy, "age interleaving must pop the old heavy clause");
    }

    #[test]
    fn test_remove() {
        let mut q = PassiveQueue::new(5);
        q.push(0, 1);
        q.push(1, 2);
        assert!(q.remove(0));
        assert!(!q.remove(0));
        assert_eq!(q.pop(), Some(1));
    }
}
