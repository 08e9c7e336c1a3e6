/// One bar of a compared snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarDelta {
    pub index: usize,
    pub value: u32,
    pub changed: bool,
}

/// Order in which changed bars are visited when highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Traversal {
    #[default]
    Forward,
    Backward,
}

/// Compares two equal-length snapshots position by position. A length
/// mismatch compares `current` against itself, so nothing is reported as
/// changed.
pub fn diff(previous: &[u32], current: &[u32]) -> Vec<BarDelta> {
    let baseline = if previous.len() == current.len() {
        previous
    } else {
        current
    };

    baseline
        .iter()
        .zip(current)
        .enumerate()
        .map(|(index, (old, new))| BarDelta {
            index,
            value: *new,
            changed: old != new,
        })
        .collect()
}

/// Changed entries of `deltas`, in the requested visiting order.
pub fn pending(deltas: &[BarDelta], traversal: Traversal) -> Vec<BarDelta> {
    let changed = deltas.iter().filter(|delta| delta.changed).copied();
    match traversal {
        Traversal::Forward => changed.collect(),
        Traversal::Backward => {
            let mut pending: Vec<_> = changed.collect();
            pending.reverse();
            pending
        }
    }
}

/// Mirrors the bar order so the last element is drawn first. Indices are
/// reassigned to the new positions.
pub fn mirrored(deltas: &[BarDelta]) -> Vec<BarDelta> {
    deltas
        .iter()
        .rev()
        .enumerate()
        .map(|(index, delta)| BarDelta { index, ..*delta })
        .collect()
}

/// Keeps the previous snapshot of a session so each new one can be diffed
/// against it.
#[derive(Debug, Default)]
pub struct DiffEngine {
    previous: Option<Vec<u32>>,
}

impl DiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diffs `current` against the stored snapshot. The first snapshot, or
    /// one of a different length, becomes its own baseline.
    pub fn compare(&self, current: &[u32]) -> Vec<BarDelta> {
        match &self.previous {
            Some(previous) => diff(previous, current),
            None => diff(current, current),
        }
    }

    /// Stores `current` as the baseline for the next comparison.
    pub fn commit(&mut self, current: &[u32]) {
        match &mut self.previous {
            Some(previous) => {
                previous.clear();
                previous.extend_from_slice(current);
            }
            None => self.previous = Some(current.to_vec()),
        }
    }

    pub fn previous(&self) -> Option<&[u32]> {
        self.previous.as_deref()
    }

    pub fn reset(&mut self) {
        self.previous = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed_indices(deltas: &[BarDelta]) -> Vec<usize> {
        deltas.iter().filter(|d| d.changed).map(|d| d.index).collect()
    }

    #[test]
    fn flags_positions_that_differ() {
        let deltas = diff(&[1, 2, 3, 4], &[1, 3, 2, 4]);

        assert_eq!(deltas.len(), 4);
        assert_eq!(changed_indices(&deltas), vec![1, 2]);
        assert_eq!(deltas[1].value, 3);
    }

    #[test]
    fn arity_change_reports_nothing() {
        let deltas = diff(&[1, 2, 3], &[3, 2, 1, 0]);
        assert_eq!(deltas.len(), 4);
        assert!(deltas.iter().all(|d| !d.changed));
    }

    #[test]
    fn backward_traversal_reverses_the_same_set() {
        let deltas = diff(&[5, 6, 7, 8], &[8, 6, 5, 7]);
        let forward = pending(&deltas, Traversal::Forward);
        let backward = pending(&deltas, Traversal::Backward);

        assert_eq!(
            forward.iter().map(|d| d.index).collect::<Vec<_>>(),
            vec![0, 2, 3]
        );
        assert_eq!(
            backward.iter().map(|d| d.index).collect::<Vec<_>>(),
            vec![3, 2, 0]
        );
    }

    #[test]
    fn mirroring_reindexes() {
        let deltas = diff(&[1, 2, 3], &[1, 2, 9]);
        let mirrored = mirrored(&deltas);

        assert_eq!(mirrored[0].value, 9);
        assert_eq!(mirrored[0].index, 0);
        assert!(mirrored[0].changed);
        assert_eq!(mirrored[2].value, 1);
    }

    #[test]
    fn engine_uses_first_snapshot_as_baseline() {
        let mut engine = DiffEngine::new();
        assert!(engine.compare(&[3, 1, 2]).iter().all(|d| !d.changed));
        engine.commit(&[3, 1, 2]);

        assert_eq!(changed_indices(&engine.compare(&[1, 3, 2])), vec![0, 1]);
        engine.commit(&[1, 3, 2]);
        assert_eq!(engine.previous(), Some(&[1, 3, 2][..]));
    }
}
