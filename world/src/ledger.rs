//! Outstanding items that the fleet must deliver.

use warehouse_core::ItemId;

/// Fixed-length list of items awaiting submission. Cleared entries stay as `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ItemLedger {
    entries: Vec<Option<ItemId>>,
}

impl ItemLedger {
    /// Creates a ledger with every provided item outstanding.
    #[must_use]
    pub fn new(items: impl IntoIterator<Item = ItemId>) -> Self {
        Self {
            entries: items.into_iter().map(Some).collect(),
        }
    }

    /// Raw entries including cleared slots.
    #[must_use]
    pub fn entries(&self) -> &[Option<ItemId>] {
        &self.entries
    }

    /// Items still awaiting submission, in ledger order.
    pub fn outstanding(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.entries.iter().flatten().copied()
    }

    /// Number of entries still awaiting submission.
    #[must_use]
    pub fn outstanding_count(&self) -> usize {
        self.outstanding().count()
    }

    /// Reports whether every entry has been cleared.
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.entries.iter().all(Option::is_none)
    }

    /// Reports whether at least one outstanding entry names the item.
    #[must_use]
    pub fn needs(&self, item: ItemId) -> bool {
        self.entries.contains(&Some(item))
    }

    /// Clears exactly one outstanding entry naming the item.
    pub fn clear_one(&mut self, item: ItemId) -> bool {
        match self.entries.iter_mut().find(|entry| **entry == Some(item)) {
            Some(entry) => {
                *entry = None;
                true
            }
            None => false,
        }
    }

    /// Outstanding entries that no robot is already carrying, counted as a multiset.
    pub fn still_needed(&self, carried: impl IntoIterator<Item = ItemId>) -> Vec<ItemId> {
        let mut remaining: Vec<ItemId> = self.outstanding().collect();
        for item in carried {
            if let Some(position) = remaining.iter().position(|entry| *entry == item) {
                let _ = remaining.swap_remove(position);
            }
        }
        remaining.sort_unstable();
        remaining
    }
}
