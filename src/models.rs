//! Data models for bookmark entries and groups

/// Identifier of a logical bookmark group. Group 0 is the default group.
pub type GroupId = u32;

/// Surrogate identifier of a single catalog entry.
pub type EntryId = u64;

/// The default group: always present, cannot be deleted, only emptied.
pub const DEFAULT_GROUP_ID: GroupId = 0;

/// How an entry participates in a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// A plain bookmarked item, not part of any recipe.
    Standalone,
    /// The output of a recipe; heads a recipe block.
    Output,
    /// An ingredient of the recipe block it trails.
    Input,
}

impl Role {
    /// Persisted ordinal: 0 = standalone, 1 = output, 2 = input.
    pub fn ordinal(self) -> i64 {
        match self {
            Role::Standalone => 0,
            Role::Output => 1,
            Role::Input => 2,
        }
    }

    pub fn from_ordinal(ordinal: i64) -> Option<Role> {
        match ordinal {
            0 => Some(Role::Standalone),
            1 => Some(Role::Output),
            2 => Some(Role::Input),
            _ => None,
        }
    }

    /// Short tag used by the catalog listing.
    pub fn tag(self) -> &'static str {
        match self {
            Role::Standalone => "item",
            Role::Output => "out",
            Role::Input => "in",
        }
    }
}

/// One saved selection in the ordered catalog.
///
/// `unit_factor` is the quantity produced or consumed by one production
/// cycle and never changes after creation. `amount` is the current total
/// quantity and never drops below `unit_factor`.
#[derive(Debug, Clone)]
pub struct BookmarkEntry {
    id: EntryId,
    pub group_id: GroupId,
    item_key: String,
    unit_factor: u64,
    amount: u64,
    pub role: Role,
}

impl BookmarkEntry {
    /// A new entry starts at one cycle: `amount == unit_factor`.
    pub fn new(
        id: EntryId,
        group_id: GroupId,
        item_key: impl Into<String>,
        unit_factor: u64,
        role: Role,
    ) -> BookmarkEntry {
        let unit_factor = unit_factor.max(1);
        BookmarkEntry {
            id,
            group_id,
            item_key: item_key.into(),
            unit_factor,
            amount: unit_factor,
            role,
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn item_key(&self) -> &str {
        &self.item_key
    }

    pub fn unit_factor(&self) -> u64 {
        self.unit_factor
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    /// Clamps to the `amount >= unit_factor` floor.
    pub fn set_amount(&mut self, amount: u64) {
        self.amount = amount.max(self.unit_factor);
    }

    /// Implied batch count: `ceil(amount / unit_factor)`, always >= 1.
    pub fn cycles(&self) -> u64 {
        self.amount.div_ceil(self.unit_factor)
    }

    /// Sets the batch count; `amount` becomes `unit_factor * max(1, cycles)`.
    pub fn set_cycles(&mut self, cycles: u64) {
        self.amount = self.unit_factor * cycles.max(1);
    }

    pub fn is_output(&self) -> bool {
        self.role == Role::Output
    }

    pub fn is_input(&self) -> bool {
        self.role == Role::Input
    }
}

/// Per-group display and planning flags.
#[derive(Debug, Clone)]
pub struct BookmarkGroup {
    /// Display-only: whether the group is shown expanded.
    pub expanded: bool,
    /// When set, quantity changes in the group re-balance the whole chain.
    pub chain_mode: bool,
}

impl Default for BookmarkGroup {
    fn default() -> BookmarkGroup {
        BookmarkGroup {
            expanded: true,
            chain_mode: false,
        }
    }
}
