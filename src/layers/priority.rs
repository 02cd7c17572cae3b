use std::cmp::Ordering;
use std::fmt;

/// Coarse miter priority class of a layer.
///
/// Declaration order is construction priority: `Structure` wins over every
/// other group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriorityGroup {
    Structure,
    Substrate,
    Insulation,
    Membrane,
    Finish,
    Void,
    #[default]
    Other,
}

/// Miter priority of a layer: a group plus a tiebreak within the group.
///
/// Ordered lexicographically by `(group, value)`. A *smaller* priority is a
/// *higher* construction priority, so `min` picks the layer that wins a miter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LayerPriority {
    pub group: PriorityGroup,
    pub value: i32,
}

impl LayerPriority {
    /// Creates a priority.
    #[must_use]
    pub const fn new(group: PriorityGroup, value: i32) -> Self {
        Self { group, value }
    }

    /// Whether `self` wins a miter against `other`.
    #[must_use]
    pub fn outranks(&self, other: &Self) -> bool {
        self < other
    }
}

impl PartialOrd for LayerPriority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LayerPriority {
    fn cmp(&self, other: &Self) -> Ordering {
        self.group
            .cmp(&other.group)
            .then_with(|| self.value.cmp(&other.value))
    }
}

impl fmt::Display for LayerPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}", self.group, self.value)
    }
}

/// Construction role of a layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LayerFunction {
    #[default]
    None,
    Void,
    Insulation,
    Structure,
    Substrate,
    Membrane,
    Adhesive,
    Underlayment,
    Finish,
    Abstract,
}
