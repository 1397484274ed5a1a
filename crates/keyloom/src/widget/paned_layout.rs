//! Divider arithmetic for [`Paned`](super::Paned).
//!
//! Everything here is pure: given the allocation along the paned axis, the
//! children's requested sizes and packing flags, and the previous layout,
//! compute the divider position and its bounds.

/// Packing of one child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildPacking {
    /// Whether the child grows and shrinks with the paned.
    pub resize: bool,
    /// Whether the child may be made smaller than its requisition.
    pub shrink: bool,
    /// Requested size along the paned axis.
    pub requisition: i32,
}

impl ChildPacking {
    pub fn new(resize: bool, shrink: bool) -> Self {
        Self {
            resize,
            shrink,
            requisition: 0,
        }
    }
}

/// Result of one layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DividerLayout {
    pub position: i32,
    pub min_position: i32,
    pub max_position: i32,
}

/// Inputs that persist between layout passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DividerInput {
    /// Size along the paned axis available to the two children.
    pub allocation: i32,
    /// Allocation of the previous pass, `0` before the first one.
    pub last_allocation: i32,
    /// Current (or requested) size of child one.
    pub child1_size: i32,
    /// Whether the position was pinned explicitly.
    pub position_set: bool,
}

/// Compute the divider position and bounds for one allocation.
pub fn compute(input: DividerInput, child1: ChildPacking, child2: ChildPacking) -> DividerLayout {
    let DividerInput {
        allocation,
        last_allocation,
        child1_size,
        position_set,
    } = input;

    let min = if child1.shrink { 0 } else { child1.requisition };
    let mut max = allocation;
    if !child2.shrink {
        max = max.saturating_sub(child2.requisition).max(1);
    }
    let max = max.max(min);

    // Sizes are caller supplied, so intermediate sums are widened to i64.
    let position: i64 = if !position_set {
        match (child1.resize, child2.resize) {
            (true, false) => (i64::from(allocation) - i64::from(child2.requisition)).max(0),
            (false, true) => child1.requisition.into(),
            _ => {
                let total = i64::from(child1.requisition) + i64::from(child2.requisition);
                if total != 0 {
                    scale(allocation, child1.requisition as f64 / total as f64)
                } else {
                    scale(allocation, 0.5)
                }
            }
        }
    } else if last_allocation > 0 {
        match (child1.resize, child2.resize) {
            // Child one absorbs the whole change.
            (true, false) => {
                i64::from(child1_size) + i64::from(allocation) - i64::from(last_allocation)
            }
            (false, true) => child1_size.into(),
            _ => scale(allocation, child1_size as f64 / last_allocation as f64),
        }
    } else {
        child1_size.into()
    };

    DividerLayout {
        position: position.clamp(i64::from(min), i64::from(max)) as i32,
        min_position: min,
        max_position: max,
    }
}

#[inline]
fn scale(allocation: i32, ratio: f64) -> i64 {
    (allocation as f64 * ratio + 0.5) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(allocation: i32) -> DividerInput {
        DividerInput {
            allocation,
            last_allocation: 0,
            child1_size: 0,
            position_set: false,
        }
    }

    fn packing(resize: bool, shrink: bool, requisition: i32) -> ChildPacking {
        ChildPacking {
            resize,
            shrink,
            requisition,
        }
    }

    #[test]
    fn test_even_split_without_requisitions() {
        let layout = compute(input(400), packing(true, true, 0), packing(true, true, 0));
        assert_eq!(layout, DividerLayout { position: 200, min_position: 0, max_position: 400 });
    }

    #[test]
    fn test_proportional_to_requisitions() {
        let layout = compute(input(300), packing(true, true, 100), packing(true, true, 200));
        assert_eq!(layout.position, 100);
    }

    #[test]
    fn test_resize_policies_pick_initial_position() {
        let layout = compute(input(400), packing(true, false, 50), packing(false, false, 120));
        assert_eq!(layout.position, 280);
        assert_eq!(layout.min_position, 50);
        assert_eq!(layout.max_position, 280);

        let layout = compute(input(400), packing(false, true, 90), packing(true, true, 120));
        assert_eq!(layout.position, 90);
    }

    #[test]
    fn test_max_never_below_min() {
        let layout = compute(input(100), packing(true, false, 80), packing(true, false, 80));
        assert_eq!(layout.min_position, 80);
        assert_eq!(layout.max_position, 80);
        assert_eq!(layout.position, 80);
    }

    #[test]
    fn test_pinned_position_scales_with_allocation() {
        let pinned = DividerInput {
            allocation: 800,
            last_allocation: 400,
            child1_size: 100,
            position_set: true,
        };
        let both = compute(pinned, packing(true, true, 0), packing(true, true, 0));
        assert_eq!(both.position, 200);

        let first = compute(pinned, packing(true, true, 0), packing(false, true, 0));
        assert_eq!(first.position, 500);

        let second = compute(pinned, packing(false, true, 0), packing(true, true, 0));
        assert_eq!(second.position, 100);
    }

    #[test]
    fn test_pinned_before_first_allocation_is_clamped() {
        let pinned = DividerInput {
            allocation: 300,
            last_allocation: 0,
            child1_size: 500,
            position_set: true,
        };
        let layout = compute(pinned, packing(true, true, 0), packing(true, true, 0));
        assert_eq!(layout.position, 300);
    }

    #[test]
    fn test_extreme_sizes_clamp_without_overflow() {
        let layout = compute(input(i32::MAX), packing(true, true, i32::MAX), packing(true, false, i32::MIN));
        assert_eq!(layout.max_position, i32::MAX);
        assert!(layout.position >= layout.min_position && layout.position <= layout.max_position);

        let grown = DividerInput {
            allocation: i32::MAX,
            last_allocation: 1,
            child1_size: i32::MAX,
            position_set: true,
        };
        let layout = compute(grown, packing(true, true, 0), packing(false, true, 0));
        assert_eq!(layout.position, i32::MAX);

        let layout = compute(input(100), packing(true, false, 0), packing(false, true, i32::MIN));
        assert_eq!(layout.position, 100);
    }
}
