use folio_config::LayoutMode;
use serde::{Deserialize, Serialize};

/// Which half of the spread a sheet occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Direction a turn takes when it starts from this side
    pub fn turn_direction(self) -> TurnDirection {
        match self {
            Side::Right => TurnDirection::Forward,
            Side::Left => TurnDirection::Backward,
        }
    }
}

/// Direction of a page turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnDirection {
    /// Right sheet travels to the left, pages advance
    Forward,
    /// Left sheet travels to the right, pages retreat
    Backward,
}

impl TurnDirection {
    /// Side the turning sheet starts from
    pub fn origin_side(self) -> Side {
        match self {
            TurnDirection::Forward => Side::Right,
            TurnDirection::Backward => Side::Left,
        }
    }

    /// Sign of the pointer x delta that advances this turn
    pub fn drag_sign(self) -> f32 {
        match self {
            TurnDirection::Forward => -1.0,
            TurnDirection::Backward => 1.0,
        }
    }
}

/// The pair of pages visible at rest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Spread {
    pub left: Option<usize>,
    pub right: Option<usize>,
}

impl Spread {
    /// Spread anchored at `anchor`.
    ///
    /// Double layout shows `anchor | anchor + 1`. Single layout shows only
    /// `anchor`, on the right.
    pub fn at(anchor: usize, layout: LayoutMode, total_pages: usize) -> Self {
        let in_range = |page: usize| (page < total_pages).then_some(page);
        match layout {
            LayoutMode::Double => Self {
                left: in_range(anchor),
                right: anchor.checked_add(1).and_then(in_range),
            },
            LayoutMode::Single => Self {
                left: None,
                right: in_range(anchor),
            },
        }
    }

    pub fn pages(&self) -> impl Iterator<Item = usize> {
        self.left.into_iter().chain(self.right)
    }
}

/// Pages involved in a turn from a given anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnPlan {
    pub direction: TurnDirection,
    /// Page on the turning sheet's visible face
    pub turning_front: Option<usize>,
    /// Page revealed on the turning sheet's back
    pub turning_back: Option<usize>,
    /// Spread uncovered beneath the turning sheet
    pub under: Spread,
    /// Anchor once the turn completes
    pub destination: usize,
}

impl TurnPlan {
    /// Plan a turn; `None` when the destination is outside the document
    pub fn new(
        anchor: usize,
        direction: TurnDirection,
        layout: LayoutMode,
        total_pages: usize,
    ) -> Option<Self> {
        let step = layout.page_step();
        let current = Spread::at(anchor, layout, total_pages);
        let destination = match direction {
            TurnDirection::Forward => {
                let next = anchor + step;
                (next < total_pages).then_some(next)?
            }
            TurnDirection::Backward => anchor.checked_sub(step)?,
        };
        let under = Spread::at(destination, layout, total_pages);
        let (turning_front, turning_back) = match direction {
            TurnDirection::Forward => (current.right, under.left),
            TurnDirection::Backward => (current.left, under.right),
        };
        Some(Self {
            direction,
            turning_front,
            turning_back,
            under,
            destination,
        })
    }

    /// Pages that must be on screen before a drag may start
    pub fn revealed_pages(&self) -> impl Iterator<Item = usize> {
        self.turning_back.into_iter().chain(self.under.pages())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_spread_pairs() {
        let spread = Spread::at(0, LayoutMode::Double, 10);
        assert_eq!(spread.left, Some(0));
        assert_eq!(spread.right, Some(1));

        let spread = Spread::at(8, LayoutMode::Double, 10);
        assert_eq!(spread.left, Some(8));
        assert_eq!(spread.right, Some(9));
    }

    #[test]
    fn test_odd_document_last_spread_has_no_right_page() {
        let spread = Spread::at(8, LayoutMode::Double, 9);
        assert_eq!(spread.left, Some(8));
        assert_eq!(spread.right, None);
    }

    #[test]
    fn test_forward_plan_double() {
        let plan = TurnPlan::new(0, TurnDirection::Forward, LayoutMode::Double, 10).unwrap();
        assert_eq!(plan.turning_front, Some(1));
        assert_eq!(plan.turning_back, Some(2));
        assert_eq!(plan.under.right, Some(3));
        assert_eq!(plan.destination, 2);
    }

    #[test]
    fn test_backward_plan_double() {
        let plan = TurnPlan::new(4, TurnDirection::Backward, LayoutMode::Double, 10).unwrap();
        assert_eq!(plan.turning_front, Some(4));
        assert_eq!(plan.turning_back, Some(3));
        assert_eq!(plan.under.left, Some(2));
        assert_eq!(plan.destination, 2);
    }

    #[test]
    fn test_plan_out_of_bounds() {
        assert!(TurnPlan::new(0, TurnDirection::Backward, LayoutMode::Double, 10).is_none());
        assert!(TurnPlan::new(8, TurnDirection::Forward, LayoutMode::Double, 10).is_none());
        assert!(TurnPlan::new(0, TurnDirection::Forward, LayoutMode::Single, 1).is_none());
    }

    #[test]
    fn test_single_layout_plan() {
        let plan = TurnPlan::new(3, TurnDirection::Backward, LayoutMode::Single, 5).unwrap();
        assert_eq!(plan.turning_front, None);
        assert_eq!(plan.turning_back, Some(2));
        let revealed: Vec<_> = plan.revealed_pages().collect();
        assert_eq!(revealed, vec![2, 2]);
    }
}
