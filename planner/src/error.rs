//! Edit rejections.
//!
//! Every mutator on [`crate::doc::PlanStore`] and [`crate::edit`] returns one
//! of these instead of changing the plan. The engine turns them into status
//! messages; none of them is fatal.

use crate::doc::{ElementId, ElementKind};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditError {
    /// No element with this id exists.
    #[error("element {0} not found")]
    NotFound(ElementId),

    /// A door or window refers to a wall that does not exist.
    #[error("wall {0} does not exist")]
    MissingWall(ElementId),

    /// A door or window would overlap a sibling on the same wall.
    #[error("cannot place {kind}: overlaps an existing element on wall {wall_id}")]
    Overlap { kind: ElementKind, wall_id: ElementId },

    /// A door or window is shorter than the configured minimum.
    #[error("cannot place {kind}: minimum length is {min:.1}")]
    TooShort { kind: ElementKind, min: f64 },

    /// A drawn shape spans less than the minimum size.
    #[error("drawing cancelled (too small)")]
    TooSmall,

    /// A polygon or route has too few points.
    #[error("{kind} needs at least {min} points, got {got}")]
    TooFewPoints { kind: ElementKind, min: usize, got: usize },

    /// The requested operation does not apply to this element kind.
    #[error("operation not supported for {0}")]
    WrongKind(ElementKind),

    /// A door or window was started away from any wall.
    #[error("must click on a wall to place a {0}")]
    OffWall(ElementKind),

    /// An opening would no longer fit on its (shortened) wall.
    #[error("{kind} {id} would fall outside wall {wall_id}")]
    OutOfRange { kind: ElementKind, id: ElementId, wall_id: ElementId },

    /// Two elements share one id.
    #[error("duplicate element id {0}")]
    DuplicateId(ElementId),

    /// The id is the top of the id space, which leaves no successor for
    /// the next element.
    #[error("element id {0} is out of range")]
    ReservedId(ElementId),
}
