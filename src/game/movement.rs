//! # Movement
//!
//! Single-step movement resolution and the enemy chase rule.

use crate::game::{Direction, EntityId, EntityKind, Position};

/// Collision query over the current level.
///
/// The board implements this; tests and alternative hosts can supply their
/// own.
pub trait Occupancy {
    /// Whether `cell` is inside the outer wall ring.
    fn in_bounds(&self, cell: Position) -> bool;

    /// The entity on `cell`, if any.
    fn occupant(&self, cell: Position) -> Option<(EntityKind, EntityId)>;
}

/// How an attempted step resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The destination was empty floor
    Free { from: Position, to: Position },
    /// A wall, or the outer wall ring, is in the way
    BlockedByWall { at: Position },
    /// Something the mover can interact with is in the way
    BlockedByInteractable {
        at: Position,
        kind: EntityKind,
        entity: EntityId,
    },
}

impl MoveOutcome {
    pub fn is_free(&self) -> bool {
        matches!(self, MoveOutcome::Free { .. })
    }

    /// The cell the mover tried to enter.
    pub fn target(&self) -> Position {
        match *self {
            MoveOutcome::Free { to, .. } => to,
            MoveOutcome::BlockedByWall { at } => at,
            MoveOutcome::BlockedByInteractable { at, .. } => at,
        }
    }
}

/// Resolves one step from `origin` in `direction`.
///
/// Nothing is mutated; the caller applies the outcome.
///
/// # Examples
///
/// ```
/// use gridcrawl::{resolve_move, Board, Direction, EntityKind, MoveOutcome, Position};
///
/// let mut board = Board::new(4, 4);
/// board.spawn(EntityKind::Wall, Position::new(1, 0)).unwrap();
///
/// let blocked = resolve_move(Position::new(0, 0), Direction::Right, &board);
/// assert_eq!(blocked, MoveOutcome::BlockedByWall { at: Position::new(1, 0) });
///
/// let edge = resolve_move(Position::new(0, 0), Direction::Down, &board);
/// assert_eq!(edge, MoveOutcome::BlockedByWall { at: Position::new(0, -1) });
///
/// assert!(resolve_move(Position::new(0, 0), Direction::Up, &board).is_free());
/// ```
pub fn resolve_move(
    origin: Position,
    direction: Direction,
    occupancy: &impl Occupancy,
) -> MoveOutcome {
    let target = origin.step(direction);

    if !occupancy.in_bounds(target) {
        return MoveOutcome::BlockedByWall { at: target };
    }

    match occupancy.occupant(target) {
        None => MoveOutcome::Free {
            from: origin,
            to: target,
        },
        Some((kind, _)) if kind.is_wall() => MoveOutcome::BlockedByWall { at: target },
        Some((kind, entity)) => MoveOutcome::BlockedByInteractable {
            at: target,
            kind,
            entity,
        },
    }
}

/// Greedy single-axis chase.
///
/// Same column: step vertically toward the target. Otherwise: step
/// horizontally toward it. Obstacles are ignored, so an enemy can keep
/// walking into the same wall.
///
/// # Examples
///
/// ```
/// use gridcrawl::{chase_direction, Direction, Position};
///
/// let enemy = Position::new(5, 5);
/// assert_eq!(chase_direction(enemy, Position::new(5, 8)), Direction::Up);
/// assert_eq!(chase_direction(enemy, Position::new(8, 5)), Direction::Right);
/// assert_eq!(chase_direction(enemy, Position::new(2, 5)), Direction::Left);
/// ```
pub fn chase_direction(from: Position, target: Position) -> Direction {
    if target.x == from.x {
        if target.y > from.y {
            Direction::Up
        } else {
            Direction::Down
        }
    } else if target.x > from.x {
        Direction::Right
    } else {
        Direction::Left
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{new_entity_id, Board};
    use std::collections::HashMap;

    /// Occupancy over a bare map with no bounds.
    struct OpenField(HashMap<Position, (EntityKind, EntityId)>);

    impl Occupancy for OpenField {
        fn in_bounds(&self, _cell: Position) -> bool {
            true
        }

        fn occupant(&self, cell: Position) -> Option<(EntityKind, EntityId)> {
            self.0.get(&cell).copied()
        }
    }

    #[test]
    fn test_chase_prefers_horizontal_axis() {
        let enemy = Position::new(5, 5);
        assert_eq!(chase_direction(enemy, Position::new(9, 1)), Direction::Right);
        assert_eq!(chase_direction(enemy, Position::new(1, 9)), Direction::Left);
        assert_eq!(chase_direction(enemy, Position::new(5, 2)), Direction::Down);
    }

    #[test]
    fn test_chase_on_same_cell_moves_down() {
        let cell = Position::new(3, 3);
        assert_eq!(chase_direction(cell, cell), Direction::Down);
    }

    #[test]
    fn test_resolve_into_interactable() {
        let mut board = Board::new(6, 6);
        let player = new_entity_id();
        board
            .spawn_with_id(EntityKind::Player, player, Position::new(2, 3))
            .unwrap();

        assert_eq!(
            resolve_move(Position::new(2, 2), Direction::Up, &board),
            MoveOutcome::BlockedByInteractable {
                at: Position::new(2, 3),
                kind: EntityKind::Player,
                entity: player,
            }
        );
    }

    #[test]
    fn test_resolve_against_custom_occupancy() {
        let food = new_entity_id();
        let mut cells = HashMap::new();
        cells.insert(Position::new(-3, 0), (EntityKind::Food, food));
        let field = OpenField(cells);

        let outcome = resolve_move(Position::new(-2, 0), Direction::Left, &field);
        assert_eq!(outcome.target(), Position::new(-3, 0));
        assert!(matches!(
            outcome,
            MoveOutcome::BlockedByInteractable {
                kind: EntityKind::Food,
                ..
            }
        ));

        let free = resolve_move(Position::new(-2, 0), Direction::Right, &field);
        assert_eq!(
            free,
            MoveOutcome::Free {
                from: Position::new(-2, 0),
                to: Position::new(-1, 0)
            }
        );
    }
}
