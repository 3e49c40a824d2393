use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer grid coordinate. Body shapes use it relative to the organism origin,
/// the world uses it as an absolute cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        Position { x, y }
    }

    pub fn plus_direction(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Position::new(self.x + dx, self.y + dy)
    }

    /// Re-expresses `self` with `origin` as the new (0, 0).
    pub fn relative_to(self, origin: Position) -> Self {
        Position::new(self.x - origin.x, self.y - origin.y)
    }

    pub fn absolute_from(self, origin: Position) -> Self {
        Position::new(self.x + origin.x, self.y + origin.y)
    }

    /// True when `self` lies on the `direction` side of `origin` on both axes.
    /// A zero component on either axis counts as being on that side.
    pub fn is_positioned(self, direction: Direction, origin: Position) -> bool {
        let relative = self.relative_to(origin);
        let (dx, dy) = direction.delta();
        relative.x * dx >= 0 && relative.y * dy >= 0
    }

    /// Signed projection of `self - origin` onto the axis of `direction`.
    pub fn distance_from(self, origin: Position, direction: Direction) -> i32 {
        let (dx, dy) = direction.delta();
        (self.x - origin.x) * dx + (self.y - origin.y) * dy
    }

    /// Folds the position back onto a `width` x `height` torus.
    pub fn wrap(self, width: i32, height: i32) -> Self {
        Position::new(self.x.rem_euclid(width), self.y.rem_euclid(height))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal movement direction. "No previous direction" is `Option::None`
/// wherever it can occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const CARDINALS: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Unit step; y grows downwards.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Direction::Up => 0,
            Direction::Right => 1,
            Direction::Down => 2,
            Direction::Left => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plus_direction_follows_delta() {
        let p = Position::new(3, 3);
        assert_eq!(p.plus_direction(Direction::Up), Position::new(3, 2));
        assert_eq!(p.plus_direction(Direction::Right), Position::new(4, 3));
        assert_eq!(p.plus_direction(Direction::Down), Position::new(3, 4));
        assert_eq!(p.plus_direction(Direction::Left), Position::new(2, 3));
    }

    #[test]
    fn test_relative_and_absolute_are_inverse() {
        let origin = Position::new(10, -4);
        let p = Position::new(7, 2);
        assert_eq!(p.relative_to(origin).absolute_from(origin), p);
    }

    #[test]
    fn test_is_positioned_quadrants() {
        let origin = Position::ORIGIN;
        let above_right = Position::new(2, -3);
        assert!(above_right.is_positioned(Direction::Up, origin));
        assert!(above_right.is_positioned(Direction::Right, origin));
        assert!(!above_right.is_positioned(Direction::Down, origin));
        assert!(!above_right.is_positioned(Direction::Left, origin));

        // The origin itself sits on every side.
        for direction in Direction::CARDINALS {
            assert!(origin.is_positioned(direction, origin));
        }
    }

    #[test]
    fn test_distance_is_projection() {
        let origin = Position::new(1, 1);
        let p = Position::new(4, -1);
        assert_eq!(p.distance_from(origin, Direction::Right), 3);
        assert_eq!(p.distance_from(origin, Direction::Left), -3);
        assert_eq!(p.distance_from(origin, Direction::Up), 2);
        assert_eq!(p.distance_from(origin, Direction::Down), -2);
    }

    #[test]
    fn test_wrap_handles_negative_coordinates() {
        assert_eq!(Position::new(-1, -1).wrap(10, 5), Position::new(9, 4));
        assert_eq!(Position::new(10, 5).wrap(10, 5), Position::new(0, 0));
        assert_eq!(Position::new(-21, 12).wrap(10, 5), Position::new(9, 2));
    }
}
