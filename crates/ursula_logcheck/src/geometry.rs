/// Tolerance used when comparing a configured position against a logged one.
pub const POSITION_EPSILON: f32 = 0.001;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn approx_eq(self, other: Point) -> bool {
        self.distance(other) <= POSITION_EPSILON
    }
}
