use glam::DVec2;

/// Axis-aligned square region in a cube face's local 2D plane.
///
/// Invariant: `min.x <= max.x` and `min.y <= max.y`. The constructor
/// enforces this by sorting components.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Box2 {
    pub min: DVec2,
    pub max: DVec2,
}

impl Box2 {
    /// Create a box from two corners, sorting components so that min <= max.
    pub fn new(a: DVec2, b: DVec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create a box from its center and half-extent along both axes.
    pub fn from_center_half_size(center: DVec2, half_size: f64) -> Self {
        Self {
            min: center - DVec2::splat(half_size),
            max: center + DVec2::splat(half_size),
        }
    }

    /// Midpoint of the box.
    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    /// Extent along each axis.
    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    /// Half of the extent along x. Quadtree boxes are square.
    pub fn half_size(&self) -> f64 {
        (self.max.x - self.min.x) * 0.5
    }

    /// Returns true if the point lies inside or on the boundary.
    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// The four child quadrants in bottom-left, bottom-right, top-left,
    /// top-right order.
    pub fn quadrants(&self) -> [Box2; 4] {
        let c = self.center();
        [
            Box2 {
                min: self.min,
                max: c,
            },
            Box2 {
                min: DVec2::new(c.x, self.min.y),
                max: DVec2::new(self.max.x, c.y),
            },
            Box2 {
                min: DVec2::new(self.min.x, c.y),
                max: DVec2::new(c.x, self.max.y),
            },
            Box2 {
                min: c,
                max: self.max,
            },
        ]
    }
}
