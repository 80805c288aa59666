use glam::DVec3;

/// Axis-aligned bounding box in f64 world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb3 {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb3 {
    /// Create an AABB from two corners, sorting components so that min <= max.
    pub fn new(a: DVec3, b: DVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Smallest box enclosing every point, or `None` for an empty iterator.
    pub fn from_points<I: IntoIterator<Item = DVec3>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut aabb = Self {
            min: first,
            max: first,
        };
        for p in iter {
            aabb.extend(p);
        }
        Some(aabb)
    }

    /// Grow the box to include `p`.
    pub fn extend(&mut self, p: DVec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Returns true if the point lies inside or on the boundary.
    pub fn contains_point(&self, p: DVec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    /// Returns true if the boxes overlap (touching counts).
    pub fn intersects(&self, other: &Aabb3) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }

    /// Smallest box enclosing both.
    pub fn union(&self, other: &Aabb3) -> Aabb3 {
        Aabb3 {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let aabb = Aabb3::from_points([
            DVec3::new(1.0, -2.0, 3.0),
            DVec3::new(-4.0, 5.0, 0.0),
            DVec3::new(0.0, 0.0, 9.0),
        ])
        .unwrap();
        assert_eq!(aabb.min, DVec3::new(-4.0, -2.0, 0.0));
        assert_eq!(aabb.max, DVec3::new(1.0, 5.0, 9.0));
        assert!(Aabb3::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_intersects_touching() {
        let a = Aabb3::new(DVec3::ZERO, DVec3::ONE);
        let b = Aabb3::new(DVec3::ONE, DVec3::splat(2.0));
        let c = Aabb3::new(DVec3::splat(1.5), DVec3::splat(2.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert_eq!(a.union(&c).max, DVec3::splat(2.0));
    }

    #[test]
    fn test_contains_point_boundary() {
        let a = Aabb3::new(DVec3::NEG_ONE, DVec3::ONE);
        assert!(a.contains_point(DVec3::ONE));
        assert!(!a.contains_point(DVec3::new(0.0, 1.01, 0.0)));
        assert_eq!(a.center(), DVec3::ZERO);
        assert_eq!(a.size(), DVec3::splat(2.0));
    }
}
