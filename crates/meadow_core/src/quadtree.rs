//! Region quadtree for proximity queries over grid positions.
//!
//! Boundaries are half-open: a rectangle centred at `(cx, cy)` with half
//! extents `(half_w, half_h)` covers `[cx - half_w, cx + half_w)` on x and the
//! matching range on y. Children are ordered NW, NE, SW, SE with y growing
//! downward, the same orientation as the grid.
//!
//! # Examples
//! ```
//! use meadow_core::quadtree::{Point, QuadTree, Rect};
//!
//! let mut tree = QuadTree::new(Rect::from_grid(16, 16), 4);
//! assert!(tree.insert(Point::new(3.0, 4.0, "bee")));
//! assert!(!tree.insert(Point::new(16.0, 0.0, "outside")));
//!
//! let found = tree.query(&Rect::around(3.0, 4.0, 1.0));
//! assert_eq!(found.len(), 1);
//! ```

/// Deeper nodes keep accepting points past capacity.
pub const MAX_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub cx: f64,
    pub cy: f64,
    pub half_w: f64,
    pub half_h: f64,
}

impl Rect {
    #[must_use]
    pub fn new(cx: f64, cy: f64, half_w: f64, half_h: f64) -> Self {
        Self {
            cx,
            cy,
            half_w,
            half_h,
        }
    }

    /// Covers every integer cell of a `width x height` grid.
    #[must_use]
    pub fn from_grid(width: u16, height: u16) -> Self {
        let hw = f64::from(width) / 2.0;
        let hh = f64::from(height) / 2.0;
        Self::new(hw, hh, hw, hh)
    }

    /// Square of half-size `radius + 0.5` centred on a cell, so every cell
    /// within `radius` on both axes is inside it.
    #[must_use]
    pub fn around(x: f64, y: f64, radius: f64) -> Self {
        Self::new(x, y, radius + 0.5, radius + 0.5)
    }

    #[inline]
    #[must_use]
    pub fn left(&self) -> f64 {
        self.cx - self.half_w
    }

    #[inline]
    #[must_use]
    pub fn right(&self) -> f64 {
        self.cx + self.half_w
    }

    #[inline]
    #[must_use]
    pub fn top(&self) -> f64 {
        self.cy - self.half_h
    }

    #[inline]
    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.cy + self.half_h
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left() && x < self.right() && y >= self.top() && y < self.bottom()
    }

    #[inline]
    #[must_use]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    fn quadrants(&self) -> [Rect; 4] {
        let hw = self.half_w / 2.0;
        let hh = self.half_h / 2.0;
        [
            Rect::new(self.cx - hw, self.cy - hh, hw, hh),
            Rect::new(self.cx + hw, self.cy - hh, hw, hh),
            Rect::new(self.cx - hw, self.cy + hh, hw, hh),
            Rect::new(self.cx + hw, self.cy + hh, hw, hh),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Point<T> {
    pub x: f64,
    pub y: f64,
    pub data: T,
}

impl<T> Point<T> {
    pub fn new(x: f64, y: f64, data: T) -> Self {
        Self { x, y, data }
    }

    #[inline]
    fn distance_sq(&self, x: f64, y: f64) -> f64 {
        let dx = self.x - x;
        let dy = self.y - y;
        dx * dx + dy * dy
    }
}

/// Instrumentation returned by [`QuadTree::query_with_stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryStats {
    pub nodes_visited: usize,
}

#[derive(Debug, Clone)]
pub struct QuadTree<T> {
    boundary: Rect,
    capacity: usize,
    depth: usize,
    points: Vec<Point<T>>,
    children: Option<Box<[QuadTree<T>; 4]>>,
}

impl<T> QuadTree<T> {
    #[must_use]
    pub fn new(boundary: Rect, capacity: usize) -> Self {
        Self::with_depth(boundary, capacity.max(1), 0)
    }

    fn with_depth(boundary: Rect, capacity: usize, depth: usize) -> Self {
        Self {
            boundary,
            capacity,
            depth,
            points: Vec::with_capacity(capacity),
            children: None,
        }
    }

    #[must_use]
    pub fn boundary(&self) -> &Rect {
        &self.boundary
    }

    /// Points stored directly in this node; empty once subdivided.
    #[must_use]
    pub fn own_points(&self) -> &[Point<T>] {
        &self.points
    }

    #[must_use]
    pub fn children(&self) -> Option<&[QuadTree<T>; 4]> {
        self.children.as_deref()
    }

    #[must_use]
    pub fn is_divided(&self) -> bool {
        self.children.is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
            + self
                .children
                .as_ref()
                .map_or(0, |c| c.iter().map(QuadTree::len).sum())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `false` and drops the point when it lies outside this node.
    pub fn insert(&mut self, point: Point<T>) -> bool {
        if !self.boundary.contains(point.x, point.y) {
            return false;
        }

        if self.children.is_none() {
            if self.points.len() < self.capacity || self.depth >= MAX_DEPTH {
                self.points.push(point);
                return true;
            }
            self.subdivide();
        }

        match self.children.as_mut() {
            Some(children) => match children
                .iter_mut()
                .find(|c| c.boundary.contains(point.x, point.y))
            {
                Some(child) => child.insert(point),
                None => false,
            },
            None => false,
        }
    }

    fn subdivide(&mut self) {
        let [nw, ne, sw, se] = self.boundary.quadrants();
        let depth = self.depth + 1;
        let mut children = Box::new([
            QuadTree::with_depth(nw, self.capacity, depth),
            QuadTree::with_depth(ne, self.capacity, depth),
            QuadTree::with_depth(sw, self.capacity, depth),
            QuadTree::with_depth(se, self.capacity, depth),
        ]);
        for point in self.points.drain(..) {
            if let Some(child) = children
                .iter_mut()
                .find(|c| c.boundary.contains(point.x, point.y))
            {
                child.insert(point);
            }
        }
        self.children = Some(children);
    }

    /// All points inside `range`.
    #[must_use]
    pub fn query(&self, range: &Rect) -> Vec<&Point<T>> {
        self.query_with_stats(range).0
    }

    pub fn query_with_stats(&self, range: &Rect) -> (Vec<&Point<T>>, QueryStats) {
        let mut found = Vec::new();
        let mut stats = QueryStats::default();
        if self.boundary.intersects(range) {
            self.collect(range, &mut found, &mut stats);
        }
        (found, stats)
    }

    fn collect<'a>(&'a self, range: &Rect, found: &mut Vec<&'a Point<T>>, stats: &mut QueryStats) {
        stats.nodes_visited += 1;
        found.extend(self.points.iter().filter(|p| range.contains(p.x, p.y)));
        if let Some(children) = &self.children {
            for child in children.iter() {
                if child.boundary.intersects(range) {
                    child.collect(range, found, stats);
                }
            }
        }
    }

    /// Points within Euclidean `radius` of `(x, y)`.
    #[must_use]
    pub fn query_radius(&self, x: f64, y: f64, radius: f64) -> Vec<&Point<T>> {
        let limit = radius * radius;
        self.query(&Rect::around(x, y, radius))
            .into_iter()
            .filter(|p| p.distance_sq(x, y) <= limit)
            .collect()
    }
}

impl<T: Ord> QuadTree<T> {
    /// Closest accepted point within `max_radius`, searched with squares that
    /// double in size. Equal distances go to the smallest payload.
    pub fn nearest<F>(&self, x: f64, y: f64, max_radius: f64, accept: F) -> Option<&Point<T>>
    where
        F: Fn(&T) -> bool,
    {
        if max_radius < 0.0 {
            return None;
        }
        let mut radius = 1.0_f64.min(max_radius);
        loop {
            let limit = radius * radius;
            let mut best: Option<(f64, &Point<T>)> = None;
            for point in self.query(&Rect::around(x, y, radius)) {
                if !accept(&point.data) {
                    continue;
                }
                let d = point.distance_sq(x, y);
                let closer = match best {
                    None => true,
                    Some((best_d, best_p)) => {
                        d < best_d || (d == best_d && point.data < best_p.data)
                    }
                };
                if closer {
                    best = Some((d, point));
                }
            }

            // Anything inside the circle of this radius beats whatever lies
            // outside the searched square.
            if let Some((d, point)) = best {
                if d <= limit {
                    return Some(point);
                }
            }
            if radius >= max_radius {
                return None;
            }
            radius = (radius * 2.0).min(max_radius);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_16(capacity: usize) -> QuadTree<u32> {
        QuadTree::new(Rect::from_grid(16, 16), capacity)
    }

    #[test]
    fn test_insert_respects_half_open_boundary() {
        let mut tree = tree_16(4);
        assert!(tree.insert(Point::new(0.0, 0.0, 1)));
        assert!(tree.insert(Point::new(15.0, 15.0, 2)));
        assert!(!tree.insert(Point::new(16.0, 3.0, 3)));
        assert!(!tree.insert(Point::new(3.0, 16.0, 4)));
        assert!(!tree.insert(Point::new(-0.5, 3.0, 5)));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_subdivides_once_when_capacity_exceeded() {
        let mut tree = tree_16(2);
        tree.insert(Point::new(1.0, 1.0, 1));
        tree.insert(Point::new(12.0, 1.0, 2));
        assert!(!tree.is_divided());
        assert_eq!(tree.own_points().len(), 2);

        tree.insert(Point::new(1.0, 12.0, 3));
        assert!(tree.is_divided());
        assert!(tree.own_points().is_empty());

        let children = tree.children().expect("divided");
        assert_eq!(children[0].own_points()[0].data, 1);
        assert_eq!(children[1].own_points()[0].data, 2);
        assert_eq!(children[2].own_points()[0].data, 3);
        assert!(children[3].is_empty());
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_query_prunes_disjoint_children() {
        let mut tree = tree_16(1);
        for (i, (x, y)) in [(1.0, 1.0), (14.0, 1.0), (1.0, 14.0), (14.0, 14.0)]
            .into_iter()
            .enumerate()
        {
            tree.insert(Point::new(x, y, i as u32));
        }

        let (found, stats) = tree.query_with_stats(&Rect::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].data, 0);
        // Root plus the NW child only.
        assert_eq!(stats.nodes_visited, 2);
    }

    #[test]
    fn test_query_outside_visits_nothing() {
        let mut tree = tree_16(1);
        tree.insert(Point::new(2.0, 2.0, 0));
        let (found, stats) = tree.query_with_stats(&Rect::new(40.0, 40.0, 2.0, 2.0));
        assert!(found.is_empty());
        assert_eq!(stats.nodes_visited, 0);
    }

    #[test]
    fn test_coincident_points_stop_at_max_depth() {
        let mut tree = tree_16(1);
        for i in 0..50 {
            assert!(tree.insert(Point::new(5.0, 5.0, i)));
        }
        assert_eq!(tree.len(), 50);
        assert_eq!(tree.query(&Rect::around(5.0, 5.0, 0.0)).len(), 50);
    }

    #[test]
    fn test_nearest_prefers_distance_then_lowest_payload() {
        let mut tree = tree_16(2);
        tree.insert(Point::new(14.0, 9.0, 10));
        tree.insert(Point::new(7.0, 7.0, 20));
        tree.insert(Point::new(3.0, 3.0, 5));

        let hit = tree.nearest(5.0, 5.0, 12.0, |_| true).expect("found");
        // (7,7) and (3,3) are equally close; payload 5 wins.
        assert_eq!(hit.data, 5);

        let hit = tree.nearest(5.0, 5.0, 12.0, |d| *d != 5).expect("found");
        assert_eq!(hit.data, 20);
    }

    #[test]
    fn test_nearest_honours_max_radius() {
        let mut tree = tree_16(4);
        tree.insert(Point::new(14.0, 14.0, 1));
        assert!(tree.nearest(0.0, 0.0, 5.0, |_| true).is_none());
        assert!(tree.nearest(0.0, 0.0, 20.0, |_| true).is_some());
    }

    #[test]
    fn test_nearest_ignores_closer_square_corner() {
        let mut tree = tree_16(4);
        // Inside the radius-2 square but at distance ~2.83.
        tree.insert(Point::new(2.0, 2.0, 1));
        // Distance 2.5, outside the first square along x only at radius 2.
        tree.insert(Point::new(0.0, 2.5, 2));
        let hit = tree.nearest(0.0, 0.0, 8.0, |_| true).expect("found");
        assert_eq!(hit.data, 2);
    }

    #[test]
    fn test_query_radius_is_circular() {
        let mut tree = tree_16(4);
        tree.insert(Point::new(3.0, 3.0, 1));
        tree.insert(Point::new(5.0, 3.0, 2));
        let found = tree.query_radius(0.0, 0.0, 4.5);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].data, 1);
    }
}
