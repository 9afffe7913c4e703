//! Actor placement.
//!
//! The grid is the only owner of positions. Actors live in an id-ordered map
//! and every cell holds the sorted ids placed on it; `insert`, `update`,
//! `move_actor` and `remove` keep both views and the id trie consistent.

use crate::error::{Result, SimError};
use crate::quadtree::{Point, QuadTree, Rect};
use crate::trie::Trie;
use meadow_data::{Actor, ActorId, ActorKind};
use std::collections::{BTreeMap, HashSet};

const INDEX_CAPACITY: usize = 8;

/// Offsets of the 8-neighbourhood, row by row.
const NEIGHBOUR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

#[derive(Debug, Clone)]
pub struct Grid {
    width: u16,
    height: u16,
    actors: BTreeMap<ActorId, Actor>,
    cells: Vec<Vec<ActorId>>,
    ids: Trie,
    reserved: HashSet<(u16, u16)>,
}

impl Grid {
    #[must_use]
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            actors: BTreeMap::new(),
            cells: vec![Vec::new(); width as usize * height as usize],
            ids: Trie::new(),
            reserved: HashSet::new(),
        }
    }

    #[must_use]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < i32::from(self.width) && y < i32::from(self.height)
    }

    #[inline]
    fn cell_index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn check_bounds(&self, x: u16, y: u16) -> Result<()> {
        if x < self.width && y < self.height {
            Ok(())
        } else {
            Err(SimError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            })
        }
    }

    fn attach(&mut self, id: &ActorId, x: u16, y: u16) {
        let idx = self.cell_index(x, y);
        let cell = &mut self.cells[idx];
        if let Err(pos) = cell.binary_search(id) {
            cell.insert(pos, id.clone());
        }
    }

    fn detach(&mut self, id: &ActorId, x: u16, y: u16) {
        let idx = self.cell_index(x, y);
        let cell = &mut self.cells[idx];
        if let Ok(pos) = cell.binary_search(id) {
            cell.remove(pos);
        }
    }

    pub fn insert(&mut self, actor: Actor) -> Result<()> {
        let (x, y) = actor.position();
        self.check_bounds(x, y)?;
        let id = actor.id().clone();
        if self.actors.contains_key(&id) {
            return Err(SimError::DuplicateActor(id));
        }
        self.attach(&id, x, y);
        self.ids.insert(id.as_str());
        self.actors.insert(id, actor);
        Ok(())
    }

    pub fn remove(&mut self, id: &ActorId) -> Option<Actor> {
        let actor = self.actors.remove(id)?;
        let (x, y) = actor.position();
        self.detach(id, x, y);
        self.ids.remove(id.as_str());
        Some(actor)
    }

    /// Stores a modified copy of an actor, re-indexing its cell if it moved.
    /// Unknown ids are inserted.
    pub fn update(&mut self, actor: Actor) -> Result<()> {
        let (x, y) = actor.position();
        self.check_bounds(x, y)?;
        let id = actor.id().clone();
        match self.actors.get(&id).map(Actor::position) {
            Some(old) if old == (x, y) => {
                self.actors.insert(id, actor);
                Ok(())
            }
            Some((ox, oy)) => {
                self.detach(&id, ox, oy);
                self.attach(&id, x, y);
                self.actors.insert(id, actor);
                Ok(())
            }
            None => self.insert(actor),
        }
    }

    pub fn move_actor(&mut self, id: &ActorId, x: u16, y: u16) -> Result<()> {
        self.check_bounds(x, y)?;
        let Some(actor) = self.actors.get_mut(id) else {
            return Ok(());
        };
        let (ox, oy) = actor.position();
        if (ox, oy) == (x, y) {
            return Ok(());
        }
        actor.set_position(x, y);
        self.detach(id, ox, oy);
        self.attach(id, x, y);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: &ActorId) -> Option<&Actor> {
        self.actors.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &ActorId) -> bool {
        self.actors.contains_key(id)
    }

    /// Ids on a cell in ascending order.
    #[must_use]
    pub fn ids_at(&self, x: u16, y: u16) -> &[ActorId] {
        if x >= self.width || y >= self.height {
            return &[];
        }
        &self.cells[self.cell_index(x, y)]
    }

    pub fn actors_at(&self, x: u16, y: u16) -> impl Iterator<Item = &Actor> {
        self.ids_at(x, y).iter().filter_map(|id| self.actors.get(id))
    }

    /// Lowest-id actor of `kind` on a cell.
    #[must_use]
    pub fn first_at(&self, x: u16, y: u16, kind: ActorKind) -> Option<&Actor> {
        self.actors_at(x, y).find(|a| a.kind() == kind)
    }

    #[must_use]
    pub fn has_kind_at(&self, x: u16, y: u16, kind: ActorKind) -> bool {
        self.first_at(x, y, kind).is_some()
    }

    /// Ids of every actor of `kind`, ascending.
    #[must_use]
    pub fn ids_of(&self, kind: ActorKind) -> Vec<ActorId> {
        self.actors
            .values()
            .filter(|a| a.kind() == kind)
            .map(|a| a.id().clone())
            .collect()
    }

    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    #[must_use]
    pub fn count(&self, kind: ActorKind) -> usize {
        self.actors.values().filter(|a| a.kind() == kind).count()
    }

    /// Live count per kind, with zeros for absent kinds.
    #[must_use]
    pub fn counts(&self) -> BTreeMap<ActorKind, usize> {
        let mut counts: BTreeMap<ActorKind, usize> =
            ActorKind::ALL.iter().map(|k| (*k, 0)).collect();
        for actor in self.actors.values() {
            *counts.entry(actor.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// Holds a cell for an asynchronous spawn. Returns `false` if it was
    /// already held.
    pub fn reserve(&mut self, x: u16, y: u16) -> bool {
        self.reserved.insert((x, y))
    }

    pub fn release(&mut self, x: u16, y: u16) {
        self.reserved.remove(&(x, y));
    }

    #[must_use]
    pub fn is_reserved(&self, x: u16, y: u16) -> bool {
        self.reserved.contains(&(x, y))
    }

    pub fn clear_reservations(&mut self) {
        self.reserved.clear();
    }

    #[must_use]
    pub fn is_empty_cell(&self, x: u16, y: u16) -> bool {
        self.ids_at(x, y).is_empty()
    }

    /// Empty and not held for a pending spawn.
    #[must_use]
    pub fn is_free(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height && self.is_empty_cell(x, y) && !self.is_reserved(x, y)
    }

    /// In-bounds 8-neighbourhood of a cell, row by row.
    #[must_use]
    pub fn neighbors(&self, x: u16, y: u16) -> Vec<(u16, u16)> {
        NEIGHBOUR_OFFSETS
            .iter()
            .map(|(dx, dy)| (i32::from(x) + dx, i32::from(y) + dy))
            .filter(|(nx, ny)| self.in_bounds(*nx, *ny))
            .map(|(nx, ny)| (nx as u16, ny as u16))
            .collect()
    }

    #[must_use]
    pub fn free_adjacent(&self, x: u16, y: u16) -> Vec<(u16, u16)> {
        self.neighbors(x, y)
            .into_iter()
            .filter(|(nx, ny)| self.is_free(*nx, *ny))
            .collect()
    }

    /// Quadtree over the positions of the actors `filter` accepts.
    pub fn spatial_index<F>(&self, filter: F) -> QuadTree<ActorId>
    where
        F: Fn(&Actor) -> bool,
    {
        let mut tree = QuadTree::new(Rect::from_grid(self.width, self.height), INDEX_CAPACITY);
        for actor in self.actors.values().filter(|a| filter(a)) {
            let (x, y) = actor.position();
            tree.insert(Point::new(f64::from(x), f64::from(y), actor.id().clone()));
        }
        tree
    }

    /// Ids starting with `prefix`, in lexicographic order.
    #[must_use]
    pub fn search(&self, prefix: &str) -> Vec<ActorId> {
        self.ids
            .search(prefix)
            .into_iter()
            .map(ActorId)
            .collect()
    }

    pub fn clear(&mut self) {
        self.actors.clear();
        self.cells.iter_mut().for_each(Vec::clear);
        self.ids.clear();
        self.reserved.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meadow_data::Nutrient;

    fn nutrient(bits: u128, x: u16, y: u16) -> Actor {
        Actor::Nutrient(Nutrient {
            id: ActorId::new(ActorKind::Nutrient, bits),
            x,
            y,
            value: 1.0,
            decay_timer: 10,
        })
    }

    #[test]
    fn test_insert_rejects_out_of_bounds_and_duplicates() {
        let mut grid = Grid::new(5, 5);
        assert!(grid.insert(nutrient(1, 2, 2)).is_ok());
        assert_eq!(
            grid.insert(nutrient(1, 3, 3)),
            Err(SimError::DuplicateActor(ActorId::new(ActorKind::Nutrient, 1)))
        );
        assert!(matches!(
            grid.insert(nutrient(2, 5, 0)),
            Err(SimError::OutOfBounds { .. })
        ));
        assert_eq!(grid.len(), 1);
    }

    #[test]
    fn test_actor_lives_in_exactly_one_cell() {
        let mut grid = Grid::new(5, 5);
        let actor = nutrient(1, 1, 1);
        let id = actor.id().clone();
        grid.insert(actor).unwrap();
        grid.move_actor(&id, 3, 4).unwrap();
        assert!(grid.ids_at(1, 1).is_empty());
        assert_eq!(grid.ids_at(3, 4), &[id.clone()]);
        assert_eq!(grid.get(&id).unwrap().position(), (3, 4));

        let mut moved = grid.get(&id).cloned().unwrap();
        moved.set_position(0, 0);
        grid.update(moved).unwrap();
        assert!(grid.ids_at(3, 4).is_empty());
        assert_eq!(grid.ids_at(0, 0), &[id.clone()]);

        grid.remove(&id);
        assert!(grid.ids_at(0, 0).is_empty());
        assert!(grid.search("nutrient").is_empty());
    }

    #[test]
    fn test_cells_keep_ids_sorted() {
        let mut grid = Grid::new(3, 3);
        grid.insert(nutrient(9, 1, 1)).unwrap();
        grid.insert(nutrient(3, 1, 1)).unwrap();
        let ids = grid.ids_at(1, 1);
        assert!(ids[0] < ids[1]);
        assert_eq!(grid.first_at(1, 1, ActorKind::Nutrient).unwrap().id(), &ids[0]);
    }

    #[test]
    fn test_neighbors_at_corner() {
        let grid = Grid::new(4, 4);
        assert_eq!(grid.neighbors(0, 0), vec![(1, 0), (0, 1), (1, 1)]);
        assert_eq!(grid.neighbors(1, 1).len(), 8);
    }

    #[test]
    fn test_free_adjacent_skips_occupied_and_reserved() {
        let mut grid = Grid::new(3, 3);
        grid.insert(nutrient(1, 1, 0)).unwrap();
        assert!(grid.reserve(0, 1));
        assert!(!grid.reserve(0, 1));
        assert_eq!(grid.free_adjacent(0, 0), vec![(1, 1)]);
        grid.release(0, 1);
        assert_eq!(grid.free_adjacent(0, 0), vec![(0, 1), (1, 1)]);
    }

    #[test]
    fn test_counts_include_absent_kinds() {
        let mut grid = Grid::new(3, 3);
        grid.insert(nutrient(1, 0, 0)).unwrap();
        let counts = grid.counts();
        assert_eq!(counts[&ActorKind::Nutrient], 1);
        assert_eq!(counts[&ActorKind::Eagle], 0);
        assert_eq!(counts.len(), ActorKind::ALL.len());
    }

    #[test]
    fn test_spatial_index_filters_actors() {
        let mut grid = Grid::new(8, 8);
        grid.insert(nutrient(1, 2, 2)).unwrap();
        grid.insert(nutrient(2, 6, 6)).unwrap();
        let tree = grid.spatial_index(|a| a.position().0 > 4);
        assert_eq!(tree.len(), 1);
        let hit = tree.nearest(0.0, 0.0, 20.0, |_| true).unwrap();
        assert_eq!(hit.data, ActorId::new(ActorKind::Nutrient, 2));
    }
}
