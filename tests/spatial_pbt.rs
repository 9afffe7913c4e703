use meadow_core::quadtree::{Point, QuadTree, Rect};
use meadow_core::trie::Trie;
use proptest::prelude::*;
use std::collections::BTreeSet;

prop_compose! {
    fn arb_cells(max: usize)(
        cells in prop::collection::vec((0u16..32, 0u16..32), 0..max)
    ) -> Vec<(u16, u16)> {
        cells
    }
}

fn build(cells: &[(u16, u16)], capacity: usize) -> QuadTree<usize> {
    let mut tree = QuadTree::new(Rect::from_grid(32, 32), capacity);
    for (i, &(x, y)) in cells.iter().enumerate() {
        assert!(tree.insert(Point::new(f64::from(x), f64::from(y), i)));
    }
    tree
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn test_quadtree_query_matches_brute_force(
        cells in arb_cells(200),
        capacity in 1usize..8,
        (cx, cy, r) in (0.0f64..32.0, 0.0f64..32.0, 0.0f64..10.0),
    ) {
        let tree = build(&cells, capacity);
        prop_assert_eq!(tree.len(), cells.len());

        let range = Rect::around(cx, cy, r);
        let mut found: Vec<usize> = tree.query(&range).iter().map(|p| p.data).collect();
        found.sort_unstable();
        let expected: Vec<usize> = cells
            .iter()
            .enumerate()
            .filter(|(_, c)| range.contains(f64::from(c.0), f64::from(c.1)))
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn test_quadtree_nearest_is_closest_lowest(
        cells in arb_cells(120),
        (x, y) in (0u16..32, 0u16..32),
    ) {
        let tree = build(&cells, 4);
        let (qx, qy) = (f64::from(x), f64::from(y));
        let dist = |&(px, py): &(u16, u16)| {
            let dx = f64::from(px) - qx;
            let dy = f64::from(py) - qy;
            dx * dx + dy * dy
        };
        let expected = cells
            .iter()
            .enumerate()
            .filter(|(_, c)| dist(*c) <= 64.0)
            .min_by(|(i, a), (j, b)| dist(*a).total_cmp(&dist(*b)).then(i.cmp(j)))
            .map(|(i, _)| i);
        let found = tree.nearest(qx, qy, 8.0, |_| true).map(|p| p.data);
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn test_trie_search_is_exact_prefix_set(
        words in prop::collection::btree_set("[ab]{0,6}", 0..40),
        prefix in "[ab]{0,3}",
    ) {
        let mut trie = Trie::new();
        for word in &words {
            trie.insert(word);
        }
        let found = trie.search(&prefix);
        if prefix.is_empty() {
            prop_assert!(found.is_empty());
        } else {
            let expected: Vec<String> = words
                .iter()
                .filter(|w| w.starts_with(prefix.as_str()))
                .cloned()
                .collect();
            prop_assert_eq!(found, expected);
        }
        let distinct: BTreeSet<&String> = words.iter().collect();
        prop_assert_eq!(trie.len(), distinct.len());
    }
}
