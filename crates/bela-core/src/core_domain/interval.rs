use std::collections::VecDeque;

use crate::core::Span;

// ---------------------------------------------------------------------------
// IntervalMatch — result of many-valued containment matching
// ---------------------------------------------------------------------------

/// Indices refer to the slices passed to [`match_children`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntervalMatch {
    /// `links[p]` holds the children contained in parent `p`, in time order.
    pub links: Vec<Vec<usize>>,
    pub orphans: Vec<usize>,
}

// ---------------------------------------------------------------------------
// SingleMatch — result of single-valued containment matching
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SingleMatch {
    pub links: Vec<Option<usize>>,
    /// `(parent, child)` pairs where the parent already held a child.
    pub conflicts: Vec<(usize, usize)>,
    pub orphans: Vec<usize>,
}

enum Step {
    Link(usize),
    Orphan(usize),
    Stop,
}

/// Walks parents in start order over a front-popped queue of children.
///
/// Both sides are stably sorted by start so equal starts keep their input
/// order. Each child is examined until it is either linked, discarded as
/// orphan (it ends before the current parent starts) or left for a later
/// parent; whatever remains after the last parent is orphaned.
fn walk(parents: &[Span], children: &[Span], mut on_link: impl FnMut(usize, usize)) -> Vec<usize> {
    let mut parent_order: Vec<usize> = (0..parents.len()).collect();
    parent_order.sort_by_key(|&i| parents[i].start);
    let mut child_order: Vec<usize> = (0..children.len()).collect();
    child_order.sort_by_key(|&i| children[i].start);

    let mut queue: VecDeque<usize> = child_order.into();
    let mut orphans = Vec::new();

    for p in parent_order {
        let parent = &parents[p];
        loop {
            let step = match queue.front() {
                None => Step::Stop,
                Some(&c) if parent.contains(&children[c]) => Step::Link(c),
                Some(&c) if children[c].end < parent.start => Step::Orphan(c),
                Some(_) => Step::Stop,
            };
            match step {
                Step::Link(c) => {
                    queue.pop_front();
                    tracing::debug!(parent = p, child = c, "linked");
                    on_link(p, c);
                }
                Step::Orphan(c) => {
                    queue.pop_front();
                    tracing::debug!(child = c, "discarded child ending before parent");
                    orphans.push(c);
                }
                Step::Stop => break,
            }
        }
    }

    orphans.extend(queue);
    orphans
}

/// Links every child to the first parent (in time order) containing it.
pub fn match_children(parents: &[Span], children: &[Span]) -> IntervalMatch {
    let mut links = vec![Vec::new(); parents.len()];
    let orphans = walk(parents, children, |p, c| links[p].push(c));
    IntervalMatch { links, orphans }
}

/// Like [`match_children`] for a single-valued relation: a second contained
/// child is reported as a conflict instead of replacing the first.
pub fn match_single(parents: &[Span], children: &[Span]) -> SingleMatch {
    let mut links = vec![None; parents.len()];
    let mut conflicts = Vec::new();
    let orphans = walk(parents, children, |p, c| {
        if links[p].is_none() {
            links[p] = Some(c);
        } else {
            conflicts.push((p, c));
        }
    });
    SingleMatch {
        links,
        conflicts,
        orphans,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Millis;

    fn span(start: u64, end: u64) -> Span {
        Span::new(Millis::new(start), Millis::new(end))
    }

    #[test]
    fn test_children_link_to_containing_parent() {
        let parents = vec![span(0, 1000), span(1000, 2000)];
        let children = vec![span(0, 400), span(400, 1000), span(1200, 1800)];

        let result = match_children(&parents, &children);
        assert_eq!(result.links, vec![vec![0, 1], vec![2]]);
        assert!(result.orphans.is_empty());
    }

    #[test]
    fn test_unsorted_input_is_matched_by_time() {
        let parents = vec![span(5000, 6000), span(0, 1000)];
        let children = vec![span(5500, 5600), span(100, 200), span(5000, 5100)];

        let result = match_children(&parents, &children);
        assert_eq!(result.links[0], vec![2, 0]);
        assert_eq!(result.links[1], vec![1]);
        assert!(result.orphans.is_empty());
    }

    #[test]
    fn test_child_before_parent_is_orphaned() {
        let parents = vec![span(1000, 2000)];
        let children = vec![span(0, 500), span(1100, 1200)];

        let result = match_children(&parents, &children);
        assert_eq!(result.links, vec![vec![1]]);
        assert_eq!(result.orphans, vec![0]);
    }

    #[test]
    fn test_trailing_children_are_orphaned() {
        let parents = vec![span(0, 1000)];
        let children = vec![span(100, 200), span(3000, 4000), span(5000, 6000)];

        let result = match_children(&parents, &children);
        assert_eq!(result.links, vec![vec![0]]);
        assert_eq!(result.orphans, vec![1, 2]);
    }

    #[test]
    fn test_straddling_child_is_orphaned() {
        // Starts inside the first parent, ends inside the second.
        let parents = vec![span(0, 1000), span(1000, 2000)];
        let children = vec![span(800, 1200)];

        let result = match_children(&parents, &children);
        assert_eq!(result.links, vec![Vec::<usize>::new(), Vec::new()]);
        assert_eq!(result.orphans, vec![0]);
    }

    #[test]
    fn test_empty_parents_orphan_everything() {
        let children = vec![span(0, 10), span(20, 30)];
        let result = match_children(&[], &children);
        assert!(result.links.is_empty());
        assert_eq!(result.orphans, vec![0, 1]);
    }

    #[test]
    fn test_zero_length_parent_contains_zero_length_child() {
        let parents = vec![span(500, 500)];
        let children = vec![span(500, 500)];

        let result = match_children(&parents, &children);
        assert_eq!(result.links, vec![vec![0]]);
        assert!(result.orphans.is_empty());
    }

    #[test]
    fn test_shared_boundary_links_to_first_parent() {
        let parents = vec![span(0, 1000), span(1000, 2000)];
        let children = vec![span(1000, 1000)];

        let result = match_children(&parents, &children);
        assert_eq!(result.links, vec![vec![0], vec![]]);
    }

    #[test]
    fn test_every_contained_child_links_exactly_once() {
        let parents: Vec<Span> = (0..20).map(|i| span(i * 1000, i * 1000 + 900)).collect();
        let children: Vec<Span> = (0..20)
            .flat_map(|i| [span(i * 1000, i * 1000 + 300), span(i * 1000 + 300, i * 1000 + 900)])
            .collect();

        let result = match_children(&parents, &children);
        assert!(result.orphans.is_empty());
        let mut seen: Vec<usize> = result.links.iter().flatten().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..children.len()).collect::<Vec<_>>());
        for (p, linked) in result.links.iter().enumerate() {
            for &c in linked {
                assert!(parents[p].contains(&children[c]));
            }
        }
    }

    #[test]
    fn test_single_match_reports_conflicts() {
        let parents = vec![span(0, 1000), span(2000, 3000)];
        let children = vec![span(0, 1000), span(100, 900), span(2000, 3000)];

        let result = match_single(&parents, &children);
        assert_eq!(result.links, vec![Some(0), Some(2)]);
        assert_eq!(result.conflicts, vec![(0, 1)]);
        assert!(result.orphans.is_empty());
    }

    #[test]
    fn test_single_match_orphans() {
        let parents = vec![span(1000, 2000)];
        let children = vec![span(0, 100), span(2500, 2600)];

        let result = match_single(&parents, &children);
        assert_eq!(result.links, vec![None]);
        assert_eq!(result.orphans, vec![0, 1]);
    }
}
