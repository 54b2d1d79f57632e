//! Single-linkage clustering used to merge repeated hole observations.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use seekscan_core::Point2D;

fn point_order(a: &Point2D, b: &Point2D) -> Ordering {
    a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y))
}

fn find(parent: &mut [usize], mut idx: usize) -> usize {
    while parent[idx] != idx {
        parent[idx] = parent[parent[idx]];
        idx = parent[idx];
    }
    idx
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
        parent[hi] = lo;
    }
}

/// Cluster label per input point.
///
/// Points are linked when their distance is at most `threshold`; clusters are
/// the connected components. Labels are numbered by the smallest member in
/// (x, y) order, so they do not depend on the input ordering.
pub fn cluster_labels(points: &[Point2D], threshold: f64) -> Vec<usize> {
    let n = points.len();
    let mut parent: Vec<usize> = (0..n).collect();
    for i in 0..n {
        for j in (i + 1)..n {
            if points[i].distance(&points[j]) <= threshold {
                union(&mut parent, i, j);
            }
        }
    }

    let mut roots: BTreeMap<usize, Point2D> = BTreeMap::new();
    for (idx, point) in points.iter().enumerate() {
        let root = find(&mut parent, idx);
        roots
            .entry(root)
            .and_modify(|smallest| {
                if point_order(point, smallest) == Ordering::Less {
                    *smallest = *point;
                }
            })
            .or_insert(*point);
    }
    let mut ordered: Vec<(usize, Point2D)> = roots.into_iter().collect();
    ordered.sort_by(|a, b| point_order(&a.1, &b.1));
    let label_of: BTreeMap<usize, usize> = ordered
        .iter()
        .enumerate()
        .map(|(label, (root, _))| (*root, label))
        .collect();

    (0..n)
        .map(|idx| {
            let root = find(&mut parent, idx);
            label_of[&root]
        })
        .collect()
}

/// Merges points closer than `threshold` into their coordinate-wise mean.
///
/// One point per cluster, sorted by (x, y).
pub fn cluster_mean(points: &[Point2D], threshold: f64) -> Vec<Point2D> {
    let labels = cluster_labels(points, threshold);
    let mut members: BTreeMap<usize, Vec<Point2D>> = BTreeMap::new();
    for (point, label) in points.iter().zip(labels) {
        members.entry(label).or_default().push(*point);
    }
    let mut merged: Vec<Point2D> = members
        .into_values()
        .filter_map(|mut group| {
            // Fixed summation order keeps the mean bit-identical under permutation.
            group.sort_by(point_order);
            Point2D::mean(&group)
        })
        .collect();
    merged.sort_by(point_order);
    merged
}
