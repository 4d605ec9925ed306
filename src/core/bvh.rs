// Copyright @yucwang 2026

use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector3f, FLOAT_MAX};
use crate::math::ray::Ray3f;

use std::error::Error;
use std::fmt;

pub const DEFAULT_SPLIT_CANDIDATES: usize = 20;

#[derive(Debug, PartialEq)]
pub enum BvhBuildError {
    EmptyScene,
}

impl fmt::Display for BvhBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BvhBuildError::EmptyScene => write!(f, "cannot build a BVH over an empty scene"),
        }
    }
}

impl Error for BvhBuildError {}

/// One entry of the builder input: a primitive's bounds, its center and its
/// index in the owning storage. The tree never owns primitives.
#[derive(Debug, Clone)]
pub struct BuildRecord {
    pub bounds: AABB,
    pub centroid: Vector3f,
    pub prim: usize,
}

// Leaf XOR interior, enforced by construction
#[derive(Debug, Clone, Copy)]
enum NodeKind {
    Leaf { prim: usize },
    Interior { left: usize, right: usize },
}

#[derive(Debug, Clone)]
struct BvhNode {
    bounds: AABB,
    split_axis: usize,
    kind: NodeKind,
}

/// Flat node layout consumed by the device-side traversal. `-1` marks an
/// absent primitive or child.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatNode {
    pub bounds: AABB,
    pub prim_index: i32,
    pub left_child: i32,
    pub right_child: i32,
}

/// Binary SAH tree with one primitive per leaf. Nodes live in a contiguous
/// index-addressed arena; the tree is immutable once built and safe to
/// traverse from any number of threads.
#[derive(Debug)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    split_candidates: usize,
    max_depth: usize,
}

impl Bvh {
    pub fn build(records: Vec<BuildRecord>) -> Result<Self, BvhBuildError> {
        Self::build_with_candidates(records, DEFAULT_SPLIT_CANDIDATES)
    }

    pub fn build_with_candidates(
        mut records: Vec<BuildRecord>,
        split_candidates: usize,
    ) -> Result<Self, BvhBuildError> {
        if records.is_empty() {
            return Err(BvhBuildError::EmptyScene);
        }

        let count = records.len();
        let mut bvh = Self {
            nodes: Vec::with_capacity(2 * count),
            split_candidates: split_candidates.max(1),
            max_depth: 0,
        };
        bvh.build_range(&mut records, 0, count, 0);

        log::info!(
            "BVH built: {} nodes over {} primitives, max depth {}.",
            bvh.nodes.len(),
            count,
            bvh.max_depth
        );

        Ok(bvh)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    fn push_leaf(&mut self, record: &BuildRecord) -> usize {
        let node_idx = self.nodes.len();
        self.nodes.push(BvhNode {
            bounds: record.bounds,
            split_axis: 0,
            kind: NodeKind::Leaf { prim: record.prim },
        });
        node_idx
    }

    fn build_range(
        &mut self,
        records: &mut Vec<BuildRecord>,
        first: usize,
        last: usize,
        depth: usize,
    ) -> usize {
        self.max_depth = self.max_depth.max(depth);

        let count = last - first;
        if count == 1 {
            return self.push_leaf(&records[first]);
        }

        let mut bounds = AABB::default();
        for record in &records[first..last] {
            bounds.expand_by_aabb(&record.bounds);
        }

        if bounds.surface_area() <= 0.0 {
            // Coincident primitives leave nothing to split on
            log::warn!(
                "degenerate bounds over {} primitives, emitting a single leaf",
                count
            );
            return self.push_leaf(&records[first]);
        }

        let axis = bounds.largest_axis();
        let middle = self.split_sah(records, first, last, &bounds, axis);

        let node_idx = self.nodes.len();
        self.nodes.push(BvhNode {
            bounds,
            split_axis: axis,
            kind: NodeKind::Leaf { prim: 0 },
        });

        let left = self.build_range(records, first, middle, depth + 1);
        let right = self.build_range(records, middle, last, depth + 1);
        self.nodes[node_idx].kind = NodeKind::Interior { left, right };

        node_idx
    }

    /// Sweep evenly spaced candidate coordinates along the split axis and
    /// keep the one minimizing
    /// (leftCount·leftArea + rightCount·rightArea) / parentArea.
    /// Ties go to the lowest coordinate.
    fn split_sah(
        &self,
        records: &mut Vec<BuildRecord>,
        first: usize,
        last: usize,
        bounds: &AABB,
        axis: usize,
    ) -> usize {
        let start = bounds.p_min[axis];
        let end = bounds.p_max[axis];
        let step = (end - start).abs() / ((self.split_candidates + 1) as Float);

        let parent_area = bounds.surface_area();

        let mut best_cost = FLOAT_MAX;
        let mut best_split = start;

        for i in 0..self.split_candidates {
            let split = start + step * ((i + 1) as Float);

            let mut left = AABB::default();
            let mut right = AABB::default();
            let mut left_count = 0usize;
            let mut right_count = 0usize;

            for record in &records[first..last] {
                if record.centroid[axis] <= split {
                    left.expand_by_aabb(&record.bounds);
                    left_count += 1;
                } else {
                    right.expand_by_aabb(&record.bounds);
                    right_count += 1;
                }
            }

            let left_area = if left_count > 0 { left.surface_area() } else { 0.0 };
            let right_area = if right_count > 0 { right.surface_area() } else { 0.0 };
            let cost = ((left_count as Float) * left_area + (right_count as Float) * right_area)
                / parent_area;

            if cost < best_cost {
                best_cost = cost;
                best_split = split;
            }
        }

        self.split_at(records, first, last, axis, best_split)
    }

    /// Stable in-place partition at the chosen coordinate. A one-sided
    /// result falls back to the equal-count median split.
    fn split_at(
        &self,
        records: &mut Vec<BuildRecord>,
        first: usize,
        last: usize,
        axis: usize,
        split: Float,
    ) -> usize {
        records[first..last].sort_by_key(|record| record.centroid[axis] > split);

        let left_count = records[first..last]
            .iter()
            .take_while(|record| record.centroid[axis] <= split)
            .count();
        let middle = first + left_count;

        if middle == first || middle == last {
            return self.split_equal(records, first, last, axis);
        }

        middle
    }

    fn split_equal(
        &self,
        records: &mut Vec<BuildRecord>,
        first: usize,
        last: usize,
        axis: usize,
    ) -> usize {
        let middle = (first + last) / 2;
        records[first..last].select_nth_unstable_by(middle - first, |a, b| {
            a.centroid[axis]
                .partial_cmp(&b.centroid[axis])
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        middle
    }

    /// Nearest intersection over the tree. The callback resolves a leaf's
    /// primitive index into a hit distance; the traversal owns the pruning.
    pub fn find_nearest<F>(&self, ray: &Ray3f, mut prim_fn: F) -> Option<(usize, Float)>
    where
        F: FnMut(usize, &Ray3f) -> Option<Float>,
    {
        if self.nodes.is_empty() {
            return None;
        }

        let dir = ray.dir();
        let dir_sign = ((dir.x > 0.0) as usize)
            | (((dir.y > 0.0) as usize) << 1)
            | (((dir.z > 0.0) as usize) << 2);

        let mut best_t = FLOAT_MAX;
        let mut best_prim: Option<usize> = None;
        self.intersect_node(0, ray, dir_sign, &mut best_t, &mut best_prim, &mut prim_fn);

        best_prim.map(|prim| (prim, best_t))
    }

    fn intersect_node<F>(
        &self,
        node_idx: usize,
        ray: &Ray3f,
        dir_sign: usize,
        best_t: &mut Float,
        best_prim: &mut Option<usize>,
        prim_fn: &mut F,
    ) where
        F: FnMut(usize, &Ray3f) -> Option<Float>,
    {
        let node = &self.nodes[node_idx];

        match node.bounds.intersect_fast(ray) {
            Some(t_near) if t_near < *best_t => {}
            _ => return,
        }

        match node.kind {
            NodeKind::Leaf { prim } => {
                if let Some(t) = prim_fn(prim, ray) {
                    if t < *best_t {
                        *best_t = t;
                        *best_prim = Some(prim);
                    }
                }
            }
            NodeKind::Interior { left, right } => {
                // Visit the child the ray points toward first so the
                // shrinking best distance prunes the far child
                if dir_sign & (1 << node.split_axis) != 0 {
                    self.intersect_node(left, ray, dir_sign, best_t, best_prim, prim_fn);
                    self.intersect_node(right, ray, dir_sign, best_t, best_prim, prim_fn);
                } else {
                    self.intersect_node(right, ray, dir_sign, best_t, best_prim, prim_fn);
                    self.intersect_node(left, ray, dir_sign, best_t, best_prim, prim_fn);
                }
            }
        }
    }

    /// True as soon as any primitive hits closer than `max_distance`.
    pub fn occluded<F>(&self, ray: &Ray3f, max_distance: Float, mut prim_fn: F) -> bool
    where
        F: FnMut(usize, &Ray3f) -> Option<Float>,
    {
        if self.nodes.is_empty() {
            return false;
        }

        self.occluded_node(0, ray, max_distance, &mut prim_fn)
    }

    fn occluded_node<F>(
        &self,
        node_idx: usize,
        ray: &Ray3f,
        max_distance: Float,
        prim_fn: &mut F,
    ) -> bool
    where
        F: FnMut(usize, &Ray3f) -> Option<Float>,
    {
        let node = &self.nodes[node_idx];

        match node.bounds.intersect_fast(ray) {
            Some(t_near) if t_near < max_distance => {}
            _ => return false,
        }

        match node.kind {
            NodeKind::Leaf { prim } => prim_fn(prim, ray).map_or(false, |t| t < max_distance),
            NodeKind::Interior { left, right } => {
                self.occluded_node(left, ray, max_distance, prim_fn)
                    || self.occluded_node(right, ray, max_distance, prim_fn)
            }
        }
    }

    /// Preorder flat form with the root at index 0, ready for upload to a
    /// non-recursive device traversal.
    pub fn flatten(&self) -> Vec<FlatNode> {
        let mut flat = Vec::with_capacity(self.nodes.len());
        if !self.nodes.is_empty() {
            self.flatten_node(0, &mut flat);
        }
        flat
    }

    fn flatten_node(&self, node_idx: usize, flat: &mut Vec<FlatNode>) -> i32 {
        let node = &self.nodes[node_idx];

        let flat_idx = flat.len();
        flat.push(FlatNode {
            bounds: node.bounds,
            prim_index: -1,
            left_child: -1,
            right_child: -1,
        });

        match node.kind {
            NodeKind::Leaf { prim } => {
                flat[flat_idx].prim_index = prim as i32;
            }
            NodeKind::Interior { left, right } => {
                flat[flat_idx].left_child = self.flatten_node(left, flat);
                flat[flat_idx].right_child = self.flatten_node(right, flat);
            }
        }

        flat_idx as i32
    }
}

/// Iterative nearest-hit traversal of the flat form, explicit stack instead
/// of recursion. Mirrors what the device kernel does and doubles as the
/// parity check for `flatten`.
pub fn find_nearest_flat<F>(nodes: &[FlatNode], ray: &Ray3f, mut prim_fn: F) -> Option<(usize, Float)>
where
    F: FnMut(usize, &Ray3f) -> Option<Float>,
{
    if nodes.is_empty() {
        return None;
    }

    let mut best_t = FLOAT_MAX;
    let mut best_prim: Option<usize> = None;

    let mut stack: Vec<i32> = Vec::with_capacity(64);
    stack.push(0);

    while let Some(node_idx) = stack.pop() {
        let node = &nodes[node_idx as usize];

        match node.bounds.intersect_fast(ray) {
            Some(t_near) if t_near < best_t => {}
            _ => continue,
        }

        if node.prim_index >= 0 {
            if let Some(t) = prim_fn(node.prim_index as usize, ray) {
                if t < best_t {
                    best_t = t;
                    best_prim = Some(node.prim_index as usize);
                }
            }
        } else {
            if node.right_child >= 0 {
                stack.push(node.right_child);
            }
            if node.left_child >= 0 {
                stack.push(node.left_child);
            }
        }
    }

    best_prim.map(|prim| (prim, best_t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::LcgRng;
    use crate::shapes::{Primitive, Sphere};

    fn random_spheres(n: usize, seed: u64) -> Vec<Primitive> {
        let mut rng = LcgRng::new(seed);
        let mut spheres = Vec::with_capacity(n);
        for _ in 0..n {
            let center = Vector3f::new(
                rng.next_f32() * 20.0 - 10.0,
                rng.next_f32() * 20.0 - 10.0,
                rng.next_f32() * 20.0 - 10.0,
            );
            let radius = 0.2 + rng.next_f32();
            spheres.push(Primitive::Sphere(Sphere::new(center, radius)));
        }
        spheres
    }

    fn records_for(prims: &[Primitive]) -> Vec<BuildRecord> {
        prims
            .iter()
            .enumerate()
            .map(|(i, prim)| BuildRecord {
                bounds: prim.bounding_box(),
                centroid: prim.center(),
                prim: i,
            })
            .collect()
    }

    fn random_ray(rng: &mut LcgRng) -> Ray3f {
        let origin = Vector3f::new(
            rng.next_f32() * 40.0 - 20.0,
            rng.next_f32() * 40.0 - 20.0,
            rng.next_f32() * 40.0 - 20.0,
        );
        let mut dir = Vector3f::new(0.0, 0.0, 0.0);
        for idx in 0..3 {
            let v = rng.next_f32() * 2.0 - 1.0;
            dir[idx] = if v >= 0.0 { v + 0.05 } else { v - 0.05 };
        }
        Ray3f::new(origin, dir)
    }

    #[test]
    fn test_empty_scene_is_an_error() {
        assert_eq!(Bvh::build(Vec::new()).unwrap_err(), BvhBuildError::EmptyScene);
    }

    #[test]
    fn test_every_primitive_in_exactly_one_leaf() {
        let prims = random_spheres(64, 3);
        let bvh = Bvh::build(records_for(&prims)).unwrap();

        let mut leaf_counts = vec![0usize; prims.len()];
        for node in &bvh.nodes {
            if let NodeKind::Leaf { prim } = node.kind {
                leaf_counts[prim] += 1;
            }
        }
        for (i, count) in leaf_counts.iter().enumerate() {
            assert_eq!(*count, 1, "primitive {} held by {} leaves", i, count);
        }
    }

    #[test]
    fn test_ancestors_enclose_descendants() {
        let prims = random_spheres(64, 5);
        let bvh = Bvh::build(records_for(&prims)).unwrap();

        // Parent-encloses-child at every edge gives enclosure along any
        // root-to-leaf path by induction
        for node in &bvh.nodes {
            if let NodeKind::Interior { left, right } = node.kind {
                assert!(node.bounds.encloses_aabb(&bvh.nodes[left].bounds));
                assert!(node.bounds.encloses_aabb(&bvh.nodes[right].bounds));
            }
        }

        for (i, prim) in prims.iter().enumerate() {
            let prim_bounds = prim.bounding_box();
            for node in &bvh.nodes {
                if let NodeKind::Leaf { prim: leaf_prim } = node.kind {
                    if leaf_prim == i {
                        assert!(node.bounds.encloses_aabb(&prim_bounds));
                    }
                }
            }
        }
    }

    #[test]
    fn test_median_fallback_on_shared_centroids() {
        // Concentric spheres: every centroid is identical, so every SAH
        // candidate produces a one-sided partition
        let mut prims = Vec::new();
        for i in 0..8 {
            prims.push(Primitive::Sphere(Sphere::new(
                Vector3f::new(0.0, 0.0, 0.0),
                0.5 + i as Float * 0.25,
            )));
        }
        let bvh = Bvh::build(records_for(&prims)).unwrap();

        let leaf_count = bvh
            .nodes
            .iter()
            .filter(|node| matches!(node.kind, NodeKind::Leaf { .. }))
            .count();
        assert_eq!(leaf_count, prims.len());
    }

    #[test]
    fn test_nearest_matches_brute_force() {
        let prims = random_spheres(128, 9);
        let bvh = Bvh::build(records_for(&prims)).unwrap();

        let mut rng = LcgRng::new(77);
        for _ in 0..1000 {
            let ray = random_ray(&mut rng);

            let bvh_hit = bvh.find_nearest(&ray, |i, ray| prims[i].intersect(ray));

            let mut brute: Option<(usize, Float)> = None;
            for (i, prim) in prims.iter().enumerate() {
                if let Some(t) = prim.intersect(&ray) {
                    if brute.map_or(true, |(_, best)| t < best) {
                        brute = Some((i, t));
                    }
                }
            }

            match (bvh_hit, brute) {
                (Some((_, t0)), Some((_, t1))) => assert!((t0 - t1).abs() < 1e-4),
                (None, None) => {}
                (a, b) => panic!("BVH {:?} disagrees with brute force {:?}", a, b),
            }
        }
    }

    #[test]
    fn test_occlusion_query() {
        let prims = vec![Primitive::Sphere(Sphere::new(Vector3f::new(0.0, 0.0, -5.0), 1.0))];
        let bvh = Bvh::build(records_for(&prims)).unwrap();

        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 0.0), Vector3f::new(0.0, 0.0, -1.0));
        assert!(bvh.occluded(&ray, 10.0, |i, ray| prims[i].intersect(ray)));
        // Blocker sits beyond the queried segment
        assert!(!bvh.occluded(&ray, 3.0, |i, ray| prims[i].intersect(ray)));

        let miss = Ray3f::new(Vector3f::new(0.0, 0.0, 0.0), Vector3f::new(0.0, 0.0, 1.0));
        assert!(!bvh.occluded(&miss, 10.0, |i, ray| prims[i].intersect(ray)));
    }

    #[test]
    fn test_flat_form_matches_tree_traversal() {
        let prims = random_spheres(96, 21);
        let bvh = Bvh::build(records_for(&prims)).unwrap();
        let flat = bvh.flatten();

        assert_eq!(flat.len(), bvh.node_count());
        // Root first, leaves carry a primitive XOR children
        assert_eq!(flat[0].bounds, bvh.nodes[0].bounds);
        for node in &flat {
            if node.prim_index >= 0 {
                assert_eq!(node.left_child, -1);
                assert_eq!(node.right_child, -1);
            } else {
                assert!(node.left_child >= 0 && node.right_child >= 0);
            }
        }

        let mut rng = LcgRng::new(33);
        for _ in 0..10_000 {
            let ray = random_ray(&mut rng);

            let tree_hit = bvh.find_nearest(&ray, |i, ray| prims[i].intersect(ray));
            let flat_hit = find_nearest_flat(&flat, &ray, |i, ray| prims[i].intersect(ray));

            match (tree_hit, flat_hit) {
                (Some((p0, t0)), Some((p1, t1))) => {
                    assert_eq!(p0, p1);
                    assert!((t0 - t1).abs() < 1e-5);
                }
                (None, None) => {}
                (a, b) => panic!("flat traversal {:?} disagrees with tree {:?}", b, a),
            }
        }
    }
}
