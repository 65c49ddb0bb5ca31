//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! The tree is stored flat: nodes live in one `Vec` and reference their
//! children by index, and every leaf owns a contiguous range of a single
//! primitive index array. The structure only knows primitive bounds; callers
//! supply the actual primitive test as a closure, so the same BVH serves the
//! scene (over actors) and triangle meshes (over triangles).
//!
//! Splits use a binned surface area heuristic on the axis of greatest
//! centroid extent.

use prism_math::{Aabb, Ray, Vec3};

/// Leaves at or below this size are never split.
const LEAF_MAX_SIZE: usize = 4;

/// Leaves larger than this are split even if the heuristic prefers a leaf.
const LEAF_HARD_LIMIT: usize = 16;

/// Number of SAH buckets per split.
const BUCKET_COUNT: usize = 12;

/// Relative cost of visiting an interior node vs. testing one primitive.
const TRAVERSAL_COST: f32 = 0.125;

/// Nodes at this depth always become leaves. Keeps the traversal stack bounded.
const MAX_DEPTH: usize = 48;

/// Traversal stack capacity (one entry per level plus the pending sibling).
const STACK_SIZE: usize = MAX_DEPTH + 16;

/// BVH node - either an interior node with two children or a leaf with primitives.
#[derive(Debug, Clone, Copy)]
pub enum BvhNode {
    /// Internal node; children are indices into the node array.
    Interior { bounds: Aabb, left: u32, right: u32 },
    /// Leaf node covering `indices[first..first + count]`.
    Leaf { bounds: Aabb, first: u32, count: u32 },
}

impl BvhNode {
    pub fn bounds(&self) -> &Aabb {
        match self {
            BvhNode::Interior { bounds, .. } | BvhNode::Leaf { bounds, .. } => bounds,
        }
    }
}

/// Flat bounding volume hierarchy over an indexed set of primitives.
///
/// Immutable once built, so it can be traversed from many threads at once.
#[derive(Debug, Clone, Default)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    indices: Vec<u32>,
}

#[derive(Clone, Copy)]
struct Bucket {
    count: usize,
    bounds: Aabb,
}

impl Default for Bucket {
    fn default() -> Self {
        Self {
            count: 0,
            bounds: Aabb::EMPTY,
        }
    }
}

struct Builder<'a> {
    bounds: &'a [Aabb],
    centroids: Vec<Vec3>,
    indices: Vec<u32>,
    nodes: Vec<BvhNode>,
}

impl Bvh {
    /// Build a BVH over primitives given by their bounds.
    ///
    /// Primitive `i` is identified by its position in `bounds`. An empty slice
    /// produces an empty BVH that reports no hits.
    pub fn build(bounds: &[Aabb]) -> Self {
        if bounds.is_empty() {
            return Self::default();
        }

        let mut builder = Builder {
            bounds,
            centroids: bounds.iter().map(|b| b.centroid()).collect(),
            indices: (0..bounds.len() as u32).collect(),
            nodes: Vec::with_capacity(2 * bounds.len()),
        };
        builder.build_node(0, bounds.len(), 0);

        Self {
            nodes: builder.nodes,
            indices: builder.indices,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn primitive_count(&self) -> usize {
        self.indices.len()
    }

    /// Bounds of the whole hierarchy.
    pub fn bounds(&self) -> Aabb {
        self.nodes.first().map(|n| *n.bounds()).unwrap_or(Aabb::EMPTY)
    }

    /// Nodes in storage order. The root is at index 0.
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Nearest-hit traversal.
    ///
    /// `test(primitive, best)` must return the hit distance if the primitive is
    /// hit strictly nearer than `best`. Children are visited nearer-first and
    /// any subtree whose entry distance exceeds the current best is skipped.
    /// Returns the nearest primitive and its distance.
    pub fn nearest<F>(&self, ray: &Ray, mut test: F) -> Option<(usize, f32)>
    where
        F: FnMut(usize, f32) -> Option<f32>,
    {
        let root = self.nodes.first()?;
        let inv_dir = ray.direction.recip();
        let mut best = ray.t_max;
        let mut found = None;

        let entry = root
            .bounds()
            .entry_distance(ray.origin, inv_dir, ray.t_min, best)?;

        let mut stack = [(0u32, 0.0f32); STACK_SIZE];
        stack[0] = (0, entry);
        let mut top = 1;

        while top > 0 {
            top -= 1;
            let (node_index, entry) = stack[top];
            if entry > best {
                continue;
            }

            match self.nodes[node_index as usize] {
                BvhNode::Leaf { first, count, .. } => {
                    let range = first as usize..(first + count) as usize;
                    for &primitive in &self.indices[range] {
                        if let Some(t) = test(primitive as usize, best) {
                            if t < best {
                                best = t;
                                found = Some((primitive as usize, t));
                            }
                        }
                    }
                }
                BvhNode::Interior { left, right, .. } => {
                    let near_left = self.nodes[left as usize]
                        .bounds()
                        .entry_distance(ray.origin, inv_dir, ray.t_min, best);
                    let near_right = self.nodes[right as usize]
                        .bounds()
                        .entry_distance(ray.origin, inv_dir, ray.t_min, best);

                    // Push the farther child first so the nearer one pops next.
                    match (near_left, near_right) {
                        (Some(l), Some(r)) => {
                            let (first, second) = if l <= r {
                                ((right, r), (left, l))
                            } else {
                                ((left, l), (right, r))
                            };
                            stack[top] = first;
                            stack[top + 1] = second;
                            top += 2;
                        }
                        (Some(l), None) => {
                            stack[top] = (left, l);
                            top += 1;
                        }
                        (None, Some(r)) => {
                            stack[top] = (right, r);
                            top += 1;
                        }
                        (None, None) => {}
                    }
                }
            }
        }

        found
    }

    /// Any-hit traversal for occlusion queries.
    ///
    /// `test(primitive, t_max)` returns true if the primitive blocks the ray.
    /// Returns as soon as one primitive does.
    pub fn any<F>(&self, ray: &Ray, mut test: F) -> bool
    where
        F: FnMut(usize, f32) -> bool,
    {
        let Some(root) = self.nodes.first() else {
            return false;
        };
        let inv_dir = ray.direction.recip();
        if root
            .bounds()
            .entry_distance(ray.origin, inv_dir, ray.t_min, ray.t_max)
            .is_none()
        {
            return false;
        }

        let mut stack = [0u32; STACK_SIZE];
        let mut top = 1;

        while top > 0 {
            top -= 1;
            match self.nodes[stack[top] as usize] {
                BvhNode::Leaf { first, count, .. } => {
                    let range = first as usize..(first + count) as usize;
                    if self.indices[range]
                        .iter()
                        .any(|&primitive| test(primitive as usize, ray.t_max))
                    {
                        return true;
                    }
                }
                BvhNode::Interior { left, right, .. } => {
                    for child in [left, right] {
                        if self.nodes[child as usize]
                            .bounds()
                            .entry_distance(ray.origin, inv_dir, ray.t_min, ray.t_max)
                            .is_some()
                        {
                            stack[top] = child;
                            top += 1;
                        }
                    }
                }
            }
        }

        false
    }
}

impl Builder<'_> {
    /// Build the node for `indices[first..end]` and return its index.
    fn build_node(&mut self, first: usize, end: usize, depth: usize) -> u32 {
        let count = end - first;
        let node_index = self.nodes.len() as u32;

        let mut bounds = Aabb::EMPTY;
        let mut centroid_bounds = Aabb::EMPTY;
        for &i in &self.indices[first..end] {
            bounds = Aabb::surrounding(&bounds, &self.bounds[i as usize]);
            centroid_bounds = centroid_bounds.grow(self.centroids[i as usize]);
        }

        let leaf = BvhNode::Leaf {
            bounds,
            first: first as u32,
            count: count as u32,
        };
        self.nodes.push(leaf);

        if count <= LEAF_MAX_SIZE || depth >= MAX_DEPTH {
            return node_index;
        }

        let Some(mid) = self.split(first, end, &bounds, &centroid_bounds) else {
            return node_index;
        };

        let left = self.build_node(first, mid, depth + 1);
        let right = self.build_node(mid, end, depth + 1);
        self.nodes[node_index as usize] = BvhNode::Interior { bounds, left, right };
        node_index
    }

    /// Partition `indices[first..end]` and return the split point, or `None`
    /// if the range should stay a leaf.
    fn split(&mut self, first: usize, end: usize, bounds: &Aabb, centroid_bounds: &Aabb) -> Option<usize> {
        let count = end - first;
        let axis = centroid_bounds.longest_axis();
        let extent = centroid_bounds.axis_interval(axis);

        if extent.size() <= f32::EPSILON {
            // Coincident centroids: the heuristic can't separate them.
            return (count > LEAF_HARD_LIMIT).then(|| self.median_split(first, end, axis));
        }

        let bucket_of = |c: Vec3| -> usize {
            let relative = centroid_bounds.offset(c)[axis];
            ((relative * BUCKET_COUNT as f32) as usize).min(BUCKET_COUNT - 1)
        };

        let mut buckets = [Bucket::default(); BUCKET_COUNT];
        for &i in &self.indices[first..end] {
            let b = &mut buckets[bucket_of(self.centroids[i as usize])];
            b.count += 1;
            b.bounds = Aabb::surrounding(&b.bounds, &self.bounds[i as usize]);
        }

        // Sweep from the right to get suffix areas, then from the left.
        let mut right_area = [0.0f32; BUCKET_COUNT];
        let mut right_count = [0usize; BUCKET_COUNT];
        let mut acc = Aabb::EMPTY;
        let mut n = 0;
        for i in (1..BUCKET_COUNT).rev() {
            acc = Aabb::surrounding(&acc, &buckets[i].bounds);
            n += buckets[i].count;
            right_area[i] = acc.surface_area();
            right_count[i] = n;
        }

        let parent_area = bounds.surface_area().max(f32::MIN_POSITIVE);
        let mut best = (f32::INFINITY, 0);
        let mut acc = Aabb::EMPTY;
        let mut n = 0;
        for i in 0..BUCKET_COUNT - 1 {
            acc = Aabb::surrounding(&acc, &buckets[i].bounds);
            n += buckets[i].count;
            if n == 0 || right_count[i + 1] == 0 {
                continue;
            }
            let cost = TRAVERSAL_COST
                + (n as f32 * acc.surface_area() + right_count[i + 1] as f32 * right_area[i + 1])
                    / parent_area;
            if cost < best.0 {
                best = (cost, i);
            }
        }

        let leaf_cost = count as f32;
        if best.0 >= leaf_cost && count <= LEAF_HARD_LIMIT {
            return None;
        }
        if !best.0.is_finite() {
            return Some(self.median_split(first, end, axis));
        }

        let split_bucket = best.1;
        let centroids = &self.centroids;
        let mid = first
            + partition(&mut self.indices[first..end], |&i| {
                bucket_of(centroids[i as usize]) <= split_bucket
            });

        if mid == first || mid == end {
            return Some(self.median_split(first, end, axis));
        }
        Some(mid)
    }

    fn median_split(&mut self, first: usize, end: usize, axis: usize) -> usize {
        let mid = first + (end - first) / 2;
        let centroids = &self.centroids;
        self.indices[first..end].select_nth_unstable_by(mid - first, |&a, &b| {
            centroids[a as usize][axis].total_cmp(&centroids[b as usize][axis])
        });
        mid
    }
}

/// Move every element matching `pred` to the front; returns how many matched.
fn partition<T, P: Fn(&T) -> bool>(items: &mut [T], pred: P) -> usize {
    let mut boundary = 0;
    for i in 0..items.len() {
        if pred(&items[i]) {
            items.swap(boundary, i);
            boundary += 1;
        }
    }
    boundary
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn random_boxes(rng: &mut StdRng, n: usize) -> Vec<Aabb> {
        (0..n)
            .map(|_| {
                let c = Vec3::new(
                    rng.gen_range(-20.0..20.0),
                    rng.gen_range(-20.0..20.0),
                    rng.gen_range(-20.0..20.0),
                );
                let h = Vec3::new(
                    rng.gen_range(0.1..1.5),
                    rng.gen_range(0.1..1.5),
                    rng.gen_range(0.1..1.5),
                );
                Aabb::from_points(c - h, c + h)
            })
            .collect()
    }

    fn box_distance(b: &Aabb, ray: &Ray, best: f32) -> Option<f32> {
        b.entry_distance(ray.origin, ray.direction.recip(), ray.t_min, best)
    }

    #[test]
    fn test_bvh_empty() {
        let bvh = Bvh::build(&[]);
        assert!(bvh.is_empty());

        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(bvh.nearest(&ray, |_, _| Some(0.0)).is_none());
        assert!(!bvh.any(&ray, |_, _| true));
    }

    #[test]
    fn test_bvh_single_primitive_is_leaf() {
        let boxes = [Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0))];
        let bvh = Bvh::build(&boxes);

        assert_eq!(bvh.node_count(), 1);
        assert!(matches!(bvh.nodes()[0], BvhNode::Leaf { count: 1, .. }));

        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        let (prim, t) = bvh.nearest(&ray, |i, best| box_distance(&boxes[i], &ray, best)).unwrap();
        assert_eq!(prim, 0);
        assert!((t - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_leaves_cover_every_primitive_once() {
        let mut rng = StdRng::seed_from_u64(7);
        let boxes = random_boxes(&mut rng, 300);
        let bvh = Bvh::build(&boxes);

        let mut seen = vec![0u32; boxes.len()];
        for node in bvh.nodes() {
            if let BvhNode::Leaf { first, count, .. } = *node {
                for &i in &bvh.indices[first as usize..(first + count) as usize] {
                    seen[i as usize] += 1;
                }
            }
        }
        assert!(seen.iter().all(|&n| n == 1));
        assert!(bvh.node_count() > 1);
    }

    #[test]
    fn test_nearest_matches_linear_scan() {
        let mut rng = StdRng::seed_from_u64(42);
        let boxes = random_boxes(&mut rng, 200);
        let bvh = Bvh::build(&boxes);

        for _ in 0..500 {
            let origin = Vec3::new(
                rng.gen_range(-30.0..30.0),
                rng.gen_range(-30.0..30.0),
                rng.gen_range(-30.0..30.0),
            );
            let target = Vec3::new(
                rng.gen_range(-20.0..20.0),
                rng.gen_range(-20.0..20.0),
                rng.gen_range(-20.0..20.0),
            );
            let ray = Ray::new(origin, target - origin).with_range(0.001, 1000.0);

            let brute = boxes
                .iter()
                .filter_map(|b| box_distance(b, &ray, ray.t_max))
                .fold(None, |acc: Option<f32>, t| Some(acc.map_or(t, |a| a.min(t))));
            let fast = bvh
                .nearest(&ray, |i, best| box_distance(&boxes[i], &ray, best))
                .map(|(_, t)| t);

            match (brute, fast) {
                (None, None) => {}
                (Some(a), Some(b)) => assert!((a - b).abs() < 1e-4, "brute {a} vs bvh {b}"),
                other => panic!("mismatch: {other:?}"),
            }
        }
    }

    #[test]
    fn test_any_respects_t_max() {
        let boxes = [Aabb::from_points(Vec3::new(-1.0, -1.0, 4.0), Vec3::new(1.0, 1.0, 6.0))];
        let bvh = Bvh::build(&boxes);

        let short = Ray::new(Vec3::ZERO, Vec3::Z).with_range(0.0, 3.0);
        assert!(!bvh.any(&short, |i, t_max| box_distance(&boxes[i], &short, t_max).is_some()));

        let long = Ray::new(Vec3::ZERO, Vec3::Z).with_range(0.0, 10.0);
        assert!(bvh.any(&long, |i, t_max| box_distance(&boxes[i], &long, t_max).is_some()));
    }

    #[test]
    fn test_coincident_centroids_still_build() {
        let boxes = vec![Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0)); 100];
        let bvh = Bvh::build(&boxes);
        assert_eq!(bvh.primitive_count(), 100);

        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        assert!(bvh.nearest(&ray, |i, best| box_distance(&boxes[i], &ray, best)).is_some());
    }
}
