
use std::cmp::Ordering;

use bbox::BBox;
use primitive::{Intersection, Primitive};
use ray::Ray;
use vec::EPS;

const TRAVERSE_STEP_COST: f32 = 0.3;
const INTERSECTION_COST: f32 = 1.0;
/// Cost bonus for splits that cut off empty space.
const EMPTY_SIDE_FACTOR: f32 = 0.8;

/// Hits are accepted while their distance is inside the current leaf's
/// parametric slab; the slack absorbs f32 rounding of the slab bounds.
const SLAB_SLACK: f32 = 1e-4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SplitPlane {
    pub dimension: usize,
    pub position: f32,
}

/// Ordered so that, at one coordinate, primitives ending there are
/// counted out before planar ones are placed and new ones are counted in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum EventKind {
    End,
    Planar,
    Start,
}

struct SplitEvent {
    position: f32,
    kind: EventKind,
}

struct SplitCandidate {
    plane: SplitPlane,
    cost: f32,
    planars_left: bool,
}

/// Surface-area-heuristic kd-tree over the scene's primitive vector.
/// Leaves store indices into that vector; the scene stays the owner.
pub struct KdTree {
    root: KdTreeNode,
}

#[derive(Debug, PartialEq)]
pub struct KdTreeNode {
    bounds: BBox,
    kind: NodeKind,
}

#[derive(Debug, PartialEq)]
enum NodeKind {
    Leaf { primitives: Vec<u32> },
    Internal {
        plane: SplitPlane,
        left: Box<KdTreeNode>,
        right: Box<KdTreeNode>,
    },
}

impl KdTreeNode {
    pub fn bounds(&self) -> &BBox {
        &self.bounds
    }

    pub fn split_plane(&self) -> Option<&SplitPlane> {
        match self.kind {
            NodeKind::Leaf { .. } => None,
            NodeKind::Internal { ref plane, .. } => Some(plane),
        }
    }

    pub fn children(&self) -> Option<(&KdTreeNode, &KdTreeNode)> {
        match self.kind {
            NodeKind::Leaf { .. } => None,
            NodeKind::Internal { ref left, ref right, .. } => Some((&**left, &**right)),
        }
    }

    pub fn primitives(&self) -> Option<&[u32]> {
        match self.kind {
            NodeKind::Leaf { ref primitives } => Some(primitives),
            NodeKind::Internal { .. } => None,
        }
    }
}

impl KdTree {
    pub fn build(primitives: &[Primitive]) -> KdTree {
        let mut bounds = BBox::empty();
        for primitive in primitives {
            bounds = bounds.union(&primitive.bbox());
        }
        let indices: Vec<u32> = (0..primitives.len() as u32).collect();
        let max_depth = if primitives.is_empty() {
            0
        } else {
            (8.0 + 1.3 * (primitives.len() as f32).log2()).round() as u32
        };
        let root = build_node(primitives, indices, bounds, 0, max_depth);
        info!("kd-tree built over {} primitives", primitives.len());
        KdTree { root: root }
    }

    pub fn root(&self) -> &KdTreeNode {
        &self.root
    }

    /// Nearest intersection along the ray among all indexed primitives.
    pub fn traverse<'a>(&self, ray: &Ray, primitives: &'a [Primitive])
                        -> Option<Intersection<'a>> {
        let (t_in, t_out) = match self.root.bounds.clip_ray(ray) {
            Some(range) => range,
            None => return None,
        };
        traverse_node(&self.root, ray, t_in, t_out, primitives)
    }
}

fn build_node(primitives: &[Primitive],
              indices: Vec<u32>,
              bounds: BBox,
              depth: u32,
              max_depth: u32)
              -> KdTreeNode {
    if indices.is_empty() || depth >= max_depth {
        return KdTreeNode {
            bounds: bounds,
            kind: NodeKind::Leaf { primitives: indices },
        };
    }

    let candidate = match best_split(primitives, &indices, &bounds) {
        // splitting must beat intersecting everything in place
        Some(c) if c.cost <= INTERSECTION_COST * indices.len() as f32 => c,
        _ => {
            return KdTreeNode {
                bounds: bounds,
                kind: NodeKind::Leaf { primitives: indices },
            };
        }
    };

    let plane = candidate.plane;
    let (left_bounds, right_bounds) = bounds.split(plane.dimension, plane.position);
    let mut left = Vec::new();
    let mut right = Vec::new();
    for &index in &indices {
        let clipped = primitives[index as usize].clip(&bounds);
        if clipped.is_empty() {
            continue;
        }
        if clipped.is_planar(plane.dimension)
           && (clipped.min[plane.dimension] - plane.position).abs() < EPS {
            if candidate.planars_left {
                left.push(index);
            } else {
                right.push(index);
            }
        } else {
            if clipped.min[plane.dimension] < plane.position {
                left.push(index);
            }
            if clipped.max[plane.dimension] > plane.position {
                right.push(index);
            }
        }
    }

    KdTreeNode {
        bounds: bounds,
        kind: NodeKind::Internal {
            plane: plane,
            left: Box::new(build_node(primitives, left, left_bounds, depth + 1, max_depth)),
            right: Box::new(build_node(primitives, right, right_bounds, depth + 1, max_depth)),
        },
    }
}

/// Sweep candidate planes in every dimension. Strictly-better comparison
/// keeps the first of equally good candidates, so ties break towards the
/// lower dimension and then the smaller position.
fn best_split(primitives: &[Primitive], indices: &[u32], bounds: &BBox)
              -> Option<SplitCandidate> {
    let node_area = bounds.surface_area();
    if node_area < EPS {
        return None;
    }

    let mut best: Option<SplitCandidate> = None;
    for dim in 0..3 {
        let mut events = Vec::with_capacity(indices.len() * 2);
        let mut total = 0usize;
        for &index in indices {
            let clipped = primitives[index as usize].clip(bounds);
            if clipped.is_empty() {
                continue;
            }
            total += 1;
            if clipped.is_planar(dim) {
                events.push(SplitEvent {
                    position: clipped.min[dim],
                    kind: EventKind::Planar,
                });
            } else {
                events.push(SplitEvent {
                    position: clipped.min[dim],
                    kind: EventKind::Start,
                });
                events.push(SplitEvent {
                    position: clipped.max[dim],
                    kind: EventKind::End,
                });
            }
        }
        events.sort_by(|a, b| {
            a.position
                .partial_cmp(&b.position)
                .unwrap_or(Ordering::Equal)
                .then(a.kind.cmp(&b.kind))
        });

        let mut n_left = 0usize;
        let mut n_right = total;
        let mut i = 0;
        while i < events.len() {
            let position = events[i].position;
            let mut ending = 0;
            let mut planar = 0;
            let mut starting = 0;
            while i < events.len() && events[i].position == position
                  && events[i].kind == EventKind::End {
                ending += 1;
                i += 1;
            }
            while i < events.len() && events[i].position == position
                  && events[i].kind == EventKind::Planar {
                planar += 1;
                i += 1;
            }
            while i < events.len() && events[i].position == position
                  && events[i].kind == EventKind::Start {
                starting += 1;
                i += 1;
            }

            n_right -= ending + planar;
            // only planes strictly interior to the node can split it
            if position > bounds.min[dim] + EPS && position < bounds.max[dim] - EPS {
                let (cost, planars_left) =
                    split_cost(bounds, dim, position, node_area, n_left, planar, n_right);
                let better = match best {
                    None => true,
                    Some(ref b) => cost < b.cost,
                };
                if better {
                    best = Some(SplitCandidate {
                        plane: SplitPlane {
                            dimension: dim,
                            position: position,
                        },
                        cost: cost,
                        planars_left: planars_left,
                    });
                }
            }
            n_left += starting + planar;
        }
    }
    best
}

/// SAH cost of a candidate plane, evaluated with the planar primitives on
/// either side; the cheaper placement wins and is recorded.
fn split_cost(bounds: &BBox,
              dim: usize,
              position: f32,
              node_area: f32,
              n_left: usize,
              n_planar: usize,
              n_right: usize)
              -> (f32, bool) {
    let (left_bounds, right_bounds) = bounds.split(dim, position);
    let p_left = left_bounds.surface_area() / node_area;
    let p_right = right_bounds.surface_area() / node_area;

    let factor = |nl: usize, nr: usize| {
        if nl == 0 || nr == 0 {
            EMPTY_SIDE_FACTOR
        } else {
            1.0
        }
    };
    let cost_left = factor(n_left + n_planar, n_right)
        * (TRAVERSE_STEP_COST
           + INTERSECTION_COST
             * (p_left * (n_left + n_planar) as f32 + p_right * n_right as f32));
    let cost_right = factor(n_left, n_right + n_planar)
        * (TRAVERSE_STEP_COST
           + INTERSECTION_COST
             * (p_left * n_left as f32 + p_right * (n_right + n_planar) as f32));

    if cost_left <= cost_right {
        (cost_left, true)
    } else {
        (cost_right, false)
    }
}

fn traverse_node<'a>(node: &KdTreeNode,
                     ray: &Ray,
                     t_in: f32,
                     t_out: f32,
                     primitives: &'a [Primitive])
                     -> Option<Intersection<'a>> {
    match node.kind {
        NodeKind::Leaf { primitives: ref leaf } => {
            let mut nearest: Option<Intersection<'a>> = None;
            for &index in leaf {
                if let Some(hit) = primitives[index as usize].intersect(ray) {
                    if hit.distance <= t_out + SLAB_SLACK {
                        let closer = match nearest {
                            None => true,
                            Some(ref n) => hit.distance < n.distance,
                        };
                        if closer {
                            nearest = Some(hit);
                        }
                    }
                }
            }
            nearest
        }
        NodeKind::Internal { ref plane, ref left, ref right } => {
            let origin = ray.origin[plane.dimension];
            let dir = ray.direction[plane.dimension];
            if dir == 0.0 {
                // parallel to the plane: only the side holding the origin
                let side = if origin < plane.position { left } else { right };
                return traverse_node(side, ray, t_in, t_out, primitives);
            }

            // near child is the one crossed before the plane
            let (near, far) = if dir > 0.0 {
                (left, right)
            } else {
                (right, left)
            };
            let t = (plane.position - origin) / dir;
            if t <= t_in {
                traverse_node(far, ray, t_in, t_out, primitives)
            } else if t >= t_out {
                traverse_node(near, ray, t_in, t_out, primitives)
            } else {
                if let Some(hit) = traverse_node(near, ray, t_in, t, primitives) {
                    return Some(hit);
                }
                traverse_node(far, ray, t, t_out, primitives)
            }
        }
    }
}
