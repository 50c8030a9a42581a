//! Circle ring construction and planar predicates.
//!
//! The circle overlay is a flat-earth approximation: meters are converted to
//! degree offsets using fixed meters-per-degree factors, which is accurate
//! enough at the sub-kilometer radii this library works with. All predicates
//! operate on plain lon/lat rings, no projection involved.

mod clip;
mod types;

pub use clip::{clip_ways, RoadLine, WayGeometry};
pub use types::{BoundingBox, GeometryError, LonLat};

use std::f64::consts::PI;

/// Meters per degree of latitude.
pub const METERS_PER_DEGREE_LAT: f64 = 110_574.0;

/// Meters per degree of longitude at the equator.
pub const METERS_PER_DEGREE_LON: f64 = 111_320.0;

/// Default number of ring sample points for circle overlays.
pub const DEFAULT_CIRCLE_STEPS: usize = 64;

/// Build a closed polygon ring approximating a circle.
///
/// Samples `steps` points at equal angular increments around `center` and
/// closes the ring by repeating the first point, so the result always has
/// `steps + 1` coordinates.
///
/// # Errors
///
/// Returns [`GeometryError::InvalidRadius`] for a non-positive or non-finite
/// radius and [`GeometryError::InvalidSteps`] for fewer than 3 steps.
pub fn circle_polygon(
    center: LonLat,
    radius_m: f64,
    steps: usize,
) -> Result<Vec<LonLat>, GeometryError> {
    if !radius_m.is_finite() || radius_m <= 0.0 {
        return Err(GeometryError::InvalidRadius(radius_m));
    }
    if steps < 3 {
        return Err(GeometryError::InvalidSteps(steps));
    }

    let dy = radius_m / METERS_PER_DEGREE_LAT;
    let dx = radius_m / (METERS_PER_DEGREE_LON * (center.lat * PI / 180.0).cos());

    let mut ring = Vec::with_capacity(steps + 1);
    for i in 0..steps {
        let angle = (i as f64) * 2.0 * PI / (steps as f64);
        ring.push(LonLat::new(
            center.lon + dx * angle.cos(),
            center.lat + dy * angle.sin(),
        ));
    }
    ring.push(ring[0]);
    Ok(ring)
}

/// Point-in-ring test via ray casting.
///
/// The ring is expected to be closed (first point repeated at the end);
/// an unclosed ring is treated as if the closing edge existed.
pub fn point_in_ring(p: LonLat, ring: &[LonLat]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (ring[i], ring[j]);
        if ((a.lat > p.lat) != (b.lat > p.lat))
            && (p.lon < (b.lon - a.lon) * (p.lat - a.lat) / (b.lat - a.lat) + a.lon)
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Check whether segments `a-b` and `c-d` intersect.
pub fn segments_intersect(a: LonLat, b: LonLat, c: LonLat, d: LonLat) -> bool {
    fn orient(p: LonLat, q: LonLat, r: LonLat) -> f64 {
        (q.lon - p.lon) * (r.lat - p.lat) - (q.lat - p.lat) * (r.lon - p.lon)
    }
    fn on_segment(p: LonLat, q: LonLat, r: LonLat) -> bool {
        r.lon >= p.lon.min(q.lon)
            && r.lon <= p.lon.max(q.lon)
            && r.lat >= p.lat.min(q.lat)
            && r.lat <= p.lat.max(q.lat)
    }

    let o1 = orient(a, b, c);
    let o2 = orient(a, b, d);
    let o3 = orient(c, d, a);
    let o4 = orient(c, d, b);

    if (o1 > 0.0) != (o2 > 0.0) && (o3 > 0.0) != (o4 > 0.0) {
        return true;
    }
    // Collinear touch cases
    (o1 == 0.0 && on_segment(a, b, c))
        || (o2 == 0.0 && on_segment(a, b, d))
        || (o3 == 0.0 && on_segment(c, d, a))
        || (o4 == 0.0 && on_segment(c, d, b))
}

/// Check whether any segment of `line` crosses the ring boundary.
pub fn line_intersects_ring(line: &[LonLat], ring: &[LonLat]) -> bool {
    if line.len() < 2 || ring.len() < 2 {
        return false;
    }
    for seg in line.windows(2) {
        for edge in ring.windows(2) {
            if segments_intersect(seg[0], seg[1], edge[0], edge[1]) {
                return true;
            }
        }
    }
    false
}

/// Check whether every point of `line` lies inside the ring.
///
/// For the convex circle rings built by [`circle_polygon`] this is
/// equivalent to full containment of the line.
pub fn line_within_ring(line: &[LonLat], ring: &[LonLat]) -> bool {
    !line.is_empty() && line.iter().all(|p| point_in_ring(*p, ring))
}

/// Clip segment `a-b` to a bounding box (Liang-Barsky).
///
/// Returns the clipped segment endpoints, or `None` if the segment lies
/// entirely outside the box.
pub fn clip_segment_to_bbox(a: LonLat, b: LonLat, bbox: &BoundingBox) -> Option<(LonLat, LonLat)> {
    let dx = b.lon - a.lon;
    let dy = b.lat - a.lat;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    let edges = [
        (-dx, a.lon - bbox.min_lon),
        (dx, bbox.max_lon - a.lon),
        (-dy, a.lat - bbox.min_lat),
        (dy, bbox.max_lat - a.lat),
    ];
    for (p, q) in edges {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                if r > t1 {
                    return None;
                }
                if r > t0 {
                    t0 = r;
                }
            } else {
                if r < t0 {
                    return None;
                }
                if r < t1 {
                    t1 = r;
                }
            }
        }
    }

    Some((
        LonLat::new(a.lon + t0 * dx, a.lat + t0 * dy),
        LonLat::new(a.lon + t1 * dx, a.lat + t1 * dy),
    ))
}

/// Clip a line to a bounding box, splitting it where it leaves the box.
///
/// Each returned piece is a contiguous run of clipped segments. The total
/// coordinate count never exceeds the input's for lines already inside the
/// box; pieces outside are dropped.
pub fn clip_line_to_bbox(line: &[LonLat], bbox: &BoundingBox) -> Vec<Vec<LonLat>> {
    let mut pieces: Vec<Vec<LonLat>> = Vec::new();
    let mut current: Vec<LonLat> = Vec::new();

    for seg in line.windows(2) {
        match clip_segment_to_bbox(seg[0], seg[1], bbox) {
            Some((start, end)) => {
                let continues = current
                    .last()
                    .is_some_and(|last| coords_close(*last, start));
                if continues {
                    current.push(end);
                } else {
                    if current.len() >= 2 {
                        pieces.push(std::mem::take(&mut current));
                    } else {
                        current.clear();
                    }
                    current.push(start);
                    current.push(end);
                }
            }
            None => {
                if current.len() >= 2 {
                    pieces.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            }
        }
    }
    if current.len() >= 2 {
        pieces.push(current);
    }
    pieces
}

fn coords_close(a: LonLat, b: LonLat) -> bool {
    (a.lon - b.lon).abs() < 1e-12 && (a.lat - b.lat).abs() < 1e-12
}
