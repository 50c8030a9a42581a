//! Road clipping against a circle ring.
//!
//! A fetched way is kept when it is fully inside the circle or crosses its
//! boundary; everything else is dropped. Kept ways are clipped to the ring's
//! bounding box only - a cheap rectangular trim for rendering, deliberately
//! not an exact circular clip. Partially covered roads stay visible so road
//! density near the circle edge is not misleadingly sparse.

use super::types::{BoundingBox, LonLat};
use super::{clip_line_to_bbox, line_intersects_ring, line_within_ring};

/// A raw way geometry as fetched from the roads service.
#[derive(Debug, Clone, PartialEq)]
pub struct WayGeometry {
    /// Provider-assigned way id.
    pub id: u64,
    /// Value of the `highway` tag, `"unknown"` if absent.
    pub highway: String,
    /// Way coordinates in fetch order.
    pub coords: Vec<LonLat>,
}

/// A clipped road line ready for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadLine {
    /// Id of the way this piece came from.
    pub way_id: u64,
    /// Highway class carried over from the way.
    pub highway: String,
    /// Clipped coordinates, at most as many as the input way had.
    pub coords: Vec<LonLat>,
}

/// Clip fetched ways against a circle ring.
///
/// Output ordering is not significant. A way that leaves and re-enters the
/// bounding box produces one [`RoadLine`] per contiguous piece.
pub fn clip_ways(ways: &[WayGeometry], ring: &[LonLat]) -> Vec<RoadLine> {
    let Some(bbox) = BoundingBox::from_coords(ring) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for way in ways {
        if way.coords.len() < 2 {
            continue;
        }
        let within = line_within_ring(&way.coords, ring);
        let crosses = line_intersects_ring(&way.coords, ring);
        if !within && !crosses {
            continue;
        }
        for piece in clip_line_to_bbox(&way.coords, &bbox) {
            out.push(RoadLine {
                way_id: way.id,
                highway: way.highway.clone(),
                coords: piece,
            });
        }
    }
    out
}
