//! Region boundaries in WGS84 longitude/latitude coordinates.

/// A point given as (longitude, latitude) in degrees
pub type Point = (f64, f64);

/// A polygon with an exterior ring and zero or more holes.
///
/// Rings are lists of vertices; they may or may not repeat the first vertex at the end.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    /// The outer boundary
    pub exterior: Vec<Point>,
    /// Areas inside the exterior which are excluded
    pub holes: Vec<Vec<Point>>,
}

impl Polygon {
    /// Whether the point lies inside the exterior ring and outside every hole
    pub fn contains(&self, point: Point) -> bool {
        ring_contains(&self.exterior, point)
            && !self.holes.iter().any(|hole| ring_contains(hole, point))
    }
}

/// The boundary of a region, made up of one or more polygons (EPSG:4326)
#[derive(Debug, Clone, PartialEq)]
pub struct RegionBoundary {
    polygons: Vec<Polygon>,
}

impl RegionBoundary {
    /// Create a new [`RegionBoundary`] from its polygons
    pub fn new(polygons: Vec<Polygon>) -> Self {
        Self { polygons }
    }

    /// Create a rectangular boundary
    pub fn from_rectangle(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self::new(vec![Polygon {
            exterior: vec![
                (min_lon, min_lat),
                (max_lon, min_lat),
                (max_lon, max_lat),
                (min_lon, max_lat),
            ],
            holes: Vec::new(),
        }])
    }

    /// The polygons making up the boundary
    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    /// Whether the point (longitude, latitude) lies within the region.
    ///
    /// Longitudes are normalised to the range [-180, 180) first.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        let point = (normalise_longitude(lon), lat);
        self.polygons.iter().any(|polygon| polygon.contains(point))
    }
}

/// Convert a longitude in degrees to the range [-180, 180)
pub fn normalise_longitude(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

/// Even-odd ray casting test for a single ring
fn ring_contains(ring: &[Point], (x, y): Point) -> bool {
    let Some(&last) = ring.last() else {
        return false;
    };

    let mut inside = false;
    let mut previous = last;
    for &(xi, yi) in ring {
        let (xj, yj) = previous;
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        previous = (xi, yi);
    }

    inside
}
