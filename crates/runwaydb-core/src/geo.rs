// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Geodesy helpers: positions, small 2-D/3-D vector algebra and the local
//! flat-earth projection used for runway geometry.
//!
//! The Earth is modelled as a sphere. Over the few kilometres spanned by an
//! airport the error against WGS-84 is well below the precision of the source
//! data.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;
pub const NM_TO_M: f64 = 1852.0;
pub const FT_TO_M: f64 = 0.3048;

pub fn feet_to_meters(ft: f64) -> f64 {
    ft * FT_TO_M
}

pub fn meters_to_feet(m: f64) -> f64 {
    m / FT_TO_M
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPos2 {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPos2 {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Position with elevation in feet.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoPos3 {
    pub lat: f64,
    pub lon: f64,
    pub elev: f64,
}

impl GeoPos3 {
    pub fn new(lat: f64, lon: f64, elev: f64) -> Self {
        Self { lat, lon, elev }
    }

    pub fn pos2(&self) -> GeoPos2 {
        GeoPos2::new(self.lat, self.lon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vect2 {
    pub x: f64,
    pub y: f64,
}

impl Vect2 {
    pub const ZERO: Vect2 = Vect2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn len(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn dot(&self, other: Vect2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3-D cross product. Positive when `other` lies to
    /// the left of `self`.
    pub fn cross(&self, other: Vect2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Unit vector in the same direction, or zero for a zero vector.
    pub fn unit(&self) -> Vect2 {
        let l = self.len();
        if l == 0.0 {
            Vect2::ZERO
        } else {
            Vect2::new(self.x / l, self.y / l)
        }
    }

    /// Perpendicular pointing to the right of the direction of travel
    /// (x = east, y = north).
    pub fn right_normal(&self) -> Vect2 {
        Vect2::new(self.y, -self.x)
    }

    /// True heading of this direction vector in degrees, `[0, 360)`.
    pub fn heading(&self) -> f64 {
        normalize_hdg(self.x.atan2(self.y).to_degrees())
    }

    pub fn from_heading(hdg: f64) -> Vect2 {
        let r = hdg.to_radians();
        Vect2::new(r.sin(), r.cos())
    }
}

impl Add for Vect2 {
    type Output = Vect2;
    fn add(self, o: Vect2) -> Vect2 {
        Vect2::new(self.x + o.x, self.y + o.y)
    }
}

impl Sub for Vect2 {
    type Output = Vect2;
    fn sub(self, o: Vect2) -> Vect2 {
        Vect2::new(self.x - o.x, self.y - o.y)
    }
}

impl Neg for Vect2 {
    type Output = Vect2;
    fn neg(self) -> Vect2 {
        Vect2::new(-self.x, -self.y)
    }
}

impl Mul<f64> for Vect2 {
    type Output = Vect2;
    fn mul(self, s: f64) -> Vect2 {
        Vect2::new(self.x * s, self.y * s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vect3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vect3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn len(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn dot(&self, o: Vect3) -> f64 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    fn add(self, o: Vect3) -> Vect3 {
        Vect3::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }

    fn sub(self, o: Vect3) -> Vect3 {
        Vect3::new(self.x - o.x, self.y - o.y, self.z - o.z)
    }

    fn scale(self, s: f64) -> Vect3 {
        Vect3::new(self.x * s, self.y * s, self.z * s)
    }
}

/// Earth-centred, Earth-fixed position in metres. Elevation is in feet.
pub fn geo_to_ecef(pos: GeoPos3) -> Vect3 {
    let r = EARTH_RADIUS_M + feet_to_meters(pos.elev);
    let (lat, lon) = (pos.lat.to_radians(), pos.lon.to_radians());
    Vect3::new(
        r * lat.cos() * lon.cos(),
        r * lat.cos() * lon.sin(),
        r * lat.sin(),
    )
}

pub fn ecef_to_geo(v: Vect3) -> GeoPos3 {
    let r = v.len();
    if r == 0.0 {
        return GeoPos3::default();
    }
    GeoPos3::new(
        (v.z / r).asin().to_degrees(),
        v.y.atan2(v.x).to_degrees(),
        meters_to_feet(r - EARTH_RADIUS_M),
    )
}

/// Orthographic tangent-plane projection anchored at `origin`.
/// `x` points east, `y` points north, both in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlatProjection {
    origin: GeoPos2,
    origin_ecef: Vect3,
    east: Vect3,
    north: Vect3,
    up: Vect3,
}

impl FlatProjection {
    pub fn new(origin: GeoPos2) -> Self {
        let (lat, lon) = (origin.lat.to_radians(), origin.lon.to_radians());
        Self {
            origin,
            origin_ecef: geo_to_ecef(GeoPos3::new(origin.lat, origin.lon, 0.0)),
            east: Vect3::new(-lon.sin(), lon.cos(), 0.0),
            north: Vect3::new(-lat.sin() * lon.cos(), -lat.sin() * lon.sin(), lat.cos()),
            up: Vect3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()),
        }
    }

    pub fn origin(&self) -> GeoPos2 {
        self.origin
    }

    pub fn project(&self, pos: GeoPos2) -> Vect2 {
        let d = geo_to_ecef(GeoPos3::new(pos.lat, pos.lon, 0.0)).sub(self.origin_ecef);
        Vect2::new(d.dot(self.east), d.dot(self.north))
    }

    pub fn unproject(&self, v: Vect2) -> GeoPos2 {
        let h2 = (v.x * v.x + v.y * v.y).min(EARTH_RADIUS_M * EARTH_RADIUS_M);
        let drop = (EARTH_RADIUS_M * EARTH_RADIUS_M - h2).sqrt() - EARTH_RADIUS_M;
        let p = self
            .origin_ecef
            .add(self.east.scale(v.x))
            .add(self.north.scale(v.y))
            .add(self.up.scale(drop));
        ecef_to_geo(p).pos2()
    }
}

/// Great-circle (haversine) distance in metres.
pub fn great_circle_distance(a: GeoPos2, b: GeoPos2) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Shortest signed longitude difference `to - from`, in `(-180, 180]`.
pub fn lon_delta(from: f64, to: f64) -> f64 {
    let mut d = (to - from) % 360.0;
    if d > 180.0 {
        d -= 360.0;
    } else if d <= -180.0 {
        d += 360.0;
    }
    d
}

pub fn normalize_hdg(hdg: f64) -> f64 {
    let h = hdg % 360.0;
    if h < 0.0 {
        h + 360.0
    } else {
        h
    }
}

/// Signed heading difference `to - from`, in `(-180, 180]`.
pub fn rel_hdg(from: f64, to: f64) -> f64 {
    lon_delta(from, to)
}

/// Even-odd rule point-in-polygon test.
pub fn point_in_polygon(pt: Vect2, poly: &[Vect2]) -> bool {
    let mut inside = false;
    let n = poly.len();
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (a, b) = (poly[i], poly[j]);
        if (a.y > pt.y) != (b.y > pt.y) && pt.x < (b.x - a.x) * (pt.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Unsigned shoelace area.
pub fn polygon_area(poly: &[Vect2]) -> f64 {
    let n = poly.len();
    let twice: f64 = (0..n).map(|i| poly[i].cross(poly[(i + 1) % n])).sum();
    twice.abs() / 2.0
}

pub fn polygon_centroid(poly: &[Vect2]) -> Vect2 {
    if poly.is_empty() {
        return Vect2::ZERO;
    }
    let sum = poly.iter().fold(Vect2::ZERO, |acc, p| acc + *p);
    sum * (1.0 / poly.len() as f64)
}
