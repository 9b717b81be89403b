// internal modules
use crate::csg::{Matrix3, Vector3, TOLERANCE};
use crate::error::{Error, Result};
use crate::utils::*;

// external crates
use serde::Serialize;

/// Unique integer id used in region expressions
pub type SurfaceId = u32;

/// Boundary condition attached to a surface
///
/// Surfaces only carry something other than [BoundaryType::Transmission] if
/// they bound an `outside` cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryType {
    #[default]
    Transmission,
    Vacuum,
    Reflective,
    Periodic,
}

impl BoundaryType {
    /// Name used for the `boundary` attribute of OpenMC surfaces
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundaryType::Transmission => "transmission",
            BoundaryType::Vacuum => "vacuum",
            BoundaryType::Reflective => "reflective",
            BoundaryType::Periodic => "periodic",
        }
    }
}

impl std::fmt::Display for BoundaryType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Geometric kind and parameters of a primitive surface
///
/// Parameters follow the OpenMC conventions, with the exception of
/// [SurfaceKind::Cylinder] which keeps its two axis points and is only reduced
/// to a quadric on output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SurfaceKind {
    XPlane { x0: f64 },
    YPlane { y0: f64 },
    ZPlane { z0: f64 },
    /// `ax + by + cz = d`
    Plane { a: f64, b: f64, c: f64, d: f64 },
    XCylinder { y0: f64, z0: f64, r: f64 },
    YCylinder { x0: f64, z0: f64, r: f64 },
    ZCylinder { x0: f64, y0: f64, r: f64 },
    /// Infinite cylinder through two axis points
    Cylinder { p1: [f64; 3], p2: [f64; 3], r: f64 },
    Sphere { x0: f64, y0: f64, z0: f64, r: f64 },
    XCone { x0: f64, y0: f64, z0: f64, r2: f64 },
    YCone { x0: f64, y0: f64, z0: f64, r2: f64 },
    ZCone { x0: f64, y0: f64, z0: f64, r2: f64 },
    XTorus { x0: f64, y0: f64, z0: f64, a: f64, b: f64, c: f64 },
    YTorus { x0: f64, y0: f64, z0: f64, a: f64, b: f64, c: f64 },
    ZTorus { x0: f64, y0: f64, z0: f64, a: f64, b: f64, c: f64 },
    /// `Ax² + By² + Cz² + Dxy + Eyz + Fxz + Gx + Hy + Jz + K = 0`
    Quadric { coeffs: [f64; 10] },
}

impl SurfaceKind {
    /// Ordered parameters exactly as the surface was constructed
    pub fn coefficients(&self) -> Vec<f64> {
        use SurfaceKind::*;
        match *self {
            XPlane { x0 } => vec![x0],
            YPlane { y0 } => vec![y0],
            ZPlane { z0 } => vec![z0],
            Plane { a, b, c, d } => vec![a, b, c, d],
            XCylinder { y0, z0, r } => vec![y0, z0, r],
            YCylinder { x0, z0, r } => vec![x0, z0, r],
            ZCylinder { x0, y0, r } => vec![x0, y0, r],
            Cylinder { p1, p2, r } => vec![p1[0], p1[1], p1[2], p2[0], p2[1], p2[2], r],
            Sphere { x0, y0, z0, r } => vec![x0, y0, z0, r],
            XCone { x0, y0, z0, r2 } | YCone { x0, y0, z0, r2 } | ZCone { x0, y0, z0, r2 } => {
                vec![x0, y0, z0, r2]
            }
            XTorus { x0, y0, z0, a, b, c }
            | YTorus { x0, y0, z0, a, b, c }
            | ZTorus { x0, y0, z0, a, b, c } => vec![x0, y0, z0, a, b, c],
            Quadric { coeffs } => coeffs.to_vec(),
        }
    }

    /// Surface `type` attribute understood by OpenMC
    pub fn openmc_type(&self) -> &'static str {
        use SurfaceKind::*;
        match self {
            XPlane { .. } => "x-plane",
            YPlane { .. } => "y-plane",
            ZPlane { .. } => "z-plane",
            Plane { .. } => "plane",
            XCylinder { .. } => "x-cylinder",
            YCylinder { .. } => "y-cylinder",
            ZCylinder { .. } => "z-cylinder",
            Cylinder { .. } | Quadric { .. } => "quadric",
            Sphere { .. } => "sphere",
            XCone { .. } => "x-cone",
            YCone { .. } => "y-cone",
            ZCone { .. } => "z-cone",
            XTorus { .. } => "x-torus",
            YTorus { .. } => "y-torus",
            ZTorus { .. } => "z-torus",
        }
    }

    /// Coefficients matching [SurfaceKind::openmc_type]
    pub fn openmc_coefficients(&self) -> Vec<f64> {
        match self {
            SurfaceKind::Cylinder { .. } => self
                .quadric_form()
                .map(|q| q.coefficients().to_vec())
                .unwrap_or_default(),
            _ => self.coefficients(),
        }
    }

    /// Value of the implicit surface function at a point
    ///
    /// Negative values are on the `-` side of the surface, positive values
    /// (and zero) on the `+` side.
    pub fn evaluate(&self, point: [f64; 3]) -> f64 {
        use SurfaceKind::*;
        let [x, y, z] = point;
        match *self {
            XPlane { x0 } => x - x0,
            YPlane { y0 } => y - y0,
            ZPlane { z0 } => z - z0,
            Plane { a, b, c, d } => a * x + b * y + c * z - d,
            XCylinder { y0, z0, r } => (y - y0).powi(2) + (z - z0).powi(2) - r * r,
            YCylinder { x0, z0, r } => (x - x0).powi(2) + (z - z0).powi(2) - r * r,
            ZCylinder { x0, y0, r } => (x - x0).powi(2) + (y - y0).powi(2) - r * r,
            Sphere { x0, y0, z0, r } => {
                (x - x0).powi(2) + (y - y0).powi(2) + (z - z0).powi(2) - r * r
            }
            XCone { x0, y0, z0, r2 } => {
                (y - y0).powi(2) + (z - z0).powi(2) - r2 * (x - x0).powi(2)
            }
            YCone { x0, y0, z0, r2 } => {
                (x - x0).powi(2) + (z - z0).powi(2) - r2 * (y - y0).powi(2)
            }
            ZCone { x0, y0, z0, r2 } => {
                (x - x0).powi(2) + (y - y0).powi(2) - r2 * (z - z0).powi(2)
            }
            XTorus { x0, y0, z0, a, b, c } => torus(x - x0, (y - y0, z - z0), a, b, c),
            YTorus { x0, y0, z0, a, b, c } => torus(y - y0, (x - x0, z - z0), a, b, c),
            ZTorus { x0, y0, z0, a, b, c } => torus(z - z0, (x - x0, y - y0), a, b, c),
            Cylinder { .. } | Quadric { .. } => self
                .quadric_form()
                .map(|q| q.evaluate(&Vector3::from(point)))
                .unwrap_or(f64::NAN),
        }
    }

    /// Move the surface by `t`
    pub fn translate(&mut self, t: [f64; 3]) {
        use SurfaceKind::*;
        let [dx, dy, dz] = t;
        match self {
            XPlane { x0 } => *x0 += dx,
            YPlane { y0 } => *y0 += dy,
            ZPlane { z0 } => *z0 += dz,
            Plane { a, b, c, d } => *d += *a * dx + *b * dy + *c * dz,
            XCylinder { y0, z0, .. } => {
                *y0 += dy;
                *z0 += dz;
            }
            YCylinder { x0, z0, .. } => {
                *x0 += dx;
                *z0 += dz;
            }
            ZCylinder { x0, y0, .. } => {
                *x0 += dx;
                *y0 += dy;
            }
            Cylinder { p1, p2, .. } => {
                for i in 0..3 {
                    p1[i] += t[i];
                    p2[i] += t[i];
                }
            }
            Sphere { x0, y0, z0, .. }
            | XCone { x0, y0, z0, .. }
            | YCone { x0, y0, z0, .. }
            | ZCone { x0, y0, z0, .. }
            | XTorus { x0, y0, z0, .. }
            | YTorus { x0, y0, z0, .. }
            | ZTorus { x0, y0, z0, .. } => {
                *x0 += dx;
                *y0 += dy;
                *z0 += dz;
            }
            Quadric { coeffs } => {
                let q = QuadricForm::from_coefficients(coeffs);
                *coeffs = q.transformed(&Matrix3::identity(), &Vector3::from(t)).coefficients();
            }
        }
    }

    /// Rotate the surface about the origin, `x -> R x`
    ///
    /// Returns `None` when the rotated surface has no exact representation,
    /// which is only the case for tori tilted off the coordinate axes.
    pub fn rotated(&self, rotation: &Matrix3) -> Option<SurfaceKind> {
        use SurfaceKind::*;
        let kind = match *self {
            XPlane { x0 } => plane_kind(rotation * Vector3::x(), x0),
            YPlane { y0 } => plane_kind(rotation * Vector3::y(), y0),
            ZPlane { z0 } => plane_kind(rotation * Vector3::z(), z0),
            Plane { a, b, c, d } => plane_kind(rotation * Vector3::new(a, b, c), d),
            XCylinder { y0, z0, r } => {
                rotated_cylinder(rotation, [0.0, y0, z0], [1.0, y0, z0], r)
            }
            YCylinder { x0, z0, r } => {
                rotated_cylinder(rotation, [x0, 0.0, z0], [x0, 1.0, z0], r)
            }
            ZCylinder { x0, y0, r } => {
                rotated_cylinder(rotation, [x0, y0, 0.0], [x0, y0, 1.0], r)
            }
            Cylinder { p1, p2, r } => Cylinder {
                p1: (rotation * Vector3::from(p1)).into(),
                p2: (rotation * Vector3::from(p2)).into(),
                r,
            },
            Sphere { x0, y0, z0, r } => {
                let c = rotation * Vector3::new(x0, y0, z0);
                Sphere {
                    x0: c.x,
                    y0: c.y,
                    z0: c.z,
                    r,
                }
            }
            XCone { .. } | YCone { .. } | ZCone { .. } | Quadric { .. } => {
                let q = self.quadric_form()?;
                Quadric {
                    coeffs: q.transformed(rotation, &Vector3::zeros()).coefficients(),
                }
            }
            XTorus { x0, y0, z0, a, b, c } => rotated_torus(rotation, 0, [x0, y0, z0], [a, b, c])?,
            YTorus { x0, y0, z0, a, b, c } => rotated_torus(rotation, 1, [x0, y0, z0], [a, b, c])?,
            ZTorus { x0, y0, z0, a, b, c } => rotated_torus(rotation, 2, [x0, y0, z0], [a, b, c])?,
        };
        Some(kind)
    }

    /// General second order form, `None` for tori
    fn quadric_form(&self) -> Option<QuadricForm> {
        use SurfaceKind::*;
        let diag = |d: [f64; 3], c: [f64; 3], k: f64| {
            let m = Matrix3::from_diagonal(&Vector3::from(d));
            let c = Vector3::from(c);
            QuadricForm {
                v: -2.0 * m * c,
                k: c.dot(&(m * c)) + k,
                m,
            }
        };

        let form = match *self {
            XPlane { .. } | YPlane { .. } | ZPlane { .. } | Plane { .. } => {
                let coeffs = self.coefficients();
                let (n, d) = match *self {
                    XPlane { x0 } => (Vector3::x(), x0),
                    YPlane { y0 } => (Vector3::y(), y0),
                    ZPlane { z0 } => (Vector3::z(), z0),
                    _ => (Vector3::new(coeffs[0], coeffs[1], coeffs[2]), coeffs[3]),
                };
                QuadricForm {
                    m: Matrix3::zeros(),
                    v: n,
                    k: -d,
                }
            }
            XCylinder { y0, z0, r } => diag([0.0, 1.0, 1.0], [0.0, y0, z0], -r * r),
            YCylinder { x0, z0, r } => diag([1.0, 0.0, 1.0], [x0, 0.0, z0], -r * r),
            ZCylinder { x0, y0, r } => diag([1.0, 1.0, 0.0], [x0, y0, 0.0], -r * r),
            Sphere { x0, y0, z0, r } => diag([1.0, 1.0, 1.0], [x0, y0, z0], -r * r),
            XCone { x0, y0, z0, r2 } => diag([-r2, 1.0, 1.0], [x0, y0, z0], 0.0),
            YCone { x0, y0, z0, r2 } => diag([1.0, -r2, 1.0], [x0, y0, z0], 0.0),
            ZCone { x0, y0, z0, r2 } => diag([1.0, 1.0, -r2], [x0, y0, z0], 0.0),
            Cylinder { p1, p2, r } => {
                let p = Vector3::from(p1);
                let u = (Vector3::from(p2) - p).normalize();
                let m = Matrix3::identity() - u * u.transpose();
                QuadricForm {
                    v: -2.0 * m * p,
                    k: p.dot(&(m * p)) - r * r,
                    m,
                }
            }
            Quadric { coeffs } => QuadricForm::from_coefficients(&coeffs),
            XTorus { .. } | YTorus { .. } | ZTorus { .. } => return None,
        };
        Some(form)
    }
}

/// A named primitive surface with a unique id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Surface {
    pub id: SurfaceId,
    pub name: String,
    pub kind: SurfaceKind,
    pub boundary: BoundaryType,
}

impl Surface {
    pub fn new(id: SurfaceId, name: &str, kind: SurfaceKind) -> Self {
        Self {
            id,
            name: name.to_string(),
            kind,
            boundary: BoundaryType::default(),
        }
    }

    /// See [SurfaceKind::evaluate]
    pub fn evaluate(&self, point: [f64; 3]) -> f64 {
        self.kind.evaluate(point)
    }

    /// Translate in place
    pub fn translate(&mut self, t: [f64; 3]) {
        self.kind.translate(t);
    }

    /// Rotate in place about the origin
    pub fn rotate(&mut self, rotation: &Matrix3) -> Result<()> {
        self.kind = self
            .kind
            .rotated(rotation)
            .ok_or_else(|| Error::ErroneousTransformTarget {
                target: f!("surface {}", self.name),
                reason: "tori can only be rotated onto a coordinate axis".to_string(),
            })?;
        Ok(())
    }

    /// Axis index for x/y/z planes, used to pick per-axis boundary types
    pub fn plane_axis(&self) -> Option<usize> {
        match self.kind {
            SurfaceKind::XPlane { .. } => Some(0),
            SurfaceKind::YPlane { .. } => Some(1),
            SurfaceKind::ZPlane { .. } => Some(2),
            _ => None,
        }
    }
}

/// `x^T M x + v.x + k` with symmetric `M`
#[derive(Debug, Clone)]
struct QuadricForm {
    m: Matrix3,
    v: Vector3,
    k: f64,
}

impl QuadricForm {
    fn from_coefficients(c: &[f64; 10]) -> Self {
        #[rustfmt::skip]
        let m = Matrix3::new(
            c[0],       0.5 * c[3], 0.5 * c[5],
            0.5 * c[3], c[1],       0.5 * c[4],
            0.5 * c[5], 0.5 * c[4], c[2],
        );
        Self {
            m,
            v: Vector3::new(c[6], c[7], c[8]),
            k: c[9],
        }
    }

    fn coefficients(&self) -> [f64; 10] {
        let m = &self.m;
        [
            m[(0, 0)],
            m[(1, 1)],
            m[(2, 2)],
            2.0 * m[(0, 1)],
            2.0 * m[(1, 2)],
            2.0 * m[(0, 2)],
            self.v.x,
            self.v.y,
            self.v.z,
            self.k,
        ]
    }

    fn evaluate(&self, p: &Vector3) -> f64 {
        p.dot(&(self.m * p)) + self.v.dot(p) + self.k
    }

    /// Image of the surface under `x -> R x + t`
    fn transformed(&self, r: &Matrix3, t: &Vector3) -> Self {
        let m = r * self.m * r.transpose();
        let v = r * self.v;
        Self {
            v: v - 2.0 * m * t,
            k: t.dot(&(m * t)) - v.dot(t) + self.k,
            m,
        }
    }
}

fn torus(axial: f64, radial: (f64, f64), a: f64, b: f64, c: f64) -> f64 {
    let rho = (radial.0 * radial.0 + radial.1 * radial.1).sqrt();
    axial * axial / (b * b) + (rho - a).powi(2) / (c * c) - 1.0
}

/// Index and sign of the coordinate axis `v` points along, if any
fn axis_of(v: &Vector3) -> Option<(usize, f64)> {
    let n = v.norm();
    if n < TOLERANCE {
        return None;
    }
    let u = v / n;
    (0..3).find_map(|i| {
        let off_axis = (0..3).filter(|&j| j != i).all(|j| u[j].abs() < TOLERANCE);
        (off_axis && (u[i].abs() - 1.0).abs() < TOLERANCE).then(|| (i, u[i].signum() * n))
    })
}

/// Plane `n.x = d`, collapsed to an axis plane where possible
fn plane_kind(n: Vector3, d: f64) -> SurfaceKind {
    match axis_of(&n) {
        // orientation of the half-spaces must survive, so only +axis collapses
        Some((0, s)) if s > 0.0 => SurfaceKind::XPlane { x0: d / s },
        Some((1, s)) if s > 0.0 => SurfaceKind::YPlane { y0: d / s },
        Some((2, s)) if s > 0.0 => SurfaceKind::ZPlane { z0: d / s },
        _ => SurfaceKind::Plane {
            a: n.x,
            b: n.y,
            c: n.z,
            d,
        },
    }
}

fn rotated_cylinder(rotation: &Matrix3, p1: [f64; 3], p2: [f64; 3], r: f64) -> SurfaceKind {
    let p1 = rotation * Vector3::from(p1);
    let p2 = rotation * Vector3::from(p2);
    match axis_of(&(p2 - p1)) {
        Some((0, _)) => SurfaceKind::XCylinder {
            y0: p1.y,
            z0: p1.z,
            r,
        },
        Some((1, _)) => SurfaceKind::YCylinder {
            x0: p1.x,
            z0: p1.z,
            r,
        },
        Some((2, _)) => SurfaceKind::ZCylinder {
            x0: p1.x,
            y0: p1.y,
            r,
        },
        _ => SurfaceKind::Cylinder {
            p1: p1.into(),
            p2: p2.into(),
            r,
        },
    }
}

fn rotated_torus(rotation: &Matrix3, axis: usize, c: [f64; 3], abc: [f64; 3]) -> Option<SurfaceKind> {
    let direction = rotation * Vector3::ith(axis, 1.0);
    let c = rotation * Vector3::from(c);
    let [a, b, cc] = abc;
    let (x0, y0, z0) = (c.x, c.y, c.z);
    match axis_of(&direction)?.0 {
        0 => Some(SurfaceKind::XTorus { x0, y0, z0, a, b, c: cc }),
        1 => Some(SurfaceKind::YTorus { x0, y0, z0, a, b, c: cc }),
        _ => Some(SurfaceKind::ZTorus { x0, y0, z0, a, b, c: cc }),
    }
}
