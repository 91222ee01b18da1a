use glam::{DMat2, DVec2};

use crate::error::{FlowError, Result};
use crate::math::Matrix;

/// Newton iterations allowed for the inverse bilinear map.
pub const NEWTON_MAX_ITERATIONS: u32 = 32;
/// Convergence tolerance for the inverse map, relative to the cell extent.
pub const NEWTON_TOLERANCE: f64 = 1e-12;

/// Unit-square corners in the order the world corners are stored.
const UNIT_CORNERS: [DVec2; 4] = [
    DVec2::new(0.0, 0.0),
    DVec2::new(1.0, 0.0),
    DVec2::new(1.0, 1.0),
    DVec2::new(0.0, 1.0),
];

pub fn outside_unit_square(p: DVec2) -> bool {
    p.x < 0.0 || p.x > 1.0 || p.y < 0.0 || p.y > 1.0
}

/// Flux across the four faces of a cell.
///
/// `i_minus`/`j_minus` enter through the low-i/low-j faces, `i_plus`/`j_plus`
/// leave through the high faces.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Flux {
    pub i_minus: f64,
    pub j_minus: f64,
    pub i_plus: f64,
    pub j_plus: f64,
}

impl Flux {
    pub const ZERO: Flux = Flux {
        i_minus: 0.0,
        j_minus: 0.0,
        i_plus: 0.0,
        j_plus: 0.0,
    };

    pub fn new(i_minus: f64, j_minus: f64, i_plus: f64, j_plus: f64) -> Self {
        Self {
            i_minus,
            j_minus,
            i_plus,
            j_plus,
        }
    }

    pub fn scaled(&self, factor: f64) -> Flux {
        Flux::new(
            self.i_minus * factor,
            self.j_minus * factor,
            self.i_plus * factor,
            self.j_plus * factor,
        )
    }
}

/// One quadrilateral cell of a grid.
///
/// Corner `n` is the image of `(0,0), (1,0), (1,1), (0,1)` under the
/// bilinear map. Positions inside the cell are expressed in normalized
/// coordinates in `[0, 1]²`.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    corners: [DVec2; 4],
    /// Largest corner-to-corner distance.
    extent: f64,
    i: u32,
    j: u32,
    flux: Flux,
    value: f64,
}

impl Cell {
    pub fn new(corners: [DVec2; 4], i: u32, j: u32, flux: Flux) -> Self {
        let mut extent: f64 = 0.0;
        for a in 0..4 {
            for b in a + 1..4 {
                extent = extent.max(corners[a].distance(corners[b]));
            }
        }
        Self {
            corners,
            extent,
            i,
            j,
            flux,
            value: 0.0,
        }
    }

    /// Attach a scalar property value (e.g. the mapped property).
    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    pub fn corners(&self) -> &[DVec2; 4] {
        &self.corners
    }

    /// World position of corner `n` (0..4).
    pub fn corner(&self, n: usize) -> Option<DVec2> {
        self.corners.get(n).copied()
    }

    pub fn i(&self) -> u32 {
        self.i
    }

    pub fn j(&self) -> u32 {
        self.j
    }

    pub(crate) fn set_position(&mut self, i: u32, j: u32) {
        self.i = i;
        self.j = j;
    }

    pub fn flux(&self) -> Flux {
        self.flux
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Largest distance between any two corners.
    pub fn extent(&self) -> f64 {
        self.extent
    }

    /// Jacobian of the bilinear map at normalized point `p`.
    ///
    /// Row 0 holds the derivative of the world position with respect to the
    /// normalized x-coordinate, row 1 with respect to y.
    pub fn jacobian(&self, p: DVec2) -> Result<Matrix> {
        ensure_unit_square(p)?;
        let forward = self.forward(p);
        Ok(Matrix::from_array([
            forward.x_axis.to_array(),
            forward.y_axis.to_array(),
        ]))
    }

    /// Map a normalized point to world coordinates.
    pub fn denormalize(&self, p: DVec2) -> Result<DVec2> {
        ensure_unit_square(p)?;
        Ok(self.bilinear(p))
    }

    /// Velocity of the flux at normalized position `p`, in normalized units.
    ///
    /// Each axis interpolates linearly between its entering and leaving
    /// face flux and is divided by the local area element `|det J|`.
    pub fn normal_velocity(&self, p: DVec2) -> Result<DVec2> {
        ensure_unit_square(p)?;
        let det = self.forward(p).determinant();
        if det.abs() <= self.degenerate_threshold() {
            return Err(FlowError::DegenerateCell {
                i: self.i,
                j: self.j,
            });
        }
        let low = DVec2::new(self.flux.i_minus, self.flux.j_minus);
        let high = DVec2::new(self.flux.i_plus, self.flux.j_plus);
        Ok((low * (DVec2::ONE - p) + high * p) / det.abs())
    }

    /// Maximum normal speed over the four corners. Corners where the
    /// velocity cannot be evaluated count as zero.
    pub fn max_normal_speed(&self) -> f64 {
        UNIT_CORNERS
            .iter()
            .map(|&c| {
                self.normal_velocity(c)
                    .map(|v| v.length())
                    .ok()
                    .filter(|s| s.is_finite())
                    .unwrap_or(0.0)
            })
            .fold(0.0, f64::max)
    }

    /// Inverse of [`Cell::denormalize`] by Newton iteration.
    ///
    /// The result lies outside `[0, 1]²` when `world` is outside the cell.
    pub fn normalize(&self, world: DVec2) -> Result<DVec2> {
        let tolerance = NEWTON_TOLERANCE * self.extent.max(f64::MIN_POSITIVE);
        let threshold = self.degenerate_threshold();
        let mut p = DVec2::splat(0.5);
        for _ in 0..NEWTON_MAX_ITERATIONS {
            let residual = world - self.bilinear(p);
            if residual.length() <= tolerance {
                return Ok(p);
            }
            let forward = self.forward(p);
            if forward.determinant().abs() <= threshold {
                return Err(FlowError::DegenerateCell {
                    i: self.i,
                    j: self.j,
                });
            }
            p += forward.inverse() * residual;
            if !p.is_finite() {
                break;
            }
        }
        Err(FlowError::NoConvergence {
            i: self.i,
            j: self.j,
            iterations: NEWTON_MAX_ITERATIONS,
        })
    }

    /// Whether the world point lies inside the cell.
    pub fn contains(&self, world: DVec2) -> bool {
        const EPS: f64 = 1e-9;
        match self.normalize(world) {
            Ok(p) => p.x >= -EPS && p.x <= 1.0 + EPS && p.y >= -EPS && p.y <= 1.0 + EPS,
            Err(_) => false,
        }
    }

    fn bilinear(&self, p: DVec2) -> DVec2 {
        let (x, y) = (p.x, p.y);
        let [c0, c1, c2, c3] = self.corners;
        c0 * ((1.0 - x) * (1.0 - y)) + c1 * (x * (1.0 - y)) + c2 * (x * y) + c3 * ((1.0 - x) * y)
    }

    /// d(world)/d(normalized): column 0 is the x derivative, column 1 the y
    /// derivative.
    fn forward(&self, p: DVec2) -> DMat2 {
        let (x, y) = (p.x, p.y);
        let [c0, c1, c2, c3] = self.corners;
        DMat2::from_cols(
            (c1 - c0) * (1.0 - y) + (c2 - c3) * y,
            (c3 - c0) * (1.0 - x) + (c2 - c1) * x,
        )
    }

    fn degenerate_threshold(&self) -> f64 {
        f64::EPSILON * self.extent * self.extent
    }
}

fn ensure_unit_square(p: DVec2) -> Result<()> {
    if outside_unit_square(p) || !p.is_finite() {
        return Err(FlowError::OutsideUnitSquare { x: p.x, y: p.y });
    }
    Ok(())
}
