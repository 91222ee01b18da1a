use glam::DVec2;

use crate::cell::Cell;
use crate::error::{FlowError, Result};
use crate::grid::{CellId, Grid};

/// A grid whose cells carry face flux, sampled as a velocity field.
///
/// The field is read-only once built; a new one is created whenever the
/// underlying layer changes.
#[derive(Clone, Debug)]
pub struct Field {
    grid: Grid,
}

impl Field {
    pub fn new(grid: Grid) -> Self {
        log::debug!(
            "field built: {} cells, {} rows, {} max columns",
            grid.len(),
            grid.num_rows(),
            grid.max_column()
        );
        Self { grid }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn cell(&self, id: CellId) -> Result<&Cell> {
        self.grid.cell(id).ok_or(FlowError::UnknownCell(id.index()))
    }

    /// Velocity at a normalized position inside `cell`, in normalized units.
    pub fn sample_velocity(&self, cell: CellId, position: DVec2) -> Result<DVec2> {
        self.cell(cell)?.normal_velocity(position)
    }

    /// World coordinates of a normalized position inside `cell`.
    pub fn denormalize(&self, cell: CellId, position: DVec2) -> Result<DVec2> {
        self.cell(cell)?.denormalize(position)
    }

    /// Largest normal speed over all cells.
    pub fn max_normal_speed(&self) -> f64 {
        self.grid.cells().map(Cell::max_normal_speed).fold(0.0, f64::max)
    }

    /// Advance a normalized position by one explicit Euler step.
    ///
    /// Returns the (possibly new) cell and normalized position, or `None`
    /// when the step leaves the grid.
    pub fn simulate(
        &self,
        cell: CellId,
        position: DVec2,
        time_step: f64,
    ) -> Result<Option<(CellId, DVec2)>> {
        let velocity = self.sample_velocity(cell, position)?;
        let moved = position + velocity * time_step;
        if !moved.is_finite() {
            return Ok(None);
        }
        self.transition(cell, moved)
    }

    /// Remap a normalized position that may have left `[0, 1]²` into the
    /// neighbouring cell it entered.
    ///
    /// Crossing the high-x face moves to `i + 1`, the low-x face to `i - 1`,
    /// and likewise for y and `j`. Crossing both axes moves diagonally; when
    /// the diagonal cell is absent the axis with the larger overshoot is
    /// tried first, then the other, with the uncrossed coordinate clamped
    /// onto the shared face. Positions that overshoot a whole cell are
    /// clamped onto the entered cell's boundary.
    pub fn transition(&self, cell: CellId, position: DVec2) -> Result<Option<(CellId, DVec2)>> {
        let current = self.cell(cell)?;
        let (i, j) = (i64::from(current.i()), i64::from(current.j()));
        let x = wrap_axis(position.x);
        let y = wrap_axis(position.y);
        if x.step == 0 && y.step == 0 {
            return Ok(Some((cell, position)));
        }
        let clamp = |p: DVec2| p.clamp(DVec2::ZERO, DVec2::ONE);

        if let Some(id) = self.grid.cell_id(i + x.step, j + y.step) {
            return Ok(Some((id, clamp(DVec2::new(x.wrapped, y.wrapped)))));
        }
        if x.step == 0 || y.step == 0 {
            return Ok(None);
        }

        let across_i = (i + x.step, j, DVec2::new(x.wrapped, position.y));
        let across_j = (i, j + y.step, DVec2::new(position.x, y.wrapped));
        let order = if x.overshoot >= y.overshoot {
            [across_i, across_j]
        } else {
            [across_j, across_i]
        };
        Ok(order
            .into_iter()
            .find_map(|(ni, nj, p)| self.grid.cell_id(ni, nj).map(|id| (id, clamp(p)))))
    }
}

struct AxisCrossing {
    /// -1, 0 or 1 cells along the axis.
    step: i64,
    /// Coordinate in the entered cell's frame.
    wrapped: f64,
    /// Distance past the crossed face.
    overshoot: f64,
}

fn wrap_axis(v: f64) -> AxisCrossing {
    if v > 1.0 {
        AxisCrossing {
            step: 1,
            wrapped: v - 1.0,
            overshoot: v - 1.0,
        }
    } else if v < 0.0 {
        AxisCrossing {
            step: -1,
            wrapped: v + 1.0,
            overshoot: -v,
        }
    } else {
        AxisCrossing {
            step: 0,
            wrapped: v,
            overshoot: 0.0,
        }
    }
}
