use glam::DVec2;
use rand::Rng;

use crate::config::ParticleConfig;
use crate::field::Field;
use crate::grid::CellId;

/// A decaying point carried through a [`Field`].
///
/// The position is stored in normalized coordinates of its current cell;
/// world positions are derived through the field on demand. A particle
/// without a cell, or one that has left the grid, is abandoned and decays
/// geometrically instead of linearly.
#[derive(Clone, Debug)]
pub struct Particle {
    normal_position: DVec2,
    cell: Option<CellId>,
    /// Cell and normalized position before the last move.
    previous: Option<(CellId, DVec2)>,
    liveness: f64,
    abandoned: bool,
    config: ParticleConfig,
}

impl Particle {
    /// Create a particle with a randomized initial liveness.
    pub fn new<R: Rng + ?Sized>(
        normal_position: DVec2,
        cell: Option<CellId>,
        config: ParticleConfig,
        rng: &mut R,
    ) -> Self {
        let jitter = config.liveness_jitter;
        let liveness = config.initial_liveness * (1.0 - jitter / 2.0 + jitter * rng.gen::<f64>());
        Self {
            normal_position,
            cell,
            previous: None,
            liveness,
            abandoned: cell.is_none(),
            config,
        }
    }

    pub fn normal_position(&self) -> DVec2 {
        self.normal_position
    }

    pub fn cell(&self) -> Option<CellId> {
        self.cell
    }

    pub fn liveness(&self) -> f64 {
        self.liveness
    }

    pub fn is_abandoned(&self) -> bool {
        self.abandoned
    }

    pub fn is_dead(&self) -> bool {
        self.liveness < self.config.dead_threshold
    }

    pub fn abandon(&mut self) {
        self.abandoned = true;
    }

    /// One tick of liveness decay.
    pub fn decay(&mut self) {
        if self.abandoned {
            self.liveness *= self.config.abandon_decay_mult;
        } else {
            self.liveness -= self.config.decay_rate;
        }
    }

    /// World position, or `None` when the particle has no cell.
    pub fn position(&self, field: &Field) -> Option<DVec2> {
        let cell = self.cell?;
        field.denormalize(cell, self.normal_position).ok()
    }

    /// World position before the last move; equal to [`Particle::position`]
    /// until the particle has moved.
    pub fn previous_position(&self, field: &Field) -> Option<DVec2> {
        match self.previous {
            Some((cell, p)) => field.denormalize(cell, p).ok(),
            None => self.position(field),
        }
    }

    /// Relocate the particle, remembering where it came from.
    pub fn move_to(&mut self, cell: CellId, normal_position: DVec2) {
        if let Some(current) = self.cell {
            self.previous = Some((current, self.normal_position));
        }
        self.cell = Some(cell);
        self.normal_position = normal_position;
    }

    /// Advect the particle one step through `field`.
    ///
    /// Particles that leave the grid, stall below `min_travel`, or hit a
    /// cell that cannot be evaluated are abandoned. Abandoned particles do
    /// not move.
    pub fn advance(&mut self, field: &Field, time_step: f64, min_travel: f64) {
        if self.abandoned {
            return;
        }
        let Some(cell) = self.cell else {
            self.abandon();
            return;
        };
        match field.simulate(cell, self.normal_position, time_step) {
            Ok(Some((next_cell, next_position))) => {
                // Normalized positions are only comparable within one cell.
                if next_cell == cell && next_position.distance(self.normal_position) < min_travel {
                    self.abandon();
                }
                self.move_to(next_cell, next_position);
            }
            Ok(None) => self.abandon(),
            Err(e) => {
                log::trace!("abandoning particle in cell {}: {}", cell.index(), e);
                self.abandon();
            }
        }
    }
}
