use std::sync::Arc;

use glam::DVec2;
use rand::Rng;

use crate::config::ParticleConfig;
use crate::error::{FlowError, Result};
use crate::field::Field;
use crate::grid::CellId;
use crate::particle::Particle;

/// Seeds particles uniformly over the present cells of a field.
///
/// The present cells are listed once at construction, so placement is a
/// single draw regardless of how sparse the grid is.
#[derive(Clone, Debug)]
pub struct ParticleGenerator {
    field: Arc<Field>,
    cells: Vec<CellId>,
    config: ParticleConfig,
}

impl ParticleGenerator {
    pub fn new(field: Arc<Field>, config: ParticleConfig) -> Self {
        let cells = field.grid().ids().collect();
        Self {
            field,
            cells,
            config,
        }
    }

    pub fn field(&self) -> &Arc<Field> {
        &self.field
    }

    pub fn config(&self) -> ParticleConfig {
        self.config
    }

    /// A new particle at a uniformly random cell and normalized position.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Particle> {
        if self.cells.is_empty() {
            return Err(FlowError::EmptyField);
        }
        let cell = self.cells[rng.gen_range(0..self.cells.len())];
        let position = DVec2::new(rng.gen::<f64>(), rng.gen::<f64>());
        Ok(Particle::new(position, Some(cell), self.config, rng))
    }
}
