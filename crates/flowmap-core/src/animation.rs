#[cfg(feature = "parallel")]
use rayon::prelude::*;

use glam::DVec2;
use rand::rngs::StdRng;

use crate::config::SimulationConfig;
use crate::error::Result;
use crate::generator::ParticleGenerator;
use crate::particle::Particle;

/// Grey levels used for trail colours, darkest first.
pub const TRAIL_GREYS: [u8; 17] = [
    85, 95, 105, 115, 125, 135, 145, 155, 165, 175, 185, 195, 205, 215, 225, 235, 245,
];

/// Line segments sharing one trail colour.
#[derive(Clone, Debug, PartialEq)]
pub struct TrailBucket {
    pub grey: u8,
    pub lines: Vec<[DVec2; 2]>,
}

/// Streamline animation: a fixed-size set of particles advected through
/// the generator's field, replaced as they die.
///
/// The host calls [`FlowAnimation::step`] once per frame interval and draws
/// [`FlowAnimation::trails`].
#[derive(Debug)]
pub struct FlowAnimation {
    generator: ParticleGenerator,
    particles: Vec<Particle>,
    config: SimulationConfig,
    rng: StdRng,
}

impl FlowAnimation {
    pub fn new(
        generator: ParticleGenerator,
        config: SimulationConfig,
        mut rng: StdRng,
    ) -> Result<Self> {
        let particles = (0..config.num_particles)
            .map(|_| generator.generate(&mut rng))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            generator,
            particles,
            config,
            rng,
        })
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn generator(&self) -> &ParticleGenerator {
        &self.generator
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Switch to another field. Existing particles refer to cells of the
    /// old field, so the whole set is regenerated.
    pub fn set_generator(&mut self, generator: ParticleGenerator) -> Result<()> {
        let particles = (0..self.config.num_particles)
            .map(|_| generator.generate(&mut self.rng))
            .collect::<Result<Vec<_>>>()?;
        self.generator = generator;
        self.particles = particles;
        Ok(())
    }

    /// One simulation tick: replace dead particles, advect, decay.
    pub fn step(&mut self) -> Result<()> {
        for particle in self.particles.iter_mut() {
            if particle.is_dead() {
                *particle = self.generator.generate(&mut self.rng)?;
            }
        }

        let field = self.generator.field().as_ref();
        let time_step = self.config.time_step;
        let min_travel = self.config.min_travel;

        #[cfg(feature = "parallel")]
        {
            self.particles.par_iter_mut().for_each(|p| {
                p.advance(field, time_step, min_travel);
                p.decay();
            });
        }

        #[cfg(not(feature = "parallel"))]
        {
            for p in self.particles.iter_mut() {
                p.advance(field, time_step, min_travel);
                p.decay();
            }
        }

        Ok(())
    }

    /// Trail segments from each particle's previous to current position,
    /// scaled to pixels and bucketed by travelled distance.
    pub fn trails(&self) -> Vec<TrailBucket> {
        let field = self.generator.field().as_ref();
        let mut buckets: Vec<TrailBucket> = TRAIL_GREYS
            .iter()
            .map(|&grey| TrailBucket {
                grey,
                lines: Vec::new(),
            })
            .collect();

        for particle in &self.particles {
            let from = particle.previous_position(field);
            let to = particle.position(field);
            let (Some(from), Some(to)) = (from, to) else {
                continue;
            };
            let bucket = self.bucket_for(from.distance(to));
            buckets[bucket]
                .lines
                .push([from * self.config.pixel_scale, to * self.config.pixel_scale]);
        }

        buckets.retain(|b| !b.lines.is_empty());
        buckets
    }

    fn bucket_for(&self, distance: f64) -> usize {
        let span = self.config.max_flow - self.config.min_flow;
        let increment = span / TRAIL_GREYS.len() as f64;
        if increment <= 0.0 || !distance.is_finite() {
            return 0;
        }
        let index = ((distance - self.config.min_flow) / increment).floor();
        index.clamp(0.0, (TRAIL_GREYS.len() - 1) as f64) as usize
    }
}
