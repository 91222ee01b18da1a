use flowmap_core::animation::FlowAnimation;
use flowmap_core::config::SimulationConfig;
use flowmap_core::flow_map::FlowMap;
use flowmap_core::layers::Dataset;
use flowmap_core::FlowError;
use rand::rngs::StdRng;
use rand::SeedableRng;
use wasm_bindgen::prelude::*;

/// GPU-compatible trail segment: 32 bytes, one line per particle.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct GpuSegment {
    from: [f32; 2], //  8 bytes
    to: [f32; 2],   //  8 bytes
    grey: f32,      //  4 bytes, 0..1
    _pad: [f32; 3], // 12 bytes
}

fn to_js(err: FlowError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
pub struct FlowMapWorld {
    map: FlowMap,
    animation: FlowAnimation,
    gpu_buffer: Vec<GpuSegment>,
}

#[wasm_bindgen]
impl FlowMapWorld {
    /// Build from a dataset JSON string, seeding particles from browser
    /// entropy.
    #[wasm_bindgen(constructor)]
    pub fn new(dataset_json: &str) -> Result<FlowMapWorld, JsValue> {
        Self::build(dataset_json, None, StdRng::from_entropy())
    }

    /// Deterministic variant for reproducible animations.
    #[wasm_bindgen]
    pub fn with_seed(dataset_json: &str, seed: u32) -> Result<FlowMapWorld, JsValue> {
        Self::build(dataset_json, None, StdRng::seed_from_u64(u64::from(seed)))
    }

    /// Like [`FlowMapWorld::with_seed`] with a `SimulationConfig` JSON.
    #[wasm_bindgen]
    pub fn with_config(
        dataset_json: &str,
        config_json: &str,
        seed: u32,
    ) -> Result<FlowMapWorld, JsValue> {
        let config = SimulationConfig::from_json(config_json).map_err(to_js)?;
        Self::build(dataset_json, Some(config), StdRng::seed_from_u64(u64::from(seed)))
    }

    /// Advance one tick and refresh the trail buffer. Returns elapsed ms.
    #[wasm_bindgen]
    pub fn step(&mut self) -> Result<f32, JsValue> {
        let start = js_sys::Date::now();
        self.animation.step().map_err(to_js)?;
        self.write_gpu_output();
        Ok((js_sys::Date::now() - start) as f32)
    }

    /// Switch the active layer and regenerate all particles on it.
    #[wasm_bindgen]
    pub fn set_layer(&mut self, index: usize) -> Result<(), JsValue> {
        self.map.set_layer(index).map_err(to_js)?;
        let particle = self.animation.config().particle;
        self.animation
            .set_generator(self.map.particle_generator(particle))
            .map_err(to_js)?;
        web_sys::console::log_1(&format!("FlowMapWorld: layer {} active", index).into());
        self.write_gpu_output();
        Ok(())
    }

    #[wasm_bindgen]
    pub fn layer_count(&self) -> usize {
        self.map.layer_count()
    }

    #[wasm_bindgen]
    pub fn current_layer(&self) -> usize {
        self.map.current_layer()
    }

    #[wasm_bindgen]
    pub fn particle_count(&self) -> usize {
        self.animation.particles().len()
    }

    /// Milliseconds the host loop should wait between steps.
    #[wasm_bindgen]
    pub fn frame_interval_ms(&self) -> f64 {
        self.animation.config().frame_interval_ms()
    }

    #[wasm_bindgen]
    pub fn get_trail_buffer_ptr(&self) -> *const f32 {
        self.gpu_buffer.as_ptr() as *const f32
    }

    /// Segments currently in the trail buffer.
    #[wasm_bindgen]
    pub fn trail_count(&self) -> usize {
        self.gpu_buffer.len()
    }

    #[wasm_bindgen]
    pub fn get_trail_buffer_byte_length(&self) -> usize {
        std::mem::size_of_val(self.gpu_buffer.as_slice())
    }
}

impl FlowMapWorld {
    fn build(
        dataset_json: &str,
        config: Option<SimulationConfig>,
        rng: StdRng,
    ) -> Result<FlowMapWorld, JsValue> {
        let data = Dataset::from_json(dataset_json).map_err(to_js)?;
        let map = FlowMap::from_dataset(&data).map_err(to_js)?;
        let config = config.unwrap_or_default();
        let generator = map.particle_generator(config.particle);
        let particle_count = config.num_particles;
        let animation = FlowAnimation::new(generator, config, rng).map_err(to_js)?;

        web_sys::console::log_1(
            &format!(
                "WASM FlowMapWorld created: {} layers, {} particles",
                map.layer_count(),
                particle_count
            )
            .into(),
        );

        let mut world = FlowMapWorld {
            map,
            animation,
            gpu_buffer: Vec::with_capacity(particle_count),
        };
        world.write_gpu_output();
        Ok(world)
    }

    fn write_gpu_output(&mut self) {
        self.gpu_buffer.clear();
        for bucket in self.animation.trails() {
            let grey = f32::from(bucket.grey) / 255.0;
            for [from, to] in bucket.lines {
                self.gpu_buffer.push(GpuSegment {
                    from: from.as_vec2().to_array(),
                    to: to.as_vec2().to_array(),
                    grey,
                    _pad: [0.0; 3],
                });
            }
        }
    }
}
