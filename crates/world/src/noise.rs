//! Multi-octave Perlin noise for height fields.

use noise::{NoiseFn, Perlin};

/// Configuration for multi-octave noise generation.
#[derive(Debug, Clone)]
pub struct NoiseConfig {
    /// Number of octaves (layers of detail)
    pub octaves: u32,
    /// Frequency multiplier between octaves
    pub lacunarity: f64,
    /// Amplitude multiplier between octaves (persistence)
    pub persistence: f64,
    /// Base frequency (scale)
    pub frequency: f64,
    /// Seed for deterministic generation
    pub seed: u32,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
            frequency: 1.0,
            seed: 0,
        }
    }
}

impl NoiseConfig {
    /// Rolling hills roughly one chunk across.
    pub fn terrain(seed: u32) -> Self {
        Self {
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
            frequency: 0.032,
            seed,
        }
    }
}

/// Noise generator using Perlin noise.
pub struct NoiseGenerator {
    perlin: Perlin,
    config: NoiseConfig,
}

impl NoiseGenerator {
    pub fn new(config: NoiseConfig) -> Self {
        Self {
            perlin: Perlin::new(config.seed),
            config,
        }
    }

    /// Multi-octave sample at 2D coordinates, in `[-1.0, 1.0]`.
    pub fn sample_2d(&self, x: f64, y: f64) -> f64 {
        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = self.config.frequency;
        let mut max_value = 0.0;

        for _ in 0..self.config.octaves {
            value += self.perlin.get([x * frequency, y * frequency]) * amplitude;
            max_value += amplitude;

            amplitude *= self.config.persistence;
            frequency *= self.config.lacunarity;
        }

        if max_value == 0.0 {
            return 0.0;
        }
        (value / max_value).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_determinism() {
        let gen1 = NoiseGenerator::new(NoiseConfig::terrain(12345));
        let gen2 = NoiseGenerator::new(NoiseConfig::terrain(12345));

        for x in 0..10 {
            for y in 0..10 {
                let val1 = gen1.sample_2d(x as f64, y as f64);
                let val2 = gen2.sample_2d(x as f64, y as f64);
                assert_eq!(val1, val2, "Noise not deterministic at ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_noise_range() {
        let gen = NoiseGenerator::new(NoiseConfig::default());

        for x in 0..100 {
            for y in 0..100 {
                let val = gen.sample_2d(x as f64 * 0.1, y as f64 * 0.1);
                assert!(
                    (-1.0..=1.0).contains(&val),
                    "Noise value {} out of range at ({}, {})",
                    val,
                    x,
                    y
                );
            }
        }
    }

    #[test]
    fn test_zero_octaves_is_flat() {
        let gen = NoiseGenerator::new(NoiseConfig {
            octaves: 0,
            ..Default::default()
        });
        assert_eq!(gen.sample_2d(3.5, 1.25), 0.0);
    }
}
