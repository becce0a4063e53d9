//! Random sources used by the resolution engine.
//!
//! Every formula draws through [`RandomSource`], a single `next_f64` seam in
//! `[0, 1)`. Matches use an [`RngBundle`] of seeded, domain-separated
//! streams; tests substitute a [`ScriptedRng`].
use hmac::{Hmac, Mac};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::Sha256;

use crate::numbers::{floor_f64_to_usize, usize_to_f64};

/// Uniform float source in `[0, 1)`.
pub trait RandomSource {
    /// Draw the next value in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Bernoulli trial. Always consumes exactly one draw.
    fn chance(&mut self, probability: f64) -> bool {
        self.next_f64() < probability
    }

    /// Uniform index in `0..len`, or `None` (without drawing) for an empty range.
    fn pick_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let idx = floor_f64_to_usize(self.next_f64() * usize_to_f64(len));
        Some(idx.min(len - 1))
    }

    /// Uniform integer in `lo..=hi`. Returns `lo` when the range is empty.
    fn range_inclusive(&mut self, lo: i32, hi: i32) -> i32 {
        let roll = self.next_f64();
        if hi <= lo {
            return lo;
        }
        let span = f64::from(hi) - f64::from(lo) + 1.0;
        let offset = (roll * span).floor().min(span - 1.0);
        lo.saturating_add(crate::numbers::floor_f64_to_i32(offset))
    }
}

impl<T: RandomSource + ?Sized> RandomSource for &mut T {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

impl<T: RandomSource + ?Sized> RandomSource for Box<T> {
    fn next_f64(&mut self) -> f64 {
        (**self).next_f64()
    }
}

/// Counting wrapper for RNG streams providing instrumentation.
#[derive(Debug, Clone)]
pub struct CountingRng<R> {
    rng: R,
    draws: u64,
}

impl CountingRng<ChaCha8Rng> {
    /// Seeded ChaCha stream.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl<R: RngCore> CountingRng<R> {
    /// Number of draw calls performed against this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl<R: RngCore> RngCore for CountingRng<R> {
    fn next_u32(&mut self) -> u32 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.draws = self.draws.saturating_add(1);
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.draws = self.draws.saturating_add(1);
        self.rng.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.draws = self.draws.saturating_add(1);
        self.rng.try_fill_bytes(dest)
    }
}

impl<R: RngCore> RandomSource for CountingRng<R> {
    fn next_f64(&mut self) -> f64 {
        self.r#gen::<f64>()
    }
}

/// Deterministic source replaying a fixed script of values, cycling when exhausted.
///
/// Values are clamped into `[0, 1)`. An empty script always yields `0.0`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRng {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedRng {
    #[must_use]
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        Self {
            values: values.into(),
            cursor: 0,
        }
    }

    /// Source that returns the same value forever.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    /// Number of values consumed so far.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedRng {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let value = self.values[self.cursor % self.values.len()];
        self.cursor = self.cursor.saturating_add(1);
        if value.is_finite() {
            value.clamp(0.0, 1.0 - f64::EPSILON)
        } else {
            0.0
        }
    }
}

/// Per-domain stream access used by the phase orchestrator.
pub trait PhaseStreams {
    /// Turn order shuffling and per-turn branch rolls.
    fn turn(&mut self) -> &mut dyn RandomSource;
    /// Battle score rolls.
    fn battle(&mut self) -> &mut dyn RandomSource;
    /// Minor event selection and magnitudes.
    fn event(&mut self) -> &mut dyn RandomSource;
    /// Flavor text selection.
    fn flavor(&mut self) -> &mut dyn RandomSource;
}

/// Deterministic bundle of RNG streams segregated by simulation domain.
#[derive(Debug, Clone)]
pub struct RngBundle {
    seed: u64,
    turn: CountingRng<ChaCha8Rng>,
    battle: CountingRng<ChaCha8Rng>,
    event: CountingRng<ChaCha8Rng>,
    flavor: CountingRng<ChaCha8Rng>,
}

impl RngBundle {
    /// Construct the bundle from a user-visible seed.
    #[must_use]
    pub fn from_user_seed(seed: u64) -> Self {
        Self {
            seed,
            turn: CountingRng::seeded(derive_stream_seed(seed, b"turn")),
            battle: CountingRng::seeded(derive_stream_seed(seed, b"battle")),
            event: CountingRng::seeded(derive_stream_seed(seed, b"event")),
            flavor: CountingRng::seeded(derive_stream_seed(seed, b"flavor")),
        }
    }

    /// Construct the bundle from process entropy (no reproducibility contract).
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::from_user_seed(rand::random::<u64>())
    }

    /// Seed the bundle was derived from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Total draws across all streams.
    #[must_use]
    pub const fn total_draws(&self) -> u64 {
        self.turn
            .draws()
            .saturating_add(self.battle.draws())
            .saturating_add(self.event.draws())
            .saturating_add(self.flavor.draws())
    }
}

impl PhaseStreams for RngBundle {
    fn turn(&mut self) -> &mut dyn RandomSource {
        &mut self.turn
    }

    fn battle(&mut self) -> &mut dyn RandomSource {
        &mut self.battle
    }

    fn event(&mut self) -> &mut dyn RandomSource {
        &mut self.event
    }

    fn flavor(&mut self) -> &mut dyn RandomSource {
        &mut self.flavor
    }
}

/// Routes every domain through one injected source.
pub struct SharedStream<'a>(pub &'a mut dyn RandomSource);

impl PhaseStreams for SharedStream<'_> {
    fn turn(&mut self) -> &mut dyn RandomSource {
        &mut *self.0
    }

    fn battle(&mut self) -> &mut dyn RandomSource {
        &mut *self.0
    }

    fn event(&mut self) -> &mut dyn RandomSource {
        &mut *self.0
    }

    fn flavor(&mut self) -> &mut dyn RandomSource {
        &mut *self.0
    }
}

fn derive_stream_seed(user_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&user_seed.to_le_bytes()) else {
        return user_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_streams_are_reproducible_and_independent() {
        let mut a = RngBundle::from_user_seed(42);
        let mut b = RngBundle::from_user_seed(42);
        let first: Vec<f64> = (0..4).map(|_| a.battle().next_f64()).collect();
        let second: Vec<f64> = (0..4).map(|_| b.battle().next_f64()).collect();
        assert_eq!(first, second);

        let turn = a.turn().next_f64();
        let battle = a.battle().next_f64();
        assert!((turn - battle).abs() > f64::EPSILON);
        assert_eq!(a.total_draws(), 6);
    }

    #[test]
    fn draws_stay_in_unit_interval() {
        let mut bundle = RngBundle::from_user_seed(7);
        for _ in 0..1_000 {
            let value = bundle.event().next_f64();
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn scripted_source_cycles_and_clamps() {
        let mut rng = ScriptedRng::new(vec![0.25, 1.5, -2.0]);
        assert!((rng.next_f64() - 0.25).abs() < f64::EPSILON);
        assert!(rng.next_f64() < 1.0);
        assert!(rng.next_f64().abs() < f64::EPSILON);
        assert!((rng.next_f64() - 0.25).abs() < f64::EPSILON);
        assert_eq!(rng.consumed(), 4);
    }

    #[test]
    fn helpers_map_draws_onto_ranges() {
        let mut rng = ScriptedRng::constant(0.999);
        assert_eq!(rng.pick_index(4), Some(3));
        assert_eq!(rng.range_inclusive(3, 9), 9);
        assert_eq!(rng.pick_index(0), None);

        let mut low = ScriptedRng::constant(0.0);
        assert_eq!(low.range_inclusive(3, 9), 3);
        assert!(low.chance(0.1));
        assert!(!low.chance(0.0));
    }

    #[test]
    fn shared_stream_routes_all_domains() {
        let mut scripted = ScriptedRng::new(vec![0.1, 0.2, 0.3, 0.4]);
        let mut shared = SharedStream(&mut scripted);
        assert!((shared.turn().next_f64() - 0.1).abs() < f64::EPSILON);
        assert!((shared.battle().next_f64() - 0.2).abs() < f64::EPSILON);
        assert!((shared.event().next_f64() - 0.3).abs() < f64::EPSILON);
        assert!((shared.flavor().next_f64() - 0.4).abs() < f64::EPSILON);
    }
}
