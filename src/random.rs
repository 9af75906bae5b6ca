use rand::{rngs::SmallRng, Rng, SeedableRng};

pub trait RandomSource {
    /// Uniform integer in `low..=high`.
    fn uniform_int(&mut self, low: i8, high: i8) -> i8;
}

pub struct Dice {
    rng: SmallRng,
}

impl Dice {
    /// A fixed seed replays the same food placements.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        Dice { rng }
    }
}

impl RandomSource for Dice {
    fn uniform_int(&mut self, low: i8, high: i8) -> i8 {
        self.rng.gen_range(low..=high)
    }
}
