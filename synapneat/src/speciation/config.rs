/// How a genome's distance to an existing specie is measured during
/// grouping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistancePolicy {
    /// Minimum distance over every member. Most stable, most
    /// expensive.
    MinToAll,
    /// Distance to a single randomly drawn member.
    RandomMember,
    /// Minimum distance over a random half of the members (at least
    /// one).
    HalfRandom,
}

/// Parameters of genetic distance and specie grouping.
#[derive(Clone, Debug)]
pub struct SpeciesConfig {
    /// Desired number of species. The compatibility threshold adapts
    /// toward it between generations.
    pub target_count: usize,
    pub distance_policy: DistancePolicy,
    /// Step applied to the compatibility threshold after each
    /// grouping pass.
    pub threshold_adjustment_rate: f32,
    /// Weight of excess genes in the distance.
    pub excess_coefficient: f32,
    /// Weight of disjoint genes in the distance.
    pub disjoint_coefficient: f32,
    /// Weight of the average weight difference of matched genes.
    pub weight_coefficient: f32,
    /// Weight of the activation function mismatch fraction over
    /// matched neurons.
    pub activation_coefficient: f32,
    /// Weight of the average bias difference over matched neurons.
    pub bias_coefficient: f32,
    /// Divisor applied to the structural terms of the distance.
    pub normalization_factor: f32,
}

impl Default for SpeciesConfig {
    fn default() -> SpeciesConfig {
        SpeciesConfig {
            target_count: 8,
            distance_policy: DistancePolicy::MinToAll,
            threshold_adjustment_rate: 0.05,
            excess_coefficient: 1.0,
            disjoint_coefficient: 1.0,
            weight_coefficient: 0.4,
            activation_coefficient: 1.0,
            bias_coefficient: 0.4,
            normalization_factor: 1.0,
        }
    }
}
