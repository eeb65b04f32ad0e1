//! Centralized defaults for Lineage run parameters.
//!
//! All tunables are defined here with the `LINEAGE_` prefix. The same names are read from the
//! environment by [crate::config::RunConfig::with_env_overrides].

// ============================================================================
// Population Parameters
// ============================================================================

/// Number of individuals in every population
pub const LINEAGE_POPULATION_SIZE: usize = 100;

/// A newborn joins a specie when its compatibility with a member exceeds `1 - threshold`
pub const LINEAGE_SPECIATION_THRESHOLD: f64 = 0.25;

/// Fraction of every specie ( best first ) eligible to parent the next generation
pub const LINEAGE_SPECIES_CULL_RATE: f64 = 0.5;

// ============================================================================
// Reproduction Parameters
// ============================================================================

/// Probability that a newborn is a mutated clone rather than a crossover child
pub const LINEAGE_CLONING_RATE: f64 = 0.25;

/// Probability that a crossover partner is drawn from another specie
pub const LINEAGE_INTERSPECIES_RATE: f64 = 0.001;

/// Draws of a second parent before falling back to a uniform pick among distinct members
pub const LINEAGE_PARTNER_RESAMPLE_LIMIT: usize = 64;

// ============================================================================
// Mutation Parameters
// ============================================================================

/// Per-gene probability of splitting a connection with a new hidden node
pub const LINEAGE_MUTATION_SPLIT_RATE: f64 = 0.01;

/// Per-gene probability of perturbing a connection weight
pub const LINEAGE_MUTATION_WEIGHT_RATE: f64 = 0.05;

/// Per-gene probability of toggling a connection on or off
pub const LINEAGE_MUTATION_SWITCH_RATE: f64 = 0.02;

/// Per-gene probability of scheduling one new connection
pub const LINEAGE_MUTATION_ADD_RATE: f64 = 0.02;

/// Half-width of the uniform weight perturbation
pub const LINEAGE_MUTATION_WEIGHT_STD: f64 = 0.01;

/// Bound of the uniform weight given to brand new connections
pub const LINEAGE_NEW_WEIGHT_BOUND: f64 = 1.0;

// ============================================================================
// Phenotype Parameters
// ============================================================================

/// Convergence tolerance per output node
pub const LINEAGE_RELAXATION_EPSILON: f64 = 1e-6;

/// Sweeps before a relaxation is declared divergent
pub const LINEAGE_RELAXATION_MAX_ITERATIONS: usize = 10_000;

/// Constant value held by the bias node
pub const LINEAGE_BIAS_VALUE: f64 = 1.0;
