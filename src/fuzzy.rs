//! Fuzzy inference controller mapping heart-rate signals to a target energy.
//!
//! Implements a 3-rule Mamdani system: normalized BPM and normalized BPM
//! variation are fuzzified against trapezoidal zones, the rule base is
//! evaluated with max/min as fuzzy OR/AND, and the clipped output categories
//! are aggregated and defuzzified by centroid.
//!
//! The zone breakpoints are calibration data. BPM zones follow standard
//! exercise-intensity bands (Very Light through Near Maximal) over BPM
//! normalized by the age-predicted maximum heart rate.

use log::trace;

/// Lower bound of the output universe. Extends below 0 so the centroid of a
/// fully-clipped `Low` set is not biased away from the edge.
pub const OUTPUT_MIN: f64 = -0.2;
/// Upper bound of the output universe, extended past 1 for the same reason.
pub const OUTPUT_MAX: f64 = 1.21;
/// Reference sampling step for centroid defuzzification.
pub const DEFAULT_RESOLUTION: f64 = 0.01;

/// Trapezoidal membership function with breakpoints `a <= b <= c <= d`.
///
/// Membership is 0 outside `[a, d]`, 1 on the plateau `[b, c]`, and linear
/// on the ascending and descending ramps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trapezoid {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
}

impl Trapezoid {
    #[must_use]
    pub const fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self { a, b, c, d }
    }

    /// Degree of membership of `x` in this fuzzy set.
    #[must_use]
    pub fn membership(&self, x: f64) -> f64 {
        if x < self.a || x > self.d {
            0.0
        } else if x >= self.b && x <= self.c {
            1.0
        } else if x < self.b {
            (x - self.a) / (self.b - self.a)
        } else {
            (self.d - x) / (self.d - self.c)
        }
    }
}

/// Exercise-intensity zones over normalized BPM.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BpmZone {
    VeryLight,
    Light,
    Moderate,
    Vigorous,
    NearMaximal,
}

impl BpmZone {
    /// Calibrated membership function for this zone.
    #[must_use]
    pub const fn shape(self) -> Trapezoid {
        match self {
            Self::VeryLight => Trapezoid::new(0.00, 0.00, 0.54, 0.60),
            Self::Light => Trapezoid::new(0.54, 0.60, 0.61, 0.67),
            Self::Moderate => Trapezoid::new(0.61, 0.67, 0.70, 0.84),
            Self::Vigorous => Trapezoid::new(0.70, 0.84, 0.93, 0.99),
            Self::NearMaximal => Trapezoid::new(0.93, 0.99, 1.00, 1.00),
        }
    }

    #[must_use]
    pub fn membership(self, bpm_norm: f64) -> f64 {
        self.shape().membership(bpm_norm)
    }
}

/// Direction of heart-rate change over normalized BPM variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariationZone {
    Negative,
    Zero,
    Positive,
}

impl VariationZone {
    #[must_use]
    pub const fn shape(self) -> Trapezoid {
        match self {
            Self::Negative => Trapezoid::new(-0.2, -0.2, -0.15, -0.05),
            Self::Zero => Trapezoid::new(-0.15, -0.05, 0.05, 0.15),
            Self::Positive => Trapezoid::new(0.05, 0.15, 0.2, 0.21),
        }
    }

    #[must_use]
    pub fn membership(self, delta_norm: f64) -> f64 {
        self.shape().membership(delta_norm)
    }
}

/// Output energy categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyCategory {
    Low,
    Medium,
    High,
}

impl EnergyCategory {
    #[must_use]
    pub const fn shape(self) -> Trapezoid {
        match self {
            Self::Low => Trapezoid::new(-0.2, -0.2, 0.0, 0.375),
            Self::Medium => Trapezoid::new(0.125, 0.5, 0.5, 0.875),
            Self::High => Trapezoid::new(0.625, 1.0, 1.21, 1.21),
        }
    }
}

/// Firing strengths of the three rules, keyed by consequent category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleStrengths {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

/// Age-predicted maximum heart rate (Tanaka et al., "Age-Predicted Maximal
/// Heart Rate Revisited").
#[must_use]
pub fn max_heart_rate(age: f64) -> f64 {
    208.0 - 0.7 * age
}

/// Mamdani fuzzy controller producing a target track energy in [0, 1].
#[derive(Debug, Clone)]
pub struct FuzzyController {
    resolution: f64,
}

impl Default for FuzzyController {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
        }
    }
}

impl FuzzyController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Controller with a custom centroid sampling step. Finer steps converge
    /// to the same centroid within numerical tolerance.
    #[must_use]
    pub fn with_resolution(resolution: f64) -> Self {
        Self { resolution }
    }

    /// Infer the target energy for the given raw BPM, BPM delta and age.
    ///
    /// Pure and deterministic. Inputs are normalized by the age-predicted
    /// maximum heart rate and clamped to the membership universes so the
    /// rule base always fires. Callers must supply a plausible age; ages
    /// producing a non-positive maximum heart rate are rejected upstream.
    #[must_use]
    pub fn infer(&self, bpm: f64, bpm_delta: f64, age: f64) -> f64 {
        let hr_max = max_heart_rate(age);
        let bpm_norm = (bpm / hr_max).clamp(0.0, 1.0);
        let delta_norm = (bpm_delta / hr_max).clamp(-0.2, 0.2);

        let strengths = rule_strengths(bpm_norm, delta_norm);
        let energy = self.centroid(&strengths);
        trace!(
            "fuzzy inference: bpm_norm={bpm_norm:.4} delta_norm={delta_norm:.4} \
             strengths={strengths:?} energy={energy:.4}"
        );
        energy
    }

    /// Centroid of the aggregated output set, sampled at `self.resolution`.
    fn centroid(&self, strengths: &RuleStrengths) -> f64 {
        let low = EnergyCategory::Low.shape();
        let medium = EnergyCategory::Medium.shape();
        let high = EnergyCategory::High.shape();

        let steps = ((OUTPUT_MAX - OUTPUT_MIN) / self.resolution).round() as usize;
        let mut weighted = 0.0;
        let mut area = 0.0;
        for i in 0..=steps {
            let x = OUTPUT_MIN + i as f64 * self.resolution;
            // Aggregation is the union (max) of the clipped consequents.
            let mu = strengths
                .low
                .min(low.membership(x))
                .max(strengths.medium.min(medium.membership(x)))
                .max(strengths.high.min(high.membership(x)));
            weighted += x * mu;
            area += mu;
        }

        debug_assert!(area > 0.0, "clamped inputs must activate a rule");
        weighted / area
    }
}

/// Evaluate the rule base for already-normalized inputs.
///
/// - R1 (High): Very Light, or Light with Negative or Zero variation, or
///   Moderate with Negative variation.
/// - R2 (Medium): Light with Positive, Moderate with Zero or Positive, or
///   Vigorous with Negative or Zero variation.
/// - R3 (Low): Near Maximal, or Vigorous with Positive variation.
#[must_use]
pub fn rule_strengths(bpm_norm: f64, delta_norm: f64) -> RuleStrengths {
    let very_light = BpmZone::VeryLight.membership(bpm_norm);
    let light = BpmZone::Light.membership(bpm_norm);
    let moderate = BpmZone::Moderate.membership(bpm_norm);
    let vigorous = BpmZone::Vigorous.membership(bpm_norm);
    let near_maximal = BpmZone::NearMaximal.membership(bpm_norm);

    let negative = VariationZone::Negative.membership(delta_norm);
    let zero = VariationZone::Zero.membership(delta_norm);
    let positive = VariationZone::Positive.membership(delta_norm);

    let high = very_light
        .max(light.min(negative))
        .max(light.min(zero))
        .max(moderate.min(negative));

    let medium = light
        .min(positive)
        .max(moderate.min(zero))
        .max(moderate.min(positive))
        .max(vigorous.min(negative))
        .max(vigorous.min(zero));

    let low = near_maximal.max(vigorous.min(positive));

    RuleStrengths { low, medium, high }
}
