//! ACL label model and generation.
//!
//! A label set is three integers, one per ACL attribute, each drawn
//! independently and uniformly from a bounded inclusive range. There is no
//! uniqueness guarantee across documents and no exclusion of previously-seen
//! combinations.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use docgate_core::{Error, Result};

/// The three ACL attributes written onto every document, in order.
pub const ACL_FIELDS: [&str; 3] = ["ACL1", "ACL2", "ACL3"];

/// Inclusive range labels are drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclRange {
    min: i64,
    max: i64,
}

impl AclRange {
    /// Create a range; fails when `min > max`.
    pub fn new(min: i64, max: i64) -> Result<Self> {
        if min > max {
            return Err(Error::config(format!(
                "ACL range minimum ({min}) exceeds maximum ({max})"
            )));
        }
        Ok(Self { min, max })
    }

    /// Smallest label value (inclusive).
    pub fn min(&self) -> i64 {
        self.min
    }

    /// Largest label value (inclusive).
    pub fn max(&self) -> i64 {
        self.max
    }

    /// Whether a value falls inside the range.
    pub fn contains(&self, value: i64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl fmt::Display for AclRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.min, self.max)
    }
}

/// One document's ACL labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclLabelSet {
    /// Value of `ACL1`.
    pub acl1: i64,
    /// Value of `ACL2`.
    pub acl2: i64,
    /// Value of `ACL3`.
    pub acl3: i64,
}

impl AclLabelSet {
    /// Label values in attribute order.
    pub fn values(&self) -> [i64; 3] {
        [self.acl1, self.acl2, self.acl3]
    }

    /// Whether all three labels fall inside the range.
    pub fn within(&self, range: &AclRange) -> bool {
        self.values().iter().all(|v| range.contains(*v))
    }

    /// Render as the `$set` fields of a bulk update.
    pub fn to_update_fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        for (name, value) in ACL_FIELDS.iter().zip(self.values()) {
            fields.insert((*name).to_string(), Value::from(value));
        }
        fields
    }
}

impl fmt::Display for AclLabelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ACL1={} ACL2={} ACL3={}",
            self.acl1, self.acl2, self.acl3
        )
    }
}

/// Seedable source of label sets.
///
/// Production callers use [`LabelGenerator::new`] (OS entropy); tests use
/// [`LabelGenerator::seeded`] for reproducible sequences.
pub struct LabelGenerator {
    rng: StdRng,
    range: AclRange,
}

impl LabelGenerator {
    /// Generator seeded from OS entropy.
    pub fn new(range: AclRange) -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            range,
        }
    }

    /// Deterministic generator for tests.
    pub fn seeded(range: AclRange, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            range,
        }
    }

    /// The range this generator draws from.
    pub fn range(&self) -> AclRange {
        self.range
    }

    /// Draw a fresh label set: three independent uniform draws.
    pub fn generate(&mut self) -> AclLabelSet {
        AclLabelSet {
            acl1: self.rng.random_range(self.range.min..=self.range.max),
            acl2: self.rng.random_range(self.range.min..=self.range.max),
            acl3: self.rng.random_range(self.range.min..=self.range.max),
        }
    }
}

impl fmt::Debug for LabelGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelGenerator")
            .field("range", &self.range)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
