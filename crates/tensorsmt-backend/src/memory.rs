//! Memory planning: offset assignment and verification.
//!
//! Planning assigns a byte offset to every participating [`TensorSpec`];
//! verification enforces the non-overlap invariant: two specs with
//! overlapping lifetimes and no declared aliasing relation must not share
//! any byte range, unless explicitly allowed. Verification failures are
//! fatal and never silently downgraded.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tensorsmt_ir::{SpecRole, TensorSpec};

/// Default platform alignment for planned storage.
pub const ALIGNMENT: usize = 16;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MemoryError {
    #[error("storage for {a} and {b} overlaps while both are live")]
    StorageOverlap { a: String, b: String },
    #[error("value {value} is designated for allocation but has no storage assigned")]
    MissingAllocation { value: String },
}

/// The allocation algorithm to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoryAlgorithm {
    /// General-purpose suite; currently a bump allocator with no reuse.
    Suite,
    /// Size-sorted first-fit with lifetime-aware storage reuse. Receives an
    /// additional storage-reuse verification pass.
    Greedy,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemoryPlanningConfig {
    pub alloc_graph_input: bool,
    pub alloc_graph_output: bool,
    pub alloc_mutable_buffers: bool,
    pub alignment: usize,
    pub allow_lifetime_and_storage_overlap: bool,
    pub algorithm: MemoryAlgorithm,
}

impl Default for MemoryPlanningConfig {
    fn default() -> Self {
        MemoryPlanningConfig {
            alloc_graph_input: true,
            alloc_graph_output: true,
            alloc_mutable_buffers: true,
            alignment: ALIGNMENT,
            allow_lifetime_and_storage_overlap: false,
            algorithm: MemoryAlgorithm::Suite,
        }
    }
}

impl MemoryPlanningConfig {
    fn participates(&self, role: SpecRole) -> bool {
        match role {
            SpecRole::Input => self.alloc_graph_input,
            SpecRole::Output => self.alloc_graph_output,
            SpecRole::MutableBuffer => self.alloc_mutable_buffers,
            SpecRole::Temporary => true,
        }
    }
}

/// Outcome diagnostics of a planning run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryPlanningReport {
    /// Total bytes of the planned arena.
    pub total_bytes: u64,
    /// Pairs of specs that reuse the same storage across disjoint
    /// lifetimes.
    pub storage_reuse_pairs: usize,
}

fn align_up(offset: u64, alignment: usize) -> u64 {
    let alignment = alignment.max(1) as u64;
    offset.div_ceil(alignment) * alignment
}

/// The memory planning pass: offset assignment followed by verification.
#[derive(Debug, Default)]
pub struct MemoryPlanningPass {
    config: MemoryPlanningConfig,
}

impl MemoryPlanningPass {
    pub fn new(config: MemoryPlanningConfig) -> Self {
        MemoryPlanningPass { config }
    }

    /// Assign offsets to every participating spec, propagate aliases, then
    /// verify. Aliased specs inherit the offset of their alias target and
    /// are not planned independently.
    pub fn run(&self, specs: &mut [TensorSpec]) -> Result<MemoryPlanningReport, MemoryError> {
        match self.config.algorithm {
            MemoryAlgorithm::Suite => self.assign_bump(specs),
            MemoryAlgorithm::Greedy => self.assign_greedy(specs),
        }
        self.propagate_aliases(specs);

        let verifier = Verifier::new(specs, &self.config);
        let storage_reuse_pairs =
            verifier.verify_storage_reuse(self.config.allow_lifetime_and_storage_overlap)?;
        tracing::info!(
            algorithm = ?self.config.algorithm,
            reuse_pairs = storage_reuse_pairs,
            "memory planning reuses storage for {} pair(s) of tensors",
            storage_reuse_pairs
        );
        verifier.verify_graph_input_output()?;
        if self.config.algorithm == MemoryAlgorithm::Greedy {
            // The reuse-heavy algorithm gets a second, strict pass.
            verifier.verify_storage_reuse(false)?;
        }

        let total_bytes = specs
            .iter()
            .filter_map(|s| s.offset.map(|o| o + s.size_bytes as u64))
            .max()
            .unwrap_or(0);
        Ok(MemoryPlanningReport {
            total_bytes,
            storage_reuse_pairs,
        })
    }

    fn is_planned_directly(&self, spec: &TensorSpec) -> bool {
        self.config.participates(spec.role) && spec.aliases.is_empty()
    }

    /// Every participating spec gets a fresh aligned extent; no reuse.
    fn assign_bump(&self, specs: &mut [TensorSpec]) {
        let mut cursor = 0u64;
        for spec in specs.iter_mut() {
            if !self.is_planned_directly(spec) {
                continue;
            }
            let alignment = spec.alignment.max(self.config.alignment);
            let offset = align_up(cursor, alignment);
            spec.offset = Some(offset);
            cursor = offset + spec.size_bytes as u64;
        }
    }

    /// Size-sorted first-fit: each spec takes the lowest aligned offset
    /// that conflicts with no already-placed spec of overlapping lifetime.
    fn assign_greedy(&self, specs: &mut [TensorSpec]) {
        let mut order: Vec<usize> = (0..specs.len())
            .filter(|&i| self.is_planned_directly(&specs[i]))
            .collect();
        order.sort_by_key(|&i| std::cmp::Reverse(specs[i].size_bytes));

        for &i in &order {
            let alignment = specs[i].alignment.max(self.config.alignment);
            let mut candidate = 0u64;
            loop {
                candidate = align_up(candidate, alignment);
                let end = candidate + specs[i].size_bytes as u64;
                let conflict = (0..specs.len()).find(|&j| {
                    j != i
                        && specs[j].offset.is_some()
                        && specs[i].lifetime_overlaps(&specs[j])
                        && !specs[i].aliases_with(&specs[j])
                        && {
                            let jo = specs[j].offset.unwrap_or(0);
                            let je = jo + specs[j].size_bytes as u64;
                            candidate < je && jo < end
                        }
                });
                match conflict {
                    Some(j) => {
                        // Jump past the conflicting extent and retry.
                        candidate = specs[j].offset.unwrap_or(0) + specs[j].size_bytes as u64;
                    }
                    None => {
                        specs[i].offset = Some(candidate);
                        break;
                    }
                }
            }
        }
    }

    /// Aliased specs share their target's storage.
    fn propagate_aliases(&self, specs: &mut [TensorSpec]) {
        let offsets: std::collections::HashMap<_, _> = specs
            .iter()
            .filter_map(|s| s.offset.map(|o| (s.value, o)))
            .collect();
        for spec in specs.iter_mut() {
            if spec.offset.is_none() {
                if let Some(&offset) = spec.aliases.iter().find_map(|a| offsets.get(a)) {
                    spec.offset = Some(offset);
                }
            }
        }
    }
}

/// Checks a completed storage assignment against the planning invariants.
pub struct Verifier<'a> {
    specs: &'a [TensorSpec],
    config: &'a MemoryPlanningConfig,
}

impl<'a> Verifier<'a> {
    pub fn new(specs: &'a [TensorSpec], config: &'a MemoryPlanningConfig) -> Self {
        Verifier { specs, config }
    }

    /// Enforce non-overlap for live, non-aliased pairs; return the number
    /// of pairs that legitimately reuse storage across disjoint lifetimes.
    ///
    /// With `allow_overlap` set (the caller-opted relaxation), violating
    /// pairs are skipped instead of failing.
    pub fn verify_storage_reuse(&self, allow_overlap: bool) -> Result<usize, MemoryError> {
        let mut reuse_pairs = 0;
        for i in 0..self.specs.len() {
            for j in (i + 1)..self.specs.len() {
                let a = &self.specs[i];
                let b = &self.specs[j];
                if !a.storage_overlaps(b) {
                    continue;
                }
                if a.aliases_with(b) {
                    continue;
                }
                if !a.lifetime_overlaps(b) {
                    reuse_pairs += 1;
                    continue;
                }
                if allow_overlap || a.allow_overlap || b.allow_overlap {
                    continue;
                }
                return Err(MemoryError::StorageOverlap {
                    a: a.value.to_string(),
                    b: b.value.to_string(),
                });
            }
        }
        Ok(reuse_pairs)
    }

    /// Every value designated for allocation must have an assignment.
    pub fn verify_graph_input_output(&self) -> Result<(), MemoryError> {
        for spec in self.specs {
            if self.config.participates(spec.role) && spec.offset.is_none() {
                return Err(MemoryError::MissingAllocation {
                    value: spec.value.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensorsmt_ir::NodeId;

    fn spec(id: usize, lifetime: (usize, usize), size: usize) -> TensorSpec {
        TensorSpec::new(NodeId(id), SpecRole::Temporary, lifetime, size)
    }

    #[test]
    fn bump_allocation_never_overlaps() {
        let mut specs = vec![spec(0, (0, 2), 64), spec(1, (1, 3), 32), spec(2, (2, 4), 16)];
        let pass = MemoryPlanningPass::new(MemoryPlanningConfig::default());
        let report = pass.run(&mut specs).unwrap();

        assert!(specs.iter().all(|s| s.offset.is_some()));
        assert_eq!(report.storage_reuse_pairs, 0);
        assert!(report.total_bytes >= 112);
    }

    #[test]
    fn greedy_reuses_storage_across_disjoint_lifetimes() {
        let mut specs = vec![spec(0, (0, 1), 64), spec(1, (2, 3), 64)];
        let config = MemoryPlanningConfig {
            algorithm: MemoryAlgorithm::Greedy,
            ..MemoryPlanningConfig::default()
        };
        let report = MemoryPlanningPass::new(config).run(&mut specs).unwrap();

        assert_eq!(specs[0].offset, specs[1].offset);
        assert_eq!(report.storage_reuse_pairs, 1);
        assert_eq!(report.total_bytes, 64);
    }

    #[test]
    fn greedy_keeps_live_tensors_apart() {
        let mut specs = vec![spec(0, (0, 3), 64), spec(1, (1, 2), 64)];
        let config = MemoryPlanningConfig {
            algorithm: MemoryAlgorithm::Greedy,
            ..MemoryPlanningConfig::default()
        };
        MemoryPlanningPass::new(config).run(&mut specs).unwrap();

        assert_ne!(specs[0].offset, specs[1].offset);
    }

    #[test]
    fn overlap_of_live_values_is_fatal() {
        let mut specs = vec![spec(0, (0, 2), 64), spec(1, (1, 3), 64)];
        specs[0].offset = Some(0);
        specs[1].offset = Some(0);

        let config = MemoryPlanningConfig::default();
        let verifier = Verifier::new(&specs, &config);
        let err = verifier.verify_storage_reuse(false).unwrap_err();
        assert!(matches!(err, MemoryError::StorageOverlap { .. }));

        // The explicit relaxation flag skips the same pair.
        assert_eq!(verifier.verify_storage_reuse(true).unwrap(), 0);
    }

    #[test]
    fn declared_aliases_may_share_storage() {
        let mut a = spec(0, (0, 2), 64);
        let b = spec(1, (1, 3), 64).with_aliases(vec![NodeId(0)]);
        a.offset = Some(0);
        let mut specs = vec![a, b];

        let pass = MemoryPlanningPass::new(MemoryPlanningConfig::default());
        pass.run(&mut specs).unwrap();
        assert_eq!(specs[1].offset, Some(0));
    }

    #[test]
    fn excluded_roles_are_not_planned() {
        let mut input = spec(0, (0, 2), 64);
        input.role = SpecRole::Input;
        let mut specs = vec![input, spec(1, (0, 2), 64)];

        let config = MemoryPlanningConfig {
            alloc_graph_input: false,
            ..MemoryPlanningConfig::default()
        };
        MemoryPlanningPass::new(config).run(&mut specs).unwrap();

        assert_eq!(specs[0].offset, None);
        assert!(specs[1].offset.is_some());
    }

    #[test]
    fn missing_allocation_is_fatal() {
        let specs = vec![spec(0, (0, 2), 64)];
        let config = MemoryPlanningConfig::default();
        let verifier = Verifier::new(&specs, &config);
        let err = verifier.verify_graph_input_output().unwrap_err();
        assert!(matches!(err, MemoryError::MissingAllocation { .. }));
    }

    #[test]
    fn offsets_respect_alignment() {
        let mut specs = vec![spec(0, (0, 1), 3), spec(1, (0, 1), 5)];
        let pass = MemoryPlanningPass::new(MemoryPlanningConfig::default());
        pass.run(&mut specs).unwrap();

        for s in &specs {
            assert_eq!(s.offset.unwrap() % ALIGNMENT as u64, 0);
        }
    }
}
