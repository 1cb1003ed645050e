use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::capability::CapabilityKey;
use crate::catalog::CatalogSnapshot;
use crate::operator::{Entry, MultiOwnerSet, OperatorSet, PackageDependency};
use crate::sat::{Literal, VariableId};

/// Index of a candidate in the pool
pub type CandidateId = usize;

/// One entry the resolver may select.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub entry: Arc<Entry>,
    /// Whether the entry is part of the installed state
    pub installed: bool,
    /// Steps from the head of the entry's channel
    pub head_distance: u32,
}

impl Candidate {
    /// Package the candidate belongs to; unmanaged entries are their own package
    pub fn package(&self) -> &str {
        self.entry.package().unwrap_or(&self.entry.name)
    }
}

/// Every candidate of one resolution, indexed by package and by provided capability.
///
/// Candidate ids double as solver variables: candidate `i` is variable `i + 1`.
#[derive(Debug, Default)]
pub struct Pool {
    candidates: Vec<Candidate>,
    by_identifier: HashMap<String, CandidateId>,
    by_package: BTreeMap<String, Vec<CandidateId>>,
    providers: BTreeMap<CapabilityKey, Vec<CandidateId>>,
}

impl Pool {
    /// Build the pool from catalog candidates plus the installed state.
    ///
    /// An installed entry that a catalog still publishes is marked on the
    /// catalog candidate. Installed entries no catalog publishes are added as
    /// candidates of their own so they can be kept.
    pub fn new(snapshot: &CatalogSnapshot, installed: &OperatorSet) -> Self {
        let mut pool = Pool::default();

        for entry in snapshot.entries() {
            pool.add(Arc::clone(entry), false, snapshot.head_distance(entry));
        }

        for entry in installed.entries() {
            match pool.by_identifier.get(&entry.identifier()) {
                Some(&id) => pool.candidates[id].installed = true,
                None => {
                    pool.add(Arc::clone(entry), true, 0);
                }
            }
        }

        pool
    }

    fn add(&mut self, entry: Arc<Entry>, installed: bool, head_distance: u32) -> CandidateId {
        let identifier = entry.identifier();
        if let Some(&id) = self.by_identifier.get(&identifier) {
            return id;
        }

        let id = self.candidates.len();
        let candidate = Candidate {
            entry,
            installed,
            head_distance,
        };

        self.by_package.entry(candidate.package().to_string()).or_default().push(id);
        for api in candidate.entry.provided_apis.iter() {
            self.providers.entry(api.without_plural()).or_default().push(id);
        }
        self.by_identifier.insert(identifier, id);
        self.candidates.push(candidate);
        id
    }

    pub fn candidate(&self, id: CandidateId) -> &Candidate {
        &self.candidates[id]
    }

    pub fn entry(&self, id: CandidateId) -> &Arc<Entry> {
        &self.candidates[id].entry
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn ids(&self) -> std::ops::Range<CandidateId> {
        0..self.candidates.len()
    }

    pub fn id_of(&self, identifier: &str) -> Option<CandidateId> {
        self.by_identifier.get(identifier).copied()
    }

    /// Packages in lexical order with their candidates
    pub fn packages(&self) -> impl Iterator<Item = (&str, &[CandidateId])> + '_ {
        self.by_package.iter().map(|(name, ids)| (name.as_str(), ids.as_slice()))
    }

    pub fn candidates_for_package(&self, package: &str) -> &[CandidateId] {
        self.by_package.get(package).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The installed candidate of `package`, if any
    pub fn installed_for_package(&self, package: &str) -> Option<CandidateId> {
        self.candidates_for_package(package)
            .iter()
            .copied()
            .find(|&id| self.candidates[id].installed)
    }

    pub fn installed(&self) -> impl Iterator<Item = CandidateId> + '_ {
        self.ids().filter(|&id| self.candidates[id].installed)
    }

    /// Candidates providing `capability`, in pool order
    pub fn providers(&self, capability: &CapabilityKey) -> &[CandidateId] {
        self.providers.get(capability).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Candidates satisfying a package dependency
    pub fn matching(&self, dependency: &PackageDependency) -> Vec<CandidateId> {
        self.candidates_for_package(&dependency.package)
            .iter()
            .copied()
            .filter(|&id| dependency.matches(&self.candidates[id].entry))
            .collect()
    }

    /// Capability owners across the pool, keyed by entry identifier
    pub fn owner_index(&self) -> MultiOwnerSet {
        let mut index = MultiOwnerSet::new();
        for candidate in &self.candidates {
            for api in candidate.entry.provided_apis.iter() {
                index.insert(api.without_plural(), candidate.entry.identifier(), Arc::clone(&candidate.entry));
            }
        }
        index
    }

    pub fn literal(id: CandidateId) -> Literal {
        (id + 1) as Literal
    }

    pub fn candidate_of(var: VariableId) -> CandidateId {
        var as CandidateId - 1
    }
}
