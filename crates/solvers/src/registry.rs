//! Dispatch table from solver id to backend, plus the fallback order per category

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use vs_types::{SolverBackend, SolverCategory, SolverError, SolverId, SolverResult};

/// Ordered fallback lists for the categories that have more than one member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPriorities {
	pub aggregator: Vec<SolverId>,
	pub settlement: Vec<SolverId>,
}

impl Default for CategoryPriorities {
	fn default() -> Self {
		Self {
			aggregator: vec![SolverId::AggregatorA, SolverId::AggregatorB],
			settlement: vec![SolverId::SettlementSwap],
		}
	}
}

impl CategoryPriorities {
	/// Priority list for a category; direct solvers never fall back
	pub fn for_category(&self, category: SolverCategory) -> &[SolverId] {
		match category {
			SolverCategory::Aggregator => &self.aggregator,
			SolverCategory::Settlement => &self.settlement,
			SolverCategory::Direct | SolverCategory::Unrouted => &[],
		}
	}
}

#[derive(Debug, Default)]
pub struct SolverRegistry {
	backends: HashMap<SolverId, Arc<dyn SolverBackend>>,
	priorities: CategoryPriorities,
}

impl SolverRegistry {
	pub fn new(priorities: CategoryPriorities) -> Self {
		Self {
			backends: HashMap::new(),
			priorities,
		}
	}

	pub fn register(&mut self, backend: Arc<dyn SolverBackend>) -> SolverResult<()> {
		let id = backend.id();
		if id == SolverId::None {
			return Err(SolverError::UnknownSolver(id.to_string()));
		}
		if self.backends.contains_key(&id) {
			return Err(SolverError::AlreadyRegistered(id));
		}
		self.backends.insert(id, backend);
		Ok(())
	}

	pub fn contains(&self, id: SolverId) -> bool {
		self.backends.contains_key(&id)
	}

	pub fn get(&self, id: SolverId) -> SolverResult<Arc<dyn SolverBackend>> {
		self.backends
			.get(&id)
			.cloned()
			.ok_or(SolverError::NotRegistered(id))
	}

	/// Unregistered solvers count as disabled
	pub fn is_enabled(&self, id: SolverId) -> bool {
		self.backends
			.get(&id)
			.map(|backend| backend.is_enabled())
			.unwrap_or(false)
	}

	/// Enablement of every routable solver
	pub fn enabled_table(&self) -> Vec<(SolverId, bool)> {
		SolverId::ROUTABLE
			.iter()
			.map(|id| (*id, self.is_enabled(*id)))
			.collect()
	}

	pub fn enabled_solvers(&self) -> Vec<SolverId> {
		self.enabled_table()
			.into_iter()
			.filter_map(|(id, enabled)| enabled.then_some(id))
			.collect()
	}

	pub fn priorities(&self) -> &CategoryPriorities {
		&self.priorities
	}

	/// `[selected, ..rest of its category in priority order.., None]`
	pub fn candidates(&self, selected: SolverId) -> Vec<SolverId> {
		let mut candidates = Vec::with_capacity(4);
		if selected != SolverId::None {
			candidates.push(selected);
			candidates.extend(
				self.priorities
					.for_category(selected.category())
					.iter()
					.copied()
					.filter(|id| *id != selected && id.category() == selected.category()),
			);
		}
		candidates.push(SolverId::None);
		candidates
	}

	pub fn len(&self) -> usize {
		self.backends.len()
	}

	pub fn is_empty(&self) -> bool {
		self.backends.is_empty()
	}
}
