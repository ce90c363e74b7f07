//! Single-slot memory of the most recent route a backend computed

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use vs_types::SwapRequest;

/// Issued before a backend awaits its upstream call
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DispatchTicket(u64);

#[derive(Debug)]
struct StoredRoute<R> {
	ticket: DispatchTicket,
	request: SwapRequest,
	route: R,
}

/// Holds the route of the latest dispatched request only
///
/// A response is stored only when its ticket is still the latest one issued, so a
/// slow response to an older request can never replace the route of a newer one.
#[derive(Debug)]
pub struct RouteMemory<R> {
	latest: AtomicU64,
	slot: Mutex<Option<StoredRoute<R>>>,
}

impl<R: Clone> RouteMemory<R> {
	pub fn new() -> Self {
		Self {
			latest: AtomicU64::new(0),
			slot: Mutex::new(None),
		}
	}

	pub fn issue(&self) -> DispatchTicket {
		DispatchTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
	}

	fn lock(&self) -> MutexGuard<'_, Option<StoredRoute<R>>> {
		self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
	}

	/// Store `route` for `request`; returns false when a newer ticket was issued
	pub fn store(&self, ticket: DispatchTicket, request: &SwapRequest, route: R) -> bool {
		let mut slot = self.lock();
		if ticket.0 != self.latest.load(Ordering::SeqCst) {
			return false;
		}
		*slot = Some(StoredRoute {
			ticket,
			request: request.clone(),
			route,
		});
		true
	}

	/// Route computed for exactly `request`
	pub fn route_for(&self, request: &SwapRequest) -> Option<R> {
		self.lock()
			.as_ref()
			.filter(|stored| stored.request == *request)
			.map(|stored| stored.route.clone())
	}

	pub fn latest_ticket(&self) -> Option<DispatchTicket> {
		self.lock().as_ref().map(|stored| stored.ticket)
	}

	pub fn clear(&self) {
		*self.lock() = None;
	}
}

impl<R: Clone> Default for RouteMemory<R> {
	fn default() -> Self {
		Self::new()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::U256;
	use vs_types::test_utils::deposit_request;

	#[test]
	fn test_late_response_cannot_replace_newer_route() {
		let memory = RouteMemory::new();
		let old = deposit_request(U256::from(100u64));
		let new = deposit_request(U256::from(200u64));

		let old_ticket = memory.issue();
		let new_ticket = memory.issue();

		assert!(memory.store(new_ticket, &new, "route-200"));
		assert!(!memory.store(old_ticket, &old, "route-100"));

		assert_eq!(memory.route_for(&new), Some("route-200"));
		assert_eq!(memory.route_for(&old), None);
	}

	#[test]
	fn test_superseded_ticket_is_rejected_even_without_newer_route() {
		let memory = RouteMemory::new();
		let request = deposit_request(U256::from(100u64));

		let stale = memory.issue();
		let _failed_newer = memory.issue();
		assert!(!memory.store(stale, &request, 1u8));
		assert!(memory.latest_ticket().is_none());
	}

	#[test]
	fn test_route_is_bound_to_request() {
		let memory = RouteMemory::new();
		let request = deposit_request(U256::from(100u64));
		let ticket = memory.issue();
		memory.store(ticket, &request, 7u8);

		assert_eq!(memory.route_for(&request), Some(7));
		assert_eq!(memory.route_for(&request.with_amount(U256::from(101u64))), None);

		memory.clear();
		assert_eq!(memory.route_for(&request), None);
	}
}
