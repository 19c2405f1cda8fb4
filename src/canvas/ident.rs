//! Session-unique identifiers for client-created nodes and edges.

use uuid::Uuid;

/// Generate a collision-resistant string ID (128-bit random UUID).
pub fn fresh_id() -> String {
	Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashSet;

	#[test]
	fn ids_are_unique() {
		let ids: HashSet<String> = (0..1000).map(|_| fresh_id()).collect();
		assert_eq!(ids.len(), 1000);
	}
}
