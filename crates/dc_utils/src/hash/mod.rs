//! Provide hash containers, re-exports *hashbrown* and *foldhash*.

// -----------------------------------------------------------------------------
// Modules

mod hasher;

// -----------------------------------------------------------------------------
// Exports

pub use hasher::{FixedHashState, FixedHasher};
pub use hasher::{NoOpHashState, NoOpHasher};

/// A [`hashbrown::HashMap`] using [`FixedHashState`] by default.
pub type HashMap<K, V, S = FixedHashState> = hashbrown::HashMap<K, V, S>;

// -----------------------------------------------------------------------------
// Re-export crates

pub use foldhash;
pub use hashbrown;

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::HashMap;

    #[test]
    fn fixed_state_maps() {
        let mut map: HashMap<&str, u32> = HashMap::default();
        map.insert("circle", 1);
        map.insert("square", 2);
        assert_eq!(map.get("circle"), Some(&1));
        assert_eq!(map.insert("circle", 3), Some(1));
        assert_eq!(map.len(), 2);
    }
}
