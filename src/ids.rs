use rand::Rng;
use std::collections::HashSet;

/// Random bytes behind each document key (hex-encoded to 32 characters).
const KEY_BYTES: usize = 16;

/// Hands out document keys and `collection/key` ids.
#[derive(Debug, Default)]
pub struct IdAllocator {
    issued: HashSet<String>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `(id, key)` for a new document in `collection`.
    pub fn allocate<R: Rng + ?Sized>(&mut self, collection: &str, rng: &mut R) -> (String, String) {
        let key = loop {
            let candidate = random_key(rng);
            if self.issued.insert(candidate.clone()) {
                break candidate;
            }
        };
        (format!("{}/{}", collection, key), key)
    }

    /// Marks a key as taken, e.g. for documents reloaded from a checkpoint.
    pub fn register(&mut self, key: &str) {
        self.issued.insert(key.to_string());
    }

    pub fn issued(&self) -> usize {
        self.issued.len()
    }
}

fn random_key<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0u8; KEY_BYTES];
    rng.fill(&mut bytes[..]);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_id_is_collection_slash_key() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut ids = IdAllocator::new();
        let (id, key) = ids.allocate("issues", &mut rng);
        assert_eq!(id, format!("issues/{}", key));
        assert_eq!(key.len(), KEY_BYTES * 2);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_keys_unique() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut ids = IdAllocator::new();
        let keys: HashSet<String> = (0..5000)
            .map(|_| ids.allocate("commits", &mut rng).1)
            .collect();
        assert_eq!(keys.len(), 5000);
        assert_eq!(ids.issued(), 5000);
    }

    #[test]
    fn test_registered_key_never_reissued() {
        // Two allocators on the same seed produce the same first key;
        // registering it forces the second to redraw.
        let mut first = IdAllocator::new();
        let (_, taken) = first.allocate("branches", &mut StdRng::seed_from_u64(3));

        let mut second = IdAllocator::new();
        second.register(&taken);
        let (_, key) = second.allocate("branches", &mut StdRng::seed_from_u64(3));
        assert_ne!(key, taken);
    }
}
