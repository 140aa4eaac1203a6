use ahash::HashMap;

/// Reverse lookup from animator hashes back to the human readable names they were built from.
///
/// Animators only ever report state and transition ids as hashes; this keeps enough
/// information around to print something useful in logs. The table is owned by a single
/// controller so that two controllers never see each other's names.
#[derive(Debug, Default)]
pub struct AnimatorNames {
    names: HashMap<i32, String>,
}

impl AnimatorNames {
    /// Remember `name` for `hash`. The first registered name for a hash wins.
    pub fn register(&mut self, hash: i32, name: &str) {
        let entry = self.names.entry(hash).or_insert_with(|| name.to_owned());
        if entry.as_str() != name {
            tracing::warn!(hash, existing = %entry, ignored = %name, "Animator hash collision");
        }
    }

    #[inline]
    pub fn get(&self, hash: i32) -> Option<&str> {
        self.names.get(&hash).map(String::as_str)
    }

    /// Return the registered name for `hash`, or the hash itself formatted as text.
    pub fn describe(&self, hash: i32) -> String {
        match self.get(hash) {
            Some(name) => name.to_owned(),
            None => hash.to_string(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
