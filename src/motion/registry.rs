use ahash::HashMap;

use super::{
    motion::Motion,
    motions::{Idle, Interact, Jump, Locomotion},
};

/// Builds a motion with the given name and default properties.
pub type MotionFactory = fn(&str) -> Box<dyn Motion>;

/// Maps the kind names used in controller definitions to motion constructors.
#[derive(Clone, Debug)]
pub struct MotionRegistry {
    factories: HashMap<String, MotionFactory>,
}

impl Default for MotionRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Idle::KIND, |name| Box::new(Idle::new(name)));
        registry.register(Locomotion::KIND, |name| Box::new(Locomotion::new(name)));
        registry.register(Jump::KIND, |name| Box::new(Jump::new(name)));
        registry.register(Interact::KIND, |name| Box::new(Interact::new(name)));
        registry
    }
}

impl MotionRegistry {
    /// A registry without the built-in motions.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::default(),
        }
    }

    /// Register `factory` under `kind`, returning the factory it replaced.
    pub fn register(&mut self, kind: &str, factory: MotionFactory) -> Option<MotionFactory> {
        self.factories.insert(kind.to_owned(), factory)
    }

    #[inline]
    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Create a motion of `kind` called `name`.
    pub fn create(&self, kind: &str, name: &str) -> Option<Box<dyn Motion>> {
        let Some(factory) = self.factories.get(kind) else {
            tracing::warn!(kind, motion = %name, "Unknown motion kind.");
            return None;
        };

        Some(factory(name))
    }
}
