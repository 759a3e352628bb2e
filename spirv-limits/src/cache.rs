// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

use crate::{validate, DeviceProfile, Diagnostic, ValidationInfo};
use foldhash::HashMap;
use parking_lot::RwLock;
use std::sync::Arc;

/// Remembers the result of validating modules against one device profile.
///
/// Validating the same words with the same [`ValidationInfo`] a second time returns the stored
/// diagnostics. Results are kept until [`clear`](Self::clear) is called.
///
/// Readers never block each other, except when an entry is vacant. Validation runs without
/// holding the lock, and entries are immutable after insertion.
#[derive(Debug)]
pub struct ValidationCache {
    profile: Arc<DeviceProfile>,
    inner: RwLock<HashMap<Vec<u32>, HashMap<ValidationInfo, Arc<[Diagnostic]>>>>,
}

impl ValidationCache {
    /// Creates an empty cache for `profile`.
    pub fn new(profile: Arc<DeviceProfile>) -> Self {
        ValidationCache {
            profile,
            inner: RwLock::new(HashMap::default()),
        }
    }

    /// Returns the profile that modules are validated against.
    #[inline]
    pub fn profile(&self) -> &Arc<DeviceProfile> {
        &self.profile
    }

    /// Returns the diagnostics of `words`, validating the module if it hasn't been validated
    /// with `info` before.
    pub fn validate(&self, words: &[u32], info: &ValidationInfo) -> Arc<[Diagnostic]> {
        if let Some(diagnostics) = self.get(words, info) {
            log::trace!("validation cache hit for a module of {} words", words.len());
            return diagnostics;
        }

        let diagnostics: Arc<[Diagnostic]> = validate(&self.profile, words, info).into();

        self.inner
            .write()
            .entry(words.to_vec())
            .or_default()
            .entry(info.clone())
            .or_insert_with(|| diagnostics.clone())
            .clone()
    }

    fn get(&self, words: &[u32], info: &ValidationInfo) -> Option<Arc<[Diagnostic]>> {
        self.inner.read().get(words)?.get(info).cloned()
    }

    /// Removes every stored result.
    ///
    /// Entries are never evicted on their own, so a cache that sees many distinct modules should
    /// be cleared from time to time.
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Returns the number of stored results.
    pub fn len(&self) -> usize {
        self.inner.read().values().map(HashMap::len).sum()
    }

    /// Returns whether no results are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{tests::ModuleBuilder, Version};
    use std::thread;

    fn module(x_size: u32) -> Vec<u32> {
        let mut asm = ModuleBuilder::compute(Version::V1_0);
        asm.local_size(x_size, 1, 1);
        asm.assemble()
    }

    #[test]
    fn stores_results() {
        let cache = ValidationCache::new(Arc::new(DeviceProfile::default()));
        let info = ValidationInfo::default();
        let words = module(256);

        let first = cache.validate(&words, &info);
        let second = cache.validate(&words, &info);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.len(), 1);
        assert_eq!(cache.len(), 1);

        let named = cache.validate(&words, &ValidationInfo::entry_point("main"));
        assert_eq!(named, first);
        assert_eq!(cache.len(), 2);

        assert!(cache.validate(&module(1), &info).is_empty());
        assert_eq!(cache.len(), 3);

        cache.clear();
        assert!(cache.is_empty());
        assert!(!Arc::ptr_eq(&cache.validate(&words, &info), &first));
    }

    #[test]
    fn concurrent_validation() {
        let cache = ValidationCache::new(Arc::new(DeviceProfile::default()));
        let info = ValidationInfo::default();
        let modules: Vec<Vec<u32>> = [1, 64, 128, 129, 1000].map(module).into();

        let results: Vec<Vec<Arc<[Diagnostic]>>> = thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| {
                    scope.spawn(|| {
                        modules
                            .iter()
                            .map(|words| cache.validate(words, &info))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect()
        });

        for result in &results {
            for (words, diagnostics) in modules.iter().zip(result) {
                assert_eq!(**diagnostics, *validate(cache.profile(), words, &info));
            }
        }

        assert_eq!(cache.len(), modules.len());
    }
}
