// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! The description of the device that modules are validated against.
//!
//! A [`DeviceProfile`] holds the compute limits of a physical device, the Vulkan version it
//! targets and the names of the features and extensions that would be enabled on the logical
//! device. It is never modified by validation, and can be shared between threads.
//!
//! With the `serde` feature, a profile can be read from JSON. Fields that are missing take the
//! value of [`DeviceProfile::default`]:
//!
//! ```
//! # #[cfg(feature = "serde")]
//! # {
//! use spirv_limits::{DeviceProfile, Version};
//!
//! let profile = DeviceProfile::from_json(
//!     r#"{
//!         "api_version": { "major": 1, "minor": 3, "patch": 0 },
//!         "max_compute_shared_memory_size": 49152,
//!         "enabled_features": ["shader_int8"]
//!     }"#,
//! )
//! .unwrap();
//!
//! assert_eq!(profile.api_version, Version::V1_3);
//! assert_eq!(profile.max_compute_work_group_invocations, 128);
//! # }
//! ```

use crate::{NonExhaustive, Requires, RequiresOneOf, Version};
use foldhash::HashSet;

/// The limits, features and extensions of a device.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct DeviceProfile {
    /// The Vulkan version of the target environment.
    ///
    /// The default value is [`Version::V1_0`].
    pub api_version: Version,

    /// The maximum total size in bytes of the `Workgroup` storage class variables of a compute
    /// shader.
    ///
    /// The default value is `16384`, the minimum that every device must support.
    pub max_compute_shared_memory_size: u32,

    /// The maximum size of a workgroup in each dimension.
    ///
    /// The default value is `[128, 128, 64]`.
    pub max_compute_work_group_size: [u32; 3],

    /// The maximum number of invocations in a single workgroup.
    ///
    /// The default value is `128`.
    pub max_compute_work_group_invocations: u32,

    /// The device extensions that are enabled, in snake case without the `VK_` prefix, like
    /// `khr_workgroup_memory_explicit_layout`.
    ///
    /// The default value is empty.
    pub enabled_extensions: HashSet<String>,

    /// The device features that are enabled, in snake case, like `shader_int8`.
    ///
    /// The default value is empty.
    pub enabled_features: HashSet<String>,

    #[cfg_attr(feature = "serde", serde(skip))]
    pub _ne: NonExhaustive,
}

impl Default for DeviceProfile {
    #[inline]
    fn default() -> Self {
        DeviceProfile {
            api_version: Version::V1_0,
            max_compute_shared_memory_size: 16384,
            max_compute_work_group_size: [128, 128, 64],
            max_compute_work_group_invocations: 128,
            enabled_extensions: HashSet::default(),
            enabled_features: HashSet::default(),
            _ne: NonExhaustive(()),
        }
    }
}

impl DeviceProfile {
    /// Reads a profile from a JSON object. Missing fields take their default value.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<DeviceProfile, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Returns whether the device extension `name` is enabled.
    #[inline]
    pub fn is_extension_enabled(&self, name: &str) -> bool {
        self.enabled_extensions.contains(name)
    }

    /// Returns whether the device feature `name` is enabled.
    #[inline]
    pub fn is_feature_enabled(&self, name: &str) -> bool {
        self.enabled_features.contains(name)
    }

    /// Returns whether the device meets all of the requirements of at least one of the
    /// alternatives in `requires_one_of`.
    ///
    /// An empty list of alternatives is never met.
    pub fn supports(&self, requires_one_of: RequiresOneOf) -> bool {
        requires_one_of.0.iter().any(|requires_all_of| {
            requires_all_of
                .0
                .iter()
                .all(|&requires| self.meets(requires))
        })
    }

    fn meets(&self, requires: Requires) -> bool {
        match requires {
            Requires::APIVersion(version) => self.api_version >= version,
            Requires::DeviceFeature(name) => self.is_feature_enabled(name),
            Requires::DeviceExtension(name) => self.is_extension_enabled(name),
        }
    }
}
