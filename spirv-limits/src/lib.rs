// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Static validation of SPIR-V compute shaders against the limits of a Vulkan device.
//!
//! Before a compute pipeline is created, the shader module it is built from has to fit the
//! device: the total amount of `Workgroup` memory must not exceed
//! `max_compute_shared_memory_size`, the workgroup size must fit in
//! `max_compute_work_group_size` and `max_compute_work_group_invocations`, and every SPIR-V
//! capability and extension the module declares has to be backed by an enabled device
//! feature or extension. This crate checks all of that without a device, using only the
//! SPIR-V words, the specialization constants that would be given to the pipeline, and a
//! [`DeviceProfile`].
//!
//! # Brief summary
//!
//! - [`Spirv`](crate::spirv::Spirv) indexes the raw words of a module into tables of types,
//!   constants, variables, decorations and execution modes.
//! - [`resolve_constants`](crate::spirv::specialization::resolve_constants) computes the value
//!   of every constant, applying a [`SpecializationInfo`] and evaluating
//!   `OpSpecConstantOp`.
//! - The [`reflect`] module derives the workgroup memory footprint and the workgroup size.
//! - [`validate`] runs all of the above and checks the results against the profile, returning
//!   every problem found as a [`Diagnostic`].
//!
//! ```
//! use spirv_limits::{validate, DeviceProfile, ValidationInfo};
//!
//! # let words: Vec<u32> = Vec::new();
//! let profile = DeviceProfile::default();
//! let diagnostics = validate(&profile, &words, &ValidationInfo::default());
//!
//! for diagnostic in &diagnostics {
//!     println!("{}: {}", diagnostic.rule_code, diagnostic);
//! }
//! ```

pub use crate::{
    cache::ValidationCache,
    device::DeviceProfile,
    diagnostic::{
        Diagnostic, DiagnosticKind, LimitKind, Requires, RequiresAllOf, RequiresOneOf, Severity,
    },
    reflect::WorkgroupLayout,
    spirv::specialization::{SpecializationConstant, SpecializationInfo, SpecializationMapEntry},
    validate::{validate, validate_bytes, ValidationInfo},
    version::Version,
};
pub use half;

mod cache;
pub mod device;
mod diagnostic;
pub mod reflect;
pub mod requirements;
pub mod spirv;
mod validate;
mod version;

/// Represents a size or offset in bytes of device memory.
pub type DeviceSize = u64;

/// A helper type for non-exhaustive structs.
///
/// This type cannot be constructed outside this crate. Structures with a field of this type can
/// only be constructed by calling a constructor function or `Default::default()`. The effect is
/// similar to the standard Rust `#[non_exhaustive]` attribute, except that it does not prevent
/// update syntax from being used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)] // add traits as needed
pub struct NonExhaustive(pub(crate) ());
