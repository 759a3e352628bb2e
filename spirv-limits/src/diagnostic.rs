// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

use crate::Version;
use std::{
    borrow::Cow,
    error::Error,
    fmt::{Display, Error as FmtError, Formatter},
};

pub(crate) const VUID_MALFORMED: &str = "VUID-VkShaderModuleCreateInfo-pCode-01379";
pub(crate) const VUID_SHARED_MEMORY: &str = "VUID-RuntimeSpirv-Workgroup-06530";
pub(crate) const VUID_WORKGROUP_X: &str = "VUID-RuntimeSpirv-x-06429";
pub(crate) const VUID_WORKGROUP_Y: &str = "VUID-RuntimeSpirv-y-06430";
pub(crate) const VUID_WORKGROUP_Z: &str = "VUID-RuntimeSpirv-z-06431";
pub(crate) const VUID_TOTAL_INVOCATIONS: &str = "VUID-RuntimeSpirv-x-06432";
pub(crate) const VUID_SPIRV_VERSION: &str = "VUID-VkShaderModuleCreateInfo-pCode-08737";
pub(crate) const VUID_UNKNOWN_EXTENSION: &str = "VUID-VkShaderModuleCreateInfo-pCode-08739";
pub(crate) const VUID_MISSING_EXTENSION: &str = "VUID-VkShaderModuleCreateInfo-pCode-08740";
pub(crate) const VUID_UNKNOWN_CAPABILITY: &str = "VUID-VkShaderModuleCreateInfo-pCode-08741";
pub(crate) const VUID_MISSING_CAPABILITY: &str = "VUID-VkShaderModuleCreateInfo-pCode-08742";
pub(crate) const VUID_ZERO_INIT_FEATURE: &str =
    "VUID-RuntimeSpirv-shaderZeroInitializeWorkgroupMemory-06372";
pub(crate) const VUID_ZERO_INIT_EXTENSION: &str = "VUID-RuntimeSpirv-OpVariable-06373";
pub(crate) const VUID_LOCAL_SIZE_ID: &str = "VUID-RuntimeSpirv-LocalSizeId-06434";
pub(crate) const VUID_ENTRY_POINT: &str = "VUID-VkPipelineShaderStageCreateInfo-pName-00707";
pub(crate) const UNASSIGNED_UNRESOLVED_CONSTANT: &str = "UNASSIGNED-Shader-UnresolvedConstant";

/// A problem found while validating a shader module.
///
/// `rule_code` identifies the rule that was broken, and does not change if the wording of
/// `problem` does.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    /// What kind of problem this is.
    pub kind: DiagnosticKind,

    /// Whether validation could continue past this problem.
    pub severity: Severity,

    /// A description of the problem.
    pub problem: Cow<'static, str>,

    /// If the problem can be fixed by enabling something on the device, what would have to be
    /// enabled.
    pub requires_one_of: RequiresOneOf,

    /// The Vulkan valid usage ID, or validation layer identifier, of the broken rule.
    pub rule_code: &'static str,
}

impl Diagnostic {
    #[inline]
    pub(crate) fn error(
        kind: DiagnosticKind,
        problem: impl Into<Cow<'static, str>>,
        rule_code: &'static str,
    ) -> Self {
        Diagnostic {
            kind,
            severity: Severity::Error,
            problem: problem.into(),
            requires_one_of: RequiresOneOf::default(),
            rule_code,
        }
    }

    #[inline]
    pub(crate) fn with_requires_one_of(mut self, requires_one_of: RequiresOneOf) -> Self {
        self.requires_one_of = requires_one_of;
        self
    }

    /// Returns whether this diagnostic ended validation.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "{}", self.problem)?;

        if !self.requires_one_of.is_empty() {
            write!(f, " -- requires one of: {}", self.requires_one_of)?;
        }

        Ok(())
    }
}

impl Error for Diagnostic {}

/// How serious a [`Diagnostic`] is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    /// The module is invalid, but the other rules were still checked.
    Error,

    /// The module could not be read at all. This is always the only diagnostic returned.
    Fatal,
}

/// The category of a [`Diagnostic`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// The word stream is not a well-formed SPIR-V module.
    MalformedModule,

    /// A constant needed by a check could not be given a value.
    UnresolvedConstant,

    /// A computed quantity is larger than a device limit.
    LimitExceeded(LimitKind),

    /// A SPIR-V extension used by the module is not supported by the device.
    MissingExtension,

    /// A SPIR-V capability used by the module is not supported by the device.
    MissingCapabilityFeature,

    /// A workgroup variable has an initializer, which the device does not support.
    ZeroInitializeNotSupported,

    /// The version of the module is too new for the target environment.
    SpirvVersionNotSupported,

    /// The requested entry point does not exist.
    EntryPointNotFound,
}

/// The device limit that a [`DiagnosticKind::LimitExceeded`] refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LimitKind {
    /// `max_compute_shared_memory_size`.
    SharedMemory,

    /// One element of `max_compute_work_group_size`, with the index of the dimension.
    WorkgroupDimension(usize),

    /// `max_compute_work_group_invocations`.
    TotalInvocations,
}

impl LimitKind {
    /// Returns the name of the limit in the device properties.
    pub fn limit_name(self) -> &'static str {
        match self {
            LimitKind::SharedMemory => "max_compute_shared_memory_size",
            LimitKind::WorkgroupDimension(_) => "max_compute_work_group_size",
            LimitKind::TotalInvocations => "max_compute_work_group_invocations",
        }
    }
}

/// Something that needs to be supported or enabled on the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Requires {
    APIVersion(Version),
    DeviceFeature(&'static str),
    DeviceExtension(&'static str),
}

impl Display for Requires {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            Requires::APIVersion(version) => {
                write!(f, "Vulkan API version {}.{}", version.major, version.minor)
            }
            Requires::DeviceFeature(feature) => write!(f, "device feature `{}`", feature),
            Requires::DeviceExtension(extension) => {
                write!(f, "device extension `{}`", extension)
            }
        }
    }
}

/// A list of requirements that must all be met.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RequiresAllOf(pub &'static [Requires]);

impl Display for RequiresAllOf {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        if let Some((first, rest)) = self.0.split_first() {
            if !rest.is_empty() {
                write!(f, "(")?;
            }

            write!(f, "{}", first)?;

            for rest in rest {
                write!(f, " + {}", rest)?;
            }

            if !rest.is_empty() {
                write!(f, ")")?;
            }
        }

        Ok(())
    }
}

/// A list of alternatives, one of which must be met. An empty list means there is nothing that
/// could be enabled to fix the problem.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RequiresOneOf(pub &'static [RequiresAllOf]);

impl RequiresOneOf {
    /// Returns whether there are no alternatives.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for RequiresOneOf {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        if let Some((first, rest)) = self.0.split_first() {
            write!(f, "{}", first)?;

            for rest in rest {
                write!(f, " or {}", rest)?;
            }
        }

        Ok(())
    }
}
