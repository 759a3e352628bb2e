// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

use crate::{
    diagnostic::{
        UNASSIGNED_UNRESOLVED_CONSTANT, VUID_ENTRY_POINT, VUID_LOCAL_SIZE_ID, VUID_MALFORMED,
        VUID_SHARED_MEMORY, VUID_SPIRV_VERSION, VUID_TOTAL_INVOCATIONS, VUID_WORKGROUP_X,
        VUID_WORKGROUP_Y, VUID_WORKGROUP_Z, VUID_ZERO_INIT_EXTENSION, VUID_ZERO_INIT_FEATURE,
    },
    reflect::{workgroup_memory_size, workgroup_size, WorkgroupLayout},
    requirements::{validate_spirv_capability, validate_spirv_extension},
    spirv::{
        specialization::{resolve_constants, ResolvedConstants, UnresolvedConstant},
        words_from_bytes, EntryPoint, ExecutionMode, ExecutionModel, Instruction, Spirv,
        SpirvError, StorageClass,
    },
    DeviceProfile, DeviceSize, Diagnostic, DiagnosticKind, LimitKind, NonExhaustive, Requires,
    RequiresAllOf, RequiresOneOf, Severity, SpecializationInfo, Version,
};

/// Options for a single call to [`validate`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ValidationInfo {
    /// The name of the entry point that the pipeline will use.
    ///
    /// If `None`, every `GLCompute` entry point of the module is checked. If `Some`, the module
    /// must have a `GLCompute` entry point with this name.
    ///
    /// The default value is `None`.
    pub entry_point: Option<String>,

    /// The values given to specialization constants.
    ///
    /// The default value is empty.
    pub specialization_info: SpecializationInfo,

    /// How workgroup variables without explicit offsets and strides are sized.
    ///
    /// The default value is [`WorkgroupLayout::Packed`].
    pub workgroup_layout: WorkgroupLayout,

    pub _ne: NonExhaustive,
}

impl Default for ValidationInfo {
    #[inline]
    fn default() -> Self {
        ValidationInfo {
            entry_point: None,
            specialization_info: SpecializationInfo::new(),
            workgroup_layout: WorkgroupLayout::Packed,
            _ne: NonExhaustive(()),
        }
    }
}

impl ValidationInfo {
    /// Returns a `ValidationInfo` that checks only the entry point named `name`.
    #[inline]
    pub fn entry_point(name: impl Into<String>) -> Self {
        ValidationInfo {
            entry_point: Some(name.into()),
            ..Default::default()
        }
    }
}

/// Checks the SPIR-V module `words` against the limits, features and extensions of `profile`.
///
/// Returns every problem that was found, in a fixed order. An empty list means that the module
/// can be used to create a compute pipeline on the device. If the words are not a well-formed
/// module, the only diagnostic returned is a [`Severity::Fatal`] one.
pub fn validate(profile: &DeviceProfile, words: &[u32], info: &ValidationInfo) -> Vec<Diagnostic> {
    let spirv = match Spirv::new(words) {
        Ok(spirv) => spirv,
        Err(err) => return vec![malformed(err)],
    };

    let constants = resolve_constants(&spirv, &info.specialization_info);
    let mut validator = Validator::new(profile, &spirv, &constants, info);

    // Ordering is important
    for entry_point in validator.entry_points.clone() {
        validator.validate_workgroup_memory(entry_point);
        validator.validate_workgroup_size(entry_point);
    }

    validator.validate_requirements();
    validator.validate_initializers();
    validator.validate_spirv_version();

    for entry_point in validator.entry_points.clone() {
        validator.validate_execution_mode_ids(entry_point);
    }

    validator.validate_entry_point_name();

    log::debug!(
        "validated module against {} entry points: {} diagnostics",
        validator.entry_points.len(),
        validator.diagnostics.len(),
    );

    validator.diagnostics
}

/// Like [`validate`], but takes the module as bytes in either endianness.
pub fn validate_bytes(
    profile: &DeviceProfile,
    bytes: &[u8],
    info: &ValidationInfo,
) -> Vec<Diagnostic> {
    match words_from_bytes(bytes) {
        Ok(words) => validate(profile, &words, info),
        Err(err) => vec![malformed(err)],
    }
}

fn malformed(err: SpirvError) -> Diagnostic {
    log::debug!("module could not be read: {}", err);

    Diagnostic {
        kind: DiagnosticKind::MalformedModule,
        severity: Severity::Fatal,
        problem: format!("the module is not valid SPIR-V: {}", err).into(),
        requires_one_of: RequiresOneOf::default(),
        rule_code: VUID_MALFORMED,
    }
}

fn unresolved(what: &str, err: &UnresolvedConstant) -> Diagnostic {
    Diagnostic::error(
        DiagnosticKind::UnresolvedConstant,
        format!("{} could not be computed, because {}", what, err),
        UNASSIGNED_UNRESOLVED_CONSTANT,
    )
}

struct Validator<'a> {
    profile: &'a DeviceProfile,
    spirv: &'a Spirv,
    constants: &'a ResolvedConstants,
    info: &'a ValidationInfo,

    entry_points: Vec<&'a EntryPoint>,
    workgroup_memory_size: Result<DeviceSize, UnresolvedConstant>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Validator<'a> {
    fn new(
        profile: &'a DeviceProfile,
        spirv: &'a Spirv,
        constants: &'a ResolvedConstants,
        info: &'a ValidationInfo,
    ) -> Self {
        let entry_points = spirv
            .entry_points()
            .iter()
            .filter(|entry_point| {
                entry_point.execution_model == ExecutionModel::GLCompute
                    && info
                        .entry_point
                        .as_ref()
                        .map_or(true, |name| entry_point.name == *name)
            })
            .collect();

        Validator {
            profile,
            spirv,
            constants,
            info,
            entry_points,
            workgroup_memory_size: workgroup_memory_size(spirv, constants, info.workgroup_layout),
            diagnostics: Vec::new(),
        }
    }

    fn validate_workgroup_memory(&mut self, entry_point: &EntryPoint) {
        let limit = self.profile.max_compute_shared_memory_size;
        let kind = LimitKind::SharedMemory;

        match &self.workgroup_memory_size {
            Ok(size) if *size > limit as DeviceSize => {
                self.diagnostics.push(Diagnostic::error(
                    DiagnosticKind::LimitExceeded(kind),
                    format!(
                        "the entry point `{}` uses {} bytes of `Workgroup` memory, which is \
                        greater than the `{}` device limit ({})",
                        entry_point.name,
                        size,
                        kind.limit_name(),
                        limit,
                    ),
                    VUID_SHARED_MEMORY,
                ));
            }
            Ok(_) => (),
            Err(err) => {
                let diagnostic = unresolved(
                    &format!(
                        "the `Workgroup` memory size of the entry point `{}`",
                        entry_point.name,
                    ),
                    err,
                );
                self.diagnostics.push(diagnostic);
            }
        }
    }

    fn validate_workgroup_size(&mut self, entry_point: &EntryPoint) {
        let workgroup_size = match workgroup_size(self.spirv, self.constants, entry_point.function)
        {
            Ok(Some(workgroup_size)) => workgroup_size,
            Ok(None) => return,
            Err(err) => {
                self.diagnostics.push(unresolved(
                    &format!("the workgroup size of the entry point `{}`", entry_point.name),
                    &err,
                ));
                return;
            }
        };

        const DIMENSIONS: [(&str, &str); 3] = [
            ("x", VUID_WORKGROUP_X),
            ("y", VUID_WORKGROUP_Y),
            ("z", VUID_WORKGROUP_Z),
        ];

        let max_size = self.profile.max_compute_work_group_size;
        let mut dimensions_fit = true;

        for (index, (&size, (axis, rule_code))) in workgroup_size
            .dimensions
            .iter()
            .zip(DIMENSIONS)
            .enumerate()
        {
            if size > max_size[index] as u64 {
                let kind = LimitKind::WorkgroupDimension(index);
                dimensions_fit = false;
                self.diagnostics.push(Diagnostic::error(
                    DiagnosticKind::LimitExceeded(kind),
                    format!(
                        "the entry point `{}` has a workgroup size of {} in the {} dimension, \
                        which is greater than the `{}[{}]` device limit ({})",
                        entry_point.name,
                        size,
                        axis,
                        kind.limit_name(),
                        index,
                        max_size[index],
                    ),
                    rule_code,
                ));
            }
        }

        if !dimensions_fit {
            return;
        }

        let limit = self.profile.max_compute_work_group_invocations;
        let kind = LimitKind::TotalInvocations;

        if workgroup_size
            .invocations()
            .map_or(true, |invocations| invocations > limit as u64)
        {
            let [x, y, z] = workgroup_size.dimensions;
            self.diagnostics.push(Diagnostic::error(
                DiagnosticKind::LimitExceeded(kind),
                format!(
                    "the entry point `{}` has a workgroup size of {} * {} * {} invocations, \
                    which is greater than the `{}` device limit ({})",
                    entry_point.name,
                    x,
                    y,
                    z,
                    kind.limit_name(),
                    limit,
                ),
                VUID_TOTAL_INVOCATIONS,
            ));
        }
    }

    fn validate_requirements(&mut self) {
        for extension in self.spirv.extensions() {
            if let Err(diagnostic) = validate_spirv_extension(self.profile, extension) {
                self.diagnostics.push(diagnostic);
            }
        }

        for &capability in self.spirv.capabilities() {
            if let Err(diagnostic) = validate_spirv_capability(self.profile, capability) {
                self.diagnostics.push(diagnostic);
            }
        }
    }

    fn validate_initializers(&mut self) {
        if self
            .profile
            .is_feature_enabled("shader_zero_initialize_workgroup_memory")
        {
            return;
        }

        let extension_requested = self.profile.api_version >= Version::V1_3
            || self
                .profile
                .is_extension_enabled("khr_zero_initialize_workgroup_memory");

        for &variable in self.spirv.global_variables() {
            let Some(&Instruction::Variable {
                storage_class: StorageClass::Workgroup,
                initializer: Some(_),
                ..
            }) = self.spirv.id(variable).map(|id_info| id_info.instruction())
            else {
                continue;
            };

            let diagnostic = if extension_requested {
                Diagnostic::error(
                    DiagnosticKind::ZeroInitializeNotSupported,
                    format!(
                        "the `Workgroup` variable {} has an initializer, but the \
                        `shader_zero_initialize_workgroup_memory` feature is not enabled",
                        variable,
                    ),
                    VUID_ZERO_INIT_FEATURE,
                )
                .with_requires_one_of(RequiresOneOf(&[RequiresAllOf(&[
                    Requires::DeviceFeature("shader_zero_initialize_workgroup_memory"),
                ])]))
            } else {
                Diagnostic::error(
                    DiagnosticKind::ZeroInitializeNotSupported,
                    format!(
                        "the `Workgroup` variable {} has an initializer, but the device does not \
                        support zero-initialized workgroup memory",
                        variable,
                    ),
                    VUID_ZERO_INIT_EXTENSION,
                )
                .with_requires_one_of(RequiresOneOf(&[
                    RequiresAllOf(&[
                        Requires::APIVersion(Version::V1_3),
                        Requires::DeviceFeature("shader_zero_initialize_workgroup_memory"),
                    ]),
                    RequiresAllOf(&[
                        Requires::DeviceExtension("khr_zero_initialize_workgroup_memory"),
                        Requires::DeviceFeature("shader_zero_initialize_workgroup_memory"),
                    ]),
                ]))
            };

            self.diagnostics.push(diagnostic);
        }
    }

    fn validate_spirv_version(&mut self) {
        let version = self.spirv.version();
        let requires_one_of = match Version::major_minor(version.major, version.minor) {
            Version::V1_0 => return,
            Version::V1_1 | Version::V1_2 | Version::V1_3 => {
                RequiresOneOf(&[RequiresAllOf(&[Requires::APIVersion(Version::V1_1)])])
            }
            Version::V1_4 => RequiresOneOf(&[
                RequiresAllOf(&[Requires::APIVersion(Version::V1_2)]),
                RequiresAllOf(&[Requires::DeviceExtension("khr_spirv_1_4")]),
            ]),
            Version::V1_5 => {
                RequiresOneOf(&[RequiresAllOf(&[Requires::APIVersion(Version::V1_2)])])
            }
            Version::V1_6 => {
                RequiresOneOf(&[RequiresAllOf(&[Requires::APIVersion(Version::V1_3)])])
            }
            _ => RequiresOneOf(&[]),
        };

        if !self.profile.supports(requires_one_of) {
            self.diagnostics.push(
                Diagnostic::error(
                    DiagnosticKind::SpirvVersionNotSupported,
                    format!(
                        "the module uses SPIR-V version {}.{}",
                        version.major, version.minor,
                    ),
                    VUID_SPIRV_VERSION,
                )
                .with_requires_one_of(requires_one_of),
            );
        }
    }

    fn validate_execution_mode_ids(&mut self, entry_point: &EntryPoint) {
        for mode in self.spirv.execution_modes(entry_point.function) {
            if mode.operand_ids().is_none() {
                continue;
            }

            if self.spirv.version() < Version::V1_2 {
                self.diagnostics.push(Diagnostic::error(
                    DiagnosticKind::SpirvVersionNotSupported,
                    format!(
                        "the entry point `{}` uses `OpExecutionModeId`, which requires SPIR-V \
                        version 1.2, but the module is version {}.{}",
                        entry_point.name,
                        self.spirv.version().major,
                        self.spirv.version().minor,
                    ),
                    VUID_SPIRV_VERSION,
                ));
            }

            if matches!(mode, ExecutionMode::LocalSizeId { .. })
                && !self.profile.is_feature_enabled("maintenance4")
            {
                self.diagnostics.push(
                    Diagnostic::error(
                        DiagnosticKind::MissingCapabilityFeature,
                        format!(
                            "the entry point `{}` has a `LocalSizeId` execution mode",
                            entry_point.name,
                        ),
                        VUID_LOCAL_SIZE_ID,
                    )
                    .with_requires_one_of(RequiresOneOf(&[RequiresAllOf(&[
                        Requires::DeviceFeature("maintenance4"),
                    ])])),
                );
            }
        }
    }

    fn validate_entry_point_name(&mut self) {
        let Some(name) = &self.info.entry_point else {
            return;
        };

        if self.entry_points.is_empty() {
            self.diagnostics.push(Diagnostic::error(
                DiagnosticKind::EntryPointNotFound,
                format!("the module has no `GLCompute` entry point named `{}`", name),
                VUID_ENTRY_POINT,
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        diagnostic::{
            VUID_MISSING_CAPABILITY, VUID_MISSING_EXTENSION, VUID_UNKNOWN_EXTENSION,
        },
        spirv::{BuiltIn, Capability, Decoration},
        tests::ModuleBuilder,
        SpecializationMapEntry,
    };

    const OP_I_EQUAL: u16 = 170;
    const OP_SELECT: u16 = 169;

    fn rule_codes(diagnostics: &[Diagnostic]) -> Vec<&'static str> {
        diagnostics
            .iter()
            .map(|diagnostic| diagnostic.rule_code)
            .collect()
    }

    fn shared_bools(length: u32) -> Vec<u32> {
        let mut asm = ModuleBuilder::compute(Version::V1_0);
        asm.local_size(64, 1, 1);
        let boolean = asm.type_bool();
        let array = asm.array_of(boolean, length);
        asm.workgroup_variable(array);

        asm.assemble()
    }

    #[test]
    fn shared_memory_boundary() {
        let profile = DeviceProfile::default();
        let info = ValidationInfo::default();

        assert!(validate(&profile, &shared_bools(4096), &info).is_empty());

        let diagnostics = validate(&profile, &shared_bools(4097), &info);
        assert_eq!(rule_codes(&diagnostics), [VUID_SHARED_MEMORY]);
        assert_eq!(
            diagnostics[0].kind,
            DiagnosticKind::LimitExceeded(LimitKind::SharedMemory),
        );
        assert!(diagnostics[0]
            .problem
            .contains(LimitKind::SharedMemory.limit_name()));
        assert_eq!(diagnostics[0].severity, Severity::Error);
    }

    #[test]
    fn shared_memory_sums_variables() {
        let mut asm = ModuleBuilder::compute(Version::V1_0);
        asm.local_size(1, 1, 1);
        let uint = asm.type_int(32, false);
        let half = asm.array_of(uint, 2048);
        let block = asm.type_struct(&[half]);
        asm.decorate(block, Decoration::Block);
        asm.workgroup_variable(block);
        asm.workgroup_variable(half);
        let quarter = asm.array_of(uint, 1);
        asm.workgroup_variable(quarter);

        let diagnostics = validate(
            &DeviceProfile::default(),
            &asm.assemble(),
            &ValidationInfo::default(),
        );
        assert_eq!(rule_codes(&diagnostics), [VUID_SHARED_MEMORY]);
    }

    #[test]
    fn specialized_shared_memory_size() {
        let mut asm = ModuleBuilder::compute(Version::V1_0);
        asm.local_size(1, 1, 1);
        let uint = asm.type_int(32, false);
        let boolean = asm.type_bool();
        let one = asm.constant_u32(uint, 1);
        let small = asm.constant_u32(uint, 4096);
        let large = asm.constant_u32(uint, 4097);
        let use_large = asm.spec_constant_u32(uint, 0, Some(0));
        let condition = asm.spec_constant_op(boolean, OP_I_EQUAL, &[use_large.as_raw(), one.as_raw()]);
        let length = asm.spec_constant_op(
            uint,
            OP_SELECT,
            &[condition.as_raw(), large.as_raw(), small.as_raw()],
        );
        let array = asm.type_array(uint, length);
        asm.workgroup_variable(array);
        let words = asm.assemble();

        let profile = DeviceProfile::default();
        assert!(validate(&profile, &words, &ValidationInfo::default()).is_empty());

        let mut info = ValidationInfo::default();
        info.specialization_info.insert(0, 1u32);
        assert_eq!(
            rule_codes(&validate(&profile, &words, &info)),
            [VUID_SHARED_MEMORY],
        );

        info.specialization_info.insert(0, 2u32);
        assert!(validate(&profile, &words, &info).is_empty());
    }

    #[test]
    fn specialization_map_entries() {
        let mut asm = ModuleBuilder::compute(Version::V1_0);
        asm.local_size(1, 1, 1);
        let uint = asm.type_int(32, false);
        let length = asm.spec_constant_u32(uint, 16, Some(4));
        let array = asm.type_array(uint, length);
        asm.workgroup_variable(array);
        let words = asm.assemble();

        let data = 4097u32.to_ne_bytes();
        let entries = [SpecializationMapEntry {
            constant_id: 4,
            offset: 0,
            size: 4,
        }];
        let info = ValidationInfo {
            specialization_info: SpecializationInfo::from_map_entries(&entries, &data).unwrap(),
            ..Default::default()
        };

        assert_eq!(
            rule_codes(&validate(&DeviceProfile::default(), &words, &info)),
            [VUID_SHARED_MEMORY],
        );
    }

    #[test]
    fn unresolved_size_does_not_stop_other_rules() {
        let mut asm = ModuleBuilder::compute(Version::V1_0);
        asm.local_size(200, 1, 1);
        let uint = asm.type_int(32, false);
        let length = asm.spec_constant_u32(uint, 16, Some(0));
        let array = asm.type_array(uint, length);
        asm.workgroup_variable(array);
        let words = asm.assemble();

        let mut info = ValidationInfo::default();
        info.specialization_info.insert(0, 16u8);
        let diagnostics = validate(&DeviceProfile::default(), &words, &info);

        assert_eq!(
            rule_codes(&diagnostics),
            [UNASSIGNED_UNRESOLVED_CONSTANT, VUID_WORKGROUP_X],
        );
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnresolvedConstant);
    }

    #[test]
    fn unresolved_size_names_entry_point() {
        let mut asm = ModuleBuilder::compute(Version::V1_0);
        asm.entry_point(ExecutionModel::GLCompute, "second");
        let uint = asm.type_int(32, false);
        let length = asm.spec_constant_u32(uint, 16, Some(0));
        let array = asm.type_array(uint, length);
        asm.workgroup_variable(array);
        let words = asm.assemble();

        let mut info = ValidationInfo::default();
        info.specialization_info.insert(0, 16u8);
        let diagnostics = validate(&DeviceProfile::default(), &words, &info);

        assert_eq!(
            rule_codes(&diagnostics),
            [UNASSIGNED_UNRESOLVED_CONSTANT, UNASSIGNED_UNRESOLVED_CONSTANT],
        );
        assert!(diagnostics[0].problem.contains("`main`"));
        assert!(diagnostics[1].problem.contains("`second`"));
        assert_ne!(diagnostics[0], diagnostics[1]);
    }

    #[test]
    fn workgroup_dimensions() {
        let profile = DeviceProfile::default();
        let info = ValidationInfo::default();
        let check = |x, y, z| {
            let mut asm = ModuleBuilder::compute(Version::V1_0);
            asm.local_size(x, y, z);
            rule_codes(&validate(&profile, &asm.assemble(), &info))
        };

        assert!(check(128, 1, 1).is_empty());
        assert!(check(2, 2, 32).is_empty());
        assert_eq!(check(129, 1, 1), [VUID_WORKGROUP_X]);
        assert_eq!(check(1, 200, 65), [VUID_WORKGROUP_Y, VUID_WORKGROUP_Z]);
        assert_eq!(check(16, 16, 1), [VUID_TOTAL_INVOCATIONS]);
        assert_eq!(check(1000, 1, 1), [VUID_WORKGROUP_X]);
    }

    #[test]
    fn built_in_workgroup_size_wins() {
        let mut asm = ModuleBuilder::compute(Version::V1_0);
        asm.local_size(1, 1, 1);
        let uint = asm.type_int(32, false);
        let uvec3 = asm.type_vector(uint, 3);
        let x = asm.constant_u32(uint, 129);
        let one = asm.constant_u32(uint, 1);
        let built_in = asm.constant_composite(uvec3, &[x, one, one]);
        asm.decorate(
            built_in,
            Decoration::BuiltIn {
                built_in: BuiltIn::WorkgroupSize,
            },
        );

        let diagnostics = validate(
            &DeviceProfile::default(),
            &asm.assemble(),
            &ValidationInfo::default(),
        );
        assert_eq!(rule_codes(&diagnostics), [VUID_WORKGROUP_X]);
        assert_eq!(
            diagnostics[0].kind,
            DiagnosticKind::LimitExceeded(LimitKind::WorkgroupDimension(0)),
        );
    }

    #[test]
    fn specialized_built_in_workgroup_size() {
        let mut asm = ModuleBuilder::compute(Version::V1_0);
        let uint = asm.type_int(32, false);
        let uvec3 = asm.type_vector(uint, 3);
        let x = asm.spec_constant_u32(uint, 64, Some(0));
        let one = asm.constant_u32(uint, 1);
        let built_in = asm.spec_constant_composite(uvec3, &[x, one, one]);
        asm.decorate(
            built_in,
            Decoration::BuiltIn {
                built_in: BuiltIn::WorkgroupSize,
            },
        );
        let words = asm.assemble();

        let profile = DeviceProfile::default();
        assert!(validate(&profile, &words, &ValidationInfo::default()).is_empty());

        let mut info = ValidationInfo::default();
        info.specialization_info.insert(0, 256u32);
        assert_eq!(
            rule_codes(&validate(&profile, &words, &info)),
            [VUID_WORKGROUP_X],
        );
    }

    #[test]
    fn local_size_id_matches_local_size() {
        let profile = DeviceProfile {
            api_version: Version::V1_3,
            enabled_features: ["maintenance4".to_owned()].into_iter().collect(),
            ..Default::default()
        };
        let info = ValidationInfo::default();

        for size in [[64, 2, 1], [256, 1, 1], [1, 1, 100], [32, 4, 2]] {
            let mut literal = ModuleBuilder::compute(Version::V1_3);
            literal.local_size(size[0], size[1], size[2]);

            let mut by_id = ModuleBuilder::compute(Version::V1_3);
            let uint = by_id.type_int(32, false);
            let [x, y, z] = size.map(|value| by_id.constant_u32(uint, value));
            by_id.local_size_id(x, y, z);

            let literal = validate(&profile, &literal.assemble(), &info);
            let by_id = validate(&profile, &by_id.assemble(), &info);
            assert_eq!(literal, by_id);
        }
    }

    #[test]
    fn specialized_local_size_id() {
        let profile = DeviceProfile {
            api_version: Version::V1_3,
            enabled_features: ["maintenance4".to_owned()].into_iter().collect(),
            ..Default::default()
        };

        let mut asm = ModuleBuilder::compute(Version::V1_3);
        let uint = asm.type_int(32, false);
        let one = asm.constant_u32(uint, 1);
        let z = asm.spec_constant_u32(uint, 1, Some(2));
        asm.local_size_id(one, one, z);
        let words = asm.assemble();

        assert!(validate(&profile, &words, &ValidationInfo::default()).is_empty());

        let mut info = ValidationInfo::default();
        info.specialization_info.insert(2, 65u32);
        assert_eq!(
            rule_codes(&validate(&profile, &words, &info)),
            [VUID_WORKGROUP_Z],
        );
    }

    #[test]
    fn local_size_id_requirements() {
        let build = |version| {
            let mut asm = ModuleBuilder::compute(version);
            let uint = asm.type_int(32, false);
            let one = asm.constant_u32(uint, 1);
            asm.local_size_id(one, one, one);
            asm.assemble()
        };
        let info = ValidationInfo::default();

        let profile = DeviceProfile {
            api_version: Version::V1_2,
            ..Default::default()
        };
        let diagnostics = validate(&profile, &build(Version::V1_2), &info);
        assert_eq!(rule_codes(&diagnostics), [VUID_LOCAL_SIZE_ID]);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::MissingCapabilityFeature);

        let diagnostics = validate(&profile, &build(Version::V1_0), &info);
        assert_eq!(
            rule_codes(&diagnostics),
            [VUID_SPIRV_VERSION, VUID_LOCAL_SIZE_ID],
        );

        let profile = DeviceProfile {
            api_version: Version::V1_2,
            enabled_features: ["maintenance4".to_owned()].into_iter().collect(),
            ..Default::default()
        };
        assert!(validate(&profile, &build(Version::V1_2), &info).is_empty());
    }

    #[test]
    fn explicit_layout_needs_extension_and_feature() {
        let mut asm = ModuleBuilder::compute(Version::V1_0);
        asm.local_size(1, 1, 1);
        asm.capability(Capability::WorkgroupMemoryExplicitLayoutKHR);
        asm.extension("SPV_KHR_workgroup_memory_explicit_layout");
        let uint = asm.type_int(32, false);
        let block = asm.type_struct(&[uint, uint]);
        asm.decorate(block, Decoration::Block);
        asm.member_decorate(block, 0, Decoration::Offset { byte_offset: 0 });
        asm.member_decorate(block, 1, Decoration::Offset { byte_offset: 4 });
        asm.workgroup_variable(block);
        let words = asm.assemble();
        let info = ValidationInfo::default();

        let diagnostics = validate(&DeviceProfile::default(), &words, &info);
        assert_eq!(
            rule_codes(&diagnostics),
            [VUID_MISSING_EXTENSION, VUID_MISSING_CAPABILITY],
        );
        assert_eq!(diagnostics[0].kind, DiagnosticKind::MissingExtension);
        assert_eq!(diagnostics[1].kind, DiagnosticKind::MissingCapabilityFeature);

        let profile = DeviceProfile {
            enabled_extensions: ["khr_workgroup_memory_explicit_layout".to_owned()]
                .into_iter()
                .collect(),
            ..Default::default()
        };
        let diagnostics = validate(&profile, &words, &info);
        assert_eq!(rule_codes(&diagnostics), [VUID_MISSING_CAPABILITY]);

        let profile = DeviceProfile {
            enabled_extensions: ["khr_workgroup_memory_explicit_layout".to_owned()]
                .into_iter()
                .collect(),
            enabled_features: ["workgroup_memory_explicit_layout".to_owned()]
                .into_iter()
                .collect(),
            ..Default::default()
        };
        assert!(validate(&profile, &words, &info).is_empty());
    }

    fn explicit_layout_profile(features: &[&str]) -> DeviceProfile {
        DeviceProfile {
            api_version: Version::V1_2,
            enabled_extensions: ["khr_workgroup_memory_explicit_layout".to_owned()]
                .into_iter()
                .collect(),
            enabled_features: features
                .iter()
                .map(|&feature| feature.to_owned())
                .chain(["workgroup_memory_explicit_layout".to_owned()])
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn explicit_layout_small_types() {
        let info = ValidationInfo::default();

        let mut asm = ModuleBuilder::compute(Version::V1_0);
        asm.local_size(2, 1, 1);
        asm.capability(Capability::Int8);
        asm.capability(Capability::WorkgroupMemoryExplicitLayout8BitAccessKHR);
        asm.extension("SPV_KHR_workgroup_memory_explicit_layout");
        let byte = asm.type_int(8, true);
        let block = asm.type_struct(&[byte]);
        asm.decorate(block, Decoration::Block);
        asm.member_decorate(block, 0, Decoration::Offset { byte_offset: 0 });
        asm.workgroup_variable(block);
        let eight_bit = asm.assemble();

        let mut asm = ModuleBuilder::compute(Version::V1_0);
        asm.local_size(2, 1, 1);
        asm.capability(Capability::Float16);
        asm.capability(Capability::Int16);
        asm.capability(Capability::WorkgroupMemoryExplicitLayout16BitAccessKHR);
        asm.extension("SPV_KHR_workgroup_memory_explicit_layout");
        let short = asm.type_int(16, true);
        let float16 = asm.type_float(16);
        let block = asm.type_struct(&[short, float16]);
        asm.decorate(block, Decoration::Block);
        asm.member_decorate(block, 0, Decoration::Offset { byte_offset: 0 });
        asm.member_decorate(block, 1, Decoration::Offset { byte_offset: 2 });
        asm.workgroup_variable(block);
        let sixteen_bit = asm.assemble();

        let int8 = DeviceProfile {
            api_version: Version::V1_2,
            enabled_features: ["shader_int8".to_owned()].into_iter().collect(),
            ..Default::default()
        };
        let diagnostics = validate(&int8, &eight_bit, &info);
        assert_eq!(
            rule_codes(&diagnostics),
            [VUID_MISSING_EXTENSION, VUID_MISSING_CAPABILITY],
        );
        assert_eq!(
            diagnostics[1].requires_one_of,
            RequiresOneOf(&[RequiresAllOf(&[Requires::DeviceFeature(
                "workgroup_memory_explicit_layout8_bit_access"
            )])]),
        );

        let int16 = DeviceProfile {
            api_version: Version::V1_2,
            enabled_features: ["shader_float16".to_owned(), "shader_int16".to_owned()]
                .into_iter()
                .collect(),
            ..Default::default()
        };
        let diagnostics = validate(&int16, &sixteen_bit, &info);
        assert_eq!(
            rule_codes(&diagnostics),
            [VUID_MISSING_EXTENSION, VUID_MISSING_CAPABILITY],
        );
        assert_eq!(
            diagnostics[1].requires_one_of,
            RequiresOneOf(&[RequiresAllOf(&[Requires::DeviceFeature(
                "workgroup_memory_explicit_layout16_bit_access"
            )])]),
        );

        let profile = explicit_layout_profile(&[
            "shader_int8",
            "workgroup_memory_explicit_layout8_bit_access",
        ]);
        assert!(validate(&profile, &eight_bit, &info).is_empty());

        let profile = explicit_layout_profile(&[
            "shader_float16",
            "shader_int16",
            "workgroup_memory_explicit_layout16_bit_access",
        ]);
        assert!(validate(&profile, &sixteen_bit, &info).is_empty());
    }

    #[test]
    fn explicit_layout_shared_memory_boundary() {
        // Two blocks: `X { int x; }` and `Y { int y1[16]; int y2; }` with `y2` placed after a gap.
        let module = |y2_offset| {
            let mut asm = ModuleBuilder::compute(Version::V1_0);
            asm.local_size(1, 1, 1);
            asm.capability(Capability::WorkgroupMemoryExplicitLayoutKHR);
            asm.extension("SPV_KHR_workgroup_memory_explicit_layout");
            let int = asm.type_int(32, true);
            let x = asm.type_struct(&[int]);
            asm.decorate(x, Decoration::Block);
            asm.member_decorate(x, 0, Decoration::Offset { byte_offset: 0 });
            asm.workgroup_variable(x);
            let y1 = asm.array_of(int, 16);
            asm.decorate(y1, Decoration::ArrayStride { array_stride: 4 });
            let y = asm.type_struct(&[y1, int]);
            asm.decorate(y, Decoration::Block);
            asm.member_decorate(y, 0, Decoration::Offset { byte_offset: 0 });
            asm.member_decorate(
                y,
                1,
                Decoration::Offset {
                    byte_offset: y2_offset,
                },
            );
            asm.workgroup_variable(y);
            asm.assemble()
        };
        let profile = explicit_layout_profile(&[]);
        let info = ValidationInfo::default();

        assert!(validate(&profile, &module(64), &info).is_empty());
        assert!(validate(&profile, &module(16376), &info).is_empty());

        let diagnostics = validate(&profile, &module(16377), &info);
        assert_eq!(rule_codes(&diagnostics), [VUID_SHARED_MEMORY]);
        assert!(diagnostics[0].problem.contains("16385 bytes"));
    }

    #[test]
    fn oversized_workgroup_matrix() {
        let mut asm = ModuleBuilder::compute(Version::V1_0);
        asm.local_size(1, 1, 1);
        let wide = asm.type_int(0xffff_fff8, false);
        let column = asm.type_vector(wide, 0xffff_ffff);
        let matrix = asm.type_matrix(column, 16);
        asm.workgroup_variable(matrix);

        let diagnostics = validate(
            &DeviceProfile::default(),
            &asm.assemble(),
            &ValidationInfo::default(),
        );
        assert_eq!(rule_codes(&diagnostics), [VUID_SHARED_MEMORY]);
    }

    #[test]
    fn unknown_extension() {
        let mut asm = ModuleBuilder::compute(Version::V1_0);
        asm.extension("SPV_VENDOR_not_a_real_extension");
        let diagnostics = validate(
            &DeviceProfile::default(),
            &asm.assemble(),
            &ValidationInfo::default(),
        );

        assert_eq!(rule_codes(&diagnostics), [VUID_UNKNOWN_EXTENSION]);
        assert!(diagnostics[0].requires_one_of.is_empty());
    }

    #[test]
    fn zero_initialized_workgroup_memory() {
        let mut asm = ModuleBuilder::compute(Version::V1_0);
        asm.local_size(1, 1, 1);
        let uint = asm.type_int(32, false);
        let array = asm.array_of(uint, 16);
        let null = asm.constant_null(array);
        let pointer = asm.type_pointer(StorageClass::Workgroup, array);
        asm.variable(pointer, StorageClass::Workgroup, Some(null));
        let words = asm.assemble();
        let info = ValidationInfo::default();

        let diagnostics = validate(&DeviceProfile::default(), &words, &info);
        assert_eq!(rule_codes(&diagnostics), [VUID_ZERO_INIT_EXTENSION]);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::ZeroInitializeNotSupported);

        let mut profile = DeviceProfile::default();
        profile
            .enabled_extensions
            .insert("khr_zero_initialize_workgroup_memory".to_owned());
        assert_eq!(
            rule_codes(&validate(&profile, &words, &info)),
            [VUID_ZERO_INIT_FEATURE],
        );

        let profile = DeviceProfile {
            api_version: Version::V1_3,
            ..Default::default()
        };
        assert_eq!(
            rule_codes(&validate(&profile, &words, &info)),
            [VUID_ZERO_INIT_FEATURE],
        );

        let mut profile = DeviceProfile::default();
        profile
            .enabled_features
            .insert("shader_zero_initialize_workgroup_memory".to_owned());
        assert!(validate(&profile, &words, &info).is_empty());
    }

    #[test]
    fn spirv_version() {
        let words = |version| ModuleBuilder::compute(version).assemble();
        let info = ValidationInfo::default();
        let profile = |api_version| DeviceProfile {
            api_version,
            ..Default::default()
        };

        let diagnostics = validate(&profile(Version::V1_0), &words(Version::V1_3), &info);
        assert_eq!(rule_codes(&diagnostics), [VUID_SPIRV_VERSION]);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::SpirvVersionNotSupported);

        assert!(validate(&profile(Version::V1_1), &words(Version::V1_3), &info).is_empty());
        assert!(!validate(&profile(Version::V1_1), &words(Version::V1_4), &info).is_empty());
        assert!(validate(&profile(Version::V1_2), &words(Version::V1_5), &info).is_empty());
        assert!(!validate(&profile(Version::V1_2), &words(Version::V1_6), &info).is_empty());

        let mut with_extension = profile(Version::V1_1);
        with_extension
            .enabled_extensions
            .insert("khr_spirv_1_4".to_owned());
        assert!(validate(&with_extension, &words(Version::V1_4), &info).is_empty());
    }

    #[test]
    fn entry_point_selection() {
        let mut asm = ModuleBuilder::compute(Version::V1_0);
        asm.local_size(1, 1, 1);
        let other = asm.entry_point(ExecutionModel::GLCompute, "other");
        asm.execution_mode(
            other,
            ExecutionMode::LocalSize {
                x_size: 512,
                y_size: 1,
                z_size: 1,
            },
        );
        asm.entry_point(ExecutionModel::Vertex, "vertex");
        let words = asm.assemble();
        let profile = DeviceProfile::default();

        assert_eq!(
            rule_codes(&validate(&profile, &words, &ValidationInfo::default())),
            [VUID_WORKGROUP_X],
        );
        assert!(validate(&profile, &words, &ValidationInfo::entry_point("main")).is_empty());
        assert_eq!(
            rule_codes(&validate(&profile, &words, &ValidationInfo::entry_point("other"))),
            [VUID_WORKGROUP_X],
        );

        let diagnostics = validate(&profile, &words, &ValidationInfo::entry_point("vertex"));
        assert_eq!(rule_codes(&diagnostics), [VUID_ENTRY_POINT]);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::EntryPointNotFound);

        assert_eq!(
            rule_codes(&validate(&profile, &words, &ValidationInfo::entry_point("missing"))),
            [VUID_ENTRY_POINT],
        );
    }

    #[test]
    fn shared_memory_is_checked_per_entry_point() {
        let mut asm = ModuleBuilder::compute(Version::V1_0);
        asm.entry_point(ExecutionModel::GLCompute, "second");
        let uint = asm.type_int(32, false);
        let array = asm.array_of(uint, 8192);
        asm.workgroup_variable(array);
        let words = asm.assemble();
        let profile = DeviceProfile::default();

        assert_eq!(
            rule_codes(&validate(&profile, &words, &ValidationInfo::default())),
            [VUID_SHARED_MEMORY, VUID_SHARED_MEMORY],
        );
        assert_eq!(
            rule_codes(&validate(&profile, &words, &ValidationInfo::entry_point("second"))),
            [VUID_SHARED_MEMORY],
        );
    }

    #[test]
    fn malformed_modules_are_fatal() {
        let profile = DeviceProfile::default();
        let info = ValidationInfo::default();

        // An `OpCapability` whose word count runs past the end.
        let mut truncated = shared_bools(16);
        truncated.extend([(3 << 16) | 17, 1]);
        let mut duplicate_spec_id = ModuleBuilder::compute(Version::V1_0);
        let uint = duplicate_spec_id.type_int(32, false);
        duplicate_spec_id.spec_constant_u32(uint, 1, Some(0));
        duplicate_spec_id.spec_constant_u32(uint, 2, Some(0));

        for words in [
            Vec::new(),
            vec![0xdeadbeef, 0x00010000, 0, 1, 0],
            truncated,
            duplicate_spec_id.assemble(),
        ] {
            let diagnostics = validate(&profile, &words, &info);
            assert_eq!(diagnostics.len(), 1);
            assert!(diagnostics[0].is_fatal());
            assert_eq!(diagnostics[0].kind, DiagnosticKind::MalformedModule);
            assert_eq!(diagnostics[0].rule_code, VUID_MALFORMED);
        }

        let diagnostics = validate_bytes(&profile, &[0x03, 0x02, 0x23], &info);
        assert_eq!(rule_codes(&diagnostics), [VUID_MALFORMED]);
    }

    #[test]
    fn bytes_in_either_endianness() {
        let words = shared_bools(4097);
        let big: Vec<u8> = words.iter().flat_map(|word| word.to_be_bytes()).collect();

        assert_eq!(
            rule_codes(&validate_bytes(
                &DeviceProfile::default(),
                &big,
                &ValidationInfo::default(),
            )),
            [VUID_SHARED_MEMORY],
        );
    }
}
