// Copyright (c) 2021 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! What a device must support for a module to use a SPIR-V capability or extension.
//!
//! The tables follow the `spirvcapability` and `spirvextension` elements of the Vulkan registry.
//! Device features and extensions are named in snake case, like `shader_int8` and
//! `khr_8bit_storage`.

use crate::{
    diagnostic::{
        VUID_MISSING_CAPABILITY, VUID_MISSING_EXTENSION, VUID_UNKNOWN_CAPABILITY,
        VUID_UNKNOWN_EXTENSION,
    },
    spirv::Capability,
    DeviceProfile, Diagnostic, DiagnosticKind,
    Requires::{APIVersion, DeviceExtension, DeviceFeature},
    RequiresAllOf, RequiresOneOf, Version,
};

macro_rules! requires_one_of {
    () => {
        RequiresOneOf(&[])
    };
    ($([$($requires:expr),+ $(,)?]),+ $(,)?) => {
        RequiresOneOf(&[$(RequiresAllOf(&[$($requires),+])),+])
    };
}

/// Returns what the device must support for a module to declare `capability`.
///
/// Returns `None` for capabilities this crate does not know about, which are rejected the same
/// way as capabilities that Vulkan does not allow. An empty `RequiresOneOf` means that Vulkan
/// does not allow the capability at all.
pub fn spirv_capability_requirements(capability: Capability) -> Option<RequiresOneOf> {
    Some(match capability {
        Capability::Matrix
        | Capability::Shader
        | Capability::InputAttachment
        | Capability::Sampled1D
        | Capability::Image1D
        | Capability::SampledBuffer
        | Capability::ImageBuffer
        | Capability::ImageQuery
        | Capability::DerivativeControl
        | Capability::StorageImageExtendedFormats => {
            requires_one_of!([APIVersion(Version::V1_0)])
        }
        Capability::Geometry => requires_one_of!([DeviceFeature("geometry_shader")]),
        Capability::Tessellation => requires_one_of!([DeviceFeature("tessellation_shader")]),
        Capability::Float64 => requires_one_of!([DeviceFeature("shader_float64")]),
        Capability::Int64 => requires_one_of!([DeviceFeature("shader_int64")]),
        Capability::Int64Atomics => requires_one_of!(
            [DeviceFeature("shader_buffer_int64_atomics")],
            [DeviceFeature("shader_shared_int64_atomics")],
        ),
        Capability::Int16 => requires_one_of!([DeviceFeature("shader_int16")]),
        Capability::Int8 => requires_one_of!([DeviceFeature("shader_int8")]),
        Capability::Float16 => requires_one_of!(
            [DeviceFeature("shader_float16")],
            [DeviceExtension("amd_gpu_shader_half_float")],
        ),
        Capability::TessellationPointSize | Capability::GeometryPointSize => {
            requires_one_of!([DeviceFeature("shader_tessellation_and_geometry_point_size")])
        }
        Capability::ImageGatherExtended => {
            requires_one_of!([DeviceFeature("shader_image_gather_extended")])
        }
        Capability::StorageImageMultisample | Capability::ImageMSArray => {
            requires_one_of!([DeviceFeature("shader_storage_image_multisample")])
        }
        Capability::UniformBufferArrayDynamicIndexing => {
            requires_one_of!([DeviceFeature("shader_uniform_buffer_array_dynamic_indexing")])
        }
        Capability::SampledImageArrayDynamicIndexing => {
            requires_one_of!([DeviceFeature("shader_sampled_image_array_dynamic_indexing")])
        }
        Capability::StorageBufferArrayDynamicIndexing => {
            requires_one_of!([DeviceFeature("shader_storage_buffer_array_dynamic_indexing")])
        }
        Capability::StorageImageArrayDynamicIndexing => {
            requires_one_of!([DeviceFeature("shader_storage_image_array_dynamic_indexing")])
        }
        Capability::ClipDistance => requires_one_of!([DeviceFeature("shader_clip_distance")]),
        Capability::CullDistance => requires_one_of!([DeviceFeature("shader_cull_distance")]),
        Capability::ImageCubeArray | Capability::SampledCubeArray => {
            requires_one_of!([DeviceFeature("image_cube_array")])
        }
        Capability::SampleRateShading | Capability::InterpolationFunction => {
            requires_one_of!([DeviceFeature("sample_rate_shading")])
        }
        Capability::SparseResidency => {
            requires_one_of!([DeviceFeature("shader_resource_residency")])
        }
        Capability::MinLod => requires_one_of!([DeviceFeature("shader_resource_min_lod")]),
        Capability::TransformFeedback => requires_one_of!([DeviceFeature("transform_feedback")]),
        Capability::GeometryStreams => requires_one_of!([DeviceFeature("geometry_streams")]),
        Capability::StorageImageReadWithoutFormat => requires_one_of!(
            [DeviceFeature("shader_storage_image_read_without_format")],
            [APIVersion(Version::V1_3)],
            [DeviceExtension("khr_format_feature_flags2")],
        ),
        Capability::StorageImageWriteWithoutFormat => requires_one_of!(
            [DeviceFeature("shader_storage_image_write_without_format")],
            [APIVersion(Version::V1_3)],
            [DeviceExtension("khr_format_feature_flags2")],
        ),
        Capability::MultiViewport => requires_one_of!([DeviceFeature("multi_viewport")]),
        Capability::GroupNonUniform
        | Capability::GroupNonUniformVote
        | Capability::GroupNonUniformArithmetic
        | Capability::GroupNonUniformBallot
        | Capability::GroupNonUniformShuffle
        | Capability::GroupNonUniformShuffleRelative
        | Capability::GroupNonUniformClustered
        | Capability::GroupNonUniformQuad => requires_one_of!([APIVersion(Version::V1_1)]),
        Capability::ShaderLayer => requires_one_of!([DeviceFeature("shader_output_layer")]),
        Capability::ShaderViewportIndex => {
            requires_one_of!([DeviceFeature("shader_output_viewport_index")])
        }
        Capability::ShaderClockKHR => requires_one_of!([DeviceExtension("khr_shader_clock")]),
        Capability::DrawParameters => requires_one_of!(
            [DeviceFeature("shader_draw_parameters")],
            [DeviceExtension("khr_shader_draw_parameters")],
        ),
        Capability::WorkgroupMemoryExplicitLayoutKHR => {
            requires_one_of!([DeviceFeature("workgroup_memory_explicit_layout")])
        }
        Capability::WorkgroupMemoryExplicitLayout8BitAccessKHR => {
            requires_one_of!([DeviceFeature("workgroup_memory_explicit_layout8_bit_access")])
        }
        Capability::WorkgroupMemoryExplicitLayout16BitAccessKHR => {
            requires_one_of!([DeviceFeature("workgroup_memory_explicit_layout16_bit_access")])
        }
        Capability::SubgroupVoteKHR => {
            requires_one_of!([DeviceExtension("ext_shader_subgroup_vote")])
        }
        Capability::StorageBuffer16BitAccess => {
            requires_one_of!([DeviceFeature("storage_buffer16_bit_access")])
        }
        Capability::UniformAndStorageBuffer16BitAccess => {
            requires_one_of!([DeviceFeature("uniform_and_storage_buffer16_bit_access")])
        }
        Capability::StoragePushConstant16 => {
            requires_one_of!([DeviceFeature("storage_push_constant16")])
        }
        Capability::StorageInputOutput16 => {
            requires_one_of!([DeviceFeature("storage_input_output16")])
        }
        Capability::DeviceGroup => requires_one_of!(
            [APIVersion(Version::V1_1)],
            [DeviceExtension("khr_device_group")],
        ),
        Capability::MultiView => requires_one_of!([DeviceFeature("multiview")]),
        Capability::VariablePointersStorageBuffer => {
            requires_one_of!([DeviceFeature("variable_pointers_storage_buffer")])
        }
        Capability::VariablePointers => requires_one_of!([DeviceFeature("variable_pointers")]),
        Capability::StorageBuffer8BitAccess => {
            requires_one_of!([DeviceFeature("storage_buffer8_bit_access")])
        }
        Capability::UniformAndStorageBuffer8BitAccess => {
            requires_one_of!([DeviceFeature("uniform_and_storage_buffer8_bit_access")])
        }
        Capability::StoragePushConstant8 => {
            requires_one_of!([DeviceFeature("storage_push_constant8")])
        }
        // These depend on float control properties, which a profile does not describe.
        Capability::DenormPreserve
        | Capability::DenormFlushToZero
        | Capability::SignedZeroInfNanPreserve
        | Capability::RoundingModeRTE
        | Capability::RoundingModeRTZ => requires_one_of!(
            [APIVersion(Version::V1_2)],
            [DeviceExtension("khr_shader_float_controls")],
        ),
        Capability::RayQueryKHR => requires_one_of!([DeviceFeature("ray_query")]),
        Capability::RayTracingKHR => requires_one_of!([DeviceFeature("ray_tracing_pipeline")]),
        Capability::ShaderNonUniform => requires_one_of!(
            [APIVersion(Version::V1_2)],
            [DeviceExtension("ext_descriptor_indexing")],
        ),
        Capability::RuntimeDescriptorArray => {
            requires_one_of!([DeviceFeature("runtime_descriptor_array")])
        }
        Capability::VulkanMemoryModel => requires_one_of!([DeviceFeature("vulkan_memory_model")]),
        Capability::VulkanMemoryModelDeviceScope => {
            requires_one_of!([DeviceFeature("vulkan_memory_model_device_scope")])
        }
        Capability::PhysicalStorageBufferAddresses => requires_one_of!(
            [DeviceFeature("buffer_device_address")],
            [DeviceExtension("ext_buffer_device_address")],
        ),
        Capability::DemoteToHelperInvocation => {
            requires_one_of!([DeviceFeature("shader_demote_to_helper_invocation")])
        }
        Capability::FragmentShadingRateKHR => requires_one_of!(
            [DeviceFeature("pipeline_fragment_shading_rate")],
            [DeviceFeature("primitive_fragment_shading_rate")],
            [DeviceFeature("attachment_fragment_shading_rate")],
        ),
        Capability::SubgroupBallotKHR => {
            requires_one_of!([DeviceExtension("ext_shader_subgroup_ballot")])
        }
        Capability::SampleMaskPostDepthCoverage => {
            requires_one_of!([DeviceExtension("ext_post_depth_coverage")])
        }
        Capability::RayTraversalPrimitiveCullingKHR => {
            requires_one_of!([DeviceFeature("ray_traversal_primitive_culling")])
        }
        Capability::Float16ImageAMD => {
            requires_one_of!([DeviceExtension("amd_gpu_shader_half_float_fetch")])
        }
        Capability::ImageGatherBiasLodAMD => {
            requires_one_of!([DeviceExtension("amd_texture_gather_bias_lod")])
        }
        Capability::FragmentMaskAMD => {
            requires_one_of!([DeviceExtension("amd_shader_fragment_mask")])
        }
        Capability::StencilExportEXT => {
            requires_one_of!([DeviceExtension("ext_shader_stencil_export")])
        }
        Capability::ImageReadWriteLodAMD => {
            requires_one_of!([DeviceExtension("amd_shader_image_load_store_lod")])
        }
        Capability::Int64ImageEXT => {
            requires_one_of!([DeviceFeature("shader_image_int64_atomics")])
        }
        Capability::QuadControlKHR => requires_one_of!([DeviceFeature("shader_quad_control")]),
        Capability::SampleMaskOverrideCoverageNV => {
            requires_one_of!([DeviceExtension("nv_sample_mask_override_coverage")])
        }
        Capability::GeometryShaderPassthroughNV => {
            requires_one_of!([DeviceExtension("nv_geometry_shader_passthrough")])
        }
        Capability::ShaderViewportIndexLayerEXT => requires_one_of!(
            [DeviceExtension("ext_shader_viewport_index_layer")],
            [DeviceExtension("nv_viewport_array2")],
        ),
        Capability::ShaderViewportMaskNV => {
            requires_one_of!([DeviceExtension("nv_viewport_array2")])
        }
        Capability::ShaderStereoViewNV => {
            requires_one_of!([DeviceExtension("nv_stereo_view_rendering")])
        }
        Capability::PerViewAttributesNV => {
            requires_one_of!([DeviceExtension("nvx_multiview_per_view_attributes")])
        }
        Capability::FragmentFullyCoveredEXT => {
            requires_one_of!([DeviceExtension("ext_conservative_rasterization")])
        }
        Capability::MeshShadingNV => requires_one_of!([DeviceExtension("nv_mesh_shader")]),
        Capability::ImageFootprintNV => requires_one_of!([DeviceFeature("image_footprint")]),
        Capability::MeshShadingEXT => requires_one_of!([DeviceFeature("mesh_shader")]),
        Capability::FragmentBarycentricKHR => {
            requires_one_of!([DeviceFeature("fragment_shader_barycentric")])
        }
        Capability::ComputeDerivativeGroupQuadsNV => {
            requires_one_of!([DeviceFeature("compute_derivative_group_quads")])
        }
        Capability::ComputeDerivativeGroupLinearNV => {
            requires_one_of!([DeviceFeature("compute_derivative_group_linear")])
        }
        Capability::FragmentDensityEXT => requires_one_of!([DeviceFeature("fragment_density_map")]),
        Capability::GroupNonUniformPartitionedNV => {
            requires_one_of!([DeviceExtension("nv_shader_subgroup_partitioned")])
        }
        Capability::InputAttachmentArrayDynamicIndexing => {
            requires_one_of!([DeviceFeature("shader_input_attachment_array_dynamic_indexing")])
        }
        Capability::UniformTexelBufferArrayDynamicIndexing => requires_one_of!([DeviceFeature(
            "shader_uniform_texel_buffer_array_dynamic_indexing"
        )]),
        Capability::StorageTexelBufferArrayDynamicIndexing => requires_one_of!([DeviceFeature(
            "shader_storage_texel_buffer_array_dynamic_indexing"
        )]),
        Capability::UniformBufferArrayNonUniformIndexing => requires_one_of!([DeviceFeature(
            "shader_uniform_buffer_array_non_uniform_indexing"
        )]),
        Capability::SampledImageArrayNonUniformIndexing => requires_one_of!([DeviceFeature(
            "shader_sampled_image_array_non_uniform_indexing"
        )]),
        Capability::StorageBufferArrayNonUniformIndexing => requires_one_of!([DeviceFeature(
            "shader_storage_buffer_array_non_uniform_indexing"
        )]),
        Capability::StorageImageArrayNonUniformIndexing => requires_one_of!([DeviceFeature(
            "shader_storage_image_array_non_uniform_indexing"
        )]),
        Capability::InputAttachmentArrayNonUniformIndexing => requires_one_of!([DeviceFeature(
            "shader_input_attachment_array_non_uniform_indexing"
        )]),
        Capability::UniformTexelBufferArrayNonUniformIndexing => requires_one_of!([DeviceFeature(
            "shader_uniform_texel_buffer_array_non_uniform_indexing"
        )]),
        Capability::StorageTexelBufferArrayNonUniformIndexing => requires_one_of!([DeviceFeature(
            "shader_storage_texel_buffer_array_non_uniform_indexing"
        )]),
        Capability::RayTracingPositionFetchKHR => {
            requires_one_of!([DeviceFeature("ray_tracing_position_fetch")])
        }
        Capability::RayTracingMotionBlurNV => {
            requires_one_of!([DeviceFeature("ray_tracing_motion_blur")])
        }
        Capability::FragmentShaderSampleInterlockEXT => {
            requires_one_of!([DeviceFeature("fragment_shader_sample_interlock")])
        }
        Capability::FragmentShaderShadingRateInterlockEXT => {
            requires_one_of!([DeviceFeature("fragment_shader_shading_rate_interlock")])
        }
        Capability::FragmentShaderPixelInterlockEXT => {
            requires_one_of!([DeviceFeature("fragment_shader_pixel_interlock")])
        }
        Capability::ShaderSMBuiltinsNV => requires_one_of!([DeviceFeature("shader_sm_builtins")]),
        Capability::RayTracingOpacityMicromapEXT => requires_one_of!([DeviceFeature("micromap")]),
        Capability::ShaderInvocationReorderNV => {
            requires_one_of!([DeviceFeature("ray_tracing_invocation_reorder")])
        }
        Capability::DisplacementMicromapNV => {
            requires_one_of!([DeviceFeature("displacement_micromap")])
        }
        Capability::IntegerFunctions2INTEL => {
            requires_one_of!([DeviceFeature("shader_integer_functions2")])
        }
        Capability::AtomicFloat32MinMaxEXT => requires_one_of!(
            [DeviceFeature("shader_buffer_float32_atomic_min_max")],
            [DeviceFeature("shader_shared_float32_atomic_min_max")],
            [DeviceFeature("shader_image_float32_atomic_min_max")],
            [DeviceFeature("sparse_image_float32_atomic_min_max")],
        ),
        Capability::AtomicFloat64MinMaxEXT => requires_one_of!(
            [DeviceFeature("shader_buffer_float64_atomic_min_max")],
            [DeviceFeature("shader_shared_float64_atomic_min_max")],
        ),
        Capability::AtomicFloat16MinMaxEXT => requires_one_of!(
            [DeviceFeature("shader_buffer_float16_atomic_min_max")],
            [DeviceFeature("shader_shared_float16_atomic_min_max")],
        ),
        Capability::ExpectAssumeKHR => requires_one_of!([DeviceFeature("shader_expect_assume")]),
        Capability::DotProductInputAll
        | Capability::DotProductInput4x8Bit
        | Capability::DotProductInput4x8BitPacked
        | Capability::DotProduct => {
            requires_one_of!([DeviceFeature("shader_integer_dot_product")])
        }
        Capability::RayCullMaskKHR => requires_one_of!([DeviceFeature("ray_tracing_maintenance1")]),
        Capability::CooperativeMatrixKHR => requires_one_of!([DeviceFeature("cooperative_matrix")]),
        Capability::ReplicatedCompositesEXT => {
            requires_one_of!([DeviceFeature("shader_replicated_composites")])
        }
        Capability::AtomicFloat32AddEXT => requires_one_of!(
            [DeviceFeature("shader_buffer_float32_atomic_add")],
            [DeviceFeature("shader_shared_float32_atomic_add")],
            [DeviceFeature("shader_image_float32_atomic_add")],
            [DeviceFeature("sparse_image_float32_atomic_add")],
        ),
        Capability::AtomicFloat64AddEXT => requires_one_of!(
            [DeviceFeature("shader_buffer_float64_atomic_add")],
            [DeviceFeature("shader_shared_float64_atomic_add")],
        ),
        Capability::AtomicFloat16AddEXT => requires_one_of!(
            [DeviceFeature("shader_buffer_float16_atomic_add")],
            [DeviceFeature("shader_shared_float16_atomic_add")],
        ),
        Capability::Addresses
        | Capability::Linkage
        | Capability::Kernel
        | Capability::Vector16
        | Capability::Float16Buffer
        | Capability::ImageBasic
        | Capability::Pipes
        | Capability::Groups
        | Capability::DeviceEnqueue
        | Capability::LiteralSampler
        | Capability::AtomicStorage
        | Capability::ImageRect
        | Capability::SampledRect
        | Capability::GenericPointer => requires_one_of!(),
        Capability::Other(_) => return None,
    })
}

/// Returns what the device must support for a module to declare the SPIR-V extension
/// `extension`.
///
/// Returns `None` if Vulkan does not allow the extension.
pub fn spirv_extension_requirements(extension: &str) -> Option<RequiresOneOf> {
    Some(match extension {
        "SPV_KHR_variable_pointers" => requires_one_of!(
            [APIVersion(Version::V1_1)],
            [DeviceExtension("khr_variable_pointers")],
        ),
        "SPV_KHR_shader_draw_parameters" => requires_one_of!(
            [APIVersion(Version::V1_1)],
            [DeviceExtension("khr_shader_draw_parameters")],
        ),
        "SPV_KHR_8bit_storage" => requires_one_of!(
            [APIVersion(Version::V1_2)],
            [DeviceExtension("khr_8bit_storage")],
        ),
        "SPV_KHR_16bit_storage" => requires_one_of!(
            [APIVersion(Version::V1_1)],
            [DeviceExtension("khr_16bit_storage")],
        ),
        "SPV_KHR_storage_buffer_storage_class" => requires_one_of!(
            [APIVersion(Version::V1_1)],
            [DeviceExtension("khr_storage_buffer_storage_class")],
        ),
        "SPV_KHR_multiview" => requires_one_of!(
            [APIVersion(Version::V1_1)],
            [DeviceExtension("khr_multiview")],
        ),
        "SPV_KHR_device_group" => requires_one_of!(
            [APIVersion(Version::V1_1)],
            [DeviceExtension("khr_device_group")],
        ),
        "SPV_KHR_vulkan_memory_model" => requires_one_of!(
            [APIVersion(Version::V1_2)],
            [DeviceExtension("khr_vulkan_memory_model")],
        ),
        "SPV_KHR_physical_storage_buffer" => requires_one_of!(
            [APIVersion(Version::V1_2)],
            [DeviceExtension("khr_buffer_device_address")],
        ),
        "SPV_EXT_physical_storage_buffer" => {
            requires_one_of!([DeviceExtension("ext_buffer_device_address")])
        }
        "SPV_EXT_descriptor_indexing" => requires_one_of!(
            [APIVersion(Version::V1_2)],
            [DeviceExtension("ext_descriptor_indexing")],
        ),
        "SPV_KHR_float_controls" => requires_one_of!(
            [APIVersion(Version::V1_2)],
            [DeviceExtension("khr_shader_float_controls")],
        ),
        "SPV_KHR_non_semantic_info" => requires_one_of!(
            [APIVersion(Version::V1_3)],
            [DeviceExtension("khr_shader_non_semantic_info")],
        ),
        "SPV_KHR_terminate_invocation" => requires_one_of!(
            [APIVersion(Version::V1_3)],
            [DeviceExtension("khr_shader_terminate_invocation")],
        ),
        "SPV_EXT_demote_to_helper_invocation" => requires_one_of!(
            [APIVersion(Version::V1_3)],
            [DeviceExtension("ext_shader_demote_to_helper_invocation")],
        ),
        "SPV_KHR_integer_dot_product" => requires_one_of!(
            [APIVersion(Version::V1_3)],
            [DeviceExtension("khr_shader_integer_dot_product")],
        ),
        "SPV_KHR_shader_ballot" => {
            requires_one_of!([DeviceExtension("ext_shader_subgroup_ballot")])
        }
        "SPV_KHR_subgroup_vote" => requires_one_of!([DeviceExtension("ext_shader_subgroup_vote")]),
        "SPV_KHR_shader_clock" => requires_one_of!([DeviceExtension("khr_shader_clock")]),
        "SPV_KHR_ray_query" => requires_one_of!([DeviceExtension("khr_ray_query")]),
        "SPV_KHR_ray_tracing" => requires_one_of!([DeviceExtension("khr_ray_tracing_pipeline")]),
        "SPV_KHR_workgroup_memory_explicit_layout" => {
            requires_one_of!([DeviceExtension("khr_workgroup_memory_explicit_layout")])
        }
        "SPV_KHR_subgroup_uniform_control_flow" => {
            requires_one_of!([DeviceExtension("khr_shader_subgroup_uniform_control_flow")])
        }
        "SPV_EXT_shader_atomic_float_add" => {
            requires_one_of!([DeviceExtension("ext_shader_atomic_float")])
        }
        "SPV_AMD_gpu_shader_half_float" => {
            requires_one_of!([DeviceExtension("amd_gpu_shader_half_float")])
        }
        _ => return None,
    })
}

/// Checks that `profile` supports the SPIR-V capability `capability`.
pub(crate) fn validate_spirv_capability(
    profile: &DeviceProfile,
    capability: Capability,
) -> Result<(), Diagnostic> {
    let Some(requires_one_of) = spirv_capability_requirements(capability) else {
        log::debug!("the SPIR-V capability {:?} is not known", capability);

        return Err(Diagnostic::error(
            DiagnosticKind::MissingCapabilityFeature,
            format!(
                "the module uses the SPIR-V capability {}, which is not known to be supported \
                by Vulkan",
                capability.to_raw(),
            ),
            VUID_UNKNOWN_CAPABILITY,
        ));
    };

    if requires_one_of.is_empty() {
        return Err(Diagnostic::error(
            DiagnosticKind::MissingCapabilityFeature,
            format!(
                "the module uses the SPIR-V capability `{:?}`, which is not supported by Vulkan",
                capability,
            ),
            VUID_UNKNOWN_CAPABILITY,
        ));
    }

    if !profile.supports(requires_one_of) {
        return Err(Diagnostic::error(
            DiagnosticKind::MissingCapabilityFeature,
            format!("the module uses the SPIR-V capability `{:?}`", capability),
            VUID_MISSING_CAPABILITY,
        )
        .with_requires_one_of(requires_one_of));
    }

    Ok(())
}

/// Checks that `profile` supports the SPIR-V extension `extension`.
pub(crate) fn validate_spirv_extension(
    profile: &DeviceProfile,
    extension: &str,
) -> Result<(), Diagnostic> {
    let Some(requires_one_of) = spirv_extension_requirements(extension) else {
        return Err(Diagnostic::error(
            DiagnosticKind::MissingExtension,
            format!(
                "the module uses the SPIR-V extension `{}`, which is not supported by Vulkan",
                extension,
            ),
            VUID_UNKNOWN_EXTENSION,
        ));
    };

    if !profile.supports(requires_one_of) {
        return Err(Diagnostic::error(
            DiagnosticKind::MissingExtension,
            format!("the module uses the SPIR-V extension `{}`", extension),
            VUID_MISSING_EXTENSION,
        )
        .with_requires_one_of(requires_one_of));
    }

    Ok(())
}
