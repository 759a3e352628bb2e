// Copyright (c) 2016 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Enumerants of the SPIR-V grammar that the validator looks at.
//!
//! Values that are not listed here are kept in an `Other` variant instead of being rejected, so
//! that modules using newer parts of the grammar can still be indexed.

use super::{Id, InstructionReader, ParseError};

macro_rules! spirv_enum {
    {
        $(#[doc = $ty_doc:literal])*
        $ty:ident;

        $(
            $(#[doc = $doc:literal])*
            $name:ident = $value:literal,
        )+
    } => {
        $(#[doc = $ty_doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        #[allow(non_camel_case_types)]
        pub enum $ty {
            $(
                $(#[doc = $doc])*
                $name,
            )+
            /// A value that this crate does not know about.
            Other(u32),
        }

        impl $ty {
            #[doc = concat!("Converts a raw SPIR-V value to a `", stringify!($ty), "`.")]
            #[inline]
            pub const fn from_raw(value: u32) -> Self {
                match value {
                    $($value => Self::$name,)+
                    value => Self::Other(value),
                }
            }

            /// Returns the raw SPIR-V value.
            #[inline]
            pub const fn to_raw(self) -> u32 {
                match self {
                    $(Self::$name => $value,)+
                    Self::Other(value) => value,
                }
            }

            #[inline]
            pub(super) fn parse(reader: &mut InstructionReader<'_>) -> Result<Self, ParseError> {
                reader.next_u32().map(Self::from_raw)
            }
        }

        impl From<u32> for $ty {
            #[inline]
            fn from(value: u32) -> Self {
                Self::from_raw(value)
            }
        }
    };
}

spirv_enum! {
    /// A capability declared with `OpCapability`.
    Capability;

    Matrix = 0,
    Shader = 1,
    Geometry = 2,
    Tessellation = 3,
    Addresses = 4,
    Linkage = 5,
    Kernel = 6,
    Vector16 = 7,
    Float16Buffer = 8,
    Float16 = 9,
    Float64 = 10,
    Int64 = 11,
    Int64Atomics = 12,
    ImageBasic = 13,
    Pipes = 17,
    Groups = 18,
    DeviceEnqueue = 19,
    LiteralSampler = 20,
    AtomicStorage = 21,
    Int16 = 22,
    TessellationPointSize = 23,
    GeometryPointSize = 24,
    ImageGatherExtended = 25,
    StorageImageMultisample = 27,
    UniformBufferArrayDynamicIndexing = 28,
    SampledImageArrayDynamicIndexing = 29,
    StorageBufferArrayDynamicIndexing = 30,
    StorageImageArrayDynamicIndexing = 31,
    ClipDistance = 32,
    CullDistance = 33,
    ImageCubeArray = 34,
    SampleRateShading = 35,
    ImageRect = 36,
    SampledRect = 37,
    GenericPointer = 38,
    Int8 = 39,
    InputAttachment = 40,
    SparseResidency = 41,
    MinLod = 42,
    Sampled1D = 43,
    Image1D = 44,
    SampledCubeArray = 45,
    SampledBuffer = 46,
    ImageBuffer = 47,
    ImageMSArray = 48,
    StorageImageExtendedFormats = 49,
    ImageQuery = 50,
    DerivativeControl = 51,
    InterpolationFunction = 52,
    TransformFeedback = 53,
    GeometryStreams = 54,
    StorageImageReadWithoutFormat = 55,
    StorageImageWriteWithoutFormat = 56,
    MultiViewport = 57,
    GroupNonUniform = 61,
    GroupNonUniformVote = 62,
    GroupNonUniformArithmetic = 63,
    GroupNonUniformBallot = 64,
    GroupNonUniformShuffle = 65,
    GroupNonUniformShuffleRelative = 66,
    GroupNonUniformClustered = 67,
    GroupNonUniformQuad = 68,
    ShaderLayer = 69,
    ShaderViewportIndex = 70,
    ShaderClockKHR = 5055,
    DrawParameters = 4427,
    WorkgroupMemoryExplicitLayoutKHR = 4428,
    WorkgroupMemoryExplicitLayout8BitAccessKHR = 4429,
    WorkgroupMemoryExplicitLayout16BitAccessKHR = 4430,
    SubgroupVoteKHR = 4431,
    StorageBuffer16BitAccess = 4433,
    UniformAndStorageBuffer16BitAccess = 4434,
    StoragePushConstant16 = 4435,
    StorageInputOutput16 = 4436,
    DeviceGroup = 4437,
    MultiView = 4439,
    VariablePointersStorageBuffer = 4441,
    VariablePointers = 4442,
    StorageBuffer8BitAccess = 4448,
    UniformAndStorageBuffer8BitAccess = 4449,
    StoragePushConstant8 = 4450,
    DenormPreserve = 4464,
    DenormFlushToZero = 4465,
    SignedZeroInfNanPreserve = 4466,
    RoundingModeRTE = 4467,
    RoundingModeRTZ = 4468,
    RayQueryKHR = 4472,
    RayTracingKHR = 4479,
    ShaderNonUniform = 5301,
    RuntimeDescriptorArray = 5302,
    VulkanMemoryModel = 5345,
    VulkanMemoryModelDeviceScope = 5346,
    PhysicalStorageBufferAddresses = 5347,
    DemoteToHelperInvocation = 5379,
    FragmentShadingRateKHR = 4422,
    SubgroupBallotKHR = 4423,
    SampleMaskPostDepthCoverage = 4447,
    RayTraversalPrimitiveCullingKHR = 4478,
    Float16ImageAMD = 5008,
    ImageGatherBiasLodAMD = 5009,
    FragmentMaskAMD = 5010,
    StencilExportEXT = 5013,
    ImageReadWriteLodAMD = 5015,
    Int64ImageEXT = 5016,
    QuadControlKHR = 5087,
    SampleMaskOverrideCoverageNV = 5249,
    GeometryShaderPassthroughNV = 5251,
    ShaderViewportIndexLayerEXT = 5254,
    ShaderViewportMaskNV = 5255,
    ShaderStereoViewNV = 5259,
    PerViewAttributesNV = 5260,
    FragmentFullyCoveredEXT = 5265,
    MeshShadingNV = 5266,
    ImageFootprintNV = 5282,
    MeshShadingEXT = 5283,
    FragmentBarycentricKHR = 5284,
    ComputeDerivativeGroupQuadsNV = 5288,
    FragmentDensityEXT = 5291,
    GroupNonUniformPartitionedNV = 5297,
    InputAttachmentArrayDynamicIndexing = 5303,
    UniformTexelBufferArrayDynamicIndexing = 5304,
    StorageTexelBufferArrayDynamicIndexing = 5305,
    UniformBufferArrayNonUniformIndexing = 5306,
    SampledImageArrayNonUniformIndexing = 5307,
    StorageBufferArrayNonUniformIndexing = 5308,
    StorageImageArrayNonUniformIndexing = 5309,
    InputAttachmentArrayNonUniformIndexing = 5310,
    UniformTexelBufferArrayNonUniformIndexing = 5311,
    StorageTexelBufferArrayNonUniformIndexing = 5312,
    RayTracingPositionFetchKHR = 5336,
    RayTracingMotionBlurNV = 5341,
    ComputeDerivativeGroupLinearNV = 5350,
    FragmentShaderSampleInterlockEXT = 5363,
    FragmentShaderShadingRateInterlockEXT = 5372,
    ShaderSMBuiltinsNV = 5373,
    FragmentShaderPixelInterlockEXT = 5378,
    RayTracingOpacityMicromapEXT = 5381,
    ShaderInvocationReorderNV = 5383,
    DisplacementMicromapNV = 5409,
    IntegerFunctions2INTEL = 5584,
    AtomicFloat32MinMaxEXT = 5612,
    AtomicFloat64MinMaxEXT = 5613,
    AtomicFloat16MinMaxEXT = 5616,
    ExpectAssumeKHR = 5629,
    DotProductInputAll = 6016,
    DotProductInput4x8Bit = 6017,
    DotProductInput4x8BitPacked = 6018,
    DotProduct = 6019,
    RayCullMaskKHR = 6020,
    CooperativeMatrixKHR = 6022,
    ReplicatedCompositesEXT = 6024,
    AtomicFloat32AddEXT = 6033,
    AtomicFloat64AddEXT = 6034,
    AtomicFloat16AddEXT = 6095,
}

spirv_enum! {
    /// The storage class of a pointer type or variable.
    StorageClass;

    UniformConstant = 0,
    Input = 1,
    Uniform = 2,
    Output = 3,
    /// Memory shared between all invocations of a workgroup.
    Workgroup = 4,
    CrossWorkgroup = 5,
    Private = 6,
    Function = 7,
    Generic = 8,
    PushConstant = 9,
    AtomicCounter = 10,
    Image = 11,
    StorageBuffer = 12,
    PhysicalStorageBuffer = 5349,
}

spirv_enum! {
    /// The built-in value that a decoration refers to.
    BuiltIn;

    NumWorkgroups = 24,
    WorkgroupSize = 25,
    WorkgroupId = 26,
    LocalInvocationId = 27,
    GlobalInvocationId = 28,
    LocalInvocationIndex = 29,
}

spirv_enum! {
    /// The shader stage of an entry point.
    ExecutionModel;

    Vertex = 0,
    TessellationControl = 1,
    TessellationEvaluation = 2,
    Geometry = 3,
    Fragment = 4,
    GLCompute = 5,
    Kernel = 6,
    TaskNV = 5267,
    MeshNV = 5268,
    TaskEXT = 5364,
    MeshEXT = 5365,
}

/// A decoration applied with `OpDecorate` or `OpMemberDecorate`.
///
/// Only the decorations that affect sizes, constants or built-ins are given their own variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Decoration {
    SpecId { specialization_constant_id: u32 },
    Block,
    BufferBlock,
    ArrayStride { array_stride: u32 },
    MatrixStride { matrix_stride: u32 },
    BuiltIn { built_in: BuiltIn },
    Aliased,
    Offset { byte_offset: u32 },
    /// Any other decoration. Its operands are not kept.
    Other(u32),
}

impl Decoration {
    pub(super) fn parse(reader: &mut InstructionReader<'_>) -> Result<Self, ParseError> {
        Ok(match reader.next_u32()? {
            1 => Self::SpecId {
                specialization_constant_id: reader.next_u32()?,
            },
            2 => Self::Block,
            3 => Self::BufferBlock,
            6 => Self::ArrayStride {
                array_stride: reader.next_u32()?,
            },
            7 => Self::MatrixStride {
                matrix_stride: reader.next_u32()?,
            },
            11 => Self::BuiltIn {
                built_in: BuiltIn::parse(reader)?,
            },
            20 => Self::Aliased,
            35 => Self::Offset {
                byte_offset: reader.next_u32()?,
            },
            value => {
                reader.skip_remainder();
                Self::Other(value)
            }
        })
    }
}

/// An execution mode given with `OpExecutionMode` or `OpExecutionModeId`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExecutionMode {
    LocalSize {
        x_size: u32,
        y_size: u32,
        z_size: u32,
    },
    LocalSizeHint {
        x_size: u32,
        y_size: u32,
        z_size: u32,
    },
    LocalSizeId {
        x_size: Id,
        y_size: Id,
        z_size: Id,
    },
    LocalSizeHintId {
        x_size: Id,
        y_size: Id,
        z_size: Id,
    },
    /// Any other execution mode. Its operands are not kept.
    Other(u32),
}

impl ExecutionMode {
    pub(super) fn parse(reader: &mut InstructionReader<'_>) -> Result<Self, ParseError> {
        Ok(match reader.next_u32()? {
            17 => Self::LocalSize {
                x_size: reader.next_u32()?,
                y_size: reader.next_u32()?,
                z_size: reader.next_u32()?,
            },
            18 => Self::LocalSizeHint {
                x_size: reader.next_u32()?,
                y_size: reader.next_u32()?,
                z_size: reader.next_u32()?,
            },
            38 => Self::LocalSizeId {
                x_size: Id(reader.next_u32()?),
                y_size: Id(reader.next_u32()?),
                z_size: Id(reader.next_u32()?),
            },
            39 => Self::LocalSizeHintId {
                x_size: Id(reader.next_u32()?),
                y_size: Id(reader.next_u32()?),
                z_size: Id(reader.next_u32()?),
            },
            value => {
                reader.skip_remainder();
                Self::Other(value)
            }
        })
    }

    /// Returns the ids that the execution mode refers to.
    pub fn operand_ids(&self) -> Option<[Id; 3]> {
        match *self {
            Self::LocalSizeId {
                x_size,
                y_size,
                z_size,
            }
            | Self::LocalSizeHintId {
                x_size,
                y_size,
                z_size,
            } => Some([x_size, y_size, z_size]),
            _ => None,
        }
    }
}
