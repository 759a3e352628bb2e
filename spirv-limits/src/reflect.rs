// Copyright (c) 2021 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Extraction of resource usage from a SPIR-V module.
//!
//! The functions in this module compute the quantities that are compared against device limits:
//! the amount of workgroup memory used by a module, and the workgroup size of an entry point.

use crate::{
    spirv::{
        specialization::{ResolvedConstants, UnresolvedConstant, UnresolvedReason},
        BuiltIn, ExecutionMode, Id, Instruction, Spirv, StorageClass,
    },
    DeviceSize,
};
use std::{
    error::Error,
    fmt::{Display, Error as FmtError, Formatter},
};

/// How the members of structs and the elements of arrays are laid out, when the module does not
/// give explicit offsets and strides.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WorkgroupLayout {
    /// Members and elements follow each other with no padding.
    #[default]
    Packed,

    /// Members and elements are aligned to their base alignment, as in the `std430` layout.
    /// A `vec3` array element takes 16 bytes.
    Natural,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct TypeLayout {
    size: DeviceSize,
    alignment: DeviceSize,
}

/// Returns the size in bytes of the type `type_id`.
///
/// Booleans are 4 bytes. Array lengths are taken from `constants`, so the size depends on the
/// values of specialization constants.
pub fn size_of_type(
    spirv: &Spirv,
    constants: &ResolvedConstants,
    type_id: Id,
    layout: WorkgroupLayout,
) -> Result<DeviceSize, SizeError> {
    layout_of_type(spirv, constants, type_id, layout, None).map(|type_layout| type_layout.size)
}

fn layout_of_type(
    spirv: &Spirv,
    constants: &ResolvedConstants,
    type_id: Id,
    layout: WorkgroupLayout,
    matrix_stride: Option<u32>,
) -> Result<TypeLayout, SizeError> {
    let id_info = spirv
        .id(type_id)
        .ok_or(SizeError::NotAType { id: type_id })?;
    let align = |alignment: DeviceSize| match layout {
        WorkgroupLayout::Packed => 1,
        WorkgroupLayout::Natural => alignment,
    };
    let overflow = SizeError::Overflow { type_id };

    match *id_info.instruction() {
        Instruction::TypeBool { .. } => Ok(TypeLayout {
            size: 4,
            alignment: align(4),
        }),
        Instruction::TypeInt { width, .. } | Instruction::TypeFloat { width, .. } => {
            let size = DeviceSize::from(width / 8);

            Ok(TypeLayout {
                size,
                alignment: align(size),
            })
        }
        Instruction::TypeVector {
            component_type,
            component_count,
            ..
        } => {
            let component = layout_of_type(spirv, constants, component_type, layout, None)?;
            let size = component
                .size
                .checked_mul(DeviceSize::from(component_count))
                .ok_or(overflow.clone())?;
            let alignment = match component_count {
                2 => align(component.alignment.checked_mul(2).ok_or(overflow)?),
                3 | 4 => align(component.alignment.checked_mul(4).ok_or(overflow)?),
                _ => component.alignment,
            };

            Ok(TypeLayout { size, alignment })
        }
        Instruction::TypeMatrix {
            column_type,
            column_count,
            ..
        } => {
            let column = layout_of_type(spirv, constants, column_type, layout, None)?;
            let stride = match matrix_stride {
                Some(matrix_stride) => DeviceSize::from(matrix_stride),
                None => align_up(column.size, column.alignment).ok_or(overflow.clone())?,
            };

            Ok(TypeLayout {
                size: stride
                    .checked_mul(DeviceSize::from(column_count))
                    .ok_or(overflow)?,
                alignment: column.alignment,
            })
        }
        Instruction::TypeArray {
            element_type,
            length,
            ..
        } => {
            let element = layout_of_type(spirv, constants, element_type, layout, None)?;
            let length = constants.get_u64(length)?;
            let stride = match id_info.array_stride() {
                Some(array_stride) => DeviceSize::from(array_stride),
                None => align_up(element.size, element.alignment).ok_or(overflow.clone())?,
            };

            Ok(TypeLayout {
                size: stride.checked_mul(length).ok_or(overflow)?,
                alignment: element.alignment,
            })
        }
        Instruction::TypeStruct {
            ref member_types, ..
        } => {
            let members = id_info.members();
            let explicit = !members.is_empty()
                && members.iter().all(|member| member.offset().is_some());
            let mut size: DeviceSize = 0;
            let mut alignment: DeviceSize = 1;

            for (&member_type, member_info) in member_types.iter().zip(members) {
                let member = layout_of_type(
                    spirv,
                    constants,
                    member_type,
                    layout,
                    member_info.matrix_stride(),
                )?;
                alignment = alignment.max(member.alignment);

                let offset = match member_info.offset() {
                    Some(offset) if explicit => DeviceSize::from(offset),
                    _ => align_up(size, member.alignment).ok_or(overflow.clone())?,
                };
                let end = offset.checked_add(member.size).ok_or(overflow.clone())?;

                size = if explicit { size.max(end) } else { end };
            }

            if !explicit {
                size = align_up(size, alignment).ok_or(overflow)?;
            }

            Ok(TypeLayout { size, alignment })
        }
        Instruction::TypePointer {
            storage_class: StorageClass::PhysicalStorageBuffer,
            ..
        } => Ok(TypeLayout {
            size: 8,
            alignment: align(8),
        }),
        Instruction::TypeRuntimeArray { .. }
        | Instruction::TypePointer { .. }
        | Instruction::TypeImage { .. }
        | Instruction::TypeSampler { .. }
        | Instruction::TypeSampledImage { .. }
        | Instruction::TypeOpaque { .. }
        | Instruction::TypeVoid { .. }
        | Instruction::TypeFunction { .. } => Err(SizeError::Unsized { type_id }),
        _ => Err(SizeError::NotAType { id: type_id }),
    }
}

/// Rounds `offset` up to a multiple of `alignment`, or returns `None` on overflow.
#[inline]
fn align_up(offset: DeviceSize, alignment: DeviceSize) -> Option<DeviceSize> {
    if alignment <= 1 {
        Some(offset)
    } else {
        offset.div_ceil(alignment).checked_mul(alignment)
    }
}

/// Returns the total number of bytes of all variables in the `Workgroup` storage class.
///
/// Variables whose type has no size, such as runtime arrays, are left out with a warning.
pub fn workgroup_memory_size(
    spirv: &Spirv,
    constants: &ResolvedConstants,
    layout: WorkgroupLayout,
) -> Result<DeviceSize, UnresolvedConstant> {
    let mut total: DeviceSize = 0;

    for &variable in spirv.global_variables() {
        let Some(Instruction::Variable {
            result_type_id,
            storage_class: StorageClass::Workgroup,
            ..
        }) = spirv.id(variable).map(|id_info| id_info.instruction())
        else {
            continue;
        };

        let pointee = match spirv.id(*result_type_id).map(|id_info| id_info.instruction()) {
            Some(&Instruction::TypePointer { ty, .. }) => ty,
            _ => {
                log::warn!("workgroup variable {} does not have a pointer type", variable);
                continue;
            }
        };

        match size_of_type(spirv, constants, pointee, layout) {
            Ok(size) => {
                log::trace!("workgroup variable {} is {} bytes", variable, size);
                total = total.saturating_add(size);
            }
            Err(SizeError::Unresolved(err)) => return Err(err),
            Err(SizeError::Overflow { .. }) => total = DeviceSize::MAX,
            Err(err) => log::warn!(
                "workgroup variable {} is not counted towards the workgroup memory size: {}",
                variable,
                err,
            ),
        }
    }

    log::debug!("workgroup memory size: {} bytes ({:?} layout)", total, layout);

    Ok(total)
}

/// The size of a workgroup, and where it was declared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WorkgroupSize {
    /// The number of invocations in the X, Y and Z dimensions.
    pub dimensions: [u64; 3],

    /// The declaration that the size was taken from.
    pub source: WorkgroupSizeSource,
}

impl WorkgroupSize {
    /// Returns the total number of invocations in the workgroup, or `None` on overflow.
    #[inline]
    pub fn invocations(&self) -> Option<u64> {
        self.dimensions
            .iter()
            .try_fold(1u64, |total, &size| total.checked_mul(size))
    }
}

/// Where a [`WorkgroupSize`] was declared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum WorkgroupSizeSource {
    /// A constant decorated with `BuiltIn WorkgroupSize`.
    BuiltIn(Id),

    /// The `LocalSizeId` execution mode.
    LocalSizeId,

    /// The `LocalSize` execution mode.
    LocalSize,
}

/// Returns the workgroup size of `entry_point`, or `None` if the module does not declare one.
///
/// A constant decorated with `BuiltIn WorkgroupSize` takes precedence over the execution modes of
/// the entry point.
pub fn workgroup_size(
    spirv: &Spirv,
    constants: &ResolvedConstants,
    entry_point: Id,
) -> Result<Option<WorkgroupSize>, UnresolvedConstant> {
    let built_in = spirv.constants().iter().copied().find(|&id| {
        spirv
            .id(id)
            .is_some_and(|id_info| id_info.built_in() == Some(BuiltIn::WorkgroupSize))
    });

    let workgroup_size = if let Some(id) = built_in {
        let invalid = UnresolvedConstant {
            id,
            reason: UnresolvedReason::InvalidValue,
        };
        let components = constants
            .get(id)?
            .components()
            .filter(|components| components.len() == 3)
            .ok_or(invalid.clone())?;
        let mut dimensions = [0; 3];

        for (dimension, component) in dimensions.iter_mut().zip(components) {
            *dimension = component.as_u64().ok_or(invalid.clone())?;
        }

        Some(WorkgroupSize {
            dimensions,
            source: WorkgroupSizeSource::BuiltIn(id),
        })
    } else {
        let mut local_size = None;
        let mut local_size_id = None;

        for mode in spirv.execution_modes(entry_point) {
            match *mode {
                ExecutionMode::LocalSize {
                    x_size,
                    y_size,
                    z_size,
                } => local_size = Some([x_size, y_size, z_size].map(u64::from)),
                ExecutionMode::LocalSizeId {
                    x_size,
                    y_size,
                    z_size,
                } => local_size_id = Some([x_size, y_size, z_size]),
                _ => (),
            }
        }

        if let Some(ids) = local_size_id {
            let mut dimensions = [0; 3];

            for (dimension, id) in dimensions.iter_mut().zip(ids) {
                *dimension = constants.get_u64(id)?;
            }

            Some(WorkgroupSize {
                dimensions,
                source: WorkgroupSizeSource::LocalSizeId,
            })
        } else {
            local_size.map(|dimensions| WorkgroupSize {
                dimensions,
                source: WorkgroupSizeSource::LocalSize,
            })
        }
    };

    if let Some(workgroup_size) = &workgroup_size {
        log::debug!(
            "workgroup size of entry point {}: {:?} from {:?}",
            entry_point,
            workgroup_size.dimensions,
            workgroup_size.source,
        );
    }

    Ok(workgroup_size)
}

/// Error that can happen when computing the size of a type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SizeError {
    /// The id is not a type.
    NotAType { id: Id },

    /// The size does not fit in a `DeviceSize`.
    Overflow { type_id: Id },

    /// The length of an array could not be computed.
    Unresolved(UnresolvedConstant),

    /// The type does not have a size, such as a runtime array or an image.
    Unsized { type_id: Id },
}

impl Display for SizeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            Self::NotAType { id } => write!(f, "{} is not a type", id),
            Self::Overflow { type_id } => write!(f, "the size of type {} overflows", type_id),
            Self::Unresolved(_) => write!(f, "the length of an array could not be computed"),
            Self::Unsized { type_id } => write!(f, "type {} does not have a size", type_id),
        }
    }
}

impl Error for SizeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unresolved(err) => Some(err),
            _ => None,
        }
    }
}

impl From<UnresolvedConstant> for SizeError {
    fn from(err: UnresolvedConstant) -> Self {
        Self::Unresolved(err)
    }
}
