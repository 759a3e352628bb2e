// Copyright (c) 2021 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Specialization constants and the values of constants.
//!
//! A specialization constant has a default value in the module, which can be replaced when a
//! pipeline is created. The replacement values are given as a [`SpecializationInfo`], which maps
//! the `SpecId` of a constant to the bytes of its new value, in the same way as
//! `VkSpecializationInfo`.
//!
//! [`resolve_constants`] computes the value of every constant of a module, including the result
//! of `OpSpecConstantOp` instructions.

use super::{BinaryOp, Id, Instruction, SpecConstantInstruction, Spirv, UnaryOp};
use foldhash::HashMap;
use half::f16;
use smallvec::SmallVec;
use std::{
    collections::BTreeMap,
    error::Error,
    fmt::{Display, Error as FmtError, Formatter},
};

/// `OpConstantNull` values made of more than this many scalars and composites, counted over all
/// nesting levels, are not expanded.
const MAX_NULL_VALUE_NODES: u64 = 1 << 16;

/// The value to provide for a specialization constant, when creating a pipeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpecializationConstant {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F16(f16),
    F32(f32),
    F64(f64),
}

impl SpecializationConstant {
    /// Returns the value as bytes, in the layout expected by `VkSpecializationInfo`.
    ///
    /// Booleans are 4 bytes, like `VkBool32`.
    pub fn to_bytes(self) -> SmallVec<[u8; 8]> {
        match self {
            Self::Bool(value) => SmallVec::from_slice(bytemuck::bytes_of(&(value as u32))),
            Self::I8(value) => SmallVec::from_slice(bytemuck::bytes_of(&value)),
            Self::I16(value) => SmallVec::from_slice(bytemuck::bytes_of(&value)),
            Self::I32(value) => SmallVec::from_slice(bytemuck::bytes_of(&value)),
            Self::I64(value) => SmallVec::from_slice(bytemuck::bytes_of(&value)),
            Self::U8(value) => SmallVec::from_slice(bytemuck::bytes_of(&value)),
            Self::U16(value) => SmallVec::from_slice(bytemuck::bytes_of(&value)),
            Self::U32(value) => SmallVec::from_slice(bytemuck::bytes_of(&value)),
            Self::U64(value) => SmallVec::from_slice(bytemuck::bytes_of(&value)),
            Self::F16(value) => SmallVec::from_slice(bytemuck::bytes_of(&value)),
            Self::F32(value) => SmallVec::from_slice(bytemuck::bytes_of(&value)),
            Self::F64(value) => SmallVec::from_slice(bytemuck::bytes_of(&value)),
        }
    }
}

macro_rules! impl_from_for_specialization_constant {
    ($($ty:ty => $variant:ident,)+) => {
        $(
            impl From<$ty> for SpecializationConstant {
                #[inline]
                fn from(value: $ty) -> Self {
                    SpecializationConstant::$variant(value)
                }
            }
        )+
    };
}

impl_from_for_specialization_constant! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f16 => F16,
    f32 => F32,
    f64 => F64,
}

/// Describes an individual constant to set in the shader, as part of a data blob.
// Implementation note: has the same memory representation as a `VkSpecializationMapEntry`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct SpecializationMapEntry {
    /// Identifier of the constant in the shader that corresponds to this field.
    ///
    /// This must be the value of the `SpecId` decoration applied to the specialization constant.
    pub constant_id: u32,

    /// Offset within the data blob where the value can be found.
    pub offset: u32,

    /// Size of the data in bytes. Must match the size of the constant (`4` for booleans).
    pub size: usize,
}

/// The values to replace the defaults of specialization constants with.
///
/// Values are stored as raw bytes, keyed by specialization id. Whether a specialization constant
/// is overridden only depends on whether its id is present.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SpecializationInfo {
    entries: BTreeMap<u32, SmallVec<[u8; 8]>>,
}

impl SpecializationInfo {
    /// Returns an empty `SpecializationInfo`.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a `SpecializationInfo` from a list of map entries and the data blob they point
    /// into, as they would be given in a `VkSpecializationInfo`.
    pub fn from_map_entries(
        map_entries: &[SpecializationMapEntry],
        data: &[u8],
    ) -> Result<Self, SpecializationMapError> {
        let mut info = Self::new();

        for entry in map_entries {
            let range = (entry.offset as usize)
                .checked_add(entry.size)
                .filter(|&end| end <= data.len())
                .map(|end| entry.offset as usize..end)
                .ok_or(SpecializationMapError::OutOfRange {
                    constant_id: entry.constant_id,
                    offset: entry.offset,
                    size: entry.size,
                    data_size: data.len(),
                })?;

            if info.entries.contains_key(&entry.constant_id) {
                return Err(SpecializationMapError::DuplicateConstantId {
                    constant_id: entry.constant_id,
                });
            }

            info.insert_raw(entry.constant_id, &data[range]);
        }

        Ok(info)
    }

    /// Sets the value of the specialization constant with the given id, replacing any value
    /// that was set before.
    #[inline]
    pub fn insert(&mut self, constant_id: u32, value: impl Into<SpecializationConstant>) {
        self.entries.insert(constant_id, value.into().to_bytes());
    }

    /// Sets the value of the specialization constant with the given id from raw bytes.
    #[inline]
    pub fn insert_raw(&mut self, constant_id: u32, bytes: &[u8]) {
        self.entries.insert(constant_id, SmallVec::from_slice(bytes));
    }

    /// Returns the bytes given for the specialization constant with the given id.
    #[inline]
    pub fn get(&self, constant_id: u32) -> Option<&[u8]> {
        self.entries.get(&constant_id).map(|bytes| bytes.as_slice())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entries in order of specialization id.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (u32, &[u8])> + '_ {
        self.entries
            .iter()
            .map(|(&constant_id, bytes)| (constant_id, bytes.as_slice()))
    }
}

impl FromIterator<(u32, SpecializationConstant)> for SpecializationInfo {
    fn from_iter<T: IntoIterator<Item = (u32, SpecializationConstant)>>(iter: T) -> Self {
        let mut info = Self::new();

        for (constant_id, value) in iter {
            info.insert(constant_id, value);
        }

        info
    }
}

/// Error that can happen when building a [`SpecializationInfo`] from map entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpecializationMapError {
    /// An entry points outside of the data blob.
    OutOfRange {
        constant_id: u32,
        offset: u32,
        size: usize,
        data_size: usize,
    },

    /// Two entries have the same constant id.
    DuplicateConstantId { constant_id: u32 },
}

impl Display for SpecializationMapError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            Self::OutOfRange {
                constant_id,
                offset,
                size,
                data_size,
            } => write!(
                f,
                "the map entry for constant {} has offset {} and size {}, which is outside the \
                {} bytes of data",
                constant_id, offset, size, data_size,
            ),
            Self::DuplicateConstantId { constant_id } => write!(
                f,
                "more than one map entry has constant id {}",
                constant_id,
            ),
        }
    }
}

impl Error for SpecializationMapError {}

/// The value of a constant.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConstantValue {
    Bool(bool),

    /// An integer of `width` bits. `bits` holds the two's complement representation, with the
    /// bits above `width` cleared.
    Int { bits: u64, width: u32, signed: bool },

    /// A floating point number of `width` bits, stored as its bit pattern.
    Float { bits: u64, width: u32 },

    /// The members of a vector, matrix, array or struct.
    Composite(Vec<ConstantValue>),
}

impl ConstantValue {
    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value of an integer constant, if it is not negative.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::Int { bits, signed, width } => {
                if signed && sign_extend(bits, width) < 0 {
                    None
                } else {
                    Some(bits)
                }
            }
            _ => None,
        }
    }

    /// Returns the value of an integer constant, if it fits in an `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Int {
                bits,
                width,
                signed: true,
            } => Some(sign_extend(bits, width)),
            Self::Int {
                bits,
                signed: false,
                ..
            } => i64::try_from(bits).ok(),
            _ => None,
        }
    }

    /// Returns the value of a floating point constant.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Float { bits, width: 16 } => Some(f16::from_bits(bits as u16).to_f64()),
            Self::Float { bits, width: 32 } => Some(f32::from_bits(bits as u32).into()),
            Self::Float { bits, width: 64 } => Some(f64::from_bits(bits)),
            _ => None,
        }
    }

    /// Returns the members of a composite constant.
    #[inline]
    pub fn components(&self) -> Option<&[ConstantValue]> {
        match self {
            Self::Composite(components) => Some(components),
            _ => None,
        }
    }
}

/// The values of all the constants of a module, as returned by [`resolve_constants`].
#[derive(Clone, Debug, Default)]
pub struct ResolvedConstants {
    values: HashMap<Id, Result<ConstantValue, UnresolvedConstant>>,
}

impl ResolvedConstants {
    /// Returns the value of the constant `id`.
    ///
    /// Returns an error if `id` is not a constant, or if its value could not be computed.
    pub fn get(&self, id: Id) -> Result<&ConstantValue, UnresolvedConstant> {
        match self.values.get(&id) {
            Some(Ok(value)) => Ok(value),
            Some(Err(err)) => Err(err.clone()),
            None => Err(UnresolvedConstant {
                id,
                reason: UnresolvedReason::NotAConstant,
            }),
        }
    }

    /// Returns the value of the integer constant `id`, which must not be negative.
    pub fn get_u64(&self, id: Id) -> Result<u64, UnresolvedConstant> {
        self.get(id)?.as_u64().ok_or(UnresolvedConstant {
            id,
            reason: UnresolvedReason::InvalidValue,
        })
    }

    /// Returns the number of constants.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns the constants whose value could not be computed.
    pub fn unresolved(&self) -> impl Iterator<Item = &UnresolvedConstant> {
        self.values.values().filter_map(|value| value.as_ref().err())
    }
}

/// A constant whose value could not be computed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UnresolvedConstant {
    pub id: Id,
    pub reason: UnresolvedReason,
}

impl Display for UnresolvedConstant {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "the value of constant {} could not be computed: ", self.id)?;

        match &self.reason {
            UnresolvedReason::NotAConstant => write!(f, "it is not a constant"),
            UnresolvedReason::DependsOn(_) => write!(f, "one of its operands has no value"),
            UnresolvedReason::OverrideSizeMismatch {
                specialization_id,
                expected,
                provided,
            } => write!(
                f,
                "the value provided for specialization id {} is {} bytes, but the constant is {} \
                bytes",
                specialization_id, provided, expected,
            ),
            UnresolvedReason::DivisionByZero => write!(f, "it divides by zero"),
            UnresolvedReason::ShiftOutOfRange { shift, width } => write!(
                f,
                "it shifts a {}-bit value by {} bits",
                width, shift,
            ),
            UnresolvedReason::UnsupportedOperation { opcode } => write!(
                f,
                "`OpSpecConstantOp` with opcode {} cannot be evaluated",
                opcode,
            ),
            UnresolvedReason::TypeMismatch => {
                write!(f, "its operands do not match the types it expects")
            }
            UnresolvedReason::Undefined => write!(f, "its value is undefined"),
            UnresolvedReason::InvalidValue => {
                write!(f, "it is not a non-negative integer")
            }
            UnresolvedReason::TooLarge => write!(f, "it is too large to evaluate"),
        }
    }
}

impl Error for UnresolvedConstant {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.reason {
            UnresolvedReason::DependsOn(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

/// Why a constant could not be computed.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnresolvedReason {
    /// The id does not refer to a constant.
    NotAConstant,

    /// An operand could not be computed.
    DependsOn(Box<UnresolvedConstant>),

    /// The bytes given for a specialization constant do not have the size of its type.
    OverrideSizeMismatch {
        specialization_id: u32,
        expected: usize,
        provided: usize,
    },

    DivisionByZero,

    ShiftOutOfRange { shift: u64, width: u32 },

    /// An `OpSpecConstantOp` operation that is not evaluated.
    UnsupportedOperation { opcode: u16 },

    /// The types of the operands or the result do not fit the operation.
    TypeMismatch,

    /// `OpUndef`, or an undefined component of a vector shuffle.
    Undefined,

    /// An integer was needed, but the value is negative or not an integer.
    InvalidValue,

    /// An `OpConstantNull` composite that has too many members, counting nested ones.
    TooLarge,
}

/// Computes the value of every constant in `spirv`, replacing the defaults of specialization
/// constants with the values in `specialization_info`.
///
/// Constants are resolved in declaration order, so every operand has already been resolved by
/// the time it is needed. A constant that cannot be resolved does not prevent the others from
/// being resolved.
pub fn resolve_constants(
    spirv: &Spirv,
    specialization_info: &SpecializationInfo,
) -> ResolvedConstants {
    let mut resolved = ResolvedConstants::default();

    for (constant_id, _) in specialization_info.iter() {
        if spirv.specialization_constant(constant_id).is_none() {
            log::debug!("the module has no specialization constant with id {}", constant_id);
        }
    }

    for &id in spirv.constants() {
        let value = resolve_constant(spirv, &resolved, specialization_info, id)
            .map_err(|reason| UnresolvedConstant { id, reason });

        match &value {
            Ok(value) => log::trace!("constant {} = {:?}", id, value),
            Err(err) => log::trace!("{}", err),
        }

        resolved.values.insert(id, value);
    }

    resolved
}

fn resolve_constant(
    spirv: &Spirv,
    resolved: &ResolvedConstants,
    specialization_info: &SpecializationInfo,
    id: Id,
) -> Result<ConstantValue, UnresolvedReason> {
    let id_info = spirv.id(id).ok_or(UnresolvedReason::NotAConstant)?;

    let default = match *id_info.instruction() {
        Instruction::ConstantTrue { .. } => return Ok(ConstantValue::Bool(true)),
        Instruction::ConstantFalse { .. } => return Ok(ConstantValue::Bool(false)),
        Instruction::Constant {
            result_type_id,
            ref value,
            ..
        } => return literal_value(spirv, result_type_id, value),
        Instruction::ConstantNull { result_type_id, .. } => {
            let mut budget = MAX_NULL_VALUE_NODES;
            return null_value(spirv, resolved, result_type_id, &mut budget);
        }
        Instruction::ConstantComposite {
            result_type_id,
            ref constituents,
            ..
        }
        | Instruction::SpecConstantComposite {
            result_type_id,
            ref constituents,
            ..
        } => return composite_value(spirv, resolved, result_type_id, constituents),
        Instruction::SpecConstantOp {
            result_type_id,
            ref opcode,
            ..
        } => return evaluate(spirv, resolved, result_type_id, opcode),
        Instruction::SpecConstantTrue { result_type_id, .. } => {
            (result_type_id, ConstantValue::Bool(true))
        }
        Instruction::SpecConstantFalse { result_type_id, .. } => {
            (result_type_id, ConstantValue::Bool(false))
        }
        Instruction::SpecConstant {
            result_type_id,
            ref value,
            ..
        } => (result_type_id, literal_value(spirv, result_type_id, value)?),
        _ => return Err(UnresolvedReason::NotAConstant),
    };

    let (result_type_id, default) = default;

    let Some((specialization_id, bytes)) = id_info
        .specialization_id()
        .and_then(|specialization_id| {
            specialization_info
                .get(specialization_id)
                .map(|bytes| (specialization_id, bytes))
        })
    else {
        return Ok(default);
    };

    log::trace!(
        "specialization constant {} (SpecId {}) overridden with {:?}",
        id,
        specialization_id,
        bytes,
    );

    override_value(spirv, result_type_id, specialization_id, bytes)
}

/// The type of a scalar, or of the components of a vector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScalarType {
    Bool,
    Int { width: u32, signed: bool },
    Float { width: u32 },
}

impl ScalarType {
    fn of(spirv: &Spirv, type_id: Id) -> Result<Self, UnresolvedReason> {
        let instruction = spirv
            .id(type_id)
            .map(|id_info| id_info.instruction())
            .ok_or(UnresolvedReason::TypeMismatch)?;

        match *instruction {
            Instruction::TypeBool { .. } => Ok(Self::Bool),
            Instruction::TypeInt {
                width, signedness, ..
            } => Ok(Self::Int {
                width,
                signed: signedness != 0,
            }),
            Instruction::TypeFloat { width, .. } => Ok(Self::Float { width }),
            Instruction::TypeVector { component_type, .. } => Self::of(spirv, component_type),
            _ => Err(UnresolvedReason::TypeMismatch),
        }
    }
}

fn literal_value(
    spirv: &Spirv,
    type_id: Id,
    words: &[u32],
) -> Result<ConstantValue, UnresolvedReason> {
    let bits = words
        .iter()
        .rev()
        .fold(0u64, |bits, &word| (bits << 32) | u64::from(word));

    match ScalarType::of(spirv, type_id)? {
        ScalarType::Int { width, signed } => Ok(ConstantValue::Int {
            bits: mask(bits, width),
            width,
            signed,
        }),
        ScalarType::Float { width } => Ok(ConstantValue::Float {
            bits: mask(bits, width),
            width,
        }),
        ScalarType::Bool => Err(UnresolvedReason::TypeMismatch),
    }
}

fn override_value(
    spirv: &Spirv,
    type_id: Id,
    specialization_id: u32,
    bytes: &[u8],
) -> Result<ConstantValue, UnresolvedReason> {
    let scalar_type = ScalarType::of(spirv, type_id)?;
    let expected = match scalar_type {
        ScalarType::Bool => 4,
        ScalarType::Int { width, .. } | ScalarType::Float { width } => (width / 8) as usize,
    };

    if bytes.len() != expected {
        return Err(UnresolvedReason::OverrideSizeMismatch {
            specialization_id,
            expected,
            provided: bytes.len(),
        });
    }

    let bits = match bytes.len() {
        1 => u64::from(bytes[0]),
        2 => u64::from(bytemuck::pod_read_unaligned::<u16>(bytes)),
        4 => u64::from(bytemuck::pod_read_unaligned::<u32>(bytes)),
        8 => bytemuck::pod_read_unaligned::<u64>(bytes),
        _ => return Err(UnresolvedReason::TypeMismatch),
    };

    Ok(match scalar_type {
        ScalarType::Bool => ConstantValue::Bool(bits != 0),
        ScalarType::Int { width, signed } => ConstantValue::Int {
            bits,
            width,
            signed,
        },
        ScalarType::Float { width } => ConstantValue::Float { bits, width },
    })
}

/// Returns the zero value of `type_id`. Every scalar and composite that is built takes one node
/// from `budget`.
fn null_value(
    spirv: &Spirv,
    resolved: &ResolvedConstants,
    type_id: Id,
    budget: &mut u64,
) -> Result<ConstantValue, UnresolvedReason> {
    let instruction = spirv
        .id(type_id)
        .map(|id_info| id_info.instruction())
        .ok_or(UnresolvedReason::TypeMismatch)?;
    *budget = budget.checked_sub(1).ok_or(UnresolvedReason::TooLarge)?;

    let repeat = |member_type, count, budget: &mut u64| {
        null_composite(spirv, resolved, member_type, count, budget)
    };

    match *instruction {
        Instruction::TypeBool { .. } => Ok(ConstantValue::Bool(false)),
        Instruction::TypeInt {
            width, signedness, ..
        } => Ok(ConstantValue::Int {
            bits: 0,
            width,
            signed: signedness != 0,
        }),
        Instruction::TypeFloat { width, .. } => Ok(ConstantValue::Float { bits: 0, width }),
        Instruction::TypeVector {
            component_type,
            component_count,
            ..
        } => repeat(component_type, component_count.into(), budget),
        Instruction::TypeMatrix {
            column_type,
            column_count,
            ..
        } => repeat(column_type, column_count.into(), budget),
        Instruction::TypeArray {
            element_type,
            length,
            ..
        } => repeat(element_type, operand_u64(resolved, length)?, budget),
        Instruction::TypeStruct {
            ref member_types, ..
        } => member_types
            .iter()
            .map(|&member_type| null_value(spirv, resolved, member_type, budget))
            .collect::<Result<_, _>>()
            .map(ConstantValue::Composite),
        _ => Err(UnresolvedReason::TypeMismatch),
    }
}

fn null_composite(
    spirv: &Spirv,
    resolved: &ResolvedConstants,
    member_type: Id,
    count: u64,
    budget: &mut u64,
) -> Result<ConstantValue, UnresolvedReason> {
    if count == 0 {
        return Ok(ConstantValue::Composite(Vec::new()));
    }

    // Each copy of the member gets an equal share of what is left.
    let share = *budget / count;
    let mut member_budget = share;
    let member = null_value(spirv, resolved, member_type, &mut member_budget)?;
    *budget -= (share - member_budget) * count;

    Ok(ConstantValue::Composite(vec![member; count as usize]))
}

fn composite_value(
    spirv: &Spirv,
    resolved: &ResolvedConstants,
    type_id: Id,
    constituents: &[Id],
) -> Result<ConstantValue, UnresolvedReason> {
    let instruction = spirv
        .id(type_id)
        .map(|id_info| id_info.instruction())
        .ok_or(UnresolvedReason::TypeMismatch)?;

    let expected_len = match *instruction {
        Instruction::TypeVector {
            component_count, ..
        } => u64::from(component_count),
        Instruction::TypeMatrix { column_count, .. } => u64::from(column_count),
        Instruction::TypeArray { length, .. } => operand_u64(resolved, length)?,
        Instruction::TypeStruct {
            ref member_types, ..
        } => member_types.len() as u64,
        _ => return Err(UnresolvedReason::TypeMismatch),
    };

    if constituents.len() as u64 != expected_len {
        return Err(UnresolvedReason::TypeMismatch);
    }

    constituents
        .iter()
        .map(|&constituent| operand(resolved, constituent).cloned())
        .collect::<Result<_, _>>()
        .map(ConstantValue::Composite)
}

fn operand(resolved: &ResolvedConstants, id: Id) -> Result<&ConstantValue, UnresolvedReason> {
    resolved
        .get(id)
        .map_err(|err| UnresolvedReason::DependsOn(Box::new(err)))
}

fn operand_u64(resolved: &ResolvedConstants, id: Id) -> Result<u64, UnresolvedReason> {
    resolved
        .get_u64(id)
        .map_err(|err| UnresolvedReason::DependsOn(Box::new(err)))
}

fn evaluate(
    spirv: &Spirv,
    resolved: &ResolvedConstants,
    result_type_id: Id,
    instruction: &SpecConstantInstruction,
) -> Result<ConstantValue, UnresolvedReason> {
    match *instruction {
        SpecConstantInstruction::Unary { op, operand: a } => {
            let result_type = ScalarType::of(spirv, result_type_id)?;
            let a = operand(resolved, a)?;

            component_wise(a, &|a: &ConstantValue| unary(op, a, result_type))
        }
        SpecConstantInstruction::Binary {
            op,
            operand1,
            operand2,
        } => {
            let result_type = ScalarType::of(spirv, result_type_id)?;
            let a = operand(resolved, operand1)?;
            let b = operand(resolved, operand2)?;

            component_wise2(a, b, &|a: &ConstantValue, b: &ConstantValue| {
                binary(op, a, b, result_type)
            })
        }
        SpecConstantInstruction::Select {
            condition,
            object1,
            object2,
        } => {
            let condition = operand(resolved, condition)?;
            let object1 = operand(resolved, object1)?;
            let object2 = operand(resolved, object2)?;

            match (condition, object1, object2) {
                (&ConstantValue::Bool(condition), _, _) => {
                    Ok(if condition { object1 } else { object2 }.clone())
                }
                (
                    ConstantValue::Composite(conditions),
                    ConstantValue::Composite(objects1),
                    ConstantValue::Composite(objects2),
                ) if conditions.len() == objects1.len() && conditions.len() == objects2.len() => {
                    conditions
                        .iter()
                        .zip(objects1.iter().zip(objects2))
                        .map(|(condition, (object1, object2))| match *condition {
                            ConstantValue::Bool(true) => Ok(object1.clone()),
                            ConstantValue::Bool(false) => Ok(object2.clone()),
                            _ => Err(UnresolvedReason::TypeMismatch),
                        })
                        .collect::<Result<_, _>>()
                        .map(ConstantValue::Composite)
                }
                _ => Err(UnresolvedReason::TypeMismatch),
            }
        }
        SpecConstantInstruction::CompositeExtract {
            composite,
            ref indexes,
        } => indexes
            .iter()
            .try_fold(operand(resolved, composite)?, |value, &index| {
                value
                    .components()
                    .and_then(|components| components.get(index as usize))
                    .ok_or(UnresolvedReason::TypeMismatch)
            })
            .cloned(),
        SpecConstantInstruction::VectorShuffle {
            vector1,
            vector2,
            ref components,
        } => {
            let vector1 = operand(resolved, vector1)?;
            let vector2 = operand(resolved, vector2)?;
            let (Some(vector1), Some(vector2)) = (vector1.components(), vector2.components())
            else {
                return Err(UnresolvedReason::TypeMismatch);
            };

            components
                .iter()
                .map(|&component| {
                    if component == u32::MAX {
                        return Err(UnresolvedReason::Undefined);
                    }

                    vector1
                        .iter()
                        .chain(vector2)
                        .nth(component as usize)
                        .cloned()
                        .ok_or(UnresolvedReason::TypeMismatch)
                })
                .collect::<Result<_, _>>()
                .map(ConstantValue::Composite)
        }
        SpecConstantInstruction::Other { opcode, .. } => {
            Err(UnresolvedReason::UnsupportedOperation { opcode })
        }
    }
}

fn component_wise(
    a: &ConstantValue,
    f: &dyn Fn(&ConstantValue) -> Result<ConstantValue, UnresolvedReason>,
) -> Result<ConstantValue, UnresolvedReason> {
    match a {
        ConstantValue::Composite(a) => a
            .iter()
            .map(f)
            .collect::<Result<_, _>>()
            .map(ConstantValue::Composite),
        a => f(a),
    }
}

fn component_wise2(
    a: &ConstantValue,
    b: &ConstantValue,
    f: &dyn Fn(&ConstantValue, &ConstantValue) -> Result<ConstantValue, UnresolvedReason>,
) -> Result<ConstantValue, UnresolvedReason> {
    match (a, b) {
        (ConstantValue::Composite(a), ConstantValue::Composite(b)) if a.len() == b.len() => a
            .iter()
            .zip(b)
            .map(|(a, b)| f(a, b))
            .collect::<Result<_, _>>()
            .map(ConstantValue::Composite),
        (ConstantValue::Composite(_), _) | (_, ConstantValue::Composite(_)) => {
            Err(UnresolvedReason::TypeMismatch)
        }
        (a, b) => f(a, b),
    }
}

fn unary(
    op: UnaryOp,
    a: &ConstantValue,
    result_type: ScalarType,
) -> Result<ConstantValue, UnresolvedReason> {
    match (op, a, result_type) {
        (UnaryOp::LogicalNot, &ConstantValue::Bool(a), ScalarType::Bool) => {
            Ok(ConstantValue::Bool(!a))
        }
        (
            UnaryOp::SNegate | UnaryOp::Not | UnaryOp::UConvert | UnaryOp::SConvert,
            &ConstantValue::Int { bits, width, .. },
            ScalarType::Int {
                width: result_width,
                signed,
            },
        ) => {
            let bits = match op {
                UnaryOp::SNegate => bits.wrapping_neg(),
                UnaryOp::Not => !bits,
                UnaryOp::SConvert => sign_extend(bits, width) as u64,
                _ => bits,
            };

            Ok(ConstantValue::Int {
                bits: mask(bits, result_width),
                width: result_width,
                signed,
            })
        }
        _ => Err(UnresolvedReason::TypeMismatch),
    }
}

fn binary(
    op: BinaryOp,
    a: &ConstantValue,
    b: &ConstantValue,
    result_type: ScalarType,
) -> Result<ConstantValue, UnresolvedReason> {
    if op.is_logical() {
        let (&ConstantValue::Bool(a), &ConstantValue::Bool(b)) = (a, b) else {
            return Err(UnresolvedReason::TypeMismatch);
        };

        return Ok(ConstantValue::Bool(match op {
            BinaryOp::LogicalOr => a || b,
            BinaryOp::LogicalAnd => a && b,
            BinaryOp::LogicalEqual => a == b,
            _ => a != b,
        }));
    }

    let (
        &ConstantValue::Int {
            bits: ua,
            width: wa,
            ..
        },
        &ConstantValue::Int {
            bits: ub,
            width: wb,
            ..
        },
    ) = (a, b)
    else {
        return Err(UnresolvedReason::TypeMismatch);
    };
    let (sa, sb) = (sign_extend(ua, wa), sign_extend(ub, wb));

    if op.is_comparison() {
        return Ok(ConstantValue::Bool(match op {
            BinaryOp::IEqual => ua == ub,
            BinaryOp::INotEqual => ua != ub,
            BinaryOp::UGreaterThan => ua > ub,
            BinaryOp::SGreaterThan => sa > sb,
            BinaryOp::UGreaterThanEqual => ua >= ub,
            BinaryOp::SGreaterThanEqual => sa >= sb,
            BinaryOp::ULessThan => ua < ub,
            BinaryOp::SLessThan => sa < sb,
            BinaryOp::ULessThanEqual => ua <= ub,
            _ => sa <= sb,
        }));
    }

    let ScalarType::Int { width, signed } = result_type else {
        return Err(UnresolvedReason::TypeMismatch);
    };

    let check_divisor = || {
        if ub == 0 {
            Err(UnresolvedReason::DivisionByZero)
        } else {
            Ok(())
        }
    };
    let check_shift = || {
        if ub >= u64::from(width.min(64)) {
            Err(UnresolvedReason::ShiftOutOfRange { shift: ub, width })
        } else {
            Ok(())
        }
    };

    let bits = match op {
        BinaryOp::IAdd => ua.wrapping_add(ub),
        BinaryOp::ISub => ua.wrapping_sub(ub),
        BinaryOp::IMul => ua.wrapping_mul(ub),
        BinaryOp::UDiv => {
            check_divisor()?;
            ua / ub
        }
        BinaryOp::SDiv => {
            check_divisor()?;
            sa.wrapping_div(sb) as u64
        }
        BinaryOp::UMod => {
            check_divisor()?;
            ua % ub
        }
        BinaryOp::SRem => {
            check_divisor()?;
            sa.wrapping_rem(sb) as u64
        }
        BinaryOp::SMod => {
            check_divisor()?;
            let rem = sa.wrapping_rem(sb);

            // The sign of the result follows the divisor.
            if rem != 0 && (rem < 0) != (sb < 0) {
                rem.wrapping_add(sb) as u64
            } else {
                rem as u64
            }
        }
        BinaryOp::ShiftRightLogical => {
            check_shift()?;
            ua >> ub
        }
        BinaryOp::ShiftRightArithmetic => {
            check_shift()?;
            (sa >> ub) as u64
        }
        BinaryOp::ShiftLeftLogical => {
            check_shift()?;
            ua << ub
        }
        BinaryOp::BitwiseOr => ua | ub,
        BinaryOp::BitwiseXor => ua ^ ub,
        BinaryOp::BitwiseAnd => ua & ub,
        _ => return Err(UnresolvedReason::TypeMismatch),
    };

    Ok(ConstantValue::Int {
        bits: mask(bits, width),
        width,
        signed,
    })
}

#[inline]
fn mask(bits: u64, width: u32) -> u64 {
    if width >= 64 {
        bits
    } else {
        bits & ((1 << width) - 1)
    }
}

#[inline]
fn sign_extend(bits: u64, width: u32) -> i64 {
    if width == 0 || width >= 64 {
        bits as i64
    } else {
        let shift = 64 - width;
        ((bits << shift) as i64) >> shift
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{tests::ModuleBuilder, Version};

    const OP_S_NEGATE: u16 = 126;
    const OP_I_ADD: u16 = 128;
    const OP_I_MUL: u16 = 132;
    const OP_S_DIV: u16 = 135;
    const OP_S_MOD: u16 = 139;
    const OP_SHIFT_LEFT_LOGICAL: u16 = 196;
    const OP_I_EQUAL: u16 = 170;
    const OP_SELECT: u16 = 169;
    const OP_COMPOSITE_EXTRACT: u16 = 81;
    const OP_VECTOR_SHUFFLE: u16 = 79;
    const OP_F_ADD: u16 = 129;

    #[test]
    fn specialization_info_from_values() {
        let mut info = SpecializationInfo::new();
        info.insert(0, true);
        info.insert(1, 7u8);
        info.insert(2, -1i64);
        info.insert(3, f16::from_f32(1.5));

        assert_eq!(info.get(0), Some(&1u32.to_ne_bytes()[..]));
        assert_eq!(info.get(1), Some(&[7u8][..]));
        assert_eq!(info.get(2), Some(&(-1i64).to_ne_bytes()[..]));
        assert_eq!(info.get(3).map(|bytes| bytes.len()), Some(2));
        assert_eq!(info.get(4), None);
        assert_eq!(info.len(), 4);
    }

    #[test]
    fn specialization_info_from_map_entries() {
        let data: Vec<u8> = [300u32, 1]
            .iter()
            .flat_map(|value| value.to_ne_bytes())
            .collect();
        let entries = [
            SpecializationMapEntry {
                constant_id: 3,
                offset: 0,
                size: 4,
            },
            SpecializationMapEntry {
                constant_id: 4,
                offset: 4,
                size: 4,
            },
        ];

        let from_entries = SpecializationInfo::from_map_entries(&entries, &data).unwrap();
        let direct: SpecializationInfo = [(3, 300u32.into()), (4, 1u32.into())]
            .into_iter()
            .collect();
        assert_eq!(from_entries, direct);

        let out_of_range = [SpecializationMapEntry {
            constant_id: 5,
            offset: 6,
            size: 4,
        }];
        assert!(matches!(
            SpecializationInfo::from_map_entries(&out_of_range, &data),
            Err(SpecializationMapError::OutOfRange { constant_id: 5, .. }),
        ));

        let duplicate = [entries[0], entries[0]];
        assert_eq!(
            SpecializationInfo::from_map_entries(&duplicate, &data),
            Err(SpecializationMapError::DuplicateConstantId { constant_id: 3 }),
        );
    }

    #[test]
    fn defaults_and_overrides() {
        let mut asm = ModuleBuilder::compute(Version::V1_0);
        let uint = asm.type_int(32, false);
        let boolean = asm.type_bool();
        let plain = asm.constant_u32(uint, 5);
        let spec = asm.spec_constant_u32(uint, 7, Some(2));
        let flag = asm.spec_constant_bool(boolean, false, Some(3));
        let no_spec_id = asm.spec_constant_u32(uint, 11, None);
        let spirv = Spirv::new(&asm.assemble()).unwrap();

        let resolved = resolve_constants(&spirv, &SpecializationInfo::new());
        assert_eq!(resolved.get_u64(plain), Ok(5));
        assert_eq!(resolved.get_u64(spec), Ok(7));
        assert_eq!(resolved.get(flag).unwrap().as_bool(), Some(false));
        assert_eq!(resolved.get_u64(no_spec_id), Ok(11));

        let mut info = SpecializationInfo::new();
        info.insert(2, 9u32);
        info.insert(3, true);
        info.insert(4, 1000u32);
        let resolved = resolve_constants(&spirv, &info);
        assert_eq!(resolved.get_u64(plain), Ok(5));
        assert_eq!(resolved.get_u64(spec), Ok(9));
        assert_eq!(resolved.get(flag).unwrap().as_bool(), Some(true));
        assert_eq!(resolved.get_u64(no_spec_id), Ok(11));
        assert_eq!(resolved.unresolved().count(), 0);
    }

    #[test]
    fn override_size_mismatch() {
        let mut asm = ModuleBuilder::compute(Version::V1_0);
        let uint = asm.type_int(32, false);
        let spec = asm.spec_constant_u32(uint, 7, Some(2));
        let sum = asm.spec_constant_op(uint, OP_I_ADD, &[spec.as_raw(), spec.as_raw()]);
        let spirv = Spirv::new(&asm.assemble()).unwrap();

        let mut info = SpecializationInfo::new();
        info.insert(2, 9u8);
        let resolved = resolve_constants(&spirv, &info);

        assert_eq!(
            resolved.get(spec),
            Err(UnresolvedConstant {
                id: spec,
                reason: UnresolvedReason::OverrideSizeMismatch {
                    specialization_id: 2,
                    expected: 4,
                    provided: 1,
                },
            }),
        );

        let err = resolved.get(sum).unwrap_err();
        assert!(matches!(err.reason, UnresolvedReason::DependsOn(ref inner) if inner.id == spec));
        assert!(err.source().is_some());
    }

    #[test]
    fn conditional_size() {
        // SharedSize = Condition == 1 ? 1024 : 1
        let mut asm = ModuleBuilder::compute(Version::V1_0);
        let uint = asm.type_int(32, false);
        let boolean = asm.type_bool();
        let one = asm.constant_u32(uint, 1);
        let condition = asm.spec_constant_u32(uint, 0, Some(0));
        let shared_size = asm.spec_constant_u32(uint, 1024, Some(1));
        let equal = asm.spec_constant_op(boolean, OP_I_EQUAL, &[condition.as_raw(), one.as_raw()]);
        let size = asm.spec_constant_op(
            uint,
            OP_SELECT,
            &[equal.as_raw(), shared_size.as_raw(), one.as_raw()],
        );
        let spirv = Spirv::new(&asm.assemble()).unwrap();

        let resolved = resolve_constants(&spirv, &SpecializationInfo::new());
        assert_eq!(resolved.get_u64(size), Ok(1));

        let info: SpecializationInfo = [(0, 1u32.into())].into_iter().collect();
        let resolved = resolve_constants(&spirv, &info);
        assert_eq!(resolved.get_u64(size), Ok(1024));
    }

    #[test]
    fn signed_arithmetic() {
        let mut asm = ModuleBuilder::compute(Version::V1_0);
        let int = asm.type_int(32, true);
        let minus_seven = asm.constant_u32(int, (-7i32) as u32);
        let three = asm.constant_u32(int, 3);
        let zero = asm.constant_u32(int, 0);
        let quotient = asm.spec_constant_op(int, OP_S_DIV, &[minus_seven.as_raw(), three.as_raw()]);
        let modulo = asm.spec_constant_op(int, OP_S_MOD, &[minus_seven.as_raw(), three.as_raw()]);
        let negated = asm.spec_constant_op(int, OP_S_NEGATE, &[minus_seven.as_raw()]);
        let by_zero = asm.spec_constant_op(int, OP_S_DIV, &[three.as_raw(), zero.as_raw()]);
        let spirv = Spirv::new(&asm.assemble()).unwrap();

        let resolved = resolve_constants(&spirv, &SpecializationInfo::new());
        assert_eq!(resolved.get(quotient).unwrap().as_i64(), Some(-2));
        assert_eq!(resolved.get(modulo).unwrap().as_i64(), Some(2));
        assert_eq!(resolved.get(negated).unwrap().as_i64(), Some(7));
        assert_eq!(resolved.get(minus_seven).unwrap().as_u64(), None);
        assert_eq!(
            resolved.get(by_zero).unwrap_err().reason,
            UnresolvedReason::DivisionByZero,
        );
    }

    #[test]
    fn shifts_and_wrapping() {
        let mut asm = ModuleBuilder::compute(Version::V1_0);
        let uint = asm.type_int(32, false);
        let one = asm.constant_u32(uint, 1);
        let big = asm.constant_u32(uint, 0x8000_0000);
        let thirty_two = asm.constant_u32(uint, 32);
        let four = asm.constant_u32(uint, 4);
        let shifted = asm.spec_constant_op(uint, OP_SHIFT_LEFT_LOGICAL, &[one.as_raw(), four.as_raw()]);
        let too_far =
            asm.spec_constant_op(uint, OP_SHIFT_LEFT_LOGICAL, &[one.as_raw(), thirty_two.as_raw()]);
        let wrapped = asm.spec_constant_op(uint, OP_I_MUL, &[big.as_raw(), four.as_raw()]);
        let spirv = Spirv::new(&asm.assemble()).unwrap();

        let resolved = resolve_constants(&spirv, &SpecializationInfo::new());
        assert_eq!(resolved.get_u64(shifted), Ok(16));
        assert_eq!(resolved.get_u64(wrapped), Ok(0));
        assert_eq!(
            resolved.get(too_far).unwrap_err().reason,
            UnresolvedReason::ShiftOutOfRange {
                shift: 32,
                width: 32,
            },
        );
    }

    #[test]
    fn composites() {
        let mut asm = ModuleBuilder::compute(Version::V1_0);
        let uint = asm.type_int(32, false);
        let uvec3 = asm.type_vector(uint, 3);
        let uvec2 = asm.type_vector(uint, 2);
        let x = asm.spec_constant_u32(uint, 4, Some(10));
        let y = asm.constant_u32(uint, 5);
        let z = asm.constant_u32(uint, 6);
        let vector = asm.spec_constant_composite(uvec3, &[x, y, z]);
        let extracted = asm.spec_constant_op(uint, OP_COMPOSITE_EXTRACT, &[vector.as_raw(), 0]);
        let shuffled = asm.spec_constant_op(
            uvec2,
            OP_VECTOR_SHUFFLE,
            &[vector.as_raw(), vector.as_raw(), 5, 1],
        );
        let sums = asm.spec_constant_op(uvec3, OP_I_ADD, &[vector.as_raw(), vector.as_raw()]);
        let short = asm.constant_composite(uvec3, &[y, z]);
        let null = asm.constant_null(uvec2);
        let spirv = Spirv::new(&asm.assemble()).unwrap();

        let info: SpecializationInfo = [(10, 40u32.into())].into_iter().collect();
        let resolved = resolve_constants(&spirv, &info);
        assert_eq!(resolved.get_u64(extracted), Ok(40));

        let components = |id| -> Vec<u64> {
            resolved
                .get(id)
                .unwrap()
                .components()
                .unwrap()
                .iter()
                .map(|component| component.as_u64().unwrap())
                .collect()
        };
        assert_eq!(components(shuffled), [6, 5]);
        assert_eq!(components(sums), [80, 10, 12]);
        assert_eq!(components(null), [0, 0]);
        assert_eq!(
            resolved.get(short).unwrap_err().reason,
            UnresolvedReason::TypeMismatch,
        );
    }

    #[test]
    fn nested_null_arrays() {
        let mut asm = ModuleBuilder::compute(Version::V1_0);
        let uint = asm.type_int(32, false);
        let row = asm.array_of(uint, 256);
        let small = asm.array_of(row, 16);
        let large = asm.array_of(row, 65536);
        let huge = asm.array_of(large, 65536);
        let small_null = asm.constant_null(small);
        let large_null = asm.constant_null(large);
        let huge_null = asm.constant_null(huge);
        let spirv = Spirv::new(&asm.assemble()).unwrap();

        let resolved = resolve_constants(&spirv, &SpecializationInfo::new());
        let rows = resolved.get(small_null).unwrap().components().unwrap();
        assert_eq!(rows.len(), 16);
        assert!(rows
            .iter()
            .all(|row| row.components().is_some_and(|row| row.len() == 256)));

        for id in [large_null, huge_null] {
            assert_eq!(
                resolved.get(id).unwrap_err().reason,
                UnresolvedReason::TooLarge,
            );
        }
    }

    #[test]
    fn unsupported_operation() {
        let mut asm = ModuleBuilder::compute(Version::V1_0);
        let float = asm.type_float(32);
        let one = asm.constant_u32(float, 1.0f32.to_bits());
        let sum = asm.spec_constant_op(float, OP_F_ADD, &[one.as_raw(), one.as_raw()]);
        let spirv = Spirv::new(&asm.assemble()).unwrap();

        let resolved = resolve_constants(&spirv, &SpecializationInfo::new());
        assert_eq!(resolved.get(one).unwrap().as_f64(), Some(1.0));
        assert_eq!(
            resolved.get(sum).unwrap_err().reason,
            UnresolvedReason::UnsupportedOperation { opcode: OP_F_ADD },
        );
        assert_eq!(
            resolved.get(Id::new(9999)).unwrap_err().reason,
            UnresolvedReason::NotAConstant,
        );
    }
}
