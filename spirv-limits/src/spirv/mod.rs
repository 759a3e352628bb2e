// Copyright (c) 2021 The vulkano developers
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or https://opensource.org/licenses/MIT>,
// at your option. All files in the project carrying such
// notice may not be copied, modified, or distributed except
// according to those terms.

//! Parsing and analysis utilities for SPIR-V shader binaries.
//!
//! This can be used to inspect and validate a SPIR-V module at runtime. The `Spirv` type does
//! some validation, but you should not assume that code that is read successfully is valid.
//!
//! Only the module-level part of the module is decoded into [`Instruction`]s: the debug names,
//! annotations, types, constants and global variables. Function bodies are skipped by word
//! count.

pub use self::enums::{BuiltIn, Capability, Decoration, ExecutionMode, ExecutionModel, StorageClass};
use crate::Version;
use foldhash::{HashMap, HashSet};
use smallvec::SmallVec;
use std::{
    error::Error,
    fmt::{Display, Error as FmtError, Formatter},
    string::FromUtf8Error,
};

mod enums;
pub mod specialization;

pub(crate) const MAGIC: u32 = 0x07230203;
const HEADER_WORDS: usize = 5;

/// A parsed and analyzed SPIR-V module.
#[derive(Clone, Debug)]
pub struct Spirv {
    version: Version,
    bound: u32,
    ids: HashMap<Id, IdInfo>,

    // Module-level items, in the order of the logical layout of a module
    capabilities: Vec<Capability>,
    extensions: Vec<String>,
    entry_points: Vec<EntryPoint>,
    execution_modes: HashMap<Id, SmallVec<[ExecutionMode; 2]>>,
    constants: Vec<Id>,
    global_variables: Vec<Id>,
    specialization_ids: HashMap<u32, Id>,
}

impl Spirv {
    /// Parses a SPIR-V document from a list of words.
    pub fn new(words: &[u32]) -> Result<Spirv, SpirvError> {
        if words.len() < HEADER_WORDS || words[0] != MAGIC {
            return Err(SpirvError::InvalidHeader);
        }

        let version = Version::from_spirv_word(words[1]);
        let bound = words[3];

        let mut builder = TableBuilder::new(bound);
        let mut rest = &words[HEADER_WORDS..];
        let mut instruction_index = 0;

        while let Some(&first) = rest.first() {
            let word_count = (first >> 16) as usize;
            let opcode = (first & 0xffff) as u16;

            if word_count == 0 {
                return Err(ParseError {
                    instruction: instruction_index,
                    word: 0,
                    error: ParseErrors::ZeroWordCount,
                    words: vec![first],
                }
                .into());
            }

            if rest.len() < word_count {
                return Err(ParseError {
                    instruction: instruction_index,
                    word: rest.len(),
                    error: ParseErrors::UnexpectedEOF,
                    words: rest.to_owned(),
                }
                .into());
            }

            let instruction = if builder.in_function && opcode != OP_FUNCTION_END {
                Instruction::Unknown { opcode }
            } else {
                let mut reader = InstructionReader::new(&rest[1..word_count], instruction_index);
                let instruction = Instruction::parse(opcode, &mut reader)?;

                if !reader.is_empty() {
                    return Err(reader.map_err(ParseErrors::LeftoverOperands).into());
                }

                instruction
            };

            builder.add(instruction_index, instruction)?;
            rest = &rest[word_count..];
            instruction_index += 1;
        }

        let spirv = builder.finish(version)?;

        log::debug!(
            "indexed SPIR-V {} module: {} instructions, {} ids, {} constants, {} global variables, \
            {} entry points",
            spirv.version,
            instruction_index,
            spirv.ids.len(),
            spirv.constants.len(),
            spirv.global_variables.len(),
            spirv.entry_points.len(),
        );

        Ok(spirv)
    }

    /// Returns the SPIR-V version that the module is compiled for.
    #[inline]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns the upper bound of `Id`s. All `Id`s should have a numeric value strictly less than
    /// this value.
    #[inline]
    pub fn bound(&self) -> u32 {
        self.bound
    }

    /// Returns information about an `Id`, or `None` if it is not declared by the module-level
    /// part of the module.
    #[inline]
    pub fn id(&self, id: Id) -> Option<&IdInfo> {
        self.ids.get(&id)
    }

    /// Returns the capabilities declared by the module, without duplicates, in declaration
    /// order.
    #[inline]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Returns the SPIR-V extensions declared by the module, without duplicates, in declaration
    /// order.
    #[inline]
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Returns the entry points of the module.
    #[inline]
    pub fn entry_points(&self) -> &[EntryPoint] {
        &self.entry_points
    }

    /// Returns the execution modes that apply to the given entry point function.
    #[inline]
    pub fn execution_modes(&self, entry_point: Id) -> &[ExecutionMode] {
        self.execution_modes
            .get(&entry_point)
            .map_or(&[], |modes| modes.as_slice())
    }

    /// Returns the ids of all constants and specialization constants, in declaration order.
    #[inline]
    pub fn constants(&self) -> &[Id] {
        &self.constants
    }

    /// Returns the ids of all variables declared outside of a function, in declaration order.
    #[inline]
    pub fn global_variables(&self) -> &[Id] {
        &self.global_variables
    }

    /// Returns the specialization constant that is decorated with the given `SpecId`.
    #[inline]
    pub fn specialization_constant(&self, specialization_id: u32) -> Option<Id> {
        self.specialization_ids.get(&specialization_id).copied()
    }
}

/// Collects the tables of a `Spirv` while the instructions are being read.
struct TableBuilder {
    bound: u32,
    in_function: bool,
    declarations: HashMap<Id, (usize, Instruction)>,
    forward_pointers: HashSet<Id>,
    names: HashMap<Id, String>,
    member_names: HashMap<(Id, u32), String>,
    decorations: HashMap<Id, SmallVec<[Decoration; 2]>>,
    member_decorations: HashMap<(Id, u32), SmallVec<[Decoration; 2]>>,
    capabilities: Vec<Capability>,
    extensions: Vec<String>,
    entry_points: Vec<(usize, EntryPoint)>,
    execution_modes: Vec<(usize, Id, ExecutionMode)>,
    constants: Vec<Id>,
    global_variables: Vec<Id>,
}

impl TableBuilder {
    fn new(bound: u32) -> Self {
        TableBuilder {
            bound,
            in_function: false,
            declarations: HashMap::default(),
            forward_pointers: HashSet::default(),
            names: HashMap::default(),
            member_names: HashMap::default(),
            decorations: HashMap::default(),
            member_decorations: HashMap::default(),
            capabilities: Vec::new(),
            extensions: Vec::new(),
            entry_points: Vec::new(),
            execution_modes: Vec::new(),
            constants: Vec::new(),
            global_variables: Vec::new(),
        }
    }

    fn check_bound(&self, id: Id, instruction: usize) -> Result<(), SpirvError> {
        if id.0 >= self.bound {
            return Err(SpirvError::IdOutOfBounds {
                id,
                instruction,
                bound: self.bound,
            });
        }

        Ok(())
    }

    fn is_declared(&self, id: Id) -> bool {
        self.declarations.contains_key(&id) || self.forward_pointers.contains(&id)
    }

    fn add(&mut self, index: usize, instruction: Instruction) -> Result<(), SpirvError> {
        match instruction {
            Instruction::Unknown { .. } => return Ok(()),
            Instruction::Function { .. } => self.in_function = true,
            Instruction::FunctionEnd => {
                self.in_function = false;
                return Ok(());
            }
            _ => (),
        }

        match &instruction {
            Instruction::Name { target, name } => {
                self.check_bound(*target, index)?;
                self.names.insert(*target, name.clone());
            }
            Instruction::MemberName { ty, member, name } => {
                self.check_bound(*ty, index)?;
                self.member_names.insert((*ty, *member), name.clone());
            }
            Instruction::Extension { name } => {
                if !self.extensions.contains(name) {
                    self.extensions.push(name.clone());
                }
            }
            &Instruction::Capability { capability } => {
                if !self.capabilities.contains(&capability) {
                    self.capabilities.push(capability);
                }
            }
            Instruction::EntryPoint {
                execution_model,
                entry_point,
                name,
                interface,
            } => {
                self.check_bound(*entry_point, index)?;

                for &id in interface {
                    self.check_bound(id, index)?;
                }

                self.entry_points.push((
                    index,
                    EntryPoint {
                        execution_model: *execution_model,
                        function: *entry_point,
                        name: name.clone(),
                        interface: interface.clone(),
                    },
                ));
            }
            &Instruction::ExecutionMode { entry_point, mode }
            | &Instruction::ExecutionModeId { entry_point, mode } => {
                self.check_bound(entry_point, index)?;

                for id in mode.operand_ids().into_iter().flatten() {
                    self.check_bound(id, index)?;
                }

                self.execution_modes.push((index, entry_point, mode));
            }
            &Instruction::Decorate { target, decoration } => {
                self.check_bound(target, index)?;
                self.decorations.entry(target).or_default().push(decoration);
            }
            &Instruction::MemberDecorate {
                structure_type,
                member,
                decoration,
            } => {
                self.check_bound(structure_type, index)?;
                self.member_decorations
                    .entry((structure_type, member))
                    .or_default()
                    .push(decoration);
            }
            &Instruction::TypeForwardPointer { pointer_type, .. } => {
                self.check_bound(pointer_type, index)?;
                self.forward_pointers.insert(pointer_type);
            }
            _ => (),
        }

        let Some(result_id) = instruction.result_id() else {
            return Ok(());
        };

        if result_id.0 == 0 {
            return Err(SpirvError::IdOutOfBounds {
                id: result_id,
                instruction: index,
                bound: self.bound,
            });
        }

        self.check_bound(result_id, index)?;

        for id in instruction.operand_ids() {
            if !self.is_declared(id) {
                return Err(SpirvError::UndeclaredId {
                    id,
                    instruction: index,
                });
            }
        }

        if let Some(&(first_instruction, _)) = self.declarations.get(&result_id) {
            return Err(SpirvError::DuplicateId {
                id: result_id,
                first_instruction,
                second_instruction: index,
            });
        }

        if instruction.is_constant() {
            self.constants.push(result_id);
        } else if matches!(instruction, Instruction::Variable { .. }) && !self.in_function {
            self.global_variables.push(result_id);
        }

        self.declarations.insert(result_id, (index, instruction));

        Ok(())
    }

    fn finish(mut self, version: Version) -> Result<Spirv, SpirvError> {
        for (index, entry_point) in &self.entry_points {
            let is_function = matches!(
                self.declarations.get(&entry_point.function),
                Some((_, Instruction::Function { .. })),
            );

            if !is_function {
                return Err(SpirvError::UndeclaredId {
                    id: entry_point.function,
                    instruction: *index,
                });
            }

            if let Some(&id) = entry_point
                .interface
                .iter()
                .find(|id| !self.declarations.contains_key(id))
            {
                return Err(SpirvError::UndeclaredId {
                    id,
                    instruction: *index,
                });
            }
        }

        let mut execution_modes: HashMap<Id, SmallVec<[ExecutionMode; 2]>> = HashMap::default();

        for (index, entry_point, mode) in self.execution_modes {
            for id in std::iter::once(entry_point).chain(mode.operand_ids().into_iter().flatten()) {
                if !self.declarations.contains_key(&id) {
                    return Err(SpirvError::UndeclaredId {
                        id,
                        instruction: index,
                    });
                }
            }

            execution_modes.entry(entry_point).or_default().push(mode);
        }

        let mut specialization_ids: HashMap<u32, Id> = HashMap::default();

        for &id in &self.constants {
            let spec_id = self.decorations.get(&id).and_then(|decorations| {
                decorations.iter().find_map(|decoration| match *decoration {
                    Decoration::SpecId {
                        specialization_constant_id,
                    } => Some(specialization_constant_id),
                    _ => None,
                })
            });

            if let Some(specialization_id) = spec_id {
                if let Some(&first) = specialization_ids.get(&specialization_id) {
                    return Err(SpirvError::DuplicateSpecId {
                        specialization_id,
                        first,
                        second: id,
                    });
                }

                specialization_ids.insert(specialization_id, id);
            }
        }

        let ids = self
            .declarations
            .drain()
            .map(|(id, (_, instruction))| {
                let members = match &instruction {
                    Instruction::TypeStruct { member_types, .. } => (0..member_types.len() as u32)
                        .map(|member| StructMemberInfo {
                            name: self.member_names.remove(&(id, member)),
                            decorations: self
                                .member_decorations
                                .remove(&(id, member))
                                .unwrap_or_default(),
                        })
                        .collect(),
                    _ => Vec::new(),
                };

                let info = IdInfo {
                    instruction,
                    name: self.names.remove(&id),
                    decorations: self.decorations.remove(&id).unwrap_or_default(),
                    members,
                };

                (id, info)
            })
            .collect();

        Ok(Spirv {
            version,
            bound: self.bound,
            ids,
            capabilities: self.capabilities,
            extensions: self.extensions,
            entry_points: self
                .entry_points
                .into_iter()
                .map(|(_, entry_point)| entry_point)
                .collect(),
            execution_modes,
            constants: self.constants,
            global_variables: self.global_variables,
            specialization_ids,
        })
    }
}

/// Used in SPIR-V to refer to the result of another instruction.
///
/// Ids are global across a module, and are always assigned by exactly one instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Id(u32);

impl Id {
    /// Constructs an `Id` from its numeric value.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Id(id)
    }

    /// Returns the raw numeric value of this `Id`.
    #[inline]
    pub const fn as_raw(self) -> u32 {
        self.0
    }
}

impl From<Id> for u32 {
    #[inline]
    fn from(id: Id) -> u32 {
        id.as_raw()
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(f, "%{}", self.0)
    }
}

/// Information associated with an `Id`.
#[derive(Clone, Debug)]
pub struct IdInfo {
    instruction: Instruction,
    name: Option<String>,
    decorations: SmallVec<[Decoration; 2]>,
    members: Vec<StructMemberInfo>,
}

impl IdInfo {
    /// Returns the instruction that defines this `Id` with a `result_id` operand.
    #[inline]
    pub fn instruction(&self) -> &Instruction {
        &self.instruction
    }

    /// Returns the debug name given to this `Id` with `OpName`.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the decorations applied to this `Id`.
    #[inline]
    pub fn decorations(&self) -> &[Decoration] {
        &self.decorations
    }

    /// If this `Id` refers to a struct type, returns information about each member of the
    /// struct. Empty otherwise.
    #[inline]
    pub fn members(&self) -> &[StructMemberInfo] {
        &self.members
    }

    /// Returns the value of the `ArrayStride` decoration, if present.
    pub fn array_stride(&self) -> Option<u32> {
        self.decorations.iter().find_map(|decoration| match *decoration {
            Decoration::ArrayStride { array_stride } => Some(array_stride),
            _ => None,
        })
    }

    /// Returns the `SpecId` decoration, if present.
    pub fn specialization_id(&self) -> Option<u32> {
        self.decorations.iter().find_map(|decoration| match *decoration {
            Decoration::SpecId {
                specialization_constant_id,
            } => Some(specialization_constant_id),
            _ => None,
        })
    }

    /// Returns the `BuiltIn` decoration, if present.
    pub fn built_in(&self) -> Option<BuiltIn> {
        self.decorations.iter().find_map(|decoration| match *decoration {
            Decoration::BuiltIn { built_in } => Some(built_in),
            _ => None,
        })
    }
}

/// Information associated with a member of a struct type.
#[derive(Clone, Debug)]
pub struct StructMemberInfo {
    name: Option<String>,
    decorations: SmallVec<[Decoration; 2]>,
}

impl StructMemberInfo {
    /// Returns the debug name given to this member with `OpMemberName`.
    #[inline]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the decorations applied to this member.
    #[inline]
    pub fn decorations(&self) -> &[Decoration] {
        &self.decorations
    }

    /// Returns the value of the `Offset` decoration, if present.
    pub fn offset(&self) -> Option<u32> {
        self.decorations.iter().find_map(|decoration| match *decoration {
            Decoration::Offset { byte_offset } => Some(byte_offset),
            _ => None,
        })
    }

    /// Returns the value of the `MatrixStride` decoration, if present.
    pub fn matrix_stride(&self) -> Option<u32> {
        self.decorations.iter().find_map(|decoration| match *decoration {
            Decoration::MatrixStride { matrix_stride } => Some(matrix_stride),
            _ => None,
        })
    }
}

/// An entry point declared with `OpEntryPoint`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryPoint {
    pub execution_model: ExecutionModel,
    pub function: Id,
    pub name: String,
    pub interface: Vec<Id>,
}

pub(crate) const OP_UNDEF: u16 = 1;
pub(crate) const OP_NAME: u16 = 5;
pub(crate) const OP_MEMBER_NAME: u16 = 6;
pub(crate) const OP_EXTENSION: u16 = 10;
pub(crate) const OP_EXT_INST_IMPORT: u16 = 11;
pub(crate) const OP_MEMORY_MODEL: u16 = 14;
pub(crate) const OP_ENTRY_POINT: u16 = 15;
pub(crate) const OP_EXECUTION_MODE: u16 = 16;
pub(crate) const OP_CAPABILITY: u16 = 17;
pub(crate) const OP_TYPE_VOID: u16 = 19;
pub(crate) const OP_TYPE_BOOL: u16 = 20;
pub(crate) const OP_TYPE_INT: u16 = 21;
pub(crate) const OP_TYPE_FLOAT: u16 = 22;
pub(crate) const OP_TYPE_VECTOR: u16 = 23;
pub(crate) const OP_TYPE_MATRIX: u16 = 24;
pub(crate) const OP_TYPE_IMAGE: u16 = 25;
pub(crate) const OP_TYPE_SAMPLER: u16 = 26;
pub(crate) const OP_TYPE_SAMPLED_IMAGE: u16 = 27;
pub(crate) const OP_TYPE_ARRAY: u16 = 28;
pub(crate) const OP_TYPE_RUNTIME_ARRAY: u16 = 29;
pub(crate) const OP_TYPE_STRUCT: u16 = 30;
pub(crate) const OP_TYPE_OPAQUE: u16 = 31;
pub(crate) const OP_TYPE_POINTER: u16 = 32;
pub(crate) const OP_TYPE_FUNCTION: u16 = 33;
pub(crate) const OP_TYPE_FORWARD_POINTER: u16 = 39;
pub(crate) const OP_CONSTANT_TRUE: u16 = 41;
pub(crate) const OP_CONSTANT_FALSE: u16 = 42;
pub(crate) const OP_CONSTANT: u16 = 43;
pub(crate) const OP_CONSTANT_COMPOSITE: u16 = 44;
pub(crate) const OP_CONSTANT_NULL: u16 = 46;
pub(crate) const OP_SPEC_CONSTANT_TRUE: u16 = 48;
pub(crate) const OP_SPEC_CONSTANT_FALSE: u16 = 49;
pub(crate) const OP_SPEC_CONSTANT: u16 = 50;
pub(crate) const OP_SPEC_CONSTANT_COMPOSITE: u16 = 51;
pub(crate) const OP_SPEC_CONSTANT_OP: u16 = 52;
pub(crate) const OP_FUNCTION: u16 = 54;
pub(crate) const OP_FUNCTION_END: u16 = 56;
pub(crate) const OP_VARIABLE: u16 = 59;
pub(crate) const OP_DECORATE: u16 = 71;
pub(crate) const OP_MEMBER_DECORATE: u16 = 72;
pub(crate) const OP_EXECUTION_MODE_ID: u16 = 331;
pub(crate) const OP_TYPE_RAY_QUERY_KHR: u16 = 4472;
pub(crate) const OP_TYPE_ACCELERATION_STRUCTURE_KHR: u16 = 5341;

/// A module-level SPIR-V instruction.
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    /// An instruction that is not decoded. Its operands are skipped.
    Unknown {
        opcode: u16,
    },
    Undef {
        result_type_id: Id,
        result_id: Id,
    },
    Name {
        target: Id,
        name: String,
    },
    MemberName {
        ty: Id,
        member: u32,
        name: String,
    },
    Extension {
        name: String,
    },
    ExtInstImport {
        result_id: Id,
        name: String,
    },
    MemoryModel {
        addressing_model: u32,
        memory_model: u32,
    },
    EntryPoint {
        execution_model: ExecutionModel,
        entry_point: Id,
        name: String,
        interface: Vec<Id>,
    },
    ExecutionMode {
        entry_point: Id,
        mode: ExecutionMode,
    },
    ExecutionModeId {
        entry_point: Id,
        mode: ExecutionMode,
    },
    Capability {
        capability: Capability,
    },
    TypeVoid {
        result_id: Id,
    },
    TypeBool {
        result_id: Id,
    },
    TypeInt {
        result_id: Id,
        width: u32,
        signedness: u32,
    },
    TypeFloat {
        result_id: Id,
        width: u32,
    },
    TypeVector {
        result_id: Id,
        component_type: Id,
        component_count: u32,
    },
    TypeMatrix {
        result_id: Id,
        column_type: Id,
        column_count: u32,
    },
    TypeImage {
        result_id: Id,
        sampled_type: Id,
    },
    TypeSampler {
        result_id: Id,
    },
    TypeSampledImage {
        result_id: Id,
        image_type: Id,
    },
    TypeArray {
        result_id: Id,
        element_type: Id,
        length: Id,
    },
    TypeRuntimeArray {
        result_id: Id,
        element_type: Id,
    },
    TypeStruct {
        result_id: Id,
        member_types: Vec<Id>,
    },
    /// An opaque type that has no size, such as `OpTypeOpaque` or `OpTypeRayQueryKHR`.
    TypeOpaque {
        opcode: u16,
        result_id: Id,
    },
    TypePointer {
        result_id: Id,
        storage_class: StorageClass,
        ty: Id,
    },
    TypeFunction {
        result_id: Id,
        return_type: Id,
        parameter_types: Vec<Id>,
    },
    TypeForwardPointer {
        pointer_type: Id,
        storage_class: StorageClass,
    },
    ConstantTrue {
        result_type_id: Id,
        result_id: Id,
    },
    ConstantFalse {
        result_type_id: Id,
        result_id: Id,
    },
    Constant {
        result_type_id: Id,
        result_id: Id,
        value: SmallVec<[u32; 2]>,
    },
    ConstantComposite {
        result_type_id: Id,
        result_id: Id,
        constituents: Vec<Id>,
    },
    ConstantNull {
        result_type_id: Id,
        result_id: Id,
    },
    SpecConstantTrue {
        result_type_id: Id,
        result_id: Id,
    },
    SpecConstantFalse {
        result_type_id: Id,
        result_id: Id,
    },
    SpecConstant {
        result_type_id: Id,
        result_id: Id,
        value: SmallVec<[u32; 2]>,
    },
    SpecConstantComposite {
        result_type_id: Id,
        result_id: Id,
        constituents: Vec<Id>,
    },
    SpecConstantOp {
        result_type_id: Id,
        result_id: Id,
        opcode: SpecConstantInstruction,
    },
    Function {
        result_type_id: Id,
        result_id: Id,
        function_control: u32,
        function_type: Id,
    },
    FunctionEnd,
    Variable {
        result_type_id: Id,
        result_id: Id,
        storage_class: StorageClass,
        initializer: Option<Id>,
    },
    Decorate {
        target: Id,
        decoration: Decoration,
    },
    MemberDecorate {
        structure_type: Id,
        member: u32,
        decoration: Decoration,
    },
}

impl Instruction {
    fn parse(opcode: u16, reader: &mut InstructionReader<'_>) -> Result<Self, ParseError> {
        Ok(match opcode {
            OP_UNDEF => Self::Undef {
                result_type_id: reader.next_id()?,
                result_id: reader.next_id()?,
            },
            OP_NAME => Self::Name {
                target: reader.next_id()?,
                name: reader.next_string()?,
            },
            OP_MEMBER_NAME => Self::MemberName {
                ty: reader.next_id()?,
                member: reader.next_u32()?,
                name: reader.next_string()?,
            },
            OP_EXTENSION => Self::Extension {
                name: reader.next_string()?,
            },
            OP_EXT_INST_IMPORT => Self::ExtInstImport {
                result_id: reader.next_id()?,
                name: reader.next_string()?,
            },
            OP_MEMORY_MODEL => Self::MemoryModel {
                addressing_model: reader.next_u32()?,
                memory_model: reader.next_u32()?,
            },
            OP_ENTRY_POINT => Self::EntryPoint {
                execution_model: ExecutionModel::parse(reader)?,
                entry_point: reader.next_id()?,
                name: reader.next_string()?,
                interface: reader.remainder().into_iter().map(Id).collect(),
            },
            OP_EXECUTION_MODE => Self::ExecutionMode {
                entry_point: reader.next_id()?,
                mode: ExecutionMode::parse(reader)?,
            },
            OP_EXECUTION_MODE_ID => Self::ExecutionModeId {
                entry_point: reader.next_id()?,
                mode: ExecutionMode::parse(reader)?,
            },
            OP_CAPABILITY => Self::Capability {
                capability: Capability::parse(reader)?,
            },
            OP_TYPE_VOID => Self::TypeVoid {
                result_id: reader.next_id()?,
            },
            OP_TYPE_BOOL => Self::TypeBool {
                result_id: reader.next_id()?,
            },
            OP_TYPE_INT => Self::TypeInt {
                result_id: reader.next_id()?,
                width: reader.next_u32()?,
                signedness: reader.next_u32()?,
            },
            OP_TYPE_FLOAT => {
                let result_id = reader.next_id()?;
                let width = reader.next_u32()?;
                // Optional floating point encoding.
                reader.skip_remainder();

                Self::TypeFloat { result_id, width }
            }
            OP_TYPE_VECTOR => Self::TypeVector {
                result_id: reader.next_id()?,
                component_type: reader.next_id()?,
                component_count: reader.next_u32()?,
            },
            OP_TYPE_MATRIX => Self::TypeMatrix {
                result_id: reader.next_id()?,
                column_type: reader.next_id()?,
                column_count: reader.next_u32()?,
            },
            OP_TYPE_IMAGE => {
                let result_id = reader.next_id()?;
                let sampled_type = reader.next_id()?;
                // Dim, Depth, Arrayed, MS, Sampled, Image Format
                for _ in 0..6 {
                    reader.next_u32()?;
                }
                // Optional access qualifier.
                reader.skip_remainder();

                Self::TypeImage {
                    result_id,
                    sampled_type,
                }
            }
            OP_TYPE_SAMPLER => Self::TypeSampler {
                result_id: reader.next_id()?,
            },
            OP_TYPE_SAMPLED_IMAGE => Self::TypeSampledImage {
                result_id: reader.next_id()?,
                image_type: reader.next_id()?,
            },
            OP_TYPE_ARRAY => Self::TypeArray {
                result_id: reader.next_id()?,
                element_type: reader.next_id()?,
                length: reader.next_id()?,
            },
            OP_TYPE_RUNTIME_ARRAY => Self::TypeRuntimeArray {
                result_id: reader.next_id()?,
                element_type: reader.next_id()?,
            },
            OP_TYPE_STRUCT => Self::TypeStruct {
                result_id: reader.next_id()?,
                member_types: reader.remainder().into_iter().map(Id).collect(),
            },
            OP_TYPE_OPAQUE | OP_TYPE_RAY_QUERY_KHR | OP_TYPE_ACCELERATION_STRUCTURE_KHR => {
                let result_id = reader.next_id()?;
                // The name of `OpTypeOpaque`.
                reader.skip_remainder();

                Self::TypeOpaque { opcode, result_id }
            }
            OP_TYPE_POINTER => Self::TypePointer {
                result_id: reader.next_id()?,
                storage_class: StorageClass::parse(reader)?,
                ty: reader.next_id()?,
            },
            OP_TYPE_FUNCTION => Self::TypeFunction {
                result_id: reader.next_id()?,
                return_type: reader.next_id()?,
                parameter_types: reader.remainder().into_iter().map(Id).collect(),
            },
            OP_TYPE_FORWARD_POINTER => Self::TypeForwardPointer {
                pointer_type: reader.next_id()?,
                storage_class: StorageClass::parse(reader)?,
            },
            OP_CONSTANT_TRUE => Self::ConstantTrue {
                result_type_id: reader.next_id()?,
                result_id: reader.next_id()?,
            },
            OP_CONSTANT_FALSE => Self::ConstantFalse {
                result_type_id: reader.next_id()?,
                result_id: reader.next_id()?,
            },
            OP_CONSTANT => Self::Constant {
                result_type_id: reader.next_id()?,
                result_id: reader.next_id()?,
                value: reader.next_literal()?,
            },
            OP_CONSTANT_COMPOSITE => Self::ConstantComposite {
                result_type_id: reader.next_id()?,
                result_id: reader.next_id()?,
                constituents: reader.remainder().into_iter().map(Id).collect(),
            },
            OP_CONSTANT_NULL => Self::ConstantNull {
                result_type_id: reader.next_id()?,
                result_id: reader.next_id()?,
            },
            OP_SPEC_CONSTANT_TRUE => Self::SpecConstantTrue {
                result_type_id: reader.next_id()?,
                result_id: reader.next_id()?,
            },
            OP_SPEC_CONSTANT_FALSE => Self::SpecConstantFalse {
                result_type_id: reader.next_id()?,
                result_id: reader.next_id()?,
            },
            OP_SPEC_CONSTANT => Self::SpecConstant {
                result_type_id: reader.next_id()?,
                result_id: reader.next_id()?,
                value: reader.next_literal()?,
            },
            OP_SPEC_CONSTANT_COMPOSITE => Self::SpecConstantComposite {
                result_type_id: reader.next_id()?,
                result_id: reader.next_id()?,
                constituents: reader.remainder().into_iter().map(Id).collect(),
            },
            OP_SPEC_CONSTANT_OP => Self::SpecConstantOp {
                result_type_id: reader.next_id()?,
                result_id: reader.next_id()?,
                opcode: SpecConstantInstruction::parse(reader)?,
            },
            OP_FUNCTION => Self::Function {
                result_type_id: reader.next_id()?,
                result_id: reader.next_id()?,
                function_control: reader.next_u32()?,
                function_type: reader.next_id()?,
            },
            OP_FUNCTION_END => Self::FunctionEnd,
            OP_VARIABLE => Self::Variable {
                result_type_id: reader.next_id()?,
                result_id: reader.next_id()?,
                storage_class: StorageClass::parse(reader)?,
                initializer: if reader.is_empty() {
                    None
                } else {
                    Some(reader.next_id()?)
                },
            },
            OP_DECORATE => Self::Decorate {
                target: reader.next_id()?,
                decoration: Decoration::parse(reader)?,
            },
            OP_MEMBER_DECORATE => Self::MemberDecorate {
                structure_type: reader.next_id()?,
                member: reader.next_u32()?,
                decoration: Decoration::parse(reader)?,
            },
            _ => {
                reader.skip_remainder();
                Self::Unknown { opcode }
            }
        })
    }

    /// Returns the `Id` that is assigned by this instruction, if any.
    pub fn result_id(&self) -> Option<Id> {
        match *self {
            Self::Undef { result_id, .. }
            | Self::ExtInstImport { result_id, .. }
            | Self::TypeVoid { result_id }
            | Self::TypeBool { result_id }
            | Self::TypeInt { result_id, .. }
            | Self::TypeFloat { result_id, .. }
            | Self::TypeVector { result_id, .. }
            | Self::TypeMatrix { result_id, .. }
            | Self::TypeImage { result_id, .. }
            | Self::TypeSampler { result_id }
            | Self::TypeSampledImage { result_id, .. }
            | Self::TypeArray { result_id, .. }
            | Self::TypeRuntimeArray { result_id, .. }
            | Self::TypeStruct { result_id, .. }
            | Self::TypeOpaque { result_id, .. }
            | Self::TypePointer { result_id, .. }
            | Self::TypeFunction { result_id, .. }
            | Self::ConstantTrue { result_id, .. }
            | Self::ConstantFalse { result_id, .. }
            | Self::Constant { result_id, .. }
            | Self::ConstantComposite { result_id, .. }
            | Self::ConstantNull { result_id, .. }
            | Self::SpecConstantTrue { result_id, .. }
            | Self::SpecConstantFalse { result_id, .. }
            | Self::SpecConstant { result_id, .. }
            | Self::SpecConstantComposite { result_id, .. }
            | Self::SpecConstantOp { result_id, .. }
            | Self::Function { result_id, .. }
            | Self::Variable { result_id, .. } => Some(result_id),
            _ => None,
        }
    }

    /// Returns the ids that this instruction refers to, and that must therefore be declared
    /// before it.
    fn operand_ids(&self) -> SmallVec<[Id; 4]> {
        match self {
            Self::Undef { result_type_id, .. }
            | Self::ConstantTrue { result_type_id, .. }
            | Self::ConstantFalse { result_type_id, .. }
            | Self::Constant { result_type_id, .. }
            | Self::ConstantNull { result_type_id, .. }
            | Self::SpecConstantTrue { result_type_id, .. }
            | Self::SpecConstantFalse { result_type_id, .. }
            | Self::SpecConstant { result_type_id, .. } => smallvec::smallvec![*result_type_id],
            Self::TypeVector { component_type, .. } => smallvec::smallvec![*component_type],
            Self::TypeMatrix { column_type, .. } => smallvec::smallvec![*column_type],
            Self::TypeImage { sampled_type, .. } => smallvec::smallvec![*sampled_type],
            Self::TypeSampledImage { image_type, .. } => smallvec::smallvec![*image_type],
            Self::TypeArray {
                element_type,
                length,
                ..
            } => smallvec::smallvec![*element_type, *length],
            Self::TypeRuntimeArray { element_type, .. } => smallvec::smallvec![*element_type],
            Self::TypeStruct { member_types, .. } => member_types.iter().copied().collect(),
            Self::TypePointer { ty, .. } => smallvec::smallvec![*ty],
            Self::TypeFunction {
                return_type,
                parameter_types,
                ..
            } => std::iter::once(*return_type)
                .chain(parameter_types.iter().copied())
                .collect(),
            Self::ConstantComposite {
                result_type_id,
                constituents,
                ..
            }
            | Self::SpecConstantComposite {
                result_type_id,
                constituents,
                ..
            } => std::iter::once(*result_type_id)
                .chain(constituents.iter().copied())
                .collect(),
            Self::SpecConstantOp {
                result_type_id,
                opcode,
                ..
            } => std::iter::once(*result_type_id)
                .chain(opcode.operand_ids())
                .collect(),
            Self::Function {
                result_type_id,
                function_type,
                ..
            } => smallvec::smallvec![*result_type_id, *function_type],
            Self::Variable {
                result_type_id,
                initializer,
                ..
            } => std::iter::once(*result_type_id)
                .chain(initializer.iter().copied())
                .collect(),
            _ => SmallVec::new(),
        }
    }

    /// Returns whether this instruction declares a constant or a specialization constant.
    pub fn is_constant(&self) -> bool {
        matches!(
            self,
            Self::ConstantTrue { .. }
                | Self::ConstantFalse { .. }
                | Self::Constant { .. }
                | Self::ConstantComposite { .. }
                | Self::ConstantNull { .. }
                | Self::SpecConstantTrue { .. }
                | Self::SpecConstantFalse { .. }
                | Self::SpecConstant { .. }
                | Self::SpecConstantComposite { .. }
                | Self::SpecConstantOp { .. }
        )
    }
}

/// The operation computed by an `OpSpecConstantOp` instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpecConstantInstruction {
    Unary {
        op: UnaryOp,
        operand: Id,
    },
    Binary {
        op: BinaryOp,
        operand1: Id,
        operand2: Id,
    },
    Select {
        condition: Id,
        object1: Id,
        object2: Id,
    },
    CompositeExtract {
        composite: Id,
        indexes: Vec<u32>,
    },
    VectorShuffle {
        vector1: Id,
        vector2: Id,
        components: Vec<u32>,
    },
    /// An operation that cannot be evaluated by this crate. The operands are kept as they are,
    /// because it is not known which of them are ids.
    Other {
        opcode: u16,
        operands: Vec<u32>,
    },
}

impl SpecConstantInstruction {
    fn parse(reader: &mut InstructionReader<'_>) -> Result<Self, ParseError> {
        let word = reader.next_u32()?;
        let opcode =
            u16::try_from(word).map_err(|_| reader.map_err(ParseErrors::InvalidOpcode(word)))?;

        Ok(if let Some(op) = UnaryOp::from_opcode(opcode) {
            Self::Unary {
                op,
                operand: reader.next_id()?,
            }
        } else if let Some(op) = BinaryOp::from_opcode(opcode) {
            Self::Binary {
                op,
                operand1: reader.next_id()?,
                operand2: reader.next_id()?,
            }
        } else {
            match opcode {
                169 => Self::Select {
                    condition: reader.next_id()?,
                    object1: reader.next_id()?,
                    object2: reader.next_id()?,
                },
                81 => Self::CompositeExtract {
                    composite: reader.next_id()?,
                    indexes: reader.remainder(),
                },
                79 => Self::VectorShuffle {
                    vector1: reader.next_id()?,
                    vector2: reader.next_id()?,
                    components: reader.remainder(),
                },
                _ => Self::Other {
                    opcode,
                    operands: reader.remainder(),
                },
            }
        })
    }

    /// Returns the ids of the operands.
    pub fn operand_ids(&self) -> SmallVec<[Id; 3]> {
        match *self {
            Self::Unary { operand, .. } => smallvec::smallvec![operand],
            Self::Binary {
                operand1, operand2, ..
            } => smallvec::smallvec![operand1, operand2],
            Self::Select {
                condition,
                object1,
                object2,
            } => smallvec::smallvec![condition, object1, object2],
            Self::CompositeExtract { composite, .. } => smallvec::smallvec![composite],
            Self::VectorShuffle {
                vector1, vector2, ..
            } => smallvec::smallvec![vector1, vector2],
            Self::Other { .. } => SmallVec::new(),
        }
    }
}

/// A specialization constant operation with one operand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    SNegate,
    Not,
    LogicalNot,
    UConvert,
    SConvert,
}

impl UnaryOp {
    fn from_opcode(opcode: u16) -> Option<Self> {
        Some(match opcode {
            126 => Self::SNegate,
            200 => Self::Not,
            168 => Self::LogicalNot,
            113 => Self::UConvert,
            114 => Self::SConvert,
            _ => return None,
        })
    }
}

/// A specialization constant operation with two operands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    IAdd,
    ISub,
    IMul,
    UDiv,
    SDiv,
    UMod,
    SRem,
    SMod,
    ShiftRightLogical,
    ShiftRightArithmetic,
    ShiftLeftLogical,
    BitwiseOr,
    BitwiseXor,
    BitwiseAnd,
    LogicalOr,
    LogicalAnd,
    LogicalEqual,
    LogicalNotEqual,
    IEqual,
    INotEqual,
    UGreaterThan,
    SGreaterThan,
    UGreaterThanEqual,
    SGreaterThanEqual,
    ULessThan,
    SLessThan,
    ULessThanEqual,
    SLessThanEqual,
}

impl BinaryOp {
    fn from_opcode(opcode: u16) -> Option<Self> {
        Some(match opcode {
            128 => Self::IAdd,
            130 => Self::ISub,
            132 => Self::IMul,
            134 => Self::UDiv,
            135 => Self::SDiv,
            137 => Self::UMod,
            138 => Self::SRem,
            139 => Self::SMod,
            194 => Self::ShiftRightLogical,
            195 => Self::ShiftRightArithmetic,
            196 => Self::ShiftLeftLogical,
            197 => Self::BitwiseOr,
            198 => Self::BitwiseXor,
            199 => Self::BitwiseAnd,
            166 => Self::LogicalOr,
            167 => Self::LogicalAnd,
            164 => Self::LogicalEqual,
            165 => Self::LogicalNotEqual,
            170 => Self::IEqual,
            171 => Self::INotEqual,
            172 => Self::UGreaterThan,
            173 => Self::SGreaterThan,
            174 => Self::UGreaterThanEqual,
            175 => Self::SGreaterThanEqual,
            176 => Self::ULessThan,
            177 => Self::SLessThan,
            178 => Self::ULessThanEqual,
            179 => Self::SLessThanEqual,
            _ => return None,
        })
    }

    /// Returns whether the operation produces a boolean from integer operands.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::IEqual
                | Self::INotEqual
                | Self::UGreaterThan
                | Self::SGreaterThan
                | Self::UGreaterThanEqual
                | Self::SGreaterThanEqual
                | Self::ULessThan
                | Self::SLessThan
                | Self::ULessThanEqual
                | Self::SLessThanEqual
        )
    }

    /// Returns whether the operation takes and produces booleans.
    pub fn is_logical(self) -> bool {
        matches!(
            self,
            Self::LogicalOr | Self::LogicalAnd | Self::LogicalEqual | Self::LogicalNotEqual
        )
    }
}

/// Helper type for parsing the words of an instruction.
#[derive(Debug)]
struct InstructionReader<'a> {
    words: &'a [u32],
    next_word: usize,
    instruction: usize,
}

impl<'a> InstructionReader<'a> {
    /// Constructs a new reader from a slice of words for a single instruction, excluding the
    /// opcode word. `instruction` is the number of the instruction currently being read, and is
    /// used for error reporting.
    fn new(words: &'a [u32], instruction: usize) -> Self {
        Self {
            words,
            next_word: 0,
            instruction,
        }
    }

    /// Returns whether the reader has reached the end of the current instruction.
    fn is_empty(&self) -> bool {
        self.next_word >= self.words.len()
    }

    /// Converts the `ParseErrors` enum to the `ParseError` struct, adding contextual information.
    fn map_err(&self, error: ParseErrors) -> ParseError {
        ParseError {
            instruction: self.instruction,
            word: self.next_word,
            error,
            words: self.words.to_owned(),
        }
    }

    /// Returns the next word in the sequence.
    fn next_u32(&mut self) -> Result<u32, ParseError> {
        let word = *self
            .words
            .get(self.next_word)
            .ok_or_else(|| self.map_err(ParseErrors::MissingOperands))?;
        self.next_word += 1;

        Ok(word)
    }

    fn next_id(&mut self) -> Result<Id, ParseError> {
        self.next_u32().map(Id)
    }

    /// Reads the literal value of `OpConstant` or `OpSpecConstant`, which is one word, or two
    /// words for 64-bit types.
    fn next_literal(&mut self) -> Result<SmallVec<[u32; 2]>, ParseError> {
        let value: SmallVec<[u32; 2]> = self.remainder().into_iter().collect();

        if value.is_empty() || value.len() > 2 {
            return Err(ParseError {
                instruction: self.instruction,
                word: self.words.len(),
                error: if value.is_empty() {
                    ParseErrors::MissingOperands
                } else {
                    ParseErrors::LeftoverOperands
                },
                words: self.words.to_owned(),
            });
        }

        Ok(value)
    }

    /// Reads a nul-terminated string.
    fn next_string(&mut self) -> Result<String, ParseError> {
        let mut bytes = Vec::new();

        loop {
            let word = self.next_u32()?.to_le_bytes();

            if let Some(nul) = word.iter().position(|&b| b == 0) {
                bytes.extend(&word[0..nul]);
                break;
            } else {
                bytes.extend(word);
            }
        }

        String::from_utf8(bytes).map_err(|err| self.map_err(ParseErrors::FromUtf8Error(err)))
    }

    /// Reads all remaining words.
    fn remainder(&mut self) -> Vec<u32> {
        let vec = self.words[self.next_word..].to_owned();
        self.next_word = self.words.len();

        vec
    }

    /// Skips all remaining words.
    fn skip_remainder(&mut self) {
        self.next_word = self.words.len();
    }
}

/// Converts a byte buffer into SPIR-V words, detecting the endianness from the magic number.
pub fn words_from_bytes(bytes: &[u8]) -> Result<Vec<u32>, SpirvError> {
    if bytes.len() % 4 != 0 {
        return Err(SpirvError::InvalidBytesLength {
            length: bytes.len(),
        });
    }

    let Some(magic) = bytes.get(0..4) else {
        return Err(SpirvError::InvalidHeader);
    };

    let from_bytes: fn([u8; 4]) -> u32 = if magic == MAGIC.to_le_bytes() {
        u32::from_le_bytes
    } else if magic == MAGIC.to_be_bytes() {
        u32::from_be_bytes
    } else {
        return Err(SpirvError::InvalidHeader);
    };

    Ok(bytes
        .chunks_exact(4)
        .map(|word| from_bytes(bytemuck::pod_read_unaligned(word)))
        .collect())
}

/// Error that can happen when reading a SPIR-V module.
#[derive(Clone, Debug)]
pub enum SpirvError {
    DuplicateId {
        id: Id,
        first_instruction: usize,
        second_instruction: usize,
    },
    DuplicateSpecId {
        specialization_id: u32,
        first: Id,
        second: Id,
    },
    IdOutOfBounds {
        id: Id,
        instruction: usize,
        bound: u32,
    },
    InvalidBytesLength {
        length: usize,
    },
    InvalidHeader,
    ParseError(ParseError),
    UndeclaredId {
        id: Id,
        instruction: usize,
    },
}

impl Display for SpirvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            Self::DuplicateId {
                id,
                first_instruction,
                second_instruction,
            } => write!(
                f,
                "id {} is assigned more than once, by instructions {} and {}",
                id, first_instruction, second_instruction,
            ),
            Self::DuplicateSpecId {
                specialization_id,
                first,
                second,
            } => write!(
                f,
                "specialization id {} is given to both {} and {}",
                specialization_id, first, second,
            ),
            Self::IdOutOfBounds {
                id,
                instruction,
                bound,
            } => write!(
                f,
                "id {}, assigned or referenced at instruction {}, is not in the range 1..{}",
                id, instruction, bound,
            ),
            Self::InvalidBytesLength { length } => write!(
                f,
                "the length of the byte buffer ({}) is not a multiple of 4",
                length,
            ),
            Self::InvalidHeader => write!(f, "the SPIR-V module header is missing or invalid"),
            Self::ParseError(_) => write!(f, "parse error"),
            Self::UndeclaredId { id, instruction } => write!(
                f,
                "id {}, referenced at instruction {}, is not declared before it is used",
                id, instruction,
            ),
        }
    }
}

impl Error for SpirvError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ParseError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ParseError> for SpirvError {
    fn from(err: ParseError) -> Self {
        Self::ParseError(err)
    }
}

/// Error that can happen when parsing SPIR-V instructions into Rust data structures.
#[derive(Clone, Debug)]
pub struct ParseError {
    /// The instruction number the error happened at, starting from 0.
    pub instruction: usize,
    /// The word from the start of the instruction operands that the error happened at.
    pub word: usize,
    /// The error.
    pub error: ParseErrors,
    /// The words of the instruction.
    pub words: Vec<u32>,
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        write!(
            f,
            "at instruction {}, word {}: {}",
            self.instruction, self.word, self.error,
        )
    }
}

impl Error for ParseError {}

/// Individual types of parse error that can happen.
#[derive(Clone, Debug)]
pub enum ParseErrors {
    FromUtf8Error(FromUtf8Error),
    InvalidOpcode(u32),
    LeftoverOperands,
    MissingOperands,
    UnexpectedEOF,
    ZeroWordCount,
}

impl Display for ParseErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), FmtError> {
        match self {
            Self::FromUtf8Error(_) => write!(f, "invalid UTF-8 in string literal"),
            Self::InvalidOpcode(word) => write!(f, "{} is not a valid opcode", word),
            Self::LeftoverOperands => write!(f, "unparsed operands remaining"),
            Self::MissingOperands => write!(
                f,
                "the instruction and its operands require more words than are present in the \
                instruction",
            ),
            Self::UnexpectedEOF => write!(f, "encountered unexpected end of file"),
            Self::ZeroWordCount => write!(f, "the instruction has a word count of 0"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::ModuleBuilder as Assembler;

    #[test]
    fn invalid_header() {
        assert!(matches!(Spirv::new(&[]), Err(SpirvError::InvalidHeader)));
        assert!(matches!(
            Spirv::new(&[0x03022307, 0x00010000, 0, 10, 0]),
            Err(SpirvError::InvalidHeader),
        ));
    }

    #[test]
    fn tables() {
        let mut asm = Assembler::compute(Version::V1_0);
        asm.capability(Capability::Int8);
        asm.capability(Capability::Int8);
        asm.extension("SPV_KHR_8bit_storage");
        asm.local_size(8, 4, 1);
        let uint = asm.type_int(32, false);
        let array_len = asm.constant_u32(uint, 16);
        let array = asm.type_array(uint, array_len);
        let ptr = asm.type_pointer(StorageClass::Workgroup, array);
        let var = asm.variable(ptr, StorageClass::Workgroup, None);
        asm.name(var, "shared_data");
        let words = asm.assemble();

        let spirv = Spirv::new(&words).unwrap();
        assert_eq!(spirv.version(), Version::V1_0);
        assert_eq!(spirv.capabilities(), &[Capability::Shader, Capability::Int8]);
        assert_eq!(spirv.extensions(), &["SPV_KHR_8bit_storage".to_owned()]);
        assert_eq!(spirv.global_variables(), &[var]);
        assert_eq!(spirv.constants(), &[array_len]);
        assert_eq!(spirv.id(var).unwrap().name(), Some("shared_data"));

        let entry_point = &spirv.entry_points()[0];
        assert_eq!(entry_point.execution_model, ExecutionModel::GLCompute);
        assert_eq!(entry_point.name, "main");
        assert_eq!(
            spirv.execution_modes(entry_point.function),
            &[ExecutionMode::LocalSize {
                x_size: 8,
                y_size: 4,
                z_size: 1,
            }],
        );
    }

    #[test]
    fn words_from_either_endianness() {
        let words = Assembler::compute(Version::V1_0).assemble();
        let little: Vec<u8> = words.iter().flat_map(|word| word.to_le_bytes()).collect();
        let big: Vec<u8> = words.iter().flat_map(|word| word.to_be_bytes()).collect();

        assert_eq!(words_from_bytes(&little).unwrap(), words);
        assert_eq!(words_from_bytes(&big).unwrap(), words);
        assert!(matches!(
            words_from_bytes(&little[..little.len() - 1]),
            Err(SpirvError::InvalidBytesLength { .. }),
        ));
    }

    #[test]
    fn truncated_instruction() {
        let mut words = Assembler::compute(Version::V1_0).assemble();
        words.push((3 << 16) | OP_CAPABILITY as u32);
        words.push(1);

        assert!(matches!(
            Spirv::new(&words),
            Err(SpirvError::ParseError(ParseError {
                error: ParseErrors::UnexpectedEOF,
                ..
            })),
        ));
    }

    #[test]
    fn zero_word_count() {
        let mut words = Assembler::compute(Version::V1_0).assemble();
        words.push(OP_CAPABILITY as u32);

        assert!(matches!(
            Spirv::new(&words),
            Err(SpirvError::ParseError(ParseError {
                error: ParseErrors::ZeroWordCount,
                ..
            })),
        ));
    }

    #[test]
    fn leftover_operands() {
        let mut asm = Assembler::compute(Version::V1_0);
        let id = asm.reserve_id();
        asm.raw_global(OP_TYPE_BOOL, &[id.as_raw(), 7]);
        let words = asm.assemble();

        assert!(matches!(
            Spirv::new(&words),
            Err(SpirvError::ParseError(ParseError {
                error: ParseErrors::LeftoverOperands,
                ..
            })),
        ));
    }

    #[test]
    fn spec_constant_op_opcode_out_of_range() {
        let mut asm = Assembler::compute(Version::V1_0);
        let uint = asm.type_int(32, false);
        let one = asm.constant_u32(uint, 1);
        let id = asm.reserve_id();
        asm.raw_global(
            OP_SPEC_CONSTANT_OP,
            &[uint.as_raw(), id.as_raw(), 0x10080, one.as_raw(), one.as_raw()],
        );
        let words = asm.assemble();

        assert!(matches!(
            Spirv::new(&words),
            Err(SpirvError::ParseError(ParseError {
                error: ParseErrors::InvalidOpcode(0x10080),
                ..
            })),
        ));
    }

    #[test]
    fn forward_reference() {
        let mut asm = Assembler::compute(Version::V1_0);
        let uint = asm.type_int(32, false);
        let missing = asm.reserve_id();
        asm.type_array(uint, missing);
        let words = asm.assemble();

        assert!(matches!(
            Spirv::new(&words),
            Err(SpirvError::UndeclaredId { id, .. }) if id == missing,
        ));
    }

    #[test]
    fn id_out_of_bounds() {
        let mut asm = Assembler::compute(Version::V1_0);
        asm.raw_annotation(OP_DECORATE, &[1000, 2]);
        let words = asm.assemble();

        assert!(matches!(
            Spirv::new(&words),
            Err(SpirvError::IdOutOfBounds { .. }),
        ));
    }

    #[test]
    fn specialization_ids() {
        let mut asm = Assembler::compute(Version::V1_0);
        let uint = asm.type_int(32, false);
        let first = asm.spec_constant_u32(uint, 1, Some(7));
        let second = asm.spec_constant_u32(uint, 2, Some(3));
        asm.spec_constant_u32(uint, 3, None);
        let spirv = Spirv::new(&asm.assemble()).unwrap();

        assert_eq!(spirv.specialization_constant(7), Some(first));
        assert_eq!(spirv.specialization_constant(3), Some(second));
        assert_eq!(spirv.specialization_constant(0), None);
    }

    #[test]
    fn duplicate_spec_id() {
        let mut asm = Assembler::compute(Version::V1_0);
        let uint = asm.type_int(32, false);
        asm.spec_constant_u32(uint, 1, Some(7));
        asm.spec_constant_u32(uint, 2, Some(7));
        let words = asm.assemble();

        assert!(matches!(
            Spirv::new(&words),
            Err(SpirvError::DuplicateSpecId {
                specialization_id: 7,
                ..
            }),
        ));
    }

    #[test]
    fn undeclared_local_size_id() {
        let mut asm = Assembler::compute(Version::V1_2);
        let x = asm.reserve_id();
        let one = {
            let uint = asm.type_int(32, false);
            asm.constant_u32(uint, 1)
        };
        asm.local_size_id(x, one, one);
        let words = asm.assemble();

        assert!(matches!(
            Spirv::new(&words),
            Err(SpirvError::UndeclaredId { id, .. }) if id == x,
        ));
    }
}
