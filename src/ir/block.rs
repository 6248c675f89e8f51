use std::fmt;

use crate::ir::inst::Inst;
use crate::ir::opcode::Opcode;
use crate::ir::value::{InstRef, Value};

/// A straight-line sequence of vector micro-operations.
/// Instructions are stored in a `Vec<Inst>` arena, indexed by `InstRef(u32)`.
/// Removal is done by tombstoning (setting opcode to Void).
#[derive(Debug, Clone, Default)]
pub struct Block {
    /// Arena of instructions.
    pub instructions: Vec<Inst>,
}

impl Block {
    /// Create a new empty block.
    pub fn new() -> Self {
        Self { instructions: Vec::new() }
    }

    /// Append a new instruction and return its InstRef.
    pub fn push_inst(&mut self, inst: Inst) -> InstRef {
        let idx = self.instructions.len();
        self.instructions.push(inst);
        InstRef(idx as u32)
    }

    /// Append a new instruction with the given opcode and args, return its InstRef.
    /// Also increments use_count for any InstRef arguments.
    pub fn append(&mut self, opcode: Opcode, args: &[Value]) -> InstRef {
        for arg in args {
            if let Value::Inst(ref_) = arg {
                self.instructions[ref_.index()].use_count += 1;
            }
        }
        let inst = Inst::new(opcode, args);
        self.push_inst(inst)
    }

    /// Get an instruction by reference.
    pub fn get(&self, r: InstRef) -> &Inst {
        &self.instructions[r.index()]
    }

    /// Get a mutable instruction by reference.
    pub fn get_mut(&mut self, r: InstRef) -> &mut Inst {
        &mut self.instructions[r.index()]
    }

    /// Returns the number of (non-tombstoned) instructions.
    pub fn live_inst_count(&self) -> usize {
        self.instructions.iter().filter(|i| !i.is_tombstone()).count()
    }

    /// Returns the total number of instruction slots (including tombstones).
    pub fn inst_count(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if the block has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Iterate over all live (non-tombstoned) instructions with their InstRefs.
    pub fn iter_live(&self) -> impl Iterator<Item = (InstRef, &Inst)> {
        self.instructions.iter().enumerate()
            .filter(|(_, inst)| !inst.is_tombstone())
            .map(|(i, inst)| (InstRef(i as u32), inst))
    }

    /// Per-instruction (use_count, result bit width) pairs, in arena order.
    /// This is the shape the register allocator consumes.
    pub fn inst_info(&self) -> Vec<(u32, usize)> {
        self.instructions.iter()
            .map(|inst| (inst.use_count, inst.return_type().bit_width()))
            .collect()
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Block:")?;
        for (i, inst) in self.instructions.iter().enumerate() {
            if inst.is_tombstone() {
                continue;
            }
            let ref_ = InstRef(i as u32);
            if inst.return_type() != crate::ir::types::Type::Void {
                writeln!(f, "  {} = {}", ref_, inst)?;
            } else {
                writeln!(f, "  {}", inst)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_creation_and_append() {
        let mut block = Block::new();

        let a = block.append(Opcode::ZeroVector, &[]);
        let b = block.append(Opcode::ZeroVector, &[]);
        let add = block.append(Opcode::Add32, &[Value::Inst(a), Value::Inst(b)]);
        block.append(Opcode::Not, &[Value::Inst(add)]);

        assert_eq!(block.inst_count(), 4);
        assert_eq!(block.live_inst_count(), 4);

        assert_eq!(block.get(a).use_count, 1);
        assert_eq!(block.get(b).use_count, 1);
        assert_eq!(block.get(add).use_count, 1);

        let s = format!("{}", block);
        assert!(s.contains("Add32"));
    }

    #[test]
    fn test_block_inst_info() {
        let mut block = Block::new();
        let a = block.append(Opcode::ZeroVector, &[]);
        block.append(Opcode::GetElement8, &[Value::Inst(a), Value::ImmU8(0)]);

        let info = block.inst_info();
        assert_eq!(info.len(), 2);
        assert_eq!(info[0], (1, 128));
        assert_eq!(info[1], (0, 8));
    }

    #[test]
    fn test_block_tombstone() {
        let mut block = Block::new();
        let r = block.append(Opcode::ZeroVector, &[]);
        assert_eq!(block.live_inst_count(), 1);
        block.get_mut(r).tombstone();
        assert_eq!(block.live_inst_count(), 0);
        assert_eq!(block.inst_count(), 1);
    }
}
