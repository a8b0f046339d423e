/// The LS-8 instruction set.
///
/// Discriminants are the encoded opcode bytes. The encoding itself carries
/// the instruction shape:
///
/// - bits 7-6: number of operand bytes following the opcode
/// - bit 5: instruction is handled by the ALU
/// - bit 4: instruction sets the program counter itself
/// - bits 3-0: instruction identifier
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
  /// Loads an immediate value into a register.
  ///
  /// | Operation      | Semantics/RTL | Assembly     |
  /// |----------------|---------------|--------------|
  /// | Load Immediate | `r[a] ← b`    | `LDI ra, $b` |
  LoadImmediate = 0b10000010,

  /// Writes a register's value, in decimal, to the machine's output sink.
  ///
  /// | Operation      | Semantics/RTL   | Assembly |
  /// |----------------|-----------------|----------|
  /// | Print Register | `print(r[a])`   | `PRN ra` |
  PrintRegister = 0b01000111,

  /// Stops execution; the machine cannot be resumed afterwards.
  ///
  /// | Operation | Semantics/RTL      | Assembly |
  /// |-----------|--------------------|----------|
  /// | Halt      | `(stop execution)` | `HLT`    |
  Halt = 0b00000001,

  /// Adds two registers, wrapping modulo 256.
  ///
  /// | Operation | Semantics/RTL        | Assembly      |
  /// |-----------|----------------------|---------------|
  /// | Add       | `r[a] ← r[a] + r[b]` | `ADD ra, rb`  |
  Add = 0b10100000,

  /// Multiplies two registers, wrapping modulo 256.
  ///
  /// | Operation | Semantics/RTL        | Assembly      |
  /// |-----------|----------------------|---------------|
  /// | Multiply  | `r[a] ← r[a] * r[b]` | `MUL ra, rb`  |
  Multiply = 0b10100010,

  /// Compares two registers and records the ordering in the flag.
  ///
  /// | Operation | Semantics/RTL            | Assembly      |
  /// |-----------|--------------------------|---------------|
  /// | Compare   | `flag ← r[a] <=> r[b]`   | `CMP ra, rb`  |
  Compare = 0b10100111,

  /// Pushes a register onto the stack.
  ///
  /// | Operation | Semantics/RTL               | Assembly   |
  /// |-----------|-----------------------------|------------|
  /// | Push      | `sp ← sp - 1; m[sp] ← r[a]` | `PUSH ra`  |
  Push = 0b01000101,

  /// Pops the top of the stack into a register.
  ///
  /// | Operation | Semantics/RTL               | Assembly   |
  /// |-----------|-----------------------------|------------|
  /// | Pop       | `r[a] ← m[sp]; sp ← sp + 1` | `POP ra`   |
  Pop = 0b01000110,

  /// Calls the subroutine whose address is held in a register.
  ///
  /// | Operation | Semantics/RTL                  | Assembly   |
  /// |-----------|--------------------------------|------------|
  /// | Call      | `push(pc + 2); pc ← r[a]`      | `CALL ra`  |
  Call = 0b01010000,

  /// Returns to the address on top of the stack.
  ///
  /// | Operation | Semantics/RTL | Assembly |
  /// |-----------|---------------|----------|
  /// | Return    | `pc ← pop()`  | `RET`    |
  Return = 0b00010001,

  /// Jumps to the address held in a register.
  ///
  /// | Operation | Semantics/RTL | Assembly  |
  /// |-----------|---------------|-----------|
  /// | Jump      | `pc ← r[a]`   | `JMP ra`  |
  Jump = 0b01010100,

  /// Jumps if the last comparison found its operands equal.
  ///
  /// | Operation     | Semantics/RTL                      | Assembly  |
  /// |---------------|------------------------------------|-----------|
  /// | Jump If Equal | `if flag == Equal : pc ← r[a]`     | `JEQ ra`  |
  JumpIfEqual = 0b01010101,

  /// Jumps unless the last comparison found its operands equal. Taken when
  /// no comparison has run yet.
  ///
  /// | Operation         | Semantics/RTL                  | Assembly  |
  /// |-------------------|--------------------------------|-----------|
  /// | Jump If Not Equal | `if flag != Equal : pc ← r[a]` | `JNE ra`  |
  JumpIfNotEqual = 0b01010110,
}

impl Opcode {
  /// The assembly mnemonic, used in traces and error messages.
  pub const fn mnemonic(self) -> &'static str {
    match self {
      Self::LoadImmediate => "LDI",
      Self::PrintRegister => "PRN",
      Self::Halt => "HLT",
      Self::Add => "ADD",
      Self::Multiply => "MUL",
      Self::Compare => "CMP",
      Self::Push => "PUSH",
      Self::Pop => "POP",
      Self::Call => "CALL",
      Self::Return => "RET",
      Self::Jump => "JMP",
      Self::JumpIfEqual => "JEQ",
      Self::JumpIfNotEqual => "JNE",
    }
  }

  /// Number of operand bytes following the opcode, from bits 7-6.
  pub const fn operands(self) -> u8 {
    (self as u8) >> 6
  }

  /// Total encoded length of the instruction in bytes.
  pub const fn len(self) -> u8 {
    1 + self.operands()
  }

  /// Whether the instruction is executed by the ALU, from bit 5.
  pub const fn is_alu(self) -> bool {
    (self as u8) & 0b00100000 != 0
  }

  /// Whether the instruction sets the program counter itself, from bit 4.
  /// The dispatch loop only advances the PC past instructions that do not.
  pub const fn sets_pc(self) -> bool {
    (self as u8) & 0b00010000 != 0
  }
}

/// A byte that does not encode any instruction. The machine wraps this
/// with the faulting address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownOpcode(pub u8);

impl TryFrom<u8> for Opcode {
  type Error = UnknownOpcode;

  fn try_from(byte: u8) -> Result<Self, Self::Error> {
    match byte {
      0b10000010 => Ok(Self::LoadImmediate),
      0b01000111 => Ok(Self::PrintRegister),
      0b00000001 => Ok(Self::Halt),
      0b10100000 => Ok(Self::Add),
      0b10100010 => Ok(Self::Multiply),
      0b10100111 => Ok(Self::Compare),
      0b01000101 => Ok(Self::Push),
      0b01000110 => Ok(Self::Pop),
      0b01010000 => Ok(Self::Call),
      0b00010001 => Ok(Self::Return),
      0b01010100 => Ok(Self::Jump),
      0b01010101 => Ok(Self::JumpIfEqual),
      0b01010110 => Ok(Self::JumpIfNotEqual),
      _ => Err(UnknownOpcode(byte)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn decode_known_opcodes() {
    assert_eq!(Opcode::try_from(0b10000010).unwrap(), Opcode::LoadImmediate);
    assert_eq!(Opcode::try_from(0b01000111).unwrap(), Opcode::PrintRegister);
    assert_eq!(Opcode::try_from(0b00000001).unwrap(), Opcode::Halt);
    assert_eq!(Opcode::try_from(0b00010001).unwrap(), Opcode::Return);
  }

  #[test]
  fn decode_unknown_opcode() {
    assert_eq!(Opcode::try_from(0xFF), Err(UnknownOpcode(0xFF)));
    // 0x01 is HLT, but a flipped shape bit is not an instruction
    assert_eq!(Opcode::try_from(0b11000001), Err(UnknownOpcode(0b11000001)));
  }

  #[test]
  fn operand_counts_match_encoding() {
    assert_eq!(Opcode::LoadImmediate.operands(), 2);
    assert_eq!(Opcode::Multiply.operands(), 2);
    assert_eq!(Opcode::PrintRegister.operands(), 1);
    assert_eq!(Opcode::Call.operands(), 1);
    assert_eq!(Opcode::Halt.operands(), 0);
    assert_eq!(Opcode::Return.operands(), 0);
  }

  #[test]
  fn lengths_include_opcode_byte() {
    assert_eq!(Opcode::LoadImmediate.len(), 3);
    assert_eq!(Opcode::PrintRegister.len(), 2);
    assert_eq!(Opcode::Halt.len(), 1);
  }

  #[test]
  fn alu_class() {
    assert!(Opcode::Add.is_alu());
    assert!(Opcode::Multiply.is_alu());
    assert!(Opcode::Compare.is_alu());
    assert!(!Opcode::LoadImmediate.is_alu());
    assert!(!Opcode::Jump.is_alu());
  }

  #[test]
  fn pc_setting_class() {
    assert!(Opcode::Call.sets_pc());
    assert!(Opcode::Return.sets_pc());
    assert!(Opcode::Jump.sets_pc());
    assert!(Opcode::JumpIfEqual.sets_pc());
    assert!(Opcode::JumpIfNotEqual.sets_pc());
    assert!(!Opcode::LoadImmediate.sets_pc());
    assert!(!Opcode::Push.sets_pc());
    assert!(!Opcode::Halt.sets_pc());
  }
}
