use std::cmp::Ordering;
use std::io::{self, Write};

use crate::opcode::{Opcode, UnknownOpcode};

/// Size of the machine's flat memory in bytes.
pub const MEMORY_SIZE: usize = 256;
/// Number of general-purpose registers.
pub const REGISTER_COUNT: usize = 8;
/// Register reserved for the stack pointer.
pub const SP: u8 = 7;

/// Where the stack pointer starts; the stack grows down from here.
const STACK_BASE: u8 = 0xF4;

/// The type of a single register in our machine.
pub type Register = u8;

/// Whether the machine will execute another instruction. `Halted` is
/// terminal, both after a halt instruction and after any fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
  Running,
  Halted,
}

/// Outcome of the most recent comparison, consumed by the conditional
/// jumps. `Unset` means no comparison has run yet; conditional jumps treat
/// it as not-equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Flag {
  #[default]
  Unset,
  Equal,
  LessThan,
  GreaterThan,
}

/// An execution or load fault. Every fault is fatal: the machine halts and
/// the failing instruction leaves no partial mutation behind.
#[derive(thiserror::Error, Debug)]
pub enum Error {
  #[error("unknown instruction {opcode:#010b} at address {at:#04x}")]
  UnknownInstruction { opcode: u8, at: u8 },

  #[error("{mnemonic} is not an alu operation")]
  UnsupportedOperation { mnemonic: &'static str },

  #[error("register index {index} out of bounds")]
  RegisterOutOfBounds { index: u8 },

  #[error("push would move the stack below address 0")]
  StackOverflow,

  #[error("pop would move the stack past the top of memory")]
  StackUnderflow,

  #[error("program of {len} bytes does not fit in {cap} bytes of memory", cap = MEMORY_SIZE)]
  LoadTooLarge { len: usize },

  #[error("output sink: {0}")]
  Io(#[from] io::Error),
}

/// The LS-8 machine: 256 bytes of memory, 8 registers, a program counter,
/// a comparison flag, and a descending call stack addressed through `r7`.
///
/// The machine owns no I/O; [`step`](Machine::step) and
/// [`run`](Machine::run) write PRN output to whatever sink the caller
/// hands them.
#[derive(Debug)]
pub struct Machine {
  ram: [u8; MEMORY_SIZE],
  registers: [Register; REGISTER_COUNT],
  pc: u8,
  flag: Flag,
  state: State,
}

impl Machine {
  /// Create a machine with zeroed memory and registers, the stack pointer
  /// parked at its base, and nothing compared yet.
  pub fn new() -> Self {
    let mut registers = [0; REGISTER_COUNT];
    registers[usize::from(SP)] = STACK_BASE;
    Self {
      ram: [0; MEMORY_SIZE],
      registers,
      pc: 0,
      flag: Flag::default(),
      state: State::Running,
    }
  }

  /// Copy a program image into memory starting at address 0.
  ///
  /// An image longer than memory fails with [`Error::LoadTooLarge`] and
  /// writes nothing.
  pub fn load(&mut self, image: &[u8]) -> Result<(), Error> {
    if image.len() > MEMORY_SIZE {
      return Err(Error::LoadTooLarge { len: image.len() });
    }
    self.ram[..image.len()].copy_from_slice(image);
    Ok(())
  }

  /// Execute instructions until the machine halts or faults.
  pub fn run<W: Write>(&mut self, out: &mut W) -> Result<(), Error> {
    while self.step(out)? == State::Running {}
    Ok(())
  }

  /// Execute exactly one instruction and report the resulting state.
  ///
  /// Stepping a halted machine is a no-op that reports `Halted`, so
  /// callers wanting interruption can poll between steps without tracking
  /// extra state.
  pub fn step<W: Write>(&mut self, out: &mut W) -> Result<State, Error> {
    if self.state == State::Halted {
      return Ok(State::Halted);
    }
    match self.execute(out) {
      Ok(()) => Ok(self.state),
      Err(err) => {
        self.state = State::Halted;
        Err(err)
      }
    }
  }

  /// Fetch, decode, and execute the instruction at the program counter.
  fn execute<W: Write>(&mut self, out: &mut W) -> Result<(), Error> {
    let at = self.pc;
    // fixed-width fetch: both operand bytes are read whether or not the
    // instruction uses them
    let a = self.ram_read(at.wrapping_add(1));
    let b = self.ram_read(at.wrapping_add(2));
    let op = Opcode::try_from(self.ram_read(at))
      .map_err(|UnknownOpcode(opcode)| Error::UnknownInstruction { opcode, at })?;

    match op {
      Opcode::LoadImmediate => self.write_register(a, b)?,
      Opcode::PrintRegister => writeln!(out, "{}", self.register(a)?)?,
      Opcode::Halt => self.state = State::Halted,
      Opcode::Add | Opcode::Multiply | Opcode::Compare => self.alu(op, a, b)?,
      Opcode::Push => {
        let value = self.register(a)?;
        self.push(value)?;
      }
      Opcode::Pop => {
        let value = self.pop()?;
        self.write_register(a, value)?;
      }
      Opcode::Call => {
        // validate the target before touching the stack so a bad operand
        // leaves the stack pointer alone
        let target = self.register(a)?;
        self.push(at.wrapping_add(2))?;
        self.pc = target;
      }
      Opcode::Return => self.pc = self.pop()?,
      Opcode::Jump => self.pc = self.register(a)?,
      Opcode::JumpIfEqual => {
        let target = self.register(a)?;
        if self.flag == Flag::Equal {
          self.pc = target;
        } else {
          self.pc = at.wrapping_add(op.len());
        }
      }
      Opcode::JumpIfNotEqual => {
        let target = self.register(a)?;
        if self.flag != Flag::Equal {
          self.pc = target;
        } else {
          self.pc = at.wrapping_add(op.len());
        }
      }
    }

    if !op.sets_pc() && self.state == State::Running {
      self.pc = at.wrapping_add(op.len());
    }
    Ok(())
  }

  /// Arithmetic/comparison unit. `Add` and `Multiply` write the wrapped
  /// result back into `r[a]`; `Compare` only sets the flag. Routing any
  /// other opcode here is a bug in the dispatch table.
  fn alu(&mut self, op: Opcode, a: u8, b: u8) -> Result<(), Error> {
    let va = self.register(a)?;
    let vb = self.register(b)?;
    match op {
      Opcode::Add => self.write_register(a, va.wrapping_add(vb))?,
      Opcode::Multiply => self.write_register(a, va.wrapping_mul(vb))?,
      Opcode::Compare => {
        self.flag = match va.cmp(&vb) {
          Ordering::Less => Flag::LessThan,
          Ordering::Greater => Flag::GreaterThan,
          Ordering::Equal => Flag::Equal,
        };
      }
      other => {
        return Err(Error::UnsupportedOperation {
          mnemonic: other.mnemonic(),
        });
      }
    }
    Ok(())
  }

  /// Decrement the stack pointer, then write `value` at the new top.
  fn push(&mut self, value: u8) -> Result<(), Error> {
    let sp = self.registers[usize::from(SP)];
    let top = sp.checked_sub(1).ok_or(Error::StackOverflow)?;
    self.registers[usize::from(SP)] = top;
    self.ram_write(top, value);
    Ok(())
  }

  /// Read the value at the top of the stack, then increment the stack
  /// pointer.
  fn pop(&mut self) -> Result<u8, Error> {
    let sp = self.registers[usize::from(SP)];
    let below = sp.checked_add(1).ok_or(Error::StackUnderflow)?;
    let value = self.ram_read(sp);
    self.registers[usize::from(SP)] = below;
    Ok(value)
  }

  /// Read the byte at `address`. A `u8` address is always in bounds.
  pub fn ram_read(&self, address: u8) -> u8 {
    self.ram[usize::from(address)]
  }

  /// Write a byte at `address`.
  pub fn ram_write(&mut self, address: u8, value: u8) {
    self.ram[usize::from(address)] = value;
  }

  /// Read register `index`. Register operands are full bytes, so indices
  /// past the register file are a fault, not a truncation.
  pub fn register(&self, index: u8) -> Result<Register, Error> {
    self
      .registers
      .get(usize::from(index))
      .copied()
      .ok_or(Error::RegisterOutOfBounds { index })
  }

  fn write_register(&mut self, index: u8, value: Register) -> Result<(), Error> {
    let slot = self
      .registers
      .get_mut(usize::from(index))
      .ok_or(Error::RegisterOutOfBounds { index })?;
    *slot = value;
    Ok(())
  }

  pub fn pc(&self) -> u8 {
    self.pc
  }

  pub fn flag(&self) -> Flag {
    self.flag
  }

  pub fn state(&self) -> State {
    self.state
  }

  /// One-line dump of the program counter, the three bytes under it, and
  /// every register, for debugging loaded programs.
  pub fn trace(&self) -> String {
    let mut line = format!(
      "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
      self.pc,
      self.ram_read(self.pc),
      self.ram_read(self.pc.wrapping_add(1)),
      self.ram_read(self.pc.wrapping_add(2)),
    );
    for value in self.registers {
      line.push_str(&format!(" {value:02X}"));
    }
    line
  }
}

impl Default for Machine {
  fn default() -> Self {
    Self::new()
  }
}
