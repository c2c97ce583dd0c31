use crate::txgen::random::Filler;

/// Source of transaction payloads. Output may be arbitrarily long; callers truncate.
pub trait ProgramGenerator: Send + Sync + 'static {
    fn generate_program(&self, src: &mut Filler) -> Vec<u8>;
}

const PUSH1: u8 = 0x60;
const PUSH32: u8 = 0x7f;

/// Random EVM opcode stream. PUSHn opcodes are followed by their n immediate
/// bytes so the code disassembles cleanly; everything else is a raw byte,
/// invalid opcodes included.
#[derive(Debug, Clone)]
pub struct OpcodeGenerator {
    pub max_instructions: usize,
}

impl Default for OpcodeGenerator {
    fn default() -> Self {
        Self { max_instructions: 64 }
    }
}

impl ProgramGenerator for OpcodeGenerator {
    fn generate_program(&self, src: &mut Filler) -> Vec<u8> {
        let count = src.byte() as usize % self.max_instructions.max(1) + 1;
        let mut code = Vec::with_capacity(count * 2);
        for _ in 0..count {
            let op = src.byte();
            code.push(op);
            if (PUSH1..=PUSH32).contains(&op) {
                let n = (op - PUSH1 + 1) as usize;
                code.extend(src.bytes(n));
            }
        }
        code
    }
}
