//! Transaction generation: a seeded byte source, a random bytecode generator
//! and the synthesizer turning both into one of four transaction shapes.

pub mod random;
pub mod program;
pub mod synth;

pub use random::Filler;
pub use program::{OpcodeGenerator, ProgramGenerator};
pub use synth::{SynthConfig, TxIntent, TxShape, TxSynthesizer};
