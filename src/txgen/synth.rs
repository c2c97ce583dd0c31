use crate::txgen::program::{OpcodeGenerator, ProgramGenerator};
use crate::txgen::random::Filler;
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, Eip1559TransactionRequest, TransactionRequest, U256};

const TX_GAS: u64 = 21_000;
const TX_CREATE_GAS: u64 = 53_000;
const TX_DATA_GAS_PER_BYTE: u64 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxShape {
    LegacyCreate,
    LegacyCall,
    DynamicFeeCreate,
    DynamicFeeCall,
}

impl TxShape {
    /// Uniform pick from the four shapes; legacy ones fold onto their
    /// fee-market twin unless allowed.
    pub fn from_selector(selector: u8, allow_legacy: bool) -> Self {
        match (selector % 4, allow_legacy) {
            (0, true) => TxShape::LegacyCreate,
            (1, true) => TxShape::LegacyCall,
            (0, false) | (2, _) => TxShape::DynamicFeeCreate,
            _ => TxShape::DynamicFeeCall,
        }
    }

    pub fn is_create(self) -> bool {
        matches!(self, TxShape::LegacyCreate | TxShape::DynamicFeeCreate)
    }

    pub fn is_legacy(self) -> bool {
        matches!(self, TxShape::LegacyCreate | TxShape::LegacyCall)
    }
}

/// An unsigned transaction. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxIntent {
    pub shape: TxShape,
    pub nonce: u64,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub value: U256,
    pub gas_limit: u64,
    /// Gas price for legacy shapes, max fee per gas otherwise.
    pub fee_cap: U256,
    pub fee_tip: U256,
    pub data: Bytes,
}

impl TxIntent {
    pub fn to_typed(&self) -> TypedTransaction {
        if self.shape.is_legacy() {
            let mut req = TransactionRequest::new()
                .nonce(self.nonce)
                .value(self.value)
                .gas(self.gas_limit)
                .gas_price(self.fee_cap)
                .data(self.data.clone());
            if let Some(to) = self.to {
                req = req.to(to);
            }
            req.into()
        } else {
            let mut req = Eip1559TransactionRequest::new()
                .nonce(self.nonce)
                .value(self.value)
                .gas(self.gas_limit)
                .max_fee_per_gas(self.fee_cap)
                .max_priority_fee_per_gas(self.fee_tip)
                .data(self.data.clone());
            if let Some(to) = self.to {
                req = req.to(to);
            }
            req.into()
        }
    }
}

#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub max_payload_len: usize,
    pub gas_limit: u64,
    pub allow_legacy: bool,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self { max_payload_len: 128, gas_limit: 300_000, allow_legacy: false }
    }
}

/// Builds random transactions. `build` never fails and is a pure function of
/// its arguments and the state of the byte source.
pub struct TxSynthesizer<G: ProgramGenerator = OpcodeGenerator> {
    cfg: SynthConfig,
    generator: G,
}

impl TxSynthesizer<OpcodeGenerator> {
    pub fn new(cfg: SynthConfig) -> Self {
        Self::with_generator(cfg, OpcodeGenerator::default())
    }
}

impl<G: ProgramGenerator> TxSynthesizer<G> {
    pub fn with_generator(cfg: SynthConfig, generator: G) -> Self {
        Self { cfg, generator }
    }

    pub fn build(&self, nonce: u64, fee_cap: U256, fee_tip: U256, src: &mut Filler) -> TxIntent {
        let recipient = Address::from_slice(&src.bytes(20));
        let mut payload = self.generator.generate_program(src);
        payload.truncate(self.cfg.max_payload_len);
        let value = random_value(src);
        let shape = TxShape::from_selector(src.byte(), self.cfg.allow_legacy);

        let gas_limit = self.cfg.gas_limit.max(intrinsic_gas(&payload, shape.is_create()));
        TxIntent {
            shape,
            nonce,
            to: if shape.is_create() { None } else { Some(recipient) },
            value,
            gas_limit,
            fee_cap,
            fee_tip,
            data: Bytes::from(payload),
        }
    }
}

/// Mostly small amounts; one draw in sixteen moves up to a full u64 of wei.
fn random_value(src: &mut Filler) -> U256 {
    if src.byte() % 16 == 0 {
        U256::from(src.u64())
    } else {
        U256::from(src.u16())
    }
}

/// Upper bound on intrinsic gas: every payload byte priced as non-zero.
fn intrinsic_gas(data: &[u8], create: bool) -> u64 {
    let base = if create { TX_CREATE_GAS } else { TX_GAS };
    base + TX_DATA_GAS_PER_BYTE * data.len() as u64
}
