use rand::Rng;
use uuid::Uuid;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Produces candidate tokens for new records.
///
/// Generators are pure: they never look at storage, and are safe to share
/// across request tasks.
pub trait TokenGenerator: Send + Sync + 'static {
    fn generate(&self) -> String;
}

/// Uppercase hex of a random v4 UUID folded down to 32 bits, e.g. `"3FA85F64"`.
/// No zero padding, so tokens are 1–8 characters long.
#[derive(Debug, Clone, Copy, Default)]
pub struct HexTokenGenerator;

impl TokenGenerator for HexTokenGenerator {
    fn generate(&self) -> String {
        let bits = Uuid::new_v4().as_u128();
        let folded = (bits as u32)
            ^ ((bits >> 32) as u32)
            ^ ((bits >> 64) as u32)
            ^ ((bits >> 96) as u32);
        format!("{folded:X}")
    }
}

/// Fixed-length random string over `[a-zA-Z0-9]`.
#[derive(Debug, Clone, Copy)]
pub struct AlphanumericTokenGenerator {
    len: usize,
}

impl AlphanumericTokenGenerator {
    pub fn new(len: usize) -> Self {
        Self { len: len.max(1) }
    }
}

impl TokenGenerator for AlphanumericTokenGenerator {
    fn generate(&self) -> String {
        let mut rng = rand::thread_rng();
        (0..self.len)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect()
    }
}
