use rand::Rng;

const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SPECIAL: &[u8] = b"!@#$%^&*()";

/// Random password generator backed by the thread-local CSPRNG.
#[derive(Debug, Clone)]
pub struct PasswordGenerator {
    length: usize,
    special_chars: bool,
}

impl Default for PasswordGenerator {
    fn default() -> Self {
        Self::new(12, true)
    }
}

impl PasswordGenerator {
    pub fn new(length: usize, special_chars: bool) -> Self {
        Self {
            length: length.max(1),
            special_chars,
        }
    }

    pub fn generate(&self) -> String {
        let alphabet: Vec<u8> = if self.special_chars {
            [ALPHANUMERIC, SPECIAL].concat()
        } else {
            ALPHANUMERIC.to_vec()
        };
        let mut rng = rand::thread_rng();
        (0..self.length)
            .map(|_| alphabet[rng.gen_range(0..alphabet.len())] as char)
            .collect()
    }

    /// A fresh password guaranteed not to equal `previous`.
    pub fn generate_distinct(&self, previous: &str) -> String {
        loop {
            let candidate = self.generate();
            if candidate != previous {
                return candidate;
            }
        }
    }
}
