use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::roles::Role;

type HmacSha256 = Hmac<Sha256>;

/// Issues and checks the product keys that gate privileged signup.
///
/// A key is the hex HMAC-SHA256, keyed by the product-key secret, of
/// `"<email>-<ROLE>-<secret>"`. The same email and role always give the same
/// key, and a key for one role does not open another.
#[derive(Clone)]
pub struct SignupProofs {
    secret: String,
    mac: HmacSha256,
}

impl SignupProofs {
    pub fn new(secret: impl Into<String>) -> anyhow::Result<Self> {
        let secret = secret.into();
        anyhow::ensure!(!secret.is_empty(), "product key secret must not be empty");
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| anyhow::anyhow!("init product key hmac: {e}"))?;
        Ok(Self { secret, mac })
    }

    fn keyed(&self, email: &str, role: Role) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(format!("{}-{}-{}", email, role, self.secret).as_bytes());
        mac
    }

    pub fn generate(&self, email: &str, role: Role) -> String {
        hex::encode(self.keyed(email, role).finalize().into_bytes())
    }

    pub fn verify(&self, email: &str, role: Role, proof: &str) -> bool {
        let Ok(bytes) = hex::decode(proof.trim()) else {
            return false;
        };
        self.keyed(email, role).verify_slice(&bytes).is_ok()
    }
}
