/// Outcome of an authorization check. A `Deny` carries the reason and the
/// HTTP-style code the gateway should surface; infrastructure failures are
/// a separate channel (`StoreError`) so "we could not verify" is never
/// conflated with "we verified and you are not allowed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Denial {
    pub code: DenyCode,
    pub reason: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyCode {
    /// No actor: missing or invalid credentials (401).
    Unauthenticated,
    /// Authenticated but lacking privilege or ownership (403).
    Forbidden,
    /// The target resource does not exist (404).
    NotFound,
}

impl Decision {
    pub fn deny(code: DenyCode, reason: &'static str) -> Decision {
        Decision::Deny(Denial { code, reason })
    }

    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Collapse into a `Result` for call sites that propagate with `?`.
    pub fn check(self) -> Result<(), Denial> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(denial) => Err(denial),
        }
    }
}
