//! Process-wide pairing PIN.
//!
//! Only the most recently issued PIN is valid. Issuing a new challenge on
//! any connection supersedes the previous one, and a successful match
//! consumes it.

use rand::Rng;
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub struct PinIssuer {
    current: Mutex<Option<String>>,
}

impl PinIssuer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a fresh four-digit PIN, replacing any outstanding one.
    pub async fn issue(&self) -> String {
        let pin = format!("{:04}", rand::rng().random_range(0..10_000u32));
        *self.current.lock().await = Some(pin.clone());
        pin
    }

    /// Check a submitted PIN against the outstanding one.
    pub async fn verify(&self, submitted: &str) -> bool {
        let mut current = self.current.lock().await;
        let matches = match current.as_deref() {
            Some(pin) if !submitted.is_empty() => {
                bool::from(pin.as_bytes().ct_eq(submitted.as_bytes()))
            }
            _ => false,
        };
        if matches {
            *current = None;
        }
        matches
    }

    /// The outstanding PIN, if any.
    pub async fn current(&self) -> Option<String> {
        self.current.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pin_is_four_digits() {
        let issuer = PinIssuer::new();
        for _ in 0..50 {
            let pin = issuer.issue().await;
            assert_eq!(pin.len(), 4);
            assert!(pin.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_correct_pin_is_consumed() {
        let issuer = PinIssuer::new();
        let pin = issuer.issue().await;

        assert!(issuer.verify(&pin).await);
        assert!(!issuer.verify(&pin).await);
        assert!(issuer.current().await.is_none());
    }

    #[tokio::test]
    async fn test_superseded_pin_is_rejected() {
        let issuer = PinIssuer::new();
        let first = issuer.issue().await;
        let mut second = issuer.issue().await;
        while second == first {
            second = issuer.issue().await;
        }

        assert!(!issuer.verify(&first).await);
        assert!(issuer.verify(&second).await);
    }

    #[tokio::test]
    async fn test_nothing_matches_without_challenge() {
        let issuer = PinIssuer::new();
        assert!(!issuer.verify("0000").await);
        assert!(!issuer.verify("").await);
    }

    #[tokio::test]
    async fn test_wrong_pin_keeps_challenge_open() {
        let issuer = PinIssuer::new();
        let pin = issuer.issue().await;
        let wrong = if pin == "1234" { "4321" } else { "1234" };

        assert!(!issuer.verify(wrong).await);
        assert_eq!(issuer.current().await, Some(pin));
    }
}
