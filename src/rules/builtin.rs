use super::{RawRule, RuleSet, Severity};
use crate::error::Result;

const WEAK_DIGESTS: &str = r"(?i)^(MD2|MD4|MD5|SHA-?1|SHA|RIPEMD\d*)$";
const WEAK_CIPHERS: &str = r"(?i)^(DES|DESede|3DES|TripleDES|RC2|RC4|ARCFOUR|Blowfish)(/.*)?$|/ECB/";
const WEAK_MACS: &str = r"(?i)^Hmac(MD5|SHA1)$";
const WEAK_SIGNATURES: &str = r"(?i)^(MD5|SHA1)with";
const WEAK_RANDOM: &str = r"(?i)^SHA1PRNG$";

/// One `getInstance(algorithm, provider)` factory rule.
fn factory(
    id: &str,
    category: &str,
    declaring_type: &str,
    pattern: Option<&str>,
    severity: Severity,
    description: &str,
) -> RawRule {
    RawRule {
        id: Some(id.into()),
        category: category.into(),
        declaring_type: declaring_type.into(),
        method_name: "getInstance".into(),
        algorithm_arg_index: 0,
        provider_arg_index: Some(1),
        match_pattern: pattern.map(str::to_string),
        severity,
        description: description.into(),
    }
}

/// The JCA factory rule set used when no rule file is configured.
pub fn default_rules() -> Result<RuleSet> {
    RuleSet::from_raw(vec![
        factory(
            "FIPS-001",
            "MessageDigest",
            "java.security.MessageDigest",
            Some(WEAK_DIGESTS),
            Severity::High,
            "Message digest algorithm and provider",
        ),
        factory(
            "FIPS-002",
            "Cipher",
            "javax.crypto.Cipher",
            Some(WEAK_CIPHERS),
            Severity::Critical,
            "Cipher transformation and provider",
        ),
        factory(
            "FIPS-003",
            "Signature",
            "java.security.Signature",
            Some(WEAK_SIGNATURES),
            Severity::High,
            "Signature algorithm and provider",
        ),
        factory(
            "FIPS-004",
            "Mac",
            "javax.crypto.Mac",
            Some(WEAK_MACS),
            Severity::Medium,
            "MAC algorithm and provider",
        ),
        factory(
            "FIPS-005",
            "KeyGenerator",
            "javax.crypto.KeyGenerator",
            Some(WEAK_CIPHERS),
            Severity::High,
            "Symmetric key generation",
        ),
        factory(
            "FIPS-006",
            "KeyPairGenerator",
            "java.security.KeyPairGenerator",
            None,
            Severity::Medium,
            "Asymmetric key pair generation",
        ),
        factory(
            "FIPS-007",
            "KeyFactory",
            "java.security.KeyFactory",
            None,
            Severity::Low,
            "Key factory provider",
        ),
        factory(
            "FIPS-008",
            "SecretKeyFactory",
            "javax.crypto.SecretKeyFactory",
            Some(WEAK_CIPHERS),
            Severity::Medium,
            "Secret key factory algorithm and provider",
        ),
        factory(
            "FIPS-009",
            "KeyAgreement",
            "javax.crypto.KeyAgreement",
            None,
            Severity::Medium,
            "Key agreement provider",
        ),
        factory(
            "FIPS-010",
            "SecureRandom",
            "java.security.SecureRandom",
            Some(WEAK_RANDOM),
            Severity::Medium,
            "Random number generator algorithm and provider",
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_rules_validate() {
        let rules = default_rules().unwrap();
        assert_eq!(rules.len(), 10);
        assert!(rules.rules().iter().all(|r| r.provider_arg_index == Some(1)));
    }

    #[test]
    fn weak_patterns_flag_expected_algorithms() {
        let rules = default_rules().unwrap();
        let digest = &rules.rules()[0];
        assert!(digest.matches_algorithm("MD5"));
        assert!(digest.matches_algorithm("sha1"));
        assert!(!digest.matches_algorithm("SHA-256"));

        let cipher = &rules.rules()[1];
        assert!(cipher.matches_algorithm("DES/CBC/PKCS5Padding"));
        assert!(cipher.matches_algorithm("AES/ECB/PKCS5Padding"));
        assert!(!cipher.matches_algorithm("AES/GCM/NoPadding"));
    }
}
