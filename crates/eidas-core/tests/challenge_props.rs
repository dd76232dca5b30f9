//! Property tests for challenge derivation and proof input binding.

use eidas_core::{Challenge, Groth16Proof, CHALLENGE_HEX_LEN, PROOF_INPUT_LEN};
use proptest::prelude::*;

proptest! {
    #[test]
    fn derived_challenge_is_lowercase_suffix(hex in "[0-9a-fA-F]{40}") {
        let address = format!("0x{hex}");
        let challenge = Challenge::from_address(&address).unwrap();
        prop_assert_eq!(challenge.as_str().len(), CHALLENGE_HEX_LEN);
        prop_assert_eq!(challenge.as_str(), hex[8..].to_ascii_lowercase());
    }

    #[test]
    fn derivation_ignores_address_case(hex in "[0-9a-f]{40}") {
        let lower = Challenge::from_address(&format!("0x{hex}")).unwrap();
        let upper = Challenge::from_address(&format!("0x{}", hex.to_ascii_uppercase())).unwrap();
        prop_assert_eq!(lower, upper);
    }

    #[test]
    fn public_input_has_one_element_per_padded_byte(text in "[!-~]{1,32}") {
        let challenge = Challenge::new(text.clone()).unwrap();
        let input = Groth16Proof::public_input_for(&challenge);
        prop_assert_eq!(input.len(), PROOF_INPUT_LEN);
        for (i, byte) in text.bytes().enumerate() {
            prop_assert_eq!(input[i].to_decimal(), byte.to_string());
        }
        for element in &input[text.len()..] {
            prop_assert_eq!(element.to_decimal(), "0");
        }
    }
}
