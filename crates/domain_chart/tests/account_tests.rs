//! Chart-of-Accounts Validation Tests
//!
//! Covers code-shape level derivation, parent compatibility rules,
//! kind/level coupling, the reserved terminal segment, and classification
//! defaulting.

use core_kernel::AccountId;
use domain_chart::{
    derive_level, validate, Account, AccountError, AccountKind, AccountNature, Classification,
};

fn account(code: &str, kind: AccountKind) -> Account {
    Account {
        id: AccountId::new(),
        code: code.to_string(),
        description: format!("Account {code}"),
        kind,
        nature: AccountNature::Debit,
        display_order: 0,
        level: 0,
        parent_id: None,
        classification: None,
    }
}

fn synthetic(code: &str, level: u8) -> Account {
    let mut node = account(code, AccountKind::Synthetic);
    node.level = level;
    node
}

mod level_derivation {
    use super::*;

    #[test]
    fn five_level_chain_derives_in_order() {
        let codes = ["1", "1.01", "1.01.02", "1.01.02.003", "1.01.02.003.0001"];
        for (index, code) in codes.iter().enumerate() {
            assert_eq!(derive_level(code), Ok(index as u8 + 1), "code {code}");
        }
    }

    #[test]
    fn wrong_segment_widths_fail() {
        for code in ["10", "1.1", "1.001", "1.01.2", "1.01.02.03", "1.01.02.003.001"] {
            assert!(
                matches!(derive_level(code), Err(AccountError::InvalidCode(_))),
                "code {code} should not match any level shape"
            );
        }
    }

    #[test]
    fn non_digit_segments_fail() {
        for code in ["x", "1.0a", "1.01.02.00e", "1..01"] {
            assert!(matches!(derive_level(code), Err(AccountError::InvalidCode(_))));
        }
    }
}

mod parent_rules {
    use super::*;

    #[test]
    fn valid_child_of_synthetic_parent() {
        let parent = synthetic("1", 1);
        let child = account("1.01", AccountKind::Synthetic);
        assert_eq!(validate(&child, Some(&parent)), Ok(2));
    }

    #[test]
    fn level_gap_is_rejected() {
        let parent = synthetic("1", 1);
        let grandchild = account("1.01.02", AccountKind::Synthetic);
        assert_eq!(
            validate(&grandchild, Some(&parent)),
            Err(AccountError::LevelMismatch {
                parent_level: 1,
                found: 3
            })
        );
    }

    #[test]
    fn code_must_extend_parent_code() {
        let parent = synthetic("1", 1);
        let stranger = account("2.01", AccountKind::Synthetic);
        assert!(matches!(
            validate(&stranger, Some(&parent)),
            Err(AccountError::CodePrefixMismatch { .. })
        ));
    }

    #[test]
    fn analytic_parent_is_rejected() {
        let mut parent = account("1", AccountKind::Analytic);
        parent.level = 1;
        let child = account("1.01", AccountKind::Synthetic);
        assert_eq!(
            validate(&child, Some(&parent)),
            Err(AccountError::ParentMustBeSynthetic("1".to_string()))
        );
    }
}

mod kind_level_coupling {
    use super::*;

    #[test]
    fn synthetic_forbidden_at_leaf_level() {
        let node = account("1.01.02.003.0001", AccountKind::Synthetic);
        assert_eq!(
            validate(&node, None),
            Err(AccountError::KindLevelMismatch {
                kind: AccountKind::Synthetic,
                level: 5
            })
        );
    }

    #[test]
    fn analytic_forbidden_above_leaf_level() {
        for code in ["1", "1.01", "1.01.02", "1.01.02.003"] {
            let node = account(code, AccountKind::Analytic);
            assert!(
                matches!(
                    validate(&node, None),
                    Err(AccountError::KindLevelMismatch { .. })
                ),
                "analytic at {code} should be rejected"
            );
        }
    }

    #[test]
    fn analytic_leaf_is_valid() {
        let node = account("4.01.02.003.0001", AccountKind::Analytic);
        assert_eq!(validate(&node, None), Ok(5));
    }
}

mod reserved_segment {
    use super::*;

    #[test]
    fn all_zero_terminal_segment_always_rejected() {
        let node = account("1.01.02.003.0000", AccountKind::Analytic);
        assert_eq!(
            validate(&node, None),
            Err(AccountError::ReservedTerminalSegment(node.code.clone()))
        );
    }

    #[test]
    fn rejected_even_under_a_valid_parent() {
        let parent = synthetic("1.01.02.003", 4);
        let node = account("1.01.02.003.0000", AccountKind::Analytic);
        assert!(matches!(
            validate(&node, Some(&parent)),
            Err(AccountError::ReservedTerminalSegment(_))
        ));
    }

    #[test]
    fn nonzero_terminal_segment_is_fine() {
        let node = account("1.01.02.003.0010", AccountKind::Analytic);
        assert_eq!(validate(&node, None), Ok(5));
    }
}

mod classification {
    use super::*;

    #[test]
    fn defaults_follow_first_character_table() {
        let cases = [
            ("1", Classification::Asset),
            ("2", Classification::Liability),
            ("3", Classification::Equity),
            ("4", Classification::Revenue),
            ("5", Classification::Expense),
            ("6", Classification::Cost),
            ("7", Classification::Cost),
            ("8", Classification::Cost),
            ("9", Classification::Other),
        ];
        for (code, expected) in cases {
            let node = account(code, AccountKind::Synthetic);
            assert_eq!(node.effective_classification(), expected, "code {code}");
        }
    }

    #[test]
    fn mandatory_cost_center_set() {
        assert!(Classification::Revenue.requires_cost_center());
        assert!(Classification::Expense.requires_cost_center());
        assert!(Classification::Cost.requires_cost_center());
        assert!(!Classification::Asset.requires_cost_center());
        assert!(!Classification::Liability.requires_cost_center());
        assert!(!Classification::Equity.requires_cost_center());
        assert!(!Classification::Other.requires_cost_center());
    }
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    /// Builds a syntactically valid code of the requested level.
    fn code_of_level(level: u8, seed: &[u32; 5]) -> String {
        let widths = [1usize, 2, 2, 3, 4];
        let mut segments = Vec::new();
        for depth in 0..level as usize {
            let width = widths[depth];
            let modulus = 10u32.pow(width as u32);
            segments.push(format!("{:0width$}", seed[depth] % modulus));
        }
        segments.join(".")
    }

    proptest! {
        #[test]
        fn valid_codes_derive_their_level(level in 1u8..=5, seed in proptest::array::uniform5(0u32..10_000)) {
            let code = code_of_level(level, &seed);
            prop_assert_eq!(derive_level(&code), Ok(level));
        }

        #[test]
        fn extra_segment_invalidates(seed in proptest::array::uniform5(0u32..10_000)) {
            let code = format!("{}.01", code_of_level(5, &seed));
            prop_assert!(matches!(derive_level(&code), Err(AccountError::InvalidCode(_))));
        }
    }
}
