use proptest::prelude::*;
use proptest::test_runner::Config;
use tienda_model::{Email, Money, Phone, PostalCode, Quantity};

proptest! {
    #![proptest_config(Config::with_cases(128))]
    #[test]
    fn well_formed_emails_parse_and_keep_their_text(
        local in "[a-z0-9._]{1,20}",
        host in "[a-z0-9]{1,20}",
        tld in "[a-z]{2,6}"
    ) {
        let raw = format!("{local}@{host}.{tld}");
        let email = Email::parse(&raw).expect("email");
        prop_assert_eq!(email.as_str(), raw.as_str());
    }

    #[test]
    fn postal_codes_in_charset_parse(code in "[A-Za-z0-9][A-Za-z0-9 -]{1,7}[A-Za-z0-9]") {
        prop_assert!(PostalCode::parse(&code).is_ok());
    }

    #[test]
    fn digit_phones_parse_with_optional_plus(digits in "[0-9]{7,20}", plus in any::<bool>()) {
        let raw = if plus { format!("+{digits}") } else { digits };
        prop_assert!(Phone::parse(&raw).is_ok());
    }

    #[test]
    fn cents_survive_wire_encoding(cents in 0_i64..10_000_000) {
        let money = Money::from_cents(cents);
        let json = serde_json::to_string(&money).expect("json");
        let back: Money = serde_json::from_str(&json).expect("decode");
        prop_assert_eq!(back, money);
    }

    #[test]
    fn line_total_matches_integer_product(cents in 1_i64..100_000, qty in 1_i64..1_000) {
        let q = Quantity::new(qty).expect("qty");
        let line = Money::from_cents(cents).checked_mul(q).expect("line");
        prop_assert_eq!(line.cents(), cents * qty);
    }
}
