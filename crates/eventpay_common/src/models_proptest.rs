#[cfg(test)]
mod tests {
    use crate::models::{Amount, AmountError, MAX_AMOUNT_MINOR};
    use proptest::prelude::*;

    proptest! {
        // Every amount with up to two fractional digits in range survives a text round trip.
        #[test]
        fn test_valid_amounts_are_accepted(minor in 1..=MAX_AMOUNT_MINOR) {
            let text = format!("{}.{:02}", minor / 100, minor % 100);
            let amount: Amount = text.parse().expect("valid amount");
            prop_assert_eq!(amount.minor_units(), minor);
            prop_assert_eq!(amount.to_string(), text);
        }

        // Three or more fractional digits are always refused.
        #[test]
        fn test_excess_fraction_digits_are_rejected(
            integral in 0u32..1_000_000,
            fraction in "[0-9]{3,6}",
        ) {
            let text = format!("{}.{}", integral, fraction);
            prop_assert_eq!(
                text.parse::<Amount>(),
                Err(AmountError::TooManyFractionDigits(text.clone()))
            );
        }

        // Anything containing a character outside digits and one dot is refused.
        #[test]
        fn test_non_numeric_text_is_rejected(text in "[0-9]{0,3}[a-zA-Z,;+][0-9]{0,3}") {
            prop_assert!(text.parse::<Amount>().is_err());
        }

        // Long digit runs are refused as too large, never by panicking.
        #[test]
        fn test_oversized_integral_parts_are_rejected(
            digits in "[1-9][0-9]{6,40}",
            fraction in proptest::option::of("[0-9]{1,2}"),
        ) {
            let text = match fraction {
                Some(fraction) => format!("{}.{}", digits, fraction),
                None => digits,
            };
            prop_assert_eq!(text.parse::<Amount>(), Err(AmountError::TooLarge));
        }

        // Zero and negative values never parse.
        #[test]
        fn test_non_positive_amounts_are_rejected(minor in -MAX_AMOUNT_MINOR..=0) {
            let sign = if minor < 0 { "-" } else { "" };
            let abs = minor.abs();
            let text = format!("{}{}.{:02}", sign, abs / 100, abs % 100);
            prop_assert_eq!(text.parse::<Amount>(), Err(AmountError::NotPositive));
        }
    }
}
