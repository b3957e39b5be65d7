//! Lecture des montants saisis par les membres : `10`, `500k`, `1.5m`, `2b`, `10,000`.

struct Suffix {
    letter: &'static str,
    value: i64,
}
const SUFFIXES: &[Suffix] = &[
    Suffix { letter: "k", value: 1_000 },
    Suffix { letter: "m", value: 1_000_000 },
    Suffix { letter: "b", value: 1_000_000_000 },
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid amount `{0}`: use plain numbers or suffixes like 'k', 'm' or 'b'")]
pub struct InvalidAmount(pub String);

/// Convertit un montant en entier.
///
/// Les séparateurs `,` et `_` sont ignorés, la casse aussi. Un nombre décimal
/// est multiplié en flottant puis tronqué vers zéro, même sans suffixe
/// (`"1.5"` donne `1`). Seul un nombre décimal accepte un exposant : `1.5e3`
/// vaut `1500`, `1e3` est refusé.
pub fn parse<S: AsRef<str>>(amount: S) -> Result<i64, InvalidAmount> {
    lazy_static::lazy_static!(
        static ref STR_RE_SUFFIXES: String = SUFFIXES.iter().map(|v| v.letter).collect::<String>();
        static ref RE_AMOUNT: regex::Regex = regex::Regex::new(
            &format!(r"^([+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:e[+-]?\d+)?)\s*([{}])?$", *STR_RE_SUFFIXES)
        ).unwrap();
    );
    let raw = amount.as_ref();
    let invalid = || InvalidAmount(raw.to_string());
    let cleaned = raw.to_lowercase().replace(|c: char| c == ',' || c == '_', "");
    let captures = RE_AMOUNT.captures(cleaned.trim()).ok_or_else(invalid)?;
    let number = captures.get(1).map(|m| m.as_str()).ok_or_else(invalid)?;
    let multiplier = match captures.get(2) {
        Some(letter) => SUFFIXES.iter()
            .find(|v| v.letter == letter.as_str())
            .map(|v| v.value)
            .ok_or_else(invalid)?,
        None => 1,
    };
    if number.contains('e') && !number.contains('.') {
        return Err(invalid());
    }
    if number.contains('.') {
        let number = number.parse::<f64>().map_err(|_| invalid())?;
        let value = (number * multiplier as f64).trunc();
        if !value.is_finite() || value.abs() >= i64::MAX as f64 {
            return Err(invalid());
        }
        Ok(value as i64)
    } else {
        number.parse::<i64>().ok()
            .and_then(|n| n.checked_mul(multiplier))
            .ok_or_else(invalid)
    }
}

/// Affiche un montant avec des séparateurs de milliers : `4500000` → `4,500,000`.
pub fn format_amount(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        result.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}
