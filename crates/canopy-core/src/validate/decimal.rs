//! Numeric coercion into the canonical decimal representation.
//!
//! Heterogeneous decimal inputs (native numbers, strings in a superset
//! grammar covering plain decimal, scientific, and `0b`/`0o`/`0x` radix
//! literals with an optional binary exponent, and digit-parts objects
//! mirroring how big-decimal libraries expose internal state) all
//! normalize into one [`Decimal`]. Values that entered as different notations are
//! indistinguishable afterwards: `16`, `"16"`, and `"0x10"` coerce to
//! equal decimals that serialize identically.

use crate::validate::outcome::ValidationError;
use rust_decimal::Decimal;
use serde_json::Value as Json;

/// Largest binary-exponent magnitude accepted in radix literals. Anything
/// past this cannot fit the canonical representation anyway.
const MAX_BINARY_EXPONENT: i64 = 8192;

/// Coerce a raw JSON value into the canonical decimal.
///
/// Accepted shapes:
/// - a JSON number (integers convert exactly; finite floats coerce
///   through their shortest round-trip rendering, so `0.1` becomes
///   decimal `0.1`);
/// - a string in the accepted grammar, which includes already-canonical
///   renderings produced by this module;
/// - a parts object `{d, e, s}` carrying base-10^7 digit groups, a
///   power-of-ten exponent, and a sign.
///
/// Null handling is the caller's concern; this function rejects null
/// like any other unacceptable shape.
pub fn coerce_decimal(raw: &Json) -> Result<Decimal, ValidationError> {
    let result = match raw {
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Decimal::from(i))
            } else if let Some(u) = n.as_u64() {
                Ok(Decimal::from(u))
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                if !f.is_finite() {
                    Err(ValidationError::NonFiniteDecimal {
                        notation: n.to_string(),
                    })
                } else {
                    parse_notation(&format!("{f}"))
                }
            }
        }
        Json::String(s) => parse_notation(s),
        Json::Object(map) => parse_parts(map),
        other => Err(invalid(other.to_string())),
    };
    result.map(|d| d.normalize())
}

/// Check whether an object looks like a decimal parts object, so callers
/// can tell it apart from filter/update operator objects.
pub fn is_parts_object(map: &serde_json::Map<String, Json>) -> bool {
    map.len() == 3 && map.contains_key("d") && map.contains_key("e") && map.contains_key("s")
}

fn invalid(notation: impl Into<String>) -> ValidationError {
    ValidationError::InvalidDecimal {
        notation: notation.into(),
    }
}

/// Parse a string in the accepted superset grammar.
fn parse_notation(input: &str) -> Result<Decimal, ValidationError> {
    let (negative, rest) = match input.as_bytes().first() {
        Some(b'+') => (false, &input[1..]),
        Some(b'-') => (true, &input[1..]),
        _ => (false, input),
    };

    if rest == "Infinity" || rest == "NaN" {
        return Err(ValidationError::NonFiniteDecimal {
            notation: input.to_string(),
        });
    }

    let radix = match rest.as_bytes() {
        [b'0', b'b' | b'B', ..] => Some(2u32),
        [b'0', b'o' | b'O', ..] => Some(8),
        [b'0', b'x' | b'X', ..] => Some(16),
        _ => None,
    };

    match radix {
        Some(radix) => parse_radix(input, &rest[2..], radix, negative),
        None => parse_plain(input),
    }
}

/// Plain decimal notation: optional sign, digits with an optional
/// fraction (either side of the point may be empty, not both), and an
/// optional `e`/`E` exponent.
fn parse_plain(input: &str) -> Result<Decimal, ValidationError> {
    let mut sign = "";
    let mut rest = input;
    if let Some(stripped) = input.strip_prefix('-') {
        sign = "-";
        rest = stripped;
    } else if let Some(stripped) = input.strip_prefix('+') {
        rest = stripped;
    }

    let (mantissa, exponent) = match rest.find(['e', 'E']) {
        Some(pos) => (&rest[..pos], Some(&rest[pos + 1..])),
        None => (rest, None),
    };

    let (int_digits, frac_digits) = match mantissa.find('.') {
        Some(pos) => (&mantissa[..pos], Some(&mantissa[pos + 1..])),
        None => (mantissa, None),
    };

    let all_ascii_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !all_ascii_digits(int_digits) || !frac_digits.map(all_ascii_digits).unwrap_or(true) {
        return Err(invalid(input));
    }
    if int_digits.is_empty() && frac_digits.map(str::is_empty).unwrap_or(true) {
        return Err(invalid(input));
    }
    if let Some(exp) = exponent {
        let exp_digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
        if exp_digits.is_empty() || !all_ascii_digits(exp_digits) {
            return Err(invalid(input));
        }
    }

    // Rebuild a normal form ("5." and ".5" are grammatical but the
    // decimal parser wants digits on both sides).
    let int_digits = if int_digits.is_empty() { "0" } else { int_digits };
    let mut normal = format!("{sign}{int_digits}");
    if let Some(frac) = frac_digits {
        if !frac.is_empty() {
            normal.push('.');
            normal.push_str(frac);
        }
    }

    let parsed = match exponent {
        Some(exp) => Decimal::from_scientific(&format!("{normal}e{exp}")),
        None => normal.parse::<Decimal>(),
    };
    parsed.map_err(|_| invalid(input))
}

/// Radix notation: binary/octal/hex digits with an optional fraction and
/// an optional binary exponent `p±N`.
fn parse_radix(
    original: &str,
    body: &str,
    radix: u32,
    negative: bool,
) -> Result<Decimal, ValidationError> {
    let (mantissa, exponent) = match body.find(['p', 'P']) {
        Some(pos) => (&body[..pos], Some(&body[pos + 1..])),
        None => (body, None),
    };

    let (int_digits, frac_digits) = match mantissa.find('.') {
        Some(pos) => (&mantissa[..pos], &mantissa[pos + 1..]),
        None => (mantissa, ""),
    };
    if int_digits.is_empty() && frac_digits.is_empty() {
        return Err(invalid(original));
    }

    // Accumulate all digits as one integer; the fraction contributes a
    // power-of-radix denominator.
    let mut acc: i128 = 0;
    for ch in int_digits.chars().chain(frac_digits.chars()) {
        let digit = ch.to_digit(radix).ok_or_else(|| invalid(original))?;
        acc = acc
            .checked_mul(radix as i128)
            .and_then(|a| a.checked_add(digit as i128))
            .ok_or_else(|| invalid(original))?;
    }

    let denominator = (radix as i128)
        .checked_pow(
            u32::try_from(frac_digits.len()).map_err(|_| invalid(original))?,
        )
        .ok_or_else(|| invalid(original))?;

    let numerator = Decimal::try_from_i128_with_scale(acc, 0).map_err(|_| invalid(original))?;
    let denominator =
        Decimal::try_from_i128_with_scale(denominator, 0).map_err(|_| invalid(original))?;
    let mut value = numerator
        .checked_div(denominator)
        .ok_or_else(|| invalid(original))?;

    if let Some(exp) = exponent {
        let power: i64 = exp.parse().map_err(|_| invalid(original))?;
        if power.abs() > MAX_BINARY_EXPONENT {
            return Err(invalid(original));
        }
        let two = Decimal::from(2);
        for _ in 0..power.abs() {
            value = if power > 0 {
                value.checked_mul(two).ok_or_else(|| invalid(original))?
            } else {
                value.checked_div(two).ok_or_else(|| invalid(original))?
            };
        }
    }

    Ok(if negative { -value } else { value })
}

/// Reconstruct a decimal from a `{d, e, s}` parts object: `d` holds
/// base-10^7 digit groups (most significant first), `e` is the exponent
/// of the leading digit, and `s` is the sign.
fn parse_parts(map: &serde_json::Map<String, Json>) -> Result<Decimal, ValidationError> {
    let rendered = || Json::Object(map.clone()).to_string();

    if !is_parts_object(map) {
        return Err(invalid(rendered()));
    }

    let groups = map["d"].as_array().ok_or_else(|| invalid(rendered()))?;
    if groups.is_empty() {
        return Err(invalid(rendered()));
    }
    let exponent = map["e"].as_i64().ok_or_else(|| invalid(rendered()))?;
    let sign = map["s"].as_i64().ok_or_else(|| invalid(rendered()))?;
    if sign != 1 && sign != -1 {
        return Err(invalid(rendered()));
    }

    let mut digits = String::new();
    for (i, group) in groups.iter().enumerate() {
        let group = group.as_u64().ok_or_else(|| invalid(rendered()))?;
        if group >= 10_000_000 {
            return Err(invalid(rendered()));
        }
        if i == 0 {
            digits.push_str(&group.to_string());
        } else {
            digits.push_str(&format!("{group:07}"));
        }
    }

    let mut mantissa: i128 = 0;
    for ch in digits.chars() {
        mantissa = mantissa
            .checked_mul(10)
            .and_then(|a| a.checked_add((ch as u8 - b'0') as i128))
            .ok_or_else(|| invalid(rendered()))?;
    }

    // value = mantissa * 10^(e + 1 - digit_count)
    let shift = exponent + 1 - digits.len() as i64;
    let mut value = if shift >= 0 {
        for _ in 0..shift {
            mantissa = mantissa.checked_mul(10).ok_or_else(|| invalid(rendered()))?;
        }
        Decimal::try_from_i128_with_scale(mantissa, 0).map_err(|_| invalid(rendered()))?
    } else {
        let mut scale = (-shift) as u32;
        // Trailing zero groups inflate the scale past what the canonical
        // representation holds; shed them before giving up.
        while scale > 28 && mantissa % 10 == 0 {
            mantissa /= 10;
            scale -= 1;
        }
        Decimal::try_from_i128_with_scale(mantissa, scale).map_err(|_| invalid(rendered()))?
    };

    if sign == -1 {
        value = -value;
    }
    Ok(value)
}
