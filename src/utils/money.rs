/// Converts a decimal BRL amount to whole centavos, rounding to the
/// nearest. Same rule the gateway-facing calls use.
pub fn to_centavos(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

pub fn to_brl(centavos: i64) -> f64 {
    centavos as f64 / 100.0
}
