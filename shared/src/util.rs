//! Id and clock helpers

use rand::Rng;

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Random lowercase base36 string of `len` characters
pub fn random_base36(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// `{prefix}_{millis}_{9 base36}`, the shape of simulated and cached ids
pub fn timestamped_id(prefix: &str, millis: i64) -> String {
    format!("{}_{}_{}", prefix, millis, random_base36(9))
}

/// `PB` followed by the last eight digits of the millisecond clock
pub fn order_number(millis: i64) -> String {
    let digits = millis.unsigned_abs().to_string();
    let tail = &digits[digits.len().saturating_sub(8)..];
    format!("PB{}", tail)
}

/// JavaScript-compatible 32-bit string hash
///
/// `h = h * 31 + c` over UTF-16 code units with 32-bit wraparound.
pub fn string_hash(input: &str) -> i32 {
    input.encode_utf16().fold(0i32, |acc, unit| {
        acc.wrapping_shl(5)
            .wrapping_sub(acc)
            .wrapping_add(i32::from(unit))
    })
}
