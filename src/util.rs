use inlinable_string::{InlinableString, StringExt};

pub fn char_to_string(c: char) -> InlinableString {
    let mut s = InlinableString::new();
    s.push(c);
    s
}

// Six decimal places. `{:.6}` breaks exact ties to even; here they go away from zero.
// An exact tie has exactly seven decimals, which makes `x * 128` a whole number.
fn fixed6(x: f64) -> String {
    let wide = format!("{:.7}", x.abs());
    if (x * 128.0).fract() == 0.0 && wide.ends_with('5') {
        if let Ok(digits) = wide.replace('.', "").parse::<u128>() {
            let n = digits / 10 + 1;
            let sign = if x < 0.0 { "-" } else { "" };
            return format!("{}{}.{:06}", sign, n / 1_000_000, n % 1_000_000);
        }
    }
    format!("{:.6}", x)
}

// Six decimal places, then drop trailing zeros and a dangling decimal point.
pub fn format_fixed(x: f64) -> String {
    let s = fixed6(x);
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}

#[cfg(test)]
mod test {
    use super::format_fixed;

    #[test]
    fn fixed_formatting() {
        let cases = [
            (1000.0, "1000"),
            (10.5, "10.5"),
            (0.0, "0"),
            (1.0 / 3.0, "0.333333"),
            (0.62137100000001, "0.621371"),
            (2.0000004, "2"),
            (0.0078125, "0.007813"),
            (-0.0078125, "-0.007813"),
            (1.0078125, "1.007813"),
            (0.00390625, "0.003906"),
            (3.5, "3.5"),
        ];
        for (x, expected) in cases {
            assert_eq!(format_fixed(x), expected);
        }
    }
}
