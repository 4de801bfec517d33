use once_cell::sync::Lazy;
use regex::Regex;

// Percentages are rewritten textually before evaluation. Operands must be plain numeric
// literals; anything richer is left alone and will fail to evaluate.
static PERCENT_OF: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]*\.?[0-9]+)\s*%\s*of\s*([0-9]*\.?[0-9]+)").unwrap());
static PERCENT_ADD: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]*\.?[0-9]+)\s*\+\s*([0-9]*\.?[0-9]+)%").unwrap());
static PERCENT_SUB: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9]*\.?[0-9]+)\s*-\s*([0-9]*\.?[0-9]+)%").unwrap());

// `X % of Y`, then `X + Y%`, then `X - Y%`; each a single left-to-right pass
pub fn rewrite_percentages(expr: &str) -> String {
    let of = PERCENT_OF.replace_all(expr, "(${1} / 100) * ${2}");
    let added = PERCENT_ADD.replace_all(&of, "(${1}) + ((${1}) * (${2}) / 100)");
    PERCENT_SUB.replace_all(&added, "(${1}) - ((${1}) * (${2}) / 100)").into_owned()
}
