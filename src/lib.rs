use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
#[cfg(target_family="wasm")]
use wasm_bindgen::prelude::*;

#[cfg(target_family="wasm")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

pub mod parse;
mod util;
pub mod value;
pub mod env;
pub mod eval;
pub mod rewrite;
pub mod units;
pub mod date;
pub mod render;
#[cfg(not(target_family="wasm"))]
pub mod watch;

pub use env::Env;
pub use render::{render, render_line, AnnotatedLine, Annotation, AnnotationKind, Format};
pub use units::UnsupportedConversion;
pub use value::Value;

static ASSIGNMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(\S.*)$").unwrap());

// How a single line is treated. Checked in declaration order; the first match wins.
#[derive(Debug, PartialEq)]
pub enum LineKind<'a> {
    Blank,
    UnitConversion(Result<f64, UnsupportedConversion>),
    Assignment { name: &'a str, rhs: &'a str },
    // expression before the final `=`
    TrailingEquals(&'a str),
    PlainText,
}

pub fn classify(line: &str) -> LineKind<'_> {
    if line.trim().is_empty() {
        return LineKind::Blank;
    }
    if let Some(result) = units::convert(line) {
        return LineKind::UnitConversion(result);
    }
    if let Some(caps) = ASSIGNMENT.captures(line) {
        if let (Some(name), Some(rhs)) = (caps.get(1), caps.get(2)) {
            return LineKind::Assignment { name: name.as_str(), rhs: rhs.as_str() };
        }
    }
    match line.trim_end().strip_suffix('=') {
        Some(expr) => LineKind::TrailingEquals(expr),
        None => LineKind::PlainText,
    }
}

// One editing session. The environment lives as long as the session and is shared by every
// run, so variables from earlier documents remain visible to later ones.
pub struct Notepad {
    env: Env,
}

impl Notepad {
    pub fn new() -> Self {
        Notepad::with_env(Env::new())
    }

    pub fn with_today(today: NaiveDate) -> Self {
        Notepad::with_env(Env::with_today(today))
    }

    pub fn with_env(env: Env) -> Self {
        Notepad { env }
    }

    pub fn env(&self) -> &Env {
        &self.env
    }

    pub fn variables(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.env.iter()
    }

    fn interpret_line(&mut self, line: &str) -> Option<Annotation> {
        let kind = classify(line);
        log::debug!("{:?} classified as {:?}", line, kind);
        match kind {
            LineKind::Blank | LineKind::PlainText => None,
            LineKind::UnitConversion(Ok(x)) => Some(Annotation::Converted(x)),
            LineKind::UnitConversion(Err(e)) => Some(Annotation::Unsupported(e)),
            LineKind::Assignment { name, rhs } => {
                let value = match date::apply_date_math(rhs) {
                    Some(date) => Value::Date(date),
                    None => match eval::evaluate(rhs, &self.env) {
                        Ok(x) => Value::Num(x),
                        Err(e) => {
                            // the previous binding, if any, stays in place
                            log::debug!("dropping assignment to {}: {:#}", name, e);
                            return None;
                        }
                    }
                };
                self.env.set(name, value);
                Some(Annotation::Stored(value))
            },
            LineKind::TrailingEquals(expr) => match eval::evaluate(expr, &self.env) {
                Ok(x) => Some(Annotation::Computed(x)),
                Err(e) => {
                    log::debug!("{:?} failed: {:#}", expr, e);
                    Some(Annotation::Failed)
                }
            },
        }
    }

    // Run the whole document top to bottom. Lines are split on `\n` only, so joining the
    // texts with `\n` gives back the input exactly.
    pub fn run(&mut self, document: &str) -> Vec<AnnotatedLine> {
        document.split('\n').map(|line| AnnotatedLine {
            text: line.to_string(),
            annotation: self.interpret_line(line),
        }).collect()
    }
}

impl Default for Notepad {
    fn default() -> Self {
        Notepad::new()
    }
}

#[cfg(target_family="wasm")]
thread_local! {
    static JS_CONTEXT: std::cell::RefCell<Option<Notepad>> = std::cell::RefCell::new(None);
}

#[cfg(target_family="wasm")]
#[wasm_bindgen]
pub fn init_context() {
    JS_CONTEXT.with(|ctx| *ctx.borrow_mut() = Some(Notepad::new()));
}

// Called on every change of the text surface; returns HTML for the output pane
#[cfg(target_family="wasm")]
#[wasm_bindgen]
pub fn run_document(document: &str) -> String {
    JS_CONTEXT.with(|ctx| {
        let mut ctx = ctx.borrow_mut();
        let notepad = ctx.get_or_insert_with(Notepad::new);
        match render(&notepad.run(document), Format::Html) {
            Ok(html) => html,
            Err(e) => format!("Error: {:?}", e)
        }
    })
}

#[cfg(target_family="wasm")]
#[wasm_bindgen]
pub fn variables() -> String {
    JS_CONTEXT.with(|ctx| {
        let ctx = ctx.borrow();
        let vars: serde_json::Map<String, serde_json::Value> = ctx.iter()
            .flat_map(Notepad::variables)
            .map(|(name, value)| (name.to_string(), serde_json::Value::String(value.to_string())))
            .collect();
        serde_json::Value::Object(vars).to_string()
    })
}

#[cfg(target_family="wasm")]
#[wasm_bindgen]
pub fn deinit_context() {
    JS_CONTEXT.with(|ctx| {
        ctx.borrow_mut().take();
    });
}

#[cfg(test)]
mod test {
    use crate::{classify, LineKind, Notepad, UnsupportedConversion};
    use chrono::NaiveDate;

    #[test]
    fn classification() {
        let test_cases = [
            ("", LineKind::Blank),
            ("   \t", LineKind::Blank),
            ("1 m to km", LineKind::UnitConversion(Ok(0.001))),
            ("1 km to kg", LineKind::UnitConversion(Err(UnsupportedConversion { from: "km".into(), to: "kg".into() }))),
            ("x = 1 + 2", LineKind::Assignment { name: "x", rhs: "1 + 2" }),
            ("  _tmp2=3 =", LineKind::Assignment { name: "_tmp2", rhs: "3 =" }),
            ("1 + 2 =", LineKind::TrailingEquals("1 + 2 ")),
            ("total =  ", LineKind::TrailingEquals("total ")),
            ("x =", LineKind::TrailingEquals("x ")),
            ("2x = 4", LineKind::PlainText),
            ("shopping list", LineKind::PlainText),
            ("1 + 2", LineKind::PlainText),
        ];
        for (input, expected) in test_cases {
            assert_eq!(classify(input), expected, "classifying {:?}", input);
        }
    }

    #[test]
    fn end_to_end_tests() {
        let mut notepad = Notepad::with_today(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        let test_cases = [
            ("1 km to m", "1 km to m = 1000"),
            ("1 GB to MB", "1 GB to MB = 1000"),
            ("3 furlongs to m", "3 furlongs to m Error: Conversion from 'furlongs' to 'm' not supported."),
            ("price = 10", "price = 10 (10)"),
            ("price * 2 =", "price * 2 = 20"),
            ("50 % of 200 =", "50 % of 200 = 100"),
            ("100 + 10% =", "100 + 10% = 110"),
            ("100 - 10% =", "100 - 10% = 90"),
            ("sqrt(16) =", "sqrt(16) = 4"),
            ("alert(1) =", "alert(1) = Error"),
            ("due = 2024-01-31 + 1 month", "due = 2024-01-31 + 1 month (2024-03-02)"),
            ("next = today + 1 day", "next = today + 1 day"),
            ("rent = 1200 / 0", "rent = 1200 / 0"),
            ("0.1 + 0.2 =", "0.1 + 0.2 = 0.30000000000000004"),
            ("just a note", "just a note"),
        ];
        for (input, expected_result) in test_cases {
            let lines = notepad.run(input);
            let rendered = crate::render(&lines, crate::Format::Plain).unwrap();
            println!("{} rendered as {}; expected {}", input, rendered, expected_result);
            assert_eq!(rendered, expected_result);
        }
    }
}
