use chrono::NaiveDate;
use std::fmt;

// What a variable can hold: a finite number or a calendar date.
#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Value {
    Num(f64),
    Date(NaiveDate),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Shortest representation that round-trips; never uses exponent notation.
            // -0 is written as 0.
            Value::Num(x) if *x == 0.0 => write!(f, "0"),
            Value::Num(x) => write!(f, "{}", x),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}
