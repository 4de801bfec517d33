use chrono::{NaiveDate, Utc};
use inlinable_string::InlinableString;
use std::collections::HashMap;

use crate::value::Value;

// Variables of one session. Bindings are only ever added or overwritten in place:
// deleting the line that defined a variable does not remove it.
#[derive(Clone, Debug, Default)]
pub struct Env {
    entries: Vec<(InlinableString, Value)>,
    index: HashMap<InlinableString, usize>,
}

impl Env {
    // Env seeded with `today` bound to the current UTC date
    pub fn new() -> Self {
        Env::with_today(Utc::now().date_naive())
    }

    pub fn with_today(today: NaiveDate) -> Self {
        let mut env = Env::default();
        env.set("today", Value::Date(today));
        env
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.index.get(name).map(|&i| &self.entries[i].1)
    }

    // Overwrite keeps the variable's original position in iteration order
    pub fn set(&mut self, name: &str, value: Value) {
        match self.index.get(name) {
            Some(&i) => self.entries[i].1 = value,
            None => {
                let name = InlinableString::from(name);
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (&**name, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::Env;
    use crate::value::Value;
    use chrono::{NaiveDate, Utc};

    #[test]
    fn today_is_the_utc_date() {
        let before = Utc::now().date_naive();
        let env = Env::new();
        let after = Utc::now().date_naive();
        let today = env.get("today").copied();
        assert!(today == Some(Value::Date(before)) || today == Some(Value::Date(after)));
        assert_eq!(env.len(), 1);
    }

    #[test]
    fn insertion_order_survives_overwrite() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut env = Env::with_today(today);
        env.set("a", Value::Num(1.0));
        env.set("b", Value::Num(2.0));
        env.set("a", Value::Num(3.0));
        let names: Vec<_> = env.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["today", "a", "b"]);
        assert_eq!(env.get("a"), Some(&Value::Num(3.0)));
        assert_eq!(env.get("today"), Some(&Value::Date(today)));
        assert_eq!(env.get("c"), None);
        assert_eq!(env.len(), 3);
    }
}
