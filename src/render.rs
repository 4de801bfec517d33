use anyhow::Result;
use itertools::Itertools;
use serde::Serialize;
use std::fmt;

use crate::units::UnsupportedConversion;
use crate::util::format_fixed;
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Success,
    Error,
}

// Inline result attached to one line
#[derive(Debug, Clone, PartialEq)]
pub enum Annotation {
    // unit conversion result
    Converted(f64),
    // value bound by an assignment
    Stored(Value),
    // result of a trailing `=` calculation
    Computed(f64),
    Unsupported(UnsupportedConversion),
    // the expression could not be evaluated
    Failed,
}

impl Annotation {
    pub fn kind(&self) -> AnnotationKind {
        match self {
            Annotation::Converted(_) | Annotation::Stored(_) | Annotation::Computed(_) => AnnotationKind::Success,
            Annotation::Unsupported(_) | Annotation::Failed => AnnotationKind::Error,
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Annotation::Converted(x) => write!(f, "= {}", format_fixed(*x)),
            Annotation::Stored(value) => write!(f, "({})", value),
            Annotation::Computed(x) => write!(f, "{}", Value::Num(*x)),
            Annotation::Unsupported(e) => write!(f, "{}", e),
            Annotation::Failed => write!(f, "Error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedLine {
    pub text: String,
    pub annotation: Option<Annotation>,
}

#[derive(Serialize)]
struct JsonLine<'a> {
    text: &'a str,
    annotation: Option<String>,
    kind: Option<AnnotationKind>,
}

impl<'a> From<&'a AnnotatedLine> for JsonLine<'a> {
    fn from(line: &'a AnnotatedLine) -> Self {
        JsonLine {
            text: &line.text,
            annotation: line.annotation.as_ref().map(ToString::to_string),
            kind: line.annotation.as_ref().map(Annotation::kind),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Format {
    #[default]
    Plain,
    Html,
    Json,
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn plain_line(line: &AnnotatedLine) -> String {
    match &line.annotation {
        Some(annotation) => format!("{} {}", line.text, annotation),
        None => line.text.clone(),
    }
}

fn html_line(line: &AnnotatedLine) -> String {
    match &line.annotation {
        Some(annotation) => {
            let class = match annotation.kind() {
                AnnotationKind::Success => "result",
                AnnotationKind::Error => "result error",
            };
            format!("{} <span class=\"{}\">{}</span>", escape_html(&line.text), class, escape_html(&annotation.to_string()))
        }
        None => escape_html(&line.text),
    }
}

pub fn render_line(line: &AnnotatedLine, format: Format) -> Result<String> {
    Ok(match format {
        Format::Plain => plain_line(line),
        Format::Html => html_line(line),
        Format::Json => serde_json::to_string(&JsonLine::from(line))?,
    })
}

// Lines are joined with `\n`, so a document re-renders with its original line structure.
pub fn render(lines: &[AnnotatedLine], format: Format) -> Result<String> {
    Ok(match format {
        Format::Plain => lines.iter().map(plain_line).join("\n"),
        Format::Html => lines.iter().map(html_line).join("\n"),
        Format::Json => serde_json::to_string_pretty(&lines.iter().map(JsonLine::from).collect::<Vec<_>>())?,
    })
}

#[cfg(test)]
mod test {
    use super::{render, render_line, Annotation, AnnotatedLine, Format};
    use crate::units::UnsupportedConversion;
    use crate::value::Value;

    fn lines() -> Vec<AnnotatedLine> {
        vec![
            AnnotatedLine { text: "1 km to m".into(), annotation: Some(Annotation::Converted(1000.0)) },
            AnnotatedLine { text: "".into(), annotation: None },
            AnnotatedLine { text: "a = 5".into(), annotation: Some(Annotation::Stored(Value::Num(5.0))) },
            AnnotatedLine { text: "a < 6 =".into(), annotation: Some(Annotation::Failed) },
            AnnotatedLine {
                text: "1 km to kg".into(),
                annotation: Some(Annotation::Unsupported(UnsupportedConversion { from: "km".into(), to: "kg".into() })),
            },
        ]
    }

    #[test]
    fn plain() {
        assert_eq!(
            render(&lines(), Format::Plain).unwrap(),
            "1 km to m = 1000\n\na = 5 (5)\na < 6 = Error\n1 km to kg Error: Conversion from 'km' to 'kg' not supported."
        );
    }

    #[test]
    fn html() {
        let out = render(&lines(), Format::Html).unwrap();
        let out: Vec<_> = out.split('\n').collect();
        assert_eq!(out[0], "1 km to m <span class=\"result\">= 1000</span>");
        assert_eq!(out[1], "");
        assert_eq!(out[3], "a &lt; 6 = <span class=\"result error\">Error</span>");
        assert_eq!(out[4], "1 km to kg <span class=\"result error\">Error: Conversion from &#39;km&#39; to &#39;kg&#39; not supported.</span>");
    }

    #[test]
    fn json() {
        let lines = lines();
        assert_eq!(
            render_line(&lines[2], Format::Json).unwrap(),
            r#"{"text":"a = 5","annotation":"(5)","kind":"success"}"#
        );
        assert_eq!(render_line(&lines[1], Format::Json).unwrap(), r#"{"text":"","annotation":null,"kind":null}"#);
    }
}
