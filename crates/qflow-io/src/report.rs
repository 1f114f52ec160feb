//! Flat text solution report: one `name: value` line per variable followed
//! by `Objective value: X`.

use std::fs;
use std::io;
use std::path::Path;

pub fn render_report<'a, I>(entries: I, objective: f64) -> String
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    let mut out = String::new();
    for (name, value) in entries {
        out.push_str(&format!("{name}: {value:?}\n"));
    }
    out.push_str(&format!("Objective value: {objective:?}\n"));
    out
}

pub fn write_report<'a, I>(path: impl AsRef<Path>, entries: I, objective: f64) -> io::Result<()>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    fs::write(path, render_report(entries, objective))
}
