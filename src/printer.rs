//! The indent-aware output buffer all emitters print through.

use std::fmt::Display;

const INDENT: &str = "  ";

/// An append-only line buffer tracking the current indent depth.
///
/// Mutation is local to the emission pipeline; the buffer is drained exactly
/// once per output file.
pub struct Printer {
    lines: Vec<String>,
    depth: usize,
}

impl Printer {
    pub fn new() -> Self {
        Printer {
            lines: Vec::new(),
            depth: 0,
        }
    }

    pub fn into_string(self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    /// Appends one line (or several, when the text contains newlines) at the
    /// current depth.
    pub fn add<T: Display>(&mut self, text: T) {
        let text = text.to_string();
        for line in text.split('\n') {
            if line.is_empty() {
                self.lines.push(String::new());
            } else {
                self.lines
                    .push(format!("{}{}", INDENT.repeat(self.depth), line));
            }
        }
    }

    pub fn add_all<I, T>(&mut self, lines: I)
    where
        I: IntoIterator<Item = T>,
        T: Display,
    {
        for line in lines {
            self.add(line);
        }
    }

    /// Appends `items` joined by `sep`, one item per line, the separator
    /// trailing every line but the last.
    pub fn add_sep<I, T>(&mut self, items: I, sep: &str)
    where
        I: IntoIterator<Item = T>,
        T: Display,
    {
        let items: Vec<String> = items.into_iter().map(|i| i.to_string()).collect();
        let last = items.len().saturating_sub(1);
        for (idx, item) in items.into_iter().enumerate() {
            if idx == last {
                self.add(item);
            } else {
                self.add(format!("{}{}", item, sep));
            }
        }
    }

    pub fn newline(&mut self) {
        self.lines.push(String::new());
    }

    /// Runs `f` with the depth increased by one.
    pub fn indented<F: FnOnce(&mut Printer)>(&mut self, f: F) {
        self.depth += 1;
        f(self);
        self.depth -= 1;
    }

    /// Runs `f` only when `cond` holds; keeps call sites chainable.
    pub fn when<F: FnOnce(&mut Printer)>(&mut self, cond: bool, f: F) -> &mut Self {
        if cond {
            f(self);
        }
        self
    }

    /// `add(open)`, emit the body one level deeper, `add(close)`.
    pub fn block<F: FnOnce(&mut Printer)>(&mut self, open: &str, close: &str, f: F) {
        self.add(open);
        self.indented(f);
        self.add(close);
    }

}

impl Default for Printer {
    fn default() -> Self {
        Printer::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indent() {
        let mut p = Printer::new();
        p.add("object Foo {");
        p.indented(|p| {
            p.add("val x = 1");
            p.indented(|p| p.add("deep"));
        });
        p.add("}");
        assert_eq!(
            p.into_string(),
            "object Foo {\n  val x = 1\n    deep\n}\n"
        );
    }

    #[test]
    fn test_multiline_add() {
        let mut p = Printer::new();
        p.indented(|p| p.add("a\nb"));
        assert_eq!(p.into_string(), "  a\n  b\n");
    }

    #[test]
    fn test_add_sep() {
        let mut p = Printer::new();
        p.add_sep(["x: Int = 0", "y: Int = 0"], ",");
        assert_eq!(p.into_string(), "x: Int = 0,\ny: Int = 0\n");
    }

    #[test]
    fn test_when() {
        let mut p = Printer::new();
        p.when(false, |p| p.add("skipped"));
        p.when(true, |p| p.add("kept"));
        assert_eq!(p.into_string(), "kept\n");
    }

    #[test]
    fn test_block() {
        let mut p = Printer::new();
        p.block("if (x) {", "}", |p| p.add("body"));
        assert_eq!(p.into_string(), "if (x) {\n  body\n}\n");
    }

    #[test]
    fn test_blank_lines_not_indented() {
        let mut p = Printer::new();
        p.indented(|p| {
            p.add("a");
            p.newline();
            p.add("b");
        });
        assert_eq!(p.into_string(), "  a\n\n  b\n");
    }
}
