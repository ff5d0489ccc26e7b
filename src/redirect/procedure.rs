//! Writer for procedural trigger bodies.

const INDENT: &str = "    ";

/// Accumulates a `FOR EACH ROW BEGIN ATOMIC ... END` body with nested blocks.
pub(crate) struct Procedure {
    buf: String,
    depth: usize,
}

impl Procedure {
    /// Start a row-level atomic body.
    pub fn for_each_row() -> Self {
        let mut proc = Self {
            buf: String::new(),
            depth: 0,
        };
        proc.line("FOR EACH ROW");
        proc.line("BEGIN ATOMIC");
        proc.depth = 1;
        proc
    }

    pub fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.buf.push_str(INDENT);
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    /// Emit `header` followed by `BEGIN` and indent.
    pub fn open(&mut self, header: &str) {
        self.line(header);
        self.line("BEGIN");
        self.depth += 1;
    }

    pub fn close(&mut self) {
        self.depth -= 1;
        self.line("END");
    }

    /// Close the current block and open its ELSE branch.
    pub fn otherwise(&mut self) {
        self.close();
        self.open("ELSE");
    }

    /// Emit a block that raises `message` when `condition` holds.
    pub fn raise_if(&mut self, condition: &str, message: &str) {
        self.open(&format!("IF ({})", condition));
        self.line(&format!("RAISE SQLEXCEPTION '{}';", message.replace('\'', "''")));
        self.close();
    }

    /// Close every open block, including the atomic body.
    pub fn finish(mut self) -> String {
        while self.depth > 0 {
            self.close();
        }
        self.buf.truncate(self.buf.trim_end().len());
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_blocks() {
        let mut proc = Procedure::for_each_row();
        proc.open("IF (x)");
        proc.line("a;");
        proc.otherwise();
        proc.line("b;");
        let text = proc.finish();
        assert_eq!(
            text,
            "FOR EACH ROW\nBEGIN ATOMIC\n    IF (x)\n    BEGIN\n        a;\n    END\n    ELSE\n    BEGIN\n        b;\n    END\nEND"
        );
    }

    #[test]
    fn test_raise_escapes_quotes() {
        let mut proc = Procedure::for_each_row();
        proc.raise_if("c", "it's bad");
        assert!(proc.finish().contains("RAISE SQLEXCEPTION 'it''s bad';"));
    }
}
