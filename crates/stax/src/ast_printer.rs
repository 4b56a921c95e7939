//! Pretty-printing visitor for the AST.
//!
//! Prints one line per node with two-space indentation per depth level. The
//! enter/exit hooks only adjust the indentation; the `visit` hooks write the
//! line before any child is printed.

use std::convert::Infallible;

use crate::ast::{
    Assignment, BinaryExpr, Number, Print, Program, StatementList, UnaryExpr, Variable, Visitor,
};
use crate::io::OutputWriter;

/// Indentation unit, one per tree level.
const INDENT: &str = "  ";

/// Writes an indented dump of a program tree, e.g.
///
/// ```text
/// [Program] at 1:1
///   [StatementList] at 1:1
///     [Assignment] at 1:1
///       [Variable(a)] at 1:1
///       [Number(1)] at 1:5
/// ```
pub struct AstPrinter<'w> {
    out: &'w mut dyn OutputWriter,
    level: usize,
}

impl<'w> AstPrinter<'w> {
    pub fn new(out: &'w mut dyn OutputWriter) -> Self {
        Self { out, level: 0 }
    }

    /// Prints the whole tree rooted at `program`.
    pub fn print(&mut self, program: &Program) {
        if let Err(never) = program.accept(self) {
            match never {}
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.level {
            self.out.write_str(INDENT);
        }
        self.out.write_str(text);
        self.out.write_char('\n');
    }

    fn enter(&mut self) -> Result<(), Infallible> {
        self.level += 1;
        Ok(())
    }

    fn leave(&mut self) -> Result<(), Infallible> {
        self.level -= 1;
        Ok(())
    }
}

impl Visitor for AstPrinter<'_> {
    type Error = Infallible;

    fn visit_program(&mut self, node: &Program) -> Result<(), Infallible> {
        self.line(&format!("[Program] at {}", node.pos));
        Ok(())
    }

    fn pre_visit_statement_list(&mut self, _node: &StatementList) -> Result<(), Infallible> {
        self.enter()
    }
    fn visit_statement_list(&mut self, node: &StatementList) -> Result<(), Infallible> {
        self.line(&format!("[StatementList] at {}", node.pos));
        Ok(())
    }
    fn post_visit_statement_list(&mut self, _node: &StatementList) -> Result<(), Infallible> {
        self.leave()
    }

    fn pre_visit_assignment(&mut self, _node: &Assignment) -> Result<(), Infallible> {
        self.enter()
    }
    fn visit_assignment(&mut self, node: &Assignment) -> Result<(), Infallible> {
        self.line(&format!("[Assignment] at {}", node.pos));
        Ok(())
    }
    fn post_visit_assignment(&mut self, _node: &Assignment) -> Result<(), Infallible> {
        self.leave()
    }

    fn pre_visit_print(&mut self, _node: &Print) -> Result<(), Infallible> {
        self.enter()
    }
    fn visit_print(&mut self, node: &Print) -> Result<(), Infallible> {
        self.line(&format!("[Print] at {}", node.pos));
        Ok(())
    }
    fn post_visit_print(&mut self, _node: &Print) -> Result<(), Infallible> {
        self.leave()
    }

    fn pre_visit_unary(&mut self, _node: &UnaryExpr) -> Result<(), Infallible> {
        self.enter()
    }
    fn visit_unary(&mut self, node: &UnaryExpr) -> Result<(), Infallible> {
        self.line(&format!("[UnaryExpr({})] at {}", node.op, node.pos));
        Ok(())
    }
    fn post_visit_unary(&mut self, _node: &UnaryExpr) -> Result<(), Infallible> {
        self.leave()
    }

    fn pre_visit_binary(&mut self, _node: &BinaryExpr) -> Result<(), Infallible> {
        self.enter()
    }
    fn visit_binary(&mut self, node: &BinaryExpr) -> Result<(), Infallible> {
        self.line(&format!("[BinaryExpr({})] at {}", node.op, node.pos));
        Ok(())
    }
    fn post_visit_binary(&mut self, _node: &BinaryExpr) -> Result<(), Infallible> {
        self.leave()
    }

    fn pre_visit_variable(&mut self, _node: &Variable) -> Result<(), Infallible> {
        self.enter()
    }
    fn visit_variable(&mut self, node: &Variable) -> Result<(), Infallible> {
        self.line(&format!("[Variable({})] at {}", node.name, node.pos));
        Ok(())
    }
    fn post_visit_variable(&mut self, _node: &Variable) -> Result<(), Infallible> {
        self.leave()
    }

    fn pre_visit_number(&mut self, _node: &Number) -> Result<(), Infallible> {
        self.enter()
    }
    fn visit_number(&mut self, node: &Number) -> Result<(), Infallible> {
        self.line(&format!("[Number({})] at {}", node.lexeme, node.pos));
        Ok(())
    }
    fn post_visit_number(&mut self, _node: &Number) -> Result<(), Infallible> {
        self.leave()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::CollectOutput;
    use crate::lex::tokenize;
    use crate::parse::parse;

    fn dump(source: &str) -> String {
        let program = parse(tokenize(source).unwrap()).unwrap();
        let mut out = CollectOutput::new();
        AstPrinter::new(&mut out).print(&program);
        out.into_output()
    }

    #[test]
    fn nested_expression_dump() {
        assert_eq!(
            dump("a = 1 + 2 * 3;"),
            "[Program] at 1:1\n\
             \x20 [StatementList] at 1:1\n\
             \x20   [Assignment] at 1:1\n\
             \x20     [Variable(a)] at 1:1\n\
             \x20     [BinaryExpr(+)] at 1:5\n\
             \x20       [Number(1)] at 1:5\n\
             \x20       [BinaryExpr(*)] at 1:9\n\
             \x20         [Number(2)] at 1:9\n\
             \x20         [Number(3)] at 1:13\n"
        );
    }

    #[test]
    fn print_and_unary_nodes() {
        let text = dump("x = -1; print x;");
        assert!(text.contains("[UnaryExpr(-)] at 1:5\n"));
        assert!(text.contains("[Print] at 1:9\n"));
        assert!(text.contains("[Variable(x)] at 1:15\n"));
    }
}
