// SPDX-FileCopyrightText: 2026 Andrew Gunnerson
// SPDX-License-Identifier: GPL-3.0-only

//! Typed builder for edify updater-script fragments.
//!
//! Statements are kept as data until the fragment is rendered. Every string
//! that ends up inside a literal goes through [`quote`], so model names and
//! firmware versions read from the input archive cannot terminate a literal
//! early or inject additional statements.

use std::fmt::{self, Write};

/// Write `s` as a double-quoted edify string literal. The recovery lexer
/// understands `\"`, `\\`, `\n`, `\t`, and `\xNN`.
pub fn quote(f: &mut impl Write, s: &str) -> fmt::Result {
    f.write_char('"')?;

    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\t' => f.write_str("\\t")?,
            c if c.is_ascii_control() => write!(f, "\\x{:02x}", u32::from(c))?,
            c => f.write_char(c)?,
        }
    }

    f.write_char('"')
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Str(String),
    Int(u64),
    Call { name: String, args: Vec<Expr> },
    Eq(Box<Expr>, Box<Expr>),
    Ne(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn str(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }

    pub fn call(name: impl Into<String>, args: impl IntoIterator<Item = Expr>) -> Self {
        Self::Call {
            name: name.into(),
            args: args.into_iter().collect(),
        }
    }

    /// `getprop("<prop>")`
    pub fn getprop(prop: &str) -> Self {
        Self::call("getprop", [Self::str(prop)])
    }

    /// `<self> == <other>`
    pub fn is(self, other: impl Into<Expr>) -> Self {
        Self::Eq(Box::new(self), Box::new(other.into()))
    }

    /// `<self> != <other>`
    pub fn is_not(self, other: impl Into<Expr>) -> Self {
        Self::Ne(Box::new(self), Box::new(other.into()))
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        Self::str(s)
    }
}

impl From<String> for Expr {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<u64> for Expr {
    fn from(n: u64) -> Self {
        Self::Int(n)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => quote(f, s),
            Self::Int(n) => write!(f, "{n}"),
            Self::Call { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_char(')')
            }
            Self::Eq(a, b) => write!(f, "{a} == {b}"),
            Self::Ne(a, b) => write!(f, "{a} != {b}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Statement {
    /// `# <text>`. Line breaks are folded into spaces.
    Comment(String),
    /// `ui_print("<text>");`
    Print(String),
    /// `<expr>;`
    Expr(Expr),
    /// `assert(<expr>);`
    Assert(Expr),
    /// `ifelse (<c1> &&\n<c2>,\n<body>\n,"");`
    ///
    /// Each condition is placed on its own line, matching how AOSP-style
    /// device scripts are laid out.
    IfElse {
        conditions: Vec<Expr>,
        body: Vec<Statement>,
    },
    /// `<c1> || <c2> || abort("<message>");`
    AbortUnless {
        conditions: Vec<Expr>,
        message: String,
    },
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Comment(text) => {
                f.write_str("# ")?;
                for c in text.chars() {
                    f.write_char(if c == '\n' || c == '\r' { ' ' } else { c })?;
                }
                Ok(())
            }
            Self::Print(text) => {
                f.write_str("ui_print(")?;
                quote(f, text)?;
                f.write_str(");")
            }
            Self::Expr(expr) => write!(f, "{expr};"),
            Self::Assert(expr) => write!(f, "assert({expr});"),
            Self::IfElse { conditions, body } => {
                f.write_str("ifelse (")?;
                for (i, cond) in conditions.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" &&\n")?;
                    }
                    write!(f, "{cond}")?;
                }
                f.write_str(",\n")?;
                for statement in body {
                    writeln!(f, "{statement}")?;
                }
                f.write_str(",\"\");")
            }
            Self::AbortUnless {
                conditions,
                message,
            } => {
                for cond in conditions {
                    write!(f, "{cond} || ")?;
                }
                write!(f, "{});", Expr::call("abort", [Expr::str(message.as_str())]))
            }
        }
    }
}

/// An append-only sequence of statements. Rendering produces one statement
/// per line, terminated by a newline.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EdifyScript {
    statements: Vec<Statement>,
}

impl EdifyScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn into_statements(self) -> Vec<Statement> {
        self.statements
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn comment(&mut self, text: impl Into<String>) {
        self.push(Statement::Comment(text.into()));
    }

    pub fn print(&mut self, text: impl Into<String>) {
        self.push(Statement::Print(text.into()));
    }

    pub fn package_extract_file(&mut self, source: &str, target: &str) {
        self.push(Statement::Expr(Expr::call(
            "package_extract_file",
            [source.into(), target.into()],
        )));
    }
}

impl fmt::Display for EdifyScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{statement}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_escapes() {
        let mut s = String::new();
        quote(&mut s, "a\"b\\c\nd\te\x01f").unwrap();

        assert_eq!(s, r#""a\"b\\c\nd\te\x01f""#);
    }

    #[test]
    fn quote_keeps_unicode() {
        let mut s = String::new();
        quote(&mut s, "SM-G975F/ß").unwrap();

        assert_eq!(s, "\"SM-G975F/ß\"");
    }

    #[test]
    fn render_calls() {
        let expr = Expr::call("write_data_bt", [
            Expr::str("a"),
            Expr::str("b"),
            Expr::Int(8),
            Expr::Int(100),
        ]);
        assert_eq!(expr.to_string(), r#"write_data_bt("a", "b", 8, 100)"#);

        let expr = Expr::getprop("ro.boot.bootloader").is_not("G970FXXU9");
        assert_eq!(expr.to_string(), r#"getprop("ro.boot.bootloader") != "G970FXXU9""#);
    }

    #[test]
    fn render_statements() {
        let mut script = EdifyScript::new();
        script.comment("line one\nline two");
        script.print("Patching dtbo image unconditionally...");
        script.package_extract_file("dtbo.img", "/dev/block/by-name/dtbo");

        assert_eq!(
            script.to_string(),
            "# line one line two\n\
             ui_print(\"Patching dtbo image unconditionally...\");\n\
             package_extract_file(\"dtbo.img\", \"/dev/block/by-name/dtbo\");\n",
        );
    }

    #[test]
    fn render_ifelse() {
        let statement = Statement::IfElse {
            conditions: vec![
                Expr::getprop("a").is("1"),
                Expr::getprop("b").is_not("2"),
            ],
            body: vec![Statement::Print("x".to_owned())],
        };

        assert_eq!(
            statement.to_string(),
            "ifelse (getprop(\"a\") == \"1\" &&\n\
             getprop(\"b\") != \"2\",\n\
             ui_print(\"x\");\n\
             ,\"\");",
        );
    }

    #[test]
    fn render_abort_unless() {
        let statement = Statement::AbortUnless {
            conditions: vec![
                Expr::getprop("m").is("A"),
                Expr::getprop("m").is("B"),
            ],
            message: "nope".to_owned(),
        };

        assert_eq!(
            statement.to_string(),
            r#"getprop("m") == "A" || getprop("m") == "B" || abort("nope");"#,
        );
    }

    #[test]
    fn injection_stays_inside_literal() {
        let mut script = EdifyScript::new();
        script.package_extract_file("x\"); format(\"/data", "/dev/null");

        assert_eq!(
            script.to_string(),
            "package_extract_file(\"x\\\"); format(\\\"/data\", \"/dev/null\");\n",
        );
    }
}
