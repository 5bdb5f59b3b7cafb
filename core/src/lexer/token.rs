use core::fmt;

use logos::Logos;

use crate::syntax::Span;

/// Line bookkeeping threaded through the logos lexer.
///
/// `line` is 0-based; `line_start` is the byte offset where it begins.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineTracker {
    pub line: usize,
    pub line_start: usize,
}

fn newline(lex: &mut logos::Lexer<TokenKind>) -> logos::Skip {
    lex.extras.line += 1;
    lex.extras.line_start = lex.span().end;
    logos::Skip
}

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(extras = LineTracker)]
#[logos(skip r"(?:[ \t\r\f]+|//[^\n]*)")]
pub enum TokenKind {
    // Never emitted: the callback only advances the line counter.
    #[regex(r"\n", newline)]
    Newline,

    #[token("let")]
    Let,
    #[token("be")]
    Be,
    #[token("set")]
    Set,
    #[token("to")]
    To,
    #[token("if")]
    If,
    #[token("then")]
    Then,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("from")]
    From,
    #[token("step")]
    Step,
    #[token("define")]
    Define,
    #[token("function")]
    Function,
    #[token("with")]
    With,
    #[token("as")]
    As,
    #[token("return")]
    Return,
    #[token("end")]
    End,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("true")]
    True,
    #[token("false")]
    False,

    #[regex(r"[0-9]+")]
    Integer,
    #[regex(r"[0-9]+\.[0-9]+")]
    Float,
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Identifier,

    #[token("==")]
    EqualEqual,
    #[token("!=")]
    NotEqual,
    #[token("<=")]
    LessEqual,
    #[token(">=")]
    GreaterEqual,
    #[token("=")]
    Equal,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token(",")]
    Comma,

    EndOfInput,
}

impl TokenKind {
    pub fn is_keyword(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Let | Be
                | Set
                | To
                | If
                | Then
                | Else
                | While
                | For
                | From
                | Step
                | Define
                | Function
                | With
                | As
                | Return
                | End
                | And
                | Or
                | Not
                | True
                | False
        )
    }

    /// Whether an expression may begin with this token.
    pub fn starts_expression(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Integer | Float | Identifier | True | False | LeftParen | Minus | Not
        )
    }

    /// Human-readable name used in diagnostics.
    pub fn describe(self) -> &'static str {
        use TokenKind::*;
        match self {
            Newline => "newline",
            Let => "'let'",
            Be => "'be'",
            Set => "'set'",
            To => "'to'",
            If => "'if'",
            Then => "'then'",
            Else => "'else'",
            While => "'while'",
            For => "'for'",
            From => "'from'",
            Step => "'step'",
            Define => "'define'",
            Function => "'function'",
            With => "'with'",
            As => "'as'",
            Return => "'return'",
            End => "'end'",
            And => "'and'",
            Or => "'or'",
            Not => "'not'",
            True => "'true'",
            False => "'false'",
            Integer => "integer",
            Float => "floating-point number",
            Identifier => "identifier",
            EqualEqual => "'=='",
            NotEqual => "'!='",
            LessEqual => "'<='",
            GreaterEqual => "'>='",
            Equal => "'='",
            Less => "'<'",
            Greater => "'>'",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            Slash => "'/'",
            LeftParen => "'('",
            RightParen => "')'",
            Comma => "','",
            EndOfInput => "end of input",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// A lexical token. `text` is exactly the source slice it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    /// How the token reads in a diagnostic: the kind, plus the text for
    /// identifiers and numbers.
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Identifier => format!("identifier '{}'", self.text),
            TokenKind::Integer | TokenKind::Float => format!("number '{}'", self.text),
            kind => kind.describe().to_string(),
        }
    }
}
