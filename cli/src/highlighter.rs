use nu_ansi_term::{Color, Style};
use quill_core::lexer::{Lexer, Token, TokenKind};
use reedline::StyledText;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Class {
    Plain,
    Keyword,
    Operator,
    Constant,
    Number,
    Comment,
    Function,
    Variable,
    Punctuation,
}

impl Class {
    fn color(self) -> Color {
        match self {
            Class::Plain | Class::Operator | Class::Punctuation => Color::White,
            Class::Keyword => Color::Magenta,
            Class::Constant | Class::Number => Color::Cyan,
            Class::Comment => Color::DarkGray,
            Class::Function => Color::Blue,
            Class::Variable => Color::Red,
        }
    }

    fn of(token: &Token, next: Option<&Token>) -> Class {
        use TokenKind::*;
        match token.kind {
            True | False => Class::Constant,
            And | Or | Not => Class::Operator,
            kind if kind.is_keyword() => Class::Keyword,
            Integer | Float => Class::Number,
            Identifier if next.is_some_and(|next| next.kind == LeftParen) => Class::Function,
            Identifier => Class::Variable,
            LeftParen | RightParen | Comma => Class::Punctuation,
            EndOfInput => Class::Plain,
            _ => Class::Operator,
        }
    }
}

/// Colors REPL input token by token. Text after a lexing error is left plain.
pub struct Highlighter;

impl reedline::Highlighter for Highlighter {
    fn highlight(&self, line: &str, _: usize) -> StyledText {
        let mut output = StyledText::new();
        let tokens: Vec<Token> = Lexer::new(line).map_while(Result::ok).collect();

        let mut last = 0;
        for (i, token) in tokens.iter().enumerate() {
            push_gap(&mut output, &line[last..token.span.start]);
            let class = Class::of(token, tokens.get(i + 1));
            output.push((Style::new().fg(class.color()), token.text.clone()));
            last = token.span.end;
        }
        if let Some(rest) = line.get(last..) {
            push_gap(&mut output, rest);
        }

        output
    }
}

/// Whitespace and comments between tokens.
fn push_gap(output: &mut StyledText, gap: &str) {
    if gap.is_empty() {
        return;
    }
    let class = if gap.contains("//") {
        Class::Comment
    } else {
        Class::Plain
    };
    output.push((Style::new().fg(class.color()), gap.to_string()));
}
