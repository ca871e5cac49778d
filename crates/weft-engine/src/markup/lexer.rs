//! # Lexer - Tokenizing Markup Source
//!
//! Breaks markup into start tags, end tags, comments and text runs using
//! [Logos]. The lexer is lossless: every byte of the input appears in
//! exactly one token, and anything Logos cannot match (a stray `<`, say)
//! comes back as [`TokenKind::Text`].
//!
//! [Logos]: https://docs.rs/logos
//!
//! ```
//! use weft_engine::markup::lexer::lex;
//!
//! let input = "<div class=\"a\">x &amp; y</div>";
//! let reconstructed: String = lex(input).iter().map(|t| t.text).collect();
//! assert_eq!(input, reconstructed);
//! ```

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"")]
pub enum TokenKind {
    /// `<tag attr="v" flag>` or the self-closing `<tag/>`
    #[regex(r#"<[A-Za-z][A-Za-z0-9-]*([ \t\r\n]+[^ \t\r\n<>"'/=]+([ \t\r\n]*=[ \t\r\n]*("[^"]*"|'[^']*'|[^ \t\r\n<>"'=`]+))?)*[ \t\r\n]*/?>"#)]
    StartTag,

    /// `</tag>`
    #[regex(r"</[A-Za-z][A-Za-z0-9-]*[ \t\r\n]*>")]
    EndTag,

    /// `<!-- ... -->`
    #[regex(r"<!--([^-]|-[^-])*-->")]
    Comment,

    /// Character data up to the next `<`
    #[regex(r"[^<]+")]
    Text,
}

/// A lexed token with its kind and text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

/// Lex the input into a sequence of tokens.
pub fn lex(input: &str) -> Vec<Token<'_>> {
    lex_with_spans(input)
        .into_iter()
        .map(|(token, _)| token)
        .collect()
}

/// Lex and return tokens along with their byte spans.
pub fn lex_with_spans(input: &str) -> Vec<(Token<'_>, std::ops::Range<usize>)> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(input);

    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let text = lexer.slice();
        // Logos error means an unrecognized character - treat as TEXT
        let kind = result.unwrap_or(TokenKind::Text);
        tokens.push((Token { kind, text }, span));
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn token(kind: TokenKind, text: &str) -> Token<'_> {
        Token { kind, text }
    }

    #[test]
    fn lex_empty_input() {
        assert_eq!(lex(""), vec![]);
    }

    #[test]
    fn lex_element_with_text() {
        assert_eq!(
            lex("<b>bold</b>"),
            vec![
                token(TokenKind::StartTag, "<b>"),
                token(TokenKind::Text, "bold"),
                token(TokenKind::EndTag, "</b>"),
            ]
        );
    }

    #[test]
    fn lex_attributes_in_every_quoting_style() {
        let tokens = lex(r#"<td colspan=2 class="a b" title='x' hidden>"#);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::StartTag);
    }

    #[test]
    fn lex_self_closing_tag() {
        assert_eq!(lex("<br/>"), vec![token(TokenKind::StartTag, "<br/>")]);
    }

    #[test]
    fn lex_comment() {
        assert_eq!(
            lex("<!-- note -->x"),
            vec![
                token(TokenKind::Comment, "<!-- note -->"),
                token(TokenKind::Text, "x"),
            ]
        );
    }

    #[test]
    fn lex_stray_angle_bracket_is_text() {
        let tokens = lex("a < b");
        let reconstructed: String = tokens.iter().map(|t| t.text).collect();

        assert_eq!(reconstructed, "a < b");
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Text));
    }

    #[test]
    fn lex_spans_cover_input() {
        let input = "<p>one</p><p>two</p>";
        let spans: Vec<_> = lex_with_spans(input)
            .into_iter()
            .map(|(_, span)| span)
            .collect();

        assert_eq!(spans.first().map(|s| s.start), Some(0));
        assert_eq!(spans.last().map(|s| s.end), Some(input.len()));
        assert!(spans.windows(2).all(|pair| pair[0].end == pair[1].start));
    }
}
