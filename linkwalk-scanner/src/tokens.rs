use scraper::{Html, Node};

/// A markup event, in document order.
///
/// Attributes follow the start tag they belong to. A token stream is an
/// iterator of `Result<Token, ScanError>`: an `Err` item is a stream error
/// and the end of the iterator is end-of-file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    StartTag(String),
    Attr {
        name: String,
        value: String,
        has_more: bool,
    },
    Text(String),
}

impl Token {
    pub fn start(name: impl Into<String>) -> Self {
        Token::StartTag(name.into())
    }

    pub fn attr(name: impl Into<String>, value: impl Into<String>, has_more: bool) -> Self {
        Token::Attr {
            name: name.into(),
            value: value.into(),
            has_more,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Token::Text(content.into())
    }
}

/// Tokenize an HTML document.
///
/// The body is parsed with html5ever (through `scraper`), which recovers
/// from malformed markup, then flattened back into start-tag, attribute and
/// text events. Whitespace-only text is dropped.
pub fn tokenize(body: &str) -> Vec<Token> {
    let document = Html::parse_document(body);
    let mut tokens = Vec::new();

    for node in document.tree.root().descendants() {
        match node.value() {
            Node::Element(element) => {
                tokens.push(Token::StartTag(element.name().to_string()));

                let attrs: Vec<(&str, &str)> = element.attrs().collect();
                let last = attrs.len().saturating_sub(1);
                for (i, (name, value)) in attrs.into_iter().enumerate() {
                    tokens.push(Token::attr(name, value, i < last));
                }
            }
            Node::Text(text) => {
                let content: &str = text;
                if !content.trim().is_empty() {
                    tokens.push(Token::Text(content.to_string()));
                }
            }
            _ => {}
        }
    }

    tokens
}
