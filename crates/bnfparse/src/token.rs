//! The parse tree produced by a successful parse and its read-only queries.

use std::{fmt, rc::Rc};

use serde::Serialize;

/// Type given to tokens produced by a literal before the enclosing rule names them.
pub const LITERAL: &str = "literal";
/// Type given to sequence nodes before the enclosing rule names them.
pub const SEQUENCE: &str = "sequence";

/// A node of the parse tree.
///
/// A token is either a leaf carrying the text it matched or an internal node owning an ordered
/// list of children, never both.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    #[serde(rename = "type")]
    token_type: Rc<str>,
    #[serde(flatten)]
    data: TokenData,
}

#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum TokenData {
    Text(Box<str>),
    Children(Vec<Token>),
}

impl Token {
    pub fn leaf(token_type: impl Into<Rc<str>>, text: impl Into<Box<str>>) -> Token {
        Token {
            token_type: token_type.into(),
            data: TokenData::Text(text.into()),
        }
    }

    pub fn node(token_type: impl Into<Rc<str>>, children: Vec<Token>) -> Token {
        Token {
            token_type: token_type.into(),
            data: TokenData::Children(children),
        }
    }

    pub(crate) fn relabel(mut self, token_type: Rc<str>) -> Token {
        self.token_type = token_type;
        self
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// The matched text of a leaf, `None` for internal nodes.
    pub fn text(&self) -> Option<&str> {
        match &self.data {
            TokenData::Text(text) => Some(text),
            TokenData::Children(_) => None,
        }
    }

    pub fn children(&self) -> &[Token] {
        match &self.data {
            TokenData::Text(_) => &[],
            TokenData::Children(children) => children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.data, TokenData::Text(_))
    }

    /// The text covered by this token: the stored text of a leaf, or the concatenated values of
    /// the children of a node. Whitespace skipped during parsing is not part of it.
    pub fn value(&self) -> String {
        let mut buf = String::new();
        self.write_value(&mut buf);
        buf
    }

    fn write_value(&self, buf: &mut String) {
        match &self.data {
            TokenData::Text(text) => buf.push_str(text),
            TokenData::Children(children) => {
                for child in children {
                    child.write_value(buf);
                }
            }
        }
    }

    /// Like [`Token::value`] but with a space between the values of the immediate children.
    /// For a sentence parsed with an ignoring whitespace policy this gives back the words as they
    /// were separated in the input.
    pub fn value_with_whitespace(&self) -> String {
        match &self.data {
            TokenData::Text(text) => text.to_string(),
            TokenData::Children(children) => values(children.iter().collect()).join(" "),
        }
    }

    /// Length in bytes of [`Token::value`].
    pub fn len(&self) -> usize {
        match &self.data {
            TokenData::Text(text) => text.len(),
            TokenData::Children(children) => children.iter().map(Token::len).sum(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn child(&self, n: usize) -> Option<&Token> {
        self.children().get(n)
    }

    pub fn child_str(&self, n: usize) -> Option<String> {
        self.child(n).map(Token::value)
    }

    pub fn last_child(&self) -> Option<&Token> {
        self.children().last()
    }

    /// The lowest-level tokens beneath this one, left to right.
    pub fn series(&self) -> Vec<&Token> {
        if self.children().is_empty() {
            return vec![self];
        }
        self.iter_under()
            .filter(|token| token.children().is_empty())
            .collect()
    }

    pub fn series_str(&self) -> Vec<String> {
        values(self.series())
    }

    /// All tokens exactly `n` levels below this one, `level(0)` being the token itself.
    ///
    /// Leaves shallower than `n` are not carried down, so asking for a depth below the deepest
    /// leaf gives an empty list rather than the leaves themselves.
    pub fn level(&self, n: usize) -> Vec<&Token> {
        let mut level = vec![self];
        for _ in 0..n {
            level = level.into_iter().flat_map(Token::children).collect();
        }
        level
    }

    pub fn level_str(&self, n: usize) -> Vec<String> {
        values(self.level(n))
    }

    /// Every descendant of the given type, depth first, left to right.
    pub fn find(&self, token_type: &str) -> Vec<&Token> {
        self.iter_under()
            .filter(|token| token.token_type() == token_type)
            .collect()
    }

    pub fn find_str(&self, token_type: &str) -> Vec<String> {
        values(self.find(token_type))
    }

    /// Collapses the chain built by a self-recursive rule.
    ///
    /// Every descendant node sharing this token's type is replaced by its own children,
    /// recursively, so `name := alpha name | alpha` over `"abc"` yields a single `name` node
    /// with three children.
    pub fn flatten(&self) -> Token {
        if self.is_leaf() {
            return self.clone();
        }
        let mut children = Vec::new();
        self.flatten_into(&self.token_type, &mut children);
        Token::node(self.token_type.clone(), children)
    }

    fn flatten_into(&self, token_type: &str, out: &mut Vec<Token>) {
        for child in self.children() {
            if !child.is_leaf() && child.token_type() == token_type {
                child.flatten_into(token_type, out);
            } else {
                out.push(child.clone());
            }
        }
    }

    /// Lazily walks every descendant depth first. Each call starts a fresh walk.
    pub fn iter_under(&self) -> IterUnder<'_> {
        IterUnder {
            stack: vec![self.children().iter()],
        }
    }

    pub fn iter_under_str(&self) -> impl Iterator<Item = String> + '_ {
        self.iter_under().map(Token::value)
    }

    pub fn display_tree(&self) -> TreeDisplay<'_> {
        TreeDisplay(self)
    }

    fn print(&self, buf: &mut dyn fmt::Write, level: usize) -> fmt::Result {
        for _ in 0..level {
            buf.write_str("  ")?;
        }
        buf.write_str(&self.token_type)?;
        if let Some(text) = self.text() {
            write!(buf, " {text:?}")?;
        }
        buf.write_char('\n')?;
        for child in self.children() {
            child.print(buf, level + 1)?;
        }
        Ok(())
    }
}

fn values(tokens: Vec<&Token>) -> Vec<String> {
    tokens.into_iter().map(Token::value).collect()
}

impl PartialEq<str> for Token {
    fn eq(&self, other: &str) -> bool {
        self.len() == other.len() && self.value() == other
    }
}

impl PartialEq<&str> for Token {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token {}: {:?}", self.token_type, self.value())
    }
}

pub struct IterUnder<'a> {
    stack: Vec<std::slice::Iter<'a, Token>>,
}

impl<'a> Iterator for IterUnder<'a> {
    type Item = &'a Token;
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            match top.next() {
                Some(token) => {
                    self.stack.push(token.children().iter());
                    return Some(token);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Indented, one token per line rendering of a tree.
#[derive(Clone, Copy)]
pub struct TreeDisplay<'a>(&'a Token);

impl fmt::Display for TreeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.print(f, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // programme
    //   if_stmt
    //     literal "if"
    //     number "23"
    //   expression
    //     number "4"
    //     expression
    //       literal "+"
    //       number "5"
    fn sample() -> Token {
        Token::node(
            "programme",
            vec![
                Token::node(
                    "if_stmt",
                    vec![Token::leaf(LITERAL, "if"), Token::leaf("number", "23")],
                ),
                Token::node(
                    "expression",
                    vec![
                        Token::leaf("number", "4"),
                        Token::node(
                            "expression",
                            vec![Token::leaf(LITERAL, "+"), Token::leaf("number", "5")],
                        ),
                    ],
                ),
            ],
        )
    }

    #[test]
    fn leaf_and_node_values() {
        let leaf = Token::leaf("master", "master");
        assert_eq!(leaf.value(), "master");
        assert_eq!(leaf.text(), Some("master"));
        assert!(leaf.children().is_empty());
        assert_eq!(leaf.len(), 6);

        let node = Token::node("master", (0..5).map(|i| Token::leaf("n", i.to_string())).collect());
        assert_eq!(node.value(), "01234");
        assert_eq!(node.text(), None);
        assert_eq!(node.len(), 5);
        assert!(Token::node("empty", Vec::new()).is_empty());
    }

    #[test]
    fn compare_with_str() {
        let token = Token::leaf(LITERAL, "master");
        assert!(token == "master");
        assert!(token != "child");
        assert!(sample() == "if234+5");
        assert_ne!(token, Token::leaf(LITERAL, "child"));
        assert_eq!(format!("{token:?}"), "Token literal: \"master\"");
    }

    #[test]
    fn value_with_whitespace_spaces_children() {
        let root = sample();
        assert_eq!(root.value_with_whitespace(), "if23 4+5");
        assert_eq!(root.child(1).unwrap().value_with_whitespace(), "4 +5");
        assert_eq!(Token::leaf(LITERAL, "if").value_with_whitespace(), "if");
    }

    #[test]
    fn child_lookup() {
        let root = sample();
        assert_eq!(root.child(0).unwrap().token_type(), "if_stmt");
        assert_eq!(root.child_str(1).unwrap(), "4+5");
        assert!(root.child(2).is_none());
        assert_eq!(root.last_child().unwrap().token_type(), "expression");
    }

    #[test]
    fn series_is_leaf_frontier() {
        let root = sample();
        assert_eq!(root.series_str(), ["if", "23", "4", "+", "5"]);
        let leaf = Token::leaf("number", "7");
        assert_eq!(leaf.series(), vec![&leaf]);
    }

    #[test]
    fn level_is_exact_depth() {
        let root = sample();
        assert_eq!(root.level(0), vec![&root]);
        assert_eq!(root.level_str(1), ["if23", "4+5"]);
        assert_eq!(root.level_str(2), ["if", "23", "4", "+5"]);
        assert_eq!(root.level_str(3), ["+", "5"]);
        // leaves at depth 2 are not repeated further down
        assert_eq!(root.level(3).len(), 2);
        assert!(root.level(4).is_empty());
    }

    #[test]
    fn find_any_depth() {
        let root = sample();
        assert_eq!(root.find_str("number"), ["23", "4", "5"]);
        assert_eq!(root.find_str("expression"), ["4+5", "+5"]);
        assert!(root.find("missing").is_empty());
        // the root itself is not a descendant
        assert!(root.find("programme").is_empty());
    }

    #[test]
    fn flatten_collapses_same_typed_chain() {
        let root = sample();
        let expression = root.child(1).unwrap().flatten();
        assert_eq!(expression.token_type(), "expression");
        assert_eq!(expression.level_str(1), ["4", "+", "5"]);
        assert!(expression.find("expression").is_empty());
        // flattening does not touch the original tree
        assert_eq!(root.child(1).unwrap().children().len(), 2);
        // other types are kept as they are
        assert_eq!(root.flatten(), root);
    }

    #[test]
    fn iter_under_is_depth_first_and_restartable() {
        let root = sample();
        let types = root
            .iter_under()
            .map(|t| t.token_type().to_owned())
            .collect::<Vec<_>>();
        assert_eq!(
            types,
            [
                "if_stmt",
                LITERAL,
                "number",
                "expression",
                "number",
                "expression",
                LITERAL,
                "number"
            ]
        );
        assert_eq!(root.iter_under().count(), root.iter_under().count());
        assert_eq!(root.iter_under_str().next().unwrap(), "if23");
        assert_eq!(Token::leaf(LITERAL, "x").iter_under().next(), None);
    }

    #[test]
    fn tree_display() {
        let root = sample();
        let expected = "\
programme
  if_stmt
    literal \"if\"
    number \"23\"
  expression
    number \"4\"
    expression
      literal \"+\"
      number \"5\"
";
        assert_eq!(root.display_tree().to_string(), expected);
    }

    #[test]
    fn serialize_json() {
        let token = Token::node("pair", vec![Token::leaf(LITERAL, "a")]);
        let json = serde_json::to_string(&token).unwrap();
        assert_eq!(
            json,
            r#"{"type":"pair","children":[{"type":"literal","text":"a"}]}"#
        );
    }
}
