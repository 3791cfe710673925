use super::error::TreeError;
use super::node::NodeId;
use super::tree::Tree;
use nom::{
    bytes::complete::{take_while, take_while1},
    character::complete::char,
    combinator::{cut, map_res, opt},
    error::{context, ContextError, ErrorKind, FromExternalError, ParseError},
    multi::separated_list1,
    sequence::{delimited, preceded},
    IResult, Offset, Parser,
};

// ================================================================================================
// Error Handling Structures
// ================================================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum DetailedErrorKind {
    Context(&'static str),
    Nom(ErrorKind),
}

/// A custom error type for nom that accumulates context and error kinds.
/// This allows for more informative error messages when parsing fails.
#[derive(Clone, Debug, PartialEq)]
pub struct DetailedError<'a> {
    pub errors: Vec<(&'a str, DetailedErrorKind)>,
}

impl<'a> ParseError<&'a str> for DetailedError<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        DetailedError {
            errors: vec![(input, DetailedErrorKind::Nom(kind))],
        }
    }

    fn append(input: &'a str, kind: ErrorKind, mut other: Self) -> Self {
        other.errors.push((input, DetailedErrorKind::Nom(kind)));
        other
    }
}

impl<'a> ContextError<&'a str> for DetailedError<'a> {
    fn add_context(input: &'a str, ctx: &'static str, mut other: Self) -> Self {
        other.errors.push((input, DetailedErrorKind::Context(ctx)));
        other
    }
}

impl<'a, E> FromExternalError<&'a str, E> for DetailedError<'a> {
    fn from_external_error(input: &'a str, kind: ErrorKind, _e: E) -> Self {
        DetailedError {
            errors: vec![(input, DetailedErrorKind::Nom(kind))],
        }
    }
}

// ================================================================================================
// Intermediate Structure
// ================================================================================================

/// `ParsedNode` is a temporary recursive structure used during parsing.
///
/// Parsing a recursive grammar like Newick is easier when building a
/// recursive data type. The final `Tree` however is arena-based (two flat
/// vectors and an explicit edge table), so after parsing this structure is
/// flattened via `into_tree`. `support` and `length` belong to the edge
/// connecting this node to its parent and are consumed by the parent.
#[derive(Debug)]
struct ParsedNode {
    name: String,
    comment: String,
    support: Option<f64>,
    length: Option<f64>,
    children: Vec<ParsedNode>,
}

impl ParsedNode {
    /// Flatten this recursive node into the `Tree` arena.
    /// Returns the `NodeId` of the created node.
    fn into_tree(self, tree: &mut Tree) -> NodeId {
        let ParsedNode {
            name,
            comment,
            children,
            ..
        } = self;

        let id = tree.add_node();
        if !name.is_empty() {
            tree.get_node_mut(id).unwrap().set_name(name);
        }
        if !comment.is_empty() {
            tree.get_node_mut(id).unwrap().set_comment(comment);
        }

        for child in children {
            let support = child.support;
            let length = child.length;
            let child_id = child.into_tree(tree);
            let eid = tree.connect_nodes(id, child_id);
            let edge = tree.get_edge_mut(eid).unwrap();
            edge.support = support;
            edge.length = length;
        }

        id
    }
}

// ================================================================================================
// Parsers
// ================================================================================================

// Characters allowed in labels and in the post-`)` support token.
fn is_label_char(c: char) -> bool {
    !"()[]:;,".contains(c)
}

// Branch length: ':' followed by an f64 token.
// `cut` prevents backtracking once the ':' is seen, so a garbage length
// reports "while parsing length" instead of a misleading later error.
fn parse_length(input: &str) -> IResult<&str, f64, DetailedError<'_>> {
    context(
        "length",
        preceded(
            char(':'),
            cut(map_res(
                take_while1(|c: char| !",;()".contains(c)),
                |s: &str| s.parse::<f64>(),
            )),
        ),
    )
    .parse(input)
}

// Bracketed comment after a closing parenthesis: '[' content ']'.
// Content must not contain ',', '(' or ')'.
fn parse_comment(input: &str) -> IResult<&str, &str, DetailedError<'_>> {
    context(
        "comment",
        delimited(
            char('['),
            take_while(|c: char| !"],()".contains(c)),
            cut(char(']')),
        ),
    )
    .parse(input)
}

/// Check for a `support/pvalue` label as written by the support
/// computation, e.g. "0.97/0.0030": two `/`-separated floats.
pub(crate) fn is_support_label(tok: &str) -> bool {
    tok.split_once('/')
        .map(|(sup, pval)| sup.parse::<f64>().is_ok() && pval.parse::<f64>().is_ok())
        .unwrap_or(false)
}

// Trailer of an internal node, right after its ')': an optional support
// value. A plain float attaches to the parent edge; a `support/pvalue`
// label (the only non-numeric form this tool ever writes there) becomes
// the node's label. Anything else is a hard error.
fn parse_trailer(input: &str) -> IResult<&str, (Option<f64>, String), DetailedError<'_>> {
    let (rest, trailer) = opt(take_while1(is_label_char)).parse(input)?;
    match trailer {
        None => Ok((rest, (None, String::new()))),
        Some(tok) => {
            if let Ok(v) = tok.parse::<f64>() {
                Ok((rest, (Some(v), String::new())))
            } else if is_support_label(tok) {
                Ok((rest, (None, tok.to_string())))
            } else {
                Err(nom::Err::Failure(DetailedError::add_context(
                    input,
                    "support",
                    DetailedError::from_error_kind(input, ErrorKind::Float),
                )))
            }
        }
    }
}

// Subtree: either '(' child ( ',' child )* ')' trailer, or a leaf label.
// The trailer of an internal node is `[support]['[' comment ']'][':'length]`.
fn parse_subtree(input: &str) -> IResult<&str, ParsedNode, DetailedError<'_>> {
    let (input, children) = context(
        "children",
        opt(delimited(
            char('('),
            separated_list1(char(','), parse_subtree),
            cut(char(')')),
        )),
    )
    .parse(input)?;

    match children {
        Some(children) => {
            let (input, (support, name)) = parse_trailer(input)?;
            let (input, comment) = opt(parse_comment).parse(input)?;
            let (input, length) = opt(parse_length).parse(input)?;

            Ok((
                input,
                ParsedNode {
                    name,
                    comment: comment.unwrap_or_default().to_string(),
                    support,
                    length,
                    children,
                },
            ))
        }
        None => {
            let (input, name) = context("label", take_while1(is_label_char)).parse(input)?;
            let (input, length) = opt(parse_length).parse(input)?;

            Ok((
                input,
                ParsedNode {
                    name: name.to_string(),
                    comment: String::new(),
                    support: None,
                    length,
                    children: Vec::new(),
                },
            ))
        }
    }
}

// ================================================================================================
// Entry Point
// ================================================================================================

/// Parses a single Newick tree string into a fresh `Tree`.
///
/// The input must start with `(` and the tree must end with `;`. Content
/// after the terminating semicolon is ignored (multi-tree streams are
/// handled by `reader::TreeReader`, which feeds one chunk at a time).
pub fn parse_newick(input: &str) -> Result<Tree, TreeError> {
    let trimmed = input.trim();
    if !trimmed.starts_with('(') {
        return Err(TreeError::ParseError {
            message: "Newick input does not start with '(' (maybe not a Newick file?)".to_string(),
            line: 1,
            column: 1,
            snippet: trimmed.chars().take(30).collect(),
        });
    }

    let mut parser = (parse_subtree, cut(char(';')));

    match parser.parse(trimmed) {
        Ok((_, (root_node, _))) => {
            let mut tree = Tree::new();
            let root_id = root_node.into_tree(&mut tree);
            tree.set_root(root_id);
            Ok(tree)
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(make_tree_error(trimmed, e)),
        Err(nom::Err::Incomplete(_)) => Err(TreeError::ParseError {
            message: "Incomplete input".to_string(),
            line: 0,
            column: 0,
            snippet: "".to_string(),
        }),
    }
}

// Helper to convert nom errors into friendly TreeError
fn make_tree_error(input: &str, e: DetailedError) -> TreeError {
    let (remaining, _) = e.errors.first().unwrap();
    let offset = input.offset(remaining);

    // Calculate line/col
    let prefix = &input[..offset];
    let line = prefix.chars().filter(|&c| c == '\n').count() + 1;
    let last_newline = prefix.rfind('\n').map(|p| p + 1).unwrap_or(0);
    let column = offset - last_newline + 1;

    let mut msg = String::new();
    for (_, kind) in e.errors.iter().rev() {
        match kind {
            DetailedErrorKind::Context(ctx) => {
                msg.push_str(&format!("while parsing {}:\n", ctx));
            }
            DetailedErrorKind::Nom(k) => {
                msg.push_str(&format!("  error: {:?}\n", k));
            }
        }
    }

    TreeError::ParseError {
        message: msg,
        line,
        column,
        snippet: remaining.chars().take(30).collect(),
    }
}

impl Tree {
    /// Parse a Newick string into a Tree.
    ///
    /// # Example
    /// ```
    /// use brsup::libs::phylo::tree::Tree;
    ///
    /// let tree = Tree::from_newick("(A:0.1,B:0.2,(C,D):0.5);").unwrap();
    /// assert_eq!(tree.node_count(), 6);
    /// assert_eq!(tree.edge_count(), 5);
    ///
    /// // Error handling
    /// let result = Tree::from_newick("(A,B:invalid);");
    /// assert!(result.is_err());
    /// ```
    pub fn from_newick(input: &str) -> Result<Self, TreeError> {
        parse_newick(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_simple() {
        let tree = Tree::from_newick("(A,B,(C,D));").unwrap();
        assert_eq!(tree.node_count(), 6);
        assert_eq!(tree.edge_count(), 5);

        let root = tree.root().unwrap();
        assert_eq!(tree.get_node(root).unwrap().neigh.len(), 3);
        assert_eq!(tree.tip_names(), vec!["A", "B", "C", "D"]);

        // Ids dense in creation order
        for (i, node) in tree.nodes().iter().enumerate() {
            assert_eq!(node.id, i);
        }
        for (i, edge) in tree.edges().iter().enumerate() {
            assert_eq!(edge.id, i);
        }
    }

    #[test]
    fn test_parser_lengths() {
        let tree = Tree::from_newick("(A:1,B:2,(C:3,D:4):5);").unwrap();

        let mut lengths: Vec<f64> = tree.edges().iter().filter_map(|e| e.length).collect();
        lengths.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(lengths, vec![1.0, 2.0, 3.0, 4.0, 5.0]);

        // Tips keep their lengths attached to their parent edges
        let a = tree.get_node_by_name("A").unwrap();
        let ea = tree.parent_edge_of(a).unwrap();
        assert_eq!(tree.get_edge(ea).unwrap().length, Some(1.0));
    }

    #[test]
    fn test_parser_scientific_notation() {
        let tree = Tree::from_newick("(A:0.2e-1,B:1E2);").unwrap();
        let a = tree.get_node_by_name("A").unwrap();
        let ea = tree.parent_edge_of(a).unwrap();
        assert_eq!(tree.get_edge(ea).unwrap().length, Some(0.02));
    }

    #[test]
    fn test_parser_support_and_comment() {
        let tree = Tree::from_newick("(A,B,(C,D)90[note]:0.5);").unwrap();

        let c = tree.get_node_by_name("C").unwrap();
        let inner = tree.parent_of(c).unwrap();
        let edge = tree.parent_edge_of(inner).unwrap();

        assert_eq!(tree.get_edge(edge).unwrap().support, Some(90.0));
        assert_eq!(tree.get_edge(edge).unwrap().length, Some(0.5));
        assert_eq!(tree.get_node(inner).unwrap().comment, "note");
    }

    #[test]
    fn test_parser_malformed_trailer() {
        // Junk after a closing parenthesis is not a name
        let res = Tree::from_newick("(A,(B,C)foo:1);");
        match res {
            Err(TreeError::ParseError { message, .. }) => {
                assert!(message.contains("support"));
            }
            _ => panic!("Expected ParseError, got {:?}", res),
        }

        assert!(Tree::from_newick("((A,B)node,C);").is_err());
    }

    #[test]
    fn test_parser_support_pval_label() {
        // `support/pvalue` labels written by the support computation are
        // the one non-numeric trailer that parses, as the node's label
        let tree = Tree::from_newick("(A,B,(C,D)1.00/0.0500);").unwrap();
        let c = tree.get_node_by_name("C").unwrap();
        let inner = tree.parent_of(c).unwrap();
        assert_eq!(tree.get_node(inner).unwrap().name, "1.00/0.0500");
        assert_eq!(
            tree.get_edge(tree.parent_edge_of(inner).unwrap())
                .unwrap()
                .support,
            None
        );
    }

    #[test]
    fn test_parser_unset_length_stays_unset() {
        let tree = Tree::from_newick("(A,B);").unwrap();
        assert!(tree.edges().iter().all(|e| e.length.is_none()));
    }

    #[test]
    fn test_parser_must_start_with_paren() {
        let res = Tree::from_newick("A:0.5;");
        match res {
            Err(TreeError::ParseError { message, .. }) => {
                assert!(message.contains("does not start with"));
            }
            _ => panic!("Expected ParseError, got {:?}", res),
        }
    }

    #[test]
    fn test_parser_mismatched_parens() {
        assert!(Tree::from_newick("((A,B);").is_err());
        assert!(Tree::from_newick("(A,B));").is_err());
        assert!(Tree::from_newick("(A,(B,C);").is_err());
    }

    #[test]
    fn test_parser_missing_semicolon() {
        let res = Tree::from_newick("(A,B)");
        match res {
            Err(TreeError::ParseError { line, column, .. }) => {
                assert_eq!(line, 1);
                assert_eq!(column, 6);
            }
            _ => panic!("Expected ParseError, got {:?}", res),
        }
    }

    #[test]
    fn test_parser_bad_length() {
        let res = Tree::from_newick("(A:abc,B);");
        match res {
            Err(TreeError::ParseError { message, .. }) => {
                assert!(message.contains("length"));
            }
            _ => panic!("Expected ParseError, got {:?}", res),
        }
    }

    #[test]
    fn test_parser_node_and_edge_counts() {
        // For k labelled positions, k nodes and k-1 edges
        let tree = Tree::from_newick("((A,B),(C,(D,E)));").unwrap();
        assert_eq!(tree.node_count(), 9);
        assert_eq!(tree.edge_count(), 8);
    }

    #[test]
    fn test_parser_adjacency_symmetry() {
        let tree = Tree::from_newick("((A:1,B:2)0.9:0.1,(C:3,D:4)0.8:0.2);").unwrap();
        for edge in tree.edges() {
            for &end in &[edge.left, edge.right] {
                let i = tree.edge_index(end, edge.id).unwrap();
                assert_eq!(tree.get_node(end).unwrap().neigh[i], edge.other(end));
            }
        }
        // Parent orientation: every non-root node has exactly one incoming edge
        let root = tree.root().unwrap();
        for node in tree.nodes() {
            if node.id == root {
                assert!(tree.parent_edge_of(node.id).is_err());
            } else {
                assert!(tree.parent_edge_of(node.id).is_ok());
            }
        }
    }
}
