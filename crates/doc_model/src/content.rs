//! Content expressions: the grammar constraining a node's child sequence
//!
//! An expression is a regular language over node kinds. Terms name either a
//! node type or a group of node types; terms combine by juxtaposition
//! (sequence), `|` (choice), parentheses, and the postfix repetitions `*`,
//! `+`, `?`, `{n}`, `{n,}` and `{n,m}`. For example `doc` uses
//! `banner byline block+`.
//!
//! Expressions are compiled to a nondeterministic automaton and then, by
//! subset construction, to the deterministic automaton that [`ContentMatch`]
//! walks one child at a time.

use crate::{DocModelError, NodeKind, Result};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Parsed content expression
#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Choice(Vec<Expr>),
    Seq(Vec<Expr>),
    Star(Box<Expr>),
    Plus(Box<Expr>),
    Opt(Box<Expr>),
    Range {
        min: usize,
        max: Option<usize>,
        expr: Box<Expr>,
    },
    Kind(NodeKind),
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Name(String),
    Number(usize),
    Punct(char),
}

fn tokenize(source: &str) -> std::result::Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = source.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if c.is_ascii_digit() {
            let mut digits = String::new();
            while let Some(&d) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                digits.push(d);
                chars.next();
            }
            let number = digits
                .parse()
                .map_err(|_| format!("number `{}` is too large", digits))?;
            tokens.push(Token::Number(number));
        } else if c.is_alphabetic() || c == '_' {
            let mut name = String::new();
            while let Some(&d) = chars.peek() {
                if !(d.is_alphanumeric() || d == '_') {
                    break;
                }
                name.push(d);
                chars.next();
            }
            tokens.push(Token::Name(name));
        } else if "()|*+?{},".contains(c) {
            tokens.push(Token::Punct(c));
            chars.next();
        } else {
            return Err(format!("unexpected character `{}`", c));
        }
    }

    Ok(tokens)
}

/// Recursive-descent parser over the token stream
struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    resolve: &'a dyn Fn(&str) -> Option<Vec<NodeKind>>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn eat(&mut self, punct: char) -> bool {
        if self.peek() == Some(&Token::Punct(punct)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_choice(&mut self) -> std::result::Result<Expr, String> {
        let mut alternatives = vec![self.parse_seq()?];
        while self.eat('|') {
            alternatives.push(self.parse_seq()?);
        }
        Ok(if alternatives.len() == 1 {
            alternatives.remove(0)
        } else {
            Expr::Choice(alternatives)
        })
    }

    fn parse_seq(&mut self) -> std::result::Result<Expr, String> {
        let mut items = Vec::new();
        while let Some(token) = self.peek() {
            if matches!(token, Token::Punct(')') | Token::Punct('|')) {
                break;
            }
            items.push(self.parse_subscript()?);
        }
        if items.is_empty() {
            return Err("expected a node type or group".to_string());
        }
        Ok(if items.len() == 1 {
            items.remove(0)
        } else {
            Expr::Seq(items)
        })
    }

    fn parse_subscript(&mut self) -> std::result::Result<Expr, String> {
        let mut expr = self.parse_atom()?;
        loop {
            if self.eat('+') {
                expr = Expr::Plus(Box::new(expr));
            } else if self.eat('*') {
                expr = Expr::Star(Box::new(expr));
            } else if self.eat('?') {
                expr = Expr::Opt(Box::new(expr));
            } else if self.eat('{') {
                expr = self.parse_range(expr)?;
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_number(&mut self) -> std::result::Result<usize, String> {
        match self.peek() {
            Some(Token::Number(n)) => {
                let n = *n;
                self.pos += 1;
                Ok(n)
            }
            other => Err(format!("expected a number, found {:?}", other)),
        }
    }

    fn parse_range(&mut self, expr: Expr) -> std::result::Result<Expr, String> {
        let min = self.parse_number()?;
        let max = if self.eat(',') {
            if self.peek() == Some(&Token::Punct('}')) {
                None
            } else {
                Some(self.parse_number()?)
            }
        } else {
            Some(min)
        };
        if !self.eat('}') {
            return Err("unclosed repetition range".to_string());
        }
        if let Some(max) = max {
            if max < min {
                return Err(format!("range {{{},{}}} has max below min", min, max));
            }
        }
        Ok(Expr::Range {
            min,
            max,
            expr: Box::new(expr),
        })
    }

    fn parse_atom(&mut self) -> std::result::Result<Expr, String> {
        if self.eat('(') {
            let expr = self.parse_choice()?;
            if !self.eat(')') {
                return Err("missing closing parenthesis".to_string());
            }
            return Ok(expr);
        }
        match self.peek().cloned() {
            Some(Token::Name(name)) => {
                self.pos += 1;
                let kinds = (self.resolve)(&name)
                    .filter(|kinds| !kinds.is_empty())
                    .ok_or_else(|| format!("no node type or group named `{}`", name))?;
                Ok(if kinds.len() == 1 {
                    Expr::Kind(kinds[0])
                } else {
                    Expr::Choice(kinds.into_iter().map(Expr::Kind).collect())
                })
            }
            other => Err(format!("unexpected token {:?}", other)),
        }
    }
}

/// Nondeterministic automaton; `None` edges are epsilon transitions
#[derive(Default)]
struct Nfa {
    edges: Vec<Vec<(Option<NodeKind>, usize)>>,
}

impl Nfa {
    fn state(&mut self) -> usize {
        self.edges.push(Vec::new());
        self.edges.len() - 1
    }

    fn edge(&mut self, from: usize, to: usize, term: Option<NodeKind>) {
        self.edges[from].push((term, to));
    }

    /// Compile `expr` starting at `from`; returns a fresh end state that has no
    /// outgoing edges yet
    fn compile(&mut self, expr: &Expr, from: usize) -> usize {
        match expr {
            Expr::Kind(kind) => {
                let end = self.state();
                self.edge(from, end, Some(*kind));
                end
            }
            Expr::Seq(items) => {
                let mut current = from;
                for item in items {
                    current = self.compile(item, current);
                }
                current
            }
            Expr::Choice(alternatives) => {
                let end = self.state();
                for alternative in alternatives {
                    let alt_end = self.compile(alternative, from);
                    self.edge(alt_end, end, None);
                }
                end
            }
            Expr::Star(inner) => {
                let loop_state = self.state();
                self.edge(from, loop_state, None);
                let inner_end = self.compile(inner, loop_state);
                self.edge(inner_end, loop_state, None);
                let end = self.state();
                self.edge(loop_state, end, None);
                end
            }
            Expr::Plus(inner) => {
                let loop_state = self.state();
                self.edge(from, loop_state, None);
                let inner_end = self.compile(inner, loop_state);
                self.edge(inner_end, loop_state, None);
                let end = self.state();
                self.edge(inner_end, end, None);
                end
            }
            Expr::Opt(inner) => {
                let end = self.compile(inner, from);
                self.edge(from, end, None);
                end
            }
            Expr::Range { min, max, expr } => {
                let mut current = from;
                for _ in 0..*min {
                    current = self.compile(expr, current);
                }
                match max {
                    None => self.compile(&Expr::Star(expr.clone()), current),
                    Some(max) => {
                        for _ in *min..*max {
                            let next = self.compile(expr, current);
                            self.edge(current, next, None);
                            current = next;
                        }
                        current
                    }
                }
            }
        }
    }

    fn closure(&self, states: impl IntoIterator<Item = usize>) -> BTreeSet<usize> {
        let mut result = BTreeSet::new();
        let mut stack: Vec<usize> = states.into_iter().collect();
        while let Some(state) = stack.pop() {
            if !result.insert(state) {
                continue;
            }
            for (term, to) in &self.edges[state] {
                if term.is_none() && !result.contains(to) {
                    stack.push(*to);
                }
            }
        }
        result
    }
}

#[derive(Debug, Clone, PartialEq)]
struct DfaState {
    valid_end: bool,
    next: BTreeMap<NodeKind, usize>,
}

/// A compiled content expression
#[derive(Debug, Clone, PartialEq)]
pub struct ContentExpr {
    source: String,
    states: Vec<DfaState>,
}

impl ContentExpr {
    /// Compile `source`, resolving each name to the node kinds it stands for
    /// (a single type or every member of a group). An empty source matches
    /// only the empty child sequence.
    pub fn parse(source: &str, resolve: &dyn Fn(&str) -> Option<Vec<NodeKind>>) -> Result<Self> {
        let invalid = |reason: String| DocModelError::InvalidContentExpression {
            expr: source.to_string(),
            reason,
        };

        let tokens = tokenize(source).map_err(invalid)?;
        if tokens.is_empty() {
            return Ok(Self::empty());
        }

        let mut parser = Parser {
            tokens,
            pos: 0,
            resolve,
        };
        let expr = parser.parse_choice().map_err(invalid)?;
        if let Some(token) = parser.peek() {
            return Err(invalid(format!("unexpected trailing token {:?}", token)));
        }

        let mut nfa = Nfa::default();
        let start = nfa.state();
        let accept = nfa.compile(&expr, start);

        Ok(Self {
            source: source.to_string(),
            states: Self::determinize(&nfa, start, accept),
        })
    }

    /// The expression that admits no children at all
    pub fn empty() -> Self {
        Self {
            source: String::new(),
            states: vec![DfaState {
                valid_end: true,
                next: BTreeMap::new(),
            }],
        }
    }

    fn determinize(nfa: &Nfa, start: usize, accept: usize) -> Vec<DfaState> {
        let mut states: Vec<DfaState> = Vec::new();
        let mut index: HashMap<BTreeSet<usize>, usize> = HashMap::new();
        let mut pending: Vec<BTreeSet<usize>> = Vec::new();

        let initial = nfa.closure([start]);
        index.insert(initial.clone(), 0);
        states.push(DfaState {
            valid_end: initial.contains(&accept),
            next: BTreeMap::new(),
        });
        pending.push(initial);

        while let Some(set) = pending.pop() {
            let from = index[&set];
            let mut targets: BTreeMap<NodeKind, BTreeSet<usize>> = BTreeMap::new();
            for &state in &set {
                for (term, to) in &nfa.edges[state] {
                    if let Some(kind) = term {
                        targets.entry(*kind).or_default().insert(*to);
                    }
                }
            }

            for (kind, reached) in targets {
                let closed = nfa.closure(reached);
                let to = match index.get(&closed) {
                    Some(&existing) => existing,
                    None => {
                        let id = states.len();
                        states.push(DfaState {
                            valid_end: closed.contains(&accept),
                            next: BTreeMap::new(),
                        });
                        index.insert(closed.clone(), id);
                        pending.push(closed);
                        id
                    }
                };
                states[from].next.insert(kind, to);
            }
        }

        states
    }

    /// The expression source as written in the schema
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Match state before any child has been consumed
    pub fn start(&self) -> ContentMatch<'_> {
        ContentMatch {
            expr: self,
            state: 0,
        }
    }

    /// Whether the whole sequence of kinds is accepted
    pub fn matches(&self, kinds: impl IntoIterator<Item = NodeKind>) -> bool {
        self.start()
            .match_sequence(kinds)
            .is_some_and(|end| end.valid_end())
    }

    /// Number of deterministic states, for diagnostics
    pub fn state_count(&self) -> usize {
        self.states.len()
    }
}

/// A position within a content expression after consuming some children
#[derive(Debug, Clone, Copy)]
pub struct ContentMatch<'a> {
    expr: &'a ContentExpr,
    state: usize,
}

impl<'a> ContentMatch<'a> {
    /// Advance past a child of `kind`, `None` if it is not allowed here
    pub fn match_kind(self, kind: NodeKind) -> Option<ContentMatch<'a>> {
        let next = *self.expr.states[self.state].next.get(&kind)?;
        Some(ContentMatch {
            expr: self.expr,
            state: next,
        })
    }

    pub fn match_sequence(
        self,
        kinds: impl IntoIterator<Item = NodeKind>,
    ) -> Option<ContentMatch<'a>> {
        kinds
            .into_iter()
            .try_fold(self, |current, kind| current.match_kind(kind))
    }

    /// Whether the content may end here
    pub fn valid_end(&self) -> bool {
        self.expr.states[self.state].valid_end
    }

    /// Kinds that may come next
    pub fn next_kinds(&self) -> impl Iterator<Item = NodeKind> + 'a {
        self.expr.states[self.state].next.keys().copied()
    }

    /// Shortest sequence of kinds that completes the content from here,
    /// preferring kinds for which `usable` holds. `None` if no completion
    /// exists using only usable kinds.
    pub fn fill_to_end(&self, usable: &dyn Fn(NodeKind) -> bool) -> Option<Vec<NodeKind>> {
        let mut seen = BTreeSet::new();
        let mut queue = std::collections::VecDeque::new();
        queue.push_back((self.state, Vec::new()));
        seen.insert(self.state);

        while let Some((state, path)) = queue.pop_front() {
            if self.expr.states[state].valid_end {
                return Some(path);
            }
            for (&kind, &to) in &self.expr.states[state].next {
                if usable(kind) && seen.insert(to) {
                    let mut next_path = path.clone();
                    next_path.push(kind);
                    queue.push_back((to, next_path));
                }
            }
        }
        None
    }
}
