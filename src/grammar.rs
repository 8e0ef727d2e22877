//! Declarative grammar engine.
//!
//! Productions are written as data: terminals, non-terminals, and the
//! structural macros `Optional`, `Repeat`, `Alternative`, `Group`.
//! Building a [`Grammar`] expands every macro into plain productions,
//! computes FIRST/FOLLOW sets, rejects left recursion, and derives the
//! LL(1) parsing table consumed by [`crate::parser::TableParser`].
//!
//! Construction-time failures (left recursion, table collisions) are
//! hard errors: a grammar that builds is guaranteed to drive the
//! parser deterministically. A built grammar is immutable and can be
//! shared across threads; the crate's own JSON grammar is built once
//! through [`json_grammar`].

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::OnceLock;

use crate::ast::tokens::TokenKind;
use thiserror::Error;

/// Errors raised while building a grammar.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GrammarError {
    #[error("non-terminal '{0}' is referenced but has no production")]
    UnknownSymbol(String),

    #[error("start symbol '{0}' has no production")]
    UnknownStart(String),

    #[error("'{0}' is left-recursive; the LL(1) backend cannot expand it")]
    LeftRecursive(String),

    #[error("grammar is ambiguous: productions for '{head}' collide on lookahead {terminal}")]
    Ambiguous { head: String, terminal: TokenKind },
}

/// A grammar symbol: a token terminal, a named non-terminal, or a
/// structural macro over sub-sequences.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Terminal(TokenKind),
    NonTerminal(String),
    Macro(MacroSymbol),
}

/// Structural combinators expanded away during grammar construction.
///
/// None of these survive into the parsing table: `Optional(S)`
/// becomes `{ε, S}`, `Repeat(S)` becomes `{ε, S·Repeat(S)}`,
/// `Alternative` flattens into sibling productions, and `Group`
/// splices inline.
#[derive(Debug, Clone, PartialEq)]
pub enum MacroSymbol {
    Optional(Vec<Symbol>),
    Repeat(Vec<Symbol>),
    Alternative(Vec<Vec<Symbol>>),
    Group(Vec<Symbol>),
}

impl Symbol {
    pub fn t(kind: TokenKind) -> Symbol {
        Symbol::Terminal(kind)
    }

    pub fn nt(name: impl Into<String>) -> Symbol {
        Symbol::NonTerminal(name.into())
    }

    pub fn opt(seq: Vec<Symbol>) -> Symbol {
        Symbol::Macro(MacroSymbol::Optional(seq))
    }

    pub fn rep(seq: Vec<Symbol>) -> Symbol {
        Symbol::Macro(MacroSymbol::Repeat(seq))
    }

    pub fn alt(branches: Vec<Vec<Symbol>>) -> Symbol {
        Symbol::Macro(MacroSymbol::Alternative(branches))
    }

    pub fn group(seq: Vec<Symbol>) -> Symbol {
        Symbol::Macro(MacroSymbol::Group(seq))
    }
}

/// A named non-terminal mapped to one derivation of symbols.
/// Alternatives are expressed as multiple productions sharing a head.
#[derive(Debug, Clone, PartialEq)]
pub struct Production {
    pub head: String,
    pub body: Vec<Symbol>,
}

impl Production {
    pub fn new(head: impl Into<String>, body: Vec<Symbol>) -> Self {
        Production {
            head: head.into(),
            body,
        }
    }
}

/// A macro-free production set with its derived FIRST/FOLLOW sets.
///
/// This is the analysis half of the engine: recursion and determinism
/// queries live here so they can be asked even of grammars the LL(1)
/// table builder would reject.
#[derive(Debug)]
pub struct RuleSet {
    start: String,
    productions: Vec<Production>,
    nullable: HashSet<String>,
    first: HashMap<String, BTreeSet<TokenKind>>,
    follow: HashMap<String, BTreeSet<TokenKind>>,
}

impl RuleSet {
    /// Expand macros, validate symbol references, and run the FIRST/
    /// FOLLOW fixed-point computation.
    pub fn new(rules: Vec<Production>, start: &str) -> Result<RuleSet, GrammarError> {
        let productions = expand_macros(rules);

        let heads: HashSet<&str> = productions.iter().map(|p| p.head.as_str()).collect();
        if !heads.contains(start) {
            return Err(GrammarError::UnknownStart(start.to_string()));
        }
        for prod in &productions {
            for symbol in &prod.body {
                if let Symbol::NonTerminal(name) = symbol
                    && !heads.contains(name.as_str())
                {
                    return Err(GrammarError::UnknownSymbol(name.clone()));
                }
            }
        }

        let nullable = compute_nullable(&productions);
        let first = compute_first(&productions, &nullable);
        let follow = compute_follow(&productions, start, &nullable, &first);

        Ok(RuleSet {
            start: start.to_string(),
            productions,
            nullable,
            first,
            follow,
        })
    }

    pub fn start(&self) -> &str {
        &self.start
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    /// Distinct heads, in first-appearance order.
    pub fn heads(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.productions
            .iter()
            .filter(|p| seen.insert(p.head.as_str()))
            .map(|p| p.head.as_str())
            .collect()
    }

    pub fn is_nullable(&self, head: &str) -> bool {
        self.nullable.contains(head)
    }

    /// FIRST set of a non-terminal (epsilon expressed via [`Self::is_nullable`]).
    pub fn first_set(&self, head: &str) -> Option<&BTreeSet<TokenKind>> {
        self.first.get(head)
    }

    /// FOLLOW set of a non-terminal.
    pub fn follow_set(&self, head: &str) -> Option<&BTreeSet<TokenKind>> {
        self.follow.get(head)
    }

    /// FIRST set of a symbol sequence; the boolean is true when the
    /// whole sequence can derive epsilon.
    pub fn first_of(&self, body: &[Symbol]) -> (BTreeSet<TokenKind>, bool) {
        sequence_first(body, &self.nullable, &self.first)
    }

    /// True when `head` can derive a sentence beginning with itself,
    /// directly or through other non-terminals.
    pub fn is_left_recursive(&self, head: &str) -> bool {
        self.is_recursive(head, Edge::Left)
    }

    /// Mirror of [`Self::is_left_recursive`] over rightmost symbols.
    pub fn is_right_recursive(&self, head: &str) -> bool {
        self.is_recursive(head, Edge::Right)
    }

    fn is_recursive(&self, head: &str, edge: Edge) -> bool {
        let mut stack = vec![head];
        let mut visited = HashSet::new();
        while let Some(current) = stack.pop() {
            for target in self.edge_targets(current, edge) {
                if target == head {
                    return true;
                }
                if visited.insert(target) {
                    stack.push(target);
                }
            }
        }
        false
    }

    /// Non-terminals reachable as the leftmost (or rightmost)
    /// derivable symbol of `head`, skipping over nullable prefixes.
    fn edge_targets(&self, head: &str, edge: Edge) -> Vec<&str> {
        let mut targets = Vec::new();
        for prod in self.productions.iter().filter(|p| p.head == head) {
            let symbols: Box<dyn Iterator<Item = &Symbol> + '_> = match edge {
                Edge::Left => Box::new(prod.body.iter()),
                Edge::Right => Box::new(prod.body.iter().rev()),
            };
            for symbol in symbols {
                match symbol {
                    Symbol::Terminal(_) => break,
                    Symbol::NonTerminal(name) => {
                        targets.push(name.as_str());
                        if !self.nullable.contains(name) {
                            break;
                        }
                    }
                    Symbol::Macro(_) => break,
                }
            }
        }
        targets
    }

    /// True when two productions sharing this head have overlapping
    /// derivable terminal prefixes, i.e. the grammar is not LL(1)-safe
    /// at this head.
    pub fn is_nondeterministic(&self, head: &str) -> bool {
        let firsts: Vec<(BTreeSet<TokenKind>, bool)> = self
            .productions
            .iter()
            .filter(|p| p.head == head)
            .map(|p| self.first_of(&p.body))
            .collect();
        for (i, (fa, na)) in firsts.iter().enumerate() {
            for (fb, nb) in firsts.iter().skip(i + 1) {
                if (*na && *nb) || fa.intersection(fb).next().is_some() {
                    return true;
                }
            }
        }
        false
    }
}

#[derive(Clone, Copy)]
enum Edge {
    Left,
    Right,
}

/// A built grammar: analyzed rule set plus the LL(1) parsing table.
#[derive(Debug)]
pub struct Grammar {
    rules: RuleSet,
    table: HashMap<(String, TokenKind), usize>,
}

impl Grammar {
    /// Analyze the rules and derive the parsing table.
    ///
    /// Fails fast on left recursion and on any (head, terminal) cell
    /// claimed by two different productions, before any document is
    /// parsed against the grammar.
    pub fn build(rules: Vec<Production>, start: &str) -> Result<Grammar, GrammarError> {
        let rules = RuleSet::new(rules, start)?;

        for head in rules.heads() {
            if rules.is_left_recursive(head) {
                return Err(GrammarError::LeftRecursive(head.to_string()));
            }
        }

        let mut table: HashMap<(String, TokenKind), usize> = HashMap::new();
        for (index, prod) in rules.productions().iter().enumerate() {
            let (first, nullable) = rules.first_of(&prod.body);
            let mut lookaheads = first;
            if nullable {
                if let Some(follow) = rules.follow_set(&prod.head) {
                    lookaheads.extend(follow.iter().copied());
                }
            }
            for terminal in lookaheads {
                let key = (prod.head.clone(), terminal);
                if let Some(existing) = table.insert(key, index)
                    && existing != index
                {
                    return Err(GrammarError::Ambiguous {
                        head: prod.head.clone(),
                        terminal,
                    });
                }
            }
        }

        Ok(Grammar { rules, table })
    }

    pub fn start(&self) -> &str {
        self.rules.start()
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// The production chosen for (non-terminal, lookahead), if any.
    pub fn entry(&self, head: &str, lookahead: TokenKind) -> Option<&Production> {
        self.table
            .get(&(head.to_string(), lookahead))
            .map(|&index| &self.rules.productions()[index])
    }
}

/// Rewrite every macro occurrence into synthesized plain productions.
fn expand_macros(rules: Vec<Production>) -> Vec<Production> {
    let mut out = Vec::new();
    let mut queue: VecDeque<Production> = rules.into();
    let mut counter = 0usize;

    while let Some(mut prod) = queue.pop_front() {
        let macro_at = prod
            .body
            .iter()
            .position(|s| matches!(s, Symbol::Macro(_)));
        let Some(index) = macro_at else {
            out.push(prod);
            continue;
        };

        counter += 1;
        let taken = std::mem::replace(&mut prod.body[index], Symbol::Terminal(TokenKind::Eof));
        let Symbol::Macro(mac) = taken else {
            unreachable!("position() matched a macro symbol");
        };

        match mac {
            MacroSymbol::Group(seq) => {
                prod.body.splice(index..index + 1, seq);
                queue.push_front(prod);
            }
            MacroSymbol::Optional(seq) => {
                let name = format!("{}#opt{}", prod.head, counter);
                prod.body[index] = Symbol::NonTerminal(name.clone());
                queue.push_front(prod);
                queue.push_back(Production::new(name.clone(), Vec::new()));
                queue.push_back(Production::new(name, seq));
            }
            MacroSymbol::Repeat(seq) => {
                let name = format!("{}#rep{}", prod.head, counter);
                prod.body[index] = Symbol::NonTerminal(name.clone());
                queue.push_front(prod);
                queue.push_back(Production::new(name.clone(), Vec::new()));
                let mut body = seq;
                body.push(Symbol::NonTerminal(name.clone()));
                queue.push_back(Production::new(name, body));
            }
            MacroSymbol::Alternative(branches) => {
                let name = format!("{}#alt{}", prod.head, counter);
                prod.body[index] = Symbol::NonTerminal(name.clone());
                queue.push_front(prod);
                for branch in branches {
                    queue.push_back(Production::new(name.clone(), branch));
                }
            }
        }
    }
    out
}

fn compute_nullable(productions: &[Production]) -> HashSet<String> {
    let mut nullable: HashSet<String> = HashSet::new();
    loop {
        let mut changed = false;
        for prod in productions {
            if nullable.contains(&prod.head) {
                continue;
            }
            let all_nullable = prod.body.iter().all(|s| match s {
                Symbol::Terminal(_) => false,
                Symbol::NonTerminal(name) => nullable.contains(name),
                Symbol::Macro(_) => false,
            });
            if all_nullable {
                nullable.insert(prod.head.clone());
                changed = true;
            }
        }
        if !changed {
            return nullable;
        }
    }
}

fn sequence_first(
    body: &[Symbol],
    nullable: &HashSet<String>,
    first: &HashMap<String, BTreeSet<TokenKind>>,
) -> (BTreeSet<TokenKind>, bool) {
    let mut set = BTreeSet::new();
    for symbol in body {
        match symbol {
            Symbol::Terminal(kind) => {
                set.insert(*kind);
                return (set, false);
            }
            Symbol::NonTerminal(name) => {
                if let Some(head_first) = first.get(name) {
                    set.extend(head_first.iter().copied());
                }
                if !nullable.contains(name) {
                    return (set, false);
                }
            }
            Symbol::Macro(_) => return (set, false),
        }
    }
    (set, true)
}

fn compute_first(
    productions: &[Production],
    nullable: &HashSet<String>,
) -> HashMap<String, BTreeSet<TokenKind>> {
    let mut first: HashMap<String, BTreeSet<TokenKind>> = HashMap::new();
    for prod in productions {
        first.entry(prod.head.clone()).or_default();
    }
    loop {
        let mut changed = false;
        for prod in productions {
            let (set, _) = sequence_first(&prod.body, nullable, &first);
            let entry = first.entry(prod.head.clone()).or_default();
            for kind in set {
                changed |= entry.insert(kind);
            }
        }
        if !changed {
            return first;
        }
    }
}

fn compute_follow(
    productions: &[Production],
    start: &str,
    nullable: &HashSet<String>,
    first: &HashMap<String, BTreeSet<TokenKind>>,
) -> HashMap<String, BTreeSet<TokenKind>> {
    let mut follow: HashMap<String, BTreeSet<TokenKind>> = HashMap::new();
    for prod in productions {
        follow.entry(prod.head.clone()).or_default();
    }
    follow
        .entry(start.to_string())
        .or_default()
        .insert(TokenKind::Eof);

    loop {
        let mut changed = false;
        for prod in productions {
            for (i, symbol) in prod.body.iter().enumerate() {
                let Symbol::NonTerminal(name) = symbol else {
                    continue;
                };
                let (rest_first, rest_nullable) =
                    sequence_first(&prod.body[i + 1..], nullable, first);
                let mut additions: BTreeSet<TokenKind> = rest_first;
                if rest_nullable {
                    if let Some(head_follow) = follow.get(&prod.head) {
                        additions.extend(head_follow.iter().copied());
                    }
                }
                let entry = follow.entry(name.clone()).or_default();
                for kind in additions {
                    changed |= entry.insert(kind);
                }
            }
        }
        if !changed {
            return follow;
        }
    }
}

/// The JSON grammar driving the table-driven parse path.
///
/// Built once and shared; the direct document parser does not consult
/// it, but validation and the grammar-engine tests do.
pub fn json_grammar() -> &'static Grammar {
    static GRAMMAR: OnceLock<Grammar> = OnceLock::new();
    GRAMMAR.get_or_init(|| {
        use TokenKind::*;
        let rules = vec![
            Production::new("document", vec![Symbol::nt("value")]),
            Production::new(
                "value",
                vec![Symbol::alt(vec![
                    vec![Symbol::nt("object")],
                    vec![Symbol::nt("array")],
                    vec![Symbol::t(String)],
                    vec![Symbol::t(Integer)],
                    vec![Symbol::t(Float)],
                    vec![Symbol::t(True)],
                    vec![Symbol::t(False)],
                    vec![Symbol::t(Null)],
                ])],
            ),
            Production::new(
                "object",
                vec![
                    Symbol::t(LBrace),
                    Symbol::opt(vec![
                        Symbol::nt("pair"),
                        Symbol::rep(vec![Symbol::t(Comma), Symbol::nt("pair")]),
                    ]),
                    Symbol::t(RBrace),
                ],
            ),
            Production::new(
                "pair",
                vec![Symbol::t(String), Symbol::t(Colon), Symbol::nt("value")],
            ),
            Production::new(
                "array",
                vec![
                    Symbol::t(LBracket),
                    Symbol::opt(vec![
                        Symbol::nt("value"),
                        Symbol::rep(vec![Symbol::t(Comma), Symbol::nt("value")]),
                    ]),
                    Symbol::t(RBracket),
                ],
            ),
        ];
        Grammar::build(rules, "document").expect("built-in JSON grammar is LL(1)")
    })
}

#[test]
fn test_left_recursion_detected() {
    // expr -> expr '+' term | term ; term -> INTEGER
    let rules = vec![
        Production::new(
            "expr",
            vec![
                Symbol::nt("expr"),
                Symbol::t(TokenKind::Comma),
                Symbol::nt("term"),
            ],
        ),
        Production::new("expr", vec![Symbol::nt("term")]),
        Production::new("term", vec![Symbol::t(TokenKind::Integer)]),
    ];
    let set = RuleSet::new(rules.clone(), "expr").unwrap();
    assert!(set.is_left_recursive("expr"));
    assert!(!set.is_left_recursive("term"));
    assert!(matches!(
        Grammar::build(rules, "expr"),
        Err(GrammarError::LeftRecursive(head)) if head == "expr"
    ));
}

#[test]
fn test_indirect_left_recursion_detected() {
    let rules = vec![
        Production::new("a", vec![Symbol::nt("b"), Symbol::t(TokenKind::Comma)]),
        Production::new("b", vec![Symbol::nt("a"), Symbol::t(TokenKind::Colon)]),
        Production::new("b", vec![Symbol::t(TokenKind::Integer)]),
    ];
    let set = RuleSet::new(rules, "a").unwrap();
    assert!(set.is_left_recursive("a"));
    assert!(set.is_left_recursive("b"));
}

#[test]
fn test_json_grammar_builds() {
    let grammar = json_grammar();
    assert_eq!(grammar.start(), "document");
    // FIRST(value) covers every value-opening terminal.
    let first = grammar.rules().first_set("value").unwrap();
    assert!(first.contains(&TokenKind::LBrace));
    assert!(first.contains(&TokenKind::LBracket));
    assert!(first.contains(&TokenKind::String));
    assert!(first.contains(&TokenKind::Null));
}

#[test]
fn test_ambiguity_rejected() {
    // Two productions for the same head both starting with INTEGER.
    let rules = vec![
        Production::new("s", vec![Symbol::t(TokenKind::Integer)]),
        Production::new(
            "s",
            vec![Symbol::t(TokenKind::Integer), Symbol::t(TokenKind::Comma)],
        ),
    ];
    let set = RuleSet::new(rules.clone(), "s").unwrap();
    assert!(set.is_nondeterministic("s"));
    assert!(matches!(
        Grammar::build(rules, "s"),
        Err(GrammarError::Ambiguous { .. })
    ));
}
