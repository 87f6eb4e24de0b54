//! Datalog evaluator (spec §4.7, §9 "Datalog evaluator"): "semi-naive
//! bottom-up evaluation with stratified negation over in-memory indexes
//! keyed by `(pred, arity, bound-positions)`." Three predicates are
//! wired to the graph: `node(Id, Type)`, `edge(Src, Dst, Type)`,
//! `attr(Id, Name, Value)` (spec §4.7 "Query surface"). Negation uses
//! `\+`; per spec.md Open Question #4 ("the source does not fully
//! specify stratification rules") every variable inside a negated goal
//! must already be bound by an earlier positive goal in the same body —
//! this is checked rather than guessed, and an unbound negation is a
//! parse-time-adjacent [`DatalogError::UnboundNegation`] rather than
//! silently matching everything.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use grafema_core::backend::GraphBackend;

/// A constant appearing in a fact or as a bound Datalog term. Node ids
/// get their own variant so callers can tell "this binding is a node
/// id" apart from an ordinary string attribute without re-parsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Node(String),
    Str(String),
    Num(i64),
    Bool(bool),
}

impl Value {
    pub fn as_node_id(&self) -> Option<&str> {
        match self {
            Value::Node(s) => Some(s),
            _ => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            Value::Node(s) | Value::Str(s) => s.clone(),
            Value::Num(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Term {
    Var(String),
    Const(Value),
}

#[derive(Debug, Clone)]
pub struct Atom {
    pub predicate: String,
    pub args: Vec<Term>,
    pub negated: bool,
}

#[derive(Debug, Clone)]
pub struct Clause {
    pub head: Atom,
    pub body: Vec<Atom>,
}

#[derive(Debug, Clone, Default)]
pub struct Program {
    pub clauses: Vec<Clause>,
}

impl Program {
    /// The head predicate of the last clause — by convention in this
    /// engine, the predicate a caller queries when they don't name one
    /// explicitly (mirrors Prolog's "last defined relation is the goal"
    /// convention used by small embedded Datalogs).
    pub fn default_target(&self) -> Option<&str> {
        self.clauses.last().map(|c| c.head.predicate.as_str())
    }
}

pub type Binding = HashMap<String, Value>;

#[derive(Debug, Error)]
pub enum DatalogError {
    #[error("datalog syntax error: {0}")]
    Syntax(String),
    #[error("variable `{0}` in a negated goal is not bound by an earlier goal")]
    UnboundNegation(String),
    #[error("head variable `{0}` does not appear in the rule body")]
    UnboundHeadVar(String),
    #[error("query exceeded its time budget")]
    Timeout,
    #[error("query produced more than the bindings cap")]
    BindingsCapExceeded,
    #[error("unknown predicate `{0}/{1}`")]
    UnknownPredicate(String, usize),
}

// ---------------------------------------------------------------------
// Tokenizer + parser
// ---------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(i64),
    LParen,
    RParen,
    Comma,
    Dot,
    ImpliedBy,
    Not,
}

fn tokenize(text: &str) -> Result<Vec<Token>, DatalogError> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            ':' if chars.get(i + 1) == Some(&'-') => {
                tokens.push(Token::ImpliedBy);
                i += 2;
            }
            '\\' if chars.get(i + 1) == Some(&'+') => {
                tokens.push(Token::Not);
                i += 2;
            }
            '.' => {
                tokens.push(Token::Dot);
                i += 1;
            }
            '"' => {
                let mut s = String::new();
                i += 1;
                while i < chars.len() && chars[i] != '"' {
                    s.push(chars[i]);
                    i += 1;
                }
                if i >= chars.len() {
                    return Err(DatalogError::Syntax("unterminated string literal".to_string()));
                }
                i += 1; // closing quote
                tokens.push(Token::Str(s));
            }
            c if c.is_ascii_digit() || (c == '-' && chars.get(i + 1).is_some_and(|n| n.is_ascii_digit())) => {
                let start = i;
                i += 1;
                while i < chars.len() && chars[i].is_ascii_digit() {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let n = text
                    .parse::<i64>()
                    .map_err(|_| DatalogError::Syntax(format!("bad number literal `{text}`")))?;
                tokens.push(Token::Num(n));
            }
            c if c.is_alphanumeric() || c == '_' => {
                let start = i;
                i += 1;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
            other => {
                return Err(DatalogError::Syntax(format!("unexpected character `{other}`")));
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let t = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        t
    }

    fn expect(&mut self, expected: &Token) -> Result<(), DatalogError> {
        match self.next() {
            Some(t) if &t == expected => Ok(()),
            other => Err(DatalogError::Syntax(format!("expected {expected:?}, found {other:?}"))),
        }
    }

    fn parse_program(&mut self) -> Result<Program, DatalogError> {
        let mut clauses = Vec::new();
        while self.peek().is_some() {
            clauses.push(self.parse_clause()?);
        }
        Ok(Program { clauses })
    }

    fn parse_clause(&mut self) -> Result<Clause, DatalogError> {
        let head = self.parse_atom()?;
        match self.next() {
            Some(Token::Dot) => Ok(Clause { head, body: Vec::new() }),
            Some(Token::ImpliedBy) => {
                let mut body = vec![self.parse_goal()?];
                loop {
                    match self.next() {
                        Some(Token::Dot) => break,
                        Some(Token::Comma) => body.push(self.parse_goal()?),
                        other => return Err(DatalogError::Syntax(format!("expected `,` or `.`, found {other:?}"))),
                    }
                }
                Ok(Clause { head, body })
            }
            other => Err(DatalogError::Syntax(format!("expected `:-` or `.`, found {other:?}"))),
        }
    }

    fn parse_goal(&mut self) -> Result<Atom, DatalogError> {
        let negated = matches!(self.peek(), Some(Token::Not));
        if negated {
            self.next();
        }
        let mut atom = self.parse_atom()?;
        atom.negated = negated;
        Ok(atom)
    }

    fn parse_atom(&mut self) -> Result<Atom, DatalogError> {
        let predicate = match self.next() {
            Some(Token::Ident(name)) => name,
            other => return Err(DatalogError::Syntax(format!("expected predicate name, found {other:?}"))),
        };
        self.expect(&Token::LParen)?;
        let mut args = Vec::new();
        if self.peek() != Some(&Token::RParen) {
            args.push(self.parse_term()?);
            while self.peek() == Some(&Token::Comma) {
                self.next();
                args.push(self.parse_term()?);
            }
        }
        self.expect(&Token::RParen)?;
        Ok(Atom { predicate, args, negated: false })
    }

    fn parse_term(&mut self) -> Result<Term, DatalogError> {
        match self.next() {
            Some(Token::Ident(name)) => {
                if name.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
                    Ok(Term::Var(name))
                } else {
                    Ok(Term::Const(Value::Str(name)))
                }
            }
            Some(Token::Str(s)) => Ok(Term::Const(Value::Str(s))),
            Some(Token::Num(n)) => Ok(Term::Const(Value::Num(n))),
            other => Err(DatalogError::Syntax(format!("expected a term, found {other:?}"))),
        }
    }
}

pub fn parse_program(text: &str) -> Result<Program, DatalogError> {
    let tokens = tokenize(text)?;
    Parser { tokens, pos: 0 }.parse_program()
}

// ---------------------------------------------------------------------
// Fact storage, indexed per spec §9 "(pred, arity, bound-positions)"
// ---------------------------------------------------------------------

/// All facts for one `(predicate, arity)` pair, with a per-column index
/// built lazily as rows arrive — a join that binds column `c` looks up
/// `col_index[c]` instead of scanning every row.
#[derive(Debug, Default)]
pub struct FactTable {
    arity: usize,
    rows: Vec<Vec<Value>>,
    seen: HashSet<Vec<Value>>,
    col_index: Vec<HashMap<Value, Vec<usize>>>,
}

impl FactTable {
    fn new(arity: usize) -> Self {
        FactTable {
            arity,
            rows: Vec::new(),
            seen: HashSet::new(),
            col_index: (0..arity).map(|_| HashMap::new()).collect(),
        }
    }

    /// Returns `true` if `row` was not already present.
    fn insert(&mut self, row: Vec<Value>) -> bool {
        debug_assert_eq!(row.len(), self.arity);
        if self.seen.contains(&row) {
            return false;
        }
        let idx = self.rows.len();
        for (col, value) in row.iter().enumerate() {
            self.col_index[col].entry(value.clone()).or_default().push(idx);
        }
        self.seen.insert(row.clone());
        self.rows.push(row);
        true
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Rows matching every `(column, value)` pair in `bound`, using the
    /// most selective available index (the first bound column) as the
    /// candidate set and filtering the rest in memory.
    fn lookup(&self, bound: &[(usize, Value)]) -> Vec<&Vec<Value>> {
        let Some((first_col, first_val)) = bound.first() else {
            return self.rows.iter().collect();
        };
        let candidates = self.col_index[*first_col].get(first_val).cloned().unwrap_or_default();
        candidates
            .into_iter()
            .map(|i| &self.rows[i])
            .filter(|row| bound.iter().all(|(c, v)| &row[*c] == v))
            .collect()
    }
}

pub type FactStore = HashMap<(String, usize), FactTable>;

fn add_fact(store: &mut FactStore, predicate: &str, row: Vec<Value>) {
    let key = (predicate.to_string(), row.len());
    store.entry(key).or_insert_with(|| FactTable::new(row.len())).insert(row);
}

/// Synthesizes `node/2`, `edge/3`, `attr/3` extensional facts from the
/// graph (spec §4.7 "Query surface": "Rules use three predicates").
pub fn load_graph_facts(backend: &dyn GraphBackend) -> FactStore {
    let mut store: FactStore = HashMap::new();

    for node in backend.all_nodes() {
        let id = node.id.to_string();
        store.entry(("node".to_string(), 2)).or_insert_with(|| FactTable::new(2)).insert(vec![
            Value::Node(id.clone()),
            Value::Str(node.type_tag()),
        ]);

        add_fact(&mut store, "attr", vec![Value::Node(id.clone()), Value::Str("name".to_string()), Value::Str(node.name.clone())]);
        if let Some(file) = &node.file {
            add_fact(&mut store, "attr", vec![Value::Node(id.clone()), Value::Str("file".to_string()), Value::Str(file.display().to_string())]);
        }
        if let Some(line) = node.line {
            add_fact(&mut store, "attr", vec![Value::Node(id.clone()), Value::Str("line".to_string()), Value::Num(line as i64)]);
        }
        for (attr_name, value) in node_specific_attrs(&node.payload) {
            add_fact(&mut store, "attr", vec![Value::Node(id.clone()), Value::Str(attr_name), value]);
        }
    }

    for edge in backend.all_edges() {
        add_fact(
            &mut store,
            "edge",
            vec![Value::Node(edge.source.to_string()), Value::Node(edge.target.to_string()), Value::Str(edge.kind.as_str().to_string())],
        );
    }

    store
}

fn node_specific_attrs(payload: &grafema_core::model::NodePayload) -> Vec<(String, Value)> {
    use grafema_core::model::NodePayload::*;
    match payload {
        Call(a) => vec![
            ("object".to_string(), Value::Bool(a.has_object)),
        ],
        MethodCall(a) => vec![
            ("object".to_string(), Value::Bool(a.object_name.is_some())),
        ],
        ConstructorCall(a) => vec![("className".to_string(), Value::Str(a.class_name.clone()))],
        Class(a) => vec![
            ("abstract".to_string(), Value::Bool(a.is_abstract)),
        ],
        Interface(a) => vec![("propertyCount".to_string(), Value::Num(a.property_count as i64))],
        Variable(a) | Constant(a) => vec![
            ("const".to_string(), Value::Bool(a.is_const)),
            ("uninitialized".to_string(), Value::Bool(a.uninitialized)),
        ],
        Import(a) => vec![("source".to_string(), Value::Str(a.source.clone()))],
        Literal(a) => vec![
            ("kind".to_string(), Value::Str(a.literal_kind.clone())),
            ("raw".to_string(), Value::Str(a.raw.clone())),
        ],
        Issue(a) => vec![
            ("category".to_string(), Value::Str(a.category.clone())),
            ("severity".to_string(), Value::Str(format!("{:?}", a.severity).to_lowercase())),
        ],
        Guarantee(a) => vec![
            ("rule".to_string(), Value::Str(a.rule.clone())),
            ("severity".to_string(), Value::Str(format!("{:?}", a.severity).to_lowercase())),
        ],
        _ => Vec::new(),
    }
}

// ---------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct EvalLimits {
    pub timeout: Duration,
    pub bindings_cap: usize,
}

impl Default for EvalLimits {
    fn default() -> Self {
        EvalLimits { timeout: Duration::from_secs(30), bindings_cap: 1_000_000 }
    }
}

#[derive(Debug, Default)]
pub struct QueryOutcome {
    pub bindings: Vec<Binding>,
    pub truncated: bool,
}

fn substitute(atom: &Atom, binding: &Binding) -> (Vec<(usize, Value)>, Vec<(usize, String)>) {
    let mut bound = Vec::new();
    let mut free = Vec::new();
    for (col, term) in atom.args.iter().enumerate() {
        match term {
            Term::Const(v) => bound.push((col, v.clone())),
            Term::Var(name) => match binding.get(name) {
                Some(v) => bound.push((col, v.clone())),
                None => free.push((col, name.clone())),
            },
        }
    }
    (bound, free)
}

fn eval_goal(store: &FactStore, atom: &Atom, bindings: Vec<Binding>, limits: &EvalLimits, deadline: Instant) -> Result<Vec<Binding>, DatalogError> {
    let arity = atom.args.len();
    let table = store.get(&(atom.predicate.clone(), arity));

    if atom.negated {
        let mut out = Vec::with_capacity(bindings.len());
        for b in bindings {
            if Instant::now() > deadline {
                return Err(DatalogError::Timeout);
            }
            let (bound, free) = substitute(atom, &b);
            if !free.is_empty() {
                return Err(DatalogError::UnboundNegation(free[0].1.clone()));
            }
            let matched = table.is_some_and(|t| !t.lookup(&bound).is_empty());
            if !matched {
                out.push(b);
            }
        }
        return Ok(out);
    }

    let Some(table) = table else {
        return Ok(Vec::new());
    };

    let mut out = Vec::new();
    for b in bindings {
        if Instant::now() > deadline {
            return Err(DatalogError::Timeout);
        }
        let (bound, free) = substitute(atom, &b);
        for row in table.lookup(&bound) {
            let mut extended = b.clone();
            let mut ok = true;
            for (col, name) in &free {
                match extended.insert(name.clone(), row[*col].clone()) {
                    Some(prev) if prev != row[*col] => {
                        ok = false;
                        break;
                    }
                    _ => {}
                }
            }
            if ok {
                out.push(extended);
                if out.len() > limits.bindings_cap {
                    return Err(DatalogError::BindingsCapExceeded);
                }
            }
        }
    }
    Ok(out)
}

fn eval_body(store: &FactStore, body: &[Atom], limits: &EvalLimits, deadline: Instant) -> Result<Vec<Binding>, DatalogError> {
    let mut bindings = vec![Binding::new()];
    for atom in body {
        bindings = eval_goal(store, atom, bindings, limits, deadline)?;
        if bindings.is_empty() {
            break;
        }
    }
    Ok(bindings)
}

/// Runs `program` to a fixpoint over `store` (mutated with every newly
/// derived intensional fact), then projects the rows of `target`'s
/// widest matching arity back into named bindings using the variable
/// names of its defining clause's head.
pub fn evaluate(mut store: FactStore, program: &Program, target: &str, limits: &EvalLimits) -> Result<QueryOutcome, DatalogError> {
    let deadline = Instant::now() + limits.timeout;

    loop {
        let mut changed = false;
        for clause in &program.clauses {
            if clause.body.is_empty() {
                continue;
            }
            if Instant::now() > deadline {
                return Err(DatalogError::Timeout);
            }
            let bindings = eval_body(&store, &clause.body, limits, deadline)?;
            let arity = clause.head.args.len();
            for b in bindings {
                let mut row = Vec::with_capacity(arity);
                for term in &clause.head.args {
                    let v = match term {
                        Term::Const(v) => v.clone(),
                        Term::Var(name) => b
                            .get(name)
                            .cloned()
                            .ok_or_else(|| DatalogError::UnboundHeadVar(name.clone()))?,
                    };
                    row.push(v);
                }
                let table = store
                    .entry((clause.head.predicate.clone(), arity))
                    .or_insert_with(|| FactTable::new(arity));
                if table.insert(row) {
                    changed = true;
                }
                if table.rows().len() > limits.bindings_cap {
                    return Err(DatalogError::BindingsCapExceeded);
                }
            }
        }
        if !changed {
            break;
        }
    }

    let Some(defining) = program.clauses.iter().find(|c| c.head.predicate == target) else {
        return Err(DatalogError::UnknownPredicate(target.to_string(), 0));
    };
    let arity = defining.head.args.len();
    let Some(table) = store.get(&(target.to_string(), arity)) else {
        return Ok(QueryOutcome::default());
    };

    let var_names: Vec<Option<&str>> = defining
        .head
        .args
        .iter()
        .map(|t| match t {
            Term::Var(name) => Some(name.as_str()),
            Term::Const(_) => None,
        })
        .collect();

    let bindings = table
        .rows()
        .iter()
        .map(|row| {
            let mut b = Binding::new();
            for (col, name) in var_names.iter().enumerate() {
                if let Some(name) = name {
                    b.insert(name.to_string(), row[col].clone());
                }
            }
            b
        })
        .collect();

    Ok(QueryOutcome { bindings, truncated: false })
}

#[cfg(test)]
mod tests {
    use super::*;
    use grafema_core::graph::InMemoryGraph;
    use grafema_core::ident::NodeId;
    use grafema_core::model::{CallAttrs, FunctionAttrs, GraphNode, ModuleAttrs, NodePayload};

    fn node(id: &str, name: &str, payload: NodePayload) -> GraphNode {
        GraphNode { id: NodeId::from_raw(id), name: name.to_string(), file: Some("a.ts".into()), line: Some(3), column: None, payload }
    }

    #[test]
    fn parses_a_simple_rule() {
        let program = parse_program(r#"violation(X) :- node(X,"CALL"), attr(X,"name","eval")."#).unwrap();
        assert_eq!(program.clauses.len(), 1);
        assert_eq!(program.clauses[0].body.len(), 2);
        assert_eq!(program.default_target(), Some("violation"));
    }

    #[test]
    fn finds_an_eval_call_node() {
        let mut backend = InMemoryGraph::new();
        backend
            .add_nodes(vec![
                node("MODULE#a.ts", "a.ts", NodePayload::Module(ModuleAttrs::default())),
                node("CALL#eval", "eval", NodePayload::Call(CallAttrs::default())),
                node("FUNCTION#noop", "noop", NodePayload::Function(FunctionAttrs::default())),
            ])
            .unwrap();

        let store = load_graph_facts(&backend);
        let program = parse_program(r#"violation(X) :- node(X,"CALL"), attr(X,"name","eval")."#).unwrap();
        let outcome = evaluate(store, &program, "violation", &EvalLimits::default()).unwrap();

        assert_eq!(outcome.bindings.len(), 1);
        assert_eq!(outcome.bindings[0].get("X"), Some(&Value::Node("CALL#eval".to_string())));
    }

    #[test]
    fn negation_requires_prior_binding() {
        let mut backend = InMemoryGraph::new();
        backend.add_nodes(vec![node("MODULE#a.ts", "a.ts", NodePayload::Module(ModuleAttrs::default()))]).unwrap();
        let store = load_graph_facts(&backend);
        let program = parse_program(r#"bad(X) :- \+ node(X,"MODULE")."#).unwrap();
        let err = evaluate(store, &program, "bad", &EvalLimits::default()).unwrap_err();
        assert!(matches!(err, DatalogError::UnboundNegation(_)));
    }

    #[test]
    fn unresolved_calls_via_negated_helper_relation() {
        // `\+ edge(X,Y,"CALLS")` would leave `Y` unbound inside the
        // negated goal (unsafe per standard Datalog negation rules); the
        // existential is expressed as a helper relation instead, matching
        // how `CallResolverValidator`'s rule is meant to be read.
        let mut backend = InMemoryGraph::new();
        backend
            .add_nodes(vec![node("CALL#foo", "foo", NodePayload::Call(CallAttrs::default()))])
            .unwrap();
        let store = load_graph_facts(&backend);
        let program = parse_program(
            r#"has_calls(X) :- edge(X,Y,"CALLS"). unresolved(X) :- node(X,"CALL"), \+ has_calls(X)."#,
        )
        .unwrap();
        let outcome = evaluate(store, &program, "unresolved", &EvalLimits::default()).unwrap();
        assert_eq!(outcome.bindings.len(), 1);
    }
}
