//! Predicate expressions gating matcher-table patterns.
//!
//! The backend emits two predicate artifacts: named predicate records
//! (feature tests with a symbolic name and a source condition string) and
//! compiled pattern predicates (one boolean expression per gated pattern,
//! the conjunction of its named predicates). Both are parsed into a single
//! arena of expression nodes owned by [`PredicateKeeper`]; composites
//! reference atoms by index, so structural sharing needs no reference
//! counting. Atoms cache their truth value; flipping an atom and calling
//! [`PredicateKeeper::resolve`] re-evaluates the whole DAG.

use crate::error::{MapearError, MapearResult};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};

/// Handle to a predicate node in the keeper's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PredicateRef(usize);

impl PredicateRef {
    /// The always-true sentinel, present in every keeper
    pub const TRUE: Self = Self(0);
    /// The always-false sentinel, present in every keeper
    pub const FALSE: Self = Self(1);
}

/// Expression shape of one arena node
#[derive(Debug, Clone)]
enum PredicateExpr {
    /// Atom; the node's cached value is the source of truth
    Literal,
    Not(PredicateRef),
    And(Vec<PredicateRef>),
    Or(Vec<PredicateRef>),
}

#[derive(Debug, Clone)]
struct PredicateNode {
    expr: PredicateExpr,
    value: bool,
}

/// Owner of every predicate node parsed from the lookup artifact.
///
/// Named predicates keep their declaration order; unknown bare expressions
/// encountered while parsing composites are appended as fresh `false` atoms
/// under their own (case-normalized) source text.
#[derive(Debug)]
pub struct PredicateKeeper {
    arena: Vec<PredicateNode>,
    /// One entry per declared named predicate, plus synthesized unknowns
    named: Vec<PredicateRef>,
    /// Normalized name to `named` index
    name_lookup: HashMap<String, usize>,
    /// Exact source expression to the name of the predicate owning it
    literal_expressions: HashMap<String, String>,
    /// One entry per compiled pattern predicate
    pattern: Vec<PredicateRef>,
    case_sensitive: bool,
    customized_pattern_predicates: bool,
    dirty: bool,
    verbosity: u8,
    cond_string_re: Regex,
    literal_re: Regex,
}

impl Default for PredicateKeeper {
    fn default() -> Self {
        Self::new()
    }
}

impl PredicateKeeper {
    /// Create an empty keeper holding only the two sentinels
    ///
    /// # Panics
    ///
    /// Never; the embedded regexes are static and known-good.
    #[must_use]
    #[allow(clippy::unwrap_used)]
    pub fn new() -> Self {
        // The backend's generated expressions are whitespace-disciplined, so
        // a regex over identifiers, one call level and one comparison is
        // enough; no tokenizer needed.
        let ident = "[A-Za-z_][A-Za-z0-9_]*";
        let call = format!("{ident}(\\(.*?\\))?");
        let value = format!("({ident}::)?{call}((->|\\.){call})*");
        let literal = format!("^{value}( (==|!=) {value})?");
        Self {
            arena: vec![
                PredicateNode {
                    expr: PredicateExpr::Literal,
                    value: true,
                },
                PredicateNode {
                    expr: PredicateExpr::Literal,
                    value: false,
                },
            ],
            named: Vec::new(),
            name_lookup: HashMap::new(),
            literal_expressions: HashMap::new(),
            pattern: Vec::new(),
            case_sensitive: false,
            customized_pattern_predicates: false,
            dirty: false,
            verbosity: 0,
            cond_string_re: Regex::new(r#"string CondString = "(.+?)";"#).unwrap(),
            literal_re: Regex::new(&literal).unwrap(),
        }
    }

    /// Treat predicate names as case-sensitive. Must be set before any
    /// names are added; the default folds names to lower case.
    pub fn set_case_sensitive(&mut self, case_sensitive: bool) {
        self.case_sensitive = case_sensitive;
    }

    /// Diagnostic chattiness; unknown-literal warnings print at 2 and up
    pub fn set_verbosity(&mut self, verbosity: u8) {
        self.verbosity = verbosity;
    }

    /// Current diagnostic chattiness
    #[must_use]
    pub const fn verbosity(&self) -> u8 {
        self.verbosity
    }

    fn normalize(&self, name: &str) -> String {
        if self.case_sensitive {
            name.to_string()
        } else {
            name.to_lowercase()
        }
    }

    /// Cached truth value of a node
    #[must_use]
    pub fn satisfied(&self, predicate: PredicateRef) -> bool {
        self.arena[predicate.0].value
    }

    /// Cached truth value of a named predicate, `None` if out of range
    #[must_use]
    pub fn named_satisfied(&self, index: usize) -> Option<bool> {
        self.named.get(index).map(|r| self.satisfied(*r))
    }

    /// Cached truth value of a pattern predicate; out-of-range reads as
    /// unsatisfiable
    #[must_use]
    pub fn pattern_satisfied(&self, index: usize) -> bool {
        self.pattern.get(index).is_some_and(|r| self.satisfied(*r))
    }

    /// Look up a named predicate. `"TruePredicate"` and `"FalsePredicate"`
    /// resolve to the sentinels without a declaration.
    ///
    /// # Errors
    ///
    /// [`MapearError::UnknownPredicate`] if the name was never declared.
    pub fn name_ref(&self, name: &str) -> MapearResult<PredicateRef> {
        if name == "TruePredicate" {
            return Ok(PredicateRef::TRUE);
        }
        if name == "FalsePredicate" {
            return Ok(PredicateRef::FALSE);
        }
        self.name_lookup
            .get(&self.normalize(name))
            .map(|&idx| self.named[idx])
            .ok_or_else(|| MapearError::UnknownPredicate {
                name: name.to_string(),
            })
    }

    /// Look up a named predicate by declaration index
    ///
    /// # Errors
    ///
    /// [`MapearError::PredicateIndexOutOfRange`] if out of range.
    pub fn named_ref(&self, index: usize) -> MapearResult<PredicateRef> {
        self.named
            .get(index)
            .copied()
            .ok_or(MapearError::PredicateIndexOutOfRange {
                index,
                count: self.named.len(),
            })
    }

    /// Look up a compiled pattern predicate by index
    ///
    /// # Errors
    ///
    /// [`MapearError::PredicateIndexOutOfRange`] if out of range.
    pub fn pattern_ref(&self, index: usize) -> MapearResult<PredicateRef> {
        self.pattern
            .get(index)
            .copied()
            .ok_or(MapearError::PredicateIndexOutOfRange {
                index,
                count: self.pattern.len(),
            })
    }

    /// Declaration index of a named predicate, `None` if never declared
    #[must_use]
    pub fn named_index_of(&self, name: &str) -> Option<usize> {
        self.name_lookup.get(&self.normalize(name)).copied()
    }

    /// Number of named predicates (declared plus synthesized unknowns)
    #[must_use]
    pub fn named_count(&self) -> usize {
        self.named.len()
    }

    /// Number of compiled pattern predicates
    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.pattern.len()
    }

    /// Whether atoms changed since the last [`resolve`](Self::resolve)
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Whether the caller overwrote the pattern predicates with an explicit
    /// assignment, making the named-predicate sanity check meaningless
    #[must_use]
    pub const fn customized_pattern_predicates(&self) -> bool {
        self.customized_pattern_predicates
    }

    /// Force a named predicate true
    ///
    /// # Errors
    ///
    /// [`MapearError::UnknownPredicate`] if the name was never declared.
    pub fn enable(&mut self, name: &str) -> MapearResult<()> {
        let r = self.name_ref(name)?;
        self.force(r, true);
        self.dirty = true;
        Ok(())
    }

    /// Force a named predicate true by declaration index
    ///
    /// # Errors
    ///
    /// [`MapearError::PredicateIndexOutOfRange`] if out of range.
    pub fn enable_index(&mut self, index: usize) -> MapearResult<()> {
        let r = self.named_ref(index)?;
        self.force(r, true);
        self.dirty = true;
        Ok(())
    }

    /// Force a named predicate false
    ///
    /// # Errors
    ///
    /// [`MapearError::UnknownPredicate`] if the name was never declared.
    pub fn disable(&mut self, name: &str) -> MapearResult<()> {
        let r = self.name_ref(name)?;
        self.force(r, false);
        self.dirty = true;
        Ok(())
    }

    /// Force a named predicate false by declaration index
    ///
    /// # Errors
    ///
    /// [`MapearError::PredicateIndexOutOfRange`] if out of range.
    pub fn disable_index(&mut self, index: usize) -> MapearResult<()> {
        let r = self.named_ref(index)?;
        self.force(r, false);
        self.dirty = true;
        Ok(())
    }

    /// Best-effort recursive propagation of a target value. Atoms just take
    /// the value. A negation flips it and recurses. A conjunction forced
    /// true forces every child true; forced false it leaves the children
    /// alone (many solutions). A disjunction forced true forces its first
    /// child; forced false it forces every child false.
    fn force(&mut self, predicate: PredicateRef, value: bool) {
        if predicate == PredicateRef::TRUE || predicate == PredicateRef::FALSE {
            return;
        }
        let expr = self.arena[predicate.0].expr.clone();
        match expr {
            PredicateExpr::Literal => self.arena[predicate.0].value = value,
            PredicateExpr::Not(child) => {
                self.arena[predicate.0].value = value;
                self.force(child, !value);
            }
            PredicateExpr::And(children) => {
                self.arena[predicate.0].value = value;
                if value {
                    for child in children {
                        self.force(child, true);
                    }
                }
            }
            PredicateExpr::Or(children) => {
                if self.arena[predicate.0].value == value {
                    return;
                }
                self.arena[predicate.0].value = value;
                if value {
                    self.force(children[0], true);
                } else {
                    for child in children {
                        self.force(child, false);
                    }
                }
            }
        }
    }

    /// Re-evaluate every node from the cached atom values. Children always
    /// precede their parents in the arena, so one forward pass suffices.
    pub fn resolve(&mut self) {
        for i in 0..self.arena.len() {
            let value = match &self.arena[i].expr {
                PredicateExpr::Literal => self.arena[i].value,
                PredicateExpr::Not(child) => !self.arena[child.0].value,
                PredicateExpr::And(children) => {
                    children.iter().all(|c| self.arena[c.0].value)
                }
                PredicateExpr::Or(children) => {
                    children.iter().any(|c| self.arena[c.0].value)
                }
            };
            self.arena[i].value = value;
        }
        self.dirty = false;
    }

    /// Install named predicates from backend record dumps. Each record is
    /// `Name … string CondString = "…"; …`. Atoms are installed first so
    /// that composite conditions can reference them.
    ///
    /// # Errors
    ///
    /// [`MapearError::MissingCondition`], [`MapearError::EmptyCondition`]
    /// or a parse error for a composite condition.
    pub fn add_named_predicates(&mut self, records: &[String]) -> MapearResult<()> {
        // Composite conditions parse after every atom exists
        let mut to_parse: BTreeMap<String, String> = BTreeMap::new();

        for record in records {
            let name_raw = record.split_whitespace().next().unwrap_or_default();
            let name = self.normalize(name_raw);

            let cond = self
                .cond_string_re
                .captures(record)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .ok_or_else(|| MapearError::MissingCondition { name: name.clone() })?;
            if cond.is_empty() {
                return Err(MapearError::EmptyCondition { name });
            }

            let slot = if cond.contains(['!', '|', '&']) {
                to_parse.insert(name.clone(), cond);
                // Reserved; overwritten once the composite parses
                PredicateRef::FALSE
            } else if cond == "true" {
                self.literal_expressions.insert(cond, name.clone());
                PredicateRef::TRUE
            } else {
                let atom = self.intern(PredicateExpr::Literal, false);
                self.literal_expressions.insert(cond, name.clone());
                atom
            };
            self.name_lookup.insert(name, self.named.len());
            self.named.push(slot);
        }

        for (name, cond) in to_parse {
            let parsed = self.parse_predicate(&cond)?;
            let idx = self.name_lookup[&name];
            self.named[idx] = parsed;
        }
        Ok(())
    }

    /// Install compiled pattern-predicate expressions and resolve the DAG
    ///
    /// # Errors
    ///
    /// A parse error for any expression.
    pub fn add_pattern_predicates(&mut self, expressions: &[String]) -> MapearResult<()> {
        for expression in expressions {
            let parsed = self.parse_predicate(expression)?;
            self.pattern.push(parsed);
        }
        self.resolve();
        Ok(())
    }

    /// Overwrite every pattern predicate with an explicit truth value.
    /// The compiled expressions get a best-effort forced resolution (which
    /// named atom of a disjunction made it true is unknowable), then each
    /// pattern root is replaced by a sentinel so later resolves cannot
    /// drift from the supplied assignment.
    ///
    /// # Errors
    ///
    /// [`MapearError::PatternPredicateCount`] on a length mismatch.
    pub fn update_pattern_predicates(&mut self, values: &[bool]) -> MapearResult<()> {
        if values.len() != self.pattern.len() {
            return Err(MapearError::PatternPredicateCount {
                expected: self.pattern.len(),
                actual: values.len(),
            });
        }
        self.customized_pattern_predicates = true;
        for (i, &value) in values.iter().enumerate() {
            let root = self.pattern[i];
            self.force(root, value);
            self.pattern[i] = if value {
                PredicateRef::TRUE
            } else {
                PredicateRef::FALSE
            };
        }
        Ok(())
    }

    fn intern(&mut self, expr: PredicateExpr, value: bool) -> PredicateRef {
        let r = PredicateRef(self.arena.len());
        self.arena.push(PredicateNode { expr, value });
        r
    }

    /// Parse one boolean expression in the backend's emitted syntax
    ///
    /// # Errors
    ///
    /// [`MapearError::PredicateParse`] describing the failure position.
    pub fn parse_predicate(&mut self, expression: &str) -> MapearResult<PredicateRef> {
        if expression.is_empty() {
            return Err(Self::parse_error("<expr>", expression, 0));
        }
        let mut pos = 0;
        self.parse_or(expression, &mut pos)
    }

    fn parse_or(&mut self, s: &str, pos: &mut usize) -> MapearResult<PredicateRef> {
        let mut children = vec![self.parse_and(s, pos)?];
        while s[*pos..].starts_with(" ||") {
            *pos += 3;
            if s[*pos..].starts_with(' ') {
                *pos += 1;
            }
            children.push(self.parse_and(s, pos)?);
        }
        if children.len() == 1 {
            return Ok(children[0]);
        }
        Ok(self.intern(PredicateExpr::Or(children), false))
    }

    fn parse_and(&mut self, s: &str, pos: &mut usize) -> MapearResult<PredicateRef> {
        let mut children = vec![self.parse_not(s, pos)?];
        while s[*pos..].starts_with(" &&") {
            *pos += 3;
            if s[*pos..].starts_with(' ') {
                *pos += 1;
            }
            children.push(self.parse_not(s, pos)?);
        }
        if children.len() == 1 {
            return Ok(children[0]);
        }
        Ok(self.intern(PredicateExpr::And(children), false))
    }

    fn parse_not(&mut self, s: &str, pos: &mut usize) -> MapearResult<PredicateRef> {
        if s[*pos..].starts_with('!') {
            *pos += 1;
            let child = self.parse_literal(s, pos)?;
            return Ok(self.intern(PredicateExpr::Not(child), false));
        }
        self.parse_literal(s, pos)
    }

    fn parse_group(&mut self, s: &str, pos: &mut usize) -> MapearResult<PredicateRef> {
        if !s[*pos..].starts_with('(') {
            return Err(Self::parse_error("(", s, *pos));
        }
        *pos += 1;
        let inner = self.parse_or(s, pos)?;
        if !s[*pos..].starts_with(')') {
            return Err(Self::parse_error(")", s, *pos));
        }
        *pos += 1;
        Ok(inner)
    }

    fn parse_literal(&mut self, s: &str, pos: &mut usize) -> MapearResult<PredicateRef> {
        if s[*pos..].starts_with('(') {
            return self.parse_group(s, pos);
        }

        let Some(found) = self.literal_re.find(&s[*pos..]) else {
            return Err(Self::parse_error("<literal>", s, *pos));
        };
        let expr = found.as_str().to_string();
        *pos += expr.len();

        if !self.literal_expressions.contains_key(&expr) {
            if self.verbosity > 1 {
                eprintln!("WARNING: Found unnamed predicate literal: {expr}.");
            }
            let atom = self.intern(PredicateExpr::Literal, false);
            let lookup_name = self.normalize(&expr);
            self.name_lookup
                .insert(lookup_name.clone(), self.named.len());
            self.named.push(atom);
            self.literal_expressions.insert(expr.clone(), lookup_name);
        }
        let owner = self.literal_expressions[&expr].clone();
        self.name_ref(&owner)
    }

    fn parse_error(expected: &str, expression: &str, pos: usize) -> MapearError {
        MapearError::PredicateParse {
            expected: expected.to_string(),
            expression: expression.to_string(),
            at: pos + 1,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn record(name: &str, cond: &str) -> String {
        format!("{name} {{ // Predicate\n  string CondString = \"{cond}\";\n}}")
    }

    fn keeper_with_atoms() -> PredicateKeeper {
        let mut pk = PredicateKeeper::new();
        pk.add_named_predicates(&[
            record("PredA", "Subtarget->hasA()"),
            record("PredB", "Subtarget->hasB()"),
            record("PredC", "Subtarget->hasC()"),
        ])
        .unwrap();
        pk
    }

    #[test]
    fn test_sentinels() {
        let pk = PredicateKeeper::new();
        assert!(pk.satisfied(PredicateRef::TRUE));
        assert!(!pk.satisfied(PredicateRef::FALSE));
        assert_eq!(pk.name_ref("TruePredicate").unwrap(), PredicateRef::TRUE);
        assert_eq!(pk.name_ref("FalsePredicate").unwrap(), PredicateRef::FALSE);
    }

    #[test]
    fn test_atoms_default_false_and_flip() {
        let mut pk = keeper_with_atoms();
        let a = pk.name_ref("PredA").unwrap();
        assert!(!pk.satisfied(a));

        pk.enable("PredA").unwrap();
        assert!(pk.is_dirty());
        pk.resolve();
        assert!(pk.satisfied(a));
        assert!(!pk.is_dirty());

        pk.disable("PredA").unwrap();
        pk.resolve();
        assert!(!pk.satisfied(a));
    }

    #[test]
    fn test_true_condition_maps_to_sentinel() {
        let mut pk = PredicateKeeper::new();
        pk.add_named_predicates(&[record("AlwaysOn", "true")]).unwrap();
        let r = pk.name_ref("AlwaysOn").unwrap();
        assert_eq!(r, PredicateRef::TRUE);
        assert!(pk.satisfied(r));
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let pk = keeper_with_atoms();
        assert_eq!(
            pk.name_ref("PREDA").unwrap(),
            pk.name_ref("preda").unwrap()
        );
        assert_eq!(pk.named_index_of("PredB"), pk.named_index_of("predb"));
    }

    #[test]
    fn test_case_sensitive_lookup() {
        let mut pk = PredicateKeeper::new();
        pk.set_case_sensitive(true);
        pk.add_named_predicates(&[record("PredA", "Subtarget->hasA()")])
            .unwrap();
        assert!(pk.name_ref("PredA").is_ok());
        assert!(pk.name_ref("preda").is_err());
    }

    #[test]
    fn test_unknown_name_is_error() {
        let pk = keeper_with_atoms();
        assert!(matches!(
            pk.name_ref("NoSuchPredicate"),
            Err(MapearError::UnknownPredicate { .. })
        ));
    }

    #[test]
    fn test_composite_references_atoms() {
        let mut pk = keeper_with_atoms();
        pk.add_named_predicates(&[record(
            "Both",
            "Subtarget->hasA() && Subtarget->hasB()",
        )])
        .unwrap();
        pk.resolve();
        let both = pk.name_ref("Both").unwrap();
        assert!(!pk.satisfied(both));

        pk.enable("PredA").unwrap();
        pk.enable("PredB").unwrap();
        pk.resolve();
        assert!(pk.satisfied(both));

        pk.disable("PredB").unwrap();
        pk.resolve();
        assert!(!pk.satisfied(both));
    }

    #[test]
    fn test_precedence_not_binds_tighter_than_and_or() {
        // !A && (B || C): true iff A is false and at least one of B, C holds
        let mut pk = keeper_with_atoms();
        pk.add_pattern_predicates(&[
            "!Subtarget->hasA() && (Subtarget->hasB() || Subtarget->hasC())".to_string(),
        ])
        .unwrap();
        assert!(!pk.pattern_satisfied(0));

        pk.enable("PredB").unwrap();
        pk.enable("PredC").unwrap();
        pk.disable("PredA").unwrap();
        pk.resolve();
        assert!(pk.pattern_satisfied(0));

        pk.enable("PredA").unwrap();
        pk.resolve();
        assert!(!pk.pattern_satisfied(0));
    }

    #[test]
    fn test_or_without_space_after_operator() {
        let mut pk = keeper_with_atoms();
        pk.add_pattern_predicates(&["Subtarget->hasA() ||Subtarget->hasB()".to_string()])
            .unwrap();
        pk.enable("PredB").unwrap();
        pk.resolve();
        assert!(pk.pattern_satisfied(0));
    }

    #[test]
    fn test_unknown_literal_becomes_named_atom() {
        let mut pk = keeper_with_atoms();
        let before = pk.named_count();
        pk.add_pattern_predicates(&["Subtarget->hasZ()".to_string()])
            .unwrap();
        assert_eq!(pk.named_count(), before + 1);
        assert!(!pk.pattern_satisfied(0));

        // The synthesized atom is addressable under its source text
        pk.enable("Subtarget->hasZ()").unwrap();
        pk.resolve();
        assert!(pk.pattern_satisfied(0));
    }

    #[test]
    fn test_duplicate_expression_deduplicates() {
        let mut pk = keeper_with_atoms();
        pk.add_pattern_predicates(&[
            "Subtarget->hasZ()".to_string(),
            "Subtarget->hasZ()".to_string(),
        ])
        .unwrap();
        let before = pk.named_count();
        // Both pattern predicates share one synthesized atom
        pk.enable("Subtarget->hasZ()").unwrap();
        pk.resolve();
        assert!(pk.pattern_satisfied(0));
        assert!(pk.pattern_satisfied(1));
        assert_eq!(pk.named_count(), before);
    }

    #[test]
    fn test_comparison_literal() {
        let mut pk = PredicateKeeper::new();
        pk.add_named_predicates(&[record("IsBig", "Subtarget->getXLen() == 64")])
            .unwrap();
        pk.enable("IsBig").unwrap();
        pk.resolve();
        let r = pk.name_ref("IsBig").unwrap();
        assert!(pk.satisfied(r));
    }

    #[test]
    fn test_parse_failure_reports_position() {
        let mut pk = PredicateKeeper::new();
        let err = pk.parse_predicate("&& broken").unwrap_err();
        match err {
            MapearError::PredicateParse { at, .. } => assert_eq!(at, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unclosed_group_is_error() {
        let mut pk = keeper_with_atoms();
        assert!(matches!(
            pk.parse_predicate("(Subtarget->hasA() && Subtarget->hasB()"),
            Err(MapearError::PredicateParse { .. })
        ));
    }

    #[test]
    fn test_missing_condition_is_error() {
        let mut pk = PredicateKeeper::new();
        let err = pk
            .add_named_predicates(&["Broken { no condition here }".to_string()])
            .unwrap_err();
        assert!(matches!(err, MapearError::MissingCondition { .. }));
    }

    #[test]
    fn test_force_not_propagates_to_atom() {
        let mut pk = keeper_with_atoms();
        pk.add_named_predicates(&[record("NotA", "!Subtarget->hasA()")])
            .unwrap();
        pk.enable("NotA").unwrap();
        pk.resolve();
        let not_a = pk.name_ref("NotA").unwrap();
        let a = pk.name_ref("PredA").unwrap();
        assert!(pk.satisfied(not_a));
        assert!(!pk.satisfied(a));

        pk.disable("NotA").unwrap();
        pk.resolve();
        assert!(!pk.satisfied(not_a));
        assert!(pk.satisfied(a));
    }

    #[test]
    fn test_force_and_true_forces_children() {
        let mut pk = keeper_with_atoms();
        pk.add_named_predicates(&[record(
            "Both",
            "Subtarget->hasA() && Subtarget->hasB()",
        )])
        .unwrap();
        pk.enable("Both").unwrap();
        pk.resolve();
        assert!(pk.satisfied(pk.name_ref("PredA").unwrap()));
        assert!(pk.satisfied(pk.name_ref("PredB").unwrap()));
        assert!(pk.satisfied(pk.name_ref("Both").unwrap()));
    }

    #[test]
    fn test_force_or_false_forces_all_children() {
        let mut pk = keeper_with_atoms();
        pk.add_named_predicates(&[record(
            "Either",
            "Subtarget->hasA() || Subtarget->hasB()",
        )])
        .unwrap();
        pk.enable("PredA").unwrap();
        pk.enable("PredB").unwrap();
        pk.resolve();
        pk.disable("Either").unwrap();
        pk.resolve();
        assert!(!pk.satisfied(pk.name_ref("PredA").unwrap()));
        assert!(!pk.satisfied(pk.name_ref("PredB").unwrap()));
        assert!(!pk.satisfied(pk.name_ref("Either").unwrap()));
    }

    #[test]
    fn test_update_pattern_predicates_pins_values() {
        let mut pk = keeper_with_atoms();
        pk.add_pattern_predicates(&[
            "Subtarget->hasA()".to_string(),
            "Subtarget->hasB()".to_string(),
        ])
        .unwrap();
        pk.update_pattern_predicates(&[true, false]).unwrap();
        assert!(pk.customized_pattern_predicates());
        assert!(pk.pattern_satisfied(0));
        assert!(!pk.pattern_satisfied(1));

        // Re-resolving must not drift from the pinned assignment
        pk.disable("PredA").unwrap();
        pk.resolve();
        assert!(pk.pattern_satisfied(0));
        assert!(!pk.pattern_satisfied(1));
    }

    #[test]
    fn test_update_pattern_predicates_length_mismatch() {
        let mut pk = keeper_with_atoms();
        pk.add_pattern_predicates(&["Subtarget->hasA()".to_string()])
            .unwrap();
        assert!(matches!(
            pk.update_pattern_predicates(&[true, false]),
            Err(MapearError::PatternPredicateCount {
                expected: 1,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_index_accessors() {
        let mut pk = keeper_with_atoms();
        assert_eq!(pk.named_count(), 3);
        pk.enable_index(1).unwrap();
        pk.resolve();
        assert_eq!(pk.named_satisfied(1), Some(true));
        assert_eq!(pk.named_satisfied(0), Some(false));
        assert_eq!(pk.named_satisfied(17), None);
        assert!(pk.enable_index(17).is_err());
        pk.disable_index(1).unwrap();
        pk.resolve();
        assert_eq!(pk.named_satisfied(1), Some(false));
    }
}
