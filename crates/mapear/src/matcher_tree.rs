//! Traversal of the implicit matcher tree.
//!
//! The sorted matcher vector is already a DFS preorder of the nesting
//! structure, so the tree never materializes: a traversal is an index march
//! that recurses while the next matcher's interval nests inside the current
//! parent. Two analyses share that skeleton. The upper bound asks "could any
//! execution reach this byte under the current predicate assignment"; blame
//! analysis replays an observed shadow map and asks which opcode is
//! responsible for each uncovered region.

use crate::lookup::LookupTable;
use crate::matcher::{Matcher, MatcherKind, AFFECTS_EARLY_MATCH};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Analyses over a loaded lookup table. Borrows the table for the duration;
/// predicate values are read from the table's keeper as-is, so callers flip
/// and resolve predicates before constructing the tree.
#[derive(Debug)]
pub struct MatcherTree<'a> {
    table: &'a LookupTable,
    fallible_checks: Vec<MatcherKind>,
}

/// Result of the upper-bound computation
#[derive(Debug)]
pub struct UpperBound {
    /// Number of bytes some execution could still reach
    pub covered: usize,
    /// One bit per table byte; `true` marks statically unreachable bytes
    pub shadow_map: Vec<bool>,
    /// Unreachable bytes attributed to the pattern predicate whose check
    /// cut them off
    losses: HashMap<usize, usize>,
}

impl UpperBound {
    /// Bytes no execution can reach under the current assignment
    #[must_use]
    pub fn lost(&self) -> usize {
        self.shadow_map.len() - self.covered
    }

    /// Coverage loss per pattern-predicate index, heaviest first
    #[must_use]
    pub fn pattern_predicate_losses(&self) -> Vec<(usize, usize)> {
        let mut losses: Vec<(usize, usize)> = self.losses.iter().map(|(&k, &v)| (k, v)).collect();
        losses.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        losses
    }
}

/// One matcher opcode held responsible for an uncovered region
#[derive(Debug, Clone)]
pub struct Blamee {
    /// Index into the sorted matcher list
    pub matcher: usize,
    /// Uncovered bytes attributed to this opcode
    pub loss: usize,
    /// Patterns that would have been reached had this opcode succeeded
    pub blamers: BTreeSet<usize>,
    /// Check-nesting depth at which the blame was recorded
    pub depth: usize,
    /// True when the blamee is itself an unentered case or subscope rather
    /// than a check that ran and failed
    pub is_early_exit: bool,
}

/// One blame entry expanded to a single pattern
#[derive(Debug, Clone)]
pub struct PatternBlame<'a> {
    /// Loss attributed to this pattern
    pub loss: usize,
    /// Blamee's index into the sorted matcher list
    pub matcher: usize,
    /// Check-nesting depth of the blamee
    pub depth: usize,
    /// Blamee's opcode kind
    pub kind: MatcherKind,
    /// Pattern index
    pub pattern: usize,
    /// The pattern's `"src -> dst"` rendering
    pub source: &'a str,
}

/// Blame analysis of one observed shadow map
#[derive(Debug)]
pub struct MapAnalysis<'a> {
    table: &'a LookupTable,
    blamees: Vec<Blamee>,
    uncovered: usize,
}

enum Flow {
    Continue,
    /// The current position cannot fall through; everything after it inside
    /// the parent is unreachable. Carries the pattern predicate to blame
    /// when a predicate check caused it.
    Fail(Option<usize>),
}

struct Visit {
    flow: Flow,
    matched: bool,
}

impl<'a> MatcherTree<'a> {
    /// Build a tree view with the default fallible-check repertoire
    #[must_use]
    pub fn new(table: &'a LookupTable) -> Self {
        Self {
            table,
            fallible_checks: AFFECTS_EARLY_MATCH.to_vec(),
        }
    }

    /// Build a tree view with a replacement fallible-check list, for
    /// backends whose check repertoire has drifted from
    /// [`AFFECTS_EARLY_MATCH`]
    #[must_use]
    pub fn with_fallible_checks(table: &'a LookupTable, kinds: Vec<MatcherKind>) -> Self {
        Self {
            table,
            fallible_checks: kinds,
        }
    }

    fn is_fallible(&self, kind: MatcherKind) -> bool {
        self.fallible_checks.contains(&kind)
    }

    /// Compute the coverage upper bound under the current predicate
    /// assignment: a shadow map marking every byte no execution can reach,
    /// with losses attributed to the pattern predicates that cut them off.
    #[must_use]
    pub fn upper_bound(&self) -> UpperBound {
        let mut shadow = vec![false; self.table.matcher_table_size];
        let mut losses = HashMap::new();
        let mut i = 0;
        while i < self.table.matchers.len() {
            let _ = self.visit_upper(&mut i, &mut shadow, &mut losses);
        }
        let covered = shadow.iter().filter(|&&bit| !bit).count();
        UpperBound {
            covered,
            shadow_map: shadow,
            losses,
        }
    }

    fn visit_upper(
        &self,
        i: &mut usize,
        shadow: &mut [bool],
        losses: &mut HashMap<usize, usize>,
    ) -> Visit {
        let matchers = &self.table.matchers;
        let this = *i;

        if matchers[this].kind.is_leaf() {
            *i += 1;
            return match matchers[this].kind {
                MatcherKind::CompleteMatch | MatcherKind::MorphNodeTo => {
                    self.warn_unsatisfied_named(&matchers[this]);
                    Visit {
                        flow: Flow::Continue,
                        matched: true,
                    }
                }
                MatcherKind::CheckPatternPredicate => {
                    let failed = matchers[this]
                        .pattern_predicate_index()
                        .is_some_and(|idx| !self.table.predicates.pattern_satisfied(idx));
                    Visit {
                        flow: if failed {
                            Flow::Fail(matchers[this].pattern_predicate_index())
                        } else {
                            Flow::Continue
                        },
                        matched: false,
                    }
                }
                _ => Visit {
                    flow: Flow::Continue,
                    matched: false,
                },
            };
        }

        let parent = this;
        *i += 1;
        let mut matched = false;
        let mut has_fallible = false;
        while *i < matchers.len() && matchers[*i].begin <= matchers[parent].end {
            if self.is_fallible(matchers[*i].kind) {
                has_fallible = true;
            }
            let child = self.visit_upper(i, shadow, losses);
            matched |= child.matched;
            if let Flow::Fail(pat_pred) = child.flow {
                // The check ran and failed; everything from the next matcher
                // through the parent's end can never execute
                if *i < matchers.len() && matchers[*i].begin <= matchers[parent].end {
                    let begin = matchers[*i].begin;
                    let end = matchers[parent].end;
                    mark_uncovered(shadow, begin, end);
                    if let Some(idx) = pat_pred {
                        *losses.entry(idx).or_insert(0) += end - begin + 1;
                    }
                }
                skip_subtree(matchers, i, parent);
                return Visit {
                    flow: Flow::Continue,
                    matched,
                };
            }
        }

        // A subscope with no input-dependent check among its children
        // succeeds whenever entered; once it also holds a pattern match,
        // the enclosing scope never tries the remaining alternatives
        if matchers[parent].kind == MatcherKind::Subscope && matched && !has_fallible {
            return Visit {
                flow: Flow::Fail(None),
                matched,
            };
        }
        Visit {
            flow: Flow::Continue,
            matched,
        }
    }

    /// Sanity check: a pattern leaf should only be reachable once its named
    /// predicates hold, because the gating pattern predicate is their
    /// conjunction. Meaningless when the caller pinned pattern predicates
    /// explicitly.
    fn warn_unsatisfied_named(&self, matcher: &Matcher) {
        let keeper = &self.table.predicates;
        if keeper.customized_pattern_predicates() || keeper.verbosity() == 0 {
            return;
        }
        let Some(pattern_idx) = matcher.pattern_index() else {
            return;
        };
        let Some(pattern) = self.table.patterns.get(pattern_idx) else {
            return;
        };
        for &named in &pattern.named_predicates {
            if keeper.named_satisfied(named) != Some(true) {
                eprintln!(
                    "WARNING: Pattern {pattern_idx} reached with unsatisfied named predicate {named}."
                );
            }
        }
    }

    /// Localize the blame for every uncovered region of an observed shadow
    /// map. The map must have one bit per table byte.
    #[must_use]
    pub fn analyze(&self, shadow_map: &[bool]) -> MapAnalysis<'a> {
        let matchers = &self.table.matchers;
        let uncovered = shadow_map.iter().filter(|&&bit| bit).count();
        let mut blamees = Vec::new();

        if matchers.is_empty() {
            return MapAnalysis {
                table: self.table,
                blamees,
                uncovered,
            };
        }

        if !shadow_map.is_empty() && uncovered == shadow_map.len() {
            // Nothing ran at all; no localization is possible, so the whole
            // table is one blamee naming every pattern
            blamees.push(Blamee {
                matcher: 0,
                loss: shadow_map.len(),
                blamers: (0..self.table.patterns.len()).collect(),
                depth: 0,
                is_early_exit: false,
            });
            return MapAnalysis {
                table: self.table,
                blamees,
                uncovered,
            };
        }

        let mut i = 0;
        while i < matchers.len() {
            let root = i;
            if bit(shadow_map, matchers[root].begin) {
                let blamers = self.collect_patterns(root, matchers[root].end);
                blamees.push(Blamee {
                    matcher: root,
                    loss: matchers[root].size(),
                    blamers,
                    depth: 0,
                    is_early_exit: true,
                });
                skip_subtree(matchers, &mut i, root);
            } else if matchers[root].kind.is_leaf() {
                i += 1;
            } else {
                self.visit_blame(&mut i, 0, shadow_map, &mut blamees);
            }
        }
        MapAnalysis {
            table: self.table,
            blamees,
            uncovered,
        }
    }

    fn visit_blame(
        &self,
        i: &mut usize,
        depth: usize,
        shadow_map: &[bool],
        out: &mut Vec<Blamee>,
    ) {
        let matchers = &self.table.matchers;
        let parent = *i;
        let child_depth = depth + usize::from(matchers[parent].kind.adds_depth());
        *i += 1;
        let mut prev_sibling: Option<usize> = None;

        while *i < matchers.len() && matchers[*i].begin <= matchers[parent].end {
            let child = *i;
            if bit(shadow_map, matchers[child].begin) {
                if matchers[child].kind.is_group() {
                    // An alternative that was never entered is its own
                    // blamee; its siblings may still be covered
                    let blamers = self.collect_patterns(child, matchers[child].end);
                    out.push(Blamee {
                        matcher: child,
                        loss: matchers[child].size(),
                        blamers,
                        depth: child_depth,
                        is_early_exit: true,
                    });
                    skip_subtree(matchers, i, child);
                    prev_sibling = Some(child);
                } else {
                    // Sequential flow died here, so the previous sibling is
                    // the check that ran and failed
                    let blamee = prev_sibling.unwrap_or(parent);
                    let loss = matchers[parent].end - matchers[child].begin + 1;
                    let blamers = self.collect_patterns(child, matchers[parent].end);
                    out.push(Blamee {
                        matcher: blamee,
                        loss,
                        blamers,
                        depth: child_depth,
                        is_early_exit: false,
                    });
                    skip_subtree(matchers, i, parent);
                    return;
                }
            } else {
                if matchers[child].kind.is_leaf() {
                    *i += 1;
                } else {
                    self.visit_blame(i, child_depth, shadow_map, out);
                }
                prev_sibling = Some(child);
            }
        }

        // All children ran, yet the parent's terminator byte was skipped: a
        // successful early match jumped straight out. One byte of loss,
        // attributed to the parent.
        if bit(shadow_map, matchers[parent].end) {
            out.push(Blamee {
                matcher: parent,
                loss: 1,
                blamers: BTreeSet::new(),
                depth: child_depth,
                is_early_exit: false,
            });
        }
    }

    /// Pattern indices of every pattern-resolving matcher in the subtree
    /// region starting at `from` and bounded by `end_limit`
    fn collect_patterns(&self, from: usize, end_limit: usize) -> BTreeSet<usize> {
        let matchers = &self.table.matchers;
        let mut patterns = BTreeSet::new();
        let mut j = from;
        while j < matchers.len() && matchers[j].begin <= end_limit {
            if let Some(idx) = matchers[j].pattern_index() {
                patterns.insert(idx);
            }
            j += 1;
        }
        patterns
    }
}

fn bit(shadow_map: &[bool], index: usize) -> bool {
    shadow_map.get(index).copied().unwrap_or(false)
}

fn mark_uncovered(shadow: &mut [bool], begin: usize, end: usize) {
    if shadow.is_empty() {
        return;
    }
    let hi = end.min(shadow.len() - 1);
    for bit in shadow.iter_mut().take(hi + 1).skip(begin) {
        *bit = true;
    }
}

/// Advance `i` past every matcher nested in `parent`'s interval
fn skip_subtree(matchers: &[Matcher], i: &mut usize, parent: usize) {
    if *i <= parent {
        *i = parent + 1;
    }
    while *i < matchers.len() && matchers[*i].begin <= matchers[parent].end {
        *i += 1;
    }
}

impl<'a> MapAnalysis<'a> {
    /// The individual blame entries, in traversal order
    #[must_use]
    pub fn blamees(&self) -> &[Blamee] {
        &self.blamees
    }

    /// Uncovered bytes in the analyzed map
    #[must_use]
    pub const fn uncovered(&self) -> usize {
        self.uncovered
    }

    /// Sum of all attributed losses
    #[must_use]
    pub fn total_loss(&self) -> usize {
        self.blamees.iter().map(|b| b.loss).sum()
    }

    /// Loss grouped by the blamee's opcode kind, heaviest first
    #[must_use]
    pub fn blame_matcher_kinds(&self) -> Vec<(MatcherKind, usize)> {
        let mut by_kind: BTreeMap<MatcherKind, usize> = BTreeMap::new();
        for blamee in &self.blamees {
            let kind = self.table.matchers[blamee.matcher].kind;
            *by_kind.entry(kind).or_insert(0) += blamee.loss;
        }
        let mut result: Vec<(MatcherKind, usize)> = by_kind.into_iter().collect();
        result.sort_by(|a, b| b.1.cmp(&a.1));
        result
    }

    /// Loss grouped by pattern-predicate index, heaviest first. Only blame
    /// entries whose blamee is a `CheckPatternPredicate` contribute.
    #[must_use]
    pub fn blame_pattern_predicates(&self) -> Vec<(usize, usize)> {
        let mut by_pred: BTreeMap<usize, usize> = BTreeMap::new();
        for blamee in &self.blamees {
            let matcher = &self.table.matchers[blamee.matcher];
            if let Some(idx) = matcher.pattern_predicate_index() {
                *by_pred.entry(idx).or_insert(0) += blamee.loss;
            }
        }
        let mut result: Vec<(usize, usize)> = by_pred.into_iter().collect();
        result.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        result
    }

    /// Loss grouped by check-nesting depth, shallowest first, optionally
    /// restricted to one blamee kind
    #[must_use]
    pub fn blame_depths(&self, kind: Option<MatcherKind>) -> Vec<(usize, usize)> {
        let mut by_depth: BTreeMap<usize, usize> = BTreeMap::new();
        for blamee in &self.blamees {
            if let Some(wanted) = kind {
                if self.table.matchers[blamee.matcher].kind != wanted {
                    continue;
                }
            }
            *by_depth.entry(blamee.depth).or_insert(0) += blamee.loss;
        }
        by_depth.into_iter().collect()
    }

    /// Expand every blame entry across its blamers, heaviest first. With
    /// `loss_per_pattern` the entry's loss is split evenly across them.
    #[must_use]
    pub fn blame_patterns(&self, loss_per_pattern: bool) -> Vec<PatternBlame<'a>> {
        let mut result = Vec::new();
        for blamee in &self.blamees {
            if blamee.blamers.is_empty() {
                continue;
            }
            let loss = if loss_per_pattern {
                blamee.loss / blamee.blamers.len()
            } else {
                blamee.loss
            };
            for &pattern in &blamee.blamers {
                let Some(record) = self.table.patterns.get(pattern) else {
                    continue;
                };
                result.push(PatternBlame {
                    loss,
                    matcher: blamee.matcher,
                    depth: blamee.depth,
                    kind: self.table.matchers[blamee.matcher].kind,
                    pattern,
                    source: &record.pattern,
                });
            }
        }
        result.sort_by(|a, b| b.loss.cmp(&a.loss).then_with(|| a.pattern.cmp(&b.pattern)));
        result
    }

    /// Sources of the patterns the fuzzer could still reach by varying
    /// input: blamers whose blamee is not a pattern-predicate check (those
    /// are gated off by target configuration, not by input). First-seen
    /// order, deduplicated.
    #[must_use]
    pub fn blame_possible_patterns(&self) -> Vec<&'a str> {
        let mut seen: HashSet<usize> = HashSet::new();
        let mut result = Vec::new();
        for blamee in &self.blamees {
            let matcher = &self.table.matchers[blamee.matcher];
            if matcher.pattern_predicate_index().is_some() {
                continue;
            }
            for &pattern in &blamee.blamers {
                if seen.insert(pattern) {
                    if let Some(record) = self.table.patterns.get(pattern) {
                        result.push(record.pattern.as_str());
                    }
                }
            }
        }
        result
    }

    /// Distinct intrinsic ids among blamer patterns rooted in a target
    /// intrinsic call, ascending. The recognizer decides which ids belong
    /// to the target; the compiler host owning that knowledge stays outside
    /// this crate.
    #[must_use]
    pub fn blame_target_intrinsics<F>(&self, is_target_intrinsic: F) -> Vec<u64>
    where
        F: Fn(u64) -> bool,
    {
        let mut ids: BTreeSet<u64> = BTreeSet::new();
        for blamee in &self.blamees {
            for &pattern in &blamee.blamers {
                let Some(record) = self.table.patterns.get(pattern) else {
                    continue;
                };
                if let Some(id) = intrinsic_id(&record.pattern) {
                    if is_target_intrinsic(id) {
                        ids.insert(id);
                    }
                }
            }
        }
        ids.into_iter().collect()
    }
}

/// Extract the id from a pattern source shaped `(intrinsic_name <id>:…`
fn intrinsic_id(source: &str) -> Option<u64> {
    let rest = source.strip_prefix("(intrinsic_")?;
    let (_, after_name) = rest.split_once(' ')?;
    let after_name = after_name.trim_start();
    let digits: &str = after_name
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .unwrap_or("");
    if digits.is_empty() || !after_name[digits.len()..].starts_with(':') {
        return None;
    }
    digits.parse().ok()
}
