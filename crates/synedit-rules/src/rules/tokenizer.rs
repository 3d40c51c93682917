use crate::rules::compiler::{CompiledBeginEndRule, CompiledGrammar, CompiledRule, RuleId};
use crate::rules::error::RulesError;
use onig::{Regex, Region, SearchOptions};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;
use synedit_core::TextRange;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq)]
/// A scoped span of one line.
pub struct Token {
    /// Scope name, e.g. `string.quoted.double`.
    pub scope: String,
    /// Range within the line, in UTF-16 code units.
    pub range: TextRange,
    /// The scoped text.
    pub contents: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Begin/end regions still open at the end of a line, innermost last.
///
/// Pass the stack returned for one line to the next line.
pub struct RuleStack {
    frames: Vec<RuleId>,
}

impl RuleStack {
    /// An empty stack: tokenizing starts outside any region.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open regions.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether no region is open.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Rules of the open regions, outermost first.
    pub fn rules(&self) -> &[RuleId] {
        &self.frames
    }
}

/// Splits lines into scoped tokens using a [`CompiledGrammar`].
#[derive(Debug, Clone)]
pub struct Tokenizer {
    grammar: Arc<CompiledGrammar>,
}

impl Tokenizer {
    /// Create a tokenizer for `grammar`.
    pub fn new(grammar: Arc<CompiledGrammar>) -> Self {
        Self { grammar }
    }

    /// The grammar.
    pub fn grammar(&self) -> &Arc<CompiledGrammar> {
        &self.grammar
    }

    /// Tokenize every line of `text`. Lines are split at LF, CRLF and CR.
    pub fn tokenize(&self, text: &str) -> Result<Vec<Vec<Token>>, RulesError> {
        let mut stack = RuleStack::new();
        split_lines(text)
            .map(|line| self.tokenize_line(line, &mut stack))
            .collect()
    }

    /// Tokenize one line, without its delimiter.
    ///
    /// At each position the rule whose regex matches earliest wins; ties go to the rule listed
    /// first. Inside a begin/end region the region's `end` regex competes with its patterns and
    /// wins ties. `stack` holds the regions open before the line and is updated to those open
    /// after it.
    ///
    /// Tokens are ordered by start, longer tokens first, so applying them in order lets nested
    /// scopes override their enclosing region.
    pub fn tokenize_line(
        &self,
        line: &str,
        stack: &mut RuleStack,
    ) -> Result<Vec<Token>, RulesError> {
        let mut line_tokens = LineTokens::new(line);
        // Where each open region starts on this line; regions carried over start at 0.
        let mut region_starts = vec![0usize; stack.frames.len()];
        let mut pos = 0usize;

        let mut iterations = 0usize;
        let max_iterations = (line.len() + 1).saturating_mul(32).max(128);

        while pos <= line.len() {
            iterations += 1;
            if iterations > max_iterations {
                return Err(RulesError::Unsupported(
                    "tokenizing exceeded iteration limit (possible zero-width loop)",
                ));
            }

            let top = match stack.frames.last() {
                Some(id) => Some((*id, self.begin_end(*id)?)),
                None => None,
            };
            let candidates = match top {
                Some((_, rule)) => rule.candidates(),
                None => self.grammar.root_candidates(),
            };
            let end_match = top.and_then(|(_, rule)| search(&rule.end, line, pos));
            let found = self.earliest_match(candidates, line, pos)?;

            let end_wins = match (&end_match, &found) {
                (Some(end), Some((_, region))) => start_of(end) <= start_of(region),
                (Some(_), None) => true,
                (None, _) => false,
            };

            if end_wins {
                let (Some(end), Some((id, rule))) = (end_match, top) else {
                    break;
                };
                let (_, end_byte) = end.pos(0).unwrap_or((pos, pos));
                stack.frames.pop();
                let region_start = region_starts.pop().unwrap_or(0);
                if let Some(scope) = &rule.scope {
                    line_tokens.push_region(scope, region_start, end_byte);
                }
                line_tokens.push_captures(&end, &rule.end_captures);
                trace!(target: "synedit::rules", rule = ?id, end = end_byte, "closed region");
                pos = end_byte;
                continue;
            }

            let Some((id, region)) = found else {
                break;
            };
            let (start, end) = region.pos(0).unwrap_or((pos, pos));
            match self.rule(id)? {
                CompiledRule::Match(rule) => {
                    line_tokens.push(&rule.scope, start, end);
                    line_tokens.push_captures(&region, &rule.captures);
                    if end == pos {
                        // Zero-width match: step over one character to make progress.
                        match line[pos..].chars().next() {
                            Some(ch) => pos += ch.len_utf8(),
                            None => break,
                        }
                    } else {
                        pos = end;
                    }
                }
                CompiledRule::BeginEnd(rule) => {
                    line_tokens.push_captures(&region, &rule.begin_captures);
                    stack.frames.push(id);
                    region_starts.push(start);
                    trace!(target: "synedit::rules", rule = ?id, start, "opened region");
                    pos = end;
                }
                CompiledRule::Include(_) | CompiledRule::Patterns(_) => {
                    return Err(RulesError::Unsupported("unexpanded rule group"));
                }
            }
        }

        for (id, region_start) in stack.frames.iter().zip(region_starts) {
            if let Some(scope) = &self.begin_end(*id)?.scope {
                line_tokens.push_region(scope, region_start, line.len());
            }
        }
        Ok(line_tokens.finish())
    }

    fn rule(&self, id: RuleId) -> Result<&CompiledRule, RulesError> {
        self.grammar
            .rule(id)
            .ok_or(RulesError::Unsupported("rule id from another grammar"))
    }

    fn begin_end(&self, id: RuleId) -> Result<&CompiledBeginEndRule, RulesError> {
        self.grammar
            .begin_end(id)
            .ok_or(RulesError::Unsupported("rule stack holds a non begin/end rule"))
    }

    fn earliest_match(
        &self,
        candidates: &[RuleId],
        line: &str,
        from: usize,
    ) -> Result<Option<(RuleId, Region)>, RulesError> {
        let mut best: Option<(RuleId, Region)> = None;
        for id in candidates {
            let regex = match self.rule(*id)? {
                CompiledRule::Match(rule) => &rule.regex,
                CompiledRule::BeginEnd(rule) => &rule.begin,
                CompiledRule::Include(_) | CompiledRule::Patterns(_) => continue,
            };
            let Some(region) = search(regex, line, from) else {
                continue;
            };
            let is_earlier = match &best {
                Some((_, current)) => start_of(&region) < start_of(current),
                None => true,
            };
            if is_earlier {
                best = Some((*id, region));
            }
        }
        Ok(best)
    }
}

/// Tokens of one line. Each entry is flagged with whether it is a region scope, so a region
/// sorts before a capture covering the same range.
struct LineTokens<'a> {
    line: &'a str,
    tokens: Vec<(bool, Token)>,
}

impl<'a> LineTokens<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            line,
            tokens: Vec::new(),
        }
    }

    fn push(&mut self, scope: &str, start: usize, end: usize) {
        self.push_entry(false, scope, start, end);
    }

    fn push_region(&mut self, scope: &str, start: usize, end: usize) {
        self.push_entry(true, scope, start, end);
    }

    fn push_entry(&mut self, is_region: bool, scope: &str, start: usize, end: usize) {
        if start >= end {
            return;
        }
        let location = self.line[..start].encode_utf16().count();
        let contents = &self.line[start..end];
        self.tokens.push((
            is_region,
            Token {
                scope: scope.to_string(),
                range: TextRange::new(location, contents.encode_utf16().count()),
                contents: contents.to_string(),
            },
        ));
    }

    fn push_captures(&mut self, region: &Region, captures: &HashMap<usize, String>) {
        let mut groups: Vec<(&usize, &String)> = captures.iter().collect();
        groups.sort();
        for (group, scope) in groups {
            if let Some((start, end)) = region.pos(*group) {
                self.push(scope, start, end);
            }
        }
    }

    fn finish(mut self) -> Vec<Token> {
        self.tokens.sort_by_key(|(is_region, token)| {
            (token.range.location, Reverse(token.range.length), !*is_region)
        });
        self.tokens.into_iter().map(|(_, token)| token).collect()
    }
}

fn search(regex: &Regex, text: &str, from: usize) -> Option<Region> {
    let mut region = Region::new();
    regex.search_with_options(
        text,
        from,
        text.len(),
        SearchOptions::SEARCH_OPTION_NONE,
        Some(&mut region),
    )?;
    Some(region)
}

fn start_of(region: &Region) -> usize {
    region.pos(0).map_or(usize::MAX, |(start, _)| start)
}

fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = Some(text);
    std::iter::from_fn(move || {
        let current = rest?;
        match current.find(['\n', '\r']) {
            Some(index) => {
                let delimiter = if current[index..].starts_with("\r\n") { 2 } else { 1 };
                rest = Some(&current[index + delimiter..]);
                Some(&current[..index])
            }
            None => {
                rest = None;
                Some(current)
            }
        }
    })
}
