use crate::rules::definition::{CaptureDefinition, Grammar, Rule};
use crate::rules::error::RulesError;
use onig::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

const SELF_REFERENCE: &str = "$self";
const REPOSITORY_PREFIX: &str = "#";

/// Index of a rule in a [`CompiledGrammar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(usize);

#[derive(Debug, Clone)]
/// A compiled grammar: regexes compiled, includes resolved.
pub struct CompiledGrammar {
    /// Human-readable name.
    pub name: String,
    /// Root scope.
    pub scope_name: String,
    rules: Vec<CompiledRule>,
    /// Match and begin/end rules reachable from the top-level patterns, in priority order.
    root_candidates: Vec<RuleId>,
}

#[derive(Debug, Clone)]
/// A compiled rule.
pub enum CompiledRule {
    /// A single-line match.
    Match(CompiledMatchRule),
    /// A region spanning one or more lines.
    BeginEnd(CompiledBeginEndRule),
    /// A resolved repository reference.
    Include(RuleId),
    /// A group of rules.
    Patterns(Vec<RuleId>),
}

#[derive(Debug, Clone)]
/// A compiled `match` rule.
pub struct CompiledMatchRule {
    /// Scope of the whole match.
    pub scope: String,
    /// Compiled Oniguruma regex.
    pub regex: Arc<Regex>,
    /// Capture scopes keyed by group index.
    pub captures: HashMap<usize, String>,
}

#[derive(Debug, Clone)]
/// A compiled `begin_end` rule.
pub struct CompiledBeginEndRule {
    /// Scope of the region.
    pub scope: Option<String>,
    /// Regex opening the region.
    pub begin: Arc<Regex>,
    /// Regex closing the region.
    pub end: Arc<Regex>,
    /// Capture scopes of the begin match.
    pub begin_captures: HashMap<usize, String>,
    /// Capture scopes of the end match.
    pub end_captures: HashMap<usize, String>,
    /// Rules listed in `patterns`.
    pub patterns: Vec<RuleId>,
    /// Match and begin/end rules reachable from `patterns`, in priority order.
    candidates: Vec<RuleId>,
}

impl CompiledBeginEndRule {
    /// Match and begin/end rules tried inside the region, in priority order.
    pub fn candidates(&self) -> &[RuleId] {
        &self.candidates
    }
}

impl CompiledGrammar {
    /// Number of compiled rules, including groups and includes.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// A rule by id.
    pub fn rule(&self, id: RuleId) -> Option<&CompiledRule> {
        self.rules.get(id.0)
    }

    /// Match and begin/end rules tried outside any region, in priority order.
    pub fn root_candidates(&self) -> &[RuleId] {
        &self.root_candidates
    }

    /// The begin/end rule `id`, if it is one.
    pub fn begin_end(&self, id: RuleId) -> Option<&CompiledBeginEndRule> {
        match self.rule(id)? {
            CompiledRule::BeginEnd(rule) => Some(rule),
            _ => None,
        }
    }
}

impl Grammar {
    /// Compile regexes and resolve `#name` includes against the repository.
    ///
    /// `$self` and references to other grammars are rejected with
    /// [`RulesError::Unsupported`]; an include cycle that never passes through a begin/end
    /// rule is rejected as well, since it can never consume text.
    pub fn compile(&self) -> Result<CompiledGrammar, RulesError> {
        let mut compiler = Compiler {
            rules: Vec::new(),
            repository: HashMap::new(),
        };

        // Reserve a slot per repository entry first so entries can include each other.
        let mut names: Vec<&String> = self.repository.keys().collect();
        names.sort();
        for name in &names {
            let id = compiler.reserve();
            compiler.repository.insert(name.to_string(), id);
        }
        for name in names {
            let id = compiler.repository[name.as_str()];
            let compiled = compiler.compile_rule(&self.repository[name.as_str()])?;
            compiler.rules[id.0] = compiled;
        }

        let patterns = self
            .patterns
            .iter()
            .map(|rule| compiler.add(rule))
            .collect::<Result<Vec<_>, _>>()?;

        let root_candidates = compiler.flatten(&patterns)?;
        for index in 0..compiler.rules.len() {
            let CompiledRule::BeginEnd(rule) = &compiler.rules[index] else {
                continue;
            };
            let candidates = compiler.flatten(&rule.patterns)?;
            if let CompiledRule::BeginEnd(rule) = &mut compiler.rules[index] {
                rule.candidates = candidates;
            }
        }

        debug!(
            target: "synedit::rules",
            grammar = %self.name,
            rule_count = compiler.rules.len(),
            "compiled grammar"
        );
        Ok(CompiledGrammar {
            name: self.name.clone(),
            scope_name: self.scope_name.clone(),
            rules: compiler.rules,
            root_candidates,
        })
    }
}

struct Compiler {
    rules: Vec<CompiledRule>,
    repository: HashMap<String, RuleId>,
}

impl Compiler {
    fn reserve(&mut self) -> RuleId {
        self.rules.push(CompiledRule::Patterns(Vec::new()));
        RuleId(self.rules.len() - 1)
    }

    fn add(&mut self, rule: &Rule) -> Result<RuleId, RulesError> {
        let compiled = self.compile_rule(rule)?;
        self.rules.push(compiled);
        Ok(RuleId(self.rules.len() - 1))
    }

    fn compile_rule(&mut self, rule: &Rule) -> Result<CompiledRule, RulesError> {
        match rule {
            Rule::Match {
                name,
                regex,
                captures,
            } => Ok(CompiledRule::Match(CompiledMatchRule {
                scope: name.clone(),
                regex: compile_regex(regex)?,
                captures: capture_scopes(captures, None),
            })),
            Rule::BeginEnd {
                name,
                begin,
                end,
                patterns,
                captures,
                begin_captures,
                end_captures,
            } => {
                let patterns = patterns
                    .iter()
                    .map(|rule| self.add(rule))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CompiledRule::BeginEnd(CompiledBeginEndRule {
                    scope: name.clone(),
                    begin: compile_regex(begin)?,
                    end: compile_regex(end)?,
                    begin_captures: capture_scopes(captures, Some(begin_captures)),
                    end_captures: capture_scopes(captures, Some(end_captures)),
                    patterns,
                    candidates: Vec::new(),
                }))
            }
            Rule::Include { include } => self.resolve_include(include).map(CompiledRule::Include),
            Rule::Patterns { patterns } => patterns
                .iter()
                .map(|rule| self.add(rule))
                .collect::<Result<Vec<_>, _>>()
                .map(CompiledRule::Patterns),
        }
    }

    fn resolve_include(&self, include: &str) -> Result<RuleId, RulesError> {
        if include == SELF_REFERENCE {
            return Err(RulesError::Unsupported("including the grammar itself ($self)"));
        }
        let Some(name) = include.strip_prefix(REPOSITORY_PREFIX) else {
            return Err(RulesError::Unsupported("including another grammar"));
        };
        self.repository
            .get(name)
            .copied()
            .ok_or_else(|| RulesError::UnknownRule(name.to_string()))
    }

    /// Expand includes and groups into the match and begin/end rules they stand for.
    fn flatten(&self, patterns: &[RuleId]) -> Result<Vec<RuleId>, RulesError> {
        let mut out = Vec::new();
        let mut visiting = HashSet::new();
        for id in patterns {
            self.flatten_into(*id, &mut out, &mut visiting)?;
        }
        Ok(out)
    }

    fn flatten_into(
        &self,
        id: RuleId,
        out: &mut Vec<RuleId>,
        visiting: &mut HashSet<RuleId>,
    ) -> Result<(), RulesError> {
        match &self.rules[id.0] {
            CompiledRule::Match(_) | CompiledRule::BeginEnd(_) => {
                out.push(id);
                Ok(())
            }
            CompiledRule::Include(target) => {
                if !visiting.insert(id) {
                    return Err(RulesError::Unsupported(
                        "include cycle detected while expanding rules",
                    ));
                }
                self.flatten_into(*target, out, visiting)?;
                visiting.remove(&id);
                Ok(())
            }
            CompiledRule::Patterns(children) => {
                if !visiting.insert(id) {
                    return Err(RulesError::Unsupported(
                        "include cycle detected while expanding rules",
                    ));
                }
                for child in children {
                    self.flatten_into(*child, out, visiting)?;
                }
                visiting.remove(&id);
                Ok(())
            }
        }
    }
}

fn compile_regex(source: &str) -> Result<Arc<Regex>, RulesError> {
    Regex::new(source)
        .map(Arc::new)
        .map_err(|e| RulesError::RegexCompile {
            pattern: source.to_string(),
            message: e.to_string(),
        })
}

fn capture_scopes(
    shared: &HashMap<usize, CaptureDefinition>,
    specific: Option<&HashMap<usize, CaptureDefinition>>,
) -> HashMap<usize, String> {
    let mut scopes: HashMap<usize, String> = shared
        .iter()
        .map(|(group, capture)| (*group, capture.name.clone()))
        .collect();
    if let Some(specific) = specific {
        scopes.extend(
            specific
                .iter()
                .map(|(group, capture)| (*group, capture.name.clone())),
        );
    }
    scopes
}
