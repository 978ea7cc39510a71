//! Relation rules: which categories each relation type may connect.
//!
//! The table is built once and only read afterwards. Validation runs against
//! the labels the store reports for the two endpoints at request time; the
//! write that follows re-matches both endpoints by category so a relation
//! whose endpoints disappeared in between is never persisted.

use std::collections::BTreeMap;

use crate::error::Rejection;
use crate::types::{Category, EndpointLabels, LegendEntry, RelationRule, RelationType};

/// Immutable relation type → category contract lookup.
#[derive(Debug, Clone)]
pub struct RelationRuleEngine {
    rules: BTreeMap<RelationType, RelationRule>,
}

impl Default for RelationRuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RelationRuleEngine {
    /// The case graph rule table.
    pub fn new() -> Self {
        let rules = [
            (RelationType::KilledAt, Category::Victim, Category::CrimeScene),
            (RelationType::Witnessed, Category::Witness, Category::Suspect),
            (RelationType::WasAt, Category::Witness, Category::CrimeScene),
            (RelationType::FoundAt, Category::Evidence, Category::CrimeScene),
            (RelationType::EvidenceOf, Category::Evidence, Category::Suspect),
        ]
        .into_iter()
        .map(|(rel_type, source, target)| {
            (
                rel_type,
                RelationRule {
                    rel_type,
                    source,
                    target,
                },
            )
        })
        .collect();

        Self { rules }
    }

    /// Rule for a known relation type.
    pub fn rule(&self, rel_type: RelationType) -> Option<RelationRule> {
        self.rules.get(&rel_type).copied()
    }

    /// Look up a relation type by its stored name.
    pub fn lookup(&self, rel_type: &str) -> Result<RelationRule, Rejection> {
        rel_type
            .parse::<RelationType>()
            .ok()
            .and_then(|t| self.rule(t))
            .ok_or_else(|| Rejection::UnknownRelationType(rel_type.to_string()))
    }

    pub fn rules(&self) -> impl Iterator<Item = &RelationRule> {
        self.rules.values()
    }

    /// Check a candidate relation against the rule table.
    ///
    /// `observed` is what the endpoint lookup returned; `None` means the lookup
    /// matched nothing. Checks run in order: relation type, endpoint
    /// existence, source category, target category.
    pub fn validate(
        &self,
        rel_type: &str,
        source_id: &str,
        target_id: &str,
        observed: Option<&EndpointLabels>,
    ) -> Result<RelationRule, Rejection> {
        let rule = self.lookup(rel_type)?;

        let Some(labels) = observed else {
            return Err(Rejection::EndpointNotFound {
                source_id: source_id.to_string(),
                target_id: target_id.to_string(),
            });
        };

        if !has_label(&labels.source, rule.source) {
            return Err(Rejection::SourceCategoryMismatch {
                expected: rule.source,
                actual: labels.source.clone(),
            });
        }
        if !has_label(&labels.target, rule.target) {
            return Err(Rejection::TargetCategoryMismatch {
                expected: rule.target,
                actual: labels.target.clone(),
            });
        }

        tracing::debug!(rel_type, source_id, target_id, "Relation validated");
        Ok(rule)
    }

    /// Legend rows in rule-table order, with endpoint colours.
    pub fn legend(&self) -> Vec<LegendEntry> {
        self.rules()
            .map(|r| LegendEntry {
                rel_type: r.rel_type,
                source: r.source,
                target: r.target,
                source_color: r.source.color(),
                target_color: r.target.color(),
            })
            .collect()
    }
}

fn has_label(labels: &[String], category: Category) -> bool {
    labels.iter().any(|l| l == category.label())
}
