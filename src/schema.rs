//! Semantic payroll fields and the label rules that locate them.
//!
//! Each [`FieldKey`] is described by a [`FieldSpec`]: candidate header labels
//! in priority order, whether the field sums several columns, and label
//! fragments that disqualify a column. Specs are compiled once into
//! [`FieldMatcher`]s, ordered lists of [`TargetRule`]s that are evaluated
//! short-circuit against normalized header cells.

use crate::options::ExtractOptions;
use crate::text::{normalize, score};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Labels of at most this many characters must match on word boundaries.
const SHORT_LABEL_CHARS: usize = 4;

/// A semantic payroll field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldKey {
    Ordinal,
    EmployeeName,
    Position,
    BaseSalary,
    SpecialBonus,
    SocialSecurityDeduction,
    IncomeTaxDeduction,
    AdvanceDeduction,
    OtherDeduction,
}

impl FieldKey {
    /// Every field, in declaration order.
    pub const ALL: [FieldKey; 9] = [
        FieldKey::Ordinal,
        FieldKey::EmployeeName,
        FieldKey::Position,
        FieldKey::BaseSalary,
        FieldKey::SpecialBonus,
        FieldKey::SocialSecurityDeduction,
        FieldKey::IncomeTaxDeduction,
        FieldKey::AdvanceDeduction,
        FieldKey::OtherDeduction,
    ];

    /// Fields that must resolve to a column for extraction to proceed.
    pub const REQUIRED: [FieldKey; 4] = [
        FieldKey::Ordinal,
        FieldKey::EmployeeName,
        FieldKey::Position,
        FieldKey::BaseSalary,
    ];

    /// The field's identifier as used in configuration and diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKey::Ordinal => "ordinal",
            FieldKey::EmployeeName => "employeeName",
            FieldKey::Position => "position",
            FieldKey::BaseSalary => "baseSalary",
            FieldKey::SpecialBonus => "specialBonus",
            FieldKey::SocialSecurityDeduction => "socialSecurityDeduction",
            FieldKey::IncomeTaxDeduction => "incomeTaxDeduction",
            FieldKey::AdvanceDeduction => "advanceDeduction",
            FieldKey::OtherDeduction => "otherDeduction",
        }
    }

    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(self)
    }

    /// Fields read as a single cell rather than a monetary amount.
    pub fn is_textual(&self) -> bool {
        matches!(
            self,
            FieldKey::Ordinal | FieldKey::EmployeeName | FieldKey::Position
        )
    }

    pub fn is_deduction(&self) -> bool {
        matches!(
            self,
            FieldKey::SocialSecurityDeduction
                | FieldKey::IncomeTaxDeduction
                | FieldKey::AdvanceDeduction
                | FieldKey::OtherDeduction
        )
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of how to find one field in a header block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub key: FieldKey,
    /// Candidate labels, most specific first
    pub targets: Vec<String>,
    /// Sum every matching column instead of taking the first
    #[serde(default)]
    pub multi_column: bool,
    /// Label fragments that disqualify a column for this field
    #[serde(default)]
    pub exclusions: Vec<String>,
}

impl FieldSpec {
    pub fn new(key: FieldKey, targets: &[&str]) -> Self {
        Self {
            key,
            targets: targets.iter().map(|t| t.to_string()).collect(),
            multi_column: false,
            exclusions: Vec::new(),
        }
    }

    pub fn multi_column(mut self) -> Self {
        self.multi_column = true;
        self
    }

    pub fn excluding(mut self, fragments: &[&str]) -> Self {
        self.exclusions = fragments.iter().map(|t| t.to_string()).collect();
        self
    }
}

/// The label table for Guatemalan payroll sheets.
pub fn default_field_specs() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new(FieldKey::Ordinal, &["no.", "no", "num", "número"]),
        FieldSpec::new(FieldKey::EmployeeName, &["nombre", "empleado"]),
        FieldSpec::new(FieldKey::Position, &["puesto", "cargo"]),
        FieldSpec::new(
            FieldKey::BaseSalary,
            &["ordinario mensual", "salario ordinario", "sueldo base", "salario base"],
        ),
        FieldSpec::new(
            FieldKey::SpecialBonus,
            &["bonificacion decreto", "bonificacion especial", "bon especial"],
        )
        .multi_column()
        .excluding(&["total"]),
        FieldSpec::new(FieldKey::SocialSecurityDeduction, &["igss"]),
        FieldSpec::new(FieldKey::IncomeTaxDeduction, &["isr"]),
        FieldSpec::new(
            FieldKey::AdvanceDeduction,
            &["anticipo 1ra quincena", "anticipo"],
        ),
        FieldSpec::new(FieldKey::OtherDeduction, &["otros descuentos", "otros"])
            .excluding(&["ingreso"]),
    ]
}

/// Keywords whose presence marks a row as part of the header block.
pub fn default_header_keywords() -> Vec<String> {
    [
        "no.",
        "nombre",
        "puesto",
        "ordinario mensual",
        "bonificacion decreto",
        "bonificacion especial",
        "igss",
        "isr",
        "anticipo",
    ]
    .iter()
    .map(|k| k.to_string())
    .collect()
}

#[derive(Debug, Clone)]
enum RuleKind {
    WordBoundary(Regex),
    Substring,
}

/// One candidate label, compiled for matching against normalized cells.
#[derive(Debug, Clone)]
pub struct TargetRule {
    label: String,
    kind: RuleKind,
}

impl TargetRule {
    /// Compile a label. Returns `None` if the label normalizes to nothing.
    pub fn new(target: &str) -> Option<Self> {
        let label = normalize(target);
        if label.is_empty() {
            return None;
        }

        let kind = if label.chars().count() <= SHORT_LABEL_CHARS {
            Regex::new(&format!(r"(?:^|\b){}(?:\b|$)", regex::escape(&label)))
                .map(RuleKind::WordBoundary)
                .unwrap_or(RuleKind::Substring)
        } else {
            RuleKind::Substring
        };

        Some(Self { label, kind })
    }

    /// The normalized label.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Match a normalized cell by containment, or on word boundaries for short labels.
    pub fn matches_literal(&self, cell: &str) -> bool {
        match &self.kind {
            RuleKind::WordBoundary(re) => re.is_match(cell),
            RuleKind::Substring => cell.contains(&self.label),
        }
    }

    /// Match a normalized cell literally, falling back to edit distance.
    pub fn matches(&self, cell: &str, threshold: f64) -> bool {
        self.matches_literal(cell) || score(cell, &self.label).is_some_and(|s| s <= threshold)
    }
}

/// A compiled [`FieldSpec`].
#[derive(Debug, Clone)]
pub struct FieldMatcher {
    pub key: FieldKey,
    pub multi_column: bool,
    rules: Vec<TargetRule>,
    exclusions: Vec<String>,
}

impl FieldMatcher {
    pub fn compile(spec: &FieldSpec) -> Self {
        Self {
            key: spec.key,
            multi_column: spec.multi_column,
            rules: spec.targets.iter().filter_map(|t| TargetRule::new(t)).collect(),
            exclusions: spec
                .exclusions
                .iter()
                .map(|e| normalize(e))
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    /// Target rules in priority order.
    pub fn rules(&self) -> &[TargetRule] {
        &self.rules
    }

    /// Whether a normalized cell carries one of the exclusion fragments.
    pub fn is_excluded(&self, cell: &str) -> bool {
        self.exclusions.iter().any(|e| cell.contains(e.as_str()))
    }

    /// Whether a normalized cell matches any target and no exclusion.
    pub fn matches(&self, cell: &str, threshold: f64) -> bool {
        !self.is_excluded(cell) && self.rules.iter().any(|r| r.matches(cell, threshold))
    }

    /// Like [`matches`](Self::matches) without the edit-distance fallback.
    pub fn matches_literal(&self, cell: &str) -> bool {
        !self.is_excluded(cell) && self.rules.iter().any(|r| r.matches_literal(cell))
    }
}

/// Field matchers and header keywords compiled from [`ExtractOptions`].
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldMatcher>,
    keywords: Vec<TargetRule>,
}

impl Schema {
    pub fn compile(options: &ExtractOptions) -> Self {
        let mut fields: Vec<FieldMatcher> = options.fields.iter().map(FieldMatcher::compile).collect();
        fields.sort_by_key(|f| f.key);

        Self {
            fields,
            keywords: options
                .header_keywords
                .iter()
                .filter_map(|k| TargetRule::new(k))
                .collect(),
        }
    }

    /// Matchers ordered by [`FieldKey`].
    pub fn fields(&self) -> &[FieldMatcher] {
        &self.fields
    }

    pub fn field(&self, key: FieldKey) -> Option<&FieldMatcher> {
        self.fields.iter().find(|f| f.key == key)
    }

    pub fn keywords(&self) -> &[TargetRule] {
        &self.keywords
    }
}
