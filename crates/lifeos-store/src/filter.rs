//! Typed filter predicates and query ordering.
//!
//! One predicate model serves both backends: the REST backend renders it to
//! PostgREST query parameters, the in-memory backend evaluates it against
//! records directly. Keeping a single source of truth is what lets engine
//! tests run against the in-memory backend and mean something for the wire.

use std::cmp::Ordering as CmpOrdering;

use chrono::NaiveDate;
use lifeos_core::{Goal, GoalId, GoalKind};

/// A filterable/orderable column of the goals table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    /// Record id.
    Id,
    /// Display label.
    Text,
    /// Completion flag.
    Done,
    /// Scheduled date.
    TargetDate,
    /// Grouping label.
    Category,
    /// Priority / sort key.
    Priority,
    /// Record discriminator (stored column name `type`).
    Kind,
    /// Owning project link.
    ParentId,
}

impl Field {
    /// Stored column name.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Text => "text",
            Self::Done => "done",
            Self::TargetDate => "target_date",
            Self::Category => "category",
            Self::Priority => "priority",
            Self::Kind => "type",
            Self::ParentId => "parent_id",
        }
    }

    /// Extract this field's value from a record. `None` means SQL null.
    #[must_use]
    pub fn value_of(self, goal: &Goal) -> Option<FieldValue> {
        match self {
            Self::Id => Some(FieldValue::Int(goal.id.get())),
            Self::Text => Some(FieldValue::Text(goal.text.clone())),
            Self::Done => Some(FieldValue::Bool(goal.done)),
            Self::TargetDate => goal.target_date.map(FieldValue::Date),
            Self::Category => Some(FieldValue::Text(goal.category.clone())),
            Self::Priority => Some(FieldValue::Int(i64::from(goal.priority))),
            Self::Kind => Some(FieldValue::Text(goal.kind.as_str().to_string())),
            Self::ParentId => goal.parent_id.map(|id| FieldValue::Int(id.get())),
        }
    }
}

/// A typed filter operand.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// Integer operand (ids, priorities).
    Int(i64),
    /// Boolean operand.
    Bool(bool),
    /// Calendar date operand.
    Date(NaiveDate),
    /// String operand.
    Text(String),
}

impl FieldValue {
    /// Wire rendering (PostgREST operand form).
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Int(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Text(s) => s.clone(),
        }
    }

    /// Ordered comparison between operands of the same shape.
    ///
    /// Mixed shapes do not occur for well-typed filters; they compare equal
    /// so a malformed filter matches nothing rather than panicking.
    #[must_use]
    pub fn compare(&self, other: &Self) -> CmpOrdering {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            _ => CmpOrdering::Equal,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<GoalId> for FieldValue {
    fn from(v: GoalId) -> Self {
        Self::Int(v.get())
    }
}

impl From<GoalKind> for FieldValue {
    fn from(v: GoalKind) -> Self {
        Self::Text(v.as_str().to_string())
    }
}

/// A composable predicate over goal records.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    /// `field = value`
    Eq(Field, FieldValue),
    /// `field < value`
    Lt(Field, FieldValue),
    /// `field > value`
    Gt(Field, FieldValue),
    /// `field <= value`
    Lte(Field, FieldValue),
    /// `field >= value`
    Gte(Field, FieldValue),
    /// Case-insensitive match; `%` is a wildcard, a bare pattern is a
    /// case-insensitive exact match.
    ILike(Field, String),
    /// `field IS NULL`
    IsNull(Field),
    /// All sub-predicates hold.
    And(Vec<Filter>),
    /// At least one sub-predicate holds.
    Or(Vec<Filter>),
}

impl Filter {
    /// `field = value`
    pub fn eq(field: Field, value: impl Into<FieldValue>) -> Self {
        Self::Eq(field, value.into())
    }

    /// `field < value`
    pub fn lt(field: Field, value: impl Into<FieldValue>) -> Self {
        Self::Lt(field, value.into())
    }

    /// `field > value`
    pub fn gt(field: Field, value: impl Into<FieldValue>) -> Self {
        Self::Gt(field, value.into())
    }

    /// `field <= value`
    pub fn lte(field: Field, value: impl Into<FieldValue>) -> Self {
        Self::Lte(field, value.into())
    }

    /// `field >= value`
    pub fn gte(field: Field, value: impl Into<FieldValue>) -> Self {
        Self::Gte(field, value.into())
    }

    /// Case-insensitive match on `field`.
    pub fn ilike(field: Field, pattern: impl Into<String>) -> Self {
        Self::ILike(field, pattern.into())
    }

    /// `field IS NULL`
    #[must_use]
    pub fn is_null(field: Field) -> Self {
        Self::IsNull(field)
    }

    /// Conjunction of sub-predicates.
    #[must_use]
    pub fn and(filters: Vec<Filter>) -> Self {
        Self::And(filters)
    }

    /// Disjunction of sub-predicates.
    #[must_use]
    pub fn or(filters: Vec<Filter>) -> Self {
        Self::Or(filters)
    }

    /// Evaluate the predicate against a record.
    #[must_use]
    pub fn matches(&self, goal: &Goal) -> bool {
        match self {
            Self::Eq(field, value) => field.value_of(goal).is_some_and(|v| v == *value),
            Self::Lt(field, value) => {
                field.value_of(goal).is_some_and(|v| v.compare(value) == CmpOrdering::Less)
            }
            Self::Gt(field, value) => {
                field.value_of(goal).is_some_and(|v| v.compare(value) == CmpOrdering::Greater)
            }
            Self::Lte(field, value) => {
                field.value_of(goal).is_some_and(|v| v.compare(value) != CmpOrdering::Greater)
            }
            Self::Gte(field, value) => {
                field.value_of(goal).is_some_and(|v| v.compare(value) != CmpOrdering::Less)
            }
            Self::ILike(field, pattern) => field
                .value_of(goal)
                .is_some_and(|v| ilike_matches(pattern, &v.render())),
            Self::IsNull(field) => field.value_of(goal).is_none(),
            Self::And(filters) => filters.iter().all(|f| f.matches(goal)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(goal)),
        }
    }

    /// Render to top-level query parameters (PostgREST dialect).
    ///
    /// A top-level conjunction becomes one parameter per leaf; disjunctions
    /// collapse into a single `or=(…)` parameter using the nested syntax.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        match self {
            Self::And(filters) => filters.iter().flat_map(Filter::to_query_pairs).collect(),
            Self::Or(filters) => {
                let inner: Vec<String> = filters.iter().map(Filter::render_nested).collect();
                vec![("or".to_string(), format!("({})", inner.join(",")))]
            }
            leaf => {
                let (field, operand) = leaf.leaf_parts();
                vec![(field.column().to_string(), operand)]
            }
        }
    }

    /// Render in the nested (embedded) syntax used inside `or=(…)`.
    #[must_use]
    pub fn render_nested(&self) -> String {
        match self {
            Self::And(filters) => {
                let inner: Vec<String> = filters.iter().map(Filter::render_nested).collect();
                format!("and({})", inner.join(","))
            }
            Self::Or(filters) => {
                let inner: Vec<String> = filters.iter().map(Filter::render_nested).collect();
                format!("or({})", inner.join(","))
            }
            leaf => {
                let (field, operand) = leaf.leaf_parts();
                format!("{}.{operand}", field.column())
            }
        }
    }

    /// Field and `op.value` operand of a leaf predicate.
    fn leaf_parts(&self) -> (Field, String) {
        match self {
            Self::Eq(field, value) => (*field, format!("eq.{}", value.render())),
            Self::Lt(field, value) => (*field, format!("lt.{}", value.render())),
            Self::Gt(field, value) => (*field, format!("gt.{}", value.render())),
            Self::Lte(field, value) => (*field, format!("lte.{}", value.render())),
            Self::Gte(field, value) => (*field, format!("gte.{}", value.render())),
            Self::ILike(field, pattern) => (*field, format!("ilike.{pattern}")),
            Self::IsNull(field) => (*field, "is.null".to_string()),
            Self::And(_) | Self::Or(_) => unreachable!("leaf_parts called on a group"),
        }
    }
}

/// Case-insensitive `%`-wildcard match. Without wildcards this is a
/// case-insensitive equality test, which is how the duplicate-name check
/// uses it.
fn ilike_matches(pattern: &str, text: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let text = text.to_lowercase();
    if !pattern.contains('%') {
        return pattern == text;
    }

    let anchored_start = !pattern.starts_with('%');
    let anchored_end = !pattern.ends_with('%');
    let segments: Vec<&str> = pattern.split('%').filter(|s| !s.is_empty()).collect();

    let mut cursor = 0usize;
    for (i, segment) in segments.iter().enumerate() {
        let found = if i == 0 && anchored_start {
            text.starts_with(segment).then_some(0)
        } else {
            text[cursor..].find(segment).map(|pos| cursor + pos)
        };
        match found {
            Some(pos) => cursor = pos + segment.len(),
            None => return false,
        }
    }
    if anchored_end {
        if let Some(last) = segments.last() {
            return text.ends_with(last) && cursor <= text.len();
        }
    }
    true
}

/// Sort direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl Direction {
    /// Wire rendering.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// One ordering key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OrderBy {
    /// Column to order by.
    pub field: Field,
    /// Sort direction.
    pub direction: Direction,
}

/// A select query: optional predicate plus ordering keys.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    /// Row predicate; `None` selects everything.
    pub filter: Option<Filter>,
    /// Ordering keys, applied in sequence.
    pub order: Vec<OrderBy>,
}

impl Query {
    /// A query matching every row.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// A query with the given predicate.
    #[must_use]
    pub fn filtered(filter: Filter) -> Self {
        Self {
            filter: Some(filter),
            order: Vec::new(),
        }
    }

    /// Append an ascending ordering key.
    #[must_use]
    pub fn order_asc(mut self, field: Field) -> Self {
        self.order.push(OrderBy {
            field,
            direction: Direction::Asc,
        });
        self
    }

    /// Append a descending ordering key.
    #[must_use]
    pub fn order_desc(mut self, field: Field) -> Self {
        self.order.push(OrderBy {
            field,
            direction: Direction::Desc,
        });
        self
    }

    /// The standard list ordering: priority descending, then id ascending
    /// (stable tie-break by creation order).
    #[must_use]
    pub fn priority_listing(filter: Filter) -> Self {
        Self::filtered(filter)
            .order_desc(Field::Priority)
            .order_asc(Field::Id)
    }

    /// Render the ordering keys as a PostgREST `order` parameter value.
    #[must_use]
    pub fn render_order(&self) -> Option<String> {
        if self.order.is_empty() {
            return None;
        }
        let keys: Vec<String> = self
            .order
            .iter()
            .map(|o| format!("{}.{}", o.field.column(), o.direction.as_str()))
            .collect();
        Some(keys.join(","))
    }

    /// Compare two records under this query's ordering keys.
    #[must_use]
    pub fn compare(&self, a: &Goal, b: &Goal) -> CmpOrdering {
        for key in &self.order {
            let va = key.field.value_of(a);
            let vb = key.field.value_of(b);
            let ord = match (va, vb) {
                (Some(x), Some(y)) => x.compare(&y),
                // Nulls sort last regardless of direction.
                (None, Some(_)) => return CmpOrdering::Greater,
                (Some(_), None) => return CmpOrdering::Less,
                (None, None) => CmpOrdering::Equal,
            };
            let ord = match key.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            };
            if ord != CmpOrdering::Equal {
                return ord;
            }
        }
        CmpOrdering::Equal
    }
}
