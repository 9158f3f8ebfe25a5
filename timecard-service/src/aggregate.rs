//! Hierarchical aggregation
//!
//! Folds computed records into a year → week → employee → date tree, or
//! partitions them flat by benefit category. Nodes refer to records by their
//! index in the input slice.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

use crate::models::ComputedRecord;
use crate::week::{iso_week_number, WeekRange};

/// Category used for records without a benefit code
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Key of a node at some level of the tree
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum NodeKey {
    Year(i32),
    Week { year: i32, week: u32 },
    Employee(String),
    Date(NaiveDate),
}

/// One node of the aggregate tree
#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregateNode {
    pub id: String,
    pub label: String,
    pub total_hours: f64,
    pub total_pay: f64,
    /// Indices of every record classified under this node
    pub records: Vec<usize>,
    /// Serialized as a list in key order; JSON keys must be strings
    #[serde(serialize_with = "children_in_order")]
    pub children: BTreeMap<NodeKey, AggregateNode>,
}

fn children_in_order<S>(
    children: &BTreeMap<NodeKey, AggregateNode>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_seq(children.values())
}

impl AggregateNode {
    fn new(id: String, label: String) -> Self {
        Self {
            id,
            label,
            ..Self::default()
        }
    }

    fn child(
        &mut self,
        key: NodeKey,
        id: impl FnOnce() -> String,
        label: impl FnOnce() -> String,
    ) -> &mut AggregateNode {
        self.children
            .entry(key)
            .or_insert_with(|| AggregateNode::new(id(), label()))
    }

    /// Recompute totals bottom-up so each node equals the sum of its children.
    ///
    /// Leaf totals are summed in a canonical record order, which keeps the
    /// result independent of input order.
    fn finalize(&mut self, records: &[ComputedRecord]) {
        self.records.sort_by(|a, b| canonical_order(records, *a, *b));

        if self.children.is_empty() {
            self.total_hours = self.records.iter().map(|i| records[*i].hours).sum();
            self.total_pay = self.records.iter().map(|i| records[*i].total_pay()).sum();
            return;
        }

        let mut hours = 0.0;
        let mut pay = 0.0;
        for child in self.children.values_mut() {
            child.finalize(records);
            hours += child.total_hours;
            pay += child.total_pay;
        }
        self.total_hours = hours;
        self.total_pay = pay;
    }

    /// Number of records reachable from this node's leaves
    pub fn leaf_count(&self) -> usize {
        if self.children.is_empty() {
            self.records.len()
        } else {
            self.children.values().map(|c| c.leaf_count()).sum()
        }
    }

    pub fn child_node(&self, key: &NodeKey) -> Option<&AggregateNode> {
        self.children.get(key)
    }
}

fn canonical_order(records: &[ComputedRecord], a: usize, b: usize) -> std::cmp::Ordering {
    let (ra, rb) = (&records[a], &records[b]);
    ra.clock_in
        .cmp(&rb.clock_in)
        .then_with(|| ra.employee().cmp(rb.employee()))
        .then_with(|| ra.schedule_id.cmp(&rb.schedule_id))
        .then_with(|| ra.entry.id.cmp(&rb.entry.id))
        .then_with(|| ra.hours.total_cmp(&rb.hours))
        .then_with(|| a.cmp(&b))
}

/// Aggregate tree rooted at "all"
#[derive(Debug, Clone, Serialize)]
pub struct AggregateTree {
    pub root: AggregateNode,
    /// Records left out because no grouping instant could be formed
    pub excluded: Vec<usize>,
}

impl AggregateTree {
    pub fn total_hours(&self) -> f64 {
        self.root.total_hours
    }

    pub fn leaf_count(&self) -> usize {
        self.root.leaf_count()
    }

    pub fn year(&self, year: i32) -> Option<&AggregateNode> {
        self.root.child_node(&NodeKey::Year(year))
    }

    pub fn week(&self, year: i32, week: u32) -> Option<&AggregateNode> {
        self.year(year)?.child_node(&NodeKey::Week { year, week })
    }

    pub fn employee(&self, year: i32, week: u32, employee: &str) -> Option<&AggregateNode> {
        self.week(year, week)?
            .child_node(&NodeKey::Employee(employee.to_string()))
    }

    pub fn date(
        &self,
        year: i32,
        week: u32,
        employee: &str,
        date: NaiveDate,
    ) -> Option<&AggregateNode> {
        self.employee(year, week, employee)?
            .child_node(&NodeKey::Date(date))
    }
}

/// Build the year → week → employee → date tree.
///
/// `employee_labels` only affects display labels. Records without a
/// clock-in or an employee are listed in [`AggregateTree::excluded`] and
/// contribute nothing.
pub fn aggregate(
    records: &[ComputedRecord],
    employee_labels: &HashMap<String, String>,
) -> AggregateTree {
    let mut root = AggregateNode::new("all".to_string(), "All".to_string());
    let mut excluded = Vec::new();

    for (idx, record) in records.iter().enumerate() {
        let Some(clock_in) = record.grouping_instant() else {
            tracing::debug!(
                schedule_id = %record.schedule_id,
                employee = %record.employee(),
                "Excluding record without clock-in or employee from aggregation"
            );
            excluded.push(idx);
            continue;
        };

        let date = clock_in.date_naive();
        let year = date.year();
        let week = iso_week_number(date);
        let employee = record.employee();

        root.records.push(idx);

        let year_node = root.child(NodeKey::Year(year), || year.to_string(), || year.to_string());
        year_node.records.push(idx);

        let week_node = year_node.child(
            NodeKey::Week { year, week },
            || format!("{}-W{:02}", year, week),
            || format!("Week {} ({})", week, WeekRange::for_date(date).label()),
        );
        week_node.records.push(idx);

        let employee_node = week_node.child(
            NodeKey::Employee(employee.to_string()),
            || format!("{}-W{:02}-{}", year, week, employee),
            || employee_label(employee_labels, employee),
        );
        employee_node.records.push(idx);

        let date_node = employee_node.child(
            NodeKey::Date(date),
            || format!("{}-W{:02}-{}-{}", year, week, employee, date),
            || date.format("%Y-%m-%d").to_string(),
        );
        date_node.records.push(idx);
    }

    root.finalize(records);

    AggregateTree { root, excluded }
}

/// Display label for an employee, falling back to the identifier.
pub fn employee_label(labels: &HashMap<String, String>, employee: &str) -> String {
    labels
        .get(employee)
        .cloned()
        .unwrap_or_else(|| employee.to_string())
}

/// Records sharing one benefit category
#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryGroup {
    pub category: String,
    pub total_hours: f64,
    pub total_pay: f64,
    pub records: Vec<usize>,
}

/// Partition records by benefit category.
///
/// Excluded records are skipped, matching [`aggregate`].
pub fn group_by_category(records: &[ComputedRecord]) -> BTreeMap<String, CategoryGroup> {
    let mut groups: BTreeMap<String, CategoryGroup> = BTreeMap::new();

    for (idx, record) in records.iter().enumerate() {
        if record.is_excluded() {
            continue;
        }
        let category = record
            .category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(UNCATEGORIZED)
            .to_string();

        groups
            .entry(category.clone())
            .or_insert_with(|| CategoryGroup {
                category,
                ..CategoryGroup::default()
            })
            .records
            .push(idx);
    }

    for group in groups.values_mut() {
        group.records.sort_by(|a, b| canonical_order(records, *a, *b));
        group.total_hours = group.records.iter().map(|i| records[*i].hours).sum();
        group.total_pay = group.records.iter().map(|i| records[*i].total_pay()).sum();
    }

    groups
}

/// Keep only records whose grouping instant falls inside `range`.
pub fn filter_period(records: Vec<ComputedRecord>, range: &WeekRange) -> Vec<ComputedRecord> {
    records
        .into_iter()
        .filter(|r| r.grouping_instant().is_some_and(|t| range.contains(t)))
        .collect()
}
