use crate::validate::{Choice, Direction};

/// Append-only query assembly owned and executed by the host.
///
/// Call order decides clause order in the final statement.
pub trait QueryBuilder {
	fn join(&mut self, clause: &str);

	fn select(&mut self, aliased_expression: &str);

	fn order_by(&mut self, expression: &str);
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComputedColumn {
	pub alias: String,
	pub expression: String,
}

/// What one strategy contributes to a host query.
///
/// An empty fragment is valid and means the host keeps its own ordering. The order expression is
/// only ever present alongside at least one join or select.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryFragment {
	joins: Vec<String>,
	selects: Vec<ComputedColumn>,
	order_expression: Option<String>,
	direction: Direction,
}
impl QueryFragment {
	pub fn new(direction: Direction) -> Self {
		Self { direction, ..Default::default() }
	}

	pub fn push_join(&mut self, clause: String) {
		self.joins.push(clause);
	}

	pub fn push_select(&mut self, alias: &str, expression: String) {
		self.selects.push(ComputedColumn { alias: alias.to_string(), expression });
	}

	/// Ignored until a join or select has been pushed.
	pub fn set_order(&mut self, expression: String) {
		if self.joins.is_empty() && self.selects.is_empty() {
			return;
		}

		self.order_expression = Some(expression);
	}

	pub fn joins(&self) -> &[String] {
		&self.joins
	}

	pub fn selects(&self) -> &[ComputedColumn] {
		&self.selects
	}

	pub fn order_expression(&self) -> Option<&str> {
		self.order_expression.as_deref()
	}

	pub fn direction(&self) -> Direction {
		self.direction
	}

	pub fn is_empty(&self) -> bool {
		self.joins.is_empty() && self.selects.is_empty() && self.order_expression.is_none()
	}

	/// The order clause with its direction, e.g. `view_count ASC`.
	pub fn order_clause(&self) -> Option<String> {
		self.order_expression
			.as_deref()
			.map(|expression| format!("{expression} {}", self.direction.as_str()))
	}

	pub fn apply<B>(&self, builder: &mut B)
	where
		B: QueryBuilder + ?Sized,
	{
		for clause in &self.joins {
			builder.join(clause);
		}
		for column in &self.selects {
			builder.select(&format!("{} AS {}", column.expression, column.alias));
		}

		if let Some(clause) = self.order_clause() {
			builder.order_by(&clause);
		}
	}
}
