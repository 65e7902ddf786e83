use sift_ranking::{HostSchema, PgEscaper, SqlEscaper};

pub fn render_schema(schema: &HostSchema) -> String {
	let init = include_str!("../../../sql/init.sql");
	let expanded = expand_includes(init);
	let escaper = PgEscaper;

	[
		("<ENTITY_TABLE>", escaper.ident(&schema.entity_table)),
		("<META_TABLE>", escaper.ident(&schema.meta_table)),
		("<SCHEDULE_TABLE>", escaper.ident(&schema.schedule_table)),
		("<ENTITY_CREATED_INDEX>", escaper.ident(&format!("{}_created_idx", schema.entity_table))),
		(
			"<SCHEDULE_LOOKUP_INDEX>",
			escaper.ident(&format!("{}_lookup_idx", schema.schedule_table)),
		),
	]
	.into_iter()
	.fold(expanded, |sql, (placeholder, ident)| sql.replace(placeholder, &ident))
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_entities.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_entities.sql")),
				"tables/002_entity_meta.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_entity_meta.sql")),
				"tables/003_entity_schedules.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_entity_schedules.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn placeholders_are_replaced_with_quoted_names() {
		let schema = HostSchema { meta_table: "listing_meta".to_string(), ..Default::default() };
		let sql = render_schema(&schema);

		assert!(!sql.contains("_TABLE>"), "unrendered placeholder in:\n{sql}");
		assert!(!sql.contains("_INDEX>"), "unrendered placeholder in:\n{sql}");
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS \"listing_meta\""));
		assert!(sql.contains("REFERENCES \"entities\" (entity_id)"));
		assert!(sql.contains("\"entity_schedules_lookup_idx\""));
	}

	#[test]
	fn includes_every_table() {
		let sql = render_schema(&HostSchema::default());

		assert_eq!(sql.matches("CREATE TABLE IF NOT EXISTS").count(), 3);
	}
}
