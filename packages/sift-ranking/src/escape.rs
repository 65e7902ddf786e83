/// Quoting for the only values a strategy embeds directly into SQL text.
pub trait SqlEscaper
where
	Self: Send + Sync,
{
	fn ident(&self, raw: &str) -> String;

	fn literal(&self, raw: &str) -> String;
}

/// PostgreSQL quoting. Literals assume `standard_conforming_strings = on`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PgEscaper;
impl SqlEscaper for PgEscaper {
	fn ident(&self, raw: &str) -> String {
		let mut out = String::with_capacity(raw.len() + 2);

		out.push('"');

		for ch in raw.chars().filter(|ch| *ch != '\0') {
			if ch == '"' {
				out.push('"');
			}

			out.push(ch);
		}

		out.push('"');

		out
	}

	fn literal(&self, raw: &str) -> String {
		let mut out = String::with_capacity(raw.len() + 2);

		out.push('\'');

		for ch in raw.chars().filter(|ch| *ch != '\0') {
			if ch == '\'' {
				out.push('\'');
			}

			out.push(ch);
		}

		out.push('\'');

		out
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn identifiers_are_double_quoted() {
		assert_eq!(PgEscaper.ident("entity_meta"), "\"entity_meta\"");
		assert_eq!(PgEscaper.ident("we\"ird"), "\"we\"\"ird\"");
	}

	#[test]
	fn literals_double_single_quotes_and_drop_nul() {
		assert_eq!(PgEscaper.literal("hours"), "'hours'");
		assert_eq!(PgEscaper.literal("o'clock"), "'o''clock'");
		assert_eq!(PgEscaper.literal("x' OR '1'='1"), "'x'' OR ''1''=''1'");
		assert_eq!(PgEscaper.literal("a\0b"), "'ab'");
	}

	#[test]
	fn backslashes_are_kept_verbatim() {
		assert_eq!(PgEscaper.literal("a\\'b"), "'a\\''b'");
	}
}
